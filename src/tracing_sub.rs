use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::Level;

static LOG_FILE: OnceLock<Arc<Mutex<File>>> = OnceLock::new();

/// Route log output to `path` (appending). Must be called before
/// [`init_default`] to take effect for the first events; only the first call
/// wins.
pub fn set_log_file(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = LOG_FILE.set(Arc::new(Mutex::new(file)));
    Ok(())
}

pub fn log_file_configured() -> bool {
    LOG_FILE.get().is_some()
}

pub struct DelegatingWriter {
    inner: DelegatingInner,
}

enum DelegatingInner {
    File(Arc<Mutex<File>>),
    Stderr(io::Stderr),
}

impl DelegatingWriter {
    fn new() -> Self {
        if let Some(file) = LOG_FILE.get() {
            DelegatingWriter {
                inner: DelegatingInner::File(file.clone()),
            }
        } else {
            DelegatingWriter {
                inner: DelegatingInner::Stderr(io::stderr()),
            }
        }
    }
}

fn lock(file: &Mutex<File>) -> io::Result<std::sync::MutexGuard<'_, File>> {
    file.lock()
        .map_err(|_| io::Error::other("log file lock poisoned"))
}

impl Write for DelegatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            DelegatingInner::File(f) => lock(f)?.write(buf),
            DelegatingInner::Stderr(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            DelegatingInner::File(f) => lock(f)?.flush(),
            DelegatingInner::Stderr(s) => s.flush(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SubscriberMakeWriter;

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SubscriberMakeWriter {
    type Writer = DelegatingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DelegatingWriter::new()
    }
}

/// Initialize the tracing subscriber at `DEBUG`, writing to the log file
/// when one is configured and to stderr otherwise. Safe to call multiple
/// times; later calls are no-ops for the global subscriber.
pub fn init_default() {
    init_with_level(Level::DEBUG);
}

pub fn init_with_level(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(SubscriberMakeWriter)
        .with_target(false)
        .with_thread_names(false)
        .with_ansi(!log_file_configured())
        .try_init();
}
