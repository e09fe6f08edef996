//! Persistence of the window order between sessions.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::WindowId;
use crate::constants::ORDER_FILE_NAME;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode window order: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("no state directory available on this platform")]
    NoStateDir,
}

pub trait OrderStore {
    fn load_order(&self) -> Result<Vec<WindowId>, StoreError>;
    fn save_order(&mut self, order: &[WindowId]) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OrderFile {
    #[serde(default)]
    window_order: Vec<WindowId>,
}

/// JSON file store, `{"window_order": [3, 1, 2]}`.
#[derive(Debug, Clone)]
pub struct FileOrderStore {
    path: PathBuf,
}

impl FileOrderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<state dir>/term-taskbar/window-order.json`, falling back to the
    /// local data dir where the platform has no state dir.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let base = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .ok_or(StoreError::NoStateDir)?;
        Ok(base.join(env!("CARGO_PKG_NAME")).join(ORDER_FILE_NAME))
    }

    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl OrderStore for FileOrderStore {
    fn load_order(&self) -> Result<Vec<WindowId>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(err)),
        };
        let file: OrderFile = serde_json::from_str(&text).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(file.window_order)
    }

    fn save_order(&mut self, order: &[WindowId]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let file = OrderFile {
            window_order: order.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(StoreError::Encode)?;
        // Write next to the target and rename so a crash never leaves a
        // truncated file behind.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|err| self.io_error(err))?;
        fs::rename(&tmp, &self.path).map_err(|err| self.io_error(err))?;
        tracing::debug!(path = %self.path.display(), windows = order.len(), "saved window order");
        Ok(())
    }
}

/// In-memory store. Clones share the stored order.
#[derive(Debug, Clone, Default)]
pub struct MemoryOrderStore {
    order: Rc<RefCell<Vec<WindowId>>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(order: Vec<WindowId>) -> Self {
        Self {
            order: Rc::new(RefCell::new(order)),
        }
    }

    pub fn order(&self) -> Vec<WindowId> {
        self.order.borrow().clone()
    }
}

impl OrderStore for MemoryOrderStore {
    fn load_order(&self) -> Result<Vec<WindowId>, StoreError> {
        Ok(self.order())
    }

    fn save_order(&mut self, order: &[WindowId]) -> Result<(), StoreError> {
        *self.order.borrow_mut() = order.to_vec();
        Ok(())
    }
}
