use std::time::Duration;

use crate::constants::{DRAG_POLL_INTERVAL, ISOLATE_MONITORS, ISOLATE_WORKSPACES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskbarConfig {
    /// How often an active drag samples the pointer.
    pub poll_interval: Duration,
    pub isolate_monitors: bool,
    pub isolate_workspaces: bool,
}

impl Default for TaskbarConfig {
    fn default() -> Self {
        Self {
            poll_interval: DRAG_POLL_INTERVAL,
            isolate_monitors: ISOLATE_MONITORS,
            isolate_workspaces: ISOLATE_WORKSPACES,
        }
    }
}

impl TaskbarConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_isolate_monitors(mut self, isolate: bool) -> Self {
        self.isolate_monitors = isolate;
        self
    }

    pub fn with_isolate_workspaces(mut self, isolate: bool) -> Self {
        self.isolate_workspaces = isolate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_isolate_everything() {
        let config = TaskbarConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert!(config.isolate_monitors);
        assert!(config.isolate_workspaces);
        let relaxed = config.with_isolate_monitors(false);
        assert!(!relaxed.isolate_monitors);
        assert!(relaxed.isolate_workspaces);
    }
}
