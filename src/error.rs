use thiserror::Error;

use crate::dnd::DragError;
use crate::geometry::MonitorIndex;
use crate::order::{OrderError, StoreError};

#[derive(Debug, Error)]
pub enum TaskbarError {
    #[error(transparent)]
    Drag(#[from] DragError),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("monitor {0} has no panel")]
    UnknownMonitor(MonitorIndex),
    #[error("monitor {0} already has a panel")]
    MonitorExists(MonitorIndex),
}

pub type Result<T, E = TaskbarError> = std::result::Result<T, E>;
