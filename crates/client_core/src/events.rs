//! Notifications a screen surfaces to the operator.

use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    DatasetReplaced { total: u64 },
    FetchFailed { message: String },
    OrderPersisted { items: usize },
    OrderRolledBack { message: String },
    PositionUpdateFailed { message: String },
    BulkSaveFailed { message: String },
}

impl ScreenEvent {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ScreenEvent::FetchFailed { .. }
                | ScreenEvent::OrderRolledBack { .. }
                | ScreenEvent::PositionUpdateFailed { .. }
                | ScreenEvent::BulkSaveFailed { .. }
        )
    }
}

pub fn event_channel() -> broadcast::Sender<ScreenEvent> {
    let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    tx
}
