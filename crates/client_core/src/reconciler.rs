//! Optimistic reordering of a position-ordered collection.
//!
//! Local order changes synchronously; persistence runs on spawned tasks. The
//! collection keeps the last order the backend acknowledged and falls back to
//! it when an automatic save fails.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use shared::protocol::{PositionUpdate, PositionUpdated};
use tokio::{
    sync::{broadcast, Notify},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    error::{ClientError, PersistError, ReorderError},
    events::{event_channel, ScreenEvent},
    reorder::{self, OrderedItem, PositionKey},
};

#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Returns the backend's echo of the row when it sends one.
    async fn update_position(
        &self,
        update: PositionUpdate,
    ) -> Result<Option<PositionUpdated>, ClientError>;

    async fn bulk_update_positions(
        &self,
        updates: &[PositionUpdate],
    ) -> Result<Vec<PositionUpdated>, ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistMode {
    /// Moves within `debounce` of each other are saved as one bulk call.
    Bulk { debounce: Duration },
    /// Each move is saved on its own, in order.
    PerItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    Idle,
    Reordering,
    Persisting,
    /// An automatic save failed and the confirmed order was restored.
    /// Settles to `Idle` once the remaining queued saves have drained.
    RolledBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Unchanged,
    Scheduled,
}

struct Inner<T> {
    local: Vec<OrderedItem<T>>,
    confirmed: Vec<OrderedItem<T>>,
    state: ReconcilerState,
    /// Bumped on every local change; a bulk save only sends the newest order.
    generation: u64,
    /// Bumped on rollback and rehydration; older saves are discarded.
    epoch: u64,
    pending: Vec<JoinHandle<()>>,
    in_flight: usize,
    /// Per-item saves run strictly in ticket order.
    next_ticket: u64,
    serving: u64,
}

struct Shared<T> {
    store: Arc<dyn PositionStore>,
    mode: PersistMode,
    inner: Mutex<Inner<T>>,
    persist_lock: tokio::sync::Mutex<()>,
    turn: Notify,
    events: broadcast::Sender<ScreenEvent>,
}

pub struct OrderedCollection<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for OrderedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> OrderedCollection<T>
where
    T: Clone + Send + 'static,
{
    /// Hydrates from backend rows, ordered by their carried position.
    pub fn new(items: Vec<OrderedItem<T>>, store: Arc<dyn PositionStore>, mode: PersistMode) -> Self {
        Self::from_visual_order(reorder::sort_by_position(items), store, mode)
    }

    /// Takes `items` in the order shown, leaving carried positions as they are.
    pub fn from_visual_order(
        items: Vec<OrderedItem<T>>,
        store: Arc<dyn PositionStore>,
        mode: PersistMode,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                mode,
                inner: Mutex::new(Inner {
                    confirmed: items.clone(),
                    local: items,
                    state: ReconcilerState::Idle,
                    generation: 0,
                    epoch: 0,
                    pending: Vec::new(),
                    in_flight: 0,
                    next_ticket: 0,
                    serving: 0,
                }),
                persist_lock: tokio::sync::Mutex::new(()),
                turn: Notify::new(),
                events: event_channel(),
            }),
        }
    }

    pub fn items(&self) -> Vec<OrderedItem<T>> {
        self.shared.lock().local.clone()
    }

    pub fn state(&self) -> ReconcilerState {
        self.shared.lock().state
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ScreenEvent> {
        self.shared.events.subscribe()
    }

    /// Moves one item locally and schedules an automatic save.
    ///
    /// Must be called from within a tokio runtime.
    pub fn move_item(&self, from: usize, to: usize) -> Result<MoveOutcome, ReorderError> {
        let mut inner = self.shared.lock();
        let next = reorder::reorder(&inner.local, from, to)?;
        if from == to {
            return Ok(MoveOutcome::Unchanged);
        }

        let key = next[to].position_key();
        inner.local = next;
        inner.generation += 1;
        inner.state = ReconcilerState::Reordering;
        inner.in_flight += 1;
        let generation = inner.generation;
        let epoch = inner.epoch;
        debug!(%key, from, to, "item moved locally");

        let shared = Arc::clone(&self.shared);
        let task = match self.shared.mode {
            PersistMode::Bulk { debounce } => {
                tokio::spawn(save_settled_order(shared, debounce, generation, epoch))
            }
            PersistMode::PerItem => {
                let update = PositionUpdate {
                    id: key.wire_id(),
                    position: to as u32,
                };
                let after = inner.local.clone();
                let ticket = inner.next_ticket;
                inner.next_ticket += 1;
                tokio::spawn(save_single_move(shared, ticket, update, after, epoch))
            }
        };
        inner.pending.retain(|handle| !handle.is_finished());
        inner.pending.push(task);
        Ok(MoveOutcome::Scheduled)
    }

    /// Writes one item's position through the single-item endpoint.
    ///
    /// The local order changes only after the backend accepts the write.
    pub async fn update_position(&self, key: PositionKey, position: u32) -> Result<(), PersistError> {
        {
            let mut inner = self.shared.lock();
            let len = inner.local.len();
            if position as usize >= len {
                return Err(ReorderError::PositionOutOfRange { position, len }.into());
            }
            reorder::index_of(&inner.local, key)?;
            inner.state = ReconcilerState::Persisting;
        }

        let update = PositionUpdate {
            id: key.wire_id(),
            position,
        };
        let result = {
            let _guard = self.shared.persist_lock.lock().await;
            self.shared.store.update_position(update).await
        };

        let mut inner = self.shared.lock();
        inner.state = ReconcilerState::Idle;
        match result {
            Ok(echo) => {
                if let Ok(next) = reorder::reposition(&inner.local, key, position) {
                    inner.local = next;
                }
                if let Ok(next) = reorder::reposition(&inner.confirmed, key, position) {
                    inner.confirmed = next;
                }
                let echoes: Vec<_> = echo.into_iter().collect();
                merge_metadata(&mut inner.local, &echoes);
                merge_metadata(&mut inner.confirmed, &echoes);
                info!(%key, position, "position updated");
                let _ = self.shared.events.send(ScreenEvent::OrderPersisted { items: 1 });
                Ok(())
            }
            Err(err) => {
                warn!(%key, position, error = %err, "position update failed");
                let _ = self.shared.events.send(ScreenEvent::PositionUpdateFailed {
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Persists the full visual order in one call.
    ///
    /// On success local positions become `0..N-1` in array order. On failure
    /// the local order is left as the operator arranged it.
    pub async fn bulk_save(&self) -> Result<(), PersistError> {
        let updates = {
            let mut inner = self.shared.lock();
            inner.state = ReconcilerState::Persisting;
            reorder::position_updates(&inner.local)
        };

        let result = {
            let _guard = self.shared.persist_lock.lock().await;
            self.shared.store.bulk_update_positions(&updates).await
        };

        let mut inner = self.shared.lock();
        inner.state = ReconcilerState::Idle;
        match result {
            Ok(echoes) => {
                reorder::renumber(&mut inner.local);
                merge_metadata(&mut inner.local, &echoes);
                inner.confirmed = inner.local.clone();
                info!(items = updates.len(), "bulk position save complete");
                let _ = self.shared.events.send(ScreenEvent::OrderPersisted {
                    items: updates.len(),
                });
                Ok(())
            }
            Err(err) => {
                warn!(items = updates.len(), error = %err, "bulk position save failed");
                let _ = self.shared.events.send(ScreenEvent::BulkSaveFailed {
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Drops an item that was deleted on the backend and closes the gap.
    pub fn remove_item(&self, key: PositionKey) -> Result<(), ReorderError> {
        let mut inner = self.shared.lock();
        inner.local = reorder::remove_item(&inner.local, key)?;
        if let Ok(next) = reorder::remove_item(&inner.confirmed, key) {
            inner.confirmed = next;
        }
        Ok(())
    }

    /// Rehydrates after a refetch. Saves still pending are discarded.
    pub fn replace_items(&self, items: Vec<OrderedItem<T>>) {
        let items = reorder::sort_by_position(items);
        let mut inner = self.shared.lock();
        inner.confirmed = items.clone();
        inner.local = items;
        inner.generation += 1;
        inner.epoch += 1;
        inner.state = ReconcilerState::Idle;
    }

    /// Waits until every scheduled save has finished.
    pub async fn wait_idle(&self) {
        loop {
            let pending = std::mem::take(&mut self.shared.lock().pending);
            if pending.is_empty() {
                return;
            }
            for result in futures::future::join_all(pending).await {
                if let Err(err) = result {
                    warn!(error = %err, "position save task ended abnormally");
                }
            }
        }
    }
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self) {
        let mut inner = self.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        if inner.in_flight == 0 {
            inner.state = ReconcilerState::Idle;
        }
    }

    async fn wait_turn(&self, ticket: u64) {
        loop {
            let notified = self.turn.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            let ready = self.lock().serving == ticket;
            if ready {
                return;
            }
            notified.await;
        }
    }
}

/// Hands the per-item queue to the next ticket, even if the save panicked.
struct Turn<'a, T>(&'a Shared<T>);

impl<T> Drop for Turn<'_, T> {
    fn drop(&mut self) {
        self.0.lock().serving += 1;
        self.0.turn.notify_waiters();
    }
}

impl<T: Clone> Shared<T> {
    fn confirm(&self, sent: Vec<OrderedItem<T>>, echoes: &[PositionUpdated], epoch: u64) {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return;
        }
        let items = sent.len();
        inner.confirmed = sent;
        merge_metadata(&mut inner.confirmed, echoes);
        merge_metadata(&mut inner.local, echoes);
        info!(items, "order persisted");
        let _ = self.events.send(ScreenEvent::OrderPersisted { items });
    }

    fn roll_back(&self, err: &ClientError, epoch: u64) {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return;
        }
        inner.local = inner.confirmed.clone();
        inner.epoch += 1;
        inner.generation += 1;
        inner.state = ReconcilerState::RolledBack;
        warn!(error = %err, "order save failed; restored last confirmed order");
        let _ = self.events.send(ScreenEvent::OrderRolledBack {
            message: err.to_string(),
        });
    }
}

async fn save_settled_order<T>(shared: Arc<Shared<T>>, debounce: Duration, generation: u64, epoch: u64)
where
    T: Clone + Send + 'static,
{
    tokio::time::sleep(debounce).await;
    let guard = shared.persist_lock.lock().await;

    let sent = {
        let mut inner = shared.lock();
        if inner.generation != generation || inner.epoch != epoch {
            None
        } else {
            inner.state = ReconcilerState::Persisting;
            Some(inner.local.clone())
        }
    };
    let Some(sent) = sent else {
        drop(guard);
        shared.finish();
        return;
    };

    let updates = reorder::position_updates(&sent);
    match shared.store.bulk_update_positions(&updates).await {
        Ok(echoes) => shared.confirm(sent, &echoes, epoch),
        Err(err) => shared.roll_back(&err, epoch),
    }
    drop(guard);
    shared.finish();
}

async fn save_single_move<T>(
    shared: Arc<Shared<T>>,
    ticket: u64,
    update: PositionUpdate,
    after: Vec<OrderedItem<T>>,
    epoch: u64,
) where
    T: Clone + Send + 'static,
{
    shared.wait_turn(ticket).await;
    let turn = Turn(&*shared);
    let guard = shared.persist_lock.lock().await;

    let current = {
        let mut inner = shared.lock();
        if inner.epoch == epoch {
            inner.state = ReconcilerState::Persisting;
            true
        } else {
            false
        }
    };
    if current {
        match shared.store.update_position(update).await {
            Ok(echo) => {
                let echoes: Vec<_> = echo.into_iter().collect();
                shared.confirm(after, &echoes, epoch);
            }
            Err(err) => shared.roll_back(&err, epoch),
        }
    }
    drop(guard);
    drop(turn);
    shared.finish();
}

/// Copies pivot ids echoed by the backend onto the rows they were sent for.
///
/// Echoes carry the id from the `PositionUpdate`, which is the pivot id when
/// the row has one and the item id otherwise.
fn merge_metadata<T>(items: &mut [OrderedItem<T>], echoes: &[PositionUpdated]) {
    for echo in echoes {
        let Some(pivot) = echo.pivot_id else {
            continue;
        };
        if let Some(item) = items
            .iter_mut()
            .find(|item| item.position_key().wire_id() == echo.id)
        {
            item.pivot_id = Some(pivot);
        }
    }
}

#[cfg(test)]
#[path = "tests/reconciler_tests.rs"]
mod tests;
