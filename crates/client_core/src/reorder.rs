//! Pure list reducers for position-ordered collections.
//!
//! Positions are always `0..N-1` in array order after any of these functions
//! run, regardless of what the input carried.

use serde::Serialize;
use shared::{
    domain::{ItemId, PivotId},
    protocol::PositionUpdate,
};

use crate::error::ReorderError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderedItem<T> {
    pub id: ItemId,
    /// Association row id when the item lives in a parent collection.
    pub pivot_id: Option<PivotId>,
    pub position: u32,
    pub data: T,
}

impl<T> OrderedItem<T> {
    pub fn new(id: ItemId, position: u32, data: T) -> Self {
        Self {
            id,
            pivot_id: None,
            position,
            data,
        }
    }

    pub fn with_pivot(mut self, pivot_id: PivotId) -> Self {
        self.pivot_id = Some(pivot_id);
        self
    }

    pub fn position_key(&self) -> PositionKey {
        match self.pivot_id {
            Some(pivot) => PositionKey::Pivot(pivot),
            None => PositionKey::Item(self.id),
        }
    }
}

/// Identifier the backend expects for a position write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionKey {
    Item(ItemId),
    Pivot(PivotId),
}

impl PositionKey {
    pub fn wire_id(self) -> i64 {
        match self {
            PositionKey::Item(ItemId(id)) => id,
            PositionKey::Pivot(PivotId(id)) => id,
        }
    }

    pub fn matches<T>(self, item: &OrderedItem<T>) -> bool {
        match self {
            PositionKey::Item(id) => item.id == id,
            PositionKey::Pivot(pivot) => item.pivot_id == Some(pivot),
        }
    }
}

impl std::fmt::Display for PositionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionKey::Item(ItemId(id)) => write!(f, "item {id}"),
            PositionKey::Pivot(PivotId(id)) => write!(f, "pivot {id}"),
        }
    }
}

/// Moves the element at `from` to `to` and renumbers.
pub fn reorder<T: Clone>(
    items: &[OrderedItem<T>],
    from: usize,
    to: usize,
) -> Result<Vec<OrderedItem<T>>, ReorderError> {
    let len = items.len();
    for index in [from, to] {
        if index >= len {
            return Err(ReorderError::IndexOutOfRange { index, len });
        }
    }

    let mut next = items.to_vec();
    let moved = next.remove(from);
    next.insert(to, moved);
    renumber(&mut next);
    Ok(next)
}

pub fn renumber<T>(items: &mut [OrderedItem<T>]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.position = index as u32;
    }
}

/// Stable sort by carried position, then renumber.
///
/// Duplicate or sparse positions from the backend collapse to a contiguous
/// sequence while keeping their relative order.
pub fn sort_by_position<T>(mut items: Vec<OrderedItem<T>>) -> Vec<OrderedItem<T>> {
    items.sort_by_key(|item| item.position);
    renumber(&mut items);
    items
}

pub fn remove_item<T: Clone>(
    items: &[OrderedItem<T>],
    key: PositionKey,
) -> Result<Vec<OrderedItem<T>>, ReorderError> {
    let index = index_of(items, key)?;
    let mut next = items.to_vec();
    next.remove(index);
    renumber(&mut next);
    Ok(next)
}

/// Places the item identified by `key` at `position`, shifting the rest.
pub fn reposition<T: Clone>(
    items: &[OrderedItem<T>],
    key: PositionKey,
    position: u32,
) -> Result<Vec<OrderedItem<T>>, ReorderError> {
    let len = items.len();
    if position as usize >= len {
        return Err(ReorderError::PositionOutOfRange { position, len });
    }
    let from = index_of(items, key)?;
    reorder(items, from, position as usize)
}

pub fn index_of<T>(items: &[OrderedItem<T>], key: PositionKey) -> Result<usize, ReorderError> {
    items
        .iter()
        .position(|item| key.matches(item))
        .ok_or_else(|| ReorderError::UnknownItem(key.to_string()))
}

pub fn is_contiguous<T>(items: &[OrderedItem<T>]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(index, item)| item.position as usize == index)
}

/// Bulk payload describing the full order, positions taken from array order.
pub fn position_updates<T>(items: &[OrderedItem<T>]) -> Vec<PositionUpdate> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| PositionUpdate {
            id: item.position_key().wire_id(),
            position: index as u32,
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/reorder_tests.rs"]
mod tests;
