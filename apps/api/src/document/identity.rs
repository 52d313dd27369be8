//! Stable per-item identities for collection elements edited in keyed contexts.
//!
//! An `ItemId` is independent of the element's position: it survives append,
//! remove, and reorder, and the session-wide `IdMinter` never hands out the same
//! value twice, so a retired identity is never reused.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::reorder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session-scoped identity source. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct IdMinter {
    last: Arc<AtomicU64>,
}

impl IdMinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&self) -> ItemId {
        ItemId(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// A collection element paired with its stable identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyed<T> {
    pub id: ItemId,
    #[serde(flatten)]
    pub value: T,
}

/// Ordered sequence of keyed elements. Semantic order is the vector order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct KeyedList<T> {
    items: Vec<Keyed<T>>,
}

impl<T> Default for KeyedList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Clone> KeyedList<T> {
    /// Wraps plain values, minting a fresh identity for each.
    pub fn from_values(values: impl IntoIterator<Item = T>, ids: &IdMinter) -> Self {
        Self {
            items: values
                .into_iter()
                .map(|value| Keyed {
                    id: ids.mint(),
                    value,
                })
                .collect(),
        }
    }

    pub fn push(&mut self, value: T, ids: &IdMinter) -> ItemId {
        let id = ids.mint();
        self.items.push(Keyed { id, value });
        id
    }

    /// Removes the element carrying `id`. Unknown identities are ignored.
    pub fn remove(&mut self, id: ItemId) -> Option<T> {
        let index = self.position(id)?;
        Some(self.items.remove(index).value)
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn get(&self, id: ItemId) -> Option<&T> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map(|item| &item.value)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut T> {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .map(|item| &mut item.value)
    }

    /// Moves the element at `from` so it ends up at `to`. Returns false on a no-op.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        reorder::move_item(&mut self.items, from, to)
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }

    pub fn values(&self) -> Vec<T> {
        self.items.iter().map(|item| item.value.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keyed<T>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
