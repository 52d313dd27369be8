//! Drag-reorder of ordered collections.
//!
//! Standard list-move semantics: the moved element ends up at index `to` of the
//! final arrangement, elements between the two positions shift by one slot toward
//! the gap, everything outside that range stays put. Identities travel with
//! their elements; nothing is minted or dropped.
//!
//! Reordering never writes the canonical document. The new order lands in the
//! section editor's draft and reaches the document through the bridge.

use serde::Deserialize;

use crate::document::{ItemId, KeyedList};

/// A reorder gesture, either resolved to positions or expressed as
/// "drop item `item` where `target` currently sits".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ReorderRequest {
    Positions { from: usize, to: usize },
    Identities { item: ItemId, target: ItemId },
}

/// Moves `items[from]` to index `to` in place.
///
/// Returns `false` without touching the slice when the move is a no-op:
/// same position, fewer than two items, or an index out of range.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if items.len() < 2 || from == to || from >= items.len() || to >= items.len() {
        return false;
    }
    let moved = items.remove(from);
    items.insert(to, moved);
    true
}

/// Non-mutating variant: the reordered copy, or `None` for a no-op.
pub fn reordered<T: Clone>(items: &[T], from: usize, to: usize) -> Option<Vec<T>> {
    let mut next = items.to_vec();
    move_item(&mut next, from, to).then_some(next)
}

/// Applies a reorder request to a keyed list. Unknown identities are ignored.
pub fn apply<T: Clone>(list: &mut KeyedList<T>, request: ReorderRequest) -> bool {
    match request {
        ReorderRequest::Positions { from, to } => list.move_item(from, to),
        ReorderRequest::Identities { item, target } => {
            match (list.position(item), list.position(target)) {
                (Some(from), Some(to)) => list.move_item(from, to),
                _ => false,
            }
        }
    }
}
