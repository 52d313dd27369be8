// Synchronization Bridge: merges validated section drafts into the canonical document.

pub mod actor;
pub mod bridge;

pub use actor::{spawn_bridge, BridgeClosed, BridgeHandle};
pub use bridge::{
    DocumentSnapshot, MergeOutcome, Revision, SaveConfirmation, StoredPhoto, SyncBridge,
    ValidatedDraft,
};
