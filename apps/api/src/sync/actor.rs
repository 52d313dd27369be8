//! The bridge runs as one task per session and is the only writer of the
//! canonical document. Everyone else reads published snapshots from a
//! `watch` channel.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use crate::document::ResumeDocument;
use crate::sync::bridge::{
    DocumentSnapshot, MergeOutcome, SaveConfirmation, SyncBridge, ValidatedDraft,
};

const COMMAND_BUFFER: usize = 64;

#[derive(Debug, Error, PartialEq)]
#[error("synchronization bridge has shut down")]
pub struct BridgeClosed;

enum Command {
    Merge(ValidatedDraft, oneshot::Sender<MergeOutcome>),
    ConfirmSaved(SaveConfirmation, oneshot::Sender<MergeOutcome>),
}

#[derive(Debug, Clone)]
pub struct BridgeHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<DocumentSnapshot>,
}

/// Starts the bridge task. It stops once every handle has been dropped.
pub fn spawn_bridge(document: ResumeDocument) -> BridgeHandle {
    let mut bridge = SyncBridge::new(document);
    let (snapshot_tx, snapshots) = watch::channel(bridge.snapshot());
    let (commands, mut rx) = mpsc::channel(COMMAND_BUFFER);

    tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            let (outcome, reply) = match command {
                Command::Merge(validated, reply) => (bridge.merge(validated), reply),
                Command::ConfirmSaved(confirmation, reply) => {
                    (bridge.confirm_saved(confirmation), reply)
                }
            };
            if matches!(outcome, MergeOutcome::Merged { .. }) {
                snapshot_tx.send_replace(bridge.snapshot());
            }
            let _ = reply.send(outcome);
        }
        debug!("Bridge task stopped");
    });

    BridgeHandle {
        commands,
        snapshots,
    }
}

impl BridgeHandle {
    pub async fn merge(&self, validated: ValidatedDraft) -> Result<MergeOutcome, BridgeClosed> {
        self.request(|reply| Command::Merge(validated, reply)).await
    }

    pub async fn confirm_saved(
        &self,
        confirmation: SaveConfirmation,
    ) -> Result<MergeOutcome, BridgeClosed> {
        self.request(|reply| Command::ConfirmSaved(confirmation, reply))
            .await
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DocumentSnapshot> {
        self.snapshots.clone()
    }

    async fn request(
        &self,
        command: impl FnOnce(oneshot::Sender<MergeOutcome>) -> Command,
    ) -> Result<MergeOutcome, BridgeClosed> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| BridgeClosed)?;
        response.await.map_err(|_| BridgeClosed)
    }
}
