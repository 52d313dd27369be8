//! Debounced persistence. Once the canonical document has gone quiet for the
//! debounce window, the session is saved if it moved past its last saved
//! revision. A failed save waits for the next change.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::session::EditorSession;
use crate::sync::DocumentSnapshot;

/// Runs until the session is dropped or its bridge shuts down.
pub(crate) fn spawn_autosave(
    session: Weak<EditorSession>,
    mut snapshots: watch::Receiver<DocumentSnapshot>,
    debounce: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            if !quiet_for(&mut snapshots, debounce).await {
                break;
            }
            let Some(session) = session.upgrade() else {
                break;
            };
            match session.save_if_dirty().await {
                Ok(Some(receipt)) => debug!(
                    "Autosaved session {} at revision {}",
                    session.id(),
                    receipt.revision
                ),
                Ok(None) => {}
                Err(e) => warn!("Autosave of session {} failed: {e}", session.id()),
            }
        }
        debug!("Autosave stopped");
    })
}

/// Returns once no snapshot arrived for `debounce`; false if the channel closed.
async fn quiet_for(snapshots: &mut watch::Receiver<DocumentSnapshot>, debounce: Duration) -> bool {
    loop {
        match tokio::time::timeout(debounce, snapshots.changed()).await {
            Ok(Ok(())) => continue,
            Ok(Err(_)) => return false,
            Err(_) => return true,
        }
    }
}
