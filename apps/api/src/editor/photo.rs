//! Local photo previews.
//!
//! A freshly picked photo is previewable before it is uploaded. The bytes are
//! registered in the session's `PhotoPreviews` and served under the photo's
//! token. Each registration is owned by a `PhotoPreview` guard held by the
//! personal-info editor; dropping the guard (photo replaced, resolved to a
//! stored URL, or editor unmounted) releases the registration.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;
use uuid::Uuid;

use crate::document::PendingPhoto;

#[derive(Debug, Clone, Default)]
pub struct PhotoPreviews {
    inner: Arc<Mutex<HashMap<Uuid, PendingPhoto>>>,
}

impl PhotoPreviews {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "the preview is released as soon as the guard is dropped"]
    pub fn register(&self, photo: &PendingPhoto) -> PhotoPreview {
        if let Ok(mut map) = self.inner.lock() {
            map.insert(photo.token, photo.clone());
        }
        debug!("Registered photo preview {}", photo.token);
        PhotoPreview {
            token: photo.token,
            previews: self.clone(),
        }
    }

    pub fn get(&self, token: Uuid) -> Option<PendingPhoto> {
        self.inner
            .lock()
            .ok()
            .and_then(|map| map.get(&token).cloned())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|map| map.len()).unwrap_or(0)
    }

    fn release(&self, token: Uuid) {
        if let Ok(mut map) = self.inner.lock() {
            map.remove(&token);
        }
        debug!("Released photo preview {token}");
    }
}

#[derive(Debug)]
pub struct PhotoPreview {
    token: Uuid,
    previews: PhotoPreviews,
}

impl PhotoPreview {
    pub fn token(&self) -> Uuid {
        self.token
    }
}

impl Drop for PhotoPreview {
    fn drop(&mut self) {
        self.previews.release(self.token);
    }
}
