//! Editing sessions.
//!
//! A session wires the pieces together. Section editors hold drafts; every
//! changed draft is validated on a spawned task and, when it is still the
//! latest and valid, merged by the bridge task, which alone owns the canonical
//! document. The autosave task persists revisions once edits go quiet.

pub mod autosave;
pub mod handlers;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::document::{IdMinter, ItemId, PendingPhoto, Photo, ResumeDocument};
use crate::editor::{
    DraftSubmission, DraftValidator, EditError, EditOutcome, Edited, EditorSet, EditorView,
    FieldEdit, NewItem, PhotoPreviews, SectionDraft, SectionKind,
};
use crate::errors::AppError;
use crate::generation::{validate_description, TextGenerator};
use crate::preview::{compose, PreviewLayout};
use crate::reorder::ReorderRequest;
use crate::steps::{StepNavigator, StepView};
use crate::storage::{PhotoStorage, PhotoUpdate, ResumeStore};
use crate::sync::{
    spawn_bridge, BridgeClosed, BridgeHandle, DocumentSnapshot, MergeOutcome, Revision,
    SaveConfirmation, StoredPhoto, ValidatedDraft,
};

/// The collaborators every session talks to.
#[derive(Clone)]
pub struct SessionServices {
    pub store: Arc<dyn ResumeStore>,
    pub photos: Arc<dyn PhotoStorage>,
    pub validator: Arc<dyn DraftValidator>,
    pub generator: Arc<dyn TextGenerator>,
    pub autosave_debounce: Duration,
}

/// Outcome of the most recent save attempt, shown as a transient notice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveStatus {
    Idle,
    Saved {
        revision: Revision,
        resume_id: Uuid,
        at: DateTime<Utc>,
    },
    Failed {
        revision: Revision,
        message: String,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
struct SaveState {
    saved_revision: Revision,
    status: SaveStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_id: Option<Uuid>,
    pub revision: Revision,
    pub saved_revision: Revision,
    pub dirty: bool,
    pub step: StepView,
    pub mounted: Vec<SectionKind>,
    pub save_status: SaveStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditResponse {
    pub outcome: EditOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemId>,
    pub editor: EditorView,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveReceipt {
    pub resume_id: Uuid,
    pub revision: Revision,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    pub revision: Revision,
    pub layout: PreviewLayout,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ────────────────────────────────────────────────────────────────────────────
// EditorSession
// ────────────────────────────────────────────────────────────────────────────

pub struct EditorSession {
    id: Uuid,
    user_id: Uuid,
    services: SessionServices,
    bridge: BridgeHandle,
    editors: Arc<Mutex<EditorSet>>,
    steps: Mutex<StepNavigator>,
    save_lock: tokio::sync::Mutex<()>,
    save_state: Mutex<SaveState>,
    autosave: Mutex<Option<AbortHandle>>,
}

impl EditorSession {
    /// Spawns the bridge and autosave tasks and mounts the first step's editor.
    pub fn start(user_id: Uuid, document: ResumeDocument, services: SessionServices) -> Arc<Self> {
        let bridge = spawn_bridge(document);
        let snapshot = bridge.snapshot();
        let steps = StepNavigator::default();
        let mut editors = EditorSet::new(PhotoPreviews::new());
        editors.mount(steps.current().section, &snapshot.document);

        let autosave_debounce = services.autosave_debounce;
        let session = Arc::new(Self {
            id: Uuid::new_v4(),
            user_id,
            services,
            bridge,
            editors: Arc::new(Mutex::new(editors)),
            steps: Mutex::new(steps),
            save_lock: tokio::sync::Mutex::new(()),
            save_state: Mutex::new(SaveState {
                saved_revision: snapshot.revision,
                status: SaveStatus::Idle,
            }),
            autosave: Mutex::new(None),
        });

        let task = autosave::spawn_autosave(
            Arc::downgrade(&session),
            session.bridge.subscribe(),
            autosave_debounce,
        );
        *lock(&session.autosave) = Some(task.abort_handle());

        info!(
            "Opened session {} for user {user_id} (resume: {:?})",
            session.id, snapshot.document.id
        );
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        self.bridge.snapshot()
    }

    pub fn is_dirty(&self) -> bool {
        self.bridge.snapshot().revision != lock(&self.save_state).saved_revision
    }

    pub fn view(&self) -> SessionView {
        let snapshot = self.bridge.snapshot();
        let state = lock(&self.save_state).clone();
        SessionView {
            id: self.id,
            user_id: self.user_id,
            resume_id: snapshot.document.id,
            revision: snapshot.revision,
            saved_revision: state.saved_revision,
            dirty: snapshot.revision != state.saved_revision,
            step: lock(&self.steps).view(),
            mounted: lock(&self.editors).mounted(),
            save_status: state.status,
        }
    }

    /// Unmounts the step being left and mounts the new one. The snapshot is
    /// read under the editors lock so a merge settling in between is seen.
    pub fn go_to_step(&self, key: &str) -> Result<SessionView, AppError> {
        {
            let mut steps = lock(&self.steps);
            let left = steps.go_to(key)?;
            let entered = steps.current();
            let mut editors = lock(&self.editors);
            let snapshot = self.bridge.snapshot();
            if left.section != entered.section {
                editors.unmount(left.section);
            }
            editors.mount(entered.section, &snapshot.document);
            debug!("Session {} moved from {} to {}", self.id, left.key, entered.key);
        }
        Ok(self.view())
    }

    pub fn editor_view(&self, kind: SectionKind) -> EditorView {
        let mut editors = lock(&self.editors);
        let snapshot = self.bridge.snapshot();
        editors.mount(kind, &snapshot.document).view()
    }

    pub fn set_field(&self, kind: SectionKind, edit: FieldEdit) -> Result<EditResponse, AppError> {
        let FieldEdit { field, value } = edit;
        let ((), outcome, editor) = self.edit(kind, |draft, _| {
            draft.set_field(&field, value)?;
            Ok(((), EditOutcome::Changed))
        })?;
        Ok(EditResponse {
            outcome,
            item: None,
            editor,
        })
    }

    pub fn set_item_field(
        &self,
        kind: SectionKind,
        id: ItemId,
        edit: FieldEdit,
    ) -> Result<EditResponse, AppError> {
        let FieldEdit { field, value } = edit;
        let ((), outcome, editor) =
            self.edit(kind, |draft, _| Ok(((), draft.set_item_field(id, &field, value)?)))?;
        Ok(EditResponse {
            outcome,
            item: Some(id),
            editor,
        })
    }

    pub fn append_item(&self, kind: SectionKind) -> Result<EditResponse, AppError> {
        let (id, outcome, editor) =
            self.edit(kind, |draft, ids| Ok((draft.append_blank(ids)?, EditOutcome::Changed)))?;
        Ok(EditResponse {
            outcome,
            item: Some(id),
            editor,
        })
    }

    pub fn remove_item(&self, kind: SectionKind, id: ItemId) -> Result<EditResponse, AppError> {
        let ((), outcome, editor) = self.edit(kind, |draft, _| Ok(((), draft.remove_item(id)?)))?;
        Ok(EditResponse {
            outcome,
            item: None,
            editor,
        })
    }

    pub fn reorder(
        &self,
        kind: SectionKind,
        request: ReorderRequest,
    ) -> Result<EditResponse, AppError> {
        let ((), outcome, editor) = self.edit(kind, |draft, _| Ok(((), draft.reorder(request)?)))?;
        Ok(EditResponse {
            outcome,
            item: None,
            editor,
        })
    }

    pub fn set_photo(&self, photo: PendingPhoto) -> Result<EditResponse, AppError> {
        self.edit_photo(Some(Photo::Pending(photo)))
    }

    /// Marks the photo for removal; the next save clears the stored one.
    pub fn remove_photo(&self) -> Result<EditResponse, AppError> {
        self.edit_photo(Some(Photo::Removed))
    }

    /// Bytes of a chosen but not yet uploaded photo, while its editor holds it.
    pub fn photo_preview(&self, token: Uuid) -> Option<PendingPhoto> {
        lock(&self.editors).previews().get(token)
    }

    pub fn preview(&self) -> PreviewResponse {
        let snapshot = self.bridge.snapshot();
        PreviewResponse {
            revision: snapshot.revision,
            layout: compose(&snapshot.document),
        }
    }

    // ── AI generation ───────────────────────────────────────────────────────

    pub async fn generate_work_experience(
        &self,
        description: &str,
    ) -> Result<EditResponse, AppError> {
        let description = validate_description(description)?;
        let entry = self.services.generator.work_experience(description).await?;
        self.append_generated(NewItem::WorkExperience(entry))
    }

    pub async fn generate_project(&self, description: &str) -> Result<EditResponse, AppError> {
        let description = validate_description(description)?;
        let entry = self.services.generator.project(description).await?;
        self.append_generated(NewItem::Project(entry))
    }

    /// Writes a summary generated from the canonical document into the
    /// summary editor's draft.
    pub async fn generate_summary(&self) -> Result<EditResponse, AppError> {
        let snapshot = self.bridge.snapshot();
        let summary = self.services.generator.summary(&snapshot.document).await?;
        self.set_field(
            SectionKind::Summary,
            FieldEdit {
                field: "summary".to_string(),
                value: Some(summary),
            },
        )
    }

    // ── Saving ──────────────────────────────────────────────────────────────

    pub async fn save(&self) -> Result<SaveReceipt, AppError> {
        let _guard = self.save_lock.lock().await;
        self.save_locked().await
    }

    /// Saves only when the document moved past the last saved revision.
    pub async fn save_if_dirty(&self) -> Result<Option<SaveReceipt>, AppError> {
        let _guard = self.save_lock.lock().await;
        if !self.is_dirty() {
            return Ok(None);
        }
        self.save_locked().await.map(Some)
    }

    pub fn close(&self) {
        if let Some(task) = lock(&self.autosave).take() {
            task.abort();
        }
        lock(&self.editors).unmount_all();
        info!("Closed session {}", self.id);
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn edit<T>(
        &self,
        kind: SectionKind,
        f: impl FnOnce(&mut SectionDraft, &IdMinter) -> Result<(T, EditOutcome), EditError>,
    ) -> Result<(T, EditOutcome, EditorView), AppError> {
        let (edited, view) = {
            let mut editors = lock(&self.editors);
            let snapshot = self.bridge.snapshot();
            let edited = editors.edit(kind, &snapshot.document, f)?;
            let view = editors.mount(kind, &snapshot.document).view();
            (edited, view)
        };
        let Edited {
            value,
            outcome,
            submission,
        } = edited;
        if let Some(submission) = submission {
            self.submit(submission);
        }
        Ok((value, outcome, view))
    }

    fn edit_photo(&self, photo: Option<Photo>) -> Result<EditResponse, AppError> {
        let ((), outcome, editor) = self.edit(SectionKind::PersonalInfo, |draft, _| {
            if let Some(info) = draft.personal_mut() {
                info.photo = photo;
            }
            Ok(((), EditOutcome::Changed))
        })?;
        Ok(EditResponse {
            outcome,
            item: None,
            editor,
        })
    }

    fn append_generated(&self, item: NewItem) -> Result<EditResponse, AppError> {
        let kind = item.section();
        let (id, outcome, editor) =
            self.edit(kind, |draft, ids| Ok((draft.append(item, ids)?, EditOutcome::Changed)))?;
        info!("Appended generated {kind} entry {id} in session {}", self.id);
        Ok(EditResponse {
            outcome,
            item: Some(id),
            editor,
        })
    }

    fn submit(&self, submission: DraftSubmission) {
        tokio::spawn(validate_and_merge(
            Arc::clone(&self.services.validator),
            Arc::clone(&self.editors),
            self.bridge.clone(),
            submission,
        ));
    }

    async fn save_locked(&self) -> Result<SaveReceipt, AppError> {
        let snapshot = self.bridge.snapshot();
        let result = self.persist(&snapshot).await;

        let mut state = lock(&self.save_state);
        match &result {
            Ok(receipt) => {
                state.saved_revision = receipt.revision;
                state.status = SaveStatus::Saved {
                    revision: receipt.revision,
                    resume_id: receipt.resume_id,
                    at: Utc::now(),
                };
            }
            Err(e) => {
                warn!("Save of session {} failed: {e}", self.id);
                state.status = SaveStatus::Failed {
                    revision: snapshot.revision,
                    message: e.to_string(),
                    at: Utc::now(),
                };
            }
        }
        result
    }

    async fn persist(&self, snapshot: &DocumentSnapshot) -> Result<SaveReceipt, AppError> {
        let document = snapshot.document.as_ref();

        let stored_photo = match &document.personal.photo {
            Some(Photo::Pending(photo)) => Some(StoredPhoto {
                token: photo.token,
                url: self.services.photos.upload(photo).await?,
            }),
            _ => None,
        };
        let update = match (&stored_photo, &document.personal.photo) {
            (Some(stored), _) => PhotoUpdate::Set(stored.url.clone()),
            (None, Some(Photo::Removed)) => PhotoUpdate::Clear,
            _ => PhotoUpdate::Keep,
        };

        let saved = match self.services.store.save(self.user_id, document, update).await {
            Ok(saved) => saved,
            Err(e) => {
                if let Some(stored) = &stored_photo {
                    self.discard_blob(&stored.url).await;
                }
                return Err(e.into());
            }
        };
        if let Some(url) = &saved.replaced_photo_url {
            self.discard_blob(url).await;
        }

        let outcome = self
            .bridge
            .confirm_saved(SaveConfirmation {
                id: saved.id,
                stored_photo: stored_photo.clone(),
            })
            .await?;
        if let Some(stored) = &stored_photo {
            lock(&self.editors).resolve_photo(stored.token, &stored.url);
        }

        // Anything merged between the snapshot and the confirmation is unsaved.
        let revision = match outcome {
            MergeOutcome::Merged { revision } if revision == snapshot.revision + 1 => revision,
            MergeOutcome::Unchanged { revision } if revision == snapshot.revision => revision,
            _ => snapshot.revision,
        };

        info!(
            "Saved session {} as resume {} at revision {revision}",
            self.id, saved.id
        );
        Ok(SaveReceipt {
            resume_id: saved.id,
            revision,
            updated_at: saved.updated_at,
        })
    }

    async fn discard_blob(&self, url: &str) {
        if let Err(e) = self.services.photos.delete(url).await {
            warn!("Could not delete photo {url}: {e}");
        }
    }
}

async fn validate_and_merge(
    validator: Arc<dyn DraftValidator>,
    editors: Arc<Mutex<EditorSet>>,
    bridge: BridgeHandle,
    submission: DraftSubmission,
) {
    let kind = submission.kind();
    let DraftSubmission { generation, draft } = submission;

    let report = validator.validate(&draft).await;
    let valid = report.is_valid();
    let accepted = lock(&editors).accept_report(kind, generation, report);
    if !accepted {
        return;
    }
    if !valid {
        debug!("{kind} draft at generation {generation} is invalid; not merged");
        lock(&editors).settle(kind, generation);
        return;
    }

    match bridge.merge(ValidatedDraft { generation, draft }).await {
        Ok(outcome) => debug!("{kind} generation {generation}: {outcome:?}"),
        Err(BridgeClosed) => debug!("Bridge closed before {kind} generation {generation} merged"),
    }
    lock(&editors).settle(kind, generation);
}

// ────────────────────────────────────────────────────────────────────────────
// SessionRegistry
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<EditorSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session on a stored resume, or on a blank document.
    pub async fn open(
        &self,
        services: &SessionServices,
        user_id: Uuid,
        resume_id: Option<Uuid>,
    ) -> Result<Arc<EditorSession>, AppError> {
        let document = match resume_id {
            Some(id) => services.store.load(user_id, id).await?,
            None => ResumeDocument::default(),
        };
        let session = EditorSession::start(user_id, document, services.clone());
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.id(), Arc::clone(&session));
        debug!("{} open sessions", self.len());
        Ok(session)
    }

    pub fn get(&self, id: Uuid) -> Result<Arc<EditorSession>, AppError> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    pub fn close(&self, id: Uuid) -> Result<(), AppError> {
        let session = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        session.close();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{PersonalInfo, WorkExperience};
    use crate::testing::{
        services, wait_for_revision, DelayedValidator, MemoryPhotoStorage, MemoryResumeStore,
    };
    use bytes::Bytes;

    fn open_blank(store: &Arc<MemoryResumeStore>, photos: &Arc<MemoryPhotoStorage>) -> Arc<EditorSession> {
        EditorSession::start(Uuid::new_v4(), ResumeDocument::default(), services(store, photos))
    }

    fn edit(field: &str, value: &str) -> FieldEdit {
        FieldEdit {
            field: field.to_string(),
            value: Some(value.to_string()),
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_reaches_document_after_validation() {
        let store = Arc::new(MemoryResumeStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        let session = open_blank(&store, &photos);

        let response = session
            .set_field(SectionKind::PersonalInfo, edit("first_name", "Ada"))
            .unwrap();
        assert_eq!(response.outcome, EditOutcome::Changed);
        assert!(response.editor.pending);
        assert_eq!(session.snapshot().revision, 0);

        wait_for_revision(&session, 1).await;
        assert_eq!(
            session.snapshot().document.personal.first_name.as_deref(),
            Some("Ada")
        );
        assert!(!session.editor_view(SectionKind::PersonalInfo).pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_draft_is_reported_not_merged() {
        let store = Arc::new(MemoryResumeStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        let session = open_blank(&store, &photos);

        session
            .set_field(SectionKind::PersonalInfo, edit("website_url", "not a url"))
            .unwrap();
        settle().await;

        let view = session.editor_view(SectionKind::PersonalInfo);
        assert!(!view.valid);
        assert_eq!(view.errors[0].path, "personal_info.website_url");
        assert_eq!(session.snapshot().revision, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_merge_only_the_latest() {
        let store = Arc::new(MemoryResumeStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        let session = open_blank(&store, &photos);

        session
            .set_field(SectionKind::Summary, edit("summary", "Draft one"))
            .unwrap();
        session
            .set_field(SectionKind::Summary, edit("summary", "Draft two"))
            .unwrap();
        settle().await;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.document.summary.as_deref(), Some("Draft two"));
        assert_eq!(snapshot.revision, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_validation_finishing_last_is_discarded() {
        let store = Arc::new(MemoryResumeStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        let mut services = services(&store, &photos);
        services.validator = Arc::new(DelayedValidator::new(|draft: &SectionDraft| match draft {
            SectionDraft::Summary(Some(text)) if text == "Draft one" => Duration::from_millis(900),
            _ => Duration::from_millis(100),
        }));
        let session = EditorSession::start(Uuid::new_v4(), ResumeDocument::default(), services);

        session
            .set_field(SectionKind::Summary, edit("summary", "Draft one"))
            .unwrap();
        session
            .set_field(SectionKind::Summary, edit("summary", "Draft two"))
            .unwrap();

        wait_for_revision(&session, 1).await;
        assert_eq!(session.snapshot().document.summary.as_deref(), Some("Draft two"));

        // Let the first draft's validation finish well after the second merged.
        settle().await;
        let snapshot = session.snapshot();
        assert_eq!(snapshot.document.summary.as_deref(), Some("Draft two"));
        assert_eq!(snapshot.revision, 1);
        let view = session.editor_view(SectionKind::Summary);
        assert_eq!(view.generation, 2);
        assert!(!view.pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remount_during_validation_keeps_edit() {
        let store = Arc::new(MemoryResumeStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        let session = open_blank(&store, &photos);

        session.go_to_step("personal-info").unwrap();
        session
            .set_field(SectionKind::PersonalInfo, edit("first_name", "Ada"))
            .unwrap();
        session.go_to_step("work-experience").unwrap();
        session.go_to_step("personal-info").unwrap();

        let view = session.editor_view(SectionKind::PersonalInfo);
        assert!(view.pending);
        assert_eq!(
            view.draft.personal().and_then(|p| p.first_name.as_deref()),
            Some("Ada")
        );

        wait_for_revision(&session, 1).await;
        session
            .set_field(SectionKind::PersonalInfo, edit("last_name", "Lovelace"))
            .unwrap();
        wait_for_revision(&session, 2).await;

        let personal = &session.snapshot().document.personal;
        assert_eq!(personal.first_name.as_deref(), Some("Ada"));
        assert_eq!(personal.last_name.as_deref(), Some("Lovelace"));

        // Once settled, a remount reads the canonical document again.
        session.go_to_step("skills").unwrap();
        session.go_to_step("personal-info").unwrap();
        let view = session.editor_view(SectionKind::PersonalInfo);
        assert!(!view.pending);
        assert_eq!(
            view.draft.personal().and_then(|p| p.last_name.as_deref()),
            Some("Lovelace")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_edit_is_ignored() {
        let store = Arc::new(MemoryResumeStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        let session = open_blank(&store, &photos);

        let response = session
            .set_item_field(SectionKind::WorkExperiences, ItemId::from(99), edit("company", "Acme"))
            .unwrap();
        assert_eq!(response.outcome, EditOutcome::Ignored);
        assert_eq!(response.editor.generation, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_go_to_step_swaps_mounted_editor() {
        let store = Arc::new(MemoryResumeStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        let session = open_blank(&store, &photos);
        assert_eq!(session.view().mounted, vec![SectionKind::GeneralInfo]);

        let view = session.go_to_step("education").unwrap();
        assert_eq!(view.step.current.key, "education");
        assert_eq!(view.step.previous, Some("work-experience"));
        assert_eq!(view.mounted, vec![SectionKind::Educations]);

        assert!(matches!(
            session.go_to_step("hobbies"),
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_appended_items_keep_identity_through_reorder() {
        let store = Arc::new(MemoryResumeStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        let session = open_blank(&store, &photos);

        let first = session.append_item(SectionKind::Languages).unwrap().item.unwrap();
        let second = session.append_item(SectionKind::Languages).unwrap().item.unwrap();
        session
            .set_item_field(SectionKind::Languages, first, edit("name", "English"))
            .unwrap();
        session
            .set_item_field(SectionKind::Languages, second, edit("name", "Spanish"))
            .unwrap();
        let response = session
            .reorder(SectionKind::Languages, ReorderRequest::Positions { from: 1, to: 0 })
            .unwrap();
        assert_eq!(response.outcome, EditOutcome::Changed);
        settle().await;

        let names: Vec<_> = session
            .snapshot()
            .document
            .languages
            .iter()
            .map(|l| l.name.clone())
            .collect();
        assert_eq!(names, vec!["Spanish", "English"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_uploads_pending_photo_and_resolves_url() {
        let store = Arc::new(MemoryResumeStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        let session = open_blank(&store, &photos);

        let photo = PendingPhoto::new("me.png", "image/png", Bytes::from_static(b"png"));
        let token = photo.token;
        session.set_photo(photo).unwrap();
        assert!(session.photo_preview(token).is_some());
        wait_for_revision(&session, 1).await;

        let receipt = session.save().await.unwrap();
        let url = format!("https://photos.test/resume_photos/{token}.png");
        assert_eq!(photos.uploaded(), vec![url.clone()]);
        let stored = store.get(receipt.resume_id).unwrap();
        assert_eq!(stored.personal.photo, Some(Photo::Url { url: url.clone() }));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.document.id, Some(receipt.resume_id));
        assert_eq!(snapshot.document.personal.photo, Some(Photo::Url { url }));
        assert_eq!(receipt.revision, snapshot.revision);
        assert!(!session.is_dirty());
        assert!(session.photo_preview(token).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_upload_leaves_document_untouched() {
        let store = Arc::new(MemoryResumeStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        photos.fail_uploads(true);
        let session = open_blank(&store, &photos);

        session
            .set_photo(PendingPhoto::new("me.png", "image/png", Bytes::from_static(b"png")))
            .unwrap();
        wait_for_revision(&session, 1).await;

        assert!(matches!(session.save().await, Err(AppError::Storage(_))));
        let snapshot = session.snapshot();
        assert!(matches!(
            snapshot.document.personal.photo,
            Some(Photo::Pending(_))
        ));
        assert_eq!(snapshot.document.id, None);
        assert!(session.is_dirty());
        assert!(matches!(session.view().save_status, SaveStatus::Failed { .. }));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removing_photo_clears_stored_blob() {
        let store = Arc::new(MemoryResumeStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        let user_id = Uuid::new_v4();
        let url = "https://photos.test/resume_photos/old.png".to_string();
        let resume_id = store.insert(
            user_id,
            ResumeDocument {
                personal: PersonalInfo {
                    photo: Some(Photo::Url { url: url.clone() }),
                    ..Default::default()
                },
                ..Default::default()
            },
        );

        let registry = SessionRegistry::new();
        let session = registry
            .open(&services(&store, &photos), user_id, Some(resume_id))
            .await
            .unwrap();
        session.go_to_step("personal-info").unwrap();
        session.remove_photo().unwrap();
        wait_for_revision(&session, 1).await;
        session.save().await.unwrap();

        assert_eq!(store.get(resume_id).unwrap().personal.photo, None);
        assert_eq!(photos.deleted(), vec![url]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generated_work_experience_is_appended() {
        let store = Arc::new(MemoryResumeStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        let session = open_blank(&store, &photos);

        let response = session
            .generate_work_experience("Backend engineer at Acme since 2020, built billing")
            .await
            .unwrap();
        assert!(response.item.is_some());
        settle().await;

        assert_eq!(
            session.snapshot().document.work_experiences,
            vec![WorkExperience {
                position: Some("Backend Engineer".to_string()),
                company: Some("Acme".to_string()),
                ..Default::default()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_rejects_short_description() {
        let store = Arc::new(MemoryResumeStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        let session = open_blank(&store, &photos);

        let err = session.generate_project("  tiny  ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(session.view().mounted.contains(&SectionKind::GeneralInfo));
        assert!(!session.view().mounted.contains(&SectionKind::Projects));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generated_summary_lands_in_summary_draft() {
        let store = Arc::new(MemoryResumeStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        let session = open_blank(&store, &photos);

        let response = session.generate_summary().await.unwrap();
        assert!(matches!(
            response.editor.draft,
            SectionDraft::Summary(Some(ref text)) if text == "Seasoned engineer."
        ));
    }

    #[tokio::test]
    async fn test_registry_open_missing_resume_is_not_found() {
        let store = Arc::new(MemoryResumeStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        let registry = SessionRegistry::new();
        let result = registry
            .open(&services(&store, &photos), Uuid::new_v4(), Some(Uuid::new_v4()))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn test_registry_close_forgets_session() {
        let store = Arc::new(MemoryResumeStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        let registry = SessionRegistry::new();
        let session = registry
            .open(&services(&store, &photos), Uuid::new_v4(), None)
            .await
            .unwrap();

        registry.close(session.id()).unwrap();
        assert!(session.view().mounted.is_empty());
        assert!(registry.get(session.id()).is_err());
        assert!(registry.close(session.id()).is_err());
    }
}
