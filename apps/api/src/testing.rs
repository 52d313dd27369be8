//! In-memory collaborators for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::document::{PendingPhoto, Photo, Project, ResumeDocument, WorkExperience};
use crate::editor::validation::validate_draft;
use crate::editor::{DraftValidator, SchemaValidator, SectionDraft, SectionReport, ValidationRules};
use crate::generation::{GenerationError, TextGenerator};
use crate::session::{EditorSession, SessionServices};
use crate::storage::blobs::photo_key;
use crate::storage::{BlobError, PhotoStorage, PhotoUpdate, ResumeStore, ResumeSummary, SavedResume, StoreError};
use crate::sync::Revision;

pub const VALIDATION_DEBOUNCE: Duration = Duration::from_millis(300);
pub const AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(1500);

pub fn services(store: &Arc<MemoryResumeStore>, photos: &Arc<MemoryPhotoStorage>) -> SessionServices {
    SessionServices {
        store: store.clone(),
        photos: photos.clone(),
        validator: Arc::new(SchemaValidator::new(
            ValidationRules::default(),
            VALIDATION_DEBOUNCE,
        )),
        generator: Arc::new(FakeTextGenerator),
        autosave_debounce: AUTOSAVE_DEBOUNCE,
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/vitae_test".to_string(),
        s3_bucket: "vitae".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        s3_public_url: "http://localhost:9000".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        anthropic_api_key: "test".to_string(),
        port: 8080,
        rust_log: "debug".to_string(),
        validation_debounce: VALIDATION_DEBOUNCE,
        autosave_debounce: AUTOSAVE_DEBOUNCE,
        photo_max_bytes: ValidationRules::default().photo_max_bytes,
    }
}

/// Polls until the canonical document reaches `revision`.
pub async fn wait_for_revision(session: &EditorSession, revision: Revision) {
    let reached = tokio::time::timeout(Duration::from_secs(30), async {
        while session.snapshot().revision < revision {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "revision {revision} never reached");
}

/// Runs the shape rules after a delay chosen per draft, so tests can make an
/// older draft finish validating after a newer one.
pub struct DelayedValidator<F> {
    delay: F,
}

impl<F> DelayedValidator<F>
where
    F: Fn(&SectionDraft) -> Duration + Send + Sync,
{
    pub fn new(delay: F) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl<F> DraftValidator for DelayedValidator<F>
where
    F: Fn(&SectionDraft) -> Duration + Send + Sync,
{
    async fn validate(&self, draft: &SectionDraft) -> SectionReport {
        tokio::time::sleep((self.delay)(draft)).await;
        validate_draft(draft, &ValidationRules::default())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resume store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct StoredEntry {
    user_id: Uuid,
    document: ResumeDocument,
}

#[derive(Default)]
pub struct MemoryResumeStore {
    resumes: Mutex<HashMap<Uuid, StoredEntry>>,
    saves: AtomicUsize,
    fail: AtomicBool,
}

impl MemoryResumeStore {
    pub fn insert(&self, user_id: Uuid, mut document: ResumeDocument) -> Uuid {
        let id = Uuid::new_v4();
        document.id = Some(id);
        self.resumes
            .lock()
            .unwrap()
            .insert(id, StoredEntry { user_id, document });
        id
    }

    pub fn get(&self, id: Uuid) -> Option<ResumeDocument> {
        self.resumes
            .lock()
            .unwrap()
            .get(&id)
            .map(|entry| entry.document.clone())
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

fn stored_url(document: &ResumeDocument) -> Option<String> {
    match &document.personal.photo {
        Some(Photo::Url { url }) => Some(url.clone()),
        _ => None,
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn load(&self, user_id: Uuid, id: Uuid) -> Result<ResumeDocument, StoreError> {
        self.resumes
            .lock()
            .unwrap()
            .get(&id)
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.document.clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn save(
        &self,
        user_id: Uuid,
        document: &ResumeDocument,
        photo: PhotoUpdate,
    ) -> Result<SavedResume, StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut resumes = self.resumes.lock().unwrap();
        let id = document.id.unwrap_or_else(Uuid::new_v4);
        let previous = match document.id {
            Some(id) => {
                let entry = resumes
                    .get(&id)
                    .filter(|entry| entry.user_id == user_id)
                    .ok_or(StoreError::NotFound(id))?;
                stored_url(&entry.document)
            }
            None => None,
        };

        let (url, replaced) = match photo {
            PhotoUpdate::Keep => (previous, None),
            PhotoUpdate::Set(url) => {
                let replaced = previous.filter(|p| *p != url);
                (Some(url), replaced)
            }
            PhotoUpdate::Clear => (None, previous),
        };

        let mut stored = document.clone();
        stored.id = Some(id);
        stored.projects.retain(|project| !project.is_empty());
        stored.personal.photo = url.map(|url| Photo::Url { url });
        resumes.insert(
            id,
            StoredEntry {
                user_id,
                document: stored,
            },
        );
        self.saves.fetch_add(1, Ordering::SeqCst);

        Ok(SavedResume {
            id,
            updated_at: Utc::now(),
            replaced_photo_url: replaced,
        })
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<ResumeSummary>, StoreError> {
        Ok(self
            .resumes
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, entry)| entry.user_id == user_id)
            .map(|(id, entry)| ResumeSummary {
                id: *id,
                title: entry.document.general.title.clone(),
                updated_at: Utc::now(),
            })
            .collect())
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<Option<String>, StoreError> {
        let mut resumes = self.resumes.lock().unwrap();
        match resumes.get(&id) {
            Some(entry) if entry.user_id == user_id => {
                let url = stored_url(&entry.document);
                resumes.remove(&id);
                Ok(url)
            }
            _ => Err(StoreError::NotFound(id)),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Photo storage
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryPhotoStorage {
    uploaded: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl MemoryPhotoStorage {
    pub fn fail_uploads(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl PhotoStorage for MemoryPhotoStorage {
    async fn upload(&self, photo: &PendingPhoto) -> Result<String, BlobError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BlobError::Upload("storage unavailable".to_string()));
        }
        let url = format!("https://photos.test/{}", photo_key(photo));
        self.uploaded.lock().unwrap().push(url.clone());
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        self.deleted.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Text generation
// ────────────────────────────────────────────────────────────────────────────

pub struct FakeTextGenerator;

#[async_trait]
impl TextGenerator for FakeTextGenerator {
    async fn work_experience(&self, _description: &str) -> Result<WorkExperience, GenerationError> {
        Ok(WorkExperience {
            position: Some("Backend Engineer".to_string()),
            company: Some("Acme".to_string()),
            ..Default::default()
        })
    }

    async fn project(&self, _description: &str) -> Result<Project, GenerationError> {
        Ok(Project {
            name: Some("Expense tracker".to_string()),
            technologies: vec!["React".to_string(), "Prisma".to_string()],
            ..Default::default()
        })
    }

    async fn summary(&self, _document: &ResumeDocument) -> Result<String, GenerationError> {
        Ok("Seasoned engineer.".to_string())
    }
}
