// External collaborators: the resume store (Postgres) and photo blob storage (S3).

pub mod blobs;
pub mod handlers;
pub mod store;

pub use blobs::{BlobError, PhotoStorage, S3PhotoStorage};
pub use store::{PgResumeStore, PhotoUpdate, ResumeStore, ResumeSummary, SavedResume, StoreError};
