// Section Editors: one local, validated draft per logical section.
// Editors never write the canonical document; they hand validated drafts to the bridge.

pub mod editor;
pub mod fields;
pub mod photo;
pub mod section;
pub mod validation;

use thiserror::Error;

pub use editor::{DraftSubmission, EditOutcome, Edited, EditorSet, EditorView, Generation, SectionEditor};
pub use fields::FieldEdit;
pub use photo::{PhotoPreview, PhotoPreviews};
pub use section::{NewItem, SectionDraft, SectionKind};
pub use validation::{DraftValidator, FieldError, SchemaValidator, SectionReport, ValidationRules};

/// An edit operation the editor refuses outright. Distinct from validation
/// failures, which are recorded on the draft and never raised.
#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("unknown section '{0}'")]
    UnknownSection(String),

    #[error("unknown step '{0}'")]
    UnknownStep(String),

    #[error("section '{section}' has no field '{field}'")]
    UnknownField { section: SectionKind, field: String },

    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("section '{0}' is not a collection")]
    NotACollection(SectionKind),

    #[error("section '{0}' is a collection; edit its items instead")]
    IsACollection(SectionKind),

    #[error("cannot add a {item} entry to section '{section}'")]
    MismatchedItem { section: SectionKind, item: SectionKind },
}
