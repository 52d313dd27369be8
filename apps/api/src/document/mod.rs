// Document Model: the canonical in-memory resume and its building blocks.

pub mod identity;
pub mod model;
pub mod text;

pub use identity::{IdMinter, ItemId, Keyed, KeyedList};
pub use model::{
    BorderStyle, Education, GeneralInfo, Language, LanguageLevel, PendingPhoto, PersonalInfo,
    Photo, Presentation, Project, ResumeDocument, WorkExperience,
};
