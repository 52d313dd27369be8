//! Section kinds and their drafts.
//!
//! Sections own disjoint parts of `ResumeDocument`, so merging one section's
//! draft never touches another section's fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::text::normalize;
use crate::document::{
    Education, GeneralInfo, IdMinter, ItemId, KeyedList, Language, PersonalInfo, Presentation,
    Project, ResumeDocument, WorkExperience,
};
use crate::editor::editor::EditOutcome;
use crate::editor::fields::{set_list_field, EditableRecord};
use crate::editor::EditError;
use crate::reorder::{self, ReorderRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    GeneralInfo,
    PersonalInfo,
    WorkExperiences,
    Educations,
    Projects,
    Languages,
    Skills,
    Summary,
    Presentation,
}

impl SectionKind {
    pub const ALL: [SectionKind; 9] = [
        SectionKind::GeneralInfo,
        SectionKind::PersonalInfo,
        SectionKind::WorkExperiences,
        SectionKind::Educations,
        SectionKind::Projects,
        SectionKind::Languages,
        SectionKind::Skills,
        SectionKind::Summary,
        SectionKind::Presentation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::GeneralInfo => "general_info",
            SectionKind::PersonalInfo => "personal_info",
            SectionKind::WorkExperiences => "work_experiences",
            SectionKind::Educations => "educations",
            SectionKind::Projects => "projects",
            SectionKind::Languages => "languages",
            SectionKind::Skills => "skills",
            SectionKind::Summary => "summary",
            SectionKind::Presentation => "presentation",
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            SectionKind::WorkExperiences
                | SectionKind::Educations
                | SectionKind::Projects
                | SectionKind::Languages
        )
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = EditError;

    /// Accepts both `work_experiences` and `work-experiences`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| EditError::UnknownSection(s.to_string()))
    }
}

/// A new collection entry, e.g. one produced by the AI text generator.
#[derive(Debug, Clone, PartialEq)]
pub enum NewItem {
    WorkExperience(WorkExperience),
    Education(Education),
    Project(Project),
    Language(Language),
}

impl NewItem {
    pub fn section(&self) -> SectionKind {
        match self {
            NewItem::WorkExperience(_) => SectionKind::WorkExperiences,
            NewItem::Education(_) => SectionKind::Educations,
            NewItem::Project(_) => SectionKind::Projects,
            NewItem::Language(_) => SectionKind::Languages,
        }
    }
}

/// The editable slice of the document owned by one section editor.
/// Collection drafts carry stable identities; the canonical document does not.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "section", content = "draft", rename_all = "snake_case")]
pub enum SectionDraft {
    GeneralInfo(GeneralInfo),
    PersonalInfo(PersonalInfo),
    WorkExperiences(KeyedList<WorkExperience>),
    Educations(KeyedList<Education>),
    Projects(KeyedList<Project>),
    Languages(KeyedList<Language>),
    Skills(Vec<String>),
    Summary(Option<String>),
    Presentation(Presentation),
}

macro_rules! with_list {
    ($draft:expr, |$list:ident| $body:expr) => {
        match $draft {
            SectionDraft::WorkExperiences($list) => $body,
            SectionDraft::Educations($list) => $body,
            SectionDraft::Projects($list) => $body,
            SectionDraft::Languages($list) => $body,
            other => Err(EditError::NotACollection(other.kind())),
        }
    };
}

impl SectionDraft {
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionDraft::GeneralInfo(_) => SectionKind::GeneralInfo,
            SectionDraft::PersonalInfo(_) => SectionKind::PersonalInfo,
            SectionDraft::WorkExperiences(_) => SectionKind::WorkExperiences,
            SectionDraft::Educations(_) => SectionKind::Educations,
            SectionDraft::Projects(_) => SectionKind::Projects,
            SectionDraft::Languages(_) => SectionKind::Languages,
            SectionDraft::Skills(_) => SectionKind::Skills,
            SectionDraft::Summary(_) => SectionKind::Summary,
            SectionDraft::Presentation(_) => SectionKind::Presentation,
        }
    }

    /// Initializes a draft from the current canonical slice, minting fresh
    /// identities for collection entries.
    pub fn from_document(kind: SectionKind, document: &ResumeDocument, ids: &IdMinter) -> Self {
        match kind {
            SectionKind::GeneralInfo => SectionDraft::GeneralInfo(document.general.clone()),
            SectionKind::PersonalInfo => SectionDraft::PersonalInfo(document.personal.clone()),
            SectionKind::WorkExperiences => SectionDraft::WorkExperiences(KeyedList::from_values(
                document.work_experiences.iter().cloned(),
                ids,
            )),
            SectionKind::Educations => SectionDraft::Educations(KeyedList::from_values(
                document.educations.iter().cloned(),
                ids,
            )),
            SectionKind::Projects => {
                SectionDraft::Projects(KeyedList::from_values(document.projects.iter().cloned(), ids))
            }
            SectionKind::Languages => SectionDraft::Languages(KeyedList::from_values(
                document.languages.iter().cloned(),
                ids,
            )),
            SectionKind::Skills => SectionDraft::Skills(document.skills.clone()),
            SectionKind::Summary => SectionDraft::Summary(document.summary.clone()),
            SectionKind::Presentation => SectionDraft::Presentation(document.presentation.clone()),
        }
    }

    /// Returns a new document equal to `document` with only this section replaced.
    /// Strings are trimmed, blank values dropped, and empty projects filtered out.
    pub fn apply_to(&self, document: &ResumeDocument) -> ResumeDocument {
        let mut next = document.clone();
        match self {
            SectionDraft::GeneralInfo(info) => {
                next.general = GeneralInfo {
                    title: normalize(info.title.as_deref()),
                    description: normalize(info.description.as_deref()),
                };
            }
            SectionDraft::PersonalInfo(info) => next.personal = normalized_personal(info),
            SectionDraft::WorkExperiences(list) => {
                next.work_experiences = list.iter().map(|k| k.value.normalized()).collect();
            }
            SectionDraft::Educations(list) => {
                next.educations = list.iter().map(|k| k.value.normalized()).collect();
            }
            SectionDraft::Projects(list) => {
                next.projects = list
                    .iter()
                    .filter(|k| !k.value.is_empty())
                    .map(|k| k.value.normalized())
                    .collect();
            }
            SectionDraft::Languages(list) => {
                next.languages = list.iter().map(|k| k.value.normalized()).collect();
            }
            SectionDraft::Skills(skills) => {
                next.skills = skills
                    .iter()
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            SectionDraft::Summary(summary) => next.summary = normalize(summary.as_deref()),
            SectionDraft::Presentation(presentation) => {
                next.presentation = Presentation {
                    color_hex: normalize(presentation.color_hex.as_deref()),
                    border_style: presentation.border_style,
                };
            }
        }
        next
    }

    pub fn personal(&self) -> Option<&PersonalInfo> {
        match self {
            SectionDraft::PersonalInfo(info) => Some(info),
            _ => None,
        }
    }

    pub fn personal_mut(&mut self) -> Option<&mut PersonalInfo> {
        match self {
            SectionDraft::PersonalInfo(info) => Some(info),
            _ => None,
        }
    }

    /// Edits a scalar field of a non-collection section.
    pub fn set_field(&mut self, field: &str, value: Option<String>) -> Result<(), EditError> {
        match self {
            SectionDraft::GeneralInfo(info) => info.set_field(field, value),
            SectionDraft::PersonalInfo(info) => info.set_field(field, value),
            SectionDraft::Presentation(presentation) => presentation.set_field(field, value),
            SectionDraft::Skills(skills) => match field {
                "skills" => {
                    *skills = value
                        .as_deref()
                        .map(crate::document::text::parse_list)
                        .unwrap_or_default();
                    Ok(())
                }
                _ => Err(unknown_field(SectionKind::Skills, field)),
            },
            SectionDraft::Summary(summary) => match field {
                "summary" => {
                    *summary = value;
                    Ok(())
                }
                _ => Err(unknown_field(SectionKind::Summary, field)),
            },
            other => Err(EditError::IsACollection(other.kind())),
        }
    }

    /// Edits a field of the collection entry carrying `id`.
    /// An unknown identity is ignored rather than rejected.
    pub fn set_item_field(
        &mut self,
        id: ItemId,
        field: &str,
        value: Option<String>,
    ) -> Result<EditOutcome, EditError> {
        with_list!(self, |list| set_list_field(list, id, field, value))
    }

    pub fn append_blank(&mut self, ids: &IdMinter) -> Result<ItemId, EditError> {
        with_list!(self, |list| Ok(list.push(Default::default(), ids)))
    }

    pub fn append(&mut self, item: NewItem, ids: &IdMinter) -> Result<ItemId, EditError> {
        match (self, item) {
            (SectionDraft::WorkExperiences(list), NewItem::WorkExperience(value)) => {
                Ok(list.push(value, ids))
            }
            (SectionDraft::Educations(list), NewItem::Education(value)) => Ok(list.push(value, ids)),
            (SectionDraft::Projects(list), NewItem::Project(value)) => Ok(list.push(value, ids)),
            (SectionDraft::Languages(list), NewItem::Language(value)) => Ok(list.push(value, ids)),
            (draft, item) => Err(EditError::MismatchedItem {
                section: draft.kind(),
                item: item.section(),
            }),
        }
    }

    pub fn remove_item(&mut self, id: ItemId) -> Result<EditOutcome, EditError> {
        with_list!(self, |list| Ok(outcome(list.remove(id).is_some())))
    }

    pub fn reorder(&mut self, request: ReorderRequest) -> Result<EditOutcome, EditError> {
        with_list!(self, |list| Ok(outcome(reorder::apply(list, request))))
    }
}

fn outcome(changed: bool) -> EditOutcome {
    if changed {
        EditOutcome::Changed
    } else {
        EditOutcome::Ignored
    }
}

pub(crate) fn unknown_field(section: SectionKind, field: &str) -> EditError {
    EditError::UnknownField {
        section,
        field: field.to_string(),
    }
}

fn normalized_personal(info: &PersonalInfo) -> PersonalInfo {
    PersonalInfo {
        photo: info.photo.clone(),
        first_name: normalize(info.first_name.as_deref()),
        last_name: normalize(info.last_name.as_deref()),
        job_title: normalize(info.job_title.as_deref()),
        city: normalize(info.city.as_deref()),
        country: normalize(info.country.as_deref()),
        phone: normalize(info.phone.as_deref()),
        email: normalize(info.email.as_deref()),
        website_url: normalize(info.website_url.as_deref()),
        linkedin_url: normalize(info.linkedin_url.as_deref()),
        github_url: normalize(info.github_url.as_deref()),
    }
}
