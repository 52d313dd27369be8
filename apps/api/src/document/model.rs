//! The canonical resume document and the records it aggregates.
//!
//! `ResumeDocument` has no mutation API of its own: every change produces a new
//! value (see `SectionDraft::apply_to`), which keeps change detection in the
//! synchronization bridge a plain equality check.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::text::{is_blank, normalize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeDocument {
    pub id: Option<Uuid>,
    pub general: GeneralInfo,
    pub personal: PersonalInfo,
    pub work_experiences: Vec<WorkExperience>,
    pub educations: Vec<Education>,
    pub projects: Vec<Project>,
    pub languages: Vec<Language>,
    pub skills: Vec<String>,
    pub summary: Option<String>,
    pub presentation: Presentation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralInfo {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    /// `None` means no photo has been chosen in this session or hydrated.
    pub photo: Option<Photo>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_title: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
}

/// The three photo states: a payload awaiting upload, a stored URL, or an
/// explicit removal that the next save must apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Photo {
    Pending(PendingPhoto),
    Url { url: String },
    Removed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingPhoto {
    /// Identifies this payload across the editor, the bridge and the save path.
    pub token: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
    #[serde(skip)]
    pub bytes: Bytes,
}

impl PendingPhoto {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            token: Uuid::new_v4(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            size: bytes.len(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub position: Option<String>,
    pub company: Option<String>,
    /// ISO `YYYY-MM-DD`; absent end date means ongoing.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

impl WorkExperience {
    pub fn is_blank(&self) -> bool {
        is_blank(&self.position)
            && is_blank(&self.company)
            && is_blank(&self.start_date)
            && is_blank(&self.end_date)
            && is_blank(&self.description)
    }

    pub fn normalized(&self) -> Self {
        Self {
            position: normalize(self.position.as_deref()),
            company: normalize(self.company.as_deref()),
            start_date: normalize(self.start_date.as_deref()),
            end_date: normalize(self.end_date.as_deref()),
            description: normalize(self.description.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl Education {
    pub fn is_blank(&self) -> bool {
        is_blank(&self.institution)
            && is_blank(&self.degree)
            && is_blank(&self.start_date)
            && is_blank(&self.end_date)
    }

    pub fn normalized(&self) -> Self {
        Self {
            institution: normalize(self.institution.as_deref()),
            degree: normalize(self.degree.as_deref()),
            start_date: normalize(self.start_date.as_deref()),
            end_date: normalize(self.end_date.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub link_code: Option<String>,
    pub link_deploy: Option<String>,
    pub technologies: Vec<String>,
}

impl Project {
    /// A project with every field blank is not a real entry.
    pub fn is_empty(&self) -> bool {
        is_blank(&self.name)
            && is_blank(&self.description)
            && is_blank(&self.start_date)
            && is_blank(&self.end_date)
            && is_blank(&self.link_code)
            && is_blank(&self.link_deploy)
            && self.technologies.iter().all(|t| t.trim().is_empty())
    }

    pub fn normalized(&self) -> Self {
        Self {
            name: normalize(self.name.as_deref()),
            description: normalize(self.description.as_deref()),
            start_date: normalize(self.start_date.as_deref()),
            end_date: normalize(self.end_date.as_deref()),
            link_code: normalize(self.link_code.as_deref()),
            link_deploy: normalize(self.link_deploy.as_deref()),
            technologies: self
                .technologies
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    pub level: LanguageLevel,
}

impl Language {
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            level: self.level,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LanguageLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Native,
}

impl LanguageLevel {
    pub const ALL: [LanguageLevel; 4] = [
        LanguageLevel::Beginner,
        LanguageLevel::Intermediate,
        LanguageLevel::Advanced,
        LanguageLevel::Native,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageLevel::Beginner => "Beginner",
            LanguageLevel::Intermediate => "Intermediate",
            LanguageLevel::Advanced => "Advanced",
            LanguageLevel::Native => "Native",
        }
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown language level '{s}'"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub color_hex: Option<String>,
    pub border_style: Option<BorderStyle>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    Square,
    Circle,
    Rounded,
}

impl BorderStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorderStyle::Square => "square",
            BorderStyle::Circle => "circle",
            BorderStyle::Rounded => "rounded",
        }
    }
}

impl FromStr for BorderStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "square" => Ok(BorderStyle::Square),
            "circle" => Ok(BorderStyle::Circle),
            "rounded" => Ok(BorderStyle::Rounded),
            other => Err(format!("unknown border style '{other}'")),
        }
    }
}
