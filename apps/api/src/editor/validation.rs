//! Draft validation.
//!
//! Two levels: a `FieldError` is reported inline for one field; a section is
//! valid only when its draft carries no field errors. Only valid drafts reach
//! the bridge. Nothing here returns `Err`: reports are values the editor keeps.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use crate::document::{PendingPhoto, Photo};
use crate::editor::section::SectionDraft;

pub const DEFAULT_PHOTO_MAX_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// `section.field` or `section.<item id>.field`.
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionReport {
    pub errors: Vec<FieldError>,
}

impl SectionReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, path: String, message: impl Into<String>) {
        self.errors.push(FieldError {
            path,
            message: message.into(),
        });
    }
}

#[derive(Debug, Clone)]
pub struct ValidationRules {
    pub photo_max_bytes: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            photo_max_bytes: DEFAULT_PHOTO_MAX_BYTES,
        }
    }
}

/// Validates a section draft. The suspension point between an edit and the
/// bridge merge lives behind this trait.
#[async_trait]
pub trait DraftValidator: Send + Sync {
    async fn validate(&self, draft: &SectionDraft) -> SectionReport;
}

/// Default validator: waits out the debounce window, then runs the shape rules.
pub struct SchemaValidator {
    rules: ValidationRules,
    debounce: Duration,
}

impl SchemaValidator {
    pub fn new(rules: ValidationRules, debounce: Duration) -> Self {
        Self { rules, debounce }
    }
}

#[async_trait]
impl DraftValidator for SchemaValidator {
    async fn validate(&self, draft: &SectionDraft) -> SectionReport {
        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        validate_draft(draft, &self.rules)
    }
}

pub fn validate_draft(draft: &SectionDraft, rules: &ValidationRules) -> SectionReport {
    let mut report = SectionReport::default();
    let section = draft.kind().as_str();
    let path = |field: &str| format!("{section}.{field}");

    match draft {
        SectionDraft::GeneralInfo(_) | SectionDraft::Skills(_) | SectionDraft::Summary(_) => {}
        SectionDraft::PersonalInfo(info) => {
            if let Some(Photo::Pending(photo)) = &info.photo {
                check_photo(&mut report, path("photo"), photo, rules);
            }
            check_url(&mut report, path("website_url"), &info.website_url);
            check_url(&mut report, path("linkedin_url"), &info.linkedin_url);
            check_url(&mut report, path("github_url"), &info.github_url);
        }
        SectionDraft::WorkExperiences(list) => {
            for item in list.iter() {
                let path = |field: &str| format!("{section}.{}.{field}", item.id);
                check_date(&mut report, path("start_date"), &item.value.start_date);
                check_date(&mut report, path("end_date"), &item.value.end_date);
            }
        }
        SectionDraft::Educations(list) => {
            for item in list.iter() {
                let path = |field: &str| format!("{section}.{}.{field}", item.id);
                check_date(&mut report, path("start_date"), &item.value.start_date);
                check_date(&mut report, path("end_date"), &item.value.end_date);
            }
        }
        SectionDraft::Projects(list) => {
            for item in list.iter() {
                let path = |field: &str| format!("{section}.{}.{field}", item.id);
                check_date(&mut report, path("start_date"), &item.value.start_date);
                check_date(&mut report, path("end_date"), &item.value.end_date);
                check_url(&mut report, path("link_code"), &item.value.link_code);
                check_url(&mut report, path("link_deploy"), &item.value.link_deploy);
            }
        }
        SectionDraft::Languages(list) => {
            for item in list.iter() {
                if item.value.name.trim().is_empty() {
                    report.push(format!("{section}.{}.name", item.id), "Name is required");
                }
            }
        }
        SectionDraft::Presentation(presentation) => {
            if let Some(color) = present(&presentation.color_hex) {
                if !is_hex_color(color) {
                    report.push(path("color_hex"), "Must be a hex color such as #1a2b3c");
                }
            }
        }
    }

    report
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn check_url(report: &mut SectionReport, path: String, value: &Option<String>) {
    let Some(raw) = present(value) else { return };
    let valid = reqwest::Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false);
    if !valid {
        report.push(path, "Invalid url");
    }
}

fn check_date(report: &mut SectionReport, path: String, value: &Option<String>) {
    let Some(raw) = present(value) else { return };
    if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_err() {
        report.push(path, "Date must use the YYYY-MM-DD format");
    }
}

fn check_photo(report: &mut SectionReport, path: String, photo: &PendingPhoto, rules: &ValidationRules) {
    if !photo.content_type.starts_with("image/") {
        report.push(path.clone(), "Must be an image file");
    }
    if photo.size >= rules.photo_max_bytes {
        report.push(
            path,
            format!("File must be less than {}", human_size(rules.photo_max_bytes)),
        );
    }
}

fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

fn human_size(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= 1024 && bytes % 1024 == 0 {
        format!("{}KB", bytes / 1024)
    } else {
        format!("{bytes} bytes")
    }
}
