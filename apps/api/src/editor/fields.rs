//! Field-level edit operations.
//!
//! Values are stored as typed; shape problems (bad URL, malformed date) are left
//! in the draft for validation to report. Only values that cannot be
//! represented at all, such as an unknown language level, are refused here.

use serde::Deserialize;

use crate::document::text::parse_list;
use crate::document::{
    Education, GeneralInfo, ItemId, KeyedList, Language, PersonalInfo, Presentation, Project,
    WorkExperience,
};
use crate::editor::editor::EditOutcome;
use crate::editor::section::{unknown_field, SectionKind};
use crate::editor::EditError;

/// A single field change. `None` or an empty string clears the field.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldEdit {
    pub field: String,
    pub value: Option<String>,
}

pub trait EditableRecord: Default + Clone {
    const SECTION: SectionKind;

    fn set_field(&mut self, field: &str, value: Option<String>) -> Result<(), EditError>;
}

pub(crate) fn set_list_field<T: EditableRecord>(
    list: &mut KeyedList<T>,
    id: ItemId,
    field: &str,
    value: Option<String>,
) -> Result<EditOutcome, EditError> {
    match list.get_mut(id) {
        Some(item) => {
            item.set_field(field, value)?;
            Ok(EditOutcome::Changed)
        }
        None => Ok(EditOutcome::Ignored),
    }
}

fn cleared(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl EditableRecord for GeneralInfo {
    const SECTION: SectionKind = SectionKind::GeneralInfo;

    fn set_field(&mut self, field: &str, value: Option<String>) -> Result<(), EditError> {
        let slot = match field {
            "title" => &mut self.title,
            "description" => &mut self.description,
            _ => return Err(unknown_field(Self::SECTION, field)),
        };
        *slot = cleared(value);
        Ok(())
    }
}

impl EditableRecord for PersonalInfo {
    const SECTION: SectionKind = SectionKind::PersonalInfo;

    fn set_field(&mut self, field: &str, value: Option<String>) -> Result<(), EditError> {
        let slot = match field {
            "first_name" => &mut self.first_name,
            "last_name" => &mut self.last_name,
            "job_title" => &mut self.job_title,
            "city" => &mut self.city,
            "country" => &mut self.country,
            "phone" => &mut self.phone,
            "email" => &mut self.email,
            "website_url" => &mut self.website_url,
            "linkedin_url" => &mut self.linkedin_url,
            "github_url" => &mut self.github_url,
            "photo" => {
                return Err(EditError::InvalidValue {
                    field: field.to_string(),
                    message: "upload or remove the photo through the photo endpoint".to_string(),
                })
            }
            _ => return Err(unknown_field(Self::SECTION, field)),
        };
        *slot = cleared(value);
        Ok(())
    }
}

impl EditableRecord for WorkExperience {
    const SECTION: SectionKind = SectionKind::WorkExperiences;

    fn set_field(&mut self, field: &str, value: Option<String>) -> Result<(), EditError> {
        let slot = match field {
            "position" => &mut self.position,
            "company" => &mut self.company,
            "start_date" => &mut self.start_date,
            "end_date" => &mut self.end_date,
            "description" => &mut self.description,
            _ => return Err(unknown_field(Self::SECTION, field)),
        };
        *slot = cleared(value);
        Ok(())
    }
}

impl EditableRecord for Education {
    const SECTION: SectionKind = SectionKind::Educations;

    fn set_field(&mut self, field: &str, value: Option<String>) -> Result<(), EditError> {
        let slot = match field {
            "institution" => &mut self.institution,
            "degree" => &mut self.degree,
            "start_date" => &mut self.start_date,
            "end_date" => &mut self.end_date,
            _ => return Err(unknown_field(Self::SECTION, field)),
        };
        *slot = cleared(value);
        Ok(())
    }
}

impl EditableRecord for Project {
    const SECTION: SectionKind = SectionKind::Projects;

    fn set_field(&mut self, field: &str, value: Option<String>) -> Result<(), EditError> {
        let slot = match field {
            "name" => &mut self.name,
            "description" => &mut self.description,
            "start_date" => &mut self.start_date,
            "end_date" => &mut self.end_date,
            "link_code" => &mut self.link_code,
            "link_deploy" => &mut self.link_deploy,
            "technologies" => {
                // Edited as one comma-separated text field.
                self.technologies = value.as_deref().map(parse_list).unwrap_or_default();
                return Ok(());
            }
            _ => return Err(unknown_field(Self::SECTION, field)),
        };
        *slot = cleared(value);
        Ok(())
    }
}

impl EditableRecord for Language {
    const SECTION: SectionKind = SectionKind::Languages;

    fn set_field(&mut self, field: &str, value: Option<String>) -> Result<(), EditError> {
        match field {
            "name" => self.name = value.unwrap_or_default(),
            "level" => {
                let raw = value.unwrap_or_default();
                self.level = raw.parse().map_err(|message| EditError::InvalidValue {
                    field: field.to_string(),
                    message,
                })?;
            }
            _ => return Err(unknown_field(Self::SECTION, field)),
        }
        Ok(())
    }
}

impl EditableRecord for Presentation {
    const SECTION: SectionKind = SectionKind::Presentation;

    fn set_field(&mut self, field: &str, value: Option<String>) -> Result<(), EditError> {
        match field {
            "color_hex" => self.color_hex = cleared(value),
            "border_style" => {
                self.border_style = match cleared(value) {
                    None => None,
                    Some(raw) => Some(raw.parse().map_err(|message| EditError::InvalidValue {
                        field: field.to_string(),
                        message,
                    })?),
                };
            }
            _ => return Err(unknown_field(Self::SECTION, field)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BorderStyle, LanguageLevel};

    #[test]
    fn test_project_technologies_parsed_from_text() {
        let mut project = Project::default();
        project
            .set_field("technologies", Some("React, Next.js ,  Prisma".to_string()))
            .unwrap();
        assert_eq!(project.technologies, vec!["React", "Next.js", "Prisma"]);
        project.set_field("technologies", None).unwrap();
        assert!(project.technologies.is_empty());
    }

    #[test]
    fn test_empty_string_clears_field() {
        let mut info = PersonalInfo {
            city: Some("Lisbon".to_string()),
            ..Default::default()
        };
        info.set_field("city", Some(String::new())).unwrap();
        assert_eq!(info.city, None);
    }

    #[test]
    fn test_malformed_url_is_stored_for_validation() {
        let mut project = Project::default();
        project
            .set_field("link_code", Some("not a url".to_string()))
            .unwrap();
        assert_eq!(project.link_code.as_deref(), Some("not a url"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let mut education = Education::default();
        let err = education
            .set_field("gpa", Some("4.0".to_string()))
            .unwrap_err();
        assert!(matches!(err, EditError::UnknownField { .. }));
    }

    #[test]
    fn test_language_level_must_be_on_scale() {
        let mut language = Language::default();
        language
            .set_field("level", Some("advanced".to_string()))
            .unwrap();
        assert_eq!(language.level, LanguageLevel::Advanced);
        assert!(language
            .set_field("level", Some("fluent".to_string()))
            .is_err());
        assert_eq!(language.level, LanguageLevel::Advanced);
    }

    #[test]
    fn test_presentation_border_style() {
        let mut presentation = Presentation::default();
        presentation
            .set_field("border_style", Some("circle".to_string()))
            .unwrap();
        assert_eq!(presentation.border_style, Some(BorderStyle::Circle));
        presentation.set_field("border_style", None).unwrap();
        assert_eq!(presentation.border_style, None);
    }

    #[test]
    fn test_photo_is_not_a_text_field() {
        let mut info = PersonalInfo::default();
        assert!(matches!(
            info.set_field("photo", Some("x".to_string())),
            Err(EditError::InvalidValue { .. })
        ));
    }
}
