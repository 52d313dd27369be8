//! Document -> preview layout.
//!
//! `compose` is a pure function of the canonical document: it borrows its
//! input, allocates a fresh layout, and gives the same answer every time.
//! Blocks come out in a fixed order and a block with nothing to show is left
//! out entirely rather than rendered empty.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::document::text::normalize;
use crate::document::{BorderStyle, Photo, ResumeDocument};

pub const DEFAULT_COLOR_HEX: &str = "#000000";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewLayout {
    pub theme: Theme,
    pub blocks: Vec<PreviewBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    pub color_hex: String,
    pub border_style: BorderStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "block", rename_all = "snake_case")]
pub enum PreviewBlock {
    Header(HeaderBlock),
    Summary { text: String },
    WorkExperience { entries: Vec<WorkEntry> },
    Education { entries: Vec<EducationEntry> },
    Projects { entries: Vec<ProjectEntry> },
    SkillsAndLanguages {
        skills: Vec<String>,
        languages: Vec<LanguageBadge>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeaderBlock {
    pub photo: Option<PreviewPhoto>,
    pub name: Option<String>,
    pub job_title: Option<String>,
    /// Location, phone and email, in that order, when present.
    pub contacts: Vec<String>,
    pub links: Vec<SocialLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PreviewPhoto {
    Url { url: String },
    /// Not uploaded yet; served from the session's local previews.
    Local { token: Uuid },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialLink {
    pub label: &'static str,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkEntry {
    pub position: Option<String>,
    pub company: Option<String>,
    pub dates: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EducationEntry {
    pub degree: Option<String>,
    pub institution: Option<String>,
    pub dates: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectEntry {
    pub name: Option<String>,
    pub description: Option<String>,
    pub dates: Option<String>,
    pub technologies: Vec<String>,
    pub link_deploy: Option<String>,
    pub link_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageBadge {
    pub name: String,
    pub level: String,
}

pub fn compose(document: &ResumeDocument) -> PreviewLayout {
    let mut blocks = vec![PreviewBlock::Header(header(document))];

    if let Some(text) = present(&document.summary) {
        blocks.push(PreviewBlock::Summary { text });
    }

    let work: Vec<WorkEntry> = document
        .work_experiences
        .iter()
        .filter(|exp| !exp.is_blank())
        .map(|exp| WorkEntry {
            position: present(&exp.position),
            company: present(&exp.company),
            dates: format_date_range(exp.start_date.as_deref(), exp.end_date.as_deref()),
            description: present(&exp.description),
        })
        .collect();
    if !work.is_empty() {
        blocks.push(PreviewBlock::WorkExperience { entries: work });
    }

    let education: Vec<EducationEntry> = document
        .educations
        .iter()
        .filter(|edu| !edu.is_blank())
        .map(|edu| EducationEntry {
            degree: present(&edu.degree),
            institution: present(&edu.institution),
            dates: format_date_range(edu.start_date.as_deref(), edu.end_date.as_deref()),
        })
        .collect();
    if !education.is_empty() {
        blocks.push(PreviewBlock::Education { entries: education });
    }

    if !document.projects.is_empty() {
        let entries = document
            .projects
            .iter()
            .map(|project| ProjectEntry {
                name: present(&project.name),
                description: present(&project.description),
                dates: format_date_range(
                    project.start_date.as_deref(),
                    project.end_date.as_deref(),
                ),
                technologies: project.technologies.clone(),
                link_deploy: present(&project.link_deploy),
                link_code: present(&project.link_code),
            })
            .collect();
        blocks.push(PreviewBlock::Projects { entries });
    }

    if !document.skills.is_empty() || !document.languages.is_empty() {
        blocks.push(PreviewBlock::SkillsAndLanguages {
            skills: document.skills.clone(),
            languages: document
                .languages
                .iter()
                .map(|language| LanguageBadge {
                    name: language.name.clone(),
                    level: language.level.to_string(),
                })
                .collect(),
        });
    }

    PreviewLayout {
        theme: Theme {
            color_hex: present(&document.presentation.color_hex)
                .unwrap_or_else(|| DEFAULT_COLOR_HEX.to_string()),
            border_style: document.presentation.border_style.unwrap_or_default(),
        },
        blocks,
    }
}

fn header(document: &ResumeDocument) -> HeaderBlock {
    let personal = &document.personal;

    let photo = match &personal.photo {
        Some(Photo::Url { url }) if !url.trim().is_empty() => {
            Some(PreviewPhoto::Url { url: url.clone() })
        }
        Some(Photo::Pending(pending)) => Some(PreviewPhoto::Local {
            token: pending.token,
        }),
        _ => None,
    };

    let name = [&personal.first_name, &personal.last_name]
        .into_iter()
        .filter_map(present)
        .collect::<Vec<_>>()
        .join(" ");

    let location = [&personal.city, &personal.country]
        .into_iter()
        .filter_map(present)
        .collect::<Vec<_>>()
        .join(", ");
    let contacts = [Some(location), present(&personal.phone), present(&personal.email)]
        .into_iter()
        .flatten()
        .filter(|value| !value.is_empty())
        .collect();

    let links = [
        ("GitHub", &personal.github_url),
        ("LinkedIn", &personal.linkedin_url),
        ("Website", &personal.website_url),
    ]
    .into_iter()
    .filter_map(|(label, url)| present(url).map(|url| SocialLink { label, url }))
    .collect();

    HeaderBlock {
        photo,
        name: (!name.is_empty()).then_some(name),
        job_title: present(&personal.job_title),
        contacts,
        links,
    }
}

/// `01/2020 – Present`, `01/2020 – 06/2021`, or nothing without a start date.
pub fn format_date_range(start: Option<&str>, end: Option<&str>) -> Option<String> {
    let start = start.map(str::trim).filter(|s| !s.is_empty())?;
    let end = end
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(month_year)
        .unwrap_or_else(|| "Present".to_string());
    Some(format!("{} – {end}", month_year(start)))
}

fn month_year(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%m/%Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

fn present(value: &Option<String>) -> Option<String> {
    normalize(value.as_deref())
}
