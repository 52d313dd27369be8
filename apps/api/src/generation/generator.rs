//! LLM-backed text generation for resume sections.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::document::text::{normalize, parse_list};
use crate::document::{Project, ResumeDocument, WorkExperience};
use crate::generation::prompts::{
    PROJECT_PROMPT_TEMPLATE, SUMMARY_PROMPT_TEMPLATE, WORK_EXPERIENCE_PROMPT_TEMPLATE, WRITER_ROLE,
};
use crate::generation::{GenerationError, TextGenerator};
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NOT_AVAILABLE};
use crate::llm_client::{LlmClient, Prompt};

pub struct LlmTextGenerator {
    llm: LlmClient,
}

impl LlmTextGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Model output shapes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneratedWorkExperience {
    position: Option<String>,
    company: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    description: Option<String>,
}

impl GeneratedWorkExperience {
    fn into_record(self) -> WorkExperience {
        WorkExperience {
            position: normalize(self.position.as_deref()),
            company: normalize(self.company.as_deref()),
            start_date: iso_date(self.start_date),
            end_date: iso_date(self.end_date),
            description: normalize(self.description.as_deref()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneratedProject {
    name: Option<String>,
    description: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    link_deploy: Option<String>,
    link_code: Option<String>,
    technologies: Option<String>,
}

impl GeneratedProject {
    fn into_record(self) -> Project {
        Project {
            name: normalize(self.name.as_deref()),
            description: normalize(self.description.as_deref()),
            start_date: iso_date(self.start_date),
            end_date: iso_date(self.end_date),
            link_code: normalize(self.link_code.as_deref()),
            link_deploy: normalize(self.link_deploy.as_deref()),
            technologies: self
                .technologies
                .as_deref()
                .map(parse_list)
                .unwrap_or_default(),
        }
    }
}

/// Keeps a date only if the model produced a real `YYYY-MM-DD` value.
fn iso_date(value: Option<String>) -> Option<String> {
    let value = normalize(value.as_deref())?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").ok()?;
    Some(value)
}

fn json_system() -> String {
    format!("{WRITER_ROLE} {JSON_ONLY_SYSTEM}")
}

// ────────────────────────────────────────────────────────────────────────────
// Summary prompt
// ────────────────────────────────────────────────────────────────────────────

fn or_na(value: &Option<String>) -> &str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_AVAILABLE)
}

fn bullet_list(items: impl IntoIterator<Item = String>) -> String {
    let lines: Vec<String> = items.into_iter().map(|item| format!("- {item}")).collect();
    if lines.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        lines.join("\n")
    }
}

pub(crate) fn summary_prompt(document: &ResumeDocument) -> String {
    let work = bullet_list(document.work_experiences.iter().map(|exp| {
        format!(
            "{} at {} from {} to {}. {}",
            or_na(&exp.position),
            or_na(&exp.company),
            or_na(&exp.start_date),
            exp.end_date.as_deref().unwrap_or("Present"),
            or_na(&exp.description)
        )
    }));
    let education = bullet_list(document.educations.iter().map(|edu| {
        format!(
            "{} at {} from {} to {}",
            or_na(&edu.degree),
            or_na(&edu.institution),
            or_na(&edu.start_date),
            or_na(&edu.end_date)
        )
    }));
    let projects = bullet_list(document.projects.iter().map(|project| {
        let technologies = if project.technologies.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            project.technologies.join(", ")
        };
        format!(
            "{}: {} (technologies: {technologies})",
            or_na(&project.name),
            or_na(&project.description)
        )
    }));
    let skills = bullet_list(document.skills.iter().cloned());
    let languages = bullet_list(
        document
            .languages
            .iter()
            .map(|language| format!("{} ({})", language.name, language.level)),
    );

    SUMMARY_PROMPT_TEMPLATE
        .replace("{job_title}", or_na(&document.personal.job_title))
        .replace("{work_experiences}", &work)
        .replace("{educations}", &education)
        .replace("{projects}", &projects)
        .replace("{skills}", &skills)
        .replace("{languages}", &languages)
}

#[async_trait]
impl TextGenerator for LlmTextGenerator {
    async fn work_experience(&self, description: &str) -> Result<WorkExperience, GenerationError> {
        let system = json_system();
        let user = WORK_EXPERIENCE_PROMPT_TEMPLATE.replace("{description}", description);
        let generated: GeneratedWorkExperience =
            self.llm.call_json(Prompt::new(&system, &user)).await?;
        info!("Generated work experience entry");
        Ok(generated.into_record())
    }

    async fn project(&self, description: &str) -> Result<Project, GenerationError> {
        let system = json_system();
        let user = PROJECT_PROMPT_TEMPLATE.replace("{description}", description);
        let generated: GeneratedProject = self.llm.call_json(Prompt::new(&system, &user)).await?;
        info!("Generated personal project entry");
        Ok(generated.into_record())
    }

    async fn summary(&self, document: &ResumeDocument) -> Result<String, GenerationError> {
        let user = summary_prompt(document);
        let summary = self.llm.call_text(Prompt::new(WRITER_ROLE, &user)).await?;
        info!("Generated summary ({} chars)", summary.len());
        Ok(summary)
    }
}
