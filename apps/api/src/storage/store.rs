//! Resume persistence.
//!
//! `hydrate` and `prepare` map between the canonical document and the
//! relational rows; `PgResumeStore` moves those rows in and out of Postgres
//! inside a transaction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryScalar;
use sqlx::{PgPool, Postgres};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::document::text::normalize;
use crate::document::{
    BorderStyle, Education, GeneralInfo, Language, PersonalInfo, Photo, Presentation, Project,
    ResumeDocument, WorkExperience,
};
use crate::models::resume::{
    EducationRow, LanguageRow, ProjectRow, ResumeRow, ResumeSummaryRow, WorkExperienceRow,
};
use crate::preview::composer::DEFAULT_COLOR_HEX;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("resume {0} not found")]
    NotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// What a save does to the stored photo column.
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoUpdate {
    Keep,
    Set(String),
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedResume {
    pub id: Uuid,
    pub updated_at: DateTime<Utc>,
    /// The stored photo this save replaced or cleared; its blob can go.
    pub replaced_photo_url: Option<String>,
}

pub type ResumeSummary = ResumeSummaryRow;

#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn load(&self, user_id: Uuid, id: Uuid) -> Result<ResumeDocument, StoreError>;

    /// Creates the resume when `document.id` is `None`, otherwise replaces it
    /// whole, child collections included.
    async fn save(
        &self,
        user_id: Uuid,
        document: &ResumeDocument,
        photo: PhotoUpdate,
    ) -> Result<SavedResume, StoreError>;

    async fn list(&self, user_id: Uuid) -> Result<Vec<ResumeSummary>, StoreError>;

    /// Deletes the resume, returning its stored photo URL if it had one.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<Option<String>, StoreError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Row mapping
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StoredResume {
    pub resume: ResumeRow,
    pub work_experiences: Vec<WorkExperienceRow>,
    pub educations: Vec<EducationRow>,
    pub projects: Vec<ProjectRow>,
    pub languages: Vec<LanguageRow>,
}

/// Column values for one save, defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedResume {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color_hex: String,
    pub border_style: String,
    pub summary: Option<String>,
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
    pub skills: Vec<String>,
    pub work_experiences: Vec<WorkExperienceRow>,
    pub educations: Vec<EducationRow>,
    pub projects: Vec<ProjectRow>,
    pub languages: Vec<LanguageRow>,
}

fn text(value: &Option<String>) -> Option<String> {
    normalize(value.as_deref())
}

fn to_date(value: &Option<String>) -> Option<NaiveDate> {
    text(value).and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok())
}

fn from_date(value: Option<NaiveDate>) -> Option<String> {
    value.map(|d| d.format("%Y-%m-%d").to_string())
}

pub fn prepare(document: &ResumeDocument) -> PreparedResume {
    let personal = &document.personal;
    PreparedResume {
        title: text(&document.general.title),
        description: text(&document.general.description),
        color_hex: text(&document.presentation.color_hex)
            .unwrap_or_else(|| DEFAULT_COLOR_HEX.to_string()),
        border_style: document
            .presentation
            .border_style
            .unwrap_or_default()
            .as_str()
            .to_string(),
        summary: text(&document.summary),
        first_name: text(&personal.first_name),
        last_name: text(&personal.last_name),
        job_title: text(&personal.job_title),
        city: text(&personal.city),
        country: text(&personal.country),
        phone: text(&personal.phone),
        email: text(&personal.email),
        website_url: text(&personal.website_url),
        linkedin_url: text(&personal.linkedin_url),
        github_url: text(&personal.github_url),
        skills: document
            .skills
            .iter()
            .filter_map(|s| normalize(Some(s)))
            .collect(),
        work_experiences: document
            .work_experiences
            .iter()
            .map(|exp| WorkExperienceRow {
                position: text(&exp.position),
                company: text(&exp.company),
                start_date: to_date(&exp.start_date),
                end_date: to_date(&exp.end_date),
                description: text(&exp.description),
            })
            .collect(),
        educations: document
            .educations
            .iter()
            .map(|edu| EducationRow {
                institution: text(&edu.institution),
                degree: text(&edu.degree),
                start_date: to_date(&edu.start_date),
                end_date: to_date(&edu.end_date),
            })
            .collect(),
        projects: document
            .projects
            .iter()
            .filter(|project| !project.is_empty())
            .map(|project| {
                let project = project.normalized();
                ProjectRow {
                    start_date: to_date(&project.start_date),
                    end_date: to_date(&project.end_date),
                    name: project.name,
                    description: project.description,
                    link_code: project.link_code,
                    link_deploy: project.link_deploy,
                    technologies: project.technologies,
                }
            })
            .collect(),
        languages: document
            .languages
            .iter()
            .map(|language| LanguageRow {
                name: language.name.trim().to_string(),
                level: language.level.as_str().to_string(),
            })
            .collect(),
    }
}

pub fn hydrate(stored: StoredResume) -> ResumeDocument {
    let StoredResume {
        resume,
        work_experiences,
        educations,
        projects,
        languages,
    } = stored;

    ResumeDocument {
        id: Some(resume.id),
        general: GeneralInfo {
            title: text(&resume.title),
            description: text(&resume.description),
        },
        personal: PersonalInfo {
            photo: text(&resume.photo_url).map(|url| Photo::Url { url }),
            first_name: text(&resume.first_name),
            last_name: text(&resume.last_name),
            job_title: text(&resume.job_title),
            city: text(&resume.city),
            country: text(&resume.country),
            phone: text(&resume.phone),
            email: text(&resume.email),
            website_url: text(&resume.website_url),
            linkedin_url: text(&resume.linkedin_url),
            github_url: text(&resume.github_url),
        },
        work_experiences: work_experiences
            .into_iter()
            .map(|row| WorkExperience {
                position: text(&row.position),
                company: text(&row.company),
                start_date: from_date(row.start_date),
                end_date: from_date(row.end_date),
                description: text(&row.description),
            })
            .collect(),
        educations: educations
            .into_iter()
            .map(|row| Education {
                institution: text(&row.institution),
                degree: text(&row.degree),
                start_date: from_date(row.start_date),
                end_date: from_date(row.end_date),
            })
            .collect(),
        projects: projects
            .into_iter()
            .map(|row| Project {
                name: text(&row.name),
                description: text(&row.description),
                start_date: from_date(row.start_date),
                end_date: from_date(row.end_date),
                link_code: text(&row.link_code),
                link_deploy: text(&row.link_deploy),
                technologies: row.technologies,
            })
            .collect(),
        languages: languages
            .into_iter()
            .map(|row| Language {
                level: row.level.parse().unwrap_or_default(),
                name: row.name,
            })
            .collect(),
        skills: resume.skills,
        summary: text(&resume.summary),
        presentation: Presentation {
            color_hex: text(&Some(resume.color_hex)),
            // Styles this build no longer offers fall back to the default.
            border_style: resume.border_style.parse::<BorderStyle>().ok(),
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Postgres
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type Scalar<'q, T> = QueryScalar<'q, Postgres, T, PgArguments>;

/// Binds the scalar resume columns, in declaration order, as the next 16 parameters.
fn bind_columns<'q, T>(query: Scalar<'q, T>, r: &'q PreparedResume) -> Scalar<'q, T> {
    query
        .bind(&r.title)
        .bind(&r.description)
        .bind(&r.color_hex)
        .bind(&r.border_style)
        .bind(&r.summary)
        .bind(&r.first_name)
        .bind(&r.last_name)
        .bind(&r.job_title)
        .bind(&r.city)
        .bind(&r.country)
        .bind(&r.phone)
        .bind(&r.email)
        .bind(&r.website_url)
        .bind(&r.linkedin_url)
        .bind(&r.github_url)
        .bind(&r.skills)
}

const CHILD_TABLES: [&str; 4] = ["work_experiences", "educations", "projects", "languages"];

async fn insert_children(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    resume_id: Uuid,
    r: &PreparedResume,
) -> Result<(), sqlx::Error> {
    for (order, row) in r.work_experiences.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO work_experiences
                (id, resume_id, sort_order, position, company, start_date, end_date, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(resume_id)
        .bind(order as i32)
        .bind(&row.position)
        .bind(&row.company)
        .bind(row.start_date)
        .bind(row.end_date)
        .bind(&row.description)
        .execute(&mut **tx)
        .await?;
    }

    for (order, row) in r.educations.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO educations
                (id, resume_id, sort_order, institution, degree, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(resume_id)
        .bind(order as i32)
        .bind(&row.institution)
        .bind(&row.degree)
        .bind(row.start_date)
        .bind(row.end_date)
        .execute(&mut **tx)
        .await?;
    }

    for (order, row) in r.projects.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO projects
                (id, resume_id, sort_order, name, description, start_date, end_date,
                 link_code, link_deploy, technologies)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(resume_id)
        .bind(order as i32)
        .bind(&row.name)
        .bind(&row.description)
        .bind(row.start_date)
        .bind(row.end_date)
        .bind(&row.link_code)
        .bind(&row.link_deploy)
        .bind(&row.technologies)
        .execute(&mut **tx)
        .await?;
    }

    for (order, row) in r.languages.iter().enumerate() {
        sqlx::query(
            "INSERT INTO languages (id, resume_id, sort_order, name, level) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(resume_id)
        .bind(order as i32)
        .bind(&row.name)
        .bind(&row.level)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn load(&self, user_id: Uuid, id: Uuid) -> Result<ResumeDocument, StoreError> {
        let resume = sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))?;

        let work_experiences = sqlx::query_as::<_, WorkExperienceRow>(
            r#"
            SELECT position, company, start_date, end_date, description
            FROM work_experiences WHERE resume_id = $1 ORDER BY sort_order
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let educations = sqlx::query_as::<_, EducationRow>(
            r#"
            SELECT institution, degree, start_date, end_date
            FROM educations WHERE resume_id = $1 ORDER BY sort_order
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let projects = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT name, description, start_date, end_date, link_code, link_deploy, technologies
            FROM projects WHERE resume_id = $1 ORDER BY sort_order
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let languages = sqlx::query_as::<_, LanguageRow>(
            "SELECT name, level FROM languages WHERE resume_id = $1 ORDER BY sort_order",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(hydrate(StoredResume {
            resume,
            work_experiences,
            educations,
            projects,
            languages,
        }))
    }

    async fn save(
        &self,
        user_id: Uuid,
        document: &ResumeDocument,
        photo: PhotoUpdate,
    ) -> Result<SavedResume, StoreError> {
        let prepared = prepare(document);
        let (replace_photo, photo_url) = match &photo {
            PhotoUpdate::Keep => (false, None),
            PhotoUpdate::Set(url) => (true, Some(url.clone())),
            PhotoUpdate::Clear => (true, None),
        };

        let mut tx = self.pool.begin().await?;

        let (id, previous_photo, updated_at) = match document.id {
            Some(id) => {
                let previous: Option<String> = sqlx::query_scalar::<_, Option<String>>(
                    "SELECT photo_url FROM resumes WHERE id = $1 AND user_id = $2 FOR UPDATE",
                )
                .bind(id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StoreError::NotFound(id))?;

                let query = sqlx::query_scalar::<_, DateTime<Utc>>(
                    r#"
                    UPDATE resumes SET
                        title = $3, description = $4, color_hex = $5, border_style = $6,
                        summary = $7, first_name = $8, last_name = $9, job_title = $10,
                        city = $11, country = $12, phone = $13, email = $14,
                        website_url = $15, linkedin_url = $16, github_url = $17, skills = $18,
                        photo_url = CASE WHEN $19 THEN $20 ELSE photo_url END,
                        updated_at = now()
                    WHERE id = $1 AND user_id = $2
                    RETURNING updated_at
                    "#,
                )
                .bind(id)
                .bind(user_id);
                let updated_at = bind_columns(query, &prepared)
                    .bind(replace_photo)
                    .bind(&photo_url)
                    .fetch_one(&mut *tx)
                    .await?;

                for table in CHILD_TABLES {
                    sqlx::query(&format!("DELETE FROM {table} WHERE resume_id = $1"))
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                }

                (id, previous, updated_at)
            }
            None => {
                let id = Uuid::new_v4();
                let query = sqlx::query_scalar::<_, DateTime<Utc>>(
                    r#"
                    INSERT INTO resumes
                        (id, user_id, title, description, color_hex, border_style, summary,
                         first_name, last_name, job_title, city, country, phone, email,
                         website_url, linkedin_url, github_url, skills, photo_url)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                            $15, $16, $17, $18, $19)
                    RETURNING updated_at
                    "#,
                )
                .bind(id)
                .bind(user_id);
                let updated_at = bind_columns(query, &prepared)
                    .bind(&photo_url)
                    .fetch_one(&mut *tx)
                    .await?;
                (id, None, updated_at)
            }
        };

        insert_children(&mut tx, id, &prepared).await?;
        tx.commit().await?;

        info!(
            "Saved resume {id} for user {user_id} ({} work, {} education, {} projects, {} languages)",
            prepared.work_experiences.len(),
            prepared.educations.len(),
            prepared.projects.len(),
            prepared.languages.len()
        );

        let replaced_photo_url = if replace_photo {
            previous_photo.filter(|previous| Some(previous) != photo_url.as_ref())
        } else {
            None
        };

        Ok(SavedResume {
            id,
            updated_at,
            replaced_photo_url,
        })
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<ResumeSummary>, StoreError> {
        Ok(sqlx::query_as::<_, ResumeSummaryRow>(
            "SELECT id, title, updated_at FROM resumes WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<Option<String>, StoreError> {
        let photo_url = sqlx::query_scalar::<_, Option<String>>(
            "DELETE FROM resumes WHERE id = $1 AND user_id = $2 RETURNING photo_url",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))?;
        info!("Deleted resume {id} for user {user_id}");
        Ok(photo_url)
    }
}
