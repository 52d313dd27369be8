use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct WorkExperienceRow {
    pub position: Option<String>,
    pub company: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct EducationRow {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct ProjectRow {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub link_code: Option<String>,
    pub link_deploy: Option<String>,
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct LanguageRow {
    pub name: String,
    pub level: String,
}

/// One line of the resume list.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ResumeSummaryRow {
    pub id: Uuid,
    pub title: Option<String>,
    pub updated_at: DateTime<Utc>,
}
