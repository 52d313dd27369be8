// LLM prompt constants for the text generators.
// Placeholders in braces are substituted with `str::replace` before sending.

/// Role shared by every resume-writing prompt.
pub const WRITER_ROLE: &str = "You are a professional resume writer. \
    Write in English, in a concise and professional tone.";

/// Work experience prompt. Replace `{description}` before sending.
pub const WORK_EXPERIENCE_PROMPT_TEMPLATE: &str = r#"Write a single work experience entry from the description below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "position": "Backend Engineer",
  "company": "Acme Corp",
  "start_date": "2021-03-01",
  "end_date": null,
  "description": "- Built ...\n- Led ..."
}

Rules:
- Use null for any field that cannot be inferred from the description.
- Dates use the YYYY-MM-DD format and are only set when the description gives them.
- The description is an optimized list of bullet points; it may be inferred from the job title.

Description:
{description}"#;

/// Personal project prompt. Replace `{description}` before sending.
pub const PROJECT_PROMPT_TEMPLATE: &str = r#"Write a single personal project entry from the description below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "name": "Budget tracker",
  "description": "- Designed ...\n- Shipped ...",
  "start_date": "2023-01-01",
  "end_date": "2023-06-01",
  "link_deploy": "https://example.com",
  "link_code": "https://github.com/user/repo",
  "technologies": "React, Node.js, PostgreSQL"
}

Rules:
- Use null for any field that cannot be inferred from the description.
- Dates use the YYYY-MM-DD format and are only set when the description gives them.
- Links are only set when the description contains them.
- technologies is a single comma-separated string.

Description:
{description}"#;

/// Summary prompt. The model answers with the summary text only.
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"Write a professional introduction summary for a resume built from the data below.
Return only the summary text, without a heading, quotes, or any other information.
Keep it relevant to the job title.

Job title: {job_title}

Work experience:
{work_experiences}

Education:
{educations}

Personal projects:
{projects}

Skills:
{skills}

Languages:
{languages}"#;
