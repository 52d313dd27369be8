use crate::preview::composer::{HeaderBlock, PreviewBlock, PreviewLayout, PreviewPhoto};

/// Renders a composed layout as a markdown document.
pub fn render_markdown(layout: &PreviewLayout) -> String {
    let mut md = String::new();
    for block in &layout.blocks {
        match block {
            PreviewBlock::Header(header) => render_header(&mut md, header),
            PreviewBlock::Summary { text } => {
                md.push_str("## Professional profile\n\n");
                md.push_str(text);
                md.push_str("\n\n");
            }
            PreviewBlock::WorkExperience { entries } => {
                md.push_str("## Work Experience\n\n");
                for entry in entries {
                    heading(&mut md, entry.position.as_deref(), entry.dates.as_deref());
                    if let Some(company) = &entry.company {
                        md.push_str(&format!("**{company}**\n\n"));
                    }
                    if let Some(description) = &entry.description {
                        md.push_str(description);
                        md.push_str("\n\n");
                    }
                }
            }
            PreviewBlock::Education { entries } => {
                md.push_str("## Education\n\n");
                for entry in entries {
                    heading(&mut md, entry.degree.as_deref(), entry.dates.as_deref());
                    if let Some(institution) = &entry.institution {
                        md.push_str(&format!("**{institution}**\n\n"));
                    }
                }
            }
            PreviewBlock::Projects { entries } => {
                md.push_str("## Personal Projects\n\n");
                for entry in entries {
                    heading(&mut md, entry.name.as_deref(), entry.dates.as_deref());
                    if let Some(description) = &entry.description {
                        md.push_str(description);
                        md.push_str("\n\n");
                    }
                    if !entry.technologies.is_empty() {
                        md.push_str(&format!(
                            "- **Technologies:** {}\n",
                            entry.technologies.join(", ")
                        ));
                    }
                    if let Some(url) = &entry.link_deploy {
                        md.push_str(&format!("- **Live Demo:** {url}\n"));
                    }
                    if let Some(url) = &entry.link_code {
                        md.push_str(&format!("- **Source Code:** {url}\n"));
                    }
                    md.push('\n');
                }
            }
            PreviewBlock::SkillsAndLanguages { skills, languages } => {
                md.push_str("## Skills & Languages\n\n");
                if !skills.is_empty() {
                    md.push_str(&format!("- **Technical Skills:** {}\n", skills.join(", ")));
                }
                if !languages.is_empty() {
                    let languages = languages
                        .iter()
                        .map(|l| format!("{} - {}", l.name, l.level))
                        .collect::<Vec<_>>()
                        .join(", ");
                    md.push_str(&format!("- **Languages:** {languages}\n"));
                }
                md.push('\n');
            }
        }
    }
    md
}

fn render_header(md: &mut String, header: &HeaderBlock) {
    md.push_str(&format!(
        "# {}\n\n",
        header.name.as_deref().unwrap_or("Untitled resume")
    ));
    if let Some(job_title) = &header.job_title {
        md.push_str(&format!("_{job_title}_\n\n"));
    }
    if let Some(PreviewPhoto::Url { url }) = &header.photo {
        md.push_str(&format!("![photo]({url})\n\n"));
    }
    if !header.contacts.is_empty() {
        md.push_str(&header.contacts.join(" | "));
        md.push_str("\n\n");
    }
    for link in &header.links {
        md.push_str(&format!("- **{}:** {}\n", link.label, link.url));
    }
    if !header.links.is_empty() {
        md.push('\n');
    }
}

fn heading(md: &mut String, title: Option<&str>, dates: Option<&str>) {
    let title = title.unwrap_or("Untitled");
    match dates {
        Some(dates) => md.push_str(&format!("### {title} ({dates})\n\n")),
        None => md.push_str(&format!("### {title}\n\n")),
    }
}
