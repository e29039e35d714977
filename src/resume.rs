use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::io::Write as _;
use std::path::Path;
use std::process::Command;
use tracing::info;

use crate::profile;
use crate::store::{Store, keys};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactInfo {
    pub title: String,
    pub email: String,
    pub mobile: String,
    pub linkedin: String,
    pub github: String,
    pub website: String,
    pub location: String,
}

/// One repeatable entry in the experience/education/projects lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Entry {
    pub title: String,
    pub organization: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    pub description: String,
}

impl Entry {
    fn date_range(&self) -> String {
        if self.current {
            format!("{} - Present", self.start_date)
        } else {
            format!("{} - {}", self.start_date, self.end_date)
        }
    }
}

/// The resume builder's working state, kept under `resumeDraft` so edits
/// survive between invocations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeDraft {
    pub name: String,
    pub contact: ContactInfo,
    pub summary: String,
    pub skills: Vec<String>,
    pub experience: Vec<Entry>,
    pub education: Vec<Entry>,
    pub projects: Vec<Entry>,
}

impl ResumeDraft {
    pub fn load(store: &Store) -> Result<Self> {
        Ok(store.get(keys::RESUME_DRAFT)?.unwrap_or_default())
    }

    pub fn save(&self, store: &Store) -> Result<()> {
        store.set(keys::RESUME_DRAFT, self)
    }

    pub fn add_skill(&mut self, skill: &str) -> bool {
        profile::add_skill(&mut self.skills, skill)
    }

    pub fn remove_skill(&mut self, skill: &str) -> bool {
        profile::remove_skill(&mut self.skills, skill)
    }

    fn contact_markdown(&self) -> String {
        let contact = &self.contact;
        let mut parts = Vec::new();
        if !contact.email.is_empty() {
            parts.push(contact.email.clone());
        }
        if !contact.mobile.is_empty() {
            parts.push(contact.mobile.clone());
        }
        if !contact.linkedin.is_empty() {
            parts.push(format!("[LinkedIn]({})", contact.linkedin));
        }
        if !contact.github.is_empty() {
            parts.push(format!("[GitHub]({})", contact.github));
        }

        if parts.is_empty() {
            return String::new();
        }

        let name = if self.name.is_empty() {
            "Your Name"
        } else {
            &self.name
        };
        format!(
            "## <div align=\"center\">{name}</div>\n\n<div align=\"center\">\n\n{}\n\n</div>",
            parts.join(" | ")
        )
    }

    /// Serialize the draft to the markdown document that gets saved and
    /// exported. Empty sections are omitted.
    pub fn render_markdown(&self) -> String {
        let mut sections = vec![self.contact_markdown()];

        if !self.summary.is_empty() {
            sections.push(format!("## Professional Summary\n\n{}", self.summary));
        }
        if !self.skills.is_empty() {
            sections.push(format!("## Skills\n\n{}", self.skills.join(", ")));
        }
        sections.push(entries_to_markdown(&self.experience, "Work Experience"));
        sections.push(entries_to_markdown(&self.education, "Education"));
        sections.push(entries_to_markdown(&self.projects, "Projects"));

        sections
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn entries_to_markdown(entries: &[Entry], title: &str) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let body = entries
        .iter()
        .map(|entry| {
            format!(
                "### {} @ {}\n{}\n\n{}",
                entry.title,
                entry.organization,
                entry.date_range(),
                entry.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("## {title}\n\n{body}")
}

/// Write the rendered markdown under `savedResume` and return it.
pub fn save_rendered(store: &Store, draft: &ResumeDraft) -> Result<String> {
    let markdown = draft.render_markdown();
    store.set(keys::SAVED_RESUME, &markdown)?;
    Ok(markdown)
}

/// `<name>_<YYYY-MM-DD>.pdf`, the converter's default target name.
pub fn export_filename(name: &str, date: chrono::NaiveDate) -> String {
    let base = if name.is_empty() { "resume" } else { name };
    format!("{base}_{}.pdf", date.format("%Y-%m-%d"))
}

pub fn default_export_filename(name: &str) -> String {
    export_filename(name, chrono::Local::now().date_naive())
}

/// Hand the rendered markdown to pandoc. All layout belongs to the converter;
/// this only verifies it is installed and shells out.
pub fn export_pdf(markdown: &str, output: &Path) -> Result<()> {
    Command::new("pandoc")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .context("'pandoc' not found. Install pandoc to export the resume as a PDF.")?;

    let mut source = tempfile::Builder::new()
        .prefix("jobnest-resume-")
        .suffix(".md")
        .tempfile()
        .context("Failed to create temporary file for export")?;
    source
        .write_all(markdown.as_bytes())
        .context("Failed to write resume markdown")?;

    let result = Command::new("pandoc")
        .arg(source.path())
        .arg("-o")
        .arg(output)
        .output()
        .context("Failed to run pandoc")?;

    if !result.status.success() {
        bail!(
            "PDF generation failed: {}",
            String::from_utf8_lossy(&result.stderr).trim()
        );
    }

    info!(output = %output.display(), "resume exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_with_contact() -> ResumeDraft {
        ResumeDraft {
            name: "Ada Lovelace".to_string(),
            contact: ContactInfo {
                email: "ada@example.com".to_string(),
                mobile: "555-0100".to_string(),
                linkedin: "https://linkedin.com/in/ada".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_date_range_present_for_current_entries() {
        let mut entry = Entry {
            title: "Engineer".to_string(),
            organization: "Acme".to_string(),
            start_date: "2021".to_string(),
            end_date: "2023".to_string(),
            current: false,
            ..Default::default()
        };
        assert_eq!(entry.date_range(), "2021 - 2023");

        entry.current = true;
        assert_eq!(entry.date_range(), "2021 - Present");
    }

    #[test]
    fn test_entries_to_markdown() {
        let entries = vec![Entry {
            title: "Engineer".to_string(),
            organization: "Acme".to_string(),
            start_date: "2021".to_string(),
            end_date: "2023".to_string(),
            description: "Built things.".to_string(),
            ..Default::default()
        }];

        let markdown = entries_to_markdown(&entries, "Work Experience");
        assert!(markdown.starts_with("## Work Experience"));
        assert!(markdown.contains("### Engineer @ Acme"));
        assert!(markdown.contains("2021 - 2023"));
        assert!(markdown.contains("Built things."));

        assert_eq!(entries_to_markdown(&[], "Work Experience"), "");
    }

    #[test]
    fn test_skill_add_duplicate_is_noop() {
        let mut draft = ResumeDraft::default();
        assert!(draft.add_skill("Rust"));
        assert!(!draft.add_skill("Rust"));
        assert_eq!(draft.skills, vec!["Rust"]);

        assert!(draft.add_skill("SQL"));
        assert!(draft.remove_skill("Rust"));
        assert_eq!(draft.skills, vec!["SQL"]);
        assert!(!draft.remove_skill("Rust"));
    }

    #[test]
    fn test_render_skips_empty_sections() {
        let mut draft = draft_with_contact();
        draft.summary = "Engineer with a fondness for compilers.".to_string();

        let markdown = draft.render_markdown();
        assert!(markdown.contains("Ada Lovelace"));
        assert!(markdown.contains("ada@example.com | 555-0100 | [LinkedIn](https://linkedin.com/in/ada)"));
        assert!(markdown.contains("## Professional Summary"));
        assert!(!markdown.contains("## Skills"));
        assert!(!markdown.contains("## Work Experience"));
        assert!(!markdown.contains("## Education"));
    }

    #[test]
    fn test_render_without_contact_parts_omits_header() {
        let draft = ResumeDraft {
            name: "Ada".to_string(),
            summary: "Hello.".to_string(),
            ..Default::default()
        };
        let markdown = draft.render_markdown();
        assert!(!markdown.contains("Ada"));
        assert!(markdown.starts_with("## Professional Summary"));
    }

    #[test]
    fn test_draft_roundtrip_and_saved_resume() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::at(dir.path().to_path_buf()).unwrap();

        let mut draft = draft_with_contact();
        draft.add_skill("Rust");
        draft.save(&store).unwrap();

        let loaded = ResumeDraft::load(&store).unwrap();
        assert_eq!(loaded.name, "Ada Lovelace");
        assert_eq!(loaded.skills, vec!["Rust"]);

        let markdown = save_rendered(&store, &loaded).unwrap();
        let stored: String = store.get(keys::SAVED_RESUME).unwrap().unwrap();
        assert_eq!(markdown, stored);
        assert!(stored.contains("## Skills"));
    }

    #[test]
    fn test_export_filename() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        assert_eq!(export_filename("Ada Lovelace", date), "Ada Lovelace_2026-03-04.pdf");
        assert_eq!(export_filename("", date), "resume_2026-03-04.pdf");
    }
}
