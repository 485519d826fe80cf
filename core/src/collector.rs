//! Harvest documents from a structured content source.
//!
//! A [`ContentSource`] exposes named sections (`home`, `about`, `projects`,
//! `contact`); [`collect`] turns them into the flat document list that the
//! index is built from. Missing sections or fields are skipped, never errors.

use crate::Document;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A repeated entry inside a section, e.g. a skill or a project card.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// A labelled hyperlink, e.g. a social profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Section names [`collect`] understands, in the order documents are emitted.
pub const SECTION_NAMES: [&str; 4] = ["home", "about", "projects", "contact"];

pub trait ContentSource {
    /// Look up a section by name; `None` when the source has no such section.
    fn section(&self, name: &str) -> Option<Section>;
}

/// In-memory content, typically deserialized from a JSON section map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticContent {
    pub sections: HashMap<String, Section>,
}

impl StaticContent {
    pub fn new() -> Self { Self::default() }

    /// Snapshot every recognised section of another source.
    pub fn capture<S: ContentSource + ?Sized>(source: &S) -> Self {
        let sections = SECTION_NAMES
            .iter()
            .filter_map(|name| source.section(name).map(|s| (name.to_string(), s)))
            .collect();
        Self { sections }
    }

    pub fn with_section(mut self, name: impl Into<String>, section: Section) -> Self {
        self.sections.insert(name.into(), section);
        self
    }
}

impl ContentSource for StaticContent {
    fn section(&self, name: &str) -> Option<Section> {
        self.sections.get(name).cloned()
    }
}

/// Extract every recognised section into documents, dropping those whose text is blank.
pub fn collect<S: ContentSource + ?Sized>(source: &S) -> Vec<Document> {
    let mut docs = Vec::new();

    if let Some(home) = source.section("home") {
        docs.push(Document::new("home", "Home", field(&home.body)));
    }

    if let Some(about) = source.section("about") {
        let title = non_empty(&about.title).unwrap_or("About");
        docs.push(Document::new("about", title, field(&about.body)));
        for (idx, skill) in about.items.iter().enumerate() {
            let t = non_empty(&skill.title).unwrap_or("Skill");
            let p = field(&skill.body);
            docs.push(Document::new(format!("skill-{idx}"), format!("Skill: {t}"), format!("{t}: {p}")));
        }
    }

    if let Some(projects) = source.section("projects") {
        for (idx, card) in projects.items.iter().enumerate() {
            let t = non_empty(&card.title)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Project {}", idx + 1));
            let p = field(&card.body);
            let link = non_empty(&card.link).map(|href| format!(" Link: {href}")).unwrap_or_default();
            docs.push(Document::new(format!("project-{idx}"), format!("Project: {t}"), format!("{t}. {p}.{link}")));
        }
    }

    if let Some(contact) = source.section("contact") {
        let title = non_empty(&contact.title).unwrap_or("Contact");
        let socials = contact
            .links
            .iter()
            .map(|l| match non_empty(&l.href) {
                Some(href) => format!("{}: {href}", l.label.trim()),
                None => l.label.trim().to_string(),
            })
            .collect::<Vec<_>>()
            .join(" | ");
        let text = [field(&contact.body).to_string(), socials]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        docs.push(Document::new("contact", title, text));
    }

    let before = docs.len();
    docs.retain(|d| !d.text.trim().is_empty());
    tracing::debug!(collected = docs.len(), dropped = before - docs.len(), "collected documents");
    docs
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, body: &str) -> Item {
        Item { title: Some(title.into()), body: Some(body.into()), link: None }
    }

    #[test]
    fn collects_sections_in_order() {
        let content = StaticContent::new()
            .with_section("home", Section { body: Some(" Hi, I build things. ".into()), ..Default::default() })
            .with_section("about", Section {
                title: Some("About Me".into()),
                body: Some("Developer.".into()),
                items: vec![item("Rust", "Systems work")],
                ..Default::default()
            });
        let docs = collect(&content);
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["home", "about", "skill-0"]);
        assert_eq!(docs[0].text, "Hi, I build things.");
        assert_eq!(docs[1].title, "About Me");
        assert_eq!(docs[2].title, "Skill: Rust");
        assert_eq!(docs[2].text, "Rust: Systems work");
    }

    #[test]
    fn project_defaults_and_links() {
        let content = StaticContent::new().with_section("projects", Section {
            items: vec![
                Item { title: Some("Zap".into()), body: Some("Search engine".into()), link: Some("https://x.dev".into()) },
                Item { title: None, body: Some("Untitled".into()), link: None },
            ],
            ..Default::default()
        });
        let docs = collect(&content);
        assert_eq!(docs[0].id, "project-0");
        assert_eq!(docs[0].text, "Zap. Search engine. Link: https://x.dev");
        assert_eq!(docs[1].title, "Project: Project 2");
        assert_eq!(docs[1].text, "Project 2. Untitled.");
    }

    #[test]
    fn contact_joins_intro_and_socials() {
        let content = StaticContent::new().with_section("contact", Section {
            body: Some("Reach out any time.".into()),
            links: vec![
                Link { label: "GitHub".into(), href: Some("https://github.com/k".into()) },
                Link { label: " Email ".into(), href: None },
            ],
            ..Default::default()
        });
        let docs = collect(&content);
        assert_eq!(docs[0].title, "Contact");
        assert_eq!(docs[0].text, "Reach out any time. GitHub: https://github.com/k | Email");
    }

    #[test]
    fn blank_documents_are_dropped() {
        let content = StaticContent::new()
            .with_section("home", Section::default())
            .with_section("about", Section { body: Some("   ".into()), ..Default::default() })
            .with_section("contact", Section::default());
        assert!(collect(&content).is_empty());
    }
}
