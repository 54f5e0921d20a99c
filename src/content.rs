//! Structured description of a review report, loaded from JSON.
//!
//! The content is data: the assembler turns it into blocks without interpreting the copy.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

const BUNDLED_CONTENT: &str = include_str!("../content/copy-review.json");

/// Title page, sections and closing lines of a report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportContent {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Large headline figure on the title page, such as a score.
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub summary: Vec<String>,
    #[serde(default)]
    pub sections: Vec<SectionContent>,
    /// Small centered lines closing the report.
    #[serde(default)]
    pub footer: Vec<String>,
}

/// A titled run of content items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionContent {
    pub title: String,
    /// Start the section on a fresh page.
    #[serde(default = "default_new_page")]
    pub new_page: bool,
    #[serde(default)]
    pub items: Vec<ContentItem>,
}

fn default_new_page() -> bool {
    true
}

/// One entry inside a section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentItem {
    Subheading(String),
    Paragraph(String),
    /// Bold body paragraph.
    Strong(String),
    /// Bold accent-colored label.
    Callout(String),
    Quote(String),
    Bullets(Vec<String>),
    Numbered(Vec<String>),
    Checklist(Vec<String>),
    Table(TableContent),
    /// Vertical space in points.
    Spacer(f64),
    PageBreak,
}

/// Table rows (first row is the header) with column widths in centimetres.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableContent {
    pub rows: Vec<Vec<String>>,
    pub column_widths_cm: Vec<f64>,
    #[serde(default)]
    pub centered_columns: Vec<usize>,
}

impl ReportContent {
    /// The copywriting review shipped with the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_CONTENT)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(ReportError::Content)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_content_parses() {
        let content = ReportContent::bundled().expect("bundled content is valid");
        assert!(!content.title.is_empty());
        assert!(content.sections.len() > 3);
        assert!(content
            .sections
            .iter()
            .flat_map(|section| &section.items)
            .any(|item| matches!(item, ContentItem::Table(_))));
    }

    #[test]
    fn items_use_snake_case_tags() {
        let section: SectionContent = serde_json::from_str(
            r#"{
                "title": "Quick wins",
                "items": [
                    { "subheading": "Keywords" },
                    { "bullets": ["a", "b"] },
                    { "spacer": 20 },
                    "page_break",
                    { "table": { "rows": [["h"], ["b"]], "column_widths_cm": [4] } }
                ]
            }"#,
        )
        .expect("valid section");

        assert!(section.new_page);
        assert_eq!(section.items.len(), 5);
        assert_eq!(section.items[3], ContentItem::PageBreak);
        assert!(matches!(&section.items[4], ContentItem::Table(t) if t.centered_columns.is_empty()));
    }

    #[test]
    fn malformed_content_is_reported() {
        let err = ReportContent::from_json(r#"{"sections": []}"#).unwrap_err();
        assert!(matches!(err, ReportError::Content(_)));
    }
}
