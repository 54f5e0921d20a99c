//! Turns a [`ReportContent`] description into the ordered block sequence of a report.
//!
//! Assembly never looks at the filesystem or the resolved fonts: the same content always yields
//! the same blocks.

use crate::content::{ContentItem, ReportContent, SectionContent, TableContent};
use crate::error::Result;
use crate::model::{ContentBlock, TableBlock};
use crate::style::{HorizontalAlignment, StyleName};

const POINTS_PER_CM: f64 = 72.0 / 2.54;
const TITLE_DISPLAY_GAP: f64 = 30.0;
const DISPLAY_SUMMARY_GAP: f64 = 20.0;
const FOOTER_GAP: f64 = 50.0;

/// Accumulates content blocks in reading order.
#[derive(Clone, Debug, Default)]
pub struct ReportAssembler {
    blocks: Vec<ContentBlock>,
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles the full report: title page, sections, closing footer.
    pub fn assemble(content: &ReportContent) -> Result<Vec<ContentBlock>> {
        let mut assembler = Self::new();
        assembler.title_page(content);
        for section in &content.sections {
            assembler.section(section)?;
        }
        assembler.footer(&content.footer);
        Ok(assembler.finish())
    }

    fn title_page(&mut self, content: &ReportContent) {
        self.heading(StyleName::Title, &content.title);
        if let Some(subtitle) = &content.subtitle {
            self.heading(StyleName::Subtitle, subtitle);
        }
        if let Some(display) = &content.display {
            self.spacer(TITLE_DISPLAY_GAP);
            self.paragraph(StyleName::Display, display);
            self.spacer(DISPLAY_SUMMARY_GAP);
        }
        for paragraph in &content.summary {
            self.paragraph(StyleName::Body, paragraph);
        }
    }

    fn section(&mut self, section: &SectionContent) -> Result<()> {
        if section.new_page {
            self.page_break();
        }
        self.heading(StyleName::SectionHeading, &section.title);
        for item in &section.items {
            self.item(item)?;
        }
        Ok(())
    }

    fn item(&mut self, item: &ContentItem) -> Result<()> {
        match item {
            ContentItem::Subheading(text) => self.heading(StyleName::SubsectionHeading, text),
            ContentItem::Paragraph(text) => self.paragraph(StyleName::Body, text),
            ContentItem::Strong(text) => self.paragraph(StyleName::Strong, text),
            ContentItem::Callout(text) => self.paragraph(StyleName::Callout, text),
            ContentItem::Quote(text) => self.quote(text),
            ContentItem::Bullets(items) => self.list(items, |_| "• ".to_owned()),
            ContentItem::Numbered(items) => self.list(items, |index| format!("{}. ", index + 1)),
            ContentItem::Checklist(items) => self.list(items, |_| "✓ ".to_owned()),
            ContentItem::Table(table) => self.table(table_block(table)?),
            ContentItem::Spacer(height) => self.spacer(*height),
            ContentItem::PageBreak => self.page_break(),
        }
        Ok(())
    }

    fn footer(&mut self, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        self.spacer(FOOTER_GAP);
        for line in lines {
            self.paragraph(StyleName::Footer, line);
        }
    }

    pub fn heading(&mut self, style: StyleName, text: &str) {
        self.blocks.push(ContentBlock::heading(style, text));
    }

    pub fn paragraph(&mut self, style: StyleName, text: &str) {
        self.blocks.push(ContentBlock::paragraph(style, text));
    }

    pub fn quote(&mut self, text: &str) {
        self.blocks.push(ContentBlock::quote(text));
    }

    /// Appends one body paragraph per item, each prefixed by `marker(index)`.
    pub fn list(&mut self, items: &[String], marker: impl Fn(usize) -> String) {
        for (index, item) in items.iter().enumerate() {
            let text = format!("{}{}", marker(index), item);
            self.paragraph(StyleName::Body, &text);
        }
    }

    pub fn table(&mut self, table: TableBlock) {
        self.blocks.push(ContentBlock::Table(table));
    }

    pub fn spacer(&mut self, height: f64) {
        self.blocks.push(ContentBlock::spacer(height));
    }

    pub fn page_break(&mut self) {
        self.blocks.push(ContentBlock::PageBreak);
    }

    pub fn finish(self) -> Vec<ContentBlock> {
        self.blocks
    }
}

fn table_block(table: &TableContent) -> Result<TableBlock> {
    let widths = table
        .column_widths_cm
        .iter()
        .map(|cm| cm * POINTS_PER_CM)
        .collect();
    TableBlock::new(table.rows.clone(), widths)?
        .with_column_alignment(table.centered_columns.iter().copied(), HorizontalAlignment::Center)
}
