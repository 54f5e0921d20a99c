//! Typed content blocks that make up a report.
//!
//! Blocks are created once by the [`crate::assembler`], never mutated afterwards, and consumed
//! exactly once by the [`crate::renderer`]. Their order is the reading order of the document.

use crate::error::{ReportError, Result};
use crate::style::{HorizontalAlignment, StyleName};

/// One discrete unit of document content.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentBlock {
    /// Title, subtitle or (sub)section heading.
    Heading { style: StyleName, text: String },
    /// Body-like paragraph with inline markup.
    Paragraph { style: StyleName, text: String },
    /// Indented quotation set in the quote style.
    Quote { text: String },
    Table(TableBlock),
    /// Vertical space in points.
    Spacer { height: f64 },
    PageBreak,
}

impl ContentBlock {
    pub fn heading(style: StyleName, text: impl Into<String>) -> Self {
        Self::Heading {
            style,
            text: text.into(),
        }
    }

    pub fn paragraph(style: StyleName, text: impl Into<String>) -> Self {
        Self::Paragraph {
            style,
            text: text.into(),
        }
    }

    pub fn quote(text: impl Into<String>) -> Self {
        Self::Quote { text: text.into() }
    }

    pub fn spacer(height: f64) -> Self {
        Self::Spacer { height }
    }

    /// The style the block is drawn with, if it is a text block.
    pub fn style(&self) -> Option<StyleName> {
        match self {
            Self::Heading { style, .. } | Self::Paragraph { style, .. } => Some(*style),
            Self::Quote { .. } => Some(StyleName::Quote),
            Self::Table(_) | Self::Spacer { .. } | Self::PageBreak => None,
        }
    }

    /// Whether the block opens a section and should appear in the document outline.
    pub fn is_section_heading(&self) -> bool {
        matches!(
            self,
            Self::Heading {
                style: StyleName::SectionHeading,
                ..
            }
        )
    }
}

/// Whether a table row is drawn as the header or as a body row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellRole {
    Header,
    Body,
}

impl CellRole {
    pub fn style(self) -> StyleName {
        match self {
            CellRole::Header => StyleName::TableHeader,
            CellRole::Body => StyleName::TableBody,
        }
    }
}

/// A grid of cell text whose first row is the header.
#[derive(Clone, Debug, PartialEq)]
pub struct TableBlock {
    rows: Vec<Vec<String>>,
    column_widths: Vec<f64>,
    alignments: Vec<HorizontalAlignment>,
}

impl TableBlock {
    /// Creates a table from rows of cell text (row 0 is the header) and column widths in points.
    ///
    /// The grid must be rectangular with at least one row and one column, and there must be
    /// exactly one positive width per column. Cell text is stored verbatim.
    pub fn new<R, C>(rows: R, column_widths: Vec<f64>) -> Result<Self>
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();

        let columns = rows.first().map(Vec::len).unwrap_or(0);
        if columns == 0 {
            return Err(ReportError::InvalidTable(
                "a table needs a header row with at least one cell".to_owned(),
            ));
        }
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns)
        {
            return Err(ReportError::InvalidTable(format!(
                "row {} has {} cells, expected {}",
                index,
                row.len(),
                columns
            )));
        }
        if column_widths.len() != columns {
            return Err(ReportError::InvalidTable(format!(
                "{} column widths given for {} columns",
                column_widths.len(),
                columns
            )));
        }
        if column_widths.iter().any(|width| !(*width > 0.0)) {
            return Err(ReportError::InvalidTable(
                "column widths must be positive".to_owned(),
            ));
        }

        Ok(Self {
            alignments: vec![HorizontalAlignment::Left; columns],
            rows,
            column_widths,
        })
    }

    /// Sets the alignment of the given columns; other columns keep theirs.
    pub fn with_column_alignment(
        mut self,
        columns: impl IntoIterator<Item = usize>,
        alignment: HorizontalAlignment,
    ) -> Result<Self> {
        for column in columns {
            let slot = self.alignments.get_mut(column).ok_or_else(|| {
                ReportError::InvalidTable(format!("column {column} does not exist"))
            })?;
            *slot = alignment;
        }
        Ok(self)
    }

    /// Total number of rows, header included.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_widths.len()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn header(&self) -> &[String] {
        &self.rows[0]
    }

    pub fn body(&self) -> &[Vec<String>] {
        &self.rows[1..]
    }

    pub fn column_widths(&self) -> &[f64] {
        &self.column_widths
    }

    pub fn alignments(&self) -> &[HorizontalAlignment] {
        &self.alignments
    }

    pub fn is_header_row(&self, row: usize) -> bool {
        row == 0
    }

    pub fn row_role(&self, row: usize) -> CellRole {
        if self.is_header_row(row) {
            CellRole::Header
        } else {
            CellRole::Body
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_reports_header_plus_body_rows() {
        let table = TableBlock::new(
            vec![
                vec!["Problemă", "Soluție"],
                vec!["\"tip top\" - anglicism", "\"design pe care l-ai purta și tu\""],
                vec!["Text tăiat la 'retur'", "Completează fraza întreruptă"],
            ],
            vec![226.8, 226.8],
        )
        .expect("valid table");

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.body().len(), 2);
        assert_eq!(table.header(), ["Problemă", "Soluție"]);
        assert_eq!(table.rows()[1][1], "\"design pe care l-ai purta și tu\"");
        assert_eq!(table.row_role(0), CellRole::Header);
        assert_eq!(table.row_role(2), CellRole::Body);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = TableBlock::new(vec![vec!["a", "b"], vec!["c"]], vec![10.0, 10.0]).unwrap_err();
        assert!(matches!(err, ReportError::InvalidTable(msg) if msg.contains("row 1")));
    }

    #[test]
    fn widths_must_match_columns() {
        assert!(TableBlock::new(vec![vec!["a", "b"]], vec![10.0]).is_err());
        assert!(TableBlock::new(vec![vec!["a"]], vec![0.0]).is_err());
        assert!(TableBlock::new(Vec::<Vec<&str>>::new(), vec![]).is_err());
    }

    #[test]
    fn column_alignment_is_validated() {
        let table = TableBlock::new(vec![vec!["a", "b", "c"]], vec![1.0, 1.0, 1.0])
            .expect("valid")
            .with_column_alignment([1, 2], HorizontalAlignment::Center)
            .expect("columns exist");
        assert_eq!(
            table.alignments(),
            [
                HorizontalAlignment::Left,
                HorizontalAlignment::Center,
                HorizontalAlignment::Center
            ]
        );

        let err = table.with_column_alignment([3], HorizontalAlignment::Right);
        assert!(err.is_err());
    }

    #[test]
    fn only_section_headings_open_sections() {
        assert!(ContentBlock::heading(StyleName::SectionHeading, "SEO").is_section_heading());
        assert!(!ContentBlock::heading(StyleName::Title, "Raport").is_section_heading());
        assert_eq!(ContentBlock::quote("q").style(), Some(StyleName::Quote));
        assert_eq!(ContentBlock::PageBreak.style(), None);
    }
}
