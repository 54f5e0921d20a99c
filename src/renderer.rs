//! Turns assembled content blocks into PDF bytes with `genpdf`.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use genpdf::elements::{LinearLayout, PageBreak, Paragraph};
use genpdf::error::Error;
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::Style;
use genpdf::{Alignment, Document, Element, Margins, PageDecorator};
use log::{debug, info};

use crate::config::PageGeometry;
use crate::elements::{
    pt_to_mm, Anchored, GridStyle, GridTable, PageCounter, SectionPages, VerticalSpace,
};
use crate::error::{ReportError, Result};
use crate::fonts::{fold_to_win1252, FontSet};
use crate::model::{ContentBlock, TableBlock};
use crate::richtext::parse_markup;
use crate::style::{ParagraphStyle, StyleName, StyleTable};

/// Result of a render pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Section heading texts in document order.
    pub section_titles: Vec<String>,
    /// 1-based page on which each section heading was placed.
    pub section_pages: Vec<Option<usize>>,
}

/// Renders one block sequence into a PDF document.
///
/// Blocks are consumed in order; every style must reference a font of the resolved [`FontSet`].
pub struct ReportRenderer {
    font_family: FontFamily<FontData>,
    fonts: FontSet,
    styles: StyleTable,
    page: PageGeometry,
    title: Option<String>,
    repeat_table_header: bool,
}

impl ReportRenderer {
    pub fn new(font_family: FontFamily<FontData>, fonts: FontSet, styles: StyleTable) -> Self {
        Self {
            font_family,
            fonts,
            styles,
            page: PageGeometry::default(),
            title: None,
            repeat_table_header: true,
        }
    }

    /// Sets the paper size and margins.
    pub fn with_page(mut self, page: PageGeometry) -> Self {
        self.page = page;
        self
    }

    /// Sets the document title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Controls whether table headers are repeated on continuation pages.
    pub fn with_repeated_table_header(mut self, repeat: bool) -> Self {
        self.repeat_table_header = repeat;
        self
    }

    /// Lays out `blocks` and returns the PDF bytes.
    pub fn render(self, blocks: &[ContentBlock]) -> Result<RenderedReport> {
        check_style_fonts(&self.styles, &self.fonts)?;
        debug!("Rendering {} content blocks", blocks.len());

        let section_titles: Vec<String> = blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Heading { text, .. } if block.is_section_heading() => {
                    Some(text.clone())
                }
                _ => None,
            })
            .collect();
        let counter: PageCounter = Rc::new(Cell::new(0));
        let section_pages: SectionPages = Rc::new(RefCell::new(vec![None; section_titles.len()]));

        let mut body = LinearLayout::vertical();
        let mut slot = 0;
        for block in blocks {
            match block {
                ContentBlock::Heading { style, text } if block.is_section_heading() => {
                    let style = self.styles.get(*style);
                    let lines = self.text_lines(style, text)?;
                    body.push(
                        Anchored::new(lines, slot, Rc::clone(&counter), Rc::clone(&section_pages))
                            .padded(padding(style)),
                    );
                    slot += 1;
                }
                _ => self.push_block(&mut body, block)?,
            }
        }

        let Self {
            font_family,
            styles,
            page,
            title,
            ..
        } = self;

        let mut document = Document::new(font_family);
        document.set_paper_size(page.paper.size());
        document.set_font_size(styles.get(StyleName::Body).size);
        if let Some(title) = title {
            document.set_title(title);
        }
        document.set_page_decorator(CountingPageDecorator::new(
            page.margins(),
            Rc::clone(&counter),
        ));
        document.push(body);

        let mut bytes = Vec::new();
        document.render(&mut bytes)?;

        let page_count = counter.get();
        info!("Rendered {} pages ({} bytes)", page_count, bytes.len());

        let section_pages = section_pages.borrow().clone();
        Ok(RenderedReport {
            bytes,
            page_count,
            section_titles,
            section_pages,
        })
    }

    /// Renders and writes the PDF to `path`, creating missing parent directories first.
    pub fn render_to_file(self, blocks: &[ContentBlock], path: &Path) -> Result<RenderedReport> {
        let report = self.render(blocks)?;
        write_pdf(path, &report.bytes)?;
        Ok(report)
    }

    /// Renders the PDF and adds an outline entry for every section heading.
    #[cfg(feature = "bookmarks")]
    pub fn render_with_bookmarks(self, blocks: &[ContentBlock]) -> Result<RenderedReport> {
        let mut report = self.render(blocks)?;
        report.bytes = crate::bookmarks::apply_section_bookmarks(
            &report.bytes,
            &report.section_titles,
            &report.section_pages,
        )?;
        Ok(report)
    }

    fn push_block(&self, layout: &mut LinearLayout, block: &ContentBlock) -> Result<()> {
        match block {
            ContentBlock::Heading { style, text } | ContentBlock::Paragraph { style, text } => {
                let style = self.styles.get(*style);
                layout.push(self.text_lines(style, text)?.padded(padding(style)));
            }
            ContentBlock::Quote { text } => {
                let style = self.styles.get(StyleName::Quote);
                layout.push(self.text_lines(style, text)?.padded(padding(style)));
            }
            ContentBlock::Table(table) => layout.push(self.table_element(table)),
            ContentBlock::Spacer { height } => layout.push(VerticalSpace::new(pt_to_mm(*height))),
            ContentBlock::PageBreak => layout.push(PageBreak::new()),
        }
        Ok(())
    }

    /// One `genpdf` paragraph per source line; blank lines become a gap of one leading.
    fn text_lines(&self, style: &ParagraphStyle, text: &str) -> Result<LinearLayout> {
        let text_style = style.text_style();
        let alignment: Alignment = style.alignment.into();

        let mut lines = LinearLayout::vertical();
        for line in text.split('\n') {
            if line.trim().is_empty() {
                lines.push(VerticalSpace::new(pt_to_mm(style.leading)));
                continue;
            }

            let line = self.encodable(line);
            let spans = parse_markup(&line).map_err(|source| ReportError::Markup {
                text: line.clone(),
                source,
            })?;
            let mut paragraph = Paragraph::default();
            for span in &spans {
                paragraph.push(span.to_styled_string(text_style));
            }
            paragraph.set_alignment(alignment);
            lines.push(paragraph);
        }
        Ok(lines)
    }

    fn table_element(&self, table: &TableBlock) -> GridTable {
        let decoration = self.styles.table();
        let [top, right, bottom, left] = decoration.padding;
        let style = GridStyle {
            header_text: self.styles.get(StyleName::TableHeader).text_style(),
            body_text: self.styles.get(StyleName::TableBody).text_style(),
            header_fill: decoration.header_fill.into(),
            body_fill: decoration.body_fill.into(),
            grid_color: decoration.grid_color.into(),
            padding: [pt_to_mm(top), pt_to_mm(right), pt_to_mm(bottom), pt_to_mm(left)],
        };

        let rows = table
            .rows()
            .iter()
            .map(|row| row.iter().map(|cell| self.encodable(cell)).collect())
            .collect();
        let widths = table.column_widths().iter().copied().map(pt_to_mm).collect();
        let alignments = table.alignments().iter().copied().map(Into::into).collect();

        GridTable::new(rows, widths, alignments, style).with_repeated_header(self.repeat_table_header)
    }

    /// Built-in fonts only cover Windows-1252, so their text is folded first.
    fn encodable(&self, text: &str) -> String {
        if self.fonts.is_builtin() {
            fold_to_win1252(text).into_owned()
        } else {
            text.to_owned()
        }
    }
}

/// Space before and after plus the indents of `style`.
fn padding(style: &ParagraphStyle) -> Margins {
    Margins::trbl(
        pt_to_mm(style.space_before),
        pt_to_mm(style.right_indent),
        pt_to_mm(style.space_after),
        pt_to_mm(style.left_indent),
    )
}

/// Checks that every style resolves to a font of the active set.
pub fn check_style_fonts(styles: &StyleTable, fonts: &FontSet) -> Result<()> {
    for (name, style) in styles.iter() {
        if !fonts.contains(&style.font) {
            return Err(ReportError::UnregisteredFont {
                style: name.to_string(),
                font: style.font.name().to_owned(),
            });
        }
    }
    Ok(())
}

/// Writes `bytes` to `path`, creating the parent directory when needed.
pub fn write_pdf(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ReportError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, bytes).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Applies the page margins and advances the shared page counter.
struct CountingPageDecorator {
    margins: Margins,
    counter: PageCounter,
}

impl CountingPageDecorator {
    fn new(margins: Margins, counter: PageCounter) -> Self {
        Self { margins, counter }
    }
}

impl PageDecorator for CountingPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        _context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        _style: Style,
    ) -> std::result::Result<genpdf::render::Area<'a>, Error> {
        self.counter.set(self.counter.get() + 1);
        area.add_margins(self.margins);
        Ok(area)
    }
}
