//! Element implementations built on top of `genpdf` primitives.
//!
//! `genpdf` has no filled table cells, fixed-height spacers or page tracking, so this module
//! provides a [`GridTable`], a [`VerticalSpace`] and an [`Anchored`] wrapper that records the page
//! an element lands on.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use genpdf::error::Error;
use genpdf::fonts::FontCache;
use genpdf::style::{Color, Style, StyledString};
use genpdf::{render, Alignment, Context, Element, Mm, Position, RenderResult, Size};

const MM_PER_POINT: f64 = 25.4 / 72.0;

/// Width of every stroke `Area::draw_line` produces (1pt).
const STROKE_WIDTH_MM: f64 = MM_PER_POINT;

/// Distance between the strokes that paint a cell background; below the stroke width so
/// neighbouring strokes overlap.
const FILL_STEP_MM: f64 = 0.3;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Converts typographic points to millimetres.
pub fn pt_to_mm(points: f64) -> Mm {
    mm_from_f64(points * MM_PER_POINT)
}

/// Fixed vertical gap. Shrinks to the remaining space at the bottom of a page instead of
/// spilling onto the next one.
pub struct VerticalSpace {
    height: Mm,
}

impl VerticalSpace {
    pub fn new(height: Mm) -> Self {
        Self { height }
    }
}

impl Element for VerticalSpace {
    fn render(
        &mut self,
        _context: &Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let available = area.size().height;
        let height = if self.height > available {
            available
        } else {
            self.height
        };
        let mut result = RenderResult::default();
        result.size = Size::new(0, height);
        Ok(result)
    }
}

/// Shared page number, advanced by the page decorator for every new page.
pub type PageCounter = Rc<Cell<usize>>;

/// Shared per-section slots receiving the page each section starts on.
pub type SectionPages = Rc<RefCell<Vec<Option<usize>>>>;

/// Wraps an element and records the page on which it first produced output.
pub struct Anchored<E> {
    inner: E,
    slot: usize,
    counter: PageCounter,
    pages: SectionPages,
}

impl<E: Element> Anchored<E> {
    pub fn new(inner: E, slot: usize, counter: PageCounter, pages: SectionPages) -> Self {
        Self {
            inner,
            slot,
            counter,
            pages,
        }
    }
}

impl<E: Element> Element for Anchored<E> {
    fn render(
        &mut self,
        context: &Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let result = self.inner.render(context, area, style)?;
        if mm_to_f64(result.size.height) > 0.0 {
            if let Some(page) = self.pages.borrow_mut().get_mut(self.slot) {
                page.get_or_insert(self.counter.get());
            }
        }
        Ok(result)
    }
}

/// Visual settings of a [`GridTable`].
///
/// Grid lines are drawn with the engine's fixed 1pt stroke.
#[derive(Clone, Copy, Debug)]
pub struct GridStyle {
    pub header_text: Style,
    pub body_text: Style,
    pub header_fill: Color,
    pub body_fill: Color,
    pub grid_color: Color,
    /// Cell padding: top, right, bottom, left.
    pub padding: [Mm; 4],
}

struct RowLayout {
    row: usize,
    lines: Vec<Vec<String>>,
    line_height: f64,
    height: f64,
}

/// A table with a filled header row, filled body rows and a full grid.
///
/// Column widths are nominal and in millimetres; they are scaled down proportionally when the
/// table is wider than the available area, and the table is centered otherwise. Rows that do not
/// fit move to the next page, optionally below a repeated header row.
pub struct GridTable {
    rows: Vec<Vec<String>>,
    widths: Vec<f64>,
    alignments: Vec<Alignment>,
    style: GridStyle,
    repeat_header: bool,
    next_row: usize,
}

impl GridTable {
    pub fn new(
        rows: Vec<Vec<String>>,
        widths: Vec<Mm>,
        alignments: Vec<Alignment>,
        style: GridStyle,
    ) -> Self {
        Self {
            rows,
            widths: widths.into_iter().map(mm_to_f64).collect(),
            alignments,
            style,
            repeat_header: true,
            next_row: 0,
        }
    }

    pub fn with_repeated_header(mut self, repeat_header: bool) -> Self {
        self.repeat_header = repeat_header;
        self
    }

    fn fitted_widths(&self, available: f64) -> Vec<f64> {
        let total: f64 = self.widths.iter().sum();
        if total > available && total > 0.0 {
            let scale = available / total;
            self.widths.iter().map(|width| width * scale).collect()
        } else {
            self.widths.clone()
        }
    }

    fn text_style(&self, row: usize, base: Style) -> Style {
        if row == 0 {
            base.and(self.style.header_text)
        } else {
            base.and(self.style.body_text)
        }
    }

    fn layout_row(
        &self,
        font_cache: &FontCache,
        row: usize,
        widths: &[f64],
        base: Style,
    ) -> RowLayout {
        let style = self.text_style(row, base);
        let [top, right, bottom, left] = self.style.padding.map(mm_to_f64);
        let line_height = mm_to_f64(style.line_height(font_cache));

        let lines: Vec<Vec<String>> = self.rows[row]
            .iter()
            .zip(widths)
            .map(|(text, width)| {
                wrap_lines(text, width - left - right, |s| text_width(s, style, font_cache))
            })
            .collect();
        let line_count = lines.iter().map(Vec::len).max().unwrap_or(1).max(1);

        RowLayout {
            row,
            lines,
            line_height,
            height: line_height * line_count as f64 + top + bottom,
        }
    }

    fn draw_row(
        &self,
        context: &Context,
        area: &render::Area<'_>,
        layout: &RowLayout,
        origin: (f64, f64),
        widths: &[f64],
        base: Style,
    ) -> Result<(), Error> {
        let (x0, y) = origin;
        let style = self.text_style(layout.row, base);
        let fill = if layout.row == 0 {
            self.style.header_fill
        } else {
            self.style.body_fill
        };
        let [top, right, _, left] = self.style.padding.map(mm_to_f64);

        let total_width: f64 = widths.iter().sum();
        let fill_style = Style::new().with_color(fill);
        for offset in fill_offsets(layout.height) {
            let stroke_y = mm_from_f64(y + offset);
            area.draw_line(
                vec![
                    Position::new(mm_from_f64(x0), stroke_y),
                    Position::new(mm_from_f64(x0 + total_width), stroke_y),
                ],
                fill_style,
            );
        }

        let mut x = x0;
        for (column, (lines, width)) in layout.lines.iter().zip(widths).enumerate() {
            let inner = width - left - right;
            let alignment = self
                .alignments
                .get(column)
                .copied()
                .unwrap_or(Alignment::Left);

            for (index, line) in lines.iter().enumerate() {
                let line_width = text_width(line, style, &context.font_cache);
                let offset = match alignment {
                    Alignment::Left => 0.0,
                    Alignment::Center => ((inner - line_width) / 2.0).max(0.0),
                    Alignment::Right => (inner - line_width).max(0.0),
                };
                let position = Position::new(
                    mm_from_f64(x + left + offset),
                    mm_from_f64(y + top + layout.line_height * index as f64),
                );
                area.print_str(&context.font_cache, position, style, line)?;
            }
            x += width;
        }
        Ok(())
    }

    fn draw_grid(
        &self,
        area: &render::Area<'_>,
        x0: f64,
        row_tops: &[f64],
        bottom: f64,
        widths: &[f64],
    ) {
        let grid_style = Style::new().with_color(self.style.grid_color);
        let right = x0 + widths.iter().sum::<f64>();

        for y in row_tops.iter().copied().chain(std::iter::once(bottom)) {
            area.draw_line(
                vec![
                    Position::new(mm_from_f64(x0), mm_from_f64(y)),
                    Position::new(mm_from_f64(right), mm_from_f64(y)),
                ],
                grid_style,
            );
        }

        let top = row_tops.first().copied().unwrap_or(bottom);
        let mut x = x0;
        for edge in std::iter::once(0.0).chain(widths.iter().copied()) {
            x += edge;
            area.draw_line(
                vec![
                    Position::new(mm_from_f64(x), mm_from_f64(top)),
                    Position::new(mm_from_f64(x), mm_from_f64(bottom)),
                ],
                grid_style,
            );
        }
    }
}

impl Element for GridTable {
    fn render(
        &mut self,
        context: &Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        if self.next_row >= self.rows.len() {
            return Ok(result);
        }

        let available_width = mm_to_f64(area.size().width);
        let available_height = mm_to_f64(area.size().height);
        let widths = self.fitted_widths(available_width);
        let total_width: f64 = widths.iter().sum();
        let x0 = ((available_width - total_width) / 2.0).max(0.0);

        let planned = plan_page(
            self.next_row,
            self.rows.len(),
            self.repeat_header,
            available_height,
            |row| self.layout_row(&context.font_cache, row, &widths, style).height,
        );
        let Some(&last) = planned.last() else {
            result.has_more = true;
            return Ok(result);
        };

        let mut row_tops = Vec::with_capacity(planned.len());
        let mut y = 0.0;
        for &row in &planned {
            let layout = self.layout_row(&context.font_cache, row, &widths, style);
            self.draw_row(context, &area, &layout, (x0, y), &widths, style)?;
            row_tops.push(y);
            y += layout.height;
        }
        self.draw_grid(&area, x0, &row_tops, y, &widths);

        self.next_row = last + 1;
        result.size = Size::new(mm_from_f64(total_width), mm_from_f64(y));
        result.has_more = self.next_row < self.rows.len();
        Ok(result)
    }
}

/// Picks the rows drawn on one page: the header again when `repeat_header` is set and the table
/// is continuing, then as many pending rows as fit into `available`.
///
/// Returns no rows when nothing pending fits, or when the header would end up alone at the
/// bottom of the page.
fn plan_page(
    next_row: usize,
    row_count: usize,
    repeat_header: bool,
    available: f64,
    mut height: impl FnMut(usize) -> f64,
) -> Vec<usize> {
    let repeated = (next_row > 0 && repeat_header).then_some(0);

    let mut planned = Vec::new();
    let mut used = 0.0;
    for row in repeated.into_iter().chain(next_row..row_count) {
        let row_height = height(row);
        if used + row_height > available {
            break;
        }
        used += row_height;
        planned.push(row);
    }

    let advanced = planned.iter().filter(|row| **row >= next_row).count();
    let remaining = row_count - next_row - advanced;
    let header_only = planned.iter().all(|row| *row == 0) && remaining > 0;
    if advanced == 0 || header_only {
        planned.clear();
    }
    planned
}

/// Vertical offsets of the strokes painting a background `height` tall, each stroke being
/// [`STROKE_WIDTH_MM`] wide and centered on its offset.
fn fill_offsets(height: f64) -> Vec<f64> {
    let half = STROKE_WIDTH_MM / 2.0;
    let last = (height - half).max(height / 2.0);
    let mut offset = half.min(height / 2.0);

    let mut offsets = vec![offset];
    while offset < last {
        offset = (offset + FILL_STEP_MM).min(last);
        offsets.push(offset);
    }
    offsets
}

fn text_width(text: &str, style: Style, font_cache: &FontCache) -> f64 {
    mm_to_f64(StyledString::new(text.to_owned(), style).width(font_cache))
}

/// Greedy word wrap. Explicit `\n` always breaks; words wider than `max_width` are split
/// between characters.
fn wrap_lines(text: &str, max_width: f64, width: impl Fn(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            for piece in split_word(word, max_width, &width) {
                if line.is_empty() {
                    line = piece;
                    continue;
                }
                let candidate = format!("{line} {piece}");
                if width(&candidate) <= max_width {
                    line = candidate;
                } else {
                    lines.push(std::mem::replace(&mut line, piece));
                }
            }
        }
        lines.push(line);
    }
    lines
}

fn split_word(word: &str, max_width: f64, width: impl Fn(&str) -> f64) -> Vec<String> {
    if width(word) <= max_width {
        return vec![word.to_owned()];
    }

    let mut pieces = Vec::new();
    let mut piece = String::new();
    for ch in word.chars() {
        piece.push(ch);
        if width(&piece) > max_width && piece.chars().count() > 1 {
            piece.pop();
            pieces.push(std::mem::replace(&mut piece, ch.to_string()));
        }
    }
    pieces.push(piece);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_width(text: &str) -> f64 {
        text.chars().count() as f64
    }

    #[test]
    fn point_conversion_matches_inches() {
        assert!((mm_to_f64(pt_to_mm(72.0)) - 25.4).abs() < 1e-9);
        assert!((mm_to_f64(mm_from_f64(12.5)) - 12.5).abs() < 1e-9);
    }

    #[test]
    fn fill_strokes_cover_the_whole_row() {
        let half = STROKE_WIDTH_MM / 2.0;
        for height in [0.2, 1.0, 7.3, 12.0] {
            let offsets = fill_offsets(height);
            assert!(offsets[0] - half <= 1e-9, "top edge uncovered for {height}");
            assert!(
                offsets[offsets.len() - 1] + half >= height - 1e-9,
                "bottom edge uncovered for {height}"
            );
            assert!(offsets
                .windows(2)
                .all(|pair| pair[1] - pair[0] <= STROKE_WIDTH_MM));
        }
    }

    #[test]
    fn long_tables_repeat_the_header_on_every_page() {
        let height = |row: usize| if row == 0 { 12.0 } else { 10.0 };
        let mut pages = Vec::new();
        let mut next_row = 0;
        while next_row < 121 {
            let planned = plan_page(next_row, 121, true, 100.0, height);
            assert!(!planned.is_empty(), "no progress at row {next_row}");
            assert!(planned.iter().map(|row| height(*row)).sum::<f64>() <= 100.0);
            next_row = planned[planned.len() - 1] + 1;
            pages.push(planned);
        }

        assert!(pages.len() > 1);
        assert!(pages.iter().all(|page| page[0] == 0));
        let body: Vec<usize> = pages
            .iter()
            .flatten()
            .copied()
            .filter(|row| *row > 0)
            .collect();
        assert_eq!(body, (1..=120).collect::<Vec<_>>());
    }

    #[test]
    fn continuation_pages_skip_header_when_not_repeated() {
        let planned = plan_page(40, 121, false, 100.0, |_| 10.0);
        assert_eq!(planned, (40..50).collect::<Vec<_>>());
    }

    #[test]
    fn header_is_not_left_alone_at_page_bottom() {
        assert!(plan_page(0, 5, true, 15.0, |row| if row == 0 { 12.0 } else { 10.0 }).is_empty());
        assert_eq!(plan_page(0, 1, true, 15.0, |_| 12.0), vec![0]);
    }

    #[test]
    fn row_taller_than_page_plans_nothing() {
        assert!(plan_page(3, 5, true, 100.0, |row| if row == 3 { 250.0 } else { 10.0 }).is_empty());
    }

    #[test]
    fn wrapping_breaks_on_words_and_newlines() {
        assert_eq!(
            wrap_lines("5 articole premium\nCurățare inclusă", 10.0, char_width),
            ["5 articole", "premium", "Curățare", "inclusă"]
        );
    }

    #[test]
    fn overlong_words_are_split_to_the_cell() {
        let lines = wrap_lines("vezi https://babyseasons.ro/colectie", 8.0, char_width);
        assert!(lines.iter().all(|line| char_width(line) <= 8.0), "{lines:?}");
        assert_eq!(lines.concat(), "vezihttps://babyseasons.ro/colectie");
    }
}
