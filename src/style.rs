//! Named paragraph styles derived from the resolved fonts and a color palette.

use std::fmt;

use genpdf::style::{Color, Style};
use serde::{Deserialize, Serialize};

use crate::fonts::{FontHandle, FontRole, FontSet};

/// An sRGB color, serialized as `#RRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.strip_prefix('#').unwrap_or(value);
        if hex.len() != 6 {
            return None;
        }
        parse_hex_rgb(hex).map(|(r, g, b)| Rgb(r, g, b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value).ok_or_else(|| format!("invalid color '{value}', expected #RRGGBB"))
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl From<Rgb> for Color {
    fn from(value: Rgb) -> Self {
        Color::Rgb(value.0, value.1, value.2)
    }
}

/// Parses exactly six hexadecimal digits into an RGB triple.
pub(crate) fn parse_hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// The fixed set of colors the report is drawn with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Section headings, the display line and table header fill.
    pub accent: Rgb,
    /// Body text and table grid.
    pub ink: Rgb,
    /// Table body fill.
    pub paper: Rgb,
    /// Subtitles, quotes and footers.
    pub muted: Rgb,
    /// Text drawn on top of the accent color.
    pub on_accent: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            accent: Rgb(0xFF, 0x3C, 0x1F),
            ink: Rgb(0x5C, 0x1A, 0x11),
            paper: Rgb(0xF5, 0xF1, 0xED),
            muted: Rgb(0xB8, 0x5C, 0x4A),
            on_accent: Rgb(0xFF, 0xFF, 0xFF),
        }
    }
}

/// Horizontal alignment of a paragraph or table column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl From<HorizontalAlignment> for genpdf::Alignment {
    fn from(value: HorizontalAlignment) -> Self {
        match value {
            HorizontalAlignment::Left => genpdf::Alignment::Left,
            HorizontalAlignment::Center => genpdf::Alignment::Center,
            HorizontalAlignment::Right => genpdf::Alignment::Right,
        }
    }
}

/// Semantic style names referenced by content blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleName {
    Title,
    Subtitle,
    Display,
    SectionHeading,
    SubsectionHeading,
    Body,
    Quote,
    Strong,
    Callout,
    Footer,
    TableHeader,
    TableBody,
}

impl StyleName {
    /// Every style, in table order.
    pub const ALL: [StyleName; 12] = [
        StyleName::Title,
        StyleName::Subtitle,
        StyleName::Display,
        StyleName::SectionHeading,
        StyleName::SubsectionHeading,
        StyleName::Body,
        StyleName::Quote,
        StyleName::Strong,
        StyleName::Callout,
        StyleName::Footer,
        StyleName::TableHeader,
        StyleName::TableBody,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StyleName::Title => "title",
            StyleName::Subtitle => "subtitle",
            StyleName::Display => "display",
            StyleName::SectionHeading => "section_heading",
            StyleName::SubsectionHeading => "subsection_heading",
            StyleName::Body => "body",
            StyleName::Quote => "quote",
            StyleName::Strong => "strong",
            StyleName::Callout => "callout",
            StyleName::Footer => "footer",
            StyleName::TableHeader => "table_header",
            StyleName::TableBody => "table_body",
        }
    }
}

impl fmt::Display for StyleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete visual attributes of a paragraph style.
///
/// Sizes, spacing, leading and indents are in points.
#[derive(Clone, Debug, PartialEq)]
pub struct ParagraphStyle {
    pub font: FontHandle,
    pub role: FontRole,
    pub size: u8,
    pub color: Rgb,
    pub space_before: f64,
    pub space_after: f64,
    pub leading: f64,
    pub alignment: HorizontalAlignment,
    pub left_indent: f64,
    pub right_indent: f64,
}

impl ParagraphStyle {
    fn new(fonts: &FontSet, role: FontRole, size: u8, color: Rgb) -> Self {
        Self {
            font: fonts.handle(role).clone(),
            role,
            size,
            color,
            space_before: 0.0,
            space_after: 0.0,
            leading: f64::from(size) * 1.2,
            alignment: HorizontalAlignment::Left,
            left_indent: 0.0,
            right_indent: 0.0,
        }
    }

    fn spacing(mut self, before: f64, after: f64) -> Self {
        self.space_before = before;
        self.space_after = after;
        self
    }

    fn leading(mut self, leading: f64) -> Self {
        self.leading = leading;
        self
    }

    fn centered(mut self) -> Self {
        self.alignment = HorizontalAlignment::Center;
        self
    }

    fn indented(mut self, left: f64, right: f64) -> Self {
        self.left_indent = left;
        self.right_indent = right;
        self
    }

    /// The `genpdf` text style for this paragraph style.
    ///
    /// The font family itself is set once on the document, so only the role flags are applied
    /// here. Line spacing is expressed relative to the conventional 1.2 × size leading.
    pub fn text_style(&self) -> Style {
        let mut style = Style::new()
            .with_font_size(self.size)
            .with_color(self.color.into());
        style.set_line_spacing(self.leading / (f64::from(self.size) * 1.2));
        match self.role {
            FontRole::Regular => {}
            FontRole::Bold => style.set_bold(),
            FontRole::Italic => style.set_italic(),
        }
        style
    }
}

/// Fill, grid and padding shared by every table in the report.
#[derive(Clone, Debug, PartialEq)]
pub struct TableDecoration {
    pub header_fill: Rgb,
    pub body_fill: Rgb,
    /// Grid lines are 1pt wide.
    pub grid_color: Rgb,
    /// Cell padding in points: top, right, bottom, left.
    pub padding: [f64; 4],
}

/// The fixed mapping from [`StyleName`] to [`ParagraphStyle`], resolved once per run.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleTable {
    title: ParagraphStyle,
    subtitle: ParagraphStyle,
    display: ParagraphStyle,
    section_heading: ParagraphStyle,
    subsection_heading: ParagraphStyle,
    body: ParagraphStyle,
    quote: ParagraphStyle,
    strong: ParagraphStyle,
    callout: ParagraphStyle,
    footer: ParagraphStyle,
    table_header: ParagraphStyle,
    table_body: ParagraphStyle,
    table: TableDecoration,
}

impl StyleTable {
    /// Builds the style table. Pure: identical inputs always give identical styles.
    pub fn build(fonts: &FontSet, palette: &Palette) -> Self {
        use FontRole::{Bold, Italic, Regular};

        let title = ParagraphStyle::new(fonts, Regular, 24, palette.ink)
            .spacing(0.0, 20.0)
            .centered();
        let display = ParagraphStyle::new(fonts, Regular, 48, palette.accent)
            .spacing(0.0, 20.0)
            .centered();
        let body = ParagraphStyle::new(fonts, Regular, 10, palette.ink)
            .spacing(0.0, 8.0)
            .leading(14.0);

        Self {
            subtitle: ParagraphStyle::new(fonts, Regular, 14, palette.muted)
                .spacing(0.0, 30.0)
                .centered(),
            section_heading: ParagraphStyle::new(fonts, Regular, 16, palette.accent)
                .spacing(20.0, 10.0),
            subsection_heading: ParagraphStyle::new(fonts, Regular, 13, palette.ink)
                .spacing(15.0, 8.0),
            quote: ParagraphStyle::new(fonts, Italic, 10, palette.muted)
                .spacing(0.0, 8.0)
                .leading(14.0)
                .indented(20.0, 20.0),
            strong: ParagraphStyle {
                font: fonts.bold.clone(),
                role: Bold,
                ..body.clone()
            },
            callout: ParagraphStyle::new(fonts, Bold, 11, palette.accent)
                .spacing(0.0, 8.0)
                .leading(14.0),
            footer: ParagraphStyle::new(fonts, Regular, 9, palette.muted)
                .spacing(0.0, 8.0)
                .leading(14.0)
                .centered(),
            table_header: ParagraphStyle::new(fonts, Bold, 9, palette.on_accent),
            table_body: ParagraphStyle::new(fonts, Regular, 9, palette.ink),
            table: TableDecoration {
                header_fill: palette.accent,
                body_fill: palette.paper,
                grid_color: palette.ink,
                padding: [8.0, 6.0, 8.0, 6.0],
            },
            title,
            display,
            body,
        }
    }

    /// Returns the style registered under `name`.
    pub fn get(&self, name: StyleName) -> &ParagraphStyle {
        match name {
            StyleName::Title => &self.title,
            StyleName::Subtitle => &self.subtitle,
            StyleName::Display => &self.display,
            StyleName::SectionHeading => &self.section_heading,
            StyleName::SubsectionHeading => &self.subsection_heading,
            StyleName::Body => &self.body,
            StyleName::Quote => &self.quote,
            StyleName::Strong => &self.strong,
            StyleName::Callout => &self.callout,
            StyleName::Footer => &self.footer,
            StyleName::TableHeader => &self.table_header,
            StyleName::TableBody => &self.table_body,
        }
    }

    /// Table fill, grid and padding settings.
    pub fn table(&self) -> &TableDecoration {
        &self.table
    }

    /// Iterates over all styles in [`StyleName::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (StyleName, &ParagraphStyle)> {
        StyleName::ALL.into_iter().map(move |name| (name, self.get(name)))
    }
}
