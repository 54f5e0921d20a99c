//! Inline styling for paragraph text.
//!
//! Paragraph content is written with a small markdown-like syntax and parsed into [`Span`]s,
//! which are then turned into [`genpdf`] styled strings by the renderer.

use std::fmt;

use genpdf::style::{Color, Style, StyledString};

/// A slice of text together with inline style attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    text: String,
    bold: bool,
    italic: bool,
    color: Option<Color>,
}

impl Span {
    /// Creates a new span with the provided text and no styles applied.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Returns the raw text contained in this span.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns whether the span should be rendered in bold.
    pub fn is_bold(&self) -> bool {
        self.bold
    }

    /// Returns whether the span should be rendered in italic.
    pub fn is_italic(&self) -> bool {
        self.italic
    }

    /// Returns the configured color for the span, if any.
    pub fn color(&self) -> Option<Color> {
        self.color
    }

    /// Marks the span as bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Marks the span as italic.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Assigns a color to the span.
    pub fn colored(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Builds a styled string on top of `base`. Inline attributes win over the base style.
    pub fn to_styled_string(&self, base: Style) -> StyledString {
        let mut style = base;
        if let Some(color) = self.color {
            style.set_color(color);
        }
        if self.bold {
            style.set_bold();
        }
        if self.italic {
            style.set_italic();
        }
        StyledString::new(self.text.clone(), style)
    }
}

/// Parse errors produced by [`parse_markup`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    index: usize,
    message: String,
}

impl ParseError {
    fn new(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
        }
    }

    /// Byte index in the original input string where the error was detected.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Human-readable description of the parsing error.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.message, self.index)
    }
}

impl std::error::Error for ParseError {}

#[derive(Clone, Copy, Debug, Default)]
struct StyleState {
    bold: bool,
    italic: bool,
    color: Option<Color>,
}

impl StyleState {
    fn to_span(self, text: impl Into<String>) -> Span {
        Span {
            text: text.into(),
            bold: self.bold,
            italic: self.italic,
            color: self.color,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Marker {
    Bold,
    Italic,
    Color,
}

impl Marker {
    fn closing_token(self) -> &'static str {
        match self {
            Marker::Bold => "**",
            Marker::Italic => "*",
            Marker::Color => "}",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Marker::Bold => "bold span",
            Marker::Italic => "italic span",
            Marker::Color => "color span",
        }
    }
}

/// Parses a single line of inline markup into a list of [`Span`]s.
///
/// Supported constructs:
///
/// - `**bold**`
/// - `*italic*`
/// - `[color=#RRGGBB]{text}`
///
/// Square brackets that do not start a color directive are kept as literal text, so copy such
/// as `[Explore the collection]` passes through untouched.
pub fn parse_markup(input: &str) -> Result<Vec<Span>, ParseError> {
    let (spans, idx) = parse_inner(input, 0, StyleState::default(), None)?;
    debug_assert_eq!(idx, input.len());
    Ok(spans)
}

/// Concatenates the text of all spans, dropping the styling.
pub fn plain_text(spans: &[Span]) -> String {
    spans.iter().map(Span::text).collect()
}

fn parse_inner(
    input: &str,
    mut index: usize,
    state: StyleState,
    closing_marker: Option<Marker>,
) -> Result<(Vec<Span>, usize), ParseError> {
    let mut spans = Vec::new();
    let mut buffer = String::new();

    while index < input.len() {
        let rest = &input[index..];

        if let Some(marker) = closing_marker {
            if rest.starts_with(marker.closing_token()) {
                flush_buffer(&mut buffer, &mut spans, state);
                index += marker.closing_token().len();
                return Ok((spans, index));
            }
        }

        if rest.starts_with("**") {
            flush_buffer(&mut buffer, &mut spans, state);
            let nested_state = StyleState {
                bold: true,
                ..state
            };
            let (nested, new_index) =
                parse_inner(input, index + 2, nested_state, Some(Marker::Bold))?;
            spans.extend(nested);
            index = new_index;
            continue;
        }

        if rest.starts_with('*') {
            flush_buffer(&mut buffer, &mut spans, state);
            let nested_state = StyleState {
                italic: true,
                ..state
            };
            let (nested, new_index) =
                parse_inner(input, index + 1, nested_state, Some(Marker::Italic))?;
            spans.extend(nested);
            index = new_index;
            continue;
        }

        if rest.starts_with("[color=") {
            let (color, after_directive) = parse_color_directive(input, index)?;
            flush_buffer(&mut buffer, &mut spans, state);
            let nested_state = StyleState {
                color: Some(color),
                ..state
            };
            let (nested, new_index) =
                parse_inner(input, after_directive, nested_state, Some(Marker::Color))?;
            spans.extend(nested);
            index = new_index;
            continue;
        }

        if rest.starts_with('}') {
            return Err(ParseError::new(
                index,
                "unexpected closing token `}` without matching opening `[color=...]`",
            ));
        }

        let Some(ch) = rest.chars().next() else {
            break;
        };
        buffer.push(ch);
        index += ch.len_utf8();
    }

    if let Some(marker) = closing_marker {
        Err(ParseError::new(
            index,
            format!("unterminated {}", marker.description()),
        ))
    } else {
        flush_buffer(&mut buffer, &mut spans, state);
        Ok((spans, index))
    }
}

fn flush_buffer(buffer: &mut String, spans: &mut Vec<Span>, state: StyleState) {
    if buffer.is_empty() {
        return;
    }
    spans.push(state.to_span(std::mem::take(buffer)));
}

fn parse_color_directive(input: &str, index: usize) -> Result<(Color, usize), ParseError> {
    const PREFIX: &str = "[color=";
    let start_hex = index + PREFIX.len();
    if !input[start_hex..].starts_with('#') {
        return Err(ParseError::new(
            start_hex,
            "expected `#` followed by a hexadecimal RGB value",
        ));
    }

    let hex_start = start_hex + 1;
    let hex = input
        .get(hex_start..hex_start + 6)
        .ok_or_else(|| {
            ParseError::new(
                hex_start,
                "incomplete color specification; expected 6 hexadecimal digits",
            )
        })?;

    let (r, g, b) = crate::style::parse_hex_rgb(hex).ok_or_else(|| {
        ParseError::new(
            hex_start,
            "invalid RGB specification; use hexadecimal digits only",
        )
    })?;

    let bracket_index = hex_start + 6;
    if !input[bracket_index..].starts_with(']') {
        return Err(ParseError::new(
            bracket_index,
            "expected `]` to close color directive",
        ));
    }

    let brace_index = bracket_index + 1;
    if !input[brace_index..].starts_with('{') {
        return Err(ParseError::new(
            brace_index,
            "expected `{` to start the colored text",
        ));
    }

    Ok((Color::Rgb(r, g, b), brace_index + 1))
}
