//! Error types shared by every stage of the report pipeline.

use std::io;
use std::path::PathBuf;

use genpdf::error::ErrorKind;
use thiserror::Error;

use crate::richtext::ParseError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors raised while resolving fonts, assembling blocks or rendering the report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A candidate font could not be registered. The resolver recovers from this by moving on to
    /// the next candidate, so it only surfaces from [`crate::fonts::FontRegistry::register`].
    #[error("font '{name}' at {} could not be registered: {source}", path.display())]
    FontUnavailable {
        name: String,
        path: PathBuf,
        #[source]
        source: genpdf::error::Error,
    },

    /// None of the metric files backing the built-in fallback family could be loaded.
    #[error("built-in fallback font family is unavailable: {0}")]
    FallbackUnavailable(String),

    /// A table was declared with inconsistent dimensions.
    #[error("invalid table: {0}")]
    InvalidTable(String),

    /// A style references a font handle that is not part of the resolved font set.
    #[error("style '{style}' references unregistered font '{font}'")]
    UnregisteredFont { style: String, font: String },

    /// An element does not fit on an empty page.
    #[error("layout overflow: {0}")]
    LayoutOverflow(String),

    /// Any other failure reported by the rendering engine.
    #[error("rendering failed: {0}")]
    Render(#[source] genpdf::error::Error),

    /// The output directory could not be created.
    #[error("could not create output directory {}: {source}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading configuration/content or writing the output failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[source] serde_json::Error),

    /// The content document could not be parsed.
    #[error("invalid report content: {0}")]
    Content(#[source] serde_json::Error),

    /// Inline markup inside a paragraph is malformed.
    #[error("invalid markup in {text:?}: {source}")]
    Markup {
        text: String,
        #[source]
        source: ParseError,
    },

    /// Outline injection into the rendered PDF failed.
    #[cfg(feature = "bookmarks")]
    #[error("failed to apply bookmarks: {0}")]
    Bookmarks(#[from] crate::bookmarks::BookmarkError),
}

impl From<genpdf::error::Error> for ReportError {
    fn from(err: genpdf::error::Error) -> Self {
        match err.kind() {
            ErrorKind::PageSizeExceeded => Self::LayoutOverflow(err.to_string()),
            _ => Self::Render(err),
        }
    }
}
