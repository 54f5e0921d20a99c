//! Run configuration: where fonts are looked up, page geometry, palette and output location.
//!
//! Every field has a default, so an empty JSON object (or no file at all) reproduces the stock
//! A4 report. Two environment variables override the file:
//!
//! - `REVIEW_REPORT_FONTS_DIR`: a directory searched first for DejaVu Sans.
//! - `REVIEW_REPORT_OUTPUT`: the output path.

use std::fs;
use std::path::{Path, PathBuf};

use genpdf::{Margins, PaperSize, Size};
use serde::{Deserialize, Serialize};

use crate::elements::mm_from_f64;
use crate::error::{ReportError, Result};
use crate::fonts::{self, FontCandidate};
use crate::style::Palette;

pub const FONTS_DIR_ENV: &str = "REVIEW_REPORT_FONTS_DIR";
pub const OUTPUT_ENV: &str = "REVIEW_REPORT_OUTPUT";

/// Paper formats supported by the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Paper {
    #[default]
    A4,
    Letter,
    Legal,
    /// Custom size in millimetres.
    Custom { width_mm: f64, height_mm: f64 },
}

impl Paper {
    pub fn size(self) -> Size {
        match self {
            Paper::A4 => PaperSize::A4.into(),
            Paper::Letter => PaperSize::Letter.into(),
            Paper::Legal => PaperSize::Legal.into(),
            Paper::Custom {
                width_mm,
                height_mm,
            } => Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm)),
        }
    }
}

/// Page size and margins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub paper: Paper,
    /// Margins in millimetres: top, right, bottom, left.
    pub margins_mm: [f64; 4],
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            paper: Paper::A4,
            margins_mm: [20.0; 4],
        }
    }
}

impl PageGeometry {
    pub fn margins(&self) -> Margins {
        let [top, right, bottom, left] = self.margins_mm;
        Margins::trbl(
            mm_from_f64(top),
            mm_from_f64(right),
            mm_from_f64(bottom),
            mm_from_f64(left),
        )
    }
}

/// Settings for one report run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_path: PathBuf,
    pub page: PageGeometry,
    /// Fonts tried in priority order.
    pub font_candidates: Vec<FontCandidate>,
    /// Metric files backing the built-in fallback family.
    pub fallback_metrics: Vec<FontCandidate>,
    pub palette: Palette,
    /// Content document; the bundled copy review is used when absent.
    pub content: Option<PathBuf>,
    /// Repeat a table's header row at the top of continuation pages.
    pub repeat_table_header: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("docs/Review-Copy-BabySeasons.pdf"),
            page: PageGeometry::default(),
            font_candidates: fonts::default_candidates(),
            fallback_metrics: fonts::default_fallback_metrics(),
            palette: Palette::default(),
            content: None,
            repeat_table_header: true,
        }
    }
}

impl ReportConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(ReportError::Config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Applies `REVIEW_REPORT_FONTS_DIR` and `REVIEW_REPORT_OUTPUT` when they are set.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(fonts::env_path(FONTS_DIR_ENV), fonts::env_path(OUTPUT_ENV))
    }

    fn with_overrides(mut self, fonts_dir: Option<PathBuf>, output: Option<PathBuf>) -> Self {
        if let Some(directory) = fonts_dir {
            self.font_candidates
                .insert(0, FontCandidate::dejavu_in(&directory));
        }
        if let Some(output) = output {
            self.output_path = output;
        }
        self
    }
}
