//! Generates a paginated copywriting review report as PDF.
//!
//! The pipeline runs once per invocation: resolve fonts, build the style table, assemble the
//! content blocks, render them with `genpdf` and write the file.

pub mod assembler;
pub mod config;
pub mod content;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod model;
pub mod renderer;
pub mod richtext;
pub mod style;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

use std::path::PathBuf;

pub use crate::assembler::ReportAssembler;
pub use crate::config::ReportConfig;
pub use crate::content::ReportContent;
pub use crate::error::{ReportError, Result};
pub use crate::fonts::{resolve_fonts, FontRegistry, FontResolution, FontSet};
pub use crate::model::{ContentBlock, TableBlock};
pub use crate::renderer::{RenderedReport, ReportRenderer};
pub use crate::style::{StyleName, StyleTable};

/// Outcome of [`generate`].
#[derive(Debug)]
pub struct GeneratedReport {
    pub path: PathBuf,
    pub fonts: FontResolution,
    pub rendered: RenderedReport,
}

/// Runs the whole pipeline for `config` and writes the PDF to `config.output_path`.
pub fn generate(config: &ReportConfig) -> Result<GeneratedReport> {
    let content = match &config.content {
        Some(path) => ReportContent::from_file(path)?,
        None => ReportContent::bundled()?,
    };
    generate_with_content(config, &content)
}

/// Same as [`generate`] with content supplied by the caller.
pub fn generate_with_content(
    config: &ReportConfig,
    content: &ReportContent,
) -> Result<GeneratedReport> {
    let mut registry = FontRegistry::new();
    let resolution = resolve_fonts(&config.font_candidates, &mut registry);
    let family = registry.font_family(&resolution.fonts, &config.fallback_metrics)?;
    let styles = StyleTable::build(&resolution.fonts, &config.palette);
    let blocks = ReportAssembler::assemble(content)?;

    let renderer = ReportRenderer::new(family, resolution.fonts.clone(), styles)
        .with_page(config.page.clone())
        .with_title(content.title.clone())
        .with_repeated_table_header(config.repeat_table_header);

    #[cfg(feature = "bookmarks")]
    let rendered = {
        let rendered = renderer.render_with_bookmarks(&blocks)?;
        renderer::write_pdf(&config.output_path, &rendered.bytes)?;
        rendered
    };
    #[cfg(not(feature = "bookmarks"))]
    let rendered = renderer.render_to_file(&blocks, &config.output_path)?;

    Ok(GeneratedReport {
        path: config.output_path.clone(),
        fonts: resolution,
        rendered,
    })
}
