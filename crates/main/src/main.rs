use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use review_report::{generate, ReportConfig};

/// Renders the copywriting review report to PDF.
///
/// Without arguments the bundled report is written with the default settings. Fonts are tried
/// in priority order; set `REVIEW_REPORT_FONTS_DIR` to a directory containing DejaVu Sans to
/// have it tried first.
#[derive(Parser)]
#[command(author, version, about = "Render the copywriting review report to PDF")]
struct Cli {
    /// JSON configuration file; defaults apply to every missing field.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// JSON report content; the bundled review is used when omitted.
    #[arg(long, value_name = "FILE")]
    content: Option<PathBuf>,

    /// Output PDF path; overrides the configuration and `REVIEW_REPORT_OUTPUT`.
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        print_error_sources(&err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), review_report::ReportError> {
    let mut config = match &cli.config {
        Some(path) => ReportConfig::from_file(path)?,
        None => ReportConfig::default(),
    }
    .with_env_overrides();

    if let Some(content) = cli.content {
        config.content = Some(content);
    }
    if let Some(output) = cli.output {
        config.output_path = output;
    }

    let generated = generate(&config)?;
    if generated.fonts.is_fallback() {
        println!(
            "Warning: Using {} - diacritics may not display correctly",
            generated.fonts.fonts.regular
        );
    } else {
        println!("Using {} for Romanian diacritics", generated.fonts.fonts.regular);
    }
    println!("PDF created: {}", generated.path.display());
    log::debug!(
        "{} pages, {} sections",
        generated.rendered.page_count,
        generated.rendered.section_titles.len()
    );
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
