use std::fs;

use review_report::config::PageGeometry;
use review_report::content::{ContentItem, ReportContent, SectionContent, TableContent};
use review_report::fonts::{self, FontRegistry};
use lopdf::content::Content;
use lopdf::{Document, Object};
use review_report::{
    generate_with_content, resolve_fonts, RenderedReport, ReportAssembler, ReportConfig,
    ReportError, ReportRenderer, StyleTable,
};
use sha2::{Digest, Sha256};

const SKIP_HINT: &str =
    "no usable font found. Install DejaVu Sans or set REVIEW_REPORT_FONTS_DIR";

const ACCENT: (f64, f64, f64) = (1.0, 60.0 / 255.0, 31.0 / 255.0);
const PAPER: (f64, f64, f64) = (245.0 / 255.0, 241.0 / 255.0, 237.0 / 255.0);

/// Renders `content` with the system fonts after `configure` adjusted the renderer, or `None`
/// when no font can be materialised.
fn try_render(
    content: &ReportContent,
    configure: impl FnOnce(ReportRenderer) -> ReportRenderer,
) -> Option<Result<RenderedReport, ReportError>> {
    let mut registry = FontRegistry::new();
    let resolution = resolve_fonts(&fonts::default_candidates(), &mut registry);
    let family = match registry.font_family(&resolution.fonts, &fonts::default_fallback_metrics())
    {
        Ok(family) => family,
        Err(err) => {
            eprintln!("{SKIP_HINT}: {err}");
            return None;
        }
    };
    let styles = StyleTable::build(&resolution.fonts, &Default::default());
    let blocks = ReportAssembler::assemble(content).expect("content assembles");

    let renderer =
        ReportRenderer::new(family, resolution.fonts, styles).with_page(PageGeometry::default());
    Some(configure(renderer).render(&blocks))
}

fn render_content(content: &ReportContent) -> Option<RenderedReport> {
    try_render(content, |renderer| renderer).map(|report| report.expect("render report"))
}

fn single_section(section: SectionContent) -> ReportContent {
    ReportContent {
        title: "Raport".to_owned(),
        subtitle: None,
        display: None,
        summary: vec![],
        sections: vec![section],
        footer: vec![],
    }
}

fn tall_table(rows: usize) -> ReportContent {
    let mut table = vec![vec!["Schimbare".to_owned(), "Timp".to_owned()]];
    table.extend((1..=rows).map(|row| vec![format!("Rând {row}"), format!("{row} min")]));
    single_section(SectionContent {
        title: "QUICK WINS".to_owned(),
        new_page: false,
        items: vec![ContentItem::Table(TableContent {
            rows: table,
            column_widths_cm: vec![12.0, 4.0],
            centered_columns: vec![1],
        })],
    })
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

/// For every page in order, whether its content stream strokes with `color`.
fn pages_stroking(bytes: &[u8], color: (f64, f64, f64)) -> Vec<bool> {
    let document = Document::load_mem(bytes).expect("parse rendered pdf");
    document
        .get_pages()
        .values()
        .map(|page| {
            let stream = document.get_page_content(*page).expect("page content");
            let content = Content::decode(&stream).expect("decode content");
            content.operations.iter().any(|operation| {
                let channels: Vec<f64> = operation.operands.iter().filter_map(number).collect();
                operation.operator == "RG"
                    && channels.len() == 3
                    && (channels[0] - color.0).abs() < 0.01
                    && (channels[1] - color.1).abs() < 0.01
                    && (channels[2] - color.2).abs() < 0.01
            })
        })
        .collect()
}

fn bundled() -> ReportContent {
    ReportContent::bundled().expect("bundled content")
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            if let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            {
                let start_index = offset + start_pos + start.len();
                if let Some(end_pos) = data[start_index..]
                    .windows(end.len())
                    .position(|window| window == end)
                {
                    for byte in &mut data[start_index..start_index + end_pos] {
                        if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                            *byte = b'0';
                        }
                    }
                    offset = start_index + end_pos + end.len();
                } else {
                    break;
                }
            } else {
                break;
            }
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    scrub_segment(&mut normalized, b"/Producer(", b')');
    scrub_xml(&mut normalized, b"<xmp:CreateDate>", b"</xmp:CreateDate>");
    scrub_xml(&mut normalized, b"<xmp:ModifyDate>", b"</xmp:ModifyDate>");
    scrub_xml(
        &mut normalized,
        b"<xmp:MetadataDate>",
        b"</xmp:MetadataDate>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:DocumentID>",
        b"</xmpMM:DocumentID>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:InstanceID>",
        b"</xmpMM:InstanceID>",
    );
    scrub_xml(&mut normalized, b"<xmpMM:VersionID>", b"</xmpMM:VersionID>");
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let normalized = scrub_pdf(bytes);
    let digest = Sha256::digest(&normalized);
    digest.into()
}

#[test]
fn renders_bundled_report() {
    let Some(report) = render_content(&bundled()) else {
        eprintln!("Skipping renders_bundled_report: {SKIP_HINT}");
        return;
    };

    assert!(report.bytes.starts_with(b"%PDF"));
    // Title page plus one page per section that starts on a new page.
    assert!(report.page_count >= 8, "got {} pages", report.page_count);
    assert_eq!(report.section_titles.len(), bundled().sections.len());
    assert_eq!(report.section_titles[0], "TOP 3 ÎMBUNĂTĂȚIRI CRITICE");

    let pages: Vec<usize> = report
        .section_pages
        .iter()
        .map(|page| page.expect("every section heading is placed"))
        .collect();
    assert!(pages[0] >= 2, "first section follows the title page");
    assert!(pages.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(pages.iter().all(|page| *page <= report.page_count));
}

#[test]
fn identical_input_renders_identically() {
    let content = bundled();
    let (Some(first), Some(second)) = (render_content(&content), render_content(&content)) else {
        eprintln!("Skipping identical_input_renders_identically: {SKIP_HINT}");
        return;
    };

    assert_eq!(normalized_hash(&first.bytes), normalized_hash(&second.bytes));
}

#[test]
fn tall_tables_continue_on_following_pages() {
    let Some(report) = render_content(&tall_table(120)) else {
        eprintln!("Skipping tall_tables_continue_on_following_pages: {SKIP_HINT}");
        return;
    };
    assert!(report.page_count >= 2, "got {} pages", report.page_count);
    assert_eq!(report.section_pages, vec![Some(1)]);

    let header_pages = pages_stroking(&report.bytes, ACCENT);
    assert_eq!(header_pages.len(), report.page_count);
    assert!(
        header_pages.iter().all(|filled| *filled),
        "header fill missing on a page: {header_pages:?}"
    );
    assert!(pages_stroking(&report.bytes, PAPER).iter().all(|filled| *filled));
}

#[test]
fn header_stays_on_first_page_when_not_repeated() {
    let Some(result) = try_render(&tall_table(120), |renderer| {
        renderer.with_repeated_table_header(false)
    }) else {
        eprintln!("Skipping header_stays_on_first_page_when_not_repeated: {SKIP_HINT}");
        return;
    };
    let report = result.expect("render report");

    let header_pages = pages_stroking(&report.bytes, ACCENT);
    assert!(header_pages.len() >= 2);
    assert!(header_pages[0]);
    assert!(header_pages[1..].iter().all(|filled| !*filled), "{header_pages:?}");
}

#[test]
fn row_taller_than_a_page_is_a_layout_overflow() {
    let cell = vec!["cuvânt"; 6000].join(" ");
    let content = single_section(SectionContent {
        title: "ANALIZĂ".to_owned(),
        new_page: false,
        items: vec![ContentItem::Table(TableContent {
            rows: vec![vec!["Observație".to_owned()], vec![cell]],
            column_widths_cm: vec![16.0],
            centered_columns: vec![],
        })],
    });

    let Some(result) = try_render(&content, |renderer| renderer) else {
        eprintln!("Skipping row_taller_than_a_page_is_a_layout_overflow: {SKIP_HINT}");
        return;
    };
    match result {
        Err(ReportError::LayoutOverflow(_)) => {}
        Err(err) => panic!("expected a layout overflow, got {err}"),
        Ok(report) => panic!("expected a layout overflow, got {} pages", report.page_count),
    }
}

#[test]
fn heading_pushed_past_page_end_records_the_next_page() {
    let mut content = single_section(SectionContent {
        title: "ONE".to_owned(),
        new_page: true,
        items: vec![ContentItem::Spacer(690.0)],
    });
    content.sections.push(SectionContent {
        title: "TWO".to_owned(),
        new_page: false,
        items: vec![],
    });

    let Some(report) = render_content(&content) else {
        eprintln!("Skipping heading_pushed_past_page_end_records_the_next_page: {SKIP_HINT}");
        return;
    };
    assert_eq!(report.page_count, 3);
    assert_eq!(report.section_pages, vec![Some(2), Some(3)]);
}

#[test]
fn generate_creates_missing_output_directory() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = dir.path().join("docs").join("Review-Copy.pdf");
    let config = ReportConfig {
        output_path: output.clone(),
        ..ReportConfig::default()
    };

    match generate_with_content(&config, &bundled()) {
        Ok(generated) => {
            assert_eq!(generated.path, output);
            let written = fs::read(&output).expect("output written");
            assert!(written.starts_with(b"%PDF"));
        }
        Err(ReportError::FallbackUnavailable(reason)) => {
            eprintln!("Skipping generate_creates_missing_output_directory: {reason}");
        }
        Err(err) => panic!("unexpected error: {err}"),
    }
}

#[test]
fn empty_candidate_list_renders_with_builtin_family() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = ReportConfig {
        output_path: dir.path().join("fallback.pdf"),
        font_candidates: vec![],
        ..ReportConfig::default()
    };

    match generate_with_content(&config, &bundled()) {
        Ok(generated) => {
            assert!(generated.fonts.is_fallback());
            assert_eq!(generated.fonts.fonts.regular.name(), "Helvetica");
            assert!(!generated.fonts.warnings.is_empty());
            assert!(generated.rendered.page_count >= 8);
        }
        Err(ReportError::FallbackUnavailable(reason)) => {
            eprintln!("Skipping empty_candidate_list_renders_with_builtin_family: {reason}");
        }
        Err(err) => panic!("unexpected error: {err}"),
    }
}
