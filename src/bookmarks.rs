//! Document outline support built on top of `lopdf`.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use thiserror::Error;

/// Errors that can occur while embedding bookmarks into a rendered PDF document.
#[derive(Debug, Error)]
pub enum BookmarkError {
    /// The PDF bytes could not be parsed or written by `lopdf`.
    #[error("failed to process PDF bytes: {0}")]
    Parse(#[from] lopdf::Error),
    /// The trailer has no catalog reference.
    #[error("PDF catalog entry is missing")]
    MissingCatalog,
    /// The catalog object was not a dictionary.
    #[error("PDF catalog entry is not a dictionary")]
    InvalidCatalog,
    /// A section refers to a page the document does not have.
    #[error("section {section_index} refers to missing page {page_number}")]
    MissingPage {
        section_index: usize,
        /// The requested 1-based page number.
        page_number: usize,
    },
}

impl From<std::io::Error> for BookmarkError {
    fn from(err: std::io::Error) -> Self {
        Self::Parse(err.into())
    }
}

/// Adds a flat outline with one `/Dest [page /Fit]` entry per placed section.
///
/// `titles` and `section_pages` are parallel; sections without a page are skipped, and when no
/// section was placed the input bytes are returned unchanged.
pub fn apply_section_bookmarks(
    pdf_bytes: &[u8],
    titles: &[String],
    section_pages: &[Option<usize>],
) -> Result<Vec<u8>, BookmarkError> {
    let mut document = Document::load_mem(pdf_bytes)?;

    let pages = document.get_pages();
    let entries = collect_outline_entries(&mut document, titles, section_pages, &pages)?;
    if entries.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let outlines_id = document.new_object_id();
    link_outline_entries(outlines_id, &mut document, &entries);
    insert_outlines_root(outlines_id, &mut document, &entries)?;

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

struct OutlineEntry {
    object_id: ObjectId,
    page_ref: ObjectId,
    title: String,
}

fn collect_outline_entries(
    document: &mut Document,
    titles: &[String],
    section_pages: &[Option<usize>],
    pages: &BTreeMap<u32, ObjectId>,
) -> Result<Vec<OutlineEntry>, BookmarkError> {
    let mut entries = Vec::new();

    for (index, (title, page)) in titles.iter().zip(section_pages).enumerate() {
        let Some(page_number) = *page else {
            continue;
        };
        let page_ref = u32::try_from(page_number)
            .ok()
            .and_then(|number| pages.get(&number))
            .copied()
            .ok_or(BookmarkError::MissingPage {
                section_index: index,
                page_number,
            })?;

        entries.push(OutlineEntry {
            object_id: document.new_object_id(),
            page_ref,
            title: title.clone(),
        });
    }

    Ok(entries)
}

fn link_outline_entries(outlines_id: ObjectId, document: &mut Document, entries: &[OutlineEntry]) {
    for (index, entry) in entries.iter().enumerate() {
        let mut dictionary = Dictionary::new();
        dictionary.set("Title", text_string(&entry.title));
        dictionary.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(entry.page_ref),
                Object::Name("Fit".into()),
            ]),
        );
        dictionary.set("Parent", Object::Reference(outlines_id));
        if index > 0 {
            dictionary.set("Prev", Object::Reference(entries[index - 1].object_id));
        }
        if let Some(next) = entries.get(index + 1) {
            dictionary.set("Next", Object::Reference(next.object_id));
        }

        document
            .objects
            .insert(entry.object_id, Object::Dictionary(dictionary));
    }
}

fn insert_outlines_root(
    outlines_id: ObjectId,
    document: &mut Document,
    entries: &[OutlineEntry],
) -> Result<(), BookmarkError> {
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| BookmarkError::MissingCatalog)?;

    let mut dictionary = Dictionary::new();
    dictionary.set("Type", Object::Name("Outlines".into()));
    dictionary.set("Count", Object::Integer(entries.len() as i64));
    if let Some(first) = entries.first() {
        dictionary.set("First", Object::Reference(first.object_id));
    }
    if let Some(last) = entries.last() {
        dictionary.set("Last", Object::Reference(last.object_id));
    }
    document
        .objects
        .insert(outlines_id, Object::Dictionary(dictionary));

    document
        .objects
        .get_mut(&catalog_id)
        .ok_or(BookmarkError::MissingCatalog)?
        .as_dict_mut()
        .map_err(|_| BookmarkError::InvalidCatalog)?
        .set("Outlines", Object::Reference(outlines_id));

    Ok(())
}

/// PDF text string; anything beyond ASCII is written as UTF-16BE with a byte order mark.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn blank_pdf(page_count: i64) -> Vec<u8> {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let kids: Vec<Object> = (0..page_count)
            .map(|_| {
                let page = document.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                });
                Object::Reference(page)
            })
            .collect();
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        document.save_to(&mut bytes).expect("save blank pdf");
        bytes
    }

    fn outline_count(bytes: &[u8]) -> i64 {
        let document = Document::load_mem(bytes).expect("parse");
        let root = document
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .expect("root");
        let outlines = document
            .get_dictionary(root)
            .and_then(|catalog| catalog.get(b"Outlines"))
            .and_then(Object::as_reference)
            .expect("outline reference");
        document
            .get_dictionary(outlines)
            .and_then(|outlines| outlines.get(b"Count"))
            .and_then(Object::as_i64)
            .expect("count")
    }

    #[test]
    fn placed_sections_become_outline_entries() {
        let pdf = blank_pdf(3);
        let titles = vec!["ANALIZĂ SEO".to_owned(), "Draft".to_owned(), "CONCLUZIE".to_owned()];

        let bytes = apply_section_bookmarks(&pdf, &titles, &[Some(1), None, Some(3)])
            .expect("bookmarks applied");

        assert_eq!(outline_count(&bytes), 2);
    }

    #[test]
    fn nothing_placed_returns_input() {
        let pdf = blank_pdf(1);
        let bytes = apply_section_bookmarks(&pdf, &["A".to_owned()], &[None]).expect("ok");
        assert_eq!(bytes, pdf);
    }

    #[test]
    fn missing_page_is_reported() {
        let pdf = blank_pdf(1);
        let err = apply_section_bookmarks(&pdf, &["A".to_owned()], &[Some(4)]).unwrap_err();
        assert!(matches!(
            err,
            BookmarkError::MissingPage {
                section_index: 0,
                page_number: 4
            }
        ));
        assert_eq!(err.to_string(), "section 0 refers to missing page 4");
    }

    #[test]
    fn unparsable_bytes_keep_the_parser_error_as_source() {
        let err = apply_section_bookmarks(b"not a pdf", &["A".to_owned()], &[Some(1)]).unwrap_err();
        assert!(matches!(err, BookmarkError::Parse(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn non_ascii_titles_use_utf16() {
        match text_string("Ă") {
            Object::String(bytes, StringFormat::Hexadecimal) => {
                assert_eq!(bytes, [0xFE, 0xFF, 0x01, 0x02]);
            }
            other => panic!("unexpected object {other:?}"),
        }
    }
}
