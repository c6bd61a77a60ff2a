//! Text overlay for PDF renditions.
//!
//! Every page gains one appended content stream that draws the stamp text at
//! a fixed bottom-left anchor in semi-transparent red, plus page-local
//! resource entries for the stamp font and transparency state. The page tree
//! itself is never restructured, so page count and order are preserved
//! exactly.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

use crate::error::{DocumentError, Result};

const STAMP_FONT_SIZE: i64 = 24;
const ANCHOR_X: i64 = 36;
const ANCHOR_Y: i64 = 36;
const STAMP_ALPHA: f32 = 0.45;
const STAMP_RED: [f32; 3] = [0.85, 0.10, 0.12];

/// Resource names are prefixed to dodge collisions with whatever the source
/// document already defines.
const FONT_KEY: &str = "FvStamp";
const GS_KEY: &str = "GSvStamp";

pub fn stamp_pdf(bytes: &[u8], text: &str) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(bytes)
        .map_err(|e| DocumentError::Stamping(format!("pdf parse: {e}")))?;
    if doc.is_encrypted() {
        return Err(DocumentError::Stamping("encrypted pdf".to_string()));
    }
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    if pages.is_empty() {
        return Err(DocumentError::Stamping("pdf has no pages".to_string()));
    }

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let gs_id = doc.add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => STAMP_ALPHA,
        "CA" => STAMP_ALPHA,
    });
    let ops = overlay_ops(text)
        .encode()
        .map_err(|e| DocumentError::Stamping(format!("content encode: {e}")))?;
    let overlay_id = doc.add_object(lopdf::Stream::new(dictionary! {}, ops));

    for page_id in pages {
        let resources = stamped_resources(&doc, page_id, font_id, gs_id);
        let page = doc
            .get_object_mut(page_id)
            .and_then(|obj| obj.as_dict_mut())
            .map_err(|e| DocumentError::Stamping(format!("page dictionary: {e}")))?;
        page.set("Resources", Object::Dictionary(resources));
        let contents = page.get(b"Contents").ok().cloned().unwrap_or(Object::Null);
        page.set("Contents", appended_contents(contents, overlay_id));
    }

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| DocumentError::Stamping(format!("pdf serialize: {e}")))?;
    Ok(out)
}

fn overlay_ops(text: &str) -> Content {
    Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("gs", vec![GS_KEY.into()]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_KEY.into(), STAMP_FONT_SIZE.into()]),
            Operation::new(
                "rg",
                STAMP_RED.iter().map(|c| Object::Real(*c)).collect(),
            ),
            Operation::new("Td", vec![ANCHOR_X.into(), ANCHOR_Y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ],
    }
}

/// The overlay stream joins whatever content the page already has.
fn appended_contents(existing: Object, overlay_id: ObjectId) -> Object {
    match existing {
        Object::Reference(id) => {
            Object::Array(vec![Object::Reference(id), Object::Reference(overlay_id)])
        }
        Object::Array(mut streams) => {
            streams.push(Object::Reference(overlay_id));
            Object::Array(streams)
        }
        _ => Object::Reference(overlay_id),
    }
}

/// Clones the page's effective resources (own or inherited through the page
/// tree) and adds the stamp entries. The clone becomes page-local, so setting
/// it never shadows inherited resources the original content relies on.
fn stamped_resources(
    doc: &Document,
    page_id: ObjectId,
    font_id: ObjectId,
    gs_id: ObjectId,
) -> Dictionary {
    let mut resources = effective_resources(doc, page_id);

    let mut fonts = sub_dictionary(doc, &resources, b"Font");
    fonts.set(FONT_KEY, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let mut states = sub_dictionary(doc, &resources, b"ExtGState");
    states.set(GS_KEY, Object::Reference(gs_id));
    resources.set("ExtGState", Object::Dictionary(states));

    resources
}

fn effective_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut node = page_id;
    loop {
        let Ok(dict) = doc.get_dictionary(node) else {
            return Dictionary::new();
        };
        match dict.get(b"Resources") {
            Ok(Object::Dictionary(d)) => return d.clone(),
            Ok(Object::Reference(id)) => {
                return doc
                    .get_dictionary(*id)
                    .map(|d| d.clone())
                    .unwrap_or_else(|_| Dictionary::new());
            }
            _ => {}
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(id)) => node = *id,
            _ => return Dictionary::new(),
        }
    }
}

fn sub_dictionary(doc: &Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    match resources.get(key) {
        Ok(Object::Dictionary(d)) => d.clone(),
        Ok(Object::Reference(id)) => doc
            .get_dictionary(*id)
            .map(|d| d.clone())
            .unwrap_or_else(|_| Dictionary::new()),
        _ => Dictionary::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_pdf;

    fn page_text_ops(doc: &Document, page_id: ObjectId) -> Vec<String> {
        let content = doc.get_page_content(page_id).unwrap();
        Content::decode(&content)
            .unwrap()
            .operations
            .into_iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn page_count_is_preserved() {
        for pages in [1usize, 3, 7] {
            let stamped = stamp_pdf(&sample_pdf(pages), "APPROVED").unwrap();
            let doc = Document::load_mem(&stamped).unwrap();
            assert_eq!(doc.get_pages().len(), pages);
        }
    }

    #[test]
    fn every_page_carries_the_stamp_text() {
        let stamped = stamp_pdf(&sample_pdf(3), "APPROVED").unwrap();
        let doc = Document::load_mem(&stamped).unwrap();
        for (_, page_id) in doc.get_pages() {
            let texts = page_text_ops(&doc, page_id);
            assert!(texts.iter().any(|t| t == "APPROVED"), "missing stamp: {texts:?}");
        }
    }

    #[test]
    fn original_page_content_survives() {
        let stamped = stamp_pdf(&sample_pdf(2), "APPROVED").unwrap();
        let doc = Document::load_mem(&stamped).unwrap();
        let first = doc.get_pages()[&1];
        let texts = page_text_ops(&doc, first);
        assert!(texts.iter().any(|t| t.starts_with("page ")));
    }

    #[test]
    fn stamp_resources_do_not_shadow_inherited_fonts() {
        // The fixture inherits its font resources from the page-tree node;
        // after stamping, every page must still resolve the original font.
        let stamped = stamp_pdf(&sample_pdf(2), "APPROVED").unwrap();
        let doc = Document::load_mem(&stamped).unwrap();
        for (_, page_id) in doc.get_pages() {
            let page = doc.get_dictionary(page_id).unwrap();
            let resources = match page.get(b"Resources").unwrap() {
                Object::Dictionary(d) => d.clone(),
                Object::Reference(id) => doc.get_dictionary(*id).unwrap().clone(),
                other => panic!("unexpected resources object: {other:?}"),
            };
            let fonts = match resources.get(b"Font").unwrap() {
                Object::Dictionary(d) => d.clone(),
                Object::Reference(id) => doc.get_dictionary(*id).unwrap().clone(),
                other => panic!("unexpected font object: {other:?}"),
            };
            assert!(fonts.get(b"F1").is_ok());
            assert!(fonts.get(FONT_KEY.as_bytes()).is_ok());
        }
    }

    #[test]
    fn garbage_bytes_fail_cleanly() {
        assert!(matches!(
            stamp_pdf(b"definitely not a pdf", "APPROVED"),
            Err(DocumentError::Stamping(_))
        ));
    }

    #[test]
    fn input_buffer_is_untouched() {
        let original = sample_pdf(1);
        let before = original.clone();
        let _ = stamp_pdf(&original, "APPROVED").unwrap();
        assert_eq!(original, before);
    }
}
