//! Upload normalizer: turns a photographed or scanned image into one
//! standardized A4 PDF page.
//!
//! The transform is a pure `bytes -> bytes` function with no network or
//! storage dependency: decode, desaturate, scale to fit the page inside a
//! fixed margin (never cropping, never distorting), center, and emit a
//! single-page PDF with the raster embedded as an image XObject.

use image::imageops::FilterType;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::error::{DocumentError, Result};

/// A4 page geometry, in PDF points.
pub const PAGE_WIDTH_PT: f32 = 595.28;
pub const PAGE_HEIGHT_PT: f32 = 841.89;
/// 10 mm margin.
pub const MARGIN_PT: f32 = 28.35;

/// Longest source dimension accepted before a defensive downscale; keeps a
/// pathological upload from ballooning the in-memory pixel buffer.
const MAX_SOURCE_DIM: u32 = 4096;

pub fn normalize(image_bytes: &[u8]) -> Result<Vec<u8>> {
    if image_bytes.is_empty() {
        return Err(DocumentError::DecodeError("empty payload".to_string()));
    }
    let decoded = image::load_from_memory(image_bytes)
        .map_err(|e| DocumentError::DecodeError(e.to_string()))?;
    let decoded = clamp_dimensions(decoded);

    // Desaturate, then return to RGB for embedding.
    let processed = DynamicImage::ImageLuma8(decoded.to_luma8()).to_rgb8();
    let (width, height) = (processed.width(), processed.height());

    let (draw_w, draw_h) = fit_within_margins(width, height);
    let x = (PAGE_WIDTH_PT - draw_w) / 2.0;
    let y = (PAGE_HEIGHT_PT - draw_h) / 2.0;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        processed.into_raw(),
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            // Unit-square image space scaled to the drawn extent.
            Operation::new(
                "cm",
                vec![
                    Object::Real(draw_w),
                    0.into(),
                    0.into(),
                    Object::Real(draw_h),
                    Object::Real(x),
                    Object::Real(y),
                ],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let ops = content
        .encode()
        .map_err(|e| DocumentError::Normalize(format!("content encode: {e}")))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, ops));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            Object::Real(PAGE_WIDTH_PT),
            Object::Real(PAGE_HEIGHT_PT),
        ],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| DocumentError::Normalize(format!("pdf serialize: {e}")))?;
    Ok(out)
}

/// Scale-to-fit inside the page-minus-margin box, preserving aspect ratio.
/// Small sources scale up to fill the box in one axis, large ones shrink.
fn fit_within_margins(width: u32, height: u32) -> (f32, f32) {
    let content_w = PAGE_WIDTH_PT - 2.0 * MARGIN_PT;
    let content_h = PAGE_HEIGHT_PT - 2.0 * MARGIN_PT;
    let aspect = width as f32 / height as f32;
    if content_w / aspect <= content_h {
        (content_w, content_w / aspect)
    } else {
        (content_h * aspect, content_h)
    }
}

fn clamp_dimensions(img: DynamicImage) -> DynamicImage {
    if img.width().max(img.height()) > MAX_SOURCE_DIM {
        img.resize(MAX_SOURCE_DIM, MAX_SOURCE_DIM, FilterType::Lanczos3)
    } else {
        img
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_png;
    use lopdf::ObjectId;

    fn embedded_image(doc: &Document, page_id: ObjectId) -> Stream {
        let page = doc.get_dictionary(page_id).unwrap();
        let resources = match page.get(b"Resources").unwrap() {
            Object::Dictionary(d) => d.clone(),
            Object::Reference(id) => doc.get_dictionary(*id).unwrap().clone(),
            other => panic!("unexpected resources: {other:?}"),
        };
        let xobjects = match resources.get(b"XObject").unwrap() {
            Object::Dictionary(d) => d.clone(),
            other => panic!("unexpected xobject entry: {other:?}"),
        };
        let image_ref = match xobjects.get(b"Im0").unwrap() {
            Object::Reference(id) => *id,
            other => panic!("unexpected image object: {other:?}"),
        };
        match doc.get_object(image_ref).unwrap() {
            Object::Stream(s) => s.clone(),
            other => panic!("image is not a stream: {other:?}"),
        }
    }

    fn drawn_extent(doc: &Document, page_id: ObjectId) -> (f32, f32, f32, f32) {
        let content = doc.get_page_content(page_id).unwrap();
        let ops = Content::decode(&content).unwrap().operations;
        let cm = ops.iter().find(|op| op.operator == "cm").unwrap();
        let nums: Vec<f32> = cm
            .operands
            .iter()
            .map(|o| match o {
                Object::Integer(i) => *i as f32,
                Object::Real(r) => *r,
                other => panic!("non-numeric matrix entry: {other:?}"),
            })
            .collect();
        // [sx 0 0 sy tx ty]
        (nums[0], nums[3], nums[4], nums[5])
    }

    #[test]
    fn produces_a_single_a4_page() {
        let pdf = normalize(&sample_png(400, 200)).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn landscape_sources_fill_the_width_inside_the_margin() {
        let pdf = normalize(&sample_png(400, 200)).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        let page_id = doc.get_pages()[&1];
        let (w, h, x, y) = drawn_extent(&doc, page_id);

        let content_w = PAGE_WIDTH_PT - 2.0 * MARGIN_PT;
        let content_h = PAGE_HEIGHT_PT - 2.0 * MARGIN_PT;
        assert!((w - content_w).abs() < 0.01);
        assert!(h <= content_h + 0.01);
        // Aspect ratio preserved within rounding.
        assert!((w / h - 2.0).abs() < 0.01);
        // Centered, inside the margin box.
        assert!(x >= MARGIN_PT - 0.01 && y >= MARGIN_PT - 0.01);
        assert!(((PAGE_WIDTH_PT - w) / 2.0 - x).abs() < 0.01);
        assert!(((PAGE_HEIGHT_PT - h) / 2.0 - y).abs() < 0.01);
    }

    #[test]
    fn tall_sources_fill_the_height_instead() {
        let pdf = normalize(&sample_png(100, 1000)).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        let page_id = doc.get_pages()[&1];
        let (w, h, _, _) = drawn_extent(&doc, page_id);

        let content_h = PAGE_HEIGHT_PT - 2.0 * MARGIN_PT;
        assert!((h - content_h).abs() < 0.01);
        assert!(w <= PAGE_WIDTH_PT - 2.0 * MARGIN_PT + 0.01);
        assert!((w / h - 0.1).abs() < 0.01);
    }

    #[test]
    fn embedded_raster_is_desaturated() {
        let pdf = normalize(&sample_png(64, 64)).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        let page_id = doc.get_pages()[&1];
        let image = embedded_image(&doc, page_id);
        let raw = image.decompressed_content().unwrap();
        assert_eq!(raw.len(), 64 * 64 * 3);
        // Every pixel is gray: R = G = B.
        assert!(raw.chunks_exact(3).all(|px| px[0] == px[1] && px[1] == px[2]));
    }

    #[test]
    fn oversized_sources_are_clamped_before_processing() {
        let pdf = normalize(&sample_png(5000, 50)).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        let page_id = doc.get_pages()[&1];
        let image = embedded_image(&doc, page_id);
        let width = match image.dict.get(b"Width").unwrap() {
            Object::Integer(i) => *i,
            other => panic!("unexpected width: {other:?}"),
        };
        assert!(width <= MAX_SOURCE_DIM as i64);
    }

    #[test]
    fn empty_and_undecodable_inputs_fail_before_any_composition() {
        assert!(matches!(
            normalize(&[]),
            Err(DocumentError::DecodeError(_))
        ));
        assert!(matches!(
            normalize(b"not an image"),
            Err(DocumentError::DecodeError(_))
        ));
    }
}
