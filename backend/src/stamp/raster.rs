//! Badge watermark for raster renditions.
//!
//! The stamp text is rendered onto a translucent plate, composited over the
//! bottom-right corner of the source image, and the result re-encoded to the
//! source format. Encoding goes through the `image` crate, which carries no
//! EXIF or ancillary metadata, so output is stable across runs for the same
//! inputs.

use std::io::Cursor;
use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::error::{DocumentError, Result};

const TEXT_COLOR: Rgba<u8> = Rgba([190, 24, 28, 255]);
const PLATE_COLOR: Rgba<u8> = Rgba([255, 255, 255, 170]);
const BORDER_COLOR: Rgba<u8> = Rgba([190, 24, 28, 220]);
const CORNER_MARGIN_PX: u32 = 12;

/// TTF files probed inside the configured fonts directory, in order.
const FONT_CANDIDATES: &[&str] = &["Arial-Regular.ttf", "LiberationSans-Regular.ttf"];

/// Last-resort system locations so a stock server install works without
/// shipping font assets.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/liberation2/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
];

pub fn stamp_raster(bytes: &[u8], text: &str, fonts_dir: &Path) -> Result<Vec<u8>> {
    let format =
        image::guess_format(bytes).map_err(|e| DocumentError::DecodeError(e.to_string()))?;
    let source =
        image::load_from_memory(bytes).map_err(|e| DocumentError::DecodeError(e.to_string()))?;
    let font = load_stamp_font(fonts_dir)?;

    let mut canvas = source.to_rgba8();
    let badge = render_badge(text, &font, canvas.width());
    let x = canvas
        .width()
        .saturating_sub(badge.width() + CORNER_MARGIN_PX) as i64;
    let y = canvas
        .height()
        .saturating_sub(badge.height() + CORNER_MARGIN_PX) as i64;
    imageops::overlay(&mut canvas, &badge, x, y);

    encode(canvas, format)
}

/// Plate + border + text, sized relative to the canvas so the badge stays
/// legible on large scans without swallowing small ones.
fn render_badge(text: &str, font: &FontVec, canvas_width: u32) -> RgbaImage {
    let scale = PxScale::from((canvas_width as f32 * 0.05).clamp(18.0, 72.0));
    let (text_w, text_h) = text_size(scale, font, text);
    let pad = (scale.y * 0.35).round() as u32;
    let width = (text_w as u32 + 2 * pad).max(1);
    let height = (text_h as u32 + 2 * pad).max(1);

    let mut badge = RgbaImage::new(width, height);
    draw_filled_rect_mut(
        &mut badge,
        Rect::at(0, 0).of_size(width, height),
        PLATE_COLOR,
    );
    draw_hollow_rect_mut(
        &mut badge,
        Rect::at(0, 0).of_size(width, height),
        BORDER_COLOR,
    );
    draw_text_mut(
        &mut badge,
        TEXT_COLOR,
        pad as i32,
        pad as i32,
        scale,
        font,
        text,
    );
    badge
}

fn load_stamp_font(fonts_dir: &Path) -> Result<FontVec> {
    let local = FONT_CANDIDATES.iter().map(|name| fonts_dir.join(name));
    let system = SYSTEM_FONTS.iter().map(std::path::PathBuf::from);
    for path in local.chain(system) {
        if let Ok(bytes) = std::fs::read(&path) {
            if let Ok(font) = FontVec::try_from_vec(bytes) {
                return Ok(font);
            }
        }
    }
    Err(DocumentError::Stamping(format!(
        "no stamp font found under {} or the system font directories",
        fonts_dir.display()
    )))
}

fn encode(canvas: RgbaImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel; flatten before encoding.
            let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
            rgb.write_to(&mut out, ImageFormat::Jpeg)
        }
        _ => canvas.write_to(&mut out, ImageFormat::Png),
    }
    .map_err(|e| DocumentError::Stamping(format!("image encode: {e}")))?;
    Ok(out.into_inner())
}
