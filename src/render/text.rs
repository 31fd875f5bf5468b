//! Glyph rasterisation for raster surfaces.
//!
//! Uses egui's bundled Ubuntu font so exported images match the UI without
//! shipping extra assets.

use eframe::egui::Color32;
use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use std::sync::OnceLock;
use tiny_skia::{Pixmap, PremultipliedColorU8};

static FONT: OnceLock<Option<fontdue::Font>> = OnceLock::new();

/// Returns the shared label font, parsing it on first use.
fn font() -> Option<&'static fontdue::Font> {
    FONT.get_or_init(|| {
        match fontdue::Font::from_bytes(
            epaint_default_fonts::UBUNTU_LIGHT,
            fontdue::FontSettings::default(),
        ) {
            Ok(font) => Some(font),
            Err(e) => {
                log::error!("Failed to load label font: {}", e);
                None
            }
        }
    })
    .as_ref()
}

fn layout_line(font: &fontdue::Font, text: &str, px: f32, x: f32, y: f32) -> Layout {
    let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings {
        x,
        y,
        ..LayoutSettings::default()
    });
    layout.append(&[font], &TextStyle::new(text, px, 0));
    layout
}

/// Width in device pixels of `text` at `px`.
pub fn measure_width(text: &str, px: f32) -> f32 {
    let Some(font) = font() else {
        return 0.0;
    };
    let layout = layout_line(font, text, px, 0.0, 0.0);
    let mut min_x = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    for glyph in layout.glyphs() {
        min_x = min_x.min(glyph.x);
        max_x = max_x.max(glyph.x + glyph.width as f32);
    }
    if min_x.is_finite() && max_x.is_finite() {
        (max_x - min_x).max(0.0)
    } else {
        0.0
    }
}

/// Draws text with its horizontal center at `center_x` and its vertical
/// center at `center_y` (device pixels).
pub fn draw_centered(
    pixmap: &mut Pixmap,
    text: &str,
    px: f32,
    center_x: f32,
    center_y: f32,
    color: Color32,
) {
    let width = measure_width(text, px);
    draw_left(pixmap, text, px, center_x - width / 2.0, center_y, color);
}

/// Draws text starting at `x`, vertically centered on `center_y`.
pub fn draw_left(
    pixmap: &mut Pixmap,
    text: &str,
    px: f32,
    x: f32,
    center_y: f32,
    color: Color32,
) {
    let Some(font) = font() else {
        return;
    };
    if px <= 0.0 || !px.is_finite() {
        return;
    }

    let top = match font.horizontal_line_metrics(px) {
        Some(metrics) => center_y + (metrics.ascent + metrics.descent) * 0.5 - metrics.ascent,
        None => center_y - px * 0.5,
    };

    let layout = layout_line(font, text, px, x, top);
    for glyph in layout.glyphs() {
        if glyph.width == 0 || glyph.height == 0 {
            continue;
        }
        let (metrics, bitmap) = font.rasterize_indexed(glyph.key.glyph_index, glyph.key.px);
        blend_coverage(
            pixmap,
            glyph.x,
            glyph.y,
            metrics.width,
            metrics.height,
            &bitmap,
            color,
        );
    }
}

/// Source-over blends a coverage mask in `color` onto the pixmap.
fn blend_coverage(
    pixmap: &mut Pixmap,
    x: f32,
    y: f32,
    width: usize,
    height: usize,
    coverage: &[u8],
    color: Color32,
) {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let (pw, ph) = (pixmap.width() as i32, pixmap.height() as i32);
    let start_x = x.floor() as i32;
    let start_y = y.floor() as i32;
    let pixels = pixmap.pixels_mut();

    for row in 0..height {
        let py = start_y + row as i32;
        if py < 0 || py >= ph {
            continue;
        }
        for col in 0..width {
            let px = start_x + col as i32;
            if px < 0 || px >= pw {
                continue;
            }
            let cov = coverage[row * width + col] as u32;
            if cov == 0 {
                continue;
            }

            let src_a = cov * a as u32 / 255;
            let inv = 255 - src_a;
            let dst = &mut pixels[(py * pw + px) as usize];

            let out_r = (r as u32 * src_a + dst.red() as u32 * inv) / 255;
            let out_g = (g as u32 * src_a + dst.green() as u32 * inv) / 255;
            let out_b = (b as u32 * src_a + dst.blue() as u32 * inv) / 255;
            let out_a = src_a + dst.alpha() as u32 * inv / 255;

            if let Some(blended) = PremultipliedColorU8::from_rgba(
                out_r.min(out_a) as u8,
                out_g.min(out_a) as u8,
                out_b.min(out_a) as u8,
                out_a.min(255) as u8,
            ) {
                *dst = blended;
            }
        }
    }
}
