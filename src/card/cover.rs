//! Cover surface painting: the loaded image or the procedural fallback, then the
//! shared border and label overlay.

use rand::Rng;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::config::ScratchConfig;
use crate::error::CardError;

/// Loading state of the cover image. Input is accepted in every state; erasing a
/// still-blank cover is simply invisible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoverState {
    Loading,
    Ready,
    Failed,
}

/// One speck of the fallback texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dot {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

const DOT_COLOR: &str = "rgba(255, 255, 255, 0.35)";
const SHADE_COLOR: &str = "rgba(0, 0, 0, 0.12)";
const BORDER_WIDTH: f64 = 4.0;

/// Scatter `count` dots uniformly over a `width × height` surface.
pub fn scatter_dots<R: Rng>(rng: &mut R, count: u32, width: f64, height: f64) -> Vec<Dot> {
    (0..count)
        .map(|_| Dot {
            x: rng.gen_range(0.0..width.max(1.0)),
            y: rng.gen_range(0.0..height.max(1.0)),
            radius: rng.gen_range(0.8..2.2),
        })
        .collect()
}

/// Draw the loaded image stretched to exactly fill the surface, then the overlay.
pub fn paint_image(
    ctx: &CanvasRenderingContext2d,
    image: &HtmlImageElement,
    config: &ScratchConfig,
) -> Result<(), CardError> {
    let (w, h) = (config.width as f64, config.height as f64);
    ctx.clear_rect(0.0, 0.0, w, h);
    ctx.draw_image_with_html_image_element_and_dw_and_dh(image, 0.0, 0.0, w, h)?;
    paint_overlay(ctx, config)
}

/// Flat fill plus a scattered dot texture, then the overlay. Used whenever the
/// cover image is absent or fails to load so the card stays scratchable.
pub fn paint_fallback<R: Rng>(
    ctx: &CanvasRenderingContext2d,
    config: &ScratchConfig,
    rng: &mut R,
) -> Result<(), CardError> {
    let (w, h) = (config.width as f64, config.height as f64);
    ctx.set_global_composite_operation("source-over")?;
    ctx.clear_rect(0.0, 0.0, w, h);
    ctx.set_fill_style_str(&config.cover_color);
    ctx.fill_rect(0.0, 0.0, w, h);

    for (i, dot) in scatter_dots(rng, config.fallback_dots, w, h).iter().enumerate() {
        // alternate light and dark specks for a foil-like grain
        ctx.set_fill_style_str(if i % 3 == 0 { SHADE_COLOR } else { DOT_COLOR });
        ctx.begin_path();
        ctx.arc(dot.x, dot.y, dot.radius, 0.0, std::f64::consts::TAU)?;
        ctx.fill();
    }
    paint_overlay(ctx, config)
}

fn paint_overlay(ctx: &CanvasRenderingContext2d, config: &ScratchConfig) -> Result<(), CardError> {
    let (w, h) = (config.width as f64, config.height as f64);
    let inset = BORDER_WIDTH / 2.0;
    ctx.set_stroke_style_str(&config.border_color);
    ctx.set_line_width(BORDER_WIDTH);
    ctx.stroke_rect(inset, inset, w - BORDER_WIDTH, h - BORDER_WIDTH);

    if config.label.is_empty() {
        return Ok(());
    }
    ctx.set_font(&config.label_font);
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.set_line_width(3.0);
    ctx.set_stroke_style_str("rgba(0, 0, 0, 0.35)");
    ctx.stroke_text(&config.label, w / 2.0, h / 2.0)?;
    ctx.set_fill_style_str("#ffffff");
    ctx.fill_text(&config.label, w / 2.0, h / 2.0)?;
    Ok(())
}
