//! Hidden-message layout and the one-time paint of the message surface.

use web_sys::CanvasRenderingContext2d;

use super::config::ScratchConfig;
use crate::error::CardError;

/// Greedy word wrap. Words are packed onto a line until the next one would push
/// the measured width past `max_width`. A single word wider than `max_width`
/// gets a line of its own rather than being split.
pub fn wrap_words<F>(text: &str, max_width: f64, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f64,
{
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure(&candidate) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Baseline y for each line so the block is vertically centered (text drawn
/// with a middle baseline).
pub fn line_positions(line_count: usize, height: f64, line_height: f64) -> Vec<f64> {
    let start_y = (height - line_count as f64 * line_height) / 2.0 + line_height / 2.0;
    (0..line_count)
        .map(|i| start_y + i as f64 * line_height)
        .collect()
}

/// Clear the message canvas and draw the wrapped message, stroke pass first so
/// the fill stays crisp on any backdrop.
pub fn paint_message(ctx: &CanvasRenderingContext2d, config: &ScratchConfig) -> Result<(), CardError> {
    let w = config.width as f64;
    let h = config.height as f64;
    ctx.clear_rect(0.0, 0.0, w, h);
    ctx.set_font(&config.message_font);
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");

    let max_width = (w - config.wrap_margin).max(1.0);
    let lines = wrap_words(&config.hidden_message, max_width, |s| {
        ctx.measure_text(s).map(|m| m.width()).unwrap_or(0.0)
    });
    let ys = line_positions(lines.len(), h, config.line_height);

    ctx.set_line_width(3.0);
    ctx.set_stroke_style_str(&config.message_stroke);
    ctx.set_fill_style_str(&config.message_color);
    for (line, y) in lines.iter().zip(ys) {
        ctx.stroke_text(line, w / 2.0, y)?;
        ctx.fill_text(line, w / 2.0, y)?;
    }
    Ok(())
}
