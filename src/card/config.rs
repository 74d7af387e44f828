//! Per-card configuration record.
//!
//! Cards are described entirely by data: the page template embeds one JSON object
//! per card (camelCase keys) and every field has a default, so `{}` yields a
//! working 380×100 card with a fallback cover.

use serde::Deserialize;

use crate::error::CardError;

/// Style of the particles handed to the celebration collaborator. The engine
/// never interprets it beyond picking default colors and shapes.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CelebrationStyle {
    #[default]
    Confetti,
    Hearts,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CelebrationParams {
    pub style: CelebrationStyle,
    pub colors: Vec<String>,
    pub particle_count: u32,
    pub spread: f64,
    /// Shape names forwarded untouched (e.g. "circle", "square").
    pub shapes: Vec<String>,
    /// Delay before the smaller echo burst that follows every burst.
    pub echo_delay_ms: i32,
    /// Name of the global function implementing the collaborator.
    pub hook: String,
}

impl Default for CelebrationParams {
    fn default() -> Self {
        Self {
            style: CelebrationStyle::Confetti,
            colors: Vec::new(),
            particle_count: 60,
            spread: 70.0,
            shapes: Vec::new(),
            echo_delay_ms: 250,
            hook: "confetti".to_string(),
        }
    }
}

impl CelebrationParams {
    /// Colors to send; falls back to a palette matching the style.
    pub fn palette(&self) -> Vec<String> {
        if !self.colors.is_empty() {
            return self.colors.clone();
        }
        let defaults: &[&str] = match self.style {
            CelebrationStyle::Confetti => &["#ffd166", "#ef476f", "#06d6a0", "#118ab2"],
            CelebrationStyle::Hearts => &["#ff4d6d", "#ff8fa3", "#c9184a"],
        };
        defaults.iter().map(|c| c.to_string()).collect()
    }

    pub fn shape_list(&self) -> Vec<String> {
        if !self.shapes.is_empty() {
            return self.shapes.clone();
        }
        match self.style {
            CelebrationStyle::Confetti => Vec::new(),
            CelebrationStyle::Hearts => vec!["circle".to_string()],
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ScratchConfig {
    pub width: u32,
    pub height: u32,
    pub hidden_message: String,
    pub cover_image_url: Option<String>,
    pub cover_image_base64: Option<String>,
    pub brush_radius: f64,
    pub reveal_threshold_fraction: f64,
    pub burst_interval_fraction: f64,
    pub celebration: CelebrationParams,
    /// Flat color list accepted from older card templates.
    pub celebration_colors: Vec<String>,
    pub sound_url: Option<String>,
    pub sound_base64: Option<String>,

    // --- Presentation ---
    pub message_font: String,
    pub message_color: String,
    pub message_stroke: String,
    pub line_height: f64,
    pub wrap_margin: f64,
    pub cover_color: String,
    pub border_color: String,
    pub label: String,
    pub label_font: String,
    pub fallback_dots: u32,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            width: 380,
            height: 100,
            hidden_message: String::new(),
            cover_image_url: None,
            cover_image_base64: None,
            brush_radius: 20.0,
            reveal_threshold_fraction: 0.6,
            burst_interval_fraction: 0.05,
            celebration: CelebrationParams::default(),
            celebration_colors: Vec::new(),
            sound_url: None,
            sound_base64: None,
            message_font: "bold 26px 'Segoe UI', sans-serif".to_string(),
            message_color: "#c9184a".to_string(),
            message_stroke: "#ffffff".to_string(),
            line_height: 32.0,
            wrap_margin: 40.0,
            cover_color: "#b8b8b8".to_string(),
            border_color: "#d4af37".to_string(),
            label: "Scratch Me".to_string(),
            label_font: "bold 24px 'Segoe UI', sans-serif".to_string(),
            fallback_dots: 400,
        }
    }
}

impl ScratchConfig {
    pub fn from_json(json: &str) -> Result<Self, CardError> {
        let trimmed = json.trim();
        let config: ScratchConfig = if trimmed.is_empty() {
            ScratchConfig::default()
        } else {
            serde_json::from_str(trimmed)?
        };
        Ok(config.normalized())
    }

    /// Clamp values a template could get wrong so the engine never divides by
    /// zero or loops on nonsense. Valid configs pass through unchanged.
    pub fn normalized(mut self) -> Self {
        let defaults = ScratchConfig::default();
        self.width = self.width.max(1);
        self.height = self.height.max(1);
        if !(self.brush_radius.is_finite() && self.brush_radius > 0.0) {
            self.brush_radius = defaults.brush_radius;
        }
        if !valid_fraction(self.reveal_threshold_fraction) {
            self.reveal_threshold_fraction = defaults.reveal_threshold_fraction;
        }
        if !valid_fraction(self.burst_interval_fraction) {
            self.burst_interval_fraction = defaults.burst_interval_fraction;
        }
        if !(self.line_height.is_finite() && self.line_height > 0.0) {
            self.line_height = defaults.line_height;
        }
        if !(self.wrap_margin.is_finite() && self.wrap_margin >= 0.0) {
            self.wrap_margin = defaults.wrap_margin;
        }
        if !self.celebration_colors.is_empty() && self.celebration.colors.is_empty() {
            self.celebration.colors = std::mem::take(&mut self.celebration_colors);
        }
        self
    }

    pub fn total_area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    /// Image source for the cover, or `None` when the fallback pattern is wanted.
    pub fn cover_source(&self) -> Option<String> {
        resolve_source(
            self.cover_image_url.as_deref(),
            self.cover_image_base64.as_deref(),
            "image/png",
        )
    }

    pub fn sound_source(&self) -> Option<String> {
        resolve_source(
            self.sound_url.as_deref(),
            self.sound_base64.as_deref(),
            "audio/mpeg",
        )
    }
}

fn valid_fraction(f: f64) -> bool {
    f.is_finite() && f > 0.0 && f <= 1.0
}

/// A template placeholder that was never filled in is as good as no value.
fn usable(value: Option<&str>) -> Option<&str> {
    let v = value?.trim();
    if v.is_empty() || (v.starts_with("{{") && v.ends_with("}}")) {
        None
    } else {
        Some(v)
    }
}

fn resolve_source(url: Option<&str>, base64: Option<&str>, mime: &str) -> Option<String> {
    if let Some(url) = usable(url) {
        return Some(url.to_string());
    }
    let data = usable(base64)?;
    if data.starts_with("data:") {
        Some(data.to_string())
    } else {
        Some(format!("data:{mime};base64,{data}"))
    }
}
