//! Celebration collaborator (confetti / hearts).
//!
//! The particle effect itself lives in a page-provided global function (by
//! default `window.confetti`, canvas-confetti's entry point). We only
//! feature-detect it and hand over counts, spread, colors and an origin hint.

use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, window};

use super::config::CelebrationParams;
use super::geometry::{ScreenRect, viewport_origin};
use crate::error::CardError;

#[derive(Clone, Debug, PartialEq)]
pub struct Burst {
    pub particle_count: u32,
    pub spread: f64,
    pub colors: Vec<String>,
    pub shapes: Vec<String>,
}

impl Burst {
    /// Regular burst fired on each progress interval.
    pub fn from_params(params: &CelebrationParams) -> Self {
        Self {
            particle_count: params.particle_count,
            spread: params.spread,
            colors: params.palette(),
            shapes: params.shape_list(),
        }
    }

    /// Bigger, wider burst for the full reveal.
    pub fn finale(params: &CelebrationParams) -> Self {
        let base = Self::from_params(params);
        Self {
            particle_count: base.particle_count.saturating_mul(2),
            spread: (base.spread * 1.5).min(360.0),
            ..base
        }
    }

    /// Smaller follow-up fired shortly after a burst.
    pub fn echo(&self) -> Self {
        Self {
            particle_count: (self.particle_count / 2).max(1),
            spread: (self.spread * 1.2).min(360.0),
            ..self.clone()
        }
    }
}

pub trait Celebrate {
    /// Whether the collaborator exists right now.
    fn is_available(&self) -> bool;
    fn trigger(&self, burst: &Burst) -> Result<(), CardError>;
    /// Fire-and-forget delayed trigger; nothing can cancel it.
    fn trigger_later(&self, delay_ms: i32, burst: Burst) -> Result<(), CardError>;
}

#[derive(Clone)]
pub struct ConfettiCelebrator {
    hook: String,
    anchor: HtmlCanvasElement,
}

impl ConfettiCelebrator {
    pub fn new(hook: &str, anchor: HtmlCanvasElement) -> Self {
        Self { hook: hook.to_string(), anchor }
    }

    fn hook_fn(&self) -> Option<Function> {
        let win = window()?;
        Reflect::get(&win, &JsValue::from_str(&self.hook))
            .ok()?
            .dyn_into::<Function>()
            .ok()
    }

    fn origin(&self) -> (f64, f64) {
        let r = self.anchor.get_bounding_client_rect();
        let rect = ScreenRect { left: r.left(), top: r.top(), width: r.width(), height: r.height() };
        let viewport = window()
            .map(|w| {
                let iw = w.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
                let ih = w.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
                (iw, ih)
            })
            .unwrap_or((0.0, 0.0));
        let o = viewport_origin(&rect, viewport);
        (o.x, o.y)
    }

    fn options(&self, burst: &Burst) -> Result<Object, CardError> {
        let opts = Object::new();
        Reflect::set(&opts, &"particleCount".into(), &JsValue::from(burst.particle_count))?;
        Reflect::set(&opts, &"spread".into(), &JsValue::from(burst.spread))?;

        let (ox, oy) = self.origin();
        let origin = Object::new();
        Reflect::set(&origin, &"x".into(), &JsValue::from(ox))?;
        Reflect::set(&origin, &"y".into(), &JsValue::from(oy))?;
        Reflect::set(&opts, &"origin".into(), &origin)?;

        let colors: Array = burst.colors.iter().map(|c| JsValue::from_str(c)).collect();
        Reflect::set(&opts, &"colors".into(), &colors)?;
        if !burst.shapes.is_empty() {
            let shapes: Array = burst.shapes.iter().map(|s| JsValue::from_str(s)).collect();
            Reflect::set(&opts, &"shapes".into(), &shapes)?;
        }
        Ok(opts)
    }
}

impl Celebrate for ConfettiCelebrator {
    fn is_available(&self) -> bool {
        self.hook_fn().is_some()
    }

    fn trigger(&self, burst: &Burst) -> Result<(), CardError> {
        let hook = self
            .hook_fn()
            .ok_or_else(|| CardError::Celebration(format!("window.{} is not a function", self.hook)))?;
        let opts = self.options(burst)?;
        hook.call1(&JsValue::NULL, &opts)
            .map_err(|e| CardError::Celebration(format!("{:?}", e)))?;
        Ok(())
    }

    fn trigger_later(&self, delay_ms: i32, burst: Burst) -> Result<(), CardError> {
        let win = window().ok_or(CardError::NoBrowser("window"))?;
        let me = self.clone();
        let cb = Closure::once_into_js(move || {
            if let Err(e) = me.trigger(&burst) {
                log::warn!("delayed celebration skipped: {}", e);
            }
        });
        win.set_timeout_with_callback_and_timeout_and_arguments_0(cb.unchecked_ref(), delay_ms)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::config::CelebrationStyle;

    #[test]
    fn finale_is_bigger_and_echo_smaller() {
        let params = CelebrationParams { particle_count: 40, spread: 60.0, ..Default::default() };
        let burst = Burst::from_params(&params);
        let finale = Burst::finale(&params);
        assert_eq!(finale.particle_count, 80);
        assert!((finale.spread - 90.0).abs() < 1e-9);
        let echo = burst.echo();
        assert_eq!(echo.particle_count, 20);
        assert_eq!(echo.colors, burst.colors);
    }

    #[test]
    fn echo_never_drops_to_zero_particles() {
        let params = CelebrationParams { particle_count: 1, spread: 300.0, ..Default::default() };
        let echo = Burst::from_params(&params).echo();
        assert_eq!(echo.particle_count, 1);
        assert_eq!(echo.spread, 360.0);
    }

    #[test]
    fn hearts_style_carries_its_palette() {
        let params = CelebrationParams { style: CelebrationStyle::Hearts, ..Default::default() };
        let burst = Burst::from_params(&params);
        assert_eq!(burst.colors.len(), 3);
        assert_eq!(burst.shapes, vec!["circle".to_string()]);
    }
}
