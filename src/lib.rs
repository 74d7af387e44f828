//! Scratch card core crate.
//!
//! Each card is two stacked canvases: the hidden message underneath and an
//! erasable cover on top. Pointer and touch strokes cut holes into the cover,
//! progress is tracked as nominal brushed area, celebrations fire at fixed
//! progress intervals and the cover is cleared once the reveal threshold is
//! passed. Cards are configured purely by data (see [`ScratchConfig`]).

use wasm_bindgen::prelude::*;

mod card;
mod error;

pub use card::celebrate::{Burst, Celebrate};
pub use card::audio::{Cue, SoundGate};
pub use card::canvas::Surface;
pub use card::config::{CelebrationParams, CelebrationStyle, ScratchConfig};
pub use card::cover::{CoverState, Dot, scatter_dots};
pub use card::engine::{Celebrations, ScratchEngine};
pub use card::geometry::{Point, ScreenRect, to_surface, viewport_origin};
pub use card::session::{Phase, Progress, ScratchSession, Stroke};
pub use card::text::{line_positions, wrap_words};
pub use card::{CARD_ATTR, REVEAL_EVENT};
pub use error::CardError;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

// -----------------------------------------------------------------------------
// JS entry points
// -----------------------------------------------------------------------------

/// Mount every `[data-scratch-card]` element on the page. Returns how many
/// cards were mounted.
#[wasm_bindgen]
pub fn start_cards() -> Result<u32, JsValue> {
    Ok(card::mount_all()?)
}

/// Mount a single card into the element with id `container_id`.
#[wasm_bindgen]
pub fn mount_card(container_id: &str, config_json: &str) -> Result<u32, JsValue> {
    let config = ScratchConfig::from_json(config_json)?;
    Ok(card::mount_by_id(container_id, config)?)
}

/// Erased fraction (0..=1) of a mounted card.
#[wasm_bindgen]
pub fn card_progress(id: u32) -> Result<f64, JsValue> {
    Ok(card::progress(id)?)
}

#[wasm_bindgen]
pub fn card_revealed(id: u32) -> Result<bool, JsValue> {
    Ok(card::revealed(id)?)
}

/// "loading", "ready" or "failed" (fallback pattern in use).
#[wasm_bindgen]
pub fn card_cover_state(id: u32) -> Result<String, JsValue> {
    let state = match card::cover_state(id)? {
        CoverState::Loading => "loading",
        CoverState::Ready => "ready",
        CoverState::Failed => "failed",
    };
    Ok(state.to_string())
}
