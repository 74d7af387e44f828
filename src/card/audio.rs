//! Scratch sound cue.
//!
//! [`SoundGate`] holds the no-overlap rule: a request while the cue is playing is
//! dropped, and the cue is replayed on natural completion only while the user is
//! still scratching. [`AudioCue`] binds it to an `<audio>` element.
//!
//! Touch platforms refuse playback until audio has been unlocked by a
//! user-gesture-triggered play; doing that unlock is the host page's job. Until
//! it happens every play is rejected, which we log and otherwise ignore.

use js_sys::Promise;
use wasm_bindgen::prelude::*;
use web_sys::HtmlAudioElement;

use crate::error::CardError;

/// Sound playback primitive used by the engine.
pub trait Cue {
    /// Start playback from the beginning.
    fn play(&mut self) -> Result<(), CardError>;
    fn pause(&mut self);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SoundGate {
    playing: bool,
}

impl SoundGate {
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Returns true when the caller should start playback.
    pub fn request(&mut self) -> bool {
        if self.playing {
            return false;
        }
        self.playing = true;
        true
    }

    /// Natural end of playback. Returns true when the cue should loop.
    pub fn ended(&mut self, still_scratching: bool) -> bool {
        self.playing = still_scratching;
        still_scratching
    }

    /// Playback was refused or failed; allow a later request to try again.
    pub fn reset(&mut self) {
        self.playing = false;
    }
}

/// `<audio>` backed cue. Rejections arrive asynchronously from the play promise
/// and are routed to `on_reject`.
pub struct AudioCue {
    element: HtmlAudioElement,
    on_reject: Closure<dyn FnMut(JsValue)>,
}

impl AudioCue {
    pub fn new<F>(src: &str, on_reject: F) -> Result<Self, CardError>
    where
        F: FnMut(JsValue) + 'static,
    {
        let element = HtmlAudioElement::new_with_src(src)?;
        element.set_preload("auto");
        Ok(Self {
            element,
            on_reject: Closure::wrap(Box::new(on_reject) as Box<dyn FnMut(JsValue)>),
        })
    }

    pub fn element(&self) -> &HtmlAudioElement {
        &self.element
    }
}

impl Cue for AudioCue {
    fn play(&mut self) -> Result<(), CardError> {
        self.element.set_current_time(0.0);
        let promise: Promise = self
            .element
            .play()
            .map_err(|e| CardError::Audio(format!("{:?}", e)))?;
        // autoplay refusals reject the promise later instead of throwing here
        let _ = promise.catch(&self.on_reject);
        Ok(())
    }

    fn pause(&mut self) {
        if let Err(e) = self.element.pause() {
            log::warn!("pausing scratch sound failed: {:?}", e);
        }
    }
}
