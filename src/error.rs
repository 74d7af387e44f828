//! Error type shared by the card engine and its browser bindings.

use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum CardError {
    /// A browser global (window, document, body) was unavailable.
    #[error("missing browser object: {0}")]
    NoBrowser(&'static str),
    #[error("element not found: {0}")]
    MissingElement(String),
    /// A web API threw; the payload is the debug rendering of the thrown value.
    #[error("javascript error: {0}")]
    Js(String),
    #[error("invalid card configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("drawing failed: {0}")]
    Draw(String),
    #[error("audio playback failed: {0}")]
    Audio(String),
    #[error("celebration failed: {0}")]
    Celebration(String),
    #[error("unknown card id {0}")]
    UnknownCard(u32),
}

impl From<JsValue> for CardError {
    fn from(value: JsValue) -> Self {
        match value.as_string() {
            Some(s) => CardError::Js(s),
            None => CardError::Js(format!("{value:?}")),
        }
    }
}

impl From<CardError> for JsValue {
    fn from(err: CardError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
