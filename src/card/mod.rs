//! Browser side of the scratch card: mounting cards into the page, wiring
//! mouse / touch input and asynchronous cover / sound loading into the engine.
//!
//! Every card gets its own engine in a thread-local registry indexed by card id,
//! so any number of cards can live on one page. Event closures only carry the id
//! and look their card up on each call.

pub mod audio;
pub mod canvas;
pub mod celebrate;
pub mod config;
pub mod cover;
pub mod engine;
pub mod geometry;
pub mod session;
pub mod text;

use std::cell::RefCell;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::WasmClosure;
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, CanvasRenderingContext2d, CustomEvent, CustomEventInit, Document,
    Element, EventTarget, HtmlCanvasElement, HtmlElement, HtmlImageElement, MouseEvent,
    TouchEvent, window,
};

use self::audio::AudioCue;
use self::canvas::CanvasSurface;
use self::celebrate::ConfettiCelebrator;
use self::config::ScratchConfig;
use self::cover::CoverState;
use self::engine::ScratchEngine;
use self::geometry::{Point, ScreenRect};
use self::session::{Progress, ScratchSession};
use crate::error::CardError;

/// Attribute marking a card container; its value is the card's JSON config.
pub const CARD_ATTR: &str = "data-scratch-card";
const MOUNTED_ATTR: &str = "data-scratch-mounted";
const LAYER_ATTR: &str = "data-layer";
/// Event dispatched on the container once the card is fully revealed.
pub const REVEAL_EVENT: &str = "scratchreveal";

type WebEngine = ScratchEngine<CanvasSurface, ConfettiCelebrator, AudioCue>;

struct Card {
    container: Element,
    cover_canvas: HtmlCanvasElement,
    engine: WebEngine,
}

thread_local! {
    static CARDS: RefCell<Vec<Card>> = const { RefCell::new(Vec::new()) };
}

fn with_card<R>(id: u32, f: impl FnOnce(&mut Card) -> R) -> Result<R, CardError> {
    CARDS.with(|cards| {
        let mut cards = cards
            .try_borrow_mut()
            .map_err(|_| CardError::Js("card registry is busy".to_string()))?;
        let card = cards.get_mut(id as usize).ok_or(CardError::UnknownCard(id))?;
        Ok(f(card))
    })
}

fn document() -> Result<Document, CardError> {
    window()
        .ok_or(CardError::NoBrowser("window"))?
        .document()
        .ok_or(CardError::NoBrowser("document"))
}

// --- Mounting ----------------------------------------------------------------

/// Mount every `[data-scratch-card]` element not mounted yet. A card whose
/// config fails to parse is skipped so the rest of the page still works.
pub fn mount_all() -> Result<u32, CardError> {
    let doc = document()?;
    let nodes = doc.query_selector_all(&format!("[{CARD_ATTR}]"))?;
    let mut mounted = 0;
    for i in 0..nodes.length() {
        let Some(el) = nodes.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        if el.has_attribute(MOUNTED_ATTR) {
            continue;
        }
        let raw = el.get_attribute(CARD_ATTR).unwrap_or_default();
        let result = ScratchConfig::from_json(&raw).and_then(|cfg| mount(&doc, el, cfg));
        match result {
            Ok(_) => mounted += 1,
            Err(e) => log::warn!("skipping scratch card #{}: {}", i, e),
        }
    }
    Ok(mounted)
}

pub fn mount_by_id(container_id: &str, config: ScratchConfig) -> Result<u32, CardError> {
    let doc = document()?;
    let container = doc
        .get_element_by_id(container_id)
        .ok_or_else(|| CardError::MissingElement(format!("#{container_id}")))?;
    mount(&doc, container, config)
}

fn mount(doc: &Document, container: Element, config: ScratchConfig) -> Result<u32, CardError> {
    if let Some(id) = mounted_id(&container) {
        log::debug!("scratch card {} already mounted", id);
        return Ok(id);
    }
    let message_canvas = ensure_layer(doc, &container, "message", &config)?;
    let cover_canvas = ensure_layer(doc, &container, "cover", &config)?;

    // The message surface is painted here and never touched again.
    text::paint_message(&context_2d(&message_canvas)?, &config)?;
    let cover_ctx = context_2d(&cover_canvas)?;

    let id = CARDS.with(|cards| cards.borrow().len()) as u32;
    let sound = load_sound(id, &config);
    let engine = ScratchEngine::new(
        ScratchSession::new(&config),
        CanvasSurface::new(cover_ctx.clone(), config.width as f64, config.height as f64),
        ConfettiCelebrator::new(&config.celebration.hook, cover_canvas.clone()),
        sound,
        config.celebration.clone(),
    );
    container.set_attribute(MOUNTED_ATTR, &id.to_string())?;
    CARDS.with(|cards| {
        cards.borrow_mut().push(Card {
            container,
            cover_canvas: cover_canvas.clone(),
            engine,
        })
    });

    install_input(id, &cover_canvas)?;
    load_cover(id, cover_ctx, &config);
    log::info!(
        "scratch card {} mounted ({}x{}, brush {})",
        id,
        config.width,
        config.height,
        config.brush_radius
    );
    Ok(id)
}

/// Id of the card already living in `container`, if any.
fn mounted_id(container: &Element) -> Option<u32> {
    let id = container.get_attribute(MOUNTED_ATTR)?.parse().ok()?;
    with_card(id, |card| card.container == *container)
        .unwrap_or(false)
        .then_some(id)
}

/// Reuse the template's canvas for `layer` or create one stacked inside the
/// container. Both layers get the configured backing size.
fn ensure_layer(
    doc: &Document,
    container: &Element,
    layer: &str,
    config: &ScratchConfig,
) -> Result<HtmlCanvasElement, CardError> {
    let selector = format!("canvas[{LAYER_ATTR}=\"{layer}\"]");
    let canvas: HtmlCanvasElement = if let Some(el) = container.query_selector(&selector)? {
        el.dyn_into()
            .map_err(|_| CardError::MissingElement(selector.clone()))?
    } else {
        let c: HtmlCanvasElement = doc
            .create_element("canvas")?
            .dyn_into()
            .map_err(|_| CardError::NoBrowser("canvas element"))?;
        c.set_attribute(LAYER_ATTR, layer)?;
        let z = if layer == "cover" { 2 } else { 1 };
        c.set_attribute(
            "style",
            &format!("position:absolute; left:0; top:0; width:100%; height:100%; z-index:{z};"),
        )?;
        if let Some(host) = container.dyn_ref::<HtmlElement>() {
            let style = host.style();
            if style.get_property_value("position")?.is_empty() {
                style.set_property("position", "relative")?;
                style.set_property("width", &format!("{}px", config.width))?;
                style.set_property("height", &format!("{}px", config.height))?;
            }
        }
        container.append_child(&c)?;
        c
    };
    canvas.set_width(config.width);
    canvas.set_height(config.height);
    if layer == "cover" {
        // keep the browser from scrolling / zooming while a finger scratches
        if let Some(el) = canvas.dyn_ref::<HtmlElement>() {
            el.style().set_property("touch-action", "none")?;
        }
    }
    Ok(canvas)
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, CardError> {
    canvas
        .get_context("2d")?
        .ok_or(CardError::NoBrowser("2d canvas context"))?
        .dyn_into()
        .map_err(|_| CardError::NoBrowser("2d canvas context"))
}

// --- Cover & sound loading ---------------------------------------------------

fn load_cover(id: u32, ctx: CanvasRenderingContext2d, config: &ScratchConfig) {
    let Some(src) = config.cover_source() else {
        let state = paint_fallback(&ctx, config, "no cover image configured");
        set_cover_state(id, state);
        return;
    };
    let image = match HtmlImageElement::new() {
        Ok(img) => img,
        Err(e) => {
            let state = paint_fallback(&ctx, config, &format!("{:?}", e));
            set_cover_state(id, state);
            return;
        }
    };

    let onload = {
        let (image, ctx, config) = (image.clone(), ctx.clone(), config.clone());
        Closure::once_into_js(move || {
            if !accepts_cover_paint(id) {
                set_cover_state(id, CoverState::Ready);
                return;
            }
            let state = match cover::paint_image(&ctx, &image, &config) {
                Ok(()) => CoverState::Ready,
                Err(e) => paint_fallback(&ctx, &config, &e.to_string()),
            };
            set_cover_state(id, state);
        })
    };
    let onerror = {
        let config = config.clone();
        let src = src.clone();
        Closure::once_into_js(move || {
            if !accepts_cover_paint(id) {
                set_cover_state(id, CoverState::Failed);
                return;
            }
            let state = paint_fallback(&ctx, &config, &format!("failed to load {}", short(&src)));
            set_cover_state(id, state);
        })
    };
    image.set_onload(Some(onload.unchecked_ref()));
    image.set_onerror(Some(onerror.unchecked_ref()));
    image.set_src(&src);
}

/// A cover arriving after the reveal must not paint over the cleared card.
fn accepts_cover_paint(id: u32) -> bool {
    let accepts = with_card(id, |card| card.engine.accepts_cover_paint()).unwrap_or(true);
    if !accepts {
        log::debug!("card {}: already revealed, late cover discarded", id);
    }
    accepts
}

fn paint_fallback(ctx: &CanvasRenderingContext2d, config: &ScratchConfig, reason: &str) -> CoverState {
    log::warn!("cover image unavailable ({}), using fallback pattern", reason);
    let mut rng = SmallRng::from_entropy();
    if let Err(e) = cover::paint_fallback(ctx, config, &mut rng) {
        log::warn!("fallback cover paint failed: {}", e);
    }
    CoverState::Failed
}

fn set_cover_state(id: u32, state: CoverState) {
    if let Err(e) = with_card(id, |card| card.engine.set_cover_state(state)) {
        log::warn!("card {}: cover state not recorded: {}", id, e);
    }
}

/// Data URIs can be huge; keep log lines readable.
fn short(src: &str) -> &str {
    match src.char_indices().nth(64) {
        Some((idx, _)) => &src[..idx],
        None => src,
    }
}

fn load_sound(id: u32, config: &ScratchConfig) -> Option<AudioCue> {
    let src = config.sound_source()?;
    let cue = AudioCue::new(&src, move |reason: JsValue| {
        let reason = reason.as_string().unwrap_or_else(|| format!("{:?}", reason));
        if let Err(e) = with_card(id, |card| card.engine.sound_rejected(&reason)) {
            log::warn!("card {}: {}", id, e);
        }
    });
    let cue = match cue {
        Ok(cue) => cue,
        Err(e) => {
            log::warn!("scratch sound disabled: {}", e);
            return None;
        }
    };
    let ended = listen(cue.element(), "ended", None, move |_evt: web_sys::Event| {
        if let Err(e) = with_card(id, |card| card.engine.sound_ended()) {
            log::warn!("card {}: {}", id, e);
        }
    });
    if let Err(e) = ended {
        log::warn!("scratch sound will not loop: {}", e);
    }
    Some(cue)
}

// --- Input -------------------------------------------------------------------

fn listen<E, F>(target: &EventTarget, kind: &str, passive: Option<bool>, handler: F) -> Result<(), CardError>
where
    E: FromWasmAbi + 'static,
    F: FnMut(E) + 'static,
    dyn FnMut(E): WasmClosure,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(E)>);
    match passive {
        Some(passive) => {
            let opts = AddEventListenerOptions::new();
            opts.set_passive(passive);
            target.add_event_listener_with_callback_and_add_event_listener_options(
                kind,
                closure.as_ref().unchecked_ref(),
                &opts,
            )?;
        }
        None => target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?,
    }
    closure.forget();
    Ok(())
}

fn surface_point(canvas: &HtmlCanvasElement, client_x: f64, client_y: f64) -> Point {
    let r = canvas.get_bounding_client_rect();
    let rect = ScreenRect { left: r.left(), top: r.top(), width: r.width(), height: r.height() };
    geometry::to_surface(
        Point::new(client_x, client_y),
        &rect,
        (canvas.width() as f64, canvas.height() as f64),
    )
}

/// Handler boundary: run `action` on the card, then fire celebrations and
/// announce a reveal once the registry borrow is released (page hooks and
/// listeners may call back into us).
fn dispatch(id: u32, action: impl FnOnce(&mut Card) -> Progress) {
    let outcome = with_card(id, |card| {
        let progress = action(card);
        (progress, card.container.clone(), card.engine.take_celebrations())
    });
    match outcome {
        Ok((progress, container, celebrations)) => {
            celebrations.fire();
            if progress.revealed {
                announce_reveal(id, &container);
            }
        }
        Err(e) => log::warn!("card {}: input dropped: {}", id, e),
    }
}

fn press(id: u32, x: f64, y: f64) {
    dispatch(id, |card| {
        let p = surface_point(&card.cover_canvas, x, y);
        card.engine.pointer_down(p)
    });
}

fn drag(id: u32, x: f64, y: f64) {
    dispatch(id, |card| {
        let p = surface_point(&card.cover_canvas, x, y);
        card.engine.pointer_move(p)
    });
}

fn release(id: u32) {
    dispatch(id, |card| {
        card.engine.pointer_up();
        Progress::default()
    });
}

fn primary_touch(evt: &TouchEvent) -> Option<(f64, f64)> {
    evt.touches()
        .get(0)
        .map(|t| (t.client_x() as f64, t.client_y() as f64))
}

fn install_input(id: u32, canvas: &HtmlCanvasElement) -> Result<(), CardError> {
    listen(canvas, "mousedown", None, move |evt: MouseEvent| {
        press(id, evt.client_x() as f64, evt.client_y() as f64);
    })?;
    listen(canvas, "mousemove", None, move |evt: MouseEvent| {
        drag(id, evt.client_x() as f64, evt.client_y() as f64);
    })?;
    for kind in ["mouseup", "mouseleave"] {
        listen(canvas, kind, None, move |_evt: MouseEvent| release(id))?;
    }

    // Touch listeners must be non-passive for preventDefault to stop scrolling.
    listen(canvas, "touchstart", Some(false), move |evt: TouchEvent| {
        evt.prevent_default();
        if let Some((x, y)) = primary_touch(&evt) {
            press(id, x, y);
        }
    })?;
    listen(canvas, "touchmove", Some(false), move |evt: TouchEvent| {
        evt.prevent_default();
        if let Some((x, y)) = primary_touch(&evt) {
            drag(id, x, y);
        }
    })?;
    for kind in ["touchend", "touchcancel"] {
        listen(canvas, kind, Some(false), move |_evt: TouchEvent| release(id))?;
    }
    Ok(())
}

fn announce_reveal(id: u32, container: &Element) {
    let init = CustomEventInit::new();
    init.set_bubbles(true);
    init.set_detail(&JsValue::from(id));
    let sent = CustomEvent::new_with_event_init_dict(REVEAL_EVENT, &init)
        .and_then(|evt| container.dispatch_event(&evt));
    if let Err(e) = sent {
        log::warn!("card {}: reveal event not dispatched: {:?}", id, e);
    }
}

// --- Queries -----------------------------------------------------------------

pub fn progress(id: u32) -> Result<f64, CardError> {
    with_card(id, |card| card.engine.session().fraction())
}

pub fn revealed(id: u32) -> Result<bool, CardError> {
    with_card(id, |card| card.engine.session().is_fully_revealed())
}

pub fn cover_state(id: u32) -> Result<CoverState, CardError> {
    with_card(id, |card| card.engine.cover_state())
}
