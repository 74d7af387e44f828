//! Scratch-reveal engine: applies session strokes to the cover surface and
//! coordinates the sound and celebration collaborators.
//!
//! Every public entry point is a handler boundary: faults are logged and
//! swallowed. An erasure whose disc fails to draw is not counted; a failed gap
//! segment is only logged. Celebrations are queued and fired by the caller via
//! [`ScratchEngine::take_celebrations`].

use super::audio::{Cue, SoundGate};
use super::canvas::Surface;
use super::celebrate::{Burst, Celebrate};
use super::config::CelebrationParams;
use super::cover::CoverState;
use super::geometry::Point;
use super::session::{Progress, ScratchSession, Stroke};

pub struct ScratchEngine<S, C, A> {
    session: ScratchSession,
    cover: S,
    celebrator: C,
    sound: Option<A>,
    gate: SoundGate,
    celebration: CelebrationParams,
    cover_state: CoverState,
    celebrator_missing_logged: bool,
    pending: Vec<Burst>,
}

impl<S: Surface, C: Celebrate, A: Cue> ScratchEngine<S, C, A> {
    pub fn new(
        session: ScratchSession,
        cover: S,
        celebrator: C,
        sound: Option<A>,
        celebration: CelebrationParams,
    ) -> Self {
        Self {
            session,
            cover,
            celebrator,
            sound,
            gate: SoundGate::default(),
            celebration,
            cover_state: CoverState::Loading,
            celebrator_missing_logged: false,
            pending: Vec::new(),
        }
    }

    pub fn session(&self) -> &ScratchSession {
        &self.session
    }

    pub fn cover(&self) -> &S {
        &self.cover
    }

    pub fn sound_gate(&self) -> SoundGate {
        self.gate
    }

    pub fn cover_state(&self) -> CoverState {
        self.cover_state
    }

    pub fn set_cover_state(&mut self, state: CoverState) {
        self.cover_state = state;
    }

    pub fn pointer_down(&mut self, at: Point) -> Progress {
        if self.session.is_fully_revealed() {
            return Progress::default();
        }
        self.request_sound();
        let before = self.session.clone();
        let stroke = self.session.pointer_down(at);
        self.apply(stroke, before)
    }

    pub fn pointer_move(&mut self, at: Point) -> Progress {
        let before = self.session.clone();
        let stroke = self.session.pointer_move(at);
        self.apply(stroke, before)
    }

    pub fn pointer_up(&mut self) {
        self.session.pointer_up();
    }

    /// Natural end of the sound cue: loop it while the user keeps scratching.
    pub fn sound_ended(&mut self) {
        let scratching = self.session.is_pointer_down() && !self.session.is_fully_revealed();
        if self.gate.ended(scratching) {
            self.start_sound();
        }
    }

    /// Asynchronous playback refusal (autoplay policy and the like).
    pub fn sound_rejected(&mut self, reason: &str) {
        log::warn!("scratch sound rejected, continuing silently: {}", reason);
        self.gate.reset();
    }

    fn request_sound(&mut self) {
        if self.sound.is_some() && self.gate.request() {
            self.start_sound();
        }
    }

    fn start_sound(&mut self) {
        let Some(sound) = self.sound.as_mut() else {
            self.gate.reset();
            return;
        };
        if let Err(e) = sound.play() {
            log::warn!("scratch sound failed to start: {}", e);
            self.gate.reset();
        }
    }

    fn apply(&mut self, stroke: Option<Stroke>, before: ScratchSession) -> Progress {
        let Some(stroke) = stroke else {
            return Progress::default();
        };
        // The disc is what the estimate counts: nothing drawn, nothing counted.
        if let Err(e) = self.cover.erase_disc(stroke.at, stroke.radius) {
            log::warn!("erasure failed, keeping previous progress: {}", e);
            self.session = before;
            return Progress::default();
        }
        if let Some(from) = stroke.from {
            if let Err(e) = self.cover.erase_segment(from, stroke.at, stroke.segment_width()) {
                log::warn!("stroke gap left unerased: {}", e);
            }
        }
        if let Some(index) = stroke.progress.burst {
            log::debug!("burst {} at {:.0}% erased", index, self.session.fraction() * 100.0);
            self.queue_celebration(Burst::from_params(&self.celebration));
        }
        if stroke.progress.revealed {
            log::info!("card fully revealed");
            if let Err(e) = self.cover.clear() {
                log::warn!("cover not cleared on reveal: {}", e);
            }
            if let Some(sound) = self.sound.as_mut() {
                sound.pause();
            }
            self.gate.reset();
            self.queue_celebration(Burst::finale(&self.celebration));
        }
        stroke.progress
    }

    fn queue_celebration(&mut self, burst: Burst) {
        if !self.celebrator.is_available() {
            if !self.celebrator_missing_logged {
                log::warn!("celebration hook unavailable, skipping effects");
                self.celebrator_missing_logged = true;
            }
            return;
        }
        self.pending.push(burst);
    }

    /// Whether a cover that finished loading may still be painted. A revealed
    /// card keeps its cleared cover whatever arrives late.
    pub fn accepts_cover_paint(&self) -> bool {
        !self.session.is_fully_revealed()
    }
}

impl<S, C: Celebrate + Clone, A> ScratchEngine<S, C, A> {
    /// Hand over the bursts raised since the last call. Firing them is left to
    /// the caller so the page hook never runs while the card is borrowed.
    pub fn take_celebrations(&mut self) -> Celebrations<C> {
        Celebrations {
            celebrator: self.celebrator.clone(),
            bursts: std::mem::take(&mut self.pending),
            echo_delay_ms: self.celebration.echo_delay_ms,
        }
    }
}

/// Bursts waiting to be handed to the celebration collaborator.
pub struct Celebrations<C> {
    celebrator: C,
    bursts: Vec<Burst>,
    echo_delay_ms: i32,
}

impl<C: Celebrate> Celebrations<C> {
    pub fn is_empty(&self) -> bool {
        self.bursts.is_empty()
    }

    /// Trigger every burst followed by its delayed echo. Failures are logged.
    pub fn fire(self) {
        for burst in self.bursts {
            if let Err(e) = self.celebrator.trigger(&burst) {
                log::warn!("celebration failed: {}", e);
                continue;
            }
            if let Err(e) = self.celebrator.trigger_later(self.echo_delay_ms, burst.echo()) {
                log::warn!("echo celebration not scheduled: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::config::ScratchConfig;
    use crate::error::CardError;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Disc(Point, f64),
        Segment(Point, Point, f64),
        Clear,
    }

    #[derive(Default)]
    struct RecordingSurface {
        ops: Vec<Op>,
        fail: bool,
        fail_segments: bool,
    }

    impl Surface for RecordingSurface {
        fn erase_disc(&mut self, center: Point, radius: f64) -> Result<(), CardError> {
            if self.fail {
                return Err(CardError::Draw("boom".into()));
            }
            self.ops.push(Op::Disc(center, radius));
            Ok(())
        }
        fn erase_segment(&mut self, from: Point, to: Point, width: f64) -> Result<(), CardError> {
            if self.fail_segments {
                return Err(CardError::Draw("segment".into()));
            }
            self.ops.push(Op::Segment(from, to, width));
            Ok(())
        }
        fn clear(&mut self) -> Result<(), CardError> {
            self.ops.push(Op::Clear);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Party {
        available: bool,
        now: Rc<RefCell<Vec<Burst>>>,
        later: Rc<RefCell<Vec<(i32, Burst)>>>,
    }

    impl Celebrate for Party {
        fn is_available(&self) -> bool {
            self.available
        }
        fn trigger(&self, burst: &Burst) -> Result<(), CardError> {
            self.now.borrow_mut().push(burst.clone());
            Ok(())
        }
        fn trigger_later(&self, delay_ms: i32, burst: Burst) -> Result<(), CardError> {
            self.later.borrow_mut().push((delay_ms, burst));
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Speaker {
        plays: Rc<Cell<u32>>,
        pauses: Rc<Cell<u32>>,
        refuse: bool,
    }

    impl Cue for Speaker {
        fn play(&mut self) -> Result<(), CardError> {
            if self.refuse {
                return Err(CardError::Audio("NotAllowedError".into()));
            }
            self.plays.set(self.plays.get() + 1);
            Ok(())
        }
        fn pause(&mut self) {
            self.pauses.set(self.pauses.get() + 1);
        }
    }

    type TestEngine = ScratchEngine<RecordingSurface, Party, Speaker>;

    fn engine(radius: f64, party: Party, speaker: Option<Speaker>) -> TestEngine {
        let cfg = ScratchConfig { brush_radius: radius, ..ScratchConfig::default() };
        ScratchEngine::new(
            ScratchSession::new(&cfg),
            RecordingSurface::default(),
            party,
            speaker,
            cfg.celebration.clone(),
        )
    }

    fn live_party() -> Party {
        Party { available: true, ..Party::default() }
    }

    #[test]
    fn stroke_erases_disc_then_connecting_segment() {
        let mut e = engine(10.0, live_party(), None);
        e.pointer_down(Point::new(10.0, 10.0));
        e.pointer_move(Point::new(40.0, 10.0));
        assert_eq!(
            e.cover().ops,
            vec![
                Op::Disc(Point::new(10.0, 10.0), 10.0),
                Op::Disc(Point::new(40.0, 10.0), 10.0),
                Op::Segment(Point::new(10.0, 10.0), Point::new(40.0, 10.0), 20.0),
            ]
        );
    }

    #[test]
    fn each_crossing_fires_one_burst_and_one_echo() {
        let party = live_party();
        // disc area ≈ 1963, interval area 1900: every erasure crosses a boundary
        let mut e = engine(25.0, party.clone(), None);
        e.pointer_down(Point::new(50.0, 50.0));
        // queued, not fired from inside the handler
        assert!(party.now.borrow().is_empty());
        e.take_celebrations().fire();
        assert_eq!(party.now.borrow().len(), 1);
        assert_eq!(party.later.borrow().len(), 1);
        assert_eq!(party.later.borrow()[0].0, 250);
        assert_eq!(party.later.borrow()[0].1.particle_count, 30);
    }

    #[test]
    fn full_reveal_clears_once_and_then_ignores_input() {
        let party = live_party();
        let speaker = Speaker::default();
        let mut e = engine(40.0, party.clone(), Some(speaker.clone()));
        e.pointer_down(Point::new(0.0, 0.0));
        let mut revealed = false;
        for i in 0..50 {
            if e.pointer_move(Point::new(i as f64, 50.0)).revealed {
                revealed = true;
                break;
            }
        }
        assert!(revealed);
        e.take_celebrations().fire();
        assert_eq!(e.cover().ops.last(), Some(&Op::Clear));
        assert_eq!(speaker.pauses.get(), 1);

        let ops = e.cover().ops.len();
        let fired = party.now.borrow().len();
        let area = e.session().erased_area();
        for _ in 0..5 {
            e.pointer_down(Point::new(10.0, 10.0));
            e.pointer_move(Point::new(20.0, 10.0));
            e.pointer_up();
        }
        assert_eq!(e.cover().ops.len(), ops);
        assert!(e.take_celebrations().is_empty());
        assert_eq!(party.now.borrow().len(), fired);
        assert_eq!(e.session().erased_area(), area);
        // finale is the last thing that fired: double the regular count
        assert_eq!(party.now.borrow().last().unwrap().particle_count, 120);
    }

    #[test]
    fn missing_celebrator_does_not_block_scratching() {
        let party = Party::default();
        let mut e = engine(25.0, party.clone(), None);
        let p = e.pointer_down(Point::new(5.0, 5.0));
        assert_eq!(p.burst, Some(1));
        assert!(party.now.borrow().is_empty());
        assert!(e.pointer_move(Point::new(6.0, 5.0)).burst.is_some());
        assert!(e.celebrator_missing_logged);
        let queued = e.take_celebrations();
        assert!(queued.is_empty());
        queued.fire();
        assert!(party.now.borrow().is_empty());
    }

    #[test]
    fn failed_draw_rolls_session_back() {
        let mut e = engine(10.0, live_party(), None);
        e.pointer_down(Point::new(1.0, 1.0));
        let area = e.session().erased_area();
        e.cover.fail = true;
        let p = e.pointer_move(Point::new(2.0, 2.0));
        assert_eq!(p, Progress::default());
        assert_eq!(e.session().erased_area(), area);
        assert_eq!(e.session().last_point(), Some(Point::new(1.0, 1.0)));

        e.cover.fail = false;
        e.pointer_move(Point::new(3.0, 3.0));
        assert!(e.session().erased_area() > area);
    }

    #[test]
    fn failed_gap_segment_still_counts_the_disc() {
        let mut e = engine(20.0, live_party(), None);
        e.cover.fail_segments = true;
        e.pointer_down(Point::new(10.0, 10.0));
        for i in 1..=10 {
            e.pointer_move(Point::new(10.0 + i as f64 * 5.0, 10.0));
        }
        let discs = e.cover().ops.iter().filter(|op| matches!(op, Op::Disc(..))).count();
        assert_eq!(discs, 11);
        let nominal = std::f64::consts::PI * 400.0;
        assert!((e.session().erased_area() - 11.0 * nominal).abs() < 1e-6);
        assert_eq!(e.session().last_point(), Some(Point::new(60.0, 10.0)));
    }

    #[test]
    fn late_cover_is_refused_once_revealed() {
        let mut e = engine(40.0, live_party(), None);
        assert!(e.accepts_cover_paint());
        e.pointer_down(Point::new(0.0, 0.0));
        while !e.pointer_move(Point::new(5.0, 5.0)).revealed {}
        assert!(!e.accepts_cover_paint());
    }

    #[test]
    fn sound_does_not_overlap_and_loops_while_scratching() {
        let speaker = Speaker::default();
        let mut e = engine(5.0, live_party(), Some(speaker.clone()));
        e.pointer_down(Point::new(1.0, 1.0));
        assert_eq!(speaker.plays.get(), 1);

        // a new stroke while still playing must not restart the cue
        e.pointer_up();
        e.pointer_down(Point::new(2.0, 2.0));
        assert_eq!(speaker.plays.get(), 1);

        // ended while still holding the pointer: loop
        e.sound_ended();
        assert_eq!(speaker.plays.get(), 2);

        // ended after release: stop, next stroke plays again
        e.pointer_up();
        e.sound_ended();
        assert_eq!(speaker.plays.get(), 2);
        assert!(!e.sound_gate().is_playing());
        e.pointer_down(Point::new(3.0, 3.0));
        assert_eq!(speaker.plays.get(), 3);
    }

    #[test]
    fn refused_sound_leaves_scratching_intact() {
        let speaker = Speaker { refuse: true, ..Speaker::default() };
        let mut e = engine(5.0, live_party(), Some(speaker));
        e.pointer_down(Point::new(1.0, 1.0));
        assert!(!e.sound_gate().is_playing());
        assert!(e.session().erased_area() > 0.0);

        let mut e = engine(5.0, live_party(), Some(Speaker::default()));
        e.pointer_down(Point::new(1.0, 1.0));
        e.sound_rejected("NotAllowedError");
        assert!(!e.sound_gate().is_playing());
    }

    #[test]
    fn cover_state_starts_loading() {
        let mut e = engine(5.0, live_party(), None);
        assert_eq!(e.cover_state(), CoverState::Loading);
        // erasing before the cover paints is accepted
        e.pointer_down(Point::new(1.0, 1.0));
        assert_eq!(e.cover().ops.len(), 1);
        e.set_cover_state(CoverState::Failed);
        assert_eq!(e.cover_state(), CoverState::Failed);
    }
}
