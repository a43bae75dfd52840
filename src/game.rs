//! The per-frame driver tying the actor, the word matcher and the scheduler
//! together.
//!
//! One [`Game`] owns one [`Session`]. Every frame the host calls
//! [`Game::on_frame`]; keyboard input arrives through [`Game::on_key_down`]
//! and [`Game::on_key_up`]. Timed work (the elapsed-time clock, choosing the
//! next word, the victory loop) goes through the scheduler as [`TimerEvent`]s
//! so everything advances on the same logical clock.

use crate::actor::{AnimatedActor, Motion, Position};
use crate::assets::SpriteSet;
use crate::config::Config;
use crate::matcher::{Verdict, WordMatcher};
use crate::scheduler::Scheduler;
use crate::speech::Speaker;
use crate::words::WordList;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace, warn};

pub const VICTORY_BANNER: &str = "VICTORY!";

/// The playing field in arena units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
    pub start: Position,
    /// Completing a word at or past this x wins the race.
    pub goal_x: f64,
}

impl Default for Arena {
    fn default() -> Self {
        let (width, height) = (1024.0, 768.0);
        Self {
            width,
            height,
            start: Position::new(width / 16.0, height / 2.0),
            goal_x: width * 7.0 / 8.0,
        }
    }
}

/// Delays in seconds of the game clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timings {
    pub fps: u32,
    pub first_word_delay: f64,
    pub clock_interval: f64,
    pub next_word_delay: f64,
    pub celebrate_interval: f64,
    /// `dx` handed to `start_move` after each completed word.
    pub forward_step: i32,
}

impl Default for Timings {
    fn default() -> Self {
        Config::default().timings()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    ElapsedClock,
    NextWord,
    Celebrate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No target word yet.
    Waiting,
    Typing,
    /// Goal reached. Only a restart leaves this phase.
    Celebrating,
}

/// Everything that changes while a race is played.
#[derive(Debug, Clone)]
pub struct Session {
    pub actor: AnimatedActor,
    pub matcher: WordMatcher,
    pub elapsed_secs: u64,
    /// Frame number modulo fps, drives sprite cycling.
    pub frame_counter: u32,
    /// Frames since the session started, drives transitions.
    pub frame_number: u64,
    pub phase: Phase,
    pub banner: Option<&'static str>,
}

impl Session {
    pub fn new(sprites: SpriteSet, motion: Motion, start: Position) -> Self {
        Self {
            actor: AnimatedActor::new(sprites, motion, start),
            matcher: WordMatcher::new(),
            elapsed_secs: 0,
            frame_counter: 0,
            frame_number: 0,
            phase: Phase::Waiting,
            banner: None,
        }
    }

    /// The word shown as the target: the victory banner once it is up.
    pub fn display_target(&self) -> Option<&str> {
        self.banner.or_else(|| self.matcher.target())
    }
}

pub struct Game {
    session: Session,
    scheduler: Scheduler<TimerEvent>,
    words: WordList,
    speaker: Box<dyn Speaker>,
    rng: StdRng,
    arena: Arena,
    timings: Timings,
    motion: Motion,
}

impl Game {
    pub fn new(config: &Config, sprites: SpriteSet, words: WordList, speaker: Box<dyn Speaker>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let arena = Arena::default();
        let motion = config.motion();

        let mut game = Self {
            session: Session::new(sprites, motion, arena.start),
            scheduler: Scheduler::new(),
            words,
            speaker,
            rng,
            arena,
            timings: config.timings(),
            motion,
        };
        game.schedule_startup();
        game
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    #[cfg(test)]
    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn scheduler(&self) -> &Scheduler<TimerEvent> {
        &self.scheduler
    }

    pub fn words(&self) -> &WordList {
        &self.words
    }

    /// Advance one frame: actor first, then due timers.
    pub fn on_frame(&mut self) {
        let fps = self.timings.fps.max(1);
        let session = &mut self.session;
        session.frame_counter = (session.frame_counter + 1) % fps;
        session.frame_number += 1;

        if let Some(done) = session
            .actor
            .update(session.frame_counter, session.frame_number)
        {
            trace!(frame = session.frame_number, completion = ?done, "transition finished");
        }

        for event in self.scheduler.tick(1.0 / f64::from(fps)) {
            self.dispatch(event);
        }
    }

    /// Feed one typed character. `None` when there is no target yet.
    ///
    /// After a win the finished word stays the target, so every further
    /// keystroke is a mismatch and kicks; it never leaves `Celebrating`.
    pub fn on_key_down(&mut self, c: char) -> Option<Verdict> {
        if !self.session.matcher.has_target() {
            return None;
        }

        let verdict = self.session.matcher.submit_char(c);
        trace!(key = %c, ?verdict, typed = self.session.matcher.typed_prefix(), "keystroke");
        match verdict {
            Verdict::Mismatched => self.session.actor.kick(),
            Verdict::Accepted => {}
            Verdict::Completed => self.complete_word(),
        }
        Some(verdict)
    }

    /// Any key release stops the actor, celebration included.
    pub fn on_key_up(&mut self) {
        self.session.actor.idle();
    }

    /// Start a fresh race: new session, pending timers dropped and the
    /// startup timers re-armed.
    pub fn restart(&mut self) {
        info!(elapsed_secs = self.session.elapsed_secs, "restarting race");
        let sprites = self.session.actor.sprites().clone();
        self.session = Session::new(sprites, self.motion, self.arena.start);
        self.scheduler.clear();
        self.schedule_startup();
    }

    fn schedule_startup(&mut self) {
        self.scheduler
            .schedule_recurring(self.timings.clock_interval, TimerEvent::ElapsedClock);
        self.scheduler
            .schedule_once(self.timings.first_word_delay, TimerEvent::NextWord);
    }

    fn dispatch(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::ElapsedClock => self.session.elapsed_secs += 1,
            TimerEvent::NextWord => self.next_word(),
            TimerEvent::Celebrate => self.celebrate(),
        }
    }

    fn complete_word(&mut self) {
        let actor = &mut self.session.actor;
        if actor.position().x >= self.arena.goal_x {
            actor.snap_to(self.arena.start);
            self.session.phase = Phase::Celebrating;
            info!(elapsed_secs = self.session.elapsed_secs, "goal reached");
            self.scheduler
                .schedule_once(self.timings.celebrate_interval, TimerEvent::Celebrate);
        } else {
            actor.start_move(self.timings.forward_step, 0);
            self.scheduler
                .schedule_once(self.timings.next_word_delay, TimerEvent::NextWord);
        }
    }

    fn next_word(&mut self) {
        if self.session.phase == Phase::Celebrating {
            debug!("race already won, not choosing another word");
            return;
        }

        let chosen = self
            .session
            .matcher
            .choose_next_target(self.words.words(), &mut self.rng)
            .map(str::to_string);
        match chosen {
            Some(word) => {
                debug!(%word, "new target");
                self.session.phase = Phase::Typing;
                self.speaker.speak(&word);
            }
            None => warn!("word list has no alternative to the current target"),
        }
    }

    fn celebrate(&mut self) {
        self.session.banner = Some(VICTORY_BANNER);
        let dx = self.rng.gen_range(-1..=1);
        let dy = self.rng.gen_range(-1..=1);
        self.session.actor.start_move(dx, dy);
        self.scheduler
            .schedule_once(self.timings.celebrate_interval, TimerEvent::Celebrate);
    }
}
