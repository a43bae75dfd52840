use crate::assets::{Frame, SpriteSet};
use tracing::trace;

/// Animation state of the actor. Discriminants index the sprite set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ActorState {
    Idle = 0,
    Move = 1,
    Kick = 2,
}

impl ActorState {
    pub const ALL: [ActorState; 3] = [ActorState::Idle, ActorState::Move, ActorState::Kick];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Position in arena units (the arena is 1024x768 by default).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Linear interpolation, `t` clamped to `0..=1`.
    pub fn lerp(self, to: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }
}

/// What happens when a transition runs to its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Take another step in the same direction if still in `Move`.
    ContinueMove { dx: i32, dy: i32 },
    ReturnToIdle,
}

/// A bounded, cancellable change of position over a fixed number of frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: Position,
    pub to: Position,
    pub start_frame: u64,
    pub duration_frames: u64,
    pub on_finished: Completion,
}

impl Transition {
    fn progress(&self, frame_number: u64) -> f64 {
        let elapsed = frame_number.saturating_sub(self.start_frame);
        elapsed as f64 / self.duration_frames.max(1) as f64
    }

    pub fn position_at(&self, frame_number: u64) -> Position {
        self.from.lerp(self.to, self.progress(frame_number))
    }

    pub fn is_finished(&self, frame_number: u64) -> bool {
        frame_number >= self.start_frame + self.duration_frames.max(1)
    }
}

/// Timing knobs for the actor, all in frames of the game clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub fps: u32,
    /// Multiplier on sprite cycling speed, independent of movement.
    pub animation_speed: f64,
    /// Arena units moved per unit of `dx`/`dy` in one step.
    pub step_multiplier: f64,
    pub step_frames: u64,
    pub kick_frames: u64,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            fps: 60,
            animation_speed: 2.0,
            step_multiplier: 5.0,
            step_frames: 6,
            kick_frames: 60,
        }
    }
}

/// The on-screen character: position, facing, animation state and at most
/// one in-flight transition.
#[derive(Debug, Clone)]
pub struct AnimatedActor {
    sprites: SpriteSet,
    motion: Motion,
    position: Position,
    facing: Facing,
    state: ActorState,
    transition: Option<Transition>,
    frame_number: u64,
    image: usize,
}

impl AnimatedActor {
    pub fn new(sprites: SpriteSet, motion: Motion, position: Position) -> Self {
        Self {
            sprites,
            motion,
            position,
            facing: Facing::Right,
            state: ActorState::Idle,
            transition: None,
            frame_number: 0,
            image: 0,
        }
    }

    pub fn sprites(&self) -> &SpriteSet {
        &self.sprites
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn state(&self) -> ActorState {
        self.state
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    /// Index into the current state's frame list chosen by the last `update`.
    pub fn image_index(&self) -> usize {
        self.image
    }

    /// Sprite frame to draw, as chosen by the last `update`.
    pub fn current_frame(&self) -> Option<&Frame> {
        let frames = self.sprites.frames(self.state);
        frames.get(self.image).or_else(|| frames.first())
    }

    pub fn set_state(&mut self, state: ActorState) {
        self.state = state;
    }

    /// Drop any transition and place the actor at `position`.
    pub fn snap_to(&mut self, position: Position) {
        self.cancel();
        self.position = position;
    }

    /// Walk in steps of `(dx, dy) * step_multiplier` until the state leaves `Move`.
    pub fn start_move(&mut self, dx: i32, dy: i32) {
        self.set_state(ActorState::Move);
        if dx != 0 {
            self.facing = if dx < 0 { Facing::Left } else { Facing::Right };
        }
        self.step(dx, dy);
    }

    /// Kick in place; returns to `Idle` once the kick has run its course.
    pub fn kick(&mut self) {
        self.set_state(ActorState::Kick);
        self.begin(self.position, self.motion.kick_frames, Completion::ReturnToIdle);
    }

    pub fn idle(&mut self) {
        self.cancel();
        self.set_state(ActorState::Idle);
    }

    /// Frame to display for `frame_counter`:
    /// `floor(speed * frame_counter / fps * len) mod len`.
    pub fn frame_index(&self, frame_counter: u32) -> usize {
        let len = self.sprites.animation_length(self.state);
        if len == 0 {
            return 0;
        }
        let raw = self.motion.animation_speed * f64::from(frame_counter)
            / f64::from(self.motion.fps.max(1))
            * len as f64;
        (raw.floor() as usize) % len
    }

    /// Move the active transition to `frame_number`, running its completion
    /// if it has ended. Returns the completion that ran.
    pub fn advance(&mut self, frame_number: u64) -> Option<Completion> {
        self.frame_number = frame_number;
        let transition = self.transition?;
        self.position = transition.position_at(frame_number);
        if !transition.is_finished(frame_number) {
            return None;
        }

        self.transition = None;
        match transition.on_finished {
            Completion::ContinueMove { dx, dy } => {
                if self.state == ActorState::Move {
                    self.step(dx, dy);
                }
            }
            Completion::ReturnToIdle => self.set_state(ActorState::Idle),
        }
        Some(transition.on_finished)
    }

    /// Per-frame update: advance the transition, then pick the sprite frame.
    pub fn update(&mut self, frame_counter: u32, frame_number: u64) -> Option<Completion> {
        let finished = self.advance(frame_number);
        self.image = self.frame_index(frame_counter);
        finished
    }

    fn step(&mut self, dx: i32, dy: i32) {
        let k = self.motion.step_multiplier;
        let to = self.position.offset(f64::from(dx) * k, f64::from(dy) * k);
        self.begin(to, self.motion.step_frames, Completion::ContinueMove { dx, dy });
    }

    fn begin(&mut self, to: Position, duration_frames: u64, on_finished: Completion) {
        self.cancel();
        self.transition = Some(Transition {
            from: self.position,
            to,
            start_frame: self.frame_number,
            duration_frames,
            on_finished,
        });
    }

    fn cancel(&mut self) {
        if let Some(dropped) = self.transition.take() {
            trace!(completion = ?dropped.on_finished, "transition cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sprites(idle: usize, moving: usize, kick: usize) -> SpriteSet {
        let frames = |state: &str, n: usize| {
            (0..n)
                .map(|i| Frame::new(format!("test_{state}_{i}"), vec![format!("{state}{i}")]))
                .collect::<Vec<_>>()
        };
        SpriteSet::new(
            "test",
            frames("idle", idle),
            frames("move", moving),
            frames("kick", kick),
        )
        .unwrap()
    }

    fn actor() -> AnimatedActor {
        AnimatedActor::new(sprites(4, 4, 3), Motion::default(), Position::new(64.0, 384.0))
    }

    fn run(actor: &mut AnimatedActor, from: u64, frames: u64) -> Vec<Completion> {
        (from + 1..=from + frames)
            .filter_map(|f| actor.advance(f))
            .collect()
    }

    #[test]
    fn test_frame_index_formula() {
        let actor = actor();
        assert_eq!(actor.state(), ActorState::Idle);
        // floor(2 * 30 / 60 * 4) mod 4 == 0
        assert_eq!(actor.frame_index(30), 0);
        assert_eq!(actor.frame_index(0), 0);
        assert_eq!(actor.frame_index(8), 1);
        assert_eq!(actor.frame_index(15), 2);
        assert_eq!(actor.frame_index(59), 3);
    }

    #[test]
    fn test_frame_index_uses_state_length() {
        let mut actor = actor();
        actor.set_state(ActorState::Kick);
        // floor(2 * 25 / 60 * 3) = 2
        assert_eq!(actor.frame_index(25), 2);
        assert_eq!(actor.frame_index(30), 0);
    }

    #[test]
    fn test_animation_speed_is_configurable() {
        let motion = Motion {
            animation_speed: 1.0,
            ..Motion::default()
        };
        let actor = AnimatedActor::new(sprites(4, 4, 3), motion, Position::default());
        assert_eq!(actor.frame_index(30), 2);
    }

    #[test]
    fn test_set_state_keeps_position_and_facing() {
        let mut actor = actor();
        actor.start_move(-1, 0);
        let before = actor.position();
        actor.set_state(ActorState::Kick);
        assert_eq!(actor.position(), before);
        assert_eq!(actor.facing(), Facing::Left);
    }

    #[test]
    fn test_move_steps_and_rearms() {
        let mut actor = actor();
        actor.start_move(5, 0);
        assert_eq!(actor.state(), ActorState::Move);

        let done = run(&mut actor, 0, 3);
        assert!(done.is_empty());
        assert!((actor.position().x - 76.5).abs() < 1e-9);

        let done = run(&mut actor, 3, 3);
        assert_eq!(done, vec![Completion::ContinueMove { dx: 5, dy: 0 }]);
        assert!((actor.position().x - 89.0).abs() < 1e-9);
        assert!(actor.transition().is_some(), "step should re-arm");

        run(&mut actor, 6, 6);
        assert!((actor.position().x - 114.0).abs() < 1e-9);
        assert_eq!(actor.position().y, 384.0);
    }

    #[test]
    fn test_move_sets_facing_only_for_horizontal_motion() {
        let mut actor = actor();
        actor.start_move(-1, 0);
        assert_eq!(actor.facing(), Facing::Left);
        actor.start_move(0, 1);
        assert_eq!(actor.facing(), Facing::Left);
        actor.start_move(1, 1);
        assert_eq!(actor.facing(), Facing::Right);
    }

    #[test]
    fn test_idle_cancels_and_keeps_partial_position() {
        let mut actor = actor();
        actor.start_move(5, 0);
        run(&mut actor, 0, 3);
        actor.idle();

        assert_eq!(actor.state(), ActorState::Idle);
        assert!(actor.transition().is_none());
        let x = actor.position().x;
        assert!(run(&mut actor, 3, 20).is_empty());
        assert_eq!(actor.position().x, x);
    }

    #[test]
    fn test_kick_returns_to_idle_without_visiting_move() {
        let mut actor = actor();
        actor.kick();
        let mut seen = Vec::new();
        let mut done = Vec::new();
        for f in 1..=60 {
            done.extend(actor.advance(f));
            seen.push(actor.state());
        }
        assert_eq!(done, vec![Completion::ReturnToIdle]);
        assert_eq!(actor.state(), ActorState::Idle);
        assert!(!seen.contains(&ActorState::Move));
        assert_eq!(actor.position(), Position::new(64.0, 384.0));
    }

    #[test]
    fn test_second_kick_restarts_bound() {
        let mut actor = actor();
        actor.kick();
        run(&mut actor, 0, 40);
        actor.kick();
        assert!(run(&mut actor, 40, 59).is_empty());
        assert_eq!(actor.state(), ActorState::Kick);
        assert_eq!(run(&mut actor, 99, 1), vec![Completion::ReturnToIdle]);
    }

    #[test]
    fn test_kick_replaces_move() {
        let mut actor = actor();
        actor.start_move(5, 0);
        run(&mut actor, 0, 2);
        actor.kick();

        let done = run(&mut actor, 2, 120);
        assert_eq!(done, vec![Completion::ReturnToIdle]);
        assert_eq!(actor.state(), ActorState::Idle);
    }

    #[test]
    fn test_update_selects_image() {
        let mut actor = actor();
        actor.update(15, 1);
        assert_eq!(actor.image_index(), 2);
        assert_matches!(actor.current_frame(), Some(frame) if frame.id() == "test_idle_2");
    }

    #[test]
    fn test_snap_to_drops_transition() {
        let mut actor = actor();
        actor.start_move(5, 0);
        actor.snap_to(Position::new(10.0, 20.0));
        assert!(actor.transition().is_none());
        run(&mut actor, 0, 10);
        assert_eq!(actor.position(), Position::new(10.0, 20.0));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(ActorState::Idle.to_string(), "idle");
        assert_eq!(ActorState::Move.to_string(), "move");
        assert_eq!(ActorState::Kick.to_string(), "kick");
    }
}
