use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Unified event type consumed by the game runner
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    KeyDown(char),
    KeyUp,
    Restart,
    Quit,
    Resize,
    Tick,
}

/// Map a terminal key event onto a game event. Auto-repeat is dropped so a
/// held key counts once on terminals that report repeats.
pub fn translate_key(key: KeyEvent) -> Option<GameEvent> {
    match key.kind {
        KeyEventKind::Release => return Some(GameEvent::KeyUp),
        KeyEventKind::Repeat => return None,
        KeyEventKind::Press => {}
    }
    match key.code {
        KeyCode::Esc => Some(GameEvent::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(GameEvent::Quit)
        }
        KeyCode::Left => Some(GameEvent::Restart),
        KeyCode::Char(c) => Some(GameEvent::KeyDown(c)),
        _ => None,
    }
}

/// Source of game input (keyboard, resize, etc.)
pub trait GameEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Production event source reading the terminal through crossterm
pub struct CrosstermEventSource {
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || loop {
            let translated = match event::read() {
                Ok(CtEvent::Key(key)) => translate_key(key),
                Ok(CtEvent::Resize(_, _)) => Some(GameEvent::Resize),
                Ok(_) => None,
                Err(_) => break,
            };
            if let Some(ev) = translated {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_fps(fps: u32) -> Self {
        Self::new(Duration::from_secs(1) / fps.max(1))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl GameEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that interleaves input events with ticks on a fixed schedule.
///
/// Ticks are due at absolute deadlines, so input arriving between frames does
/// not push the next frame back. A runner that fell behind resumes from now
/// instead of replaying missed ticks.
pub struct Runner<E: GameEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Instant,
}

impl<E: GameEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Instant::now() + ticker.interval();
        Self {
            event_source,
            ticker,
            next_tick,
        }
    }

    /// Blocks until the next event or the next tick deadline, whichever is first
    pub fn step(&mut self) -> GameEvent {
        loop {
            let now = Instant::now();
            if now >= self.next_tick {
                let interval = self.ticker.interval();
                self.next_tick += interval;
                if self.next_tick < now {
                    self.next_tick = now + interval;
                }
                return GameEvent::Tick;
            }

            let wait = self.next_tick - now;
            match self.event_source.recv_timeout(wait) {
                Ok(ev) => return ev,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => thread::sleep(wait),
            }
        }
    }
}

/// Emulated key release for terminals that only report presses.
///
/// Each press re-arms the release `hold_frames` frames later; polling on or
/// after that frame reports the release once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticRelease {
    hold_frames: u64,
    due: Option<u64>,
}

impl SyntheticRelease {
    pub fn new(hold_frames: u64) -> Self {
        Self {
            hold_frames,
            due: None,
        }
    }

    pub fn arm(&mut self, frame: u64) {
        self.due = Some(frame + self.hold_frames);
    }

    pub fn disarm(&mut self) {
        self.due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.due.is_some()
    }

    pub fn poll(&mut self, frame: u64) -> bool {
        match self.due {
            Some(due) if frame >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let mut runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        assert_eq!(runner.step(), GameEvent::Tick);
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(GameEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let mut runner = Runner::new(es, ticker);

        assert_eq!(runner.step(), GameEvent::Resize);
    }

    #[test]
    fn step_ticks_after_sender_is_gone() {
        let (tx, rx) = mpsc::channel::<GameEvent>();
        drop(tx);
        let mut runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(2)));

        let started = Instant::now();
        for _ in 0..3 {
            assert_eq!(runner.step(), GameEvent::Tick);
        }
        assert!(started.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn events_do_not_delay_ticks() {
        let (tx, rx) = mpsc::channel();
        let mut runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));
        for c in "abc".chars() {
            tx.send(GameEvent::KeyDown(c)).unwrap();
        }

        let seen: Vec<_> = (0..4).map(|_| runner.step()).collect();
        assert_eq!(
            seen,
            vec![
                GameEvent::KeyDown('a'),
                GameEvent::KeyDown('b'),
                GameEvent::KeyDown('c'),
                GameEvent::Tick,
            ]
        );
    }

    #[test]
    fn from_fps_interval() {
        assert_eq!(FixedTicker::from_fps(50).interval(), Duration::from_millis(20));
        assert_eq!(FixedTicker::from_fps(0).interval(), Duration::from_secs(1));
    }

    #[test]
    fn translate_presses() {
        let press = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(translate_key(press(KeyCode::Char('a'))), Some(GameEvent::KeyDown('a')));
        assert_eq!(translate_key(press(KeyCode::Char('A'))), Some(GameEvent::KeyDown('A')));
        assert_eq!(translate_key(press(KeyCode::Esc)), Some(GameEvent::Quit));
        assert_eq!(translate_key(press(KeyCode::Left)), Some(GameEvent::Restart));
        assert_eq!(translate_key(press(KeyCode::Enter)), None);
        assert_eq!(
            translate_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(GameEvent::Quit)
        );
    }

    #[test]
    fn translate_release_and_repeat() {
        let with_kind = |kind| KeyEvent::new_with_kind(KeyCode::Char('x'), KeyModifiers::NONE, kind);
        assert_eq!(translate_key(with_kind(KeyEventKind::Release)), Some(GameEvent::KeyUp));
        assert_matches!(translate_key(with_kind(KeyEventKind::Repeat)), None);
    }

    #[test]
    fn synthetic_release_fires_once_after_hold() {
        let mut release = SyntheticRelease::new(18);
        assert!(!release.poll(100));

        release.arm(10);
        assert!(release.is_armed());
        assert!(!release.poll(27));
        assert!(release.poll(28));
        assert!(!release.poll(29));
        assert!(!release.is_armed());
    }

    #[test]
    fn synthetic_release_rearms_on_each_press() {
        let mut release = SyntheticRelease::new(18);
        release.arm(10);
        release.arm(20);
        assert!(!release.poll(28));
        assert!(release.poll(38));

        release.arm(40);
        release.disarm();
        assert!(!release.poll(1000));
    }
}
