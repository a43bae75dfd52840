/// Slack for comparing accumulated frame deltas against a deadline, so that
/// sixty ticks of 1/60 s reach a 1 s deadline on the sixtieth tick.
const DUE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
struct Entry<E> {
    /// Registration order, breaks ties between equal deadlines.
    seq: u64,
    fire_at: f64,
    delay: f64,
    recurring: bool,
    payload: E,
}

/// Cooperative single-threaded timer driven by the frame clock.
///
/// `tick` hands back the payloads that came due; the caller dispatches them.
/// Anything scheduled while dispatching is only eligible from the next tick,
/// so a zero-delay reschedule never fires twice in one frame. Recurring
/// events are re-enrolled at `fire_at + delay` when drained, which keeps them
/// on a fixed cadence regardless of dispatch cost.
#[derive(Debug, Clone)]
pub struct Scheduler<E> {
    now: f64,
    /// Running compensation for the low-order bits lost when adding frame
    /// deltas to `now`, so the clock stays on exact frame multiples.
    carry: f64,
    next_seq: u64,
    entries: Vec<Entry<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self {
            now: 0.0,
            carry: 0.0,
            next_seq: 0,
            entries: Vec::new(),
        }
    }
}

impl<E: Clone> Scheduler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logical time in seconds.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn schedule_once(&mut self, delay_secs: f64, payload: E) {
        self.enroll(delay_secs, payload, false);
    }

    pub fn schedule_recurring(&mut self, delay_secs: f64, payload: E) {
        self.enroll(delay_secs, payload, true);
    }

    /// Drop every pending event; the clock keeps running.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Advance logical time and return due payloads in `fire_at` order
    /// (registration order on ties).
    pub fn tick(&mut self, delta_secs: f64) -> Vec<E> {
        self.advance_clock(delta_secs);
        let deadline = self.now + DUE_EPSILON;

        let (mut due, pending): (Vec<_>, Vec<_>) = self
            .entries
            .drain(..)
            .partition(|e| e.fire_at <= deadline);
        self.entries = pending;
        due.sort_by(|a, b| a.fire_at.total_cmp(&b.fire_at).then(a.seq.cmp(&b.seq)));

        due.into_iter()
            .map(|entry| {
                if entry.recurring {
                    self.entries.push(Entry {
                        fire_at: entry.fire_at + entry.delay,
                        ..entry.clone()
                    });
                }
                entry.payload
            })
            .collect()
    }

    // Kahan summation
    fn advance_clock(&mut self, delta_secs: f64) {
        let y = delta_secs - self.carry;
        let t = self.now + y;
        self.carry = (t - self.now) - y;
        self.now = t;
    }

    fn enroll(&mut self, delay_secs: f64, payload: E, recurring: bool) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry {
            seq,
            fire_at: self.now + delay_secs.max(0.0),
            delay: delay_secs.max(0.0),
            recurring,
            payload,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f64 = 1.0 / 60.0;

    fn run_frames<E: Clone>(s: &mut Scheduler<E>, frames: usize) -> Vec<E> {
        (0..frames).flat_map(|_| s.tick(FRAME)).collect()
    }

    #[test]
    fn test_one_shot_fires_once_on_deadline_frame() {
        let mut s = Scheduler::new();
        s.schedule_once(1.0, "word");

        assert!(run_frames(&mut s, 59).is_empty());
        assert_eq!(s.tick(FRAME), vec!["word"]);
        assert!(s.is_empty());
        assert!(run_frames(&mut s, 120).is_empty());
    }

    #[test]
    fn test_due_events_come_back_in_fire_at_order() {
        let mut s = Scheduler::new();
        s.schedule_once(0.3, "c");
        s.schedule_once(0.1, "a");
        s.schedule_once(0.2, "b");
        s.schedule_once(0.2, "b2");

        assert_eq!(s.tick(0.5), vec!["a", "b", "b2", "c"]);
    }

    #[test]
    fn test_zero_delay_scheduled_during_dispatch_waits_for_next_tick() {
        let mut s = Scheduler::new();
        s.schedule_once(0.0, "parent");

        let fired = s.tick(FRAME);
        assert_eq!(fired, vec!["parent"]);
        for _ in fired {
            s.schedule_once(0.0, "child");
        }
        assert_eq!(s.len(), 1);

        assert_eq!(s.tick(FRAME), vec!["child"]);
    }

    #[test]
    fn test_recurring_keeps_cadence_without_drift() {
        let mut s = Scheduler::new();
        s.schedule_recurring(1.0, 1u32);

        let mut firings = Vec::new();
        for frame in 1..=600 {
            if !s.tick(FRAME).is_empty() {
                firings.push(frame);
            }
        }
        assert_eq!(firings, (1..=10).map(|n| n * 60).collect::<Vec<_>>());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_recurring_catches_up_one_firing_per_tick() {
        let mut s = Scheduler::new();
        s.schedule_recurring(1.0, ());

        assert_eq!(s.tick(3.5).len(), 1);
        assert_eq!(s.tick(0.0).len(), 1);
        assert_eq!(s.tick(0.0).len(), 1);
        assert_eq!(s.tick(0.0).len(), 0);
    }

    #[test]
    fn test_recurring_stays_frame_exact_over_hours() {
        let mut s = Scheduler::new();
        s.schedule_recurring(1.0, ());

        let frames_per_run = 10 * 60 * 60 * 60u64;
        let off_cadence: Vec<u64> = (1..=frames_per_run)
            .filter(|frame| s.tick(FRAME).is_empty() == (frame % 60 == 0))
            .collect();
        assert!(off_cadence.is_empty(), "first off-cadence frame: {:?}", off_cadence.first());
        assert!((s.now() - 36_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_clear_keeps_clock() {
        let mut s = Scheduler::new();
        s.schedule_recurring(1.0, "tick");
        s.tick(0.25);
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.now(), 0.25);
        assert!(s.tick(5.0).is_empty());
    }
}
