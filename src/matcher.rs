use rand::seq::SliceRandom;
use rand::Rng;

/// Outcome of matching one keystroke against the target word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Mismatched,
    Completed,
}

/// Target word and the prefix of it typed so far.
///
/// `typed_prefix` is always a prefix of the target; it only grows one
/// accepted character at a time and is cleared when the target changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordMatcher {
    target: Option<String>,
    typed: String,
}

impl WordMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn typed_prefix(&self) -> &str {
        &self.typed
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.target.as_deref() == Some(self.typed.as_str())
    }

    pub fn set_target(&mut self, target: impl Into<String>) {
        self.target = Some(target.into());
        self.typed.clear();
    }

    /// Pick a new target different from the current one and reset the prefix.
    /// Returns `None` (leaving state untouched) when the pool has no word
    /// other than the current target.
    pub fn choose_next_target<R: Rng + ?Sized>(
        &mut self,
        pool: &[String],
        rng: &mut R,
    ) -> Option<&str> {
        let next = pick_candidate(pool, self.target(), rng)?.to_string();
        self.set_target(next);
        self.target()
    }

    /// Match `c` (case-folded) as the next character of the target.
    pub fn submit_char(&mut self, c: char) -> Verdict {
        let Some(target) = self.target.as_deref() else {
            return Verdict::Mismatched;
        };

        let mut attempt = self.typed.clone();
        attempt.extend(c.to_lowercase());

        if !target.starts_with(&attempt) {
            return Verdict::Mismatched;
        }

        self.typed = attempt;
        if self.typed == target {
            Verdict::Completed
        } else {
            Verdict::Accepted
        }
    }
}

/// Uniform pick over the entries of `pool` that differ from `previous`.
pub fn pick_candidate<'a, R: Rng + ?Sized>(
    pool: &'a [String],
    previous: Option<&str>,
    rng: &mut R,
) -> Option<&'a str> {
    let candidates: Vec<&String> = pool
        .iter()
        .filter(|w| Some(w.as_str()) != previous)
        .collect();
    candidates.choose(rng).copied().map(String::as_str)
}
