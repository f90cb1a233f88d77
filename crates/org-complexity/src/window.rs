use std::collections::VecDeque;

/// Default number of outcomes a [`SuccessWindow`] remembers.
pub const DEFAULT_WINDOW: usize = 20;

/// Rolling record of an agent's most recent execution outcomes.
///
/// Owned by whoever routes feedback back to the agent; the controller only
/// reads the rate.
#[derive(Clone, Debug)]
pub struct SuccessWindow {
    outcomes: VecDeque<bool>,
    capacity: usize,
}

impl SuccessWindow {
    /// A window holding at most `capacity` outcomes (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { outcomes: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn record(&mut self, success: bool) {
        if self.outcomes.len() == self.capacity {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(success);
    }

    /// Fraction of successes, or `None` before the first outcome.
    pub fn rate(&self) -> Option<f64> {
        if self.outcomes.is_empty() {
            return None;
        }
        let wins = self.outcomes.iter().filter(|&&ok| ok).count();
        Some(wins as f64 / self.outcomes.len() as f64)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn clear(&mut self) {
        self.outcomes.clear();
    }
}

impl Default for SuccessWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
