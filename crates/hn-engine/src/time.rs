//! Cooperative wall clock budget for a single execution.

use std::time::{Duration, Instant};

/// Deadline store owned by one execution context.
///
/// Algorithms are expected to poll [`TimeBudget::time_is_up`] and stop on
/// their own; nothing is interrupted when the deadline passes.
#[derive(Debug, Clone, Default)]
pub struct TimeBudget {
    started: Option<Instant>,
    deadline: Option<Instant>,
}

impl TimeBudget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting down `budget` from now, replacing any previous budget.
    pub fn start(&mut self, budget: Duration) {
        let now = Instant::now();
        self.started = Some(now);
        self.deadline = Some(now + budget);
    }

    pub fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until the deadline, negative once it has passed.
    /// `None` when no budget is running.
    pub fn remaining(&self) -> Option<chrono::Duration> {
        let deadline = self.deadline?;
        let now = Instant::now();
        let remaining = if now <= deadline {
            chrono::Duration::from_std(deadline - now).unwrap_or(chrono::Duration::MAX)
        } else {
            -chrono::Duration::from_std(now - deadline).unwrap_or(chrono::Duration::MAX)
        };
        Some(remaining)
    }

    /// Time elapsed since [`start`](Self::start).
    pub fn elapsed(&self) -> Option<Duration> {
        self.started.map(|started| started.elapsed())
    }

    /// Always `false` when no budget is running.
    pub fn time_is_up(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    /// True when the deadline was missed by more than `grace`.
    pub fn overrun_exceeds(&self, grace: Duration) -> bool {
        match (self.remaining(), chrono::Duration::from_std(grace)) {
            (Some(remaining), Ok(grace)) => remaining < -grace,
            _ => false,
        }
    }

    pub fn remove(&mut self) {
        self.started = None;
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_budget_never_expires() {
        let budget = TimeBudget::new();
        assert!(!budget.is_active());
        assert!(!budget.time_is_up());
        assert!(budget.remaining().is_none());
        assert!(!budget.overrun_exceeds(Duration::ZERO));
    }

    #[test]
    fn remaining_is_positive_while_running() {
        let mut budget = TimeBudget::new();
        budget.start(Duration::from_secs(60));
        assert!(budget.is_active());
        assert!(!budget.time_is_up());
        let remaining = budget.remaining().unwrap();
        assert!(remaining > chrono::Duration::seconds(50));
        assert!(remaining <= chrono::Duration::seconds(60));
    }

    #[test]
    fn remaining_goes_negative_after_deadline() {
        let mut budget = TimeBudget::new();
        budget.start(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(20));
        assert!(budget.time_is_up());
        assert!(budget.remaining().unwrap() < chrono::Duration::zero());
        assert!(budget.overrun_exceeds(Duration::from_millis(5)));
        assert!(!budget.overrun_exceeds(Duration::from_secs(10)));
    }

    #[test]
    fn remove_clears_the_store() {
        let mut budget = TimeBudget::new();
        budget.start(Duration::from_millis(1));
        budget.remove();
        assert!(!budget.is_active());
        assert!(budget.elapsed().is_none());
    }
}
