//! Clock-injected debounce with replacement semantics.
//!
//! # Invariants
//! - At most one value is pending; a new submit replaces it and restarts
//!   the delay.
//! - A pending value fires once, on the first `poll` at or after its
//!   deadline.
//! - The delay is clamped to [`MIN_DELAY`]..=[`MAX_DELAY`].

use std::time::{Duration, Instant};

pub const MIN_DELAY: Duration = Duration::from_millis(160);
pub const MAX_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

/// Holds the latest submitted value until the input settles.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay: delay.clamp(MIN_DELAY, MAX_DELAY),
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Queues `value`, returning the value it replaced.
    pub fn submit(&mut self, value: T, now: Instant) -> Option<T> {
        self.pending
            .replace((value, now + self.delay))
            .map(|(previous, _)| previous)
    }

    /// Returns the pending value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let ready = self.deadline().is_some_and(|deadline| now >= deadline);
        if ready {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }

    /// Instant at which the pending value becomes ready.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops the pending value without firing it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::{Debouncer, MAX_DELAY, MIN_DELAY};
    use std::time::{Duration, Instant};

    #[test]
    fn only_last_value_fires_after_delay() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(200));

        assert!(debouncer.submit("m", start).is_none());
        assert_eq!(
            debouncer.submit("mo", start + Duration::from_millis(100)),
            Some("m")
        );

        assert_eq!(debouncer.poll(start + Duration::from_millis(250)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(300)),
            Some("mo")
        );
        assert_eq!(debouncer.poll(start + Duration::from_millis(900)), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn delay_is_clamped() {
        assert_eq!(Debouncer::<()>::new(Duration::ZERO).delay(), MIN_DELAY);
        assert_eq!(Debouncer::<()>::new(Duration::from_secs(5)).delay(), MAX_DELAY);
    }

    #[test]
    fn cancel_drops_pending_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        debouncer.submit(1, start);
        assert_eq!(debouncer.cancel(), Some(1));
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }
}
