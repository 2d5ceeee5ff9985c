//! FrameScheduler: the controller's handle on the host's tick loop.
//!
//! The host asks for a [`FrameToken`] and hands it back with every tick.
//! `cancel()` bumps the generation, so a tick that was already in flight
//! when playback stopped carries a stale token and is ignored.
//!
//! The settle delay between iterations is counted down from the `dt` of
//! the ticks that arrive while it is pending.

use std::time::Duration;

/// Proof that a tick was scheduled for the current playback run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken {
    generation: u64,
}

impl FrameToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of feeding a tick to a pending settle delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// No settle delay is pending.
    Inactive,
    /// Still waiting.
    Pending(Duration),
    /// The delay has run out and has been cleared.
    Elapsed,
}

#[derive(Debug)]
pub struct FrameScheduler {
    generation: u64,
    active: bool,
    settle_delay: Duration,
    settle_remaining: Option<Duration>,
}

impl FrameScheduler {
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            generation: 0,
            active: false,
            settle_delay,
            settle_remaining: None,
        }
    }

    /// Start issuing ticks for a new run.
    pub fn schedule(&mut self) -> FrameToken {
        self.cancel();
        self.active = true;
        FrameToken {
            generation: self.generation,
        }
    }

    /// Token for the current run, if one is active.
    pub fn token(&self) -> Option<FrameToken> {
        self.active.then_some(FrameToken {
            generation: self.generation,
        })
    }

    pub fn is_current(&self, token: FrameToken) -> bool {
        self.active && token.generation == self.generation
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Invalidate outstanding tokens and drop any pending settle.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.active = false;
        self.settle_remaining = None;
    }

    /// Start the settle countdown unless one is already running.
    pub fn begin_settle(&mut self) -> Duration {
        *self.settle_remaining.get_or_insert(self.settle_delay)
    }

    pub fn settle_remaining(&self) -> Option<Duration> {
        self.settle_remaining
    }

    /// Count `dt` off the pending settle delay.
    pub fn consume_settle(&mut self, dt: Duration) -> Settle {
        match self.settle_remaining {
            None => Settle::Inactive,
            Some(remaining) if dt >= remaining => {
                self.settle_remaining = None;
                Settle::Elapsed
            }
            Some(remaining) => {
                let left = remaining - dt;
                self.settle_remaining = Some(left);
                Settle::Pending(left)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_invalidates_tokens() {
        let mut scheduler = FrameScheduler::new(Duration::from_millis(500));
        let token = scheduler.schedule();
        assert!(scheduler.is_current(token));

        scheduler.cancel();
        assert!(!scheduler.is_current(token));
        assert!(scheduler.token().is_none());

        let next = scheduler.schedule();
        assert!(!scheduler.is_current(token));
        assert!(scheduler.is_current(next));
    }

    #[test]
    fn settle_counts_down_tick_time() {
        let mut scheduler = FrameScheduler::new(Duration::from_millis(120));
        scheduler.schedule();
        assert_eq!(scheduler.consume_settle(Duration::from_millis(50)), Settle::Inactive);

        assert_eq!(scheduler.begin_settle(), Duration::from_millis(120));
        assert_eq!(
            scheduler.consume_settle(Duration::from_millis(50)),
            Settle::Pending(Duration::from_millis(70))
        );
        // restarting while pending keeps the remaining time
        assert_eq!(scheduler.begin_settle(), Duration::from_millis(70));
        assert_eq!(
            scheduler.consume_settle(Duration::from_millis(50)),
            Settle::Pending(Duration::from_millis(20))
        );
        assert_eq!(scheduler.consume_settle(Duration::from_millis(50)), Settle::Elapsed);
        assert_eq!(scheduler.settle_remaining(), None);
    }

    #[test]
    fn cancel_drops_pending_settle() {
        let mut scheduler = FrameScheduler::new(Duration::from_millis(500));
        scheduler.schedule();
        scheduler.begin_settle();
        scheduler.cancel();
        assert_eq!(scheduler.settle_remaining(), None);
    }
}
