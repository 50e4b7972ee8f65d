use std::time::Instant;

pub trait Clock {
    fn now_ms(&self) -> f64;
}

#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameTicket {
    epoch: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    epoch: u64,
    pending: bool,
}

impl FrameScheduler {
    pub fn request(&mut self) -> Option<FrameTicket> {
        if self.pending {
            return None;
        }
        self.pending = true;
        Some(FrameTicket { epoch: self.epoch })
    }

    pub fn cancel(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.pending = false;
    }

    /// Redeems a ticket when its frame fires. Stale tickets are refused.
    pub fn accept(&mut self, ticket: FrameTicket) -> bool {
        if !self.pending || ticket.epoch != self.epoch {
            return false;
        }
        self.pending = false;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_pending_ticket_at_a_time() {
        let mut frames = FrameScheduler::default();
        let ticket = frames.request().unwrap();
        assert!(frames.request().is_none());
        assert!(frames.accept(ticket));
        assert!(!frames.accept(ticket));
        assert!(frames.request().is_some());
    }

    #[test]
    fn test_cancel_refuses_stale_tickets() {
        let mut frames = FrameScheduler::default();
        let stale = frames.request().unwrap();
        frames.cancel();
        assert!(!frames.is_pending());

        let fresh = frames.request().unwrap();
        assert!(!frames.accept(stale));
        assert!(frames.accept(fresh));
    }

    #[test]
    fn test_monotonic_clock_never_goes_back() {
        let clock = MonotonicClock::default();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
