// crates/duoscope-core/src/schedule.rs
//
// One-shot, cancellable resume timer for drift correction.
//
// The synchronizer never sleeps or spawns. When it pauses the leading stream
// it records *when* that stream should resume; the host's tick loop polls
// `take_due(now)` every step. Each scheduled resume carries a token, and
// `cancel()` drops it, so a resume scheduled before a manual pause can never
// fire after it.

use std::time::Duration;

use crate::helpers::geometry::Side;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingResume {
    /// Stream that was paused and must be restarted.
    pub side:  Side,
    /// Host time at which to restart it.
    pub due:   Duration,
    pub token: u64,
}

#[derive(Debug, Default)]
pub struct ResumeSchedule {
    pending:    Option<PendingResume>,
    next_token: u64,
}

impl ResumeSchedule {
    pub fn new() -> Self { Self::default() }

    /// Schedule `side` to resume at `due`, replacing anything pending.
    pub fn schedule(&mut self, side: Side, due: Duration) -> u64 {
        self.next_token += 1;
        let token = self.next_token;
        self.pending = Some(PendingResume { side, due, token });
        token
    }

    /// Drop the pending resume, if any, and return it.
    pub fn cancel(&mut self) -> Option<PendingResume> {
        self.pending.take()
    }

    /// Remove and return the pending resume once `now` has reached its deadline.
    pub fn take_due(&mut self, now: Duration) -> Option<PendingResume> {
        match self.pending {
            Some(p) if now >= p.due => self.pending.take(),
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<PendingResume> { self.pending }
    pub fn is_pending(&self) -> bool { self.pending.is_some() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration { Duration::from_millis(v) }

    #[test]
    fn fires_only_after_deadline() {
        let mut s = ResumeSchedule::new();
        s.schedule(Side::Left, ms(100));
        assert!(s.take_due(ms(99)).is_none());
        let p = s.take_due(ms(100)).unwrap();
        assert_eq!(p.side, Side::Left);
        assert!(!s.is_pending());
        assert!(s.take_due(ms(500)).is_none());
    }

    #[test]
    fn cancel_prevents_firing() {
        let mut s = ResumeSchedule::new();
        s.schedule(Side::Right, ms(10));
        assert!(s.cancel().is_some());
        assert!(s.take_due(ms(1_000)).is_none());
    }

    #[test]
    fn reschedule_replaces_and_issues_new_token() {
        let mut s = ResumeSchedule::new();
        let a = s.schedule(Side::Left, ms(10));
        let b = s.schedule(Side::Right, ms(20));
        assert_ne!(a, b);
        assert_eq!(s.pending().unwrap().side, Side::Right);
    }
}
