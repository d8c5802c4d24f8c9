//! Dispatch statistics.

use std::time::{Duration, Instant};

use crate::commands::ReplyKind;

/// Outcome of handling a single incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A reply of the given kind was sent.
    Replied(ReplyKind),

    /// The message needed no reply.
    Ignored,

    /// Sending the reply failed.
    Failed,
}

/// Counters for messages handled since startup.
#[derive(Debug, Clone)]
pub struct DispatchStats {
    /// When the dispatcher started.
    started_at: Instant,

    /// Incoming messages seen.
    pub received: u64,

    /// `/start` greetings sent.
    pub greeted: u64,

    /// `/help` replies sent.
    pub helped: u64,

    /// Echo replies sent.
    pub echoed: u64,

    /// Messages that needed no reply.
    pub ignored: u64,

    /// Replies that could not be sent.
    pub failed: u64,
}

impl Default for DispatchStats {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchStats {
    /// Creates empty statistics starting now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            received: 0,
            greeted: 0,
            helped: 0,
            echoed: 0,
            ignored: 0,
            failed: 0,
        }
    }

    /// Records the outcome of one incoming message.
    pub fn record(&mut self, outcome: Outcome) {
        self.received += 1;
        match outcome {
            Outcome::Replied(ReplyKind::Greeting) => self.greeted += 1,
            Outcome::Replied(ReplyKind::Help) => self.helped += 1,
            Outcome::Replied(ReplyKind::Echo) => self.echoed += 1,
            Outcome::Ignored => self.ignored += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    /// Total replies sent successfully.
    #[must_use]
    pub const fn replied(&self) -> u64 {
        self.greeted + self.helped + self.echoed
    }

    /// Time since the dispatcher started.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// One-line summary for logging.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "received={} replied={} (greeting={} help={} echo={}) ignored={} failed={} uptime={}s",
            self.received,
            self.replied(),
            self.greeted,
            self.helped,
            self.echoed,
            self.ignored,
            self.failed,
            self.uptime().as_secs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_empty() {
        let stats = DispatchStats::new();
        assert_eq!(stats.received, 0);
        assert_eq!(stats.replied(), 0);
    }

    #[test]
    fn test_record_outcomes() {
        let mut stats = DispatchStats::new();
        stats.record(Outcome::Replied(ReplyKind::Greeting));
        stats.record(Outcome::Replied(ReplyKind::Echo));
        stats.record(Outcome::Replied(ReplyKind::Echo));
        stats.record(Outcome::Replied(ReplyKind::Help));
        stats.record(Outcome::Ignored);
        stats.record(Outcome::Failed);

        assert_eq!(stats.received, 6);
        assert_eq!(stats.greeted, 1);
        assert_eq!(stats.echoed, 2);
        assert_eq!(stats.helped, 1);
        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.replied(), 4);
    }

    #[test]
    fn test_summary() {
        let mut stats = DispatchStats::new();
        stats.record(Outcome::Replied(ReplyKind::Echo));
        stats.record(Outcome::Ignored);

        let summary = stats.summary();
        assert!(summary.starts_with("received=2 replied=1 (greeting=0 help=0 echo=1) ignored=1 failed=0"));
    }
}
