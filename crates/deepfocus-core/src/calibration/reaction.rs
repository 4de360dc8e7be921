//! Reaction latency session.
//!
//! Rounds repeat until the outer countdown expires:
//!
//! ```text
//! Waiting --(random 1000..4000 ms delay)--> Ready --respond()--> Clicked
//!    ^                                                              |
//!    └────────────────────(1000 ms pause)──────────────────────────┘
//! ```
//!
//! Responding during Waiting is a recoverable input error: the caller is
//! told "too early", no sample is recorded, and the round restarts
//! immediately with a fresh random delay.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionPhase {
    Waiting,
    Ready,
    Clicked,
}

/// Result of one `respond` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionResponse {
    /// Responded during Waiting; round restarted, nothing recorded.
    TooEarly,
    /// Latency recorded, in milliseconds.
    Recorded(u64),
    /// Responded during the post-click pause; nothing to do.
    Ignored,
}

#[derive(Debug)]
pub struct ReactionSession {
    phase: ReactionPhase,
    /// Waiting -> Ready deadline.
    ready_at: DateTime<Utc>,
    /// When the signal actually went live (valid in Ready).
    armed_since: Option<DateTime<Utc>>,
    /// Clicked -> next round deadline.
    resume_at: Option<DateTime<Utc>>,
    samples: Vec<u64>,
    round: usize,
    delay_min_ms: u64,
    delay_max_ms: u64,
    pause_ms: u64,
}

impl ReactionSession {
    pub fn new(
        now: DateTime<Utc>,
        delay_min_ms: u64,
        delay_max_ms: u64,
        pause_ms: u64,
        rng: &mut impl Rng,
    ) -> Self {
        let mut session = Self {
            phase: ReactionPhase::Waiting,
            ready_at: now,
            armed_since: None,
            resume_at: None,
            samples: Vec::new(),
            round: 0,
            delay_min_ms,
            delay_max_ms,
            pause_ms,
        };
        session.schedule_round(now, rng);
        session
    }

    /// Advance phase deadlines. Returns the round numbers that went
    /// Ready during this tick (at most one per tick in practice).
    pub fn tick(&mut self, now: DateTime<Utc>, rng: &mut impl Rng) -> Vec<usize> {
        let mut armed = Vec::new();
        loop {
            match self.phase {
                ReactionPhase::Waiting if now >= self.ready_at => {
                    self.phase = ReactionPhase::Ready;
                    self.armed_since = Some(now);
                    armed.push(self.round);
                }
                ReactionPhase::Clicked => {
                    match self.resume_at {
                        Some(resume) if now >= resume => self.schedule_round(now, rng),
                        _ => break,
                    }
                }
                _ => break,
            }
        }
        armed
    }

    pub fn respond(&mut self, now: DateTime<Utc>, rng: &mut impl Rng) -> ReactionResponse {
        match self.phase {
            ReactionPhase::Waiting => {
                // Jumped the gun: restart the round, record nothing.
                self.schedule_round(now, rng);
                ReactionResponse::TooEarly
            }
            ReactionPhase::Ready => {
                let armed = self.armed_since.unwrap_or(now);
                let latency = (now - armed).num_milliseconds().max(0) as u64;
                self.samples.push(latency);
                self.phase = ReactionPhase::Clicked;
                self.armed_since = None;
                self.resume_at = Some(now + Duration::milliseconds(self.pause_ms as i64));
                ReactionResponse::Recorded(latency)
            }
            ReactionPhase::Clicked => ReactionResponse::Ignored,
        }
    }

    pub fn phase(&self) -> ReactionPhase {
        self.phase
    }

    pub fn samples(&self) -> &[u64] {
        &self.samples
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn last_latency_ms(&self) -> Option<u64> {
        self.samples.last().copied()
    }

    pub fn avg_latency_ms(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u64 = self.samples.iter().sum();
        Some(sum as f64 / self.samples.len() as f64)
    }

    fn schedule_round(&mut self, now: DateTime<Utc>, rng: &mut impl Rng) {
        let delay_ms = rng.gen_range(self.delay_min_ms..self.delay_max_ms);
        self.phase = ReactionPhase::Waiting;
        self.ready_at = now + Duration::milliseconds(delay_ms as i64);
        self.armed_since = None;
        self.resume_at = None;
        self.round += 1;
    }
}
