//! Calibration gatekeeper -- the timed challenge gating entry to a node.
//!
//! The engine is a tick-driven state machine in the same mold as a
//! wall-clock timer: it owns no threads and performs no blocking waits.
//! Every delay (the 60-second countdown, the 2-second stimulus cadence,
//! the random pre-signal delay) is a deadline compared against the clock
//! the caller passes to `tick()`. Cancellation drops all deadlines.
//!
//! ## State Transitions
//!
//! ```text
//! ProtocolSelection -> Running -> (Passed | Failed)
//! ```
//!
//! Passed and Failed are terminal. A cancel request before verdict exits
//! without writing any verdict; a Failed verdict requires the caller to
//! restart the whole attempt.

mod nback;
mod reaction;

pub use nback::{MatchOutcome, NBackSession, NBACK_ALPHABET};
pub use reaction::{ReactionPhase, ReactionResponse, ReactionSession};

use chrono::{DateTime, Duration, Utc};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::events::Event;

/// Which mini-game the session runs. Chosen once, immutable afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    NBack,
    Reaction,
}

/// Outer state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationPhase {
    ProtocolSelection,
    Running,
    Passed,
    Failed,
}

/// Tunables for both game variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Outer countdown length in seconds.
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u32,
    /// Cadence of N-Back stimulus emission.
    #[serde(default = "default_stimulus_interval_ms")]
    pub nback_stimulus_interval_ms: u64,
    /// Inclusive accuracy threshold, 0.0..=1.0.
    #[serde(default = "default_nback_pass_accuracy")]
    pub nback_pass_accuracy: f64,
    /// Minimum latency samples for a reaction verdict.
    #[serde(default = "default_reaction_min_samples")]
    pub reaction_min_samples: usize,
    /// Inclusive mean-latency threshold in milliseconds.
    #[serde(default = "default_reaction_max_avg_ms")]
    pub reaction_max_avg_ms: f64,
    /// Pre-signal delay is drawn uniformly from [min, max).
    #[serde(default = "default_reaction_delay_min_ms")]
    pub reaction_delay_min_ms: u64,
    #[serde(default = "default_reaction_delay_max_ms")]
    pub reaction_delay_max_ms: u64,
    /// Pause after a recorded response before the next round.
    #[serde(default = "default_reaction_pause_ms")]
    pub reaction_pause_ms: u64,
}

fn default_duration_secs() -> u32 {
    60
}
fn default_stimulus_interval_ms() -> u64 {
    2000
}
fn default_nback_pass_accuracy() -> f64 {
    0.70
}
fn default_reaction_min_samples() -> usize {
    3
}
fn default_reaction_max_avg_ms() -> f64 {
    250.0
}
fn default_reaction_delay_min_ms() -> u64 {
    1000
}
fn default_reaction_delay_max_ms() -> u64 {
    4000
}
fn default_reaction_pause_ms() -> u64 {
    1000
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration_secs(),
            nback_stimulus_interval_ms: default_stimulus_interval_ms(),
            nback_pass_accuracy: default_nback_pass_accuracy(),
            reaction_min_samples: default_reaction_min_samples(),
            reaction_max_avg_ms: default_reaction_max_avg_ms(),
            reaction_delay_min_ms: default_reaction_delay_min_ms(),
            reaction_delay_max_ms: default_reaction_delay_max_ms(),
            reaction_pause_ms: default_reaction_pause_ms(),
        }
    }
}

#[derive(Debug)]
enum Game {
    NBack(NBackSession),
    Reaction(ReactionSession),
}

/// One gatekeeper attempt. Created per attempt, destroyed when the
/// attempt ends (pass, fail, or cancel).
#[derive(Debug)]
pub struct CalibrationEngine {
    config: CalibrationConfig,
    phase: CalibrationPhase,
    kind: Option<GameKind>,
    remaining_secs: u32,
    next_countdown_at: Option<DateTime<Utc>>,
    game: Option<Game>,
    rng: Pcg64,
}

impl CalibrationEngine {
    pub fn new(config: CalibrationConfig) -> Self {
        Self::with_rng(config, Pcg64::from_entropy())
    }

    /// Deterministic engine for tests and replayable sessions.
    pub fn with_seed(config: CalibrationConfig, seed: u64) -> Self {
        Self::with_rng(config, Pcg64::seed_from_u64(seed))
    }

    fn with_rng(config: CalibrationConfig, rng: Pcg64) -> Self {
        let remaining_secs = config.duration_secs;
        Self {
            config,
            phase: CalibrationPhase::ProtocolSelection,
            kind: None,
            remaining_secs,
            next_countdown_at: None,
            game: None,
            rng,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn kind(&self) -> Option<GameKind> {
        self.kind
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Most recent N-Back stimulus, for display.
    pub fn current_stimulus(&self) -> Option<char> {
        match &self.game {
            Some(Game::NBack(s)) => s.current(),
            _ => None,
        }
    }

    pub fn nback(&self) -> Option<&NBackSession> {
        match &self.game {
            Some(Game::NBack(s)) => Some(s),
            _ => None,
        }
    }

    pub fn reaction(&self) -> Option<&ReactionSession> {
        match &self.game {
            Some(Game::Reaction(s)) => Some(s),
            _ => None,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Pick a protocol and start the countdown. Only valid from
    /// `ProtocolSelection`; otherwise a silent no-op.
    pub fn select(&mut self, kind: GameKind, now: DateTime<Utc>) -> Option<Event> {
        if self.phase != CalibrationPhase::ProtocolSelection {
            return None;
        }
        self.phase = CalibrationPhase::Running;
        self.kind = Some(kind);
        self.remaining_secs = self.config.duration_secs;
        self.next_countdown_at = Some(now + Duration::seconds(1));
        self.game = Some(match kind {
            GameKind::NBack => Game::NBack(NBackSession::new(
                now,
                self.config.nback_stimulus_interval_ms,
            )),
            GameKind::Reaction => Game::Reaction(ReactionSession::new(
                now,
                self.config.reaction_delay_min_ms,
                self.config.reaction_delay_max_ms,
                self.config.reaction_pause_ms,
                &mut self.rng,
            )),
        });
        Some(Event::CalibrationStarted {
            kind,
            duration_secs: self.config.duration_secs,
            at: now,
        })
    }

    /// Advance all deadlines up to `now`. Call periodically (1 Hz is
    /// enough; faster is fine). Emits stimulus/armed events as they fire
    /// and the verdict event when the countdown reaches zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if self.phase != CalibrationPhase::Running {
            return Vec::new();
        }
        let mut events = Vec::new();

        match &mut self.game {
            Some(Game::NBack(session)) => {
                for (index, symbol) in session.tick(now, &mut self.rng) {
                    events.push(Event::StimulusEmitted { symbol, index, at: now });
                }
            }
            Some(Game::Reaction(session)) => {
                for round in session.tick(now, &mut self.rng) {
                    events.push(Event::ReactionArmed { round, at: now });
                }
            }
            None => {}
        }

        while let Some(next) = self.next_countdown_at {
            if now < next || self.remaining_secs == 0 {
                break;
            }
            self.remaining_secs -= 1;
            self.next_countdown_at = Some(next + Duration::seconds(1));
            if self.remaining_secs == 0 {
                events.push(self.evaluate_verdict(now));
                self.next_countdown_at = None;
            }
        }
        events
    }

    /// N-Back player action: flag the current stimulus as a 2-back match.
    /// No-op unless an N-Back session is running.
    pub fn flag_match(&mut self) -> Option<MatchOutcome> {
        if self.phase != CalibrationPhase::Running {
            return None;
        }
        match &mut self.game {
            Some(Game::NBack(session)) => Some(session.flag_match()),
            _ => None,
        }
    }

    /// Reaction player action: respond to the signal.
    /// No-op unless a Reaction session is running.
    pub fn respond(&mut self, now: DateTime<Utc>) -> Option<ReactionResponse> {
        if self.phase != CalibrationPhase::Running {
            return None;
        }
        match &mut self.game {
            Some(Game::Reaction(session)) => Some(session.respond(now, &mut self.rng)),
            _ => None,
        }
    }

    /// Cooperative cancel: clears every pending deadline and writes no
    /// verdict. Valid any time before the verdict.
    pub fn cancel(&mut self) {
        if matches!(self.phase, CalibrationPhase::Passed | CalibrationPhase::Failed) {
            return;
        }
        self.phase = CalibrationPhase::ProtocolSelection;
        self.kind = None;
        self.next_countdown_at = None;
        self.game = None;
        self.remaining_secs = self.config.duration_secs;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn evaluate_verdict(&mut self, now: DateTime<Utc>) -> Event {
        let kind = self.kind.unwrap_or(GameKind::NBack);
        let (passed, accuracy, avg_latency_ms) = match &self.game {
            Some(Game::NBack(session)) => {
                let accuracy = session.accuracy();
                (accuracy >= self.config.nback_pass_accuracy, Some(accuracy), None)
            }
            Some(Game::Reaction(session)) => {
                let avg = session.avg_latency_ms();
                let passed = session.sample_count() >= self.config.reaction_min_samples
                    && avg.map(|a| a <= self.config.reaction_max_avg_ms).unwrap_or(false);
                (passed, None, avg)
            }
            None => (false, None, None),
        };
        self.phase = if passed {
            CalibrationPhase::Passed
        } else {
            CalibrationPhase::Failed
        };
        if passed {
            Event::CalibrationPassed { kind, accuracy, avg_latency_ms, at: now }
        } else {
            Event::CalibrationFailed { kind, accuracy, avg_latency_ms, at: now }
        }
    }
}
