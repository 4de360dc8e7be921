use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calibration::GameKind;

/// Every state change in the engine produces an Event.
/// The CLI prints them; a GUI shell would subscribe to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    NodeSelected {
        node_id: String,
        title: String,
        at: DateTime<Utc>,
    },
    CalibrationStarted {
        kind: GameKind,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    /// A new N-Back stimulus was appended to the sequence.
    StimulusEmitted {
        symbol: char,
        index: usize,
        at: DateTime<Utc>,
    },
    /// Reaction game armed: the signal is live, respond now.
    ReactionArmed {
        round: usize,
        at: DateTime<Utc>,
    },
    CalibrationPassed {
        kind: GameKind,
        /// N-Back accuracy over opportunities, 0.0..=1.0 (N-Back only).
        accuracy: Option<f64>,
        /// Mean latency in milliseconds (Reaction only).
        avg_latency_ms: Option<f64>,
        at: DateTime<Utc>,
    },
    CalibrationFailed {
        kind: GameKind,
        accuracy: Option<f64>,
        avg_latency_ms: Option<f64>,
        at: DateTime<Utc>,
    },
    CalibrationCancelled {
        at: DateTime<Utc>,
    },
    PlaybackStarted {
        node_id: String,
        question_count: usize,
        at: DateTime<Utc>,
    },
    QuizPresented {
        question_id: String,
        trigger_secs: f64,
        at: DateTime<Utc>,
    },
    QuizAnswered {
        question_id: String,
        correct: bool,
        answered_count: usize,
        question_count: usize,
        at: DateTime<Utc>,
    },
    /// Incorrect answer penalty applied to the playback surface.
    PlaybackRewound {
        by_secs: f64,
        at: DateTime<Utc>,
    },
    NodeCompleted {
        node_id: String,
        exp_awarded: u64,
        total_exp: u64,
        at: DateTime<Utc>,
    },
    /// User exited playback without finishing; no progress mutation.
    SessionClosed {
        node_id: String,
        at: DateTime<Utc>,
    },
}
