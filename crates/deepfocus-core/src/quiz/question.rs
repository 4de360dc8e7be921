//! Active-recall quiz questions.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of answer options per question.
pub const OPTION_COUNT: usize = 4;

/// A comprehension check tied to a media timestamp.
///
/// Owned by a single [`crate::quiz::QuizScheduler`] for one playback
/// session; never shared across nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    /// Media position at which the question fires, in seconds.
    #[serde(rename = "timestamp")]
    pub trigger_secs: f64,
    #[serde(rename = "question")]
    pub prompt: String,
    /// Exactly 4 options.
    pub options: Vec<String>,
    #[serde(rename = "correctIndex")]
    pub correct_index: usize,
    pub explanation: String,
    /// Permanently resolved correctly; never offered again.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub answered: bool,
    /// Currently shown, or shown-then-rewound. Cleared only by the
    /// incorrect-answer rewind so the question can re-trigger.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub presented: bool,
}

impl QuizQuestion {
    /// Structural invariants: 4 options, in-range correct index, a
    /// non-negative trigger.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.options.len() != OPTION_COUNT {
            return Err(ValidationError::InvalidQuestion {
                id: self.id.clone(),
                message: format!("expected {OPTION_COUNT} options, got {}", self.options.len()),
            });
        }
        if self.correct_index >= OPTION_COUNT {
            return Err(ValidationError::InvalidQuestion {
                id: self.id.clone(),
                message: format!("correct_index {} out of range", self.correct_index),
            });
        }
        if !self.trigger_secs.is_finite() || self.trigger_secs < 0.0 {
            return Err(ValidationError::InvalidQuestion {
                id: self.id.clone(),
                message: format!("bad trigger timestamp {}", self.trigger_secs),
            });
        }
        Ok(())
    }
}
