//! Playback-synchronized quiz scheduler.
//!
//! Binds a fixed set of questions to one playback session and guarantees
//! each fires at most once while unanswered. The scheduler never touches
//! playback primitives itself; it returns [`PlaybackIntent`]s for the
//! caller to apply to the external surface. Serialization of `poll`
//! against `submit_answer` is the controller's job (it stops polling
//! while a question is displayed).

use serde::{Deserialize, Serialize};

use super::question::QuizQuestion;

/// Caller-mediated side effect on the playback surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum PlaybackIntent {
    Pause,
    Resume,
    /// Seek backward by this many seconds; the surface clamps at 0.
    SeekBackBy { secs: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerVerdict {
    Correct,
    Incorrect,
}

/// Outcome of an answer submission: the verdict plus the intents the
/// caller must apply, in order.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub verdict: AnswerVerdict,
    pub intents: Vec<PlaybackIntent>,
    pub explanation: String,
}

/// Tunables for the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Half-width of the trigger window around each timestamp. Too
    /// narrow a window combined with a coarse poll cadence can miss a
    /// trigger entirely; 0.5 s pairs with the 500 ms cadence.
    #[serde(default = "default_tolerance_secs")]
    pub tolerance_secs: f64,
    /// Recommended poll cadence for the position watcher.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Rewind applied on an incorrect answer.
    #[serde(default = "default_rewind_penalty_secs")]
    pub rewind_penalty_secs: f64,
}

fn default_tolerance_secs() -> f64 {
    0.5
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_rewind_penalty_secs() -> f64 {
    30.0
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            tolerance_secs: default_tolerance_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            rewind_penalty_secs: default_rewind_penalty_secs(),
        }
    }
}

/// One playback session's quiz state.
#[derive(Debug, Clone)]
pub struct QuizScheduler {
    questions: Vec<QuizQuestion>,
    config: QuizConfig,
}

impl QuizScheduler {
    pub fn new(questions: Vec<QuizQuestion>, config: QuizConfig) -> Self {
        Self { questions, config }
    }

    /// Check the playback position against every pending trigger.
    ///
    /// Returns the first unanswered, unpresented question whose trigger
    /// is within the tolerance window, marking it presented so a repeat
    /// poll cannot return it again. The caller pauses the surface and
    /// displays the question.
    pub fn poll(&mut self, position_secs: f64) -> Option<QuizQuestion> {
        let tolerance = self.config.tolerance_secs;
        let question = self.questions.iter_mut().find(|q| {
            !q.answered && !q.presented && (q.trigger_secs - position_secs).abs() < tolerance
        })?;
        question.presented = true;
        Some(question.clone())
    }

    /// Resolve the currently displayed question.
    ///
    /// Correct: the question is permanently answered and playback
    /// resumes. Incorrect: the surface is rewound by the penalty, the
    /// presented mark is cleared so the question re-triggers after the
    /// rewind, and playback resumes. Unknown or never-presented ids are
    /// rejected with `None`.
    pub fn submit_answer(&mut self, question_id: &str, chosen_index: usize) -> Option<AnswerOutcome> {
        let penalty = self.config.rewind_penalty_secs;
        let question = self
            .questions
            .iter_mut()
            .find(|q| q.id == question_id && q.presented && !q.answered)?;
        if chosen_index == question.correct_index {
            question.answered = true;
            Some(AnswerOutcome {
                verdict: AnswerVerdict::Correct,
                intents: vec![PlaybackIntent::Resume],
                explanation: question.explanation.clone(),
            })
        } else {
            question.presented = false;
            Some(AnswerOutcome {
                verdict: AnswerVerdict::Incorrect,
                intents: vec![
                    PlaybackIntent::SeekBackBy { secs: penalty },
                    PlaybackIntent::Resume,
                ],
                explanation: question.explanation.clone(),
            })
        }
    }

    pub fn answered_count(&self) -> usize {
        self.questions.iter().filter(|q| q.answered).count()
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, trigger: f64, correct: usize) -> QuizQuestion {
        QuizQuestion {
            id: id.into(),
            trigger_secs: trigger,
            prompt: "?".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index: correct,
            explanation: "why".into(),
            answered: false,
            presented: false,
        }
    }

    fn scheduler(questions: Vec<QuizQuestion>) -> QuizScheduler {
        QuizScheduler::new(questions, QuizConfig::default())
    }

    #[test]
    fn fires_once_within_tolerance_window() {
        let mut sched = scheduler(vec![question("q1", 120.0, 0)]);
        assert!(sched.poll(119.0).is_none());
        let fired = sched.poll(119.6).unwrap();
        assert_eq!(fired.id, "q1");
        // Still inside the window, but already presented.
        assert!(sched.poll(120.3).is_none());
    }

    #[test]
    fn correct_answer_is_permanent() {
        let mut sched = scheduler(vec![question("q1", 120.0, 2)]);
        sched.poll(120.0).unwrap();
        let outcome = sched.submit_answer("q1", 2).unwrap();
        assert_eq!(outcome.verdict, AnswerVerdict::Correct);
        assert_eq!(outcome.intents, vec![PlaybackIntent::Resume]);
        assert_eq!(sched.answered_count(), 1);
        // Never offered again, even after a rewind passes its timestamp.
        assert!(sched.poll(120.0).is_none());
    }

    #[test]
    fn incorrect_answer_rewinds_and_rearms() {
        let mut sched = scheduler(vec![question("q1", 120.0, 2)]);
        sched.poll(120.0).unwrap();
        let outcome = sched.submit_answer("q1", 0).unwrap();
        assert_eq!(outcome.verdict, AnswerVerdict::Incorrect);
        assert_eq!(
            outcome.intents,
            vec![
                PlaybackIntent::SeekBackBy { secs: 30.0 },
                PlaybackIntent::Resume
            ]
        );
        // Out of the window: nothing fires.
        assert!(sched.poll(95.0).is_none());
        // Position re-enters the window: the question re-triggers.
        assert!(sched.poll(119.8).is_some());
    }

    #[test]
    fn submit_without_presentation_is_rejected() {
        let mut sched = scheduler(vec![question("q1", 120.0, 2)]);
        assert!(sched.submit_answer("q1", 2).is_none());
        assert!(sched.submit_answer("nope", 0).is_none());
        assert_eq!(sched.answered_count(), 0);
    }

    #[test]
    fn earliest_matching_question_wins() {
        let mut sched = scheduler(vec![
            question("q1", 100.0, 0),
            question("q2", 100.2, 0),
        ]);
        let fired = sched.poll(100.1).unwrap();
        assert_eq!(fired.id, "q1");
        // The second fires on the next poll, once q1 is resolved.
        sched.submit_answer("q1", 0).unwrap();
        let fired = sched.poll(100.1).unwrap();
        assert_eq!(fired.id, "q2");
    }
}
