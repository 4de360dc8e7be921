//! Active-recall quizzes: questions, the playback-synchronized
//! scheduler, and the content-generation collaborators.

mod question;
mod scheduler;
mod source;

pub use question::{QuizQuestion, OPTION_COUNT};
pub use scheduler::{AnswerOutcome, AnswerVerdict, PlaybackIntent, QuizConfig, QuizScheduler};
pub use source::{fallback_quiz, FallbackQuizSource, GeminiQuizSource, QuizSource};
