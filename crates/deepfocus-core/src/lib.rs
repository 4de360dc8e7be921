//! # DeepFocus Core Library
//!
//! Core business logic for the DeepFocus focus-gated learning platform.
//! Access to educational video content is gated behind a prerequisite
//! skill graph and a timed calibration challenge, and playback itself is
//! interrupted by timestamped active-recall quizzes.
//!
//! ## Architecture
//!
//! - **Skill graph**: pure prerequisite queries over a read-only node
//!   catalog; progress state is threaded through every call
//! - **Calibration engine**: tick-driven state machine running one of two
//!   timed mini-games (N-Back memory, reaction latency) to a pass/fail
//!   verdict
//! - **Quiz scheduler**: binds questions to one playback session and
//!   answers position polls with caller-mediated playback intents
//! - **Progression controller**: orchestrates select -> calibrate ->
//!   play -> complete, and is the single writer of progress state
//! - **Storage**: SQLite-backed progress persistence and TOML
//!   configuration
//!
//! The engine owns no threads and never blocks: every countdown and
//! random delay is a deadline the caller advances past via `tick()`
//! methods, and the concrete video widget stays behind the
//! [`PlaybackSurface`] capability.

pub mod calibration;
pub mod controller;
pub mod error;
pub mod events;
pub mod graph;
pub mod playback;
pub mod progress;
pub mod quiz;
pub mod storage;

pub use calibration::{CalibrationEngine, CalibrationPhase, GameKind};
pub use controller::{AttemptPhase, ProgressionController};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use graph::{LearningNode, SkillGraph};
pub use playback::{PlaybackSurface, SimulatedPlayer};
pub use progress::{ProgressState, ProgressStore};
pub use quiz::{PlaybackIntent, QuizQuestion, QuizScheduler, QuizSource};
pub use storage::{Config, ProgressDb};
