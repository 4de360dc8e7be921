//! Progression controller -- orchestrates one node attempt end to end.
//!
//! Sequence per attempt:
//!
//! ```text
//! NodeSelected -> Calibrating -> Playing -> Completed
//!                     |              |
//!                     v              v
//!               NodeSelected      Closed
//!            (cancel / failed)  (user exit)
//! ```
//!
//! The controller owns the progress state and is its only writer: the
//! completion transition mutates it and saves through the store. It never
//! calls playback primitives; quiz side effects come back as intents the
//! caller applies to the external surface.

use chrono::{DateTime, Utc};

use crate::calibration::{CalibrationConfig, CalibrationEngine, GameKind, MatchOutcome, ReactionResponse};
use crate::error::Result;
use crate::events::Event;
use crate::graph::{LearningNode, SkillGraph};
use crate::progress::{ProgressState, ProgressStore, EXP_PER_NODE};
use crate::quiz::{
    AnswerOutcome, AnswerVerdict, PlaybackIntent, QuizConfig, QuizQuestion, QuizScheduler,
    QuizSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    /// No node selected yet, or the previous attempt finished.
    Idle,
    NodeSelected,
    Calibrating,
    Playing,
    Completed,
    Closed,
}

/// A question ready to display, with the intents to apply first.
#[derive(Debug, Clone)]
pub struct QuizPrompt {
    pub question: QuizQuestion,
    /// Always starts with `Pause`; applied before the prompt is shown.
    pub intents: Vec<PlaybackIntent>,
    pub event: Event,
}

/// Resolution of a submitted answer.
#[derive(Debug, Clone)]
pub struct AnswerResolution {
    pub outcome: AnswerOutcome,
    pub events: Vec<Event>,
}

pub struct ProgressionController<S: ProgressStore> {
    graph: SkillGraph,
    store: S,
    source: Box<dyn QuizSource>,
    progress: ProgressState,
    calibration_config: CalibrationConfig,
    quiz_config: QuizConfig,
    exp_per_node: u64,
    calibration_seed: Option<u64>,

    phase: AttemptPhase,
    node: Option<LearningNode>,
    calibration: Option<CalibrationEngine>,
    scheduler: Option<QuizScheduler>,
    /// Quiz-active flag: set while a question is displayed, which
    /// suspends polling and serializes poll against submit.
    active_question: Option<String>,
}

impl<S: ProgressStore> ProgressionController<S> {
    /// Load progress from the store and start idle.
    pub fn new(graph: SkillGraph, store: S, source: Box<dyn QuizSource>) -> Result<Self> {
        let progress = store.load()?;
        Ok(Self {
            graph,
            store,
            source,
            progress,
            calibration_config: CalibrationConfig::default(),
            quiz_config: QuizConfig::default(),
            exp_per_node: EXP_PER_NODE,
            calibration_seed: None,
            phase: AttemptPhase::Idle,
            node: None,
            calibration: None,
            scheduler: None,
            active_question: None,
        })
    }

    pub fn with_calibration_config(mut self, config: CalibrationConfig) -> Self {
        self.calibration_config = config;
        self
    }

    pub fn with_quiz_config(mut self, config: QuizConfig) -> Self {
        self.quiz_config = config;
        self
    }

    pub fn with_exp_per_node(mut self, exp: u64) -> Self {
        self.exp_per_node = exp;
        self
    }

    /// Seed the calibration RNG for deterministic sessions.
    pub fn with_calibration_seed(mut self, seed: u64) -> Self {
        self.calibration_seed = Some(seed);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    pub fn graph(&self) -> &SkillGraph {
        &self.graph
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn node(&self) -> Option<&LearningNode> {
        self.node.as_ref()
    }

    pub fn calibration(&self) -> Option<&CalibrationEngine> {
        self.calibration.as_ref()
    }

    pub fn scheduler(&self) -> Option<&QuizScheduler> {
        self.scheduler.as_ref()
    }

    /// Recommended poll cadence for the Playing phase, in milliseconds.
    pub fn poll_interval_ms(&self) -> u64 {
        self.quiz_config.poll_interval_ms
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Select a node for a new attempt. Rejected (no state change) if an
    /// attempt is mid-flight or the node is locked or unknown.
    pub fn select_node(&mut self, node_id: &str, now: DateTime<Utc>) -> Option<Event> {
        match self.phase {
            AttemptPhase::Idle
            | AttemptPhase::NodeSelected
            | AttemptPhase::Completed
            | AttemptPhase::Closed => {}
            AttemptPhase::Calibrating | AttemptPhase::Playing => return None,
        }
        let node = self.graph.get(node_id)?.clone();
        if !self.graph.is_unlocked(&node, &self.progress) {
            return None;
        }
        let event = Event::NodeSelected {
            node_id: node.id.clone(),
            title: node.title.clone(),
            at: now,
        };
        self.node = Some(node);
        self.phase = AttemptPhase::NodeSelected;
        Some(event)
    }

    /// Enter the gatekeeper. The engine starts in protocol selection;
    /// the attempt's countdown begins with [`choose_protocol`].
    ///
    /// [`choose_protocol`]: ProgressionController::choose_protocol
    pub fn enter_calibration(&mut self) -> bool {
        if self.phase != AttemptPhase::NodeSelected {
            return false;
        }
        let engine = match self.calibration_seed {
            Some(seed) => CalibrationEngine::with_seed(self.calibration_config.clone(), seed),
            None => CalibrationEngine::new(self.calibration_config.clone()),
        };
        self.calibration = Some(engine);
        self.phase = AttemptPhase::Calibrating;
        true
    }

    pub fn choose_protocol(&mut self, kind: GameKind, now: DateTime<Utc>) -> Option<Event> {
        if self.phase != AttemptPhase::Calibrating {
            return None;
        }
        self.calibration.as_mut()?.select(kind, now)
    }

    /// Drive the calibration timers. On a pass verdict the attempt moves
    /// straight into Playing: questions are fetched from the quiz source
    /// and bound to a fresh scheduler. On a fail verdict the attempt
    /// drops back to NodeSelected; the caller re-enters calibration to
    /// retry.
    pub fn tick_calibration(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if self.phase != AttemptPhase::Calibrating {
            return Vec::new();
        }
        let Some(engine) = self.calibration.as_mut() else {
            return Vec::new();
        };
        let mut events = engine.tick(now);
        let passed = matches!(events.last(), Some(Event::CalibrationPassed { .. }));
        let failed = matches!(events.last(), Some(Event::CalibrationFailed { .. }));
        if passed {
            self.calibration = None;
            if let Some(event) = self.start_playing(now) {
                events.push(event);
            }
        } else if failed {
            self.calibration = None;
            self.phase = AttemptPhase::NodeSelected;
        }
        events
    }

    /// N-Back player action, forwarded to the running session.
    pub fn flag_match(&mut self) -> Option<MatchOutcome> {
        self.calibration.as_mut()?.flag_match()
    }

    /// Reaction player action, forwarded to the running session.
    pub fn respond(&mut self, now: DateTime<Utc>) -> Option<ReactionResponse> {
        self.calibration.as_mut()?.respond(now)
    }

    /// Cancel the gatekeeper before a verdict. No verdict is written and
    /// progress is untouched.
    pub fn cancel_calibration(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.phase != AttemptPhase::Calibrating {
            return None;
        }
        self.calibration = None;
        self.phase = AttemptPhase::NodeSelected;
        Some(Event::CalibrationCancelled { at: now })
    }

    /// Check the playback position for a due question. Suspended while a
    /// question is already displayed. On a hit, the returned intents
    /// (always `Pause`) are applied to the surface before showing the
    /// prompt.
    pub fn poll_playback(&mut self, position_secs: f64, now: DateTime<Utc>) -> Option<QuizPrompt> {
        if self.phase != AttemptPhase::Playing || self.active_question.is_some() {
            return None;
        }
        let question = self.scheduler.as_mut()?.poll(position_secs)?;
        self.active_question = Some(question.id.clone());
        Some(QuizPrompt {
            event: Event::QuizPresented {
                question_id: question.id.clone(),
                trigger_secs: question.trigger_secs,
                at: now,
            },
            intents: vec![PlaybackIntent::Pause],
            question,
        })
    }

    /// Resolve the displayed question. Rejected when no quiz is active.
    pub fn submit_answer(&mut self, chosen_index: usize, now: DateTime<Utc>) -> Option<AnswerResolution> {
        if self.phase != AttemptPhase::Playing {
            return None;
        }
        let question_id = self.active_question.clone()?;
        let scheduler = self.scheduler.as_mut()?;
        let outcome = scheduler.submit_answer(&question_id, chosen_index)?;
        self.active_question = None;

        let correct = outcome.verdict == AnswerVerdict::Correct;
        let mut events = vec![Event::QuizAnswered {
            question_id,
            correct,
            answered_count: scheduler.answered_count(),
            question_count: scheduler.question_count(),
            at: now,
        }];
        if !correct {
            events.push(Event::PlaybackRewound {
                by_secs: self.quiz_config.rewind_penalty_secs,
                at: now,
            });
        }
        Some(AnswerResolution { outcome, events })
    }

    /// End-of-media notification from the surface. Drives completion
    /// regardless of how many questions remain unanswered. The progress
    /// mutation is idempotent per node and saved before returning.
    pub fn handle_ended(&mut self, now: DateTime<Utc>) -> Result<Option<Event>> {
        if self.phase != AttemptPhase::Playing {
            return Ok(None);
        }
        let Some(node) = self.node.clone() else {
            return Ok(None);
        };
        let awarded = self.progress.complete_node(&node.id, self.exp_per_node);
        self.store.save(&self.progress)?;
        if awarded > 0 {
            self.store.record_completion(&node, awarded)?;
        }
        self.scheduler = None;
        self.active_question = None;
        self.phase = AttemptPhase::Completed;
        Ok(Some(Event::NodeCompleted {
            node_id: node.id,
            exp_awarded: awarded,
            total_exp: self.progress.current_exp,
            at: now,
        }))
    }

    /// Explicit user exit from playback. No progress mutation.
    pub fn close(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.phase != AttemptPhase::Playing {
            return None;
        }
        let node_id = self.node.as_ref().map(|n| n.id.clone()).unwrap_or_default();
        self.scheduler = None;
        self.active_question = None;
        self.phase = AttemptPhase::Closed;
        Some(Event::SessionClosed { node_id, at: now })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn start_playing(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let node = self.node.as_ref()?;
        let questions =
            self.source
                .generate_quiz(&node.title, &node.description, node.duration_secs);
        let scheduler = QuizScheduler::new(questions, self.quiz_config.clone());
        let event = Event::PlaybackStarted {
            node_id: node.id.clone(),
            question_count: scheduler.question_count(),
            at: now,
        };
        self.scheduler = Some(scheduler);
        self.active_question = None;
        self.phase = AttemptPhase::Playing;
        Some(event)
    }
}
