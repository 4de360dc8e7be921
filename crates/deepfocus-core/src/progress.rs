//! User progress state and the store it is persisted through.
//!
//! `ProgressState` is the only entity that outlives a single node attempt.
//! It is loaded once at startup, mutated only by the completion transition,
//! and saved after every mutation.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default EXP increment per first-time node completion.
pub const EXP_PER_NODE: u64 = 100;

/// Initial cosmetic focus score. Persisted but never mutated by
/// calibration outcomes.
pub const INITIAL_FOCUS_SCORE: i64 = 100;

/// Mutable record of what a single user has completed and earned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressState {
    /// Completed node ids. Insertion order retained for display; no
    /// duplicates.
    pub completed_ids: Vec<String>,
    /// Non-negative, monotonically non-decreasing.
    pub current_exp: u64,
    /// Cosmetic counter shown in the HUD.
    pub focus_score: i64,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            completed_ids: Vec::new(),
            current_exp: 0,
            focus_score: INITIAL_FOCUS_SCORE,
        }
    }
}

impl ProgressState {
    pub fn is_completed(&self, node_id: &str) -> bool {
        self.completed_ids.iter().any(|id| id == node_id)
    }

    /// Record a node completion. Idempotent per node: the first call
    /// inserts the id and awards `exp_award`; repeats change nothing.
    /// Returns the EXP actually awarded (0 on repeat).
    pub fn complete_node(&mut self, node_id: &str, exp_award: u64) -> u64 {
        if self.is_completed(node_id) {
            return 0;
        }
        self.completed_ids.push(node_id.to_string());
        self.current_exp += exp_award;
        exp_award
    }
}

/// Persistence collaborator for [`ProgressState`].
///
/// `load` is called once at process start and `save` after every
/// completion. The SQLite-backed implementation lives in
/// [`crate::storage::ProgressDb`]; tests use an in-memory store.
pub trait ProgressStore {
    /// Load the stored state, or the default for a fresh user.
    fn load(&self) -> Result<ProgressState>;

    fn save(&self, state: &ProgressState) -> Result<()>;

    /// Append a row to the completion history. Called only on a
    /// first-time completion; stores without a history keep the default
    /// no-op.
    fn record_completion(&self, _node: &crate::graph::LearningNode, _exp_awarded: u64) -> Result<()> {
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    state: std::cell::RefCell<ProgressState>,
}

impl MemoryProgressStore {
    pub fn with_state(state: ProgressState) -> Self {
        Self {
            state: std::cell::RefCell::new(state),
        }
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self) -> Result<ProgressState> {
        Ok(self.state.borrow().clone())
    }

    fn save(&self, state: &ProgressState) -> Result<()> {
        *self.state.borrow_mut() = state.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_completion_awards_exp() {
        let mut progress = ProgressState::default();
        let awarded = progress.complete_node("p1", EXP_PER_NODE);
        assert_eq!(awarded, 100);
        assert_eq!(progress.current_exp, 100);
        assert!(progress.is_completed("p1"));
    }

    #[test]
    fn completion_is_idempotent() {
        let mut progress = ProgressState::default();
        progress.complete_node("p1", EXP_PER_NODE);
        let awarded = progress.complete_node("p1", EXP_PER_NODE);
        assert_eq!(awarded, 0);
        assert_eq!(progress.current_exp, 100);
        assert_eq!(progress.completed_ids.len(), 1);
    }

    #[test]
    fn fresh_state_has_initial_focus_score() {
        let progress = ProgressState::default();
        assert_eq!(progress.focus_score, INITIAL_FOCUS_SCORE);
        assert_eq!(progress.current_exp, 0);
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryProgressStore::default();
        let mut state = store.load().unwrap();
        state.complete_node("n1", EXP_PER_NODE);
        store.save(&state).unwrap();
        assert!(store.load().unwrap().is_completed("n1"));
    }
}
