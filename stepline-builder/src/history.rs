//! Builder snapshots and their undo/redo stacks
//!
//! Every committed edit replaces the whole [`BuilderState`]; the previous
//! value goes onto `past`. Undo and redo only move whole snapshots between
//! the two stacks, so no inverse operations are needed.

use serde::{Deserialize, Serialize};
use stepline_core::domain::step::{Step, WalletSelection};

/// Snapshot of the committed authoring state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuilderState {
    pub steps: Vec<Step>,
    /// Wallet and version of the last wallet action added in this session
    pub last_wallet: Option<WalletSelection>,
}

/// Undo/redo stacks, unbounded for the life of a builder
#[derive(Debug, Clone, Default)]
pub struct History {
    past: Vec<BuilderState>,
    future: Vec<BuilderState>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state that a committed edit replaced
    pub fn record(&mut self, previous: BuilderState) {
        self.past.push(previous);
        self.future.clear();
    }

    /// Swap `current` with the latest past snapshot; false if there is none
    pub fn undo(&mut self, current: &mut BuilderState) -> bool {
        let Some(previous) = self.past.pop() else {
            return false;
        };
        self.future.push(std::mem::replace(current, previous));
        true
    }

    /// Swap `current` with the latest undone snapshot; false if there is none
    pub fn redo(&mut self, current: &mut BuilderState) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        self.past.push(std::mem::replace(current, next));
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(n: usize) -> BuilderState {
        BuilderState {
            steps: Vec::with_capacity(n),
            last_wallet: None,
        }
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut history = History::new();
        let mut current = state(0);
        assert!(!history.undo(&mut current));
        assert!(!history.redo(&mut current));
    }

    #[test]
    fn test_record_clears_future() {
        let mut history = History::new();
        let mut current = state(0);
        history.record(state(0));
        assert!(history.undo(&mut current));
        assert!(history.can_redo());

        history.record(state(0));
        assert!(!history.can_redo());
        assert_eq!(history.past_len(), 1);
    }

    #[test]
    fn test_undo_then_redo_moves_one_snapshot() {
        let mut history = History::new();
        let mut current = state(0);
        history.record(state(0));
        history.undo(&mut current);
        assert_eq!((history.past_len(), history.future_len()), (0, 1));
        history.redo(&mut current);
        assert_eq!((history.past_len(), history.future_len()), (1, 0));
    }
}
