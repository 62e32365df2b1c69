//! Undo/redo history.
//!
//! Maintains two stacks of recorded actions:
//! - `undo_stack`: actions that can be undone (most recent at the end)
//! - `redo_stack`: actions that can be redone (most recent at the end)
//!
//! Pushing a new action clears the redo stack. Undo moves an action from the
//! undo stack to the redo stack; redo moves it back. Redo never goes through
//! the normal push path, so it cannot clear the stack it is consuming.

use crate::store::action::Action;

/// Maximum number of actions kept in history. Oldest entries are silently
/// discarded once exceeded; redo past that point is impossible.
pub const MAX_HISTORY: usize = 50;

/// The undo/redo action log.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo_stack: Vec<Action>,
    redo_stack: Vec<Action>,
    max_history: usize,
}

impl History {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_history: MAX_HISTORY,
        }
    }

    #[cfg(test)]
    pub fn with_capacity_limit(max_history: usize) -> Self {
        Self {
            max_history,
            ..Self::new()
        }
    }

    /// Record a new action. Clears the redo stack (can't redo after a new
    /// action) and drops the oldest entries past the history cap.
    pub fn push(&mut self, action: Action) {
        log::debug!("📝 History: pushed '{}'", action.description());
        self.undo_stack.push(action);
        self.redo_stack.clear();

        while self.undo_stack.len() > self.max_history {
            self.undo_stack.remove(0);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Pop the most recent action for undoing; it is moved to the redo stack.
    pub fn pop_undo(&mut self) -> Option<Action> {
        let action = self.undo_stack.pop()?;
        log::debug!("⏪ Undo: '{}'", action.description());
        self.redo_stack.push(action.clone());
        Some(action)
    }

    /// Pop the most recent undone action for redoing; it is moved back onto
    /// the undo stack without clearing the redo stack.
    pub fn pop_redo(&mut self) -> Option<Action> {
        let action = self.redo_stack.pop()?;
        log::debug!("⏩ Redo: '{}'", action.description());
        self.undo_stack.push(action.clone());
        Some(action)
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(|a| a.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|a| a.description())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;
    use crate::store::action::ActionKind;

    fn create_action(id: u64) -> Action {
        Action::new(
            ActionKind::CreateBox {
                created: BoundingBox::new(id, 0.1, 0.1, 0.2, 0.2, 0),
            },
            1,
        )
    }

    #[test]
    fn test_basic_undo_redo_movement() {
        let mut history = History::new();
        assert!(!history.can_undo());
        assert!(!history.can_redo());

        history.push(create_action(1));
        assert!(history.can_undo());
        assert!(!history.can_redo());

        assert!(history.pop_undo().is_some());
        assert!(!history.can_undo());
        assert!(history.can_redo());

        assert!(history.pop_redo().is_some());
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history = History::new();
        history.push(create_action(1));
        history.pop_undo();
        assert!(history.can_redo());

        history.push(create_action(2));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_history_cap() {
        let mut history = History::with_capacity_limit(3);
        for id in 0..5 {
            history.push(create_action(id));
        }
        assert_eq!(history.undo_count(), 3);
    }

    #[test]
    fn test_redo_does_not_clear_redo_stack() {
        let mut history = History::new();
        history.push(create_action(1));
        history.push(create_action(2));
        history.pop_undo();
        history.pop_undo();
        assert_eq!(history.redo_count(), 2);

        history.pop_redo();
        // One consumed, one still redoable.
        assert_eq!(history.redo_count(), 1);
        assert_eq!(history.undo_count(), 1);
    }
}
