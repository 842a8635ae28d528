
pub mod memento;

use memento::Memento;

/// Undo/redo stacks. New entries are offered to the top of the undo stack
/// for coalescing before they are pushed.
pub struct History {
    undo_stack: Vec<Memento>,
    redo_stack: Vec<Memento>,
}

impl History {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Stores an undoable action. With `allow_merge`, the current top entry
    /// may absorb the memento instead, keeping its earlier snapshot. Either
    /// way the redo stack is gone: a fresh action invalidates it.
    pub fn make_undoable(&mut self, memento: Memento, allow_merge: bool) {
        self.redo_stack.clear();
        if allow_merge
            && let Some(top) = self.undo_stack.last()
            && top.try_merge(&memento)
        {
            return;
        }
        self.undo_stack.push(memento);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub(crate) fn pop_undo(&mut self) -> Option<Memento> {
        self.undo_stack.pop()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<Memento> {
        self.redo_stack.pop()
    }

    pub(crate) fn push_undo(&mut self, memento: Memento) {
        self.undo_stack.push(memento);
    }

    pub(crate) fn push_redo(&mut self, memento: Memento) {
        self.redo_stack.push(memento);
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
