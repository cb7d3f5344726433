//! Undo History
//!
//! Placement and transform changes are registered as [`UndoRecord`]s; the
//! history only stores them and hands them back, the scene applies them.

use crate::game::entity::EntityId;
use crate::game::scene::UndoRecord;

pub trait UndoHistory {
    fn register(&mut self, record: UndoRecord);

    /// Record to reverse, moving it onto the redo side.
    fn undo(&mut self) -> Option<UndoRecord>;

    fn redo(&mut self) -> Option<UndoRecord>;

    /// Forget every record touching one of `entities`.
    fn clear_for(&mut self, entities: &[EntityId]);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// UNDO LOG
// ============================================================================

/// Maximum number of records kept; the oldest are dropped first.
const MAX_UNDO_SIZE: usize = 50;

/// Bounded linear history with a cursor. Records at `[0..cursor]` are
/// undoable, records at `[cursor..len]` are redoable.
#[derive(Debug, Clone)]
pub struct UndoLog {
    records: Vec<UndoRecord>,
    cursor: usize,
    max_size: usize,
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoLog {
    pub fn new() -> Self {
        Self::with_capacity(MAX_UNDO_SIZE)
    }

    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            records: Vec::new(),
            cursor: 0,
            max_size: max_size.max(1),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.records.len()
    }
}

impl UndoHistory for UndoLog {
    fn register(&mut self, record: UndoRecord) {
        // Discard redo history
        self.records.truncate(self.cursor);
        self.records.push(record);
        if self.records.len() > self.max_size {
            let excess = self.records.len() - self.max_size;
            self.records.drain(0..excess);
        }
        self.cursor = self.records.len();
    }

    fn undo(&mut self) -> Option<UndoRecord> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.records[self.cursor].clone())
    }

    fn redo(&mut self) -> Option<UndoRecord> {
        let record = self.records.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(record)
    }

    fn clear_for(&mut self, entities: &[EntityId]) {
        let before_cursor = self.records[..self.cursor]
            .iter()
            .filter(|r| !r.entities().iter().any(|e| entities.contains(e)))
            .count();
        self.records.retain(|r| !r.entities().iter().any(|e| entities.contains(e)));
        self.cursor = before_cursor;
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
