//! Undoable edit framework.
//!
//! Every content mutation produces an edit object capturing enough data to
//! reverse itself. Compound edits aggregate children in insertion order and
//! replay them in reverse on undo, forward on redo; later children may depend
//! on state produced by earlier ones, so the ordering is load-bearing.

use std::cell::RefCell;

use crate::content::{Content, ContentError};
use crate::position::CapturedPosition;

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error(transparent)]
    Content(#[from] ContentError),
    /// A compound edit was replayed before [`CompoundEdit::seal`] closed it.
    #[error("compound edit '{0}' is still aggregating children")]
    InProgress(String),
}

/// A reversible operation.
///
/// `undo` and `redo` must be exact inverses; callers (the undo history)
/// guarantee strict alternation, so implementations may assume the buffer is
/// in the state their counterpart left it in.
pub trait UndoableEdit {
    fn undo(&self) -> Result<(), EditError>;
    fn redo(&self) -> Result<(), EditError>;

    /// Whether this edit is worth an entry on an undo stack. Bookkeeping
    /// edits report `false` and are replayed only as part of a compound.
    fn significant(&self) -> bool {
        true
    }

    fn display_name(&self) -> &str;
}

/// Reverses an insertion by removing the same span.
pub struct InsertEdit {
    content: Content,
    offset: usize,
    text: String,
    chars: usize,
    /// Positions captured by the most recent undo so a redo can restore them.
    captured: RefCell<Vec<CapturedPosition>>,
}

impl InsertEdit {
    pub(crate) fn new(content: Content, offset: usize, text: &str) -> Self {
        Self {
            content,
            offset,
            text: text.to_owned(),
            chars: text.chars().count(),
            captured: RefCell::new(Vec::new()),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Inserted length in chars.
    pub fn chars(&self) -> usize {
        self.chars
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl UndoableEdit for InsertEdit {
    fn undo(&self) -> Result<(), EditError> {
        let captured = self.content.apply_remove(self.offset, self.chars)?;
        *self.captured.borrow_mut() = captured;
        Ok(())
    }

    fn redo(&self) -> Result<(), EditError> {
        let captured = self.captured.borrow();
        self.content
            .apply_insert(self.offset, &self.text, &captured)?;
        Ok(())
    }

    fn display_name(&self) -> &str {
        "insert"
    }
}

/// Reverses a removal by re-inserting the captured text and restoring the
/// offsets of positions that collapsed inside the removed range.
pub struct RemoveEdit {
    content: Content,
    offset: usize,
    text: String,
    chars: usize,
    captured: RefCell<Vec<CapturedPosition>>,
}

impl RemoveEdit {
    pub(crate) fn new(
        content: Content,
        offset: usize,
        text: String,
        captured: Vec<CapturedPosition>,
    ) -> Self {
        let chars = text.chars().count();
        Self {
            content,
            offset,
            text,
            chars,
            captured: RefCell::new(captured),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Removed length in chars.
    pub fn chars(&self) -> usize {
        self.chars
    }

    /// The removed text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl UndoableEdit for RemoveEdit {
    fn undo(&self) -> Result<(), EditError> {
        let captured = self.captured.borrow();
        self.content
            .apply_insert(self.offset, &self.text, &captured)?;
        Ok(())
    }

    fn redo(&self) -> Result<(), EditError> {
        let captured = self.content.apply_remove(self.offset, self.chars)?;
        *self.captured.borrow_mut() = captured;
        Ok(())
    }

    fn display_name(&self) -> &str {
        "remove"
    }
}

/// Aggregates child edits for one logical operation.
///
/// Children are pushed while the compound is open and replayed as a unit once
/// sealed: undo walks them in reverse insertion order, redo forward.
pub struct CompoundEdit {
    name: String,
    edits: Vec<Box<dyn UndoableEdit>>,
    open: bool,
}

impl CompoundEdit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            edits: Vec::new(),
            open: true,
        }
    }

    pub fn push(&mut self, edit: Box<dyn UndoableEdit>) {
        debug_assert!(self.open, "push after seal");
        self.edits.push(edit);
    }

    /// Close aggregation; the compound becomes replayable.
    pub fn seal(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

impl UndoableEdit for CompoundEdit {
    fn undo(&self) -> Result<(), EditError> {
        if self.open {
            return Err(EditError::InProgress(self.name.clone()));
        }
        for edit in self.edits.iter().rev() {
            edit.undo()?;
        }
        Ok(())
    }

    fn redo(&self) -> Result<(), EditError> {
        if self.open {
            return Err(EditError::InProgress(self.name.clone()));
        }
        for edit in &self.edits {
            edit.redo()?;
        }
        Ok(())
    }

    fn significant(&self) -> bool {
        self.edits.iter().any(|e| e.significant())
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Bias;

    #[test]
    fn insert_undo_redo_round_trip() {
        let c = Content::new("hello world");
        let edit = c.insert(6, "beautiful ").unwrap();
        assert_eq!(c.text(), "hello beautiful world");
        edit.undo().unwrap();
        assert_eq!(c.text(), "hello world");
        edit.redo().unwrap();
        assert_eq!(c.text(), "hello beautiful world");
    }

    #[test]
    fn remove_undo_restores_collapsed_positions() {
        let c = Content::new("hello world");
        let inside = c.create_position(8, Bias::Forward).unwrap();
        let edit = c.remove(5, 6).unwrap();
        assert_eq!(c.text(), "hello");
        assert_eq!(inside.offset(), 5);
        edit.undo().unwrap();
        assert_eq!(c.text(), "hello world");
        assert_eq!(inside.offset(), 8);
    }

    #[test]
    fn insert_undo_restores_position_on_redo() {
        let c = Content::new("ab");
        let edit = c.insert(1, "xyz").unwrap();
        let mid = c.create_position(2, Bias::Forward).unwrap();
        edit.undo().unwrap();
        assert_eq!(mid.offset(), 1);
        edit.redo().unwrap();
        assert_eq!(mid.offset(), 2);
    }

    #[test]
    fn compound_replays_children_in_reverse_on_undo() {
        let c = Content::new("abc");
        let mut compound = CompoundEdit::new("typing");
        compound.push(Box::new(c.insert(3, "d").unwrap()));
        compound.push(Box::new(c.insert(4, "e").unwrap()));
        assert!(compound.undo().is_err(), "open compound must not replay");
        compound.seal();
        compound.undo().unwrap();
        assert_eq!(c.text(), "abc");
        compound.redo().unwrap();
        assert_eq!(c.text(), "abcde");
    }

    #[test]
    fn empty_compound_is_insignificant() {
        let mut compound = CompoundEdit::new("noop");
        compound.seal();
        assert!(!compound.significant());
    }
}
