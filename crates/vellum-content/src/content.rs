//! Rope-backed mutable character buffer with tracked positions.

use std::cell::RefCell;
use std::rc::Rc;

use ropey::Rope;
use tracing::trace;

use crate::edit::{InsertEdit, RemoveEdit};
use crate::position::{Bias, CapturedPosition, PositionTable, TextPosition};

/// Contract violations against the content layer. Offsets are never clamped;
/// a bad offset is a caller bug and surfaces immediately.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("offset {offset} out of bounds (content length {len})")]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[error("range at offset {offset} with length {length} out of bounds (content length {len})")]
    RangeOutOfBounds {
        offset: usize,
        length: usize,
        len: usize,
    },
}

struct ContentInner {
    rope: Rope,
    positions: PositionTable,
}

/// Owns the raw character sequence of a document.
///
/// `Content` is a cheap clonable handle; the document and every edit record
/// referring back to it share one buffer. The engine is single-threaded and
/// synchronous, so interior mutability is confined to this handle.
#[derive(Clone)]
pub struct Content {
    inner: Rc<RefCell<ContentInner>>,
}

impl Content {
    pub fn new(text: &str) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ContentInner {
                rope: Rope::from_str(text),
                positions: PositionTable::default(),
            })),
        }
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.inner.borrow().rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn char_at(&self, offset: usize) -> Result<char, ContentError> {
        let inner = self.inner.borrow();
        if offset >= inner.rope.len_chars() {
            return Err(ContentError::OffsetOutOfBounds {
                offset,
                len: inner.rope.len_chars(),
            });
        }
        Ok(inner.rope.char(offset))
    }

    /// Slice `length` chars starting at `offset`. A zero-length slice of any
    /// in-range offset is permitted and returns the empty string.
    pub fn text_at(&self, offset: usize, length: usize) -> Result<String, ContentError> {
        let inner = self.inner.borrow();
        check_range(offset, length, inner.rope.len_chars())?;
        Ok(inner.rope.slice(offset..offset + length).to_string())
    }

    /// Append the slice `[offset, offset + length)` onto `out`.
    pub fn copy_into(
        &self,
        out: &mut String,
        offset: usize,
        length: usize,
    ) -> Result<(), ContentError> {
        let inner = self.inner.borrow();
        check_range(offset, length, inner.rope.len_chars())?;
        for chunk in inner.rope.slice(offset..offset + length).chunks() {
            out.push_str(chunk);
        }
        Ok(())
    }

    /// Whole buffer as an owned string.
    pub fn text(&self) -> String {
        self.inner.borrow().rope.to_string()
    }

    /// Insert `text` at `offset`, shifting tracked positions, and return the
    /// edit that reverses the insertion.
    pub fn insert(&self, offset: usize, text: &str) -> Result<InsertEdit, ContentError> {
        self.apply_insert(offset, text, &[])?;
        Ok(InsertEdit::new(self.clone(), offset, text))
    }

    /// Single-character variant of [`insert`](Self::insert).
    pub fn insert_char(&self, offset: usize, ch: char) -> Result<InsertEdit, ContentError> {
        let mut buf = [0u8; 4];
        self.insert(offset, ch.encode_utf8(&mut buf))
    }

    /// Remove `length` chars at `offset`. Positions inside the range collapse
    /// to its start; the returned edit re-inserts the removed text and puts
    /// the collapsed positions back where they were.
    pub fn remove(&self, offset: usize, length: usize) -> Result<RemoveEdit, ContentError> {
        let removed = self.text_at(offset, length)?;
        let captured = self.apply_remove(offset, length)?;
        Ok(RemoveEdit::new(self.clone(), offset, removed, captured))
    }

    /// Create a tracked position at `offset`. The position stays valid for as
    /// long as the handle lives; the content holds only a weak back-reference.
    pub fn create_position(&self, offset: usize, bias: Bias) -> Result<TextPosition, ContentError> {
        let mut inner = self.inner.borrow_mut();
        let len = inner.rope.len_chars();
        if offset > len {
            return Err(ContentError::OffsetOutOfBounds { offset, len });
        }
        Ok(inner.positions.create(offset, bias))
    }

    /// Live tracked positions (diagnostics).
    pub fn position_count(&self) -> usize {
        self.inner.borrow().positions.live_count()
    }

    /// True when both handles share one buffer.
    pub fn same_buffer(&self, other: &Content) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Raw insertion used both by [`insert`](Self::insert) and by edit
    /// replay; shifts positions and then restores any captured ones.
    pub(crate) fn apply_insert(
        &self,
        offset: usize,
        text: &str,
        restore: &[CapturedPosition],
    ) -> Result<(), ContentError> {
        let mut inner = self.inner.borrow_mut();
        let len = inner.rope.len_chars();
        if offset > len {
            return Err(ContentError::OffsetOutOfBounds { offset, len });
        }
        inner.rope.insert(offset, text);
        let chars = text.chars().count();
        inner.positions.shift_for_insert(offset, chars);
        inner.positions.restore(restore);
        trace!(target: "content.edit", offset, chars, "insert");
        Ok(())
    }

    /// Raw removal used both by [`remove`](Self::remove) and by edit replay.
    pub(crate) fn apply_remove(
        &self,
        offset: usize,
        length: usize,
    ) -> Result<Vec<CapturedPosition>, ContentError> {
        let mut inner = self.inner.borrow_mut();
        check_range(offset, length, inner.rope.len_chars())?;
        inner.rope.remove(offset..offset + length);
        let captured = inner.positions.shift_for_remove(offset, length);
        trace!(target: "content.edit", offset, chars = length, "remove");
        Ok(captured)
    }
}

impl std::fmt::Debug for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Content").field("len", &self.len()).finish()
    }
}

fn check_range(offset: usize, length: usize, len: usize) -> Result<(), ContentError> {
    if offset + length > len {
        return Err(ContentError::RangeOutOfBounds {
            offset,
            length,
            len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_and_copy() {
        let c = Content::new("hello world");
        assert_eq!(c.len(), 11);
        assert_eq!(c.text_at(6, 5).unwrap(), "world");
        let mut out = String::from(">");
        c.copy_into(&mut out, 0, 5).unwrap();
        assert_eq!(out, ">hello");
    }

    #[test]
    fn zero_length_slice_is_permitted() {
        let c = Content::new("abc");
        assert_eq!(c.text_at(3, 0).unwrap(), "");
        let mut out = String::new();
        c.copy_into(&mut out, 1, 0).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn out_of_range_is_an_error_not_a_clamp() {
        let c = Content::new("abc");
        assert!(matches!(
            c.text_at(2, 5),
            Err(ContentError::RangeOutOfBounds { .. })
        ));
        assert!(c.insert(4, "x").is_err());
        assert!(c.remove(0, 4).is_err());
        assert!(c.create_position(4, Bias::Forward).is_err());
        assert_eq!(c.text(), "abc");
    }

    #[test]
    fn insert_shifts_positions_by_bias() {
        let c = Content::new("hello world");
        let fwd = c.create_position(6, Bias::Forward).unwrap();
        let back = c.create_position(6, Bias::Backward).unwrap();
        c.insert(6, "beautiful ").unwrap();
        assert_eq!(c.text(), "hello beautiful world");
        assert_eq!(fwd.offset(), 16);
        assert_eq!(back.offset(), 6);
    }

    #[test]
    fn insert_char_behaves_like_a_one_char_insert() {
        use crate::edit::UndoableEdit;
        let c = Content::new("ac");
        let edit = c.insert_char(1, 'é').unwrap();
        assert_eq!(c.text(), "aéc");
        edit.undo().unwrap();
        assert_eq!(c.text(), "ac");
    }

    #[test]
    fn multibyte_offsets_are_char_indices() {
        let c = Content::new("héllo");
        assert_eq!(c.len(), 5);
        assert_eq!(c.char_at(1).unwrap(), 'é');
        c.insert(2, "éé").unwrap();
        assert_eq!(c.text(), "héééllo");
        assert_eq!(c.len(), 7);
    }
}
