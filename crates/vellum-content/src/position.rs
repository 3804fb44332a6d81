//! Live offset tracking across buffer mutations.
//!
//! A [`TextPosition`] resolves to a valid offset for as long as it is held;
//! the owning content shifts it on every insert/remove. The content keeps
//! weak back-references only, so dropping the last handle retires the slot.

use std::cell::Cell;
use std::rc::{Rc, Weak};

/// Disambiguates behavior for a position sitting exactly at an edit boundary.
///
/// A `Backward`-biased position at offset `k` sticks to the character before
/// it and does not advance when text is inserted at `k`; a `Forward`-biased
/// position does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PosState {
    pub offset: usize,
    pub bias: Bias,
}

/// A tracked offset into a [`Content`](crate::Content) buffer.
///
/// Clones share the same slot; the offset observed through any clone reflects
/// every edit applied since creation.
#[derive(Debug, Clone)]
pub struct TextPosition {
    cell: Rc<Cell<PosState>>,
}

impl TextPosition {
    /// Current offset, already adjusted for all edits so far.
    pub fn offset(&self) -> usize {
        self.cell.get().offset
    }

    pub fn bias(&self) -> Bias {
        self.cell.get().bias
    }

    /// True when both handles refer to the same tracked slot (not merely the
    /// same offset).
    pub fn same_slot(&self, other: &TextPosition) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

/// A position whose pre-edit offset was captured so an undo can restore it
/// exactly. Holding the `Rc` keeps the slot alive for the edit's lifetime.
#[derive(Debug, Clone)]
pub(crate) struct CapturedPosition {
    cell: Rc<Cell<PosState>>,
    offset: usize,
}

/// Bookkeeping collection of weak references to every live position.
#[derive(Debug, Default)]
pub(crate) struct PositionTable {
    slots: Vec<Weak<Cell<PosState>>>,
}

impl PositionTable {
    pub fn create(&mut self, offset: usize, bias: Bias) -> TextPosition {
        let cell = Rc::new(Cell::new(PosState { offset, bias }));
        self.slots.push(Rc::downgrade(&cell));
        TextPosition { cell }
    }

    /// Number of live tracked positions (dead slots are pruned lazily).
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|w| w.strong_count() > 0).count()
    }

    /// Shift positions for an insertion of `len` chars at `offset`.
    ///
    /// Positions strictly after the insertion point always move; a position
    /// exactly at it moves only when `Forward`-biased.
    pub fn shift_for_insert(&mut self, offset: usize, len: usize) {
        self.for_each_live(|state| {
            if state.offset > offset || (state.offset == offset && state.bias == Bias::Forward) {
                state.offset += len;
            }
        });
    }

    /// Shift positions for a removal of `len` chars at `offset`, collapsing
    /// positions inside the range to its start.
    ///
    /// Returns the pre-collapse state of every position in the closed range
    /// `[offset, offset + len]`; re-inserting the removed text alone cannot
    /// put those positions back (bias decides how they react to the insert),
    /// so the undo path restores them from this capture.
    pub fn shift_for_remove(&mut self, offset: usize, len: usize) -> Vec<CapturedPosition> {
        let mut captured = Vec::new();
        self.slots.retain(|weak| {
            let Some(cell) = weak.upgrade() else {
                return false;
            };
            let mut state = cell.get();
            if state.offset >= offset && state.offset <= offset + len {
                captured.push(CapturedPosition {
                    cell: Rc::clone(&cell),
                    offset: state.offset,
                });
            }
            if state.offset >= offset + len {
                state.offset -= len;
            } else if state.offset > offset {
                state.offset = offset;
            }
            cell.set(state);
            true
        });
        captured
    }

    /// Restore positions captured by [`shift_for_remove`](Self::shift_for_remove).
    pub fn restore(&mut self, captured: &[CapturedPosition]) {
        for cap in captured {
            let mut state = cap.cell.get();
            state.offset = cap.offset;
            cap.cell.set(state);
        }
    }

    fn for_each_live(&mut self, mut f: impl FnMut(&mut PosState)) {
        self.slots.retain(|weak| {
            let Some(cell) = weak.upgrade() else {
                return false;
            };
            let mut state = cell.get();
            f(&mut state);
            cell.set(state);
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_position_advances_at_insertion_point() {
        let mut table = PositionTable::default();
        let p = table.create(4, Bias::Forward);
        table.shift_for_insert(4, 3);
        assert_eq!(p.offset(), 7);
    }

    #[test]
    fn backward_position_holds_at_insertion_point() {
        let mut table = PositionTable::default();
        let p = table.create(4, Bias::Backward);
        table.shift_for_insert(4, 3);
        assert_eq!(p.offset(), 4);
        // Strictly-before insertions still move it.
        table.shift_for_insert(0, 2);
        assert_eq!(p.offset(), 6);
    }

    #[test]
    fn remove_collapses_interior_positions_to_range_start() {
        let mut table = PositionTable::default();
        let inside = table.create(5, Bias::Forward);
        let after = table.create(10, Bias::Backward);
        let captured = table.shift_for_remove(3, 4);
        assert_eq!(inside.offset(), 3);
        assert_eq!(after.offset(), 6);
        table.shift_for_insert(3, 4);
        table.restore(&captured);
        assert_eq!(inside.offset(), 5);
        assert_eq!(after.offset(), 10);
    }

    #[test]
    fn dead_slots_are_pruned() {
        let mut table = PositionTable::default();
        let keep = table.create(1, Bias::Forward);
        drop(table.create(2, Bias::Forward));
        table.shift_for_insert(0, 1);
        assert_eq!(table.live_count(), 1);
        assert_eq!(keep.offset(), 2);
    }
}
