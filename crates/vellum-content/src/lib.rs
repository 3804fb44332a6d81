//! Document content layer: a rope-backed character buffer, live tracked
//! positions, and the undoable-edit framework built on top of both.
//!
//! Contract:
//! - All offsets are `char` indices into the buffer, half-open ranges.
//! - Out-of-range offsets are contract violations and surface as
//!   [`ContentError`]; the content layer never clamps (clamping would corrupt
//!   position-tracking invariants).
//! - Every mutation returns an edit that exactly reverses it, including the
//!   offsets of tracked positions that collapsed inside a removed range.

mod content;
mod edit;
mod position;

pub use content::{Content, ContentError};
pub use edit::{CompoundEdit, EditError, InsertEdit, RemoveEdit, UndoableEdit};
pub use position::{Bias, TextPosition};
