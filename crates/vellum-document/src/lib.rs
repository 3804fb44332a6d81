//! Document layer: structural node tree, per-mutation edit records, the
//! filter-chain interception pipeline, synchronous event dispatch, and undo
//! history.
//!
//! A mutation runs fully on the calling thread: filter chain → content edit →
//! structure sync → `DocumentModified` → `UndoableEditCreated`, and every
//! subscribed view settles before the mutating call returns.

mod document;
mod element;
mod events;
mod filter;
mod history;
mod info;
mod structure;
mod tree;

pub use document::{DocumentError, TextDocument};
pub use element::ElementEdit;
pub use events::{DocumentEvents, EventDispatcher, Subscription};
pub use filter::{DocumentFilter, FilterChain, LineBreakFilter, MaxLengthFilter, NfcFilter};
pub use history::{HISTORY_MAX, UndoHistory};
pub use info::{ChangeKind, DocumentChange, DocumentModified, EditInfo, EditOrigin};
pub use structure::{ParagraphStructure, RemovePlan, StructureSync};
pub use tree::{LevelReplace, NodeId, PathStep, ReplaceOutcome, TextTree, TreePath};
