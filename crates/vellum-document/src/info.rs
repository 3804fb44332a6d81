//! Per-mutation edit records.
//!
//! [`EditInfo`] is the compound edit scoped to one document mutation call:
//! the content edit first, then every node-replacement edit it forced, plus
//! an index from affected node ids (old and new identity) to their element
//! edit so view synchronization answers "is this node affected" in O(1).

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use vellum_content::{CompoundEdit, EditError, UndoableEdit};

use crate::element::ElementEdit;
use crate::events::DocumentEvents;
use crate::tree::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Remove,
}

/// The span a document mutation touched, in chars.
#[derive(Debug, Clone, Copy)]
pub struct DocumentChange {
    pub offset: usize,
    pub length: usize,
    pub kind: ChangeKind,
}

impl DocumentChange {
    /// The change an undo of this change amounts to.
    pub fn inverse(self) -> Self {
        Self {
            offset: self.offset,
            length: self.length,
            kind: match self.kind {
                ChangeKind::Insert => ChangeKind::Remove,
                ChangeKind::Remove => ChangeKind::Insert,
            },
        }
    }
}

/// Whether a modification notification comes from a fresh mutation or from
/// replaying an edit. Structural view patching swaps the roles of
/// removed/added nodes when the replay direction is `Undo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOrigin {
    Apply,
    Undo,
    Redo,
}

/// Payload of the document-modified event.
#[derive(Clone)]
pub struct DocumentModified {
    pub change: DocumentChange,
    pub origin: EditOrigin,
    /// The full edit record, when one exists for this notification.
    pub edit: Option<Rc<EditInfo>>,
}

/// Compound undoable edit for a single document mutation.
pub struct EditInfo {
    change: DocumentChange,
    compound: CompoundEdit,
    elements: Vec<ElementEdit>,
    affected: AHashMap<NodeId, usize>,
    events: DocumentEvents,
    self_ref: RefCell<Weak<EditInfo>>,
}

impl EditInfo {
    pub(crate) fn begin(change: DocumentChange, events: DocumentEvents) -> Self {
        let name = match change.kind {
            ChangeKind::Insert => "insert",
            ChangeKind::Remove => "remove",
        };
        Self {
            change,
            compound: CompoundEdit::new(name),
            elements: Vec::new(),
            affected: AHashMap::new(),
            events,
            self_ref: RefCell::new(Weak::new()),
        }
    }

    pub(crate) fn push_edit(&mut self, edit: Box<dyn UndoableEdit>) {
        self.compound.push(edit);
    }

    pub(crate) fn push_element(&mut self, edit: ElementEdit) {
        let idx = self.elements.len();
        // Parents last: a node that is both one level's replaced child and
        // another level's parent must resolve to the edit it parents.
        for id in edit.removed().iter().chain(edit.added()) {
            self.affected.entry(*id).or_insert(idx);
        }
        self.affected.insert(edit.parent_before(), idx);
        self.affected.insert(edit.parent_after(), idx);
        self.compound.push(Box::new(edit.clone()));
        self.elements.push(edit);
    }

    pub(crate) fn seal(&mut self) {
        self.compound.seal();
    }

    /// Seal the self-reference in; notifications raised from `undo`/`redo`
    /// carry the edit along.
    pub(crate) fn into_shared(self) -> Rc<Self> {
        let rc = Rc::new(self);
        *rc.self_ref.borrow_mut() = Rc::downgrade(&rc);
        rc
    }

    pub fn change(&self) -> DocumentChange {
        self.change
    }

    /// True when this mutation replaced nodes (vs. a pure text change).
    pub fn is_structural(&self) -> bool {
        !self.elements.is_empty()
    }

    pub fn element_edits(&self) -> &[ElementEdit] {
        &self.elements
    }

    /// O(1) lookup: the element edit touching `node`, under either its old
    /// or its new identity.
    pub fn element_edit_for(&self, node: NodeId) -> Option<&ElementEdit> {
        self.affected.get(&node).map(|idx| &self.elements[*idx])
    }

    /// The element edit whose *parent* is `node` (old or new identity); the
    /// edit a view mirroring `node` must apply to its child list.
    pub fn element_edit_for_parent(&self, node: NodeId) -> Option<&ElementEdit> {
        self.element_edit_for(node)
            .filter(|e| e.parent_before() == node || e.parent_after() == node)
            .or_else(|| {
                self.elements
                    .iter()
                    .find(|e| e.parent_before() == node || e.parent_after() == node)
            })
    }

    pub fn is_node_affected(&self, node: NodeId) -> bool {
        self.affected.contains_key(&node)
    }

    fn notify(&self, change: DocumentChange, origin: EditOrigin) {
        self.events.modified().dispatch(&DocumentModified {
            change,
            origin,
            edit: self.self_ref.borrow().upgrade(),
        });
    }
}

impl UndoableEdit for EditInfo {
    /// Replays children in reverse, then raises a single document-level
    /// notification for the whole compound (not one per child).
    fn undo(&self) -> Result<(), EditError> {
        self.compound.undo()?;
        self.notify(self.change.inverse(), EditOrigin::Undo);
        Ok(())
    }

    fn redo(&self) -> Result<(), EditError> {
        self.compound.redo()?;
        self.notify(self.change, EditOrigin::Redo);
        Ok(())
    }

    fn significant(&self) -> bool {
        self.compound.significant()
    }

    fn display_name(&self) -> &str {
        self.compound.display_name()
    }
}

impl std::fmt::Debug for EditInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditInfo")
            .field("change", &self.change)
            .field("elements", &self.elements.len())
            .finish()
    }
}
