//! Node-replacement edits.

use vellum_content::{EditError, UndoableEdit};

use crate::tree::{LevelReplace, NodeId, TextTree};

/// Records one level of a copy-on-write child-list replacement.
///
/// Because nodes are immutable and the arena retains superseded snapshots,
/// reversing a structural change only requires swapping the tree's root back
/// to the recorded snapshot; the deltas (`index`/`removed`/`added`) exist for
/// view synchronization, which mirrors node lifecycle onto view lifecycle.
#[derive(Clone)]
pub struct ElementEdit {
    tree: TextTree,
    level: LevelReplace,
    root_before: NodeId,
    root_after: NodeId,
}

impl ElementEdit {
    pub(crate) fn new(tree: TextTree, level: LevelReplace, root_before: NodeId, root_after: NodeId) -> Self {
        Self {
            tree,
            level,
            root_before,
            root_after,
        }
    }

    /// Node whose child list changed, pre-replacement identity.
    pub fn parent_before(&self) -> NodeId {
        self.level.parent_before
    }

    /// The replacement parent node.
    pub fn parent_after(&self) -> NodeId {
        self.level.parent_after
    }

    /// Child slot at which the removal/insertion happened.
    pub fn index(&self) -> usize {
        self.level.index
    }

    pub fn removed(&self) -> &[NodeId] {
        &self.level.removed
    }

    pub fn added(&self) -> &[NodeId] {
        &self.level.added
    }

    pub fn root_before(&self) -> NodeId {
        self.root_before
    }

    pub fn root_after(&self) -> NodeId {
        self.root_after
    }
}

impl UndoableEdit for ElementEdit {
    fn undo(&self) -> Result<(), EditError> {
        self.tree.set_root(self.root_before);
        Ok(())
    }

    fn redo(&self) -> Result<(), EditError> {
        self.tree.set_root(self.root_after);
        Ok(())
    }

    /// Structural bookkeeping never earns its own undo-stack entry; it rides
    /// along inside the compound for the mutation that produced it.
    fn significant(&self) -> bool {
        false
    }

    fn display_name(&self) -> &str {
        "structure"
    }
}

impl std::fmt::Debug for ElementEdit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementEdit")
            .field("index", &self.level.index)
            .field("removed", &self.level.removed)
            .field("added", &self.level.added)
            .finish()
    }
}
