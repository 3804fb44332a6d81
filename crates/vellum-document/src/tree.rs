//! Structural node tree over the document's text.
//!
//! Nodes live in an append-only arena addressed by stable [`NodeId`]s and are
//! immutable once created: the only mutator, [`TextTree::replace`], is a pure
//! copy-on-write splice returning a replacement node. Old roots therefore
//! remain valid snapshots, which is what lets a structural undo swap the root
//! back without touching the arena.
//!
//! Node ranges are half-open `[offset, end_offset)` and are backed by shared
//! [`TextPosition`]s: adjacent siblings share their boundary position object
//! and a parent shares its edges with its first/last child. Contiguity is
//! structural, and ranges track content edits without any tree rebuilding.
//! Interior boundaries are `Backward`-biased (text typed at a paragraph
//! boundary joins the following paragraph); the root's trailing edge is
//! `Forward`-biased so the tree always spans the content.

use std::cell::RefCell;
use std::rc::Rc;

use vellum_content::TextPosition;

/// Stable arena index of a node. Ids are never reused; a replaced node's id
/// keeps resolving to its (old) snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct NodeData {
    start: TextPosition,
    end: TextPosition,
    children: Vec<NodeId>,
}

/// One descent step: `slot`-th child of `parent`.
#[derive(Debug, Clone, Copy)]
pub struct PathStep {
    pub parent: NodeId,
    pub slot: usize,
}

/// Ancestor chain from the root down to a target node, used to localize an
/// edit to the shallowest affected subtree and to rebuild ancestors after a
/// copy-on-write replacement.
#[derive(Debug, Clone)]
pub struct TreePath {
    steps: Vec<PathStep>,
    target: NodeId,
}

impl TreePath {
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn depth(&self) -> usize {
        self.steps.len()
    }
}

/// One level of a [`TextTree::splice`]: the child-list delta plus the parent
/// node's before/after identity.
#[derive(Debug, Clone)]
pub struct LevelReplace {
    pub parent_before: NodeId,
    pub parent_after: NodeId,
    pub index: usize,
    pub removed: Vec<NodeId>,
    pub added: Vec<NodeId>,
}

/// Result of a copy-on-write splice: the new root plus the per-level deltas,
/// innermost first.
#[derive(Debug, Clone)]
pub struct ReplaceOutcome {
    pub new_root: NodeId,
    pub levels: Vec<LevelReplace>,
}

struct TreeInner {
    arena: Vec<NodeData>,
    root: Option<NodeId>,
}

/// Shared handle to a document's node tree.
#[derive(Clone)]
pub struct TextTree {
    inner: Rc<RefCell<TreeInner>>,
}

impl Default for TextTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TextTree {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(TreeInner {
                arena: Vec::new(),
                root: None,
            })),
        }
    }

    pub fn new_leaf(&self, start: TextPosition, end: TextPosition) -> NodeId {
        self.alloc(NodeData {
            start,
            end,
            children: Vec::new(),
        })
    }

    /// Allocate a branch over `children`; its range spans from the first
    /// child's start to the last child's end (shared position objects).
    pub fn new_branch(&self, children: Vec<NodeId>) -> NodeId {
        debug_assert!(!children.is_empty(), "branch must have children");
        let (start, end) = {
            let inner = self.inner.borrow();
            let first = &inner.arena[children[0].index()];
            let last = &inner.arena[children[children.len() - 1].index()];
            (first.start.clone(), last.end.clone())
        };
        self.alloc(NodeData {
            start,
            end,
            children,
        })
    }

    pub fn root(&self) -> NodeId {
        self.inner
            .borrow()
            .root
            .expect("document tree has been initialized")
    }

    pub(crate) fn set_root(&self, id: NodeId) {
        self.inner.borrow_mut().root = Some(id);
    }

    pub fn node_count(&self) -> usize {
        self.inner.borrow().arena.len()
    }

    pub fn offset(&self, id: NodeId) -> usize {
        self.inner.borrow().arena[id.index()].start.offset()
    }

    pub fn end_offset(&self, id: NodeId) -> usize {
        self.inner.borrow().arena[id.index()].end.offset()
    }

    pub fn start_position(&self, id: NodeId) -> TextPosition {
        self.inner.borrow().arena[id.index()].start.clone()
    }

    pub fn end_position(&self, id: NodeId) -> TextPosition {
        self.inner.borrow().arena[id.index()].end.clone()
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.inner.borrow().arena[id.index()].children.is_empty()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.inner.borrow().arena[id.index()].children.len()
    }

    pub fn child(&self, id: NodeId, slot: usize) -> NodeId {
        self.inner.borrow().arena[id.index()].children[slot]
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.inner.borrow().arena[id.index()].children.clone()
    }

    /// True when `offset` lies in the node's half-open range.
    pub fn contains(&self, id: NodeId, offset: usize) -> bool {
        offset >= self.offset(id) && offset < self.end_offset(id)
    }

    /// Slot of the child covering `offset`. An offset equal to the parent's
    /// end (or covered by no child, e.g. only by empty trailing children)
    /// resolves to the last slot.
    pub fn child_slot_at(&self, parent: NodeId, offset: usize) -> usize {
        let inner = self.inner.borrow();
        let children = &inner.arena[parent.index()].children;
        debug_assert!(!children.is_empty(), "slot lookup on a leaf");
        for (slot, child) in children.iter().enumerate() {
            if offset < inner.arena[child.index()].end.offset() {
                return slot;
            }
        }
        children.len() - 1
    }

    /// Descend from the root to the leaf covering `offset`, recording the
    /// `(parent, slot)` chain along the way.
    pub fn path_to_leaf_at(&self, offset: usize) -> TreePath {
        let mut steps = Vec::new();
        let mut node = self.root();
        while !self.is_leaf(node) {
            let slot = self.child_slot_at(node, offset);
            let child = self.child(node, slot);
            steps.push(PathStep { parent: node, slot });
            node = child;
        }
        TreePath {
            steps,
            target: node,
        }
    }

    /// Copy-on-write splice of a node's child list: remove `removed_count`
    /// children at `index`, insert `added` there, and return the replacement
    /// node. `self` is untouched; the old node remains valid.
    pub fn replace(
        &self,
        node: NodeId,
        index: usize,
        removed_count: usize,
        added: &[NodeId],
    ) -> NodeId {
        let children = {
            let inner = self.inner.borrow();
            let old = &inner.arena[node.index()].children;
            debug_assert!(index + removed_count <= old.len(), "splice in range");
            let mut children = Vec::with_capacity(old.len() - removed_count + added.len());
            children.extend_from_slice(&old[..index]);
            children.extend_from_slice(added);
            children.extend_from_slice(&old[index + removed_count..]);
            children
        };
        self.new_branch(children)
    }

    /// Splice `parent`'s children and rebuild every ancestor named by
    /// `parent_path` (root-first), returning the new root and per-level
    /// deltas. The old root and all of its nodes remain valid.
    pub fn splice(
        &self,
        parent_path: &[PathStep],
        parent: NodeId,
        index: usize,
        removed_count: usize,
        added: &[NodeId],
    ) -> ReplaceOutcome {
        let removed: Vec<NodeId> = {
            let inner = self.inner.borrow();
            inner.arena[parent.index()].children[index..index + removed_count].to_vec()
        };
        let new_parent = self.replace(parent, index, removed_count, added);
        let mut levels = vec![LevelReplace {
            parent_before: parent,
            parent_after: new_parent,
            index,
            removed,
            added: added.to_vec(),
        }];
        let mut rebuilt = new_parent;
        for step in parent_path.iter().rev() {
            let old_child = self.child(step.parent, step.slot);
            let new_node = self.replace(step.parent, step.slot, 1, &[rebuilt]);
            levels.push(LevelReplace {
                parent_before: step.parent,
                parent_after: new_node,
                index: step.slot,
                removed: vec![old_child],
                added: vec![rebuilt],
            });
            rebuilt = new_node;
        }
        ReplaceOutcome {
            new_root: rebuilt,
            levels,
        }
    }

    /// Rebuild every ancestor along `path` after replacing its target node
    /// with `replacement`, returning the new root.
    pub fn replace_all(&self, path: &TreePath, replacement: &[NodeId]) -> ReplaceOutcome {
        let last = path
            .steps
            .last()
            .expect("replace_all requires a non-root target");
        self.splice(
            &path.steps[..path.steps.len() - 1],
            last.parent,
            last.slot,
            1,
            replacement,
        )
    }

    fn alloc(&self, data: NodeData) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        let id = NodeId(inner.arena.len() as u32);
        inner.arena.push(data);
        id
    }
}

impl std::fmt::Debug for TextTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("TextTree")
            .field("nodes", &inner.arena.len())
            .field("root", &inner.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_content::{Bias, Content};

    fn leaf(tree: &TextTree, content: &Content, a: usize, b: usize) -> NodeId {
        let start = content.create_position(a, Bias::Backward).unwrap();
        let end = content.create_position(b, Bias::Backward).unwrap();
        tree.new_leaf(start, end)
    }

    #[test]
    fn branch_spans_children() {
        let content = Content::new("abcdef");
        let tree = TextTree::new();
        let l1 = leaf(&tree, &content, 0, 3);
        let l2 = leaf(&tree, &content, 3, 6);
        let root = tree.new_branch(vec![l1, l2]);
        tree.set_root(root);
        assert_eq!(tree.offset(root), 0);
        assert_eq!(tree.end_offset(root), 6);
        assert_eq!(tree.child_slot_at(root, 2), 0);
        assert_eq!(tree.child_slot_at(root, 3), 1);
        assert_eq!(tree.child_slot_at(root, 6), 1);
    }

    #[test]
    fn path_descends_to_leaf() {
        let content = Content::new("abcdef");
        let tree = TextTree::new();
        let l1 = leaf(&tree, &content, 0, 3);
        let l2 = leaf(&tree, &content, 3, 6);
        let b1 = tree.new_branch(vec![l1]);
        let b2 = tree.new_branch(vec![l2]);
        let root = tree.new_branch(vec![b1, b2]);
        tree.set_root(root);
        let path = tree.path_to_leaf_at(4);
        assert_eq!(path.target(), l2);
        assert_eq!(path.depth(), 2);
        assert_eq!(path.steps()[0].slot, 1);
    }

    #[test]
    fn replace_is_copy_on_write() {
        let content = Content::new("abcdef");
        let tree = TextTree::new();
        let l1 = leaf(&tree, &content, 0, 3);
        let l2 = leaf(&tree, &content, 3, 6);
        let root = tree.new_branch(vec![l1, l2]);
        tree.set_root(root);

        let l2a = leaf(&tree, &content, 3, 4);
        let l2b = leaf(&tree, &content, 4, 6);
        let new_root = tree.replace(root, 1, 1, &[l2a, l2b]);
        // Old root untouched; new root shares the untouched first child.
        assert_eq!(tree.child_count(root), 2);
        assert_eq!(tree.child_count(new_root), 3);
        assert_eq!(tree.child(new_root, 0), l1);
    }

    #[test]
    fn splice_rebuilds_ancestors() {
        let content = Content::new("abcdef");
        let tree = TextTree::new();
        let l1 = leaf(&tree, &content, 0, 6);
        let para = tree.new_branch(vec![l1]);
        let root = tree.new_branch(vec![para]);
        tree.set_root(root);

        let la = leaf(&tree, &content, 0, 3);
        let lb = leaf(&tree, &content, 3, 6);
        let path = tree.path_to_leaf_at(0);
        let outcome = tree.replace_all(&path, &[la, lb]);
        assert_eq!(outcome.levels.len(), 2);
        assert_ne!(outcome.new_root, root);
        let new_para = tree.child(outcome.new_root, 0);
        assert_eq!(tree.child_count(new_para), 2);
        // Old tree still resolves.
        assert_eq!(tree.child(tree.child(root, 0), 0), l1);
    }
}
