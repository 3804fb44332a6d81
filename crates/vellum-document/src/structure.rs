//! Structural synchronization policies.
//!
//! The document delegates "how do nodes split and merge" to a policy object;
//! [`ParagraphStructure`] is the plain-text policy: root → one paragraph per
//! newline-terminated span → a single leaf run each. A document whose text
//! ends with a line break carries a trailing empty paragraph, so the caret
//! has a place to sit on the final (empty) line.

use tracing::trace;
use vellum_content::{Bias, Content};

use crate::document::DocumentError;
use crate::element::ElementEdit;
use crate::info::EditInfo;
use crate::tree::{NodeId, TextTree};

/// Pre-removal snapshot used by [`StructureSync::remove_update`]; captured
/// before the content mutation collapses the offsets it needs.
#[derive(Debug, Clone, Copy)]
pub struct RemovePlan {
    pub first_slot: usize,
    pub last_slot: usize,
}

/// Seam through which a concrete document kind decides node splitting and
/// merging. `insert_update`/`remove_update` run after the content mutation
/// and append any node-replacement edits onto `info`.
pub trait StructureSync {
    /// Build the initial node tree for `content`, returning the root.
    fn build(&self, tree: &TextTree, content: &Content) -> Result<NodeId, DocumentError>;

    fn insert_update(
        &self,
        tree: &TextTree,
        content: &Content,
        offset: usize,
        text: &str,
        info: &mut EditInfo,
    ) -> Result<(), DocumentError>;

    /// Called before the content removal, while boundary offsets still hold.
    fn prepare_remove(&self, tree: &TextTree, offset: usize, length: usize) -> RemovePlan;

    fn remove_update(
        &self,
        tree: &TextTree,
        content: &Content,
        plan: RemovePlan,
        info: &mut EditInfo,
    ) -> Result<(), DocumentError>;
}

/// Paragraph-per-line structure for plain text documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParagraphStructure;

impl ParagraphStructure {
    /// Allocate a paragraph (branch with one leaf run) spanning `[start, end)`.
    fn new_paragraph(
        &self,
        tree: &TextTree,
        start: vellum_content::TextPosition,
        end: vellum_content::TextPosition,
    ) -> NodeId {
        let leaf = tree.new_leaf(start, end);
        tree.new_branch(vec![leaf])
    }

    fn push_levels(
        &self,
        tree: &TextTree,
        info: &mut EditInfo,
        levels: Vec<crate::tree::LevelReplace>,
        root_before: NodeId,
        root_after: NodeId,
    ) {
        for level in levels {
            info.push_element(ElementEdit::new(tree.clone(), level, root_before, root_after));
        }
    }
}

impl StructureSync for ParagraphStructure {
    fn build(&self, tree: &TextTree, content: &Content) -> Result<NodeId, DocumentError> {
        let text = content.text();
        let len = content.len();
        // Boundary after every newline; a trailing newline yields a final
        // empty paragraph.
        let mut bounds = vec![content.create_position(0, Bias::Backward)?];
        for (i, ch) in text.chars().enumerate() {
            if ch == '\n' {
                bounds.push(content.create_position(i + 1, Bias::Backward)?);
            }
        }
        bounds.push(content.create_position(len, Bias::Forward)?);

        let mut paragraphs = Vec::with_capacity(bounds.len() - 1);
        for pair in bounds.windows(2) {
            paragraphs.push(self.new_paragraph(tree, pair[0].clone(), pair[1].clone()));
        }
        let root = tree.new_branch(paragraphs);
        trace!(target: "document.structure", paragraphs = tree.child_count(root), "build");
        Ok(root)
    }

    fn insert_update(
        &self,
        tree: &TextTree,
        content: &Content,
        offset: usize,
        text: &str,
        info: &mut EditInfo,
    ) -> Result<(), DocumentError> {
        if !text.contains('\n') {
            return Ok(());
        }
        // The paragraph whose range swallowed the inserted text splits at
        // every inserted newline.
        let root_before = tree.root();
        let path = tree.path_to_leaf_at(offset);
        let slot = path.steps()[0].slot;
        let paragraph = tree.child(root_before, slot);

        let mut bounds = vec![tree.start_position(paragraph)];
        for (i, ch) in text.chars().enumerate() {
            if ch == '\n' {
                bounds.push(content.create_position(offset + i + 1, Bias::Backward)?);
            }
        }
        bounds.push(tree.end_position(paragraph));

        let mut pieces = Vec::with_capacity(bounds.len() - 1);
        for pair in bounds.windows(2) {
            pieces.push(self.new_paragraph(tree, pair[0].clone(), pair[1].clone()));
        }

        let outcome = tree.splice(&[], root_before, slot, 1, &pieces);
        tree.set_root(outcome.new_root);
        trace!(
            target: "document.structure",
            offset,
            pieces = pieces.len(),
            "paragraph_split"
        );
        self.push_levels(tree, info, outcome.levels, root_before, outcome.new_root);
        Ok(())
    }

    fn prepare_remove(&self, tree: &TextTree, offset: usize, length: usize) -> RemovePlan {
        let root = tree.root();
        RemovePlan {
            first_slot: tree.child_slot_at(root, offset),
            last_slot: tree.child_slot_at(root, offset + length),
        }
    }

    fn remove_update(
        &self,
        tree: &TextTree,
        _content: &Content,
        plan: RemovePlan,
        info: &mut EditInfo,
    ) -> Result<(), DocumentError> {
        if plan.first_slot == plan.last_slot {
            // No paragraph boundary was removed.
            return Ok(());
        }
        let root_before = tree.root();
        let first = tree.child(root_before, plan.first_slot);
        let last = tree.child(root_before, plan.last_slot);
        let merged =
            self.new_paragraph(tree, tree.start_position(first), tree.end_position(last));
        let outcome = tree.splice(
            &[],
            root_before,
            plan.first_slot,
            plan.last_slot - plan.first_slot + 1,
            &[merged],
        );
        tree.set_root(outcome.new_root);
        trace!(
            target: "document.structure",
            merged = plan.last_slot - plan.first_slot + 1,
            "paragraph_merge"
        );
        self.push_levels(tree, info, outcome.levels, root_before, outcome.new_root);
        Ok(())
    }
}
