//! The document: content + node tree + filters + notifications.

use std::rc::Rc;

use tracing::trace;
use vellum_content::{Content, ContentError, EditError};

use crate::events::DocumentEvents;
use crate::filter::{DocumentFilter, FilterChain};
use crate::info::{ChangeKind, DocumentChange, DocumentModified, EditInfo, EditOrigin};
use crate::structure::{ParagraphStructure, StructureSync};
use crate::tree::TextTree;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Edit(#[from] EditError),
}

/// A mutable text document with a structural node tree.
///
/// `insert_at`/`delete_at` are the public mutation entry points; they run the
/// filter chain, and the unfiltered root operation builds one [`EditInfo`]
/// per call, applies the content edit, lets the structure policy split/merge
/// nodes, and raises `DocumentModified` followed by `UndoableEditCreated`.
pub struct TextDocument {
    content: Content,
    tree: TextTree,
    filters: Vec<Box<dyn DocumentFilter>>,
    events: DocumentEvents,
    structure: Box<dyn StructureSync>,
}

impl TextDocument {
    pub fn new(structure: Box<dyn StructureSync>, text: &str) -> Result<Self, DocumentError> {
        let content = Content::new(text);
        let tree = TextTree::new();
        let root = structure.build(&tree, &content)?;
        tree.set_root(root);
        Ok(Self {
            content,
            tree,
            filters: Vec::new(),
            events: DocumentEvents::new(),
            structure,
        })
    }

    /// Plain-text document with paragraph-per-line structure.
    pub fn plain_text(text: &str) -> Result<Self, DocumentError> {
        Self::new(Box::new(ParagraphStructure), text)
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn tree(&self) -> &TextTree {
        &self.tree
    }

    pub fn events(&self) -> &DocumentEvents {
        &self.events
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn text(&self) -> String {
        self.content.text()
    }

    pub fn text_at(&self, offset: usize, length: usize) -> Result<String, DocumentError> {
        Ok(self.content.text_at(offset, length)?)
    }

    /// Push a filter onto the interception stack; it becomes the first to
    /// see subsequent mutations.
    pub fn push_filter(&mut self, filter: Box<dyn DocumentFilter>) {
        trace!(target: "document.filter", filter = filter.name(), depth = self.filters.len() + 1, "push");
        self.filters.push(filter);
    }

    pub fn pop_filter(&mut self) -> Option<Box<dyn DocumentFilter>> {
        let popped = self.filters.pop();
        if let Some(f) = &popped {
            trace!(target: "document.filter", filter = f.name(), depth = self.filters.len(), "pop");
        }
        popped
    }

    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    /// Insert `text` at `offset` through the filter chain.
    ///
    /// Returns the edit record, or `Ok(None)` when nothing happened (empty
    /// insert, or a filter rejected the mutation); no events fire for a
    /// no-op.
    pub fn insert_at(
        &mut self,
        offset: usize,
        text: &str,
    ) -> Result<Option<Rc<EditInfo>>, DocumentError> {
        if text.is_empty() {
            return Ok(None);
        }
        self.run_chain(|chain| chain.insert_at(offset, text))
    }

    /// Delete `length` chars at `offset` through the filter chain. A
    /// zero-length delete is a guarded no-op.
    pub fn delete_at(
        &mut self,
        offset: usize,
        length: usize,
    ) -> Result<Option<Rc<EditInfo>>, DocumentError> {
        if length == 0 {
            return Ok(None);
        }
        self.run_chain(|chain| chain.delete_at(offset, length))
    }

    fn run_chain(
        &mut self,
        op: impl FnOnce(&mut FilterChain<'_>) -> Result<Option<Rc<EditInfo>>, DocumentError>,
    ) -> Result<Option<Rc<EditInfo>>, DocumentError> {
        // The chain borrows the document mutably, so the filter stack is
        // taken out for the duration of the call.
        let mut filters = std::mem::take(&mut self.filters);
        let result = {
            let mut chain = FilterChain {
                rest: &mut filters[..],
                doc: &mut *self,
            };
            op(&mut chain)
        };
        self.filters = filters;
        result
    }

    /// The unfiltered insert: the fold seed at the bottom of the chain.
    pub(crate) fn insert_unfiltered(
        &mut self,
        offset: usize,
        text: &str,
    ) -> Result<Option<Rc<EditInfo>>, DocumentError> {
        if text.is_empty() {
            // A filter may have transformed the insert away entirely.
            return Ok(None);
        }
        let chars = text.chars().count();
        let change = DocumentChange {
            offset,
            length: chars,
            kind: ChangeKind::Insert,
        };
        let mut info = EditInfo::begin(change, self.events.clone());
        let content_edit = self.content.insert(offset, text)?;
        info.push_edit(Box::new(content_edit));
        self.structure
            .insert_update(&self.tree, &self.content, offset, text, &mut info)?;
        info.seal();
        let info = info.into_shared();
        trace!(
            target: "document.edit",
            offset,
            chars,
            structural = info.is_structural(),
            "insert"
        );
        self.notify(change, &info);
        Ok(Some(info))
    }

    /// The unfiltered delete: the fold seed at the bottom of the chain.
    pub(crate) fn delete_unfiltered(
        &mut self,
        offset: usize,
        length: usize,
    ) -> Result<Option<Rc<EditInfo>>, DocumentError> {
        if length == 0 {
            return Ok(None);
        }
        if offset + length > self.content.len() {
            return Err(ContentError::RangeOutOfBounds {
                offset,
                length,
                len: self.content.len(),
            }
            .into());
        }
        let change = DocumentChange {
            offset,
            length,
            kind: ChangeKind::Remove,
        };
        let mut info = EditInfo::begin(change, self.events.clone());
        // Boundary offsets are still intact here; the plan survives the
        // collapse the removal is about to cause.
        let plan = self.structure.prepare_remove(&self.tree, offset, length);
        let content_edit = self.content.remove(offset, length)?;
        info.push_edit(Box::new(content_edit));
        self.structure
            .remove_update(&self.tree, &self.content, plan, &mut info)?;
        info.seal();
        let info = info.into_shared();
        trace!(
            target: "document.edit",
            offset,
            chars = length,
            structural = info.is_structural(),
            "remove"
        );
        self.notify(change, &info);
        Ok(Some(info))
    }

    fn notify(&self, change: DocumentChange, info: &Rc<EditInfo>) {
        self.events.modified().dispatch(&DocumentModified {
            change,
            origin: EditOrigin::Apply,
            edit: Some(Rc::clone(info)),
        });
        self.events.edit_created().dispatch(info);
    }
}

impl std::fmt::Debug for TextDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDocument")
            .field("len", &self.len())
            .field("filters", &self.filters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use vellum_content::UndoableEdit;

    #[test]
    fn paragraph_ranges_follow_plain_edits() {
        let mut doc = TextDocument::plain_text("hello\nworld").unwrap();
        let root = doc.tree().root();
        assert_eq!(doc.tree().child_count(root), 2);
        doc.insert_at(0, "xy").unwrap();
        // Same tree, shifted ranges.
        assert_eq!(doc.tree().root(), root);
        let p0 = doc.tree().child(root, 0);
        let p1 = doc.tree().child(root, 1);
        assert_eq!(doc.tree().offset(p0), 0);
        assert_eq!(doc.tree().end_offset(p0), 8);
        assert_eq!(doc.tree().offset(p1), 8);
        assert_eq!(doc.tree().end_offset(p1), 13);
    }

    #[test]
    fn newline_insert_splits_paragraph() {
        let mut doc = TextDocument::plain_text("helloworld").unwrap();
        let info = doc.insert_at(5, "\n").unwrap().unwrap();
        assert!(info.is_structural());
        let root = doc.tree().root();
        assert_eq!(doc.tree().child_count(root), 2);
        let p0 = doc.tree().child(root, 0);
        let p1 = doc.tree().child(root, 1);
        assert_eq!(doc.text_at(doc.tree().offset(p0), 6).unwrap(), "hello\n");
        assert_eq!(doc.tree().offset(p1), 6);
        assert_eq!(doc.tree().end_offset(p1), 11);
    }

    #[test]
    fn newline_delete_merges_paragraphs() {
        let mut doc = TextDocument::plain_text("ab\ncd").unwrap();
        let info = doc.delete_at(2, 1).unwrap().unwrap();
        assert!(info.is_structural());
        let root = doc.tree().root();
        assert_eq!(doc.tree().child_count(root), 1);
        assert_eq!(doc.text(), "abcd");
        let p0 = doc.tree().child(root, 0);
        assert_eq!(doc.tree().offset(p0), 0);
        assert_eq!(doc.tree().end_offset(p0), 4);
    }

    #[test]
    fn zero_length_operations_raise_no_events() {
        let mut doc = TextDocument::plain_text("abc").unwrap();
        let fired = Rc::new(Cell::new(0u32));
        let f1 = Rc::clone(&fired);
        let f2 = Rc::clone(&fired);
        doc.events().modified().subscribe(move |_| f1.set(f1.get() + 1));
        doc.events()
            .edit_created()
            .subscribe(move |_| f2.set(f2.get() + 1));
        assert!(doc.insert_at(1, "").unwrap().is_none());
        assert!(doc.delete_at(1, 0).unwrap().is_none());
        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn modified_fires_before_edit_created() {
        let mut doc = TextDocument::plain_text("abc").unwrap();
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));
        let o1 = Rc::clone(&order);
        let o2 = Rc::clone(&order);
        doc.events()
            .modified()
            .subscribe(move |_| o1.borrow_mut().push("modified"));
        doc.events()
            .edit_created()
            .subscribe(move |_| o2.borrow_mut().push("edit_created"));
        doc.insert_at(3, "d").unwrap();
        assert_eq!(&*order.borrow(), &["modified", "edit_created"]);
    }

    #[test]
    fn undo_restores_text_and_structure() {
        let mut doc = TextDocument::plain_text("hello world").unwrap();
        let root_before = doc.tree().root();
        let info = doc.insert_at(5, "\nbig").unwrap().unwrap();
        assert_eq!(doc.text(), "hello\nbig world");
        assert_ne!(doc.tree().root(), root_before);
        info.undo().unwrap();
        assert_eq!(doc.text(), "hello world");
        assert_eq!(doc.tree().root(), root_before);
        info.redo().unwrap();
        assert_eq!(doc.text(), "hello\nbig world");
    }

    #[test]
    fn out_of_range_delete_is_rejected() {
        let mut doc = TextDocument::plain_text("abc").unwrap();
        assert!(doc.delete_at(1, 5).is_err());
        assert_eq!(doc.text(), "abc");
    }
}
