//! Undo/redo stacks over document edit records.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;
use vellum_content::{EditError, UndoableEdit};

use crate::document::TextDocument;
use crate::events::{DocumentEvents, Subscription};
use crate::info::EditInfo;

/// Maximum number of edits retained in undo history.
pub const HISTORY_MAX: usize = 200;

struct HistoryInner {
    undo: Vec<Rc<EditInfo>>,
    redo: Vec<Rc<EditInfo>>,
    cap: usize,
}

/// Listens to a document's `UndoableEditCreated` notifications and keeps the
/// classic pair of stacks: new significant edits land on the undo stack and
/// clear the redo stack; replaying moves records between the two.
pub struct UndoHistory {
    inner: Rc<RefCell<HistoryInner>>,
    events: DocumentEvents,
    sub: Option<Subscription>,
}

impl UndoHistory {
    pub fn attach(doc: &TextDocument) -> Self {
        Self::attach_with_capacity(doc, HISTORY_MAX)
    }

    pub fn attach_with_capacity(doc: &TextDocument, cap: usize) -> Self {
        let inner = Rc::new(RefCell::new(HistoryInner {
            undo: Vec::new(),
            redo: Vec::new(),
            cap: cap.max(1),
        }));
        let listener_inner = Rc::clone(&inner);
        let sub = doc.events().edit_created().subscribe(move |edit: &Rc<EditInfo>| {
            if !edit.significant() {
                trace!(target: "document.undo", "insignificant edit skipped");
                return;
            }
            let mut h = listener_inner.borrow_mut();
            h.undo.push(Rc::clone(edit));
            if h.undo.len() > h.cap {
                h.undo.remove(0);
                trace!(target: "document.undo", "undo_stack_trimmed");
            }
            h.redo.clear();
            trace!(
                target: "document.undo",
                undo_depth = h.undo.len(),
                "push_edit"
            );
        });
        Self {
            inner,
            events: doc.events().clone(),
            sub: Some(sub),
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.inner.borrow().undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.inner.borrow().redo.len()
    }

    pub fn can_undo(&self) -> bool {
        self.undo_depth() > 0
    }

    pub fn can_redo(&self) -> bool {
        self.redo_depth() > 0
    }

    /// Undo the most recent edit. Returns `false` on an empty stack.
    pub fn undo(&self) -> Result<bool, EditError> {
        // Pop before replaying: the replay dispatches notifications and the
        // history must not be borrowed while listeners run.
        let edit = self.inner.borrow_mut().undo.pop();
        match edit {
            Some(edit) => {
                trace!(target: "document.undo", name = edit.display_name(), "undo_pop");
                edit.undo()?;
                self.inner.borrow_mut().redo.push(edit);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Redo the most recently undone edit. Returns `false` on an empty stack.
    pub fn redo(&self) -> Result<bool, EditError> {
        let edit = self.inner.borrow_mut().redo.pop();
        match edit {
            Some(edit) => {
                trace!(target: "document.undo", name = edit.display_name(), "redo_pop");
                edit.redo()?;
                self.inner.borrow_mut().undo.push(edit);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Drop for UndoHistory {
    fn drop(&mut self) {
        if let Some(sub) = self.sub.take() {
            self.events.edit_created().unsubscribe(sub);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_redo_walks_the_stacks() {
        let mut doc = TextDocument::plain_text("Hello World").unwrap();
        let history = UndoHistory::attach(&doc);
        doc.insert_at(6, "Beautiful ").unwrap();
        doc.delete_at(0, 6).unwrap();
        assert_eq!(doc.text(), "Beautiful World");
        assert_eq!(history.undo_depth(), 2);

        assert!(history.undo().unwrap());
        assert_eq!(doc.text(), "Hello Beautiful World");
        assert!(history.undo().unwrap());
        assert_eq!(doc.text(), "Hello World");
        assert!(!history.undo().unwrap());

        assert!(history.redo().unwrap());
        assert!(history.redo().unwrap());
        assert_eq!(doc.text(), "Beautiful World");
        assert!(!history.redo().unwrap());
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut doc = TextDocument::plain_text("ab").unwrap();
        let history = UndoHistory::attach(&doc);
        doc.insert_at(2, "c").unwrap();
        history.undo().unwrap();
        assert!(history.can_redo());
        doc.insert_at(0, "z").unwrap();
        assert!(!history.can_redo());
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn capacity_trims_oldest_edit() {
        let mut doc = TextDocument::plain_text("").unwrap();
        let history = UndoHistory::attach_with_capacity(&doc, 3);
        for _ in 0..5 {
            doc.insert_at(doc.len(), "x").unwrap();
        }
        assert_eq!(history.undo_depth(), 3);
    }

    #[test]
    fn detaches_on_drop() {
        let mut doc = TextDocument::plain_text("").unwrap();
        {
            let _history = UndoHistory::attach(&doc);
            assert_eq!(doc.events().edit_created().listener_count(), 1);
        }
        assert_eq!(doc.events().edit_created().listener_count(), 0);
        doc.insert_at(0, "a").unwrap();
    }
}
