//! The document's notification surface.

use std::rc::Rc;

pub use vellum_events::{EventDispatcher, Subscription};

use crate::info::{DocumentModified, EditInfo};

/// Dispatchers for the document's two notifications.
///
/// `modified` fires after the document (content and node tree) has fully
/// settled; `edit_created` fires afterwards, so content observers see the
/// new text before the edit-stack observer records the edit. Clones share
/// the underlying listener lists.
#[derive(Clone, Default)]
pub struct DocumentEvents {
    modified: EventDispatcher<DocumentModified>,
    edit_created: EventDispatcher<Rc<EditInfo>>,
}

impl DocumentEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modified(&self) -> &EventDispatcher<DocumentModified> {
        &self.modified
    }

    pub fn edit_created(&self) -> &EventDispatcher<Rc<EditInfo>> {
        &self.edit_created
    }
}
