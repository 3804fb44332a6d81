//! Shared state the view tree reads during build, layout, and paint.

use std::rc::Rc;

use vellum_content::Content;
use vellum_document::TextTree;
use vellum_style::{FontMetrics, Style};

/// Handles a view needs to rebuild chunks, measure text, and paint.
/// Cheap to clone; all handles share their underlying state.
#[derive(Clone)]
pub struct ViewContext {
    pub content: Content,
    pub tree: TextTree,
    pub style: Style,
    pub metrics: Rc<dyn FontMetrics>,
}
