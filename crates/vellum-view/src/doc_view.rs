//! Top-level view coordinator.
//!
//! Owns the root view, listens to document and style notifications, and
//! routes deltas into the view tree: structural edits patch exactly the
//! views whose nodes were replaced (an O(1) affected-node lookup per view,
//! descending only where the edit offset lands), content edits invalidate
//! every view overlapping the edited span, and style changes discard and
//! rebuild the whole tree.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;
use vellum_document::{
    DocumentEvents, DocumentModified, EditInfo, EditOrigin, Subscription, TextDocument,
};
use vellum_draw::{DrawingService, Point, Rect, Size};
use vellum_style::{FontMetrics, Style};

use crate::context::ViewContext;
use crate::nav::{Direction, NavOutcome, navigate_vertical_flat};
use crate::view::{DefaultViewFactory, TextView, ViewFactory};

struct DocViewInner {
    ctx: ViewContext,
    factory: Rc<dyn ViewFactory>,
    root: TextView,
    bounds: Rect,
    laid_out: bool,
}

/// Top-level façade over the view tree for one document.
///
/// Layout must be (re)established with [`update_layout`] after edits;
/// mapping and navigation queries against stale layout fail softly
/// (`None` / `Invalid`) rather than panicking, because UI code probes
/// layout opportunistically mid-frame.
///
/// [`update_layout`]: DocumentView::update_layout
pub struct DocumentView {
    inner: Rc<RefCell<DocViewInner>>,
    events: DocumentEvents,
    style: Style,
    modified_sub: Option<Subscription>,
    style_sub: Option<Subscription>,
}

impl DocumentView {
    pub fn new(doc: &TextDocument, style: Style, metrics: Rc<dyn FontMetrics>) -> Self {
        Self::with_factory(doc, style, metrics, Rc::new(DefaultViewFactory))
    }

    pub fn with_factory(
        doc: &TextDocument,
        style: Style,
        metrics: Rc<dyn FontMetrics>,
        factory: Rc<dyn ViewFactory>,
    ) -> Self {
        let ctx = ViewContext {
            content: doc.content().clone(),
            tree: doc.tree().clone(),
            style: style.clone(),
            metrics,
        };
        let root = factory.build(&ctx, ctx.tree.root());
        let inner = Rc::new(RefCell::new(DocViewInner {
            ctx,
            factory,
            root,
            bounds: Rect::default(),
            laid_out: false,
        }));

        let weak: Weak<RefCell<DocViewInner>> = Rc::downgrade(&inner);
        let modified_sub = doc.events().modified().subscribe(move |ev| {
            if let Some(inner) = weak.upgrade() {
                handle_modified(&mut inner.borrow_mut(), ev);
            }
        });
        let weak = Rc::downgrade(&inner);
        let style_sub = style.changed().subscribe(move |_key| {
            if let Some(inner) = weak.upgrade() {
                reset(&mut inner.borrow_mut());
            }
        });

        Self {
            inner,
            events: doc.events().clone(),
            style,
            modified_sub: Some(modified_sub),
            style_sub: Some(style_sub),
        }
    }

    /// Discard the entire view tree and rebuild it from the current node
    /// tree. Used on document replacement and style change; edits go
    /// through the incremental paths instead.
    pub fn reset_document_view(&self) {
        reset(&mut self.inner.borrow_mut());
    }

    /// Re-measure and re-arrange the tree for `bounds`.
    pub fn update_layout(&self, bounds: Rect) {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let ctx = inner.ctx.clone();
        inner.root.measure(&ctx, bounds.size());
        inner.root.arrange(&ctx, bounds);
        inner.bounds = bounds;
        inner.laid_out = true;
    }

    /// Desired size at the given available space (no arrange).
    pub fn measure(&self, avail: Size) -> Size {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let ctx = inner.ctx.clone();
        inner.root.measure(&ctx, avail)
    }

    pub fn is_layout_valid(&self) -> bool {
        let inner = self.inner.borrow();
        inner.laid_out && inner.root.layout_valid()
    }

    /// Caret rectangle for a document offset, or `None` while layout is
    /// stale.
    pub fn model_to_view(&self, offset: usize) -> Option<Rect> {
        let inner = self.inner.borrow();
        if !inner.laid_out {
            return None;
        }
        inner.root.model_to_view(offset)
    }

    /// Nearest caret offset for a screen point, or `None` while layout is
    /// stale.
    pub fn view_to_model(&self, point: Point) -> Option<usize> {
        let inner = self.inner.borrow();
        if !inner.laid_out {
            return None;
        }
        inner.root.view_to_model(point)
    }

    /// Directional caret navigation over the whole document. Vertical moves
    /// are resolved flat: horizontal stepping until the line band changes,
    /// then nearest-column within the new line.
    pub fn navigate(&self, offset: usize, direction: Direction) -> NavOutcome {
        let inner = self.inner.borrow();
        if !inner.laid_out {
            return NavOutcome::Invalid;
        }
        match direction {
            Direction::Left | Direction::Right => inner.root.navigate(offset, direction),
            Direction::Up | Direction::Down => navigate_vertical_flat(
                offset,
                direction,
                |o| inner.root.model_to_view(o),
                |o, d| inner.root.navigate(o, d),
            ),
        }
    }

    /// Highlight rectangles (one per line band) covering `[start, end)`.
    pub fn selection_rects(&self, start: usize, end: usize) -> Vec<Rect> {
        let inner = self.inner.borrow();
        let mut out = Vec::new();
        if inner.laid_out && start < end {
            collect_selection(&inner.root, start, end, &mut out);
        }
        out
    }

    pub fn draw(&self, svc: &mut dyn DrawingService) {
        let inner = self.inner.borrow();
        if inner.laid_out {
            inner.root.draw(&inner.ctx, svc);
        }
    }

    /// Inspect the root view (tests and embedders).
    pub fn with_root<R>(&self, f: impl FnOnce(&TextView) -> R) -> R {
        f(&self.inner.borrow().root)
    }

    pub fn style(&self) -> &Style {
        &self.style
    }
}

impl Drop for DocumentView {
    fn drop(&mut self) {
        if let Some(sub) = self.modified_sub.take() {
            self.events.modified().unsubscribe(sub);
        }
        if let Some(sub) = self.style_sub.take() {
            self.style.changed().unsubscribe(sub);
        }
    }
}

fn reset(inner: &mut DocViewInner) {
    trace!(target: "view.structure", "full view rebuild");
    inner.root = inner.factory.build(&inner.ctx, inner.ctx.tree.root());
    inner.laid_out = false;
}

fn handle_modified(inner: &mut DocViewInner, ev: &DocumentModified) {
    match &ev.edit {
        Some(edit) if edit.is_structural() => {
            let ctx = inner.ctx.clone();
            let factory = Rc::clone(&inner.factory);
            iterate_tree_on_document_change(
                &mut inner.root,
                &ctx,
                factory.as_ref(),
                edit,
                ev.origin,
            );
        }
        _ => iterate_tree_on_content_change(&mut inner.root, ev.change.offset, ev.change.length),
    }
    inner.laid_out = false;
}

/// Lock-step walk for a structural edit: patch child views wherever the
/// edit's node map marks this view's node as an affected parent, then
/// descend only into children whose range contains the edit offset.
fn iterate_tree_on_document_change(
    view: &mut TextView,
    ctx: &ViewContext,
    factory: &dyn ViewFactory,
    edit: &Rc<EditInfo>,
    origin: EditOrigin,
) {
    if let Some(ee) = edit.element_edit_for_parent(view.node()) {
        let is_current_parent = match origin {
            EditOrigin::Apply | EditOrigin::Redo => view.node() == ee.parent_before(),
            EditOrigin::Undo => view.node() == ee.parent_after(),
        };
        if is_current_parent {
            view.on_node_structure_changed(ctx, factory, ee, origin);
        }
    }
    view.invalidate_layout();
    let offset = edit.change().offset;
    if let Some(children) = view.children_mut() {
        for child in children {
            if child.offset() <= offset && offset <= child.end_offset() {
                iterate_tree_on_document_change(child, ctx, factory, edit, origin);
            }
        }
    }
}

/// Overlap walk for a pure text change: every view whose range overlaps the
/// edited span re-measures. A content edit can span several leaf views, so
/// the predicate is overlap, not the containment used for structural edits.
fn iterate_tree_on_content_change(view: &mut TextView, offset: usize, length: usize) {
    view.on_node_content_changed(offset, length);
    if let Some(children) = view.children_mut() {
        for child in children {
            if child.offset() <= offset + length && offset <= child.end_offset() {
                iterate_tree_on_content_change(child, offset, length);
            }
        }
    }
}

fn collect_selection(view: &TextView, start: usize, end: usize, out: &mut Vec<Rect>) {
    match view {
        TextView::Paragraph(p) => p.selection_rects(start, end, out),
        TextView::Block(_) | TextView::Branch(_) => {
            if let Some(children) = view.children() {
                for child in children {
                    if child.offset() < end && start < child.end_offset() {
                        collect_selection(child, start, end, out);
                    }
                }
            }
        }
        TextView::Chunk(c) => {
            if let Some((x0, x1)) = c.selection_span(start, end) {
                let o = c.origin();
                out.push(Rect::new(x0, o.y, x1 - x0, c.height()));
            }
        }
        TextView::Justified(_) => {}
    }
}
