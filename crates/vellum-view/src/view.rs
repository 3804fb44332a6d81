//! The view tree: a closed sum over the five view kinds with one dispatch
//! surface for measure/arrange/draw, offset↔rectangle mapping, navigation,
//! and invalidation.

use tracing::trace;
use vellum_document::{ElementEdit, EditOrigin, NodeId, TextTree};
use vellum_draw::{DrawingService, Point, Rect, Size};

use crate::chunk::ChunkView;
use crate::context::ViewContext;
use crate::justify::JustifiedView;
use crate::nav::{Direction, NavOutcome};
use crate::paragraph::ParagraphView;

/// Builds views for nodes; the document view uses it for the initial tree
/// and for nodes added by structural edits, so child view lifecycle mirrors
/// node lifecycle exactly.
pub trait ViewFactory {
    fn build(&self, ctx: &ViewContext, node: NodeId) -> TextView;
}

/// Root → block, branch-of-leaves → paragraph, other branches → branch,
/// leaves → chunk.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultViewFactory;

impl ViewFactory for DefaultViewFactory {
    fn build(&self, ctx: &ViewContext, node: NodeId) -> TextView {
        let tree = &ctx.tree;
        if tree.is_leaf(node) {
            return TextView::Chunk(ChunkView::from_leaf(ctx, node));
        }
        if node == tree.root() {
            return TextView::Block(BlockView::from_node(ctx, node, self));
        }
        let children = tree.children(node);
        if children.iter().all(|c| tree.is_leaf(*c)) {
            TextView::Paragraph(ParagraphView::from_node(ctx, node))
        } else {
            TextView::Branch(BranchView::from_node(ctx, node, self))
        }
    }
}

/// One view in the render tree.
pub enum TextView {
    Chunk(ChunkView),
    Justified(JustifiedView),
    Paragraph(ParagraphView),
    Branch(BranchView),
    Block(BlockView),
}

impl TextView {
    pub fn node(&self) -> NodeId {
        match self {
            Self::Chunk(v) => v.node(),
            Self::Justified(v) => v.chunks()[0].node(),
            Self::Paragraph(v) => v.node(),
            Self::Branch(v) => v.node(),
            Self::Block(v) => v.node(),
        }
    }

    /// Current (live) start offset of the backing node.
    pub fn offset(&self) -> usize {
        match self {
            Self::Chunk(v) => v.offset(),
            Self::Justified(v) => v.offset(),
            Self::Paragraph(v) => v.offset(),
            Self::Branch(v) => v.offset(),
            Self::Block(v) => v.offset(),
        }
    }

    pub fn end_offset(&self) -> usize {
        match self {
            Self::Chunk(v) => v.end_offset(),
            Self::Justified(v) => v.end_offset(),
            Self::Paragraph(v) => v.end_offset(),
            Self::Branch(v) => v.end_offset(),
            Self::Block(v) => v.end_offset(),
        }
    }

    /// One past the last valid caret offset within this view.
    pub fn cursor_end(&self) -> usize {
        match self {
            Self::Chunk(v) => v.cursor_end(),
            Self::Justified(v) => v.cursor_end(),
            Self::Paragraph(v) => v.cursor_end(),
            Self::Branch(v) => v.cursor_end(),
            Self::Block(v) => v.cursor_end(),
        }
    }

    pub fn layout_valid(&self) -> bool {
        match self {
            Self::Chunk(v) => v.layout_valid(),
            Self::Justified(v) => v.layout_valid(),
            Self::Paragraph(v) => v.layout_valid(),
            Self::Branch(v) => v.layout_valid,
            Self::Block(v) => v.layout_valid,
        }
    }

    pub fn invalidate_layout(&mut self) {
        match self {
            Self::Chunk(v) => v.invalidate_layout(),
            Self::Justified(v) => v.invalidate_layout(),
            Self::Paragraph(v) => v.invalidate_layout(),
            Self::Branch(v) => v.layout_valid = false,
            Self::Block(v) => v.layout_valid = false,
        }
    }

    /// Content changed without structural change: re-measure only.
    pub fn on_node_content_changed(&mut self, _offset: usize, _length: usize) {
        match self {
            Self::Chunk(v) => v.invalidate_layout(),
            Self::Justified(v) => v.invalidate_layout(),
            Self::Paragraph(v) => v.mark_content_dirty(),
            Self::Branch(v) => v.layout_valid = false,
            Self::Block(v) => v.layout_valid = false,
        }
    }

    /// Mirror a node replacement into the child view list: remove the views
    /// of replaced nodes at the edit's index and insert freshly built views
    /// for the added nodes. A resident view not matching the node it should
    /// mirror means the trees have diverged; that is unrecoverable.
    pub fn on_node_structure_changed(
        &mut self,
        ctx: &ViewContext,
        factory: &dyn ViewFactory,
        edit: &ElementEdit,
        origin: EditOrigin,
    ) {
        let (removed, added) = match origin {
            EditOrigin::Apply | EditOrigin::Redo => (edit.removed(), edit.added()),
            EditOrigin::Undo => (edit.added(), edit.removed()),
        };
        let (node_from, node_to) = match origin {
            EditOrigin::Apply | EditOrigin::Redo => (edit.parent_before(), edit.parent_after()),
            EditOrigin::Undo => (edit.parent_after(), edit.parent_before()),
        };
        let index = edit.index();
        {
            let children = match self.children_mut() {
                Some(c) => c,
                None => {
                    debug_assert!(false, "structure edit on a leaf view");
                    return;
                }
            };
            assert!(
                index + removed.len() <= children.len(),
                "view tree out of sync with node tree"
            );
            for (i, expected) in removed.iter().enumerate() {
                assert_eq!(
                    children[index + i].node(),
                    *expected,
                    "view tree out of sync with node tree"
                );
            }
            let mut old: Vec<TextView> = children
                .splice(
                    index..index + removed.len(),
                    added.iter().map(|n| factory.build(ctx, *n)),
                )
                .collect();
            for view in &mut old {
                view.remove_notify();
            }
        }
        trace!(
            target: "view.structure",
            index,
            removed = removed.len(),
            added = added.len(),
            "children patched"
        );
        if self.node() == node_from {
            self.set_node(node_to);
        }
        match self {
            Self::Paragraph(v) => v.mark_structure_dirty(),
            _ => self.invalidate_layout(),
        }
    }

    /// Lifecycle notification: the backing node was replaced and this view
    /// is leaving the tree.
    pub fn remove_notify(&mut self) {
        trace!(target: "view.structure", node = ?self.node(), "view removed");
        if let Some(children) = self.children_mut() {
            for child in children {
                child.remove_notify();
            }
        }
    }

    pub(crate) fn set_node(&mut self, node: NodeId) {
        match self {
            Self::Chunk(_) | Self::Justified(_) => {}
            Self::Paragraph(v) => v.set_node(node),
            Self::Branch(v) => v.node = node,
            Self::Block(v) => v.node = node,
        }
    }

    /// Node-mirroring children, for the tree walks; leaves report none.
    pub fn children(&self) -> Option<&[TextView]> {
        match self {
            Self::Chunk(_) | Self::Justified(_) => None,
            Self::Paragraph(v) => Some(v.children()),
            Self::Branch(v) => Some(&v.children),
            Self::Block(v) => Some(&v.children),
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<TextView>> {
        match self {
            Self::Chunk(_) | Self::Justified(_) => None,
            Self::Paragraph(v) => Some(v.children_mut()),
            Self::Branch(v) => Some(&mut v.children),
            Self::Block(v) => Some(&mut v.children),
        }
    }

    pub fn measure(&mut self, ctx: &ViewContext, avail: Size) -> Size {
        match self {
            Self::Chunk(v) => Size::new(v.width(), v.height()),
            Self::Justified(v) => Size::new(v.width(), v.height()),
            Self::Paragraph(v) => v.measure(ctx, avail),
            Self::Branch(v) => v.measure(ctx, avail),
            Self::Block(v) => v.measure(ctx, avail),
        }
    }

    pub fn arrange(&mut self, ctx: &ViewContext, rect: Rect) {
        match self {
            Self::Chunk(v) => v.arrange_at(rect.origin()),
            Self::Justified(v) => v.arrange_at(rect.origin()),
            Self::Paragraph(v) => v.arrange(ctx, rect),
            Self::Branch(v) => v.arrange(ctx, rect),
            Self::Block(v) => v.arrange(ctx, rect),
        }
    }

    pub fn draw(&self, ctx: &ViewContext, svc: &mut dyn DrawingService) {
        match self {
            Self::Chunk(v) => v.draw(ctx, svc),
            Self::Justified(v) => v.draw(ctx, svc),
            Self::Paragraph(v) => v.draw(ctx, svc),
            Self::Branch(v) => v.draw(ctx, svc),
            Self::Block(v) => v.draw(ctx, svc),
        }
    }

    pub fn model_to_view(&self, offset: usize) -> Option<Rect> {
        match self {
            Self::Chunk(v) => v.model_to_view(offset),
            Self::Justified(v) => v.model_to_view(offset),
            Self::Paragraph(v) => v.model_to_view(offset),
            Self::Branch(v) => v.model_to_view(offset),
            Self::Block(v) => v.model_to_view(offset),
        }
    }

    pub fn view_to_model(&self, point: Point) -> Option<usize> {
        match self {
            Self::Chunk(v) => v.view_to_model(point.x),
            Self::Justified(v) => v.view_to_model(point.x),
            Self::Paragraph(v) => v.view_to_model(point),
            Self::Branch(v) => v.view_to_model(point),
            Self::Block(v) => v.view_to_model(point),
        }
    }

    pub fn navigate(&self, offset: usize, direction: Direction) -> NavOutcome {
        match self {
            Self::Chunk(v) => v.navigate(offset, direction),
            Self::Justified(v) => v.navigate(offset, direction),
            Self::Paragraph(v) => v.navigate(offset, direction),
            Self::Branch(v) => v.navigate(offset, direction),
            Self::Block(v) => v.navigate(offset, direction),
        }
    }

    /// Horizontal distance from `x` to this view's laid-out span (zero when
    /// inside it).
    pub(crate) fn horizontal_distance(&self, x: f32) -> f32 {
        let bounds = self.layout_bounds();
        if x < bounds.x {
            bounds.x - x
        } else if x > bounds.right() {
            x - bounds.right()
        } else {
            0.0
        }
    }

    /// Laid-out bounds (origin + size) of this view.
    pub fn layout_bounds(&self) -> Rect {
        match self {
            Self::Chunk(v) => {
                let o = v.origin();
                Rect::new(o.x, o.y, v.width(), v.height())
            }
            Self::Justified(v) => {
                let o = v.origin();
                Rect::new(o.x, o.y, v.width(), v.height())
            }
            Self::Paragraph(v) => {
                let o = v.origin();
                Rect::new(o.x, o.y, v.size().width, v.size().height)
            }
            Self::Branch(v) => Rect::new(v.origin.x, v.origin.y, v.size.width, v.size.height),
            Self::Block(v) => Rect::new(v.origin.x, v.origin.y, v.size.width, v.size.height),
        }
    }
}

impl std::fmt::Debug for TextView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chunk(v) => std::fmt::Debug::fmt(v, f),
            Self::Justified(v) => std::fmt::Debug::fmt(v, f),
            Self::Paragraph(v) => std::fmt::Debug::fmt(v, f),
            Self::Branch(v) => f
                .debug_struct("BranchView")
                .field("node", &v.node)
                .field("children", &v.children.len())
                .finish(),
            Self::Block(v) => f
                .debug_struct("BlockView")
                .field("node", &v.node)
                .field("children", &v.children.len())
                .finish(),
        }
    }
}

/// Generic sequential container for branch nodes that are neither the root
/// nor a paragraph; children stack vertically and navigation passes through
/// to them, reporting `BoundaryChanged` at this container's own edges.
pub struct BranchView {
    pub(crate) node: NodeId,
    tree: TextTree,
    pub(crate) children: Vec<TextView>,
    pub(crate) origin: Point,
    pub(crate) size: Size,
    pub(crate) layout_valid: bool,
}

impl BranchView {
    pub fn from_node(ctx: &ViewContext, node: NodeId, factory: &dyn ViewFactory) -> Self {
        let children = ctx
            .tree
            .children(node)
            .into_iter()
            .map(|c| factory.build(ctx, c))
            .collect();
        Self {
            node,
            tree: ctx.tree.clone(),
            children,
            origin: Point::default(),
            size: Size::ZERO,
            layout_valid: false,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn offset(&self) -> usize {
        self.tree.offset(self.node)
    }

    pub fn end_offset(&self) -> usize {
        self.tree.end_offset(self.node)
    }

    pub fn cursor_end(&self) -> usize {
        self.children
            .last()
            .map(TextView::cursor_end)
            .unwrap_or_else(|| self.end_offset())
    }

    pub fn measure(&mut self, ctx: &ViewContext, avail: Size) -> Size {
        self.size = stack_measure(&mut self.children, ctx, avail);
        self.size
    }

    pub fn arrange(&mut self, ctx: &ViewContext, rect: Rect) {
        self.origin = rect.origin();
        self.size = stack_arrange(&mut self.children, ctx, rect);
        self.layout_valid = true;
    }

    pub fn draw(&self, ctx: &ViewContext, svc: &mut dyn DrawingService) {
        for child in &self.children {
            child.draw(ctx, svc);
        }
    }

    pub fn model_to_view(&self, offset: usize) -> Option<Rect> {
        if !self.layout_valid {
            return None;
        }
        let idx = child_index_for(&self.children, self.offset(), self.end_offset(), offset)?;
        self.children[idx].model_to_view(offset)
    }

    pub fn view_to_model(&self, point: Point) -> Option<usize> {
        if !self.layout_valid {
            return None;
        }
        let idx = child_index_by_y(&self.children, point)?;
        self.children[idx].view_to_model(point)
    }

    pub fn navigate(&self, offset: usize, direction: Direction) -> NavOutcome {
        if !self.layout_valid {
            return NavOutcome::Invalid;
        }
        match direction {
            Direction::Up | Direction::Down => {
                let Some(idx) =
                    child_index_for(&self.children, self.offset(), self.end_offset(), offset)
                else {
                    return NavOutcome::Invalid;
                };
                // No lines of our own; let the child decide, and bubble its
                // boundary outward.
                self.children[idx].navigate(offset, direction)
            }
            Direction::Left => navigate_left_sequence(
                &self.children,
                self.offset(),
                self.end_offset(),
                offset,
                SequenceEdge::Boundary,
            ),
            Direction::Right => navigate_right_sequence(
                &self.children,
                self.offset(),
                self.end_offset(),
                offset,
            ),
        }
    }
}

/// Root container: a vertical stack of paragraphs. Purely delegates
/// vertical navigation outward by reporting `BoundaryChanged` immediately;
/// each child paragraph owns its own lines.
pub struct BlockView {
    pub(crate) node: NodeId,
    tree: TextTree,
    pub(crate) children: Vec<TextView>,
    pub(crate) origin: Point,
    pub(crate) size: Size,
    pub(crate) layout_valid: bool,
}

impl BlockView {
    pub fn from_node(ctx: &ViewContext, node: NodeId, factory: &dyn ViewFactory) -> Self {
        let children = ctx
            .tree
            .children(node)
            .into_iter()
            .map(|c| factory.build(ctx, c))
            .collect();
        Self {
            node,
            tree: ctx.tree.clone(),
            children,
            origin: Point::default(),
            size: Size::ZERO,
            layout_valid: false,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn offset(&self) -> usize {
        self.tree.offset(self.node)
    }

    pub fn end_offset(&self) -> usize {
        self.tree.end_offset(self.node)
    }

    pub fn cursor_end(&self) -> usize {
        self.children
            .last()
            .map(TextView::cursor_end)
            .unwrap_or_else(|| self.end_offset())
    }

    pub fn children(&self) -> &[TextView] {
        &self.children
    }

    pub fn measure(&mut self, ctx: &ViewContext, avail: Size) -> Size {
        self.size = stack_measure(&mut self.children, ctx, avail);
        self.size
    }

    pub fn arrange(&mut self, ctx: &ViewContext, rect: Rect) {
        self.origin = rect.origin();
        self.size = stack_arrange(&mut self.children, ctx, rect);
        self.layout_valid = true;
    }

    pub fn draw(&self, ctx: &ViewContext, svc: &mut dyn DrawingService) {
        for child in &self.children {
            child.draw(ctx, svc);
        }
    }

    pub fn model_to_view(&self, offset: usize) -> Option<Rect> {
        if !self.layout_valid {
            return None;
        }
        let idx = child_index_for(&self.children, self.offset(), self.end_offset(), offset)?;
        self.children[idx].model_to_view(offset)
    }

    pub fn view_to_model(&self, point: Point) -> Option<usize> {
        if !self.layout_valid {
            return None;
        }
        let idx = child_index_by_y(&self.children, point)?;
        self.children[idx].view_to_model(point)
    }

    pub fn navigate(&self, offset: usize, direction: Direction) -> NavOutcome {
        if !self.layout_valid {
            return NavOutcome::Invalid;
        }
        match direction {
            // A block has no lines of its own.
            Direction::Up | Direction::Down => NavOutcome::BoundaryChanged(offset),
            Direction::Left => navigate_left_sequence(
                &self.children,
                self.offset(),
                self.end_offset(),
                offset,
                SequenceEdge::Invalid,
            ),
            Direction::Right => navigate_right_sequence(
                &self.children,
                self.offset(),
                self.end_offset(),
                offset,
            ),
        }
    }
}

/// How a sequence container reports running off its own left edge.
#[derive(Clone, Copy, PartialEq, Eq)]
enum SequenceEdge {
    /// Root container: the document's first valid offset, so the move is
    /// simply illegal.
    Invalid,
    /// Nested container: an ancestor may still have a sibling to retry.
    Boundary,
}

fn navigate_left_sequence(
    children: &[TextView],
    start: usize,
    end: usize,
    offset: usize,
    edge: SequenceEdge,
) -> NavOutcome {
    let Some(mut idx) = child_index_for(children, start, end, offset) else {
        return NavOutcome::Invalid;
    };
    let mut off = offset;
    loop {
        match children[idx].navigate(off, Direction::Left) {
            NavOutcome::Valid(t) => return NavOutcome::Valid(t),
            NavOutcome::Invalid => return NavOutcome::Invalid,
            NavOutcome::BoundaryChanged(t) => {
                if idx == 0 {
                    return match edge {
                        SequenceEdge::Invalid => NavOutcome::Invalid,
                        SequenceEdge::Boundary => NavOutcome::BoundaryChanged(start),
                    };
                }
                idx -= 1;
                off = t;
            }
        }
    }
}

fn navigate_right_sequence(
    children: &[TextView],
    start: usize,
    end: usize,
    offset: usize,
) -> NavOutcome {
    let Some(idx) = child_index_for(children, start, end, offset) else {
        return NavOutcome::Invalid;
    };
    match children[idx].navigate(offset, Direction::Right) {
        NavOutcome::BoundaryChanged(t) => {
            if t >= end {
                NavOutcome::BoundaryChanged(end)
            } else {
                // The child's trailing edge is the next sibling's start.
                NavOutcome::Valid(t)
            }
        }
        other => other,
    }
}

/// Child covering `offset` (half-open containment); an offset equal to the
/// container's end resolves to the last child, which is also how a query
/// exactly at a child's end offset is answered.
fn child_index_for(
    children: &[TextView],
    start: usize,
    end: usize,
    offset: usize,
) -> Option<usize> {
    if children.is_empty() || offset < start || offset > end {
        return None;
    }
    for (i, child) in children.iter().enumerate() {
        if offset < child.end_offset() {
            return Some(i);
        }
    }
    Some(children.len() - 1)
}

fn child_index_by_y(children: &[TextView], point: Point) -> Option<usize> {
    if children.is_empty() {
        return None;
    }
    for (i, child) in children.iter().enumerate() {
        if point.y < child.layout_bounds().bottom() {
            return Some(i);
        }
    }
    Some(children.len() - 1)
}

fn stack_measure(children: &mut [TextView], ctx: &ViewContext, avail: Size) -> Size {
    let mut width = 0.0f32;
    let mut height = 0.0f32;
    for child in children {
        let s = child.measure(ctx, Size::new(avail.width, f32::INFINITY));
        width = width.max(s.width);
        height += s.height;
    }
    Size::new(width, height)
}

fn stack_arrange(children: &mut [TextView], ctx: &ViewContext, rect: Rect) -> Size {
    let mut y = rect.y;
    let mut width = 0.0f32;
    for child in children.iter_mut() {
        let s = child.measure(ctx, Size::new(rect.width, f32::INFINITY));
        child.arrange(ctx, Rect::new(rect.x, y, rect.width, s.height));
        y += s.height;
        width = width.max(s.width);
    }
    Size::new(width, y - rect.y)
}
