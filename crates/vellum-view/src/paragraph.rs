//! Paragraph reflow: line breaking, alignment, and justification.

use std::collections::VecDeque;

use tracing::trace;
use vellum_document::{NodeId, TextTree};
use vellum_draw::{DrawingService, Point, Rect, Size};
use vellum_style::{Alignment, WrapMode};

use crate::chunk::ChunkView;
use crate::context::ViewContext;
use crate::justify::JustifiedView;
use crate::nav::{Direction, NavOutcome, navigate_vertical_flat};
use crate::view::TextView;

/// Vertical metrics of one completed line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    /// Baseline distance from the line's top (max over the line's chunks).
    pub baseline: f32,
    /// Line height (max over the line's chunks).
    pub height: f32,
    /// Content width used for alignment (trailing whitespace trimmed).
    pub width: f32,
}

/// One laid-out line: either a run of chunk views or a single justified
/// group.
pub struct LineBox {
    entries: Vec<TextView>,
    /// Top of the line, relative to the paragraph origin.
    y: f32,
    metrics: LineMetrics,
}

impl LineBox {
    pub fn entries(&self) -> &[TextView] {
        &self.entries
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn metrics(&self) -> LineMetrics {
        self.metrics
    }

    pub fn offset(&self) -> usize {
        self.entries[0].offset()
    }

    pub fn end_offset(&self) -> usize {
        self.entries[self.entries.len() - 1].end_offset()
    }

    pub fn cursor_end(&self) -> usize {
        self.entries[self.entries.len() - 1].cursor_end()
    }
}

/// A paragraph's render view: breaks its node subtree's text into lines at
/// word boundaries and lays the lines out under the current alignment.
pub struct ParagraphView {
    node: NodeId,
    tree: TextTree,
    /// Node-mirroring views for the subtree's leaf runs.
    children: Vec<TextView>,
    /// Measured, unbroken chunk list (one per leaf run); reflow input.
    natural: Vec<ChunkView>,
    lines: Vec<LineBox>,
    /// Width the current lines were broken for; reflow memo key.
    layout_width: Option<f32>,
    /// Structure changed: rebuild the chunk list from the subtree.
    dirty: bool,
    /// Text changed without structure: re-snapshot and re-measure.
    content_dirty: bool,
    layout_valid: bool,
    origin: Point,
    size: Size,
}

impl ParagraphView {
    pub fn from_node(ctx: &ViewContext, node: NodeId) -> Self {
        let children = collect_leaves(&ctx.tree, node)
            .into_iter()
            .map(|leaf| TextView::Chunk(ChunkView::from_leaf(ctx, leaf)))
            .collect();
        Self {
            node,
            tree: ctx.tree.clone(),
            children,
            natural: Vec::new(),
            lines: Vec::new(),
            layout_width: None,
            dirty: true,
            content_dirty: false,
            layout_valid: false,
            origin: Point::default(),
            size: Size::ZERO,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub(crate) fn set_node(&mut self, node: NodeId) {
        self.node = node;
    }

    pub fn offset(&self) -> usize {
        self.tree.offset(self.node)
    }

    pub fn end_offset(&self) -> usize {
        self.tree.end_offset(self.node)
    }

    /// One past the last valid caret offset (a trailing line break is not a
    /// caret position).
    pub fn cursor_end(&self) -> usize {
        match self.lines.last() {
            Some(line) => line.cursor_end(),
            None => self.end_offset(),
        }
    }

    pub fn layout_valid(&self) -> bool {
        self.layout_valid
    }

    pub fn invalidate_layout(&mut self) {
        self.layout_valid = false;
    }

    pub fn mark_content_dirty(&mut self) {
        self.content_dirty = true;
        self.layout_valid = false;
    }

    pub fn mark_structure_dirty(&mut self) {
        self.dirty = true;
        self.layout_valid = false;
    }

    pub fn children(&self) -> &[TextView] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<TextView> {
        &mut self.children
    }

    pub fn lines(&self) -> &[LineBox] {
        &self.lines
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Recompute line breaks for `width` unless the memoized layout still
    /// applies: nothing dirty and the width unchanged, or infinite (an
    /// auto-size measurement pass never re-breaks).
    pub fn reflow(&mut self, ctx: &ViewContext, width: f32) {
        if !self.dirty
            && !self.content_dirty
            && self
                .layout_width
                .is_some_and(|prev| prev == width || !width.is_finite())
        {
            return;
        }
        if self.dirty || self.content_dirty || self.natural.is_empty() {
            if self.dirty {
                self.children = collect_leaves(&ctx.tree, self.node)
                    .into_iter()
                    .map(|leaf| TextView::Chunk(ChunkView::from_leaf(ctx, leaf)))
                    .collect();
            }
            self.natural = collect_leaves(&ctx.tree, self.node)
                .into_iter()
                .map(|leaf| ChunkView::from_leaf(ctx, leaf))
                .collect();
            self.dirty = false;
            self.content_dirty = false;
        }
        self.break_lines(ctx, width);
        self.layout_width = Some(width);
        trace!(
            target: "view.reflow",
            offset = self.offset(),
            width,
            lines = self.lines.len(),
            "paragraph reflow"
        );
    }

    fn break_lines(&mut self, ctx: &ViewContext, width: f32) {
        let breaking = ctx.style.wrap() == WrapMode::Word && width.is_finite();
        let spacing = ctx.style.line_spacing();
        let alignment = ctx.style.alignment();

        // Group chunks into lines with a push-back enumerator: a split
        // chunk's remainder goes back to the queue's front to start the
        // next line, so breaking never recurses.
        let mut queue: VecDeque<ChunkView> = self.natural.iter().cloned().collect();
        let mut groups: Vec<Vec<ChunkView>> = Vec::new();
        let mut cur: Vec<ChunkView> = Vec::new();
        let mut x = 0.0f32;
        while let Some(chunk) = queue.pop_front() {
            let fits = !breaking || chunk.trimmed_width() <= width - x;
            if fits {
                let hard = chunk.has_hard_break();
                x += chunk.width();
                cur.push(chunk);
                if hard {
                    groups.push(std::mem::take(&mut cur));
                    x = 0.0;
                }
                continue;
            }
            let avail = width - x;
            if let Some(rel) = chunk.find_word_break(avail) {
                let (head, tail) = chunk.break_at(chunk.offset() + rel);
                cur.push(head);
                queue.push_front(tail);
                groups.push(std::mem::take(&mut cur));
                x = 0.0;
            } else if cur.is_empty() {
                // The line is empty and not even the first word fits: the
                // word is wider than the line. Overflow it whole rather
                // than break inside it.
                match chunk.first_word_break() {
                    Some(rel) => {
                        let (head, tail) = chunk.break_at(chunk.offset() + rel);
                        cur.push(head);
                        queue.push_front(tail);
                        groups.push(std::mem::take(&mut cur));
                    }
                    None => {
                        cur.push(chunk);
                        groups.push(std::mem::take(&mut cur));
                    }
                }
                x = 0.0;
            } else {
                // Nothing more fits here; retry the chunk on a fresh line.
                queue.push_front(chunk);
                groups.push(std::mem::take(&mut cur));
                x = 0.0;
            }
        }
        if !cur.is_empty() || groups.is_empty() {
            groups.push(cur);
        }

        // Assemble line boxes: metrics, then alignment / justification.
        let count = groups.len();
        let mut lines = Vec::with_capacity(count);
        let mut y = 0.0f32;
        let mut max_width = 0.0f32;
        for (i, group) in groups.into_iter().enumerate() {
            let last_line = i + 1 == count;
            let line = Self::assemble_line(group, width, alignment, last_line, y, ctx);
            y += line.metrics.height;
            if !last_line {
                y += spacing;
            }
            max_width = max_width.max(line.metrics.width);
            lines.push(line);
        }
        self.lines = lines;
        self.size = Size::new(
            if alignment == Alignment::Fill && width.is_finite() {
                width.max(max_width)
            } else {
                max_width
            },
            y,
        );
    }

    fn assemble_line(
        group: Vec<ChunkView>,
        width: f32,
        alignment: Alignment,
        last_line: bool,
        y: f32,
        ctx: &ViewContext,
    ) -> LineBox {
        let natural_width = line_width(&group);
        let baseline = group
            .iter()
            .map(ChunkView::baseline)
            .fold(ctx.metrics.ascent(), f32::max);
        let height = group
            .iter()
            .map(ChunkView::height)
            .fold(ctx.metrics.line_height(), f32::max);

        let justify =
            alignment == Alignment::Fill && width.is_finite() && !group.is_empty() && !group[0].is_empty();
        if justify {
            let jv = JustifiedView::new(group, width, last_line);
            let metrics = LineMetrics {
                baseline: jv.baseline().max(baseline),
                height: jv.height().max(height),
                width: jv.width(),
            };
            return LineBox {
                entries: vec![TextView::Justified(jv)],
                y,
                metrics,
            };
        }

        let extra = if width.is_finite() {
            (width - natural_width).max(0.0)
        } else {
            0.0
        };
        let shift = match alignment {
            Alignment::Start | Alignment::Fill => 0.0,
            Alignment::End => extra,
            Alignment::Center => extra * 0.5,
        };
        let mut x = shift;
        let mut entries = Vec::with_capacity(group.len());
        for mut chunk in group {
            chunk.set_rel_x(x);
            x += chunk.width();
            entries.push(TextView::Chunk(chunk));
        }
        LineBox {
            entries,
            y,
            metrics: LineMetrics {
                baseline,
                height,
                width: natural_width,
            },
        }
    }

    pub fn measure(&mut self, ctx: &ViewContext, avail: Size) -> Size {
        self.reflow(ctx, avail.width);
        self.size
    }

    pub fn arrange(&mut self, ctx: &ViewContext, rect: Rect) {
        self.reflow(ctx, rect.width);
        self.origin = rect.origin();
        for line in &mut self.lines {
            let top = rect.y + line.y;
            let line_baseline = line.metrics.baseline;
            for entry in &mut line.entries {
                match entry {
                    TextView::Chunk(c) => {
                        let p = Point::new(rect.x + c.rel_x(), top + (line_baseline - c.baseline()));
                        c.arrange_at(p);
                    }
                    TextView::Justified(j) => {
                        let p = Point::new(rect.x, top + (line_baseline - j.baseline()));
                        j.arrange_at(p);
                    }
                    _ => debug_assert!(false, "line entries are chunks or justified groups"),
                }
            }
        }
        self.layout_valid = true;
    }

    pub fn draw(&self, ctx: &ViewContext, svc: &mut dyn DrawingService) {
        if !self.layout_valid {
            return;
        }
        for line in &self.lines {
            for entry in &line.entries {
                entry.draw(ctx, svc);
            }
        }
    }

    fn line_index_for(&self, offset: usize) -> Option<usize> {
        if self.lines.is_empty() || offset < self.offset() || offset > self.end_offset() {
            return None;
        }
        for (i, line) in self.lines.iter().enumerate() {
            if offset < line.end_offset() {
                return Some(i);
            }
        }
        Some(self.lines.len() - 1)
    }

    fn entry_for(&self, offset: usize) -> Option<&TextView> {
        let line = &self.lines[self.line_index_for(offset)?];
        for entry in line.entries() {
            if offset < entry.end_offset() {
                return Some(entry);
            }
        }
        line.entries().last()
    }

    pub fn model_to_view(&self, offset: usize) -> Option<Rect> {
        if !self.layout_valid {
            return None;
        }
        self.entry_for(offset)?.model_to_view(offset)
    }

    pub fn view_to_model(&self, point: Point) -> Option<usize> {
        if !self.layout_valid || self.lines.is_empty() {
            return None;
        }
        // Clamp to the nearest line band, then the nearest entry within it.
        let mut index = self.lines.len() - 1;
        for (i, line) in self.lines.iter().enumerate() {
            if point.y < self.origin.y + line.y + line.metrics.height {
                index = i;
                break;
            }
        }
        let line = &self.lines[index];
        let mut best: Option<&TextView> = None;
        let mut best_dist = f32::INFINITY;
        for entry in line.entries() {
            let dist = entry.horizontal_distance(point.x);
            if dist < best_dist {
                best_dist = dist;
                best = Some(entry);
            }
        }
        best.and_then(|e| e.view_to_model(point))
    }

    /// Append one highlight rectangle per line band intersecting the
    /// selection `[start, end)`.
    pub fn selection_rects(&self, start: usize, end: usize, out: &mut Vec<Rect>) {
        if !self.layout_valid {
            return;
        }
        for line in &self.lines {
            let lo = start.max(line.offset());
            let hi = end.min(line.cursor_end());
            if lo >= hi {
                continue;
            }
            let x0 = line_x_at(line, lo).unwrap_or(self.origin.x);
            let x1 = line_x_at(line, hi).unwrap_or(x0);
            out.push(Rect::new(
                x0,
                self.origin.y + line.y,
                (x1 - x0).max(0.0),
                line.metrics.height,
            ));
        }
    }

    pub fn navigate(&self, offset: usize, direction: Direction) -> NavOutcome {
        if !self.layout_valid {
            return NavOutcome::Invalid;
        }
        match direction {
            Direction::Left | Direction::Right => {
                if offset < self.offset() || offset > self.end_offset() {
                    return NavOutcome::Invalid;
                }
                let Some(entry) = self.entry_for(offset) else {
                    return NavOutcome::Invalid;
                };
                match entry.navigate(offset, direction) {
                    NavOutcome::BoundaryChanged(t) => {
                        if direction == Direction::Left {
                            if t <= self.offset() {
                                NavOutcome::BoundaryChanged(self.offset())
                            } else {
                                NavOutcome::Valid(t - 1)
                            }
                        } else if t >= self.end_offset() {
                            NavOutcome::BoundaryChanged(self.end_offset())
                        } else {
                            NavOutcome::Valid(t)
                        }
                    }
                    other => other,
                }
            }
            Direction::Up | Direction::Down => navigate_vertical_flat(
                offset,
                direction,
                |o| self.model_to_view(o),
                |o, d| self.navigate(o, d),
            ),
        }
    }
}

impl std::fmt::Debug for ParagraphView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParagraphView")
            .field("node", &self.node)
            .field("lines", &self.lines.len())
            .finish()
    }
}

/// Caret X of `offset` within a laid-out line.
fn line_x_at(line: &LineBox, offset: usize) -> Option<f32> {
    let entries = line.entries();
    let mut index = entries.len().checked_sub(1)?;
    for (i, entry) in entries.iter().enumerate() {
        if offset < entry.end_offset() {
            index = i;
            break;
        }
    }
    match &entries[index] {
        TextView::Chunk(c) => Some(c.x_at(offset)),
        TextView::Justified(j) => Some(j.x_at(offset)),
        _ => None,
    }
}

fn line_width(group: &[ChunkView]) -> f32 {
    match group.split_last() {
        Some((last, rest)) => rest.iter().map(ChunkView::width).sum::<f32>() + last.trimmed_width(),
        None => 0.0,
    }
}

/// Leaf runs of a node subtree, in document order.
pub(crate) fn collect_leaves(tree: &TextTree, node: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    collect_leaves_into(tree, node, &mut out);
    out
}

fn collect_leaves_into(tree: &TextTree, node: NodeId, out: &mut Vec<NodeId>) {
    if tree.is_leaf(node) {
        out.push(node);
        return;
    }
    for child in tree.children(node) {
        collect_leaves_into(tree, child, out);
    }
}
