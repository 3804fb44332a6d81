//! Leaf chunk views: the unit of line breaking.
//!
//! A chunk snapshots a contiguous run of a leaf node's characters together
//! with per-char advances. Reflow splits chunks at word boundaries; a piece
//! remembers only its offset *relative to the node*, so its absolute range
//! rides along with the node's tracked positions when edits elsewhere in
//! the document shift it.
//!
//! A chunk's render range can be narrower than its raw range: trailing
//! whitespace is trimmed for alignment purposes, and a trailing line break
//! is a "hard" glyph: it forces the line to end and its interior is not a
//! valid caret position.

use unicode_segmentation::UnicodeSegmentation;
use vellum_document::{NodeId, TextTree};
use vellum_draw::{DrawingService, Point, Rect};
use vellum_style::Decorations;

use crate::context::ViewContext;
use crate::nav::{Direction, NavOutcome};
use crate::words;

#[derive(Clone)]
pub struct ChunkView {
    node: NodeId,
    tree: TextTree,
    /// Char offset of this chunk within its node.
    rel: usize,
    text: String,
    /// Per-char advances; a cluster's full advance sits on its head char,
    /// continuation chars carry zero.
    advances: Vec<f32>,
    /// Chars before any trailing line break: offsets in
    /// `[offset, offset + hard_len]` are valid caret positions.
    hard_len: usize,
    /// Chars before trailing whitespace; what alignment measures.
    trimmed_len: usize,
    height: f32,
    baseline: f32,
    /// X within the owning line, assigned by reflow.
    rel_x: f32,
    origin: Point,
    layout_valid: bool,
}

impl ChunkView {
    /// Snapshot the full range of a leaf node.
    pub fn from_leaf(ctx: &ViewContext, node: NodeId) -> Self {
        let start = ctx.tree.offset(node);
        let end = ctx.tree.end_offset(node);
        let text = ctx
            .content
            .text_at(start, end - start)
            .expect("leaf node range stays within the content");
        Self::from_parts(ctx, node, 0, text)
    }

    fn from_parts(ctx: &ViewContext, node: NodeId, rel: usize, text: String) -> Self {
        let mut advances = Vec::with_capacity(text.len());
        for cluster in text.graphemes(true) {
            advances.push(ctx.metrics.advance(cluster));
            for _ in 1..cluster.chars().count() {
                advances.push(0.0);
            }
        }
        let (hard_len, trimmed_len) = trim_lengths(&text, advances.len());
        Self {
            node,
            tree: ctx.tree.clone(),
            rel,
            text,
            advances,
            hard_len,
            trimmed_len,
            height: ctx.metrics.line_height(),
            baseline: ctx.metrics.ascent(),
            rel_x: 0.0,
            origin: Point::default(),
            layout_valid: false,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Absolute start offset, derived live from the node's range.
    pub fn offset(&self) -> usize {
        self.tree.offset(self.node) + self.rel
    }

    pub fn end_offset(&self) -> usize {
        self.offset() + self.chars()
    }

    /// One past the last valid caret offset inside this chunk.
    pub fn cursor_end(&self) -> usize {
        self.offset() + self.hard_len
    }

    pub fn chars(&self) -> usize {
        self.advances.len()
    }

    /// Snapshot text of this chunk.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.advances.is_empty()
    }

    /// True when the chunk ends with a line break and must end its line.
    pub fn has_hard_break(&self) -> bool {
        self.hard_len < self.chars()
    }

    /// Full advance, trailing whitespace included.
    pub fn width(&self) -> f32 {
        self.prefix_width(self.chars())
    }

    /// Advance excluding trailing whitespace; what alignment sees.
    pub fn trimmed_width(&self) -> f32 {
        self.prefix_width(self.trimmed_len)
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn baseline(&self) -> f32 {
        self.baseline
    }

    pub fn layout_valid(&self) -> bool {
        self.layout_valid
    }

    pub fn invalidate_layout(&mut self) {
        self.layout_valid = false;
    }

    pub(crate) fn rel_x(&self) -> f32 {
        self.rel_x
    }

    pub(crate) fn set_rel_x(&mut self, x: f32) {
        self.rel_x = x;
    }

    /// Place the chunk at an absolute origin (its top-left).
    pub(crate) fn arrange_at(&mut self, origin: Point) {
        self.origin = origin;
        self.layout_valid = true;
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    fn prefix_width(&self, chars: usize) -> f32 {
        self.advances[..chars.min(self.advances.len())].iter().sum()
    }

    /// Absolute X of a caret sitting at `offset` (clamped to caret-valid
    /// positions).
    pub fn x_at(&self, offset: usize) -> f32 {
        let rel = offset.saturating_sub(self.offset()).min(self.hard_len);
        self.origin.x + self.prefix_width(rel)
    }

    /// Caret rectangle for `offset`. Queries exactly at `end_offset` are
    /// answered (the caret after the last character), with zero width.
    pub fn model_to_view(&self, offset: usize) -> Option<Rect> {
        let start = self.offset();
        if !self.layout_valid || offset < start || offset > start + self.chars() {
            return None;
        }
        let rel = (offset - start).min(self.hard_len);
        let width = if rel < self.hard_len {
            self.advances[rel]
        } else {
            0.0
        };
        Some(Rect::new(
            self.origin.x + self.prefix_width(rel),
            self.origin.y,
            width,
            self.height,
        ))
    }

    /// Nearest caret-valid cluster boundary to an X coordinate.
    pub fn view_to_model(&self, x: f32) -> Option<usize> {
        if !self.layout_valid {
            return None;
        }
        let start = self.offset();
        let mut best = start;
        let mut best_dist = f32::INFINITY;
        for boundary in self.cluster_boundaries() {
            if boundary > self.hard_len {
                break;
            }
            let bx = self.origin.x + self.prefix_width(boundary);
            let dist = (bx - x).abs();
            if dist < best_dist {
                best = start + boundary;
                best_dist = dist;
            }
        }
        Some(best)
    }

    /// Character-by-character horizontal motion. `BoundaryChanged` fires
    /// only exactly at the chunk's own edges.
    pub fn navigate(&self, offset: usize, direction: Direction) -> NavOutcome {
        let start = self.offset();
        match direction {
            Direction::Left => {
                if offset <= start {
                    NavOutcome::BoundaryChanged(start)
                } else if offset > start + self.chars() {
                    NavOutcome::Invalid
                } else {
                    NavOutcome::Valid(offset - 1)
                }
            }
            Direction::Right => {
                if offset < start {
                    NavOutcome::Invalid
                } else if offset >= self.cursor_end() {
                    NavOutcome::BoundaryChanged(start + self.chars())
                } else {
                    NavOutcome::Valid(offset + 1)
                }
            }
            // A chunk has no lines of its own.
            Direction::Up | Direction::Down => NavOutcome::BoundaryChanged(offset),
        }
    }

    /// Split into `[offset, at)` and `[at, end_offset)`. `at` is an absolute
    /// char offset strictly inside the chunk.
    pub fn break_at(&self, at: usize) -> (ChunkView, ChunkView) {
        let start = self.offset();
        debug_assert!(at > start && at < start + self.chars(), "break strictly inside");
        let rel = at - start;
        let byte = char_to_byte(&self.text, rel);
        let (head_text, tail_text) = self.text.split_at(byte);
        let head = self.rebuild_slice(self.rel, head_text.to_owned(), &self.advances[..rel]);
        let tail = self.rebuild_slice(self.rel + rel, tail_text.to_owned(), &self.advances[rel..]);
        (head, tail)
    }

    fn rebuild_slice(&self, rel: usize, text: String, advances: &[f32]) -> ChunkView {
        let (hard_len, trimmed_len) = trim_lengths(&text, advances.len());
        ChunkView {
            node: self.node,
            tree: self.tree.clone(),
            rel,
            text,
            advances: advances.to_vec(),
            hard_len,
            trimmed_len,
            height: self.height,
            baseline: self.baseline,
            rel_x: 0.0,
            origin: Point::default(),
            layout_valid: false,
        }
    }

    /// Best word-break char count (relative) whose trimmed prefix fits in
    /// `avail`. Never splits inside a word; `None` when not even the first
    /// word fits.
    pub fn find_word_break(&self, avail: f32) -> Option<usize> {
        let mut best = None;
        for boundary in words::word_break_offsets(&self.text) {
            if boundary == 0 || boundary >= self.chars() {
                continue;
            }
            // Trailing whitespace before the boundary does not count
            // against the line width.
            let mut measured = boundary;
            let prefix_bytes = char_to_byte(&self.text, boundary);
            for c in self.text[..prefix_bytes].chars().rev() {
                if c.is_whitespace() {
                    measured -= 1;
                } else {
                    break;
                }
            }
            if self.prefix_width(measured) <= avail {
                best = Some(boundary);
            } else {
                break;
            }
        }
        best
    }

    /// Absolute variant of [`find_word_break`](Self::find_word_break).
    pub fn find_word_break_offset(&self, avail: f32) -> Option<usize> {
        self.find_word_break(avail).map(|rel| self.offset() + rel)
    }

    /// First interior word boundary, used when a word is wider than the
    /// whole line and must overflow on a line of its own.
    pub fn first_word_break(&self) -> Option<usize> {
        words::word_break_offsets(&self.text)
            .into_iter()
            .find(|b| *b > 0 && *b < self.chars())
    }

    /// X extent of the intersection with a selection `[sel_start, sel_end)`,
    /// or `None` when disjoint.
    pub fn selection_span(&self, sel_start: usize, sel_end: usize) -> Option<(f32, f32)> {
        let lo = sel_start.max(self.offset());
        let hi = sel_end.min(self.cursor_end());
        if lo >= hi {
            return None;
        }
        Some((self.x_at(lo), self.x_at(hi)))
    }

    pub fn draw(&self, ctx: &ViewContext, svc: &mut dyn DrawingService) {
        if !self.layout_valid || self.trimmed_len == 0 {
            return;
        }
        let visible = &self.text[..char_to_byte(&self.text, self.hard_len)];
        let color = ctx.style.text_color();
        let baseline_origin = Point::new(self.origin.x, self.origin.y + self.baseline);
        svc.draw_blurred_text(baseline_origin, visible, color, 0.0);

        let decorations = ctx.style.decorations();
        let width = self.trimmed_width();
        if decorations.contains(Decorations::UNDERLINE) {
            let y = self.origin.y + self.baseline + (self.height - self.baseline) * 0.5;
            svc.draw_line(
                Point::new(self.origin.x, y),
                Point::new(self.origin.x + width, y),
                1.0,
                color,
            );
        }
        if decorations.contains(Decorations::STRIKETHROUGH) {
            let y = self.origin.y + self.baseline * 0.6;
            svc.draw_line(
                Point::new(self.origin.x, y),
                Point::new(self.origin.x + width, y),
                1.0,
                color,
            );
        }
    }

    /// Char offsets (relative) of every cluster boundary, end included.
    fn cluster_boundaries(&self) -> Vec<usize> {
        let mut out = vec![0];
        let mut chars = 0;
        for cluster in self.text.graphemes(true) {
            chars += cluster.chars().count();
            out.push(chars);
        }
        out
    }
}

impl std::fmt::Debug for ChunkView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkView")
            .field("node", &self.node)
            .field("rel", &self.rel)
            .field("text", &self.text)
            .finish()
    }
}

/// (chars before a trailing line-break run, chars before trailing
/// whitespace).
fn trim_lengths(text: &str, chars: usize) -> (usize, usize) {
    let hard = chars
        - text
            .chars()
            .rev()
            .take_while(|c| *c == '\n' || *c == '\r')
            .count();
    let trimmed = chars - text.chars().rev().take_while(|c| c.is_whitespace()).count();
    (hard, trimmed)
}

fn char_to_byte(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}
