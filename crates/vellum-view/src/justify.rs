//! Justified line groups.
//!
//! When a paragraph's alignment is `Fill`, each completed line's chunk group
//! is wrapped into one `JustifiedView`, which re-subdivides the text at word
//! starts and distributes the line's leftover width as extra gaps between
//! the word chunks. The last line of a justified paragraph is never
//! stretched.

use vellum_draw::{DrawingService, Point, Rect};

use crate::chunk::ChunkView;
use crate::context::ViewContext;
use crate::nav::{Direction, NavOutcome};
use crate::words;

pub struct JustifiedView {
    chunks: Vec<ChunkView>,
    width: f32,
    height: f32,
    baseline: f32,
    origin: Point,
    last_line: bool,
    layout_valid: bool,
}

impl JustifiedView {
    /// Wrap one line's chunk group, stretching it to `avail` unless this is
    /// the paragraph's last line.
    ///
    /// Gap policy: the extra space is divided by the number of word chunks
    /// (floored to whole pixels); the division remainder is absorbed
    /// entirely by the last gap, so rounding error never exceeds a pixel
    /// and never accumulates at the line's right edge.
    pub fn new(line: Vec<ChunkView>, avail: f32, last_line: bool) -> Self {
        debug_assert!(!line.is_empty(), "justified line needs content");

        // Subdivide at word starts so gaps land between words.
        let mut pieces: Vec<ChunkView> = Vec::new();
        for chunk in line {
            let mut current = chunk;
            let starts: Vec<usize> = words::word_start_offsets(current.text())
                .into_iter()
                .map(|rel| current.offset() + rel)
                .collect();
            for at in starts {
                if at <= current.offset() || at >= current.end_offset() {
                    continue;
                }
                let (head, tail) = current.break_at(at);
                pieces.push(head);
                current = tail;
            }
            pieces.push(current);
        }

        let k = pieces.len();
        let natural: f32 = pieces[..k - 1].iter().map(ChunkView::width).sum::<f32>()
            + pieces[k - 1].trimmed_width();
        let extra = if avail.is_finite() { avail - natural } else { 0.0 };
        let stretch = !last_line && extra > 0.0 && k >= 2;

        let per_gap = if stretch {
            (extra / k as f32).floor()
        } else {
            0.0
        };
        let mut x = 0.0;
        for (i, piece) in pieces.iter_mut().enumerate() {
            piece.set_rel_x(x);
            x += piece.width();
            if stretch && i + 1 < k {
                x += if i + 1 == k - 1 {
                    // Last gap absorbs the remainder.
                    extra - per_gap * (k as f32 - 2.0)
                } else {
                    per_gap
                };
            }
        }

        let height = pieces.iter().map(ChunkView::height).fold(0.0, f32::max);
        let baseline = pieces.iter().map(ChunkView::baseline).fold(0.0, f32::max);
        Self {
            chunks: pieces,
            width: if stretch { avail } else { natural },
            height,
            baseline,
            origin: Point::default(),
            last_line,
            layout_valid: false,
        }
    }

    pub fn offset(&self) -> usize {
        self.chunks[0].offset()
    }

    pub fn end_offset(&self) -> usize {
        self.chunks[self.chunks.len() - 1].end_offset()
    }

    pub fn cursor_end(&self) -> usize {
        self.chunks[self.chunks.len() - 1].cursor_end()
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn baseline(&self) -> f32 {
        self.baseline
    }

    pub fn is_last_line(&self) -> bool {
        self.last_line
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn word_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> &[ChunkView] {
        &self.chunks
    }

    pub fn layout_valid(&self) -> bool {
        self.layout_valid
    }

    pub fn invalidate_layout(&mut self) {
        self.layout_valid = false;
        for c in &mut self.chunks {
            c.invalidate_layout();
        }
    }

    pub fn arrange_at(&mut self, origin: Point) {
        self.origin = origin;
        for chunk in &mut self.chunks {
            let dx = chunk.rel_x();
            let dy = self.baseline - chunk.baseline();
            chunk.arrange_at(origin.offset(dx, dy));
        }
        self.layout_valid = true;
    }

    fn chunk_index_for(&self, offset: usize) -> Option<usize> {
        if offset < self.offset() || offset > self.end_offset() {
            return None;
        }
        for (i, chunk) in self.chunks.iter().enumerate() {
            if offset < chunk.end_offset() {
                return Some(i);
            }
        }
        Some(self.chunks.len() - 1)
    }

    /// Caret X for an offset inside this line (gaps included).
    pub fn x_at(&self, offset: usize) -> f32 {
        match self.chunk_index_for(offset) {
            Some(i) => self.chunks[i].x_at(offset),
            None => self.origin.x,
        }
    }

    pub fn model_to_view(&self, offset: usize) -> Option<Rect> {
        if !self.layout_valid {
            return None;
        }
        let i = self.chunk_index_for(offset)?;
        self.chunks[i].model_to_view(offset)
    }

    pub fn view_to_model(&self, x: f32) -> Option<usize> {
        if !self.layout_valid {
            return None;
        }
        // Pick the word chunk whose span is horizontally nearest.
        let mut best = None;
        let mut best_dist = f32::INFINITY;
        for chunk in &self.chunks {
            let left = chunk.origin().x;
            let right = left + chunk.width();
            let dist = if x < left {
                left - x
            } else if x > right {
                x - right
            } else {
                0.0
            };
            if dist < best_dist {
                best_dist = dist;
                best = Some(chunk);
            }
        }
        best.and_then(|c| c.view_to_model(x))
    }

    pub fn navigate(&self, offset: usize, direction: Direction) -> NavOutcome {
        match direction {
            Direction::Up | Direction::Down => NavOutcome::BoundaryChanged(offset),
            Direction::Left | Direction::Right => {
                let Some(i) = self.chunk_index_for(offset) else {
                    return NavOutcome::Invalid;
                };
                match self.chunks[i].navigate(offset, direction) {
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
        }
    }

    pub fn draw(&self, ctx: &ViewContext, svc: &mut dyn DrawingService) {
        for chunk in &self.chunks {
            chunk.draw(ctx, svc);
        }
    }
}

impl std::fmt::Debug for JustifiedView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JustifiedView")
            .field("words", &self.chunks.len())
            .field("last_line", &self.last_line)
            .finish()
    }
}
