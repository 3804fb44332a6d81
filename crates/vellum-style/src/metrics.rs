//! Font measurement abstraction.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Measures glyph geometry for one font. The view tree only ever needs
/// cluster advances and vertical metrics; shaping backends sit behind this
/// trait.
pub trait FontMetrics {
    /// Horizontal advance of a single grapheme cluster, in pixels.
    fn advance(&self, cluster: &str) -> f32;

    /// Height above the baseline.
    fn ascent(&self) -> f32;

    /// Height below the baseline.
    fn descent(&self) -> f32;

    fn line_height(&self) -> f32 {
        self.ascent() + self.descent()
    }

    /// Advance of a whole string (cluster-by-cluster sum).
    fn text_width(&self, text: &str) -> f32 {
        text.graphemes(true).map(|g| self.advance(g)).sum()
    }
}

/// Fixed-advance metrics scaled from Unicode cell widths.
///
/// Every single-cell cluster advances by `cell_width`, wide (CJK/emoji)
/// clusters by two cells, combining-only clusters and control characters by
/// zero. Deterministic, which makes it the metrics used by every layout
/// test.
#[derive(Debug, Clone, Copy)]
pub struct FixedMetrics {
    cell_width: f32,
    ascent: f32,
    descent: f32,
}

impl FixedMetrics {
    pub fn new(cell_width: f32, ascent: f32, descent: f32) -> Self {
        Self {
            cell_width,
            ascent,
            descent,
        }
    }

    /// Unit metrics: width 1.0 per cell, line height 1.0. Layout math in
    /// tests reads as "cells" directly.
    pub fn unit() -> Self {
        Self::new(1.0, 0.8, 0.2)
    }

    /// Metrics derived from a nominal font size.
    pub fn for_font_size(size: f32) -> Self {
        Self::new(size * 0.55, size * 0.8, size * 0.25)
    }
}

impl FontMetrics for FixedMetrics {
    fn advance(&self, cluster: &str) -> f32 {
        self.cell_width * cluster.width() as f32
    }

    fn ascent(&self) -> f32 {
        self.ascent
    }

    fn descent(&self) -> f32 {
        self.descent
    }
}
