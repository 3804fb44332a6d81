#![allow(dead_code)] // Shared across test binaries; each uses a subset.

use std::rc::Rc;
use std::sync::Once;

use vellum_document::TextDocument;
use vellum_draw::Rect;
use vellum_style::{FixedMetrics, Style};
use vellum_view::{DocumentView, ParagraphView, TextView};

static INIT: Once = Once::new();

pub fn trace_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub struct Fixture {
    pub doc: TextDocument,
    pub view: DocumentView,
    pub style: Style,
}

/// Document + view with unit metrics (1.0 per cell, line height 1.0), not
/// yet laid out.
pub fn fixture(text: &str) -> Fixture {
    trace_init();
    let doc = TextDocument::plain_text(text).unwrap();
    let style = Style::new();
    let view = DocumentView::new(&doc, style.clone(), Rc::new(FixedMetrics::unit()));
    Fixture { doc, view, style }
}

/// [`fixture`] laid out at `width`. Layout math in assertions reads as
/// cells.
pub fn fixture_at(text: &str, width: f32) -> Fixture {
    let f = fixture(text);
    f.view.update_layout(Rect::new(0.0, 0.0, width, 1000.0));
    f
}

pub fn relayout(f: &Fixture, width: f32) {
    f.view.update_layout(Rect::new(0.0, 0.0, width, 1000.0));
}

/// Run `f` against the `index`-th paragraph view under the block root.
pub fn with_paragraph<R>(
    view: &DocumentView,
    index: usize,
    f: impl FnOnce(&ParagraphView) -> R,
) -> R {
    view.with_root(|root| match root {
        TextView::Block(b) => match &b.children()[index] {
            TextView::Paragraph(p) => f(p),
            other => panic!("expected paragraph child, got {other:?}"),
        },
        other => panic!("expected block root, got {other:?}"),
    })
}

/// `(start, end)` offsets of every line of a paragraph.
pub fn line_ranges(view: &DocumentView, paragraph: usize) -> Vec<(usize, usize)> {
    with_paragraph(view, paragraph, |p| {
        p.lines()
            .iter()
            .map(|line| (line.offset(), line.end_offset()))
            .collect()
    })
}
