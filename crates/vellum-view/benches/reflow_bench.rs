//! Paragraph reflow throughput at alternating widths (memoization defeated
//! on purpose so every iteration re-breaks).

use std::rc::Rc;

use criterion::{Criterion, criterion_group, criterion_main};
use vellum_document::TextDocument;
use vellum_draw::Rect;
use vellum_style::{FixedMetrics, Style};
use vellum_view::DocumentView;

fn sample_text(words: usize) -> String {
    let bank = [
        "stone", "river", "lantern", "quiet", "harbor", "ember", "thread", "meadow", "sable",
        "north",
    ];
    let mut out = String::new();
    for i in 0..words {
        if i > 0 {
            if i % 12 == 0 {
                out.push('\n');
            } else {
                out.push(' ');
            }
        }
        out.push_str(bank[i % bank.len()]);
    }
    out
}

fn bench_reflow(c: &mut Criterion) {
    let doc = TextDocument::plain_text(&sample_text(600)).unwrap();
    let view = DocumentView::new(&doc, Style::new(), Rc::new(FixedMetrics::unit()));
    let mut flip = false;

    c.bench_function("reflow_600_words_alternating_width", |b| {
        b.iter(|| {
            flip = !flip;
            let width = if flip { 40.0 } else { 64.0 };
            view.update_layout(Rect::new(0.0, 0.0, width, 10_000.0));
        });
    });
}

criterion_group!(benches, bench_reflow);
criterion_main!(benches);
