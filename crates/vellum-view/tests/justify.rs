//! Justification: gap distribution and last-line behavior.

mod common;

use vellum_style::{Alignment, StyleKey, StyleValue};
use vellum_view::TextView;

fn fill_fixture(text: &str, width: f32) -> common::Fixture {
    let f = common::fixture(text);
    f.style.set(StyleKey::Alignment, StyleValue::Align(Alignment::Fill));
    common::relayout(&f, width);
    f
}

fn justified_line(
    f: &common::Fixture,
    paragraph: usize,
    line: usize,
    check: impl FnOnce(&vellum_view::JustifiedView),
) {
    common::with_paragraph(&f.view, paragraph, |p| {
        match &p.lines()[line].entries()[0] {
            TextView::Justified(j) => check(j),
            other => panic!("expected a justified line, got {other:?}"),
        }
    });
}

#[test]
fn justified_line_fills_the_available_width() {
    let f = fill_fixture("aa bb cc dd ee", 10.0);
    justified_line(&f, 0, 0, |j| {
        assert!(!j.is_last_line());
        assert_eq!(j.width(), 10.0);
        let last = j.chunks().last().unwrap();
        let right_edge = last.origin().x + last.trimmed_width();
        assert!(
            (right_edge - 10.0).abs() <= 1.0,
            "rounding stays within a pixel: {right_edge}"
        );
    });
}

#[test]
fn gap_remainder_lands_in_the_last_gap() {
    let f = fill_fixture("aa bb cc dd ee", 10.0);
    justified_line(&f, 0, 0, |j| {
        // Three word chunks "aa ", "bb ", "cc "; 2 cells extra; 2/3 floors
        // to 0, so the whole remainder widens the final gap.
        let xs: Vec<f32> = j.chunks().iter().map(|c| c.origin().x).collect();
        assert_eq!(xs, vec![0.0, 3.0, 8.0]);
    });
}

#[test]
fn width_sum_property_across_widths() {
    let text = "one two three four five six seven eight";
    for width in 10..24 {
        let f = fill_fixture(text, width as f32);
        common::with_paragraph(&f.view, 0, |p| {
            let lines = p.lines();
            for (i, line) in lines.iter().enumerate() {
                let TextView::Justified(j) = &line.entries()[0] else {
                    panic!("expected justified entries");
                };
                if i + 1 == lines.len() || j.word_chunk_count() < 2 {
                    continue;
                }
                let last = j.chunks().last().unwrap();
                let right_edge = last.origin().x + last.trimmed_width();
                assert!(
                    (right_edge - width as f32).abs() <= 1.0,
                    "width {width}, line {i}: edge {right_edge}"
                );
            }
        });
    }
}

#[test]
fn last_line_is_never_stretched() {
    let f = fill_fixture("aa bb cc dd ee", 10.0);
    justified_line(&f, 0, 1, |j| {
        assert!(j.is_last_line());
        // "dd ee" keeps its natural 5-cell width and starts flush left.
        assert_eq!(j.width(), 5.0);
        assert_eq!(j.chunks()[0].origin().x, 0.0);
    });
}

#[test]
fn single_word_line_cannot_stretch() {
    let f = fill_fixture("extraordinarily so", 8.0);
    justified_line(&f, 0, 0, |j| {
        assert_eq!(j.word_chunk_count(), 1);
        assert_eq!(j.chunks()[0].origin().x, 0.0);
    });
}

#[test]
fn caret_mapping_accounts_for_inserted_gaps() {
    let f = fill_fixture("aa bb cc dd ee", 10.0);
    // Offset 6 starts "cc", shifted right by the widened gap.
    assert_eq!(f.view.model_to_view(6).unwrap().x, 8.0);
    // Clicking inside the widened gap resolves to a word edge, not inside
    // a word.
    let hit = f.view.view_to_model(vellum_draw::Point::new(7.2, 0.5)).unwrap();
    assert!(hit == 5 || hit == 6, "hit {hit}");
}
