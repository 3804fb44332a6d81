//! Paragraph reflow: word-safe line breaking, alignment, trimming.

mod common;

use vellum_draw::Size;
use vellum_style::{Alignment, StyleKey, StyleValue, WrapMode};
use vellum_view::is_word_break;

#[test]
fn wrap_breaks_only_at_word_boundaries() {
    let f = common::fixture_at("hello world foo", 11.0);
    let ranges = common::line_ranges(&f.view, 0);
    assert_eq!(ranges, vec![(0, 12), (12, 15)]);
}

#[test]
fn no_line_boundary_falls_inside_a_word() {
    let text = "the quick brown fox jumps over the lazy dog";
    for width in 4..30 {
        let f = common::fixture_at(text, width as f32);
        let ranges = common::line_ranges(&f.view, 0);
        assert_eq!(ranges[0].0, 0);
        assert_eq!(ranges[ranges.len() - 1].1, text.chars().count());
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].1, pair[1].0, "lines are contiguous");
            let boundary = pair[0].1;
            assert!(
                is_word_break(text, boundary),
                "width {width}: boundary {boundary} is inside a word"
            );
        }
    }
}

#[test]
fn word_wider_than_line_overflows_unbroken() {
    let f = common::fixture_at("a extraordinarily b", 6.0);
    let ranges = common::line_ranges(&f.view, 0);
    // "extraordinarily" (15 cells) exceeds the 6-cell line but is never
    // split.
    assert!(ranges.contains(&(2, 17)), "ranges: {ranges:?}");
}

#[test]
fn wrap_none_keeps_a_single_line() {
    let f = common::fixture_at("hello world", 3.0);
    f.style.set(StyleKey::WrapText, StyleValue::Wrap(WrapMode::None));
    common::relayout(&f, 3.0);
    assert_eq!(common::line_ranges(&f.view, 0).len(), 1);
}

#[test]
fn measurement_with_infinite_width_reports_natural_size() {
    let f = common::fixture("hello world");
    let size = f.view.measure(Size::new(f32::INFINITY, f32::INFINITY));
    assert_eq!(size.width, 11.0);
    assert_eq!(size.height, 1.0);
}

#[test]
fn infinite_measure_after_layout_keeps_existing_breaks() {
    // An auto-size measurement pass with unconstrained space never
    // re-breaks an already reflowed paragraph.
    let f = common::fixture_at("hello world", 5.0);
    let lines_before = common::line_ranges(&f.view, 0).len();
    f.view.measure(Size::new(f32::INFINITY, f32::INFINITY));
    assert_eq!(common::line_ranges(&f.view, 0).len(), lines_before);
}

#[test]
fn center_and_end_alignment_shift_lines() {
    let f = common::fixture_at("abc", 9.0);
    f.style.set(StyleKey::Alignment, StyleValue::Align(Alignment::Center));
    common::relayout(&f, 9.0);
    assert_eq!(f.view.model_to_view(0).unwrap().x, 3.0);

    f.style.set(StyleKey::Alignment, StyleValue::Align(Alignment::End));
    common::relayout(&f, 9.0);
    assert_eq!(f.view.model_to_view(0).unwrap().x, 6.0);
}

#[test]
fn trailing_space_does_not_count_for_alignment() {
    let f = common::fixture_at("ab   ", 9.0);
    f.style.set(StyleKey::Alignment, StyleValue::Align(Alignment::End));
    common::relayout(&f, 9.0);
    // Shift uses the trimmed width (2), not the raw width (5).
    assert_eq!(f.view.model_to_view(0).unwrap().x, 7.0);
}

#[test]
fn hard_break_starts_a_new_line_box() {
    let f = common::fixture_at("ab\ncd", 20.0);
    assert_eq!(common::line_ranges(&f.view, 0), vec![(0, 3)]);
    assert_eq!(common::line_ranges(&f.view, 1), vec![(3, 5)]);
    let below = f.view.model_to_view(3).unwrap();
    assert_eq!((below.x, below.y), (0.0, 1.0));
}

#[test]
fn empty_document_still_has_a_caret_line() {
    let f = common::fixture_at("", 10.0);
    let rect = f.view.model_to_view(0).unwrap();
    assert_eq!((rect.x, rect.y), (0.0, 0.0));
    assert_eq!(rect.height, 1.0);
}

#[test]
fn trailing_newline_yields_an_empty_final_line() {
    let f = common::fixture_at("ab\n", 10.0);
    let rect = f.view.model_to_view(3).unwrap();
    assert_eq!((rect.x, rect.y), (0.0, 1.0));
}

#[test]
fn caret_cannot_sit_inside_the_trailing_line_break() {
    let f = common::fixture_at("ab\ncd", 20.0);
    // Clicking far right on line 1 lands before the newline, never after.
    let hit = f
        .view
        .view_to_model(vellum_draw::Point::new(50.0, 0.5))
        .unwrap();
    assert_eq!(hit, 2);
}

#[test]
fn line_spacing_separates_line_bands() {
    let f = common::fixture_at("hello world foo", 11.0);
    f.style.set(StyleKey::LineSpacing, StyleValue::Float(0.5));
    common::relayout(&f, 11.0);
    assert_eq!(f.view.model_to_view(12).unwrap().y, 1.5);
}
