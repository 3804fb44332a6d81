//! View-tree synchronization with document edits, undo, styles, and
//! drawing.

mod common;

use std::rc::Rc;

use vellum_document::{TextDocument, UndoHistory};
use vellum_draw::{DrawOp, DrawRecorder, Point, Rect, Size};
use vellum_style::{Alignment, FixedMetrics, Style, StyleKey, StyleValue};
use vellum_view::{Caret, DefaultViewFactory, TextView, ViewContext, ViewFactory};

fn paragraph_view_nodes(f: &common::Fixture) -> Vec<vellum_document::NodeId> {
    f.view.with_root(|root| match root {
        TextView::Block(b) => b.children().iter().map(TextView::node).collect(),
        other => panic!("expected block root, got {other:?}"),
    })
}

#[test]
fn splitting_a_paragraph_patches_the_view_children() {
    let mut f = common::fixture_at("hello world", 40.0);
    assert_eq!(paragraph_view_nodes(&f).len(), 1);

    f.doc.insert_at(5, "\n").unwrap();
    let nodes = paragraph_view_nodes(&f);
    assert_eq!(nodes.len(), 2, "one view per paragraph node");
    let tree = f.doc.tree();
    let root = tree.root();
    assert_eq!(nodes, vec![tree.child(root, 0), tree.child(root, 1)]);
    assert_eq!(
        f.view.with_root(TextView::node),
        root,
        "root view follows the node identity swap"
    );

    common::relayout(&f, 40.0);
    let below = f.view.model_to_view(6).unwrap();
    assert_eq!((below.x, below.y), (0.0, 1.0));
}

#[test]
fn merging_paragraphs_removes_their_views() {
    let mut f = common::fixture_at("ab\ncd\nef", 40.0);
    assert_eq!(paragraph_view_nodes(&f).len(), 3);
    f.doc.delete_at(1, 5).unwrap(); // "b\ncd\n": spans two newlines
    assert_eq!(f.doc.text(), "aef");
    assert_eq!(paragraph_view_nodes(&f).len(), 1);
    common::relayout(&f, 40.0);
    assert_eq!(f.view.model_to_view(3).unwrap().x, 3.0);
}

#[test]
fn undo_and_redo_patch_the_views_in_both_directions() {
    let mut f = common::fixture_at("hello world", 40.0);
    let history = UndoHistory::attach(&f.doc);
    f.doc.insert_at(5, "\n").unwrap();
    assert_eq!(paragraph_view_nodes(&f).len(), 2);

    history.undo().unwrap();
    assert_eq!(paragraph_view_nodes(&f).len(), 1);
    common::relayout(&f, 40.0);
    assert_eq!(f.view.model_to_view(7).unwrap().y, 0.0);

    history.redo().unwrap();
    assert_eq!(paragraph_view_nodes(&f).len(), 2);
    common::relayout(&f, 40.0);
    assert_eq!(f.view.model_to_view(7).unwrap().y, 1.0);
}

#[test]
fn content_edit_keeps_untouched_paragraph_views_consistent() {
    let mut f = common::fixture_at("aa\nbb", 40.0);
    let before = paragraph_view_nodes(&f);
    f.doc.insert_at(0, "x").unwrap();
    assert_eq!(paragraph_view_nodes(&f), before, "no structural patch");
    common::relayout(&f, 40.0);
    // "xaa\nbb": offset 5 is 'b' on line 1, shifted but never rebuilt.
    let rect = f.view.model_to_view(5).unwrap();
    assert_eq!((rect.x, rect.y), (1.0, 1.0));
}

#[test]
fn style_change_rebuilds_the_whole_view_tree() {
    let f = common::fixture_at("abc", 9.0);
    f.style.set(StyleKey::Alignment, StyleValue::Align(Alignment::End));
    assert!(!f.view.is_layout_valid(), "style change discards layout");
    common::relayout(&f, 9.0);
    assert_eq!(f.view.model_to_view(0).unwrap().x, 6.0);
}

#[test]
fn draw_emits_one_text_run_per_line() {
    let f = common::fixture_at("hello world foo", 11.0);
    let mut rec = DrawRecorder::new();
    f.view.draw(&mut rec);
    assert_eq!(rec.texts(), vec!["hello world ", "foo"]);
}

#[test]
fn caret_draws_selection_rects_per_line_band() {
    let f = common::fixture_at("hello world foo", 11.0);
    let caret = Caret::new(&f.doc).unwrap();
    caret.move_to(9).unwrap();
    caret.select(14).unwrap();
    let mut rec = DrawRecorder::new();
    caret.draw(&f.view, &mut rec);
    let rects = rec.rects();
    assert_eq!(rects.len(), 2, "selection spans two lines: {rects:?}");
    assert_eq!((rects[0].x, rects[0].y), (9.0, 0.0));
    assert_eq!((rects[1].x, rects[1].y), (0.0, 1.0));
    // The blinking caret line is drawn at the selection end.
    assert!(rec.ops.iter().any(|op| matches!(
        op,
        DrawOp::Line { from, .. } if from.x == 2.0 && from.y == 1.0
    )));
}

#[test]
fn hidden_blink_phase_suppresses_the_caret_line() {
    let f = common::fixture_at("abc", 20.0);
    let caret = Caret::with_blink_interval(&f.doc, 0.5).unwrap();
    caret.advance(0.7);
    let mut rec = DrawRecorder::new();
    caret.draw(&f.view, &mut rec);
    assert!(rec.ops.is_empty());
}

#[test]
fn branch_views_pass_mapping_and_navigation_through() {
    // Hand-built deeper structure: a section branch wrapping two
    // paragraphs, the shape a styled document produces.
    let doc = TextDocument::plain_text("ab\ncd").unwrap();
    let tree = doc.tree().clone();
    let root = tree.root();
    let p1 = tree.child(root, 0);
    let p2 = tree.child(root, 1);
    let section = tree.new_branch(vec![p1, p2]);
    let wrapper = tree.new_branch(vec![section]);

    let ctx = ViewContext {
        content: doc.content().clone(),
        tree: tree.clone(),
        style: Style::new(),
        metrics: Rc::new(FixedMetrics::unit()),
    };
    let factory = DefaultViewFactory;
    let mut view = factory.build(&ctx, wrapper);
    assert!(matches!(view, TextView::Branch(_)));
    assert!(matches!(view.children().unwrap()[0], TextView::Branch(_)));

    view.measure(&ctx, Size::new(20.0, f32::INFINITY));
    view.arrange(&ctx, Rect::new(0.0, 0.0, 20.0, 10.0));
    let rect = view.model_to_view(4).unwrap();
    assert_eq!((rect.x, rect.y), (1.0, 1.0));
    assert_eq!(view.view_to_model(Point::new(1.2, 1.5)), Some(4));

    // Horizontal motion glues across the nested paragraphs...
    assert_eq!(view.navigate(3, vellum_view::Direction::Left), vellum_view::NavOutcome::Valid(2));
    // ...and a nested branch bubbles its own edge outward instead of
    // deciding document-level legality.
    assert_eq!(
        view.navigate(0, vellum_view::Direction::Left),
        vellum_view::NavOutcome::BoundaryChanged(0)
    );
}
