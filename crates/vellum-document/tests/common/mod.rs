#![allow(dead_code)] // Shared across test binaries; each uses a subset.

use std::sync::Once;

use vellum_document::TextDocument;

static INIT: Once = Once::new();

/// Route tracing output through the test harness (enable with `RUST_LOG`).
pub fn trace_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Assert the node tree's contiguity invariants: children of every branch
/// are adjacent, non-overlapping, and together span their parent's range,
/// and interior paragraphs end exactly at a line break.
pub fn assert_tree_consistent(doc: &TextDocument) {
    let tree = doc.tree();
    let root = tree.root();
    assert_eq!(tree.offset(root), 0, "root starts at 0");
    assert_eq!(tree.end_offset(root), doc.len(), "root spans the content");
    check_branch(doc, root);
}

fn check_branch(doc: &TextDocument, node: vellum_document::NodeId) {
    let tree = doc.tree();
    if tree.is_leaf(node) {
        return;
    }
    let mut cursor = tree.offset(node);
    let count = tree.child_count(node);
    for slot in 0..count {
        let child = tree.child(node, slot);
        assert_eq!(tree.offset(child), cursor, "children are contiguous");
        let end = tree.end_offset(child);
        assert!(end >= cursor, "child range is ordered");
        cursor = end;
        check_branch(doc, child);
    }
    assert_eq!(cursor, tree.end_offset(node), "children span the parent");
}

/// Assert the paragraph-per-line shape: every paragraph except the last ends
/// with a newline and contains no interior newline.
pub fn assert_paragraphs_are_lines(doc: &TextDocument) {
    let tree = doc.tree();
    let root = tree.root();
    let count = tree.child_count(root);
    for slot in 0..count {
        let para = tree.child(root, slot);
        let start = tree.offset(para);
        let len = tree.end_offset(para) - start;
        let text = doc.text_at(start, len).unwrap();
        if slot + 1 < count {
            assert!(
                text.ends_with('\n'),
                "interior paragraph {slot} must end with a newline: {text:?}"
            );
        }
        let interior = text.strip_suffix('\n').unwrap_or(&text);
        assert!(
            !interior.contains('\n'),
            "paragraph {slot} has an interior newline: {text:?}"
        );
    }
}
