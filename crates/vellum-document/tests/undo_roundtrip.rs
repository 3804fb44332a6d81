//! Randomized undo/redo round-trips over structural edits.

mod common;

use proptest::prelude::*;
use vellum_document::{TextDocument, UndoHistory};

#[derive(Debug, Clone)]
enum Op {
    Insert { at: usize, text: String },
    Delete { at: usize, len: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), "[ab \né\n]{1,6}").prop_map(|(at, text)| Op::Insert { at, text }),
        (any::<usize>(), 1usize..8).prop_map(|(at, len)| Op::Delete { at, len }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]
    #[test]
    fn history_round_trips_text_and_structure(
        initial in "[ab\n]{0,20}",
        ops in proptest::collection::vec(op_strategy(), 1..10),
    ) {
        let mut doc = TextDocument::plain_text(&initial).unwrap();
        let history = UndoHistory::attach(&doc);
        common::assert_tree_consistent(&doc);
        common::assert_paragraphs_are_lines(&doc);

        for op in &ops {
            let len = doc.len();
            match op {
                Op::Insert { at, text } => {
                    doc.insert_at(at % (len + 1), text).unwrap();
                }
                Op::Delete { at, len: dlen } => {
                    if len == 0 {
                        continue;
                    }
                    let at = at % len;
                    let dlen = (*dlen).min(len - at);
                    if dlen == 0 {
                        continue;
                    }
                    doc.delete_at(at, dlen).unwrap();
                }
            }
            common::assert_tree_consistent(&doc);
            common::assert_paragraphs_are_lines(&doc);
        }
        let final_text = doc.text();

        while history.undo().unwrap() {}
        prop_assert_eq!(doc.text(), initial.clone());
        common::assert_tree_consistent(&doc);
        common::assert_paragraphs_are_lines(&doc);

        while history.redo().unwrap() {}
        prop_assert_eq!(doc.text(), final_text);
        common::assert_tree_consistent(&doc);
        common::assert_paragraphs_are_lines(&doc);
    }
}
