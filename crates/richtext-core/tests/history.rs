use richtext_core::{
    Document, Editor, EditorConfig, EditorError, ElementKind, MarkKind, Node, Op, PluginRegistry,
    Point, Selection, Transaction,
};

fn editor_with_text(text: &str) -> Editor {
    let doc = Document::new(vec![Node::paragraph(text)]);
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    Editor::new(doc, selection, PluginRegistry::core()).unwrap()
}

#[test]
fn undo_redo_handles_multi_op_insert_order() {
    let mut editor = editor_with_text("");

    let tx = Transaction::new(vec![
        Op::InsertText {
            path: vec![0, 0],
            offset: 0,
            text: "a".to_string(),
        },
        Op::InsertText {
            path: vec![0, 0],
            offset: 1,
            text: "b".to_string(),
        },
    ])
    .selection_after(Selection::collapsed(Point::new(vec![0, 0], 2)))
    .source("test:multi_insert");

    editor.apply(tx).unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("ab")]);
    assert_eq!(editor.selection().focus.offset, 2);
    assert_eq!(
        editor.history().last_undo().and_then(|e| e.source.as_deref()),
        Some("test:multi_insert")
    );

    assert!(editor.undo().unwrap());
    assert_eq!(editor.doc().children, vec![Node::paragraph("")]);
    assert_eq!(editor.selection().focus.offset, 0);

    assert!(editor.redo().unwrap());
    assert_eq!(editor.doc().children, vec![Node::paragraph("ab")]);
    assert_eq!(editor.selection().focus.offset, 2);
}

#[test]
fn undo_redo_handles_replace_and_new_block() {
    let mut editor = editor_with_text("XYZ");
    let selection_before = editor.selection().clone();

    let tx = Transaction::new(vec![
        Op::RemoveText {
            path: vec![0, 0],
            range: 0..3,
        },
        Op::InsertText {
            path: vec![0, 0],
            offset: 0,
            text: "a".to_string(),
        },
        Op::InsertNode {
            path: vec![1],
            node: Node::paragraph("bXYZ"),
        },
    ])
    .selection_after(Selection::collapsed(Point::new(vec![1, 0], 1)));

    editor.apply(tx).unwrap();
    let doc_after = editor.doc().clone();
    let selection_after = editor.selection().clone();
    assert_eq!(doc_after.children.len(), 2);

    assert!(editor.undo().unwrap());
    assert_eq!(editor.doc().children, vec![Node::paragraph("XYZ")]);
    assert_eq!(editor.selection(), &selection_before);

    assert!(editor.redo().unwrap());
    assert_eq!(editor.doc(), &doc_after);
    assert_eq!(editor.selection(), &selection_after);
}

#[test]
fn new_edit_discards_redo() {
    let mut editor = editor_with_text("");
    editor.insert_text("a").unwrap();
    editor.insert_text("b").unwrap();

    assert!(editor.undo().unwrap());
    assert!(editor.can_redo());

    editor.insert_text("c").unwrap();
    assert!(!editor.can_redo());
    assert!(!editor.redo().unwrap());
    assert_eq!(editor.doc().children, vec![Node::paragraph("ac")]);
}

#[test]
fn empty_history_reports_false() {
    let mut editor = editor_with_text("x");
    assert!(!editor.undo().unwrap());
    assert!(!editor.redo().unwrap());
}

#[test]
fn history_is_bounded_by_config() {
    let doc = Document::new(vec![Node::paragraph("")]);
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    let config = EditorConfig::default().max_undo(2);
    let mut editor = Editor::with_config(doc, selection, PluginRegistry::core(), config).unwrap();

    for text in ["a", "b", "c"] {
        editor.insert_text(text).unwrap();
    }
    assert_eq!(editor.history().undo_len(), 2);

    assert!(editor.undo().unwrap());
    assert!(editor.undo().unwrap());
    assert!(!editor.undo().unwrap());
    assert_eq!(editor.doc().children, vec![Node::paragraph("a")]);
}

#[test]
fn failing_transaction_rolls_back_every_op() {
    let mut editor = editor_with_text("keep");
    let doc_before = editor.doc().clone();
    let selection_before = editor.selection().clone();

    let tx = Transaction::new(vec![
        Op::InsertText {
            path: vec![0, 0],
            offset: 4,
            text: "!".to_string(),
        },
        Op::InsertText {
            path: vec![3, 0],
            offset: 0,
            text: "?".to_string(),
        },
    ]);
    let err = editor.apply(tx).unwrap_err();

    assert!(matches!(err, EditorError::Path(_)));
    assert_eq!(editor.doc(), &doc_before);
    assert_eq!(editor.selection(), &selection_before);
    assert!(!editor.can_undo());
}

#[test]
fn grammar_violation_rolls_back() {
    let mut editor = editor_with_text("outer");
    let doc_before = editor.doc().clone();

    let tx = Transaction::new(vec![Op::InsertNode {
        path: vec![0, 1],
        node: Node::paragraph("inner"),
    }]);
    let err = editor.apply(tx).unwrap_err();

    assert!(matches!(err, EditorError::Structural(_)));
    assert_eq!(editor.doc(), &doc_before);
    assert!(!editor.can_undo());
}

#[test]
fn empty_transaction_is_a_no_op() {
    let mut editor = editor_with_text("x");
    let err = editor.apply(Transaction::new(Vec::new())).unwrap_err();
    assert!(err.is_no_op());
    assert!(!editor.can_undo());
}

#[test]
fn normalization_ops_are_undone_with_the_command() {
    let doc = Document::new(vec![Node::paragraph("ab")]);
    let selection = Selection::new(Point::new(vec![0, 0], 0), Point::new(vec![0, 0], 1));
    let mut editor = Editor::new(doc.clone(), selection, PluginRegistry::richtext()).unwrap();

    editor.toggle_mark(MarkKind::Bold).unwrap();
    editor.toggle_mark(MarkKind::Bold).unwrap();
    assert_eq!(editor.doc(), &doc);

    assert!(editor.undo().unwrap());
    let Node::Element(el) = &editor.doc().children[0] else {
        panic!("expected element block");
    };
    assert_eq!(el.children.len(), 2);

    assert!(editor.undo().unwrap());
    assert_eq!(editor.doc(), &doc);
    assert!(editor.doc().is_valid());
}

#[test]
fn commands_record_their_source() {
    let doc = Document::new(vec![Node::paragraph("a")]);
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    let mut editor = Editor::new(doc, selection, PluginRegistry::richtext()).unwrap();

    editor.toggle_block(ElementKind::NumberedList).unwrap();
    let entry = editor.history().last_undo().unwrap();
    assert_eq!(entry.source.as_deref(), Some("block.toggle"));
    assert_eq!(entry.inverse_ops.len(), entry.ops.len());
}
