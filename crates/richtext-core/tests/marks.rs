use richtext_core::{
    Document, Editor, EditorError, MarkKind, MarkValue, Node, PluginRegistry, Point, Selection,
};

fn editor_with(doc: Document, anchor: (&[usize], usize), focus: (&[usize], usize)) -> Editor {
    let selection = Selection::new(
        Point::new(anchor.0.to_vec(), anchor.1),
        Point::new(focus.0.to_vec(), focus.1),
    );
    Editor::new(doc, selection, PluginRegistry::richtext()).unwrap()
}

fn runs(editor: &Editor, block: usize, mark: MarkKind) -> Vec<(String, bool)> {
    let Node::Element(el) = &editor.doc().children[block] else {
        panic!("expected element block");
    };
    el.children
        .iter()
        .map(|n| match n {
            Node::Text(t) => (t.text.clone(), t.marks.is_active(mark)),
            Node::Element(_) => panic!("expected leaf"),
        })
        .collect()
}

#[test]
fn italic_on_substring_splits_into_three_runs() {
    let doc = Document::new(vec![Node::paragraph("hello")]);
    let mut editor = editor_with(doc, (&[0, 0], 1), (&[0, 0], 4));

    editor.toggle_mark(MarkKind::Italic).unwrap();

    assert_eq!(
        runs(&editor, 0, MarkKind::Italic),
        vec![
            ("h".to_string(), false),
            ("ell".to_string(), true),
            ("o".to_string(), false),
        ]
    );
    assert!(editor.is_mark_active(MarkKind::Italic));
    assert_eq!(editor.history().undo_len(), 1);
}

#[test]
fn toggling_twice_restores_unmarked_runs() {
    let doc = Document::new(vec![Node::paragraph("hello")]);
    let mut editor = editor_with(doc.clone(), (&[0, 0], 1), (&[0, 0], 4));

    editor.toggle_mark(MarkKind::Italic).unwrap();
    editor.toggle_mark(MarkKind::Italic).unwrap();

    assert_eq!(editor.doc(), &doc);
    assert_eq!(
        editor.selection(),
        &Selection::new(Point::new(vec![0, 0], 1), Point::new(vec![0, 0], 4))
    );
}

#[test]
fn backward_selection_keeps_its_direction() {
    let doc = Document::new(vec![Node::paragraph("abcde")]);
    let mut editor = editor_with(doc, (&[0, 0], 3), (&[0, 0], 1));

    editor.toggle_mark(MarkKind::Bold).unwrap();

    assert_eq!(
        runs(&editor, 0, MarkKind::Bold),
        vec![
            ("a".to_string(), false),
            ("bc".to_string(), true),
            ("de".to_string(), false),
        ]
    );
    let selection = editor.selection();
    assert!(selection.focus.is_before(&selection.anchor));
}

#[test]
fn mark_spanning_blocks_touches_only_selected_text() {
    let doc = Document::new(vec![Node::paragraph("one"), Node::paragraph("two")]);
    let mut editor = editor_with(doc, (&[0, 0], 2), (&[1, 0], 1));

    editor.toggle_mark(MarkKind::Underline).unwrap();

    assert_eq!(
        runs(&editor, 0, MarkKind::Underline),
        vec![("on".to_string(), false), ("e".to_string(), true)]
    );
    assert_eq!(
        runs(&editor, 1, MarkKind::Underline),
        vec![("t".to_string(), true), ("wo".to_string(), false)]
    );
}

#[test]
fn partially_marked_range_is_not_active_and_toggles_on() {
    let doc = Document::new(vec![Node::paragraph("abcdef")]);
    let mut editor = editor_with(doc, (&[0, 0], 0), (&[0, 0], 3));
    editor.toggle_mark(MarkKind::Bold).unwrap();

    editor
        .set_selection(Selection::new(
            Point::new(vec![0, 0], 1),
            Point::new(vec![0, 1], 2),
        ))
        .unwrap();
    assert!(!editor.is_mark_active(MarkKind::Bold));

    editor.toggle_mark(MarkKind::Bold).unwrap();
    assert_eq!(
        runs(&editor, 0, MarkKind::Bold),
        vec![("abcde".to_string(), true), ("f".to_string(), false)]
    );
}

#[test]
fn caret_toggle_holds_mark_for_next_text() {
    let mut editor = Editor::with_richtext_plugins();

    editor.toggle_mark(MarkKind::Bold).unwrap();
    assert!(editor.is_mark_active(MarkKind::Bold));
    assert!(!editor.can_undo());
    assert_eq!(editor.doc(), &Document::default());

    editor.insert_text("hi").unwrap();
    assert_eq!(runs(&editor, 0, MarkKind::Bold), vec![("hi".to_string(), true)]);
    assert!(editor.pending_marks().is_none());
    assert!(editor.is_mark_active(MarkKind::Bold));

    editor.insert_text("!").unwrap();
    assert_eq!(runs(&editor, 0, MarkKind::Bold), vec![("hi!".to_string(), true)]);
    assert_eq!(editor.selection().focus, Point::new(vec![0, 0], 3));
}

#[test]
fn held_mark_splits_existing_run() {
    let doc = Document::new(vec![Node::paragraph("abcd")]);
    let mut editor = editor_with(doc, (&[0, 0], 2), (&[0, 0], 2));

    editor.toggle_mark(MarkKind::Italic).unwrap();
    editor.insert_text("X").unwrap();

    assert_eq!(
        runs(&editor, 0, MarkKind::Italic),
        vec![
            ("ab".to_string(), false),
            ("X".to_string(), true),
            ("cd".to_string(), false),
        ]
    );
    assert_eq!(editor.selection().focus, Point::new(vec![0, 1], 1));
}

#[test]
fn caret_toggle_twice_clears_held_mark() {
    let mut editor = Editor::with_richtext_plugins();
    editor.toggle_mark(MarkKind::Bold).unwrap();
    editor.toggle_mark(MarkKind::Bold).unwrap();
    assert!(!editor.is_mark_active(MarkKind::Bold));

    editor.insert_text("x").unwrap();
    assert_eq!(runs(&editor, 0, MarkKind::Bold), vec![("x".to_string(), false)]);
}

#[test]
fn moving_the_caret_drops_held_marks() {
    let mut editor = Editor::with_richtext_plugins();
    editor.toggle_mark(MarkKind::Bold).unwrap();
    editor
        .set_selection(Selection::collapsed(Point::new(vec![0, 0], 0)))
        .unwrap();
    assert!(editor.pending_marks().is_none());
    assert!(!editor.is_mark_active(MarkKind::Bold));
}

#[test]
fn value_marks_are_set_and_read_back() {
    let doc = Document::new(vec![Node::paragraph("sized")]);
    let mut editor = editor_with(doc, (&[0, 0], 0), (&[0, 0], 5));

    editor
        .set_mark(MarkKind::FontSize, MarkValue::Size(18))
        .unwrap();
    editor
        .set_mark(MarkKind::FontFamily, MarkValue::Text("Georgia".into()))
        .unwrap();

    assert_eq!(editor.mark_value(MarkKind::FontSize), Some(MarkValue::Size(18)));
    assert_eq!(
        editor.mark_value(MarkKind::FontFamily),
        Some(MarkValue::Text("Georgia".into()))
    );
    assert!(editor.is_mark_active(MarkKind::FontSize));

    editor.unset_mark(MarkKind::FontSize).unwrap();
    assert_eq!(editor.mark_value(MarkKind::FontSize), None);
    assert_eq!(editor.history().undo_len(), 3);
}

#[test]
fn value_mark_toggle_without_value_is_rejected() {
    let doc = Document::new(vec![Node::paragraph("text")]);
    let mut editor = editor_with(doc.clone(), (&[0, 0], 0), (&[0, 0], 4));

    let err = editor.toggle_mark(MarkKind::Color).unwrap_err();
    assert!(matches!(err, EditorError::InvalidArgs { .. }));

    let err = editor
        .set_mark(MarkKind::Bold, MarkValue::Text("x".into()))
        .unwrap_err();
    assert!(matches!(err, EditorError::InvalidArgs { .. }));

    assert_eq!(editor.doc(), &doc);
    assert!(!editor.can_undo());
}

#[test]
fn active_color_toggles_off() {
    let doc = Document::new(vec![Node::paragraph("red")]);
    let mut editor = editor_with(doc.clone(), (&[0, 0], 0), (&[0, 0], 3));

    editor
        .set_mark(MarkKind::Color, MarkValue::Text("#ff0000".into()))
        .unwrap();
    editor.toggle_mark(MarkKind::Color).unwrap();
    assert_eq!(editor.doc(), &doc);
}
