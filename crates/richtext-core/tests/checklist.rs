use richtext_core::{
    Document, Editor, EditorError, ElementKind, ElementNode, Node, PluginRegistry, Point,
    Selection,
};

fn editor_with(doc: Document, anchor: (&[usize], usize)) -> Editor {
    let selection = Selection::collapsed(Point::new(anchor.0.to_vec(), anchor.1));
    Editor::new(doc, selection, PluginRegistry::richtext()).unwrap()
}

#[test]
fn checklist_round_trip_keeps_text() {
    let mut editor = editor_with(Document::new(vec![Node::paragraph("buy milk")]), (&[0, 0], 3));

    editor.toggle_checklist().unwrap();
    assert_eq!(
        editor.doc().children,
        vec![Node::checklist_item("buy milk", false)]
    );
    assert_eq!(editor.active_checklist_checked(), Some(false));

    editor.set_checklist_checked(&[0], true).unwrap();
    assert_eq!(
        editor.doc().children,
        vec![Node::checklist_item("buy milk", true)]
    );
    assert!(editor.checklist_checked(&[0]).unwrap());

    editor.toggle_checklist_checked(&[0]).unwrap();
    assert!(!editor.checklist_checked(&[0]).unwrap());

    editor.toggle_checklist().unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("buy milk")]);
    assert_eq!(editor.history().undo_len(), 4);
}

#[test]
fn checked_state_is_undoable() {
    let doc = Document::new(vec![Node::checklist_item("task", false)]);
    let mut editor = editor_with(doc.clone(), (&[0, 0], 0));

    editor.set_checklist_checked(&[0], true).unwrap();
    assert!(editor.undo().unwrap());
    assert_eq!(editor.doc(), &doc);
    assert!(editor.redo().unwrap());
    assert!(editor.checklist_checked(&[0]).unwrap());
}

#[test]
fn set_checked_errors_leave_tree_alone() {
    let doc = Document::new(vec![
        Node::paragraph("plain"),
        Node::checklist_item("task", false),
    ]);
    let mut editor = editor_with(doc.clone(), (&[0, 0], 0));

    let err = editor.set_checklist_checked(&[0], true).unwrap_err();
    assert!(matches!(err, EditorError::Structural(_)));

    let err = editor.set_checklist_checked(&[5], true).unwrap_err();
    assert!(matches!(err, EditorError::Path(_)));

    let err = editor.set_checklist_checked(&[1], false).unwrap_err();
    assert!(err.is_no_op());

    assert_eq!(editor.doc(), &doc);
    assert!(!editor.can_undo());
}

#[test]
fn checklist_from_list_item_leaves_rest_of_list() {
    let doc = Document::new(vec![Node::list(
        ElementKind::BulletedList,
        vec![Node::list_item("a"), Node::list_item("b")],
    )]);
    let mut editor = editor_with(doc, (&[0, 1, 0], 1));

    editor.toggle_checklist().unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::list(ElementKind::BulletedList, vec![Node::list_item("a")]),
            Node::checklist_item("b", false),
        ]
    );
    assert_eq!(editor.selection().anchor, Point::new(vec![1, 0], 1));
}

#[test]
fn normalization_fills_and_strips_checked_state() {
    let mut item = ElementNode::new(ElementKind::ChecklistItem, vec![Node::text("todo")]);
    item.checked = None;
    let mut para = ElementNode::new(ElementKind::Paragraph, vec![Node::text("p")]);
    para.checked = Some(true);

    let editor = editor_with(
        Document::new(vec![Node::Element(item), Node::Element(para)]),
        (&[0, 0], 0),
    );

    assert_eq!(
        editor.doc().children,
        vec![Node::checklist_item("todo", false), Node::paragraph("p")]
    );
    assert!(!editor.can_undo());
}

#[test]
fn enter_and_exit_from_a_checklist() {
    let doc = Document::new(vec![Node::checklist_item("first", true)]);
    let mut editor = editor_with(doc, (&[0, 0], 5));

    editor.continue_checklist().unwrap();
    assert_eq!(
        editor.doc().children,
        vec![
            Node::checklist_item("first", true),
            Node::checklist_item("", false),
        ]
    );
    assert_eq!(editor.selection().anchor, Point::new(vec![1, 0], 0));

    editor.exit_checklist().unwrap();
    assert_eq!(
        editor.doc().children,
        vec![Node::checklist_item("first", true), Node::paragraph("")]
    );

    let err = editor.exit_checklist().unwrap_err();
    assert!(err.is_no_op());
}

#[test]
fn is_checked_query_reads_caret_or_path() {
    let doc = Document::new(vec![
        Node::checklist_item("a", true),
        Node::paragraph("b"),
    ]);
    let editor = editor_with(doc, (&[1, 0], 0));

    let at_caret: Option<bool> = editor.run_query("checklist.is_checked", None).unwrap();
    assert_eq!(at_caret, None);

    let at_path: Option<bool> = editor
        .run_query(
            "checklist.is_checked",
            Some(serde_json::json!({ "path": [0] })),
        )
        .unwrap();
    assert_eq!(at_path, Some(true));
}
