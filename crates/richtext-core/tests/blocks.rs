use richtext_core::{
    Document, Editor, EditorError, ElementKind, MarkKind, Node, PluginRegistry, Point, Selection,
};

fn editor_with(doc: Document, anchor: (&[usize], usize), focus: (&[usize], usize)) -> Editor {
    let selection = Selection::new(
        Point::new(anchor.0.to_vec(), anchor.1),
        Point::new(focus.0.to_vec(), focus.1),
    );
    Editor::new(doc, selection, PluginRegistry::richtext()).unwrap()
}

fn kinds(doc: &Document) -> Vec<ElementKind> {
    doc.children.iter().filter_map(Node::kind).collect()
}

#[test]
fn bold_then_list_then_two_undos_returns_to_plain_paragraph() {
    let doc = Document::new(vec![Node::paragraph("hello")]);
    let mut editor = editor_with(doc, (&[0, 0], 2), (&[0, 0], 2));

    editor.toggle_mark(MarkKind::Bold).unwrap();
    editor.toggle_block(ElementKind::BulletedList).unwrap();
    assert_eq!(
        editor.doc().children,
        vec![Node::list(
            ElementKind::BulletedList,
            vec![Node::list_item("hello")]
        )]
    );
    assert_eq!(editor.selection().anchor, Point::new(vec![0, 0, 0], 2));

    editor.undo().unwrap();
    editor.undo().unwrap();

    assert_eq!(editor.doc().children, vec![Node::paragraph("hello")]);
    assert!(!editor.is_mark_active(MarkKind::Bold));
}

#[test]
fn bulleted_to_numbered_yields_one_container() {
    let doc = Document::new(vec![Node::list(
        ElementKind::BulletedList,
        vec![Node::list_item("a"), Node::list_item("b")],
    )]);
    let mut editor = editor_with(doc, (&[0, 0, 0], 0), (&[0, 1, 0], 1));

    editor.toggle_block(ElementKind::NumberedList).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![Node::list(
            ElementKind::NumberedList,
            vec![Node::list_item("a"), Node::list_item("b")]
        )]
    );
    assert!(editor.is_block_active(ElementKind::NumberedList));
    assert!(!editor.is_block_active(ElementKind::BulletedList));
    assert_eq!(editor.history().undo_len(), 1);
}

#[test]
fn toggling_active_list_off_splits_the_list_around_the_item() {
    let doc = Document::new(vec![Node::list(
        ElementKind::BulletedList,
        vec![
            Node::list_item("a"),
            Node::list_item("b"),
            Node::list_item("c"),
        ],
    )]);
    let mut editor = editor_with(doc, (&[0, 1, 0], 0), (&[0, 1, 0], 0));

    editor.toggle_block(ElementKind::BulletedList).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::list(ElementKind::BulletedList, vec![Node::list_item("a")]),
            Node::paragraph("b"),
            Node::list(ElementKind::BulletedList, vec![Node::list_item("c")]),
        ]
    );
    assert_eq!(editor.selection().anchor, Point::new(vec![1, 0], 0));
}

#[test]
fn list_wraps_every_selected_paragraph() {
    let doc = Document::new(vec![
        Node::paragraph("a"),
        Node::paragraph("b"),
        Node::paragraph("c"),
    ]);
    let mut editor = editor_with(doc, (&[0, 0], 0), (&[1, 0], 1));

    editor.toggle_block(ElementKind::BulletedList).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::list(
                ElementKind::BulletedList,
                vec![Node::list_item("a"), Node::list_item("b")]
            ),
            Node::paragraph("c"),
        ]
    );
    assert!(editor.doc().is_valid());
}

#[test]
fn mixed_selection_touching_the_list_kind_toggles_it_off() {
    let doc = Document::new(vec![
        Node::list(ElementKind::BulletedList, vec![Node::list_item("a")]),
        Node::paragraph("x"),
        Node::list(ElementKind::NumberedList, vec![Node::list_item("b")]),
    ]);
    let mut editor = editor_with(doc, (&[0, 0, 0], 0), (&[2, 0, 0], 1));
    assert!(editor.is_block_active(ElementKind::NumberedList));

    editor.toggle_block(ElementKind::NumberedList).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::paragraph("a"),
            Node::paragraph("x"),
            Node::paragraph("b"),
        ]
    );
    assert_eq!(
        editor.selection(),
        &Selection::new(Point::new(vec![0, 0], 0), Point::new(vec![2, 0], 1))
    );
}

#[test]
fn paragraph_toggle_on_paragraph_is_a_no_op() {
    let doc = Document::new(vec![Node::paragraph("p")]);
    let mut editor = editor_with(doc.clone(), (&[0, 0], 0), (&[0, 0], 0));

    let err = editor.toggle_block(ElementKind::Paragraph).unwrap_err();
    assert!(err.is_no_op());
    assert_eq!(editor.doc(), &doc);
    assert!(!editor.can_undo());
}

#[test]
fn list_item_toggle_on_list_item_reverts_it() {
    let doc = Document::new(vec![Node::list(
        ElementKind::NumberedList,
        vec![Node::list_item("only")],
    )]);
    let mut editor = editor_with(doc, (&[0, 0, 0], 0), (&[0, 0, 0], 4));

    editor.toggle_block(ElementKind::ListItem).unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("only")]);
    assert_eq!(kinds(editor.doc()), vec![ElementKind::Paragraph]);
}

#[test]
fn undo_of_list_toggle_restores_selection() {
    let doc = Document::new(vec![Node::paragraph("a"), Node::paragraph("b")]);
    let mut editor = editor_with(doc.clone(), (&[1, 0], 1), (&[1, 0], 1));

    editor.toggle_block(ElementKind::NumberedList).unwrap();
    assert_eq!(
        kinds(editor.doc()),
        vec![ElementKind::Paragraph, ElementKind::NumberedList]
    );

    assert!(editor.undo().unwrap());
    assert_eq!(editor.doc(), &doc);
    assert_eq!(editor.selection().anchor, Point::new(vec![1, 0], 1));

    assert!(editor.redo().unwrap());
    assert_eq!(editor.selection().anchor, Point::new(vec![1, 0, 0], 1));
}

#[test]
fn stale_path_errors_do_not_touch_the_tree() {
    let doc = Document::new(vec![Node::paragraph("p")]);
    let mut editor = editor_with(doc.clone(), (&[0, 0], 0), (&[0, 0], 0));
    let err = editor.set_checklist_checked(&[3], true).unwrap_err();
    assert!(matches!(err, EditorError::Path(_)));
    assert_eq!(editor.doc(), &doc);
}
