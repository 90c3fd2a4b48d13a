//! End-to-end decoration scenario on a one-module grid.

use gridloom_layout::{
    CellType, GridTree, NodeKind, add_cell, add_placeholders, add_row, remove_placeholders,
};

fn kinds(tree: &GridTree, parent: gridloom_layout::NodeId) -> Vec<NodeKind> {
    tree.children(parent)
        .expect("parent")
        .iter()
        .map(|&child| tree.kind(child).expect("child"))
        .collect()
}

#[test]
fn single_module_grid_gains_and_loses_drop_targets() {
    let mut tree = GridTree::new("foo", "5px");
    let root = tree.root();
    let row = add_row(&mut tree, root, None, false).expect("row");
    let module = add_cell(&mut tree, row, None, CellType::Module, None).expect("cell");
    let before = tree.clone();

    add_placeholders(&mut tree, root).expect("decorate");

    let rows = tree.children(root).expect("root").to_vec();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1], row);
    for placeholder_row in [rows[0], rows[2]] {
        assert_eq!(tree.kind(placeholder_row).unwrap(), NodeKind::PLACEHOLDER_ROW);
        assert_eq!(kinds(&tree, placeholder_row), vec![NodeKind::PLACEHOLDER_CELL]);
    }
    assert_eq!(
        kinds(&tree, row),
        vec![
            NodeKind::PLACEHOLDER_CELL,
            NodeKind::MODULE_CELL,
            NodeKind::PLACEHOLDER_CELL
        ]
    );
    assert_eq!(tree.children(row).unwrap()[1], module);
    assert!(tree.invariant_report().is_clean());

    let xml = tree.to_xml().expect("serialize");
    assert!(xml.contains(r#"hasPlaceholders="true""#));
    assert!(xml.contains(r#"<row type="placeholder">"#));

    remove_placeholders(&mut tree, root).expect("strip");
    assert_eq!(before, tree);
    assert_eq!(before.to_xml().unwrap(), tree.to_xml().unwrap());
}
