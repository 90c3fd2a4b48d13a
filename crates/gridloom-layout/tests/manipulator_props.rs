//! Property-style checks for the structural edit operations.
//!
//! Random edit streams are applied to a fresh grid through the public API;
//! after every step the tree must be clean, and cleaning, decorating and id
//! assignment must behave as pure round trips on the result.

use gridloom_layout::{
    CellType, GridTree, NodeId, add_cell, add_placeholders, add_resizers, add_row, clean_grid,
    remove_cell, remove_placeholders, remove_resizers, set_ids,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state >> 11
    }

    fn choose_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }

    fn choose_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 0
    }
}

fn nodes_where(tree: &GridTree, keep: impl Fn(&GridTree, NodeId) -> bool) -> Vec<NodeId> {
    tree.descendants(tree.root())
        .expect("attached tree")
        .into_iter()
        .filter(|&id| keep(tree, id))
        .collect()
}

fn row_hosts(tree: &GridTree) -> Vec<NodeId> {
    nodes_where(tree, |tree, id| {
        let kind = tree.kind(id).expect("node");
        kind.is_grid_kind() || kind.is_module_cell()
    })
}

fn rows(tree: &GridTree) -> Vec<NodeId> {
    nodes_where(tree, |tree, id| tree.kind(id).expect("node").is_row())
}

fn random_step(tree: &mut GridTree, rng: &mut Lcg) {
    let modules = tree.module_cells();
    let all_rows = rows(tree);
    match rng.choose_index(5) {
        0 | 1 if !all_rows.is_empty() => {
            let row = all_rows[rng.choose_index(all_rows.len())];
            let cells = tree.content_children(row).expect("row");
            let before = if cells.is_empty() || rng.choose_bool() {
                None
            } else {
                Some(cells[rng.choose_index(cells.len())])
            };
            let cell = add_cell(tree, row, before, CellType::Module, None).expect("add cell");
            if rng.choose_bool() {
                let size = 1.0 + rng.choose_index(4) as f64;
                tree.set_relative_size(cell, size).expect("size");
            }
        }
        2 if modules.len() > 1 => {
            let cell = modules[rng.choose_index(modules.len())];
            remove_cell(tree, cell).expect("remove cell");
        }
        3 if !all_rows.is_empty() => {
            // An empty grid cell must be cleaned away again.
            let row = all_rows[rng.choose_index(all_rows.len())];
            add_cell(tree, row, None, CellType::Grid, None).expect("add grid cell");
        }
        _ => {
            let hosts = row_hosts(tree);
            let host = hosts[rng.choose_index(hosts.len())];
            let row = add_row(tree, host, None, false).expect("add row");
            add_cell(tree, row, None, CellType::Module, None).expect("seed cell");
        }
    }
    let root = tree.root();
    clean_grid(tree, root).expect("clean");
}

fn run_sequence(seed: u64, steps: usize) -> GridTree {
    let mut tree = GridTree::new("prop", "4px");
    let mut rng = Lcg::new(seed);
    for step in 0..steps {
        random_step(&mut tree, &mut rng);
        let report = tree.invariant_report();
        assert!(
            report.is_clean(),
            "step {step}, seed={seed}: {:?}\n{}",
            report.issues,
            tree.to_xml().unwrap_or_default()
        );
    }
    tree
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn random_edit_streams_stay_clean(seed in any::<u64>(), steps in 1usize..40) {
        run_sequence(seed, steps);
    }

    #[test]
    fn clean_is_idempotent(seed in any::<u64>(), steps in 1usize..40) {
        let mut tree = run_sequence(seed, steps);
        let once = tree.clone();
        let root = tree.root();
        clean_grid(&mut tree, root).expect("clean");
        prop_assert_eq!(once, tree);
    }

    #[test]
    fn placeholders_round_trip(seed in any::<u64>(), steps in 1usize..30) {
        let original = run_sequence(seed, steps);
        let mut tree = original.clone();
        let root = tree.root();
        add_placeholders(&mut tree, root).expect("add placeholders");
        prop_assert!(tree.has_placeholders());
        remove_placeholders(&mut tree, root).expect("remove placeholders");
        prop_assert!(!tree.has_placeholders());
        prop_assert_eq!(original, tree);
    }

    #[test]
    fn resizers_round_trip(seed in any::<u64>(), steps in 1usize..30) {
        let original = run_sequence(seed, steps);
        let mut tree = original.clone();
        let root = tree.root();
        add_resizers(&mut tree, root).expect("add resizers");
        remove_resizers(&mut tree, root).expect("remove resizers");
        prop_assert_eq!(original, tree);
    }

    #[test]
    fn set_ids_is_stable_and_dense(seed in any::<u64>(), steps in 1usize..30) {
        let mut tree = run_sequence(seed, steps);
        set_ids(&mut tree).expect("ids");
        let once = tree.clone();
        set_ids(&mut tree).expect("ids again");
        prop_assert_eq!(&once, &tree);
        prop_assert!(tree.invariant_report().is_clean());
        let indexes: Vec<_> = tree
            .module_cells()
            .into_iter()
            .map(|cell| tree.module_index(cell).expect("cell"))
            .collect();
        let expected: Vec<_> = (0..indexes.len()).map(Some).collect();
        prop_assert_eq!(indexes, expected);
    }

    #[test]
    fn text_form_round_trips(seed in any::<u64>(), steps in 1usize..30) {
        let mut tree = run_sequence(seed, steps);
        set_ids(&mut tree).expect("ids");
        let xml = tree.to_xml().expect("serialize");
        let parsed = GridTree::from_xml(&xml).expect("parse");
        prop_assert_eq!(tree, parsed);
    }
}
