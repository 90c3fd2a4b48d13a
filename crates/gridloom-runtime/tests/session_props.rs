//! Random command streams against a single session.
//!
//! Whatever the order of commands (and whether they succeed), the tree must
//! carry exactly the decorations its step calls for, interaction leftovers
//! must be gone once the session is back at rest, and a resting tree must
//! pass the invariant report.

use gridloom_layout::{GridTree, NodeId};
use gridloom_runtime::{DesignConfig, DesignModeStep, DeterministicClock, GridStore};
use proptest::prelude::*;
use web_time::Duration;

const GRID: &str = "prop";

#[derive(Debug, Clone)]
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0xD1B5_4A32_D192_ED03,
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

    fn pick(&mut self, nodes: &[NodeId]) -> Option<NodeId> {
        (!nodes.is_empty()).then(|| nodes[self.choose_index(nodes.len())])
    }
}

fn nodes_where(store: &GridStore, keep: impl Fn(&GridTree, NodeId) -> bool) -> Vec<NodeId> {
    let tree = store.tree(GRID).expect("session");
    tree.descendants(tree.root())
        .expect("attached tree")
        .into_iter()
        .filter(|&id| keep(tree, id))
        .collect()
}

fn random_command(store: &mut GridStore, clock: &DeterministicClock, rng: &mut Lcg) {
    let modules = store.tree(GRID).expect("session").module_cells();
    let placeholders = nodes_where(store, |tree, id| {
        tree.kind(id).expect("node").is_placeholder_cell()
    });
    let resizers = nodes_where(store, |tree, id| tree.kind(id).expect("node").is_resizer());

    // Failures are part of the stream; only the resulting state is checked.
    let _ = match rng.choose_index(12) {
        0 => store.enter_design_mode(GRID),
        1 => store.exit_design_mode(GRID),
        2 => {
            let n = rng.choose_index(100).to_string();
            store.add_module(GRID, "Counter", [("n", n)]).map(|_| ())
        }
        3 => match rng.pick(&modules) {
            Some(cell) if modules.len() > 1 => store.remove_module(GRID, cell),
            _ => Ok(()),
        },
        4 => match rng.pick(&modules) {
            Some(cell) => store.start_dragging(GRID, cell).map(|_| ()),
            None => Ok(()),
        },
        5 => match rng.pick(&placeholders) {
            Some(placeholder) => store.start_hovering(GRID, placeholder),
            None => Ok(()),
        },
        6 => {
            clock.advance(Duration::from_millis(rng.choose_index(400) as u64));
            store.tick().map(|_| ())
        }
        7 => store.stop_hovering(GRID),
        8 => {
            let target = if rng.choose_index(2) == 0 {
                None
            } else {
                rng.pick(&placeholders)
            };
            store.drop(GRID, target).map(|_| ())
        }
        9 => store.cancel_dragging(GRID),
        10 => match rng.pick(&resizers) {
            Some(resizer) => store
                .start_resizing(GRID, resizer, 100.0 + rng.choose_index(300) as f64, 50.0)
                .and_then(|()| store.resize(GRID, rng.choose_index(200) as f64).map(|_| ()))
                .and_then(|()| store.stop_resizing(GRID).map(|_| ())),
            None => Ok(()),
        },
        _ => {
            if rng.choose_index(2) == 0 {
                store.go_back_in_history(GRID).map(|_| ())
            } else {
                store.go_forward_in_history(GRID).map(|_| ())
            }
        }
    };
}

fn check_session(store: &GridStore, seed: u64, step_no: usize) {
    let session = store.session(GRID).expect("session");
    let tree = session.tree();
    let step = session.step();
    let context = format!("step {step_no}, seed={seed}, design step {step}");
    assert_eq!(tree.has_placeholders(), step.needs_placeholders(), "{context}");
    assert_eq!(tree.has_resizers(), step.needs_resizers(), "{context}");
    assert_eq!(session.hover_pending(), step == DesignModeStep::Prehovering, "{context}");
    if matches!(step, DesignModeStep::Disabled | DesignModeStep::Enabled) {
        assert!(!session.has_backups(), "{context}");
        assert!(session.refs().is_empty(), "{context}");
        let report = tree.invariant_report();
        assert!(
            report.is_clean(),
            "{context}: {:?}\n{}",
            report.issues,
            tree.to_xml().unwrap_or_default()
        );
    }
}

fn run_session(seed: u64, steps: usize) -> (GridStore, DeterministicClock) {
    let clock = DeterministicClock::new();
    let mut store = GridStore::with_clock(DesignConfig::default(), clock.clone());
    store.add_grid(GridTree::new(GRID, "4px")).expect("add grid");
    for n in 0..3 {
        store
            .add_module(GRID, "Seed", [("n", n.to_string())])
            .expect("seed module");
    }
    let mut rng = Lcg::new(seed);
    for step_no in 0..steps {
        random_command(&mut store, &clock, &mut rng);
        check_session(&store, seed, step_no);
    }
    (store, clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn random_command_streams_keep_sessions_consistent(seed in any::<u64>(), steps in 1usize..60) {
        run_session(seed, steps);
    }

    #[test]
    fn cancelling_a_drag_restores_the_tree(seed in any::<u64>(), steps in 1usize..30) {
        let (mut store, _clock) = run_session(seed, steps);
        let _ = store.exit_design_mode(GRID);
        store.enter_design_mode(GRID).expect("enter");
        let before = store.tree(GRID).expect("session").clone();
        let modules = before.module_cells();
        prop_assume!(!modules.is_empty());
        store.start_dragging(GRID, modules[0]).expect("drag");
        store.cancel_dragging(GRID).expect("cancel");
        prop_assert_eq!(store.tree(GRID).expect("session"), &before);
    }

    #[test]
    fn leaving_design_mode_always_rests(seed in any::<u64>(), steps in 1usize..40) {
        let (mut store, _clock) = run_session(seed, steps);
        store.exit_design_mode(GRID).expect("exit");
        let session = store.session(GRID).expect("session");
        prop_assert_eq!(session.step(), DesignModeStep::Disabled);
        prop_assert!(!session.has_backups());
        prop_assert!(!session.hover_pending());
        prop_assert_eq!(store.next_timer_deadline(), None);
    }
}
