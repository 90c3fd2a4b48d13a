//! State held for one named grid.

use std::collections::BTreeMap;

use gridloom_layout::{GridTree, NodeId};
use serde::Serialize;

use crate::design_mode::DesignModeStep;
use crate::history::GridHistory;
use crate::resize::ResizeState;
use crate::timer::TimerId;

/// Named snapshot slots used while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupSlot {
    /// Tree as it was before the drag started.
    Dragging,
    /// Tree before the tentative drop into the hovered placeholder.
    Hovering,
}

/// Handles into the live tree that only mean something during an
/// interaction. Trees are cloned with their handles, so these stay valid
/// across backups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EphemeralRefs {
    /// Content leaf being dragged (detached from the tree).
    pub dragging: Option<NodeId>,
    /// Placeholder cell under the pointer.
    pub hovering: Option<NodeId>,
    pub resizing: Option<NodeId>,
}

impl EphemeralRefs {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dragging.is_none() && self.hovering.is_none() && self.resizing.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct GridSession {
    pub(crate) name: String,
    pub(crate) tree: GridTree,
    pub(crate) backups: BTreeMap<BackupSlot, GridTree>,
    pub(crate) history: GridHistory,
    pub(crate) step: DesignModeStep,
    pub(crate) refs: EphemeralRefs,
    pub(crate) resizing: Option<ResizeState>,
    pub(crate) focused_cell_id: Option<String>,
    pub(crate) one_screen_mode: bool,
    pub(crate) hover_timer: Option<TimerId>,
}

impl GridSession {
    pub(crate) fn new(name: String, tree: GridTree, history_max_depth: usize) -> Self {
        let history = GridHistory::new(tree.clone(), history_max_depth);
        Self {
            name,
            tree,
            backups: BTreeMap::new(),
            history,
            step: DesignModeStep::Disabled,
            refs: EphemeralRefs::default(),
            resizing: None,
            focused_cell_id: None,
            one_screen_mode: false,
            hover_timer: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn tree(&self) -> &GridTree {
        &self.tree
    }

    #[must_use]
    pub fn step(&self) -> DesignModeStep {
        self.step
    }

    #[must_use]
    pub fn history(&self) -> &GridHistory {
        &self.history
    }

    #[must_use]
    pub fn backup(&self, slot: BackupSlot) -> Option<&GridTree> {
        self.backups.get(&slot)
    }

    #[must_use]
    pub fn has_backups(&self) -> bool {
        !self.backups.is_empty()
    }

    #[must_use]
    pub fn refs(&self) -> EphemeralRefs {
        self.refs
    }

    #[must_use]
    pub fn resize_state(&self) -> Option<&ResizeState> {
        self.resizing.as_ref()
    }

    #[must_use]
    pub fn focused_cell_id(&self) -> Option<&str> {
        self.focused_cell_id.as_deref()
    }

    /// Module cell carrying the focused id, if it is still in the tree.
    #[must_use]
    pub fn focused_cell(&self) -> Option<NodeId> {
        self.focused_cell_id
            .as_deref()
            .and_then(|id| self.tree.find_by_id_attr(id))
    }

    #[must_use]
    pub fn one_screen_mode(&self) -> bool {
        self.one_screen_mode
    }

    #[must_use]
    pub fn hover_pending(&self) -> bool {
        self.hover_timer.is_some()
    }

    /// Diagnostics snapshot of the session state.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            name: self.name.clone(),
            step: self.step,
            history_index: self.history.index(),
            history_len: self.history.len(),
            module_count: self.tree.module_cells().len(),
            focused_cell_id: self.focused_cell_id.clone(),
            one_screen_mode: self.one_screen_mode,
            hover_pending: self.hover_pending(),
            backups: self.backups.keys().copied().collect(),
            refs: self.refs,
        }
    }

    /// Drop every interaction leftover: backups, refs, resize floats.
    pub(crate) fn clear_interaction(&mut self) {
        self.backups.clear();
        self.refs = EphemeralRefs::default();
        self.resizing = None;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub name: String,
    pub step: DesignModeStep,
    pub history_index: usize,
    pub history_len: usize,
    pub module_count: usize,
    pub focused_cell_id: Option<String>,
    pub one_screen_mode: bool,
    pub hover_pending: bool,
    pub backups: Vec<BackupSlot>,
    pub refs: EphemeralRefs,
}
