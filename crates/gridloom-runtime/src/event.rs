//! Typed notifications emitted by store commands.
//!
//! Every command that changes a session emits one or more [`GridEvent`]s to
//! the subscribers registered with [`GridStore::subscribe`]. Consumers that
//! only care about a family of events filter on [`GridEventKind::category`].
//!
//! [`GridStore::subscribe`]: crate::GridStore::subscribe

use std::sync::mpsc;

use gridloom_layout::NodeId;
use serde::Serialize;

pub const CATEGORY_GRID: &str = "grid";
pub const CATEGORY_DESIGN_MODE: &str = "grid.designMode";
pub const CATEGORY_NAVIGATE: &str = "grid.navigate";
pub const CATEGORY_ONE_SCREEN_MODE: &str = "grid.oneScreenMode";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridEvent {
    pub grid: String,
    pub kind: GridEventKind,
}

impl GridEvent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GridEventKind {
    GridAdded,
    DesignModeEntered,
    DesignModeExited,
    ModuleAdded { cell: NodeId },
    ModuleRemoved { cell: NodeId },
    DraggingStarted { cell: NodeId, content: NodeId },
    DraggingStopped { dropped: bool },
    HoveringStarted { placeholder: NodeId },
    HoveringStayed { placeholder: NodeId },
    HoveringStopped { placeholder: Option<NodeId> },
    /// `cell` is the module cell now holding `content`.
    Dropped { content: NodeId, cell: Option<NodeId> },
    ResizingStarted { resizer: NodeId },
    ResizingMoved { previous_size: f64, next_size: f64 },
    ResizingStopped { committed: bool },
    HistoryAdded { index: usize },
    HistoryBack { index: usize },
    HistoryForward { index: usize },
    FocusOn { id: String },
    FocusOff { id: String },
    OneScreenModeEntered,
    OneScreenModeExited,
}

impl GridEventKind {
    /// Dotted event name, e.g. `grid.designMode.drop`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GridAdded => "grid.add",
            Self::DesignModeEntered => "grid.designMode.enter",
            Self::DesignModeExited => "grid.designMode.exit",
            Self::ModuleAdded { .. } => "grid.designMode.module.add",
            Self::ModuleRemoved { .. } => "grid.designMode.module.remove",
            Self::DraggingStarted { .. } => "grid.designMode.dragging.start",
            Self::DraggingStopped { .. } => "grid.designMode.dragging.stop",
            Self::HoveringStarted { .. } => "grid.designMode.hovering.start",
            Self::HoveringStayed { .. } => "grid.designMode.hovering.stay",
            Self::HoveringStopped { .. } => "grid.designMode.hovering.stop",
            Self::Dropped { .. } => "grid.designMode.drop",
            Self::ResizingStarted { .. } => "grid.designMode.resizing.start",
            Self::ResizingMoved { .. } => "grid.designMode.resizing.move",
            Self::ResizingStopped { .. } => "grid.designMode.resizing.stop",
            Self::HistoryAdded { .. } => "grid.designMode.history.add",
            Self::HistoryBack { .. } => "grid.designMode.history.back",
            Self::HistoryForward { .. } => "grid.designMode.history.forward",
            Self::FocusOn { .. } => "grid.navigate.focus.on",
            Self::FocusOff { .. } => "grid.navigate.focus.off",
            Self::OneScreenModeEntered => "grid.oneScreenMode.enter",
            Self::OneScreenModeExited => "grid.oneScreenMode.exit",
        }
    }

    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::GridAdded => CATEGORY_GRID,
            Self::FocusOn { .. } | Self::FocusOff { .. } => CATEGORY_NAVIGATE,
            Self::OneScreenModeEntered | Self::OneScreenModeExited => CATEGORY_ONE_SCREEN_MODE,
            _ => CATEGORY_DESIGN_MODE,
        }
    }
}

/// Fan-out to channel subscribers; closed receivers are dropped on send.
#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Vec<mpsc::Sender<GridEvent>>,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self) -> mpsc::Receiver<GridEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub(crate) fn emit(&mut self, grid: &str, kind: GridEventKind) {
        tracing::trace!(grid, event = kind.name(), "emit");
        let event = GridEvent {
            grid: grid.to_string(),
            kind,
        };
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
