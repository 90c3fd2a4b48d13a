//! Dragging a resizer between two siblings.
//!
//! The pointer delta is scaled by the ratio between the siblings' combined
//! relative size and the pixel extent of their container, so sizes stay in
//! relative units whatever the rendered width.

use gridloom_layout::{GridTree, LayoutError, NodeId};
use serde::Serialize;

use crate::design_mode::DesignModeStep;
use crate::error::{Result, StoreError};
use crate::event::GridEventKind;
use crate::store::{GridStore, audit, commit_history, lookup, transition};

/// Working values captured when a resize starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResizeState {
    pub resizer: NodeId,
    pub previous: NodeId,
    pub next: NodeId,
    pub initial_pos: f64,
    pub previous_size: f64,
    pub next_size: f64,
    /// Relative units per pixel.
    pub size_ratio: f64,
    /// Last sizes written, if any move was applied.
    pub current: Option<(f64, f64)>,
}

impl ResizeState {
    pub(crate) fn capture(
        tree: &GridTree,
        resizer: NodeId,
        full_size: f64,
        initial_pos: f64,
    ) -> gridloom_layout::Result<Self> {
        if !tree.kind(resizer)?.is_resizer() {
            return Err(LayoutError::invalid_type(format!("{resizer} is not a resizer")));
        }
        if !full_size.is_finite() || full_size <= 0.0 || !initial_pos.is_finite() {
            return Err(LayoutError::invalid_type(format!(
                "cannot resize over a full size of {full_size} from {initial_pos}"
            )));
        }
        let sibling = |found: Option<NodeId>, side: &str| -> gridloom_layout::Result<NodeId> {
            match found {
                Some(node) if !tree.kind(node)?.is_resizer() => Ok(node),
                _ => Err(LayoutError::inconsistency(format!(
                    "resizer {resizer} has no {side} row or cell"
                ))),
            }
        };
        let previous = sibling(tree.previous_sibling(resizer)?, "previous")?;
        let next = sibling(tree.next_sibling(resizer)?, "next")?;
        let previous_size = tree.relative_size(previous)?;
        let next_size = tree.relative_size(next)?;
        Ok(Self {
            resizer,
            previous,
            next,
            initial_pos,
            previous_size,
            next_size,
            size_ratio: (previous_size + next_size) / full_size,
            current: None,
        })
    }

    /// Sizes for the pointer at `pos`, or `None` when either side would
    /// shrink to zero or below.
    #[must_use]
    pub fn candidate(&self, pos: f64) -> Option<(f64, f64)> {
        let delta = (pos - self.initial_pos) * self.size_ratio;
        let previous = self.previous_size + delta;
        let next = self.next_size - delta;
        (previous > 0.0 && next > 0.0 && previous.is_finite() && next.is_finite())
            .then_some((previous, next))
    }

    /// Whether the applied sizes differ from the captured ones.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.current.is_some_and(|(previous, next)| {
            previous != self.previous_size || next != self.next_size
        })
    }
}

impl GridStore {
    /// Grab `resizer`. `full_size` is the pixel extent of the container
    /// along the resize axis, `initial_pos` the pointer coordinate.
    pub fn start_resizing(
        &mut self,
        name: &str,
        resizer: NodeId,
        full_size: f64,
        initial_pos: f64,
    ) -> Result<()> {
        let prefix = self.config.id_prefix.as_str();
        let session = lookup(&mut self.sessions, name)?;
        if !session.step.can_transition_to(DesignModeStep::Resizing) {
            return Err(StoreError::invalid_step(session.step, DesignModeStep::Resizing));
        }
        let state = ResizeState::capture(&session.tree, resizer, full_size, initial_pos)?;
        transition(session, DesignModeStep::Resizing, prefix)?;
        tracing::debug!(
            grid = name,
            resizer = %resizer,
            ratio = state.size_ratio,
            "resizing started"
        );
        session.refs.resizing = Some(resizer);
        session.resizing = Some(state);
        self.events
            .emit(name, GridEventKind::ResizingStarted { resizer });
        Ok(())
    }

    /// Follow the pointer to `pos`. Returns the sizes written, or `None`
    /// when the move would collapse a side and was ignored.
    pub fn resize(&mut self, name: &str, pos: f64) -> Result<Option<(f64, f64)>> {
        let session = lookup(&mut self.sessions, name)?;
        if session.step != DesignModeStep::Resizing {
            return Err(StoreError::invalid_step(session.step, DesignModeStep::Resizing));
        }
        let Some(state) = session.resizing.as_mut() else {
            return Err(LayoutError::inconsistency("no resizer is held").into());
        };
        let Some((previous_size, next_size)) = state.candidate(pos) else {
            tracing::trace!(grid = name, pos, "resize out of bounds ignored");
            return Ok(None);
        };
        session.tree.set_relative_size(state.previous, previous_size)?;
        session.tree.set_relative_size(state.next, next_size)?;
        state.current = Some((previous_size, next_size));
        self.events.emit(
            name,
            GridEventKind::ResizingMoved {
                previous_size,
                next_size,
            },
        );
        Ok(Some((previous_size, next_size)))
    }

    /// Release the resizer. Returns whether new sizes were committed to
    /// history.
    pub fn stop_resizing(&mut self, name: &str) -> Result<bool> {
        let prefix = self.config.id_prefix.as_str();
        let session = lookup(&mut self.sessions, name)?;
        if session.step != DesignModeStep::Resizing {
            return Err(StoreError::invalid_step(session.step, DesignModeStep::Enabled));
        }
        let state = session.resizing.take();
        session.refs.resizing = None;
        transition(session, DesignModeStep::Enabled, prefix)?;
        let committed = state.as_ref().is_some_and(ResizeState::changed);
        let index = committed.then(|| commit_history(session));
        audit(session);
        tracing::debug!(grid = name, committed, "resizing stopped");
        self.events
            .emit(name, GridEventKind::ResizingStopped { committed });
        if let Some(index) = index {
            self.events.emit(name, GridEventKind::HistoryAdded { index });
        }
        Ok(committed)
    }
}
