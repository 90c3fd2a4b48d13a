//! Drag, hover and drop.
//!
//! ```text
//! start_dragging   enabled -> dragging       backup[dragging] = tree, content detached
//! start_hovering   dragging -> prehovering   hover timer armed
//! (timer fires)    prehovering -> hovering   backup[hovering] = tree, tentative drop
//! stop_hovering    *hovering -> dragging     backup[hovering] restored
//! drop             *dragging -> enabled      committed to history
//! cancel_dragging  *dragging -> enabled      backup[dragging] restored
//! ```
//!
//! Node handles survive tree clones, so the dragged content and hovered
//! placeholder stay addressable across backup swaps.

use gridloom_layout::{
    LayoutError, NodeId, move_content_to_placeholder, remove_content_node,
};
use serde::Serialize;

use crate::design_mode::DesignModeStep;
use crate::error::{Result, StoreError};
use crate::event::GridEventKind;
use crate::session::{BackupSlot, GridSession};
use crate::store::{GridStore, audit, commit_history, force_step, lookup, transition};
use crate::timer::TimerTask;

/// Result of [`GridStore::drop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DropOutcome {
    /// `content` now lives in module cell `cell`.
    Dropped { content: NodeId, cell: Option<NodeId> },
    /// No placeholder was targeted; the tree went back to its pre-drag state.
    Cancelled,
}

impl GridStore {
    /// Pick up the content of module cell `cell`.
    ///
    /// The live tree is backed up, the content detached and the layout
    /// cleaned, then placeholders are added. If any of that fails the backup
    /// is restored and the session returns to `enabled`. Returns the handle
    /// of the dragged content.
    pub fn start_dragging(&mut self, name: &str, cell: NodeId) -> Result<NodeId> {
        let prefix = self.config.id_prefix.as_str();
        let session = lookup(&mut self.sessions, name)?;
        if !session.step.can_transition_to(DesignModeStep::Dragging) {
            return Err(StoreError::invalid_step(session.step, DesignModeStep::Dragging));
        }
        if !session.tree.kind(cell)?.is_module_cell() {
            return Err(LayoutError::invalid_type(format!("{cell} is not a module cell")).into());
        }

        let live = session.tree.clone();
        let backup = std::mem::replace(&mut session.tree, live);
        session.backups.insert(BackupSlot::Dragging, backup);

        match pick_up(session, cell, prefix) {
            Ok(content) => {
                tracing::debug!(grid = name, cell = %cell, content = %content, "dragging started");
                self.events
                    .emit(name, GridEventKind::DraggingStarted { cell, content });
                Ok(content)
            }
            Err(err) => {
                tracing::warn!(grid = name, cell = %cell, error = %err, "drag start rolled back");
                if let Some(backup) = session.backups.remove(&BackupSlot::Dragging) {
                    session.tree = backup;
                }
                session.clear_interaction();
                force_step(session, DesignModeStep::Enabled);
                Err(err)
            }
        }
    }

    /// Abandon the drag and put the tree back as it was before it started.
    pub fn cancel_dragging(&mut self, name: &str) -> Result<()> {
        let session = lookup(&mut self.sessions, name)?;
        if !session.step.is_dragging() {
            return Err(StoreError::invalid_step(session.step, DesignModeStep::Enabled));
        }
        if let Some(timer) = session.hover_timer.take() {
            self.timers.cancel(timer);
        }
        if let Some(backup) = session.backups.remove(&BackupSlot::Dragging) {
            session.tree = backup;
        }
        session.clear_interaction();
        force_step(session, DesignModeStep::Enabled);
        tracing::debug!(grid = name, "dragging cancelled");
        self.events
            .emit(name, GridEventKind::DraggingStopped { dropped: false });
        Ok(())
    }

    /// Pointer entered `placeholder`. Arms the hover debounce; the tentative
    /// drop happens when [`GridStore::tick`] fires it.
    ///
    /// Hovering the placeholder already hovered does nothing. Hovering a
    /// different one first stops the current hover.
    pub fn start_hovering(&mut self, name: &str, placeholder: NodeId) -> Result<()> {
        let session = lookup(&mut self.sessions, name)?;
        if !session.step.is_dragging() {
            return Err(StoreError::invalid_step(session.step, DesignModeStep::Prehovering));
        }
        let hovering = session.refs.hovering;
        match hovering {
            Some(current) if current == placeholder => return Ok(()),
            Some(_) => self.stop_hovering(name)?,
            None => {}
        }

        let prefix = self.config.id_prefix.as_str();
        let deadline = self.clock.now() + self.config.hover_delay();
        let session = lookup(&mut self.sessions, name)?;
        if !session.tree.kind(placeholder)?.is_placeholder_cell() {
            return Err(LayoutError::invalid_type(format!(
                "{placeholder} is not a placeholder cell"
            ))
            .into());
        }
        transition(session, DesignModeStep::Prehovering, prefix)?;
        session.refs.hovering = Some(placeholder);
        if let Some(stale) = session.hover_timer.take() {
            self.timers.cancel(stale);
        }
        let timer = self.timers.schedule(
            deadline,
            TimerTask::StayHovering {
                grid: name.to_string(),
            },
        );
        session.hover_timer = Some(timer);
        tracing::trace!(grid = name, placeholder = %placeholder, %timer, "hovering started");
        self.events
            .emit(name, GridEventKind::HoveringStarted { placeholder });
        Ok(())
    }

    /// Hover debounce expired: drop tentatively into the hovered placeholder.
    ///
    /// Does nothing when the session is gone or no longer pre-hovering. A
    /// failed tentative drop falls back to plain dragging.
    pub(crate) fn stay_hovering(&mut self, name: &str) -> Result<()> {
        let prefix = self.config.id_prefix.as_str();
        let Some(session) = self.sessions.get_mut(name) else {
            tracing::debug!(grid = name, "hover timer fired for a removed grid");
            return Ok(());
        };
        session.hover_timer = None;
        if session.step != DesignModeStep::Prehovering {
            return Ok(());
        }
        let (Some(content), Some(placeholder)) = (session.refs.dragging, session.refs.hovering)
        else {
            return Ok(());
        };

        let live = session.tree.clone();
        let backup = std::mem::replace(&mut session.tree, live);
        session.backups.insert(BackupSlot::Hovering, backup);

        let moved = move_content_to_placeholder(&mut session.tree, content, placeholder)
            .map_err(StoreError::from)
            .and_then(|()| transition(session, DesignModeStep::Hovering, prefix));
        if let Err(err) = moved {
            if let Some(backup) = session.backups.remove(&BackupSlot::Hovering) {
                session.tree = backup;
            }
            session.refs.hovering = None;
            force_step(session, DesignModeStep::Dragging);
            return Err(err);
        }
        tracing::debug!(grid = name, placeholder = %placeholder, "hovering stayed");
        self.events
            .emit(name, GridEventKind::HoveringStayed { placeholder });
        Ok(())
    }

    /// Pointer left the hovered placeholder: undo the tentative drop and
    /// go back to plain dragging. A drag without a hover is left alone.
    pub fn stop_hovering(&mut self, name: &str) -> Result<()> {
        let session = lookup(&mut self.sessions, name)?;
        match session.step {
            DesignModeStep::Prehovering | DesignModeStep::Hovering => {}
            DesignModeStep::Dragging => return Ok(()),
            other => return Err(StoreError::invalid_step(other, DesignModeStep::Dragging)),
        }
        if let Some(timer) = session.hover_timer.take() {
            self.timers.cancel(timer);
        }
        if let Some(backup) = session.backups.remove(&BackupSlot::Hovering) {
            session.tree = backup;
        }
        force_step(session, DesignModeStep::Dragging);
        let placeholder = session.refs.hovering.take();
        tracing::trace!(grid = name, "hovering stopped");
        self.events
            .emit(name, GridEventKind::HoveringStopped { placeholder });
        Ok(())
    }

    /// Release the dragged content.
    ///
    /// With a `placeholder`, the content lands there (hovering it first if
    /// needed, without waiting for the debounce) and the result is committed
    /// to history. Without one, or when nothing is hovered, the drag is
    /// cancelled.
    pub fn drop(&mut self, name: &str, placeholder: Option<NodeId>) -> Result<DropOutcome> {
        let session = lookup(&mut self.sessions, name)?;
        if !session.step.is_dragging() {
            return Err(StoreError::invalid_step(session.step, DesignModeStep::Enabled));
        }
        if let Some(target) = placeholder
            && session.refs.hovering != Some(target)
        {
            self.start_hovering(name, target)?;
        }

        let session = lookup(&mut self.sessions, name)?;
        if let Some(timer) = session.hover_timer.take() {
            self.timers.cancel(timer);
        }
        if session.step == DesignModeStep::Dragging {
            self.cancel_dragging(name)?;
            return Ok(DropOutcome::Cancelled);
        }

        let prefix = self.config.id_prefix.as_str();
        let session = lookup(&mut self.sessions, name)?;
        let content = land(session, prefix)?;
        let index = commit_history(session);
        session.clear_interaction();
        let cell = session.tree.parent(content).ok().flatten();
        audit(session);
        tracing::debug!(grid = name, content = %content, cell = ?cell, index, "dropped");
        self.events.emit(name, GridEventKind::Dropped { content, cell });
        self.events
            .emit(name, GridEventKind::DraggingStopped { dropped: true });
        self.events.emit(name, GridEventKind::HistoryAdded { index });
        Ok(DropOutcome::Dropped { content, cell })
    }
}

fn pick_up(session: &mut GridSession, cell: NodeId, id_prefix: &str) -> Result<NodeId> {
    let content = session
        .tree
        .content_of(cell)?
        .ok_or_else(|| LayoutError::inconsistency(format!("module cell {cell} holds no content")))?;
    remove_content_node(&mut session.tree, content)?;
    session.refs.dragging = Some(content);
    transition(session, DesignModeStep::Dragging, id_prefix)?;
    Ok(content)
}

/// Put the dragged content in its final place and leave the drag steps.
fn land(session: &mut GridSession, id_prefix: &str) -> Result<NodeId> {
    let content = session
        .refs
        .dragging
        .ok_or_else(|| LayoutError::inconsistency("no content is being dragged"))?;
    if session.step == DesignModeStep::Prehovering {
        let target = session
            .refs
            .hovering
            .ok_or_else(|| LayoutError::inconsistency("no placeholder is hovered"))?;
        move_content_to_placeholder(&mut session.tree, content, target)?;
    }
    transition(session, DesignModeStep::Enabled, id_prefix)?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use gridloom_layout::{ATTR_COMPONENT, GridTree};
    use web_time::Duration;

    use super::*;
    use crate::config::DesignConfig;
    use crate::timer::DeterministicClock;

    fn two_module_store() -> (GridStore, DeterministicClock, NodeId, NodeId) {
        let clock = DeterministicClock::new();
        let mut store = GridStore::with_clock(DesignConfig::default(), clock.clone());
        store.add_grid(GridTree::new("foo", "4px")).unwrap();
        let b = store.add_module("foo", "B", [("k", "b")]).unwrap();
        let a = store.add_module("foo", "A", [("k", "a")]).unwrap();
        store.enter_design_mode("foo").unwrap();
        (store, clock, a, b)
    }

    fn placeholders(store: &GridStore) -> Vec<NodeId> {
        let tree = store.tree("foo").unwrap();
        tree.descendants(tree.root())
            .unwrap()
            .into_iter()
            .filter(|&id| tree.kind(id).unwrap().is_placeholder_cell())
            .collect()
    }

    #[test]
    fn start_dragging_detaches_and_decorates() {
        let (mut store, _, a, _) = two_module_store();
        let content = store.start_dragging("foo", a).unwrap();
        let session = store.session("foo").unwrap();
        assert_eq!(session.step(), DesignModeStep::Dragging);
        assert_eq!(session.refs().dragging, Some(content));
        assert!(session.backup(BackupSlot::Dragging).is_some());
        let tree = session.tree();
        assert!(tree.has_placeholders());
        assert!(!tree.has_resizers());
        assert!(!tree.is_attached(content).unwrap());
        assert_eq!(tree.module_cells().len(), 1);
    }

    #[test]
    fn start_dragging_requires_enabled_and_module_cell() {
        let (mut store, _, a, _) = two_module_store();
        let root = store.tree("foo").unwrap().root();
        assert!(matches!(
            store.start_dragging("foo", root),
            Err(StoreError::Layout(LayoutError::InvalidType { .. }))
        ));
        store.exit_design_mode("foo").unwrap();
        assert!(matches!(
            store.start_dragging("foo", a),
            Err(StoreError::InvalidDesignModeStep { .. })
        ));
    }

    #[test]
    fn cancel_restores_pre_drag_tree() {
        let (mut store, _, a, _) = two_module_store();
        let before = store.tree("foo").unwrap().clone();
        store.start_dragging("foo", a).unwrap();
        store.cancel_dragging("foo").unwrap();
        let session = store.session("foo").unwrap();
        assert_eq!(session.step(), DesignModeStep::Enabled);
        assert_eq!(session.tree(), &before);
        assert!(!session.has_backups());
        assert!(session.refs().is_empty());
    }

    #[test]
    fn hover_then_leave_restores_dragging_tree() {
        let (mut store, clock, a, _) = two_module_store();
        store.start_dragging("foo", a).unwrap();
        let dragging_tree = store.tree("foo").unwrap().clone();
        let target = placeholders(&store)[0];

        store.start_hovering("foo", target).unwrap();
        assert_eq!(store.session("foo").unwrap().step(), DesignModeStep::Prehovering);
        assert!(store.session("foo").unwrap().hover_pending());

        clock.advance(Duration::from_millis(199));
        assert_eq!(store.tick().unwrap(), 0);
        clock.advance(Duration::from_millis(1));
        assert_eq!(store.tick().unwrap(), 1);
        let session = store.session("foo").unwrap();
        assert_eq!(session.step(), DesignModeStep::Hovering);
        assert!(session.tree().kind(target).unwrap().is_module_cell());

        store.stop_hovering("foo").unwrap();
        let session = store.session("foo").unwrap();
        assert_eq!(session.step(), DesignModeStep::Dragging);
        assert_eq!(session.tree(), &dragging_tree);
        assert_eq!(session.refs().hovering, None);
    }

    #[test]
    fn leaving_before_debounce_cancels_timer() {
        let (mut store, clock, a, _) = two_module_store();
        store.start_dragging("foo", a).unwrap();
        let target = placeholders(&store)[0];
        store.start_hovering("foo", target).unwrap();
        store.stop_hovering("foo").unwrap();
        clock.advance(Duration::from_secs(1));
        assert_eq!(store.tick().unwrap(), 0);
        assert_eq!(store.session("foo").unwrap().step(), DesignModeStep::Dragging);
    }

    #[test]
    fn drop_without_target_cancels() {
        let (mut store, _, a, _) = two_module_store();
        let history_len = store.session("foo").unwrap().history().len();
        store.start_dragging("foo", a).unwrap();
        assert_eq!(store.drop("foo", None).unwrap(), DropOutcome::Cancelled);
        let session = store.session("foo").unwrap();
        assert_eq!(session.step(), DesignModeStep::Enabled);
        assert_eq!(session.history().len(), history_len);
    }

    #[test]
    fn drop_on_placeholder_moves_module_and_commits() {
        let (mut store, _, a, b) = two_module_store();
        let history_len = store.session("foo").unwrap().history().len();
        let events = store.subscribe();
        let content = store.start_dragging("foo", a).unwrap();
        let target = *placeholders(&store).last().unwrap();

        let outcome = store.drop("foo", Some(target)).unwrap();
        let DropOutcome::Dropped { content: dropped, cell } = outcome else {
            panic!("expected a drop, got {outcome:?}");
        };
        assert_eq!(dropped, content);

        let session = store.session("foo").unwrap();
        let tree = session.tree();
        assert_eq!(session.step(), DesignModeStep::Enabled);
        assert!(tree.has_resizers() && !tree.has_placeholders());
        assert_eq!(session.history().len(), history_len + 1);
        assert!(!session.has_backups());
        assert!(session.refs().is_empty());
        let cell = cell.unwrap();
        assert_eq!(tree.content_of(cell).unwrap(), Some(content));
        assert_eq!(tree.attr(content, ATTR_COMPONENT).unwrap(), Some("A"));
        assert_eq!(tree.module_cells().len(), 2);
        assert!(tree.contains(b));
        assert!(tree.invariant_report().is_clean());

        let names: Vec<_> = events.try_iter().map(|event| event.name()).collect();
        assert!(names.contains(&"grid.designMode.drop"));
        assert_eq!(names.last(), Some(&"grid.designMode.history.add"));
    }

    #[test]
    fn drag_commands_outside_a_drag_are_rejected() {
        let (mut store, _, _, _) = two_module_store();
        assert!(matches!(
            store.cancel_dragging("foo"),
            Err(StoreError::InvalidDesignModeStep { .. })
        ));
        assert!(store.drop("foo", None).is_err());
        assert!(store.stop_hovering("foo").is_err());
    }
}
