//! Session store: one design-mode session per named grid.
//!
//! Commands are addressed by grid name, validated against the session's
//! design-mode step, delegated to the layout manipulator and announced to
//! subscribers. Drag and hover commands live in [`crate::drag`], resizing in
//! [`crate::resize`] and focus moves in [`crate::focus`].

use std::collections::BTreeMap;
use std::sync::mpsc;

use gridloom_layout::{
    ATTR_COMPONENT, CellType, GridTree, LayoutError, NodeId, add_cell, add_placeholders,
    add_resizers, add_row, remove_cell, remove_placeholders, remove_resizers, set_ids_with_prefix,
};
use web_time::Duration;

use crate::config::DesignConfig;
use crate::design_mode::{DesignModeStep, redecorate};
use crate::error::{Result, StoreError};
use crate::event::{EventBus, GridEvent, GridEventKind};
use crate::history::GridHistory;
use crate::session::GridSession;
use crate::timer::{Clock, MonotonicClock, TimerQueue, TimerTask};

#[derive(Debug)]
pub struct GridStore {
    pub(crate) config: DesignConfig,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) timers: TimerQueue,
    pub(crate) sessions: BTreeMap<String, GridSession>,
    pub(crate) events: EventBus,
}

impl Default for GridStore {
    fn default() -> Self {
        Self::new(DesignConfig::default())
    }
}

impl GridStore {
    #[must_use]
    pub fn new(config: DesignConfig) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }

    /// Store driven by a caller-provided clock.
    #[must_use]
    pub fn with_clock(config: DesignConfig, clock: impl Clock + 'static) -> Self {
        Self {
            config,
            clock: Box::new(clock),
            timers: TimerQueue::new(),
            sessions: BTreeMap::new(),
            events: EventBus::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DesignConfig {
        &self.config
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&mut self) -> mpsc::Receiver<GridEvent> {
        self.events.subscribe()
    }

    // ---- lifecycle ----------------------------------------------------------

    /// Open a session for `tree`, keyed by its `name` attribute.
    ///
    /// An existing session of the same name is replaced. The tree enters
    /// the store undecorated, with ids assigned, as the first history entry.
    pub fn add_grid(&mut self, mut tree: GridTree) -> Result<()> {
        let name = tree
            .name()
            .map(str::to_string)
            .ok_or_else(|| LayoutError::invalid_type("a grid needs a name to be added"))?;
        redecorate(&mut tree, DesignModeStep::Disabled, &self.config.id_prefix)?;
        if self.sessions.remove(&name).is_some() {
            self.timers.cancel_grid(&name);
            tracing::warn!(grid = %name, "replacing existing grid session");
        }
        let session = GridSession::new(name.clone(), tree, self.config.history_max_depth);
        self.sessions.insert(name.clone(), session);
        tracing::debug!(grid = %name, "grid added");
        self.events.emit(&name, GridEventKind::GridAdded);
        Ok(())
    }

    /// Close a session, disarming its timers.
    pub fn remove_grid(&mut self, name: &str) -> Result<GridSession> {
        let session = self
            .sessions
            .remove(name)
            .ok_or_else(|| StoreError::grid_does_not_exist(name))?;
        self.timers.cancel_grid(name);
        tracing::debug!(grid = name, "grid removed");
        Ok(session)
    }

    /// Close every session. Returns how many there were.
    pub fn remove_all(&mut self) -> usize {
        let count = self.sessions.len();
        for name in self.sessions.keys() {
            self.timers.cancel_grid(name);
        }
        self.sessions.clear();
        tracing::debug!(count, "all grids removed");
        count
    }

    #[must_use]
    pub fn grid_names(&self) -> Vec<&str> {
        self.sessions.keys().map(String::as_str).collect()
    }

    pub fn session(&self, name: &str) -> Result<&GridSession> {
        self.sessions
            .get(name)
            .ok_or_else(|| StoreError::grid_does_not_exist(name))
    }

    /// Live tree of a session.
    pub fn tree(&self, name: &str) -> Result<&GridTree> {
        Ok(&self.session(name)?.tree)
    }

    // ---- modules ------------------------------------------------------------

    /// Add a module in a new row at the top of the grid.
    ///
    /// `params` become attributes of the module's content leaf, next to
    /// `component = module_path`. Any running interaction is settled first;
    /// the change is committed to history. Returns the new module cell.
    pub fn add_module<I, K, V>(&mut self, name: &str, module_path: &str, params: I) -> Result<NodeId>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.settle(name)?;
        let prefix = self.config.id_prefix.as_str();
        let session = lookup(&mut self.sessions, name)?;
        let mut attrs: Vec<(String, String)> = params
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .filter(|(key, _)| key != ATTR_COMPONENT)
            .collect();
        attrs.push((ATTR_COMPONENT.to_string(), module_path.to_string()));

        let cell = with_bare_tree(&mut session.tree, |tree| {
            let root = tree.root();
            let first = tree.content_children(root)?.first().copied();
            let row = add_row(tree, root, first, false)?;
            let content = tree.create_content(attrs);
            add_cell(tree, row, None, CellType::Module, Some(content))
        })?;
        set_ids_with_prefix(&mut session.tree, prefix)?;
        let index = commit_history(session);
        audit(session);
        tracing::debug!(grid = name, cell = %cell, module = module_path, "module added");
        self.events.emit(name, GridEventKind::ModuleAdded { cell });
        self.events.emit(name, GridEventKind::HistoryAdded { index });
        Ok(cell)
    }

    /// Remove a module cell; the layout is cleaned and the change committed
    /// to history.
    pub fn remove_module(&mut self, name: &str, cell: NodeId) -> Result<()> {
        self.settle(name)?;
        let prefix = self.config.id_prefix.as_str();
        let session = lookup(&mut self.sessions, name)?;
        if !session.tree.kind(cell)?.is_module_cell() {
            return Err(LayoutError::invalid_type(format!("{cell} is not a module cell")).into());
        }
        if !session.tree.is_attached(cell)? {
            return Err(LayoutError::inconsistency(format!("module cell {cell} is detached")).into());
        }
        let removed_id = session.tree.id_attr(cell)?.map(str::to_string);
        with_bare_tree(&mut session.tree, |tree| remove_cell(tree, cell))?;
        set_ids_with_prefix(&mut session.tree, prefix)?;
        let index = commit_history(session);
        audit(session);
        tracing::debug!(grid = name, cell = %cell, "module removed");
        self.events.emit(name, GridEventKind::ModuleRemoved { cell });
        self.events.emit(name, GridEventKind::HistoryAdded { index });

        if removed_id.is_some() && session.focused_cell_id == removed_id {
            if let Some(id) = session.focused_cell_id.take() {
                self.events.emit(name, GridEventKind::FocusOff { id });
            }
        }
        Ok(())
    }

    // ---- design mode --------------------------------------------------------

    pub fn enter_design_mode(&mut self, name: &str) -> Result<()> {
        let prefix = self.config.id_prefix.as_str();
        let session = lookup(&mut self.sessions, name)?;
        if session.step.is_design_mode() {
            return Ok(());
        }
        transition(session, DesignModeStep::Enabled, prefix)?;
        self.events.emit(name, GridEventKind::DesignModeEntered);
        Ok(())
    }

    /// Leave design mode, cancelling a drag or finishing a resize first.
    pub fn exit_design_mode(&mut self, name: &str) -> Result<()> {
        if !lookup(&mut self.sessions, name)?.step.is_design_mode() {
            return Ok(());
        }
        self.settle(name)?;
        let prefix = self.config.id_prefix.as_str();
        let session = lookup(&mut self.sessions, name)?;
        transition(session, DesignModeStep::Disabled, prefix)?;
        self.events.emit(name, GridEventKind::DesignModeExited);
        Ok(())
    }

    /// Move along one edge of the state machine, re-deriving decorations.
    ///
    /// Requesting the current step is a no-op.
    pub fn change_design_mode_step(&mut self, name: &str, to: DesignModeStep) -> Result<()> {
        let prefix = self.config.id_prefix.as_str();
        let session = lookup(&mut self.sessions, name)?;
        transition(session, to, prefix)
    }

    /// [`GridStore::change_design_mode_step`] with the step given by name.
    pub fn change_design_mode_step_named(&mut self, name: &str, step: &str) -> Result<()> {
        let from = lookup(&mut self.sessions, name)?.step;
        let to = step
            .parse::<DesignModeStep>()
            .map_err(|_| StoreError::invalid_step(from, step))?;
        self.change_design_mode_step(name, to)
    }

    /// Bring a session back to a resting step (`enabled` or `disabled`).
    fn settle(&mut self, name: &str) -> Result<()> {
        let step = lookup(&mut self.sessions, name)?.step;
        if step.is_dragging() {
            self.cancel_dragging(name)?;
        } else if step == DesignModeStep::Resizing {
            self.stop_resizing(name)?;
        }
        Ok(())
    }

    // ---- history ------------------------------------------------------------

    /// Archive the live tree as a new history entry. Returns its index.
    pub fn add_current_grid_to_history(&mut self, name: &str) -> Result<usize> {
        let session = lookup(&mut self.sessions, name)?;
        let index = commit_history(session);
        self.events.emit(name, GridEventKind::HistoryAdded { index });
        Ok(index)
    }

    pub fn go_back_in_history(&mut self, name: &str) -> Result<usize> {
        self.move_in_history(name, false)
    }

    pub fn go_forward_in_history(&mut self, name: &str) -> Result<usize> {
        self.move_in_history(name, true)
    }

    fn move_in_history(&mut self, name: &str, forward: bool) -> Result<usize> {
        self.settle(name)?;
        let prefix = self.config.id_prefix.as_str();
        let session = lookup(&mut self.sessions, name)?;
        let snapshot = if forward {
            session.history.forward()?
        } else {
            session.history.back()?
        };
        let mut tree = (*snapshot).clone();
        if let Err(err) = redecorate(&mut tree, session.step, prefix) {
            undo_history_move(&mut session.history, forward, name);
            return Err(err);
        }
        session.tree = tree;
        let index = session.history.index();
        audit(session);
        tracing::debug!(grid = name, index, forward, "history restored");
        let kind = if forward {
            GridEventKind::HistoryForward { index }
        } else {
            GridEventKind::HistoryBack { index }
        };
        self.events.emit(name, kind);
        Ok(index)
    }

    // ---- one-screen mode ----------------------------------------------------

    pub fn enter_one_screen_mode(&mut self, name: &str) -> Result<()> {
        self.set_one_screen_mode(name, true)
    }

    pub fn exit_one_screen_mode(&mut self, name: &str) -> Result<()> {
        self.set_one_screen_mode(name, false)
    }

    fn set_one_screen_mode(&mut self, name: &str, on: bool) -> Result<()> {
        let session = lookup(&mut self.sessions, name)?;
        if session.one_screen_mode == on {
            return Ok(());
        }
        session.one_screen_mode = on;
        tracing::debug!(grid = name, on, "one-screen mode");
        let kind = if on {
            GridEventKind::OneScreenModeEntered
        } else {
            GridEventKind::OneScreenModeExited
        };
        self.events.emit(name, kind);
        Ok(())
    }

    // ---- timers -------------------------------------------------------------

    /// Fire every timer that is due on the store's clock. Returns how many
    /// fired.
    ///
    /// Timers whose session vanished or whose nodes moved in the meantime
    /// are dropped with a warning; other failures are returned.
    pub fn tick(&mut self) -> Result<usize> {
        let now = self.clock.now();
        let mut fired = 0;
        while let Some((id, task)) = self.timers.pop_due(now) {
            fired += 1;
            match task {
                TimerTask::StayHovering { grid } => {
                    let armed = self
                        .sessions
                        .get(&grid)
                        .is_some_and(|session| session.hover_timer == Some(id));
                    if !armed {
                        tracing::debug!(grid = %grid, timer = %id, "stale hover timer ignored");
                        continue;
                    }
                    match self.stay_hovering(&grid) {
                        Ok(()) => {}
                        Err(err) if err.is_stale_reference() => {
                            tracing::warn!(grid = %grid, error = %err, "hover timer dropped");
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
        }
        Ok(fired)
    }

    /// Earliest pending timer deadline on the store's clock.
    #[must_use]
    pub fn next_timer_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }
}

pub(crate) fn lookup<'a>(
    sessions: &'a mut BTreeMap<String, GridSession>,
    name: &str,
) -> Result<&'a mut GridSession> {
    sessions
        .get_mut(name)
        .ok_or_else(|| StoreError::grid_does_not_exist(name))
}

/// Managed transition: checks the edge, re-derives decorations, refreshes
/// ids. Requesting the current step does nothing.
pub(crate) fn transition(
    session: &mut GridSession,
    to: DesignModeStep,
    id_prefix: &str,
) -> Result<()> {
    let from = session.step;
    if from == to {
        return Ok(());
    }
    if !from.can_transition_to(to) {
        return Err(StoreError::invalid_step(from, to));
    }
    redecorate(&mut session.tree, to, id_prefix)?;
    session.step = to;
    tracing::debug!(grid = %session.name, %from, %to, "design mode step");
    Ok(())
}

/// Set the step without touching decorations; used when a backup with the
/// right decorations has just been restored.
pub(crate) fn force_step(session: &mut GridSession, to: DesignModeStep) {
    tracing::debug!(grid = %session.name, from = %session.step, %to, "design mode step (forced)");
    session.step = to;
}

pub(crate) fn commit_history(session: &mut GridSession) -> usize {
    let index = session.history.add(session.tree.clone());
    tracing::debug!(grid = %session.name, index, len = session.history.len(), "history entry added");
    index
}

/// Run `edit` on the tree with its decorations stripped, then put the same
/// decorations back around the result. On failure the tree is left as it
/// was.
fn with_bare_tree<T>(
    tree: &mut GridTree,
    edit: impl FnOnce(&mut GridTree) -> gridloom_layout::Result<T>,
) -> Result<T> {
    let saved = tree.clone();
    let result = bare_edit(tree, edit);
    if result.is_err() {
        *tree = saved;
    }
    result
}

fn bare_edit<T>(
    tree: &mut GridTree,
    edit: impl FnOnce(&mut GridTree) -> gridloom_layout::Result<T>,
) -> Result<T> {
    let root = tree.root();
    let placeholders = tree.has_placeholders();
    let resizers = tree.has_resizers();
    if placeholders {
        remove_placeholders(tree, root)?;
    }
    if resizers {
        remove_resizers(tree, root)?;
    }
    let out = edit(tree)?;
    if placeholders {
        add_placeholders(tree, root)?;
    }
    if resizers {
        add_resizers(tree, root)?;
    }
    Ok(out)
}

/// Put the history index back where the live tree still is after a move
/// whose restore failed.
fn undo_history_move(history: &mut GridHistory, forward: bool, grid: &str) {
    let reverted = if forward {
        history.back()
    } else {
        history.forward()
    };
    if let Err(err) = reverted {
        tracing::warn!(grid, forward, error = %err, "history index could not be reverted");
    }
}

/// Debug builds report structural problems left behind by a command.
pub(crate) fn audit(session: &GridSession) {
    if cfg!(debug_assertions) {
        let report = session.tree.invariant_report();
        if !report.is_clean() {
            tracing::warn!(
                grid = %session.name,
                codes = ?report.codes(),
                "layout invariants violated"
            );
        }
    }
}
