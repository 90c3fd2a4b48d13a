//! Keyboard-style focus moves between module cells.

use gridloom_layout::{Direction, LayoutError, NodeId, neighbor_cell, set_ids_with_prefix};

use crate::error::Result;
use crate::event::GridEventKind;
use crate::store::{GridStore, lookup};

impl GridStore {
    /// Focus `cell`, or the first module cell when `cell` is `None` and
    /// `default_to_first` is set. Returns the focused id afterwards.
    pub fn focus_module_cell(
        &mut self,
        name: &str,
        cell: Option<NodeId>,
        default_to_first: bool,
    ) -> Result<Option<String>> {
        let session = lookup(&mut self.sessions, name)?;
        let target = match cell {
            Some(cell) => {
                if !session.tree.kind(cell)?.is_module_cell() {
                    return Err(
                        LayoutError::invalid_type(format!("{cell} is not a module cell")).into(),
                    );
                }
                Some(cell)
            }
            None if default_to_first => session.tree.module_cells().first().copied(),
            None => None,
        };
        match target {
            Some(target) => self.apply_focus(name, target),
            None => Ok(session.focused_cell_id.clone()),
        }
    }

    pub fn focus_right_module_cell(&mut self, name: &str, use_index_order: bool) -> Result<Option<String>> {
        self.focus_towards(name, Direction::Right, use_index_order)
    }

    pub fn focus_left_module_cell(&mut self, name: &str, use_index_order: bool) -> Result<Option<String>> {
        self.focus_towards(name, Direction::Left, use_index_order)
    }

    pub fn focus_top_module_cell(&mut self, name: &str, use_index_order: bool) -> Result<Option<String>> {
        self.focus_towards(name, Direction::Top, use_index_order)
    }

    pub fn focus_bottom_module_cell(&mut self, name: &str, use_index_order: bool) -> Result<Option<String>> {
        self.focus_towards(name, Direction::Bottom, use_index_order)
    }

    /// Move focus one step in `direction`.
    ///
    /// Spatially, the neighbour comes from [`neighbor_cell`]. In index order
    /// right/bottom mean the next `module-index` and left/top the previous
    /// one. Running off either end leaves the focus where it is. Without a
    /// focused cell the first module cell is focused.
    pub fn focus_towards(
        &mut self,
        name: &str,
        direction: Direction,
        use_index_order: bool,
    ) -> Result<Option<String>> {
        let session = lookup(&mut self.sessions, name)?;
        let tree = &session.tree;
        let current = session
            .focused_cell()
            .filter(|&cell| tree.kind(cell).is_ok_and(|kind| kind.is_module_cell()));
        let Some(current) = current else {
            return self.focus_module_cell(name, None, true);
        };

        let target = if use_index_order {
            let cells = tree.module_cells();
            let position = match tree.module_index(current)? {
                Some(index) => index,
                None => cells
                    .iter()
                    .position(|&cell| cell == current)
                    .ok_or_else(|| LayoutError::inconsistency(format!("{current} is detached")))?,
            };
            let next = match direction {
                Direction::Right | Direction::Bottom => position.checked_add(1),
                Direction::Left | Direction::Top => position.checked_sub(1),
            };
            next.and_then(|index| cells.get(index).copied())
        } else {
            neighbor_cell(tree, current, direction)?
        };

        match target {
            Some(target) => self.apply_focus(name, target),
            None => {
                tracing::trace!(grid = name, ?direction, "no cell to focus");
                Ok(session.focused_cell_id.clone())
            }
        }
    }

    /// Drop the focus, if any.
    pub fn clear_focus(&mut self, name: &str) -> Result<()> {
        let session = lookup(&mut self.sessions, name)?;
        if let Some(id) = session.focused_cell_id.take() {
            self.events.emit(name, GridEventKind::FocusOff { id });
        }
        Ok(())
    }

    fn apply_focus(&mut self, name: &str, target: NodeId) -> Result<Option<String>> {
        let prefix = self.config.id_prefix.as_str();
        let session = lookup(&mut self.sessions, name)?;
        if session.tree.id_attr(target)?.is_none() {
            set_ids_with_prefix(&mut session.tree, prefix)?;
        }
        let id = session
            .tree
            .id_attr(target)?
            .map(str::to_string)
            .ok_or_else(|| LayoutError::inconsistency(format!("{target} is detached")))?;
        if session.focused_cell_id.as_deref() == Some(id.as_str()) {
            return Ok(Some(id));
        }
        let previous = session.focused_cell_id.replace(id.clone());
        tracing::debug!(grid = name, cell = %target, id = %id, "focus moved");
        if let Some(previous) = previous {
            self.events.emit(name, GridEventKind::FocusOff { id: previous });
        }
        self.events
            .emit(name, GridEventKind::FocusOn { id: id.clone() });
        Ok(Some(id))
    }
}
