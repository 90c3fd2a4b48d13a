//! Directional neighbour lookup between module cells.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{LayoutError, Result};
use crate::manipulator::get_nearest_grid;
use crate::node::{CellType, GridTree, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Top,
    Bottom,
}

impl Direction {
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    const fn is_backward(self) -> bool {
        matches!(self, Self::Left | Self::Top)
    }
}

pub fn get_right_cell(tree: &GridTree, cell: NodeId) -> Result<Option<NodeId>> {
    neighbor_cell(tree, cell, Direction::Right)
}

pub fn get_left_cell(tree: &GridTree, cell: NodeId) -> Result<Option<NodeId>> {
    neighbor_cell(tree, cell, Direction::Left)
}

pub fn get_top_cell(tree: &GridTree, cell: NodeId) -> Result<Option<NodeId>> {
    neighbor_cell(tree, cell, Direction::Top)
}

pub fn get_bottom_cell(tree: &GridTree, cell: NodeId) -> Result<Option<NodeId>> {
    neighbor_cell(tree, cell, Direction::Bottom)
}

/// Closest module cell next to `cell` in `direction`.
///
/// Siblings are scanned first (cells for left/right, rows for top/bottom),
/// skipping resizers and anything without a module in it. When the current
/// level runs out, the search continues from the enclosing grid cell. The
/// module picked inside a sibling is the one on the edge facing `cell`.
/// Returns `None` at the outer edge of the layout.
pub fn neighbor_cell(tree: &GridTree, cell: NodeId, direction: Direction) -> Result<Option<NodeId>> {
    if !tree.kind(cell)?.is_cell() {
        return Err(LayoutError::invalid_type(format!("{cell} is not a cell")));
    }
    let mut current = cell;
    loop {
        let pivot = if direction.is_horizontal() {
            current
        } else {
            match tree.parent(current)? {
                Some(row) => row,
                None => return Ok(None),
            }
        };
        let mut sibling = step(tree, pivot, direction)?;
        while let Some(candidate) = sibling {
            if !tree.kind(candidate)?.is_resizer()
                && let Some(found) = descend(tree, candidate, direction)?
            {
                return Ok(Some(found));
            }
            sibling = step(tree, candidate, direction)?;
        }
        match get_nearest_grid(tree, current, false)? {
            Some(grid) if grid != tree.root() => current = grid,
            _ => return Ok(None),
        }
    }
}

fn step(tree: &GridTree, node: NodeId, direction: Direction) -> Result<Option<NodeId>> {
    if direction.is_backward() {
        tree.previous_sibling(node)
    } else {
        tree.next_sibling(node)
    }
}

/// Module cell inside `node` (a row or a cell) closest to the side we are
/// arriving from.
fn descend(tree: &GridTree, node: NodeId, direction: Direction) -> Result<Option<NodeId>> {
    let kind = tree.kind(node)?;
    if kind.is_row() {
        let mut cells: SmallVec<[NodeId; 8]> = tree.content_children(node)?.into_iter().collect();
        if direction == Direction::Left {
            cells.reverse();
        }
        for cell in cells {
            if let Some(found) = descend(tree, cell, direction)? {
                return Ok(Some(found));
            }
        }
        return Ok(None);
    }
    match kind.cell_type() {
        Some(CellType::Module) => Ok(Some(node)),
        Some(CellType::Grid) => {
            let mut rows: SmallVec<[NodeId; 8]> =
                tree.content_children(node)?.into_iter().collect();
            if direction == Direction::Top {
                rows.reverse();
            }
            for row in rows {
                if let Some(found) = descend(tree, row, direction)? {
                    return Ok(Some(found));
                }
            }
            Ok(None)
        }
        Some(CellType::Placeholder) | None => Ok(None),
    }
}
