//! Structural edit operations over a [`GridTree`].
//!
//! Every function here is stateless: it takes the tree (and the handles it
//! operates on) and either returns a value or mutates the tree in place.
//! After any public call returns, the attached tree is structurally valid:
//! grids hold rows (and resizers), rows hold cells (and resizers), module
//! cells hold one content leaf and nothing is left empty by [`clean_grid`].

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::error::{LayoutError, Result};
use crate::node::{
    ATTR_ID, ATTR_MODULE_INDEX, CellType, GridTree, NodeId, NodeKind, ResizerOrientation,
};

/// Prefix used by [`set_ids`].
pub const DEFAULT_ID_PREFIX: &str = "gl";

/// Closest grid-kind node (root grid or grid cell) above `node`.
///
/// Returns `None` when the walk leaves the tree without meeting one, which is
/// the normal outcome for the root itself and for detached fragments.
pub fn get_nearest_grid(tree: &GridTree, node: NodeId, include_self: bool) -> Result<Option<NodeId>> {
    let mut current = if include_self {
        Some(node)
    } else {
        tree.parent(node)?
    };
    while let Some(id) = current {
        if tree.kind(id)?.is_grid_kind() {
            return Ok(Some(id));
        }
        current = tree.parent(id)?;
    }
    Ok(None)
}

/// Insert a new row into `node`, before `before_row` or at the end.
///
/// A cell that is not grid-kind yet is first turned into a grid holding its
/// current content (see [`surround_cell_with_grid`]).
pub fn add_row(
    tree: &mut GridTree,
    node: NodeId,
    before_row: Option<NodeId>,
    placeholder: bool,
) -> Result<NodeId> {
    let kind = tree.kind(node)?;
    if !kind.is_grid_kind() {
        match kind {
            NodeKind::Cell {
                cell_type: CellType::Module,
            } => {
                if let Some(before) = before_row {
                    return Err(LayoutError::inconsistency(format!(
                        "cannot insert before {before}: cell {node} has no rows yet"
                    )));
                }
                surround_cell_with_grid(tree, node)?;
            }
            other => {
                return Err(LayoutError::invalid_type(format!(
                    "rows can only be added to grids and module cells, not to a {}",
                    other.element()
                )));
            }
        }
    }
    if let Some(before) = before_row {
        if tree.children(node)?.is_empty() {
            return Err(LayoutError::inconsistency(format!(
                "cannot insert before {before}: grid {node} has no rows yet"
            )));
        }
        if tree.parent(before)? != Some(node) || !tree.kind(before)?.is_row() {
            return Err(LayoutError::inconsistency(format!(
                "row {before} is not a row of grid {node}"
            )));
        }
    }
    let row = tree.create(NodeKind::Row { placeholder });
    tree.insert_before(node, row, before_row)?;
    tracing::trace!(grid = %node, row = %row, placeholder, "added row");
    Ok(row)
}

/// Insert a new cell into `row`, before `before_cell` or at the end.
///
/// Module and placeholder cells may receive a detached content leaf; a module
/// cell without one gets an empty leaf so it is never left without content.
pub fn add_cell(
    tree: &mut GridTree,
    row: NodeId,
    before_cell: Option<NodeId>,
    cell_type: CellType,
    content: Option<NodeId>,
) -> Result<NodeId> {
    if !tree.kind(row)?.is_row() {
        return Err(LayoutError::invalid_type(format!(
            "cells can only be added to rows, {row} is a {}",
            tree.kind(row)?.element()
        )));
    }
    if let Some(before) = before_cell
        && tree.parent(before)? != Some(row)
    {
        return Err(LayoutError::inconsistency(format!(
            "cell {before} does not belong to row {row}"
        )));
    }
    if let Some(content) = content {
        if tree.kind(content)? != NodeKind::Content {
            return Err(LayoutError::invalid_type(format!(
                "cell content must be a content leaf, {content} is a {}",
                tree.kind(content)?.element()
            )));
        }
        if cell_type == CellType::Grid {
            return Err(LayoutError::invalid_type(
                "grid cells hold rows, not a content leaf",
            ));
        }
        if tree.parent(content)?.is_some() {
            return Err(LayoutError::inconsistency(format!(
                "content {content} is still attached elsewhere"
            )));
        }
    }

    let cell = tree.create(NodeKind::Cell { cell_type });
    tree.insert_before(row, cell, before_cell)?;
    match (cell_type, content) {
        (_, Some(content)) => tree.append_child(cell, content)?,
        (CellType::Module, None) => {
            let empty = tree.create(NodeKind::Content);
            tree.append_child(cell, empty)?;
        }
        _ => {}
    }
    tracing::trace!(row = %row, cell = %cell, cell_type = cell_type.as_str(), "added cell");
    Ok(cell)
}

/// Turn `cell` into a grid cell holding one row with one new inner cell.
///
/// The inner cell takes over the original type and content; `cell` keeps its
/// handle, position and attributes. Returns the inner cell.
pub fn surround_cell_with_grid(tree: &mut GridTree, cell: NodeId) -> Result<NodeId> {
    let kind = tree.kind(cell)?;
    if !kind.is_cell() {
        return Err(LayoutError::invalid_type(format!(
            "only cells can be surrounded, {cell} is a {}",
            kind.element()
        )));
    }
    let row = tree.create(NodeKind::ROW);
    let inner = tree.create(kind);
    tree.move_children(cell, inner)?;
    if let Some(index) = tree.remove_attr(cell, ATTR_MODULE_INDEX)? {
        tree.set_attr(inner, ATTR_MODULE_INDEX, index)?;
    }
    tree.set_kind(cell, NodeKind::GRID_CELL)?;
    tree.append_child(cell, row)?;
    tree.append_child(row, inner)?;
    Ok(inner)
}

/// Remove `cell` (and its subtree) then clean its grid.
pub fn remove_cell(tree: &mut GridTree, cell: NodeId) -> Result<()> {
    if !tree.kind(cell)?.is_cell() {
        return Err(LayoutError::invalid_type(format!(
            "{cell} is not a cell"
        )));
    }
    if tree.parent(cell)?.is_none() {
        return Err(LayoutError::inconsistency(format!(
            "cell {cell} is not attached to a row"
        )));
    }
    let grid = get_nearest_grid(tree, cell, false)?;
    tree.remove(cell)?;
    if let Some(grid) = grid {
        clean_grid(tree, grid)?;
    }
    Ok(())
}

/// Detach a content leaf from its cell then clean the cell's grid.
///
/// The leaf stays in the arena as a detached fragment so the caller can
/// re-attach it (see [`move_content_to_placeholder`]).
pub fn remove_content_node(tree: &mut GridTree, content: NodeId) -> Result<()> {
    if tree.kind(content)? != NodeKind::Content {
        return Err(LayoutError::invalid_type(format!(
            "{content} is not a content leaf"
        )));
    }
    let Some(cell) = tree.parent(content)? else {
        return Err(LayoutError::inconsistency(format!(
            "content {content} is already detached"
        )));
    };
    let grid = get_nearest_grid(tree, cell, false)?;
    tree.detach(content)?;
    if let Some(grid) = grid {
        clean_grid(tree, grid)?;
    }
    Ok(())
}

/// Relocate `content` into the placeholder cell `placeholder`, which becomes
/// a module cell. The former grid of `content`, if any, is cleaned.
pub fn move_content_to_placeholder(
    tree: &mut GridTree,
    content: NodeId,
    placeholder: NodeId,
) -> Result<()> {
    if !tree.kind(placeholder)?.is_placeholder_cell() {
        return Err(LayoutError::invalid_type(format!(
            "drop target {placeholder} is not a placeholder cell"
        )));
    }
    if tree.kind(content)? != NodeKind::Content {
        return Err(LayoutError::invalid_type(format!(
            "{content} is not a content leaf"
        )));
    }
    let former_grid = match tree.parent(content)? {
        Some(cell) => get_nearest_grid(tree, cell, false)?,
        None => None,
    };
    let existing: SmallVec<[NodeId; 2]> = tree.children(placeholder)?.iter().copied().collect();
    for child in existing {
        tree.remove(child)?;
    }
    tree.detach(content)?;
    tree.append_child(placeholder, content)?;
    tree.set_kind(placeholder, NodeKind::MODULE_CELL)?;
    if let Some(grid) = former_grid
        && tree.contains(grid)
    {
        clean_grid(tree, grid)?;
    }
    Ok(())
}

/// Assign ids with [`DEFAULT_ID_PREFIX`]; see [`set_ids_with_prefix`].
pub fn set_ids(tree: &mut GridTree) -> Result<()> {
    set_ids_with_prefix(tree, DEFAULT_ID_PREFIX)
}

/// Give every attached node lacking an `id` a fresh unique one, then number
/// module cells densely in document order (`module-index`).
///
/// Existing ids are never touched. Non-module nodes lose any stale
/// `module-index`.
pub fn set_ids_with_prefix(tree: &mut GridTree, prefix: &str) -> Result<()> {
    let order = tree.descendants(tree.root())?;
    let mut taken: FxHashSet<String> = FxHashSet::default();
    for &id in &order {
        if let Some(existing) = tree.id_attr(id)? {
            taken.insert(existing.to_string());
        }
    }

    let mut assigned = 0usize;
    let mut module_index = 0usize;
    for &id in &order {
        let kind = tree.kind(id)?;
        if tree.id_attr(id)?.is_none() {
            let fresh = loop {
                let candidate = format!("{prefix}-{}-{}", kind.element(), tree.next_id_seq());
                if !taken.contains(&candidate) {
                    break candidate;
                }
            };
            taken.insert(fresh.clone());
            tree.set_attr(id, ATTR_ID, fresh)?;
            assigned += 1;
        }
        if kind.is_module_cell() {
            tree.set_attr(id, ATTR_MODULE_INDEX, module_index.to_string())?;
            module_index += 1;
        } else {
            tree.remove_attr(id, ATTR_MODULE_INDEX)?;
        }
    }
    tracing::trace!(assigned, modules = module_index, "assigned ids");
    Ok(())
}

// ---- clean ------------------------------------------------------------------

/// Simplify the tree around `grid` after an edit.
///
/// The subtree of `grid` is cleaned bottom-up, then each enclosing grid up
/// to the root gets one more pass over its own rows. Passes:
///
/// - empty module/grid cells and rows without cells are dropped;
/// - rows made only of empty placeholder cells are dropped when the grid
///   has another row with real content, unless the tree is decorated with
///   placeholders;
/// - a grid cell whose content is one row with one cell takes over that
///   cell's type and content; the root does the same when that cell is a
///   grid cell;
/// - a grid cell that is the only cell of its row and holds a single row
///   hands that row's cells to the outer row;
/// - resizers left at an edge or next to another resizer are dropped.
///
/// Reaching a node with no grid above it ends the walk. The pass is
/// idempotent.
pub fn clean_grid(tree: &mut GridTree, grid: NodeId) -> Result<()> {
    if !tree.kind(grid)?.is_grid_kind() {
        return Err(LayoutError::invalid_type(format!(
            "{grid} is not a grid"
        )));
    }
    clean_deep(tree, grid)?;
    let mut current = get_nearest_grid(tree, grid, false)?;
    while let Some(outer) = current {
        clean_level(tree, outer)?;
        current = get_nearest_grid(tree, outer, false)?;
    }
    Ok(())
}

/// Clean `grid` and every grid nested below it, innermost first.
pub(crate) fn clean_deep(tree: &mut GridTree, grid: NodeId) -> Result<()> {
    let rows = tree.children(grid)?.to_vec();
    for row in rows {
        if !tree.kind(row)?.is_row() {
            continue;
        }
        let cells = tree.children(row)?.to_vec();
        for cell in cells {
            if tree.kind(cell)?.is_grid_kind() {
                clean_deep(tree, cell)?;
            }
        }
    }
    clean_level(tree, grid)
}

fn is_empty_cell(tree: &GridTree, cell: NodeId) -> Result<bool> {
    Ok(match tree.kind(cell)?.cell_type() {
        Some(CellType::Module) => tree.content_of(cell)?.is_none(),
        Some(CellType::Grid) => tree.content_children(cell)?.is_empty(),
        Some(CellType::Placeholder) | None => false,
    })
}

fn is_placeholder_only_row(tree: &GridTree, row: NodeId) -> Result<bool> {
    let cells = tree.content_children(row)?;
    if cells.is_empty() {
        return Ok(false);
    }
    for cell in cells {
        if !tree.kind(cell)?.is_placeholder_cell() || !tree.children(cell)?.is_empty() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Drop resizers at either edge of `parent`'s children and collapse runs of
/// adjacent resizers.
fn normalize_resizers(tree: &mut GridTree, parent: NodeId) -> Result<bool> {
    let mut doomed: SmallVec<[NodeId; 4]> = SmallVec::new();
    let mut kept: Vec<(NodeId, bool)> = Vec::new();
    for &child in tree.children(parent)? {
        let is_resizer = tree.kind(child)?.is_resizer();
        let after_content = kept.last().is_some_and(|&(_, resizer)| !resizer);
        if is_resizer && !after_content {
            doomed.push(child);
        } else {
            kept.push((child, is_resizer));
        }
    }
    while let Some(&(last, true)) = kept.last() {
        doomed.push(last);
        kept.pop();
    }
    let changed = !doomed.is_empty();
    for resizer in doomed {
        tree.remove(resizer)?;
    }
    Ok(changed)
}

/// Promote the single cell `inner` (held in `row`) onto the grid `grid`.
fn collapse_into(tree: &mut GridTree, grid: NodeId, row: NodeId, inner: NodeId) -> Result<()> {
    let inner_kind = tree.kind(inner)?;
    tree.detach(row)?;
    tree.detach(inner)?;
    let leftovers = tree.children(grid)?.to_vec();
    for leftover in leftovers {
        tree.remove(leftover)?;
    }
    tree.move_children(inner, grid)?;
    if grid != tree.root() {
        tree.set_kind(grid, inner_kind)?;
        if let Some(index) = tree.remove_attr(inner, ATTR_MODULE_INDEX)? {
            tree.set_attr(grid, ATTR_MODULE_INDEX, index)?;
        }
        if tree.id_attr(grid)?.is_none()
            && let Some(id) = tree.remove_attr(inner, ATTR_ID)?
        {
            tree.set_attr(grid, ATTR_ID, id)?;
        }
    }
    tree.remove(inner)?;
    tree.remove(row)?;
    Ok(())
}

/// One fixpoint pass over the direct rows and cells of `grid`.
fn clean_level(tree: &mut GridTree, grid: NodeId) -> Result<()> {
    let mut passes = 0usize;
    loop {
        passes += 1;
        let mut changed = false;

        for row in tree.children(grid)?.to_vec() {
            if !tree.kind(row)?.is_row() {
                continue;
            }
            for cell in tree.children(row)?.to_vec() {
                if tree.kind(cell)?.is_cell() && is_empty_cell(tree, cell)? {
                    tree.remove(cell)?;
                    changed = true;
                }
            }
            let cells = tree.content_children(row)?;
            if let [only] = cells.as_slice()
                && tree.kind(*only)? == NodeKind::GRID_CELL
            {
                let inner_rows = tree.content_children(*only)?;
                if let [inner_row] = inner_rows.as_slice() {
                    let spliced = tree.children(*inner_row)?.to_vec();
                    for &moved in &spliced {
                        tree.detach(moved)?;
                    }
                    tree.splice(*only, &spliced)?;
                    tree.remove(*only)?;
                    changed = true;
                }
            }
            changed |= normalize_resizers(tree, row)?;
            if tree.content_children(row)?.is_empty() {
                tree.remove(row)?;
                changed = true;
            }
        }

        // Placeholder rows are live drop targets while the tree is decorated.
        let rows = tree.content_children(grid)?;
        if rows.len() > 1 && !tree.has_placeholders() {
            let mut placeholder_only = Vec::new();
            for &row in &rows {
                if is_placeholder_only_row(tree, row)? {
                    placeholder_only.push(row);
                }
            }
            if !placeholder_only.is_empty() && placeholder_only.len() < rows.len() {
                for row in placeholder_only {
                    tree.remove(row)?;
                }
                changed = true;
            }
        }
        changed |= normalize_resizers(tree, grid)?;

        let rows = tree.content_children(grid)?;
        if let [row] = rows.as_slice() {
            let cells = tree.content_children(*row)?;
            if let [inner] = cells.as_slice() {
                let inner_kind = tree.kind(*inner)?;
                let is_root = grid == tree.root();
                if !is_root || inner_kind == NodeKind::GRID_CELL {
                    collapse_into(tree, grid, *row, *inner)?;
                    changed = true;
                }
            }
        }

        if !changed || !tree.kind(grid)?.is_grid_kind() {
            break;
        }
    }
    tracing::trace!(grid = %grid, passes, "cleaned grid level");
    Ok(())
}

// ---- resizer placement helpers shared with decorations -----------------------

/// Resizer orientation for a resizer placed before `node`.
pub(crate) fn resizer_orientation_for(kind: NodeKind) -> Option<ResizerOrientation> {
    match kind {
        NodeKind::Row { .. } => Some(ResizerOrientation::Horizontal),
        NodeKind::Cell { .. } => Some(ResizerOrientation::Vertical),
        _ => None,
    }
}
