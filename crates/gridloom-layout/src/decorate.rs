//! Transient decorations: placeholder drop targets and resizer bars.
//!
//! Both decorations are applied to the whole tree from the root grid and
//! flagged on it (`hasPlaceholders` / `hasResizers`). A tree never carries
//! both at once. Removing a decoration restores the undecorated structure,
//! up to ids that may have been assigned in between.

use crate::error::{LayoutError, Result};
use crate::manipulator::{clean_grid, resizer_orientation_for, surround_cell_with_grid};
use crate::node::{
    ATTR_HAS_PLACEHOLDERS, ATTR_HAS_RESIZERS, ATTR_SURROUND, GridTree, NodeId, NodeKind,
};

fn require_root(tree: &GridTree, grid: NodeId) -> Result<()> {
    tree.kind(grid)?;
    if grid != tree.root() {
        return Err(LayoutError::invalid_type(format!(
            "decorations apply to the root grid only, {grid} is not the root"
        )));
    }
    Ok(())
}

fn grid_kind_nodes(tree: &GridTree) -> Result<Vec<NodeId>> {
    let mut out = Vec::new();
    for id in tree.descendants(tree.root())? {
        if tree.kind(id)?.is_grid_kind() {
            out.push(id);
        }
    }
    Ok(out)
}

fn rows_of(tree: &GridTree) -> Result<Vec<NodeId>> {
    let mut out = Vec::new();
    for id in tree.descendants(tree.root())? {
        if tree.kind(id)?.is_row() {
            out.push(id);
        }
    }
    Ok(out)
}

fn module_count(tree: &GridTree, node: NodeId) -> Result<usize> {
    let mut count = 0;
    for id in tree.descendants(node)? {
        if tree.kind(id)?.is_module_cell() {
            count += 1;
        }
    }
    Ok(count)
}

fn placeholder_cell(tree: &mut GridTree) -> NodeId {
    tree.create(NodeKind::PLACEHOLDER_CELL)
}

fn placeholder_row(tree: &mut GridTree) -> Result<NodeId> {
    let row = tree.create(NodeKind::PLACEHOLDER_ROW);
    let cell = placeholder_cell(tree);
    tree.append_child(row, cell)?;
    Ok(row)
}

/// Decorate the tree with drop targets.
///
/// Multi-row grids are first wrapped in a `surround` grid cell, and so is
/// every module cell when there is more than one module, so that each of
/// them can be targeted on its own. Then every row gets a placeholder cell
/// before each cell and after the last one, and every grid gets a
/// placeholder row before each row and after the last one.
pub fn add_placeholders(tree: &mut GridTree, grid: NodeId) -> Result<()> {
    require_root(tree, grid)?;
    if tree.has_placeholders() {
        return Err(LayoutError::invalid_state("placeholders are already present"));
    }
    if tree.has_resizers() {
        return Err(LayoutError::invalid_state(
            "placeholders cannot be added while resizers are present",
        ));
    }

    for node in grid_kind_nodes(tree)? {
        if tree.content_children(node)?.len() <= 1 {
            continue;
        }
        let row = tree.create(NodeKind::ROW);
        let wrapper = tree.create(NodeKind::GRID_CELL);
        tree.set_flag(wrapper, ATTR_SURROUND, true)?;
        tree.move_children(node, wrapper)?;
        tree.append_child(row, wrapper)?;
        tree.append_child(node, row)?;
    }

    let modules = tree.module_cells();
    if modules.len() > 1 {
        for cell in modules {
            surround_cell_with_grid(tree, cell)?;
            tree.set_flag(cell, ATTR_SURROUND, true)?;
        }
    }

    for row in rows_of(tree)? {
        let cells = tree.content_children(row)?;
        if let [only] = cells.as_slice()
            && tree.kind(*only)? == NodeKind::GRID_CELL
            && module_count(tree, *only)? == 1
        {
            continue;
        }
        for cell in cells {
            let placeholder = placeholder_cell(tree);
            tree.insert_before(row, placeholder, Some(cell))?;
        }
        let trailing = placeholder_cell(tree);
        tree.append_child(row, trailing)?;
    }

    for node in grid_kind_nodes(tree)? {
        for row in tree.content_children(node)? {
            let placeholder = placeholder_row(tree)?;
            tree.insert_before(node, placeholder, Some(row))?;
        }
        let trailing = placeholder_row(tree)?;
        tree.append_child(node, trailing)?;
    }

    tree.set_flag(grid, ATTR_HAS_PLACEHOLDERS, true)?;
    tracing::debug!(grid = ?tree.name(), "added placeholders");
    Ok(())
}

/// Strip drop targets again.
///
/// Placeholders that received content in the meantime become regular
/// module cells (and their rows regular rows); the rest is deleted and the
/// tree is cleaned, which also folds the `surround` wrappers back.
pub fn remove_placeholders(tree: &mut GridTree, grid: NodeId) -> Result<()> {
    require_root(tree, grid)?;
    if !tree.has_placeholders() {
        return Err(LayoutError::invalid_state("placeholders are not present"));
    }
    tree.set_flag(grid, ATTR_HAS_PLACEHOLDERS, false)?;

    let order = tree.descendants(grid)?;
    for &id in &order {
        if !tree.contains(id) || !tree.kind(id)?.is_placeholder_cell() {
            continue;
        }
        if tree.content_of(id)?.is_some() {
            tree.set_kind(id, NodeKind::MODULE_CELL)?;
        } else {
            tree.remove(id)?;
        }
    }
    for &id in &order {
        if !tree.contains(id) || tree.kind(id)? != NodeKind::PLACEHOLDER_ROW {
            continue;
        }
        if module_count(tree, id)? > 0 {
            tree.set_kind(id, NodeKind::ROW)?;
        } else {
            tree.remove(id)?;
        }
    }

    clean_grid(tree, grid)?;
    for id in tree.descendants(grid)? {
        tree.set_flag(id, ATTR_SURROUND, false)?;
    }
    tracing::debug!(grid = ?tree.name(), "removed placeholders");
    Ok(())
}

/// Re-derive the drop targets after the module set changed.
pub fn clean_placeholders(tree: &mut GridTree, grid: NodeId) -> Result<()> {
    remove_placeholders(tree, grid)?;
    add_placeholders(tree, grid)
}

/// Insert a resizer right before `before_node`, a row or cell that has a
/// previous sibling.
pub fn add_resizer(tree: &mut GridTree, before_node: NodeId) -> Result<NodeId> {
    let kind = tree.kind(before_node)?;
    let Some(orientation) = resizer_orientation_for(kind) else {
        return Err(LayoutError::invalid_type(format!(
            "resizers go before rows or cells, {before_node} is a {}",
            kind.element()
        )));
    };
    let parent = tree.parent(before_node)?;
    let (Some(parent), Some(_)) = (parent, tree.previous_sibling(before_node)?) else {
        return Err(LayoutError::inconsistency(format!(
            "{before_node} is the first of its siblings"
        )));
    };
    let resizer = tree.create(NodeKind::Resizer { orientation });
    tree.insert_before(parent, resizer, Some(before_node))?;
    Ok(resizer)
}

/// Put a resizer between every pair of adjacent rows and adjacent cells.
pub fn add_resizers(tree: &mut GridTree, grid: NodeId) -> Result<()> {
    require_root(tree, grid)?;
    if tree.has_resizers() {
        return Err(LayoutError::invalid_state("resizers are already present"));
    }
    if tree.has_placeholders() {
        return Err(LayoutError::invalid_state(
            "resizers cannot be added while placeholders are present",
        ));
    }

    let mut added = 0usize;
    for node in grid_kind_nodes(tree)? {
        for row in tree.content_children(node)?.into_iter().skip(1) {
            add_resizer(tree, row)?;
            added += 1;
        }
    }
    for row in rows_of(tree)? {
        for cell in tree.content_children(row)?.into_iter().skip(1) {
            add_resizer(tree, cell)?;
            added += 1;
        }
    }

    tree.set_flag(grid, ATTR_HAS_RESIZERS, true)?;
    tracing::debug!(grid = ?tree.name(), added, "added resizers");
    Ok(())
}

pub fn remove_resizers(tree: &mut GridTree, grid: NodeId) -> Result<()> {
    require_root(tree, grid)?;
    if !tree.has_resizers() {
        return Err(LayoutError::invalid_state("resizers are not present"));
    }
    for id in tree.descendants(grid)? {
        if tree.contains(id) && tree.kind(id)?.is_resizer() {
            tree.remove(id)?;
        }
    }
    tree.set_flag(grid, ATTR_HAS_RESIZERS, false)?;
    tracing::debug!(grid = ?tree.name(), "removed resizers");
    Ok(())
}
