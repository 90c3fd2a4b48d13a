#![forbid(unsafe_code)]

//! Hierarchical grid layout tree and the structural operations that edit it.
//!
//! A layout is a [`GridTree`]: a root grid holding rows, rows holding cells,
//! and cells holding either a module's content leaf or a nested grid. The
//! [`manipulator`] functions edit that tree and [`clean_grid`] simplifies it
//! afterwards; [`decorate`] adds and strips the placeholder and resizer
//! decorations used while editing interactively.

pub mod decorate;
pub mod error;
pub mod invariants;
pub mod manipulator;
pub mod navigate;
pub mod node;
pub mod xml;

pub use decorate::{
    add_placeholders, add_resizer, add_resizers, clean_placeholders, remove_placeholders,
    remove_resizers,
};
pub use error::{LayoutError, Result};
pub use invariants::{InvariantCode, InvariantIssue, InvariantReport};
pub use manipulator::{
    DEFAULT_ID_PREFIX, add_cell, add_row, clean_grid, get_nearest_grid,
    move_content_to_placeholder, remove_cell, remove_content_node, set_ids, set_ids_with_prefix,
    surround_cell_with_grid,
};
pub use navigate::{
    Direction, get_bottom_cell, get_left_cell, get_right_cell, get_top_cell, neighbor_cell,
};
pub use node::{
    ATTR_COMPONENT, ATTR_HAS_PLACEHOLDERS, ATTR_HAS_RESIZERS, ATTR_ID, ATTR_MODULE_INDEX,
    ATTR_NAME, ATTR_RELATIVE_SIZE, ATTR_SPACE, ATTR_SURROUND, ATTR_TYPE, CellType,
    DEFAULT_RELATIVE_SIZE, GridTree, NodeId, NodeKind, NodeRecord, ResizerOrientation,
};
