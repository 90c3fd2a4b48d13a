//! Design-mode state machine.
//!
//! ```text
//! disabled    -> enabled
//! enabled     -> disabled | dragging | resizing
//! resizing    -> enabled
//! dragging    -> enabled | prehovering
//! prehovering -> dragging | hovering | enabled
//! hovering    -> dragging | enabled
//! ```
//!
//! Each step decides which decoration the tree carries: placeholders while
//! something is dragged, resizers while the layout is editable.

use std::fmt;
use std::str::FromStr;

use gridloom_layout::{
    GridTree, add_placeholders, add_resizers, remove_placeholders, remove_resizers,
    set_ids_with_prefix,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignModeStep {
    #[default]
    Disabled,
    Enabled,
    Dragging,
    Prehovering,
    Hovering,
    Resizing,
}

impl DesignModeStep {
    pub const ALL: [Self; 6] = [
        Self::Disabled,
        Self::Enabled,
        Self::Dragging,
        Self::Prehovering,
        Self::Hovering,
        Self::Resizing,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Enabled => "enabled",
            Self::Dragging => "dragging",
            Self::Prehovering => "prehovering",
            Self::Hovering => "hovering",
            Self::Resizing => "resizing",
        }
    }

    /// Whether `self -> to` is an edge of the state machine.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        use DesignModeStep::{Disabled, Dragging, Enabled, Hovering, Prehovering, Resizing};
        matches!(
            (self, to),
            (Disabled, Enabled)
                | (Enabled, Disabled | Dragging | Resizing)
                | (Resizing, Enabled)
                | (Dragging, Enabled | Prehovering)
                | (Prehovering, Dragging | Hovering | Enabled)
                | (Hovering, Dragging | Enabled)
        )
    }

    #[must_use]
    pub const fn needs_placeholders(self) -> bool {
        matches!(self, Self::Dragging | Self::Prehovering | Self::Hovering)
    }

    #[must_use]
    pub const fn needs_resizers(self) -> bool {
        matches!(self, Self::Enabled | Self::Resizing)
    }

    /// A drag is in progress (with or without a hover target).
    #[must_use]
    pub const fn is_dragging(self) -> bool {
        self.needs_placeholders()
    }

    #[must_use]
    pub const fn is_design_mode(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl fmt::Display for DesignModeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DesignModeStep {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| StoreError::InvalidDesignModeStep {
                from: "?".to_string(),
                to: s.to_string(),
            })
    }
}

/// Bring the tree's decorations in line with `step`, then refresh ids.
///
/// Decorations that `step` no longer needs are stripped before the new ones
/// are added, since placeholders and resizers are mutually exclusive.
pub(crate) fn redecorate(tree: &mut GridTree, step: DesignModeStep, id_prefix: &str) -> Result<()> {
    let root = tree.root();
    if !step.needs_placeholders() && tree.has_placeholders() {
        remove_placeholders(tree, root)?;
    }
    if !step.needs_resizers() && tree.has_resizers() {
        remove_resizers(tree, root)?;
    }
    if step.needs_placeholders() && !tree.has_placeholders() {
        add_placeholders(tree, root)?;
    }
    if step.needs_resizers() && !tree.has_resizers() {
        add_resizers(tree, root)?;
    }
    set_ids_with_prefix(tree, id_prefix)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_table() {
        use DesignModeStep::*;
        let edges = [
            (Disabled, Enabled),
            (Enabled, Disabled),
            (Enabled, Dragging),
            (Enabled, Resizing),
            (Resizing, Enabled),
            (Dragging, Enabled),
            (Dragging, Prehovering),
            (Prehovering, Dragging),
            (Prehovering, Hovering),
            (Prehovering, Enabled),
            (Hovering, Dragging),
            (Hovering, Enabled),
        ];
        for from in DesignModeStep::ALL {
            for to in DesignModeStep::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    edges.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn parse_known_and_unknown_names() {
        assert_eq!("prehovering".parse::<DesignModeStep>().unwrap(), DesignModeStep::Prehovering);
        assert!(matches!(
            "flying".parse::<DesignModeStep>(),
            Err(StoreError::InvalidDesignModeStep { .. })
        ));
    }

    #[test]
    fn decorations_follow_step() {
        let mut tree = GridTree::new("foo", "0");
        let root = tree.root();
        let row = gridloom_layout::add_row(&mut tree, root, None, false).unwrap();
        gridloom_layout::add_cell(&mut tree, row, None, gridloom_layout::CellType::Module, None)
            .unwrap();
        gridloom_layout::add_cell(&mut tree, row, None, gridloom_layout::CellType::Module, None)
            .unwrap();

        redecorate(&mut tree, DesignModeStep::Enabled, "t").unwrap();
        assert!(tree.has_resizers() && !tree.has_placeholders());
        redecorate(&mut tree, DesignModeStep::Dragging, "t").unwrap();
        assert!(tree.has_placeholders() && !tree.has_resizers());
        redecorate(&mut tree, DesignModeStep::Disabled, "t").unwrap();
        assert!(!tree.has_placeholders() && !tree.has_resizers());
        assert!(tree.id_attr(tree.root()).unwrap().unwrap().starts_with("t-grid-"));
    }
}
