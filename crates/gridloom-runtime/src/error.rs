//! Errors surfaced by store commands.

use gridloom_layout::LayoutError;
use thiserror::Error;

use crate::design_mode::DesignModeStep;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// A structural edit or node lookup failed.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("grid {name:?} does not exist")]
    GridDoesNotExist { name: String },

    /// Illegal transition, or a step name that is not a design-mode step.
    #[error("cannot change design mode step from {from} to {to}")]
    InvalidDesignModeStep { from: String, to: String },

    #[error("history index {requested} is out of bounds (0..{len})")]
    HistoryOutOfBound { requested: isize, len: usize },
}

impl StoreError {
    pub(crate) fn grid_does_not_exist(name: &str) -> Self {
        Self::GridDoesNotExist {
            name: name.to_string(),
        }
    }

    pub(crate) fn invalid_step(from: DesignModeStep, to: impl ToString) -> Self {
        Self::InvalidDesignModeStep {
            from: from.as_str().to_string(),
            to: to.to_string(),
        }
    }

    /// Failures a timer callback tolerates: the session went away or the
    /// nodes it referred to no longer sit where they were.
    #[must_use]
    pub fn is_stale_reference(&self) -> bool {
        matches!(
            self,
            Self::GridDoesNotExist { .. }
                | Self::Layout(
                    LayoutError::Inconsistency { .. } | LayoutError::NodeDoesNotExist { .. }
                )
        )
    }
}
