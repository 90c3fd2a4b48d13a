#![forbid(unsafe_code)]

//! Gridloom Runtime
//!
//! Interactive editing sessions on top of `gridloom-layout` trees.
//!
//! # Key Components
//!
//! - [`GridStore`] - One session per named grid; every command goes through it
//! - [`DesignModeStep`] - The design-mode state machine and its decorations
//! - [`GridHistory`] - Undo/redo over whole-tree snapshots
//! - [`GridEvent`] - Notifications sent to [`GridStore::subscribe`] receivers
//! - [`Clock`] / [`TimerQueue`] - Injected time for the hover debounce
//! - [`DesignConfig`] - Tunables, optionally loaded from TOML or JSON
//!
//! # How it fits in the system
//! A host (renderer, input layer) turns pointer and keyboard input into
//! store commands, calls [`GridStore::tick`] from its loop so debounced
//! hovers fire, and redraws from the live tree whenever an event arrives.
//! Structural work is delegated to the layout crate's manipulator.

pub mod config;
pub mod design_mode;
pub mod drag;
pub mod error;
pub mod event;
pub mod focus;
pub mod history;
pub mod resize;
pub mod session;
pub mod store;
pub mod timer;

#[cfg(feature = "config")]
pub use config::ConfigError;
pub use config::{DesignConfig, MAX_HOVER_DELAY_MS};
pub use design_mode::DesignModeStep;
pub use drag::DropOutcome;
pub use error::{Result, StoreError};
pub use event::{
    CATEGORY_DESIGN_MODE, CATEGORY_GRID, CATEGORY_NAVIGATE, CATEGORY_ONE_SCREEN_MODE, GridEvent,
    GridEventKind,
};
pub use history::GridHistory;
pub use resize::ResizeState;
pub use session::{BackupSlot, EphemeralRefs, GridSession, SessionSummary};
pub use store::GridStore;
pub use timer::{Clock, DeterministicClock, MonotonicClock, TimerId, TimerQueue, TimerTask};

pub use gridloom_layout::{Direction, GridTree, LayoutError, NodeId};
