//! Per-session undo/redo over whole-tree snapshots.
//!
//! ```text
//! add(s3)                      back() x2                 add(s4)
//! [s0, s1, s2, s3]             [s0, s1, s2, s3]          [s0, s1, s4]
//!              ^ index               ^ index                     ^ index
//! ```
//!
//! Snapshots are shared through [`Arc`] so restoring clones the tree once
//! and keeps the archived copy untouched. Adding while the index is not at
//! the end drops the redo branch.

use std::sync::Arc;

use gridloom_layout::GridTree;

use crate::error::{Result, StoreError};

#[derive(Debug, Clone)]
pub struct GridHistory {
    entries: Vec<Arc<GridTree>>,
    index: usize,
    /// `0` keeps every snapshot.
    max_depth: usize,
}

impl GridHistory {
    /// History holding `initial` as its only entry.
    #[must_use]
    pub fn new(initial: GridTree, max_depth: usize) -> Self {
        Self {
            entries: vec![Arc::new(initial)],
            index: 0,
            max_depth,
        }
    }

    /// Append a snapshot after the current index, dropping the redo branch
    /// and evicting the oldest entries past the depth limit. Returns the new
    /// index.
    pub fn add(&mut self, snapshot: GridTree) -> usize {
        self.entries.truncate(self.index + 1);
        self.entries.push(Arc::new(snapshot));
        if self.max_depth > 0 && self.entries.len() > self.max_depth {
            let evicted = self.entries.len() - self.max_depth;
            self.entries.drain(..evicted);
        }
        self.index = self.entries.len() - 1;
        self.index
    }

    /// Step back one entry and return it.
    pub fn back(&mut self) -> Result<Arc<GridTree>> {
        if self.index == 0 {
            return Err(StoreError::HistoryOutOfBound {
                requested: -1,
                len: self.entries.len(),
            });
        }
        self.index -= 1;
        Ok(Arc::clone(&self.entries[self.index]))
    }

    /// Step forward one entry and return it.
    pub fn forward(&mut self) -> Result<Arc<GridTree>> {
        let requested = self.index + 1;
        let Some(entry) = self.entries.get(requested) else {
            return Err(StoreError::HistoryOutOfBound {
                requested: isize::try_from(requested).unwrap_or(isize::MAX),
                len: self.entries.len(),
            });
        };
        self.index = requested;
        Ok(Arc::clone(entry))
    }

    #[must_use]
    pub fn current(&self) -> &GridTree {
        &self.entries[self.index]
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    #[must_use]
    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(space: &str) -> GridTree {
        GridTree::new("h", space)
    }

    fn space(tree: &GridTree) -> String {
        tree.attr(tree.root(), gridloom_layout::ATTR_SPACE)
            .unwrap()
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn bounds_are_enforced() {
        let mut history = GridHistory::new(tree("0"), 0);
        assert!(matches!(
            history.back(),
            Err(StoreError::HistoryOutOfBound { requested: -1, len: 1 })
        ));
        assert!(matches!(
            history.forward(),
            Err(StoreError::HistoryOutOfBound { requested: 1, len: 1 })
        ));
        history.add(tree("1"));
        assert_eq!(space(&history.back().unwrap()), "0");
        assert_eq!(space(&history.forward().unwrap()), "1");
        assert!(history.forward().is_err());
    }

    #[test]
    fn adding_after_back_drops_redo_branch() {
        let mut history = GridHistory::new(tree("0"), 0);
        for n in 1..=3 {
            history.add(tree(&n.to_string()));
        }
        history.back().unwrap();
        assert!(history.can_go_forward());
        assert_eq!(history.add(tree("x")), 3);
        assert!(!history.can_go_forward());
        assert_eq!(history.len(), 4);
        assert_eq!(space(history.current()), "x");
    }

    #[test]
    fn depth_limit_evicts_oldest() {
        let mut history = GridHistory::new(tree("0"), 3);
        for n in 1..=5 {
            history.add(tree(&n.to_string()));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 2);
        history.back().unwrap();
        assert_eq!(space(&history.back().unwrap()), "3");
        assert!(!history.can_go_back());
    }
}
