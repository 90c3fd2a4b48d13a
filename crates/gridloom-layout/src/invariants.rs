//! Structural diagnostics over a grid tree.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::node::{
    ATTR_HAS_PLACEHOLDERS, ATTR_HAS_RESIZERS, CellType, GridTree, NodeId, NodeKind,
};

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantCode {
    MissingNode,
    ParentMismatch,
    MisplacedChild,
    EmptyRow,
    EmptyCell,
    CellContentMismatch,
    DecorationConflict,
    MisplacedDecorationFlag,
    DuplicateId,
    ModuleIndexGap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantIssue {
    pub code: InvariantCode,
    pub node: Option<NodeId>,
    pub message: String,
}

/// Findings for the attached part of a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantReport {
    pub issues: Vec<InvariantIssue>,
}

impl InvariantReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn has(&self, code: InvariantCode) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }

    /// Distinct codes, sorted.
    #[must_use]
    pub fn codes(&self) -> Vec<InvariantCode> {
        let mut codes: Vec<_> = self.issues.iter().map(|issue| issue.code).collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }

    fn push(&mut self, code: InvariantCode, node: Option<NodeId>, message: impl Into<String>) {
        self.issues.push(InvariantIssue {
            code,
            node,
            message: message.into(),
        });
    }
}

impl GridTree {
    /// Inspect the tree and report every broken structural invariant.
    ///
    /// Placeholder cells and rows are allowed to be empty. Ids are expected
    /// to be unique and module indexes, where present, dense.
    #[must_use]
    pub fn invariant_report(&self) -> InvariantReport {
        let mut report = InvariantReport::default();
        let order = match self.descendants(self.root()) {
            Ok(order) => order,
            Err(err) => {
                report.push(InvariantCode::MissingNode, None, err.to_string());
                return report;
            }
        };

        let mut ids: FxHashMap<&str, NodeId> = FxHashMap::default();
        let mut module_indexes = Vec::new();
        for &id in &order {
            let Ok(record) = self.node(id) else {
                continue;
            };
            for &child in &record.children {
                match self.node(child) {
                    Ok(child_record) if child_record.parent != Some(id) => report.push(
                        InvariantCode::ParentMismatch,
                        Some(child),
                        format!("{child} is listed under {id} but points at {:?}", child_record.parent),
                    ),
                    Ok(child_record) if !child_allowed(record.kind, child_record.kind) => report
                        .push(
                            InvariantCode::MisplacedChild,
                            Some(child),
                            format!(
                                "a {} cannot sit under a {}",
                                child_record.kind.element(),
                                record.kind.element()
                            ),
                        ),
                    Ok(_) => {}
                    Err(err) => {
                        report.push(InvariantCode::MissingNode, Some(child), err.to_string());
                    }
                }
            }

            let content_count = record
                .children
                .iter()
                .filter(|&&child| self.kind(child).ok() == Some(NodeKind::Content))
                .count();
            match record.kind {
                NodeKind::Row { placeholder: false } if record.children.is_empty() => {
                    report.push(InvariantCode::EmptyRow, Some(id), format!("row {id} has no cells"));
                }
                NodeKind::Cell { cell_type } => {
                    let rows = record.children.len() - content_count;
                    match cell_type {
                        CellType::Module if content_count != 1 || rows != 0 => report.push(
                            InvariantCode::CellContentMismatch,
                            Some(id),
                            format!("module cell {id} holds {content_count} content leaves and {rows} rows"),
                        ),
                        CellType::Grid if rows == 0 => report.push(
                            InvariantCode::EmptyCell,
                            Some(id),
                            format!("grid cell {id} has no rows"),
                        ),
                        CellType::Placeholder if content_count > 1 || rows > 0 => report.push(
                            InvariantCode::CellContentMismatch,
                            Some(id),
                            format!("placeholder cell {id} holds more than one content leaf"),
                        ),
                        _ => {}
                    }
                }
                _ => {}
            }

            if id != self.root()
                && (record.flag(ATTR_HAS_PLACEHOLDERS) || record.flag(ATTR_HAS_RESIZERS))
            {
                report.push(
                    InvariantCode::MisplacedDecorationFlag,
                    Some(id),
                    format!("decoration flag on non-root node {id}"),
                );
            }

            if let Some(value) = record.attr(crate::node::ATTR_ID)
                && let Some(first) = ids.insert(value, id)
            {
                report.push(
                    InvariantCode::DuplicateId,
                    Some(id),
                    format!("id {value:?} is used by {first} and {id}"),
                );
            }

            if record.kind.is_module_cell()
                && let Ok(Some(index)) = self.module_index(id)
            {
                module_indexes.push((id, index));
            }
        }

        if self.has_placeholders() && self.has_resizers() {
            report.push(
                InvariantCode::DecorationConflict,
                Some(self.root()),
                "placeholders and resizers are both flagged",
            );
        }

        if !module_indexes.is_empty() {
            for (expected, &(cell, index)) in module_indexes.iter().enumerate() {
                if index != expected {
                    report.push(
                        InvariantCode::ModuleIndexGap,
                        Some(cell),
                        format!("module cell {cell} has index {index}, expected {expected}"),
                    );
                    break;
                }
            }
        }
        report
    }
}

fn child_allowed(parent: NodeKind, child: NodeKind) -> bool {
    match parent {
        NodeKind::Grid
        | NodeKind::Cell {
            cell_type: CellType::Grid,
        } => child.is_row() || child.is_resizer(),
        NodeKind::Row { .. } => child.is_cell() || child.is_resizer(),
        NodeKind::Cell { .. } => child == NodeKind::Content,
        NodeKind::Resizer { .. } | NodeKind::Content => false,
    }
}
