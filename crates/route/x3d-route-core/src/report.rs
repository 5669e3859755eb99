//! Load report: non-fatal problems found while building and resolving a scene.

use serde::{Deserialize, Serialize};

use crate::ids::{AnimId, RouteId, SwitchId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Diagnostic {
    /// Destination node or field not found; the route is ignored.
    Unresolved {
        route: RouteId,
        node: String,
        field: String,
    },
    /// Route was already bound elsewhere; it has been dropped.
    BindConflict {
        route: RouteId,
        existing: AnimId,
        attempted: AnimId,
    },
    /// Switch route was already bound to another switch; it has been dropped.
    SwitchConflict {
        route: RouteId,
        existing: SwitchId,
        attempted: SwitchId,
    },
    /// An animation chain could not be assembled.
    Skipped { node: String, reason: String },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl LoadReport {
    #[inline]
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn merge(&mut self, other: LoadReport) {
        self.diagnostics.extend(other.diagnostics);
    }

    #[inline]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn unresolved(&self) -> impl Iterator<Item = RouteId> + '_ {
        self.diagnostics.iter().filter_map(|d| match d {
            Diagnostic::Unresolved { route, .. } => Some(*route),
            _ => None,
        })
    }

    pub fn conflicts(&self) -> impl Iterator<Item = RouteId> + '_ {
        self.diagnostics.iter().filter_map(|d| match d {
            Diagnostic::BindConflict { route, .. }
            | Diagnostic::SwitchConflict { route, .. } => Some(*route),
            _ => None,
        })
    }
}
