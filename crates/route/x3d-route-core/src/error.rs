//! Error types for route construction, resolution and keyframe storage.

use thiserror::Error;

use crate::ids::{AnimId, RouteId, SwitchId};

/// Errors produced while building, resolving or querying routes.
///
/// Resolution failures (`UnresolvedReference`, `AlreadyBound`) are turned into
/// load diagnostics by [`crate::RouteTable::resolve`]; the rest are returned to
/// the caller directly.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum RouteError {
    /// A ROUTE endpoint identifier was empty.
    #[error("ROUTE has an empty {which} identifier")]
    EmptyIdentifier { which: &'static str },

    /// Destination node or field not present in the namespace.
    #[error("unresolved ROUTE target {node}.{field}")]
    UnresolvedReference { node: String, field: String },

    /// A route was bound to a second, different animation.
    #[error("route {route:?} already bound to {existing:?}, refusing {attempted:?}")]
    AlreadyBound {
        route: Option<RouteId>,
        existing: AnimId,
        attempted: AnimId,
    },

    /// A switch route was bound to a second, different switch.
    #[error("route {route:?} already bound to switch {existing:?}, refusing {attempted:?}")]
    SwitchConflict {
        route: Option<RouteId>,
        existing: SwitchId,
        attempted: SwitchId,
    },

    #[error("keyframe component {index} out of range (len {len})")]
    KeyframeIndex { index: usize, len: usize },

    #[error("keyframe arity mismatch: expected {expected}, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("key count mismatch: {keys} keys for {values} key values")]
    KeyCountMismatch { keys: usize, values: usize },

    /// Two nodes share one DEF name.
    #[error("duplicate DEF name '{name}'")]
    DuplicateNode { name: String },

    #[error("unknown route {route:?}")]
    UnknownRoute { route: RouteId },

    #[error("unknown node '{name}'")]
    UnknownNode { name: String },

    /// Destination field cannot be animated by a keyframe channel.
    #[error("field '{field}' is not an animatable transform field")]
    UnsupportedField { field: String },

    #[error("Inline node has no url")]
    EmptyInline,

    #[error("config error: {0}")]
    Config(String),
}

impl RouteError {
    /// Errors the loader reports and moves past.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedReference { .. }
                | Self::AlreadyBound { .. }
                | Self::SwitchConflict { .. }
                | Self::UnsupportedField { .. }
                | Self::UnknownNode { .. }
        )
    }
}
