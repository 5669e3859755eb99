//! ROUTE records.
//!
//! Every `<ROUTE fromNode fromField toNode toField/>` becomes a [`Route`]. Routes
//! whose destination field has an executable effect carry an [`AnimationRoute`]
//! that is bound to a runtime animation after the scene is built. Routes into
//! lights and `BooleanToggle` utilities carry a [`SwitchRoute`]. The rest stay
//! [`Route::Inert`].
//!
//! Only [`RouteBinding`] deserializes; bound routes are produced by resolution.

use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::ids::{AnimId, SwitchId};
use crate::semantics::FieldAction;

/// The four identifiers of one ROUTE statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBinding")]
pub struct RouteBinding {
    source_node: String,
    source_field: String,
    dest_node: String,
    dest_field: String,
}

#[derive(Deserialize)]
struct RawBinding {
    source_node: String,
    source_field: String,
    dest_node: String,
    dest_field: String,
}

impl TryFrom<RawBinding> for RouteBinding {
    type Error = RouteError;

    fn try_from(raw: RawBinding) -> Result<Self, Self::Error> {
        Self::new(raw.source_node, raw.source_field, raw.dest_node, raw.dest_field)
    }
}

fn require(value: impl Into<String>, which: &'static str) -> Result<String, RouteError> {
    let value = value.into();
    if value.is_empty() {
        return Err(RouteError::EmptyIdentifier { which });
    }
    Ok(value)
}

impl RouteBinding {
    /// Names are checked for emptiness only; they are resolved later because
    /// X3D allows a ROUTE to precede the node it targets.
    pub fn new(
        source_node: impl Into<String>,
        source_field: impl Into<String>,
        dest_node: impl Into<String>,
        dest_field: impl Into<String>,
    ) -> Result<Self, RouteError> {
        Ok(Self {
            source_node: require(source_node, "fromNode")?,
            source_field: require(source_field, "fromField")?,
            dest_node: require(dest_node, "toNode")?,
            dest_field: require(dest_field, "toField")?,
        })
    }

    pub fn source_node(&self) -> &str {
        &self.source_node
    }

    pub fn source_field(&self) -> &str {
        &self.source_field
    }

    pub fn dest_node(&self) -> &str {
        &self.dest_node
    }

    pub fn dest_field(&self) -> &str {
        &self.dest_field
    }

    /// True when this route listens to `node.field`.
    #[inline]
    pub fn is_from(&self, node: &str, field: &str) -> bool {
        self.source_node == node && self.source_field == field
    }
}

/// A ROUTE that starts, stops or seeks an animation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnimationRoute {
    binding: RouteBinding,
    action: FieldAction,
    bound: Option<AnimId>,
}

impl AnimationRoute {
    pub fn new(binding: RouteBinding, action: FieldAction) -> Self {
        Self {
            binding,
            action,
            bound: None,
        }
    }

    pub fn binding(&self) -> &RouteBinding {
        &self.binding
    }

    pub fn action(&self) -> FieldAction {
        self.action
    }

    /// Attach `handle`. Binding the same handle again is a no-op; a different
    /// handle is refused and the existing binding is kept.
    pub fn bind(&mut self, handle: AnimId) -> Result<(), RouteError> {
        match self.bound {
            Some(existing) if existing != handle => Err(RouteError::AlreadyBound {
                route: None,
                existing,
                attempted: handle,
            }),
            _ => {
                self.bound = Some(handle);
                Ok(())
            }
        }
    }

    pub fn current_handle(&self) -> Option<AnimId> {
        self.bound
    }
}

/// How a switch route treats incoming events.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchMode {
    /// Invert the destination once per activation (sensor → `BooleanToggle`).
    /// Holding the sensor active does not invert it again.
    Flip,
    /// Copy the event's truthiness into the destination (`isOver` → light,
    /// `BooleanToggle` → light).
    Follow,
}

/// A ROUTE whose destination is an on/off switch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SwitchRoute {
    binding: RouteBinding,
    mode: SwitchMode,
    bound: Option<SwitchId>,
}

impl SwitchRoute {
    pub fn new(binding: RouteBinding, mode: SwitchMode) -> Self {
        Self {
            binding,
            mode,
            bound: None,
        }
    }

    pub fn binding(&self) -> &RouteBinding {
        &self.binding
    }

    pub fn mode(&self) -> SwitchMode {
        self.mode
    }

    /// Same contract as [`AnimationRoute::bind`].
    pub fn bind(&mut self, switch: SwitchId) -> Result<(), RouteError> {
        match self.bound {
            Some(existing) if existing != switch => Err(RouteError::SwitchConflict {
                route: None,
                existing,
                attempted: switch,
            }),
            _ => {
                self.bound = Some(switch);
                Ok(())
            }
        }
    }

    pub fn current_switch(&self) -> Option<SwitchId> {
        self.bound
    }
}

/// Route kinds.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Route {
    Animation(AnimationRoute),
    Switch(SwitchRoute),
    Inert(RouteBinding),
}

impl Route {
    /// Choose the kind from the destination field's action.
    pub fn classify(binding: RouteBinding, action: FieldAction) -> Self {
        match action {
            FieldAction::Ignore => Route::Inert(binding),
            action => Route::Animation(AnimationRoute::new(binding, action)),
        }
    }

    pub fn binding(&self) -> &RouteBinding {
        match self {
            Route::Animation(a) => a.binding(),
            Route::Switch(s) => s.binding(),
            Route::Inert(b) => b,
        }
    }

    pub fn as_animation(&self) -> Option<&AnimationRoute> {
        match self {
            Route::Animation(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_animation_mut(&mut self) -> Option<&mut AnimationRoute> {
        match self {
            Route::Animation(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_switch(&self) -> Option<&SwitchRoute> {
        match self {
            Route::Switch(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_switch_mut(&mut self) -> Option<&mut SwitchRoute> {
        match self {
            Route::Switch(s) => Some(s),
            _ => None,
        }
    }
}

/// Resolution lifecycle of a route.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RouteState {
    Unresolved,
    Resolved,
    /// Destination missing; ignored by dispatch from now on.
    Unresolvable,
    /// Bind conflict during resolution; ignored by dispatch from now on.
    Dropped,
}

impl RouteState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, RouteState::Unresolvable | RouteState::Dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding() -> RouteBinding {
        RouteBinding::new("TouchSensor1", "isActive", "Box1Anim", "startTime").unwrap()
    }

    #[test]
    fn accessors_return_constructor_arguments() {
        let b = binding();
        assert_eq!(b.source_node(), "TouchSensor1");
        assert_eq!(b.source_field(), "isActive");
        assert_eq!(b.dest_node(), "Box1Anim");
        assert_eq!(b.dest_field(), "startTime");
        assert!(b.is_from("TouchSensor1", "isActive"));
        assert!(!b.is_from("TouchSensor1", "isOver"));
    }

    #[test]
    fn empty_identifier_fails_fast() {
        assert_eq!(
            RouteBinding::new("A", "", "B", "enabled"),
            Err(RouteError::EmptyIdentifier { which: "fromField" })
        );
        assert_eq!(
            RouteBinding::new("A", "isActive", "", "enabled"),
            Err(RouteError::EmptyIdentifier { which: "toNode" })
        );
    }

    #[test]
    fn bind_same_handle_is_idempotent() {
        let mut route = AnimationRoute::new(binding(), FieldAction::Enable);
        assert_eq!(route.current_handle(), None);
        route.bind(AnimId(3)).unwrap();
        route.bind(AnimId(3)).unwrap();
        assert_eq!(route.current_handle(), Some(AnimId(3)));
    }

    #[test]
    fn bind_conflict_keeps_first_handle() {
        let mut route = AnimationRoute::new(binding(), FieldAction::Enable);
        route.bind(AnimId(1)).unwrap();
        let err = route.bind(AnimId(2)).unwrap_err();
        assert_eq!(
            err,
            RouteError::AlreadyBound {
                route: None,
                existing: AnimId(1),
                attempted: AnimId(2)
            }
        );
        assert_eq!(route.current_handle(), Some(AnimId(1)));
    }

    #[test]
    fn classify_uses_action() {
        assert!(matches!(
            Route::classify(binding(), FieldAction::Enable),
            Route::Animation(_)
        ));
        let inert = Route::classify(binding(), FieldAction::Ignore);
        assert!(inert.as_animation().is_none());
        assert_eq!(inert.binding(), &binding());
    }

    #[test]
    fn deserializing_binding_checks_identifiers() {
        let json = r#"{"source_node":"","source_field":"","dest_node":"","dest_field":""}"#;
        assert!(serde_json::from_str::<RouteBinding>(json).is_err());

        let json = r#"{"source_node":"T","source_field":"isActive","dest_node":"C","dest_field":"startTime"}"#;
        let b: RouteBinding = serde_json::from_str(json).unwrap();
        assert_eq!(b.dest_field(), "startTime");
    }

    #[test]
    fn switch_bind_conflict_keeps_first_switch() {
        let mut route = SwitchRoute::new(binding(), SwitchMode::Flip);
        route.bind(SwitchId(0)).unwrap();
        route.bind(SwitchId(0)).unwrap();
        assert_eq!(
            route.bind(SwitchId(4)),
            Err(RouteError::SwitchConflict {
                route: None,
                existing: SwitchId(0),
                attempted: SwitchId(4)
            })
        );
        assert_eq!(route.current_switch(), Some(SwitchId(0)));
        assert!(Route::Switch(route).as_animation().is_none());
    }
}
