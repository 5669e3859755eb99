//! X3D ROUTE core (engine-agnostic)
//!
//! Wires named output fields of parsed X3D nodes to the animations they control.
//! The parser hands over node data and ROUTE statements; this crate resolves the
//! routes against a node namespace once the scene is built and then turns sensor
//! events into start/stop/seek calls on runtime animation handles.
//!
//! Sensor routes into lights and `BooleanToggle` utilities switch on/off state on
//! a [`SwitchBoard`] instead of driving an animation.
//!
//! Typical flow: [`SceneBuilder::build`] → [`BuiltScene::fire`] per sensor event →
//! [`BuiltScene::advance`] per frame. Hosts with their own scene database can use
//! [`RouteTable`] directly with a custom [`SceneNamespace`] and [`AnimationHandle`].

pub mod animation;
pub mod builder;
pub mod config;
pub mod error;
pub mod ids;
pub mod keyframe;
pub mod namespace;
pub mod report;
pub mod route;
pub mod scene_refs;
pub mod semantics;
pub mod switch;
pub mod table;

// Re-exports for consumers (hosts)
pub use animation::{
    AnimationHandle, AnimationSet, Channel, ChannelKind, KeyframeAnimation, RepeatMode,
};
pub use builder::{BuiltScene, SceneBuilder, SceneDocument};
pub use config::Config;
pub use error::RouteError;
pub use ids::{AnimId, NodeId, RouteId, SwitchId};
pub use keyframe::{Arity, KeyframeSet, KeyframeTrack};
pub use namespace::{NodeNamespace, SceneNamespace};
pub use report::{Diagnostic, LoadReport};
pub use route::{AnimationRoute, Route, RouteBinding, RouteState, SwitchMode, SwitchRoute};
pub use scene_refs::{InlineObject, TextureCoordinates, VertexNormal};
pub use semantics::{ActionTable, EventValue, FieldAction, FieldMatch, FieldRule};
pub use switch::SwitchBoard;
pub use table::RouteTable;
