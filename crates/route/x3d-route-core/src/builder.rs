//! Scene builder.
//!
//! Takes the node data and ROUTE statements an X3D parser extracted from one
//! file and produces a runnable [`BuiltScene`]:
//!
//! 1. every DEF name goes into a [`NodeNamespace`]
//! 2. every ROUTE goes into a [`RouteTable`] (forward references are fine)
//! 3. `TimeSensor → Interpolator → Transform` ROUTE chains become one
//!    [`KeyframeAnimation`] per TimeSensor, reachable through the sensor's
//!    input fields
//! 4. lights and `BooleanToggle` utilities get a slot on the [`SwitchBoard`];
//!    sensor routes into them become switch routes
//! 5. the route table is resolved against the finished namespace

use hashbrown::{HashMap, HashSet};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::animation::{
    AnimationHandle, AnimationSet, Channel, ChannelKind, KeyframeAnimation, RepeatMode,
};
use crate::config::Config;
use crate::error::RouteError;
use crate::keyframe::{Arity, KeyframeTrack};
use crate::namespace::{NodeNamespace, SceneNamespace};
use crate::report::{Diagnostic, LoadReport};
use crate::route::{RouteBinding, SwitchMode};
use crate::scene_refs::InlineObject;
use crate::semantics::EventValue;
use crate::switch::SwitchBoard;
use crate::table::RouteTable;

/// TimeSensor fields that control its animation.
pub const TIME_SENSOR_INPUTS: [&str; 10] = [
    "startTime",
    "set_startTime",
    "stopTime",
    "set_stopTime",
    "pauseTime",
    "set_pauseTime",
    "resumeTime",
    "set_resumeTime",
    "enabled",
    "set_enabled",
];

fn default_true() -> bool {
    true
}

fn default_cycle_interval() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformNode {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSensorNode {
    pub name: String,
    /// Seconds per cycle.
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval: f32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, rename = "loop")]
    pub looping: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum InterpolatorKind {
    Position,
    Orientation,
}

impl InterpolatorKind {
    pub fn arity(self) -> Arity {
        match self {
            InterpolatorKind::Position => Arity::Three,
            InterpolatorKind::Orientation => Arity::Four,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolatorNode {
    pub name: String,
    pub kind: InterpolatorKind,
    #[serde(default)]
    pub key: Vec<f32>,
    /// Flat `keyValue` list, `arity` floats per key.
    #[serde(default)]
    pub key_value: Vec<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TouchSensorNode {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
}

/// X3D `BooleanToggle` event utility.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BooleanToggleNode {
    pub name: String,
    #[serde(default)]
    pub toggle: bool,
}

/// A DEF'd light; its `on` flag is what sensor routes switch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightNode {
    pub name: String,
    #[serde(default = "default_true")]
    pub on: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InlineNode {
    /// DEF name, empty when the node has none.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Vec<String>,
}

/// One `<ROUTE/>`. Missing attributes deserialize as empty and are rejected
/// when the route is built.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStatement {
    #[serde(default)]
    pub from_node: String,
    #[serde(default)]
    pub from_field: String,
    #[serde(default)]
    pub to_node: String,
    #[serde(default)]
    pub to_field: String,
}

/// Parsed node data for one scene.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    #[serde(default)]
    pub transforms: Vec<TransformNode>,
    #[serde(default)]
    pub time_sensors: Vec<TimeSensorNode>,
    #[serde(default)]
    pub interpolators: Vec<InterpolatorNode>,
    #[serde(default)]
    pub touch_sensors: Vec<TouchSensorNode>,
    #[serde(default)]
    pub boolean_toggles: Vec<BooleanToggleNode>,
    #[serde(default)]
    pub lights: Vec<LightNode>,
    #[serde(default)]
    pub inlines: Vec<InlineNode>,
    #[serde(default)]
    pub routes: Vec<RouteStatement>,
}

impl SceneDocument {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A scene ready for interaction.
#[derive(Debug)]
pub struct BuiltScene {
    pub namespace: NodeNamespace,
    pub animations: AnimationSet,
    pub switches: SwitchBoard,
    pub routes: RouteTable,
    pub inlines: Vec<InlineObject>,
    pub report: LoadReport,
}

impl BuiltScene {
    /// Deliver a sensor event; returns the number of animation calls and
    /// switch writes made.
    pub fn fire(&mut self, node: &str, field: &str, value: EventValue) -> usize {
        self.routes.dispatch(node, field, value, &mut self.animations)
            + self
                .routes
                .dispatch_switches(node, field, value, &mut self.switches)
    }

    pub fn advance(&mut self, dt: f32) {
        self.animations.advance(dt);
    }

    /// Running state of the animation behind a TimeSensor.
    pub fn is_running(&self, time_sensor: &str) -> Option<bool> {
        let node = self.namespace.lookup_node(time_sensor)?;
        let anim = self.namespace.lookup_animatable_field(node, "enabled")?;
        self.animations.get(anim).map(|a| a.is_running())
    }

    /// Current state of a light or `BooleanToggle`.
    pub fn is_on(&self, name: &str) -> Option<bool> {
        let node = self.namespace.lookup_node(name)?;
        self.switches.get(self.namespace.lookup_switch(node)?)
    }
}

#[derive(Debug, Default)]
pub struct SceneBuilder {
    cfg: Config,
}

impl SceneBuilder {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    /// Build and resolve `doc`.
    ///
    /// Duplicate DEF names and ROUTEs with empty endpoints are fatal. Chains
    /// that cannot be animated and routes that do not resolve end up in
    /// [`BuiltScene::report`].
    pub fn build(&self, doc: &SceneDocument) -> Result<BuiltScene, RouteError> {
        let mut report = LoadReport::default();
        let mut namespace = NodeNamespace::new();

        for t in &doc.transforms {
            namespace.insert_node(&t.name)?;
        }
        for s in &doc.time_sensors {
            namespace.insert_node(&s.name)?;
        }
        for i in &doc.interpolators {
            namespace.insert_node(&i.name)?;
        }
        for s in &doc.touch_sensors {
            namespace.insert_node(&s.name)?;
        }

        let mut switches = SwitchBoard::new();
        let switchable = doc
            .boolean_toggles
            .iter()
            .map(|t| (t.name.as_str(), t.toggle))
            .chain(doc.lights.iter().map(|l| (l.name.as_str(), l.on)));
        for (name, on) in switchable {
            let node = namespace.insert_node(name)?;
            namespace.expose_switch(node, switches.insert(on))?;
        }

        let mut inlines = Vec::with_capacity(doc.inlines.len());
        for inline in &doc.inlines {
            let node = if inline.name.is_empty() {
                namespace.insert_anonymous()
            } else {
                namespace.insert_node(&inline.name)?
            };
            match InlineObject::new(node, inline.url.clone()) {
                Ok(obj) => inlines.push(obj),
                Err(e) => {
                    warn!("Inline '{}': {e}", inline.name);
                    report.push(Diagnostic::Skipped {
                        node: inline.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut routes = RouteTable::new(self.cfg.actions.clone());
        for r in &doc.routes {
            let binding = RouteBinding::new(&r.from_node, &r.from_field, &r.to_node, &r.to_field)?;
            match Self::switch_mode(doc, r) {
                Some(mode) => routes.push_switch(binding, mode),
                None => routes.push(binding),
            };
        }

        let mut clips = self.assemble_clips(doc, &mut report);

        let mut animations = AnimationSet::new();
        for sensor in &doc.time_sensors {
            let Some(mut clip) = clips.remove(sensor.name.as_str()) else {
                continue;
            };
            let controlled = routes.iter().any(|(_, r)| {
                r.as_animation().is_some() && r.binding().dest_node() == sensor.name
            });
            if self.cfg.autostart_unrouted && sensor.enabled && !controlled {
                clip.set_running(true);
            }
            debug!(
                "animation '{}': {} channel(s), running={}",
                clip.name,
                clip.channels().len(),
                clip.is_running()
            );
            let anim = animations.insert(Box::new(clip));
            let node = namespace
                .lookup_node(&sensor.name)
                .ok_or_else(|| RouteError::UnknownNode {
                    name: sensor.name.clone(),
                })?;
            for field in TIME_SENSOR_INPUTS {
                namespace.expose_field(node, field, anim)?;
            }
        }

        report.merge(routes.resolve(&namespace));

        Ok(BuiltScene {
            namespace,
            animations,
            switches,
            routes,
            inlines,
            report,
        })
    }

    /// One clip per TimeSensor, with a channel for every
    /// `Interpolator.value_changed → Transform.<field>` route whose
    /// interpolator the sensor drives.
    fn assemble_clips<'d>(
        &self,
        doc: &'d SceneDocument,
        report: &mut LoadReport,
    ) -> HashMap<&'d str, KeyframeAnimation> {
        let fps = self.cfg.frames_per_second;
        let sensors: HashMap<&str, &TimeSensorNode> = doc
            .time_sensors
            .iter()
            .map(|s| (s.name.as_str(), s))
            .collect();
        let interps: HashMap<&str, &InterpolatorNode> = doc
            .interpolators
            .iter()
            .map(|i| (i.name.as_str(), i))
            .collect();
        let transforms: HashSet<&str> = doc.transforms.iter().map(|t| t.name.as_str()).collect();

        // interpolator -> TimeSensor feeding its set_fraction
        let mut driver: HashMap<&str, &str> = HashMap::new();
        for r in &doc.routes {
            if sensors.contains_key(r.from_node.as_str()) && interps.contains_key(r.to_node.as_str())
            {
                driver
                    .entry(r.to_node.as_str())
                    .or_insert(r.from_node.as_str());
            }
        }

        let mut clips: HashMap<&str, KeyframeAnimation> = doc
            .time_sensors
            .iter()
            .map(|s| {
                let repeat = if s.looping {
                    RepeatMode::Repeated
                } else {
                    RepeatMode::Once
                };
                let clip = KeyframeAnimation::new(
                    format!("{}_KeyFrameAnimation", s.name),
                    s.cycle_interval,
                    fps,
                    repeat,
                );
                (s.name.as_str(), clip)
            })
            .collect();

        for r in &doc.routes {
            let Some(interp) = interps.get(r.from_node.as_str()) else {
                continue;
            };
            if !transforms.contains(r.to_node.as_str()) {
                warn!(
                    "{}.{} is not a Transform, possibly not found in the scene; not animated",
                    r.to_node, r.to_field
                );
                report.push(Diagnostic::Skipped {
                    node: r.to_node.clone(),
                    reason: format!("'{}' is not a Transform", r.to_node),
                });
                continue;
            }
            let Some(sensor_name) = driver.get(interp.name.as_str()) else {
                warn!("interpolator '{}' has no TimeSensor; skipping", interp.name);
                report.push(Diagnostic::Skipped {
                    node: interp.name.clone(),
                    reason: "no TimeSensor drives this interpolator".into(),
                });
                continue;
            };
            let cycle_interval = sensors[sensor_name].cycle_interval;
            match Self::channel_for(interp, &r.to_field, cycle_interval, fps) {
                Ok(channel) => {
                    if let Some(clip) = clips.get_mut(sensor_name) {
                        clip.add_channel(r.to_node.as_str(), channel);
                    }
                }
                Err(e) => {
                    warn!("{}.{}: {e}; not animated", r.to_node, r.to_field);
                    report.push(Diagnostic::Skipped {
                        node: r.to_node.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        clips
    }

    /// Sensor → BooleanToggle flips the toggle; sensor or toggle → light
    /// follows the incoming value.
    fn switch_mode(doc: &SceneDocument, r: &RouteStatement) -> Option<SwitchMode> {
        let is_sensor = |name: &str| doc.touch_sensors.iter().any(|s| s.name == name);
        let is_toggle = |name: &str| doc.boolean_toggles.iter().any(|t| t.name == name);
        let is_light = |name: &str| doc.lights.iter().any(|l| l.name == name);

        let from_sensor = is_sensor(&r.from_node);
        if from_sensor && is_toggle(&r.to_node) {
            Some(SwitchMode::Flip)
        } else if (from_sensor || is_toggle(&r.from_node)) && is_light(&r.to_node) {
            Some(SwitchMode::Follow)
        } else {
            None
        }
    }

    fn channel_for(
        interp: &InterpolatorNode,
        field: &str,
        cycle_interval: f32,
        fps: f32,
    ) -> Result<Channel, RouteError> {
        let kind = ChannelKind::from_field(field)?;
        let track =
            KeyframeTrack::from_flat(interp.key.clone(), &interp.key_value, interp.kind.arity())?;
        Channel::build(kind, &track, cycle_interval, fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> SceneDocument {
        SceneDocument {
            transforms: vec![TransformNode { name: "Box".into() }],
            time_sensors: vec![TimeSensorNode {
                name: "Clock".into(),
                cycle_interval: 2.0,
                enabled: true,
                looping: false,
            }],
            interpolators: vec![InterpolatorNode {
                name: "Mover".into(),
                kind: InterpolatorKind::Position,
                key: vec![0.0, 1.0],
                key_value: vec![0.0, 0.0, 0.0, 0.0, 2.0, 0.0],
            }],
            routes: vec![
                RouteStatement {
                    from_node: "Clock".into(),
                    from_field: "fraction_changed".into(),
                    to_node: "Mover".into(),
                    to_field: "set_fraction".into(),
                },
                RouteStatement {
                    from_node: "Mover".into(),
                    from_field: "value_changed".into(),
                    to_node: "Box".into(),
                    to_field: "set_translation".into(),
                },
            ],
            ..SceneDocument::default()
        }
    }

    #[test]
    fn unrouted_clock_autostarts() {
        let scene = SceneBuilder::default().build(&doc()).unwrap();
        assert!(scene.report.is_clean(), "{:?}", scene.report);
        assert_eq!(scene.animations.len(), 1);
        assert_eq!(scene.is_running("Clock"), Some(true));
    }

    #[test]
    fn autostart_can_be_disabled() {
        let cfg = Config {
            autostart_unrouted: false,
            ..Config::default()
        };
        let scene = SceneBuilder::new(cfg).build(&doc()).unwrap();
        assert_eq!(scene.is_running("Clock"), Some(false));
    }

    #[test]
    fn duplicate_def_is_fatal() {
        let mut d = doc();
        d.transforms.push(TransformNode {
            name: "Clock".into(),
        });
        assert!(matches!(
            SceneBuilder::default().build(&d),
            Err(RouteError::DuplicateNode { .. })
        ));
    }

    #[test]
    fn route_with_missing_endpoint_is_fatal() {
        let mut d = doc();
        d.routes.push(RouteStatement {
            from_node: "Clock".into(),
            ..RouteStatement::default()
        });
        assert_eq!(
            SceneBuilder::default().build(&d).unwrap_err(),
            RouteError::EmptyIdentifier { which: "fromField" }
        );
    }

    #[test]
    fn interpolator_into_non_transform_is_skipped() {
        let mut d = doc();
        d.routes[1].to_node = "Nowhere".into();
        let scene = SceneBuilder::default().build(&d).unwrap();
        assert!(matches!(
            scene.report.diagnostics.as_slice(),
            [Diagnostic::Skipped { node, .. }] if node == "Nowhere"
        ));
    }

    #[test]
    fn hover_route_into_light_follows_sensor() {
        let mut d = doc();
        d.touch_sensors.push(TouchSensorNode {
            name: "Pad".into(),
            enabled: true,
            description: String::new(),
        });
        d.lights.push(LightNode {
            name: "Glow".into(),
            on: false,
        });
        d.routes.push(RouteStatement {
            from_node: "Pad".into(),
            from_field: "isOver".into(),
            to_node: "Glow".into(),
            to_field: "on".into(),
        });
        let mut scene = SceneBuilder::default().build(&d).unwrap();
        assert!(scene.report.is_clean(), "{:?}", scene.report);
        assert_eq!(scene.is_on("Glow"), Some(false));
        assert_eq!(scene.fire("Pad", "isOver", EventValue::Bool(true)), 1);
        assert_eq!(scene.is_on("Glow"), Some(true));
        scene.fire("Pad", "isOver", EventValue::Bool(false));
        assert_eq!(scene.is_on("Glow"), Some(false));
        assert_eq!(scene.is_on("Clock"), None);
    }

    #[test]
    fn unsupported_target_field_is_skipped() {
        let mut d = doc();
        d.routes[1].to_field = "diffuseColor".into();
        let scene = SceneBuilder::default().build(&d).unwrap();
        assert!(matches!(
            scene.report.diagnostics.as_slice(),
            [Diagnostic::Skipped { node, .. }] if node == "Box"
        ));
    }
}
