//! Runtime animation handles driven by routes.
//!
//! Routing only needs to start, stop and seek an animation, so the seam is the
//! small [`AnimationHandle`] trait. [`KeyframeAnimation`] is the handle the scene
//! builder produces for `TimeSensor → Interpolator → Transform` chains; hosts may
//! register their own implementations instead.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::ids::{AnimId, IdAllocator};
use crate::keyframe::{Arity, KeyframeTrack};
use crate::semantics::ends_with_ignore_case;

/// Playback control consumed by dispatch.
pub trait AnimationHandle: fmt::Debug {
    fn set_running(&mut self, running: bool);

    fn is_running(&self) -> bool;

    /// Move the playhead to `time` seconds. Handles without a seekable clock ignore it.
    fn seek(&mut self, _time: f64) {}

    /// Advance by `dt` seconds of wall time.
    fn advance(&mut self, _dt: f32) {}
}

/// Owns the runtime animations of one scene, addressed by [`AnimId`].
#[derive(Debug, Default)]
pub struct AnimationSet {
    ids: IdAllocator,
    items: Vec<Box<dyn AnimationHandle>>,
}

impl AnimationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: Box<dyn AnimationHandle>) -> AnimId {
        let id = self.ids.alloc_anim();
        self.items.push(handle);
        id
    }

    pub fn get(&self, id: AnimId) -> Option<&dyn AnimationHandle> {
        self.items.get(id.0 as usize).map(|h| h.as_ref())
    }

    pub fn get_mut(&mut self, id: AnimId) -> Option<&mut (dyn AnimationHandle + 'static)> {
        self.items.get_mut(id.0 as usize).map(|h| h.as_mut())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Step every animation.
    pub fn advance(&mut self, dt: f32) {
        for item in &mut self.items {
            item.advance(dt);
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RepeatMode {
    Once,
    Repeated,
}

/// Transform property a channel writes to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ChannelKind {
    Translation,
    Rotation,
    Scale,
}

impl ChannelKind {
    /// Pick the channel from a ROUTE destination field (`translation`,
    /// `set_rotation`, `orientation`, ...).
    pub fn from_field(field: &str) -> Result<Self, RouteError> {
        if ends_with_ignore_case(field, "translation") || ends_with_ignore_case(field, "position")
        {
            Ok(ChannelKind::Translation)
        } else if ends_with_ignore_case(field, "rotation")
            || ends_with_ignore_case(field, "orientation")
        {
            Ok(ChannelKind::Rotation)
        } else if ends_with_ignore_case(field, "scale") {
            Ok(ChannelKind::Scale)
        } else {
            Err(RouteError::UnsupportedField {
                field: field.to_string(),
            })
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            ChannelKind::Rotation => Arity::Four,
            ChannelKind::Translation | ChannelKind::Scale => Arity::Three,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VecKey {
    pub frame: f32,
    pub value: [f32; 3],
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotKey {
    pub frame: f32,
    /// Quaternion `[x, y, z, w]`.
    pub value: [f32; 4],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Channel {
    Translation(Vec<VecKey>),
    Rotation(Vec<RotKey>),
    Scale(Vec<VecKey>),
}

/// Convert an X3D axis-angle `(x, y, z, angle)` into a unit quaternion.
pub fn axis_angle_to_quat(x: f32, y: f32, z: f32, angle: f32) -> [f32; 4] {
    let len = (x * x + y * y + z * z).sqrt();
    if len <= f32::EPSILON {
        return [0.0, 0.0, 0.0, 1.0];
    }
    let half = angle * 0.5;
    let s = half.sin() / len;
    [x * s, y * s, z * s, half.cos()]
}

impl Channel {
    /// Build a channel from interpolator keys. Key times are normalized, so the
    /// frame of key `k` is `k * cycle_interval * fps`.
    pub fn build(
        kind: ChannelKind,
        track: &KeyframeTrack,
        cycle_interval: f32,
        fps: f32,
    ) -> Result<Self, RouteError> {
        let expected = kind.arity().len();
        if let Some(actual) = track.arity() {
            if actual != expected {
                return Err(RouteError::ArityMismatch { expected, actual });
            }
        }
        let scale = cycle_interval * fps;
        let vec_keys = || {
            track
                .iter()
                .map(|(k, v)| VecKey {
                    frame: k * scale,
                    value: [v[0], v[1], v[2]],
                })
                .collect::<Vec<_>>()
        };
        Ok(match kind {
            ChannelKind::Translation => Channel::Translation(vec_keys()),
            ChannelKind::Scale => Channel::Scale(vec_keys()),
            ChannelKind::Rotation => Channel::Rotation(
                track
                    .iter()
                    .map(|(k, v)| RotKey {
                        frame: k * scale,
                        value: axis_angle_to_quat(v[0], v[1], v[2], v[3]),
                    })
                    .collect(),
            ),
        })
    }

    pub fn kind(&self) -> ChannelKind {
        match self {
            Channel::Translation(_) => ChannelKind::Translation,
            Channel::Rotation(_) => ChannelKind::Rotation,
            Channel::Scale(_) => ChannelKind::Scale,
        }
    }

    pub fn key_count(&self) -> usize {
        match self {
            Channel::Translation(k) | Channel::Scale(k) => k.len(),
            Channel::Rotation(k) => k.len(),
        }
    }
}

/// A channel and the DEF name of the transform it animates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetChannel {
    pub target: String,
    pub channel: Channel,
}

/// Keyframe animation clocked by one TimeSensor, timed in frames.
/// Every interpolator the sensor drives contributes one channel.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeAnimation {
    pub name: String,
    pub repeat: RepeatMode,
    channels: Vec<TargetChannel>,
    fps: f32,
    duration_frames: f32,
    time_frames: f32,
    running: bool,
}

impl KeyframeAnimation {
    pub fn new(name: impl Into<String>, cycle_interval: f32, fps: f32, repeat: RepeatMode) -> Self {
        Self {
            name: name.into(),
            repeat,
            channels: Vec::new(),
            fps,
            duration_frames: cycle_interval * fps,
            time_frames: 0.0,
            running: false,
        }
    }

    pub fn add_channel(&mut self, target: impl Into<String>, channel: Channel) {
        self.channels.push(TargetChannel {
            target: target.into(),
            channel,
        });
    }

    pub fn channels(&self) -> &[TargetChannel] {
        &self.channels
    }

    #[inline]
    pub fn duration_frames(&self) -> f32 {
        self.duration_frames
    }

    #[inline]
    pub fn time_frames(&self) -> f32 {
        self.time_frames
    }
}

impl AnimationHandle for KeyframeAnimation {
    /// Starting a stopped animation restarts it from the first frame; starting a
    /// running one is a no-op.
    fn set_running(&mut self, running: bool) {
        if running && !self.running {
            self.time_frames = 0.0;
        }
        self.running = running;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn seek(&mut self, time: f64) {
        self.time_frames = (time as f32 * self.fps).clamp(0.0, self.duration_frames.max(0.0));
    }

    fn advance(&mut self, dt: f32) {
        if !self.running {
            return;
        }
        self.time_frames += dt * self.fps;
        if self.time_frames < self.duration_frames {
            return;
        }
        match self.repeat {
            RepeatMode::Once => {
                self.time_frames = self.duration_frames;
                self.running = false;
            }
            RepeatMode::Repeated if self.duration_frames > 0.0 => {
                self.time_frames %= self.duration_frames;
            }
            RepeatMode::Repeated => self.time_frames = 0.0,
        }
    }
}
