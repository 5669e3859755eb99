//! Keyframe value storage.
//!
//! A [`KeyframeSet`] is one `keyValue` tuple of an interpolator (3 components for
//! position/scale, 4 for axis-angle orientation). A [`KeyframeTrack`] pairs the
//! interpolator's `key` times with one set per key and enforces that the two
//! line up.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::RouteError;

/// Tuple widths accepted by keyframe animations.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arity {
    Three,
    Four,
}

impl Arity {
    #[inline]
    pub fn len(self) -> usize {
        match self {
            Arity::Three => 3,
            Arity::Four => 4,
        }
    }

    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            3 => Some(Arity::Three),
            4 => Some(Arity::Four),
            _ => None,
        }
    }
}

/// One keyframe value. Always an owned copy of the caller's data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyframeSet {
    values: Vec<f32>,
}

impl KeyframeSet {
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            values: vec![x, y, z],
        }
    }

    pub fn from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self {
            values: vec![x, y, z, w],
        }
    }

    pub fn from_slice(values: &[f32]) -> Self {
        Self {
            values: values.to_vec(),
        }
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.values.len()
    }

    /// Checked component access.
    pub fn component(&self, index: usize) -> Result<f32, RouteError> {
        self.values
            .get(index)
            .copied()
            .ok_or(RouteError::KeyframeIndex {
                index,
                len: self.values.len(),
            })
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

impl Index<usize> for KeyframeSet {
    type Output = f32;

    /// Panics when `index >= arity()`.
    fn index(&self, index: usize) -> &f32 {
        &self.values[index]
    }
}

/// Interpolator keys paired with their keyframe values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyframeTrack {
    keys: Vec<f32>,
    values: Vec<KeyframeSet>,
}

impl KeyframeTrack {
    /// Validate that there is one value per key and that all values share an arity.
    pub fn new(keys: Vec<f32>, values: Vec<KeyframeSet>) -> Result<Self, RouteError> {
        if keys.len() != values.len() {
            return Err(RouteError::KeyCountMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }
        if let Some(first) = values.first() {
            let expected = first.arity();
            if let Some(bad) = values.iter().find(|v| v.arity() != expected) {
                return Err(RouteError::ArityMismatch {
                    expected,
                    actual: bad.arity(),
                });
            }
        }
        Ok(Self { keys, values })
    }

    /// Build from a flat `keyValue` list as written in the X3D source.
    pub fn from_flat(keys: Vec<f32>, flat: &[f32], arity: Arity) -> Result<Self, RouteError> {
        let width = arity.len();
        if flat.len() != keys.len() * width {
            return Err(RouteError::KeyCountMismatch {
                keys: keys.len(),
                values: flat.len() / width,
            });
        }
        let values = flat.chunks_exact(width).map(KeyframeSet::from_slice).collect();
        Self::new(keys, values)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[f32] {
        &self.keys
    }

    pub fn values(&self) -> &[KeyframeSet] {
        &self.values
    }

    /// Arity shared by every value, `None` for an empty track.
    pub fn arity(&self) -> Option<usize> {
        self.values.first().map(KeyframeSet::arity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f32, &KeyframeSet)> {
        self.keys.iter().copied().zip(self.values.iter())
    }
}
