//! Passive node payloads handed over by the parser.
//!
//! None of these carry behaviour; they ride along with the routes so hosts can
//! finish constructing scene content.

use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::ids::NodeId;

/// An `Inline` node: the scene node its content attaches under, plus the
/// `url` list in fallback order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawInline")]
pub struct InlineObject {
    pub node: NodeId,
    urls: Vec<String>,
}

#[derive(Deserialize)]
struct RawInline {
    node: NodeId,
    urls: Vec<String>,
}

impl TryFrom<RawInline> for InlineObject {
    type Error = RouteError;

    fn try_from(raw: RawInline) -> Result<Self, Self::Error> {
        Self::new(raw.node, raw.urls)
    }
}

impl InlineObject {
    pub fn new(node: NodeId, urls: Vec<String>) -> Result<Self, RouteError> {
        if urls.is_empty() {
            return Err(RouteError::EmptyInline);
        }
        Ok(Self { node, urls })
    }

    /// The url a loader must attempt first.
    pub fn first_url(&self) -> &str {
        &self.urls[0]
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }
}

/// Texture coordinate index triple for one face.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureCoordinates {
    pub coords: [u16; 3],
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexNormal {
    pub normal: [f32; 3],
}
