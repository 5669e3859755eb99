//! Node namespace: DEF names and the animatable fields each node exposes.
//!
//! Routes refer to nodes by name only. The namespace is the lookup they are
//! resolved against; it is owned by the scene builder and routes keep nothing
//! but the ids it hands out.

use hashbrown::HashMap;

use crate::error::RouteError;
use crate::ids::{AnimId, IdAllocator, NodeId, SwitchId};

/// Lookup interface consumed by route resolution.
/// Hosts with their own scene database implement this and pass it to
/// [`crate::RouteTable::resolve`].
pub trait SceneNamespace {
    /// Exact, case-sensitive DEF name lookup.
    fn lookup_node(&self, name: &str) -> Option<NodeId>;

    /// Animation driven by writing to `field` on `node`.
    fn lookup_animatable_field(&self, node: NodeId, field: &str) -> Option<AnimId>;

    /// On/off switch owned by `node`. Namespaces without switchable nodes keep
    /// the default.
    fn lookup_switch(&self, _node: NodeId) -> Option<SwitchId> {
        None
    }
}

#[derive(Debug, Default)]
struct NodeEntry {
    name: String,
    fields: HashMap<String, AnimId>,
    switch: Option<SwitchId>,
}

/// In-memory namespace built while importing one scene.
#[derive(Debug, Default)]
pub struct NodeNamespace {
    ids: IdAllocator,
    by_name: HashMap<String, NodeId>,
    nodes: Vec<NodeEntry>,
}

impl NodeNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DEF name. Names must be unique within one scene.
    pub fn insert_node(&mut self, name: &str) -> Result<NodeId, RouteError> {
        if self.by_name.contains_key(name) {
            return Err(RouteError::DuplicateNode {
                name: name.to_string(),
            });
        }
        let id = self.ids.alloc_node();
        self.by_name.insert(name.to_string(), id);
        self.nodes.push(NodeEntry {
            name: name.to_string(),
            ..NodeEntry::default()
        });
        Ok(id)
    }

    /// Register a node without a DEF name. It can be referenced by id but
    /// never by a ROUTE.
    pub fn insert_anonymous(&mut self) -> NodeId {
        let id = self.ids.alloc_node();
        self.nodes.push(NodeEntry::default());
        id
    }

    fn entry_mut(&mut self, node: NodeId) -> Result<&mut NodeEntry, RouteError> {
        self.nodes
            .get_mut(node.0 as usize)
            .ok_or_else(|| RouteError::UnknownNode {
                name: format!("#{}", node.0),
            })
    }

    /// Expose `field` on `node` as driving `anim`. Re-exposing replaces the target.
    pub fn expose_field(
        &mut self,
        node: NodeId,
        field: &str,
        anim: AnimId,
    ) -> Result<(), RouteError> {
        self.entry_mut(node)?
            .fields
            .insert(field.to_string(), anim);
        Ok(())
    }

    /// Attach an on/off switch to `node`; every field of the node reaches it.
    pub fn expose_switch(&mut self, node: NodeId, switch: SwitchId) -> Result<(), RouteError> {
        self.entry_mut(node)?.switch = Some(switch);
        Ok(())
    }

    pub fn node_name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0 as usize).map(|n| n.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl SceneNamespace for NodeNamespace {
    fn lookup_node(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    fn lookup_animatable_field(&self, node: NodeId, field: &str) -> Option<AnimId> {
        self.nodes
            .get(node.0 as usize)
            .and_then(|n| n.fields.get(field).copied())
    }

    fn lookup_switch(&self, node: NodeId) -> Option<SwitchId> {
        self.nodes.get(node.0 as usize).and_then(|n| n.switch)
    }
}
