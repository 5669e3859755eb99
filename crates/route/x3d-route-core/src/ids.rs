//! Identifiers and simple allocators for namespace nodes, animations, switches and routes.

use serde::{Deserialize, Serialize};

/// Dense index of a DEF'd node inside a [`crate::NodeNamespace`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Handle of a runtime animation inside an [`crate::AnimationSet`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AnimId(pub u32);

/// Index of a route inside a [`crate::RouteTable`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RouteId(pub u32);

/// Slot of an on/off state inside a [`crate::SwitchBoard`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SwitchId(pub u32);

/// Monotonic allocator for the id newtypes above.
/// Dense indices double as vector positions in the owning containers.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_node: u32,
    next_anim: u32,
    next_switch: u32,
    next_route: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_node(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node = self.next_node.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_anim(&mut self) -> AnimId {
        let id = AnimId(self.next_anim);
        self.next_anim = self.next_anim.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_switch(&mut self) -> SwitchId {
        let id = SwitchId(self.next_switch);
        self.next_switch = self.next_switch.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_route(&mut self) -> RouteId {
        let id = RouteId(self.next_route);
        self.next_route = self.next_route.wrapping_add(1);
        id
    }
}
