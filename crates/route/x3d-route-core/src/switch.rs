//! On/off state driven by sensor routes.
//!
//! Lights (or any host item with an enable flag) and `BooleanToggle` event
//! utilities each own one slot. Hosts read the slots back after firing events
//! and apply them to their scene objects.

use hashbrown::HashSet;

use crate::ids::{IdAllocator, RouteId, SwitchId};

#[derive(Debug, Default)]
pub struct SwitchBoard {
    ids: IdAllocator,
    states: Vec<bool>,
    // flip routes whose sensor is still active
    held: HashSet<RouteId>,
}

impl SwitchBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, on: bool) -> SwitchId {
        let id = self.ids.alloc_switch();
        self.states.push(on);
        id
    }

    pub fn get(&self, id: SwitchId) -> Option<bool> {
        self.states.get(id.0 as usize).copied()
    }

    /// Returns `false` when `id` is unknown.
    pub fn set(&mut self, id: SwitchId, on: bool) -> bool {
        match self.states.get_mut(id.0 as usize) {
            Some(slot) => {
                *slot = on;
                true
            }
            None => false,
        }
    }

    /// Invert a slot and return its new state.
    pub fn flip(&mut self, id: SwitchId) -> Option<bool> {
        let slot = self.states.get_mut(id.0 as usize)?;
        *slot = !*slot;
        Some(*slot)
    }

    /// Mark `route` as held. Returns `true` only on the first activation
    /// since the last [`SwitchBoard::release`].
    pub fn latch(&mut self, route: RouteId) -> bool {
        self.held.insert(route)
    }

    pub fn release(&mut self, route: RouteId) {
        self.held.remove(&route);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
