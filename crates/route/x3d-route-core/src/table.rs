//! Route table: post-parse resolution and runtime event dispatch.
//!
//! Methods:
//! - add / push_switch (parse time), resolve / resolve_route (after the scene
//!   is built), dispatch / dispatch_switches (whenever a source field fires)

use hashbrown::HashMap;
use log::{debug, error, trace, warn};

use crate::animation::AnimationSet;
use crate::error::RouteError;
use crate::ids::{IdAllocator, RouteId};
use crate::namespace::SceneNamespace;
use crate::report::{Diagnostic, LoadReport};
use crate::route::{Route, RouteBinding, RouteState, SwitchMode, SwitchRoute};
use crate::semantics::{ActionTable, Effect, EventValue};
use crate::switch::SwitchBoard;

/// Output fields a `BooleanToggle` emits its new state on after flipping.
pub const TOGGLE_OUTPUTS: [&str; 2] = ["toggle_changed", "toggle"];

const MAX_SWITCH_HOPS: usize = 64;

fn unresolved(binding: &RouteBinding) -> RouteError {
    RouteError::UnresolvedReference {
        node: binding.dest_node().to_string(),
        field: binding.dest_field().to_string(),
    }
}

/// All ROUTEs of one scene plus their resolution state.
#[derive(Debug, Default)]
pub struct RouteTable {
    actions: ActionTable,
    ids: IdAllocator,
    routes: Vec<Route>,
    states: Vec<RouteState>,
    // source node -> source field -> routes
    by_source: HashMap<String, HashMap<String, Vec<RouteId>>>,
}

impl RouteTable {
    pub fn new(actions: ActionTable) -> Self {
        Self {
            actions,
            ..Self::default()
        }
    }

    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    /// Record one ROUTE statement. The kind is picked from the action table.
    pub fn add(
        &mut self,
        source_node: &str,
        source_field: &str,
        dest_node: &str,
        dest_field: &str,
    ) -> Result<RouteId, RouteError> {
        let binding = RouteBinding::new(source_node, source_field, dest_node, dest_field)?;
        Ok(self.push(binding))
    }

    pub fn push(&mut self, binding: RouteBinding) -> RouteId {
        let action = self.actions.action_for(binding.dest_field());
        self.insert(Route::classify(binding, action))
    }

    /// Record a ROUTE the caller knows ends at a light or `BooleanToggle`.
    pub fn push_switch(&mut self, binding: RouteBinding, mode: SwitchMode) -> RouteId {
        self.insert(Route::Switch(SwitchRoute::new(binding, mode)))
    }

    fn insert(&mut self, route: Route) -> RouteId {
        let id = self.ids.alloc_route();
        let binding = route.binding();
        self.by_source
            .entry(binding.source_node().to_string())
            .or_default()
            .entry(binding.source_field().to_string())
            .or_default()
            .push(id);
        self.routes.push(route);
        self.states.push(RouteState::Unresolved);
        id
    }

    pub fn get(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(id.0 as usize)
    }

    pub fn state(&self, id: RouteId) -> Option<RouteState> {
        self.states.get(id.0 as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RouteId, &Route)> {
        self.routes
            .iter()
            .enumerate()
            .map(|(i, r)| (RouteId(i as u32), r))
    }

    /// Routes listening to `node.field`, in declaration order.
    pub fn routes_from<'a>(
        &'a self,
        node: &str,
        field: &str,
    ) -> impl Iterator<Item = (RouteId, &'a Route)> + 'a {
        self.by_source
            .get(node)
            .and_then(|fields| fields.get(field))
            .into_iter()
            .flatten()
            .filter_map(move |id| self.get(*id).map(|r| (*id, r)))
    }

    /// Resolve one route against `ns`.
    ///
    /// Inert routes and routes already in a terminal state are returned as-is.
    /// A missing destination moves the route to `Unresolvable`; a bind conflict
    /// moves it to `Dropped`. Both are reported as errors so the caller can
    /// decide how loud to be.
    pub fn resolve_route(
        &mut self,
        id: RouteId,
        ns: &dyn SceneNamespace,
    ) -> Result<RouteState, RouteError> {
        let idx = id.0 as usize;
        let state = *self
            .states
            .get(idx)
            .ok_or(RouteError::UnknownRoute { route: id })?;
        if state.is_terminal() {
            return Ok(state);
        }

        match &mut self.routes[idx] {
            Route::Animation(route) => {
                let binding = route.binding();
                let found = ns
                    .lookup_node(binding.dest_node())
                    .and_then(|node| ns.lookup_animatable_field(node, binding.dest_field()));
                let Some(handle) = found else {
                    let err = unresolved(binding);
                    self.states[idx] = RouteState::Unresolvable;
                    return Err(err);
                };
                match route.bind(handle) {
                    Ok(()) => {
                        self.states[idx] = RouteState::Resolved;
                        Ok(RouteState::Resolved)
                    }
                    Err(RouteError::AlreadyBound {
                        existing,
                        attempted,
                        ..
                    }) => {
                        self.states[idx] = RouteState::Dropped;
                        Err(RouteError::AlreadyBound {
                            route: Some(id),
                            existing,
                            attempted,
                        })
                    }
                    Err(other) => Err(other),
                }
            }
            Route::Switch(route) => {
                let binding = route.binding();
                let found = ns
                    .lookup_node(binding.dest_node())
                    .and_then(|node| ns.lookup_switch(node));
                let Some(switch) = found else {
                    let err = unresolved(binding);
                    self.states[idx] = RouteState::Unresolvable;
                    return Err(err);
                };
                match route.bind(switch) {
                    Ok(()) => {
                        self.states[idx] = RouteState::Resolved;
                        Ok(RouteState::Resolved)
                    }
                    Err(RouteError::SwitchConflict {
                        existing,
                        attempted,
                        ..
                    }) => {
                        self.states[idx] = RouteState::Dropped;
                        Err(RouteError::SwitchConflict {
                            route: Some(id),
                            existing,
                            attempted,
                        })
                    }
                    Err(other) => Err(other),
                }
            }
            Route::Inert(_) => Ok(state),
        }
    }

    /// Resolve every route. Never fails; problems are collected in the report.
    /// Each route only reads its own record and `ns`, so the outcome does not
    /// depend on declaration order.
    pub fn resolve(&mut self, ns: &dyn SceneNamespace) -> LoadReport {
        let mut report = LoadReport::default();
        for idx in 0..self.routes.len() {
            let id = RouteId(idx as u32);
            match self.resolve_route(id, ns) {
                Ok(RouteState::Resolved) => {
                    let b = self.routes[idx].binding();
                    debug!(
                        "ROUTE {}.{} -> {}.{} resolved",
                        b.source_node(),
                        b.source_field(),
                        b.dest_node(),
                        b.dest_field()
                    );
                }
                Ok(_) => {}
                Err(RouteError::UnresolvedReference { node, field }) => {
                    warn!("ROUTE {id:?}: no animatable target {node}.{field}; ignoring");
                    report.push(Diagnostic::Unresolved {
                        route: id,
                        node,
                        field,
                    });
                }
                Err(RouteError::AlreadyBound {
                    existing,
                    attempted,
                    ..
                }) => {
                    error!(
                        "ROUTE {id:?}: already bound to {existing:?}, refusing {attempted:?}; dropping route"
                    );
                    report.push(Diagnostic::BindConflict {
                        route: id,
                        existing,
                        attempted,
                    });
                }
                Err(RouteError::SwitchConflict {
                    existing,
                    attempted,
                    ..
                }) => {
                    error!(
                        "ROUTE {id:?}: already bound to switch {existing:?}, refusing {attempted:?}; dropping route"
                    );
                    report.push(Diagnostic::SwitchConflict {
                        route: id,
                        existing,
                        attempted,
                    });
                }
                Err(other) => error!("ROUTE {id:?}: {other}"),
            }
        }
        report
    }

    /// Deliver an event fired by `source_node.source_field`.
    ///
    /// Applies the destination action of every resolved animation route
    /// listening to that field and returns the number of handle calls made.
    /// Anything else (unknown source, inert or unresolved routes, missing
    /// handles) is a silent no-op.
    pub fn dispatch(
        &self,
        source_node: &str,
        source_field: &str,
        value: EventValue,
        anims: &mut AnimationSet,
    ) -> usize {
        let mut calls = 0;
        for (id, route) in self.routes_from(source_node, source_field) {
            if self.state(id) != Some(RouteState::Resolved) {
                trace!("ROUTE {id:?} not resolved; skipping");
                continue;
            }
            let Some(anim_route) = route.as_animation() else {
                continue;
            };
            let Some(handle) = anim_route.current_handle() else {
                continue;
            };
            let Some(effect) = anim_route.action().effect(value) else {
                continue;
            };
            let Some(anim) = anims.get_mut(handle) else {
                trace!("ROUTE {id:?}: animation {handle:?} missing; skipping");
                continue;
            };
            match effect {
                Effect::SetRunning(running) => anim.set_running(running),
                Effect::Seek(time) => anim.seek(time),
            }
            calls += 1;
        }
        calls
    }

    /// Deliver an event to the switch routes listening to
    /// `source_node.source_field`; returns the number of switch writes.
    ///
    /// `Follow` routes copy the event's truthiness. `Flip` routes invert their
    /// `BooleanToggle` once per activation: `Bool(true)` flips only if the route
    /// is not already held, `Bool(false)` releases it, and every `Time` event
    /// flips. A flipped toggle re-emits its state on [`TOGGLE_OUTPUTS`], so
    /// `BooleanToggle → light` routes follow it.
    pub fn dispatch_switches(
        &self,
        source_node: &str,
        source_field: &str,
        value: EventValue,
        board: &mut SwitchBoard,
    ) -> usize {
        let mut calls = 0;
        let mut hops = 0;
        let mut pending = vec![(source_node.to_string(), source_field.to_string(), value)];
        while let Some((node, field, value)) = pending.pop() {
            hops += 1;
            if hops > MAX_SWITCH_HOPS {
                warn!("switch events from {source_node}.{source_field} exceeded {MAX_SWITCH_HOPS} hops; stopping");
                break;
            }
            for (id, route) in self.routes_from(&node, &field) {
                if self.state(id) != Some(RouteState::Resolved) {
                    continue;
                }
                let Some(switch_route) = route.as_switch() else {
                    continue;
                };
                let Some(target) = switch_route.current_switch() else {
                    continue;
                };
                match switch_route.mode() {
                    SwitchMode::Follow => {
                        if board.set(target, value.is_truthy()) {
                            calls += 1;
                        }
                    }
                    SwitchMode::Flip => {
                        match value {
                            EventValue::Bool(false) => {
                                board.release(id);
                                continue;
                            }
                            EventValue::Bool(true) if !board.latch(id) => {
                                trace!("ROUTE {id:?} still held; not flipping");
                                continue;
                            }
                            _ => {}
                        }
                        let Some(on) = board.flip(target) else {
                            continue;
                        };
                        calls += 1;
                        let toggle = switch_route.binding().dest_node();
                        for out in TOGGLE_OUTPUTS {
                            pending.push((toggle.to_string(), out.to_string(), EventValue::Bool(on)));
                        }
                    }
                }
            }
        }
        calls
    }
}
