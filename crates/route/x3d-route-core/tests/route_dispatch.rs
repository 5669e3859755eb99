use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;
use x3d_route_core::{
    ActionTable, AnimId, AnimationHandle, AnimationSet, EventValue, FieldAction, FieldRule,
    NodeNamespace, RouteError, RouteId, RouteState, RouteTable,
};

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Running(bool),
    Seek(f64),
}

type CallLog = Rc<RefCell<Vec<Call>>>;

/// Stub handle that records every call it receives.
#[derive(Debug)]
struct Recorder {
    log: CallLog,
    running: bool,
}

impl AnimationHandle for Recorder {
    fn set_running(&mut self, running: bool) {
        self.log.borrow_mut().push(Call::Running(running));
        self.running = running;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn seek(&mut self, time: f64) {
        self.log.borrow_mut().push(Call::Seek(time));
    }
}

fn recorder(anims: &mut AnimationSet) -> (AnimId, CallLog) {
    let log = CallLog::default();
    let id = anims.insert(Box::new(Recorder {
        log: log.clone(),
        running: false,
    }));
    (id, log)
}

/// Namespace with one node exposing `fields`, all driving `anim`.
fn namespace_with(node: &str, fields: &[&str], anim: AnimId) -> NodeNamespace {
    let mut ns = NodeNamespace::new();
    let id = ns.insert_node(node).unwrap();
    for f in fields {
        ns.expose_field(id, f, anim).unwrap();
    }
    ns
}

#[test]
fn touch_sensor_starts_box_animation_exactly_once() {
    let mut anims = AnimationSet::new();
    let (handle, log) = recorder(&mut anims);
    let ns = namespace_with("Box1Anim", &["startTime"], handle);

    let mut table = RouteTable::new(ActionTable::default());
    let id = table
        .add("TouchSensor1", "isActive", "Box1Anim", "startTime")
        .unwrap();
    let report = table.resolve(&ns);
    assert!(report.is_clean());
    assert_eq!(table.state(id), Some(RouteState::Resolved));

    let calls = table.dispatch(
        "TouchSensor1",
        "isActive",
        EventValue::Bool(true),
        &mut anims,
    );
    assert_eq!(calls, 1);
    assert_eq!(*log.borrow(), vec![Call::Running(true)]);
}

#[test]
fn missing_target_is_unresolvable_and_silent() {
    let mut anims = AnimationSet::new();
    let (_, log) = recorder(&mut anims);
    let ns = NodeNamespace::new();

    let mut table = RouteTable::new(ActionTable::default());
    let id = table
        .add("TouchSensor1", "isActive", "Box1Anim", "startTime")
        .unwrap();
    let report = table.resolve(&ns);
    assert_eq!(report.unresolved().collect::<Vec<_>>(), vec![id]);
    assert_eq!(table.state(id), Some(RouteState::Unresolvable));

    for value in [EventValue::Bool(true), EventValue::Bool(false)] {
        assert_eq!(
            table.dispatch("TouchSensor1", "isActive", value, &mut anims),
            0
        );
    }
    assert!(log.borrow().is_empty());
}

#[test]
fn present_node_without_field_is_unresolvable() {
    let mut anims = AnimationSet::new();
    let (handle, _) = recorder(&mut anims);
    let ns = namespace_with("Box1Anim", &["stopTime"], handle);

    let mut table = RouteTable::new(ActionTable::default());
    let id = table
        .add("TouchSensor1", "isActive", "Box1Anim", "startTime")
        .unwrap();
    assert_eq!(
        table.resolve_route(id, &ns),
        Err(RouteError::UnresolvedReference {
            node: "Box1Anim".into(),
            field: "startTime".into()
        })
    );
}

#[test]
fn start_and_stop_routes_share_one_handle() {
    let mut anims = AnimationSet::new();
    let (handle, log) = recorder(&mut anims);
    let ns = namespace_with("Clock", &["startTime", "stopTime"], handle);

    let mut table = RouteTable::new(ActionTable::default());
    table.add("Play", "isActive", "Clock", "startTime").unwrap();
    table.add("Halt", "isActive", "Clock", "stopTime").unwrap();
    assert!(table.resolve(&ns).is_clean());

    table.dispatch("Play", "isActive", EventValue::Bool(true), &mut anims);
    // Release of the button carries false and must not stop anything.
    table.dispatch("Play", "isActive", EventValue::Bool(false), &mut anims);
    table.dispatch("Halt", "isActive", EventValue::Bool(true), &mut anims);

    assert_eq!(
        *log.borrow(),
        vec![Call::Running(true), Call::Running(false)]
    );
    assert!(!anims.get(handle).unwrap().is_running());
}

#[test]
fn toggle_field_follows_boolean_value() {
    let mut anims = AnimationSet::new();
    let (handle, log) = recorder(&mut anims);
    let ns = namespace_with("Clock", &["enabled"], handle);

    let mut table = RouteTable::new(ActionTable::default());
    table.add("Hover", "isOver", "Clock", "enabled").unwrap();
    table.resolve(&ns);

    table.dispatch("Hover", "isOver", EventValue::Bool(true), &mut anims);
    table.dispatch("Hover", "isOver", EventValue::Bool(false), &mut anims);
    assert_eq!(
        *log.borrow(),
        vec![Call::Running(true), Call::Running(false)]
    );
}

#[test]
fn one_source_fans_out_to_every_route() {
    let mut anims = AnimationSet::new();
    let (a, log_a) = recorder(&mut anims);
    let (b, log_b) = recorder(&mut anims);
    let mut ns = NodeNamespace::new();
    let na = ns.insert_node("ClockA").unwrap();
    let nb = ns.insert_node("ClockB").unwrap();
    ns.expose_field(na, "startTime", a).unwrap();
    ns.expose_field(nb, "startTime", b).unwrap();

    let mut table = RouteTable::new(ActionTable::default());
    table.add("Touch", "isActive", "ClockA", "startTime").unwrap();
    table.add("Touch", "isActive", "ClockB", "startTime").unwrap();
    table.add("Touch", "isActive", "Nowhere", "startTime").unwrap();
    let report = table.resolve(&ns);
    assert_eq!(report.unresolved().count(), 1);

    let calls = table.dispatch("Touch", "isActive", EventValue::Bool(true), &mut anims);
    assert_eq!(calls, 2);
    assert_eq!(*log_a.borrow(), vec![Call::Running(true)]);
    assert_eq!(*log_b.borrow(), vec![Call::Running(true)]);
}

#[test]
fn unknown_source_and_inert_routes_do_nothing() {
    let mut anims = AnimationSet::new();
    let (handle, log) = recorder(&mut anims);
    let ns = namespace_with("Mover", &["set_fraction"], handle);

    let mut table = RouteTable::new(ActionTable::default());
    let inert = table
        .add("Clock", "fraction_changed", "Mover", "set_fraction")
        .unwrap();
    assert!(table.resolve(&ns).is_clean());
    assert_eq!(table.state(inert), Some(RouteState::Unresolved));

    assert_eq!(
        table.dispatch("Clock", "fraction_changed", EventValue::Time(0.5), &mut anims),
        0
    );
    assert_eq!(
        table.dispatch("Ghost", "isActive", EventValue::Bool(true), &mut anims),
        0
    );
    assert!(log.borrow().is_empty());
}

#[test]
fn injected_table_maps_field_to_seek() {
    let mut anims = AnimationSet::new();
    let (handle, log) = recorder(&mut anims);
    let ns = namespace_with("Clock", &["startTime"], handle);

    let actions =
        ActionTable::default().with_override(FieldRule::exact("startTime", FieldAction::SetTime));
    let mut table = RouteTable::new(actions);
    table.add("Touch", "touchTime", "Clock", "startTime").unwrap();
    table.resolve(&ns);

    table.dispatch("Touch", "touchTime", EventValue::Time(1.25), &mut anims);
    table.dispatch("Touch", "touchTime", EventValue::Bool(true), &mut anims);
    assert_eq!(*log.borrow(), vec![Call::Seek(1.25)]);
}

#[test]
fn resolved_handle_missing_from_set_is_skipped() {
    let mut anims = AnimationSet::new();
    let ns = namespace_with("Clock", &["startTime"], AnimId(42));

    let mut table = RouteTable::new(ActionTable::default());
    table.add("Touch", "isActive", "Clock", "startTime").unwrap();
    assert!(table.resolve(&ns).is_clean());
    assert_eq!(
        table.dispatch("Touch", "isActive", EventValue::Bool(true), &mut anims),
        0
    );
}

fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for rest in permutations(n - 1) {
        for pos in 0..=rest.len() {
            let mut p = rest.clone();
            p.insert(pos, n - 1);
            out.push(p);
        }
    }
    out
}

#[test]
fn resolution_outcome_is_independent_of_route_order() {
    let statements = [
        ("T1", "isActive", "ClockA", "startTime"),
        ("T2", "isActive", "ClockA", "stopTime"),
        ("T3", "isOver", "Missing", "enabled"),
        ("T4", "isActive", "ClockB", "resumeTime"),
        ("ClockA", "fraction_changed", "Mover", "set_fraction"),
    ];
    let mut ns = NodeNamespace::new();
    let a = ns.insert_node("ClockA").unwrap();
    ns.expose_field(a, "startTime", AnimId(0)).unwrap();
    ns.expose_field(a, "stopTime", AnimId(0)).unwrap();
    ns.insert_node("ClockB").unwrap();

    let classify = |order: &[usize]| {
        let mut table = RouteTable::new(ActionTable::default());
        let ids: Vec<(usize, RouteId)> = order
            .iter()
            .map(|&i| {
                let (sn, sf, dn, df) = statements[i];
                (i, table.add(sn, sf, dn, df).unwrap())
            })
            .collect();
        table.resolve(&ns);
        ids.into_iter()
            .map(|(i, id)| (i, table.state(id).unwrap()))
            .collect::<HashMap<usize, RouteState>>()
    };

    let baseline = classify(&[0, 1, 2, 3, 4]);
    assert_eq!(baseline[&0], RouteState::Resolved);
    assert_eq!(baseline[&1], RouteState::Resolved);
    assert_eq!(baseline[&2], RouteState::Unresolvable);
    assert_eq!(baseline[&3], RouteState::Unresolvable);
    assert_eq!(baseline[&4], RouteState::Unresolved);

    for order in permutations(statements.len()) {
        assert_eq!(classify(&order), baseline, "order {order:?}");
    }
}
