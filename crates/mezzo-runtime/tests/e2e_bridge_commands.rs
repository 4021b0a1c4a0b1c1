//! End-to-end: scripted command bundles in, native calls and change events
//! out, through a full bridge with a recording toolkit.

use mezzo_core::{Point, Size};
use mezzo_harness::{NativeCall, RecordingToolkit};
use mezzo_proxy::{RangePolicy, Reported};
use mezzo_runtime::{Bridge, ChangeEvent};
use serde_json::json;

fn bridge_with_probe() -> (Bridge, RecordingToolkit) {
    let toolkit = RecordingToolkit::new();
    let probe = toolkit.clone();
    (Bridge::new(Box::new(toolkit)), probe)
}

#[test]
fn stack_composition_round_trip() {
    let (mut bridge, probe) = bridge_with_probe();
    let mut events = Vec::new();
    let stack = bridge.register_stack().unwrap();
    let first = bridge.register_plain("Label").unwrap();
    let second = bridge.register_plain("Label").unwrap();
    let third = bridge.register_plain("ImageView").unwrap();

    bridge
        .dispatch(stack, "addArrangedSubview", &json!({ "child": first.get() }), &mut events)
        .unwrap();
    bridge
        .dispatch(stack, "addArrangedSubview", &json!({ "child": second.get() }), &mut events)
        .unwrap();
    bridge
        .dispatch(
            stack,
            "insertArrangedSubview",
            &json!({ "child": third.get(), "index": 1 }),
            &mut events,
        )
        .unwrap();
    bridge
        .dispatch(
            stack,
            "setCustomSpacing",
            &json!({ "spacing": 12.0, "after": third.get() }),
            &mut events,
        )
        .unwrap();

    let inserts: Vec<usize> = probe
        .log()
        .iter()
        .filter_map(|call| match call {
            NativeCall::InsertChild { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(inserts, vec![0, 1, 1]);
    assert!(probe.log().iter().any(|call| matches!(
        call,
        NativeCall::SpacingAfter { spacing, .. } if *spacing == 12.0
    )));
    assert!(events.is_empty());

    bridge
        .dispatch(stack, "removeArrangedSubview", &json!({ "child": third.get() }), &mut events)
        .unwrap();
    assert!(probe
        .log()
        .iter()
        .any(|call| matches!(call, NativeCall::RemoveChild { .. })));
}

#[test]
fn malformed_arguments_never_reach_proxy_state() {
    let (mut bridge, probe) = bridge_with_probe();
    let mut events = Vec::new();
    let stack = bridge.register_stack().unwrap();
    let result = bridge.dispatch(
        stack,
        "insertArrangedSubview",
        &json!({ "child": "not-a-ref", "index": 0 }),
        &mut events,
    );
    assert!(result.is_err());
    assert!(probe.log().is_empty());
}

#[test]
fn slider_commands_and_user_input_share_one_event_path() {
    let (mut bridge, _probe) = bridge_with_probe();
    let mut events = Vec::new();
    let slider = bridge.register_slider(0.0, 100.0, RangePolicy::Reject).unwrap();
    bridge
        .dispatch(slider, "setSteps", &json!({ "steps": [0.0, 25.0, 50.0, 75.0, 100.0] }), &mut events)
        .unwrap();
    bridge
        .dispatch(slider, "setStepValues", &json!({ "stepValues": true }), &mut events)
        .unwrap();
    bridge
        .dispatch(slider, "setValue", &json!({ "value": 23.0 }), &mut events)
        .unwrap();
    // A drag inside the same step is suppressed; a new step fires as user
    // input.
    bridge.slider_input(slider, 24.0, &mut events).unwrap();
    bridge.slider_input(slider, 70.0, &mut events).unwrap();
    assert_eq!(
        events,
        vec![
            ChangeEvent::ValueChanged {
                proxy: slider,
                value: Reported::Index(1),
                from_user: false
            },
            ChangeEvent::ValueChanged {
                proxy: slider,
                value: Reported::Index(3),
                from_user: true
            },
        ]
    );
}

#[test]
fn scroll_commands_emit_clamped_offsets() {
    let (mut bridge, mut probe) = bridge_with_probe();
    let mut events = Vec::new();
    probe.set_default_content_size(Size::new(300.0, 300.0));
    let scroll = bridge
        .register_scroll(Size::new(100.0, 100.0), (0.5, 3.0))
        .unwrap();
    bridge
        .dispatch(
            scroll,
            "setContentOffset",
            &json!({ "offset": { "x": 10_000.0, "y": -50.0 } }),
            &mut events,
        )
        .unwrap();
    assert_eq!(
        events,
        vec![ChangeEvent::ContentOffsetChanged {
            proxy: scroll,
            offset: Point::new(200.0, 0.0)
        }]
    );

    events.clear();
    bridge
        .dispatch(scroll, "scrollToBottom", &json!({ "animated": true }), &mut events)
        .unwrap();
    // Animated: nothing committed until the toolkit reports completion.
    assert!(events.is_empty());
    bridge.transition_finished(scroll, 1, &mut events).unwrap();
    assert_eq!(
        events,
        vec![ChangeEvent::ContentOffsetChanged {
            proxy: scroll,
            offset: Point::new(0.0, 200.0)
        }]
    );
}

#[test]
fn destroyed_target_rejects_further_commands() {
    let (mut bridge, _probe) = bridge_with_probe();
    let mut events = Vec::new();
    let stack = bridge.register_stack().unwrap();
    bridge.dispatch(stack, "destroy", &json!({}), &mut events).unwrap();
    let result = bridge.dispatch(stack, "setSpacing", &json!({ "spacing": 4.0 }), &mut events);
    assert!(result.is_err());
}
