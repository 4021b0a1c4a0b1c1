//! Lifecycle accounting pairing across the binding state machine.
//!
//! The accountant is process-wide, so each test uses its own type name and
//! asserts per-type counts; tests stay independent without a global reset.

#![cfg(debug_assertions)]

use mezzo_core::accounting::{self, InstanceKind};
use mezzo_harness::RecordingToolkit;
use mezzo_proxy::PlainProxy;

#[test]
fn destroy_from_realized_pairs_exactly_one_record_each() {
    let mut toolkit = RecordingToolkit::new();
    let mut proxy = PlainProxy::new("PairedOnce");
    proxy.realize(&mut toolkit).unwrap();
    proxy.destroy().unwrap();
    assert_eq!(accounting::created_count(InstanceKind::Proxy, "PairedOnce"), 1);
    assert_eq!(accounting::destroyed_count(InstanceKind::Proxy, "PairedOnce"), 1);
    assert_eq!(accounting::created_count(InstanceKind::View, "PairedOnce"), 1);
    assert_eq!(accounting::destroyed_count(InstanceKind::View, "PairedOnce"), 1);
    drop(proxy);
    // Dropping an already-destroyed proxy must not add a second record.
    assert_eq!(accounting::destroyed_count(InstanceKind::Proxy, "PairedOnce"), 1);
}

#[test]
fn drop_without_destroy_still_pairs_records() {
    let mut toolkit = RecordingToolkit::new();
    {
        let mut proxy = PlainProxy::new("DroppedLive");
        proxy.realize(&mut toolkit).unwrap();
    }
    assert_eq!(accounting::created_count(InstanceKind::Proxy, "DroppedLive"), 1);
    assert_eq!(accounting::destroyed_count(InstanceKind::Proxy, "DroppedLive"), 1);
    assert_eq!(accounting::created_count(InstanceKind::View, "DroppedLive"), 1);
    assert_eq!(accounting::destroyed_count(InstanceKind::View, "DroppedLive"), 1);
}

#[test]
fn each_realization_gets_its_own_view_record() {
    let mut toolkit = RecordingToolkit::new();
    let mut proxy = PlainProxy::new("Rebound");
    proxy.realize(&mut toolkit).unwrap();
    proxy.detach().unwrap();
    proxy.realize(&mut toolkit).unwrap();
    proxy.destroy().unwrap();
    assert_eq!(accounting::created_count(InstanceKind::Proxy, "Rebound"), 1);
    assert_eq!(accounting::destroyed_count(InstanceKind::Proxy, "Rebound"), 1);
    assert_eq!(accounting::created_count(InstanceKind::View, "Rebound"), 2);
    assert_eq!(accounting::destroyed_count(InstanceKind::View, "Rebound"), 2);
}

#[test]
fn destroying_an_unrealized_proxy_records_no_view() {
    let mut proxy = PlainProxy::new("NeverShown");
    proxy.destroy().unwrap();
    assert_eq!(accounting::created_count(InstanceKind::Proxy, "NeverShown"), 1);
    assert_eq!(accounting::destroyed_count(InstanceKind::Proxy, "NeverShown"), 1);
    assert_eq!(accounting::created_count(InstanceKind::View, "NeverShown"), 0);
    assert_eq!(accounting::destroyed_count(InstanceKind::View, "NeverShown"), 0);
}
