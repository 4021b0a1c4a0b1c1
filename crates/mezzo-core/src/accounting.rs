#![forbid(unsafe_code)]

//! Lifecycle accounting: leak and double-free detection across the
//! proxy/native-view boundary.
//!
//! Every proxy and view creation is reported here together with its eventual
//! destruction. In debug builds the accountant keeps per-type counters and
//! the set of currently-live identities, so a dangling proxy or a view
//! destroyed twice shows up as a non-zero live count or a logged anomaly.
//!
//! # Invariants
//!
//! 1. Live counts are derived from the live-identity sets and can never go
//!    negative.
//! 2. A destruction record for an identity that is not live is downgraded to
//!    a `tracing::warn!` — the accountant never panics the host process.
//! 3. State is process-wide: initialized on first touch, cleared only by
//!    [`reset`], never torn down.
//!
//! # Release builds
//!
//! The entire implementation is swapped for inline no-ops via
//! `#[cfg(debug_assertions)]`, so production binaries carry zero overhead —
//! no counters, no lock, no runtime flag check.

/// Which side of the proxy/view pair an identity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceKind {
    Proxy,
    View,
}

#[cfg(debug_assertions)]
mod imp {
    use super::InstanceKind;
    use ahash::{AHashMap, AHashSet};
    use std::fmt::Write as _;
    use std::sync::{LazyLock, Mutex, PoisonError};

    #[derive(Default)]
    struct TypeCounts {
        created: u64,
        destroyed: u64,
    }

    #[derive(Default)]
    struct KindLedger {
        by_type: AHashMap<&'static str, TypeCounts>,
        live: AHashSet<u64>,
    }

    #[derive(Default)]
    struct Tracker {
        proxies: KindLedger,
        views: KindLedger,
    }

    impl Tracker {
        fn ledger(&mut self, kind: InstanceKind) -> &mut KindLedger {
            match kind {
                InstanceKind::Proxy => &mut self.proxies,
                InstanceKind::View => &mut self.views,
            }
        }
    }

    static TRACKER: LazyLock<Mutex<Tracker>> = LazyLock::new(Mutex::default);

    fn lock() -> std::sync::MutexGuard<'static, Tracker> {
        // A panicking creator thread must not disable accounting for the
        // rest of the process; recover the poisoned guard.
        TRACKER.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn track_created(kind: InstanceKind, identity: u64, type_name: &'static str) {
        let mut tracker = lock();
        let ledger = tracker.ledger(kind);
        ledger.by_type.entry(type_name).or_default().created += 1;
        if !ledger.live.insert(identity) {
            tracing::warn!(
                ?kind,
                type_name,
                identity,
                "creation recorded for an identity that is already live"
            );
        }
    }

    pub fn track_destroyed(kind: InstanceKind, identity: u64, type_name: &'static str) {
        let mut tracker = lock();
        let ledger = tracker.ledger(kind);
        ledger.by_type.entry(type_name).or_default().destroyed += 1;
        if !ledger.live.remove(&identity) {
            tracing::warn!(
                ?kind,
                type_name,
                identity,
                "destruction recorded for an identity that is not live"
            );
        }
    }

    pub fn live_count(kind: InstanceKind) -> usize {
        let mut tracker = lock();
        tracker.ledger(kind).live.len()
    }

    pub fn created_count(kind: InstanceKind, type_name: &str) -> u64 {
        let mut tracker = lock();
        tracker
            .ledger(kind)
            .by_type
            .get(type_name)
            .map_or(0, |c| c.created)
    }

    pub fn destroyed_count(kind: InstanceKind, type_name: &str) -> u64 {
        let mut tracker = lock();
        tracker
            .ledger(kind)
            .by_type
            .get(type_name)
            .map_or(0, |c| c.destroyed)
    }

    pub fn reset() {
        let mut tracker = lock();
        *tracker = Tracker::default();
    }

    pub fn render_stats() -> String {
        let tracker = lock();
        let mut out = String::new();
        let _ = writeln!(out, "=== lifecycle stats ===");
        let _ = writeln!(out, "live proxies: {}", tracker.proxies.live.len());
        let _ = writeln!(out, "live views: {}", tracker.views.live.len());
        for (label, ledger) in [("proxy", &tracker.proxies), ("view", &tracker.views)] {
            let mut rows: Vec<_> = ledger
                .by_type
                .iter()
                .filter(|(_, c)| c.created > c.destroyed)
                .collect();
            rows.sort_by_key(|(name, _)| *name);
            for (name, counts) in rows {
                let _ = writeln!(
                    out,
                    "  {label} {name}: {} live ({} created, {} destroyed)",
                    counts.created - counts.destroyed,
                    counts.created,
                    counts.destroyed
                );
            }
        }
        out
    }

    pub fn print_stats() {
        tracing::info!("{}", render_stats());
    }
}

#[cfg(not(debug_assertions))]
mod imp {
    use super::InstanceKind;

    #[inline(always)]
    pub fn track_created(_kind: InstanceKind, _identity: u64, _type_name: &'static str) {}

    #[inline(always)]
    pub fn track_destroyed(_kind: InstanceKind, _identity: u64, _type_name: &'static str) {}

    #[inline(always)]
    pub fn live_count(_kind: InstanceKind) -> usize {
        0
    }

    #[inline(always)]
    pub fn created_count(_kind: InstanceKind, _type_name: &str) -> u64 {
        0
    }

    #[inline(always)]
    pub fn destroyed_count(_kind: InstanceKind, _type_name: &str) -> u64 {
        0
    }

    #[inline(always)]
    pub fn reset() {}

    #[inline(always)]
    pub fn render_stats() -> String {
        String::new()
    }

    #[inline(always)]
    pub fn print_stats() {}
}

pub use imp::{
    created_count, destroyed_count, live_count, print_stats, render_stats, reset, track_created,
    track_destroyed,
};

#[cfg(all(test, debug_assertions))]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    // The accountant is deliberately process-wide; tests that assert counter
    // values serialize themselves around reset().
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    fn exclusive() -> MutexGuard<'static, ()> {
        let guard = TEST_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        reset();
        guard
    }

    #[test]
    fn create_destroy_pairs_return_to_zero() {
        let _guard = exclusive();
        for id in 1..=8u64 {
            track_created(InstanceKind::Proxy, id, "StackProxy");
        }
        assert_eq!(live_count(InstanceKind::Proxy), 8);
        for id in 1..=8u64 {
            track_destroyed(InstanceKind::Proxy, id, "StackProxy");
        }
        assert_eq!(live_count(InstanceKind::Proxy), 0);
        assert_eq!(created_count(InstanceKind::Proxy, "StackProxy"), 8);
        assert_eq!(destroyed_count(InstanceKind::Proxy, "StackProxy"), 8);
    }

    #[test]
    fn double_destroy_is_not_fatal_and_count_stays_non_negative() {
        let _guard = exclusive();
        track_created(InstanceKind::View, 42, "SliderView");
        track_destroyed(InstanceKind::View, 42, "SliderView");
        // Anomaly: logged, never a panic, live count stays at zero.
        track_destroyed(InstanceKind::View, 42, "SliderView");
        assert_eq!(live_count(InstanceKind::View), 0);
    }

    #[test]
    fn interleaved_pairs_across_threads() {
        let _guard = exclusive();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                std::thread::spawn(move || {
                    for i in 0..64u64 {
                        let id = t * 1000 + i + 1;
                        track_created(InstanceKind::View, id, "PlainView");
                        track_destroyed(InstanceKind::View, id, "PlainView");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(live_count(InstanceKind::View), 0);
        assert_eq!(created_count(InstanceKind::View, "PlainView"), 256);
    }

    #[test]
    fn reset_clears_counters_unconditionally() {
        let _guard = exclusive();
        track_created(InstanceKind::Proxy, 1, "ScrollProxy");
        track_created(InstanceKind::View, 2, "ScrollView");
        reset();
        assert_eq!(live_count(InstanceKind::Proxy), 0);
        assert_eq!(live_count(InstanceKind::View), 0);
        assert_eq!(created_count(InstanceKind::Proxy, "ScrollProxy"), 0);
    }

    #[test]
    fn stats_skip_types_with_no_live_instances() {
        let _guard = exclusive();
        track_created(InstanceKind::Proxy, 1, "GoneProxy");
        track_destroyed(InstanceKind::Proxy, 1, "GoneProxy");
        track_created(InstanceKind::Proxy, 2, "HeldProxy");
        let stats = render_stats();
        assert!(!stats.contains("GoneProxy"));
        assert!(stats.contains("HeldProxy"));
    }
}
