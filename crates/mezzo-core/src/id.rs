#![forbid(unsafe_code)]

//! Identity newtypes for proxies and native views.
//!
//! Identities are process-wide, never reused, and allocated from atomic
//! counters so they can be minted from any thread (view construction can
//! happen off the UI-affinity thread during teardown).

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PROXY: AtomicU64 = AtomicU64::new(1);
static NEXT_VIEW: AtomicU64 = AtomicU64::new(1);

fn alloc(counter: &AtomicU64) -> NonZeroU64 {
    let raw = counter.fetch_add(1, Ordering::Relaxed);
    // Counter starts at 1 and u64 does not wrap in any realistic process.
    NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN)
}

/// Script-addressable identity of one proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProxyId(NonZeroU64);

impl ProxyId {
    /// Allocate a fresh, never-before-used proxy identity.
    pub fn alloc() -> Self {
        Self(alloc(&NEXT_PROXY))
    }

    /// Rebuild an identity from its raw value (bridge wire format).
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Raw value, for wire encoding and accounting.
    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

/// Identity of one realized native view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(NonZeroU64);

impl ViewId {
    /// Allocate a fresh view identity.
    pub fn alloc() -> Self {
        Self(alloc(&NEXT_VIEW))
    }

    /// Raw value, for accounting.
    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}
