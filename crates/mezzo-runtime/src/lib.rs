#![forbid(unsafe_code)]

//! Mezzo runtime: the scripting-bridge boundary.
//!
//! Decodes loosely-typed command bundles into typed [`Command`]s, dispatches
//! them onto registered proxies on the UI-affinity thread, and routes change
//! notifications back out through an [`EventSink`]. Cross-thread callers
//! post through a [`BridgeHandle`]; see [`bridge`] for the threading model.

pub mod bridge;
pub mod command;
pub mod event;

pub use bridge::{Bridge, BridgeHandle, CommandError, ProxyNode};
pub use command::{ArgumentError, Command};
pub use event::{ChangeEvent, EventSink, NullSink};
