#![forbid(unsafe_code)]

//! Outbound change notifications.

use mezzo_core::{Point, ProxyId};
use mezzo_proxy::Reported;

/// A change the scripting bridge should hear about, carrying the already
/// quantized or clamped value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChangeEvent {
    ValueChanged {
        proxy: ProxyId,
        value: Reported,
        /// True when the change originated from native user input.
        from_user: bool,
    },
    ContentOffsetChanged {
        proxy: ProxyId,
        offset: Point,
    },
}

/// Receiver for outbound change events.
pub trait EventSink {
    fn emit(&mut self, event: ChangeEvent);
}

/// Collecting sink, mostly for tests and simple hosts.
impl EventSink for Vec<ChangeEvent> {
    fn emit(&mut self, event: ChangeEvent) {
        self.push(event);
    }
}

/// Sink for hosts that do not care about change events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: ChangeEvent) {}
}
