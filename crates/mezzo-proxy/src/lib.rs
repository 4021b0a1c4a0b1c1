#![forbid(unsafe_code)]

//! Proxy layer: script-visible handles that own and keep synchronized a
//! native view hierarchy.
//!
//! # Role in Mezzo
//! Each proxy holds semantic state (property map, arranged children,
//! quantized value, scroll transform) independent of whether a native view
//! currently exists for it, plus a binding state machine that realizes,
//! detaches, and destroys the view. The proxy-side model is authoritative;
//! the native side is kept isomorphic to it after every mutation.
//!
//! # Primary modules
//! - [`binding`]: the `Unrealized → Realized ⇄ Detached → Destroyed` state
//!   machine and the shared proxy core, wired to lifecycle accounting.
//! - [`registry`]: ordered arranged-children list with dense positions and
//!   all-or-nothing native application.
//! - [`quantizer`]: step snapping and duplicate-change suppression for
//!   slider-style controls.
//! - [`transform`]: clamped content offset/insets/zoom with supersede-on-new
//!   animated transitions.
//! - [`stack`], [`slider`], [`scroll`]: the concrete proxy flavors composing
//!   the above.

pub mod binding;
pub mod quantizer;
pub mod registry;
pub mod scroll;
pub mod slider;
pub mod stack;
pub mod transform;

pub use binding::{Binding, BindingError, BindingState, PlainProxy, ProxyBase};
pub use quantizer::{QuantizerError, RangePolicy, Reported, StepConfig, ValueQuantizer};
pub use registry::{ArrangedEntry, OrderedChildRegistry, RegistryError};
pub use scroll::ScrollProxy;
pub use slider::{SliderProxy, ValueChange};
pub use stack::StackProxy;
pub use transform::TransformCoordinator;

use core::fmt;
use mezzo_backend::NativeError;

/// Any locally-surfaced failure from a proxy operation.
///
/// All variants are synchronous and leave proxy state unchanged; none of
/// them propagate as a process-terminating fault.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyError {
    Binding(BindingError),
    Registry(RegistryError),
    Quantizer(QuantizerError),
    Native(NativeError),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binding(err) => err.fmt(f),
            Self::Registry(err) => err.fmt(f),
            Self::Quantizer(err) => err.fmt(f),
            Self::Native(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Binding(err) => Some(err),
            Self::Registry(err) => Some(err),
            Self::Quantizer(err) => Some(err),
            Self::Native(err) => Some(err),
        }
    }
}

impl From<BindingError> for ProxyError {
    fn from(err: BindingError) -> Self {
        Self::Binding(err)
    }
}

impl From<RegistryError> for ProxyError {
    fn from(err: RegistryError) -> Self {
        Self::Registry(err)
    }
}

impl From<QuantizerError> for ProxyError {
    fn from(err: QuantizerError) -> Self {
        Self::Quantizer(err)
    }
}

impl From<NativeError> for ProxyError {
    fn from(err: NativeError) -> Self {
        Self::Native(err)
    }
}
