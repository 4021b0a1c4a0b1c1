#![forbid(unsafe_code)]

//! Proxy/view binding state machine.
//!
//! Every proxy/view pair moves through
//! `Unrealized → Realized ⇄ Detached → Destroyed`. The proxy is the sole
//! owner of its view handle; realizing from `Detached` creates a fresh view
//! and a fresh accounting record, and destroying a realized proxy performs
//! an implicit detach so a destruction record is always paired with its
//! creation record.

use core::fmt;

use ahash::AHashMap;
use mezzo_backend::{NativeError, NativeView};
use mezzo_core::ProxyId;
use mezzo_core::accounting::{self, InstanceKind};

/// Lifecycle state of a proxy/view pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// Proxy exists, no native view yet. Initial state.
    Unrealized,
    /// A native view is bound and owned by the proxy.
    Realized,
    /// The view was released; the proxy and its model state survive.
    Detached,
    /// Terminal. Every further operation fails.
    Destroyed,
}

/// Lifecycle state-machine violations.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingError {
    AlreadyRealized { proxy: ProxyId },
    NotRealized { proxy: ProxyId },
    UseAfterDestroy { proxy: ProxyId },
    Native(NativeError),
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRealized { proxy } => {
                write!(f, "proxy {} is already realized", proxy.get())
            }
            Self::NotRealized { proxy } => {
                write!(f, "proxy {} has no realized view", proxy.get())
            }
            Self::UseAfterDestroy { proxy } => {
                write!(f, "proxy {} was destroyed", proxy.get())
            }
            Self::Native(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for BindingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Native(err) => Some(err),
            _ => None,
        }
    }
}

/// Single-owner handle for one native view, tracked by lifecycle accounting.
///
/// Generic over the view trait so composite proxies can hold
/// `Binding<dyn NativeContainer>` and still go through the one state
/// machine.
pub struct Binding<V: NativeView + ?Sized> {
    proxy: ProxyId,
    type_name: &'static str,
    state: BindingState,
    view: Option<Box<V>>,
}

impl<V: NativeView + ?Sized> fmt::Debug for Binding<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("proxy", &self.proxy)
            .field("type_name", &self.type_name)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<V: NativeView + ?Sized> Binding<V> {
    pub fn new(proxy: ProxyId, type_name: &'static str) -> Self {
        Self {
            proxy,
            type_name,
            state: BindingState::Unrealized,
            view: None,
        }
    }

    pub fn state(&self) -> BindingState {
        self.state
    }

    pub fn is_realized(&self) -> bool {
        self.state == BindingState::Realized
    }

    /// Create the native view and transition to `Realized`.
    ///
    /// Legal from `Unrealized` and `Detached` (re-realization gets a fresh
    /// view and a fresh creation record). Fails with `AlreadyRealized` if a
    /// view is already bound.
    pub fn realize_with(
        &mut self,
        create: impl FnOnce() -> Result<Box<V>, NativeError>,
    ) -> Result<&mut V, BindingError> {
        match self.state {
            BindingState::Destroyed => {
                return Err(BindingError::UseAfterDestroy { proxy: self.proxy });
            }
            BindingState::Realized => {
                return Err(BindingError::AlreadyRealized { proxy: self.proxy });
            }
            BindingState::Unrealized | BindingState::Detached => {}
        }
        let view = create().map_err(BindingError::Native)?;
        accounting::track_created(InstanceKind::View, view.id().get(), self.type_name);
        self.state = BindingState::Realized;
        Ok(&mut **self.view.insert(view))
    }

    /// Realize if needed; `Ok(true)` means a fresh view was just created.
    pub fn ensure_realized(
        &mut self,
        create: impl FnOnce() -> Result<Box<V>, NativeError>,
    ) -> Result<bool, BindingError> {
        match self.state {
            BindingState::Destroyed => Err(BindingError::UseAfterDestroy { proxy: self.proxy }),
            BindingState::Realized => Ok(false),
            BindingState::Unrealized | BindingState::Detached => {
                self.realize_with(create)?;
                Ok(true)
            }
        }
    }

    /// Release the view and transition to `Detached`.
    ///
    /// The proxy and its model state survive; the view's destruction record
    /// is written here.
    pub fn detach(&mut self) -> Result<(), BindingError> {
        match self.state {
            BindingState::Destroyed => Err(BindingError::UseAfterDestroy { proxy: self.proxy }),
            BindingState::Unrealized | BindingState::Detached => {
                Err(BindingError::NotRealized { proxy: self.proxy })
            }
            BindingState::Realized => {
                if let Some(view) = self.view.take() {
                    accounting::track_destroyed(InstanceKind::View, view.id().get(), self.type_name);
                }
                self.state = BindingState::Detached;
                Ok(())
            }
        }
    }

    /// Transition to the terminal `Destroyed` state.
    ///
    /// Valid from any non-terminal state; implicitly detaches first so the
    /// view record is always paired.
    pub fn destroy(&mut self) -> Result<(), BindingError> {
        match self.state {
            BindingState::Destroyed => Err(BindingError::UseAfterDestroy { proxy: self.proxy }),
            BindingState::Realized => {
                self.detach()?;
                self.state = BindingState::Destroyed;
                Ok(())
            }
            BindingState::Unrealized | BindingState::Detached => {
                self.state = BindingState::Destroyed;
                Ok(())
            }
        }
    }

    /// The bound view, if realized.
    pub fn view_mut(&mut self) -> Result<&mut V, BindingError> {
        match self.state {
            BindingState::Destroyed => Err(BindingError::UseAfterDestroy { proxy: self.proxy }),
            BindingState::Realized => self
                .view
                .as_deref_mut()
                .ok_or(BindingError::NotRealized { proxy: self.proxy }),
            BindingState::Unrealized | BindingState::Detached => {
                Err(BindingError::NotRealized { proxy: self.proxy })
            }
        }
    }
}

impl<V: NativeView + ?Sized> Drop for Binding<V> {
    fn drop(&mut self) {
        // Dropping a still-realized binding pairs the creation record; this
        // can run off the UI-affinity thread during teardown, which the
        // accountant tolerates.
        if let Some(view) = self.view.take() {
            accounting::track_destroyed(InstanceKind::View, view.id().get(), self.type_name);
        }
    }
}

/// Shared core of every proxy flavor: identity, property map, binding.
pub struct ProxyBase<V: NativeView + ?Sized> {
    id: ProxyId,
    type_name: &'static str,
    properties: AHashMap<String, serde_json::Value>,
    binding: Binding<V>,
}

impl<V: NativeView + ?Sized> fmt::Debug for ProxyBase<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyBase")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("state", &self.binding.state())
            .finish_non_exhaustive()
    }
}

impl<V: NativeView + ?Sized> ProxyBase<V> {
    pub fn new(type_name: &'static str) -> Self {
        let id = ProxyId::alloc();
        accounting::track_created(InstanceKind::Proxy, id.get(), type_name);
        Self {
            id,
            type_name,
            properties: AHashMap::new(),
            binding: Binding::new(id, type_name),
        }
    }

    pub fn id(&self) -> ProxyId {
        self.id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn state(&self) -> BindingState {
        self.binding.state()
    }

    pub fn binding_mut(&mut self) -> &mut Binding<V> {
        &mut self.binding
    }

    /// Reject any mutation once the proxy is destroyed.
    pub fn ensure_alive(&self) -> Result<(), BindingError> {
        if self.binding.state() == BindingState::Destroyed {
            Err(BindingError::UseAfterDestroy { proxy: self.id })
        } else {
            Ok(())
        }
    }

    pub fn set_property(
        &mut self,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<(), BindingError> {
        self.ensure_alive()?;
        self.properties.insert(name.into(), value);
        Ok(())
    }

    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name)
    }

    /// Destroy the proxy: implicit detach, then terminal state, then the
    /// proxy's own destruction record.
    pub fn destroy(&mut self) -> Result<(), BindingError> {
        self.binding.destroy()?;
        accounting::track_destroyed(InstanceKind::Proxy, self.id.get(), self.type_name);
        Ok(())
    }
}

impl<V: NativeView + ?Sized> Drop for ProxyBase<V> {
    fn drop(&mut self) {
        // destroy() already recorded; only pair the record for proxies
        // dropped without an explicit destroy.
        if self.binding.state() != BindingState::Destroyed {
            accounting::track_destroyed(InstanceKind::Proxy, self.id.get(), self.type_name);
        }
    }
}

/// A leaf proxy with no composite behavior: just the binding and properties.
///
/// Arranged children of a stack are plain proxies unless the script made
/// them something richer.
#[derive(Debug)]
pub struct PlainProxy {
    base: ProxyBase<dyn NativeView>,
}

impl PlainProxy {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            base: ProxyBase::new(type_name),
        }
    }

    pub fn id(&self) -> ProxyId {
        self.base.id()
    }

    pub fn base(&self) -> &ProxyBase<dyn NativeView> {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut ProxyBase<dyn NativeView> {
        &mut self.base
    }

    pub fn realize(
        &mut self,
        factory: &mut dyn mezzo_backend::NativeFactory,
    ) -> Result<mezzo_core::ViewId, BindingError> {
        let (id, type_name) = (self.base.id(), self.base.type_name());
        self.base
            .binding_mut()
            .ensure_realized(|| factory.create_view(id, type_name))?;
        Ok(self.base.binding_mut().view_mut()?.id())
    }

    pub fn detach(&mut self) -> Result<(), BindingError> {
        self.base.binding_mut().detach()
    }

    pub fn destroy(&mut self) -> Result<(), BindingError> {
        self.base.destroy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mezzo_harness::RecordingToolkit;

    fn plain(toolkit: &mut RecordingToolkit) -> PlainProxy {
        let mut proxy = PlainProxy::new("PlainView");
        proxy.realize(toolkit).unwrap();
        proxy
    }

    #[test]
    fn realize_twice_without_detach_fails() {
        let mut toolkit = RecordingToolkit::new();
        let mut proxy = plain(&mut toolkit);
        let err = proxy.realize(&mut toolkit).map(|_| ());
        // ensure_realized treats a second realize as a no-op; the raw state
        // machine is strict.
        assert_eq!(err, Ok(()));
        let id = proxy.id();
        let strict = proxy
            .base_mut()
            .binding_mut()
            .realize_with(|| unreachable!("factory must not be called"));
        assert!(matches!(
            strict,
            Err(BindingError::AlreadyRealized { proxy }) if proxy == id
        ));
    }

    #[test]
    fn detach_then_realize_again_is_legal() {
        let mut toolkit = RecordingToolkit::new();
        let mut proxy = plain(&mut toolkit);
        proxy.detach().unwrap();
        assert_eq!(proxy.base().state(), BindingState::Detached);
        proxy.realize(&mut toolkit).unwrap();
        assert_eq!(proxy.base().state(), BindingState::Realized);
    }

    #[test]
    fn destroyed_proxy_rejects_everything() {
        let mut toolkit = RecordingToolkit::new();
        let mut proxy = plain(&mut toolkit);
        proxy.destroy().unwrap();
        let id = proxy.id();
        assert!(matches!(
            proxy.realize(&mut toolkit),
            Err(BindingError::UseAfterDestroy { proxy }) if proxy == id
        ));
        assert!(matches!(
            proxy.detach(),
            Err(BindingError::UseAfterDestroy { proxy }) if proxy == id
        ));
        assert!(matches!(
            proxy.destroy(),
            Err(BindingError::UseAfterDestroy { proxy }) if proxy == id
        ));
        assert!(matches!(
            proxy.base_mut().set_property("width", serde_json::json!(10)),
            Err(BindingError::UseAfterDestroy { proxy }) if proxy == id
        ));
    }

    #[test]
    fn detach_without_view_is_an_error() {
        let mut proxy = PlainProxy::new("PlainView");
        let id = proxy.id();
        assert!(matches!(
            proxy.detach(),
            Err(BindingError::NotRealized { proxy }) if proxy == id
        ));
    }

    #[test]
    fn properties_survive_detach() {
        let mut toolkit = RecordingToolkit::new();
        let mut proxy = plain(&mut toolkit);
        proxy
            .base_mut()
            .set_property("width", serde_json::json!(320))
            .unwrap();
        proxy.detach().unwrap();
        assert_eq!(
            proxy.base().property("width"),
            Some(&serde_json::json!(320))
        );
    }
}
