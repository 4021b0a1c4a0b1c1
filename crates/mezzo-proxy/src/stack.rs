#![forbid(unsafe_code)]

//! Composite proxy arranging an ordered list of child views.

use mezzo_backend::{Axis, NativeContainer, NativeFactory};
use mezzo_core::{ProxyId, ViewId};

use crate::ProxyError;
use crate::binding::ProxyBase;
use crate::registry::{ArrangedEntry, OrderedChildRegistry};

/// Proxy for an ordered-composition container.
///
/// The registry's order is authoritative; every mutation goes through the
/// registry so the native child list stays isomorphic to it. Mutations
/// realize the container on demand (matching the semantics of driving a
/// container that the script has not shown yet), and re-realization after a
/// detach replays the full arrangement into the fresh native container.
#[derive(Debug)]
pub struct StackProxy {
    base: ProxyBase<dyn NativeContainer>,
    registry: OrderedChildRegistry,
    axis: Axis,
}

impl StackProxy {
    pub fn new() -> Self {
        Self::with_axis(Axis::default())
    }

    pub fn with_axis(axis: Axis) -> Self {
        Self {
            base: ProxyBase::new("StackView"),
            registry: OrderedChildRegistry::new(),
            axis,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn id(&self) -> ProxyId {
        self.base.id()
    }

    pub fn base(&self) -> &ProxyBase<dyn NativeContainer> {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut ProxyBase<dyn NativeContainer> {
        &mut self.base
    }

    pub fn arranged(&self) -> &[ArrangedEntry] {
        self.registry.entries()
    }

    pub fn position_of(&self, child: ProxyId) -> Option<usize> {
        self.registry.position_of(child)
    }

    /// Realize the container if needed and return its view identity.
    pub fn realize(&mut self, factory: &mut dyn NativeFactory) -> Result<ViewId, ProxyError> {
        self.ensure_container(factory)?;
        Ok(self.base.binding_mut().view_mut()?.id())
    }

    /// Realize the container if needed; replays the arrangement into a
    /// fresh native container after a re-realization.
    fn ensure_container(&mut self, factory: &mut dyn NativeFactory) -> Result<(), ProxyError> {
        let (id, type_name) = (self.base.id(), self.base.type_name());
        let fresh = self
            .base
            .binding_mut()
            .ensure_realized(|| factory.create_container(id, type_name))?;
        if fresh {
            self.base
                .binding_mut()
                .view_mut()?
                .set_axis(self.axis)
                .map_err(ProxyError::Native)?;
        }
        if fresh && !self.registry.is_empty() {
            tracing::debug!(
                proxy = self.base.id().get(),
                children = self.registry.len(),
                "replaying arrangement into fresh container"
            );
            let native = self.base.binding_mut().view_mut()?;
            self.registry
                .replay_into(native)
                .map_err(ProxyError::Native)?;
        }
        Ok(())
    }

    /// Add a child at the end of the arranged list.
    pub fn add_arranged(
        &mut self,
        child: ProxyId,
        child_view: ViewId,
        factory: &mut dyn NativeFactory,
    ) -> Result<(), ProxyError> {
        self.ensure_container(factory)?;
        let native = self.base.binding_mut().view_mut()?;
        self.registry.append(child, child_view, native)?;
        Ok(())
    }

    /// Insert a child at `index`; existing entries shift up.
    pub fn insert_arranged_at(
        &mut self,
        child: ProxyId,
        child_view: ViewId,
        index: usize,
        factory: &mut dyn NativeFactory,
    ) -> Result<(), ProxyError> {
        self.ensure_container(factory)?;
        let native = self.base.binding_mut().view_mut()?;
        self.registry.insert_at(child, child_view, index, native)?;
        Ok(())
    }

    /// Remove a child; subsequent entries renumber down.
    pub fn remove_arranged(
        &mut self,
        child: ProxyId,
        factory: &mut dyn NativeFactory,
    ) -> Result<(), ProxyError> {
        self.ensure_container(factory)?;
        let native = self.base.binding_mut().view_mut()?;
        self.registry.remove(child, native)?;
        Ok(())
    }

    /// Override the gap after `child`.
    pub fn set_custom_spacing(
        &mut self,
        spacing: f64,
        after: ProxyId,
        factory: &mut dyn NativeFactory,
    ) -> Result<(), ProxyError> {
        self.ensure_container(factory)?;
        let native = self.base.binding_mut().view_mut()?;
        self.registry.set_spacing_after(after, spacing, native)?;
        Ok(())
    }

    /// Change the axis children are laid out along.
    pub fn set_axis(
        &mut self,
        axis: Axis,
        factory: &mut dyn NativeFactory,
    ) -> Result<(), ProxyError> {
        self.ensure_container(factory)?;
        if axis == self.axis {
            return Ok(());
        }
        self.base
            .binding_mut()
            .view_mut()?
            .set_axis(axis)
            .map_err(ProxyError::Native)?;
        self.axis = axis;
        Ok(())
    }

    /// Change the base gap between children.
    pub fn set_base_spacing(
        &mut self,
        spacing: f64,
        factory: &mut dyn NativeFactory,
    ) -> Result<(), ProxyError> {
        self.ensure_container(factory)?;
        let native = self.base.binding_mut().view_mut()?;
        self.registry.set_base_spacing(spacing, native)?;
        Ok(())
    }

    pub fn detach(&mut self) -> Result<(), ProxyError> {
        self.base.binding_mut().detach()?;
        Ok(())
    }

    pub fn destroy(&mut self) -> Result<(), ProxyError> {
        self.base.destroy()?;
        Ok(())
    }
}

impl Default for StackProxy {
    fn default() -> Self {
        Self::new()
    }
}
