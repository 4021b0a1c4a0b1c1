#![forbid(unsafe_code)]

//! Scrollable surface proxy.

use mezzo_backend::{NativeFactory, NativeScrollSurface};
use mezzo_core::{Insets, Point, ProxyId, Size, ViewId};

use crate::ProxyError;
use crate::binding::ProxyBase;
use crate::transform::TransformCoordinator;

/// Proxy for a scrollable surface with clamped offset, insets, and zoom.
///
/// All transform state lives in the coordinator; the native surface only
/// ever sees values the coordinator already clamped. Mutations realize the
/// surface on demand, and re-realization restores the committed transform
/// onto the fresh surface.
#[derive(Debug)]
pub struct ScrollProxy {
    base: ProxyBase<dyn NativeScrollSurface>,
    transform: TransformCoordinator,
}

impl ScrollProxy {
    pub fn new(viewport: Size, zoom_bounds: (f64, f64)) -> Self {
        Self {
            base: ProxyBase::new("ScrollView"),
            transform: TransformCoordinator::new(viewport, zoom_bounds),
        }
    }

    pub fn id(&self) -> ProxyId {
        self.base.id()
    }

    pub fn base(&self) -> &ProxyBase<dyn NativeScrollSurface> {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut ProxyBase<dyn NativeScrollSurface> {
        &mut self.base
    }

    pub fn transform(&self) -> &TransformCoordinator {
        &self.transform
    }

    pub fn set_viewport(&mut self, viewport: Size) -> Result<(), ProxyError> {
        self.base.ensure_alive()?;
        self.transform.set_viewport(viewport);
        Ok(())
    }

    /// Realize the surface if needed and return its view identity.
    pub fn realize(&mut self, factory: &mut dyn NativeFactory) -> Result<ViewId, ProxyError> {
        self.ensure_surface(factory)?;
        Ok(self.base.binding_mut().view_mut()?.id())
    }

    /// Realize the surface if needed; a fresh surface gets a layout pass and
    /// the committed offset restored.
    fn ensure_surface(&mut self, factory: &mut dyn NativeFactory) -> Result<(), ProxyError> {
        let (id, type_name) = (self.base.id(), self.base.type_name());
        let fresh = self
            .base
            .binding_mut()
            .ensure_realized(|| factory.create_scroll_surface(id, type_name))?;
        if fresh {
            let native = self.base.binding_mut().view_mut()?;
            self.transform
                .layout_children_after_content_size(false, native)
                .map_err(ProxyError::Native)?;
            let offset = self.transform.offset();
            self.transform
                .set_content_offset(offset, false, native)
                .map_err(ProxyError::Native)?;
        }
        Ok(())
    }

    /// Apply a content-offset request, clamped into the valid range.
    ///
    /// Returns the committed offset if it changed. Animated requests return
    /// `None` here; the offset commits in
    /// [`finish_transition`](Self::finish_transition).
    pub fn set_content_offset(
        &mut self,
        requested: Point,
        animated: bool,
        factory: &mut dyn NativeFactory,
    ) -> Result<Option<Point>, ProxyError> {
        self.ensure_surface(factory)?;
        let native = self.base.binding_mut().view_mut()?;
        self.transform
            .set_content_offset(requested, animated, native)
            .map_err(ProxyError::Native)
    }

    /// Scroll to the top-most valid offset.
    pub fn scroll_to_top(
        &mut self,
        animated: bool,
        factory: &mut dyn NativeFactory,
    ) -> Result<Option<Point>, ProxyError> {
        let target = self.transform.min_offset();
        self.set_content_offset(target, animated, factory)
    }

    /// Scroll to the bottom-most valid offset.
    pub fn scroll_to_bottom(
        &mut self,
        animated: bool,
        factory: &mut dyn NativeFactory,
    ) -> Result<Option<Point>, ProxyError> {
        let target = self.transform.max_offset();
        self.set_content_offset(target, animated, factory)
    }

    /// Toolkit callback: an animated offset transition completed.
    pub fn finish_transition(&mut self, generation: u64) -> Option<Point> {
        self.transform.finish_transition(generation)
    }

    pub fn set_content_insets(
        &mut self,
        insets: Insets,
        animated: bool,
        factory: &mut dyn NativeFactory,
    ) -> Result<Option<Point>, ProxyError> {
        self.ensure_surface(factory)?;
        let native = self.base.binding_mut().view_mut()?;
        self.transform
            .set_content_insets(insets, animated, native)
            .map_err(ProxyError::Native)
    }

    pub fn set_zoom_scale(
        &mut self,
        scale: f64,
        animated: bool,
        factory: &mut dyn NativeFactory,
    ) -> Result<Option<Point>, ProxyError> {
        self.ensure_surface(factory)?;
        let native = self.base.binding_mut().view_mut()?;
        self.transform
            .set_zoom_scale(scale, animated, native)
            .map_err(ProxyError::Native)
    }

    /// Re-measure content and conditionally re-layout. Returns whether a
    /// layout pass ran.
    pub fn layout_children(
        &mut self,
        optimize: bool,
        factory: &mut dyn NativeFactory,
    ) -> Result<bool, ProxyError> {
        self.ensure_surface(factory)?;
        let native = self.base.binding_mut().view_mut()?;
        self.transform
            .layout_children_after_content_size(optimize, native)
            .map_err(ProxyError::Native)
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

#[cfg(test)]
mod tests {
    use super::*;
    use mezzo_harness::{NativeCall, RecordingToolkit};

    fn scroll(toolkit: &mut RecordingToolkit, content: Size) -> ScrollProxy {
        let mut proxy = ScrollProxy::new(Size::new(100.0, 100.0), (0.5, 3.0));
        toolkit.set_default_content_size(content);
        proxy.layout_children(false, toolkit).unwrap();
        proxy
    }

    #[test]
    fn first_mutation_realizes_and_measures() {
        let mut toolkit = RecordingToolkit::new();
        let proxy = scroll(&mut toolkit, Size::new(300.0, 300.0));
        assert_eq!(proxy.transform().content_size(), Size::new(300.0, 300.0));
    }

    #[test]
    fn scroll_to_bottom_targets_the_max_offset() {
        let mut toolkit = RecordingToolkit::new();
        let mut proxy = scroll(&mut toolkit, Size::new(300.0, 300.0));
        let committed = proxy.scroll_to_bottom(false, &mut toolkit).unwrap();
        assert_eq!(committed, Some(Point::new(0.0, 200.0)));
    }

    #[test]
    fn scroll_to_top_returns_to_origin() {
        let mut toolkit = RecordingToolkit::new();
        let mut proxy = scroll(&mut toolkit, Size::new(300.0, 300.0));
        proxy.scroll_to_bottom(false, &mut toolkit).unwrap();
        let committed = proxy.scroll_to_top(false, &mut toolkit).unwrap();
        assert_eq!(committed, Some(Point::ZERO));
        assert_eq!(proxy.transform().offset(), Point::ZERO);
    }

    #[test]
    fn animated_scroll_commits_via_completion() {
        let mut toolkit = RecordingToolkit::new();
        let mut proxy = scroll(&mut toolkit, Size::new(300.0, 300.0));
        let fired = proxy
            .set_content_offset(Point::new(0.0, 80.0), true, &mut toolkit)
            .unwrap();
        assert_eq!(fired, None);
        assert_eq!(proxy.finish_transition(1), Some(Point::new(0.0, 80.0)));
        assert_eq!(proxy.transform().offset(), Point::new(0.0, 80.0));
    }

    #[test]
    fn reattach_restores_the_committed_offset() {
        let mut toolkit = RecordingToolkit::new();
        let mut proxy = scroll(&mut toolkit, Size::new(300.0, 300.0));
        proxy
            .set_content_offset(Point::new(0.0, 150.0), false, &mut toolkit)
            .unwrap();
        proxy.detach().unwrap();
        toolkit.clear_log();
        proxy.layout_children(false, &mut toolkit).unwrap();
        assert!(toolkit.log().iter().any(|call| matches!(
            call,
            NativeCall::ContentOffset { offset, transition: None }
                if *offset == Point::new(0.0, 150.0)
        )));
    }

    #[test]
    fn destroyed_scroll_rejects_mutations() {
        let mut toolkit = RecordingToolkit::new();
        let mut proxy = scroll(&mut toolkit, Size::new(300.0, 300.0));
        proxy.destroy().unwrap();
        assert!(matches!(
            proxy.scroll_to_top(false, &mut toolkit),
            Err(ProxyError::Binding(_))
        ));
    }
}
