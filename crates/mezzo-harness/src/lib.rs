#![forbid(unsafe_code)]

//! Recording fake toolkit.
//!
//! [`RecordingToolkit`] implements the backend factory and hands out views
//! that append every primitive native call to a shared log. Tests drive a
//! proxy, then assert on the exact call sequence, inject a one-shot failure
//! with [`RecordingToolkit::fail_next`], or script the content size a
//! surface reports.

use std::sync::{Arc, Mutex, PoisonError};

use ahash::AHashMap;
use mezzo_backend::{
    Axis, NativeContainer, NativeError, NativeFactory, NativeScrollSurface, NativeSlider,
    NativeView,
};
use mezzo_core::{Insets, Point, ProxyId, Size, ViewId};

/// One primitive call observed at the native boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCall {
    SetAxis {
        axis: Axis,
    },
    InsertChild {
        parent: ViewId,
        child: ViewId,
        index: usize,
    },
    RemoveChild {
        parent: ViewId,
        child: ViewId,
    },
    SpacingAfter {
        child: ViewId,
        spacing: f64,
    },
    RequestLayout {
        view: ViewId,
    },
    ContentOffset {
        offset: Point,
        transition: Option<u64>,
    },
    ContentInsets {
        insets: Insets,
        animated: bool,
    },
    ZoomScale {
        scale: f64,
        animated: bool,
    },
    SetPosition {
        value: f64,
        animated: bool,
    },
}

#[derive(Default)]
struct Inner {
    log: Vec<NativeCall>,
    fail_next: Option<String>,
    measured: AHashMap<ViewId, Size>,
    default_content_size: Size,
}

type Shared = Arc<Mutex<Inner>>;

fn lock(shared: &Shared) -> std::sync::MutexGuard<'_, Inner> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn guard(shared: &Shared, op: &str) -> Result<(), NativeError> {
    let mut inner = lock(shared);
    if inner.fail_next.as_deref() == Some(op) {
        inner.fail_next = None;
        return Err(NativeError::new(format!("injected failure in {op}")));
    }
    Ok(())
}

fn record(shared: &Shared, call: NativeCall) {
    lock(shared).log.push(call);
}

/// Fake toolkit that records every native call made through its views.
///
/// Clones share the same log and failure state, so a test can keep a probe
/// clone while a bridge owns the original as its factory.
#[derive(Default, Clone)]
pub struct RecordingToolkit {
    shared: Shared,
}

impl RecordingToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    /// The calls recorded so far, oldest first.
    pub fn log(&self) -> Vec<NativeCall> {
        lock(&self.shared).log.clone()
    }

    pub fn clear_log(&mut self) {
        lock(&self.shared).log.clear();
    }

    /// Make the next native call named `op` fail once (e.g.
    /// `"insert_child_at"`). Calls with other names pass through.
    pub fn fail_next(&mut self, op: &str) {
        lock(&self.shared).fail_next = Some(op.to_owned());
    }

    /// Script the content size one surface reports from measurement.
    pub fn set_measured_size(&mut self, view: ViewId, size: Size) {
        lock(&self.shared).measured.insert(view, size);
    }

    /// Content size reported by surfaces with no scripted measurement,
    /// including ones not yet created.
    pub fn set_default_content_size(&mut self, size: Size) {
        lock(&self.shared).default_content_size = size;
    }

    fn create(&self, proxy: ProxyId, type_name: &'static str, op: &str) -> Result<Recorded, NativeError> {
        guard(&self.shared, op)?;
        Ok(Recorded {
            id: ViewId::alloc(),
            proxy,
            type_name,
            shared: Arc::clone(&self.shared),
        })
    }

    pub fn create_view(
        &mut self,
        proxy: ProxyId,
        type_name: &'static str,
    ) -> Result<Box<dyn NativeView>, NativeError> {
        Ok(Box::new(self.create(proxy, type_name, "create_view")?))
    }

    pub fn create_container(
        &mut self,
        proxy: ProxyId,
        type_name: &'static str,
    ) -> Result<Box<dyn NativeContainer>, NativeError> {
        Ok(Box::new(self.create(proxy, type_name, "create_container")?))
    }

    pub fn create_scroll_surface(
        &mut self,
        proxy: ProxyId,
        type_name: &'static str,
    ) -> Result<Box<dyn NativeScrollSurface>, NativeError> {
        Ok(Box::new(self.create(proxy, type_name, "create_scroll_surface")?))
    }

    pub fn create_slider(
        &mut self,
        proxy: ProxyId,
        type_name: &'static str,
    ) -> Result<Box<dyn NativeSlider>, NativeError> {
        Ok(Box::new(self.create(proxy, type_name, "create_slider")?))
    }
}

impl NativeFactory for RecordingToolkit {
    fn create_view(
        &mut self,
        proxy: ProxyId,
        type_name: &'static str,
    ) -> Result<Box<dyn NativeView>, NativeError> {
        RecordingToolkit::create_view(self, proxy, type_name)
    }

    fn create_container(
        &mut self,
        proxy: ProxyId,
        type_name: &'static str,
    ) -> Result<Box<dyn NativeContainer>, NativeError> {
        RecordingToolkit::create_container(self, proxy, type_name)
    }

    fn create_scroll_surface(
        &mut self,
        proxy: ProxyId,
        type_name: &'static str,
    ) -> Result<Box<dyn NativeScrollSurface>, NativeError> {
        RecordingToolkit::create_scroll_surface(self, proxy, type_name)
    }

    fn create_slider(
        &mut self,
        proxy: ProxyId,
        type_name: &'static str,
    ) -> Result<Box<dyn NativeSlider>, NativeError> {
        RecordingToolkit::create_slider(self, proxy, type_name)
    }
}

/// One fake view; a single struct backs all four view traits.
struct Recorded {
    id: ViewId,
    proxy: ProxyId,
    type_name: &'static str,
    shared: Shared,
}

impl NativeView for Recorded {
    fn id(&self) -> ViewId {
        self.id
    }

    fn proxy(&self) -> ProxyId {
        self.proxy
    }

    fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl NativeContainer for Recorded {
    fn set_axis(&mut self, axis: Axis) -> Result<(), NativeError> {
        guard(&self.shared, "set_axis")?;
        record(&self.shared, NativeCall::SetAxis { axis });
        Ok(())
    }

    fn insert_child_at(&mut self, child: ViewId, index: usize) -> Result<(), NativeError> {
        guard(&self.shared, "insert_child_at")?;
        record(
            &self.shared,
            NativeCall::InsertChild {
                parent: self.id,
                child,
                index,
            },
        );
        Ok(())
    }

    fn remove_child(&mut self, child: ViewId) -> Result<(), NativeError> {
        guard(&self.shared, "remove_child")?;
        record(
            &self.shared,
            NativeCall::RemoveChild {
                parent: self.id,
                child,
            },
        );
        Ok(())
    }

    fn set_spacing_after(&mut self, child: ViewId, spacing: f64) -> Result<(), NativeError> {
        guard(&self.shared, "set_spacing_after")?;
        record(&self.shared, NativeCall::SpacingAfter { child, spacing });
        Ok(())
    }

    fn request_layout(&mut self) -> Result<(), NativeError> {
        guard(&self.shared, "request_layout")?;
        record(&self.shared, NativeCall::RequestLayout { view: self.id });
        Ok(())
    }
}

impl NativeScrollSurface for Recorded {
    fn set_content_offset(
        &mut self,
        offset: Point,
        transition: Option<u64>,
    ) -> Result<(), NativeError> {
        guard(&self.shared, "set_content_offset")?;
        record(&self.shared, NativeCall::ContentOffset { offset, transition });
        Ok(())
    }

    fn set_content_insets(&mut self, insets: Insets, animated: bool) -> Result<(), NativeError> {
        guard(&self.shared, "set_content_insets")?;
        record(&self.shared, NativeCall::ContentInsets { insets, animated });
        Ok(())
    }

    fn set_zoom_scale(&mut self, scale: f64, animated: bool) -> Result<(), NativeError> {
        guard(&self.shared, "set_zoom_scale")?;
        record(&self.shared, NativeCall::ZoomScale { scale, animated });
        Ok(())
    }

    fn content_size(&self) -> Size {
        let inner = lock(&self.shared);
        inner
            .measured
            .get(&self.id)
            .copied()
            .unwrap_or(inner.default_content_size)
    }

    fn request_layout(&mut self) -> Result<(), NativeError> {
        guard(&self.shared, "request_layout")?;
        record(&self.shared, NativeCall::RequestLayout { view: self.id });
        Ok(())
    }
}

impl NativeSlider for Recorded {
    fn set_position(&mut self, value: f64, animated: bool) -> Result<(), NativeError> {
        guard(&self.shared, "set_position")?;
        record(&self.shared, NativeCall::SetPosition { value, animated });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_record_into_the_shared_log() {
        let mut toolkit = RecordingToolkit::new();
        let mut container = toolkit.create_container(ProxyId::alloc(), "StackView").unwrap();
        let child = ViewId::alloc();
        container.insert_child_at(child, 0).unwrap();
        assert_eq!(
            toolkit.log(),
            vec![NativeCall::InsertChild {
                parent: container.id(),
                child,
                index: 0
            }]
        );
    }

    #[test]
    fn fail_next_fails_exactly_one_matching_call() {
        let mut toolkit = RecordingToolkit::new();
        let mut container = toolkit.create_container(ProxyId::alloc(), "StackView").unwrap();
        toolkit.fail_next("request_layout");
        container.insert_child_at(ViewId::alloc(), 0).unwrap();
        assert!(container.request_layout().is_err());
        assert!(container.request_layout().is_ok());
    }

    #[test]
    fn measured_size_overrides_the_default() {
        let mut toolkit = RecordingToolkit::new();
        toolkit.set_default_content_size(Size::new(10.0, 10.0));
        let surface = toolkit
            .create_scroll_surface(ProxyId::alloc(), "ScrollView")
            .unwrap();
        assert_eq!(surface.content_size(), Size::new(10.0, 10.0));
        toolkit.set_measured_size(surface.id(), Size::new(42.0, 7.0));
        assert_eq!(surface.content_size(), Size::new(42.0, 7.0));
    }
}
