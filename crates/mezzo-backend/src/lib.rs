#![forbid(unsafe_code)]
#![doc = "Backend traits for Mezzo: the boundary between the proxy layer and a native view toolkit."]
#![doc = ""]
#![doc = "The proxy layer never renders, handles gestures, or animates anything itself; it only"]
#![doc = "sequences and validates calls into these traits. Concrete implementations wrap a real"]
#![doc = "toolkit; `mezzo-harness` provides a recording implementation for tests."]

use core::fmt;

use mezzo_core::{Insets, Point, ProxyId, Size, ViewId};

/// Failure reported by the native toolkit for a single primitive operation.
///
/// The proxy layer treats any native failure as grounds to roll back the
/// mutation that triggered it; the message is diagnostic only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    message: String,
}

impl NativeError {
    /// Wrap a toolkit-specific failure description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The toolkit's failure description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "native toolkit error: {}", self.message)
    }
}

impl std::error::Error for NativeError {}

/// A realized native view, owned exclusively by its proxy.
///
/// The view holds only a non-owning [`ProxyId`] back-reference for event
/// routing; its lifetime never exceeds the proxy's.
pub trait NativeView {
    /// Identity of this view instance.
    fn id(&self) -> ViewId;

    /// The proxy this view routes events back to.
    fn proxy(&self) -> ProxyId;

    /// Toolkit type name, used by lifecycle accounting.
    fn type_name(&self) -> &'static str;
}

/// Layout axis of an ordered-composition container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

/// A native container that arranges an ordered list of child views.
///
/// The proxy-side registry is authoritative for child order; these primitives
/// are how it keeps the native child list isomorphic to its own.
pub trait NativeContainer: NativeView {
    /// Set the axis children are laid out along.
    fn set_axis(&mut self, axis: Axis) -> Result<(), NativeError>;

    /// Insert a child at `index` in the native child list.
    ///
    /// `index` is guaranteed by the caller to be in `[0, child_count]`.
    fn insert_child_at(&mut self, child: ViewId, index: usize) -> Result<(), NativeError>;

    /// Remove a child from the native child list.
    fn remove_child(&mut self, child: ViewId) -> Result<(), NativeError>;

    /// Set the gap between `child` and its successor.
    ///
    /// The caller re-derives every gap after a mutation; the container only
    /// stores what it is told.
    fn set_spacing_after(&mut self, child: ViewId, spacing: f64) -> Result<(), NativeError>;

    /// Request a native layout pass for the container.
    fn request_layout(&mut self) -> Result<(), NativeError>;
}

/// A native scrollable surface.
pub trait NativeScrollSurface: NativeView {
    /// Apply a (pre-clamped) content offset.
    ///
    /// With `transition: Some(generation)` the toolkit animates toward the
    /// offset and reports completion back through the coordinator with the
    /// same generation; `None` applies immediately.
    fn set_content_offset(
        &mut self,
        offset: Point,
        transition: Option<u64>,
    ) -> Result<(), NativeError>;

    /// Apply content insets.
    fn set_content_insets(&mut self, insets: Insets, animated: bool) -> Result<(), NativeError>;

    /// Apply a (pre-clamped) zoom scale.
    fn set_zoom_scale(&mut self, scale: f64, animated: bool) -> Result<(), NativeError>;

    /// Measure the current content size from the surface's children.
    fn content_size(&self) -> Size;

    /// Request a native layout pass for the surface.
    fn request_layout(&mut self) -> Result<(), NativeError>;
}

/// A native slider-style control.
pub trait NativeSlider: NativeView {
    /// Move the thumb to a (pre-quantized) position.
    fn set_position(&mut self, value: f64, animated: bool) -> Result<(), NativeError>;
}

/// Factory for realizing native views.
///
/// Each method pairs with one proxy flavor; the returned box is the single
/// owning handle for the view's lifetime.
pub trait NativeFactory {
    /// Create a plain leaf view.
    fn create_view(
        &mut self,
        proxy: ProxyId,
        type_name: &'static str,
    ) -> Result<Box<dyn NativeView>, NativeError>;

    /// Create an ordered-composition container.
    fn create_container(
        &mut self,
        proxy: ProxyId,
        type_name: &'static str,
    ) -> Result<Box<dyn NativeContainer>, NativeError>;

    /// Create a scrollable surface.
    fn create_scroll_surface(
        &mut self,
        proxy: ProxyId,
        type_name: &'static str,
    ) -> Result<Box<dyn NativeScrollSurface>, NativeError>;

    /// Create a slider control.
    fn create_slider(
        &mut self,
        proxy: ProxyId,
        type_name: &'static str,
    ) -> Result<Box<dyn NativeSlider>, NativeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_error_displays_message() {
        let err = NativeError::new("container detached");
        assert_eq!(err.to_string(), "native toolkit error: container detached");
        assert_eq!(err.message(), "container detached");
    }
}
