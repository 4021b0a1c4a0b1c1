#![forbid(unsafe_code)]

//! Scroll-surface transform coordination.
//!
//! Applies content-offset, inset, and zoom-scale changes to a scrollable
//! surface, clamping every request into the valid range derived from content
//! size, viewport size, insets, and zoom.
//!
//! # Animated transitions
//!
//! An animated offset change is an asynchronous state transition: the
//! coordinator hands the toolkit a generation-stamped target and keeps
//! reporting the old offset as current until the toolkit confirms completion
//! with the same generation. A second call before completion supersedes the
//! in-flight transition — its completion arrives with a stale generation and
//! is ignored; there is no queue of stale targets.

use mezzo_backend::{NativeError, NativeScrollSurface};
use mezzo_core::{Insets, Point, Size};

const ZOOM_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
struct PendingTransition {
    generation: u64,
    target: Point,
}

/// Clamped offset/insets/zoom state for one scrollable surface.
#[derive(Debug)]
pub struct TransformCoordinator {
    viewport: Size,
    offset: Point,
    insets: Insets,
    zoom: f64,
    zoom_min: f64,
    zoom_max: f64,
    content_size: Size,
    /// Last content size a layout pass was applied for; the `optimize` flag
    /// compares against this to skip redundant passes.
    cached_content_size: Option<Size>,
    generation: u64,
    pending: Option<PendingTransition>,
}

impl TransformCoordinator {
    pub fn new(viewport: Size, zoom_bounds: (f64, f64)) -> Self {
        let (zoom_min, zoom_max) = zoom_bounds;
        debug_assert!(zoom_min > 0.0 && zoom_min <= zoom_max, "invalid zoom bounds");
        Self {
            viewport,
            offset: Point::ZERO,
            insets: Insets::ZERO,
            zoom: 1.0f64.clamp(zoom_min, zoom_max),
            zoom_min,
            zoom_max,
            content_size: Size::ZERO,
            cached_content_size: None,
            generation: 0,
            pending: None,
        }
    }

    /// The committed content offset. During an animated transition this is
    /// still the pre-transition offset.
    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn insets(&self) -> Insets {
        self.insets
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn content_size(&self) -> Size {
        self.content_size
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Target of the in-flight animated transition, if any.
    pub fn pending_target(&self) -> Option<Point> {
        self.pending.map(|p| p.target)
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Valid scroll range: insets extend it, zoomed content size bounds it.
    fn scroll_range(&self) -> ((f64, f64), (f64, f64)) {
        let min_x = -self.insets.left;
        let min_y = -self.insets.top;
        let max_x = (self.content_size.width * self.zoom - self.viewport.width
            + self.insets.right)
            .max(min_x);
        let max_y = (self.content_size.height * self.zoom - self.viewport.height
            + self.insets.bottom)
            .max(min_y);
        ((min_x, max_x), (min_y, max_y))
    }

    /// Clamp a requested offset into the valid scroll range.
    pub fn clamp_offset(&self, requested: Point) -> Point {
        let (x_range, y_range) = self.scroll_range();
        requested.clamped(x_range, y_range)
    }

    /// The clamped offset for the bottom-most scroll position.
    pub fn max_offset(&self) -> Point {
        let (x_range, y_range) = self.scroll_range();
        Point::new(x_range.0, y_range.1)
    }

    /// The clamped offset for the top-most scroll position.
    pub fn min_offset(&self) -> Point {
        let (x_range, y_range) = self.scroll_range();
        Point::new(x_range.0, y_range.0)
    }

    /// Apply a content-offset request, clamped into the valid range.
    ///
    /// Non-animated: applies immediately, supersedes any in-flight
    /// transition, and returns the new offset if it changed. Animated:
    /// starts a generation-stamped transition and returns `None`; the
    /// offset commits in [`finish_transition`](Self::finish_transition).
    pub fn set_content_offset(
        &mut self,
        requested: Point,
        animated: bool,
        native: &mut dyn NativeScrollSurface,
    ) -> Result<Option<Point>, NativeError> {
        let target = self.clamp_offset(requested);
        if animated {
            let generation = self.generation + 1;
            native.set_content_offset(target, Some(generation))?;
            self.generation = generation;
            self.pending = Some(PendingTransition { generation, target });
            Ok(None)
        } else {
            native.set_content_offset(target, None)?;
            self.pending = None;
            let changed = target != self.offset;
            self.offset = target;
            Ok(changed.then_some(target))
        }
    }

    /// Toolkit callback: an animated transition reached its target.
    ///
    /// Completions carrying a superseded generation are ignored. Returns the
    /// committed offset if it differs from the previous one.
    pub fn finish_transition(&mut self, generation: u64) -> Option<Point> {
        let pending = self.pending?;
        if pending.generation != generation {
            return None;
        }
        self.pending = None;
        let changed = pending.target != self.offset;
        self.offset = pending.target;
        changed.then_some(pending.target)
    }

    /// Update insets, then re-clamp the committed offset against the new
    /// effective range. Returns the re-clamped offset if it moved.
    pub fn set_content_insets(
        &mut self,
        insets: Insets,
        animated: bool,
        native: &mut dyn NativeScrollSurface,
    ) -> Result<Option<Point>, NativeError> {
        let previous = self.insets;
        native.set_content_insets(insets, animated)?;
        self.insets = insets;
        let reclamped = self.clamp_offset(self.offset);
        if reclamped == self.offset {
            return Ok(None);
        }
        if let Err(err) = native.set_content_offset(reclamped, None) {
            // All-or-nothing: restore the previous insets before surfacing.
            self.insets = previous;
            let _ = native.set_content_insets(previous, false);
            return Err(err);
        }
        self.offset = reclamped;
        Ok(Some(reclamped))
    }

    /// Apply a zoom scale, clamped to the configured bounds.
    ///
    /// A request equal to the current scale is silently ignored to avoid
    /// redundant native work. Zooming out shrinks the scrollable extent, so
    /// the committed offset is re-clamped afterwards; the re-clamped offset
    /// is returned if it moved.
    pub fn set_zoom_scale(
        &mut self,
        scale: f64,
        animated: bool,
        native: &mut dyn NativeScrollSurface,
    ) -> Result<Option<Point>, NativeError> {
        let clamped = scale.clamp(self.zoom_min, self.zoom_max);
        if (clamped - self.zoom).abs() < ZOOM_EPSILON {
            return Ok(None);
        }
        let previous = self.zoom;
        native.set_zoom_scale(clamped, animated)?;
        self.zoom = clamped;
        let reclamped = self.clamp_offset(self.offset);
        if reclamped == self.offset {
            return Ok(None);
        }
        if let Err(err) = native.set_content_offset(reclamped, None) {
            self.zoom = previous;
            let _ = native.set_zoom_scale(previous, false);
            return Err(err);
        }
        self.offset = reclamped;
        Ok(Some(reclamped))
    }

    /// Recompute content size from children and conditionally re-layout.
    ///
    /// With `optimize` true the native layout pass is skipped when the
    /// measured size is unchanged from the cached one; with `optimize` false
    /// the pass always runs. Returns whether a layout pass was performed.
    pub fn layout_children_after_content_size(
        &mut self,
        optimize: bool,
        native: &mut dyn NativeScrollSurface,
    ) -> Result<bool, NativeError> {
        let measured = native.content_size();
        if optimize && self.cached_content_size == Some(measured) {
            return Ok(false);
        }
        native.request_layout()?;
        self.content_size = measured;
        self.cached_content_size = Some(measured);
        // A smaller content area can leave the committed offset out of
        // range; keep reads consistent with the clamp invariant.
        self.offset = self.clamp_offset(self.offset);
        Ok(true)
    }
}
