#![forbid(unsafe_code)]

//! Ordered arranged-children registry.
//!
//! The registry owns the proxy-level order of a composite view's arranged
//! children, independent of the native container's own child list. Positions
//! are dense `0..N-1` by construction (position = vector index), so no
//! sequence of mutations can produce a gap or a duplicate position.
//!
//! Every mutation re-applies the native-side arrangement (child order plus
//! inter-child gaps plus a layout pass). If the native side fails, the
//! registry rolls back to the pre-call state: no partial commit is ever
//! visible to a subsequent read.

use core::fmt;

use mezzo_backend::{NativeContainer, NativeError};
use mezzo_core::{ProxyId, ViewId};
use tracing::warn;

/// One arranged child: which proxy, which realized view, and the optional
/// spacing override for the gap that follows it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrangedEntry {
    child: ProxyId,
    view: ViewId,
    spacing_after: Option<f64>,
}

impl ArrangedEntry {
    pub fn child(&self) -> ProxyId {
        self.child
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn spacing_after(&self) -> Option<f64> {
        self.spacing_after
    }
}

/// Registry invariant violations and native-application failures.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    DuplicateChild { child: ProxyId },
    IndexOutOfRange { index: usize, len: usize },
    NotFound { child: ProxyId },
    NativeApply(NativeError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateChild { child } => {
                write!(f, "child {} is already arranged", child.get())
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for {len} arranged children")
            }
            Self::NotFound { child } => {
                write!(f, "child {} is not arranged", child.get())
            }
            Self::NativeApply(err) => write!(f, "native arrangement failed: {err}"),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NativeApply(err) => Some(err),
            _ => None,
        }
    }
}

/// Proxy-authoritative ordered child list for one composite view.
#[derive(Debug, Default)]
pub struct OrderedChildRegistry {
    entries: Vec<ArrangedEntry>,
    /// Base gap applied between consecutive children unless overridden by a
    /// per-child `spacing_after`.
    spacing: f64,
}

impl OrderedChildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ArrangedEntry] {
        &self.entries
    }

    pub fn contains(&self, child: ProxyId) -> bool {
        self.position_of(child).is_some()
    }

    /// Current position of a child; positions are dense and 0-based.
    pub fn position_of(&self, child: ProxyId) -> Option<usize> {
        self.entries.iter().position(|e| e.child == child)
    }

    pub fn base_spacing(&self) -> f64 {
        self.spacing
    }

    /// Add a child at the end; its position is the current length.
    pub fn append(
        &mut self,
        child: ProxyId,
        view: ViewId,
        native: &mut dyn NativeContainer,
    ) -> Result<(), RegistryError> {
        let index = self.entries.len();
        self.insert_at(child, view, index, native)
    }

    /// Insert a child at `index`; entries at positions >= `index` shift up.
    ///
    /// `index` must be in `[0, len]`. Atomic with respect to readers: on any
    /// native failure the prior order (and native arrangement, best-effort)
    /// is restored before returning.
    pub fn insert_at(
        &mut self,
        child: ProxyId,
        view: ViewId,
        index: usize,
        native: &mut dyn NativeContainer,
    ) -> Result<(), RegistryError> {
        if self.contains(child) {
            return Err(RegistryError::DuplicateChild { child });
        }
        if index > self.entries.len() {
            return Err(RegistryError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        native
            .insert_child_at(view, index)
            .map_err(RegistryError::NativeApply)?;
        self.entries.insert(
            index,
            ArrangedEntry {
                child,
                view,
                spacing_after: None,
            },
        );
        if let Err(err) = self.apply_arrangement(native) {
            warn!(child = child.get(), index, error = %err, "insert rolled back");
            self.entries.remove(index);
            let _ = native.remove_child(view);
            let _ = self.apply_arrangement(native);
            return Err(RegistryError::NativeApply(err));
        }
        Ok(())
    }

    /// Remove a child; subsequent entries renumber down by one.
    pub fn remove(
        &mut self,
        child: ProxyId,
        native: &mut dyn NativeContainer,
    ) -> Result<(), RegistryError> {
        let index = self
            .position_of(child)
            .ok_or(RegistryError::NotFound { child })?;
        let entry = self.entries[index];
        native
            .remove_child(entry.view)
            .map_err(RegistryError::NativeApply)?;
        self.entries.remove(index);
        if let Err(err) = self.apply_arrangement(native) {
            warn!(child = child.get(), index, error = %err, "remove rolled back");
            self.entries.insert(index, entry);
            let _ = native.insert_child_at(entry.view, index);
            let _ = self.apply_arrangement(native);
            return Err(RegistryError::NativeApply(err));
        }
        Ok(())
    }

    /// Override the gap after `child`.
    ///
    /// Spacing after the last entry is accepted but inert ("spacing after"
    /// has no successor); it takes effect if a later insert gives that child
    /// a successor.
    pub fn set_spacing_after(
        &mut self,
        child: ProxyId,
        spacing: f64,
        native: &mut dyn NativeContainer,
    ) -> Result<(), RegistryError> {
        let index = self
            .position_of(child)
            .ok_or(RegistryError::NotFound { child })?;
        let previous = self.entries[index].spacing_after;
        self.entries[index].spacing_after = Some(spacing);
        if index + 1 == self.entries.len() {
            return Ok(());
        }
        if let Err(err) = self.apply_arrangement(native) {
            self.entries[index].spacing_after = previous;
            let _ = self.apply_arrangement(native);
            return Err(RegistryError::NativeApply(err));
        }
        Ok(())
    }

    /// Change the base gap used between children without an override.
    pub fn set_base_spacing(
        &mut self,
        spacing: f64,
        native: &mut dyn NativeContainer,
    ) -> Result<(), RegistryError> {
        let previous = self.spacing;
        self.spacing = spacing;
        if let Err(err) = self.apply_arrangement(native) {
            self.spacing = previous;
            let _ = self.apply_arrangement(native);
            return Err(RegistryError::NativeApply(err));
        }
        Ok(())
    }

    /// Re-derive every inter-child gap and request a layout pass.
    ///
    /// Called after every mutation so the native arrangement stays
    /// isomorphic to the proxy-side order. Also used when a detached
    /// composite re-realizes with a fresh container.
    pub fn apply_arrangement(&self, native: &mut dyn NativeContainer) -> Result<(), NativeError> {
        let len = self.entries.len();
        for entry in self.entries.iter().take(len.saturating_sub(1)) {
            let gap = entry.spacing_after.unwrap_or(self.spacing);
            native.set_spacing_after(entry.view, gap)?;
        }
        native.request_layout()
    }

    /// Push the full child list into a fresh native container, in order.
    pub fn replay_into(&self, native: &mut dyn NativeContainer) -> Result<(), NativeError> {
        for (index, entry) in self.entries.iter().enumerate() {
            native.insert_child_at(entry.view, index)?;
        }
        self.apply_arrangement(native)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mezzo_harness::{NativeCall, RecordingToolkit};

    fn container(toolkit: &mut RecordingToolkit) -> Box<dyn NativeContainer> {
        toolkit
            .create_container(ProxyId::alloc(), "StackView")
            .unwrap()
    }

    fn child() -> (ProxyId, ViewId) {
        (ProxyId::alloc(), ViewId::alloc())
    }

    #[test]
    fn append_assigns_end_position() {
        let mut toolkit = RecordingToolkit::new();
        let mut native = container(&mut toolkit);
        let mut registry = OrderedChildRegistry::new();
        let (a, av) = child();
        let (b, bv) = child();
        registry.append(a, av, native.as_mut()).unwrap();
        registry.append(b, bv, native.as_mut()).unwrap();
        assert_eq!(registry.position_of(a), Some(0));
        assert_eq!(registry.position_of(b), Some(1));
    }

    #[test]
    fn duplicate_append_is_rejected() {
        let mut toolkit = RecordingToolkit::new();
        let mut native = container(&mut toolkit);
        let mut registry = OrderedChildRegistry::new();
        let (a, av) = child();
        registry.append(a, av, native.as_mut()).unwrap();
        assert_eq!(
            registry.append(a, av, native.as_mut()),
            Err(RegistryError::DuplicateChild { child: a })
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn insert_shifts_subsequent_positions() {
        let mut toolkit = RecordingToolkit::new();
        let mut native = container(&mut toolkit);
        let mut registry = OrderedChildRegistry::new();
        let (a, av) = child();
        let (b, bv) = child();
        let (c, cv) = child();
        registry.append(a, av, native.as_mut()).unwrap();
        registry.append(b, bv, native.as_mut()).unwrap();
        registry.insert_at(c, cv, 1, native.as_mut()).unwrap();
        assert_eq!(registry.position_of(a), Some(0));
        assert_eq!(registry.position_of(c), Some(1));
        assert_eq!(registry.position_of(b), Some(2));
    }

    #[test]
    fn insert_past_len_is_out_of_range() {
        let mut toolkit = RecordingToolkit::new();
        let mut native = container(&mut toolkit);
        let mut registry = OrderedChildRegistry::new();
        let (a, av) = child();
        assert_eq!(
            registry.insert_at(a, av, 1, native.as_mut()),
            Err(RegistryError::IndexOutOfRange { index: 1, len: 0 })
        );
    }

    #[test]
    fn remove_unknown_child_is_not_found() {
        let mut toolkit = RecordingToolkit::new();
        let mut native = container(&mut toolkit);
        let mut registry = OrderedChildRegistry::new();
        let (a, _) = child();
        assert_eq!(
            registry.remove(a, native.as_mut()),
            Err(RegistryError::NotFound { child: a })
        );
    }

    #[test]
    fn insert_then_remove_restores_prior_order() {
        let mut toolkit = RecordingToolkit::new();
        let mut native = container(&mut toolkit);
        let mut registry = OrderedChildRegistry::new();
        let (a, av) = child();
        let (b, bv) = child();
        let (c, cv) = child();
        registry.append(a, av, native.as_mut()).unwrap();
        registry.append(b, bv, native.as_mut()).unwrap();
        let before: Vec<_> = registry.entries().iter().map(ArrangedEntry::child).collect();
        registry.insert_at(c, cv, 1, native.as_mut()).unwrap();
        registry.remove(c, native.as_mut()).unwrap();
        let after: Vec<_> = registry.entries().iter().map(ArrangedEntry::child).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn spacing_for_missing_child_is_not_found() {
        let mut toolkit = RecordingToolkit::new();
        let mut native = container(&mut toolkit);
        let mut registry = OrderedChildRegistry::new();
        let (a, _) = child();
        assert_eq!(
            registry.set_spacing_after(a, 8.0, native.as_mut()),
            Err(RegistryError::NotFound { child: a })
        );
    }

    #[test]
    fn spacing_after_last_entry_is_inert() {
        let mut toolkit = RecordingToolkit::new();
        let mut native = container(&mut toolkit);
        let mut registry = OrderedChildRegistry::new();
        let (a, av) = child();
        registry.append(a, av, native.as_mut()).unwrap();
        toolkit.clear_log();
        registry.set_spacing_after(a, 12.0, native.as_mut()).unwrap();
        // Stored, but no native gap push for a child with no successor.
        assert!(toolkit.log().is_empty());
        assert_eq!(registry.entries()[0].spacing_after(), Some(12.0));
    }

    #[test]
    fn stored_spacing_takes_effect_once_child_gains_a_successor() {
        let mut toolkit = RecordingToolkit::new();
        let mut native = container(&mut toolkit);
        let mut registry = OrderedChildRegistry::new();
        let (a, av) = child();
        let (b, bv) = child();
        registry.append(a, av, native.as_mut()).unwrap();
        registry.set_spacing_after(a, 12.0, native.as_mut()).unwrap();
        registry.append(b, bv, native.as_mut()).unwrap();
        assert!(toolkit.log().iter().any(|call| matches!(
            call,
            NativeCall::SpacingAfter { child, spacing } if *child == av && *spacing == 12.0
        )));
    }

    #[test]
    fn failed_native_insert_rolls_back() {
        let mut toolkit = RecordingToolkit::new();
        let mut native = container(&mut toolkit);
        let mut registry = OrderedChildRegistry::new();
        let (a, av) = child();
        registry.append(a, av, native.as_mut()).unwrap();
        let (b, bv) = child();
        toolkit.fail_next("insert_child_at");
        let err = registry.append(b, bv, native.as_mut());
        assert!(matches!(err, Err(RegistryError::NativeApply(_))));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.position_of(a), Some(0));
        assert!(!registry.contains(b));
    }

    #[test]
    fn failed_gap_push_rolls_back_insert() {
        let mut toolkit = RecordingToolkit::new();
        let mut native = container(&mut toolkit);
        let mut registry = OrderedChildRegistry::new();
        let (a, av) = child();
        let (b, bv) = child();
        registry.append(a, av, native.as_mut()).unwrap();
        toolkit.fail_next("set_spacing_after");
        let err = registry.insert_at(b, bv, 0, native.as_mut());
        assert!(matches!(err, Err(RegistryError::NativeApply(_))));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.position_of(a), Some(0));
    }
}
