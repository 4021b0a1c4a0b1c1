#![forbid(unsafe_code)]

//! Slider-style control proxy.

use mezzo_backend::{NativeFactory, NativeSlider};
use mezzo_core::{ProxyId, ViewId};

use crate::ProxyError;
use crate::binding::ProxyBase;
use crate::quantizer::{RangePolicy, Reported, StepConfig, ValueQuantizer};

/// Outcome of an accepted value input that crossed into a new step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueChange {
    /// The quantized value (or its step index) to report outward.
    pub reported: Reported,
    /// Whether the change originated from native user input rather than a
    /// programmatic command.
    pub from_user: bool,
}

/// Proxy for a continuous control with optional step quantization.
///
/// The proxy's quantizer is the single source of truth for the reported
/// value; programmatic commands and native user input go through the same
/// quantize-and-suppress path. The proxy works unrealized (value changes
/// are retained and pushed when the control realizes).
#[derive(Debug)]
pub struct SliderProxy {
    base: ProxyBase<dyn NativeSlider>,
    quantizer: ValueQuantizer,
}

impl SliderProxy {
    pub fn new(min: f64, max: f64, policy: RangePolicy) -> Self {
        Self {
            base: ProxyBase::new("Slider"),
            quantizer: ValueQuantizer::new(min, max, policy),
        }
    }

    pub fn id(&self) -> ProxyId {
        self.base.id()
    }

    pub fn base(&self) -> &ProxyBase<dyn NativeSlider> {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut ProxyBase<dyn NativeSlider> {
        &mut self.base
    }

    pub fn quantizer(&self) -> &ValueQuantizer {
        &self.quantizer
    }

    /// The value currently reported outward.
    pub fn reported(&self) -> Reported {
        self.quantizer.reported()
    }

    /// Realize the native control if needed, push the current thumb
    /// position, and return the view identity.
    pub fn realize(&mut self, factory: &mut dyn NativeFactory) -> Result<ViewId, ProxyError> {
        let (id, type_name) = (self.base.id(), self.base.type_name());
        let fresh = self
            .base
            .binding_mut()
            .ensure_realized(|| factory.create_slider(id, type_name))?;
        if fresh {
            let position = self.quantizer.magnitude();
            self.base
                .binding_mut()
                .view_mut()?
                .set_position(position, false)
                .map_err(ProxyError::Native)?;
        }
        Ok(self.base.binding_mut().view_mut()?.id())
    }

    pub fn configure_steps(&mut self, config: StepConfig) -> Result<(), ProxyError> {
        self.base.ensure_alive()?;
        self.quantizer.configure_steps(config)?;
        Ok(())
    }

    pub fn set_snap(&mut self, snap: bool) -> Result<(), ProxyError> {
        self.base.ensure_alive()?;
        self.quantizer.set_snap(snap);
        Ok(())
    }

    pub fn set_step_values(&mut self, step_values: bool) -> Result<(), ProxyError> {
        self.base.ensure_alive()?;
        self.quantizer.set_step_values(step_values);
        Ok(())
    }

    /// Programmatic value change (bridge command), optionally animated.
    ///
    /// Routes through the same quantization and suppression path as
    /// user-driven input.
    pub fn set_value(&mut self, value: f64, animated: bool) -> Result<Option<ValueChange>, ProxyError> {
        self.accept(value, animated, false)
    }

    /// Native-side input event (e.g. a thumb drag).
    ///
    /// Snapping may correct the thumb away from the raw drag position; the
    /// corrected position is pushed back to the control.
    pub fn native_input(&mut self, raw: f64) -> Result<Option<ValueChange>, ProxyError> {
        self.accept(raw, false, true)
    }

    fn accept(
        &mut self,
        value: f64,
        animated: bool,
        from_user: bool,
    ) -> Result<Option<ValueChange>, ProxyError> {
        self.base.ensure_alive()?;
        let fired = self.quantizer.set_raw(value)?;
        if self.base.binding_mut().is_realized() {
            let position = self.quantizer.magnitude();
            // Skip the native push for user input that needed no snap
            // correction; the thumb is already there.
            if !from_user || position != value {
                self.base
                    .binding_mut()
                    .view_mut()?
                    .set_position(position, animated)
                    .map_err(ProxyError::Native)?;
            }
        }
        Ok(fired.map(|reported| ValueChange { reported, from_user }))
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
