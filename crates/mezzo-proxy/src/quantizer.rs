#![forbid(unsafe_code)]

//! Value quantization for control-style views.
//!
//! Maps a continuous raw value onto a constrained reported value: optional
//! snapping to configured step boundaries, optional reporting of the
//! boundary's ordinal index instead of its magnitude, and suppression of
//! outward change notifications while the reported value stays in the same
//! step.
//!
//! # Invariants
//!
//! 1. With snapping enabled the reported value is always one of the
//!    configured boundaries (or its index), never an interpolated value.
//! 2. Nearest-boundary ties break toward the lower boundary,
//!    deterministically.
//! 3. A change notification fires only when the reported value differs from
//!    the last reported value; the last-reported value is updated on every
//!    accepted input regardless, so suppression cannot compound across
//!    close-together updates.
//! 4. The programmatic and interactive input paths share this one
//!    quantize-and-suppress path.

use core::fmt;

/// What to do with a raw value outside `[min, max]`.
///
/// The policy is explicit at construction, never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePolicy {
    /// Out-of-range input is an error.
    Reject,
    /// Out-of-range input is clamped to the nearer bound.
    Clamp,
}

/// The value reported outward after quantization.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Reported {
    Value(f64),
    Index(usize),
}

/// Step boundary configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum StepConfig {
    /// Explicit boundary values; sorted on configuration.
    Boundaries(Vec<f64>),
    /// `count >= 2` equally spaced boundaries across `[min, max]`.
    Count(u32),
}

/// Quantizer contract violations.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantizerError {
    OutOfRange { value: f64, min: f64, max: f64 },
    InvalidStepCount { count: u32 },
}

impl fmt::Display for QuantizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { value, min, max } => {
                write!(f, "value {value} outside configured range [{min}, {max}]")
            }
            Self::InvalidStepCount { count } => {
                write!(f, "step count {count} must be at least 2")
            }
        }
    }
}

impl std::error::Error for QuantizerError {}

/// Continuous-to-constrained value mapper with change suppression.
#[derive(Debug, Clone)]
pub struct ValueQuantizer {
    min: f64,
    max: f64,
    policy: RangePolicy,
    steps: Option<Vec<f64>>,
    snap: bool,
    step_values: bool,
    raw: f64,
    last_fired: Option<Reported>,
}

impl ValueQuantizer {
    /// Create a quantizer over `[min, max]` with the given range policy.
    ///
    /// `min` must be strictly less than `max`.
    pub fn new(min: f64, max: f64, policy: RangePolicy) -> Self {
        debug_assert!(min < max, "quantizer range must be non-empty");
        Self {
            min,
            max,
            policy,
            steps: None,
            snap: false,
            step_values: false,
            raw: min,
            last_fired: None,
        }
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn raw(&self) -> f64 {
        self.raw
    }

    /// Configure step boundaries and enable snapping.
    ///
    /// An empty boundary list clears the configuration (same as
    /// [`clear_steps`](Self::clear_steps)).
    pub fn configure_steps(&mut self, config: StepConfig) -> Result<(), QuantizerError> {
        match config {
            StepConfig::Boundaries(mut boundaries) => {
                if boundaries.is_empty() {
                    self.clear_steps();
                    return Ok(());
                }
                boundaries.sort_by(|a, b| a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal));
                self.steps = Some(boundaries);
                self.snap = true;
                Ok(())
            }
            StepConfig::Count(count) => {
                if count < 2 {
                    return Err(QuantizerError::InvalidStepCount { count });
                }
                let span = self.max - self.min;
                let boundaries = (0..count)
                    .map(|i| self.min + span * f64::from(i) / f64::from(count - 1))
                    .collect();
                self.steps = Some(boundaries);
                self.snap = true;
                Ok(())
            }
        }
    }

    /// Drop step boundaries and disable snapping.
    pub fn clear_steps(&mut self) {
        self.steps = None;
        self.snap = false;
    }

    pub fn set_snap(&mut self, snap: bool) {
        self.snap = snap;
    }

    pub fn set_step_values(&mut self, step_values: bool) {
        self.step_values = step_values;
    }

    /// Nearest boundary to `value`; ties keep the lower boundary because the
    /// scan over the ascending-sorted list only replaces on strictly smaller
    /// distance.
    fn nearest(&self, value: f64) -> Option<(usize, f64)> {
        let steps = self.steps.as_deref().filter(|s| !s.is_empty())?;
        let mut best = (0, steps[0]);
        let mut best_distance = (value - steps[0]).abs();
        for (index, &boundary) in steps.iter().enumerate().skip(1) {
            let distance = (value - boundary).abs();
            if distance < best_distance {
                best_distance = distance;
                best = (index, boundary);
            }
        }
        Some(best)
    }

    /// The snapped magnitude for the native control's thumb position.
    ///
    /// Unlike [`reported`](Self::reported) this never turns into an index;
    /// the native side always works in value space.
    pub fn magnitude(&self) -> f64 {
        if self.snap {
            if let Some((_, boundary)) = self.nearest(self.raw) {
                return boundary;
            }
        }
        self.raw
    }

    fn quantize(&self, value: f64) -> Reported {
        if self.snap {
            if let Some((index, boundary)) = self.nearest(value) {
                return if self.step_values {
                    Reported::Index(index)
                } else {
                    Reported::Value(boundary)
                };
            }
        }
        Reported::Value(value)
    }

    /// The value currently reported outward.
    pub fn reported(&self) -> Reported {
        self.quantize(self.raw)
    }

    /// Accept a raw input value.
    ///
    /// Returns `Ok(Some(reported))` when an outward change notification
    /// should fire, `Ok(None)` when the reported value is unchanged (raw
    /// jitter within the same step must not refire). Non-finite input is
    /// rejected under either policy; NaN in particular has no nearest
    /// boundary and no meaningful clamp.
    pub fn set_raw(&mut self, value: f64) -> Result<Option<Reported>, QuantizerError> {
        if !value.is_finite() {
            return Err(QuantizerError::OutOfRange {
                value,
                min: self.min,
                max: self.max,
            });
        }
        let accepted = match self.policy {
            RangePolicy::Reject => {
                if value < self.min || value > self.max {
                    return Err(QuantizerError::OutOfRange {
                        value,
                        min: self.min,
                        max: self.max,
                    });
                }
                value
            }
            RangePolicy::Clamp => value.clamp(self.min, self.max),
        };
        self.raw = accepted;
        let reported = self.quantize(accepted);
        let fired = self.last_fired != Some(reported);
        // Unconditional update, fired or not.
        self.last_fired = Some(reported);
        Ok(fired.then_some(reported))
    }
}
