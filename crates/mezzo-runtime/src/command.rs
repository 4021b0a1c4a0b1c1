#![forbid(unsafe_code)]

//! Bridge command decoding.
//!
//! Commands arrive from the scripting bridge as a name plus a loosely-typed
//! JSON argument bundle. Decoding validates and coerces the bundle exactly
//! once, here at the boundary; everything past [`Command`] works with typed,
//! pre-validated values. Malformed arguments fail with [`ArgumentError`] and
//! never touch proxy state.

use core::fmt;

use mezzo_backend::Axis;
use mezzo_core::{Insets, Point, ProxyId};
use mezzo_proxy::StepConfig;
use serde_json::Value;

/// Malformed inbound command arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentError {
    UnknownCommand { name: String },
    MissingField { field: &'static str },
    InvalidField { field: &'static str, expected: &'static str },
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand { name } => write!(f, "unknown command {name:?}"),
            Self::MissingField { field } => write!(f, "missing argument field {field:?}"),
            Self::InvalidField { field, expected } => {
                write!(f, "argument field {field:?} is not {expected}")
            }
        }
    }
}

impl std::error::Error for ArgumentError {}

/// A validated bridge command, ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddArrangedSubview { child: ProxyId },
    InsertArrangedSubview { child: ProxyId, index: usize },
    RemoveArrangedSubview { child: ProxyId },
    SetCustomSpacing { spacing: f64, after: ProxyId },
    SetSpacing { spacing: f64 },
    SetAxis { axis: Axis },
    SetContentOffset { offset: Point, animated: bool },
    SetContentInsets { insets: Insets, animated: bool },
    SetZoomScale { scale: f64, animated: bool },
    ScrollToTop { animated: bool },
    ScrollToBottom { animated: bool },
    SetValue { value: f64, animated: bool },
    SetSteps { config: StepConfig },
    SetSnapToSteps { snap: bool },
    SetStepValues { step_values: bool },
    Detach,
    Destroy,
}

impl Command {
    /// Decode one bridge invocation.
    ///
    /// `args` is expected to be a JSON object (an absent bundle decodes as
    /// an empty one). The `animated` field is optional everywhere and
    /// defaults to false, matching an options dict the script may omit.
    pub fn decode(name: &str, args: &Value) -> Result<Self, ArgumentError> {
        match name {
            "addArrangedSubview" => Ok(Self::AddArrangedSubview {
                child: proxy_field(args, "child")?,
            }),
            "insertArrangedSubview" => Ok(Self::InsertArrangedSubview {
                child: proxy_field(args, "child")?,
                index: usize_field(args, "index")?,
            }),
            "removeArrangedSubview" => Ok(Self::RemoveArrangedSubview {
                child: proxy_field(args, "child")?,
            }),
            "setCustomSpacing" => Ok(Self::SetCustomSpacing {
                spacing: f64_field(args, "spacing")?,
                after: proxy_field(args, "after")?,
            }),
            "setSpacing" => Ok(Self::SetSpacing {
                spacing: f64_field(args, "spacing")?,
            }),
            "setAxis" => Ok(Self::SetAxis {
                axis: axis_field(args, "axis")?,
            }),
            "setContentOffset" => Ok(Self::SetContentOffset {
                offset: point_field(args, "offset")?,
                animated: animated_flag(args)?,
            }),
            "setContentInsets" => Ok(Self::SetContentInsets {
                insets: insets_field(args, "insets")?,
                animated: animated_flag(args)?,
            }),
            "setZoomScale" => Ok(Self::SetZoomScale {
                scale: f64_field(args, "scale")?,
                animated: animated_flag(args)?,
            }),
            "scrollToTop" => Ok(Self::ScrollToTop {
                animated: animated_flag(args)?,
            }),
            "scrollToBottom" => Ok(Self::ScrollToBottom {
                animated: animated_flag(args)?,
            }),
            // Some hosts route the value setter through an underscored
            // internal name; both spellings mean the same command.
            "setValue" | "_setValue" => Ok(Self::SetValue {
                value: f64_field(args, "value")?,
                animated: animated_flag(args)?,
            }),
            "setSteps" => Ok(Self::SetSteps {
                config: steps_field(args, "steps")?,
            }),
            "setSnapToSteps" => Ok(Self::SetSnapToSteps {
                snap: bool_field(args, "snap")?,
            }),
            "setStepValues" => Ok(Self::SetStepValues {
                step_values: bool_field(args, "stepValues")?,
            }),
            "detach" => Ok(Self::Detach),
            "destroy" => Ok(Self::Destroy),
            _ => Err(ArgumentError::UnknownCommand {
                name: name.to_owned(),
            }),
        }
    }
}

fn raw_field<'a>(args: &'a Value, field: &'static str) -> Result<&'a Value, ArgumentError> {
    args.get(field).ok_or(ArgumentError::MissingField { field })
}

fn f64_field(args: &Value, field: &'static str) -> Result<f64, ArgumentError> {
    raw_field(args, field)?
        .as_f64()
        .ok_or(ArgumentError::InvalidField {
            field,
            expected: "a number",
        })
}

fn usize_field(args: &Value, field: &'static str) -> Result<usize, ArgumentError> {
    raw_field(args, field)?
        .as_u64()
        .and_then(|raw| usize::try_from(raw).ok())
        .ok_or(ArgumentError::InvalidField {
            field,
            expected: "a non-negative integer",
        })
}

fn bool_field(args: &Value, field: &'static str) -> Result<bool, ArgumentError> {
    raw_field(args, field)?
        .as_bool()
        .ok_or(ArgumentError::InvalidField {
            field,
            expected: "a boolean",
        })
}

fn proxy_field(args: &Value, field: &'static str) -> Result<ProxyId, ArgumentError> {
    raw_field(args, field)?
        .as_u64()
        .and_then(ProxyId::from_raw)
        .ok_or(ArgumentError::InvalidField {
            field,
            expected: "a proxy reference",
        })
}

fn axis_field(args: &Value, field: &'static str) -> Result<Axis, ArgumentError> {
    match raw_field(args, field)?.as_str() {
        Some("vertical") => Ok(Axis::Vertical),
        Some("horizontal") => Ok(Axis::Horizontal),
        _ => Err(ArgumentError::InvalidField {
            field,
            expected: "\"vertical\" or \"horizontal\"",
        }),
    }
}

fn animated_flag(args: &Value) -> Result<bool, ArgumentError> {
    match args.get("animated") {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(animated)) => Ok(*animated),
        Some(_) => Err(ArgumentError::InvalidField {
            field: "animated",
            expected: "a boolean",
        }),
    }
}

fn point_field(args: &Value, field: &'static str) -> Result<Point, ArgumentError> {
    let raw = raw_field(args, field)?;
    let invalid = ArgumentError::InvalidField {
        field,
        expected: "an {x, y} point",
    };
    let x = raw.get("x").and_then(Value::as_f64).ok_or(invalid.clone())?;
    let y = raw.get("y").and_then(Value::as_f64).ok_or(invalid)?;
    Ok(Point::new(x, y))
}

fn insets_field(args: &Value, field: &'static str) -> Result<Insets, ArgumentError> {
    let raw = raw_field(args, field)?;
    let invalid = || ArgumentError::InvalidField {
        field,
        expected: "a {top, left, bottom, right} inset set",
    };
    // Absent edges default to zero, like a partial options dict.
    let edge = |name: &str| match raw.get(name) {
        None => Ok(0.0),
        Some(value) => value.as_f64().ok_or_else(invalid),
    };
    if !raw.is_object() {
        return Err(invalid());
    }
    Ok(Insets::new(
        edge("top")?,
        edge("left")?,
        edge("bottom")?,
        edge("right")?,
    ))
}

/// `steps` is either an array of boundary values or a count.
fn steps_field(args: &Value, field: &'static str) -> Result<StepConfig, ArgumentError> {
    match raw_field(args, field)? {
        Value::Array(raw) => {
            let mut boundaries = Vec::with_capacity(raw.len());
            for value in raw {
                boundaries.push(value.as_f64().ok_or(ArgumentError::InvalidField {
                    field,
                    expected: "an array of numbers",
                })?);
            }
            Ok(StepConfig::Boundaries(boundaries))
        }
        Value::Number(raw) => raw
            .as_u64()
            .and_then(|count| u32::try_from(count).ok())
            .map(StepConfig::Count)
            .ok_or(ArgumentError::InvalidField {
                field,
                expected: "a step count",
            }),
        _ => Err(ArgumentError::InvalidField {
            field,
            expected: "an array of numbers or a step count",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_insert_with_index() {
        let command = Command::decode(
            "insertArrangedSubview",
            &json!({ "child": 7, "index": 2 }),
        )
        .unwrap();
        assert_eq!(
            command,
            Command::InsertArrangedSubview {
                child: ProxyId::from_raw(7).unwrap(),
                index: 2
            }
        );
    }

    #[test]
    fn animated_defaults_to_false() {
        let command = Command::decode(
            "setContentOffset",
            &json!({ "offset": { "x": 3.0, "y": 4.0 } }),
        )
        .unwrap();
        assert_eq!(
            command,
            Command::SetContentOffset {
                offset: Point::new(3.0, 4.0),
                animated: false
            }
        );
    }

    #[test]
    fn partial_insets_default_missing_edges_to_zero() {
        let command =
            Command::decode("setContentInsets", &json!({ "insets": { "top": 20.0 } })).unwrap();
        assert_eq!(
            command,
            Command::SetContentInsets {
                insets: Insets::new(20.0, 0.0, 0.0, 0.0),
                animated: false
            }
        );
    }

    #[test]
    fn steps_accept_array_or_count() {
        assert_eq!(
            Command::decode("setSteps", &json!({ "steps": [0.0, 50.0, 100.0] })).unwrap(),
            Command::SetSteps {
                config: StepConfig::Boundaries(vec![0.0, 50.0, 100.0])
            }
        );
        assert_eq!(
            Command::decode("setSteps", &json!({ "steps": 5 })).unwrap(),
            Command::SetSteps {
                config: StepConfig::Count(5)
            }
        );
    }

    #[test]
    fn axis_decodes_from_its_string_form() {
        assert_eq!(
            Command::decode("setAxis", &json!({ "axis": "horizontal" })).unwrap(),
            Command::SetAxis {
                axis: Axis::Horizontal
            }
        );
        assert!(Command::decode("setAxis", &json!({ "axis": "diagonal" })).is_err());
    }

    #[test]
    fn underscored_value_setter_is_an_alias() {
        assert_eq!(
            Command::decode("_setValue", &json!({ "value": 0.5, "animated": true })).unwrap(),
            Command::SetValue {
                value: 0.5,
                animated: true
            }
        );
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert_eq!(
            Command::decode("openWindow", &json!({})),
            Err(ArgumentError::UnknownCommand {
                name: "openWindow".to_owned()
            })
        );
    }

    #[test]
    fn missing_and_mistyped_fields_are_distinguished() {
        assert_eq!(
            Command::decode("setValue", &json!({})),
            Err(ArgumentError::MissingField { field: "value" })
        );
        assert_eq!(
            Command::decode("setValue", &json!({ "value": "loud" })),
            Err(ArgumentError::InvalidField {
                field: "value",
                expected: "a number"
            })
        );
    }

    #[test]
    fn zero_proxy_reference_is_invalid() {
        assert_eq!(
            Command::decode("addArrangedSubview", &json!({ "child": 0 })),
            Err(ArgumentError::InvalidField {
                field: "child",
                expected: "a proxy reference"
            })
        );
    }
}
