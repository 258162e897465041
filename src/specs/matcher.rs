//! Structural type checking and best-effort coercion.
//!
//! Two-phase discipline: [`matches`] decides whether a value already
//! satisfies a shape; when it does not, [`cast`] attempts a repair. The
//! output path of skill dispatch uses [`matches_strict`] and never casts —
//! an implementation that returns the wrong shape is a bug to surface, not
//! to paper over.
//!
//! All three operations are pure: no registry access, no mutation.

use thiserror::Error;

use super::shape::{Primitive, Shape};
use super::value::Value;

/// Failure to coerce a value to a shape, naming the offending field or
/// element where one exists.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CastError {
    pub message: String,
}

impl CastError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn nested(context: impl std::fmt::Display, inner: CastError) -> Self {
        Self {
            message: format!("{}: {}", context, inner.message),
        }
    }
}

/// Input-path check: does `value` structurally satisfy `shape`?
///
/// Record values are compared by nominal type only; their fields are not
/// re-validated here. Enum values must carry the right type name and a
/// declared variant. Mappings require exact key-set equality.
pub fn matches(value: &Value, shape: &Shape) -> bool {
    matches_inner(value, shape, false)
}

/// Output-path check: like [`matches`], but record fields are recursively
/// re-validated against their declared shapes.
pub fn matches_strict(value: &Value, shape: &Shape) -> bool {
    matches_inner(value, shape, true)
}

fn matches_inner(value: &Value, shape: &Shape, strict_records: bool) -> bool {
    match shape {
        Shape::Any => true,
        Shape::Primitive(p) => matches!(
            (p, value),
            (Primitive::Bool, Value::Bool(_))
                | (Primitive::Int, Value::Int(_))
                | (Primitive::Float, Value::Float(_))
                | (Primitive::Str, Value::Str(_))
                | (Primitive::Bytes, Value::Bytes(_))
        ),
        Shape::Enum { name, variants } => match value {
            Value::Enum { type_name, variant } => {
                type_name == name && variants.iter().any(|v| v == variant)
            }
            _ => false,
        },
        Shape::Record { name, fields } => match value {
            Value::Record {
                type_name,
                fields: value_fields,
            } => {
                if type_name != name {
                    return false;
                }
                if !strict_records {
                    return true;
                }
                fields.iter().all(|(field_name, field_shape)| {
                    value_fields
                        .iter()
                        .find(|(k, _)| k == field_name)
                        .is_some_and(|(_, v)| matches_inner(v, field_shape, true))
                })
            }
            _ => false,
        },
        Shape::Mapping { entries } => match value {
            Value::Map(map) => {
                if map.len() != entries.len() {
                    return false;
                }
                entries.iter().all(|(key, entry_shape)| {
                    map.get(key)
                        .is_some_and(|v| matches_inner(v, entry_shape, strict_records))
                })
            }
            _ => false,
        },
        Shape::OpenMap { value: value_shape } => match value {
            Value::Map(map) => map
                .values()
                .all(|v| matches_inner(v, value_shape, strict_records)),
            _ => false,
        },
        Shape::Sequence { elem } => match value {
            Value::List(items) => items
                .iter()
                .all(|v| matches_inner(v, elem, strict_records)),
            _ => false,
        },
        Shape::Tuple { elems } => match value {
            Value::Tuple(items) => {
                items.len() == elems.len()
                    && items
                        .iter()
                        .zip(elems)
                        .all(|(v, s)| matches_inner(v, s, strict_records))
            }
            _ => false,
        },
        Shape::Union { alternatives } => alternatives
            .iter()
            .any(|alt| matches_inner(value, alt, strict_records)),
    }
}

/// Best-effort coercion of `value` toward `shape`.
///
/// Union alternatives are tried in declaration order and the first
/// successful cast wins. Mappings cast each declared field independently;
/// a missing or unexpected key is an error naming the field. Records are
/// never cast — the value must already be the exact nominal type.
pub fn cast(value: &Value, shape: &Shape) -> Result<Value, CastError> {
    match shape {
        Shape::Any => Ok(value.clone()),
        Shape::Primitive(p) => cast_primitive(value, *p),
        Shape::Enum { name, variants } => match value {
            Value::Enum { type_name, variant }
                if type_name == name && variants.iter().any(|v| v == variant) =>
            {
                Ok(value.clone())
            }
            Value::Str(s) if variants.iter().any(|v| v == s) => {
                Ok(Value::enum_variant(name.clone(), s.clone()))
            }
            other => Err(CastError::new(format!(
                "cannot cast {} to enum {}",
                other.type_name(),
                name
            ))),
        },
        Shape::Record { name, .. } => match value {
            Value::Record { type_name, .. } if type_name == name => Ok(value.clone()),
            other => Err(CastError::new(format!(
                "expected record {}, got {}",
                name,
                other.type_name()
            ))),
        },
        Shape::Mapping { entries } => match value {
            Value::Map(map) => {
                for key in map.keys() {
                    if !entries.iter().any(|(k, _)| k == key) {
                        return Err(CastError::new(format!("unexpected field '{}'", key)));
                    }
                }
                let mut out = std::collections::BTreeMap::new();
                for (key, entry_shape) in entries {
                    let field = map
                        .get(key)
                        .ok_or_else(|| CastError::new(format!("missing field '{}'", key)))?;
                    let casted = cast(field, entry_shape)
                        .map_err(|e| CastError::nested(format!("field '{}'", key), e))?;
                    out.insert(key.clone(), casted);
                }
                Ok(Value::Map(out))
            }
            other => Err(CastError::new(format!(
                "expected {}, got {}",
                shape,
                other.type_name()
            ))),
        },
        Shape::OpenMap { value: value_shape } => match value {
            Value::Map(map) => {
                let mut out = std::collections::BTreeMap::new();
                for (key, v) in map {
                    let casted = cast(v, value_shape)
                        .map_err(|e| CastError::nested(format!("field '{}'", key), e))?;
                    out.insert(key.clone(), casted);
                }
                Ok(Value::Map(out))
            }
            other => Err(CastError::new(format!(
                "expected {}, got {}",
                shape,
                other.type_name()
            ))),
        },
        Shape::Sequence { elem } => match value {
            Value::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let casted = cast(item, elem)
                        .map_err(|e| CastError::nested(format!("element {}", i), e))?;
                    out.push(casted);
                }
                Ok(Value::List(out))
            }
            other => Err(CastError::new(format!(
                "expected {}, got {}",
                shape,
                other.type_name()
            ))),
        },
        Shape::Tuple { elems } => {
            // A JSON array arrives as a list; repairing it into a tuple of
            // the right arity is within the cast contract.
            let items = match value {
                Value::Tuple(items) | Value::List(items) => items,
                other => {
                    return Err(CastError::new(format!(
                        "expected {}, got {}",
                        shape,
                        other.type_name()
                    )))
                }
            };
            if items.len() != elems.len() {
                return Err(CastError::new(format!(
                    "expected {} elements for {}, got {}",
                    elems.len(),
                    shape,
                    items.len()
                )));
            }
            let mut out = Vec::with_capacity(items.len());
            for (i, (item, elem_shape)) in items.iter().zip(elems).enumerate() {
                let casted = cast(item, elem_shape)
                    .map_err(|e| CastError::nested(format!("element {}", i), e))?;
                out.push(casted);
            }
            Ok(Value::Tuple(out))
        }
        Shape::Union { alternatives } => {
            for alt in alternatives {
                if let Ok(casted) = cast(value, alt) {
                    return Ok(casted);
                }
            }
            Err(CastError::new(format!(
                "value {} does not match any alternative of {}",
                value, shape
            )))
        }
    }
}

fn cast_primitive(value: &Value, p: Primitive) -> Result<Value, CastError> {
    let err = || {
        CastError::new(format!(
            "cannot cast {} to {}",
            value.type_name(),
            p
        ))
    };
    match p {
        Primitive::Bool => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::Int(i) => Ok(Value::Bool(*i != 0)),
            Value::Str(s) => match s.as_str() {
                "true" | "True" => Ok(Value::Bool(true)),
                "false" | "False" => Ok(Value::Bool(false)),
                _ => Err(err()),
            },
            _ => Err(err()),
        },
        Primitive::Int => match value {
            Value::Int(_) => Ok(value.clone()),
            Value::Float(x) if x.fract() == 0.0 => Ok(Value::Int(*x as i64)),
            Value::Bool(b) => Ok(Value::Int(*b as i64)),
            Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| err()),
            _ => Err(err()),
        },
        Primitive::Float => match value {
            Value::Float(_) => Ok(value.clone()),
            Value::Int(i) => Ok(Value::Float(*i as f64)),
            Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| err()),
            _ => Err(err()),
        },
        Primitive::Str => match value {
            Value::Str(_) => Ok(value.clone()),
            Value::Bool(b) => Ok(Value::Str(b.to_string())),
            Value::Int(i) => Ok(Value::Str(i.to_string())),
            Value::Float(x) => Ok(Value::Str(x.to_string())),
            _ => Err(err()),
        },
        Primitive::Bytes => match value {
            Value::Bytes(_) => Ok(value.clone()),
            _ => Err(err()),
        },
    }
}
