//! The declarative type-shape vocabulary for skill contracts.
//!
//! A [`Shape`] describes what a skill argument or return value must look
//! like. Shapes are plain data: they are interpreted recursively by the
//! matcher (`specs::matcher`) and never carry behavior of their own.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Scalar shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Primitive {
    Bool,
    Int,
    Float,
    Str,
    Bytes,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Primitive::Bool => "bool",
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Str => "str",
            Primitive::Bytes => "bytes",
        };
        write!(f, "{}", name)
    }
}

/// Recursive structural type description.
///
/// A closed variant set: every schema the engine can express is built from
/// these constructors. `Int` and `Float` are distinct shapes — an integer
/// value does not structurally satisfy a `Float` shape; turning one into the
/// other is the caster's job, and only on the input path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// A scalar.
    Primitive(Primitive),
    /// A nominal enumerated type with a fixed variant list.
    Enum { name: String, variants: Vec<String> },
    /// A nominal record type with named, shaped fields.
    Record {
        name: String,
        fields: Vec<(String, Shape)>,
    },
    /// A string-keyed mapping with an exact key set (no missing, no extra).
    Mapping { entries: Vec<(String, Shape)> },
    /// A string-keyed mapping with arbitrary keys and homogeneous values.
    OpenMap { value: Box<Shape> },
    /// A homogeneous sequence of unconstrained length.
    Sequence { elem: Box<Shape> },
    /// A fixed-arity tuple, checked positionally.
    Tuple { elems: Vec<Shape> },
    /// Alternatives: a value satisfies the union if any alternative accepts it.
    Union { alternatives: Vec<Shape> },
    /// Wildcard: accepts anything.
    Any,
}

impl Shape {
    /// Shorthand for `Shape::Primitive(Primitive::Bool)`.
    pub fn bool() -> Shape {
        Shape::Primitive(Primitive::Bool)
    }

    /// Shorthand for `Shape::Primitive(Primitive::Int)`.
    pub fn int() -> Shape {
        Shape::Primitive(Primitive::Int)
    }

    /// Shorthand for `Shape::Primitive(Primitive::Float)`.
    pub fn float() -> Shape {
        Shape::Primitive(Primitive::Float)
    }

    /// Shorthand for `Shape::Primitive(Primitive::Str)`.
    pub fn str() -> Shape {
        Shape::Primitive(Primitive::Str)
    }

    /// Shorthand for `Shape::Primitive(Primitive::Bytes)`.
    pub fn bytes() -> Shape {
        Shape::Primitive(Primitive::Bytes)
    }

    /// Build an enum shape.
    pub fn enumeration(
        name: impl Into<String>,
        variants: impl IntoIterator<Item = impl Into<String>>,
    ) -> Shape {
        Shape::Enum {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a record shape.
    pub fn record(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (impl Into<String>, Shape)>,
    ) -> Shape {
        Shape::Record {
            name: name.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Build an exact-key-set mapping shape.
    pub fn mapping(entries: impl IntoIterator<Item = (impl Into<String>, Shape)>) -> Shape {
        Shape::Mapping {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Build an open mapping shape (arbitrary keys, homogeneous values).
    pub fn open_map(value: Shape) -> Shape {
        Shape::OpenMap {
            value: Box::new(value),
        }
    }

    /// Build a homogeneous sequence shape.
    pub fn sequence(elem: Shape) -> Shape {
        Shape::Sequence {
            elem: Box::new(elem),
        }
    }

    /// Build a fixed-arity tuple shape.
    pub fn tuple(elems: impl IntoIterator<Item = Shape>) -> Shape {
        Shape::Tuple {
            elems: elems.into_iter().collect(),
        }
    }

    /// Build a union shape.
    pub fn union(alternatives: impl IntoIterator<Item = Shape>) -> Shape {
        Shape::Union {
            alternatives: alternatives.into_iter().collect(),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Primitive(p) => write!(f, "{}", p),
            Shape::Enum { name, .. } => write!(f, "{}", name),
            Shape::Record { name, .. } => write!(f, "{}", name),
            Shape::Mapping { entries } => {
                write!(f, "{{")?;
                for (i, (key, shape)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, shape)?;
                }
                write!(f, "}}")
            }
            Shape::OpenMap { value } => write!(f, "dict[str, {}]", value),
            Shape::Sequence { elem } => write!(f, "list[{}]", elem),
            Shape::Tuple { elems } => {
                write!(f, "(")?;
                for (i, shape) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", shape)?;
                }
                write!(f, ")")
            }
            Shape::Union { alternatives } => {
                write!(f, "one of [")?;
                for (i, shape) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", shape)?;
                }
                write!(f, "]")
            }
            Shape::Any => write!(f, "any"),
        }
    }
}
