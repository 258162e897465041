//! Skill contracts: the shape vocabulary, the runtime value domain, the
//! structural matcher/caster, and the read-only spec registry.

pub mod matcher;
pub mod shape;
pub mod skill_specs;
pub mod value;

pub use matcher::{cast, matches, matches_strict, CastError};
pub use shape::{Primitive, Shape};
pub use skill_specs::{SkillKind, SkillSpec, SkillSpecRegistry};
pub use value::Value;
