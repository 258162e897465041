//! Typed engine errors.
//!
//! Every error is raised synchronously to the immediate caller; nothing is
//! retried. The flow wrapper (`runtime::flow`) is the single place where
//! errors are converted into a non-throwing outcome — everywhere else they
//! propagate as these types.

use thiserror::Error;

use crate::graph::entity::EntityId;

/// Structural errors in the entity tree.
#[derive(Debug, Clone, Error)]
pub enum GraphError {
    /// An entity id that the graph does not own.
    #[error("unknown entity: {id}")]
    UnknownEntity { id: EntityId },

    /// An entity may not be its own parent or child.
    #[error("entity '{name}' cannot be its own parent or child")]
    SelfRelation { name: String },

    /// Single-parent invariant violated, detected on read.
    #[error("entity '{name}' has {count} parents")]
    MultipleParents { name: String, count: usize },
}

/// Skill binding and dispatch errors.
///
/// The `Display` rendering is uniform across kinds:
/// `"<ErrorKind>: <details> (skill: <name>)"`.
#[derive(Debug, Clone, Error)]
pub enum SkillError {
    /// The skill name is not declared in the spec registry (binding error).
    #[error("BindingError: '{name}' is not a registered skill (skill: {name})")]
    UnknownSkill { name: String },

    /// The skill is registered but no implementation is bound on this entity.
    #[error(
        "UnboundSkillError: no implementation bound at '{path}', available skills: {available:?} (skill: {name})"
    )]
    NotBound {
        name: String,
        path: String,
        available: Vec<String>,
    },

    /// Missing, extra, or unexpected keyword arguments.
    #[error("ArgumentError: {details} (skill: {name})")]
    Argument { name: String, details: String },

    /// An argument failed both the structural match and the cast attempt.
    #[error("TypeError: {details} (skill: {name})")]
    Type { name: String, details: String },

    /// The implementation returned a value not matching its output schema.
    #[error("ReturnShapeError: {details} (skill: {name})")]
    ReturnShape { name: String, details: String },

    /// The implementation itself failed.
    #[error("ExecutionError: {details} (skill: {name})")]
    Execution { name: String, details: String },

    /// A structural graph error surfaced during binding or dispatch
    /// (unknown entity, broken tree invariant while computing the path).
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl SkillError {
    /// The skill name the error refers to, where one applies.
    pub fn skill_name(&self) -> Option<&str> {
        match self {
            SkillError::UnknownSkill { name }
            | SkillError::NotBound { name, .. }
            | SkillError::Argument { name, .. }
            | SkillError::Type { name, .. }
            | SkillError::ReturnShape { name, .. }
            | SkillError::Execution { name, .. } => Some(name),
            SkillError::Graph(_) => None,
        }
    }
}

/// Errors from running flows through the runtime.
#[derive(Debug, Clone, Error)]
pub enum FlowError {
    /// No routine with that name in the loaded program.
    #[error("flow '{name}' not found in loaded program")]
    UnknownFlow { name: String },

    /// The named routine exists but does not carry the flow marker.
    #[error("routine '{name}' is not a flow")]
    NotAFlow { name: String },
}
