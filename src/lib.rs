//! # capgraph
//!
//! A capability graph and skill-dispatch engine for embodied environments.
//!
//! The engine models a physical or virtual environment as a rooted tree of
//! addressable entities (rooms, devices, agents). Each entity can bind
//! named, schema-checked skills at runtime — a hardware driver, a simulator
//! stub, or a remote call — and invoke them with argument and return-value
//! validation against declarative shape specs. Flows wrap orchestration
//! logic into guarded units reporting a tri-state outcome.
//!
//! The whole engine is a single in-process object graph with synchronous
//! calls: no transport, no persistence, no concurrency contract.

pub mod errors;
pub mod graph;
pub mod logging;
pub mod runtime;
pub mod specs;

pub use errors::{FlowError, GraphError, SkillError};
pub use graph::{Entity, EntityGraph, EntityId, EntityMetadata, EntityType, RelationType, SkillFn};
pub use runtime::{Flow, FlowArgs, FlowOutcome, Routine, Runtime, SkillProvider};
pub use specs::{Shape, SkillSpec, SkillSpecRegistry, Value};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
