//! The capability graph: entity nodes, tree relations, path addressing,
//! and skill binding/dispatch.

pub mod dispatch;
pub mod entity;
#[allow(clippy::module_inception)]
pub mod graph;

pub use entity::{
    Entity, EntityId, EntityMetadata, EntityType, RelationType, RoomAttributes, SkillFn,
};
pub use graph::EntityGraph;
