//! Entity nodes of the capability graph.
//!
//! An [`Entity`] is an addressable node representing a physical or logical
//! object: identity, type tag, metadata, typed relations to other entities,
//! and the set of skills currently bound to it. Entities are created through
//! the graph's factories and mutated in place by relation and skill
//! operations; they are never constructed directly by callers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::specs::Value;

/// Type alias for a bound skill implementation.
///
/// A skill implementation is any callable taking the exact keyword-argument
/// set declared in its spec and returning a value matching the output shape.
/// Side effects (driving hardware, calling a simulator) are its own business.
pub type SkillFn = Arc<
    dyn Fn(HashMap<String, Value>) -> Result<Value, Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync,
>;

/// Opaque unique entity identifier, stable for the entity's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(Uuid);

impl EntityId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Informational type tag. Does not gate behavior, except that `Room`
/// entities carry extra attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    Generic,
    Controllable,
    Computing,
    System,
    Human,
    Room,
}

/// Tree relations. These construct the main structure of the tree;
/// auxiliary non-tree relations are reserved for future use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationType {
    ParentOf,
    ChildOf,
}

impl RelationType {
    /// The inverse relation kind, used to keep pairs symmetric.
    pub fn inverse(self) -> RelationType {
        match self {
            RelationType::ParentOf => RelationType::ChildOf,
            RelationType::ChildOf => RelationType::ParentOf,
        }
    }
}

/// Free-form descriptive record, owned exclusively by its entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Extra attributes carried only by `Room` entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAttributes {
    pub capacity: Option<u32>,
    pub room_type: String,
    pub accessible: bool,
}

impl Default for RoomAttributes {
    fn default() -> Self {
        Self {
            capacity: None,
            room_type: "generic".to_string(),
            accessible: true,
        }
    }
}

/// A node in the capability graph.
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) entity_type: EntityType,
    pub(crate) name: String,
    pub(crate) metadata: EntityMetadata,
    /// Relation kind to ordered list of entity references.
    pub(crate) relations: HashMap<RelationType, Vec<EntityId>>,
    /// Skill names in bind order.
    pub(crate) skills: Vec<String>,
    /// Skill name to concrete implementation.
    pub(crate) bindings: HashMap<String, SkillFn>,
    /// Present only on `Room` entities.
    pub(crate) room: Option<RoomAttributes>,
    pub(crate) active: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Entity {
    pub(crate) fn new(entity_type: EntityType, name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: EntityId::generate(),
            entity_type,
            metadata: EntityMetadata {
                name: name.clone(),
                ..EntityMetadata::default()
            },
            name,
            relations: HashMap::from([
                (RelationType::ParentOf, Vec::new()),
                (RelationType::ChildOf, Vec::new()),
            ]),
            skills: Vec::new(),
            bindings: HashMap::new(),
            room: if entity_type == EntityType::Room {
                Some(RoomAttributes::default())
            } else {
                None
            },
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut EntityMetadata {
        self.updated_at = Utc::now();
        &mut self.metadata
    }

    /// Room attributes, present only on `Room` entities.
    pub fn room(&self) -> Option<&RoomAttributes> {
        self.room.as_ref()
    }

    pub fn room_mut(&mut self) -> Option<&mut RoomAttributes> {
        self.updated_at = Utc::now();
        self.room.as_mut()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The ordered references for one relation kind.
    pub fn relations(&self, kind: RelationType) -> &[EntityId] {
        self.relations.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Skill names currently bound, in bind order.
    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn has_skill(&self, name: &str) -> bool {
        self.skills.iter().any(|s| s == name)
    }

    pub(crate) fn add_relation(&mut self, kind: RelationType, target: EntityId) {
        let list = self.relations.entry(kind).or_default();
        if !list.contains(&target) {
            list.push(target);
            self.updated_at = Utc::now();
        }
    }

    pub(crate) fn remove_relation(&mut self, kind: RelationType, target: EntityId) {
        if let Some(list) = self.relations.get_mut(&kind) {
            if let Some(pos) = list.iter().position(|id| *id == target) {
                list.remove(pos);
                self.updated_at = Utc::now();
            }
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("entity_type", &self.entity_type)
            .field("name", &self.name)
            .field("skills", &self.skills)
            .field("room", &self.room)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
