//! The entity graph: an id-keyed arena owning every entity, maintaining the
//! rooted tree through inverse-pair relations, and computing `/`-delimited
//! paths.
//!
//! The graph is the single owner of its entities. A node that loses its path
//! to the root stays in the arena as a logical orphan; nothing prunes it.
//! The engine is single-threaded and synchronous — concurrent mutation of
//! the same graph is not a supported contract.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::GraphError;
use crate::specs::SkillSpecRegistry;

use super::entity::{Entity, EntityId, EntityType, RelationType};

/// The capability graph: entity arena, tree relations, path addressing.
#[derive(Debug)]
pub struct EntityGraph {
    pub(crate) registry: Arc<SkillSpecRegistry>,
    entities: HashMap<EntityId, Entity>,
    root: Option<EntityId>,
}

impl EntityGraph {
    /// Build an empty graph validating against the given spec registry.
    pub fn new(registry: Arc<SkillSpecRegistry>) -> Self {
        Self {
            registry,
            entities: HashMap::new(),
            root: None,
        }
    }

    /// Build an empty graph over the standard skill table.
    pub fn with_standard_registry() -> Self {
        Self::new(SkillSpecRegistry::standard())
    }

    /// The spec registry this graph validates against.
    pub fn registry(&self) -> &SkillSpecRegistry {
        &self.registry
    }

    // -----------------------------------------------------------------------
    // Factories
    // -----------------------------------------------------------------------

    fn create(&mut self, entity_type: EntityType, name: impl Into<String>) -> EntityId {
        let entity = Entity::new(entity_type, name);
        let id = entity.id();
        tracing::debug!(id = %id, name = entity.name(), ?entity_type, "created entity");
        self.entities.insert(id, entity);
        id
    }

    /// Create the synthetic root room, named `/`.
    pub fn create_root(&mut self) -> EntityId {
        let id = self.create(EntityType::Room, "/");
        self.root = Some(id);
        id
    }

    pub fn create_room(&mut self, name: impl Into<String>, room_type: impl Into<String>) -> EntityId {
        let id = self.create(EntityType::Room, name);
        if let Some(entity) = self.entities.get_mut(&id) {
            if let Some(attrs) = entity.room.as_mut() {
                attrs.room_type = room_type.into();
            }
        }
        id
    }

    pub fn create_generic(&mut self, name: impl Into<String>) -> EntityId {
        self.create(EntityType::Generic, name)
    }

    pub fn create_controllable(&mut self, name: impl Into<String>) -> EntityId {
        self.create(EntityType::Controllable, name)
    }

    pub fn create_computing(&mut self, name: impl Into<String>) -> EntityId {
        self.create(EntityType::Computing, name)
    }

    pub fn create_system(&mut self, name: impl Into<String>) -> EntityId {
        self.create(EntityType::System, name)
    }

    pub fn create_human(&mut self, name: impl Into<String>) -> EntityId {
        self.create(EntityType::Human, name)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn entity(&self, id: EntityId) -> Result<&Entity, GraphError> {
        self.entities
            .get(&id)
            .ok_or(GraphError::UnknownEntity { id })
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, GraphError> {
        self.entities
            .get_mut(&id)
            .ok_or(GraphError::UnknownEntity { id })
    }

    /// The synthetic root, if one has been created.
    pub fn root(&self) -> Option<EntityId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    // -----------------------------------------------------------------------
    // Relations (inverse pairs)
    // -----------------------------------------------------------------------

    /// Record `parent` as a parent of `child` and, in the same step,
    /// `child` as a child of `parent`. Re-adding an existing pair is a
    /// no-op.
    pub fn add_parent(&mut self, child: EntityId, parent: EntityId) -> Result<(), GraphError> {
        self.link(child, RelationType::ParentOf, parent)
    }

    /// Record `child` as a child of `parent`, maintaining the inverse pair.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<(), GraphError> {
        self.link(parent, RelationType::ChildOf, child)
    }

    pub fn remove_parent(&mut self, child: EntityId, parent: EntityId) -> Result<(), GraphError> {
        self.unlink(child, RelationType::ParentOf, parent)
    }

    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> Result<(), GraphError> {
        self.unlink(parent, RelationType::ChildOf, child)
    }

    fn link(&mut self, from: EntityId, kind: RelationType, to: EntityId) -> Result<(), GraphError> {
        let from_name = self.entity(from)?.name().to_string();
        self.entity(to)?;
        if from == to {
            return Err(GraphError::SelfRelation { name: from_name });
        }
        self.entity_mut(from)?.add_relation(kind, to);
        self.entity_mut(to)?.add_relation(kind.inverse(), from);
        Ok(())
    }

    fn unlink(
        &mut self,
        from: EntityId,
        kind: RelationType,
        to: EntityId,
    ) -> Result<(), GraphError> {
        self.entity(from)?;
        self.entity(to)?;
        self.entity_mut(from)?.remove_relation(kind, to);
        self.entity_mut(to)?.remove_relation(kind.inverse(), from);
        Ok(())
    }

    /// The entity's parent. At most one element is allowed in the parent
    /// list; finding more is an invariant violation raised here rather than
    /// silently resolved.
    pub fn parent_of(&self, id: EntityId) -> Result<Option<EntityId>, GraphError> {
        let entity = self.entity(id)?;
        let parents = entity.relations(RelationType::ParentOf);
        match parents {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            many => Err(GraphError::MultipleParents {
                name: entity.name().to_string(),
                count: many.len(),
            }),
        }
    }

    /// The entity's children, in insertion order.
    pub fn children_of(&self, id: EntityId) -> Result<&[EntityId], GraphError> {
        Ok(self.entity(id)?.relations(RelationType::ChildOf))
    }

    pub fn is_root(&self, id: EntityId) -> Result<bool, GraphError> {
        Ok(self.parent_of(id)?.is_none())
    }

    // -----------------------------------------------------------------------
    // Paths
    // -----------------------------------------------------------------------

    /// The `/`-joined chain of entity names from the root down to `id`.
    ///
    /// A node with no parent renders as its bare name; a node whose parent
    /// is the synthetic root renders with a single leading `/` (the root's
    /// own name is not repeated).
    pub fn absolute_path(&self, id: EntityId) -> Result<String, GraphError> {
        let mut path = self.entity(id)?.name().to_string();
        let mut current = id;
        loop {
            let parent = match self.parent_of(current)? {
                Some(parent) => parent,
                None => return Ok(path),
            };
            if self.parent_of(parent)?.is_none() {
                return Ok(format!("/{}", path));
            }
            path = format!("{}/{}", self.entity(parent)?.name(), path);
            current = parent;
        }
    }

    /// Resolve a `/`-delimited path of entity names by iterative descent
    /// from `from`. Returns `None` when a segment does not exist; the empty
    /// path (or bare `/`) resolves to `from` itself.
    ///
    /// Resolution is name-based, not id-based: when siblings share a name,
    /// the first match wins. That ambiguity is documented behavior.
    pub fn resolve_path(&self, from: EntityId, path: &str) -> Result<Option<EntityId>, GraphError> {
        self.entity(from)?;
        let mut current = from;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let children = self.children_of(current)?;
            let next = children.iter().copied().find(|child| {
                self.entities
                    .get(child)
                    .map(|e| e.name() == segment)
                    .unwrap_or(false)
            });
            match next {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> EntityGraph {
        EntityGraph::with_standard_registry()
    }

    #[test]
    fn test_inverse_pair_invariant() {
        let mut g = graph();
        let a = g.create_room("a", "generic");
        let b = g.create_generic("b");
        g.add_child(a, b).unwrap();
        assert_eq!(g.parent_of(b).unwrap(), Some(a));
        assert!(g.children_of(a).unwrap().contains(&b));

        // add_parent is the symmetric entry point.
        let mut g = graph();
        let a = g.create_room("a", "generic");
        let b = g.create_generic("b");
        g.add_parent(b, a).unwrap();
        assert_eq!(g.parent_of(b).unwrap(), Some(a));
        assert!(g.children_of(a).unwrap().contains(&b));
    }

    #[test]
    fn test_self_relation_rejected() {
        let mut g = graph();
        let a = g.create_generic("a");
        assert!(matches!(
            g.add_child(a, a),
            Err(GraphError::SelfRelation { .. })
        ));
        assert!(matches!(
            g.add_parent(a, a),
            Err(GraphError::SelfRelation { .. })
        ));
        assert!(g.children_of(a).unwrap().is_empty());
    }

    #[test]
    fn test_remove_is_symmetric() {
        let mut g = graph();
        let a = g.create_room("a", "generic");
        let b = g.create_generic("b");
        g.add_child(a, b).unwrap();
        g.remove_child(a, b).unwrap();
        assert_eq!(g.parent_of(b).unwrap(), None);
        assert!(g.children_of(a).unwrap().is_empty());
    }

    #[test]
    fn test_multiple_parents_raised_on_read() {
        let mut g = graph();
        let p1 = g.create_room("p1", "generic");
        let p2 = g.create_room("p2", "generic");
        let c = g.create_generic("c");
        g.add_parent(c, p1).unwrap();
        g.add_parent(c, p2).unwrap();
        assert!(matches!(
            g.parent_of(c),
            Err(GraphError::MultipleParents { count: 2, .. })
        ));
    }

    #[test]
    fn test_absolute_path_forms() {
        let mut g = graph();
        let root = g.create_root();
        let building = g.create_room("building", "generic");
        let room1 = g.create_room("room1", "generic");
        let apple = g.create_generic("apple");
        g.add_child(root, building).unwrap();
        g.add_child(building, room1).unwrap();
        g.add_child(room1, apple).unwrap();

        assert_eq!(g.absolute_path(root).unwrap(), "/");
        assert_eq!(g.absolute_path(building).unwrap(), "/building");
        assert_eq!(g.absolute_path(room1).unwrap(), "/building/room1");
        assert_eq!(g.absolute_path(apple).unwrap(), "/building/room1/apple");

        // A detached node renders without a leading component.
        let stray = g.create_generic("stray");
        assert_eq!(g.absolute_path(stray).unwrap(), "stray");
    }

    #[test]
    fn test_path_round_trip() {
        let mut g = graph();
        let root = g.create_root();
        let room = g.create_room("room", "generic");
        let ranger = g.create_controllable("ranger");
        g.add_child(root, room).unwrap();
        g.add_child(room, ranger).unwrap();

        let found = g.resolve_path(root, "room/ranger").unwrap().unwrap();
        assert_eq!(found, ranger);
        assert_eq!(g.absolute_path(found).unwrap(), "/room/ranger");

        // Root-relative form round-trips for every reachable entity.
        for id in [room, ranger] {
            let path = g.absolute_path(id).unwrap();
            assert_eq!(g.resolve_path(root, &path).unwrap(), Some(id));
        }
    }

    #[test]
    fn test_resolve_missing_segment() {
        let mut g = graph();
        let root = g.create_root();
        let room = g.create_room("room", "generic");
        g.add_child(root, room).unwrap();
        assert_eq!(g.resolve_path(root, "room/ghost").unwrap(), None);
        assert_eq!(g.resolve_path(root, "elsewhere").unwrap(), None);
    }

    #[test]
    fn test_resolve_empty_path_is_self() {
        let mut g = graph();
        let root = g.create_root();
        assert_eq!(g.resolve_path(root, "").unwrap(), Some(root));
        assert_eq!(g.resolve_path(root, "/").unwrap(), Some(root));
    }

    #[test]
    fn test_duplicate_sibling_first_match_wins() {
        let mut g = graph();
        let root = g.create_root();
        let first = g.create_generic("twin");
        let second = g.create_generic("twin");
        g.add_child(root, first).unwrap();
        g.add_child(root, second).unwrap();
        assert_eq!(g.resolve_path(root, "twin").unwrap(), Some(first));
    }

    #[test]
    fn test_children_in_insertion_order() {
        let mut g = graph();
        let root = g.create_root();
        let kids: Vec<_> = (0..4)
            .map(|i| g.create_generic(format!("kid{}", i)))
            .collect();
        for kid in &kids {
            g.add_child(root, *kid).unwrap();
        }
        assert_eq!(g.children_of(root).unwrap(), kids.as_slice());
    }

    #[test]
    fn test_orphans_are_retained() {
        let mut g = graph();
        let root = g.create_root();
        let node = g.create_generic("node");
        g.add_child(root, node).unwrap();
        g.remove_child(root, node).unwrap();
        // Still owned by the arena, just unreachable from the root.
        assert!(g.entity(node).is_ok());
        assert_eq!(g.resolve_path(root, "node").unwrap(), None);
    }
}
