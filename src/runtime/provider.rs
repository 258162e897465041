//! Skill provider roster.
//!
//! A provider is a named endpoint advertising the skill names it can back
//! with a concrete implementation. The roster is bookkeeping only — how a
//! host turns a provider entry into bound callables (driver, simulator,
//! remote call) is outside the engine.

use serde::{Deserialize, Serialize};

/// A named endpoint advertising skill implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillProvider {
    pub name: String,
    /// Where the provider lives (host address, node name, ...). Opaque to
    /// the engine.
    pub address: String,
    /// Skill names this provider can implement.
    pub skills: Vec<String>,
}

impl SkillProvider {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        skills: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            skills: skills.into_iter().map(Into::into).collect(),
        }
    }

    pub fn provides(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }
}

/// Ordered roster of skill providers.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<SkillProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, provider: SkillProvider) {
        tracing::debug!(
            provider = %provider.name,
            address = %provider.address,
            skills = ?provider.skills,
            "registered skill provider"
        );
        self.providers.push(provider);
    }

    /// Look up a provider by name; first registration wins on duplicates.
    pub fn get(&self, name: &str) -> Option<&SkillProvider> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Providers advertising the given skill, in registration order.
    pub fn providers_for(&self, skill: &str) -> Vec<&SkillProvider> {
        self.providers.iter().filter(|p| p.provides(skill)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillProvider> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        let mut registry = ProviderRegistry::new();
        registry.add(SkillProvider::new(
            "sim_ranger",
            "10.0.0.5",
            ["c_space_move", "c_space_getpos"],
        ));
        registry.add(SkillProvider::new("camera_node", "10.0.0.6", ["c_camera_rgb"]));

        let p = registry.get("sim_ranger").unwrap();
        assert!(p.provides("c_space_move"));
        assert!(!p.provides("c_camera_rgb"));
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_providers_for_skill() {
        let mut registry = ProviderRegistry::new();
        registry.add(SkillProvider::new("a", "h1", ["c_camera_rgb"]));
        registry.add(SkillProvider::new("b", "h2", ["c_camera_rgb", "c_camera_info"]));
        let names: Vec<&str> = registry
            .providers_for("c_camera_rgb")
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
