//! Skill binding and dispatch.
//!
//! Skills are resolved purely by name in a per-entity table — duck typing
//! by contract. Any entity, whatever its type tag, may bind any registered
//! skill name; the contract is enforced at call time instead: arguments are
//! checked against the input schema (with a best-effort cast on mismatch),
//! the implementation is invoked, and the return value is checked strictly
//! against the output schema with no casting at all.

use std::collections::HashMap;

use chrono::Utc;

use crate::errors::SkillError;
use crate::specs::{cast, matches, matches_strict, Value};

use super::entity::{EntityId, SkillFn};
use super::graph::EntityGraph;

impl EntityGraph {
    /// Bind an implementation to a skill name on an entity.
    ///
    /// The name must exist in the spec registry; otherwise the binding
    /// fails and the entity's skill list is left untouched. Rebinding an
    /// already-bound name replaces the implementation (last writer wins).
    pub fn bind_skill(
        &mut self,
        id: EntityId,
        name: &str,
        func: SkillFn,
    ) -> Result<(), SkillError> {
        if !self.registry.contains(name) {
            return Err(SkillError::UnknownSkill {
                name: name.to_string(),
            });
        }
        let path = self.absolute_path(id)?;
        let entity = self.entity_mut(id)?;
        entity.bindings.insert(name.to_string(), func);
        if !entity.has_skill(name) {
            entity.skills.push(name.to_string());
        }
        entity.updated_at = Utc::now();
        tracing::debug!(path = %path, skill = name, "bound skill");
        Ok(())
    }

    /// Remove a skill binding and its skill-list entry. Unbinding a name
    /// that was never bound is a no-op.
    pub fn unbind_skill(&mut self, id: EntityId, name: &str) -> Result<(), SkillError> {
        let entity = self.entity_mut(id)?;
        entity.bindings.remove(name);
        if let Some(pos) = entity.skills.iter().position(|s| s == name) {
            entity.skills.remove(pos);
            entity.updated_at = Utc::now();
        }
        Ok(())
    }

    /// Invoke a bound skill by name with keyword arguments.
    ///
    /// The pipeline: resolve the binding, validate (and where needed cast)
    /// the arguments against the input schema, call the implementation,
    /// then strictly validate the returned value against the output schema.
    /// Every step logs at the entity's absolute path.
    pub fn invoke_skill(
        &self,
        id: EntityId,
        name: &str,
        args: HashMap<String, Value>,
    ) -> Result<Value, SkillError> {
        let path = self.absolute_path(id)?;
        let entity = self.entity(id)?;
        tracing::debug!(path = %path, skill = name, "calling skill");

        let func = match entity.bindings.get(name) {
            Some(func) => func.clone(),
            None => {
                let err = SkillError::NotBound {
                    name: name.to_string(),
                    path: path.clone(),
                    available: entity.skills.clone(),
                };
                tracing::error!(path = %path, skill = name, "{}", err);
                return Err(err);
            }
        };

        let spec = self
            .registry
            .get(name)
            .ok_or_else(|| SkillError::UnknownSkill {
                name: name.to_string(),
            })?;

        let args = self.check_args(&path, name, spec.input.as_deref(), args)?;

        let result = func(args).map_err(|e| {
            let err = SkillError::Execution {
                name: name.to_string(),
                details: e.to_string(),
            };
            tracing::error!(path = %path, skill = name, "{}", err);
            err
        })?;

        // Strict output check, no casting: what the engine promises callers
        // must be exact.
        if !matches_strict(&result, &spec.output) {
            let err = SkillError::ReturnShape {
                name: name.to_string(),
                details: format!(
                    "return value of type {} does not match expected {}",
                    result.type_name(),
                    spec.output
                ),
            };
            tracing::error!(path = %path, skill = name, "{}", err);
            return Err(err);
        }

        tracing::debug!(path = %path, skill = name, "return value validation passed");
        Ok(result)
    }

    /// Validate keyword arguments against the input schema, casting on
    /// mismatch. Returns the (possibly coerced) argument map.
    fn check_args(
        &self,
        path: &str,
        name: &str,
        input: Option<&[(String, crate::specs::Shape)]>,
        mut args: HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>, SkillError> {
        let entries = match input {
            None => {
                if !args.is_empty() {
                    let mut got: Vec<&String> = args.keys().collect();
                    got.sort();
                    let err = SkillError::Argument {
                        name: name.to_string(),
                        details: format!("expects no arguments, got {:?}", got),
                    };
                    tracing::error!(path = %path, skill = name, "{}", err);
                    return Err(err);
                }
                tracing::debug!(path = %path, skill = name, "argument validation passed (no arguments required)");
                return Ok(args);
            }
            Some(entries) => entries,
        };

        let expected: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        let name_mismatch = args.len() != expected.len()
            || expected.iter().any(|k| !args.contains_key(*k));
        if name_mismatch {
            let mut got: Vec<&String> = args.keys().collect();
            got.sort();
            let err = SkillError::Argument {
                name: name.to_string(),
                details: format!("arguments must be {:?}, got {:?}", expected, got),
            };
            tracing::error!(path = %path, skill = name, "{}", err);
            return Err(err);
        }

        for (arg_name, shape) in entries {
            let value = match args.get(arg_name) {
                Some(value) => value,
                None => continue,
            };
            if matches(value, shape) {
                continue;
            }
            match cast(value, shape) {
                Ok(casted) => {
                    tracing::warn!(
                        path = %path,
                        skill = name,
                        argument = %arg_name,
                        from = %value.type_name(),
                        to = %casted.type_name(),
                        "cast argument to expected shape"
                    );
                    args.insert(arg_name.clone(), casted);
                }
                Err(cast_err) => {
                    let err = SkillError::Type {
                        name: name.to_string(),
                        details: format!(
                            "argument '{}' must be {}, got {} ({})",
                            arg_name,
                            shape,
                            value.type_name(),
                            cast_err
                        ),
                    };
                    tracing::error!(path = %path, skill = name, "{}", err);
                    return Err(err);
                }
            }
        }

        tracing::debug!(path = %path, skill = name, "argument validation passed");
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::errors::SkillError;
    use crate::specs::Value;

    fn graph_with_robot() -> (EntityGraph, EntityId) {
        let mut g = EntityGraph::with_standard_registry();
        let root = g.create_root();
        let room = g.create_room("room", "generic");
        let robot = g.create_controllable("ranger");
        g.add_child(root, room).unwrap();
        g.add_child(room, robot).unwrap();
        (g, robot)
    }

    fn getpos_ok() -> SkillFn {
        Arc::new(|_args| {
            Ok(Value::map([
                ("x", Value::Float(1.0)),
                ("y", Value::Float(2.0)),
                ("z", Value::Float(3.0)),
            ]))
        })
    }

    #[test]
    fn test_bind_unknown_name_leaves_skills_unchanged() {
        let (mut g, robot) = graph_with_robot();
        let err = g.bind_skill(robot, "c_teleport", getpos_ok()).unwrap_err();
        assert!(matches!(err, SkillError::UnknownSkill { .. }));
        assert!(g.entity(robot).unwrap().skills().is_empty());
    }

    #[test]
    fn test_invoke_unbound_lists_available() {
        let (mut g, robot) = graph_with_robot();
        g.bind_skill(robot, "c_space_getpos", getpos_ok()).unwrap();
        let err = g
            .invoke_skill(robot, "c_space_move", HashMap::new())
            .unwrap_err();
        match err {
            SkillError::NotBound {
                path, available, ..
            } => {
                assert_eq!(path, "/room/ranger");
                assert_eq!(available, vec!["c_space_getpos".to_string()]);
            }
            other => panic!("expected NotBound, got {:?}", other),
        }
    }

    #[test]
    fn test_invoke_happy_path() {
        let (mut g, robot) = graph_with_robot();
        g.bind_skill(robot, "c_space_getpos", getpos_ok()).unwrap();
        let result = g
            .invoke_skill(robot, "c_space_getpos", HashMap::new())
            .unwrap();
        assert_eq!(result.get("x"), Some(&Value::Float(1.0)));
    }

    #[test]
    fn test_no_arg_skill_rejects_args() {
        let (mut g, robot) = graph_with_robot();
        g.bind_skill(robot, "c_space_getpos", getpos_ok()).unwrap();
        let args = HashMap::from([("x".to_string(), Value::Float(0.0))]);
        let err = g.invoke_skill(robot, "c_space_getpos", args).unwrap_err();
        assert!(matches!(err, SkillError::Argument { .. }));
        assert!(err.to_string().contains("expects no arguments"));
    }

    #[test]
    fn test_missing_argument_is_argument_error() {
        let (mut g, robot) = graph_with_robot();
        g.bind_skill(
            robot,
            "c_space_move",
            Arc::new(|_args| Ok(Value::map([("success", Value::Bool(true))]))),
        )
        .unwrap();
        let args = HashMap::from([("x".to_string(), Value::Float(0.0))]);
        let err = g.invoke_skill(robot, "c_space_move", args).unwrap_err();
        match &err {
            SkillError::Argument { details, .. } => {
                assert!(details.contains("arguments must be"), "{}", details);
            }
            other => panic!("expected Argument, got {:?}", other),
        }
        assert!(err.to_string().ends_with("(skill: c_space_move)"));
    }

    #[test]
    fn test_castable_arguments_reach_impl_coerced() {
        let (mut g, robot) = graph_with_robot();
        g.bind_skill(
            robot,
            "c_space_move",
            Arc::new(|args| {
                // The implementation must see floats, not the caller's loose types.
                for key in ["x", "y", "z"] {
                    assert!(matches!(args.get(key), Some(Value::Float(_))), "{}", key);
                }
                Ok(Value::map([("success", Value::Bool(true))]))
            }),
        )
        .unwrap();
        let args = HashMap::from([
            ("x".to_string(), Value::Int(1)),
            ("y".to_string(), Value::Str("2.5".to_string())),
            ("z".to_string(), Value::Float(3.0)),
        ]);
        let result = g.invoke_skill(robot, "c_space_move", args).unwrap();
        assert_eq!(result.get("success"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_uncastable_argument_is_type_error() {
        let (mut g, robot) = graph_with_robot();
        g.bind_skill(
            robot,
            "c_space_move",
            Arc::new(|_args| Ok(Value::map([("success", Value::Bool(true))]))),
        )
        .unwrap();
        let args = HashMap::from([
            ("x".to_string(), Value::Str("north".to_string())),
            ("y".to_string(), Value::Float(0.0)),
            ("z".to_string(), Value::Float(0.0)),
        ]);
        let err = g.invoke_skill(robot, "c_space_move", args).unwrap_err();
        match &err {
            SkillError::Type { details, .. } => {
                assert!(details.contains("argument 'x'"), "{}", details);
            }
            other => panic!("expected Type, got {:?}", other),
        }
    }

    #[test]
    fn test_strict_output_no_cast() {
        let (mut g, robot) = graph_with_robot();
        // x comes back as an int; the output contract says float. Output
        // validation never casts, so this must fail.
        g.bind_skill(
            robot,
            "c_space_getpos",
            Arc::new(|_args| {
                Ok(Value::map([
                    ("x", Value::Int(1)),
                    ("y", Value::Float(2.0)),
                    ("z", Value::Float(3.0)),
                ]))
            }),
        )
        .unwrap();
        let err = g
            .invoke_skill(robot, "c_space_getpos", HashMap::new())
            .unwrap_err();
        assert!(matches!(err, SkillError::ReturnShape { .. }));
    }

    #[test]
    fn test_output_missing_key_is_return_shape_error() {
        let (mut g, robot) = graph_with_robot();
        g.bind_skill(
            robot,
            "c_space_getpos",
            Arc::new(|_args| {
                Ok(Value::map([
                    ("x", Value::Float(1.0)),
                    ("y", Value::Float(2.0)),
                ]))
            }),
        )
        .unwrap();
        let err = g
            .invoke_skill(robot, "c_space_getpos", HashMap::new())
            .unwrap_err();
        match &err {
            SkillError::ReturnShape { details, .. } => {
                assert!(details.contains("does not match"), "{}", details);
            }
            other => panic!("expected ReturnShape, got {:?}", other),
        }
    }

    #[test]
    fn test_union_argument_accepts_both_forms() {
        let (mut g, robot) = graph_with_robot();
        g.bind_skill(
            robot,
            "s_space_move2entity",
            Arc::new(|_args| Ok(Value::map([("success", Value::Bool(true))]))),
        )
        .unwrap();

        let bare = HashMap::from([
            (
                "target_entity".to_string(),
                Value::Str("/room/apple".to_string()),
            ),
            ("distance".to_string(), Value::Float(0.5)),
        ]);
        g.invoke_skill(robot, "s_space_move2entity", bare).unwrap();

        let wrapped = HashMap::from([
            (
                "target_entity".to_string(),
                Value::map([
                    ("entity", Value::Str("/room/apple".to_string())),
                    (
                        "required",
                        Value::List(vec![Value::Str("c_space_getpos".to_string())]),
                    ),
                ]),
            ),
            ("distance".to_string(), Value::Float(0.5)),
        ]);
        g.invoke_skill(robot, "s_space_move2entity", wrapped)
            .unwrap();
    }

    #[test]
    fn test_impl_failure_is_execution_error() {
        let (mut g, robot) = graph_with_robot();
        g.bind_skill(
            robot,
            "c_space_getpos",
            Arc::new(|_args| Err("odometry offline".into())),
        )
        .unwrap();
        let err = g
            .invoke_skill(robot, "c_space_getpos", HashMap::new())
            .unwrap_err();
        match &err {
            SkillError::Execution { details, .. } => {
                assert!(details.contains("odometry offline"));
            }
            other => panic!("expected Execution, got {:?}", other),
        }
    }

    #[test]
    fn test_rebind_replaces_implementation() {
        let (mut g, robot) = graph_with_robot();
        g.bind_skill(robot, "c_space_getpos", getpos_ok()).unwrap();
        g.bind_skill(
            robot,
            "c_space_getpos",
            Arc::new(|_args| {
                Ok(Value::map([
                    ("x", Value::Float(9.0)),
                    ("y", Value::Float(9.0)),
                    ("z", Value::Float(9.0)),
                ]))
            }),
        )
        .unwrap();
        // Last writer wins, skill list not duplicated.
        assert_eq!(g.entity(robot).unwrap().skills(), ["c_space_getpos"]);
        let result = g
            .invoke_skill(robot, "c_space_getpos", HashMap::new())
            .unwrap();
        assert_eq!(result.get("x"), Some(&Value::Float(9.0)));
    }

    #[test]
    fn test_unbind_removes_skill() {
        let (mut g, robot) = graph_with_robot();
        g.bind_skill(robot, "c_space_getpos", getpos_ok()).unwrap();
        g.unbind_skill(robot, "c_space_getpos").unwrap();
        assert!(!g.entity(robot).unwrap().has_skill("c_space_getpos"));
        assert!(matches!(
            g.invoke_skill(robot, "c_space_getpos", HashMap::new()),
            Err(SkillError::NotBound { .. })
        ));
    }

    #[test]
    fn test_any_entity_may_bind_any_skill() {
        let mut g = EntityGraph::with_standard_registry();
        let human = g.create_human("alex");
        g.bind_skill(human, "c_space_getpos", getpos_ok()).unwrap();
        assert!(g
            .invoke_skill(human, "c_space_getpos", HashMap::new())
            .is_ok());
    }
}
