//! The runtime context: graph, providers, and the loaded flow program.
//!
//! A [`Runtime`] is constructed once by the host process and passed to
//! whatever needs it — never ambient global state. Flow execution is
//! synchronous: each flow runs to completion on the caller's thread, and
//! its outcome is recorded for later inspection. Scheduling policy
//! (threads, retries, timeouts) belongs to the host, not here.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::FlowError;
use crate::graph::EntityGraph;
use crate::specs::SkillSpecRegistry;

use super::flow::{FlowArgs, FlowOutcome, Routine};
use super::provider::ProviderRegistry;

/// Explicit engine context: entity graph, provider roster, flow program.
#[derive(Debug)]
pub struct Runtime {
    graph: EntityGraph,
    providers: ProviderRegistry,
    program: Vec<Routine>,
    flow_args: HashMap<String, FlowArgs>,
    flow_results: HashMap<String, FlowOutcome>,
}

impl Runtime {
    /// Build a runtime over the given spec registry.
    pub fn new(registry: Arc<SkillSpecRegistry>) -> Self {
        Self {
            graph: EntityGraph::new(registry),
            providers: ProviderRegistry::new(),
            program: Vec::new(),
            flow_args: HashMap::new(),
            flow_results: HashMap::new(),
        }
    }

    /// Build a runtime over the standard skill table.
    pub fn with_standard_registry() -> Self {
        Self::new(SkillSpecRegistry::standard())
    }

    pub fn graph(&self) -> &EntityGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut EntityGraph {
        &mut self.graph
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn providers_mut(&mut self) -> &mut ProviderRegistry {
        &mut self.providers
    }

    /// Replace the loaded program and return the names of its flow-marked
    /// routines. Previously recorded outcomes and args are discarded.
    pub fn load_program(&mut self, routines: Vec<Routine>) -> Vec<String> {
        let flow_names: Vec<String> = routines
            .iter()
            .filter(|r| r.is_flow())
            .map(|r| r.name().to_string())
            .collect();
        tracing::info!(flows = ?flow_names, "loaded program");
        self.program = routines;
        self.flow_args.clear();
        self.flow_results.clear();
        flow_names
    }

    /// Record the keyword arguments a flow should start with.
    pub fn set_flow_args(&mut self, flow_name: impl Into<String>, args: FlowArgs) {
        self.flow_args.insert(flow_name.into(), args);
    }

    /// Run one flow from the loaded program to completion and record its
    /// outcome. A plain (unmarked) routine cannot be started this way.
    pub fn run_flow(&mut self, flow_name: &str) -> Result<FlowOutcome, FlowError> {
        let routine = self
            .program
            .iter()
            .find(|r| r.name() == flow_name)
            .ok_or_else(|| FlowError::UnknownFlow {
                name: flow_name.to_string(),
            })?;
        let flow = match routine {
            Routine::Flow(flow) => flow.clone(),
            Routine::Plain(_) => {
                return Err(FlowError::NotAFlow {
                    name: flow_name.to_string(),
                })
            }
        };
        let args = self.flow_args.get(flow_name).cloned().unwrap_or_default();
        let outcome = flow.run(&mut self.graph, &args);
        self.flow_results.insert(flow_name.to_string(), outcome);
        Ok(outcome)
    }

    /// Run every flow in the loaded program, in program order, and return
    /// the recorded outcomes.
    pub fn run_all_flows(&mut self) -> HashMap<String, FlowOutcome> {
        let names: Vec<String> = self
            .program
            .iter()
            .filter(|r| r.is_flow())
            .map(|r| r.name().to_string())
            .collect();
        for name in names {
            if let Err(e) = self.run_flow(&name) {
                tracing::error!(flow = %name, error = %e, "flow could not be started");
            }
        }
        self.flow_results.clone()
    }

    /// The recorded outcome of a flow, if it has run.
    pub fn flow_result(&self, flow_name: &str) -> Option<FlowOutcome> {
        self.flow_results.get(flow_name).copied()
    }

    /// Flow name to "has completed" for every flow in the program.
    pub fn flow_status(&self) -> HashMap<String, bool> {
        self.program
            .iter()
            .filter(|r| r.is_flow())
            .map(|r| {
                let name = r.name().to_string();
                let done = self.flow_results.contains_key(&name);
                (name, done)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::runtime::flow::{Flow, NamedFn};
    use crate::specs::Value;

    fn success_flow(name: &str) -> Routine {
        Routine::Flow(Flow::new(name, Arc::new(|_g, _a| Ok(FlowOutcome::Success))))
    }

    #[test]
    fn test_load_program_reports_flow_names() {
        let mut rt = Runtime::with_standard_registry();
        let names = rt.load_program(vec![
            success_flow("explore"),
            Routine::Plain(NamedFn {
                name: "helper".to_string(),
                body: Arc::new(|_g, _a| Ok(FlowOutcome::Success)),
            }),
            success_flow("patrol"),
        ]);
        assert_eq!(names, vec!["explore".to_string(), "patrol".to_string()]);
    }

    #[test]
    fn test_run_flow_records_outcome() {
        let mut rt = Runtime::with_standard_registry();
        rt.load_program(vec![success_flow("explore")]);
        assert_eq!(rt.flow_result("explore"), None);
        let outcome = rt.run_flow("explore").unwrap();
        assert_eq!(outcome, FlowOutcome::Success);
        assert_eq!(rt.flow_result("explore"), Some(FlowOutcome::Success));
    }

    #[test]
    fn test_unknown_and_unmarked_flows() {
        let mut rt = Runtime::with_standard_registry();
        rt.load_program(vec![Routine::Plain(NamedFn {
            name: "helper".to_string(),
            body: Arc::new(|_g, _a| Ok(FlowOutcome::Success)),
        })]);
        assert!(matches!(
            rt.run_flow("missing"),
            Err(FlowError::UnknownFlow { .. })
        ));
        assert!(matches!(
            rt.run_flow("helper"),
            Err(FlowError::NotAFlow { .. })
        ));
    }

    #[test]
    fn test_flow_args_threaded_through() {
        let mut rt = Runtime::with_standard_registry();
        rt.load_program(vec![Routine::Flow(Flow::new(
            "goto",
            Arc::new(|_g, args| {
                if args.get("target").is_some() {
                    Ok(FlowOutcome::Success)
                } else {
                    Ok(FlowOutcome::Abort)
                }
            }),
        ))]);
        rt.set_flow_args(
            "goto",
            FlowArgs::from([("target".to_string(), Value::Str("/room/apple".into()))]),
        );
        assert_eq!(rt.run_flow("goto").unwrap(), FlowOutcome::Success);
    }

    #[test]
    fn test_run_all_and_status() {
        let mut rt = Runtime::with_standard_registry();
        rt.load_program(vec![
            success_flow("a"),
            Routine::Flow(Flow::new(
                "b",
                Arc::new(|_g, _a| Err(anyhow::anyhow!("boom"))),
            )),
        ]);
        let status = rt.flow_status();
        assert_eq!(status.get("a"), Some(&false));

        let results = rt.run_all_flows();
        assert_eq!(results.get("a"), Some(&FlowOutcome::Success));
        assert_eq!(results.get("b"), Some(&FlowOutcome::Failure));

        let status = rt.flow_status();
        assert_eq!(status.get("a"), Some(&true));
        assert_eq!(status.get("b"), Some(&true));
    }

    #[test]
    fn test_flow_drives_graph_through_runtime() {
        let mut rt = Runtime::with_standard_registry();
        let root = rt.graph_mut().create_root();
        let room = rt.graph_mut().create_room("room", "lab");
        rt.graph_mut().add_child(root, room).unwrap();

        rt.load_program(vec![Routine::Flow(Flow::new(
            "deploy_ranger",
            Arc::new(|g, _a| {
                let root = match g.root() {
                    Some(root) => root,
                    None => return Ok(FlowOutcome::Abort),
                };
                let room = match g.resolve_path(root, "room")? {
                    Some(room) => room,
                    None => return Ok(FlowOutcome::Abort),
                };
                let ranger = g.create_controllable("ranger");
                g.add_child(room, ranger)?;
                Ok(FlowOutcome::Success)
            }),
        ))]);

        assert_eq!(rt.run_flow("deploy_ranger").unwrap(), FlowOutcome::Success);
        let root = rt.graph().root().unwrap();
        let ranger = rt.graph().resolve_path(root, "room/ranger").unwrap().unwrap();
        assert_eq!(rt.graph().absolute_path(ranger).unwrap(), "/room/ranger");
    }
}
