//! Flow wrapping: guarded units of orchestration logic.
//!
//! A flow is control logic that drives entities through their skills. The
//! [`Flow`] wrapper is the engine's single error-recovery boundary: any
//! error escaping the body is caught, logged with full context, and
//! converted into [`FlowOutcome::Failure`]. Everywhere else in the engine,
//! errors propagate to the caller.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::graph::EntityGraph;
use crate::logging::LogLevel;
use crate::specs::Value;

/// The closed tri-state outcome domain of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowOutcome {
    Success,
    Failure,
    Abort,
}

impl fmt::Display for FlowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowOutcome::Success => "success",
            FlowOutcome::Failure => "failure",
            FlowOutcome::Abort => "abort",
        };
        write!(f, "{}", name)
    }
}

/// Keyword arguments handed to a flow at start time.
pub type FlowArgs = HashMap<String, Value>;

/// Type alias for a flow body.
///
/// The body reports its outcome explicitly; returning `Err` is reserved for
/// genuinely unhandled failures, which the wrapper converts to `Failure`.
pub type FlowBody = Arc<
    dyn Fn(&mut EntityGraph, &FlowArgs) -> Result<FlowOutcome, anyhow::Error> + Send + Sync,
>;

/// A named, guarded unit of orchestration logic.
#[derive(Clone)]
pub struct Flow {
    name: String,
    body: FlowBody,
}

impl Flow {
    /// Wrap a body as a flow. Wrapping is what makes a routine discoverable
    /// by [`flow_functions`].
    pub fn new(name: impl Into<String>, body: FlowBody) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the flow to completion on the caller's thread.
    ///
    /// An `Ok` outcome passes through unchanged (including `Abort`); an
    /// `Err` is logged at ERROR and becomes `Failure`. No error payload
    /// survives the conversion — only the fact of failure.
    pub fn run(&self, graph: &mut EntityGraph, args: &FlowArgs) -> FlowOutcome {
        tracing::debug!(flow = %self.name, thread = %thread_label(), "flow started");
        match (self.body)(graph, args) {
            Ok(outcome) => {
                tracing::debug!(flow = %self.name, outcome = %outcome, "flow finished");
                outcome
            }
            Err(e) => {
                tracing::error!(
                    flow = %self.name,
                    thread = %thread_label(),
                    error = %e,
                    "flow failed"
                );
                FlowOutcome::Failure
            }
        }
    }
}

impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flow").field("name", &self.name).finish()
    }
}

/// A plain callable with no flow guarantees.
#[derive(Clone)]
pub struct NamedFn {
    pub name: String,
    pub body: FlowBody,
}

impl fmt::Debug for NamedFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedFn").field("name", &self.name).finish()
    }
}

/// A candidate routine an external scheduler may hold: either a wrapped
/// flow (carrying the marker) or a plain function.
#[derive(Debug, Clone)]
pub enum Routine {
    Flow(Flow),
    Plain(NamedFn),
}

impl Routine {
    pub fn name(&self) -> &str {
        match self {
            Routine::Flow(flow) => flow.name(),
            Routine::Plain(f) => &f.name,
        }
    }

    pub fn is_flow(&self) -> bool {
        matches!(self, Routine::Flow(_))
    }
}

/// Enumerate exactly the flow-marked routines among the candidates, in
/// order, for later scheduling by an external collaborator.
pub fn flow_functions(routines: &[Routine]) -> Vec<&Flow> {
    routines
        .iter()
        .filter_map(|r| match r {
            Routine::Flow(flow) => Some(flow),
            Routine::Plain(_) => None,
        })
        .collect()
}

fn thread_label() -> String {
    std::thread::current().name().unwrap_or("unnamed").to_string()
}

// ---------------------------------------------------------------------------
// Flow-scoped diagnostics
// ---------------------------------------------------------------------------

/// Emit a log line tagged with the flow name and the calling thread.
///
/// The thread label is purely diagnostic; it plays no coordination role.
pub fn flow_log(flow: &str, level: LogLevel, message: &str) {
    let thread = thread_label();
    match level {
        LogLevel::Debug => tracing::debug!(flow = %flow, thread = %thread, "{}", message),
        LogLevel::Info => tracing::info!(flow = %flow, thread = %thread, "{}", message),
        LogLevel::Warning => tracing::warn!(flow = %flow, thread = %thread, "{}", message),
        LogLevel::Error => tracing::error!(flow = %flow, thread = %thread, "{}", message),
        // tracing has no level above error; keep the label as a field.
        LogLevel::Critical => {
            tracing::error!(flow = %flow, thread = %thread, critical = true, "{}", message)
        }
    }
}

pub fn flow_debug(flow: &str, message: &str) {
    flow_log(flow, LogLevel::Debug, message);
}

pub fn flow_info(flow: &str, message: &str) {
    flow_log(flow, LogLevel::Info, message);
}

pub fn flow_warning(flow: &str, message: &str) {
    flow_log(flow, LogLevel::Warning, message);
}

pub fn flow_error(flow: &str, message: &str) {
    flow_log(flow, LogLevel::Error, message);
}

pub fn flow_critical(flow: &str, message: &str) {
    flow_log(flow, LogLevel::Critical, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> EntityGraph {
        EntityGraph::with_standard_registry()
    }

    #[test]
    fn test_success_passes_through() {
        let flow = Flow::new("noop", Arc::new(|_g, _a| Ok(FlowOutcome::Success)));
        assert_eq!(flow.run(&mut graph(), &FlowArgs::new()), FlowOutcome::Success);
    }

    #[test]
    fn test_abort_passes_through_unchanged() {
        let flow = Flow::new("bail", Arc::new(|_g, _a| Ok(FlowOutcome::Abort)));
        assert_eq!(flow.run(&mut graph(), &FlowArgs::new()), FlowOutcome::Abort);
    }

    #[test]
    fn test_error_becomes_failure_not_panic() {
        let flow = Flow::new(
            "broken",
            Arc::new(|_g, _a| Err(anyhow::anyhow!("skill backend unreachable"))),
        );
        assert_eq!(flow.run(&mut graph(), &FlowArgs::new()), FlowOutcome::Failure);
    }

    #[test]
    fn test_skill_errors_inside_flows_surface_as_failure() {
        let flow = Flow::new(
            "patrol",
            Arc::new(|g, _a| {
                let robot = g.create_controllable("ranger");
                // Nothing bound: the invoke error propagates out of the body
                // and the wrapper converts it.
                g.invoke_skill(robot, "c_space_getpos", Default::default())?;
                Ok(FlowOutcome::Success)
            }),
        );
        assert_eq!(flow.run(&mut graph(), &FlowArgs::new()), FlowOutcome::Failure);
    }

    #[test]
    fn test_flow_functions_filters_marked() {
        let routines = vec![
            Routine::Flow(Flow::new("a", Arc::new(|_g, _a| Ok(FlowOutcome::Success)))),
            Routine::Plain(NamedFn {
                name: "helper".to_string(),
                body: Arc::new(|_g, _a| Ok(FlowOutcome::Success)),
            }),
            Routine::Flow(Flow::new("b", Arc::new(|_g, _a| Ok(FlowOutcome::Success)))),
        ];
        let flows = flow_functions(&routines);
        let names: Vec<&str> = flows.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(routines[0].is_flow());
        assert!(!routines[1].is_flow());
    }

    #[test]
    fn test_flow_args_reach_body() {
        let flow = Flow::new(
            "goto",
            Arc::new(|_g, args| {
                match args.get("distance") {
                    Some(Value::Float(d)) if *d > 0.0 => Ok(FlowOutcome::Success),
                    _ => Ok(FlowOutcome::Abort),
                }
            }),
        );
        let args = FlowArgs::from([("distance".to_string(), Value::Float(0.5))]);
        assert_eq!(flow.run(&mut graph(), &args), FlowOutcome::Success);
        assert_eq!(flow.run(&mut graph(), &FlowArgs::new()), FlowOutcome::Abort);
    }
}
