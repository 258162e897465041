//! Orchestration layer: flows, the provider roster, and the runtime
//! context that ties them to an entity graph.

pub mod flow;
pub mod provider;
#[allow(clippy::module_inception)]
pub mod runtime;

pub use flow::{
    flow_critical, flow_debug, flow_error, flow_functions, flow_info, flow_log, flow_warning,
    Flow, FlowArgs, FlowBody, FlowOutcome, NamedFn, Routine,
};
pub use provider::{ProviderRegistry, SkillProvider};
pub use runtime::Runtime;
