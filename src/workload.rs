//! The agent runtime resource that runs under the assembled identity.

use crate::parameters::ParameterSet;
use std::collections::BTreeMap;

pub const RUNTIME_LOGICAL_ID: &str = "AgentCoreRuntime";
pub const NETWORK_MODE: &str = "PUBLIC";
pub const PROTOCOL: &str = "HTTP";

/// Workload resource declaration handed to the orchestrator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkloadRuntime {
    pub logical_id: String,
    pub runtime_name: String,
    /// Logical id of the identity this runtime assumes.
    pub identity_ref: String,
    pub environment: BTreeMap<String, String>,
}

impl WorkloadRuntime {
    pub fn new(params: &ParameterSet, identity_ref: impl Into<String>) -> Self {
        Self {
            logical_id: RUNTIME_LOGICAL_ID.to_string(),
            runtime_name: params.runtime_name.clone(),
            identity_ref: identity_ref.into(),
            environment: params.environment(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_runtime_name_and_environment() {
        let mut params = ParameterSet::new("MyAgentRuntime");
        params.tools_system_prompt = Some("prompt".into());
        let workload = WorkloadRuntime::new(&params, "AgentCoreRole");
        assert_eq!(workload.logical_id, RUNTIME_LOGICAL_ID);
        assert_eq!(workload.runtime_name, "MyAgentRuntime");
        assert_eq!(workload.identity_ref, "AgentCoreRole");
        assert_eq!(workload.environment["TOOLS_SYSTEM_PROMPT"], "prompt");
    }
}
