//! Identifiers of the provisioned runtime, surfaced after the orchestrator
//! finishes.
//!
//! Nothing here feeds back into the identity or the parameters; the values are
//! opaque strings for downstream automation.

use crate::error::{AssemblyError, AssemblyResult};
use crate::workload::RUNTIME_LOGICAL_ID;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// An output the deployment template declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputDeclaration {
    pub key: &'static str,
    /// Attribute of the runtime resource the output reads.
    pub attribute: &'static str,
    pub description: &'static str,
}

pub const RUNTIME_OUTPUTS: [OutputDeclaration; 3] = [
    OutputDeclaration {
        key: "RuntimeArn",
        attribute: "AgentRuntimeArn",
        description: "AgentCore Runtime ARN",
    },
    OutputDeclaration {
        key: "RuntimeId",
        attribute: "AgentRuntimeId",
        description: "AgentCore Runtime ID",
    },
    OutputDeclaration {
        key: "RuntimeVersion",
        attribute: "AgentRuntimeVersion",
        description: "AgentCore Runtime Version",
    },
];

/// Template `Outputs` section for the runtime resource.
pub fn output_declarations() -> Value {
    let outputs: serde_json::Map<String, Value> = RUNTIME_OUTPUTS
        .iter()
        .map(|output| {
            (
                output.key.to_string(),
                json!({
                    "Description": output.description,
                    "Value": { "Fn::GetAtt": [RUNTIME_LOGICAL_ID, output.attribute] },
                }),
            )
        })
        .collect();
    Value::Object(outputs)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
/// The three identifiers reported for a provisioned runtime.
pub struct RuntimeOutputs {
    runtime_arn: String,
    runtime_id: String,
    runtime_version: String,
}

impl RuntimeOutputs {
    /// Capture the identifiers reported by the orchestrator, keyed by output
    /// key. Every identifier must be present and non-empty.
    pub fn emit(reported: &BTreeMap<String, String>) -> AssemblyResult<Self> {
        let field = |key: &str| -> AssemblyResult<String> {
            reported
                .get(key)
                .filter(|value| !value.trim().is_empty())
                .cloned()
                .ok_or_else(|| {
                    AssemblyError::configuration(format!(
                        "provisioned stack did not report output {key}"
                    ))
                })
        };
        let [arn, id, version] = RUNTIME_OUTPUTS;
        Ok(Self {
            runtime_arn: field(arn.key)?,
            runtime_id: field(id.key)?,
            runtime_version: field(version.key)?,
        })
    }

    /// Read outputs in either the orchestrator's list form
    /// (`[{"OutputKey": .., "OutputValue": ..}]`, optionally wrapped in
    /// `{"Outputs": [...]}`) or as a flat key/value object.
    pub fn from_stack_outputs(value: &Value) -> AssemblyResult<Self> {
        let list = match value {
            Value::Array(items) => Some(items),
            Value::Object(map) => map.get("Outputs").and_then(Value::as_array),
            _ => None,
        };

        let mut reported = BTreeMap::new();
        match (list, value) {
            (Some(items), _) => {
                for item in items {
                    let key = item.get("OutputKey").and_then(Value::as_str);
                    let val = item.get("OutputValue").and_then(Value::as_str);
                    if let (Some(key), Some(val)) = (key, val) {
                        reported.insert(key.to_string(), val.to_string());
                    }
                }
            }
            (None, Value::Object(map)) => {
                for (key, val) in map {
                    if let Some(val) = val.as_str() {
                        reported.insert(key.clone(), val.to_string());
                    }
                }
            }
            (None, _) => {
                return Err(AssemblyError::configuration(
                    "stack outputs must be a list or an object",
                ));
            }
        }
        Self::emit(&reported)
    }

    pub fn runtime_arn(&self) -> &str {
        &self.runtime_arn
    }

    pub fn runtime_id(&self) -> &str {
        &self.runtime_id
    }

    pub fn runtime_version(&self) -> &str {
        &self.runtime_version
    }
}

/// Read orchestrator outputs from a JSON file.
pub fn load_runtime_outputs(path: &Path) -> Result<RuntimeOutputs> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    let outputs = RuntimeOutputs::from_stack_outputs(&value)
        .with_context(|| format!("reading runtime outputs from {}", path.display()))?;
    Ok(outputs)
}
