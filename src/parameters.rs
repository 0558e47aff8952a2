//! Deployment parameters supplied once per assembly run.
//!
//! The structs mirror `schema/parameters.schema.json`. Loading validates the
//! raw JSON against the embedded schema first so every violation is reported
//! together, then deserializes into [`ParameterSet`]. Nested optional objects
//! are kept as written here; turning them into validated capability data is
//! the job of [`crate::capability::decide`].

use crate::error::{AssemblyError, AssemblyResult};
use crate::schema_loader::{CompiledSchema, compile_schema};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const PARAMETERS_SCHEMA: &str = include_str!("../schema/parameters.schema.json");
// Longest name whose derived identity name still fits in 64 characters.
const RUNTIME_NAME_MAX_LEN: usize = 42;

pub const TOOLS_SYSTEM_PROMPT_KEY: &str = "TOOLS_SYSTEM_PROMPT";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
/// Full parameter file for one agent runtime deployment.
pub struct ParameterSet {
    pub runtime_name: String,
    /// Location of the workload image sources; only the image build reads it.
    pub application_directory: String,
    #[serde(
        default,
        alias = "agentCoreGatewaySettings",
        skip_serializing_if = "Option::is_none"
    )]
    pub gateway_settings: Option<GatewaySettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_knowledge_base: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postgresql_config: Option<PostgresqlConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
/// Gateway and identity-federation settings.
///
/// Field names serialize in their environment-variable spelling because the
/// whole object is forwarded to the workload process.
pub struct GatewaySettings {
    #[serde(
        rename = "GATEWAY_URL",
        alias = "gatewayUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub gateway_url: Option<String>,
    #[serde(
        rename = "COGNITO_SCOPE",
        alias = "cognitoScope",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cognito_scope: Option<String>,
    #[serde(
        rename = "IDENTITY_PROVIDER_NAME",
        alias = "identityProviderName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub identity_provider_name: Option<String>,
    #[serde(
        rename = "SECRET_ARN",
        alias = "secretArn",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub secret_arn: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
/// Relational database tool settings as written in the parameter file.
///
/// Both fields are required together; a half-filled object is rejected when
/// capabilities are decided.
pub struct PostgresqlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_arn: Option<String>,
}

impl ParameterSet {
    /// Minimal parameter set with every optional integration switched off.
    pub fn new(runtime_name: impl Into<String>) -> Self {
        Self {
            runtime_name: runtime_name.into(),
            application_directory: String::new(),
            gateway_settings: None,
            use_knowledge_base: None,
            tools_system_prompt: None,
            postgresql_config: None,
        }
    }

    /// Parse a parameter document after validating it against the schema.
    pub fn from_json(value: Value) -> AssemblyResult<Self> {
        let schema = parameters_schema()?;
        let errors = schema.errors(&value);
        if !errors.is_empty() {
            return Err(AssemblyError::configuration(format!(
                "parameters failed schema validation:\n{}",
                errors.join("\n")
            )));
        }
        let params: ParameterSet = serde_json::from_value(value)
            .map_err(|err| AssemblyError::configuration(format!("parameters: {err}")))?;
        params.validate()?;
        Ok(params)
    }

    /// Checks that do not depend on which integrations are enabled.
    pub fn validate(&self) -> AssemblyResult<()> {
        validate_runtime_name(&self.runtime_name)
    }

    /// Gateway endpoint, when set to a non-empty value.
    pub fn gateway_url(&self) -> Option<&str> {
        non_empty(self.gateway_settings.as_ref()?.gateway_url.as_deref())
    }

    /// Gateway identity secret, when set to a non-empty value.
    pub fn gateway_secret_arn(&self) -> Option<&str> {
        non_empty(self.gateway_settings.as_ref()?.secret_arn.as_deref())
    }

    /// Deployment unit name; one per runtime so runtimes deploy independently.
    pub fn stack_name(&self) -> String {
        format!("CdkBedrockAgentcore-{}-Stack", self.runtime_name)
    }

    /// Environment forwarded to the workload process.
    ///
    /// Every gateway setting that is present keeps its key; the tools prompt
    /// is always set and defaults to the empty string.
    pub fn environment(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        if let Some(settings) = &self.gateway_settings {
            let entries = [
                ("GATEWAY_URL", &settings.gateway_url),
                ("COGNITO_SCOPE", &settings.cognito_scope),
                ("IDENTITY_PROVIDER_NAME", &settings.identity_provider_name),
                ("SECRET_ARN", &settings.secret_arn),
            ];
            for (key, value) in entries {
                if let Some(value) = value {
                    env.insert(key.to_string(), value.clone());
                }
            }
        }
        env.insert(
            TOOLS_SYSTEM_PROMPT_KEY.to_string(),
            self.tools_system_prompt.clone().unwrap_or_default(),
        );
        env
    }
}

/// Read, schema-check, and parse a parameter file.
pub fn load_parameters(path: &Path) -> Result<ParameterSet> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    let params =
        ParameterSet::from_json(value).with_context(|| format!("loading {}", path.display()))?;
    Ok(params)
}

fn parameters_schema() -> AssemblyResult<CompiledSchema> {
    let value: Value = serde_json::from_str(PARAMETERS_SCHEMA)
        .map_err(|err| AssemblyError::configuration(format!("embedded schema: {err}")))?;
    compile_schema(&value).map_err(|err| AssemblyError::configuration(format!("{err:#}")))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

fn validate_runtime_name(name: &str) -> AssemblyResult<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(AssemblyError::configuration("runtimeName must not be empty"));
    };
    if !first.is_ascii_alphabetic() {
        return Err(AssemblyError::configuration(format!(
            "runtimeName must start with a letter, got '{name}'"
        )));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AssemblyError::configuration(format!(
            "runtimeName must match ^[A-Za-z][A-Za-z0-9_]*$, got '{name}'"
        )));
    }
    if name.len() > RUNTIME_NAME_MAX_LEN {
        return Err(AssemblyError::configuration(format!(
            "runtimeName exceeds {RUNTIME_NAME_MAX_LEN} characters"
        )));
    }
    Ok(())
}
