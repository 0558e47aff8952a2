//! Runtime identity: trust relationship plus the composed grant list.
//!
//! An [`Identity`] is built in one step by [`assemble`] from a finished
//! statement list and exposes read-only accessors afterwards.

use crate::error::{AssemblyError, AssemblyResult};
use crate::grants::GrantStatement;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use tracing::info;

/// Service allowed to assume the runtime identity.
pub const TRUST_PRINCIPAL: &str = "bedrock-agentcore.amazonaws.com";
pub const POLICY_VERSION: &str = "2012-10-17";
const ROLE_NAME_MAX_LEN: usize = 64;

/// Provisioned principal for one agent runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    name: String,
    description: String,
    statements: Vec<GrantStatement>,
}

impl Identity {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn trust_principal(&self) -> &'static str {
        TRUST_PRINCIPAL
    }

    pub fn statements(&self) -> &[GrantStatement] {
        &self.statements
    }

    /// Inline policy document carrying every statement in order.
    pub fn policy_document(&self) -> Value {
        json!({
            "Version": POLICY_VERSION,
            "Statement": self.statements,
        })
    }

    /// Assume-role document naming the trust principal.
    pub fn trust_policy_document(&self) -> Value {
        json!({
            "Version": POLICY_VERSION,
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "Service": TRUST_PRINCIPAL },
                "Action": "sts:AssumeRole",
            }],
        })
    }
}

/// Identity name for a runtime; distinct runtimes get distinct identities.
pub fn identity_name(runtime_name: &str) -> String {
    format!("BedrockAgentCore-{runtime_name}-Role")
}

/// Build the identity for `runtime_name` from a composed statement list.
///
/// The list is attached unmodified. It must be non-empty and no two
/// statements may share a sid.
pub fn assemble(runtime_name: &str, statements: Vec<GrantStatement>) -> AssemblyResult<Identity> {
    if runtime_name.trim().is_empty() {
        return Err(AssemblyError::validation("identity needs a runtime name"));
    }
    let name = identity_name(runtime_name);
    if name.len() > ROLE_NAME_MAX_LEN {
        return Err(AssemblyError::validation(format!(
            "identity name '{name}' exceeds {ROLE_NAME_MAX_LEN} characters"
        )));
    }
    if statements.is_empty() {
        return Err(AssemblyError::validation(format!(
            "identity {name} has no statements"
        )));
    }

    let mut seen = BTreeSet::new();
    for sid in statements.iter().filter_map(GrantStatement::sid) {
        if sid.is_empty() {
            continue;
        }
        if !seen.insert(sid) {
            return Err(AssemblyError::validation(format!(
                "identity {name} has duplicate sid '{sid}'"
            )));
        }
    }

    info!(
        identity = %name,
        statements = statements.len(),
        "assembled identity"
    );
    Ok(Identity {
        description: format!("IAM role for Bedrock AgentCore Runtime: {runtime_name}"),
        name,
        statements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(sid: Option<&str>) -> GrantStatement {
        let builder = GrantStatement::builder()
            .actions(["xray:PutTraceSegments"])
            .resource("*");
        match sid {
            Some(sid) => builder.sid(sid).build().unwrap(),
            None => builder.build().unwrap(),
        }
    }

    #[test]
    fn assembles_with_fixed_trust_and_order() {
        let statements = vec![
            statement(Some("First")),
            statement(None),
            statement(Some("Last")),
        ];
        let identity = assemble("MyAgentRuntime", statements.clone()).unwrap();
        assert_eq!(identity.name(), "BedrockAgentCore-MyAgentRuntime-Role");
        assert_eq!(
            identity.description(),
            "IAM role for Bedrock AgentCore Runtime: MyAgentRuntime"
        );
        assert_eq!(identity.trust_principal(), "bedrock-agentcore.amazonaws.com");
        assert_eq!(identity.statements(), statements.as_slice());
    }

    #[test]
    fn rejects_duplicate_sid() {
        let err =
            assemble("R", vec![statement(Some("Same")), statement(Some("Same"))]).unwrap_err();
        assert_eq!(
            err,
            AssemblyError::Validation(
                "identity BedrockAgentCore-R-Role has duplicate sid 'Same'".into()
            )
        );
    }

    #[test]
    fn unnamed_statements_never_collide() {
        assert!(assemble("R", vec![statement(None), statement(None)]).is_ok());
    }

    #[test]
    fn rejects_empty_statement_list() {
        assert!(matches!(
            assemble("R", Vec::new()),
            Err(AssemblyError::Validation(_))
        ));
    }

    #[test]
    fn rejects_overlong_name() {
        let long = "a".repeat(48);
        assert!(assemble(&long, vec![statement(None)]).is_err());
    }

    #[test]
    fn renders_documents() {
        let identity = assemble("R", vec![statement(Some("Trace"))]).unwrap();
        let policy = identity.policy_document();
        assert_eq!(policy["Version"], "2012-10-17");
        assert_eq!(policy["Statement"][0]["Sid"], "Trace");
        let trust = identity.trust_policy_document();
        assert_eq!(
            trust["Statement"][0]["Principal"]["Service"],
            "bedrock-agentcore.amazonaws.com"
        );
        assert_eq!(trust["Statement"][0]["Action"], "sts:AssumeRole");
    }
}
