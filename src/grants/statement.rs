//! Grant statements and their builder.
//!
//! A [`GrantStatement`] can only be obtained from [`StatementBuilder::build`],
//! which refuses empty action or resource lists. Once built, a statement has no
//! mutating methods.

use crate::error::{AssemblyError, AssemblyResult};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Condition block: operator -> context key -> expected value.
pub type Conditions = BTreeMap<String, BTreeMap<String, String>>;

/// Statement effect. Only allow rules are provisioned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    Allow,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "Allow",
        }
    }
}

impl Serialize for Effect {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// One allow rule attached to the runtime identity.
///
/// Serializes in policy-document form: `Sid` and `Condition` are omitted when
/// absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GrantStatement {
    #[serde(rename = "Sid", skip_serializing_if = "Option::is_none")]
    sid: Option<String>,
    #[serde(rename = "Effect")]
    effect: Effect,
    #[serde(rename = "Action")]
    actions: Vec<String>,
    #[serde(rename = "Resource")]
    resources: Vec<String>,
    #[serde(rename = "Condition", skip_serializing_if = "Option::is_none")]
    conditions: Option<Conditions>,
}

impl GrantStatement {
    pub fn builder() -> StatementBuilder {
        StatementBuilder::default()
    }

    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    pub fn conditions(&self) -> Option<&Conditions> {
        self.conditions.as_ref()
    }
}

#[derive(Clone, Debug, Default)]
pub struct StatementBuilder {
    sid: Option<String>,
    actions: Vec<String>,
    resources: Vec<String>,
    conditions: Conditions,
}

impl StatementBuilder {
    pub fn sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions.extend(actions.into_iter().map(Into::into));
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resources.push(resource.into());
        self
    }

    pub fn resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.extend(resources.into_iter().map(Into::into));
        self
    }

    pub fn condition(
        mut self,
        operator: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.conditions
            .entry(operator.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Freeze the statement.
    ///
    /// Fails when the action or resource list is empty, when an action is not
    /// `service:Name` shaped, when an entry is blank or repeated, or when the
    /// sid is present but not alphanumeric.
    pub fn build(self) -> AssemblyResult<GrantStatement> {
        let label = self.sid.clone().unwrap_or_else(|| "<unnamed>".to_string());

        if let Some(sid) = &self.sid {
            if sid.is_empty() || !sid.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(AssemblyError::validation(format!(
                    "sid must be non-empty and alphanumeric, got '{sid}'"
                )));
            }
        }
        if self.actions.is_empty() {
            return Err(AssemblyError::validation(format!(
                "statement {label} has no actions"
            )));
        }
        if self.resources.is_empty() {
            return Err(AssemblyError::validation(format!(
                "statement {label} has no resources"
            )));
        }
        for action in &self.actions {
            let well_formed = action
                .split_once(':')
                .is_some_and(|(service, name)| !service.is_empty() && !name.is_empty());
            if !well_formed {
                return Err(AssemblyError::validation(format!(
                    "statement {label} has malformed action '{action}'"
                )));
            }
        }
        if self.resources.iter().any(|r| r.trim().is_empty()) {
            return Err(AssemblyError::validation(format!(
                "statement {label} has a blank resource"
            )));
        }
        reject_repeats(&label, "action", &self.actions)?;
        reject_repeats(&label, "resource", &self.resources)?;

        Ok(GrantStatement {
            sid: self.sid,
            effect: Effect::Allow,
            actions: self.actions,
            resources: self.resources,
            conditions: (!self.conditions.is_empty()).then_some(self.conditions),
        })
    }
}

fn reject_repeats(label: &str, kind: &str, values: &[String]) -> AssemblyResult<()> {
    for (idx, value) in values.iter().enumerate() {
        if values[..idx].contains(value) {
            return Err(AssemblyError::validation(format!(
                "statement {label} repeats {kind} '{value}'"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_in_policy_document_form() {
        let statement = GrantStatement::builder()
            .actions(["cloudwatch:PutMetricData"])
            .resource("*")
            .condition("StringEquals", "cloudwatch:namespace", "bedrock-agentcore")
            .build()
            .unwrap();
        assert_eq!(
            serde_json::to_value(&statement).unwrap(),
            json!({
                "Effect": "Allow",
                "Action": ["cloudwatch:PutMetricData"],
                "Resource": ["*"],
                "Condition": {
                    "StringEquals": { "cloudwatch:namespace": "bedrock-agentcore" }
                }
            })
        );

        let named = GrantStatement::builder()
            .sid("ECRTokenAccess")
            .actions(["ecr:GetAuthorizationToken"])
            .resource("*")
            .build()
            .unwrap();
        let value = serde_json::to_value(&named).unwrap();
        assert_eq!(value["Sid"], "ECRTokenAccess");
        assert!(value.get("Condition").is_none());
        assert!(named.conditions().is_none());

        let conditions = statement.conditions().expect("condition recorded");
        assert_eq!(
            conditions["StringEquals"]["cloudwatch:namespace"],
            "bedrock-agentcore"
        );
    }

    #[test]
    fn empty_lists_are_rejected() {
        let err = GrantStatement::builder()
            .sid("NoActions")
            .resource("*")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            AssemblyError::Validation("statement NoActions has no actions".into())
        );

        let err = GrantStatement::builder()
            .actions(["s3:GetObject"])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            AssemblyError::Validation("statement <unnamed> has no resources".into())
        );
    }

    #[test]
    fn malformed_entries_are_rejected() {
        let base = || GrantStatement::builder().resource("*");
        assert!(base().actions(["GetObject"]).build().is_err());
        assert!(base().actions([":GetObject"]).build().is_err());
        assert!(base().actions(["s3:"]).build().is_err());
        assert!(
            base()
                .actions(["s3:GetObject", "s3:GetObject"])
                .build()
                .is_err()
        );
        assert!(base().sid("has space").actions(["s3:GetObject"]).build().is_err());
        assert!(
            GrantStatement::builder()
                .actions(["s3:GetObject"])
                .resource(" ")
                .build()
                .is_err()
        );
    }

    #[test]
    fn preserves_declared_order() {
        let statement = GrantStatement::builder()
            .actions(["xray:PutTraceSegments", "xray:GetSamplingRules"])
            .resources(["b", "a"])
            .build()
            .unwrap();
        assert_eq!(
            statement.actions(),
            ["xray:PutTraceSegments", "xray:GetSamplingRules"]
        );
        assert_eq!(statement.resources(), ["b", "a"]);
        assert_eq!(statement.effect(), Effect::Allow);
        assert!(statement.sid().is_none());
    }
}
