//! Resource locator templating.
//!
//! Patterns are fixed at compile time; the partition, region and account come
//! from the [`DeploymentContext`] of the run and are only substituted here.

use crate::error::{AssemblyError, AssemblyResult};
use serde::{Deserialize, Serialize};

const PLACEHOLDER: &str = "{}";

/// Where a deployment lands. Supplied externally for every run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentContext {
    pub partition: String,
    pub region: String,
    pub account_id: String,
}

impl DeploymentContext {
    /// Build a context, rejecting values that cannot appear in a locator.
    pub fn new(
        partition: impl Into<String>,
        region: impl Into<String>,
        account_id: impl Into<String>,
    ) -> AssemblyResult<Self> {
        let context = Self {
            partition: partition.into(),
            region: region.into(),
            account_id: account_id.into(),
        };
        context.validate()?;
        Ok(context)
    }

    pub fn validate(&self) -> AssemblyResult<()> {
        if !is_dns_label(&self.partition) {
            return Err(AssemblyError::configuration(format!(
                "partition must be lowercase alphanumerics and '-', got '{}'",
                self.partition
            )));
        }
        if !is_dns_label(&self.region) {
            return Err(AssemblyError::configuration(format!(
                "region must be lowercase alphanumerics and '-', got '{}'",
                self.region
            )));
        }
        if self.account_id.len() != 12 || !self.account_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(AssemblyError::configuration(format!(
                "account id must be 12 digits, got '{}'",
                self.account_id
            )));
        }
        Ok(())
    }
}

fn is_dns_label(value: &str) -> bool {
    !value.is_empty()
        && !value.starts_with('-')
        && !value.ends_with('-')
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// How region and account are filled in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArnScope {
    /// Region and account of the deployment.
    Account,
    /// Any region, no owning account: publicly shared namespaces such as
    /// foundation models.
    Shared,
}

/// A locator template: service, scope, and a resource path whose `{}`
/// placeholders are filled with wildcard segments at resolution time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArnPattern {
    pub service: &'static str,
    pub scope: ArnScope,
    pub resource: &'static str,
}

impl ArnPattern {
    pub const fn account(service: &'static str, resource: &'static str) -> Self {
        Self {
            service,
            scope: ArnScope::Account,
            resource,
        }
    }

    pub const fn shared(service: &'static str, resource: &'static str) -> Self {
        Self {
            service,
            scope: ArnScope::Shared,
            resource,
        }
    }

    /// Shorthand for [`resolve`].
    pub fn resolve(
        &self,
        context: &DeploymentContext,
        wildcards: &[&str],
    ) -> AssemblyResult<String> {
        resolve(self, context, wildcards)
    }
}

/// Render `pattern` into a fully qualified locator.
///
/// Each `{}` in the resource path consumes one entry of `wildcards`, in order.
/// The count must match exactly, and no `/`- or `:`-delimited segment of the
/// rendered path may be empty.
pub fn resolve(
    pattern: &ArnPattern,
    context: &DeploymentContext,
    wildcards: &[&str],
) -> AssemblyResult<String> {
    if pattern.service.is_empty() {
        return Err(AssemblyError::validation("locator pattern has no service"));
    }

    let placeholders = pattern.resource.matches(PLACEHOLDER).count();
    if placeholders != wildcards.len() {
        return Err(AssemblyError::validation(format!(
            "pattern '{}' has {placeholders} placeholder(s) but {} wildcard(s) were supplied",
            pattern.resource,
            wildcards.len()
        )));
    }

    let mut path = String::with_capacity(pattern.resource.len());
    let mut pieces = pattern.resource.split(PLACEHOLDER);
    if let Some(first) = pieces.next() {
        path.push_str(first);
    }
    for (piece, wildcard) in pieces.zip(wildcards) {
        path.push_str(wildcard);
        path.push_str(piece);
    }

    check_segments(&path)?;

    let (region, account) = match pattern.scope {
        ArnScope::Account => (context.region.as_str(), context.account_id.as_str()),
        ArnScope::Shared => ("*", ""),
    };
    Ok(format!(
        "arn:{}:{}:{region}:{account}:{path}",
        context.partition, pattern.service
    ))
}

fn check_segments(path: &str) -> AssemblyResult<()> {
    if path.is_empty() {
        return Err(AssemblyError::validation("locator resource path is empty"));
    }
    for delimiter in ['/', ':'] {
        if path.split(delimiter).any(str::is_empty) {
            return Err(AssemblyError::validation(format!(
                "locator resource path '{path}' has an empty '{delimiter}' segment"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> DeploymentContext {
        DeploymentContext::new("aws", "us-east-1", "111122223333").unwrap()
    }

    #[test]
    fn account_scope_substitutes_region_and_account() {
        let pattern = ArnPattern::account("ecr", "repository/{}");
        assert_eq!(
            pattern.resolve(&context(), &["*"]).unwrap(),
            "arn:aws:ecr:us-east-1:111122223333:repository/*"
        );
    }

    #[test]
    fn shared_scope_is_region_and_account_agnostic() {
        let pattern = ArnPattern::shared("bedrock", "foundation-model/{}");
        assert_eq!(
            pattern.resolve(&context(), &["*"]).unwrap(),
            "arn:aws:bedrock:*::foundation-model/*"
        );
    }

    #[test]
    fn partition_comes_from_context() {
        let ctx = DeploymentContext::new("aws-cn", "cn-north-1", "111122223333").unwrap();
        let pattern = ArnPattern::account("logs", "log-group:{}");
        assert_eq!(
            pattern.resolve(&ctx, &["*"]).unwrap(),
            "arn:aws-cn:logs:cn-north-1:111122223333:log-group:*"
        );
    }

    #[test]
    fn fills_placeholders_in_order() {
        let pattern = ArnPattern::account(
            "logs",
            "log-group:/aws/bedrock-agentcore/runtimes/{}:log-stream:{}",
        );
        assert_eq!(
            pattern.resolve(&context(), &["rt-1", "*"]).unwrap(),
            "arn:aws:logs:us-east-1:111122223333:log-group:/aws/bedrock-agentcore/runtimes/rt-1:log-stream:*"
        );
    }

    #[test]
    fn rejects_empty_segments() {
        let pattern = ArnPattern::account("ecr", "repository/{}");
        assert!(matches!(
            pattern.resolve(&context(), &[""]),
            Err(AssemblyError::Validation(_))
        ));
        let pattern = ArnPattern::account("ecr", "repository//x");
        assert!(pattern.resolve(&context(), &[]).is_err());
        let pattern = ArnPattern::account("logs", "log-group::x");
        assert!(pattern.resolve(&context(), &[]).is_err());
        let pattern = ArnPattern::account("ecr", "");
        assert!(pattern.resolve(&context(), &[]).is_err());
    }

    #[test]
    fn rejects_wildcard_count_mismatch() {
        let pattern = ArnPattern::account("ecr", "repository/{}");
        let err = pattern.resolve(&context(), &[]).unwrap_err();
        assert!(err.to_string().contains("1 placeholder(s) but 0 wildcard(s)"));
        assert!(pattern.resolve(&context(), &["*", "*"]).is_err());
    }

    #[test]
    fn resolution_is_deterministic() {
        let pattern = ArnPattern::account("bedrock", "knowledge-base/{}");
        let first = pattern.resolve(&context(), &["*"]).unwrap();
        let second = pattern.resolve(&context(), &["*"]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn context_validation() {
        assert!(DeploymentContext::new("aws", "us-east-1", "123").is_err());
        assert!(DeploymentContext::new("aws", "", "111122223333").is_err());
        assert!(DeploymentContext::new("AWS", "us-east-1", "111122223333").is_err());
        assert!(DeploymentContext::new("aws-us-gov", "us-gov-west-1", "111122223333").is_ok());
    }
}
