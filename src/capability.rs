//! Capability decisions: which optional integrations a parameter set enables.
//!
//! [`decide`] is the only place that reads presence flags out of a
//! [`ParameterSet`]. Everything downstream works from the resulting
//! [`CapabilitySet`], whose iteration order is the canonical composition order.

use crate::error::{AssemblyError, AssemblyResult};
use crate::parameters::{ParameterSet, PostgresqlConfig};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// One enabled integration.
///
/// Variant order is the composition order; the derived `Ord` keeps a
/// `BTreeSet<Capability>` in that order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Base,
    KnowledgeBase,
    PostgreSql(DatabaseTarget),
    GatewayIdentity,
    GatewaySecret,
}

/// Fully specified relational database reference.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatabaseTarget {
    pub cluster_arn: String,
    pub secret_arn: String,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Base => "Base",
            Capability::KnowledgeBase => "KnowledgeBase",
            Capability::PostgreSql(_) => "PostgreSQL",
            Capability::GatewayIdentity => "GatewayIdentity",
            Capability::GatewaySecret => "GatewaySecret",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Capability {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Ordered set of enabled capabilities. Always contains [`Capability::Base`]
/// when produced by [`decide`].
///
/// At most one database target is present, and [`Capability::GatewaySecret`]
/// never appears without [`Capability::GatewayIdentity`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    /// Collect `capabilities` into a set, rejecting combinations no parameter
    /// set can produce.
    pub fn new(capabilities: impl IntoIterator<Item = Capability>) -> AssemblyResult<Self> {
        let set: BTreeSet<Capability> = capabilities.into_iter().collect();
        let databases = set
            .iter()
            .filter(|cap| matches!(cap, Capability::PostgreSql(_)))
            .count();
        if databases > 1 {
            return Err(AssemblyError::validation(format!(
                "capability set names {databases} database targets, at most one is allowed"
            )));
        }
        if set.contains(&Capability::GatewaySecret) && !set.contains(&Capability::GatewayIdentity)
        {
            return Err(AssemblyError::validation(
                "GatewaySecret requires GatewayIdentity",
            ));
        }
        Ok(Self(set))
    }

    pub fn contains(&self, capability: &Capability) -> bool {
        self.0.contains(capability)
    }

    /// The database reference, when the relational tool is enabled.
    pub fn database(&self) -> Option<&DatabaseTarget> {
        self.0.iter().find_map(|cap| match cap {
            Capability::PostgreSql(target) => Some(target),
            _ => None,
        })
    }

    /// Iterates in composition order.
    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.0.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(Capability::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Decide which capabilities `params` enables.
///
/// Each rule is evaluated independently. A present but incomplete
/// `postgresqlConfig` fails the whole decision rather than quietly dropping
/// the database integration.
pub fn decide(params: &ParameterSet) -> AssemblyResult<CapabilitySet> {
    let mut enabled = BTreeSet::from([Capability::Base]);

    if params.use_knowledge_base == Some(true) {
        enabled.insert(Capability::KnowledgeBase);
    }

    if let Some(config) = &params.postgresql_config {
        enabled.insert(Capability::PostgreSql(database_target(config)?));
    }

    if params.gateway_url().is_some() {
        enabled.insert(Capability::GatewayIdentity);
        if params.gateway_secret_arn().is_some() {
            enabled.insert(Capability::GatewaySecret);
        }
    }

    let set = CapabilitySet::new(enabled)?;
    debug!(
        runtime = %params.runtime_name,
        capabilities = ?set.names(),
        "decided capabilities"
    );
    Ok(set)
}

fn database_target(config: &PostgresqlConfig) -> AssemblyResult<DatabaseTarget> {
    let cluster_arn = required_field(config.cluster_arn.as_deref(), "clusterArn")?;
    let secret_arn = required_field(config.secret_arn.as_deref(), "secretArn")?;
    Ok(DatabaseTarget {
        cluster_arn: cluster_arn.to_string(),
        secret_arn: secret_arn.to_string(),
    })
}

fn required_field<'a>(value: Option<&'a str>, field: &str) -> AssemblyResult<&'a str> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AssemblyError::configuration(format!(
            "postgresqlConfig.{field} is required when postgresqlConfig is present"
        ))),
    }
}
