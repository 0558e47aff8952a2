//! Explicit provisioning order between the identity and its dependents.
//!
//! The plan records every resource that will be handed to the orchestrator
//! and the "must exist before" edges between them. A resource that assumes
//! the identity is only valid once an edge to it has been declared with
//! [`ProvisioningPlan::link`]; [`ProvisioningPlan::verify`] enforces that.

use crate::error::{AssemblyError, AssemblyResult};
use crate::identity::Identity;
use crate::workload::WorkloadRuntime;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub const IDENTITY_LOGICAL_ID: &str = "AgentCoreRole";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// One resource known to the plan.
pub struct PlannedResource {
    pub logical_id: String,
    /// Logical id of the identity this resource runs as, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assumes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
/// `dependent` must not be created or updated before `prerequisite` completes.
pub struct DependencyEdge {
    pub dependent: String,
    pub prerequisite: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProvisioningPlan {
    resources: BTreeMap<String, PlannedResource>,
    edges: BTreeSet<DependencyEdge>,
}

impl ProvisioningPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the identity under [`IDENTITY_LOGICAL_ID`].
    pub fn add_identity(&mut self, identity: &Identity) -> AssemblyResult<&str> {
        debug!(identity = %identity.name(), "planning identity");
        self.add_resource(PlannedResource {
            logical_id: IDENTITY_LOGICAL_ID.to_string(),
            assumes: None,
        })
    }

    /// Register a runtime that assumes an identity.
    pub fn add_workload(&mut self, workload: &WorkloadRuntime) -> AssemblyResult<&str> {
        self.add_resource(PlannedResource {
            logical_id: workload.logical_id.clone(),
            assumes: Some(workload.identity_ref.clone()),
        })
    }

    pub fn add_resource(&mut self, resource: PlannedResource) -> AssemblyResult<&str> {
        if resource.logical_id.trim().is_empty() {
            return Err(AssemblyError::dependency("resource logical id is empty"));
        }
        if self.resources.contains_key(&resource.logical_id) {
            return Err(AssemblyError::dependency(format!(
                "resource {} is already planned",
                resource.logical_id
            )));
        }
        let id = resource.logical_id.clone();
        let entry = self.resources.entry(id).or_insert(resource);
        Ok(entry.logical_id.as_str())
    }

    /// Declare that `dependent` waits for `identity`.
    pub fn link(&mut self, identity: &str, dependent: &str) -> AssemblyResult<()> {
        if identity == dependent {
            return Err(AssemblyError::dependency(format!(
                "{identity} cannot depend on itself"
            )));
        }
        for id in [identity, dependent] {
            if !self.resources.contains_key(id) {
                return Err(AssemblyError::dependency(format!(
                    "cannot link unknown resource {id}"
                )));
            }
        }
        debug!(dependent, prerequisite = identity, "linked dependency");
        self.edges.insert(DependencyEdge {
            dependent: dependent.to_string(),
            prerequisite: identity.to_string(),
        });
        Ok(())
    }

    /// Check that every identity consumer is ordered after its identity and
    /// that the edges form no cycle.
    pub fn verify(&self) -> AssemblyResult<()> {
        for resource in self.resources.values() {
            let Some(identity) = &resource.assumes else {
                continue;
            };
            if !self.resources.contains_key(identity) {
                return Err(AssemblyError::dependency(format!(
                    "{} assumes unknown identity {identity}",
                    resource.logical_id
                )));
            }
            let edge = DependencyEdge {
                dependent: resource.logical_id.clone(),
                prerequisite: identity.clone(),
            };
            if !self.edges.contains(&edge) {
                return Err(AssemblyError::dependency(format!(
                    "{} assumes {identity} without a declared ordering edge",
                    resource.logical_id
                )));
            }
        }
        self.provisioning_order().map(|_| ())
    }

    /// Prerequisites of `logical_id`, in stable order.
    pub fn prerequisites_of(&self, logical_id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|edge| edge.dependent == logical_id)
            .map(|edge| edge.prerequisite.as_str())
            .collect()
    }

    pub fn edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.iter()
    }

    pub fn resources(&self) -> impl Iterator<Item = &PlannedResource> {
        self.resources.values()
    }

    /// Logical ids ordered so every prerequisite precedes its dependents.
    ///
    /// Ties are broken by logical id so the order is reproducible.
    pub fn provisioning_order(&self) -> AssemblyResult<Vec<&str>> {
        let mut pending: BTreeMap<&str, BTreeSet<&str>> = self
            .resources
            .keys()
            .map(|id| (id.as_str(), BTreeSet::new()))
            .collect();
        for edge in &self.edges {
            if let Some(waits_on) = pending.get_mut(edge.dependent.as_str()) {
                waits_on.insert(edge.prerequisite.as_str());
            }
        }

        let mut order = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let ready: Vec<&str> = pending
                .iter()
                .filter(|(_, waits_on)| waits_on.is_empty())
                .map(|(id, _)| *id)
                .collect();
            if ready.is_empty() {
                let stuck: Vec<&str> = pending.keys().copied().collect();
                return Err(AssemblyError::dependency(format!(
                    "dependency cycle among {}",
                    stuck.join(", ")
                )));
            }
            for id in ready {
                pending.remove(id);
                for waits_on in pending.values_mut() {
                    waits_on.remove(id);
                }
                order.push(id);
            }
        }
        Ok(order)
    }
}
