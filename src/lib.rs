//! Least-privilege identity assembly for agent runtimes.
//!
//! The crate turns a declarative [`ParameterSet`] into the identity an agent
//! runtime executes under, granting exactly what its enabled integrations
//! need. The pipeline runs in one synchronous pass:
//!
//! 1. [`decide`] maps parameters to a [`CapabilitySet`];
//! 2. [`compose`] expands each capability into its fixed grant bundle, using
//!    [`arn::resolve`] for deployment-specific locators;
//! 3. [`assemble`] builds the [`Identity`] from the finished list;
//! 4. [`ProvisioningPlan::link`] records that the runtime waits for the
//!    identity;
//! 5. after the external orchestrator applies the template from
//!    [`synthesize`], [`RuntimeOutputs`] exposes the runtime identifiers.
//!
//! [`assemble_deployment`] runs steps 1 to 4. Nothing is provisioned here.

pub mod arn;
pub mod capability;
pub mod error;
pub mod grants;
pub mod identity;
pub mod linker;
pub mod outputs;
pub mod parameters;
mod schema_loader;
pub mod template;
pub mod workload;

pub use arn::{ArnPattern, ArnScope, DeploymentContext, resolve};
pub use capability::{Capability, CapabilitySet, DatabaseTarget, decide};
pub use error::{AssemblyError, AssemblyResult};
pub use grants::{Conditions, Effect, GrantStatement, StatementBuilder, compose};
pub use identity::{Identity, TRUST_PRINCIPAL, assemble, identity_name};
pub use linker::{DependencyEdge, IDENTITY_LOGICAL_ID, PlannedResource, ProvisioningPlan};
pub use outputs::{RUNTIME_OUTPUTS, RuntimeOutputs, load_runtime_outputs};
pub use parameters::{GatewaySettings, ParameterSet, PostgresqlConfig, load_parameters};
pub use template::synthesize;
pub use workload::WorkloadRuntime;

use tracing::info;

/// Everything computed for one runtime before provisioning starts.
#[derive(Clone, Debug)]
pub struct Deployment {
    pub parameters: ParameterSet,
    pub context: DeploymentContext,
    pub capabilities: CapabilitySet,
    pub identity: Identity,
    pub workload: WorkloadRuntime,
    pub plan: ProvisioningPlan,
}

/// Run decision, composition, assembly and linking for one parameter set.
///
/// Any error aborts the run; no identity is returned unless every stage
/// succeeded.
pub fn assemble_deployment(
    params: &ParameterSet,
    context: &DeploymentContext,
) -> AssemblyResult<Deployment> {
    params.validate()?;
    context.validate()?;

    let capabilities = decide(params)?;
    let statements = compose(&capabilities, context, params.gateway_secret_arn())?;
    let identity = assemble(&params.runtime_name, statements)?;

    let workload = WorkloadRuntime::new(params, IDENTITY_LOGICAL_ID);
    let mut plan = ProvisioningPlan::new();
    plan.add_identity(&identity)?;
    plan.add_workload(&workload)?;
    plan.link(IDENTITY_LOGICAL_ID, &workload.logical_id)?;
    plan.verify()?;

    info!(
        runtime = %params.runtime_name,
        capabilities = ?capabilities.names(),
        statements = identity.statements().len(),
        "deployment assembled"
    );

    Ok(Deployment {
        parameters: params.clone(),
        context: context.clone(),
        capabilities,
        identity,
        workload,
        plan,
    })
}
