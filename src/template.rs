//! Deployment template handed to the external orchestrator.
//!
//! The template declares the identity, the runtime that assumes it, the
//! ordering edge recorded by the linker, and the runtime outputs. Key order is
//! stable so repeated synthesis yields byte-identical output.

use crate::Deployment;
use crate::error::{AssemblyError, AssemblyResult};
use crate::linker::IDENTITY_LOGICAL_ID;
use crate::outputs::output_declarations;
use crate::workload::{NETWORK_MODE, PROTOCOL};
use serde_json::{Value, json};

const ROLE_TYPE: &str = "AWS::IAM::Role";
const RUNTIME_TYPE: &str = "AWS::BedrockAgentCore::Runtime";

/// Render the template for `deployment` running `container_uri`.
pub fn synthesize(deployment: &Deployment, container_uri: &str) -> AssemblyResult<Value> {
    if container_uri.trim().is_empty() {
        return Err(AssemblyError::configuration("container image URI is empty"));
    }
    deployment.plan.verify()?;

    let identity = &deployment.identity;
    let workload = &deployment.workload;
    let depends_on = deployment.plan.prerequisites_of(&workload.logical_id);
    if !depends_on.contains(&workload.identity_ref.as_str()) {
        return Err(AssemblyError::dependency(format!(
            "{} would be emitted without an edge to {}",
            workload.logical_id, workload.identity_ref
        )));
    }

    let mut resources = serde_json::Map::new();
    resources.insert(
        IDENTITY_LOGICAL_ID.to_string(),
        json!({
            "Type": ROLE_TYPE,
            "Properties": {
                "RoleName": identity.name(),
                "Description": identity.description(),
                "AssumeRolePolicyDocument": identity.trust_policy_document(),
                "Policies": [{
                    "PolicyName": format!("{IDENTITY_LOGICAL_ID}DefaultPolicy"),
                    "PolicyDocument": identity.policy_document(),
                }],
            },
        }),
    );
    resources.insert(
        workload.logical_id.clone(),
        json!({
            "Type": RUNTIME_TYPE,
            "DependsOn": depends_on,
            "Properties": {
                "AgentRuntimeName": workload.runtime_name,
                "AgentRuntimeArtifact": {
                    "ContainerConfiguration": { "ContainerUri": container_uri },
                },
                "NetworkConfiguration": { "NetworkMode": NETWORK_MODE },
                "ProtocolConfiguration": PROTOCOL,
                "RoleArn": { "Fn::GetAtt": [workload.identity_ref, "Arn"] },
                "EnvironmentVariables": workload.environment,
            },
        }),
    );

    Ok(json!({
        "Description": format!("Agent runtime {}", workload.runtime_name),
        "Metadata": {
            "StackName": deployment.parameters.stack_name(),
            "Capabilities": deployment.capabilities,
        },
        "Resources": resources,
        "Outputs": output_declarations(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arn::DeploymentContext;
    use crate::assemble_deployment;
    use crate::parameters::ParameterSet;

    const IMAGE: &str = "111122223333.dkr.ecr.us-east-1.amazonaws.com/agent:latest";

    fn deployment() -> Deployment {
        let mut params = ParameterSet::new("MyAgentRuntime");
        params.use_knowledge_base = Some(true);
        let ctx = DeploymentContext::new("aws", "us-east-1", "111122223333").unwrap();
        assemble_deployment(&params, &ctx).unwrap()
    }

    #[test]
    fn declares_role_runtime_edge_and_outputs() {
        let template = synthesize(&deployment(), IMAGE).unwrap();
        let role = &template["Resources"]["AgentCoreRole"];
        assert_eq!(role["Type"], "AWS::IAM::Role");
        assert_eq!(
            role["Properties"]["RoleName"],
            "BedrockAgentCore-MyAgentRuntime-Role"
        );
        let statements = role["Properties"]["Policies"][0]["PolicyDocument"]["Statement"]
            .as_array()
            .unwrap();
        assert_eq!(statements.len(), 10);

        let runtime = &template["Resources"]["AgentCoreRuntime"];
        assert_eq!(runtime["DependsOn"], json!(["AgentCoreRole"]));
        assert_eq!(
            runtime["Properties"]["RoleArn"],
            json!({ "Fn::GetAtt": ["AgentCoreRole", "Arn"] })
        );
        assert_eq!(
            runtime["Properties"]["AgentRuntimeArtifact"]["ContainerConfiguration"]["ContainerUri"],
            IMAGE
        );
        assert_eq!(
            runtime["Properties"]["EnvironmentVariables"],
            json!({ "TOOLS_SYSTEM_PROMPT": "" })
        );
        assert_eq!(
            template["Metadata"]["Capabilities"],
            json!(["Base", "KnowledgeBase"])
        );
        assert_eq!(
            template["Metadata"]["StackName"],
            "CdkBedrockAgentcore-MyAgentRuntime-Stack"
        );
        assert!(template["Outputs"]["RuntimeId"].is_object());
    }

    #[test]
    fn synthesis_is_byte_identical() {
        let first = serde_json::to_string(&synthesize(&deployment(), IMAGE).unwrap()).unwrap();
        let second = serde_json::to_string(&synthesize(&deployment(), IMAGE).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_blank_container_uri() {
        assert!(matches!(
            synthesize(&deployment(), " "),
            Err(AssemblyError::Configuration(_))
        ));
    }
}
