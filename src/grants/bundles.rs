//! Fixed grant bundles per capability.
//!
//! Each bundle is a hand-curated, ordered list. Scoping is decided per action:
//! statements marked unscoped use `*` because the underlying action has no
//! resource-level scoping (or, for knowledge-base enumeration, by choice).
//! Do not tighten or loosen these individually without reviewing the posture.

use crate::arn::{ArnPattern, DeploymentContext};
use crate::capability::{Capability, CapabilitySet, DatabaseTarget};
use crate::error::AssemblyResult;
use crate::grants::statement::GrantStatement;
use tracing::debug;

const UNSCOPED: &str = "*";
const WILDCARD: &str = "*";
const METRICS_NAMESPACE: &str = "bedrock-agentcore";

const ECR_REPOSITORY: ArnPattern = ArnPattern::account("ecr", "repository/{}");
const RUNTIME_LOG_GROUP: ArnPattern =
    ArnPattern::account("logs", "log-group:/aws/bedrock-agentcore/runtimes/{}");
const RUNTIME_LOG_STREAM: ArnPattern = ArnPattern::account(
    "logs",
    "log-group:/aws/bedrock-agentcore/runtimes/{}:log-stream:{}",
);
const LOG_GROUP: ArnPattern = ArnPattern::account("logs", "log-group:{}");
const DEFAULT_IDENTITY_DIRECTORY: ArnPattern =
    ArnPattern::account("bedrock-agentcore", "workload-identity-directory/default");
const DEFAULT_WORKLOAD_IDENTITY: ArnPattern = ArnPattern::account(
    "bedrock-agentcore",
    "workload-identity-directory/default/workload-identity/{}",
);
const IDENTITY_DIRECTORIES: ArnPattern =
    ArnPattern::account("bedrock-agentcore", "workload-identity-directory/{}");
const TOKEN_VAULT: ArnPattern = ArnPattern::account("bedrock-agentcore", "token-vault/default");
const TOKEN_VAULT_PROVIDER: ArnPattern = ArnPattern::account(
    "bedrock-agentcore",
    "token-vault/default/oauth2credentialprovider/{}",
);
const FOUNDATION_MODEL: ArnPattern = ArnPattern::shared("bedrock", "foundation-model/{}");
const ACCOUNT_MODELS: ArnPattern = ArnPattern::account("bedrock", "{}");
const KNOWLEDGE_BASE: ArnPattern = ArnPattern::account("bedrock", "knowledge-base/{}");

/// Compose the ordered statement list for `capabilities`.
///
/// Bundles are concatenated in capability order; within a bundle the order is
/// fixed. `gateway_secret_arn` only adds the secret-read grant of the gateway
/// bundle. Identical inputs always produce an identical list.
pub fn compose(
    capabilities: &CapabilitySet,
    context: &DeploymentContext,
    gateway_secret_arn: Option<&str>,
) -> AssemblyResult<Vec<GrantStatement>> {
    let mut statements = Vec::new();
    for capability in capabilities.iter() {
        let bundle = match capability {
            Capability::Base => base_bundle(context)?,
            Capability::KnowledgeBase => knowledge_base_bundle(context)?,
            Capability::PostgreSql(target) => database_bundle(target)?,
            Capability::GatewayIdentity => gateway_identity_bundle(context)?,
            Capability::GatewaySecret => gateway_secret_bundle(context, gateway_secret_arn)?,
        };
        debug!(
            capability = %capability,
            statements = bundle.len(),
            "composed bundle"
        );
        statements.extend(bundle);
    }
    Ok(statements)
}

fn base_bundle(ctx: &DeploymentContext) -> AssemblyResult<Vec<GrantStatement>> {
    Ok(vec![
        GrantStatement::builder()
            .sid("ECRImageAccess")
            .actions(["ecr:BatchGetImage", "ecr:GetDownloadUrlForLayer"])
            .resource(ECR_REPOSITORY.resolve(ctx, &[WILDCARD])?)
            .build()?,
        GrantStatement::builder()
            .sid("ECRTokenAccess")
            .actions(["ecr:GetAuthorizationToken"])
            .resource(UNSCOPED)
            .build()?,
        GrantStatement::builder()
            .actions([
                "logs:DescribeLogStreams",
                "logs:CreateLogGroup",
                "logs:CreateLogStream",
                "logs:PutLogEvents",
            ])
            .resource(RUNTIME_LOG_GROUP.resolve(ctx, &[WILDCARD])?)
            .resource(RUNTIME_LOG_STREAM.resolve(ctx, &[WILDCARD, WILDCARD])?)
            .build()?,
        GrantStatement::builder()
            .actions(["logs:DescribeLogGroups"])
            .resource(LOG_GROUP.resolve(ctx, &[WILDCARD])?)
            .build()?,
        GrantStatement::builder()
            .actions([
                "xray:PutTraceSegments",
                "xray:PutTelemetryRecords",
                "xray:GetSamplingRules",
                "xray:GetSamplingTargets",
            ])
            .resource(UNSCOPED)
            .build()?,
        GrantStatement::builder()
            .actions(["cloudwatch:PutMetricData"])
            .resource(UNSCOPED)
            .condition("StringEquals", "cloudwatch:namespace", METRICS_NAMESPACE)
            .build()?,
        GrantStatement::builder()
            .sid("GetAgentAccessToken")
            .actions([
                "bedrock-agentcore:GetWorkloadAccessToken",
                "bedrock-agentcore:GetWorkloadAccessTokenForJWT",
                "bedrock-agentcore:GetWorkloadAccessTokenForUserId",
            ])
            .resource(DEFAULT_IDENTITY_DIRECTORY.resolve(ctx, &[])?)
            .resource(DEFAULT_WORKLOAD_IDENTITY.resolve(ctx, &[WILDCARD])?)
            .build()?,
        GrantStatement::builder()
            .sid("BedrockModelInvocation")
            .actions([
                "bedrock:InvokeModel",
                "bedrock:InvokeModelWithResponseStream",
            ])
            .resource(FOUNDATION_MODEL.resolve(ctx, &[WILDCARD])?)
            .resource(ACCOUNT_MODELS.resolve(ctx, &[WILDCARD])?)
            .build()?,
    ])
}

fn knowledge_base_bundle(ctx: &DeploymentContext) -> AssemblyResult<Vec<GrantStatement>> {
    Ok(vec![
        GrantStatement::builder()
            .sid("BedrockKnowledgeBaseDataAccess")
            .actions([
                "bedrock:Retrieve",
                "bedrock:RetrieveAndGenerate",
                "bedrock:GetKnowledgeBase",
            ])
            .resource(KNOWLEDGE_BASE.resolve(ctx, &[WILDCARD])?)
            .build()?,
        // Enumeration has no resource-level scoping.
        GrantStatement::builder()
            .sid("BedrockKnowledgeBaseListAccess")
            .actions([
                "bedrock:ListDataSources",
                "bedrock:ListKnowledgeBases",
                "bedrock:ListTagsForResource",
                "bedrock:Rerank",
            ])
            .resource(UNSCOPED)
            .build()?,
    ])
}

fn database_bundle(target: &DatabaseTarget) -> AssemblyResult<Vec<GrantStatement>> {
    Ok(vec![
        GrantStatement::builder()
            .actions(["secretsmanager:GetSecretValue"])
            .resource(target.secret_arn.as_str())
            .build()?,
        GrantStatement::builder()
            .actions([
                "rds-data:BeginTransaction",
                "rds-data:CommitTransaction",
                "rds-data:ExecuteStatement",
                "rds-data:RollbackTransaction",
            ])
            .resource(target.cluster_arn.as_str())
            .build()?,
    ])
}

fn gateway_identity_bundle(ctx: &DeploymentContext) -> AssemblyResult<Vec<GrantStatement>> {
    Ok(vec![
        GrantStatement::builder()
            .sid("AgentCoreIdentityAccess")
            .actions([
                "bedrock-agentcore:CreateWorkloadIdentity",
                "bedrock-agentcore:UpdateWorkloadIdentity",
                "bedrock-agentcore:DeleteWorkloadIdentity",
            ])
            .resource(IDENTITY_DIRECTORIES.resolve(ctx, &[WILDCARD])?)
            .build()?,
    ])
}

fn gateway_secret_bundle(
    ctx: &DeploymentContext,
    secret_arn: Option<&str>,
) -> AssemblyResult<Vec<GrantStatement>> {
    let mut bundle = vec![
        GrantStatement::builder()
            .sid("AgentCoreIdentityOauth2")
            .actions(["bedrock-agentcore:GetResourceOauth2Token"])
            .resource(TOKEN_VAULT_PROVIDER.resolve(ctx, &[WILDCARD])?)
            .resource(TOKEN_VAULT.resolve(ctx, &[])?)
            .resource(DEFAULT_WORKLOAD_IDENTITY.resolve(ctx, &["workload-*"])?)
            .resource(DEFAULT_IDENTITY_DIRECTORY.resolve(ctx, &[])?)
            .build()?,
    ];
    if let Some(secret_arn) = secret_arn.filter(|arn| !arn.trim().is_empty()) {
        bundle.push(
            GrantStatement::builder()
                .actions(["secretsmanager:GetSecretValue"])
                .resource(secret_arn)
                .build()?,
        );
    }
    Ok(bundle)
}
