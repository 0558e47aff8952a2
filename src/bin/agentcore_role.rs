//! Command-line front end for runtime identity assembly.
//!
//! Every subcommand prints one JSON document to stdout; diagnostics and logs
//! go to stderr so the output can be piped into the orchestrator.

use agentcore_role::{
    DeploymentContext, assemble_deployment, decide, load_parameters, load_runtime_outputs,
    synthesize,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "agentcore-role")]
#[command(about = "Assemble the least-privilege identity for an agent runtime")]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the capabilities a parameter file enables
    Capabilities {
        /// Path to the parameter file
        params: PathBuf,
    },
    /// Print the identity's policy document
    Policy {
        /// Path to the parameter file
        params: PathBuf,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Print the deployment template for the orchestrator
    Synth {
        /// Path to the parameter file
        params: PathBuf,
        /// Container image the runtime executes
        #[arg(long, env = "AGENTCORE_CONTAINER_URI")]
        container_uri: String,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Print the runtime identifiers from orchestrator outputs
    Outputs {
        /// Path to the orchestrator's stack outputs (JSON)
        file: PathBuf,
    },
}

#[derive(Args)]
struct ContextArgs {
    /// Partition of the target account
    #[arg(long, env = "AWS_PARTITION", default_value = "aws")]
    partition: String,
    /// Target region
    #[arg(long, env = "AWS_REGION")]
    region: String,
    /// Target account id
    #[arg(long, env = "AWS_ACCOUNT_ID")]
    account: String,
}

impl ContextArgs {
    fn deployment_context(&self) -> Result<DeploymentContext> {
        let context = DeploymentContext::new(&self.partition, &self.region, &self.account)
            .context("invalid deployment context")?;
        Ok(context)
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = run(cli.command) {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Capabilities { params } => {
            let params = load_parameters(&params)?;
            let capabilities = decide(&params).context("deciding capabilities")?;
            print_json(&capabilities)
        }
        Commands::Policy { params, context } => {
            let params = load_parameters(&params)?;
            let deployment = assemble_deployment(&params, &context.deployment_context()?)
                .with_context(|| format!("assembling identity for {}", params.runtime_name))?;
            print_json(&deployment.identity.policy_document())
        }
        Commands::Synth {
            params,
            container_uri,
            context,
        } => {
            let params = load_parameters(&params)?;
            let deployment = assemble_deployment(&params, &context.deployment_context()?)
                .with_context(|| format!("assembling identity for {}", params.runtime_name))?;
            let template = synthesize(&deployment, &container_uri)?;
            print_json(&template)
        }
        Commands::Outputs { file } => {
            let outputs = load_runtime_outputs(&file)?;
            print_json(&outputs)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
