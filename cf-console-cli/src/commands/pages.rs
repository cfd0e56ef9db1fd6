//! `cfc pages ...`

use std::path::{Path, PathBuf};

use clap::Subcommand;

use cf_console_app::AppState;
use cf_console_core::error::CoreResult;
use cf_console_core::services::DeploymentOrchestrator;
use cf_console_core::types::{Asset, Deployment, DeploymentStatus};

use super::emit;

#[derive(Subcommand)]
pub enum PagesCommand {
    /// Upload a Worker script as a new deployment
    Deploy {
        project: String,
        /// Script file (.js or .mjs)
        asset: PathBuf,
        #[arg(long, default_value = "main")]
        branch: String,
        /// Poll until the deployment is live or failed
        #[arg(long)]
        wait: bool,
    },
    /// Show a deployment
    Status {
        project: String,
        deployment_id: String,
        /// Poll until the deployment is live or failed
        #[arg(long)]
        wait: bool,
    },
    /// Create a project
    Create {
        name: String,
        #[arg(long, default_value = "main")]
        production_branch: String,
    },
    /// Delete a project
    Delete { name: String },
    /// List projects
    List,
    /// List deployments of a project
    Deployments { project: String },
}

async fn deploy(
    orchestrator: &DeploymentOrchestrator,
    project: &str,
    asset: &Path,
    branch: &str,
    wait: bool,
) -> CoreResult<Deployment> {
    let asset = Asset::from_path(asset)?;
    let deployment = orchestrator.deploy(project, branch, asset).await?;
    if wait && !deployment.status.is_terminal() {
        return orchestrator.await_terminal(&deployment.id).await;
    }
    Ok(deployment)
}

async fn status(
    orchestrator: &DeploymentOrchestrator,
    project: &str,
    deployment_id: &str,
    wait: bool,
) -> CoreResult<Deployment> {
    let deployment = orchestrator.attach(project, deployment_id).await?;
    if wait && !deployment.status.is_terminal() {
        return orchestrator.await_terminal(&deployment.id).await;
    }
    Ok(deployment)
}

/// A failed deployment still prints as a result but fails the command.
fn emit_deployment(result: CoreResult<Deployment>) -> anyhow::Result<bool> {
    let failed = matches!(&result, Ok(d) if d.status == DeploymentStatus::Failed);
    Ok(emit(result)? && !failed)
}

pub async fn run(state: &AppState, command: PagesCommand) -> anyhow::Result<bool> {
    let orchestrator = state.orchestrator.as_ref();
    match command {
        PagesCommand::Deploy {
            project,
            asset,
            branch,
            wait,
        } => {
            let result = deploy(orchestrator, &project, &asset, &branch, wait).await;
            if let Ok(Deployment { url: Some(url), .. }) = &result {
                tracing::info!("Live at {url}");
            }
            emit_deployment(result)
        }
        PagesCommand::Status {
            project,
            deployment_id,
            wait,
        } => emit_deployment(status(orchestrator, &project, &deployment_id, wait).await),
        PagesCommand::Create {
            name,
            production_branch,
        } => emit(orchestrator.create_project(&name, &production_branch).await),
        PagesCommand::Delete { name } => emit(orchestrator.delete_project(&name).await),
        PagesCommand::List => emit(orchestrator.list_projects().await),
        PagesCommand::Deployments { project } => {
            emit(orchestrator.list_deployments(&project).await)
        }
    }
}
