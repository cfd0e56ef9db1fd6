//! Pages project and deployment types

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use cf_console_provider::FormPart;

use crate::error::{CoreError, CoreResult};

/// Upload name of the single Worker script of a deployment
pub const WORKER_SCRIPT_NAME: &str = "_worker.js";

/// A Pages project as reported by the upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagesProject {
    pub name: String,
    #[serde(default)]
    pub production_branch: String,
    #[serde(default)]
    pub subdomain: String,
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,
}

/// Deployment lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Created,
    Uploading,
    Building,
    Live,
    Failed,
}

impl DeploymentStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Live | Self::Failed)
    }

    /// Edges of the deployment state machine
    fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Uploading | Self::Failed)
                | (Self::Uploading, Self::Building | Self::Live | Self::Failed)
                | (Self::Building, Self::Building | Self::Live | Self::Failed)
        )
    }
}

/// Why a deployment ended in [`DeploymentStatus::Failed`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum DeploymentFailure {
    /// The upload never reached the upstream
    Unreachable(String),
    /// The upstream refused the upload
    Rejected { code: i64, message: String },
    /// The remote build failed or was canceled at the named stage
    BuildFailed(String),
    /// No terminal state within the poll timeout
    Timeout,
}

/// One publish attempt of a Pages project.
///
/// `url` is only set while `Live`; `failure` only while `Failed`. Once terminal
/// the record no longer changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: String,
    pub project_name: String,
    pub branch: String,
    pub status: DeploymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub created_on: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<DeploymentFailure>,
}

impl Deployment {
    /// A fresh local deployment; the id is replaced by the upstream one after upload.
    pub fn created(project_name: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            id: format!("local-{}", uuid::Uuid::new_v4()),
            project_name: project_name.into(),
            branch: branch.into(),
            status: DeploymentStatus::Created,
            url: None,
            created_on: Utc::now(),
            failure: None,
        }
    }

    /// Move to `next`, enforcing the state machine.
    pub fn transition(&mut self, next: DeploymentStatus) -> CoreResult<()> {
        if !self.status.can_become(next) {
            return Err(CoreError::ValidationError(format!(
                "deployment {} cannot move from {:?} to {next:?}",
                self.id, self.status
            )));
        }
        self.status = next;
        if next != DeploymentStatus::Live {
            self.url = None;
        }
        Ok(())
    }

    pub fn fail(&mut self, failure: DeploymentFailure) -> CoreResult<()> {
        self.transition(DeploymentStatus::Failed)?;
        self.failure = Some(failure);
        Ok(())
    }

    /// Fold an upstream deployment object into this record.
    ///
    /// Terminal records are left untouched.
    pub fn apply_upstream(&mut self, value: &Value) -> CoreResult<()> {
        if self.status.is_terminal() {
            return Ok(());
        }
        let remote: UpstreamDeployment = serde_json::from_value(value.clone())?;
        let outcome = remote.stage_outcome();
        if !remote.id.is_empty() {
            self.id = remote.id;
        }
        if let Some(created_on) = remote.created_on {
            self.created_on = created_on;
        }
        if self.status == DeploymentStatus::Created {
            self.transition(DeploymentStatus::Uploading)?;
        }
        match outcome {
            StageOutcome::Live => {
                self.transition(DeploymentStatus::Live)?;
                self.url = remote.url.filter(|u| !u.is_empty());
            }
            StageOutcome::Failed(stage) => self.fail(DeploymentFailure::BuildFailed(stage))?,
            StageOutcome::Pending => self.transition(DeploymentStatus::Building)?,
        }
        Ok(())
    }

    /// Build a record for a deployment the orchestrator did not start.
    pub fn from_upstream(project_name: &str, value: &Value) -> CoreResult<Self> {
        let branch = value
            .pointer("/deployment_trigger/metadata/branch")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let mut deployment = Self::created(project_name, branch);
        deployment.apply_upstream(value)?;
        Ok(deployment)
    }
}

#[derive(Debug, Deserialize)]
struct UpstreamDeployment {
    #[serde(default)]
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    created_on: Option<DateTime<Utc>>,
    #[serde(default)]
    latest_stage: Option<Stage>,
}

#[derive(Debug, Deserialize)]
struct Stage {
    #[serde(default)]
    name: String,
    #[serde(default)]
    status: String,
}

enum StageOutcome {
    Live,
    Failed(String),
    Pending,
}

impl UpstreamDeployment {
    fn stage_outcome(&self) -> StageOutcome {
        match &self.latest_stage {
            Some(stage) if matches!(stage.status.as_str(), "failure" | "canceled") => {
                StageOutcome::Failed(stage.name.clone())
            }
            Some(stage) if stage.name == "deploy" && stage.status == "success" => StageOutcome::Live,
            Some(_) => StageOutcome::Pending,
            // Direct uploads without stage information are published immediately.
            None if self.url.as_deref().is_some_and(|u| !u.is_empty()) => StageOutcome::Live,
            None => StageOutcome::Pending,
        }
    }
}

/// The Worker script of a deployment
#[derive(Clone, PartialEq, Eq)]
pub struct Asset {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Asset {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read an asset from disk, keeping only the file name.
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            CoreError::ValidationError(format!("cannot read asset {}: {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    /// Lowercased extension of `file_name`
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    /// Hex SHA-256 of the content
    #[must_use]
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }

    /// Multipart body of a direct-upload deployment.
    #[must_use]
    pub fn to_form(&self, branch: &str) -> Vec<FormPart> {
        vec![
            FormPart::text("manifest", "{}"),
            FormPart::text("branch", branch),
            FormPart::file(
                WORKER_SCRIPT_NAME,
                WORKER_SCRIPT_NAME,
                "text/javascript",
                self.bytes.clone(),
            ),
        ]
    }
}

impl std::fmt::Debug for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Asset")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}
