//! Deployment orchestrator
//!
//! Drives the Pages direct-upload flow through the gateway:
//!
//! ```text
//! Created --validate--> (ValidationError, no network)
//! Created --upload ok--> Uploading --remote build--> Building --> Live | Failed
//! ```
//!
//! At most one non-terminal deployment per project is in flight. The state lock
//! is never held across an upstream call.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::DeployConfig;
use crate::error::{CoreError, CoreResult};
use crate::services::ResourceGateway;
use crate::types::{
    Asset, Deployment, DeploymentFailure, DeploymentStatus, Operation, PagesProject,
    RequestParams, ResourceKind,
};

/// Upper bound of a Pages project name
const MAX_PROJECT_NAME_LEN: usize = 58;

struct TrackedDeployment {
    deployment: Deployment,
    started: Instant,
}

#[derive(Default)]
struct DeployState {
    /// project name -> id of its non-terminal deployment
    in_flight: HashMap<String, String>,
    tracked: HashMap<String, TrackedDeployment>,
}

impl DeployState {
    /// Record `deployment`. If the project slot is held under `slot_id`, it
    /// follows the deployment's id or is freed once the deployment is terminal.
    fn store(&mut self, deployment: &Deployment, slot_id: &str, started: Instant) {
        let project = &deployment.project_name;
        if self.in_flight.get(project).map(String::as_str) == Some(slot_id) {
            if deployment.status.is_terminal() {
                self.in_flight.remove(project);
            } else {
                self.in_flight.insert(project.clone(), deployment.id.clone());
            }
        }
        self.tracked.insert(
            deployment.id.clone(),
            TrackedDeployment {
                deployment: deployment.clone(),
                started,
            },
        );
    }

    /// Track a deployment started elsewhere. It takes the project slot only if free.
    fn adopt(&mut self, deployment: &Deployment, started: Instant) {
        if !deployment.status.is_terminal() {
            self.in_flight
                .entry(deployment.project_name.clone())
                .or_insert_with(|| deployment.id.clone());
        }
        self.tracked.insert(
            deployment.id.clone(),
            TrackedDeployment {
                deployment: deployment.clone(),
                started,
            },
        );
    }

    /// Free the project slot if `slot_id` holds it.
    fn release(&mut self, project_name: &str, slot_id: &str) {
        if self.in_flight.get(project_name).map(String::as_str) == Some(slot_id) {
            self.in_flight.remove(project_name);
        }
    }
}

/// Deployment orchestrator
pub struct DeploymentOrchestrator {
    gateway: Arc<ResourceGateway>,
    config: DeployConfig,
    branch_pattern: Regex,
    state: Mutex<DeployState>,
}

impl DeploymentOrchestrator {
    /// # Errors
    /// `ValidationError` if the configured branch pattern is not a valid regex.
    pub fn new(gateway: Arc<ResourceGateway>, config: DeployConfig) -> CoreResult<Self> {
        let branch_pattern = Regex::new(&config.branch_pattern).map_err(|e| {
            CoreError::ValidationError(format!(
                "invalid branch pattern '{}': {e}",
                config.branch_pattern
            ))
        })?;
        Ok(Self {
            gateway,
            config,
            branch_pattern,
            state: Mutex::new(DeployState::default()),
        })
    }

    /// Upload `asset` as a new deployment of `project_name` on `branch`.
    ///
    /// Transport failure or upstream refusal of the upload yields a `Failed`
    /// deployment, not an error. The upload is never retried.
    pub async fn deploy(
        &self,
        project_name: &str,
        branch: &str,
        asset: Asset,
    ) -> CoreResult<Deployment> {
        validate_project_name(project_name)?;
        self.validate_branch(branch)?;
        self.validate_asset(&asset)?;

        let mut deployment = Deployment::created(project_name, branch);
        {
            let mut state = self.state.lock().await;
            if let Some(existing) = state.in_flight.get(project_name) {
                return Err(CoreError::Conflict(format!(
                    "project '{project_name}' already has deployment {existing} in progress"
                )));
            }
            state
                .in_flight
                .insert(project_name.to_string(), deployment.id.clone());
        }
        let slot_id = deployment.id.clone();
        let started = Instant::now();

        log::info!(
            "Deploying {} ({} bytes, sha256 {}) to {project_name}@{branch}",
            asset.file_name,
            asset.bytes.len(),
            asset.digest()
        );

        if let Err(e) = deployment.transition(DeploymentStatus::Uploading) {
            self.state.lock().await.release(project_name, &slot_id);
            return Err(e);
        }
        let params = RequestParams::new()
            .path("project_name", project_name)
            .multipart(asset.to_form(branch));
        let upload = self
            .gateway
            .execute(ResourceKind::PagesProject, Operation::CreateDeployment, params)
            .await;

        let outcome = match upload {
            Ok(Some(value)) => match deployment.apply_upstream(&value) {
                Ok(()) => Ok(()),
                Err(e) => {
                    // The upload went through; keep the slot until polling settles it.
                    log::warn!("Upload to {project_name} accepted, reply unreadable: {e}");
                    if let Some(id) = value.get("id").and_then(Value::as_str) {
                        if !id.is_empty() {
                            deployment.id = id.to_string();
                        }
                    }
                    deployment.transition(DeploymentStatus::Building)
                }
            },
            Ok(None) => deployment.fail(DeploymentFailure::Rejected {
                code: 0,
                message: "upload reply carried no deployment".to_string(),
            }),
            Err(CoreError::UpstreamUnreachable(reason)) => {
                deployment.fail(DeploymentFailure::Unreachable(reason))
            }
            Err(CoreError::UpstreamRejected { code, message, .. }) => {
                deployment.fail(DeploymentFailure::Rejected { code, message })
            }
            Err(e) => Err(e),
        };

        let mut state = self.state.lock().await;
        if let Err(e) = outcome {
            state.release(project_name, &slot_id);
            return Err(e);
        }
        state.store(&deployment, &slot_id, started);
        drop(state);

        match &deployment.failure {
            Some(failure) => log::warn!("Deployment {} failed: {failure:?}", deployment.id),
            None => log::info!(
                "Deployment {} of {project_name} is {:?}",
                deployment.id,
                deployment.status
            ),
        }
        Ok(deployment)
    }

    /// Current state of a tracked deployment.
    ///
    /// Terminal deployments are answered from the stored record. A deployment
    /// still pending after the poll timeout becomes `Failed(Timeout)`, also when
    /// the poll itself failed.
    pub async fn poll_status(&self, deployment_id: &str) -> CoreResult<Deployment> {
        let (snapshot, started) = {
            let state = self.state.lock().await;
            let tracked = state
                .tracked
                .get(deployment_id)
                .ok_or_else(|| CoreError::NotFound(format!("deployment '{deployment_id}'")))?;
            if tracked.deployment.status.is_terminal() {
                return Ok(tracked.deployment.clone());
            }
            (tracked.deployment.clone(), tracked.started)
        };

        let params = RequestParams::new()
            .path("project_name", snapshot.project_name.as_str())
            .path("deployment_id", snapshot.id.as_str());
        let reply = self
            .gateway
            .execute(ResourceKind::PagesProject, Operation::GetDeployment, params)
            .await;
        let timed_out = started.elapsed() >= self.config.poll_timeout();

        let mut refreshed = snapshot;
        match reply {
            Ok(value) => refreshed.apply_upstream(&value.unwrap_or(Value::Null))?,
            Err(e) if !timed_out => return Err(e),
            Err(e) => log::warn!("Last poll of deployment {deployment_id} failed: {e}"),
        }
        if !refreshed.status.is_terminal() && timed_out {
            log::warn!(
                "Deployment {} not finished after {}s",
                refreshed.id,
                self.config.poll_timeout_secs
            );
            refreshed.fail(DeploymentFailure::Timeout)?;
        }

        let mut state = self.state.lock().await;
        // A concurrent poll may have finished it first; the terminal record wins.
        if let Some(current) = state.tracked.get(deployment_id) {
            if current.deployment.status.is_terminal() {
                return Ok(current.deployment.clone());
            }
        }
        state.store(&refreshed, deployment_id, started);
        Ok(refreshed)
    }

    /// Poll at the configured interval until the deployment is terminal.
    ///
    /// An unreachable upstream is retried until the poll timeout turns the
    /// deployment into `Failed(Timeout)`.
    pub async fn await_terminal(&self, deployment_id: &str) -> CoreResult<Deployment> {
        loop {
            match self.poll_status(deployment_id).await {
                Ok(deployment) if deployment.status.is_terminal() => return Ok(deployment),
                Ok(_) => {}
                Err(CoreError::UpstreamUnreachable(reason)) => {
                    log::warn!("Polling deployment {deployment_id} failed, retrying: {reason}");
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }

    /// Start tracking an existing upstream deployment so it can be polled.
    ///
    /// Already tracked ids are polled instead. The poll timeout counts from
    /// the moment of attaching.
    pub async fn attach(&self, project_name: &str, deployment_id: &str) -> CoreResult<Deployment> {
        validate_project_name(project_name)?;
        if self.state.lock().await.tracked.contains_key(deployment_id) {
            return self.poll_status(deployment_id).await;
        }

        let params = RequestParams::new()
            .path("project_name", project_name)
            .path("deployment_id", deployment_id);
        let value = self
            .gateway
            .execute(ResourceKind::PagesProject, Operation::GetDeployment, params)
            .await?
            .unwrap_or(Value::Null);
        let deployment = Deployment::from_upstream(project_name, &value)?;

        let mut state = self.state.lock().await;
        if let Some(existing) = state.tracked.get(&deployment.id) {
            return Ok(existing.deployment.clone());
        }
        state.adopt(&deployment, Instant::now());
        log::debug!("Attached to deployment {} of {project_name}", deployment.id);
        Ok(deployment)
    }

    /// Last known state of a tracked deployment, without a network call.
    pub async fn tracked(&self, deployment_id: &str) -> CoreResult<Deployment> {
        self.state
            .lock()
            .await
            .tracked
            .get(deployment_id)
            .map(|t| t.deployment.clone())
            .ok_or_else(|| CoreError::NotFound(format!("deployment '{deployment_id}'")))
    }

    pub async fn create_project(
        &self,
        name: &str,
        production_branch: &str,
    ) -> CoreResult<PagesProject> {
        validate_project_name(name)?;
        self.validate_branch(production_branch)?;
        let params = RequestParams::new()
            .json(json!({ "name": name, "production_branch": production_branch }));
        let value = self
            .gateway
            .execute(ResourceKind::PagesProject, Operation::Create, params)
            .await?
            .unwrap_or(Value::Null);
        let project: PagesProject = serde_json::from_value(value)?;
        log::info!("Created Pages project {}", project.name);
        Ok(project)
    }

    pub async fn delete_project(&self, name: &str) -> CoreResult<()> {
        validate_project_name(name)?;
        self.gateway
            .execute(
                ResourceKind::PagesProject,
                Operation::Delete,
                RequestParams::new().path("project_name", name),
            )
            .await?;
        log::info!("Deleted Pages project {name}");
        Ok(())
    }

    pub async fn list_projects(&self) -> CoreResult<Vec<PagesProject>> {
        let value = self
            .gateway
            .execute(ResourceKind::PagesProject, Operation::List, RequestParams::new())
            .await?
            .unwrap_or(Value::Array(Vec::new()));
        Ok(serde_json::from_value(value)?)
    }

    /// Deployments of a project as the upstream reports them.
    pub async fn list_deployments(&self, project_name: &str) -> CoreResult<Vec<Deployment>> {
        validate_project_name(project_name)?;
        let value = self
            .gateway
            .execute(
                ResourceKind::PagesProject,
                Operation::ListDeployments,
                RequestParams::new().path("project_name", project_name),
            )
            .await?
            .unwrap_or(Value::Array(Vec::new()));
        let Value::Array(items) = value else {
            return Err(CoreError::SerializationError(
                "deployment list is not an array".to_string(),
            ));
        };
        items
            .iter()
            .map(|item| Deployment::from_upstream(project_name, item))
            .collect()
    }

    fn validate_branch(&self, branch: &str) -> CoreResult<()> {
        if self.branch_pattern.is_match(branch) {
            Ok(())
        } else {
            Err(CoreError::ValidationError(format!(
                "branch '{branch}' does not match {}",
                self.config.branch_pattern
            )))
        }
    }

    fn validate_asset(&self, asset: &Asset) -> CoreResult<()> {
        let extension = asset.extension().unwrap_or_default();
        if !self
            .config
            .accepted_extensions
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(&extension))
        {
            return Err(CoreError::ValidationError(format!(
                "asset '{}' must have one of the extensions: {}",
                asset.file_name,
                self.config.accepted_extensions.join(", ")
            )));
        }
        if asset.bytes.is_empty() {
            return Err(CoreError::ValidationError(format!(
                "asset '{}' is empty",
                asset.file_name
            )));
        }
        let size = u64::try_from(asset.bytes.len()).unwrap_or(u64::MAX);
        if size > self.config.max_asset_bytes {
            return Err(CoreError::ValidationError(format!(
                "asset '{}' is {size} bytes, limit is {}",
                asset.file_name, self.config.max_asset_bytes
            )));
        }
        Ok(())
    }
}

/// Lowercase letters, digits and inner hyphens, at most 58 characters.
pub fn validate_project_name(name: &str) -> CoreResult<()> {
    let well_formed = !name.is_empty()
        && name.len() <= MAX_PROJECT_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-');
    if well_formed {
        Ok(())
    } else {
        Err(CoreError::ValidationError(format!(
            "invalid Pages project name '{name}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{orchestrator_with, rejected, unreachable, MockUpstream};
    use cf_console_provider::{HttpMethod, RequestBody};
    use std::time::Duration;

    fn script() -> Asset {
        Asset::new("worker.js", b"export default { fetch() { return new Response('ok') } }".to_vec())
    }

    fn building(id: &str) -> Value {
        json!({
            "id": id,
            "url": format!("https://{id}.site.pages.dev"),
            "created_on": "2026-03-01T10:00:00Z",
            "latest_stage": {"name": "build", "status": "active"}
        })
    }

    fn live(id: &str) -> Value {
        json!({
            "id": id,
            "url": format!("https://{id}.site.pages.dev"),
            "created_on": "2026-03-01T10:00:00Z",
            "latest_stage": {"name": "deploy", "status": "success"}
        })
    }

    #[test]
    fn project_name_rules() {
        assert!(validate_project_name("my-site-2").is_ok());
        let too_long = "a".repeat(59);
        for bad in ["", "My-Site", "-site", "site-", "site_1", too_long.as_str()] {
            assert!(validate_project_name(bad).is_err(), "{bad}");
        }
    }

    #[tokio::test]
    async fn empty_asset_makes_no_calls() {
        let mock = MockUpstream::new();
        let (orchestrator, _) = orchestrator_with(&mock, DeployConfig::default()).await;

        let result = orchestrator
            .deploy("site", "main", Asset::new("worker.js", Vec::new()))
            .await;
        assert!(matches!(result, Err(CoreError::ValidationError(_))), "{result:?}");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn validation_order_and_limits() {
        let mock = MockUpstream::new();
        let config = DeployConfig {
            max_asset_bytes: 8,
            ..DeployConfig::default()
        };
        let (orchestrator, _) = orchestrator_with(&mock, config).await;

        let cases = [
            ("Bad_Name", "main", Asset::new("w.txt", Vec::new()), "project name"),
            ("site", "-main", Asset::new("w.txt", Vec::new()), "branch"),
            ("site", "main", Asset::new("w.txt", b"x".to_vec()), "extensions"),
            ("site", "main", Asset::new("w.mjs", vec![b'x'; 9]), "limit"),
        ];
        for (project, branch, asset, expected) in cases {
            let result = orchestrator.deploy(project, branch, asset).await;
            let Err(CoreError::ValidationError(message)) = result else {
                panic!("expected ValidationError for {expected}, got {result:?}");
            };
            assert!(message.contains(expected), "{message}");
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn upload_sends_one_multipart_request() {
        let mock = MockUpstream::new();
        mock.push_ok(building("dep-1"));
        let (orchestrator, _) = orchestrator_with(&mock, DeployConfig::default()).await;

        let deployment = orchestrator.deploy("site", "main", script()).await.unwrap();
        assert_eq!(deployment.id, "dep-1");
        assert_eq!(deployment.status, DeploymentStatus::Building);
        assert_eq!(deployment.url, None);

        let sent = mock.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].path, "/accounts/acc-1/pages/projects/site/deployments");
        let RequestBody::Multipart(parts) = &sent[0].body else {
            panic!("expected multipart body, got {:?}", sent[0].body);
        };
        let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["manifest", "branch", "_worker.js"]);
    }

    #[tokio::test]
    async fn second_deploy_while_building_conflicts() {
        let mock = MockUpstream::new();
        mock.push_ok(building("dep-1"));
        let (orchestrator, _) = orchestrator_with(&mock, DeployConfig::default()).await;

        orchestrator.deploy("site", "main", script()).await.unwrap();
        let second = orchestrator.deploy("site", "main", script()).await;
        assert!(matches!(second, Err(CoreError::Conflict(_))), "{second:?}");
        assert_eq!(mock.call_count(), 1);

        // Other projects are unaffected.
        mock.push_ok(live("dep-2"));
        let other = orchestrator.deploy("docs", "main", script()).await.unwrap();
        assert_eq!(other.status, DeploymentStatus::Live);
    }

    #[tokio::test]
    async fn unreachable_upload_is_failed_and_releases_slot() {
        let mock = MockUpstream::new();
        mock.push_err(unreachable());
        mock.push_ok(live("dep-2"));
        let (orchestrator, _) = orchestrator_with(&mock, DeployConfig::default()).await;

        let failed = orchestrator.deploy("site", "main", script()).await.unwrap();
        assert_eq!(failed.status, DeploymentStatus::Failed);
        assert!(matches!(failed.failure, Some(DeploymentFailure::Unreachable(_))));
        assert_eq!(mock.call_count(), 1);

        let retried = orchestrator.deploy("site", "main", script()).await.unwrap();
        assert_eq!(retried.status, DeploymentStatus::Live);
    }

    #[tokio::test]
    async fn rejected_upload_keeps_code() {
        let mock = MockUpstream::new();
        mock.push_err(rejected(8_000_007, "Project not found"));
        let (orchestrator, _) = orchestrator_with(&mock, DeployConfig::default()).await;

        let failed = orchestrator.deploy("ghost", "main", script()).await.unwrap();
        assert_eq!(
            failed.failure,
            Some(DeploymentFailure::Rejected {
                code: 8_000_007,
                message: "Project not found".to_string()
            })
        );
    }

    #[tokio::test]
    async fn attach_then_await_terminal() {
        let mock = MockUpstream::new();
        mock.push_ok(building("dep-9"));
        mock.push_ok(live("dep-9"));
        let config = DeployConfig {
            poll_interval_secs: 0,
            ..DeployConfig::default()
        };
        let (orchestrator, _) = orchestrator_with(&mock, config).await;

        assert!(matches!(
            orchestrator.poll_status("dep-9").await,
            Err(CoreError::NotFound(_))
        ));

        let attached = orchestrator.attach("site", "dep-9").await.unwrap();
        assert_eq!(attached.status, DeploymentStatus::Building);
        assert_eq!(
            mock.requests()[0].path,
            "/accounts/acc-1/pages/projects/site/deployments/dep-9"
        );

        let done = orchestrator.await_terminal("dep-9").await.unwrap();
        assert_eq!(done.status, DeploymentStatus::Live);
        assert_eq!(done.url.as_deref(), Some("https://dep-9.site.pages.dev"));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn no_current_account_is_an_error() {
        let mock = MockUpstream::new();
        let (orchestrator, registry) = orchestrator_with(&mock, DeployConfig::default()).await;
        registry.remove("a1").await.unwrap();

        let result = orchestrator.deploy("site", "main", script()).await;
        assert!(matches!(result, Err(CoreError::NoCurrentAccount)), "{result:?}");
        assert_eq!(mock.call_count(), 0);

        // The slot was released.
        registry
            .add_account(crate::test_utils::create_request("a2"))
            .await
            .unwrap();
        registry.switch_to("a2").await.unwrap();
        mock.push_ok(json!([{"id": "acc-2"}]));
        mock.push_ok(building("dep-3"));
        assert!(orchestrator.deploy("site", "main", script()).await.is_ok());
    }

    #[tokio::test]
    async fn poll_is_idempotent_and_reaches_live() {
        let mock = MockUpstream::new();
        mock.push_ok(building("dep-1"));
        mock.push_ok(building("dep-1"));
        mock.push_ok(building("dep-1"));
        mock.push_ok(live("dep-1"));
        let (orchestrator, _) = orchestrator_with(&mock, DeployConfig::default()).await;
        orchestrator.deploy("site", "main", script()).await.unwrap();

        let first = orchestrator.poll_status("dep-1").await.unwrap();
        let second = orchestrator.poll_status("dep-1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.status, DeploymentStatus::Building);

        let done = orchestrator.poll_status("dep-1").await.unwrap();
        assert_eq!(done.status, DeploymentStatus::Live);
        assert_eq!(done.url.as_deref(), Some("https://dep-1.site.pages.dev"));

        // Terminal: answered locally.
        let calls = mock.call_count();
        let again = orchestrator.poll_status("dep-1").await.unwrap();
        assert_eq!(again, done);
        assert_eq!(mock.call_count(), calls);
    }

    #[tokio::test]
    async fn poll_unknown_is_not_found() {
        let mock = MockUpstream::new();
        let (orchestrator, _) = orchestrator_with(&mock, DeployConfig::default()).await;
        assert!(matches!(
            orchestrator.poll_status("dep-x").await,
            Err(CoreError::NotFound(_))
        ));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn poll_failure_leaves_deployment_pending() {
        let mock = MockUpstream::new();
        mock.push_ok(building("dep-1"));
        mock.push_err(unreachable());
        let (orchestrator, _) = orchestrator_with(&mock, DeployConfig::default()).await;
        orchestrator.deploy("site", "main", script()).await.unwrap();

        let result = orchestrator.poll_status("dep-1").await;
        assert!(matches!(result, Err(CoreError::UpstreamUnreachable(_))), "{result:?}");
        assert_eq!(
            orchestrator.tracked("dep-1").await.unwrap().status,
            DeploymentStatus::Building
        );
    }

    #[tokio::test(start_paused = true)]
    async fn await_terminal_times_out_and_releases_slot() {
        let mock = MockUpstream::new();
        mock.push_ok(building("dep-1"));
        mock.set_fallback_ok(building("dep-1"));
        let config = DeployConfig {
            poll_interval_secs: 2,
            poll_timeout_secs: 5,
            ..DeployConfig::default()
        };
        let (orchestrator, _) = orchestrator_with(&mock, config).await;
        orchestrator.deploy("site", "main", script()).await.unwrap();

        let started = Instant::now();
        let finished = orchestrator.await_terminal("dep-1").await.unwrap();
        assert_eq!(finished.status, DeploymentStatus::Failed);
        assert_eq!(finished.failure, Some(DeploymentFailure::Timeout));
        assert!(started.elapsed() >= Duration::from_secs(5));

        // Still inspectable, and the project accepts a new deploy.
        assert_eq!(
            orchestrator.tracked("dep-1").await.unwrap().failure,
            Some(DeploymentFailure::Timeout)
        );
        mock.push_ok(live("dep-2"));
        assert!(orchestrator.deploy("site", "main", script()).await.is_ok());
    }

    #[tokio::test]
    async fn attached_deployment_does_not_free_another_slot() {
        let mock = MockUpstream::new();
        mock.push_ok(building("dep-1"));
        mock.push_ok(building("dep-0"));
        mock.push_ok(live("dep-0"));
        let (orchestrator, _) = orchestrator_with(&mock, DeployConfig::default()).await;

        orchestrator.deploy("site", "main", script()).await.unwrap();
        let attached = orchestrator.attach("site", "dep-0").await.unwrap();
        assert_eq!(attached.status, DeploymentStatus::Building);

        let done = orchestrator.poll_status("dep-0").await.unwrap();
        assert_eq!(done.status, DeploymentStatus::Live);
        assert_eq!(
            orchestrator.tracked("dep-1").await.unwrap().status,
            DeploymentStatus::Building
        );

        let second = orchestrator.deploy("site", "main", script()).await;
        assert!(matches!(second, Err(CoreError::Conflict(ref m)) if m.contains("dep-1")), "{second:?}");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn unreadable_upload_reply_keeps_slot() {
        let mock = MockUpstream::new();
        mock.push_ok(json!({
            "id": "dep-1",
            "created_on": "yesterday",
            "latest_stage": {"name": "queued", "status": "active"}
        }));
        let (orchestrator, _) = orchestrator_with(&mock, DeployConfig::default()).await;

        let deployment = orchestrator.deploy("site", "main", script()).await.unwrap();
        assert_eq!(deployment.id, "dep-1");
        assert_eq!(deployment.status, DeploymentStatus::Building);

        let second = orchestrator.deploy("site", "main", script()).await;
        assert!(matches!(second, Err(CoreError::Conflict(_))), "{second:?}");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_polls_end_in_timeout() {
        let mock = MockUpstream::new();
        mock.push_ok(building("dep-1"));
        mock.set_fallback_err(unreachable());
        let config = DeployConfig {
            poll_interval_secs: 2,
            poll_timeout_secs: 5,
            ..DeployConfig::default()
        };
        let (orchestrator, _) = orchestrator_with(&mock, config).await;
        orchestrator.deploy("site", "main", script()).await.unwrap();

        let finished = orchestrator.await_terminal("dep-1").await.unwrap();
        assert_eq!(finished.failure, Some(DeploymentFailure::Timeout));
        assert!(mock.call_count() > 2);

        mock.push_ok(live("dep-2"));
        assert!(orchestrator.deploy("site", "main", script()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_poll_after_deadline_is_timeout() {
        let mock = MockUpstream::new();
        mock.push_ok(building("dep-1"));
        mock.push_err(unreachable());
        let config = DeployConfig {
            poll_timeout_secs: 5,
            ..DeployConfig::default()
        };
        let (orchestrator, _) = orchestrator_with(&mock, config).await;
        orchestrator.deploy("site", "main", script()).await.unwrap();

        tokio::time::advance(Duration::from_secs(60)).await;
        let polled = orchestrator.poll_status("dep-1").await.unwrap();
        assert_eq!(polled.status, DeploymentStatus::Failed);
        assert_eq!(polled.failure, Some(DeploymentFailure::Timeout));
    }

    #[tokio::test]
    async fn build_failure_is_terminal() {
        let mock = MockUpstream::new();
        mock.push_ok(building("dep-1"));
        mock.push_ok(json!({
            "id": "dep-1",
            "latest_stage": {"name": "build", "status": "failure"}
        }));
        let (orchestrator, _) = orchestrator_with(&mock, DeployConfig::default()).await;
        orchestrator.deploy("site", "main", script()).await.unwrap();

        let done = orchestrator.await_terminal("dep-1").await.unwrap();
        assert_eq!(
            done.failure,
            Some(DeploymentFailure::BuildFailed("build".to_string()))
        );
        assert_eq!(done.url, None);
    }

    #[tokio::test]
    async fn project_crud_goes_through_gateway() {
        let mock = MockUpstream::new();
        mock.push_ok(json!({
            "name": "site",
            "subdomain": "site.pages.dev",
            "production_branch": "main",
            "created_on": "2026-03-01T10:00:00Z"
        }));
        mock.push_ok(json!([{"name": "site", "subdomain": "site.pages.dev", "production_branch": "main"}]));
        mock.push_ok_empty();
        let (orchestrator, _) = orchestrator_with(&mock, DeployConfig::default()).await;

        let created = orchestrator.create_project("site", "main").await.unwrap();
        assert_eq!(created.subdomain, "site.pages.dev");
        let listed = orchestrator.list_projects().await.unwrap();
        assert_eq!(listed.len(), 1);
        orchestrator.delete_project("site").await.unwrap();

        let sent = mock.requests();
        assert_eq!(
            sent[0].body,
            RequestBody::Json(json!({"name": "site", "production_branch": "main"}))
        );
        assert_eq!(sent[2].method, HttpMethod::Delete);
        assert_eq!(sent[2].path, "/accounts/acc-1/pages/projects/site");

        assert!(matches!(
            orchestrator.create_project("Site!", "main").await,
            Err(CoreError::ValidationError(_))
        ));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn list_deployments_maps_statuses() {
        let mock = MockUpstream::new();
        mock.push_ok(json!([live("dep-2"), building("dep-1")]));
        let (orchestrator, _) = orchestrator_with(&mock, DeployConfig::default()).await;

        let deployments = orchestrator.list_deployments("site").await.unwrap();
        let statuses: Vec<DeploymentStatus> = deployments.iter().map(|d| d.status).collect();
        assert_eq!(statuses, vec![DeploymentStatus::Live, DeploymentStatus::Building]);
    }
}
