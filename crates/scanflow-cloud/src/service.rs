//! Remote build service gateway
//!
//! Job creation returns an operation handle; polling that handle returns
//! `{done, metadata}`. Nothing else is assumed about the service. The
//! concrete implementation speaks the Cloud Build REST API.

use crate::error::Result;
use crate::job::JobSpec;
use crate::storage::expect_success;
use async_trait::async_trait;
use scanflow_config::Credentials;
use serde::Deserialize;
use tracing::{debug, info};

/// Handle to a submitted build operation.
#[derive(Debug, Clone)]
pub struct OperationHandle {
    /// Operation resource name, polled until done
    pub name: String,

    /// Service-assigned build ID, used for cancellation when known
    pub build_id: Option<String>,
}

/// One status sample of a running operation.
#[derive(Debug, Clone)]
pub struct OperationStatus {
    pub done: bool,
    pub metadata: Option<serde_json::Value>,
}

#[async_trait]
pub trait BuildService: Send + Sync {
    /// Submit a build job. Returns the operation handle to poll.
    async fn create_build(&self, spec: &JobSpec) -> Result<OperationHandle>;

    /// Sample the operation status.
    async fn get_operation(&self, name: &str) -> Result<OperationStatus>;

    /// Ask the service to stop a running build.
    async fn cancel_build(&self, build_id: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

/// Cloud Build REST implementation.
pub struct RemoteBuildService {
    client: reqwest::Client,
    project: String,
    token: String,
    endpoint: String,
}

impl RemoteBuildService {
    pub fn new(
        client: reqwest::Client,
        project: &str,
        region: &str,
        credentials: &Credentials,
    ) -> Self {
        // regional builds go through the region-prefixed endpoint
        let endpoint = if region.is_empty() || region == "global" {
            "https://cloudbuild.googleapis.com".to_string()
        } else {
            format!("https://{}-cloudbuild.googleapis.com", region)
        };
        Self {
            client,
            project: project.to_string(),
            token: credentials.token.clone(),
            endpoint,
        }
    }

    /// Point the gateway at a different endpoint (emulators, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl BuildService for RemoteBuildService {
    async fn create_build(&self, spec: &JobSpec) -> Result<OperationHandle> {
        let url = format!("{}/v1/projects/{}/builds", self.endpoint, self.project);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(spec)
            .send()
            .await?;
        let response = expect_success(response).await?;

        let operation: Operation = response.json().await?;
        let build_id = operation
            .metadata
            .as_ref()
            .and_then(|m| m.pointer("/build/id"))
            .and_then(|id| id.as_str())
            .map(String::from);

        info!(operation = %operation.name, "Build submitted");
        Ok(OperationHandle {
            name: operation.name,
            build_id,
        })
    }

    async fn get_operation(&self, name: &str) -> Result<OperationStatus> {
        let url = format!("{}/v1/{}", self.endpoint, name);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = expect_success(response).await?;

        let operation: Operation = response.json().await?;
        debug!(operation = name, done = operation.done, "Sampled operation");
        Ok(OperationStatus {
            done: operation.done,
            metadata: operation.metadata,
        })
    }

    async fn cancel_build(&self, build_id: &str) -> Result<()> {
        let url = format!(
            "{}/v1/projects/{}/builds/{}:cancel",
            self.endpoint, self.project, build_id
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        expect_success(response).await?;

        info!(build_id, "Requested build cancellation");
        Ok(())
    }
}
