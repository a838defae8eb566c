//! Remote object store gateway
//!
//! Container-scoped blob store holding the uploaded build context and the
//! scan artifact. The gateway keeps no state of its own; everything lives
//! remotely. The concrete implementation speaks the Cloud Storage JSON API.

use crate::error::{CloudError, Result};
use async_trait::async_trait;
use scanflow_config::Credentials;
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

/// Opaque blob store keyed by `bucket` and `key`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create the bucket if it does not exist. An existing bucket is not an
    /// error.
    async fn ensure_bucket(&self, bucket: &str) -> Result<()>;

    /// Upload one object as a single sequential read of `file`.
    async fn upload(&self, bucket: &str, key: &str, file: tokio::fs::File) -> Result<()>;

    /// Fetch an object's bytes. An absent key is `CloudError::NotFound`.
    async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Delete an object.
    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;
}

/// Cloud Storage JSON API implementation.
pub struct GcsStore {
    client: reqwest::Client,
    project: String,
    token: String,
    endpoint: String,
}

impl GcsStore {
    const ENDPOINT: &'static str = "https://storage.googleapis.com";

    pub fn new(client: reqwest::Client, project: &str, credentials: &Credentials) -> Self {
        Self {
            client,
            project: project.to_string(),
            token: credentials.token.clone(),
            endpoint: Self::ENDPOINT.to_string(),
        }
    }

    /// Point the gateway at a different endpoint (emulators, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}",
            self.endpoint,
            bucket,
            urlencoding::encode(key)
        )
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        let url = format!("{}/storage/v1/b/{}", self.endpoint, bucket);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status().is_success() {
            debug!(bucket, "Bucket already exists");
            return Ok(());
        }
        if response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(error_from_response(response).await);
        }

        info!(bucket, "Creating bucket");
        let url = format!("{}/storage/v1/b?project={}", self.endpoint, self.project);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "name": bucket }))
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    async fn upload(&self, bucket: &str, key: &str, file: tokio::fs::File) -> Result<()> {
        let url = format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.endpoint,
            bucket,
            urlencoding::encode(key)
        );

        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/gzip")
            .body(body)
            .send()
            .await?;
        expect_success(response).await?;

        debug!(bucket, key, "Object uploaded");
        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let url = format!("{}?alt=media", self.object_url(bucket, key));
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CloudError::NotFound(format!("{}/{}", bucket, key)));
        }
        let response = expect_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.object_url(bucket, key))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CloudError::NotFound(format!("{}/{}", bucket, key)));
        }
        expect_success(response).await?;

        debug!(bucket, key, "Object deleted");
        Ok(())
    }
}

/// Map a non-success response to the error taxonomy. 401/403 are
/// authentication failures; everything else surfaces as an API error.
pub(crate) async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    Err(error_from_response(response).await)
}

pub(crate) async fn error_from_response(response: reqwest::Response) -> CloudError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    match status.as_u16() {
        401 | 403 => CloudError::Auth(message),
        _ => CloudError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
