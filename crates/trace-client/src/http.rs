//! HTTP implementation of [`TraceService`]
//!
//! All routes hang below one base URL (`http://localhost:5000/api` by
//! default). Identifiers are percent-encoded as single path segments.

use crate::error::{ServiceError, ServiceResult};
use crate::service::TraceService;
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use trace_model::wire::{
    CodeReferenceResponse, CodeReferenceUpdate, ConnectRequest, ConnectResponse, ErrorBody,
    NodeTypeInfo, ParentSummary, TraceabilityLinks,
};
use trace_model::{ArtifactId, RelationshipSnapshot, SnapshotRecord, TreeRecord, VersionList};

/// Default collaborator root
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Connection settings for [`HttpTraceService`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// With base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With per-request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// `reqwest`-backed collaborator client
#[derive(Debug, Clone)]
pub struct HttpTraceService {
    client: Client,
    base: Url,
}

impl HttpTraceService {
    /// Build a client for `config`
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidBaseUrl`] for an unparsable or opaque
    /// base URL and [`ServiceError::Transport`] if the client cannot be built.
    pub fn new(config: &ClientConfig) -> ServiceResult<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ServiceError::InvalidBaseUrl(format!("{}: {e}", config.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(ServiceError::InvalidBaseUrl(config.base_url.clone()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, base })
    }

    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve route segments below the base URL
    fn endpoint(&self, segments: &[&str]) -> ServiceResult<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ServiceError::InvalidBaseUrl(self.base.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ServiceResult<T> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    async fn post<B, T>(&self, segments: &[&str], body: &B) -> ServiceResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        decode(response).await
    }
}

/// Decode a success body or classify a failure
async fn decode<T: DeserializeOwned>(response: Response) -> ServiceResult<T> {
    let status = response.status();
    let bytes = response.bytes().await?;
    if status.is_success() {
        return Ok(serde_json::from_slice(&bytes)?);
    }

    let code = status.as_u16();
    match serde_json::from_slice::<ErrorBody>(&bytes) {
        Ok(body) => Err(ServiceError::rejected(code, body.error)),
        Err(_) => {
            let text = String::from_utf8_lossy(&bytes).trim().to_string();
            let reason = if text.is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_string()
            } else {
                text
            };
            Err(ServiceError::Status {
                status: code,
                reason,
            })
        }
    }
}

#[async_trait]
impl TraceService for HttpTraceService {
    async fn requirements_hierarchy(&self) -> ServiceResult<Vec<TreeRecord>> {
        self.get(&["requirements", "hierarchy"]).await
    }

    async fn parents(&self) -> ServiceResult<Vec<ParentSummary>> {
        self.get(&["parents"]).await
    }

    async fn parent_blocks(&self, parent: &ArtifactId) -> ServiceResult<Vec<TreeRecord>> {
        self.get(&["parents", parent.as_str(), "blocks"]).await
    }

    async fn traceability_links(&self) -> ServiceResult<TraceabilityLinks> {
        self.get(&["traceability", "links"]).await
    }

    async fn node_type(&self, id: &ArtifactId) -> ServiceResult<NodeTypeInfo> {
        self.get(&["node-type", id.as_str()]).await
    }

    async fn connect(&self, request: &ConnectRequest) -> ServiceResult<ConnectResponse> {
        self.post(&["connect"], request).await
    }

    async fn artifact_versions(&self, artifact: &ArtifactId) -> ServiceResult<VersionList> {
        self.get(&["artifacts", artifact.as_str(), "versions"]).await
    }

    async fn version_snapshot(&self, version_id: &str) -> ServiceResult<RelationshipSnapshot> {
        let record: SnapshotRecord = self.get(&["versions", version_id, "snapshot"]).await?;
        Ok(record.into())
    }

    async fn update_code_reference(
        &self,
        update: &CodeReferenceUpdate,
    ) -> ServiceResult<CodeReferenceResponse> {
        self.post(&["code-references", "update"], update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base: &str) -> HttpTraceService {
        HttpTraceService::new(&ClientConfig::default().with_base_url(base)).unwrap()
    }

    #[test]
    fn endpoint_appends_encoded_segments() {
        let svc = service("http://localhost:5000/api");
        let url = svc.endpoint(&["node-type", "<Root>/Gain 1"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/node-type/%3CRoot%3E%2FGain%201"
        );
    }

    #[test]
    fn trailing_slash_base_is_tolerated() {
        let svc = service("http://localhost:5000/api/");
        let url = svc.endpoint(&["parents"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/parents");
    }

    #[test]
    fn rejects_opaque_base() {
        let err = HttpTraceService::new(&ClientConfig::default().with_base_url("mailto:x@y"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidBaseUrl(_)));
    }
}
