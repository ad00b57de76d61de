use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::domain::{Group, IdentityDetail, IdentityRef, Instance, InstanceSize, Volume};
use crate::ports::CloudApi;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid API URL {url}: {reason}")]
    Url { url: String, reason: String },

    #[error("Invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Cloud API adapter using reqwest
pub struct HttpCloudApi {
    base_url: String,
    client: reqwest::Client,
    token: Option<String>,
    timeout: Option<Duration>,
}

impl HttpCloudApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            token: None,
            timeout: None,
        }
    }

    /// Send `Authorization: Token <token>` with every request
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// `{base_url}/api/{segments..}/`, each segment percent-encoded on its own
    fn url(&self, segments: &[&str]) -> Result<reqwest::Url, ApiError> {
        let invalid = |reason: String| ApiError::Url {
            url: self.base_url.clone(),
            reason,
        };

        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("not a base URL".to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments)
            .push("");
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.url(segments)?;
        debug!("GET {}", url);

        let mut request = self.client.get(url.clone()).header("Accept", "application/json");
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Token {}", token));
        }

        let url = url.to_string();
        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|source| ApiError::Decode { url, source })
    }
}

fn resource_of<'a>(identity: &'a IdentityRef, resource: &'a str) -> Vec<&'a str> {
    let mut segments = identity.api_segments().to_vec();
    segments.push(resource);
    segments
}

#[async_trait]
impl CloudApi for HttpCloudApi {
    async fn get_identity(
        &self,
        identity: &IdentityRef,
    ) -> Result<IdentityDetail, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.get(&identity.api_segments()).await?)
    }

    async fn list_volumes(&self, identity: &IdentityRef) -> Result<Vec<Volume>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.get(&resource_of(identity, "volume")).await?)
    }

    async fn list_instances(
        &self,
        identity: &IdentityRef,
    ) -> Result<Vec<Instance>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.get(&resource_of(identity, "instance")).await?)
    }

    async fn list_sizes(
        &self,
        identity: &IdentityRef,
    ) -> Result<Vec<InstanceSize>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.get(&resource_of(identity, "size")).await?)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.get(&["group"]).await?)
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    use super::*;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetches_identity_and_resources() {
        let router = Router::new()
            .route(
                "/api/provider/1/identity/7/",
                get(|| async { Json(json!({"id": 7, "quota": {"cpu": 16, "mem": 32, "disk": 200, "disk_count": 5}})) }),
            )
            .route(
                "/api/provider/1/identity/7/volume/",
                get(|| async { Json(json!([{"id": "vol-1", "name": "data", "size": 20, "status": "in-use"}])) }),
            )
            .route(
                "/api/provider/1/identity/7/size/",
                get(|| async { Json(json!([{"alias": "m1.small", "cpu": 1, "mem": 2048}])) }),
            );
        let api = HttpCloudApi::new(format!("{}/", serve(router).await)).with_timeout(Some(Duration::from_secs(5)));
        let identity = IdentityRef::new("1", "7");

        let detail = api.get_identity(&identity).await.unwrap();
        assert_eq!(detail.quota.mem, 32.0);

        let volumes = api.list_volumes(&identity).await.unwrap();
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].display_name(), "data");

        let sizes = api.list_sizes(&identity).await.unwrap();
        assert_eq!(sizes[0].alias, "m1.small");
    }

    #[test]
    fn test_identity_segments_are_encoded() {
        let api = HttpCloudApi::new("http://cloud.example/");
        let identity = IdentityRef::new("1", "../../group0");

        let url = api.url(&resource_of(&identity, "volume")).unwrap();
        assert_eq!(url.path(), "/api/provider/1/identity/..%2F..%2Fgroup0/volume/");

        let prefixed = HttpCloudApi::new("http://cloud.example/console");
        assert_eq!(prefixed.url(&["group"]).unwrap().path(), "/console/api/group/");
    }

    #[test]
    fn test_invalid_base_url() {
        let api = HttpCloudApi::new("not a url");
        assert!(matches!(api.url(&["group"]), Err(ApiError::Url { .. })));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let router = Router::new().route(
            "/api/provider/1/identity/7/instance/",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let api = HttpCloudApi::new(serve(router).await);

        let err = api.list_instances(&IdentityRef::new("1", "7")).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_decode_error() {
        let router = Router::new().route("/api/group/", get(|| async { "not json" }));
        let api = HttpCloudApi::new(serve(router).await);

        let err = api.list_groups().await.unwrap_err();
        assert!(err.to_string().starts_with("Invalid response"));
    }
}
