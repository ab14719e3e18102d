//! HTTP client for the NDB REST API
//!
//! Remote calls sit behind two traits so workflows and the poller can be
//! exercised without a live control plane:
//!
//! - [`OperationSource`] - the single read the poller needs
//! - [`NdbApi`] - the full DB server lifecycle
//!
//! [`NdbClient`] implements both over `reqwest` with HTTP basic auth.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use crate::error::{CoreError, Result};
use crate::models::{
    DbServer, DbServerInputRequest, DeleteDbServerRequest, Operation, OperationHandle,
    UpdateDbServerRequest,
};

/// Path prefix of the NDB v0.9 API
pub const API_BASE_PATH: &str = "/era/v0.9";

/// User agent string for ndbctl HTTP requests
const USER_AGENT: &str = concat!("ndbctl/", env!("CARGO_PKG_VERSION"));

/// Read access to asynchronous operations
#[async_trait]
pub trait OperationSource: Send + Sync {
    async fn get_operation(&self, operation_id: &str) -> Result<Operation>;
}

/// DB server lifecycle calls
#[async_trait]
pub trait NdbApi: OperationSource {
    async fn create_dbserver(&self, request: &DbServerInputRequest) -> Result<OperationHandle>;

    async fn read_dbserver(&self, id: &str) -> Result<DbServer>;

    /// The service may answer an update with an empty body
    async fn update_dbserver(
        &self,
        request: &UpdateDbServerRequest,
        id: &str,
    ) -> Result<Option<DbServer>>;

    async fn delete_dbserver(
        &self,
        request: &DeleteDbServerRequest,
        id: &str,
    ) -> Result<OperationHandle>;
}

/// Builder for [`NdbClient`]
#[derive(Debug, Clone)]
pub struct NdbClientBuilder {
    url: String,
    username: String,
    password: String,
    insecure: bool,
    timeout: Duration,
    update_timeout: Option<Duration>,
}

impl NdbClientBuilder {
    /// Accept invalid TLS certificates (self-signed lab appliances)
    #[must_use]
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Per-request HTTP timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Deadline for the synchronous update call, overriding [`Self::timeout`]
    #[must_use]
    pub fn update_timeout(mut self, timeout: Duration) -> Self {
        self.update_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<NdbClient> {
        let trimmed = self.url.trim_end_matches('/');
        let base = if trimmed.ends_with(API_BASE_PATH) {
            trimmed.to_string()
        } else {
            format!("{}{}", trimmed, API_BASE_PATH)
        };
        let base_url = Url::parse(&base)
            .map_err(|e| CoreError::Validation(format!("invalid NDB url '{}': {}", self.url, e)))?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.insecure)
            .build()?;

        Ok(NdbClient {
            base_url,
            username: self.username,
            password: self.password,
            update_timeout: self.update_timeout,
            http,
        })
    }
}

/// Authenticated NDB API client
#[derive(Clone)]
pub struct NdbClient {
    base_url: Url,
    username: String,
    password: String,
    update_timeout: Option<Duration>,
    http: reqwest::Client,
}

impl std::fmt::Debug for NdbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NdbClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl NdbClient {
    pub fn builder(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> NdbClientBuilder {
        NdbClientBuilder {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            insecure: false,
            timeout: Duration::from_secs(60),
            update_timeout: None,
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn update_timeout(&self) -> Option<Duration> {
        self.update_timeout
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        debug!("{} {}", method, url);
        self.http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = check_status(builder.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(self.request(method, path).json(body)).await
    }
}

/// Turn a non-success response into `CoreError::Api`
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    trace!("error body: {}", body);
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body
            }
        });

    Err(CoreError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl OperationSource for NdbClient {
    async fn get_operation(&self, operation_id: &str) -> Result<Operation> {
        self.send(self.request(Method::GET, &format!("/operations/{}", operation_id)))
            .await
    }
}

#[async_trait]
impl NdbApi for NdbClient {
    async fn create_dbserver(&self, request: &DbServerInputRequest) -> Result<OperationHandle> {
        self.send_json(Method::POST, "/dbservers/provision", request)
            .await
    }

    async fn read_dbserver(&self, id: &str) -> Result<DbServer> {
        self.send(self.request(Method::GET, &format!("/dbservers/{}", id)))
            .await
    }

    async fn update_dbserver(
        &self,
        request: &UpdateDbServerRequest,
        id: &str,
    ) -> Result<Option<DbServer>> {
        let mut builder = self
            .request(Method::PATCH, &format!("/dbservers/{}", id))
            .json(request);
        if let Some(timeout) = self.update_timeout {
            builder = builder.timeout(timeout);
        }
        let response = check_status(builder.send().await?).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn delete_dbserver(
        &self,
        request: &DeleteDbServerRequest,
        id: &str,
    ) -> Result<OperationHandle> {
        self.send_json(Method::DELETE, &format!("/dbservers/{}", id), request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_base_path_is_appended_once() {
        let client = NdbClient::builder("https://ndb.local/", "admin", "pw")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://ndb.local/era/v0.9");

        let client = NdbClient::builder("https://ndb.local/era/v0.9", "admin", "pw")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://ndb.local/era/v0.9");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = NdbClient::builder("not a url", "admin", "pw")
            .build()
            .unwrap_err();
        assert!(err.is_bad_request());
    }

    #[tokio::test]
    async fn test_update_honours_update_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/era/v0.9/dbservers/srv-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "srv-1"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/era/v0.9/dbservers/srv-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "srv-1"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = NdbClient::builder(server.uri(), "admin", "pw")
            .update_timeout(Duration::from_millis(200))
            .build()
            .unwrap();

        let err = client
            .update_dbserver(&UpdateDbServerRequest::default(), "srv-1")
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        // Other calls keep the general request timeout
        let server_read = client.read_dbserver("srv-1").await.unwrap();
        assert_eq!(server_read.id, "srv-1");
    }

    #[test]
    fn test_debug_hides_password() {
        let client = NdbClient::builder("https://ndb.local", "admin", "s3cret")
            .build()
            .unwrap();
        let rendered = format!("{:?}", client);
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("s3cret"));
    }
}
