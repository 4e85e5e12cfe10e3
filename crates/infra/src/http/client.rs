use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use slotwise_domain::Result;
use tracing::debug;

use crate::errors::InfraError;

/// Thin reqwest wrapper with a per-request timeout and debug logging.
///
/// Deliberately single-attempt: webhook retry scheduling lives in the
/// delivery worker, and calendar lookups fall back through the conflict
/// checker, so transport-level retries would only blur those policies.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(InfraError::from)?;
        Ok(Self { client })
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the request, logging method, URL, and status.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build().map_err(InfraError::from)?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        let response = self.client.execute(request).await.map_err(InfraError::from)?;
        debug!(%method, %url, status = %response.status(), "received HTTP response");
        Ok(response)
    }
}
