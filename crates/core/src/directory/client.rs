//! Directory API REST client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER, USER_AGENT};
use tracing::{debug, info, instrument};

use crate::directory::models::{ApiErrorEnvelope, GroupsPage};
use crate::directory::GroupsApi;
use crate::errors::DirectoryError;

/// Asynchronous client for the directory API groups collection.
#[derive(Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    page_size: u32,
}

impl DirectoryClient {
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        page_size: u32,
        timeout: Duration,
    ) -> Result<Self, DirectoryError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("dirgroups/", env!("CARGO_PKG_VERSION"))),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        info!(api_url = %api_url, page_size, "created DirectoryClient");
        Ok(Self {
            http,
            api_url,
            token: token.into(),
            page_size,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn groups_url(&self) -> String {
        format!("{}/admin/directory/v1/groups", self.api_url)
    }

    async fn check_response(
        resp: reqwest::Response,
        customer: &str,
    ) -> Result<reqwest::Response, DirectoryError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status.as_u16() == 429 {
            let retry_after = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string();
            return Err(DirectoryError::RateLimited { retry_after });
        }

        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
            .map(|e| e.error.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status));

        match status.as_u16() {
            401 | 403 => Err(DirectoryError::AuthenticationFailed(message)),
            404 => Err(DirectoryError::NotFound(format!(
                "groups for customer '{}': {}",
                customer, message
            ))),
            code => Err(DirectoryError::ApiError {
                status: code,
                body: message,
            }),
        }
    }
}

impl GroupsApi for DirectoryClient {
    #[instrument(skip(self))]
    async fn list_groups_page(
        &self,
        customer: &str,
        page_token: Option<&str>,
    ) -> Result<GroupsPage, DirectoryError> {
        let page_size = self.page_size.to_string();
        let mut req = self
            .http
            .get(self.groups_url())
            .bearer_auth(&self.token)
            .query(&[("customer", customer), ("maxResults", page_size.as_str())]);
        if let Some(token) = page_token {
            req = req.query(&[("pageToken", token)]);
        }

        let resp = req.send().await?;
        let resp = Self::check_response(resp, customer).await?;
        let body = resp.text().await?;
        let page: GroupsPage =
            serde_json::from_str(&body).map_err(|e| DirectoryError::ParseError(e.to_string()))?;
        debug!(
            count = page.groups.len(),
            has_next = page.continuation().is_some(),
            "fetched groups page"
        );
        Ok(page)
    }
}
