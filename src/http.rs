//! HTTP transport used for config, route and directions requests.
//!
//! Everything above this module talks to [`HttpTransport`], so the browser
//! build goes through `reqwest`'s fetch backend while tests substitute an
//! in-memory transport.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::{Result, RouteMapError};

/// Status and body of a completed request. Non-2xx answers are not errors at
/// this level; callers decide what a miss means.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Fails with [`RouteMapError::Status`] unless the status is 2xx.
    pub fn error_for_status(self, url: &str) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(RouteMapError::Status {
                status: self.status,
                url: url.to_owned(),
            })
        }
    }
}

#[async_trait(?Send)]
pub trait HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse>;

    async fn post_json(&self, url: &str, body: String) -> Result<HttpResponse>;
}

/// `reqwest`-backed transport. Relative URLs such as `/config_mapbox.json`
/// are resolved against `base` (the page origin in the browser).
pub struct ReqwestTransport {
    client: Client,
    base: Option<Url>,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base: None,
        }
    }

    pub fn with_base(base: &str) -> Result<Self> {
        let base = Url::parse(base).map_err(|e| RouteMapError::InvalidUrl {
            url: base.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client: Client::new(),
            base: Some(base),
        })
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        resolve_url(self.base.as_ref(), url)
    }

    async fn read(response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self.client.get(self.resolve(url)?).send().await?;
        Self::read(response).await
    }

    async fn post_json(&self, url: &str, body: String) -> Result<HttpResponse> {
        let response = self
            .client
            .post(self.resolve(url)?)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        Self::read(response).await
    }
}

pub(crate) fn resolve_url(base: Option<&Url>, url: &str) -> Result<Url> {
    let invalid = |reason: String| RouteMapError::InvalidUrl {
        url: url.to_owned(),
        reason,
    };
    match Url::parse(url) {
        Ok(absolute) => Ok(absolute),
        Err(err) => match base {
            Some(base) => base.join(url).map_err(|e| invalid(e.to_string())),
            None => Err(invalid(err.to_string())),
        },
    }
}
