//! [`SourceHost`] backed by the GitHub REST API.

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Issue, Profile, Repository, SourceHost, UpstreamError, UpstreamFuture};
use crate::config::{Config, ConfigError};

const API_VERSION: &str = "2022-11-28";

/// Authenticated GitHub REST client. Cheap to share; holds one connection pool.
pub struct GitHubClient {
    http: Client,
    base_url: Url,
}

/// GitHub's JSON error body: `{"message": "...", "documentation_url": "..."}`.
#[derive(Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    body: &'a str,
}

impl GitHubClient {
    /// Builds a client against `base_url`, sending `token` as a bearer
    /// credential when present.
    pub fn new(token: Option<&str>, base_url: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ConfigError::InvalidApiUrl(base_url.to_owned()))?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(concat!("hubgate/", env!("CARGO_PKG_VERSION"))));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ConfigError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(config.token(), config.api_url())
    }

    /// Appends `segments` to the base path, percent-encoding each one so a
    /// caller-supplied name stays a single segment.
    fn url<const N: usize>(&self, segments: [&str; N]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Sends `req` and decodes a 2xx JSON body into `T`.
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, UpstreamError> {
        let res = req.send().await.map_err(|e| {
            warn!("upstream request failed: {e}");
            UpstreamError::new(None, e.to_string())
        })?;

        let status = res.status();
        debug!(url = %res.url(), status = status.as_u16(), "upstream response");

        if !status.is_success() {
            let body = res.bytes().await.unwrap_or_default();
            let message = serde_json::from_slice::<ApiError>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Upstream error").to_owned());
            warn!(status = status.as_u16(), %message, "upstream returned an error");
            return Err(UpstreamError::new(Some(status.as_u16()), message));
        }

        res.json::<T>()
            .await
            .map_err(|e| UpstreamError::new(None, format!("invalid upstream response: {e}")))
    }
}

impl SourceHost for GitHubClient {
    fn user_profile<'a>(&'a self, username: &'a str) -> UpstreamFuture<'a, Profile> {
        Box::pin(self.send(self.http.get(self.url(["users", username]))))
    }

    fn user_repositories<'a>(&'a self, username: &'a str) -> UpstreamFuture<'a, Vec<Repository>> {
        Box::pin(self.send(self.http.get(self.url(["users", username, "repos"]))))
    }

    fn repository<'a>(&'a self, owner: &'a str, repo: &'a str) -> UpstreamFuture<'a, Repository> {
        Box::pin(self.send(self.http.get(self.url(["repos", owner, repo]))))
    }

    fn create_issue<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        title: &'a str,
        body: &'a str,
    ) -> UpstreamFuture<'a, Issue> {
        let req = self
            .http
            .post(self.url(["repos", owner, repo, "issues"]))
            .json(&NewIssue { title, body });
        Box::pin(self.send(req))
    }
}
