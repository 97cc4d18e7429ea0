//! The GitHub gateway: three routes, each one upstream round-trip reshaped
//! into a fixed response contract.
//!
//! | Method | Path | Success | Failure status |
//! |---|---|---|---|
//! | GET | `/github` | [`UserSummary`] | always 500 |
//! | GET | `/github/{repo}` | [`RepositoryDetail`] | upstream's, else 500 |
//! | POST | `/github/{repo}/issues` | [`IssueCreated`] | 400, upstream's, else 500 |
//!
//! Response types list every field they may carry. Upstream payloads are
//! copied across field by field; nothing else is forwarded.

use std::sync::Arc;

use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::config::Config;
use crate::error::GatewayError;
use crate::health;
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::router::Router;
use crate::source_host::{Repository, SourceHost};

pub const ISSUE_CREATED: &str = "Issue created successfully";
pub const TITLE_AND_BODY_REQUIRED: &str = "Title and body are required";
pub const INVALID_REPOSITORY: &str = "Invalid repository name";

// ── Response contract ─────────────────────────────────────────────────────────

/// `GET /github`
#[derive(Debug, Serialize, PartialEq)]
pub struct UserSummary {
    pub followers: u64,
    pub following: u64,
    pub public_repos: u64,
    pub repositories: Vec<RepositorySummary>,
}

/// One entry of [`UserSummary::repositories`].
#[derive(Debug, Serialize, PartialEq)]
pub struct RepositorySummary {
    pub name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub language: Option<String>,
    pub url: String,
}

/// `GET /github/{repo}`
#[derive(Debug, Serialize, PartialEq)]
pub struct RepositoryDetail {
    pub name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub language: Option<String>,
    pub open_issues: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub url: String,
}

/// `POST /github/{repo}/issues`
#[derive(Debug, Serialize, PartialEq)]
pub struct IssueCreated {
    pub message: &'static str,
    pub issue_url: String,
}

impl From<Repository> for RepositorySummary {
    fn from(r: Repository) -> Self {
        Self {
            name: r.name,
            description: r.description,
            stars: r.stargazers_count,
            forks: r.forks_count,
            language: r.language,
            url: r.html_url,
        }
    }
}

impl From<Repository> for RepositoryDetail {
    fn from(r: Repository) -> Self {
        Self {
            name: r.name,
            description: r.description,
            stars: r.stargazers_count,
            forks: r.forks_count,
            language: r.language,
            open_issues: r.open_issues_count,
            created_at: r.created_at,
            updated_at: r.updated_at,
            url: r.html_url,
        }
    }
}

// ── Gateway ───────────────────────────────────────────────────────────────────

/// Routes requests for one configured account to a [`SourceHost`].
pub struct Gateway {
    host: Arc<dyn SourceHost>,
    username: String,
}

impl Gateway {
    pub fn new(host: Arc<dyn SourceHost>, config: &Config) -> Self {
        Self { host, username: config.username().to_owned() }
    }

    pub fn username(&self) -> &str { &self.username }

    /// Profile counters plus the repository listing, fetched concurrently.
    /// Fails as soon as either call fails.
    pub async fn user_overview(&self) -> Result<UserSummary, GatewayError> {
        let (profile, repos) = tokio::try_join!(
            self.host.user_profile(&self.username),
            self.host.user_repositories(&self.username),
        )?;

        Ok(UserSummary {
            followers: profile.followers,
            following: profile.following,
            public_repos: profile.public_repos,
            repositories: repos.into_iter().map(RepositorySummary::from).collect(),
        })
    }

    pub async fn repository(&self, repo: &str) -> Result<RepositoryDetail, GatewayError> {
        let repo = self.host.repository(&self.username, repo_name(repo)?).await?;
        Ok(repo.into())
    }

    /// Opens an issue. `title` and `body` must both be non-empty and `repo`
    /// must be a usable name; otherwise nothing is sent upstream.
    pub async fn create_issue(
        &self,
        repo: &str,
        title: Option<&str>,
        body: Option<&str>,
    ) -> Result<IssueCreated, GatewayError> {
        let repo = repo_name(repo)?;
        let (Some(title), Some(body)) = (non_empty(title), non_empty(body)) else {
            return Err(GatewayError::Validation(TITLE_AND_BODY_REQUIRED));
        };

        let issue = self.host.create_issue(&self.username, repo, title, body).await?;
        Ok(IssueCreated { message: ISSUE_CREATED, issue_url: issue.html_url })
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Dot segments would address a different upstream resource.
fn repo_name(repo: &str) -> Result<&str, GatewayError> {
    match repo {
        "" | "." | ".." => Err(GatewayError::Validation(INVALID_REPOSITORY)),
        _ => Ok(repo),
    }
}

// ── HTTP surface ──────────────────────────────────────────────────────────────

/// The full route table: the three gateway routes and the health checks.
pub fn router(gateway: Gateway) -> Router<Gateway> {
    Router::new(gateway)
        .on(Method::GET,  "/github",               get_user_overview)
        .on(Method::GET,  "/github/{repo}",        get_repository)
        .on(Method::POST, "/github/{repo}/issues", create_issue)
        .on(Method::GET,  "/healthz",              health::liveness::<Gateway>)
        .on(Method::GET,  "/readyz",               health::readiness::<Gateway>)
}

// GET /github
//
// Every failure is a 500 here, whatever status the upstream answered with.
async fn get_user_overview(gw: Arc<Gateway>, _req: Request) -> Response {
    match gw.user_overview().await {
        Ok(summary) => Response::json(&summary),
        Err(e) => {
            warn!(user = gw.username(), "user overview failed: {e}");
            Response::error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

// GET /github/{repo}
async fn get_repository(gw: Arc<Gateway>, req: Request) -> Response {
    let repo = req.param("repo").unwrap_or_default();
    gw.repository(repo).await.map(Json).into_response()
}

// POST /github/{repo}/issues
//
// An unreadable or non-object body counts as missing both fields. So does a
// field that is not a string.
async fn create_issue(gw: Arc<Gateway>, req: Request) -> Response {
    let repo = req.param("repo").unwrap_or_default();
    let payload: Value = req.json().unwrap_or(Value::Null);
    let title = payload.get("title").and_then(Value::as_str);
    let body = payload.get("body").and_then(Value::as_str);

    gw.create_issue(repo, title, body).await.map(Json).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> Repository {
        Repository {
            name: "hubgate".into(),
            description: None,
            stargazers_count: 7,
            forks_count: 2,
            language: Some("Rust".into()),
            html_url: "https://github.com/octocat/hubgate".into(),
            open_issues_count: 3,
            created_at: Some("2024-01-02T03:04:05Z".into()),
            updated_at: Some("2024-06-07T08:09:10Z".into()),
        }
    }

    #[test]
    fn summary_keeps_the_six_listing_fields() {
        let v = serde_json::to_value(RepositorySummary::from(repo())).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "name": "hubgate",
                "description": null,
                "stars": 7,
                "forks": 2,
                "language": "Rust",
                "url": "https://github.com/octocat/hubgate",
            })
        );
    }

    #[test]
    fn detail_serializes_in_wire_order() {
        let body = serde_json::to_string(&RepositoryDetail::from(repo())).unwrap();
        assert_eq!(
            body,
            concat!(
                r#"{"name":"hubgate","description":null,"stars":7,"forks":2,"language":"Rust","#,
                r#""open_issues":3,"created_at":"2024-01-02T03:04:05Z","updated_at":"2024-06-07T08:09:10Z","#,
                r#""url":"https://github.com/octocat/hubgate"}"#,
            )
        );
    }

    #[test]
    fn non_empty_filters_blank() {
        assert_eq!(non_empty(Some("x")), Some("x"));
        assert_eq!(non_empty(Some("")), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn dot_segments_are_not_repository_names() {
        assert_eq!(repo_name("hubgate").unwrap(), "hubgate");
        assert_eq!(repo_name("dotfiles.rs").unwrap(), "dotfiles.rs");
        for bad in ["", ".", ".."] {
            let err = repo_name(bad).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{bad:?}");
        }
    }
}
