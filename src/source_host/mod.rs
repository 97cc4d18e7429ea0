//! The upstream source-hosting API, seen through a narrow capability trait.
//!
//! The gateway only ever talks to a [`SourceHost`]. Production wires in
//! [`GitHubClient`]; tests substitute a double that returns canned data or
//! canned failures.

mod github;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;

pub use github::GitHubClient;

/// Boxed future returned by every [`SourceHost`] call.
///
/// Boxing keeps the trait object-safe, so the gateway can hold an
/// `Arc<dyn SourceHost>`.
pub type UpstreamFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UpstreamError>> + Send + 'a>>;

/// The four upstream operations the gateway consumes.
pub trait SourceHost: Send + Sync {
    fn user_profile<'a>(&'a self, username: &'a str) -> UpstreamFuture<'a, Profile>;

    /// Repositories owned by `username`, in upstream listing order.
    /// Only the first page the upstream returns is fetched.
    fn user_repositories<'a>(&'a self, username: &'a str) -> UpstreamFuture<'a, Vec<Repository>>;

    fn repository<'a>(&'a self, owner: &'a str, repo: &'a str) -> UpstreamFuture<'a, Repository>;

    fn create_issue<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        title: &'a str,
        body: &'a str,
    ) -> UpstreamFuture<'a, Issue>;
}

// ── Upstream payloads ─────────────────────────────────────────────────────────
//
// Only the fields the gateway reads are declared. Everything else in the
// upstream JSON is ignored at deserialization time.

/// A user's public profile counters.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Profile {
    pub followers: u64,
    pub following: u64,
    pub public_repos: u64,
}

/// Repository metadata as returned by the upstream.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Repository {
    pub name: String,
    pub description: Option<String>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub language: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub open_issues_count: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// A freshly created issue.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Issue {
    pub number: u64,
    pub html_url: String,
}

// ── UpstreamError ─────────────────────────────────────────────────────────────

/// A failed upstream call.
///
/// `status` is the upstream's HTTP status when it answered at all; `None`
/// for transport failures and unreadable payloads.
#[derive(Clone, Debug, PartialEq)]
pub struct UpstreamError {
    pub status: Option<u16>,
    pub message: String,
}

impl UpstreamError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for UpstreamError {}
