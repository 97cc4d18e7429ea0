//! Shared helpers: a scripted `SourceHost` and a server spawned on a free port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use hubgate::source_host::{Issue, Profile, Repository, UpstreamFuture};
use hubgate::{Router, Server, SourceHost, UpstreamError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

// ── Running server ────────────────────────────────────────────────────────────

/// A server running in the background. Shuts down when dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

pub async fn spawn<S: Send + Sync + 'static>(router: Router<S>) -> TestServer {
    let server = Server::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(server.serve_until(router, async move {
        let _ = rx.await;
    }));
    TestServer { addr, _shutdown: tx }
}

/// Writes `request` verbatim on a fresh connection and returns everything
/// the server sends back before closing it. Lets a test send paths and
/// headers that an HTTP client would normalize away.
pub async fn raw_request(server: &TestServer, request: &str) -> String {
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut raw))
        .await
        .expect("server did not close the connection")
        .unwrap();
    String::from_utf8(raw).unwrap()
}

// ── FakeHost ──────────────────────────────────────────────────────────────────

/// Returns canned results and counts calls per operation.
pub struct FakeHost {
    pub profile: Result<Profile, UpstreamError>,
    pub repos: Result<Vec<Repository>, UpstreamError>,
    pub repo: Result<Repository, UpstreamError>,
    pub issue: Result<Issue, UpstreamError>,

    pub profile_calls: AtomicUsize,
    pub repos_calls: AtomicUsize,
    pub repo_calls: AtomicUsize,
    pub issue_calls: AtomicUsize,
    /// `(owner, repo, title, body)` of every create-issue call.
    pub issues_sent: Mutex<Vec<(String, String, String, String)>>,
    /// `(owner, repo)` of every single-repository read.
    pub repos_read: Mutex<Vec<(String, String)>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            profile: Ok(Profile { followers: 10, following: 4, public_repos: 2 }),
            repos: Ok(vec![repository("alpha"), repository("beta")]),
            repo: Ok(repository("alpha")),
            issue: Ok(Issue { number: 42, html_url: "https://github.com/octocat/alpha/issues/42".into() }),
            profile_calls: AtomicUsize::new(0),
            repos_calls: AtomicUsize::new(0),
            repo_calls: AtomicUsize::new(0),
            issue_calls: AtomicUsize::new(0),
            issues_sent: Mutex::new(Vec::new()),
            repos_read: Mutex::new(Vec::new()),
        }
    }
}

impl FakeHost {
    pub fn total_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
            + self.repos_calls.load(Ordering::SeqCst)
            + self.repo_calls.load(Ordering::SeqCst)
            + self.issue_calls.load(Ordering::SeqCst)
    }
}

impl SourceHost for FakeHost {
    fn user_profile<'a>(&'a self, _username: &'a str) -> UpstreamFuture<'a, Profile> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.profile.clone();
        Box::pin(async move { result })
    }

    fn user_repositories<'a>(&'a self, _username: &'a str) -> UpstreamFuture<'a, Vec<Repository>> {
        self.repos_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.repos.clone();
        Box::pin(async move { result })
    }

    fn repository<'a>(&'a self, owner: &'a str, repo: &'a str) -> UpstreamFuture<'a, Repository> {
        self.repo_calls.fetch_add(1, Ordering::SeqCst);
        self.repos_read.lock().unwrap().push((owner.into(), repo.into()));
        let result = self.repo.clone();
        Box::pin(async move { result })
    }

    fn create_issue<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        title: &'a str,
        body: &'a str,
    ) -> UpstreamFuture<'a, Issue> {
        self.issue_calls.fetch_add(1, Ordering::SeqCst);
        self.issues_sent
            .lock()
            .unwrap()
            .push((owner.into(), repo.into(), title.into(), body.into()));
        let result = self.issue.clone();
        Box::pin(async move { result })
    }
}

pub fn repository(name: &str) -> Repository {
    Repository {
        name: name.into(),
        description: Some(format!("the {name} project")),
        stargazers_count: 5,
        forks_count: 1,
        language: None,
        html_url: format!("https://github.com/octocat/{name}"),
        open_issues_count: 0,
        created_at: Some("2023-03-01T12:00:00Z".into()),
        updated_at: Some("2024-03-01T12:00:00Z".into()),
    }
}

/// Sorted keys of a JSON object.
pub fn keys(v: &serde_json::Value) -> Vec<String> {
    let mut keys: Vec<String> = v.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    keys
}
