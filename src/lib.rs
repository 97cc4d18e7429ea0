//! # hubgate
//!
//! A small HTTP gateway in front of the GitHub REST API, serving one
//! configured account:
//!
//! - `GET /github`: profile counters and repository list
//! - `GET /github/{repo}`: one repository's metadata
//! - `POST /github/{repo}/issues`: open an issue
//!
//! Every reply is JSON with a fixed field set; failures are
//! `{"error": "<message>"}`.
//!
//! The crate carries its own minimal HTTP layer: a `matchit` radix-tree
//! [`Router`] with shared state, type-erased async handlers, and a
//! hyper-based [`Server`] with graceful shutdown. The upstream is reached
//! through the [`SourceHost`] trait; [`GitHubClient`] is the real one.
//!
//! ## Wiring
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hubgate::{Config, Gateway, GitHubClient, Server, gateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let host = Arc::new(GitHubClient::from_config(&config)?);
//!     let app = gateway::router(Gateway::new(host, &config));
//!
//!     Server::bind(("0.0.0.0", config.port())).await?.serve(app).await?;
//!     Ok(())
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod config;
pub mod gateway;
pub mod health;
pub mod source_host;

pub use config::{Config, ConfigError};
pub use error::{Error, GatewayError};
pub use gateway::Gateway;
pub use handler::Handler;
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::{MAX_BODY_BYTES, Server};
pub use source_host::{GitHubClient, SourceHost, UpstreamError};
