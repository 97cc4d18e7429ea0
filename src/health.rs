//! Liveness and readiness checks.
//!
//! | Check | Path | Body |
//! |---|---|---|
//! | Liveness | `/healthz` | `ok` |
//! | Readiness | `/readyz` | `ready` |
//!
//! Neither check touches the upstream: an unreachable GitHub is a per-request
//! failure, not a reason to pull the gateway out of rotation.

use std::sync::Arc;

use crate::{Request, Response};

/// Always `200 ok` once the process answers HTTP.
pub async fn liveness<S>(_state: Arc<S>, _req: Request) -> Response {
    Response::text("ok")
}

/// `200 ready`. The router only exists after configuration loaded, so
/// answering at all means the gateway is ready.
pub async fn readiness<S>(_state: Arc<S>, _req: Request) -> Response {
    Response::text("ready")
}
