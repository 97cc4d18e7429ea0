//! HTTP server and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. Stops `listener.accept()` at once. No new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{error, info, warn};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The HTTP server. Owns a bound listener.
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Binds a listener on `addr`. Port `0` picks a free port; read it back
    /// with [`local_addr`](Server::local_addr).
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves `router` until SIGTERM or Ctrl-C, then drains in-flight
    /// connections and returns.
    pub async fn serve<S: Send + Sync + 'static>(self, router: Router<S>) -> Result<(), Error> {
        self.serve_until(router, shutdown_signal()).await
    }

    /// Serves `router` until `shutdown` resolves, then drains in-flight
    /// connections and returns.
    pub async fn serve_until<S, F>(self, router: Router<S>, shutdown: F) -> Result<(), Error>
    where
        S: Send + Sync + 'static,
        F: Future<Output = ()>,
    {
        let addr = self.listener.local_addr()?;
        let router = Arc::new(router);

        info!(%addr, "hubgate listening");

        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so it wins over a queue of pending accepts.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = self.listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(router, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("hubgate stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Largest request body the server buffers. Larger bodies get a 413.
pub const MAX_BODY_BYTES: usize = 100 * 1024;

/// Collects the body, routes one request and logs the outcome.
///
/// Infallible: every failure is already an HTTP response by the time hyper
/// sees it.
async fn dispatch<S: Send + Sync + 'static>(
    router: Arc<Router<S>>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let method = parts.method;
    let path = parts.uri.path().to_owned();

    let response = match read_body(body).await {
        Ok(body) => {
            let req = Request::new(method.clone(), path.clone(), parts.headers, body, Default::default());
            router.handle(req).await
        }
        Err(rejected) => {
            warn!(%method, %path, status = rejected.status_code().as_u16(), "request body rejected");
            rejected
        }
    };

    info!(
        %method,
        %path,
        status = response.status_code().as_u16(),
        latency = ?started.elapsed(),
        "request",
    );

    Ok(response.into_inner())
}

/// Buffers `body` up to [`MAX_BODY_BYTES`].
///
/// A declared length over the limit is refused before anything is read.
/// Bodies without one are cut off once they cross it.
async fn read_body<B>(body: B) -> Result<Bytes, Response>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if body.size_hint().lower() > MAX_BODY_BYTES as u64 {
        return Err(too_large());
    }

    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(too_large()),
        Err(e) => {
            warn!("failed to read request body: {e}");
            Err(Response::status(StatusCode::BAD_REQUEST))
        }
    }
}

fn too_large() -> Response {
    Response::error(StatusCode::PAYLOAD_TOO_LARGE, "request entity too large")
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C). Only Ctrl-C on Windows.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::convert::Infallible;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use hyper::body::Frame;

    use super::*;

    /// A streamed body with no declared length.
    struct Chunks(VecDeque<Bytes>);

    impl Chunks {
        fn of(sizes: &[usize]) -> Self {
            Self(sizes.iter().map(|&n| Bytes::from(vec![b'x'; n])).collect())
        }
    }

    impl Body for Chunks {
        type Data = Bytes;
        type Error = Infallible;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Infallible>>> {
            Poll::Ready(self.get_mut().0.pop_front().map(|chunk| Ok(Frame::data(chunk))))
        }
    }

    fn assert_too_large(res: Response) {
        assert_eq!(res.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(res.body(), br#"{"error":"request entity too large"}"#);
    }

    #[tokio::test]
    async fn body_at_the_limit_is_read() {
        let body = read_body(Chunks::of(&[MAX_BODY_BYTES / 2, MAX_BODY_BYTES / 2])).await.unwrap();
        assert_eq!(body.len(), MAX_BODY_BYTES);

        let body = read_body(Full::new(Bytes::from_static(b"{}"))).await.unwrap();
        assert_eq!(body, Bytes::from_static(b"{}"));
    }

    #[tokio::test]
    async fn declared_length_over_the_limit_is_413() {
        let body = Full::new(Bytes::from(vec![0; MAX_BODY_BYTES + 1]));
        assert_too_large(read_body(body).await.unwrap_err());
    }

    #[tokio::test]
    async fn streamed_body_over_the_limit_is_413() {
        let body = Chunks::of(&[MAX_BODY_BYTES, 1]);
        assert_too_large(read_body(body).await.unwrap_err());
    }
}
