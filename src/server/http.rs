//! Probe HTTP server
//!
//! Uses hyper http1 with TokioIo, one task per connection.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::AppState;
use crate::routes;
use crate::types::Result;

/// Serve probe endpoints on `listen` until cancelled
pub async fn run(listen: SocketAddr, state: Arc<AppState>, cancel: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(listen).await?;
    info!("Health probes listening on {}", listen);

    loop {
        let (stream, addr) = tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                    continue;
                }
            },
        };

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| {
                let state = Arc::clone(&state);
                async move { handle_request(state, req).await }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Error serving probe connection from {}: {:?}", addr, err);
            }
        });
    }

    info!("Health probe server stopped");
    Ok(())
}

async fn handle_request(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    Ok(route(&state, req.method(), req.uri().path()))
}

/// Route a probe request
pub fn route(state: &AppState, method: &Method, path: &str) -> Response<Full<Bytes>> {
    match (method, path) {
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => routes::health_check(state),
        (&Method::GET, "/ready") | (&Method::GET, "/readyz") => routes::readiness_check(state),
        (&Method::GET, "/version") => routes::version_info(),
        _ => routes::not_found(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::AccountDirectory;
    use crate::nats::testing::RecordingTransport;
    use crate::nats::{ConnectionLifecycle, LinkStatus};
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    fn state() -> AppState {
        AppState {
            directory: Arc::new(AccountDirectory::new()),
            lifecycle: Arc::new(ConnectionLifecycle::new()),
        }
    }

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_readiness_before_connect() {
        let state = state();
        let response = route(&state, &Method::GET, "/readyz");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["connection"], "uninitialized");
        assert!(body["error"].as_str().unwrap().contains("not initialised"));
    }

    #[tokio::test]
    async fn test_health_endpoints_follow_connection() {
        let state = state();
        state.directory.put("ABC123", "tokenXYZ");
        let (transport, _rx) = RecordingTransport::new();

        {
            let _guard = state.lifecycle.begin_run();
            state.lifecycle.open(transport.clone());

            let response = route(&state, &Method::GET, "/ready");
            assert_eq!(response.status(), StatusCode::OK);
            let body = body_json(response).await;
            assert_eq!(body["connection"], "ready");
            assert_eq!(body["accounts"], 1);
            assert!(body.get("error").is_none());

            transport.set_status(LinkStatus::Reconnecting);
            assert_eq!(
                route(&state, &Method::GET, "/readyz").status(),
                StatusCode::SERVICE_UNAVAILABLE
            );
            assert_eq!(route(&state, &Method::GET, "/healthz").status(), StatusCode::OK);
        }

        // Run loop exited
        assert_eq!(
            route(&state, &Method::GET, "/health").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_version_and_unknown_paths() {
        let state = state();
        let response = route(&state, &Method::GET, "/version");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["version"], env!("CARGO_PKG_VERSION"));

        assert_eq!(
            route(&state, &Method::GET, "/metrics").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            route(&state, &Method::POST, "/healthz").status(),
            StatusCode::NOT_FOUND
        );
    }
}
