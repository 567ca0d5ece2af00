//! HTTP middleware

use axum::{
    extract::Request,
    http::{Method, Uri},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};

use super::extractors::RequestId;
use super::responses::X_CACHE;

/// Logs each request on arrival and on completion, with the status, the
/// elapsed time and, for previews, whether the cache answered it.
///
/// The request id is stored in the request extensions so handlers log
/// under the same id through `RequestContext`.
pub async fn request_logging_middleware(
    method: Method,
    uri: Uri,
    mut request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let request_id = RequestId::new();
    request.extensions_mut().insert(request_id.clone());
    let request_id = request_id.0;

    info!(
        method = %method,
        uri = %uri,
        request_id = %request_id,
        "HTTP request started"
    );

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let duration = start.elapsed();
    let cache = response
        .headers()
        .get(X_CACHE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    if status >= 400 {
        warn!(
            method = %method,
            uri = %uri,
            status = status,
            request_id = %request_id,
            duration_ms = duration.as_millis(),
            "HTTP request completed with error"
        );
    } else {
        info!(
            method = %method,
            uri = %uri,
            status = status,
            cache = cache,
            request_id = %request_id,
            duration_ms = duration.as_millis(),
            "HTTP request completed"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::extractors::RequestContext;
    use axum::{Router, body::Body, routing::get};
    use tower::ServiceExt;
    use tracing_test::traced_test;

    async fn echo_request_id(ctx: RequestContext) -> String {
        tracing::info!(request_id = %ctx.request_id, "Handler ran");
        ctx.request_id
    }

    #[tokio::test]
    #[traced_test]
    async fn test_handler_sees_middleware_request_id() {
        let app = Router::new()
            .route("/echo", get(echo_request_id))
            .layer(axum::middleware::from_fn(request_logging_middleware));

        let response = app
            .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let request_id = String::from_utf8(body.to_vec()).unwrap();

        assert!(uuid::Uuid::parse_str(&request_id).is_ok());
        assert!(logs_contain("HTTP request started"));
        assert!(logs_contain("Handler ran"));
        logs_assert(|lines: &[&str]| {
            let tagged = lines.iter().filter(|line| line.contains(&request_id)).count();
            if tagged >= 3 {
                Ok(())
            } else {
                Err(format!("expected 3 lines tagged {request_id}, found {tagged}"))
            }
        });
    }
}
