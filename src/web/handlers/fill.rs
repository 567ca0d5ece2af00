//! `/fill` preview handlers

use axum::{
    extract::{Path, RawQuery, State},
    http::HeaderMap,
};
use tracing::debug;

use crate::errors::PreviewError;
use crate::models::Preview;
use crate::web::{AppState, extractors::{RequestContext, forwarded_headers}};

/// Resize the image at `url` to fill `width`×`height`
pub async fn fill_preview(
    State(state): State<AppState>,
    Path((width, height, source)): Path<(String, String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    context: RequestContext,
) -> Result<Preview, PreviewError> {
    debug!(
        request_id = %context.request_id,
        user_agent = context.user_agent.as_deref().unwrap_or("-"),
        real_ip = context.real_ip.as_deref().unwrap_or("-"),
        width = %width,
        height = %height,
        "Preview requested"
    );

    let request = state.preview_service.parse_request(
        &width,
        &height,
        &source,
        query.as_deref(),
        forwarded_headers(&headers),
    )?;

    state.preview_service.preview(request).await
}

/// `/fill/{width}/{height}` without a source image
pub async fn fill_missing_source(
    State(state): State<AppState>,
    Path((width, height)): Path<(String, String)>,
) -> PreviewError {
    match state
        .preview_service
        .parse_request(&width, &height, "", None, HeaderMap::new())
    {
        Err(e) => e,
        Ok(_) => PreviewError::invalid_input("url", "source image url is missing"),
    }
}
