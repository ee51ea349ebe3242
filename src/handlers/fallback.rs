use crate::core::error::{bencoded_failure, ErrorCode};
use axum::{
    http::{header, HeaderMap, Uri},
    response::{Html, IntoResponse, Response},
};
use tracing::debug;

pub async fn fallback_handler(uri: Uri, headers: HeaderMap) -> Response {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let is_browser = ["Mozilla", "Chrome", "Safari", "Firefox", "Edge"]
        .iter()
        .any(|marker| user_agent.contains(marker));

    if is_browser {
        return Html("Nothing to see here. Lost in the void!").into_response();
    }

    debug!(uri = %uri, "Request for unknown route");
    bencoded_failure(ErrorCode::InvalidReqType)
}
