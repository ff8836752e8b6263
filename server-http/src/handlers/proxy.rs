use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        Query, State,
    },
    http::{header, Method, StatusCode, Uri},
    response::Response,
};
use bytes::Bytes;
use marquee::domain::{collapse_query, InboundRequest};
use shared::Error;
use tracing::debug;

/// Every path other than `/`; resolved against the proxy route table.
///
/// Query and body rejections are taken as `Result`s so they leave through
/// `ApiError` with the JSON error shape.
pub async fn proxy_request(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    debug!("{} {}", method, uri.path());

    let Query(pairs) = query?;
    let body = body?;

    let request = InboundRequest::new(method, uri.path())
        .with_query(collapse_query(pairs))
        .with_body(body);

    let reply = state.proxy.handle(request).await?;

    let status = StatusCode::from_u16(reply.status).map_err(|_| {
        Error::Internal(format!("upstream sent invalid status {}", reply.status))
    })?;

    let mut response = Response::builder().status(status);
    if !reply.body.is_empty() {
        response = response.header(header::CONTENT_TYPE, "application/json");
    }

    response
        .body(Body::from(reply.body))
        .map_err(|e| ApiError(Error::Internal(e.to_string())))
}
