use std::io;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use blobd_store::BlobStore;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::{debug, info};

use crate::error::{ServerError, ServerResult};

/// Health check response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub objects: usize,
}

/// Declared upload size from the `Content-Length` header.
fn content_length(headers: &HeaderMap) -> ServerResult<u64> {
    let value = headers
        .get(header::CONTENT_LENGTH)
        .ok_or(ServerError::MissingContentLength)?;
    let text = value
        .to_str()
        .map_err(|_| ServerError::InvalidContentLength(format!("{value:?}")))?;
    text.trim()
        .parse()
        .map_err(|_| ServerError::InvalidContentLength(text.to_string()))
}

/// `PUT /upload/{name}`: stream the request body into the store.
pub async fn upload(
    State(store): State<BlobStore>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> ServerResult<(StatusCode, &'static str)> {
    let declared = content_length(&headers)?;
    info!(name = %name, content_length = declared, "processing upload");

    let stream = body.into_data_stream().map_err(io::Error::other);
    let outcome = store.put(&name, declared, StreamReader::new(stream)).await?;

    info!(
        name = %outcome.name,
        bytes = outcome.bytes_written,
        created = outcome.created,
        "upload complete"
    );
    Ok((StatusCode::CREATED, "Upload successful"))
}

/// `GET /download/{name}`: stream an object back with its exact length.
pub async fn download(
    State(store): State<BlobStore>,
    Path(name): Path<String>,
) -> ServerResult<Response> {
    debug!(name = %name, "processing download");
    let reader = store.open_object(&name).await?;
    let len = reader.len();
    let capacity = store.config().effective_buffer_size();
    let body = Body::from_stream(ReaderStream::with_capacity(reader, capacity));

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_LENGTH, HeaderValue::from(len)),
        ],
        body,
    )
        .into_response())
}

/// `GET /list/`: newline-terminated object names in listing order.
pub async fn list(State(store): State<BlobStore>) -> String {
    let names = store.list();
    debug!(count = names.len(), "processing list");
    let mut body = names.join("\n");
    if !names.is_empty() {
        body.push('\n');
    }
    body
}

/// Health check handler.
pub async fn health(State(store): State<BlobStore>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        objects: store.len(),
    })
}
