// src/server/routes.rs

//! HTTP surface of the preview server.

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::Stream;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::warn;

use crate::server::session::PreviewSession;

pub const EVENTS_PATH: &str = "/__sitebuild/events";
pub const CLIENT_PATH: &str = "/__sitebuild/client.js";

const CLIENT_JS: &str = include_str!("client.js");
const MAX_HTML_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    session: Arc<PreviewSession>,
    files: ServeDir,
}

/// Build the preview router serving `root`.
pub fn router(session: Arc<PreviewSession>, root: impl Into<PathBuf>, cors: bool) -> Router {
    let files = ServeDir::new(root.into()).append_index_html_on_directories(true);
    let state = AppState { session, files };

    let app = Router::new()
        .route(EVENTS_PATH, get(stream_events))
        .route(CLIENT_PATH, get(client_script))
        .fallback(serve_output)
        .with_state(state);

    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

async fn client_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        CLIENT_JS,
    )
}

async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let (guard, mut rx) = state.session.connect();

    let event_stream = stream! {
        // Dropping the stream (client went away) drops the guard.
        let _guard = guard;
        while let Some(message) = rx.recv().await {
            let payload = serde_json::to_string(&message).unwrap_or_else(|_| "{}".to_string());
            yield Ok(SseEvent::default().event(message.event_name()).data(payload));
        }
    };

    Sse::new(event_stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}

/// Static files from the output tree. HTML gets the live-reload client.
async fn serve_output(State(state): State<AppState>, req: Request) -> Response {
    let response = match state.files.clone().oneshot(req).await {
        Ok(res) => res.map(Body::new),
        Err(never) => match never {},
    };

    if !is_html(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_HTML_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "failed to buffer html response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = inject_client(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Response::from_parts(parts, Body::from(html))
}

fn is_html(response: &Response) -> bool {
    response.status().is_success()
        && response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html"))
}

/// Insert the client script tag before the last `</body>`, or append it.
pub fn inject_client(html: &str) -> String {
    let tag = format!(r#"<script src="{CLIENT_PATH}"></script>"#);
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..idx]);
            out.push_str(&tag);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{tag}"),
    }
}
