// File: src/handler.rs
// Purpose: Bridge axum requests into the railyard dispatcher

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response as HttpResponse},
    Router,
};
use railyard::{Dispatcher, FormData, QueryParams, RequestContext, Response};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// Every path goes through the dispatcher
pub fn app(dispatcher: Dispatcher) -> Router {
    let state = AppState {
        dispatcher: Arc::new(dispatcher),
    };

    Router::new()
        .fallback(dispatch_handler)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn dispatch_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> HttpResponse {
    let ctx = create_request_context(method, &uri, headers, body);

    match state.dispatcher.dispatch(ctx) {
        Ok(outcome) => outcome.into_response(),
        Err(err) => {
            error!(error = ?err, path = %uri.path(), "Dispatch failed");
            Response::internal_error().into_response()
        }
    }
}

fn create_request_context(method: Method, uri: &Uri, headers: HeaderMap, body: Bytes) -> RequestContext {
    let query = uri.query().map(QueryParams::parse).unwrap_or_default();
    let form = parse_body(&method, &headers, &body);
    RequestContext::new(method, uri.path(), query, form, headers)
}

fn parse_body(method: &Method, headers: &HeaderMap, body: &Bytes) -> FormData {
    if *method == Method::GET || *method == Method::HEAD || body.is_empty() {
        return FormData::new();
    }

    let content_type = headers
        .get("content-type")
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or_default();

    if content_type.contains("application/json") {
        serde_json::from_slice::<JsonValue>(body)
            .map(FormData::from_json)
            .unwrap_or_default()
    } else if content_type.contains("application/x-www-form-urlencoded") {
        FormData::from_urlencoded(&String::from_utf8_lossy(body))
    } else {
        FormData::new()
    }
}
