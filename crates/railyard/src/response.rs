// File: src/response.rs
// Purpose: Response produced by a dispatched request

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response as HttpResponse};

fn insert_header(headers: &mut HeaderMap, key: &str, value: &str) {
    if let (Ok(name), Ok(val)) = (
        HeaderName::from_bytes(key.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        headers.insert(name, val);
    }
}

/// Status, headers and body of a response
///
/// ```
/// use railyard::Response;
/// use railyard::StatusCode;
///
/// let response = Response::html("<p>hi</p>").status(StatusCode::CREATED);
/// assert_eq!(response.status_code(), StatusCode::CREATED);
/// assert_eq!(response.body(), "<p>hi</p>");
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    /// 200 with an HTML body
    pub fn html(body: impl Into<String>) -> Self {
        Self::new()
            .content_type("text/html; charset=utf-8")
            .body_text(body)
    }

    /// 200 with a plain text body
    pub fn text(body: impl Into<String>) -> Self {
        Self::new()
            .content_type("text/plain; charset=utf-8")
            .body_text(body)
    }

    /// 303 redirect to `location`
    pub fn redirect(location: impl AsRef<str>) -> Self {
        Self::new()
            .status(StatusCode::SEE_OTHER)
            .header(header::LOCATION.as_str(), location.as_ref())
    }

    pub fn not_found() -> Self {
        Self::html("<h1>404 Not Found</h1>").status(StatusCode::NOT_FOUND)
    }

    pub fn internal_error() -> Self {
        Self::html("<h1>500 Internal Server Error</h1>").status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Set the HTTP status code.
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Add a custom response header; invalid names or values are ignored
    pub fn header(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        insert_header(&mut self.headers, key.as_ref(), value.as_ref());
        self
    }

    pub fn content_type(self, mime: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), mime)
    }

    pub fn body_text(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> HttpResponse {
        (self.status, self.headers, self.body).into_response()
    }
}
