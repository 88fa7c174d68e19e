// File: src/request_context.rs
// Purpose: The incoming request as filters and actions see it

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use railyard_router::{MatchResult, RouteRequest};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::str::FromStr;

/// Method, path, query, body fields, headers and cookies of one request
///
/// `params` merges query, then body fields, then route params; later
/// sources win. Passed explicitly through the whole dispatch.
#[derive(Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub query: QueryParams,
    pub form: FormData,
    pub headers: HeaderMap,
    pub cookies: HashMap<String, String>,
    pub params: HashMap<String, String>,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .finish()
    }
}

impl RequestContext {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        query: QueryParams,
        form: FormData,
        headers: HeaderMap,
    ) -> Self {
        let params = query
            .iter()
            .chain(form.iter())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            cookies: cookies_from(&headers),
            method,
            path: path.into(),
            query,
            form,
            headers,
            params,
        }
    }

    /// No query, body or headers
    pub fn empty(method: Method, path: impl Into<String>) -> Self {
        Self::new(
            method,
            path,
            QueryParams::default(),
            FormData::default(),
            HeaderMap::new(),
        )
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::empty(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::empty(Method::POST, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        self.query.0.insert(key.clone(), value.clone());
        self.params.insert(key, value);
        self
    }

    pub fn with_form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        self.form.fields.insert(key.clone(), value.clone());
        self.params.insert(key, value);
        self
    }

    /// Invalid header names or values are dropped
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(val)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, val);
            self.cookies = cookies_from(&self.headers);
        }
        self
    }

    pub fn get_cookie(&self, name: &str) -> Option<&String> {
        self.cookies.get(name)
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// What route matching needs from this request
    pub fn route_request(&self) -> RouteRequest {
        RouteRequest {
            method: self.method.as_str().to_ascii_uppercase(),
            path: self.path.clone(),
            data: self.params.clone(),
            accept: self.get_header("accept").map(str::to_string),
        }
    }

    /// Bound route params, controller, action and format join `params`
    pub fn merge_route_params(&mut self, route: &MatchResult) {
        self.params.extend(
            route
                .params
                .iter()
                .map(|(name, value)| (name.clone(), value.to_path_string())),
        );
        self.params
            .insert("controller".to_string(), route.controller_name.clone());
        self.params.insert("action".to_string(), route.action.clone());
        self.params.insert("format".to_string(), route.format.clone());
    }
}

fn cookies_from(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Decodes `a=1&b=two+words`; undecodable pairs are skipped
pub fn parse_urlencoded(input: &str) -> HashMap<String, String> {
    input
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = urlencoding::decode(&key.replace('+', " ")).ok()?.into_owned();
            let value = urlencoding::decode(&value.replace('+', " ")).ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}

/// Decoded `?key=value` pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self(params)
    }

    /// Raw query string without the leading `?`
    pub fn parse(query: &str) -> Self {
        Self(parse_urlencoded(query))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn parse_as<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key)?.parse().ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Body fields of a urlencoded or JSON request; string values are trimmed
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    raw_json: Option<JsonValue>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// `application/x-www-form-urlencoded` body
    pub fn from_urlencoded(body: &str) -> Self {
        Self {
            fields: parse_urlencoded(body)
                .into_iter()
                .map(|(k, v)| (k, v.trim().to_string()))
                .collect(),
            raw_json: None,
        }
    }

    /// Top-level members of a JSON object become fields; the document is kept
    pub fn from_json(json: JsonValue) -> Self {
        let fields = match &json {
            JsonValue::Object(map) => map
                .iter()
                .map(|(key, value)| {
                    let text = match value {
                        JsonValue::String(s) => s.trim().to_string(),
                        other => other.to_string(),
                    };
                    (key.clone(), text)
                })
                .collect(),
            _ => HashMap::new(),
        };

        Self {
            fields,
            raw_json: Some(json),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn parse_as<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key)?.parse().ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The JSON document the fields came from
    pub fn json(&self) -> Option<&JsonValue> {
        self.raw_json.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.raw_json.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railyard_router::{RouteDef, RouteSet};

    #[test]
    fn test_urlencoded_body_is_trimmed() {
        let form = FormData::from_urlencoded("title=+Hello+&body=%09text%0A");
        assert_eq!(form.get("title"), Some("Hello"));
        assert_eq!(form.get("body"), Some("text"));
    }

    #[test]
    fn test_json_body_keeps_document() {
        let json = serde_json::json!({ "title": " Post ", "draft": true, "rank": 3 });
        let form = FormData::from_json(json.clone());

        assert_eq!(form.get("title"), Some("Post"));
        assert_eq!(form.get("draft"), Some("true"));
        assert_eq!(form.parse_as::<u32>("rank"), Some(3));
        assert_eq!(form.json(), Some(&json));
    }

    #[test]
    fn test_parse_urlencoded() {
        let parsed = parse_urlencoded("q=rust+lang&page=2&flag&name=J%C3%BCrgen");
        assert_eq!(parsed.get("q").map(String::as_str), Some("rust lang"));
        assert_eq!(parsed.get("page").map(String::as_str), Some("2"));
        assert_eq!(parsed.get("flag").map(String::as_str), Some(""));
        assert_eq!(parsed.get("name").map(String::as_str), Some("Jürgen"));
    }

    #[test]
    fn test_query_parse_as() {
        let query = QueryParams::parse("page=2&per=x");
        assert_eq!(query.parse_as::<u32>("page"), Some(2));
        assert_eq!(query.parse_as::<u32>("per"), None);
        assert_eq!(query.parse_as::<u32>("missing"), None);
    }

    #[test]
    fn test_cookies() {
        let ctx = RequestContext::get("/").with_header("cookie", "session=abc123; user=ann");
        assert_eq!(ctx.get_cookie("session").map(String::as_str), Some("abc123"));
        assert_eq!(ctx.get_cookie("user").map(String::as_str), Some("ann"));
        assert_eq!(ctx.cookies.len(), 2);
    }

    #[test]
    fn test_form_overrides_query_in_params() {
        let ctx = RequestContext::new(
            Method::POST,
            "/articles",
            QueryParams::parse("title=query&page=1"),
            FormData::from_urlencoded("title=form"),
            HeaderMap::new(),
        );
        assert_eq!(ctx.param("title"), Some("form"));
        assert_eq!(ctx.param("page"), Some("1"));
    }

    #[test]
    fn test_route_request_carries_method_override_and_accept() {
        let ctx = RequestContext::post("/articles/3")
            .with_form("method", "delete")
            .with_header("accept", "application/json");

        let request = ctx.route_request();
        assert_eq!(request.method, "POST");
        assert_eq!(request.effective_method(), "DELETE");
        assert_eq!(request.accept.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_merge_route_params() {
        let mut routes = RouteSet::default();
        routes.connect(RouteDef::new("/$controller/$action/$id")).unwrap();

        let mut ctx = RequestContext::get("/blog/show/3").with_query("id", "query");
        let matched = routes.recognize(&ctx.route_request()).unwrap();
        ctx.merge_route_params(&matched);

        assert_eq!(ctx.param("id"), Some("3"));
        assert_eq!(ctx.param("controller"), Some("blog"));
        assert_eq!(ctx.param("action"), Some("show"));
        assert_eq!(ctx.param("format"), Some("html"));
    }
}
