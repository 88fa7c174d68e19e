// File: src/context.rs
// Purpose: Per-request action context shared by filters, actions and layouts

use crate::error::RenderError;
use crate::request_context::RequestContext;
use crate::resolver::normalize_action;
use crate::response::Response;
use crate::templating::{TemplateContext, TemplateDescriptor, TemplateError, Templating};
use crate::value::Value;
use axum::http::StatusCode;
use railyard_router::{FormatRegistry, MatchResult, Router, UrlOptions};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::debug;

/// What an explicit [`ActionContext::render`] call should produce
///
/// With no source set, the template for the current action is rendered.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub text: Option<String>,
    /// Render the template of another action of this controller
    pub action: Option<String>,
    /// Render `controller/action`, or an action name of this controller
    pub template: Option<String>,
    pub inline: Option<String>,
    pub layout: Option<String>,
    pub no_layout: bool,
    pub status: Option<StatusCode>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn inline(mut self, source: impl Into<String>) -> Self {
        self.inline = Some(source.into());
        self
    }

    pub fn layout(mut self, name: impl Into<String>) -> Self {
        self.layout = Some(name.into());
        self
    }

    pub fn no_layout(mut self) -> Self {
        self.no_layout = true;
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }
}

/// State of one dispatched request
///
/// Owned by a single dispatch call. Filters and actions read the request and
/// route through it and write `content`, `assigns` and the response status.
pub struct ActionContext {
    pub request: RequestContext,
    pub route: MatchResult,
    pub controller: String,
    /// Normalized action name
    pub action: String,
    /// Lowercase effective method
    pub method: String,
    pub format: String,
    /// Response body; layouts wrap it, after filters may rewrite it
    pub content: String,
    /// Variables passed to views and layouts
    pub assigns: TemplateContext,
    status: StatusCode,
    headers: Vec<(String, String)>,
    redirect: Option<String>,
    rendered: bool,
    layout_override: Option<Option<String>>,
    templating: Arc<dyn Templating>,
    router: Option<Arc<Router>>,
}

impl std::fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionContext")
            .field("controller", &self.controller)
            .field("action", &self.action)
            .field("method", &self.method)
            .field("format", &self.format)
            .field("status", &self.status)
            .field("rendered", &self.rendered)
            .finish()
    }
}

impl ActionContext {
    pub fn new(request: RequestContext, route: MatchResult, templating: Arc<dyn Templating>) -> Self {
        Self {
            controller: route.controller_name.clone(),
            action: normalize_action(&route.action),
            method: route.method.to_ascii_lowercase(),
            format: route.format.clone(),
            request,
            route,
            content: String::new(),
            assigns: TemplateContext::new(),
            status: StatusCode::OK,
            headers: Vec::new(),
            redirect: None,
            rendered: false,
            layout_override: None,
            templating,
            router: None,
        }
    }

    /// Router used by [`url_for`](Self::url_for)
    pub fn with_router(mut self, router: Arc<Router>) -> Self {
        self.router = Some(router);
        self
    }

    pub fn templating(&self) -> &dyn Templating {
        self.templating.as_ref()
    }

    /// Merged request parameter (query, form, then route)
    pub fn param(&self, name: &str) -> Option<&str> {
        self.request.param(name)
    }

    /// Deserialize the request params, or the raw JSON body when present
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match self.request.form.json() {
            Some(json) => serde_json::from_value(json.clone()),
            None => {
                let map = self
                    .request
                    .params
                    .iter()
                    .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
                    .collect();
                serde_json::from_value(JsonValue::Object(map))
            }
        }
    }

    pub fn assign(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.assigns.insert(name.into(), value.into());
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    pub fn is_redirect(&self) -> bool {
        self.redirect.is_some()
    }

    /// Layout requested by the current render: `Some(None)` means none
    pub fn layout_override(&self) -> Option<Option<&str>> {
        self.layout_override.as_ref().map(Option::as_deref)
    }

    /// Render once for this request
    ///
    /// A second call, or a call after [`redirect_to`](Self::redirect_to),
    /// fails with [`RenderError::DoubleRender`].
    pub fn render(&mut self, options: RenderOptions) -> Result<(), RenderError> {
        if self.rendered {
            return Err(RenderError::DoubleRender);
        }
        self.rendered = true;

        if let Some(status) = options.status {
            self.status = status;
        }
        if options.no_layout {
            self.layout_override = Some(None);
        } else if let Some(layout) = options.layout {
            self.layout_override = Some(Some(layout));
        }

        let view_context = self.view_context();
        self.content = if let Some(text) = options.text {
            text
        } else if let Some(source) = options.inline {
            self.templating.render_inline(&source, &view_context)?
        } else {
            let descriptor = match (options.template, options.action) {
                (Some(template), _) => self.descriptor_for_template(&template),
                (None, Some(action)) => self.descriptor(&normalize_action(&action)),
                (None, None) => self.descriptor(&self.action),
            };
            self.templating.render(&descriptor, &view_context)?
        };
        Ok(())
    }

    /// Shorthand for rendering plain text
    pub fn render_text(&mut self, text: impl Into<String>) -> Result<(), RenderError> {
        self.render(RenderOptions::new().text(text))
    }

    /// Redirect; counts as the render for this request
    pub fn redirect_to(&mut self, location: impl Into<String>) -> Result<(), RenderError> {
        if self.rendered {
            return Err(RenderError::DoubleRender);
        }
        self.rendered = true;
        self.status = StatusCode::SEE_OTHER;
        self.redirect = Some(location.into());
        Ok(())
    }

    /// Redirect to the URL generated for `options`
    pub fn redirect_to_url(&mut self, options: &UrlOptions) -> Result<(), RenderError> {
        let url = self
            .url_for(options)
            .ok_or_else(|| RenderError::NoRoute(format!("{:?}", options)))?;
        self.redirect_to(url)
    }

    /// URL for `options`, with this request's params as fallback values
    pub fn url_for(&self, options: &UrlOptions) -> Option<String> {
        let request = self.route.merged_request();
        match &self.router {
            Some(router) => router.url_for(options, &request),
            None => self
                .route
                .route
                .generate(options, Some(&request), &FormatRegistry::default()),
        }
    }

    /// Renders the action's own template unless something was rendered
    ///
    /// A missing template keeps whatever content the action produced.
    pub(crate) fn render_implicit(&mut self) -> Result<(), TemplateError> {
        if self.rendered {
            return Ok(());
        }
        let descriptor = self.descriptor(&self.action);
        match self.templating.render(&descriptor, &self.view_context()) {
            Ok(body) => {
                self.content = body;
                self.rendered = true;
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                debug!(template = %descriptor.key(), "No template for implicit render");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Assigns plus route params, controller, action and format
    pub fn view_context(&self) -> TemplateContext {
        let mut context: TemplateContext = self
            .route
            .params
            .iter()
            .map(|(name, value)| (name.clone(), Value::from(value)))
            .collect();
        context.insert("controller".to_string(), Value::from(self.controller.as_str()));
        context.insert("action".to_string(), Value::from(self.action.as_str()));
        context.insert("format".to_string(), Value::from(self.format.as_str()));
        context.extend(self.assigns.iter().map(|(k, v)| (k.clone(), v.clone())));
        context
    }

    /// Final response; the content type follows the resolved format
    pub fn into_response(self, formats: &FormatRegistry) -> Response {
        let mut response = match &self.redirect {
            Some(location) => Response::redirect(location).status(self.status),
            None => {
                let mime = formats.mime_type(&self.format).unwrap_or("text/html");
                Response::new()
                    .status(self.status)
                    .content_type(format!("{}; charset=utf-8", mime))
                    .body_text(self.content)
            }
        };
        for (name, value) in &self.headers {
            response = response.header(name, value);
        }
        response
    }

    fn descriptor(&self, action: &str) -> TemplateDescriptor {
        TemplateDescriptor::new(self.controller.as_str(), action, self.format.as_str())
    }

    fn descriptor_for_template(&self, template: &str) -> TemplateDescriptor {
        match template.split_once('/') {
            Some((controller, action)) => {
                TemplateDescriptor::new(controller, action, self.format.as_str())
            }
            None => self.descriptor(template),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templating::TemplateStore;
    use railyard_router::{RouteDef, RouteSet};

    fn context_for(path: &str, store: TemplateStore) -> ActionContext {
        let mut routes = RouteSet::default();
        routes
            .connect(RouteDef::new("/$controller/$action/$id"))
            .unwrap();
        let request = RequestContext::get(path);
        let matched = routes.recognize(&request.route_request()).unwrap();
        ActionContext::new(request, matched, Arc::new(store))
    }

    #[test]
    fn test_context_normalizes_action() {
        let ctx = context_for("/blog/showAll", TemplateStore::default());
        assert_eq!(ctx.controller, "blog");
        assert_eq!(ctx.action, "show_all");
        assert_eq!(ctx.method, "get");
        assert_eq!(ctx.format, "html");
    }

    #[test]
    fn test_second_render_fails() {
        let mut ctx = context_for("/blog/show/1", TemplateStore::default());
        ctx.render_text("one").unwrap();
        assert!(matches!(ctx.render_text("two"), Err(RenderError::DoubleRender)));
        assert!(matches!(ctx.redirect_to("/"), Err(RenderError::DoubleRender)));
        assert_eq!(ctx.content, "one");
    }

    #[test]
    fn test_render_template_with_assigns() {
        let store = TemplateStore::default().with_template("blog/show.html", "<h1>{title} #{id}</h1>");
        let mut ctx = context_for("/blog/show/7", store);
        ctx.assign("title", "Post");
        ctx.render(RenderOptions::new()).unwrap();
        assert_eq!(ctx.content, "<h1>Post #7</h1>");
    }

    #[test]
    fn test_explicit_render_of_missing_template_fails() {
        let mut ctx = context_for("/blog/show/7", TemplateStore::default());
        let err = ctx.render(RenderOptions::new().action("edit")).unwrap_err();
        assert!(matches!(err, RenderError::Template(TemplateError::NotFound(_))));
    }

    #[test]
    fn test_render_other_controller_template() {
        let store = TemplateStore::default().with_template("shared/banner.html", "banner");
        let mut ctx = context_for("/blog/show/7", store);
        ctx.render(RenderOptions::new().template("shared/banner").no_layout())
            .unwrap();
        assert_eq!(ctx.content, "banner");
        assert_eq!(ctx.layout_override(), Some(None));
    }

    #[test]
    fn test_implicit_render_keeps_raw_content_when_template_missing() {
        let mut ctx = context_for("/blog/show/7", TemplateStore::default());
        ctx.content = "raw".to_string();
        ctx.render_implicit().unwrap();
        assert_eq!(ctx.content, "raw");
        assert!(!ctx.is_rendered());
    }

    #[test]
    fn test_url_for_uses_current_params() {
        let ctx = context_for("/blog/show/7", TemplateStore::default());
        assert_eq!(
            ctx.url_for(&UrlOptions::new().action("edit")).as_deref(),
            Some("/blog/edit")
        );
        assert_eq!(
            ctx.url_for(&UrlOptions::new().action("edit").id("7")).as_deref(),
            Some("/blog/edit/7")
        );
    }

    #[test]
    fn test_redirect_response() {
        let mut ctx = context_for("/blog/show/7", TemplateStore::default());
        ctx.redirect_to("/blog").unwrap();
        let response = ctx.into_response(&FormatRegistry::default());
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.get_header("location"), Some("/blog"));
    }

    #[test]
    fn test_response_content_type_follows_format() {
        let mut ctx = context_for("/blog/show/7.json", TemplateStore::default());
        ctx.render_text("{}").unwrap();
        let response = ctx.into_response(&FormatRegistry::default());
        assert_eq!(
            response.get_header("content-type"),
            Some("application/json; charset=utf-8")
        );
    }

    #[test]
    fn test_params_as() {
        #[derive(serde::Deserialize)]
        struct Show {
            id: String,
            action: String,
        }
        let mut routes = RouteSet::default();
        routes.connect(RouteDef::new("/$controller/$action/$id")).unwrap();
        let mut request = RequestContext::get("/blog/show/7");
        let matched = routes.recognize(&request.route_request()).unwrap();
        request.merge_route_params(&matched);
        let ctx = ActionContext::new(request, matched, Arc::new(TemplateStore::default()));

        let show: Show = ctx.params_as().unwrap();
        assert_eq!(show.id, "7");
        assert_eq!(show.action, "show");
    }
}
