/// Ordered routes for one controller
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::{FormatRegistry, MatchResult, Route, RouteDef, RouteError, RouteRequest, UrlOptions};

/// Name of the route set requests enter first
pub const ROOT_CONTROLLER: &str = "root";

/// Routes scoped to one controller, evaluated in insertion order
///
/// ```
/// use railyard_router::{RouteRequest, RouteSet};
///
/// let mut routes = RouteSet::new("blog");
/// routes
///     .connect("GET /$id")?
///     .connect("/$action/$id")?;
///
/// let result = routes.recognize(&RouteRequest::get("/42")).unwrap();
/// assert_eq!(result.controller_name, "blog");
/// assert_eq!(result.id(), Some("42"));
/// # Ok::<(), railyard_router::RouteError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RouteSet {
    controller: String,
    routes: Vec<Arc<Route>>,
    formats: Arc<FormatRegistry>,
}

impl Default for RouteSet {
    fn default() -> Self {
        Self::new(ROOT_CONTROLLER)
    }
}

impl RouteSet {
    pub fn new(controller: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            routes: Vec::new(),
            formats: Arc::new(FormatRegistry::default()),
        }
    }

    /// Uses a shared format registry for matching and generation
    pub fn with_formats(mut self, formats: Arc<FormatRegistry>) -> Self {
        self.formats = formats;
        self
    }

    pub(crate) fn set_formats(&mut self, formats: Arc<FormatRegistry>) {
        self.formats = formats;
    }

    /// Adds one route; a malformed declaration fails immediately
    pub fn connect(&mut self, def: impl Into<RouteDef>) -> Result<&mut Self, RouteError> {
        let route = Route::new(self.controller.clone(), def.into())?;
        self.routes.push(Arc::new(route));
        Ok(self)
    }

    /// Adds several routes in order
    pub fn add<I, D>(&mut self, defs: I) -> Result<&mut Self, RouteError>
    where
        I: IntoIterator<Item = D>,
        D: Into<RouteDef>,
    {
        for def in defs {
            self.connect(def)?;
        }
        Ok(self)
    }

    /// Declares routes inside a closure
    ///
    /// ```
    /// use railyard_router::{RouteDef, RouteSet};
    ///
    /// let mut routes = RouteSet::default();
    /// routes.draw(|map| {
    ///     map.connect(RouteDef::new("GET /").controller("home"))?;
    ///     map.connect("/$controller/$action/$id")?;
    ///     Ok(())
    /// })?;
    /// assert_eq!(routes.len(), 2);
    /// # Ok::<(), railyard_router::RouteError>(())
    /// ```
    pub fn draw<F>(&mut self, mapper: F) -> Result<&mut Self, RouteError>
    where
        F: FnOnce(&mut RouteSet) -> Result<(), RouteError>,
    {
        mapper(self)?;
        Ok(self)
    }

    /// First route accepting the request, in insertion order
    pub fn recognize(&self, request: &RouteRequest) -> Option<MatchResult> {
        let result = self
            .routes
            .iter()
            .find_map(|route| route.recognize(request, &self.formats));

        match &result {
            Some(result) => debug!(
                controller = %self.controller,
                path = %request.path,
                route = %result.route,
                params = %result,
                "Route recognized"
            ),
            None => debug!(
                controller = %self.controller,
                path = %request.path,
                "No route recognized"
            ),
        }
        result
    }

    /// Recognizes a bare path; `method` defaults to GET
    pub fn recognize_path(&self, path: &str, method: Option<&str>) -> Option<MatchResult> {
        let request = RouteRequest::new(method.unwrap_or("GET"), path);
        self.recognize(&request)
    }

    /// First path any route produces for `options`
    pub fn generate(&self, options: &UrlOptions, request: Option<&RouteRequest>) -> Option<String> {
        self.routes
            .iter()
            .find_map(|route| route.generate(options, request, &self.formats))
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Route>> {
        self.routes.get(index)
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Controller name this set is scoped to
    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }
}

impl fmt::Display for RouteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, route) in self.routes.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", route)?;
        }
        Ok(())
    }
}
