/// Registry of route sets with forwarding between them
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::route_set::ROOT_CONTROLLER;
use crate::{FormatRegistry, MatchResult, Params, RouteError, RouteRequest, RouteSet, UrlOptions};

/// Default bound on chained forwards
pub const DEFAULT_MAX_FORWARD_DEPTH: usize = 16;

/// Entry point for recognition and generation
///
/// Requests enter the root set. A route ending in `->` hands the rest of
/// the path to the set named by its `forward_to`, and so on until a route
/// matches without forwarding.
///
/// ```
/// use railyard_router::{RouteDef, RouteRequest, RouteSet, Router};
///
/// let mut root = RouteSet::default();
/// root.connect(RouteDef::new("/blog->").forward_to("article"))?;
/// let mut article = RouteSet::new("article");
/// article.connect("/$action/$id")?;
///
/// let router = Router::builder().route_set(root).route_set(article).build()?;
/// let result = router.recognize(&RouteRequest::get("/blog/show/3")).unwrap();
/// assert_eq!(result.controller_name, "article");
/// assert_eq!(result.action, "show");
/// assert_eq!(result.id(), Some("3"));
/// assert_eq!(result.path, "/blog/show/3");
/// # Ok::<(), railyard_router::RouteError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Router {
    sets: HashMap<String, Arc<RouteSet>>,
    root: String,
    formats: Arc<FormatRegistry>,
    max_forward_depth: usize,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Resolves a request, following forwards
    ///
    /// `None` when no route in the reachable chain matches. A forward is a
    /// commitment: if the target set has no match the request is unresolved.
    pub fn recognize(&self, request: &RouteRequest) -> Option<MatchResult> {
        self.recognize_in(&self.root, request)
    }

    /// Resolves a request starting from a named set
    pub fn recognize_in(&self, controller: &str, request: &RouteRequest) -> Option<MatchResult> {
        let mut set = self.sets.get(controller)?;
        let mut current = request.clone();
        let mut carried = Params::new();

        for depth in 0..=self.max_forward_depth {
            let mut result = set.recognize(&current)?;

            if !result.do_forward {
                for (name, value) in carried {
                    result.params.entry(name).or_insert(value);
                }
                result.path = request.path.clone();
                result.request = request.clone();
                return Some(result);
            }

            let target = result.forward_to.as_deref()?;
            let remaining = result.remaining_path.as_deref().unwrap_or("/");
            debug!(
                from = %set.controller(),
                to = %target,
                remaining = %remaining,
                depth,
                "Forwarding request"
            );

            for (name, value) in &result.params {
                if name != "action" && name != "controller" {
                    carried.insert(name.clone(), value.clone());
                }
            }
            current = request.with_path(remaining);
            set = self.sets.get(target)?;
        }

        warn!(
            path = %request.path,
            max_forward_depth = self.max_forward_depth,
            "Forward chain exceeded maximum depth"
        );
        None
    }

    /// First path produced for `options`
    ///
    /// The root set is tried first, then the set named by `options`'
    /// controller.
    pub fn generate(&self, options: &UrlOptions, request: Option<&RouteRequest>) -> Option<String> {
        let root = self.sets.get(&self.root);
        let named = options
            .get("controller")
            .filter(|name| *name != self.root)
            .and_then(|name| self.sets.get(name));

        root.into_iter()
            .chain(named)
            .find_map(|set| set.generate(options, request))
    }

    /// Reverse routing entry point used by views and controllers
    pub fn url_for(&self, options: &UrlOptions, request: &RouteRequest) -> Option<String> {
        self.generate(options, Some(request))
    }

    pub fn route_set(&self, controller: &str) -> Option<&Arc<RouteSet>> {
        self.sets.get(controller)
    }

    /// Registered controller names, sorted
    pub fn controllers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn root_controller(&self) -> &str {
        &self.root
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    pub fn max_forward_depth(&self) -> usize {
        self.max_forward_depth
    }
}

/// Collects route sets and validates them into a [`Router`]
#[derive(Debug)]
pub struct RouterBuilder {
    sets: Vec<RouteSet>,
    root: String,
    formats: FormatRegistry,
    max_forward_depth: usize,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self {
            sets: Vec::new(),
            root: ROOT_CONTROLLER.to_string(),
            formats: FormatRegistry::default(),
            max_forward_depth: DEFAULT_MAX_FORWARD_DEPTH,
        }
    }
}

impl RouterBuilder {
    /// Adds a route set; a later set with the same controller replaces it
    pub fn route_set(mut self, set: RouteSet) -> Self {
        self.sets.retain(|s| s.controller() != set.controller());
        self.sets.push(set);
        self
    }

    pub fn root_controller(mut self, name: impl Into<String>) -> Self {
        self.root = name.into();
        self
    }

    pub fn formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    pub fn max_forward_depth(mut self, depth: usize) -> Self {
        self.max_forward_depth = depth;
        self
    }

    /// Checks the root set exists and every forward target is registered
    pub fn build(self) -> Result<Router, RouteError> {
        if !self.sets.iter().any(|s| s.controller() == self.root) {
            return Err(RouteError::MissingRootSet(self.root));
        }

        for set in &self.sets {
            for route in set.routes() {
                if let Some(target) = route.forward_to() {
                    if !self.sets.iter().any(|s| s.controller() == target) {
                        return Err(RouteError::UnknownForwardTarget {
                            controller: set.controller().to_string(),
                            target: target.to_string(),
                        });
                    }
                }
            }
        }

        let formats = Arc::new(self.formats);
        let sets = self
            .sets
            .into_iter()
            .map(|mut set| {
                set.set_formats(Arc::clone(&formats));
                (set.controller().to_string(), Arc::new(set))
            })
            .collect();

        Ok(Router {
            sets,
            root: self.root,
            formats,
            max_forward_depth: self.max_forward_depth,
        })
    }
}
