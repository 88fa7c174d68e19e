// Railyard - controller dispatch on top of railyard-router
// Filters, layouts and an action resolver around a recognized route

pub mod config;
pub mod context;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod filters;
pub mod layout;
pub mod request_context;
pub mod resolver;
pub mod response;
pub mod routes;
pub mod templating;
pub mod value;

// Re-export framework types
pub use config::Config;
pub use context::{ActionContext, RenderOptions};
pub use controller::{ActionTable, Controller, ControllerBuilder, ControllerConfig, ControllerRegistry, Handler};
pub use dispatch::{Dispatcher, Outcome};
pub use error::{DispatchError, RenderError};
pub use filters::{Filter, FilterChain, FilterEntry, Scope};
pub use layout::{LayoutChain, LayoutEntry, LayoutFn, LayoutName};
pub use request_context::{FormData, QueryParams, RequestContext};
pub use resolver::{normalize_action, ActionResolver, ResolvedAction, Rung};
pub use response::Response;
pub use routes::{load_route_set, load_route_sets, load_router, RoutesFile};
pub use templating::{
    interpolate, TemplateContext, TemplateDescriptor, TemplateError, TemplateStore, Templating,
};
pub use value::Value;

// Routing types used in controller code
pub use railyard_router::{
    restful_routes, MatchResult, RouteDef, RouteRequest, RouteSet, Router, UrlOptions,
};

// Re-export commonly used types from dependencies
pub use axum;
pub use axum::http::StatusCode;
