//! # Railyard Router
//!
//! Controller-scoped routing with pattern matching, forwarding between
//! route sets and reverse URL generation.
//!
//! - Literal components (`/store/checkout`)
//! - Variables (`/$controller/$action/$id`)
//! - Splats for the rest of the path (`/files/*path`)
//! - Method prefixes (`GET /$id/edit`)
//! - Format suffixes (`/feed.rss`, `/$action.$format`)
//! - Forwarding into another controller's routes (`/blog->`)
//!
//! ## Matching
//!
//! Routes live in a [`RouteSet`] per controller and are tried in the order
//! they were added; the first match wins. Trailing variables with a default
//! may be left out of the URL, so `/$controller/$action/$id` accepts `/`,
//! `/store`, `/store/show` and `/store/show/45`.
//!
//! ## Forwarding
//!
//! A pattern ending in `->` delegates the unconsumed path to the route set
//! named by `forward_to`. The [`Router`] follows forwards until a route
//! matches without forwarding.
//!
//! ## Example
//!
//! ```
//! use railyard_router::{RouteDef, RouteRequest, RouteSet, Router, UrlOptions};
//!
//! let mut root = RouteSet::default();
//! root.add([
//!     RouteDef::new("/blog->").forward_to("article"),
//!     RouteDef::new("/$controller/$action/$id"),
//! ])?;
//!
//! let mut article = RouteSet::new("article");
//! article.connect("/$action/$id")?;
//!
//! let router = Router::builder().route_set(root).route_set(article).build()?;
//!
//! let result = router.recognize(&RouteRequest::get("/store/show/45")).unwrap();
//! assert_eq!(result.controller_name, "store");
//! assert_eq!(result.action, "show");
//! assert_eq!(result.id(), Some("45"));
//!
//! let url = router.generate(&UrlOptions::new().controller("store").action("index"), None);
//! assert_eq!(url.as_deref(), Some("/store"));
//! # Ok::<(), railyard_router::RouteError>(())
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

mod definition;
mod error;
mod formats;
mod params;
pub mod pattern;
mod request;
mod restful;
pub mod route;
mod route_set;
mod router;
mod url;

pub use definition::{Condition, ConditionFn, RouteDef};
pub use error::RouteError;
pub use formats::{Format, FormatRegistry, DEFAULT_FORMAT};
pub use params::{ParamValue, Params};
pub use pattern::{classify_segment, MethodFilter, Pattern, Segment};
pub use request::RouteRequest;
pub use restful::restful_routes;
pub use route::{MatchResult, Route, DEFAULT_ACTION};
pub use route_set::{RouteSet, ROOT_CONTROLLER};
pub use router::{Router, RouterBuilder, DEFAULT_MAX_FORWARD_DEPTH};
pub use url::UrlOptions;
