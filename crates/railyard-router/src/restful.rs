/// Standard resource routes
///
/// | method | path        | action    |
/// |--------|-------------|-----------|
/// | GET    | `/`         | `index`   |
/// | POST   | `/`         | `create`  |
/// | GET    | `/new`      | `new`     |
/// | GET    | `/1`        | `show`    |
/// | PUT    | `/1`        | `update`  |
/// | GET    | `/1/edit`   | `edit`    |
/// | GET    | `/1/delete` | `delete`  |
/// | DELETE | `/1`        | `destroy` |
///
/// Anything else falls through to `/$action/$id`.
use crate::RouteDef;

/// Route declarations for a resource controller, in evaluation order
///
/// ```
/// use railyard_router::{restful_routes, RouteSet};
///
/// let mut routes = RouteSet::new("articles");
/// routes.add(restful_routes())?;
/// assert_eq!(routes.recognize_path("/7/edit", None).unwrap().action, "edit");
/// assert_eq!(routes.recognize_path("/", Some("POST")).unwrap().action, "create");
/// # Ok::<(), railyard_router::RouteError>(())
/// ```
pub fn restful_routes() -> Vec<RouteDef> {
    vec![
        RouteDef::new("GET /$id/edit").action("edit"),
        RouteDef::new("GET /$id/delete").action("delete"),
        RouteDef::new("DELETE /$id").action("destroy"),
        RouteDef::new("PUT /$id").action("update"),
        RouteDef::new("GET /$id")
            .action("show")
            .requirement("id", r"^\d+$"),
        RouteDef::new("GET /new").action("new"),
        RouteDef::new("POST /").action("create"),
        RouteDef::new("GET /").action("index"),
        RouteDef::new("/$action/$id"),
    ]
}
