mod demo;
mod handler;

use anyhow::{Context, Result};
use railyard::{load_router, Config, ControllerRegistry, Dispatcher, Router, TemplateStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,railyard=debug")),
        )
        .init();

    info!("railyard starting...");

    let mut config = Config::load_default()?;
    config.apply_port_override(std::env::var("RAILYARD_PORT").ok().as_deref())?;

    info!(
        port = config.server.port,
        routes = %config.routing.routes_dir,
        views = %config.views.views_dir,
        "Configuration loaded"
    );

    let controllers = demo::controllers();

    // Fall back to the built-in demo when the project has no routes or views
    let router = if Path::new(&config.routing.routes_dir).exists() {
        let router = load_router(&config)?;
        warn!(
            controllers = ?controllers.names(),
            "Routes loaded from files, controllers still come from the demo"
        );
        for name in unserved_route_sets(&router, &controllers) {
            warn!(controller = %name, "No controller registered, its routes will return 404");
        }
        router
    } else {
        info!("No routes directory, using demo routes");
        demo::router()?
    };
    for controller in router.controllers() {
        if let Some(set) = router.route_set(controller) {
            info!("Route set `{}`:\n{}", controller, set);
        }
    }

    let mut templates =
        TemplateStore::load_dir(&config.views.views_dir, config.views.layouts_dir.as_str())?;
    if templates.is_empty() {
        info!("No views found, using demo templates");
        templates = demo::templates();
    }

    let dispatcher = Dispatcher::new(Arc::new(router), controllers, Arc::new(templates));
    let app = handler::app(dispatcher);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Route sets other than the root whose controller is not registered
fn unserved_route_sets<'a>(router: &'a Router, controllers: &ControllerRegistry) -> Vec<&'a str> {
    router
        .controllers()
        .into_iter()
        .filter(|name| *name != router.root_controller() && controllers.get(name).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use railyard::{RouteDef, RouteSet};

    #[test]
    fn test_demo_controllers_serve_demo_routes() {
        let router = demo::router().unwrap();
        assert!(unserved_route_sets(&router, &demo::controllers()).is_empty());
    }

    #[test]
    fn test_file_route_set_without_controller_is_reported() {
        let mut root = RouteSet::default();
        root.connect(RouteDef::new("/orders->").forward_to("orders")).unwrap();
        let mut orders = RouteSet::new("orders");
        orders.connect(RouteDef::new("/$action/$id")).unwrap();
        let router = Router::builder().route_set(root).route_set(orders).build().unwrap();

        assert_eq!(unserved_route_sets(&router, &demo::controllers()), vec!["orders"]);
    }
}
