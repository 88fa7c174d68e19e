// File: src/routes.rs
// Purpose: Load `<controller>_routes.toml` files into a Router

use crate::config::Config;
use anyhow::{Context, Result};
use railyard_router::{FormatRegistry, RouteDef, RouteSet, Router};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

const ROUTES_FILE_SUFFIX: &str = "_routes.toml";

/// Contents of one routes file
#[derive(Debug, Default, Deserialize)]
pub struct RoutesFile {
    #[serde(default)]
    pub routes: Vec<RouteDef>,
}

/// Parse one routes file into the route set for `controller`
pub fn load_route_set(controller: &str, path: &Path) -> Result<RouteSet> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read routes file: {:?}", path))?;
    let file: RoutesFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse routes file: {:?}", path))?;

    let mut set = RouteSet::new(controller);
    set.add(file.routes)
        .with_context(|| format!("Invalid route in {:?}", path))?;
    debug!(controller = %controller, routes = set.len(), "Loaded route set");
    Ok(set)
}

/// Every `<controller>_routes.toml` directly inside `dir`, sorted by controller
pub fn load_route_sets(dir: impl AsRef<Path>) -> Result<Vec<RouteSet>> {
    let dir = dir.as_ref();
    let mut sets = Vec::new();

    if !dir.exists() {
        return Ok(sets);
    }

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk routes directory: {:?}", dir))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        let Some(controller) = file_name.strip_suffix(ROUTES_FILE_SUFFIX) else {
            continue;
        };
        if controller.is_empty() {
            continue;
        }
        sets.push(load_route_set(controller, entry.path())?);
    }

    Ok(sets)
}

/// Build the router described by `config.routing`
pub fn load_router(config: &Config) -> Result<Router> {
    let routing = &config.routing;
    let mut formats = FormatRegistry::default();
    formats
        .set_default(&routing.default_format)
        .context("Invalid routing.default_format")?;

    let sets = load_route_sets(&routing.routes_dir)?;
    info!(
        route_sets = sets.len(),
        dir = %routing.routes_dir,
        "Loaded routes"
    );

    let builder = sets.into_iter().fold(
        Router::builder()
            .root_controller(routing.root_controller.as_str())
            .formats(formats)
            .max_forward_depth(routing.max_forward_depth),
        |builder, set| builder.route_set(set),
    );
    builder
        .build()
        .with_context(|| format!("Failed to build router from {}", routing.routes_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use railyard_router::RouteRequest;

    const ROOT_ROUTES: &str = r#"
[[routes]]
pattern = "/blog->"
forward_to = "blog"

[[routes]]
pattern = "/$controller/$action/$id"
"#;

    const BLOG_ROUTES: &str = r#"
[[routes]]
pattern = "/$id"
action = "show"
requirements = { id = '^\d+$' }

[[routes]]
pattern = "/"
action = "index"
"#;

    #[test]
    fn test_load_router_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("root_routes.toml"), ROOT_ROUTES).unwrap();
        fs::write(dir.path().join("blog_routes.toml"), BLOG_ROUTES).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut config = Config::default();
        config.routing.routes_dir = dir.path().to_string_lossy().into_owned();

        let router = load_router(&config).unwrap();
        assert_eq!(router.controllers(), vec!["blog", "root"]);

        let matched = router.recognize(&RouteRequest::get("/blog/12")).unwrap();
        assert_eq!(matched.controller_name, "blog");
        assert_eq!(matched.action, "show");
        assert_eq!(matched.id(), Some("12"));
    }

    #[test]
    fn test_missing_root_set_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blog_routes.toml"), BLOG_ROUTES).unwrap();

        let mut config = Config::default();
        config.routing.routes_dir = dir.path().to_string_lossy().into_owned();

        assert!(load_router(&config).is_err());
    }

    #[test]
    fn test_invalid_route_reports_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("root_routes.toml");
        fs::write(&path, "[[routes]]\npattern = \"/*rest/x\"\n").unwrap();

        let err = load_route_set("root", &path).unwrap_err();
        assert!(err.to_string().contains("Invalid route"));
    }

    #[test]
    fn test_missing_dir_has_no_sets() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_route_sets(dir.path().join("none")).unwrap().is_empty());
    }
}
