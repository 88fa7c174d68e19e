// File: src/config.rs
// Purpose: Configuration parsing from railyard.toml

use anyhow::{Context, Result};
use railyard_router::{DEFAULT_FORMAT, DEFAULT_MAX_FORWARD_DEPTH, ROOT_CONTROLLER};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub views: ViewsConfig,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Directory containing `<controller>_routes.toml` files (default: "routes")
    #[serde(default = "default_routes_dir")]
    pub routes_dir: String,

    /// Route set requests enter first (default: "root")
    #[serde(default = "default_root_controller")]
    pub root_controller: String,

    /// Format of paths without an extension (default: "html")
    #[serde(default = "default_format")]
    pub default_format: String,

    /// Longest chain of forwards followed for one request
    #[serde(default = "default_max_forward_depth")]
    pub max_forward_depth: usize,
}

/// View configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewsConfig {
    /// Directory containing `<controller>/<action>.<format>` templates
    #[serde(default = "default_views_dir")]
    pub views_dir: String,

    /// Subdirectory of `views_dir` holding layouts (default: "layouts")
    #[serde(default = "default_layouts_dir")]
    pub layouts_dir: String,
}

// Default values
fn default_name() -> String {
    "railyard-app".to_string()
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_routes_dir() -> String {
    "routes".to_string()
}

fn default_root_controller() -> String {
    ROOT_CONTROLLER.to_string()
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

fn default_max_forward_depth() -> usize {
    DEFAULT_MAX_FORWARD_DEPTH
}

fn default_views_dir() -> String {
    "views".to_string()
}

fn default_layouts_dir() -> String {
    "layouts".to_string()
}

// Default implementations
impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            routes_dir: default_routes_dir(),
            root_controller: default_root_controller(),
            default_format: default_format(),
            max_forward_depth: default_max_forward_depth(),
        }
    }
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            views_dir: default_views_dir(),
            layouts_dir: default_layouts_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Applies a `RAILYARD_PORT` value, if one was set
    pub fn apply_port_override(&mut self, port: Option<&str>) -> Result<()> {
        if let Some(port) = port {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid RAILYARD_PORT: {:?}", port))?;
        }
        Ok(())
    }

    /// Load configuration from default path (./railyard.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("railyard.toml")
    }
}
