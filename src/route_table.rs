//! Route tables loaded from YAML, TOML or JSON files.
//!
//! A route table names handlers instead of holding them, which makes it
//! useful for checking a set of patterns ahead of deployment and for the
//! `silkrouter` command line tool.
//!
//! ```yaml
//! convertors:
//!   slug: "[a-z0-9]+(?:-[a-z0-9]+)*"
//! routes:
//!   - path: /project/top
//!     handler: project_top
//!   - path: /project/{id:int}
//!     handler: project_detail
//!     methods: [GET, DELETE]
//!   - path: /blog/{post:slug}
//!     handler: blog_post
//! ```
//!
//! `methods` defaults to GET, POST, PUT, PATCH and DELETE. Each entry under
//! `convertors` adds a string convertor restricted by the given regular
//! expression, usable as a type tag in this table only.

use anyhow::{bail, Context, Result};
use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::dispatch::{MethodRouter, ANY_METHODS};
use crate::path::{global_registry, RegexConvertor};
use crate::runtime_config::RouterConfig;

/// One route in a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Route pattern, e.g. `/order/{id:int}`
    pub path: String,
    /// Handler name reported on a match
    pub handler: String,
    /// HTTP methods; empty means all of GET, POST, PUT, PATCH, DELETE
    #[serde(default)]
    pub methods: Vec<String>,
}

/// A set of routes plus table-local convertors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    /// Type tag → regular expression
    #[serde(default)]
    pub convertors: BTreeMap<String, String>,
    /// Routes in registration order
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

impl RouteTable {
    /// Load a table, choosing the format from the file extension
    /// (`.yaml`/`.yml`, `.toml`, `.json`)
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read route table {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let table = match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "toml" => Self::from_toml_str(&content),
            "json" => Self::from_json_str(&content),
            other => bail!(
                "Unsupported route table extension '{other}' for {}",
                path.display()
            ),
        };
        table.with_context(|| format!("Failed to parse route table {}", path.display()))
    }

    /// Parse a YAML table
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Invalid YAML route table")
    }

    /// Parse a TOML table
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML route table")
    }

    /// Parse a JSON table
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid JSON route table")
    }

    /// Build a router with settings from the environment
    pub fn build_router(&self) -> Result<MethodRouter<String>> {
        self.build_router_with(RouterConfig::from_env())
    }

    /// Build a router mapping every entry's methods to its handler name
    pub fn build_router_with(&self, config: RouterConfig) -> Result<MethodRouter<String>> {
        let mut registry = (*global_registry()).clone();
        for (tag, pattern) in &self.convertors {
            let convertor = RegexConvertor::new(tag.as_str(), pattern)
                .with_context(|| format!("Invalid regex for convertor '{tag}'"))?;
            if registry.register(tag, convertor).is_some() {
                warn!(tag = %tag, "Route table convertor shadows a registered convertor");
            }
        }

        let mut router = MethodRouter::with_config(config).with_registry(registry);
        for entry in &self.routes {
            let methods = parse_methods(&entry.methods)
                .with_context(|| format!("Invalid methods for route '{}'", entry.path))?;
            router
                .on(&methods, &entry.path, entry.handler.clone())
                .with_context(|| format!("Failed to register route '{}'", entry.path))?;
        }

        if config.log_routes {
            router.router().dump_routes();
        }
        info!(
            routes = self.routes.len(),
            patterns = router.len(),
            convertors = self.convertors.len(),
            "Route table loaded"
        );
        Ok(router)
    }
}

fn parse_methods(methods: &[String]) -> Result<Vec<Method>> {
    if methods.is_empty() {
        return Ok(ANY_METHODS.to_vec());
    }
    methods
        .iter()
        .map(|m| {
            Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                .with_context(|| format!("Invalid HTTP method '{m}'"))
        })
        .collect()
}
