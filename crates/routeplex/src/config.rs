// File: src/config.rs
// Purpose: Route sets declared in TOML

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::{Constraint, Schema};
use crate::specificity::compare_specificity;
use crate::Route;

/// A set of named routes
///
/// ```toml
/// base = "/api"
///
/// [[routes]]
/// name = "user"
/// pattern = "/users/:id"
/// end = true
/// constraints = { id = "int" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RouteManifest {
    /// Pattern concatenated in front of every route
    #[serde(default)]
    pub base: Option<String>,

    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

/// One declared route
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteEntry {
    pub name: String,

    pub pattern: String,

    /// Reject trailing segments (default: false)
    #[serde(default = "default_false")]
    pub end: bool,

    /// Parameter name → built-in constraint name (`int`, `slug`, ...)
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
}

fn default_false() -> bool {
    false
}

/// A built route and the name it was declared under
#[derive(Debug, Clone)]
pub struct NamedRoute {
    pub name: String,
    pub route: Route,
}

impl RouteManifest {
    /// Parses a manifest; an empty document yields the default manifest
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let manifest: RouteManifest =
            toml::from_str(content).context("Failed to parse route manifest")?;

        Ok(manifest)
    }

    /// Builds every route, most specific first
    ///
    /// # Examples
    ///
    /// ```
    /// use routeplex::RouteManifest;
    ///
    /// let manifest = RouteManifest::from_toml_str(r#"
    ///     base = "/api"
    ///
    ///     [[routes]]
    ///     name = "users"
    ///     pattern = "/users"
    ///
    ///     [[routes]]
    ///     name = "user"
    ///     pattern = "/users/:id"
    ///     end = true
    /// "#).unwrap();
    ///
    /// let routes = manifest.build().unwrap();
    /// assert_eq!(routes[0].name, "user");
    /// assert_eq!(routes[0].route.path(), "/api/users/:id");
    /// assert!(routes[0].route.is_end());
    /// ```
    pub fn build(&self) -> Result<Vec<NamedRoute>> {
        let base = self
            .base
            .as_deref()
            .map(|base| {
                Route::try_parse(base).with_context(|| format!("Invalid base pattern `{}`", base))
            })
            .transpose()?;

        let mut routes: Vec<NamedRoute> = Vec::with_capacity(self.routes.len());
        for entry in &self.routes {
            if routes.iter().any(|r| r.name == entry.name) {
                bail!("Duplicate route name `{}`", entry.name);
            }
            let route = entry
                .build()
                .with_context(|| format!("Invalid route `{}`", entry.name))?;
            let route = match &base {
                Some(base) => base.concat(&route),
                None => route,
            };
            routes.push(NamedRoute {
                name: entry.name.clone(),
                route,
            });
        }

        routes.sort_by(|a, b| compare_specificity(a.route.path(), b.route.path()));
        debug!(
            count = routes.len(),
            order = ?routes.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            "built route manifest"
        );
        Ok(routes)
    }
}

impl RouteEntry {
    fn build(&self) -> Result<Route> {
        let mut ast = crate::try_parse(&self.pattern)?;
        for (param, constraint) in &self.constraints {
            if !ast.has_param(param) {
                bail!("Constraint on unknown parameter `{}`", param);
            }
            let constraint: Constraint = constraint.parse()?;
            ast = ast.with_param_schema(param, &Schema::new(constraint));
        }
        Ok(Route::new(ast).with_end(self.end))
    }
}
