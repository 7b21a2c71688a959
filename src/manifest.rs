//! Route manifests: a YAML or JSON description of an application's routes.
//!
//! ```yaml
//! info:
//!   title: Users
//!   version: 1.0.0
//! routes:
//!   - path: /users/{id:int}
//!     methods:
//!       GET:
//!         handler: get_user
//!         doc: Fetch one user
//!         response: User
//!       PUT:
//!         request_schema_file: schemas/update_user.json
//! ```
//!
//! Payload types are Rust type expressions resolved with a [`TypeResolver`]. Declared schemas
//! wrap the handler in a validation layer, which takes priority over the payload types.

use crate::handler::Handler;
use crate::openapi_builder::Info;
use crate::router::{HttpMethod, Resource, Router};
use crate::type_resolver::TypeResolver;
use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// An application description: API info plus its routes
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub info: Option<Info>,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

/// One URI template and its responders
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteEntry {
    /// URI template, e.g. `/users/{id:int}`
    pub path: String,
    /// Responders keyed by HTTP method name
    pub methods: BTreeMap<String, MethodEntry>,
}

/// A responder: its name, doc string, payload types and declared schemas
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodEntry {
    /// Responder name; defaults to `on_<method>`
    pub handler: Option<String>,
    pub doc: Option<String>,
    /// Request payload type expression
    pub request: Option<String>,
    /// Response payload type expression
    pub response: Option<String>,
    pub request_schema: Option<Value>,
    pub response_schema: Option<Value>,
    /// Request JSON Schema file, relative to the manifest
    pub request_schema_file: Option<PathBuf>,
    /// Response JSON Schema file, relative to the manifest
    pub response_schema_file: Option<PathBuf>,
}

impl Manifest {
    /// Load a manifest, choosing JSON or YAML by file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!("Loading manifest: {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

        let manifest = if is_json(path) {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
        .with_context(|| format!("Invalid manifest: {}", path.display()))?;

        info!("Loaded manifest with {} routes", manifest.routes.len());
        Ok(manifest)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse YAML manifest")
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse JSON manifest")
    }

    /// Build a router from the manifest.
    ///
    /// Schema files are read relative to `base_dir`.
    pub fn into_router(self, resolver: &mut TypeResolver, base_dir: &Path) -> Result<Router> {
        let mut router = Router::new();

        for route in self.routes {
            let mut resource = Resource::new();
            for (method_name, entry) in route.methods {
                let method: HttpMethod = method_name
                    .parse()
                    .map_err(anyhow::Error::msg)
                    .with_context(|| format!("Invalid method for route {}", route.path))?;
                if resource.get(method).is_some() {
                    bail!("Method {} listed more than once for {}", method, route.path);
                }

                let handler = build_handler(method, entry, resolver, base_dir)
                    .with_context(|| format!("Invalid {} handler for {}", method, route.path))?;
                resource = resource.on(method, handler);
            }

            router.add_route(&route.path, resource)?;
        }

        Ok(router)
    }
}

fn build_handler(
    method: HttpMethod,
    entry: MethodEntry,
    resolver: &mut TypeResolver,
    base_dir: &Path,
) -> Result<Handler> {
    let name = entry
        .handler
        .unwrap_or_else(|| format!("on_{}", method.as_str().to_lowercase()));
    let mut handler = Handler::new(name);

    if let Some(doc) = entry.doc {
        handler = handler.doc(doc);
    }
    if let Some(expr) = &entry.request {
        handler = handler.request_type(resolver.resolve_expr(expr)?);
    }
    if let Some(expr) = &entry.response {
        handler = handler.response_type(resolver.resolve_expr(expr)?);
    }

    let request_schema = declared_schema(
        "request",
        entry.request_schema,
        entry.request_schema_file,
        base_dir,
    )?;
    let response_schema = declared_schema(
        "response",
        entry.response_schema,
        entry.response_schema_file,
        base_dir,
    )?;

    if request_schema.is_some() || response_schema.is_some() {
        debug!("Wrapping {} with declared schemas", handler.name());
        handler = Handler::validated(handler, request_schema, response_schema);
    }

    Ok(handler)
}

fn declared_schema(
    kind: &str,
    inline: Option<Value>,
    file: Option<PathBuf>,
    base_dir: &Path,
) -> Result<Option<Value>> {
    match (inline, file) {
        (Some(_), Some(_)) => bail!("both {kind}_schema and {kind}_schema_file are set"),
        (Some(schema), None) => Ok(Some(schema)),
        (None, Some(file)) => load_schema_file(&base_dir.join(file)).map(Some),
        (None, None) => Ok(None),
    }
}

fn load_schema_file(path: &Path) -> Result<Value> {
    debug!("Loading schema file: {}", path.display());
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file: {}", path.display()))?;

    if is_json(path) {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON schema file: {}", path.display()))
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML schema file: {}", path.display()))
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
