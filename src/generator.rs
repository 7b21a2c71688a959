//! Entry points: generate a document from a route tree, or register it with a router.

use crate::classifier::Classifier;
use crate::error::{Error, Result};
use crate::openapi_builder::{assemble, Info, OpenApiDocument};
use crate::router::{RouteSource, Router};
use crate::serializer::{serialize_json_indented, write_to_file};
use crate::walker::{walk, RunContext};
use anyhow::Context;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the generated document inside the static directory
pub const SWAGGER_FILE_NAME: &str = "swagger.json";

/// Page served when no other static file matches
pub const INDEX_FILE_NAME: &str = "index.html";

/// Default prefix the documentation is served under
pub const DEFAULT_URL_PREFIX: &str = "/api/docs/";

/// Indentation used for the written document
pub const SWAGGER_INDENT: usize = 4;

const SWAGGER_UI_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8" />
    <title>API documentation</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js" crossorigin></script>
    <script>
        window.onload = () => {
            window.ui = SwaggerUIBundle({
                url: "swagger.json",
                dom_id: "#swagger-ui",
            });
        };
    </script>
</body>
</html>
"##;

/// Generates OpenAPI documents from route trees.
///
/// The classifier cache is kept between runs; the schema registry and paths are not.
#[derive(Debug, Default)]
pub struct SwaggerGenerator {
    classifier: Classifier,
}

impl SwaggerGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            classifier: Classifier::with_capacity(capacity),
        }
    }

    /// Walk every root of `source` and assemble the document.
    ///
    /// Fails with [`Error::UnsupportedRouter`] when the source does not expose a route tree.
    pub fn generate<S: RouteSource>(&mut self, source: &S, info: &Info) -> Result<OpenApiDocument> {
        let roots = source
            .route_roots()
            .ok_or_else(|| Error::UnsupportedRouter(std::any::type_name::<S>().to_string()))?;

        info!("Generating OpenAPI document from {} root routes", roots.len());

        let mut context = RunContext::new();
        for root in roots {
            walk(root, &mut self.classifier, &mut context, &[], &[])?;
        }

        debug!(
            "Generated {} paths and {} schemas",
            context.paths.len(),
            context.registry.len()
        );
        Ok(assemble(info.clone(), context.paths, context.registry))
    }

    /// Write `swagger.json` into `static_dir` and serve that directory at `url_prefix`.
    ///
    /// A Swagger UI `index.html` is written alongside unless one already exists, and is
    /// used as the static route's fallback. Returns the path of the written document.
    pub fn register(
        &mut self,
        router: &mut Router,
        info: &Info,
        static_dir: &Path,
        url_prefix: &str,
    ) -> anyhow::Result<PathBuf> {
        let static_dir = if static_dir.is_absolute() {
            static_dir.to_path_buf()
        } else {
            std::env::current_dir()
                .context("Failed to resolve current directory")?
                .join(static_dir)
        };

        let document = self
            .generate(router, info)
            .context("Failed to generate OpenAPI document")?;

        let swagger_path = static_dir.join(SWAGGER_FILE_NAME);
        let json = serialize_json_indented(&document, SWAGGER_INDENT)?;
        write_to_file(&json, &swagger_path)?;
        info!("Wrote {}", swagger_path.display());

        let index_path = static_dir.join(INDEX_FILE_NAME);
        if !index_path.exists() {
            fs::write(&index_path, SWAGGER_UI_PAGE)
                .with_context(|| format!("Failed to write {}", index_path.display()))?;
            debug!("Wrote Swagger UI page to {}", index_path.display());
        }

        router
            .add_static_route(url_prefix, &static_dir, Some(INDEX_FILE_NAME))
            .context("Failed to add documentation route")?;

        Ok(swagger_path)
    }
}

/// Generate a document with a fresh generator
pub fn generate_swagger<S: RouteSource>(source: &S, info: &Info) -> Result<OpenApiDocument> {
    SwaggerGenerator::new().generate(source, info)
}

/// Register the documentation of `router` with a fresh generator.
///
/// See [`SwaggerGenerator::register`].
pub fn register_swagger(
    router: &mut Router,
    info: &Info,
    static_dir: &Path,
    url_prefix: &str,
) -> anyhow::Result<PathBuf> {
    SwaggerGenerator::new().register(router, info, static_dir, url_prefix)
}
