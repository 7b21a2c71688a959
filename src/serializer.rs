//! Serialization of OpenAPI documents to YAML or JSON.

use crate::openapi_builder::OpenApiDocument;
use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serializes an OpenAPI document to YAML format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize OpenAPI document to YAML")
}

/// Serializes an OpenAPI document to pretty-printed JSON with two-space indentation.
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize OpenAPI document to JSON")
}

/// Serializes an OpenAPI document to JSON indented by `indent` spaces.
///
/// # Example
///
/// ```
/// use openapi_from_routes::openapi_builder::{assemble, Info};
/// use openapi_from_routes::registry::SchemaRegistry;
/// use openapi_from_routes::serializer::serialize_json_indented;
/// use std::collections::BTreeMap;
///
/// let doc = assemble(Info::new("foo", "bar", "0.1.0"), BTreeMap::new(), SchemaRegistry::new());
/// let json = serialize_json_indented(&doc, 4).unwrap();
/// assert!(json.contains("\n    \"openapi\": \"3.0.3\""));
/// ```
pub fn serialize_json_indented(doc: &OpenApiDocument, indent: usize) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON with indent {}", indent);

    let indent = " ".repeat(indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    doc.serialize(&mut serializer)
        .context("Failed to serialize OpenAPI document to JSON")?;

    String::from_utf8(buffer).context("Serialized JSON is not valid UTF-8")
}

/// Writes string content to a file, creating parent directories as needed.
///
/// Overwrites the file if it exists.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
