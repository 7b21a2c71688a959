use crate::classifier::{Classifier, SCHEMA_REF_PREFIX};
use crate::converter::{converter_to_schema, PathVariable};
use crate::error::Result;
use crate::handler::{Handler, ParamAnnotation};
use crate::registry::SchemaRegistry;
use crate::router::HttpMethod;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// OpenAPI version written into every document
pub const OPENAPI_VERSION: &str = "3.0.3";

/// `$ref` base used by JSON Schema drafts for local definitions
pub const DEFINITIONS_REF_PREFIX: &str = "#/definitions/";

const JSON_CONTENT_TYPE: &str = "application/json";

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API description, empty when not given
    #[serde(default)]
    pub description: String,
    /// API version
    pub version: String,
}

impl Info {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            version: version.into(),
        }
    }
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "Generated API".to_string(),
            description: String::new(),
            version: "1.0.0".to_string(),
        }
    }
}

/// OpenAPI PathItem object - the operations of one path plus its shared parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// Path parameters, shared by every operation on this path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    /// Operations keyed by lowercase HTTP method
    #[serde(flatten)]
    pub operations: BTreeMap<String, Operation>,
}

impl PathItem {
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        self.operations.get(&method.as_str().to_lowercase())
    }

    /// Merge another fragment for the same path into this one.
    ///
    /// Parameters already attached are kept.
    pub fn merge(&mut self, other: PathItem) {
        if self.parameters.is_none() {
            self.parameters = other.parameters;
        }
        self.operations.extend(other.operations);
    }
}

/// OpenAPI Operation object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation description, taken from the handler doc string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Request body
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code
    pub responses: BTreeMap<String, Response>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter location (path, query, header)
    #[serde(rename = "in")]
    pub location: String,
    /// Parameter description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter is required
    pub required: bool,
    /// Parameter schema
    pub schema: Value,
    /// Serialization style
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Request body description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the request body is required
    pub required: bool,
    /// Content types and their schemas
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type
    pub schema: Value,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    pub description: String,
    /// Response content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Schema definitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas: Option<BTreeMap<String, Value>>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    pub info: Info,
    /// API paths
    pub paths: BTreeMap<String, PathItem>,
    /// Components (schemas, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

fn json_content(schema: Value) -> BTreeMap<String, MediaType> {
    let mut content = BTreeMap::new();
    content.insert(JSON_CONTENT_TYPE.to_string(), MediaType { schema });
    content
}

/// Build the path item fragment for one method of one path.
///
/// A schema pair declared on the handler (through any number of wrappers) takes priority;
/// otherwise the payload types of the handler's first two parameters are classified. The
/// path parameters are attached only when `add_parameters` is set and there is at least one.
pub fn build_operation(
    classifier: &mut Classifier,
    registry: &mut SchemaRegistry,
    method: HttpMethod,
    handler: &Handler,
    path_variables: &[PathVariable],
    add_parameters: bool,
) -> Result<PathItem> {
    debug!("Building operation: {} {}", method, handler.name());

    let (request, response) = match handler.declared_schemas() {
        Some(declared) => {
            debug!("Using declared schemas of {}", handler.name());
            (
                declared
                    .request
                    .as_ref()
                    .map(|schema| normalize_declared_schema(schema, registry)),
                declared
                    .response
                    .as_ref()
                    .map(|schema| normalize_declared_schema(schema, registry)),
            )
        }
        None => infer_schemas(classifier, registry, handler),
    };

    let request_body = request.map(|schema| RequestBody {
        description: Some("request".to_string()),
        required: true,
        content: json_content(schema),
    });

    let mut responses = BTreeMap::new();
    if let Some(schema) = response {
        responses.insert(
            "200".to_string(),
            Response {
                description: "Response for HTTP 200".to_string(),
                content: Some(json_content(schema)),
            },
        );
    }

    let operation = Operation {
        description: handler.signature().doc.map(str::to_string),
        request_body,
        responses,
    };

    let mut item = PathItem::default();
    item.operations
        .insert(method.as_str().to_lowercase(), operation);

    if add_parameters {
        let parameters = path_parameters(path_variables)?;
        if !parameters.is_empty() {
            item.parameters = Some(parameters);
        }
    }

    Ok(item)
}

fn infer_schemas(
    classifier: &mut Classifier,
    registry: &mut SchemaRegistry,
    handler: &Handler,
) -> (Option<Value>, Option<Value>) {
    let (first, second) = handler.signature().leading();

    let request = match first {
        Some(ParamAnnotation::TypedRequest(payload)) => {
            Some(classifier.create_schema(registry, payload))
        }
        _ => None,
    };
    let response = match second {
        Some(ParamAnnotation::TypedResponse(payload)) => {
            Some(classifier.create_schema(registry, payload))
        }
        _ => None,
    };

    (request, response)
}

/// Build one path parameter per route variable
pub fn path_parameters(path_variables: &[PathVariable]) -> Result<Vec<Parameter>> {
    path_variables
        .iter()
        .map(|variable| {
            Ok(Parameter {
                name: variable.name.clone(),
                location: "path".to_string(),
                description: Some(variable.name.clone()),
                required: true,
                schema: converter_to_schema(variable.converter.as_ref())?,
                style: Some("simple".to_string()),
            })
        })
        .collect()
}

/// Rewrite a declared JSON Schema to component references.
///
/// Every `#/definitions/` reference becomes `#/components/schemas/`, and the top-level
/// `definitions` map is moved into the registry, leaving a reference-only body.
pub fn normalize_declared_schema(schema: &Value, registry: &mut SchemaRegistry) -> Value {
    let mut normalized = rewrite_refs(schema);

    if let Value::Object(body) = &mut normalized {
        if let Some(Value::Object(definitions)) = body.remove("definitions") {
            debug!("Lifting {} declared definitions", definitions.len());
            registry.merge(definitions);
        }
    }

    normalized
}

fn rewrite_refs(value: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(rewrite_ref_text(text)),
        Value::Array(items) => Value::Array(items.iter().map(rewrite_refs).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (rewrite_ref_text(key), rewrite_refs(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn rewrite_ref_text(text: &str) -> String {
    text.replace(DEFINITIONS_REF_PREFIX, SCHEMA_REF_PREFIX)
}

/// Wrap paths and registered schemas into the final document.
///
/// `components` is present only when at least one schema was registered.
pub fn assemble(
    info: Info,
    paths: BTreeMap<String, PathItem>,
    registry: SchemaRegistry,
) -> OpenApiDocument {
    debug!("Assembling OpenAPI document with {} paths", paths.len());

    let components = if registry.is_empty() {
        None
    } else {
        Some(Components {
            schemas: Some(registry.into_inner()),
        })
    };

    OpenApiDocument {
        openapi: OPENAPI_VERSION.to_string(),
        info,
        paths,
        components,
    }
}
