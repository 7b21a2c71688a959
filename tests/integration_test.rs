use openapi_from_routes::{
    generate_swagger,
    handler::Handler,
    manifest::Manifest,
    openapi_builder::Info,
    parser::AstParser,
    register_swagger,
    router::{HttpMethod, Resource, RouteNode, RouteSource, Router, Segment},
    scanner::FileScanner,
    serializer::{serialize_json, serialize_yaml},
    type_resolver::TypeResolver,
    Error, SwaggerGenerator,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(path: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(path)
}

fn req_schema() -> Value {
    serde_json::from_str(include_str!("fixtures/app/schemas/req_schema.json")).unwrap()
}

/// `/res`, `/res/{id}` and `/res/{id}/foo/{id2:int}` served by one resource's responders
fn res_router() -> Router {
    let mut router = Router::new();
    router
        .add_route(
            "/res",
            Resource::new()
                .on(
                    HttpMethod::Get,
                    Handler::new("on_get").doc("GET").request::<i32>(),
                )
                .on(
                    HttpMethod::Post,
                    Handler::validated(
                        Handler::new("on_post").doc("POST"),
                        Some(req_schema()),
                        Some(req_schema()),
                    ),
                ),
        )
        .unwrap();
    router
        .add_route(
            "/res/{id}",
            Resource::new().on(HttpMethod::Get, Handler::new("on_get_id").doc("GET ID")),
        )
        .unwrap();
    router
        .add_route(
            "/res/{id}/foo/{id2:int}",
            Resource::new().on(HttpMethod::Get, Handler::new("on_get_id2").doc("GET ID2")),
        )
        .unwrap();
    router
}

fn path_param(name: &str, schema: Value) -> Value {
    json!({
        "name": name,
        "in": "path",
        "description": name,
        "required": true,
        "schema": schema,
        "style": "simple"
    })
}

#[test]
fn test_end_to_end_document() {
    let doc = generate_swagger(&res_router(), &Info::new("foo", "bar", "0.1.0")).unwrap();
    let actual = serde_json::to_value(&doc).unwrap();

    let declared = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "item": {"$ref": "#/components/schemas/Item"},
            "count": {"type": "integer"}
        },
        "required": ["item"]
    });

    let expected = json!({
        "openapi": "3.0.3",
        "info": {"title": "foo", "description": "bar", "version": "0.1.0"},
        "paths": {
            "/res": {
                "get": {
                    "description": "GET",
                    "requestBody": {
                        "description": "request",
                        "required": true,
                        "content": {"application/json": {"schema": {"type": "integer"}}}
                    },
                    "responses": {}
                },
                "post": {
                    "description": "POST",
                    "requestBody": {
                        "description": "request",
                        "required": true,
                        "content": {"application/json": {"schema": declared}}
                    },
                    "responses": {
                        "200": {
                            "description": "Response for HTTP 200",
                            "content": {"application/json": {"schema": declared}}
                        }
                    }
                }
            },
            "/res/{id}": {
                "parameters": [path_param("id", json!({"type": "string"}))],
                "get": {"description": "GET ID", "responses": {}}
            },
            "/res/{id}/foo/{id2}": {
                "parameters": [
                    path_param("id", json!({"type": "string"})),
                    path_param("id2", json!({"type": "integer"}))
                ],
                "get": {"description": "GET ID2", "responses": {}}
            }
        },
        "components": {
            "schemas": {
                "Item": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "tags": {
                            "type": "array",
                            "items": {"$ref": "#/components/schemas/Tag"}
                        }
                    }
                },
                "Tag": {"type": "string"}
            }
        }
    });

    assert_eq!(actual, expected);
}

#[test]
fn test_no_definitions_reference_survives() {
    let doc = generate_swagger(&res_router(), &Info::default()).unwrap();
    let json = serialize_json(&doc).unwrap();

    assert!(!json.contains("#/definitions/"));
    assert!(!json.contains("\"definitions\""));
}

#[test]
fn test_repeated_generation_is_identical() {
    let router = res_router();
    let info = Info::default();
    let mut generator = SwaggerGenerator::new();

    let first = generator.generate(&router, &info).unwrap();
    let second = generator.generate(&router, &info).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serialize_yaml(&first).unwrap(),
        serialize_yaml(&second).unwrap()
    );
}

#[test]
fn test_datetime_format_fails_generation() {
    let mut router = Router::new();
    router
        .add_route(
            r#"/logs/{day:dt("%Y-%m-%d")}"#,
            Resource::new().on(HttpMethod::Get, Handler::new("on_get")),
        )
        .unwrap();

    let err = generate_swagger(&router, &Info::default()).unwrap_err();
    match err {
        Error::UnsupportedFormat { converter, format } => {
            assert_eq!(converter, "dt");
            assert_eq!(format, "%Y-%m-%d");
        }
        other => panic!("Expected UnsupportedFormat, got {:?}", other),
    }
}

/// A route tree kept outside [`Router`]
struct FlatNode {
    segment: &'static str,
    handlers: Vec<(HttpMethod, Handler)>,
}

impl RouteNode for FlatNode {
    fn segment(&self) -> Segment<'_> {
        Segment::Literal(self.segment)
    }

    fn handlers(&self) -> &[(HttpMethod, Handler)] {
        &self.handlers
    }

    fn children(&self) -> &[FlatNode] {
        &[]
    }
}

struct FlatRoutes(Vec<FlatNode>);

impl RouteSource for FlatRoutes {
    type Node = FlatNode;

    fn route_roots(&self) -> Option<&[FlatNode]> {
        Some(&self.0)
    }
}

#[test]
fn test_custom_route_source() {
    let routes = FlatRoutes(vec![
        FlatNode {
            segment: "status",
            handlers: vec![
                (HttpMethod::Get, Handler::new("status").response::<Vec<u32>>()),
                (HttpMethod::Trace, Handler::new("trace")),
            ],
        },
        FlatNode {
            segment: "metrics",
            handlers: vec![(HttpMethod::Get, Handler::method_not_allowed())],
        },
    ]);

    let doc = generate_swagger(&routes, &Info::default()).unwrap();

    assert_eq!(doc.paths.keys().collect::<Vec<_>>(), vec!["/metrics", "/status"]);
    assert!(doc.paths["/metrics"].operations.is_empty());
    assert_eq!(doc.paths["/status"].operations.len(), 1);
    let schemas = doc.components.unwrap().schemas.unwrap();
    assert_eq!(
        schemas["ArrayOfU32"],
        json!({"type": "array", "items": {"type": "integer"}})
    );
}

#[test]
fn test_manifest_with_rust_sources() {
    let scan_result = FileScanner::new(fixture("app/src")).scan().unwrap();
    assert_eq!(scan_result.rust_files.len(), 2);

    let parsed_files = AstParser::parse_files(&scan_result.rust_files);
    let mut resolver = TypeResolver::new(parsed_files);

    let manifest = Manifest::from_path(&fixture("app/routes.yaml")).unwrap();
    let info = manifest.info.clone().unwrap();
    let router = manifest
        .into_router(&mut resolver, &fixture("app"))
        .unwrap();

    let doc = generate_swagger(&router, &info).unwrap();
    let actual = serde_json::to_value(&doc).unwrap();

    assert_eq!(actual["info"], json!({"title": "Users", "description": "User service", "version": "1.2.0"}));
    assert_eq!(
        actual["paths"].as_object().unwrap().keys().collect::<Vec<_>>(),
        vec!["/events/{day}", "/health", "/users", "/users/{id}"]
    );
    assert_eq!(actual["paths"]["/health"], json!({}));

    let users = &actual["paths"]["/users"];
    assert_eq!(users["get"]["description"], "List users");
    assert_eq!(
        users["get"]["responses"]["200"]["content"]["application/json"]["schema"],
        json!({"$ref": "#/components/schemas/ArrayOfUser"})
    );
    assert_eq!(
        users["post"]["requestBody"]["content"]["application/json"]["schema"],
        json!({"$ref": "#/components/schemas/CreateUser"})
    );
    assert!(users.get("parameters").is_none());

    let user = &actual["paths"]["/users/{id}"];
    assert_eq!(user["parameters"], json!([path_param("id", json!({"type": "integer"}))]));
    assert_eq!(
        user["put"]["requestBody"]["content"]["application/json"]["schema"]["properties"]["item"],
        json!({"$ref": "#/components/schemas/Item"})
    );
    assert_eq!(user["put"]["responses"], json!({}));

    let events = &actual["paths"]["/events/{day}"];
    assert_eq!(
        events["parameters"][0]["schema"],
        json!({"type": "string", "format": "date-time"})
    );
    assert!(events["get"].get("description").is_none());

    let schemas = &actual["components"]["schemas"];
    assert_eq!(
        schemas.as_object().unwrap().keys().collect::<Vec<_>>(),
        vec!["ArrayOfF64", "ArrayOfUser", "CreateUser", "Item", "Tag", "User"]
    );
    assert_eq!(
        schemas["User"],
        json!({
            "type": "object",
            "properties": {
                "userId": {"type": "integer"},
                "displayName": {"type": "integer"}
            }
        })
    );
    assert_eq!(
        schemas["CreateUser"],
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "integer"},
                "age": {"type": "integer"}
            }
        })
    );
    assert_eq!(
        schemas["ArrayOfUser"],
        json!({"type": "array", "items": {"$ref": "#/components/schemas/User"}})
    );
    assert_eq!(
        schemas["ArrayOfF64"],
        json!({"type": "array", "items": {"type": "number"}})
    );
}

#[test]
fn test_register_swagger_bundle() {
    let temp_dir = TempDir::new().unwrap();
    let static_dir = temp_dir.path().join("static");
    let mut router = res_router();

    let swagger_path = register_swagger(
        &mut router,
        &Info::new("foo", "bar", "0.1.0"),
        &static_dir,
        "/api/docs/",
    )
    .unwrap();

    let content = std::fs::read_to_string(&swagger_path).unwrap();
    assert!(content.starts_with("{\n    \"openapi\": \"3.0.3\""));

    let written: Value = serde_json::from_str(&content).unwrap();
    let expected = serde_json::to_value(
        generate_swagger(&res_router(), &Info::new("foo", "bar", "0.1.0")).unwrap(),
    )
    .unwrap();
    assert_eq!(written, expected);

    let index = std::fs::read_to_string(static_dir.join("index.html")).unwrap();
    assert!(index.contains("swagger.json"));

    assert_eq!(router.static_routes().len(), 1);
    assert_eq!(router.static_routes()[0].prefix, "/api/docs/");
}
