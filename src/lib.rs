//! OpenAPI 3.0 documents from an application's route tree.
//!
//! The generator walks a compiled route tree depth-first. For every node it documents the
//! implemented `GET`, `POST`, `PUT`, `DELETE` and `PATCH` responders: path parameters come from
//! the route variables and their converters, and request/response body schemas come either
//! from JSON Schemas declared on a validation wrapper or from the payload types of the
//! handler's first two parameters. Named object and array schemas are collected into
//! `components.schemas` and referenced with `$ref`.
//!
//! # Architecture
//!
//! 1. [`descriptor`] - structural type descriptors and the [`descriptor::Describe`] trait
//! 2. [`classifier`] - maps descriptors to schema fragments, with a bounded cache
//! 3. [`converter`] - path variable converters and their parameter schemas
//! 4. [`handler`] / [`router`] - handlers, wrappers and the route tree
//! 5. [`openapi_builder`] - operations, declared schema normalization, document assembly
//! 6. [`walker`] / [`generator`] - tree traversal and the public entry points
//! 7. [`manifest`], [`scanner`], [`parser`], [`type_resolver`] - describing an application
//!    from a manifest and the Rust sources of its payload types
//! 8. [`serializer`] - YAML and JSON output
//!
//! # Example
//!
//! ```
//! use openapi_from_routes::descriptor::{Describe, TypeDescriptor};
//! use openapi_from_routes::generator::generate_swagger;
//! use openapi_from_routes::handler::Handler;
//! use openapi_from_routes::openapi_builder::Info;
//! use openapi_from_routes::router::{HttpMethod, Resource, Router};
//!
//! let user = TypeDescriptor::record("User").required("id", u64::describe()).build();
//!
//! let mut router = Router::new();
//! router
//!     .add_route(
//!         "/users/{id:int}",
//!         Resource::new().on(HttpMethod::Get, Handler::new("on_get").response_type(user)),
//!     )
//!     .unwrap();
//!
//! let doc = generate_swagger(&router, &Info::new("Users", "User service", "1.0.0")).unwrap();
//! assert!(doc.paths.contains_key("/users/{id}"));
//! assert!(doc.components.unwrap().schemas.unwrap().contains_key("User"));
//! ```

pub mod classifier;
pub mod cli;
pub mod converter;
pub mod descriptor;
pub mod error;
pub mod generator;
pub mod handler;
pub mod manifest;
pub mod openapi_builder;
pub mod parser;
pub mod registry;
pub mod router;
pub mod scanner;
pub mod serializer;
pub mod type_resolver;
pub mod walker;

pub use error::{Error, Result};
pub use generator::{generate_swagger, register_swagger, SwaggerGenerator};
