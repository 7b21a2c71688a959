//! Route handlers as seen by the generator.
//!
//! A [`Handler`] carries what the generator needs to know about a responder: its name, its doc
//! string and the type annotations of its leading parameters. Handlers can be wrapped by other
//! layers; each wrapper links to the handler it wraps, and a validation wrapper additionally
//! declares a JSON Schema pair for the request and response bodies.
//!
//! ```
//! use openapi_from_routes::handler::Handler;
//! use serde_json::json;
//!
//! let on_post = Handler::new("on_post").doc("Create a thing").request::<Vec<i64>>();
//! let validated = Handler::validated(on_post, Some(json!({"type": "object"})), None);
//!
//! assert_eq!(validated.name(), "on_post");
//! assert!(validated.declared_schemas().is_some());
//! ```

use crate::descriptor::{Describe, TypeDescriptor};
use serde_json::Value;
use std::sync::Arc;

/// Type annotation of one handler parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamAnnotation {
    /// A request carrying a typed JSON payload
    TypedRequest(TypeDescriptor),
    /// A response carrying a typed JSON payload
    TypedResponse(TypeDescriptor),
    /// Anything the generator cannot read a payload type from
    Untyped,
}

/// Which kind of responder a handler is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Responder {
    /// Registered by the application
    User,
    /// Installed by the router for methods a resource does not implement
    MethodNotAllowed,
    /// Installed by the router to answer `OPTIONS`
    DefaultOptions,
}

/// JSON Schemas declared on a handler by a validation wrapper
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclaredSchemas {
    pub request: Option<Value>,
    pub response: Option<Value>,
}

impl DeclaredSchemas {
    fn is_empty(&self) -> bool {
        self.request.is_none() && self.response.is_none()
    }
}

/// The doc string and parameter annotations of a handler
#[derive(Debug, Clone, Copy)]
pub struct Signature<'a> {
    pub params: &'a [ParamAnnotation],
    pub doc: Option<&'a str>,
}

impl<'a> Signature<'a> {
    /// The first two parameters: the request slot and the response slot
    pub fn leading(&self) -> (Option<&'a ParamAnnotation>, Option<&'a ParamAnnotation>) {
        (self.params.first(), self.params.get(1))
    }
}

/// A responder bound to a route, possibly wrapped by a validation layer
#[derive(Debug, Clone)]
pub struct Handler {
    name: String,
    doc: Option<String>,
    params: Vec<ParamAnnotation>,
    responder: Responder,
    declared: Option<DeclaredSchemas>,
    inner: Option<Arc<Handler>>,
}

impl Handler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
            responder: Responder::User,
            declared: None,
            inner: None,
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Append a parameter annotation
    pub fn param(mut self, annotation: ParamAnnotation) -> Self {
        self.params.push(annotation);
        self
    }

    /// Annotate the first parameter as a request with payload `T`
    pub fn request<T: Describe + ?Sized>(self) -> Self {
        self.request_type(T::describe())
    }

    /// Annotate the second parameter as a response with payload `T`
    pub fn response<T: Describe + ?Sized>(self) -> Self {
        self.response_type(T::describe())
    }

    pub fn request_type(self, payload: TypeDescriptor) -> Self {
        self.set_param(0, ParamAnnotation::TypedRequest(payload))
    }

    pub fn response_type(self, payload: TypeDescriptor) -> Self {
        self.set_param(1, ParamAnnotation::TypedResponse(payload))
    }

    fn set_param(mut self, index: usize, annotation: ParamAnnotation) -> Self {
        while self.params.len() <= index {
            self.params.push(ParamAnnotation::Untyped);
        }
        self.params[index] = annotation;
        self
    }

    /// Wrap `inner` with a validation layer declaring request/response schemas
    pub fn validated(inner: Handler, request: Option<Value>, response: Option<Value>) -> Self {
        let mut wrapper = Self::wrapped(inner);
        wrapper.declared = Some(DeclaredSchemas { request, response });
        wrapper
    }

    /// Wrap `inner` with a transparent layer
    pub fn wrapped(inner: Handler) -> Self {
        Self {
            name: inner.name.clone(),
            doc: inner.doc.clone(),
            params: Vec::new(),
            responder: inner.responder,
            declared: None,
            inner: Some(Arc::new(inner)),
        }
    }

    pub fn method_not_allowed() -> Self {
        let mut handler = Self::new("method_not_allowed");
        handler.responder = Responder::MethodNotAllowed;
        handler
    }

    pub fn default_options() -> Self {
        let mut handler = Self::new("on_options");
        handler.responder = Responder::DefaultOptions;
        handler
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn responder(&self) -> Responder {
        self.innermost().responder
    }

    pub fn is_method_not_allowed(&self) -> bool {
        self.responder() == Responder::MethodNotAllowed
    }

    /// The handler this layer wraps, if any
    pub fn unwraps_to(&self) -> Option<&Handler> {
        self.inner.as_deref()
    }

    /// This handler followed by every layer it wraps, outermost first
    pub fn layers(&self) -> impl Iterator<Item = &Handler> {
        std::iter::successors(Some(self), |handler| handler.unwraps_to())
    }

    pub fn innermost(&self) -> &Handler {
        let mut current = self;
        while let Some(inner) = current.unwraps_to() {
            current = inner;
        }
        current
    }

    /// Find the first layer that declares at least one schema
    pub fn declared_schemas(&self) -> Option<&DeclaredSchemas> {
        self.layers()
            .find_map(|layer| layer.declared.as_ref().filter(|declared| !declared.is_empty()))
    }

    /// Parameter annotations and doc string of the wrapped function
    pub fn signature(&self) -> Signature<'_> {
        let inner = self.innermost();
        Signature {
            params: &inner.params,
            doc: inner.doc.as_deref(),
        }
    }
}
