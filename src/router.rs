//! Route tree input for the generator.
//!
//! The walker only needs the read-only view described by [`RouteSource`] and [`RouteNode`].
//! [`Router`] is a concrete implementation that compiles URI templates into a tree of
//! literal and variable segments, in the style of a compiled HTTP router:
//!
//! ```
//! use openapi_from_routes::handler::Handler;
//! use openapi_from_routes::router::{HttpMethod, Resource, Router};
//!
//! let mut router = Router::new();
//! router
//!     .add_route("/res/{id}/foo/{id2:int}", Resource::new().on(HttpMethod::Get, Handler::new("on_get")))
//!     .unwrap();
//! assert_eq!(router.roots().len(), 1);
//! ```

use crate::converter::Converter;
use crate::error::{Error, Result};
use crate::handler::Handler;
use log::debug;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// HTTP methods a router can dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Connect,
    Trace,
}

impl HttpMethod {
    /// Every method, in the order a node's method map lists them
    pub const ALL: [HttpMethod; 9] = [
        HttpMethod::Get,
        HttpMethod::Head,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Options,
        HttpMethod::Connect,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Whether operations for this method appear in the generated document
    pub fn is_documented(&self) -> bool {
        matches!(
            self,
            HttpMethod::Get
                | HttpMethod::Post
                | HttpMethod::Put
                | HttpMethod::Delete
                | HttpMethod::Patch
        )
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown HTTP method '{}'", s))
    }
}

/// What a route node matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Variable {
        name: &'a str,
        converter: Option<&'a Converter>,
    },
}

/// Read-only view of one node in a route tree
pub trait RouteNode {
    fn segment(&self) -> Segment<'_>;

    /// Method handlers in dispatch-table order
    fn handlers(&self) -> &[(HttpMethod, Handler)];

    fn children(&self) -> &[Self]
    where
        Self: Sized;
}

/// Something that exposes a route tree
pub trait RouteSource {
    type Node: RouteNode;

    /// The root nodes, or `None` if this source does not keep a walkable tree
    fn route_roots(&self) -> Option<&[Self::Node]>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeKind {
    Literal(String),
    Variable {
        name: String,
        converter: Option<Converter>,
    },
}

/// A compiled route tree node
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    handlers: Vec<(HttpMethod, Handler)>,
    children: Vec<Node>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            handlers: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl RouteNode for Node {
    fn segment(&self) -> Segment<'_> {
        match &self.kind {
            NodeKind::Literal(text) => Segment::Literal(text),
            NodeKind::Variable { name, converter } => Segment::Variable {
                name,
                converter: converter.as_ref(),
            },
        }
    }

    fn handlers(&self) -> &[(HttpMethod, Handler)] {
        &self.handlers
    }

    fn children(&self) -> &[Node] {
        &self.children
    }
}

/// The responders a resource implements, keyed by method
#[derive(Debug, Clone, Default)]
pub struct Resource {
    responders: BTreeMap<HttpMethod, Handler>,
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, method: HttpMethod, handler: Handler) -> Self {
        self.responders.insert(method, handler);
        self
    }

    pub fn get(&self, method: HttpMethod) -> Option<&Handler> {
        self.responders.get(&method)
    }

    pub fn is_empty(&self) -> bool {
        self.responders.is_empty()
    }
}

/// A static route serving files from a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRoute {
    pub prefix: String,
    pub directory: PathBuf,
    pub fallback_filename: Option<String>,
}

/// A router compiling URI templates into a tree
#[derive(Debug, Default)]
pub struct Router {
    roots: Vec<Node>,
    static_routes: Vec<StaticRoute>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route for `template`, e.g. `/users/{id:int}/posts`.
    ///
    /// Methods the resource does not implement are answered by the built-in
    /// method-not-allowed responder, and `OPTIONS` by the default options responder.
    /// Adding the same template again replaces its handlers.
    pub fn add_route(&mut self, template: &str, resource: Resource) -> Result<()> {
        debug!("Adding route: {}", template);

        if resource.is_empty() {
            return Err(invalid_route(template, "resource has no responders"));
        }

        let segments = parse_template(template)?;
        let handlers = method_map(resource);
        insert(&mut self.roots, &segments, handlers, template)
    }

    /// Serve files under `directory` at `prefix`, falling back to `fallback_filename`.
    ///
    /// A static route with the same prefix is replaced.
    pub fn add_static_route(
        &mut self,
        prefix: &str,
        directory: impl Into<PathBuf>,
        fallback_filename: Option<&str>,
    ) -> Result<()> {
        if !prefix.starts_with('/') {
            return Err(invalid_route(prefix, "static route prefix must start with '/'"));
        }

        let mut prefix = prefix.to_string();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }

        debug!("Adding static route: {}", prefix);
        self.static_routes.retain(|route| route.prefix != prefix);
        self.static_routes.push(StaticRoute {
            prefix,
            directory: directory.into(),
            fallback_filename: fallback_filename.map(str::to_string),
        });
        Ok(())
    }

    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    pub fn static_routes(&self) -> &[StaticRoute] {
        &self.static_routes
    }
}

impl RouteSource for Router {
    type Node = Node;

    fn route_roots(&self) -> Option<&[Node]> {
        Some(&self.roots)
    }
}

fn invalid_route(template: &str, message: impl Into<String>) -> Error {
    Error::InvalidRoute {
        template: template.to_string(),
        message: message.into(),
    }
}

fn method_map(resource: Resource) -> Vec<(HttpMethod, Handler)> {
    let mut responders = resource.responders;
    HttpMethod::ALL
        .into_iter()
        .map(|method| {
            let handler = responders.remove(&method).unwrap_or_else(|| match method {
                HttpMethod::Options => Handler::default_options(),
                _ => Handler::method_not_allowed(),
            });
            (method, handler)
        })
        .collect()
}

fn insert(
    nodes: &mut Vec<Node>,
    segments: &[NodeKind],
    handlers: Vec<(HttpMethod, Handler)>,
    template: &str,
) -> Result<()> {
    let Some((kind, rest)) = segments.split_first() else {
        return Ok(());
    };

    let index = match find_child(nodes, kind, template)? {
        Some(index) => index,
        None => {
            nodes.push(Node::new(kind.clone()));
            nodes.len() - 1
        }
    };

    let node = &mut nodes[index];
    if rest.is_empty() {
        node.handlers = handlers;
        Ok(())
    } else {
        insert(&mut node.children, rest, handlers, template)
    }
}

fn find_child(nodes: &[Node], kind: &NodeKind, template: &str) -> Result<Option<usize>> {
    for (index, node) in nodes.iter().enumerate() {
        if &node.kind == kind {
            return Ok(Some(index));
        }
        if let (NodeKind::Variable { name: existing, .. }, NodeKind::Variable { name, .. }) =
            (&node.kind, kind)
        {
            return Err(invalid_route(
                template,
                format!("variable '{}' conflicts with existing variable '{}'", name, existing),
            ));
        }
    }
    Ok(None)
}

fn parse_template(template: &str) -> Result<Vec<NodeKind>> {
    let Some(body) = template.strip_prefix('/') else {
        return Err(invalid_route(template, "template must start with '/'"));
    };

    let body = body.trim_end_matches('/');
    if body.is_empty() {
        return Ok(vec![NodeKind::Literal(String::new())]);
    }

    let segments = body
        .split('/')
        .map(|segment| parse_segment(segment, template))
        .collect::<Result<Vec<_>>>()?;

    let mut seen = HashSet::new();
    for segment in &segments {
        if let NodeKind::Variable { name, .. } = segment {
            if !seen.insert(name.as_str()) {
                return Err(invalid_route(
                    template,
                    format!("variable '{}' is used more than once", name),
                ));
            }
        }
    }

    Ok(segments)
}

fn parse_segment(segment: &str, template: &str) -> Result<NodeKind> {
    if segment.is_empty() {
        return Err(invalid_route(template, "empty path segment"));
    }

    if let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        let (name, converter) = match inner.split_once(':') {
            Some((name, spec)) => (name.trim(), Some(spec)),
            None => (inner.trim(), None),
        };

        let valid_name = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_name {
            return Err(invalid_route(
                template,
                format!("invalid variable name '{}'", name),
            ));
        }

        let converter = converter
            .map(Converter::parse)
            .transpose()
            .map_err(|message| invalid_route(template, message))?;

        return Ok(NodeKind::Variable {
            name: name.to_string(),
            converter,
        });
    }

    if segment.contains('{') || segment.contains('}') {
        return Err(invalid_route(
            template,
            format!("segment '{}' mixes literal text and variables", segment),
        ));
    }

    Ok(NodeKind::Literal(segment.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConverterArg;

    fn get(name: &str) -> Resource {
        Resource::new().on(HttpMethod::Get, Handler::new(name))
    }

    fn literal(node: &Node) -> &str {
        match node.segment() {
            Segment::Literal(text) => text,
            other => panic!("Expected literal segment, got {:?}", other),
        }
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("get".parse::<HttpMethod>(), Ok(HttpMethod::Get));
        assert_eq!("PATCH".parse::<HttpMethod>(), Ok(HttpMethod::Patch));
        assert!("FETCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_documented_methods() {
        let documented: Vec<_> = HttpMethod::ALL
            .into_iter()
            .filter(HttpMethod::is_documented)
            .collect();
        assert_eq!(
            documented,
            vec![
                HttpMethod::Get,
                HttpMethod::Post,
                HttpMethod::Put,
                HttpMethod::Delete,
                HttpMethod::Patch
            ]
        );
    }

    #[test]
    fn test_routes_share_prefix_nodes() {
        let mut router = Router::new();
        router.add_route("/res", get("on_get")).unwrap();
        router.add_route("/res/{id}", get("on_get_id")).unwrap();
        router.add_route("/res/{id}/foo/{id2:int}", get("on_get_id2")).unwrap();

        assert_eq!(router.roots().len(), 1);
        let res = &router.roots()[0];
        assert_eq!(literal(res), "res");
        assert_eq!(res.children().len(), 1);

        let id = &res.children()[0];
        assert_eq!(
            id.segment(),
            Segment::Variable {
                name: "id",
                converter: None
            }
        );

        let foo = &id.children()[0];
        assert_eq!(literal(foo), "foo");
        assert!(foo.handlers().is_empty());

        let id2 = &foo.children()[0];
        match id2.segment() {
            Segment::Variable { name, converter } => {
                assert_eq!(name, "id2");
                assert_eq!(converter, Some(&Converter::new("int")));
            }
            other => panic!("Expected variable segment, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_methods_are_filled() {
        let mut router = Router::new();
        router.add_route("/res", get("on_get")).unwrap();

        let handlers = router.roots()[0].handlers();
        assert_eq!(handlers.len(), HttpMethod::ALL.len());

        for (method, handler) in handlers {
            match method {
                HttpMethod::Get => assert_eq!(handler.name(), "on_get"),
                HttpMethod::Options => assert_eq!(handler.name(), "on_options"),
                _ => assert!(handler.is_method_not_allowed()),
            }
        }
    }

    #[test]
    fn test_root_template() {
        let mut router = Router::new();
        router.add_route("/", get("on_get")).unwrap();
        assert_eq!(literal(&router.roots()[0]), "");
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let mut router = Router::new();
        router.add_route("/res/", get("a")).unwrap();
        router.add_route("/res", get("b")).unwrap();

        assert_eq!(router.roots().len(), 1);
        assert_eq!(router.roots()[0].handlers()[0].1.name(), "b");
    }

    #[test]
    fn test_converter_arguments_are_kept() {
        let mut router = Router::new();
        router
            .add_route(r#"/logs/{day:dt("%Y-%m-%d")}"#, get("on_get"))
            .unwrap();

        let day = &router.roots()[0].children()[0];
        match day.segment() {
            Segment::Variable { converter, .. } => {
                let converter = converter.unwrap();
                assert_eq!(converter.name, "dt");
                assert_eq!(
                    converter.args,
                    vec![ConverterArg::Positional("%Y-%m-%d".to_string())]
                );
            }
            other => panic!("Expected variable segment, got {:?}", other),
        }
    }

    #[test]
    fn test_conflicting_variable_names() {
        let mut router = Router::new();
        router.add_route("/res/{id}", get("a")).unwrap();
        let err = router.add_route("/res/{name}", get("b")).unwrap_err();
        assert!(matches!(err, Error::InvalidRoute { .. }));
        assert!(err.to_string().contains("conflicts"));
    }

    #[test]
    fn test_literal_and_variable_siblings() {
        let mut router = Router::new();
        router.add_route("/res/{id}", get("a")).unwrap();
        router.add_route("/res/latest", get("b")).unwrap();
        assert_eq!(router.roots()[0].children().len(), 2);
    }

    #[test]
    fn test_invalid_templates() {
        let mut router = Router::new();
        for template in [
            "res",
            "/res//x",
            "/res/{}",
            "/res/{1id}",
            "/res/{id}.json",
            "/res/{id:int(}",
            "/res/{id}/{id}",
        ] {
            let result = router.add_route(template, get("a"));
            assert!(
                matches!(result, Err(Error::InvalidRoute { .. })),
                "{} should be rejected",
                template
            );
        }
        assert!(router.roots().is_empty());
    }

    #[test]
    fn test_empty_resource_is_rejected() {
        let mut router = Router::new();
        assert!(router.add_route("/res", Resource::new()).is_err());
    }

    #[test]
    fn test_static_routes() {
        let mut router = Router::new();
        router
            .add_static_route("/api/docs", "/srv/docs", Some("index.html"))
            .unwrap();
        router
            .add_static_route("/api/docs/", "/srv/other", None)
            .unwrap();

        assert_eq!(
            router.static_routes(),
            &[StaticRoute {
                prefix: "/api/docs/".to_string(),
                directory: PathBuf::from("/srv/other"),
                fallback_filename: None,
            }]
        );
        assert!(router.add_static_route("docs", "/srv", None).is_err());
    }
}
