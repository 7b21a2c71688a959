//! Depth-first traversal of a route tree into OpenAPI path items.

use crate::classifier::Classifier;
use crate::converter::PathVariable;
use crate::error::Result;
use crate::openapi_builder::{build_operation, PathItem};
use crate::registry::SchemaRegistry;
use crate::router::{RouteNode, Segment};
use log::debug;
use std::collections::BTreeMap;

/// State owned by a single generation run
#[derive(Debug, Default)]
pub struct RunContext {
    pub paths: BTreeMap<String, PathItem>,
    pub registry: SchemaRegistry,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Walk `node` and its descendants, adding one path item per node that has handlers.
///
/// `path` and `vars` hold the segments and variables of the node's ancestors. Each node
/// extends its own copies, so siblings never see each other's segments.
pub fn walk<N: RouteNode>(
    node: &N,
    classifier: &mut Classifier,
    context: &mut RunContext,
    path: &[String],
    vars: &[PathVariable],
) -> Result<()> {
    let mut path = path.to_vec();
    let mut vars = vars.to_vec();

    match node.segment() {
        Segment::Literal(text) => path.push(text.to_string()),
        Segment::Variable { name, converter } => {
            path.push(format!("{{{}}}", name));
            vars.push(PathVariable::new(name, converter.cloned()));
        }
    }

    if !node.handlers().is_empty() {
        let key = format!("/{}", path.join("/"));
        debug!("Documenting {}", key);

        // Nodes with only skipped responders still get an (empty) entry.
        let item = context.paths.entry(key).or_default();
        let mut first = true;

        for (method, handler) in node.handlers() {
            if !method.is_documented() || handler.is_method_not_allowed() {
                continue;
            }

            let fragment = build_operation(
                classifier,
                &mut context.registry,
                *method,
                handler,
                &vars,
                first,
            )?;
            first = false;
            item.merge(fragment);
        }
    }

    for child in node.children() {
        walk(child, classifier, context, &path, &vars)?;
    }

    Ok(())
}
