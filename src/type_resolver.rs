//! Resolution of Rust type expressions into [`TypeDescriptor`]s.
//!
//! Struct, enum and alias definitions are indexed from parsed source files. Resolving a type
//! expression follows containers down to named definitions:
//!
//! - integer primitives are integral, `f32`/`f64` are real
//! - `Vec<T>`, `VecDeque<T>`, slices and arrays are sequences of `T`
//! - `Option<T>`, `Box<T>`, `Arc<T>`, `Rc<T>`, `Cow<T>` and references are transparent
//! - structs with named fields are records; newtype structs resolve to their inner type
//! - everything else (enums, unknown names, recursive references) is opaque

use crate::descriptor::{FieldDef, TypeDescriptor};
use crate::error::{Error, Result};
use crate::parser::ParsedFile;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use syn::meta::ParseNestedMeta;
use syn::visit::Visit;
use syn::{Fields, GenericArgument, PathArguments, Type};

/// Type resolver with a per-name cache of resolved definitions
#[derive(Debug, Default)]
pub struct TypeResolver {
    index: DefinitionIndex,
    /// Resolved definitions by type name
    type_cache: HashMap<String, TypeDescriptor>,
    /// Types currently being resolved, for cycle detection
    resolving_stack: HashSet<String>,
}

#[derive(Debug, Default)]
struct DefinitionIndex {
    structs: HashMap<String, syn::ItemStruct>,
    aliases: HashMap<String, Type>,
    enums: HashSet<String>,
}

impl<'ast> Visit<'ast> for DefinitionIndex {
    fn visit_item_struct(&mut self, node: &'ast syn::ItemStruct) {
        self.structs
            .entry(node.ident.to_string())
            .or_insert_with(|| node.clone());
    }

    fn visit_item_enum(&mut self, node: &'ast syn::ItemEnum) {
        self.enums.insert(node.ident.to_string());
    }

    fn visit_item_type(&mut self, node: &'ast syn::ItemType) {
        self.aliases
            .entry(node.ident.to_string())
            .or_insert_with(|| (*node.ty).clone());
    }

    // Definitions local to function bodies and impl blocks are not payload types.
    fn visit_item_fn(&mut self, _node: &'ast syn::ItemFn) {}

    fn visit_item_impl(&mut self, _node: &'ast syn::ItemImpl) {}
}

/// Serde attributes on a container or field
#[derive(Debug, Clone, Default, PartialEq)]
struct SerdeAttributes {
    rename: Option<String>,
    rename_all: Option<String>,
    skip: bool,
    default: bool,
    flatten: bool,
}

impl TypeResolver {
    pub fn new(parsed_files: Vec<ParsedFile>) -> Self {
        debug!("Initializing TypeResolver with {} files", parsed_files.len());

        let mut index = DefinitionIndex::default();
        for parsed_file in &parsed_files {
            index.visit_file(&parsed_file.syntax_tree);
        }

        debug!(
            "Indexed {} structs, {} enums and {} aliases",
            index.structs.len(),
            index.enums.len(),
            index.aliases.len()
        );

        Self {
            index,
            ..Self::default()
        }
    }

    pub fn find_struct_definition(&self, name: &str) -> Option<&syn::ItemStruct> {
        self.index.structs.get(name)
    }

    /// Parse and resolve a type expression such as `Vec<User>`
    pub fn resolve_expr(&mut self, expr: &str) -> Result<TypeDescriptor> {
        let ty = syn::parse_str::<Type>(expr).map_err(|e| Error::ParseError {
            file: PathBuf::from("<type expression>"),
            message: format!("invalid type expression '{}': {}", expr, e),
        })?;
        Ok(self.resolve(&ty))
    }

    pub fn resolve(&mut self, ty: &Type) -> TypeDescriptor {
        match ty {
            Type::Path(type_path) => {
                let Some(segment) = type_path.path.segments.last() else {
                    return TypeDescriptor::opaque("Unknown");
                };
                let name = segment.ident.to_string();

                match (name.as_str(), first_type_arg(segment)) {
                    ("Vec" | "VecDeque", Some(element)) => {
                        TypeDescriptor::sequence(self.resolve(element))
                    }
                    ("Option" | "Box" | "Arc" | "Rc" | "Cow", Some(inner)) => self.resolve(inner),
                    _ => self.resolve_type(&name),
                }
            }
            Type::Slice(slice) => TypeDescriptor::sequence(self.resolve(&slice.elem)),
            Type::Array(array) => TypeDescriptor::sequence(self.resolve(&array.elem)),
            Type::Reference(reference) => self.resolve(&reference.elem),
            Type::Paren(paren) => self.resolve(&paren.elem),
            Type::Group(group) => self.resolve(&group.elem),
            _ => TypeDescriptor::opaque("Unknown"),
        }
    }

    /// Resolve a type by bare name
    pub fn resolve_type(&mut self, type_name: &str) -> TypeDescriptor {
        if let Some(primitive) = primitive_descriptor(type_name) {
            return primitive;
        }

        if let Some(cached) = self.type_cache.get(type_name) {
            debug!("Type {} found in cache", type_name);
            return cached.clone();
        }

        if self.resolving_stack.contains(type_name) {
            warn!("Circular reference detected for type: {}", type_name);
            return TypeDescriptor::opaque(type_name);
        }

        debug!("Resolving type: {}", type_name);
        self.resolving_stack.insert(type_name.to_string());

        let resolved = if let Some(item) = self.index.structs.get(type_name).cloned() {
            self.resolve_struct(&item)
        } else if let Some(target) = self.index.aliases.get(type_name).cloned() {
            self.resolve(&target)
        } else if self.index.enums.contains(type_name) {
            debug!("Enum {} resolves as opaque", type_name);
            TypeDescriptor::opaque(type_name)
        } else {
            warn!("Could not resolve type: {}", type_name);
            TypeDescriptor::opaque(type_name)
        };

        self.resolving_stack.remove(type_name);
        self.type_cache
            .insert(type_name.to_string(), resolved.clone());
        resolved
    }

    fn resolve_struct(&mut self, item: &syn::ItemStruct) -> TypeDescriptor {
        let container = parse_serde_attributes(&item.attrs);
        let name = container
            .rename
            .clone()
            .unwrap_or_else(|| item.ident.to_string());

        match &item.fields {
            Fields::Named(named) => {
                let mut builder = TypeDescriptor::record(name);
                for field in &named.named {
                    for def in self.resolve_field(field, &container) {
                        builder = builder.field(def);
                    }
                }
                builder.build()
            }
            Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                self.resolve(&unnamed.unnamed[0].ty)
            }
            _ => TypeDescriptor::opaque(name),
        }
    }

    fn resolve_field(&mut self, field: &syn::Field, container: &SerdeAttributes) -> Vec<FieldDef> {
        let Some(ident) = &field.ident else {
            return Vec::new();
        };
        let attrs = parse_serde_attributes(&field.attrs);
        if attrs.skip {
            debug!("Skipping field {}", ident);
            return Vec::new();
        }

        let (ty, is_option) = match option_inner(&field.ty) {
            Some(inner) => (inner, true),
            None => (&field.ty, false),
        };
        let type_desc = self.resolve(ty);

        if attrs.flatten {
            if let Some(fields) = type_desc.record_fields() {
                return fields.to_vec();
            }
        }

        let raw_name = ident.to_string();
        let raw_name = raw_name.strip_prefix("r#").unwrap_or(&raw_name);
        let name = match (&attrs.rename, &container.rename_all) {
            (Some(rename), _) => rename.clone(),
            (None, Some(rule)) => apply_rename_rule(raw_name, rule),
            (None, None) => raw_name.to_string(),
        };

        vec![FieldDef {
            name,
            type_desc,
            required: !(is_option || attrs.default || container.default),
        }]
    }
}

fn primitive_descriptor(type_name: &str) -> Option<TypeDescriptor> {
    match type_name {
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
        | "u128" | "usize" => Some(TypeDescriptor::integral(type_name)),
        "f32" | "f64" => Some(TypeDescriptor::real(type_name)),
        "String" | "str" | "bool" | "char" => Some(TypeDescriptor::opaque(type_name)),
        _ => None,
    }
}

fn first_type_arg(segment: &syn::PathSegment) -> Option<&Type> {
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        }),
        _ => None,
    }
}

fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    first_type_arg(segment)
}

fn parse_serde_attributes(attrs: &[syn::Attribute]) -> SerdeAttributes {
    let mut serde_attrs = SerdeAttributes::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                serde_attrs.rename = Some(parse_rename(&meta)?);
            } else if meta.path.is_ident("rename_all") {
                serde_attrs.rename_all = Some(parse_rename(&meta)?);
            } else if meta.path.is_ident("skip") {
                serde_attrs.skip = true;
            } else if meta.path.is_ident("flatten") {
                serde_attrs.flatten = true;
            } else if meta.path.is_ident("default") {
                serde_attrs.default = true;
                skip_meta(&meta)?;
            } else {
                skip_meta(&meta)?;
            }
            Ok(())
        });

        if let Err(e) = result {
            warn!("Ignoring malformed serde attribute: {}", e);
        }
    }

    serde_attrs
}

/// Read `rename = "x"` or `rename(serialize = "x", ...)`
fn parse_rename(meta: &ParseNestedMeta) -> syn::Result<String> {
    if meta.input.peek(syn::Token![=]) {
        let value: syn::LitStr = meta.value()?.parse()?;
        return Ok(value.value());
    }

    let mut serialized = None;
    meta.parse_nested_meta(|inner| {
        let value: syn::LitStr = inner.value()?.parse()?;
        if inner.path.is_ident("serialize") || serialized.is_none() {
            serialized = Some(value.value());
        }
        Ok(())
    })?;
    serialized.ok_or_else(|| meta.error("empty rename"))
}

fn skip_meta(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_meta(&inner))?;
    }
    Ok(())
}

/// Apply a serde `rename_all` rule to a snake_case field name
fn apply_rename_rule(field: &str, rule: &str) -> String {
    let pascal = || {
        field
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<String>()
    };

    match rule {
        "lowercase" | "snake_case" => field.to_lowercase(),
        "UPPERCASE" | "SCREAMING_SNAKE_CASE" => field.to_uppercase(),
        "PascalCase" => pascal(),
        "camelCase" => {
            let pascal = pascal();
            let mut chars = pascal.chars();
            match chars.next() {
                Some(first) => first.to_lowercase().chain(chars).collect(),
                None => String::new(),
            }
        }
        "kebab-case" => field.replace('_', "-"),
        "SCREAMING-KEBAB-CASE" => field.replace('_', "-").to_uppercase(),
        _ => {
            warn!("Unknown rename_all rule '{}'", rule);
            field.to_string()
        }
    }
}
