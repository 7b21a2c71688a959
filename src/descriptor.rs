//! Structural type descriptors consumed by the schema classifier.
//!
//! A [`TypeDescriptor`] is a declared name plus a [`TypeShape`]. Descriptors compare and hash
//! structurally, so two descriptors built from the same type are the same cache key.
//!
//! Descriptors are obtained either from Rust types through the [`Describe`] trait, from the
//! record builder, or from Rust source via [`crate::type_resolver::TypeResolver`].
//!
//! # Example
//!
//! ```
//! use openapi_from_routes::descriptor::{Describe, TypeDescriptor};
//!
//! let user = TypeDescriptor::record("User")
//!     .required("id", u64::describe())
//!     .optional("tags", Vec::<String>::describe())
//!     .build();
//!
//! assert_eq!(user.name(), "User");
//! assert_eq!(user.required_fields().count(), 1);
//! ```

use std::collections::VecDeque;

/// A structural type handle: a declared name and a shape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    name: String,
    shape: TypeShape,
}

/// The shape categories the classifier recognizes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeShape {
    /// Integer-like types
    Integral,
    /// Floating point types
    Real,
    /// A homogeneous ordered sequence of the element type
    Sequence(Box<TypeDescriptor>),
    /// A record with named fields, each required or optional
    Record(Vec<FieldDef>),
    /// Anything else
    Opaque,
}

/// Field definition in a record type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDef {
    /// Field name as it appears on the wire
    pub name: String,
    /// Declared type of the field
    pub type_desc: TypeDescriptor,
    /// Whether the field must be present
    pub required: bool,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }

    pub fn integral(name: impl Into<String>) -> Self {
        Self::new(name, TypeShape::Integral)
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, TypeShape::Real)
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        Self::new(name, TypeShape::Opaque)
    }

    /// Create a sequence descriptor named after its element (`ArrayOfUser`)
    pub fn sequence(element: TypeDescriptor) -> Self {
        let name = sequence_name(&element.name);
        Self::new(name, TypeShape::Sequence(Box::new(element)))
    }

    /// Start building a record descriptor
    pub fn record(name: impl Into<String>) -> RecordBuilder {
        RecordBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// The declared type name, used as the schema name in `components.schemas`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    pub fn is_integral(&self) -> bool {
        matches!(self.shape, TypeShape::Integral)
    }

    pub fn is_real(&self) -> bool {
        matches!(self.shape, TypeShape::Real)
    }

    /// The element type, if this is an ordered homogeneous container
    pub fn element_type(&self) -> Option<&TypeDescriptor> {
        match &self.shape {
            TypeShape::Sequence(element) => Some(element),
            _ => None,
        }
    }

    /// The declared fields, if this is a record type
    pub fn record_fields(&self) -> Option<&[FieldDef]> {
        match &self.shape {
            TypeShape::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Required fields of a record type (empty for other shapes)
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.record_fields()
            .unwrap_or_default()
            .iter()
            .filter(|f| f.required)
    }

    /// Optional fields of a record type (empty for other shapes)
    pub fn optional_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.record_fields()
            .unwrap_or_default()
            .iter()
            .filter(|f| !f.required)
    }
}

fn sequence_name(element: &str) -> String {
    let mut chars = element.chars();
    match chars.next() {
        Some(first) => format!("ArrayOf{}{}", first.to_uppercase(), chars.as_str()),
        None => "Array".to_string(),
    }
}

/// Builder for record descriptors
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    name: String,
    fields: Vec<FieldDef>,
}

impl RecordBuilder {
    pub fn required(mut self, name: impl Into<String>, type_desc: TypeDescriptor) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            type_desc,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, type_desc: TypeDescriptor) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            type_desc,
            required: false,
        });
        self
    }

    pub fn field(self, field: FieldDef) -> Self {
        if field.required {
            self.required(field.name, field.type_desc)
        } else {
            self.optional(field.name, field.type_desc)
        }
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::new(self.name, TypeShape::Record(self.fields))
    }
}

/// Types that can describe their own structure
pub trait Describe {
    fn describe() -> TypeDescriptor;
}

macro_rules! describe_as {
    ($ctor:ident: $($ty:ty),* $(,)?) => {
        $(
            impl Describe for $ty {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::$ctor(stringify!($ty))
                }
            }
        )*
    };
}

describe_as!(integral: i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
describe_as!(real: f32, f64);
describe_as!(opaque: String, str, bool, char);

impl<T: Describe> Describe for Vec<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::sequence(T::describe())
    }
}

impl<T: Describe> Describe for VecDeque<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::sequence(T::describe())
    }
}

impl<T: Describe> Describe for [T] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::sequence(T::describe())
    }
}
