use crate::descriptor::TypeDescriptor;
use crate::registry::SchemaRegistry;
use log::debug;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Prefix of every `$ref` that points into `components.schemas`
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Default number of classified descriptors kept in the cache
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Result of classifying one type descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaFragment {
    /// A bare JSON type name; never needs registry entries
    Simple(String),
    /// A schema body plus the named definitions its `$ref`s point to
    Complex {
        body: Value,
        defs: BTreeMap<String, Value>,
    },
}

impl SchemaFragment {
    fn simple(json_type: &str) -> Self {
        SchemaFragment::Simple(json_type.to_string())
    }

    fn complex(body: Value) -> Self {
        SchemaFragment::Complex {
            body,
            defs: BTreeMap::new(),
        }
    }
}

/// Build a `$ref` object pointing at a registered schema
pub fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("{}{}", SCHEMA_REF_PREFIX, name) })
}

/// Type classifier - maps type descriptors to JSON Schema fragments.
///
/// Classification is a pure function of the descriptor, so results are memoized in a
/// bounded cache that survives across generation runs. When the cache is full the oldest
/// entry is evicted.
#[derive(Debug)]
pub struct Classifier {
    cache: HashMap<TypeDescriptor, SchemaFragment>,
    order: VecDeque<TypeDescriptor>,
    capacity: usize,
    hits: u64,
}

impl Classifier {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Create a classifier whose cache holds at most `capacity` descriptors
    pub fn with_capacity(capacity: usize) -> Self {
        debug!("Initializing Classifier with cache capacity {}", capacity);
        Self {
            cache: HashMap::new(),
            order: VecDeque::new(),
            capacity,
            hits: 0,
        }
    }

    /// Classify a descriptor, consulting the cache first
    pub fn classify(&mut self, descriptor: &TypeDescriptor) -> SchemaFragment {
        if let Some(cached) = self.cache.get(descriptor) {
            self.hits += 1;
            return cached.clone();
        }

        debug!("Classifying type: {}", descriptor.name());
        let fragment = self.classify_uncached(descriptor);
        self.remember(descriptor.clone(), fragment.clone());
        fragment
    }

    fn classify_uncached(&mut self, descriptor: &TypeDescriptor) -> SchemaFragment {
        if descriptor.is_integral() {
            return SchemaFragment::simple("integer");
        }

        if descriptor.is_real() {
            return SchemaFragment::simple("number");
        }

        if let Some(element) = descriptor.element_type() {
            return match self.classify(element) {
                SchemaFragment::Simple(json_type) => SchemaFragment::complex(json!({
                    "type": "array",
                    "items": { "type": json_type },
                })),
                SchemaFragment::Complex { body, mut defs } => {
                    let placeholder = element.name().to_string();
                    defs.entry(placeholder.clone()).or_insert(body);
                    SchemaFragment::Complex {
                        body: json!({
                            "type": "array",
                            "items": schema_ref(&placeholder),
                        }),
                        defs,
                    }
                }
            };
        }

        if let Some(fields) = descriptor.record_fields() {
            // Optional fields are left out of `properties` entirely.
            let properties: Map<String, Value> = fields
                .iter()
                .filter(|field| field.required)
                .map(|field| (field.name.clone(), record_field_schema(&field.type_desc)))
                .collect();

            return SchemaFragment::complex(json!({
                "type": "object",
                "properties": properties,
            }));
        }

        SchemaFragment::simple("string")
    }

    fn remember(&mut self, descriptor: TypeDescriptor, fragment: SchemaFragment) {
        if self.capacity == 0 {
            return;
        }
        if self.cache.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                debug!("Evicting cached classification for {}", oldest.name());
                self.cache.remove(&oldest);
            }
        }
        self.order.push_back(descriptor.clone());
        self.cache.insert(descriptor, fragment);
    }

    /// Produce the schema to embed for `descriptor`, registering named definitions.
    ///
    /// Simple types are returned inline as `{"type": ...}`. Complex types register their
    /// auxiliary definitions and their own body under the descriptor's name, and a `$ref`
    /// to that name is returned.
    pub fn create_schema(
        &mut self,
        registry: &mut SchemaRegistry,
        descriptor: &TypeDescriptor,
    ) -> Value {
        match self.classify(descriptor) {
            SchemaFragment::Simple(json_type) => json!({ "type": json_type }),
            SchemaFragment::Complex { body, defs } => {
                registry.merge(defs);
                registry.insert(descriptor.name(), body);
                schema_ref(descriptor.name())
            }
        }
    }

    /// Number of descriptors currently cached
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Number of classifications answered from the cache
    pub fn cache_hits(&self) -> u64 {
        self.hits
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Record fields are always typed `integer`; the declared field type is not classified.
fn record_field_schema(_field_type: &TypeDescriptor) -> Value {
    json!({ "type": "integer" })
}
