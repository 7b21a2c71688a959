use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Named schema definitions shared by one generation run.
///
/// Insertion is first-write-wins: once a name is registered its definition never changes,
/// so the same nested type reached through several routes is registered exactly once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Value>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition under `name` unless one already exists.
    ///
    /// Returns `true` if the definition was inserted.
    pub fn insert(&mut self, name: impl Into<String>, schema: Value) -> bool {
        let name = name.into();
        if self.schemas.contains_key(&name) {
            debug!("Schema for {} already exists", name);
            return false;
        }
        debug!("Registering schema: {}", name);
        self.schemas.insert(name, schema);
        true
    }

    /// Merge a set of definitions, keeping existing entries
    pub fn merge<I>(&mut self, definitions: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        for (name, schema) in definitions {
            self.insert(name, schema);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.schemas.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.schemas
    }
}
