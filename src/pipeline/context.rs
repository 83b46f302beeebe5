//! Per-request pipeline context.
//!
//! One append-only, insertion-ordered mapping from step name to result,
//! owned by exactly one in-flight request. The executor is the only writer;
//! processors read it through [`crate::processors::StepContext`].

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::processors::ProcessorValue;

/// Reserved context key carrying values extracted from rule placeholders.
pub const VIEW_ARGS_KEY: &str = "view_args";

/// Reserved context key carrying request URL components.
pub const REQUEST_KEY: &str = "request";

#[derive(Debug, Default)]
pub struct PipelineContext {
    entries: Vec<(String, ProcessorValue)>,
    index: HashMap<String, usize>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a step result. Re-using a name replaces the earlier value in
    /// place, keeping its position in the insertion order.
    pub fn insert(&mut self, name: impl Into<String>, value: ProcessorValue) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ProcessorValue> {
        self.index.get(name).map(|&slot| &self.entries[slot].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProcessorValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// The whole context as one JSON object, in insertion order.
    pub fn to_value(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.entries {
            map.insert(name.clone(), value.to_template_value());
        }
        serde_json::Value::Object(map)
    }
}

impl Serialize for PipelineContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
