//! Host-side state for one data source instance.

use std::collections::BTreeMap;

use serde_json::json;

use crate::errors::WritebackError;
use crate::schema::{AttrValue, Schema};

/// State the host runtime keeps for a data source: an id plus attribute
/// values, checked against the data source's schema on every write.
#[derive(Debug, Clone)]
pub struct ResourceData {
    schema: Schema,
    id: Option<String>,
    values: BTreeMap<String, AttrValue>,
}

impl ResourceData {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            id: None,
            values: BTreeMap::new(),
        }
    }

    /// Store `value` under `key`. On error the state is left as it was.
    pub fn set(&mut self, key: &str, value: AttrValue) -> Result<(), WritebackError> {
        let attr = self
            .schema
            .attribute(key)
            .ok_or_else(|| WritebackError::UnknownAttribute(key.to_string()))?;
        attr.attr_type.check(&value, key)?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.values.get(key)
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The state as JSON: `{"id": ..., "<attr>": ...}`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        out.insert("id".into(), json!(self.id));
        for (key, value) in &self.values {
            out.insert(key.clone(), json!(value));
        }
        serde_json::Value::Object(out)
    }
}
