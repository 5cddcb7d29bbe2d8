//! Descriptor bundle: flattened extraction output keyed by dotted name
//!
//! Values are scalars, frame sequences, frame matrices (one row per frame)
//! or text. The bundle is built once per asset and read-only afterwards.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::MarshalIssue;
use crate::records::MatrixReal;
use crate::services::descriptor_selection::ExtractionPlan;

/// Single descriptor value
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorValue {
    Real(f64),
    Text(String),
    Vector(Vec<f32>),
    Matrix(Vec<Vec<f32>>),
    TextList(Vec<String>),
}

/// Descriptor name to value mapping for one asset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorBundle {
    values: BTreeMap<String, DescriptorValue>,
}

impl DescriptorBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: DescriptorValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&DescriptorValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Whether any descriptor lives under `group.`
    pub fn has_group(&self, group: &str) -> bool {
        let prefix = format!("{}.", group);
        self.values
            .keys()
            .any(|k| k == group || k.starts_with(&prefix))
    }

    /// Drop every descriptor under `group.`
    pub fn remove_group(&mut self, group: &str) {
        let prefix = format!("{}.", group);
        self.values
            .retain(|k, _| k != group && !k.starts_with(&prefix));
    }

    /// Add every descriptor of `other`, overwriting duplicates
    pub fn merge(&mut self, other: DescriptorBundle) {
        self.values.extend(other.values);
    }

    /// Drop descriptors the plan did not ask for
    pub fn retain_selected(&mut self, plan: &ExtractionPlan) {
        self.values.retain(|name, _| plan.keeps_descriptor(name));
    }

    /// Flatten an extractor JSON document into dotted names
    ///
    /// Nested objects become name segments. Numeric arrays become vectors,
    /// arrays of numeric arrays become matrices, string arrays become text
    /// lists. Nulls, booleans and mixed arrays are skipped. The top-level
    /// `lowlevel` key is normalized to `lowLevel`.
    pub fn from_json(root: &Value) -> Self {
        let mut bundle = Self::new();
        if let Value::Object(map) = root {
            for (key, value) in map {
                let key = if key == "lowlevel" { "lowLevel" } else { key.as_str() };
                flatten_into(&mut bundle, key.to_string(), value);
            }
        }
        bundle
    }

    // ------------------------------------------------------------------
    // Typed access
    // ------------------------------------------------------------------

    fn require(&self, name: &str) -> Result<&DescriptorValue, MarshalIssue> {
        self.get(name)
            .ok_or_else(|| MarshalIssue::Missing(name.to_string()))
    }

    /// Scalar; a one-element sequence is accepted as a scalar
    pub fn real(&self, name: &str) -> Result<f64, MarshalIssue> {
        match self.require(name)? {
            DescriptorValue::Real(v) => Ok(*v),
            DescriptorValue::Vector(v) if v.len() == 1 => Ok(v[0] as f64),
            other => Err(malformed(name, "scalar", other)),
        }
    }

    /// Frame sequence; a scalar is a one-frame sequence
    pub fn vector(&self, name: &str) -> Result<Vec<f32>, MarshalIssue> {
        match self.require(name)? {
            DescriptorValue::Vector(v) => Ok(v.clone()),
            DescriptorValue::Real(v) => Ok(vec![*v as f32]),
            other => Err(malformed(name, "sequence", other)),
        }
    }

    /// Rectangular frame matrix
    pub fn matrix(&self, name: &str) -> Result<MatrixReal, MarshalIssue> {
        match self.require(name)? {
            DescriptorValue::Matrix(rows) => {
                MatrixReal::from_rows(rows).map_err(|reason| MarshalIssue::Malformed {
                    name: name.to_string(),
                    reason,
                })
            }
            other => Err(malformed(name, "matrix", other)),
        }
    }

    /// Text; the first entry of a text list is accepted
    pub fn text(&self, name: &str) -> Result<String, MarshalIssue> {
        match self.require(name)? {
            DescriptorValue::Text(s) => Ok(s.clone()),
            DescriptorValue::TextList(list) => list
                .first()
                .cloned()
                .ok_or_else(|| MarshalIssue::Malformed {
                    name: name.to_string(),
                    reason: "empty text list".to_string(),
                }),
            other => Err(malformed(name, "text", other)),
        }
    }

    pub fn text_list(&self, name: &str) -> Result<Vec<String>, MarshalIssue> {
        match self.require(name)? {
            DescriptorValue::TextList(list) => Ok(list.clone()),
            DescriptorValue::Text(s) => Ok(vec![s.clone()]),
            other => Err(malformed(name, "text list", other)),
        }
    }
}

/// Turn a `Missing` issue into `None`, keeping `Malformed` as an error
pub fn optional<T>(result: Result<T, MarshalIssue>) -> Result<Option<T>, MarshalIssue> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(MarshalIssue::Missing(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn malformed(name: &str, expected: &str, found: &DescriptorValue) -> MarshalIssue {
    let kind = match found {
        DescriptorValue::Real(_) => "scalar",
        DescriptorValue::Text(_) => "text",
        DescriptorValue::Vector(_) => "sequence",
        DescriptorValue::Matrix(_) => "matrix",
        DescriptorValue::TextList(_) => "text list",
    };
    MarshalIssue::Malformed {
        name: name.to_string(),
        reason: format!("expected {}, found {}", expected, kind),
    }
}

fn flatten_into(bundle: &mut DescriptorBundle, name: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(bundle, format!("{}.{}", name, key), child);
            }
        }
        Value::Number(n) => {
            if let Some(v) = n.as_f64() {
                bundle.insert(name, DescriptorValue::Real(v));
            }
        }
        Value::String(s) => bundle.insert(name, DescriptorValue::Text(s.clone())),
        Value::Array(items) => {
            if let Some(value) = array_value(items) {
                bundle.insert(name, value);
            } else {
                tracing::trace!(descriptor = %name, "Skipping descriptor with mixed array");
            }
        }
        Value::Null | Value::Bool(_) => {}
    }
}

fn array_value(items: &[Value]) -> Option<DescriptorValue> {
    if items.iter().all(Value::is_number) {
        return Some(DescriptorValue::Vector(
            items.iter().filter_map(Value::as_f64).map(|v| v as f32).collect(),
        ));
    }
    if items.iter().all(Value::is_string) {
        return Some(DescriptorValue::TextList(
            items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        ));
    }
    let rows: Option<Vec<Vec<f32>>> = items
        .iter()
        .map(|row| match row {
            Value::Array(cells) if cells.iter().all(Value::is_number) => Some(
                cells.iter().filter_map(Value::as_f64).map(|v| v as f32).collect(),
            ),
            _ => None,
        })
        .collect();
    rows.map(DescriptorValue::Matrix)
}
