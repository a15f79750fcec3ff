use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::error::{CoreError, Result};

/// Name of the reserved section holding the crop rectangle.
pub const CROP_SECTION: &str = "crop";

/// Value attached to one operation: an on/off toggle or a signed strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationValue {
    Toggle(bool),
    Strength(Number),
}

impl OperationValue {
    /// Build a strength value. Non-finite input collapses to zero.
    pub fn strength(value: f64) -> Self {
        Self::Strength(Number::from_f64(value).unwrap_or_else(|| Number::from(0)))
    }

    /// Numeric strength, if this is a strength value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Toggle(_) => None,
            Self::Strength(n) => n.as_f64(),
        }
    }

    /// False for `false` and for a strength of exactly zero.
    pub fn is_active(&self) -> bool {
        match self {
            Self::Toggle(on) => *on,
            Self::Strength(_) => self.as_f64().is_some_and(|s| s != 0.0),
        }
    }
}

impl From<bool> for OperationValue {
    fn from(on: bool) -> Self {
        Self::Toggle(on)
    }
}

impl From<f64> for OperationValue {
    fn from(value: f64) -> Self {
        Self::strength(value)
    }
}

impl From<i64> for OperationValue {
    fn from(value: i64) -> Self {
        Self::Strength(Number::from(value))
    }
}

/// One named group of operations, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub operations: Vec<(String, OperationValue)>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: Vec::new(),
        }
    }

    pub fn get(&self, operation: &str) -> Option<&OperationValue> {
        self.operations
            .iter()
            .find_map(|(n, v)| (n == operation).then_some(v))
    }

    /// Insert or replace an operation, keeping its first position.
    pub fn set(&mut self, operation: impl Into<String>, value: OperationValue) {
        let operation = operation.into();
        match self.operations.iter_mut().find(|(n, _)| *n == operation) {
            Some((_, slot)) => *slot = value,
            None => self.operations.push((operation, value)),
        }
    }
}

/// Crop rectangle in source pixels. Absent fields are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CropRect {
    #[serde(default, deserialize_with = "truncating_int")]
    pub x: i64,
    #[serde(default, deserialize_with = "truncating_int")]
    pub y: i64,
    #[serde(default, deserialize_with = "truncating_int")]
    pub width: i64,
    #[serde(default, deserialize_with = "truncating_int")]
    pub height: i64,
}

impl CropRect {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A crop only runs when all four fields are strictly positive.
    pub fn is_active(&self) -> bool {
        self.x > 0 && self.y > 0 && self.width > 0 && self.height > 0
    }
}

fn truncating_int<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let n = Number::deserialize(deserializer)?;
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    match n.as_f64() {
        Some(f) if f.is_finite() => Ok(f.trunc() as i64),
        _ => Err(de::Error::custom(format!("crop field out of range: {n}"))),
    }
}

/// Structured description of which transforms are active and how strongly.
///
/// Sections and the operations inside them keep the order they were declared
/// in; that order is the order the pipeline applies them. The reserved `crop`
/// section is held apart and always runs last.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSpec {
    sections: Vec<Section>,
    crop: Option<CropRect>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::InvalidSpec(e.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| CoreError::InvalidSpec(e.to_string()))
    }

    pub fn to_value(&self) -> Value {
        // Every field serializes to plain JSON; this cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// An empty spec carries no sections and no crop.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.crop.is_none()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn crop(&self) -> Option<CropRect> {
        self.crop
    }

    /// Look up an operation value by section and name.
    pub fn get(&self, section: &str, operation: &str) -> Option<&OperationValue> {
        self.section(section).and_then(|s| s.get(operation))
    }

    pub fn with_operation(
        mut self,
        section: &str,
        operation: &str,
        value: impl Into<OperationValue>,
    ) -> Self {
        let idx = match self.sections.iter().position(|s| s.name == section) {
            Some(idx) => idx,
            None => {
                self.sections.push(Section::new(section));
                self.sections.len() - 1
            }
        };
        self.sections[idx].set(operation, value.into());
        self
    }

    pub fn with_crop(mut self, crop: CropRect) -> Self {
        self.crop = Some(crop);
        self
    }
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.operations.len()))?;
        for (name, value) in &self.operations {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for FilterSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = self.sections.len() + usize::from(self.crop.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for section in &self.sections {
            map.serialize_entry(&section.name, section)?;
        }
        if let Some(crop) = &self.crop {
            map.serialize_entry(CROP_SECTION, crop)?;
        }
        map.end()
    }
}

struct Operations(Vec<(String, OperationValue)>);

impl<'de> Deserialize<'de> for Operations {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OperationsVisitor;

        impl<'de> Visitor<'de> for OperationsVisitor {
            type Value = Operations;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of operation names to booleans or numbers")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Operations, A::Error> {
                let mut section = Section::new("");
                while let Some(name) = map.next_key::<String>()? {
                    let value: OperationValue = map.next_value().map_err(|_: A::Error| {
                        <A::Error as de::Error>::custom(format!(
                            "operation {name:?} must be a boolean or a number"
                        ))
                    })?;
                    section.set(name, value);
                }
                Ok(Operations(section.operations))
            }
        }

        deserializer.deserialize_map(OperationsVisitor)
    }
}

impl<'de> Deserialize<'de> for FilterSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct FilterSpecVisitor;

        impl<'de> Visitor<'de> for FilterSpecVisitor {
            type Value = FilterSpec;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of filter sections")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<FilterSpec, A::Error> {
                let mut spec = FilterSpec::default();
                while let Some(name) = map.next_key::<String>()? {
                    if name == CROP_SECTION {
                        spec.crop = Some(map.next_value()?);
                        continue;
                    }
                    let Operations(operations) = map.next_value()?;
                    match spec.sections.iter_mut().find(|s| s.name == name) {
                        Some(existing) => existing.operations = operations,
                        None => spec.sections.push(Section { name, operations }),
                    }
                }
                Ok(spec)
            }
        }

        deserializer.deserialize_map(FilterSpecVisitor)
    }
}
