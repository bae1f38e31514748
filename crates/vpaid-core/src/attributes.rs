//! Attribute store
//!
//! Holds the gettable/settable VPAID ad attributes. Every known attribute
//! except `duration` has a value from construction onward.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Known attribute names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeName {
    Companions,
    DesiredBitrate,
    Duration,
    Expanded,
    Height,
    Icons,
    Linear,
    RemainingTime,
    SkippableState,
    ViewMode,
    Volume,
    Width,
}

impl AttributeName {
    pub const ALL: [AttributeName; 12] = [
        AttributeName::Companions,
        AttributeName::DesiredBitrate,
        AttributeName::Duration,
        AttributeName::Expanded,
        AttributeName::Height,
        AttributeName::Icons,
        AttributeName::Linear,
        AttributeName::RemainingTime,
        AttributeName::SkippableState,
        AttributeName::ViewMode,
        AttributeName::Volume,
        AttributeName::Width,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeName::Companions => "companions",
            AttributeName::DesiredBitrate => "desiredBitrate",
            AttributeName::Duration => "duration",
            AttributeName::Expanded => "expanded",
            AttributeName::Height => "height",
            AttributeName::Icons => "icons",
            AttributeName::Linear => "linear",
            AttributeName::RemainingTime => "remainingTime",
            AttributeName::SkippableState => "skippableState",
            AttributeName::ViewMode => "viewMode",
            AttributeName::Volume => "volume",
            AttributeName::Width => "width",
        }
    }

    /// Construction-time value, `None` for attributes without a default
    pub fn default_value(&self) -> Option<AttributeValue> {
        let value = match self {
            AttributeName::Companions => AttributeValue::Text(String::new()),
            AttributeName::DesiredBitrate => AttributeValue::Integer(256),
            AttributeName::Duration => return None,
            AttributeName::Expanded => AttributeValue::Bool(false),
            AttributeName::Height => AttributeValue::Integer(0),
            AttributeName::Icons => AttributeValue::Text(String::new()),
            AttributeName::Linear => AttributeValue::Bool(true),
            AttributeName::RemainingTime => AttributeValue::Number(10.0),
            AttributeName::SkippableState => AttributeValue::Bool(false),
            AttributeName::ViewMode => AttributeValue::Text("normal".to_string()),
            AttributeName::Volume => AttributeValue::Number(1.0),
            AttributeName::Width => AttributeValue::Integer(0),
        };
        Some(value)
    }
}

impl FromStr for AttributeName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AttributeName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| Error::UnknownAttribute(s.to_string()))
    }
}

impl std::fmt::Display for AttributeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Integer(v) => Some(*v as f64),
            AttributeValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(v) => Some(*v),
            AttributeValue::Number(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<u32> for AttributeValue {
    fn from(v: u32) -> Self {
        AttributeValue::Integer(v.into())
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Number(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

/// Gettable/settable ad attributes with their defaults
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeStore {
    values: HashMap<AttributeName, AttributeValue>,
}

impl AttributeStore {
    pub fn new() -> Self {
        let values = AttributeName::ALL
            .into_iter()
            .filter_map(|name| name.default_value().map(|value| (name, value)))
            .collect();
        Self { values }
    }

    /// Read an attribute by its VPAID name
    pub fn get(&self, name: &str) -> Result<&AttributeValue> {
        self.get_attr(name.parse()?)
    }

    /// Read a known attribute; fails if it has never been given a value
    pub fn get_attr(&self, name: AttributeName) -> Result<&AttributeValue> {
        self.values
            .get(&name)
            .ok_or_else(|| Error::UnknownAttribute(name.as_str().to_string()))
    }

    /// Overwrite an attribute. No type or range validation.
    pub fn set(&mut self, name: AttributeName, value: impl Into<AttributeValue>) {
        self.values.insert(name, value.into());
    }

    /// Numeric read; zero if the attribute holds a non-numeric value
    pub fn number(&self, name: AttributeName) -> f64 {
        self.get_attr(name).ok().and_then(AttributeValue::as_f64).unwrap_or_default()
    }

    /// Boolean read; false if the attribute holds a non-boolean value
    pub fn flag(&self, name: AttributeName) -> bool {
        self.get_attr(name).ok().and_then(AttributeValue::as_bool).unwrap_or_default()
    }

    /// Text read; empty if the attribute holds a non-text value
    pub fn text(&self, name: AttributeName) -> String {
        self.get_attr(name)
            .ok()
            .and_then(AttributeValue::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

impl Default for AttributeStore {
    fn default() -> Self {
        Self::new()
    }
}
