//! Typed attribute and variable descriptions handed to dataset sinks.
//!
//! Nothing here touches a file. The schema builder describes each variable
//! as a [`VarSpec`] and the marshaller produces [`Values`]; sinks turn both
//! into container calls.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Storage type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NcType {
    Double,
    Float,
    Int,
    Short,
    Byte,
    /// Fixed-width text; the last dimension is the string length.
    Char,
}

impl NcType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NcType::Double => "double",
            NcType::Float => "float",
            NcType::Int => "int",
            NcType::Short => "short",
            NcType::Byte => "byte",
            NcType::Char => "char",
        }
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    Str(String),
    Int(i32),
    Short(i16),
    Byte(i8),
    Float(f32),
    Double(f64),
    Ints(Vec<i32>),
    Doubles(Vec<f64>),
}

impl AttrValue {
    /// "true" / "false" text attribute.
    pub fn flag(val: bool) -> Self {
        AttrValue::Str(if val { "true" } else { "false" }.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(val: &str) -> Self {
        AttrValue::Str(val.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(val: String) -> Self {
        AttrValue::Str(val)
    }
}

impl From<i32> for AttrValue {
    fn from(val: i32) -> Self {
        AttrValue::Int(val)
    }
}

impl From<f32> for AttrValue {
    fn from(val: f32) -> Self {
        AttrValue::Float(val)
    }
}

impl From<f64> for AttrValue {
    fn from(val: f64) -> Self {
        AttrValue::Double(val)
    }
}

/// Bulk data for one variable, flattened in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Values {
    Double(Vec<f64>),
    Float(Vec<f32>),
    Int(Vec<i32>),
    Short(Vec<i16>),
    Byte(Vec<i8>),
    /// One string per row of a char variable, already clipped to width.
    Text(Vec<String>),
}

impl Values {
    pub fn nc_type(&self) -> NcType {
        match self {
            Values::Double(_) => NcType::Double,
            Values::Float(_) => NcType::Float,
            Values::Int(_) => NcType::Int,
            Values::Short(_) => NcType::Short,
            Values::Byte(_) => NcType::Byte,
            Values::Text(_) => NcType::Char,
        }
    }

    /// Number of elements, or number of strings for text.
    pub fn len(&self) -> usize {
        match self {
            Values::Double(v) => v.len(),
            Values::Float(v) => v.len(),
            Values::Int(v) => v.len(),
            Values::Short(v) => v.len(),
            Values::Byte(v) => v.len(),
            Values::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Declaration of one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarSpec {
    pub name: String,
    pub nc_type: NcType,
    pub dims: Vec<String>,
    pub attributes: Vec<(String, AttrValue)>,
    /// Deflate level when compression is requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deflate_level: Option<i32>,
}

impl VarSpec {
    pub fn new(name: &str, nc_type: NcType, dims: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            nc_type,
            dims: dims.iter().map(|d| d.to_string()).collect(),
            attributes: Vec::new(),
            deflate_level: None,
        }
    }

    pub fn scalar(name: &str, nc_type: NcType) -> Self {
        Self::new(name, nc_type, &[])
    }

    /// Add an attribute, builder style.
    pub fn attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.push((name.to_string(), value.into()));
        self
    }

    /// Add a text attribute only when the text is non-empty.
    pub fn attr_if_set(self, name: &str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.attr(name, value)
        }
    }

    pub fn long_name(self, long_name: &str) -> Self {
        self.attr("long_name", long_name)
    }

    pub fn units(self, units: &str) -> Self {
        self.attr("units", units)
    }

    pub fn meta_group(self, group: &str) -> Self {
        self.attr("meta_group", group)
    }

    /// Attach `_FillValue` in the variable's own storage type.
    pub fn fill_value(self, missing: f64) -> Self {
        let value = match self.nc_type {
            NcType::Double => AttrValue::Double(missing),
            NcType::Float => AttrValue::Float(missing as f32),
            NcType::Int => AttrValue::Int(missing as i32),
            NcType::Short => AttrValue::Short(missing as i16),
            NcType::Byte => AttrValue::Byte(missing as i8),
            NcType::Char => return self,
        };
        self.attr("_FillValue", value)
    }

    pub fn compress(mut self, level: Option<i32>) -> Self {
        self.deflate_level = level;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Clip text to a fixed storage width, leaving room for the terminator.
///
/// Over-long text is cut at a character boundary and a warning is logged.
pub fn clip_text(var_name: &str, text: &str, width: usize) -> String {
    let max_len = width.saturating_sub(1);
    if text.len() <= max_len {
        return text.to_string();
    }

    let mut end = max_len;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    warn!(
        variable = %var_name,
        width = width,
        original_len = text.len(),
        "Clipping text to fixed-width storage"
    );
    text[..end].to_string()
}
