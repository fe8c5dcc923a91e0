//! Named gate arrays attached to rays.

use serde::{Deserialize, Serialize};

use crate::constants::{
    missing_meta_double, MISSING_FL32, MISSING_FL64, MISSING_SI08, MISSING_SI16, MISSING_SI32,
};

/// On-disk numeric type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Fl64,
    Fl32,
    Si32,
    Si16,
    Si08,
}

impl DataType {
    /// Integer encodings carry scale and offset.
    pub fn is_integer(&self) -> bool {
        matches!(self, DataType::Si32 | DataType::Si16 | DataType::Si08)
    }
}

/// Gate values plus the missing value expressed in the same type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldData {
    Fl64 {
        values: Vec<f64>,
        #[serde(default = "default_missing_fl64")]
        missing: f64,
    },
    Fl32 {
        values: Vec<f32>,
        #[serde(default = "default_missing_fl32")]
        missing: f32,
    },
    Si32 {
        values: Vec<i32>,
        #[serde(default = "default_missing_si32")]
        missing: i32,
    },
    Si16 {
        values: Vec<i16>,
        #[serde(default = "default_missing_si16")]
        missing: i16,
    },
    Si08 {
        values: Vec<i8>,
        #[serde(default = "default_missing_si08")]
        missing: i8,
    },
}

fn default_missing_fl64() -> f64 {
    MISSING_FL64
}
fn default_missing_fl32() -> f32 {
    MISSING_FL32
}
fn default_missing_si32() -> i32 {
    MISSING_SI32
}
fn default_missing_si16() -> i16 {
    MISSING_SI16
}
fn default_missing_si08() -> i8 {
    MISSING_SI08
}

impl FieldData {
    pub fn data_type(&self) -> DataType {
        match self {
            FieldData::Fl64 { .. } => DataType::Fl64,
            FieldData::Fl32 { .. } => DataType::Fl32,
            FieldData::Si32 { .. } => DataType::Si32,
            FieldData::Si16 { .. } => DataType::Si16,
            FieldData::Si08 { .. } => DataType::Si08,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FieldData::Fl64 { values, .. } => values.len(),
            FieldData::Fl32 { values, .. } => values.len(),
            FieldData::Si32 { values, .. } => values.len(),
            FieldData::Si16 { values, .. } => values.len(),
            FieldData::Si08 { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The missing value widened to f64.
    pub fn missing_f64(&self) -> f64 {
        match self {
            FieldData::Fl64 { missing, .. } => *missing,
            FieldData::Fl32 { missing, .. } => *missing as f64,
            FieldData::Si32 { missing, .. } => *missing as f64,
            FieldData::Si16 { missing, .. } => *missing as f64,
            FieldData::Si08 { missing, .. } => *missing as f64,
        }
    }
}

/// A named, typed array of gate values on one ray.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub standard_name: String,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub legend_xml: String,
    #[serde(default)]
    pub thresholding_xml: String,
    #[serde(default = "missing_meta_double")]
    pub sampling_ratio: f64,
    #[serde(default)]
    pub folds: bool,
    #[serde(default)]
    pub fold_limit_lower: f64,
    #[serde(default)]
    pub fold_limit_upper: f64,
    #[serde(default)]
    pub is_discrete: bool,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub offset: f64,
    pub data: FieldData,
}

fn default_scale() -> f64 {
    1.0
}

impl Field {
    /// A float field with default metadata.
    pub fn new_fl32(name: &str, units: &str, values: Vec<f32>) -> Self {
        Self::with_data(
            name,
            units,
            FieldData::Fl32 {
                values,
                missing: MISSING_FL32,
            },
        )
    }

    pub fn with_data(name: &str, units: &str, data: FieldData) -> Self {
        Self {
            name: name.to_string(),
            long_name: String::new(),
            standard_name: String::new(),
            units: units.to_string(),
            legend_xml: String::new(),
            thresholding_xml: String::new(),
            sampling_ratio: missing_meta_double(),
            folds: false,
            fold_limit_lower: 0.0,
            fold_limit_upper: 0.0,
            is_discrete: false,
            scale: 1.0,
            offset: 0.0,
            data,
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    pub fn n_gates(&self) -> usize {
        self.data.len()
    }

    /// Physical value of one gate, `None` when missing or out of range.
    ///
    /// Integer encodings are unpacked with the field's scale and offset.
    pub fn physical_value(&self, gate: usize) -> Option<f64> {
        match &self.data {
            FieldData::Fl64 { values, missing } => {
                values.get(gate).copied().filter(|v| v != missing)
            }
            FieldData::Fl32 { values, missing } => values
                .get(gate)
                .copied()
                .filter(|v| v != missing)
                .map(|v| v as f64),
            FieldData::Si32 { values, missing } => values
                .get(gate)
                .copied()
                .filter(|v| v != missing)
                .map(|v| v as f64 * self.scale + self.offset),
            FieldData::Si16 { values, missing } => values
                .get(gate)
                .copied()
                .filter(|v| v != missing)
                .map(|v| v as f64 * self.scale + self.offset),
            FieldData::Si08 { values, missing } => values
                .get(gate)
                .copied()
                .filter(|v| v != missing)
                .map(|v| v as f64 * self.scale + self.offset),
        }
    }
}
