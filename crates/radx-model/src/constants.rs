//! Missing-value sentinels shared by the model and the writers.

/// Missing value for floating metadata (angles, powers, georeferences).
pub const MISSING_META_DOUBLE: f64 = -9999.0;
pub const MISSING_META_FLOAT: f32 = -9999.0;
pub const MISSING_META_INT: i32 = -9999;

/// Default missing values for field data, by storage type.
pub const MISSING_FL64: f64 = -9999.0;
pub const MISSING_FL32: f32 = -9999.0;
pub const MISSING_SI32: i32 = -2147483647;
pub const MISSING_SI16: i16 = -32768;
pub const MISSING_SI08: i8 = -128;

/// Values at or below this are treated as missing metadata.
pub const MISSING_THRESHOLD: f64 = -9990.0;

/// True when a metadata value carries the missing sentinel.
pub fn is_missing(val: f64) -> bool {
    val <= MISSING_THRESHOLD
}

pub(crate) fn missing_meta_double() -> f64 {
    MISSING_META_DOUBLE
}
