//! Conversion of raw configuration strings into typed values.
//!
//! Every configurable field declares a [PrimitiveKind]. The raw string found in a
//! [ConfigurationStore](crate::config_source::ConfigurationStore) is converted with [coerce]:
//!
//! * `STRING` - identity, always succeeds
//! * `INTEGER` / `LONG` - base-10 signed integer of matching width
//! * `BOOLEAN` - case-insensitive `true`/`yes` or `false`/`no`
//!
//! The resulting [TypedValue] is then turned into the concrete field type by [PropertyValue].

use crate::error::{CoercionError, CoercionErrorKind};
use crate::marker::PrimitiveKind;

/// A raw value coerced to a [PrimitiveKind].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypedValue {
    String(String),
    Integer(i32),
    Long(i64),
    Boolean(bool),
}

impl TypedValue {
    /// Returns the kind of this value.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            TypedValue::String(_) => PrimitiveKind::String,
            TypedValue::Integer(_) => PrimitiveKind::Integer,
            TypedValue::Long(_) => PrimitiveKind::Long,
            TypedValue::Boolean(_) => PrimitiveKind::Boolean,
        }
    }
}

/// Coerces a raw value into given kind.
pub fn coerce(raw: &str, kind: PrimitiveKind) -> Result<TypedValue, CoercionError> {
    let error = |error_kind| CoercionError {
        kind: error_kind,
        target: kind,
        raw: raw.to_string(),
    };

    match kind {
        PrimitiveKind::String => Ok(TypedValue::String(raw.to_string())),
        PrimitiveKind::Integer => raw
            .parse()
            .map(TypedValue::Integer)
            .map_err(|_| error(CoercionErrorKind::InvalidNumber)),
        PrimitiveKind::Long => raw
            .parse()
            .map(TypedValue::Long)
            .map_err(|_| error(CoercionErrorKind::InvalidNumber)),
        PrimitiveKind::Boolean => parse_boolean(raw)
            .map(TypedValue::Boolean)
            .ok_or_else(|| error(CoercionErrorKind::InvalidBoolean)),
    }
}

/// Value used for a blank optional property.
pub fn default_value(kind: PrimitiveKind) -> TypedValue {
    match kind {
        PrimitiveKind::String => TypedValue::String(String::new()),
        PrimitiveKind::Integer => TypedValue::Integer(0),
        PrimitiveKind::Long => TypedValue::Long(0),
        PrimitiveKind::Boolean => TypedValue::Boolean(false),
    }
}

fn parse_boolean(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") || raw.eq_ignore_ascii_case("no") {
        Some(false)
    } else {
        None
    }
}

/// Rust types which can hold a property value. Used by generated field accessors to write
/// [TypedValue]s into concrete fields.
pub trait PropertyValue: Sized {
    /// Kind assumed when the property marker does not declare one.
    const KIND: PrimitiveKind;

    /// Converts the value into `Self`, or gives it back when the kinds differ.
    fn from_typed(value: TypedValue) -> Result<Self, TypedValue>;
}

impl PropertyValue for String {
    const KIND: PrimitiveKind = PrimitiveKind::String;

    fn from_typed(value: TypedValue) -> Result<Self, TypedValue> {
        match value {
            TypedValue::String(value) => Ok(value),
            value => Err(value),
        }
    }
}

impl PropertyValue for i32 {
    const KIND: PrimitiveKind = PrimitiveKind::Integer;

    fn from_typed(value: TypedValue) -> Result<Self, TypedValue> {
        match value {
            TypedValue::Integer(value) => Ok(value),
            value => Err(value),
        }
    }
}

impl PropertyValue for i64 {
    const KIND: PrimitiveKind = PrimitiveKind::Long;

    fn from_typed(value: TypedValue) -> Result<Self, TypedValue> {
        match value {
            TypedValue::Long(value) => Ok(value),
            // widening is lossless
            TypedValue::Integer(value) => Ok(value.into()),
            value => Err(value),
        }
    }
}

impl PropertyValue for bool {
    const KIND: PrimitiveKind = PrimitiveKind::Boolean;

    fn from_typed(value: TypedValue) -> Result<Self, TypedValue> {
        match value {
            TypedValue::Boolean(value) => Ok(value),
            value => Err(value),
        }
    }
}
