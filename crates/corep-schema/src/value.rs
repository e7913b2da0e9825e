//! Typed field values
//!
//! [`FieldValue`] is the tagged union every payload entry is stored as.
//! Raw input (JSON from a mapper or a file) converts *untagged*; the
//! persisted form is *tagged* so a reload restores the exact variant.
//! [`FieldValue::coerce`] is the single coercion step used at the validator
//! boundary.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Declared data type of a template field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Whole number
    Integer,
    /// Real number (monetary amounts)
    Decimal,
    /// True/false flag
    Boolean,
    /// Calendar date
    Date,
    /// Percentage in `0..=100`
    Percentage,
    /// Free text
    Text,
}

impl DataType {
    /// Whether values of this type take part in arithmetic
    #[inline]
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Decimal | Self::Percentage)
    }

    /// Lower-case name used in diagnostics
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Percentage => "percentage",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single payload value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Explicitly absent
    Null,
    Integer(i64),
    Decimal(#[serde(with = "real")] f64),
    Boolean(bool),
    Date(NaiveDate),
    Percentage(#[serde(with = "real")] f64),
    Text(String),
}

/// Persisted form of a real number
///
/// JSON has no infinities or NaN, so non-finite values are written as the
/// strings `"inf"`, `"-inf"` and `"NaN"`.
mod real {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub(super) fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_sign_positive() {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(RealVisitor)
    }

    struct RealVisitor;

    impl Visitor<'_> for RealVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or one of \"inf\", \"-inf\", \"NaN\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        #[allow(clippy::cast_precision_loss)]
        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        #[allow(clippy::cast_precision_loss)]
        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "NaN" => Ok(f64::NAN),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }
    }
}

impl FieldValue {
    /// Convert raw JSON without type information
    ///
    /// Arrays and objects have no field-level meaning and become their JSON
    /// text, which then fails coercion for every non-text type.
    #[must_use]
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Boolean(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Decimal(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    /// Convert back to plain JSON (the inverse of [`FieldValue::from_json`])
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Integer(i) => JsonValue::from(*i),
            Self::Decimal(d) | Self::Percentage(d) => JsonValue::from(*d),
            Self::Boolean(b) => JsonValue::Bool(*b),
            Self::Date(d) => JsonValue::String(d.to_string()),
            Self::Text(s) => JsonValue::String(s.clone()),
        }
    }

    /// Null or blank text
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Name of the variant, for diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Decimal(_) => "decimal",
            Self::Boolean(_) => "boolean",
            Self::Date(_) => "date",
            Self::Percentage(_) => "percentage",
            Self::Text(_) => "text",
        }
    }

    /// Numeric view of already-numeric variants
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Decimal(d) | Self::Percentage(d) if d.is_finite() => Some(*d),
            _ => None,
        }
    }

    /// Coerce into the variant matching `target`
    ///
    /// Returns `None` when the value cannot represent the type. Empty values
    /// never coerce; callers check [`FieldValue::is_empty`] first.
    #[must_use]
    pub fn coerce(&self, target: DataType) -> Option<FieldValue> {
        if self.is_empty() {
            return None;
        }
        match target {
            DataType::Integer => self.coerce_integer().map(Self::Integer),
            DataType::Decimal => self.coerce_real(false).map(Self::Decimal),
            DataType::Percentage => self.coerce_real(true).map(Self::Percentage),
            DataType::Boolean => self.coerce_boolean().map(Self::Boolean),
            DataType::Date => self.coerce_date().map(Self::Date),
            DataType::Text => Some(Self::Text(self.to_string())),
        }
    }

    fn coerce_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            // i64::MAX as f64 rounds up, so the bound is exclusive
            Self::Decimal(d) if d.is_finite() && d.fract() == 0.0 && d.abs() < 9.2e18 => {
                Some(*d as i64)
            }
            Self::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    fn coerce_real(&self, allow_percent_sign: bool) -> Option<f64> {
        let n = match self {
            Self::Integer(i) => *i as f64,
            Self::Decimal(d) | Self::Percentage(d) => *d,
            Self::Text(s) => {
                let s = s.trim();
                let s = if allow_percent_sign {
                    s.strip_suffix('%').map_or(s, str::trim_end)
                } else {
                    s
                };
                s.parse::<f64>().ok()?
            }
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    fn coerce_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Some(true),
                "false" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn coerce_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Text(s) => parse_iso_date(s.trim()),
            _ => None,
        }
    }
}

/// Parse `YYYY-MM-DD` or an ISO date-time, keeping the date part
fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) | Self::Percentage(d) => write!(f, "{d}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
