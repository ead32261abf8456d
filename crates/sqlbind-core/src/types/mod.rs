//! SQL type system

mod collation;
mod value;

pub use collation::{CharacterSet, Collation};
pub use value::{Row, Value};

use serde::{Deserialize, Serialize};
use sqlparser::ast::DataType;

/// Internal representation of SQL types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlType {
    // Numeric types
    TinyInt,
    SmallInt,
    MediumInt,
    Integer,
    BigInt,
    UnsignedBigInt,
    Decimal {
        precision: Option<u64>,
        scale: Option<u64>,
    },
    Real,
    DoublePrecision,

    // Character types
    Char {
        length: Option<u64>,
    },
    Varchar {
        length: Option<u64>,
    },
    Text,
    LongText,

    // Binary types
    Blob,

    // Date/Time types
    Date,
    Time,
    Timestamp,

    // Boolean
    Boolean,

    // JSON
    Json,

    // Custom/User-defined type
    Custom(String),

    /// Type of a NULL literal and of user variables that were never assigned
    Null,

    // Unknown (when parsing fails)
    Unknown,
}

impl SqlType {
    /// Convert from sqlparser's DataType to our internal SqlType
    pub fn from_ast(data_type: &DataType) -> Self {
        match data_type {
            DataType::TinyInt(_) | DataType::UnsignedTinyInt(_) => SqlType::TinyInt,
            DataType::SmallInt(_) | DataType::UnsignedSmallInt(_) => SqlType::SmallInt,
            DataType::MediumInt(_) | DataType::UnsignedMediumInt(_) => SqlType::MediumInt,
            DataType::Integer(_) | DataType::UnsignedInteger(_) => SqlType::Integer,
            DataType::Int(_) | DataType::UnsignedInt(_) => SqlType::Integer,
            DataType::BigInt(_) => SqlType::BigInt,
            DataType::UnsignedBigInt(_) => SqlType::UnsignedBigInt,

            DataType::Real | DataType::Float(_) => SqlType::Real,
            DataType::Double | DataType::DoublePrecision => SqlType::DoublePrecision,

            DataType::Decimal(info) | DataType::Numeric(info) => {
                let (precision, scale) = match info {
                    sqlparser::ast::ExactNumberInfo::None => (None, None),
                    sqlparser::ast::ExactNumberInfo::Precision(p) => (Some(*p), None),
                    sqlparser::ast::ExactNumberInfo::PrecisionAndScale(p, s) => {
                        (Some(*p), Some(*s))
                    }
                };
                SqlType::Decimal { precision, scale }
            }

            DataType::Char(info) | DataType::Character(info) => {
                let length = extract_char_length(info.as_ref());
                SqlType::Char { length }
            }

            DataType::Varchar(info) | DataType::CharacterVarying(info) => {
                let length = extract_char_length(info.as_ref());
                SqlType::Varchar { length }
            }

            DataType::Text => SqlType::Text,
            DataType::String(_) => SqlType::LongText,

            DataType::Binary(_) | DataType::Varbinary(_) | DataType::Blob(_) => SqlType::Blob,

            DataType::Date => SqlType::Date,
            DataType::Time(..) => SqlType::Time,
            DataType::Timestamp(..) | DataType::Datetime(_) => SqlType::Timestamp,

            DataType::Boolean | DataType::Bool => SqlType::Boolean,

            DataType::JSON => SqlType::Json,

            DataType::Custom(name, _) => {
                let type_name = name
                    .0
                    .iter()
                    .map(|i| i.value.clone())
                    .collect::<Vec<_>>()
                    .join(".");
                match type_name.to_lowercase().as_str() {
                    "longtext" | "mediumtext" => SqlType::LongText,
                    "tinytext" => SqlType::Text,
                    _ => SqlType::Custom(type_name),
                }
            }

            _ => SqlType::Unknown,
        }
    }

    /// The type a value carries on its own, e.g. when it is assigned to a user variable.
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Null => SqlType::Null,
            Value::Int64(_) => SqlType::BigInt,
            Value::UInt64(_) => SqlType::UnsignedBigInt,
            Value::Float64(_) => SqlType::DoublePrecision,
            Value::Text(_) => SqlType::LongText,
            Value::Boolean(_) => SqlType::Boolean,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(
            self,
            SqlType::Char { .. } | SqlType::Varchar { .. } | SqlType::Text | SqlType::LongText
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            SqlType::TinyInt
                | SqlType::SmallInt
                | SqlType::MediumInt
                | SqlType::Integer
                | SqlType::BigInt
        )
    }

    /// Convert `value` into a value of this type.
    ///
    /// Returns `None` when the value cannot be represented, which callers report
    /// as an invalid assignment. NULL converts only to the NULL type.
    pub fn convert(&self, value: &Value) -> Option<Value> {
        if SqlType::of_value(value) == *self {
            return Some(value.clone());
        }

        match (self, value) {
            (_, Value::Null) => None,

            (SqlType::Boolean, Value::Int64(0)) | (SqlType::Boolean, Value::UInt64(0)) => {
                Some(Value::Boolean(false))
            }
            (SqlType::Boolean, Value::Int64(1)) | (SqlType::Boolean, Value::UInt64(1)) => {
                Some(Value::Boolean(true))
            }
            (SqlType::Boolean, Value::Text(s)) => match s.to_ascii_lowercase().as_str() {
                "on" | "true" | "1" => Some(Value::Boolean(true)),
                "off" | "false" | "0" => Some(Value::Boolean(false)),
                _ => None,
            },

            (t, Value::Int64(i)) if t.is_integer() => Some(Value::Int64(*i)),
            (t, Value::UInt64(u)) if t.is_integer() => i64::try_from(*u).ok().map(Value::Int64),
            (t, Value::Boolean(b)) if t.is_integer() => Some(Value::Int64(i64::from(*b))),
            (t, Value::Text(s)) if t.is_integer() => s.trim().parse().ok().map(Value::Int64),

            (SqlType::UnsignedBigInt, Value::Int64(i)) => u64::try_from(*i).ok().map(Value::UInt64),
            (SqlType::UnsignedBigInt, Value::Text(s)) => s.trim().parse().ok().map(Value::UInt64),

            (SqlType::Real | SqlType::DoublePrecision | SqlType::Decimal { .. }, v) => match v {
                Value::Int64(i) => Some(Value::Float64(*i as f64)),
                Value::UInt64(u) => Some(Value::Float64(*u as f64)),
                Value::Float64(f) => Some(Value::Float64(*f)),
                Value::Text(s) => s.trim().parse().ok().map(Value::Float64),
                _ => None,
            },

            (t, v) if t.is_text() => Some(Value::Text(v.to_string())),

            _ => None,
        }
    }

    /// Collation and coercibility of values of this type when nothing more
    /// specific is known about the expression producing them.
    pub fn collation_coercibility(&self) -> (Collation, u8) {
        if self.is_text() {
            (Collation::default(), 4)
        } else {
            (Collation::Binary, 5)
        }
    }

    /// Get a human-readable name for this type
    pub fn display_name(&self) -> String {
        match self {
            SqlType::TinyInt => "tinyint".to_string(),
            SqlType::SmallInt => "smallint".to_string(),
            SqlType::MediumInt => "mediumint".to_string(),
            SqlType::Integer => "int".to_string(),
            SqlType::BigInt => "bigint".to_string(),
            SqlType::UnsignedBigInt => "bigint unsigned".to_string(),
            SqlType::Decimal { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => format!("decimal({p},{s})"),
                (Some(p), None) => format!("decimal({p})"),
                _ => "decimal".to_string(),
            },
            SqlType::Real => "float".to_string(),
            SqlType::DoublePrecision => "double".to_string(),
            SqlType::Char { length } => match length {
                Some(l) => format!("char({l})"),
                None => "char".to_string(),
            },
            SqlType::Varchar { length } => match length {
                Some(l) => format!("varchar({l})"),
                None => "varchar".to_string(),
            },
            SqlType::Text => "text".to_string(),
            SqlType::LongText => "longtext".to_string(),
            SqlType::Blob => "blob".to_string(),
            SqlType::Date => "date".to_string(),
            SqlType::Time => "time".to_string(),
            SqlType::Timestamp => "timestamp".to_string(),
            SqlType::Boolean => "boolean".to_string(),
            SqlType::Json => "json".to_string(),
            SqlType::Custom(name) => name.clone(),
            SqlType::Null => "null".to_string(),
            SqlType::Unknown => "unknown".to_string(),
        }
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Extract character length from CharacterLength if present
fn extract_char_length(info: Option<&sqlparser::ast::CharacterLength>) -> Option<u64> {
    info.map(|i| match i {
        sqlparser::ast::CharacterLength::IntegerLength { length, .. } => *length,
        sqlparser::ast::CharacterLength::Max => u64::MAX,
    })
}
