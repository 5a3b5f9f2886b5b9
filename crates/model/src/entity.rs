use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_query::Value;

use crate::types::{DataType, Row};

/// Trait for types that can be read from database values.
///
/// Implemented for the standard Rust types a column can map to (`i32`, `String`,
/// `DateTime<Utc>`, etc.). Integer conversions accept any integer column type as long
/// as the value fits, since drivers differ in the width they report.
pub trait FetchValue: Sized {
    /// `true` for integer types, the only field types a database can generate an id
    /// for.
    const INTEGER: bool = false;

    /// Converts a single database value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be converted to the target type.
    fn from_data(value: &DataType) -> Result<Self>;

    /// Fetch a value from a row by column name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is missing or the value cannot be converted to the target type.
    fn fetch(row: &Row, col: &str) -> Result<Self> {
        Self::from_data(row_field(row, col)?)
            .with_context(|| format!("reading column '{col}'"))
    }
}

/// Declares an entity struct with automatic [`Entity`] and [`EntityValues`]
/// implementations. Each field maps to the column of the same name.
///
/// # Examples
///
/// ```ignore
/// entity! {
///     #[derive(Debug, Clone, Default)]
///     pub struct Post {
///         pub id: i64,
///         pub title: String,
///     }
/// }
/// ```
#[macro_export]
macro_rules! entity {
    (
        $(#[$meta:meta])*
        $vis:vis struct $struct_name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field_name:ident : $field_type:ty
            ),* $(,)?
        }
    ) => {
        #[allow(missing_docs)]
        $(#[$meta])*
        $vis struct $struct_name {
            $(
                $(#[$field_meta])*
                $field_vis $field_name : $field_type
            ),*
        }

        impl $crate::Entity for $struct_name {
            fn projection() -> &'static [&'static str] {
                &[ $( stringify!($field_name) ),* ]
            }

            fn from_row(row: &$crate::Row) -> $crate::__private::anyhow::Result<Self> {
                Ok(Self {
                    $(
                        $field_name: <$field_type as $crate::FetchValue>::fetch(row, stringify!($field_name))?,
                    )*
                })
            }
        }

        impl $crate::EntityValues for $struct_name {
            fn __to_values(&self) -> Vec<(&'static str, $crate::__private::Value)> {
                vec![
                    $(
                        (stringify!($field_name), self.$field_name.clone().into()),
                    )*
                ]
            }

            fn __assign(
                &mut self, column: &str, value: &$crate::DataType,
            ) -> $crate::__private::anyhow::Result<bool> {
                match column {
                    $(
                        stringify!($field_name) => {
                            self.$field_name = <$field_type as $crate::FetchValue>::from_data(value)?;
                            Ok(true)
                        }
                    )*
                    _ => Ok(false),
                }
            }

            fn __is_integer(column: &str) -> bool {
                match column {
                    $(
                        stringify!($field_name) => <$field_type as $crate::FetchValue>::INTEGER,
                    )*
                    _ => false,
                }
            }
        }
    };
}

/// Row mapping for a database entity.
///
/// Typically implemented via the `entity!` macro rather than manually.
pub trait Entity: Sized {
    /// Column names to select when fetching this entity.
    fn projection() -> &'static [&'static str];

    /// Construct an entity instance from a database row.
    ///
    /// # Errors
    ///
    /// Returns an error if any required column is missing or cannot be converted to the expected type.
    fn from_row(row: &Row) -> Result<Self>;
}

/// Internal trait for reading and writing entity values. Automatically implemented by
/// the `entity!` macro.
#[doc(hidden)]
pub trait EntityValues {
    fn __to_values(&self) -> Vec<(&'static str, Value)>;

    /// Sets the field named `column`. Returns `false` when there is no such field.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be converted to the field's type.
    fn __assign(&mut self, column: &str, value: &DataType) -> Result<bool>;

    /// Whether the field named `column` holds an integer.
    fn __is_integer(column: &str) -> bool
    where
        Self: Sized;
}

// Outbound conversion (internal use only)
pub(crate) fn value_to_datatype(value: Value) -> Result<DataType> {
    let data_type = match value {
        Value::Bool(v) => DataType::Boolean(v),
        Value::TinyInt(v) => DataType::Int32(v.map(i32::from)),
        Value::SmallInt(v) => DataType::Int32(v.map(i32::from)),
        Value::Int(v) => DataType::Int32(v),
        Value::BigInt(v) => DataType::Int64(v),
        Value::TinyUnsigned(v) => DataType::Uint32(v.map(u32::from)),
        Value::SmallUnsigned(v) => DataType::Uint32(v.map(u32::from)),
        Value::Unsigned(v) => DataType::Uint32(v),
        Value::BigUnsigned(v) => DataType::Uint64(v),
        Value::Float(v) => DataType::Float(v),
        Value::Double(v) => DataType::Double(v),
        Value::String(v) => DataType::Str(v.map(|value| *value)),
        Value::Char(v) => DataType::Str(v.map(|ch| ch.to_string())),
        Value::Bytes(v) => DataType::Binary(v.map(|bytes| *bytes)),
        Value::ChronoDate(v) => DataType::Date(v.map(|date| date.to_string())),
        Value::ChronoTime(v) => DataType::Time(v.map(|time| time.to_string())),
        Value::ChronoDateTime(v) => DataType::Timestamp(v.map(|dt| dt.to_string())),
        Value::ChronoDateTimeUtc(v) => DataType::Timestamp(v.map(|dt| dt.to_rfc3339())),
        _ => {
            bail!("unsupported values require explicit conversion before building the query")
        }
    };
    Ok(data_type)
}

// Inbound conversion
impl FetchValue for bool {
    fn from_data(value: &DataType) -> Result<Self> {
        match value {
            DataType::Boolean(Some(v)) => Ok(*v),
            // SQLite and MySQL store booleans as integers
            other => as_i64(other).map(|v| v != 0).map_err(|_e| anyhow!("expected boolean data type")),
        }
    }
}

impl FetchValue for i32 {
    const INTEGER: bool = true;

    fn from_data(value: &DataType) -> Result<Self> {
        Ok(Self::try_from(as_i64(value)?)?)
    }
}

impl FetchValue for i64 {
    const INTEGER: bool = true;

    fn from_data(value: &DataType) -> Result<Self> {
        as_i64(value)
    }
}

impl FetchValue for u32 {
    const INTEGER: bool = true;

    fn from_data(value: &DataType) -> Result<Self> {
        match value {
            DataType::Uint64(Some(v)) => Ok(Self::try_from(*v)?),
            other => Ok(Self::try_from(as_i64(other)?)?),
        }
    }
}

impl FetchValue for u64 {
    const INTEGER: bool = true;

    fn from_data(value: &DataType) -> Result<Self> {
        match value {
            DataType::Uint64(Some(v)) => Ok(*v),
            other => Ok(Self::try_from(as_i64(other)?)?),
        }
    }
}

impl FetchValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_data(value: &DataType) -> Result<Self> {
        match value {
            DataType::Float(Some(v)) => Ok(*v),
            DataType::Double(Some(v)) => Ok(*v as Self),
            _ => bail!("expected float data type"),
        }
    }
}

impl FetchValue for f64 {
    fn from_data(value: &DataType) -> Result<Self> {
        match value {
            DataType::Float(Some(v)) => Ok(Self::from(*v)),
            DataType::Double(Some(v)) => Ok(*v),
            _ => bail!("expected double data type"),
        }
    }
}

impl FetchValue for String {
    fn from_data(value: &DataType) -> Result<Self> {
        match value {
            DataType::Str(Some(raw))
            | DataType::Date(Some(raw))
            | DataType::Time(Some(raw))
            | DataType::Timestamp(Some(raw)) => Ok(raw.clone()),
            _ => bail!("expected string data type"),
        }
    }
}

impl FetchValue for Vec<u8> {
    fn from_data(value: &DataType) -> Result<Self> {
        match value {
            DataType::Binary(Some(bytes)) => Ok(bytes.clone()),
            _ => bail!("expected binary data type"),
        }
    }
}

impl FetchValue for DateTime<Utc> {
    fn from_data(value: &DataType) -> Result<Self> {
        match value {
            DataType::Timestamp(Some(raw)) | DataType::Str(Some(raw)) => parse_timestamp(raw),
            _ => bail!("expected timestamp data type"),
        }
    }
}

impl FetchValue for NaiveDate {
    fn from_data(value: &DataType) -> Result<Self> {
        match value {
            DataType::Date(Some(raw)) | DataType::Str(Some(raw)) => {
                Self::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_e| anyhow!("unsupported date: {raw}; expected \"%Y-%m-%d\" format"))
            }
            _ => bail!("expected date data type"),
        }
    }
}

impl FetchValue for serde_json::Value {
    fn from_data(value: &DataType) -> Result<Self> {
        match value {
            DataType::Str(Some(raw)) => Ok(serde_json::from_str(raw)?),
            DataType::Binary(Some(bytes)) => Ok(serde_json::from_slice(bytes)?),
            _ => bail!("expected json compatible data type"),
        }
    }
}

impl<T: FetchValue> FetchValue for Option<T> {
    const INTEGER: bool = T::INTEGER;

    fn from_data(value: &DataType) -> Result<Self> {
        if value.is_null() { Ok(None) } else { T::from_data(value).map(Some) }
    }

    fn fetch(row: &Row, col: &str) -> Result<Self> {
        match row_field(row, col) {
            Ok(field) if !field.is_null() => Ok(Some(T::fetch(row, col)?)),
            _ => Ok(None),
        }
    }
}

fn row_field<'a>(row: &'a Row, name: &str) -> Result<&'a DataType> {
    row.fields
        .iter()
        .find(|field| field.name == name)
        .map(|field| &field.value)
        .ok_or_else(|| anyhow!("missing column '{name}'"))
}

fn as_i64(value: &DataType) -> Result<i64> {
    match value {
        DataType::Int32(Some(v)) => Ok(i64::from(*v)),
        DataType::Int64(Some(v)) => Ok(*v),
        DataType::Uint32(Some(v)) => Ok(i64::from(*v)),
        DataType::Uint64(Some(v)) => Ok(i64::try_from(*v)?),
        _ => bail!("expected integer data type"),
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(parsed, Utc));
    }
    bail!("unsupported timestamp: {raw}; expected RFC3339 or \"%Y-%m-%d %H:%M:%S%.f\" format")
}
