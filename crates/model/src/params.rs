//! Tracked query-building parameters.
//!
//! [`ModelParams`] wraps the parameters a caller hands to a select operation and
//! enforces a strict consumption contract:
//!
//! - a value may only be read after its key was existence-checked with
//!   [`ModelParams::exists`], and
//! - once query building is done, every supplied key must have been read, otherwise
//!   [`ModelParams::check_used`] fails.
//!
//! A misspelled parameter (e.g. `@order_by` instead of `@orderBy`) is therefore reported
//! at query construction time instead of being silently ignored.
//!
//! ```ignore
//! let mut params = ModelParams::new(params! { "name" => "Ada" });
//! if params.exists("name") {
//!     if let Some(name) = params.get_as::<String>("name")? {
//!         query = query.r#where(Filter::eq("name", name));
//!     }
//! }
//! params.check_used()?;
//! ```

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ModelError, Result};

/// Caller-supplied query parameters, keyed by name, in insertion order.
pub type Params = Map<String, Value>;

/// Builds a [`Params`] map. Values are converted with `serde_json::json!`.
///
/// ```ignore
/// let params = params! { "@limit" => 10, "tags" => ["a", "b"] };
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut params = $crate::Params::new();
        $(
            params.insert(::std::string::ToString::to_string(&$key), $crate::__private::json!($value));
        )+
        params
    }};
}

/// Parameter set that records which keys were checked and which were read.
#[derive(Debug, Clone, Default)]
pub struct ModelParams {
    values: Params,
    checked: HashSet<String>,
    read: HashSet<String>,
}

impl ModelParams {
    /// Wraps a set of caller-supplied parameters.
    #[must_use]
    pub fn new(values: Params) -> Self {
        Self {
            values,
            checked: HashSet::new(),
            read: HashSet::new(),
        }
    }

    /// Returns `true` when `key` was supplied, marking the key as checked whatever the
    /// outcome.
    pub fn exists(&mut self, key: &str) -> bool {
        self.checked.insert(key.to_string());
        self.values.contains_key(key)
    }

    /// Reads the value of `key`, marking it as used.
    ///
    /// A checked key that was not supplied yields [`Value::Null`].
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ParamUnchecked`] if `key` was never passed to
    /// [`ModelParams::exists`].
    pub fn get(&mut self, key: &str) -> Result<Value> {
        if !self.checked.contains(key) {
            return Err(ModelError::ParamUnchecked {
                param: key.to_string(),
            });
        }
        self.read.insert(key.to_string());
        Ok(self.values.get(key).cloned().unwrap_or(Value::Null))
    }

    /// Reads the value of `key` and deserializes it.
    ///
    /// Returns `None` for absent or `null` values.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ParamUnchecked`] as [`ModelParams::get`] does, or
    /// [`ModelError::InvalidParam`] when the value does not deserialize into `T`.
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Value::Null => Ok(None),
            value => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ModelError::invalid_param(key, e.to_string())),
        }
    }

    /// Reads a nested option group.
    ///
    /// Arrays and objects are returned as they are; any other value yields an empty
    /// object.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ParamUnchecked`] as [`ModelParams::get`] does.
    pub fn subparams(&mut self, key: &str) -> Result<Value> {
        Ok(match self.get(key)? {
            value @ (Value::Array(_) | Value::Object(_)) => value,
            _ => Value::Object(Map::new()),
        })
    }

    /// Inserts or overwrites a parameter. Checked and read state is left untouched.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when no parameters were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the parameters in insertion order without marking anything.
    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.values.iter()
    }

    /// Sorted names of the parameters that were never read.
    #[must_use]
    pub fn unused(&self) -> Vec<String> {
        let mut unused: Vec<String> =
            self.values.keys().filter(|key| !self.read.contains(*key)).cloned().collect();
        unused.sort();
        unused.dedup();
        unused
    }

    /// Checks that every supplied parameter was read.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnusedParams`] naming every unread parameter.
    pub fn check_used(&self) -> Result<()> {
        let unused = self.unused();
        if unused.is_empty() {
            return Ok(());
        }
        tracing::debug!(params = ?unused, "unused query params");
        Err(ModelError::UnusedParams { params: unused })
    }
}

impl From<Params> for ModelParams {
    fn from(values: Params) -> Self {
        Self::new(values)
    }
}

impl<'a> IntoIterator for &'a ModelParams {
    type IntoIter = serde_json::map::Iter<'a>;
    type Item = (&'a String, &'a Value);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
