//! Errors

use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = anyhow::Result<T, ModelError>;

/// Errors raised while building or executing model queries.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A parameter value was read without first checking it exists.
    #[error("retrieving `params[\"{param}\"]` without `params.exists(\"{param}\")`")]
    ParamUnchecked {
        /// Name of the offending parameter.
        param: String,
    },

    /// One or more caller-supplied parameters were never consumed.
    #[error("unused params: {}", params.join(", "))]
    UnusedParams {
        /// Sorted, de-duplicated names of the unread parameters.
        params: Vec<String>,
    },

    /// A parameter was supplied with a value the consumer cannot use.
    #[error("invalid value for param `{param}`: {reason}")]
    InvalidParam {
        /// Name of the offending parameter.
        param: String,
        /// What was wrong with the value.
        reason: String,
    },

    /// A data object is not an instance of the model being operated on.
    #[error("argument `data` must be of type {expected}")]
    TypeMismatch {
        /// Name of the expected model type.
        expected: &'static str,
    },

    /// An element of a batch is not an instance of the model being operated on.
    #[error("invalid item type in data[{index}], must be of type {expected}")]
    ItemTypeMismatch {
        /// Position of the first offending element.
        index: usize,
        /// Name of the expected model type.
        expected: &'static str,
    },

    /// A column name does not match any field of the model.
    #[error("unknown column `{column}` for table `{table}`")]
    UnknownColumn {
        /// Table the column was looked up in.
        table: String,
        /// The unknown column.
        column: String,
    },

    /// An update or upsert has no key columns to match rows on.
    #[error("no key columns to match rows in table `{table}`")]
    MissingKeys {
        /// Table being written.
        table: String,
    },

    /// Query building or execution failed in the SQL layer.
    #[error(transparent)]
    Sql(#[from] anyhow::Error),
}

impl ModelError {
    /// Builds an [`ModelError::InvalidParam`] for `param`.
    pub(crate) fn invalid_param(param: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            param: param.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Context, anyhow};

    use super::ModelError;

    #[test]
    fn unused_params_display() {
        let err = ModelError::UnusedParams {
            params: vec!["bravo".to_string(), "charlie".to_string()],
        };
        assert_eq!(err.to_string(), "unused params: bravo, charlie");
    }

    #[test]
    fn unchecked_display() {
        let err = ModelError::ParamUnchecked {
            param: "alpha".to_string(),
        };
        assert_eq!(err.to_string(), "retrieving `params[\"alpha\"]` without `params.exists(\"alpha\")`");
    }

    #[test]
    fn sql_errors_keep_context() {
        let result: anyhow::Result<()> = Err(anyhow!("no such table: users")).context("executing select");
        let err: ModelError = result.unwrap_err().into();

        // transparent: display is the outer context, the chain is preserved
        assert_eq!(err.to_string(), "executing select");
        let ModelError::Sql(inner) = err else {
            panic!("expected Sql variant");
        };
        assert_eq!(format!("{inner:#}"), "executing select: no such table: users");
    }
}
