use thiserror::Error;

/// Failures raised while building queries or reshaping store results.
///
/// The server maps each variant onto an HTTP status: `InvalidFilter` is a
/// client error, `NotFound` a 404, and both `Coercion` and `Upstream` fail the
/// request with a 500.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid value for `{field}`: {reason}")]
    InvalidFilter { field: String, reason: String },

    #[error("field `{field}` holds {value:?}, which is not a valid {expected}")]
    Coercion {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream query failed: {0:#}")]
    Upstream(#[from] anyhow::Error),
}

impl CoreError {
    /// Report an `InvalidFilter` under the request parameter name instead of
    /// the tag column it was destined for.
    pub fn for_param(self, param: &str) -> Self {
        match self {
            CoreError::InvalidFilter { reason, .. } => CoreError::InvalidFilter {
                field: param.to_string(),
                reason,
            },
            other => other,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
