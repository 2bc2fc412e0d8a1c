//! Error types shared by every nosqlmap adapter.

use crate::value::Value;

/// Boxed driver error. Adapters carry these through without translating them.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised at the adapter boundary.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// A required argument was blank or null. Raised before the backend is
    /// touched.
    #[error("{0} is required")]
    NullArgument(&'static str),

    /// Failure reported by the storage driver, passed through untouched.
    #[error(transparent)]
    Backend(BoxError),
}

impl MappingError {
    /// Wrap a driver error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        MappingError::Backend(Box::new(err))
    }
}

/// Reject blank keys.
pub fn require_key(key: &str) -> Result<(), MappingError> {
    require_text(key, "key")
}

/// Reject [`Value::Null`].
pub fn require_value(value: &Value) -> Result<(), MappingError> {
    if value.is_null() {
        return Err(MappingError::NullArgument("value"));
    }
    Ok(())
}

/// Reject blank text arguments, naming the argument in the error.
pub fn require_text(text: &str, argument: &'static str) -> Result<(), MappingError> {
    if text.trim().is_empty() {
        return Err(MappingError::NullArgument(argument));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("connection reset")]
    struct DriverDown;

    #[test]
    fn backend_errors_render_transparently() {
        let err = MappingError::backend(DriverDown);
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn null_argument_names_the_argument() {
        let err = require_text("", "query").expect_err("blank query must fail");
        assert_eq!(err.to_string(), "query is required");
    }
}
