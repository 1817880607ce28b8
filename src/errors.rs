use thiserror::Error;

/// Errors reported by the alignment and segmentation engines
///
/// Both variants describe a rejected call. Neither engine retries or returns a partial result.
///
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Sequence input violates a precondition, such as an empty reference or query
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Out-of-range or inconsistent configuration value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Return early with an [`Error::InvalidParameter`] built from a format string
///
macro_rules! bail_param {
    ($($arg:tt)+) => {
        return Err($crate::errors::Error::InvalidParameter(format!($($arg)+)))
    };
}

pub(crate) use bail_param;
