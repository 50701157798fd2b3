//! Error types for DRBM operations.
//!
//! Shape and index problems are reported here. Numeric overflow is not:
//! a non-finite partition value is returned to the caller as computed.

use std::fmt;

/// Result type alias for DRBM operations.
pub type DrbmResult<T> = Result<T, DrbmError>;

/// Errors raised by model construction, inference, training, and configuration.
#[derive(Debug)]
pub enum DrbmError {
    /// A vector or matrix does not match the layer sizes it is used with.
    InvalidDimension {
        context: String,
        expected: usize,
        got: usize,
    },
    /// A unit or label index is outside its layer.
    IndexOutOfRange {
        context: String,
        index: usize,
        len: usize,
    },
    /// A configuration value is outside its allowed range.
    InvalidConfig { parameter: String, reason: String },
    /// Reading or writing a configuration file failed.
    Io(std::io::Error),
    /// A configuration file could not be parsed or serialized.
    Parse(String),
}

impl DrbmError {
    pub fn invalid_dimension(context: impl Into<String>, expected: usize, got: usize) -> Self {
        DrbmError::InvalidDimension {
            context: context.into(),
            expected,
            got,
        }
    }

    pub fn index_out_of_range(context: impl Into<String>, index: usize, len: usize) -> Self {
        DrbmError::IndexOutOfRange {
            context: context.into(),
            index,
            len,
        }
    }

    pub fn invalid_config(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        DrbmError::InvalidConfig {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for DrbmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrbmError::InvalidDimension {
                context,
                expected,
                got,
            } => write!(
                f,
                "invalid dimension in {context}: expected {expected}, got {got}"
            ),
            DrbmError::IndexOutOfRange {
                context,
                index,
                len,
            } => write!(
                f,
                "index out of range in {context}: index {index} but length is {len}"
            ),
            DrbmError::InvalidConfig { parameter, reason } => {
                write!(f, "invalid configuration for '{parameter}': {reason}")
            }
            DrbmError::Io(err) => write!(f, "io error: {err}"),
            DrbmError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for DrbmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DrbmError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DrbmError {
    fn from(err: std::io::Error) -> Self {
        DrbmError::Io(err)
    }
}

impl From<toml::de::Error> for DrbmError {
    fn from(err: toml::de::Error) -> Self {
        DrbmError::Parse(err.to_string())
    }
}

impl From<toml::ser::Error> for DrbmError {
    fn from(err: toml::ser::Error) -> Self {
        DrbmError::Parse(err.to_string())
    }
}
