// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recflow Core Error Types
//!
//! Error taxonomy for the record-stream runtime. Configuration errors are
//! detected eagerly, before any record is read; mid-stream errors are fatal
//! to the whole run (single-pass, single-attempt batch model).

use thiserror::Error;

/// Result type for recflow operations
pub type RecflowResult<T> = Result<T, RecflowError>;

/// Recflow error types
#[derive(Error, Debug)]
pub enum RecflowError {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("missing required parameter: {parameter}")]
    MissingParameter { parameter: String },

    #[error("format '{format}' not supported")]
    UnsupportedFormat { format: String },

    #[error("{filename}: {message}")]
    Format { filename: String, message: String },

    #[error("runtime error: {message}")]
    Runtime { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// Custom error creation helpers
impl RecflowError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a missing-parameter error
    pub fn missing_parameter(parameter: impl Into<String>) -> Self {
        Self::MissingParameter {
            parameter: parameter.into(),
        }
    }

    /// Create an unsupported-format error
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Create a malformed-input error tagged with its source file
    pub fn format(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a runtime error
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }
}

/// Abort the process on an unrecoverable mid-stream error.
///
/// Transformer workers have no return path for errors once the stream is
/// flowing; continuing after one would risk silently wrong output, so the
/// run is terminated with a diagnostic and exit code 1.
pub fn fatal(err: &RecflowError) -> ! {
    log::error!("fatal: {err}");
    eprintln!("recflow: {err}");
    std::process::exit(1);
}
