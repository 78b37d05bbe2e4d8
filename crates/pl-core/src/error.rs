//! Error taxonomy for power-law fitting.
//!
//! Every failure surfaces at the point of detection as a distinct variant;
//! nothing substitutes a default parameter value. Callers branch on
//! [`PowerLawError::kind`] rather than on message text.
//!
//! Codes are stable and grouped:
//! - 10-19: input validation
//! - 20-29: numerical failures
//! - 30-39: configuration and I/O

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for power-law operations.
pub type Result<T> = std::result::Result<T, PowerLawError>;

/// Inspectable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input: non-positive cutoff, empty candidate set, zero simulations.
    InvalidParameter,
    /// No observations remain after truncation.
    EmptyData,
    /// The discrete exponent solver missed its tolerance within the iteration cap.
    Convergence,
    /// All retained observations are identical; the exponent is unidentifiable.
    DegenerateData,
    /// Configuration could not be read or failed validation.
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidParameter => write!(f, "invalid_parameter"),
            ErrorKind::EmptyData => write!(f, "empty_data"),
            ErrorKind::Convergence => write!(f, "convergence"),
            ErrorKind::DegenerateData => write!(f, "degenerate_data"),
            ErrorKind::Config => write!(f, "config"),
        }
    }
}

/// Unified error type for fitting, bootstrapping and comparison.
#[derive(Error, Debug)]
pub enum PowerLawError {
    // Input validation (10-19)
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("no observations in [{xmin}, {xmax}]")]
    EmptyData { xmin: f64, xmax: f64 },

    #[error("degenerate data: {message}")]
    DegenerateData { message: String },

    // Numerical failures (20-29)
    /// `residual` is whatever the solver last measured: a bracket width, a
    /// score, or a gradient norm.
    #[error("solver did not converge after {iterations} iterations (residual {residual:e})")]
    Convergence { iterations: usize, residual: f64 },

    // Configuration and I/O (30-39)
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PowerLawError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        PowerLawError::InvalidParameter {
            message: message.into(),
        }
    }

    pub(crate) fn degenerate(message: impl Into<String>) -> Self {
        PowerLawError::DegenerateData {
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        PowerLawError::Config {
            message: message.into(),
        }
    }

    /// Failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PowerLawError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            PowerLawError::EmptyData { .. } => ErrorKind::EmptyData,
            PowerLawError::DegenerateData { .. } => ErrorKind::DegenerateData,
            PowerLawError::Convergence { .. } => ErrorKind::Convergence,
            PowerLawError::Config { .. } | PowerLawError::Io { .. } => ErrorKind::Config,
        }
    }

    /// Stable numeric code.
    pub fn code(&self) -> u32 {
        match self {
            PowerLawError::InvalidParameter { .. } => 10,
            PowerLawError::EmptyData { .. } => 11,
            PowerLawError::DegenerateData { .. } => 12,
            PowerLawError::Convergence { .. } => 20,
            PowerLawError::Config { .. } => 30,
            PowerLawError::Io { .. } => 31,
        }
    }

    /// Whether retrying with different inputs or settings can succeed.
    ///
    /// Convergence failures may clear with a looser tolerance or a larger
    /// iteration cap; degenerate data never will.
    pub fn is_recoverable(&self) -> bool {
        match self {
            PowerLawError::InvalidParameter { .. } => true,
            PowerLawError::EmptyData { .. } => true,
            PowerLawError::DegenerateData { .. } => false,
            PowerLawError::Convergence { .. } => true,
            PowerLawError::Config { .. } => true,
            PowerLawError::Io { .. } => true,
        }
    }
}
