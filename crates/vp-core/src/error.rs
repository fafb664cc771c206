//! Error types for vp-core

use thiserror::Error;

/// Core error type for vetphysio-schema
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C004: Invalid migration unit identifier
    #[error("[C004] Invalid migration id '{id}': {reason}")]
    InvalidUnitId { id: String, reason: String },

    /// C005: Unit file could not be parsed
    #[error("[C005] Failed to parse migration file {path}: {details}")]
    UnitParseError { path: String, details: String },

    /// C006: Unit has no executable statements
    #[error("[C006] Migration '{id}' has no statements")]
    EmptyUnit { id: String },

    /// C007: Two units share an identifier
    #[error("[C007] Duplicate migration id '{id}' ({first} and {second})")]
    DuplicateUnit {
        id: String,
        first: String,
        second: String,
    },

    /// C008: IO error
    #[error("[C008] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// C009: IO error with file path context
    #[error("[C009] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C010: YAML parse error
    #[error("[C010] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// C011: Unit step is malformed
    #[error("[C011] Migration '{id}' is invalid: {reason}")]
    InvalidUnit { id: String, reason: String },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
