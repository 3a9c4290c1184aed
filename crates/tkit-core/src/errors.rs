//! Error types for tkit-core.

use thiserror::Error;

/// Errors raised by configuration-time operations.
///
/// Failures of instrumented work are never surfaced through this type; they
/// are captured as [`crate::failure::FailureReport`] values and printed.
#[derive(Error, Debug)]
pub enum TkitError {
    /// A color name that the engine does not know.
    #[error("Unknown color `{0}`. Run `tkit colors` to list the known colors.")]
    UnknownColor(String),

    /// A color mode other than always/never/auto.
    #[error("Unknown color mode `{0}`. Use 'always', 'never', or 'auto'.")]
    InvalidColorMode(String),

    /// A configuration value is invalid.
    #[error("Invalid configuration: {message}. {hint}")]
    InvalidConfiguration {
        /// Description of the invalid configuration.
        message: String,
        /// Actionable hint on how to fix it.
        hint: String,
    },

    /// The configuration file exists but could not be read or parsed.
    #[error("Config invalid: {0}")]
    InvalidConfigFile(String),
}

/// Result alias used across tkit-core.
pub type Result<T, E = TkitError> = std::result::Result<T, E>;
