//! Error types for the server binary.
//!
//! [`ServerError`] is the top-level error type that wraps every failure
//! mode during startup, serving, and shutdown.

/// Top-level error for the server binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: opcsim_core::config::ConfigError,
    },

    /// The address space could not be constructed.
    #[error("address space error: {source}")]
    Build {
        /// The underlying build error.
        #[from]
        source: opcsim_core::builder::BuildError,
    },

    /// The gateway failed to bind or serve.
    #[error("gateway error: {source}")]
    Gateway {
        /// The underlying gateway server error.
        #[from]
        source: opcsim_gateway::ServerError,
    },

    /// The serving task panicked or was cancelled.
    #[error("server task error: {message}")]
    Task {
        /// Description of the task failure.
        message: String,
    },
}
