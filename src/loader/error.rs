//! Loader error definitions.

use thiserror::Error;

/// Errors raised while locating translation files.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// The translation root does not exist or is not a directory
    #[error("Translation root is not a directory: {0}")]
    InvalidPath(String),
    /// A configured glob pattern failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        /// The offending pattern
        pattern: String,
        /// Error reported by `globset`
        #[source]
        source: globset::Error,
    },
}
