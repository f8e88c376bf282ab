use thiserror::Error;

/// Errors reported synchronously by [`TranslationRegistry`](super::TranslationRegistry).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A bundle was registered without a locale identifier
    #[error("Translation bundle has an empty locale identifier")]
    EmptyLocale,
    /// The configured key separator is empty
    #[error("Key separator cannot be empty")]
    EmptySeparator,
}
