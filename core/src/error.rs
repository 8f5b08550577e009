//! Error types for the Watershed client.
//!
//! # Design
//! Only failures the caller cannot act on through a status code are errors:
//! a connection that could not be made, a configuration the client refuses to
//! send, or a vocabulary term it cannot translate. A non-success HTTP status
//! is an ordinary result (`success == false`) and never lands here.

use thiserror::Error;

/// Errors returned by `WatershedClient` operations and the vocabulary helpers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, refused connection,
    /// TLS, broken socket).
    #[error("request failed: {0}")]
    Transport(String),

    /// The configured auth method is not one the client can send.
    #[error("unsupported authentication method: {0}")]
    UnsupportedAuthMethod(String),

    /// A measure phrase contained a word missing from the translation tables.
    #[error("unknown vocabulary term: {0}")]
    UnknownVocabulary(String),

    /// A card template name missing from the template table.
    #[error("unknown card template: {0}")]
    UnknownTemplate(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A success response body did not have the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

/// Errors raised while assembling a `ClientConfig` from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),
}
