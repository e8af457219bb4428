//! Error types for the playlist builder

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the playlist builder.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed playlist spec structure
    #[error("invalid playlist spec: {0}")]
    Spec(String),

    /// Lexer/parser fault in a combiner expression
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// A combiner expression referenced a playlist that was never built
    #[error("unknown playlist \"{0}\" referenced by a combiner expression")]
    UnknownPlaylist(String),

    /// Malformed wildcard pattern
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Failed to deserialize the collection
    #[error("failed to load collection: {0}")]
    CollectionLoad(#[source] anyhow::Error),

    /// Failed to serialize the collection
    #[error("failed to write collection: {0}")]
    CollectionWrite(#[source] anyhow::Error),
}

impl Error {
    /// Process exit code for this error when surfaced by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Spec(_) => 2,
            Error::Expression(_) => 3,
            Error::UnknownPlaylist(_) => 4,
            Error::CollectionLoad(_) => 5,
            Error::Config(_) | Error::Pattern(_) | Error::CollectionWrite(_) => 1,
        }
    }
}

/// A fault found while lexing or parsing a combiner expression.
/// Carries the byte offset of the offending token within the expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expression error at offset {offset}: {message}")]
pub struct ExpressionError {
    pub offset: usize,
    pub message: String,
}

impl ExpressionError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// A malformed wildcard pattern handed to one of the glob predicates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid pattern \"{pattern}\": {message}")]
pub struct PatternError {
    pub pattern: String,
    pub message: String,
}

impl PatternError {
    pub fn new(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}
