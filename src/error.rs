//! Error types.

use std::error::Error as StdError;

use derive_more::{Display, Error};
use http::{Method, StatusCode};

/// Boxed error produced by handlers and middleware.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Errors which can occur when parsing a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[non_exhaustive]
pub enum PatternError {
    /// A `**` segment was followed by further segments.
    #[display("recursive wildcard must be the last segment in pattern `{pattern}`")]
    RecursiveWildcardNotTerminal { pattern: String },

    /// A segment could not be parsed.
    #[display("invalid segment `{segment}`: {reason}")]
    InvalidSegment {
        segment: String,
        reason: &'static str,
    },

    /// The same capture name appears more than once in a pattern.
    #[display("capture name `{name}` is used more than once in pattern `{pattern}`")]
    DuplicateName { name: String, pattern: String },
}

impl PatternError {
    pub(crate) fn invalid(segment: &str, reason: &'static str) -> Self {
        PatternError::InvalidSegment {
            segment: segment.to_owned(),
            reason,
        }
    }
}

/// Errors which can occur when registering a route.
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum RouteError {
    /// Route pattern is malformed.
    #[display("{_0}")]
    Pattern(#[error(source)] PatternError),

    /// A handler for this method is already registered on the pattern.
    #[display("route {method} {pattern} is already registered")]
    Duplicate { method: Method, pattern: String },
}

impl From<PatternError> for RouteError {
    fn from(err: PatternError) -> Self {
        RouteError::Pattern(err)
    }
}

/// A registered route that can never be reached.
///
/// Produced by [`Router::validate`](crate::Router::validate).
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("route `{shadowed}` is unreachable; every path it accepts is claimed by `{shadowed_by}`")]
pub struct RouteConflict {
    /// Display form of the unreachable pattern.
    pub shadowed: String,

    /// Display form of the higher priority pattern.
    pub shadowed_by: String,
}

/// Outcome error of dispatching a request.
#[derive(Debug, Display)]
#[non_exhaustive]
pub enum Error {
    /// No route matched the path, or the matched route has no handler for the method.
    #[display("no route for {method} {path}")]
    NotFound { method: Method, path: String },

    /// Error returned by a handler or middleware.
    #[display("{_0}")]
    Handler(BoxError),
}

impl Error {
    /// Wraps an arbitrary handler failure.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Error::Handler(err.into())
    }

    pub(crate) fn not_found(method: &Method, path: &str) -> Self {
        Error::NotFound {
            method: method.clone(),
            path: path.to_owned(),
        }
    }

    /// Returns `true` if this is a [`NotFound`](Error::NotFound) outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Status code a transport layer should respond with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::NotFound { .. } => None,
            Error::Handler(err) => Some(&**err),
        }
    }
}
