//! Errors surfaced by the authorization layer.

use thiserror::Error;

/// Error type for guarded resolver calls.
///
/// Every variant is a value returned to the caller. A guarded call never
/// yields a partial result alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No rule matched the operation, identity and resource combination.
    #[error("Unauthorized")]
    Unauthorized,

    /// The wrapped resolver reported a failure.
    ///
    /// The message is the resolver's own and is surfaced verbatim.
    #[error("{0}")]
    Resolver(String),

    /// A whitelist branch was declared over a value that is neither an
    /// object, a list nor null.
    #[error("Whitelist entry `{path}` expects an object or list, found {found}")]
    MalformedWhitelistEntry {
        /// Dotted path of the offending field (`posts[0].author`).
        path: String,
        /// Kind of the value found at that path.
        found: &'static str,
    },
}

/// Result type for guarded operations.
pub type Result<T> = std::result::Result<T, AuthError>;
