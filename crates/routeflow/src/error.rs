use thiserror::Error;

/// Errors produced by the routing layer itself.
///
/// Handler faults are not part of this taxonomy; they cross the engine
/// boundary as [`BoxError`](crate::BoxError) untouched.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The pattern did not compile. Raised at registration time, never
    /// deferred to dispatch.
    #[error("invalid route pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A route referenced a handler name with no registered factory.
    /// Surfaces at dispatch time because name resolution is lazy.
    #[error("no handler registered under name '{0}'")]
    UnknownHandler(String),
}
