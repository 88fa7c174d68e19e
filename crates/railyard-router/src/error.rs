/// Errors raised while building route sets and routers
///
/// Matching and generation never fail with an error: they return `None`.
/// Everything here is a configuration mistake and is reported when the
/// route declarations are loaded, not when a request arrives.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("pattern `{pattern}`: splat segment `*{name}` must be the last segment")]
    SplatNotLast { pattern: String, name: String },

    #[error("pattern `{pattern}`: a forwarding pattern cannot contain a splat segment")]
    SplatWithForward { pattern: String },

    #[error("pattern `{pattern}`: variable segment without a name")]
    EmptyVariableName { pattern: String },

    #[error("pattern `{pattern}`: forward marker `->` requires a forward_to target")]
    MissingForwardTarget { pattern: String },

    #[error("pattern `{pattern}`: forward_to `{target}` given but the pattern does not end with `->`")]
    UnexpectedForwardTarget { pattern: String, target: String },

    #[error("pattern `{pattern}`: invalid requirement for `{name}`: {message}")]
    InvalidRequirement {
        pattern: String,
        name: String,
        message: String,
    },

    #[error("pattern `{pattern}`: unknown condition `{name}`")]
    UnknownCondition { pattern: String, name: String },

    #[error("route set `{controller}` forwards to unknown route set `{target}`")]
    UnknownForwardTarget { controller: String, target: String },

    #[error("no route set registered for root controller `{0}`")]
    MissingRootSet(String),

    #[error("unknown format `{0}`")]
    UnknownFormat(String),
}
