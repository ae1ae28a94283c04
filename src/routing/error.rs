//! Routing errors.
//!
//! A request that matches no route is not an error: the matcher returns
//! `None` and [`Router::dispatch`](crate::routing::Router::dispatch) turns
//! that into a 404 response. The errors here are registration mistakes and
//! dispatch failures for a route that did match.

use thiserror::Error;

/// Raised while building the route table.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("unknown HTTP method `{0}`")]
    UnknownMethod(String),

    #[error("invalid route pattern `{uri}`: {source}")]
    InvalidPattern {
        uri: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid delegate `{0}`, expected `[bundle::]controller@method`")]
    InvalidDelegate(String),

    #[error("no route named `{0}`")]
    UnknownRoute(String),

    #[error("invalid base URL `{url}`: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("cannot switch `{0}` to https")]
    HttpsUnsupported(String),
}

/// Raised while calling a matched route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("controller `{0}` is not registered")]
    ControllerNotFound(String),

    #[error("controller `{controller}` has no action `{action}`")]
    ActionNotFound { controller: String, action: String },

    #[error("filter `{0}` is not registered")]
    FilterNotFound(String),

    #[error("delegate `{delegate}` needs captured parameter {index} but the route captured {captured}")]
    MissingCapture {
        delegate: String,
        index: usize,
        captured: usize,
    },
}

pub type RoutingResult<T> = Result<T, RoutingError>;
