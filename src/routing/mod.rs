//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     register / group / controller
//!     → table.rs (merge group attributes, split literal vs fallback,
//!       compile wildcard patterns)
//!     → Router::freeze → Arc<Router>
//!
//! Incoming request (method, URI)
//!     → matcher.rs (literal key, then patterns: literal list, fallback list)
//!     → route.rs (before filters → controller / handler → after filters)
//!     → Response, or 404 when nothing matched
//! ```
//!
//! # Design Decisions
//! - Routes compiled at registration, immutable once frozen
//! - Literal lookup always precedes regex matching
//! - First registered pattern wins; leading-`(` routes are scanned last
//! - Controller and filter lookup go through traits so applications can
//!   plug in their own registries

pub mod action;
pub mod controller;
pub mod error;
pub mod filters;
pub mod matcher;
pub mod method;
pub mod route;
pub mod router;
pub mod table;
pub mod url;
pub mod wildcard;

pub use action::{Action, Delegate, DelegateMethod, Handler, Response, RouteAction, DEFAULT_BUNDLE};
pub use controller::{Controller, ControllerResolver, Controllers};
pub use error::{DispatchError, RoutingError, RoutingResult};
pub use filters::{Filter, FilterCall, FilterRegistry, Filters};
pub use method::Method;
pub use route::Route;
pub use router::Router;
pub use table::{GroupAttributes, RouteDefinition, RouteTable, RouteUris};
pub use url::UrlGenerator;
