//! Trellis: a URL router and a fluent SQL query builder.
//!
//! # Architecture Overview
//!
//! ```text
//!   (method, URI)                                        fluent calls
//!        │                                                     │
//!        ▼                                                     ▼
//!  ┌───────────┐   ┌───────────┐   ┌───────────┐        ┌─────────────┐
//!  │  matcher  │──▶│   route   │──▶│  filters  │        │    query    │
//!  │ (literal, │   │ (params,  │   │ controller│        │  (clauses,  │
//!  │ fallback) │   │ defaults) │   │  resolver │        │  bindings)  │
//!  └─────▲─────┘   └───────────┘   └───────────┘        └──────┬──────┘
//!        │                                                     │
//!  ┌─────┴─────┐                                        ┌──────▼──────┐
//!  │   table   │◀── config (routes, groups,             │   grammar   │
//!  │ wildcards │    controllers)                        │ (dialects,  │
//!  └───────────┘                                        │   schema)   │
//!                                                       └──────┬──────┘
//!                                                              ▼
//!                                                     connection → driver
//! ```

pub mod config;
pub mod grammar;
pub mod observability;
pub mod query;
pub mod routing;
pub mod schema;

pub use config::schema::AppConfig;
pub use grammar::{Grammar, GrammarRegistry};
pub use query::{Connection, Query, Value};
pub use routing::{Method, Response, RouteAction, RouteTable, Router};
pub use schema::Schema;
