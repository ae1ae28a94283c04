//! Fluent SQL query building.
//!
//! # Data Flow
//! ```text
//! Query::table("users").where_(..).order_by(..)   (clause model + bindings)
//!     → Query::get / count / update / ...         (execution, takes &Connection)
//!     → Grammar renders SQL with `?` placeholders
//!     → Connection normalizes bindings and calls the Driver
//! ```

pub mod builder;
pub mod clause;
pub mod connection;
pub mod dynamic;
pub mod error;
pub mod paginate;
pub mod value;

pub use builder::{record, Query, Record};
pub use clause::{AggregateFn, Clause, Connector, Direction, Join, JoinKind};
pub use connection::{Connection, Driver, LoggedQuery, QueryOutput, Row};
pub use error::{DriverError, QueryError, QueryResult};
pub use paginate::Paginator;
pub use value::{raw, Column, Expression, Value};
