//! Schema building.
//!
//! # Data Flow
//! ```text
//! Schema::create("users", |table| ...)
//!     → Blueprint (columns + commands)
//!     → Blueprint::to_sql(connection grammar)
//!     → one Connection::statement per rendered statement
//! ```

pub mod blueprint;
pub mod grammar;

pub use blueprint::{Blueprint, ColumnDefinition, ColumnType, Command, ForeignKey, IndexCommand};
pub use grammar::{SchemaGrammar, TypeRenderer};

use crate::query::connection::Connection;
use crate::query::error::QueryResult;

/// Entry points that build a blueprint and run it on a connection.
pub struct Schema;

impl Schema {
    /// Create `table` with the columns declared by `build`.
    pub fn create(conn: &Connection, table: &str, build: impl FnOnce(&mut Blueprint)) -> QueryResult<Vec<String>> {
        let mut blueprint = Blueprint::new(table);
        blueprint.create();
        build(&mut blueprint);
        Self::execute(conn, &blueprint)
    }

    /// Modify an existing `table`.
    pub fn table(conn: &Connection, table: &str, build: impl FnOnce(&mut Blueprint)) -> QueryResult<Vec<String>> {
        let mut blueprint = Blueprint::new(table);
        build(&mut blueprint);
        Self::execute(conn, &blueprint)
    }

    pub fn rename(conn: &Connection, from: &str, to: &str) -> QueryResult<Vec<String>> {
        let mut blueprint = Blueprint::new(from);
        blueprint.rename(to);
        Self::execute(conn, &blueprint)
    }

    pub fn drop(conn: &Connection, table: &str) -> QueryResult<Vec<String>> {
        let mut blueprint = Blueprint::new(table);
        blueprint.drop();
        Self::execute(conn, &blueprint)
    }

    /// Render `blueprint` with the connection's grammar and run each
    /// statement in order. Returns the statements that were run.
    pub fn execute(conn: &Connection, blueprint: &Blueprint) -> QueryResult<Vec<String>> {
        let statements = blueprint.to_sql(conn.grammar())?;
        for sql in &statements {
            conn.statement(sql, &[])?;
        }
        tracing::info!(
            connection = %conn.name(),
            table = %blueprint.table,
            statements = statements.len(),
            "Schema updated"
        );
        Ok(statements)
    }
}
