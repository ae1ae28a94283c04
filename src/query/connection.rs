//! Database connection boundary.
//!
//! # Responsibilities
//! - Pair a driver with the grammar selected for its driver name
//! - Normalize bindings (dates, booleans) right before execution
//! - Wrap driver failures with the SQL and bindings that caused them
//! - Keep an in-memory query log when profiling is enabled
//!
//! # Design Decisions
//! - The driver is an external collaborator behind the [`Driver`] trait
//! - No retries: driver errors (timeouts included) propagate unchanged

use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::schema::ConnectionConfig;
use crate::grammar::{Grammar, GrammarRegistry};
use crate::observability::metrics;
use crate::query::builder::Query;
use crate::query::error::{DriverError, QueryError, QueryResult};
use crate::query::value::{Column, Value};

/// A single result row, columns in driver order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Value of the first column.
    pub fn first(&self) -> Option<&Value> {
        self.columns.first().map(|(_, value)| value)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let idx = self.columns.iter().position(|(name, _)| name == column)?;
        Some(self.columns.remove(idx).1)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// What a driver hands back for one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Rows(Vec<Row>),
    Affected(u64),
}

/// External database driver.
pub trait Driver: Send + Sync {
    /// Execute `sql` with positional `bindings`.
    fn run(&self, sql: &str, bindings: &[Value]) -> Result<QueryOutput, DriverError>;

    /// Key generated by the last INSERT on this session.
    fn last_insert_id(&self) -> Result<Value, DriverError>;

    /// Quote a value as a SQL literal.
    fn quote(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => i64::from(*b).to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Raw(e) => e.to_string(),
            other => format!("'{}'", other.to_string().replace('\'', "''")),
        }
    }
}

/// One entry of the query log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedQuery {
    pub sql: String,
    pub bindings: Vec<Value>,
    pub elapsed: Duration,
}

/// A named database connection.
pub struct Connection {
    name: String,
    grammar: Arc<dyn Grammar>,
    driver: Box<dyn Driver>,
    profile: bool,
    queries: Mutex<Vec<LoggedQuery>>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("grammar", &self.grammar.name())
            .field("profile", &self.profile)
            .finish()
    }
}

impl Connection {
    /// Create a connection with an explicit grammar.
    pub fn new(name: impl Into<String>, grammar: Arc<dyn Grammar>, driver: Box<dyn Driver>) -> Self {
        Self {
            name: name.into(),
            grammar,
            driver,
            profile: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Create a connection whose grammar is chosen by the configured driver name.
    pub fn from_config(
        name: impl Into<String>,
        config: &ConnectionConfig,
        registry: &GrammarRegistry,
        driver: Box<dyn Driver>,
    ) -> Self {
        let mut conn = Self::new(name, registry.resolve(&config.driver), driver);
        conn.profile = config.profile;
        tracing::info!(
            connection = %conn.name,
            driver = %config.driver,
            grammar = conn.grammar.name(),
            "Database connection configured"
        );
        conn
    }

    /// Enable or disable the in-memory query log.
    pub fn with_profiling(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grammar(&self) -> &dyn Grammar {
        self.grammar.as_ref()
    }

    /// Start a query against `table`.
    pub fn table(&self, table: impl Into<Column>) -> Query {
        Query::table(table)
    }

    /// Run a statement and return the driver output untouched.
    pub fn query(&self, sql: &str, bindings: &[Value]) -> QueryResult<QueryOutput> {
        self.execute(sql, bindings)
    }

    /// Run a SELECT and return its rows.
    pub fn select(&self, sql: &str, bindings: &[Value]) -> QueryResult<Vec<Row>> {
        match self.execute(sql, bindings)? {
            QueryOutput::Rows(rows) => Ok(rows),
            QueryOutput::Affected(_) => Ok(Vec::new()),
        }
    }

    /// First row of a SELECT.
    pub fn first(&self, sql: &str, bindings: &[Value]) -> QueryResult<Option<Row>> {
        Ok(self.select(sql, bindings)?.into_iter().next())
    }

    /// First column of the first row, or NULL.
    pub fn only(&self, sql: &str, bindings: &[Value]) -> QueryResult<Value> {
        Ok(self
            .first(sql, bindings)?
            .and_then(|row| row.first().cloned())
            .unwrap_or(Value::Null))
    }

    /// Run an UPDATE/DELETE and return the affected row count.
    pub fn affecting(&self, sql: &str, bindings: &[Value]) -> QueryResult<u64> {
        match self.execute(sql, bindings)? {
            QueryOutput::Affected(count) => Ok(count),
            QueryOutput::Rows(rows) => Ok(rows.len() as u64),
        }
    }

    /// Run a statement for its side effect.
    pub fn statement(&self, sql: &str, bindings: &[Value]) -> QueryResult<bool> {
        self.execute(sql, bindings)?;
        Ok(true)
    }

    pub fn last_insert_id(&self) -> QueryResult<Value> {
        self.driver
            .last_insert_id()
            .map_err(|source| QueryError::Execution {
                sql: "<last insert id>".to_string(),
                bindings: Vec::new(),
                source,
            })
    }

    pub fn quote(&self, value: &Value) -> String {
        self.driver.quote(value)
    }

    /// Snapshot of the query log (empty unless profiling).
    pub fn queries(&self) -> Vec<LoggedQuery> {
        self.queries
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Convert bindings into the shapes drivers accept.
    ///
    /// Dates become strings in the grammar's datetime format, booleans
    /// become integers and raw expressions are dropped (they are inlined).
    pub fn normalize_bindings(&self, bindings: &[Value]) -> Vec<Value> {
        let format = self.grammar.datetime_format();
        bindings
            .iter()
            .filter(|value| !value.is_raw())
            .map(|value| match value {
                Value::DateTime(dt) => Value::Text(dt.format(format).to_string()),
                Value::Bool(b) => Value::Int(i64::from(*b)),
                other => other.clone(),
            })
            .collect()
    }

    fn execute(&self, sql: &str, bindings: &[Value]) -> QueryResult<QueryOutput> {
        let bindings = self.normalize_bindings(bindings);
        let start = Instant::now();

        tracing::debug!(connection = %self.name, sql = %sql, bindings = ?bindings, "Executing query");

        match self.driver.run(sql, &bindings) {
            Ok(output) => {
                let elapsed = start.elapsed();
                metrics::record_query(&self.name, elapsed);
                if self.profile {
                    if let Ok(mut log) = self.queries.lock() {
                        log.push(LoggedQuery {
                            sql: sql.to_string(),
                            bindings,
                            elapsed,
                        });
                    }
                }
                Ok(output)
            }
            Err(source) => {
                metrics::record_query_error(&self.name);
                tracing::error!(connection = %self.name, sql = %sql, error = %source, "Query failed");
                Err(QueryError::Execution {
                    sql: sql.to_string(),
                    bindings,
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GenericGrammar, SqlServerGrammar};
    use chrono::NaiveDate;

    struct Echo;

    impl Driver for Echo {
        fn run(&self, _sql: &str, bindings: &[Value]) -> Result<QueryOutput, DriverError> {
            let row: Row = bindings
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("c{}", i), v.clone()))
                .collect();
            Ok(QueryOutput::Rows(vec![row]))
        }

        fn last_insert_id(&self) -> Result<Value, DriverError> {
            Ok(Value::Int(1))
        }
    }

    struct Failing;

    impl Driver for Failing {
        fn run(&self, _sql: &str, _bindings: &[Value]) -> Result<QueryOutput, DriverError> {
            Err("connection reset".into())
        }

        fn last_insert_id(&self) -> Result<Value, DriverError> {
            Err("connection reset".into())
        }
    }

    fn sample_datetime() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(14, 5, 0))
            .unwrap()
    }

    #[test]
    fn test_binding_normalization() {
        let conn = Connection::new("main", Arc::new(GenericGrammar), Box::new(Echo));
        let bindings = conn.normalize_bindings(&[
            Value::DateTime(sample_datetime()),
            Value::Bool(true),
            Value::Raw(crate::query::value::raw("NOW()")),
            Value::Int(3),
        ]);
        assert_eq!(
            bindings,
            vec![
                Value::Text("2024-03-09 14:05:00".into()),
                Value::Int(1),
                Value::Int(3),
            ]
        );
    }

    #[test]
    fn test_sqlserver_datetime_format() {
        let conn = Connection::new("mssql", Arc::new(SqlServerGrammar), Box::new(Echo));
        let bindings = conn.normalize_bindings(&[Value::DateTime(sample_datetime())]);
        assert_eq!(bindings, vec![Value::Text("2024-03-09 14:05:00.000".into())]);
    }

    #[test]
    fn test_execution_error_carries_sql_and_bindings() {
        let conn = Connection::new("main", Arc::new(GenericGrammar), Box::new(Failing));
        let err = conn.select("SELECT ?", &[Value::Bool(false)]).unwrap_err();
        match err {
            QueryError::Execution { sql, bindings, .. } => {
                assert_eq!(sql, "SELECT ?");
                assert_eq!(bindings, vec![Value::Int(0)]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_profiling_log() {
        let conn = Connection::new("main", Arc::new(GenericGrammar), Box::new(Echo)).with_profiling(true);
        let value = conn.only("SELECT ?", &[Value::Int(9)]).unwrap();
        assert_eq!(value, Value::Int(9));
        let log = conn.queries();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].sql, "SELECT ?");
    }

    #[test]
    fn test_default_quote() {
        let conn = Connection::new("main", Arc::new(GenericGrammar), Box::new(Echo));
        assert_eq!(conn.quote(&Value::from("O'Brien")), "'O''Brien'");
        assert_eq!(conn.quote(&Value::Null), "NULL");
    }
}
