//! Query execution errors.

use thiserror::Error;

use crate::grammar::GrammarError;
use crate::query::value::Value;

/// Error reported by a database driver.
pub type DriverError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while building or executing queries.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The driver rejected a statement. Carries what was sent.
    #[error("{source} (SQL: {sql}) (Bindings: {bindings:?})")]
    Execution {
        sql: String,
        bindings: Vec<Value>,
        #[source]
        source: DriverError,
    },

    /// The grammar cannot render the requested statement.
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    /// A dynamic `where...` method name could not be tokenized.
    #[error("invalid dynamic where method `{0}`")]
    DynamicMethod(String),

    /// A dynamic `where...` call received the wrong number of arguments.
    #[error("dynamic where `{method}` expects {expected} arguments, got {actual}")]
    ArgumentCount {
        method: String,
        expected: usize,
        actual: usize,
    },
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_display() {
        let err = QueryError::Execution {
            sql: "SELECT * FROM \"users\" WHERE \"id\" = ?".into(),
            bindings: vec![Value::Int(7)],
            source: "no such table: users".into(),
        };
        let text = err.to_string();
        assert!(text.starts_with("no such table: users"));
        assert!(text.contains("(SQL: SELECT"));
        assert!(text.contains("Int(7)"));
    }

    #[test]
    fn test_argument_count_display() {
        let err = QueryError::ArgumentCount {
            method: "whereNameAndAge".into(),
            expected: 2,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "dynamic where `whereNameAndAge` expects 2 arguments, got 1"
        );
    }
}
