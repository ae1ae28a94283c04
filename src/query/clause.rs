//! Clause model accumulated by the query builder.
//!
//! Every clause carries its connector; grammars drop the connector of the
//! first clause in a list when rendering.

use std::fmt;

use crate::query::builder::Query;
use crate::query::value::{Column, Value};

/// Operators accepted by `where`/`having`. Anything else turns a
/// three-argument `where` into the two-argument equality shorthand.
pub const OPERATORS: &[&str] = &[
    "=", "<", ">", "<=", ">=", "<>", "!=", "like", "not like", "between", "ilike", "&", "|",
    "^", "<<", ">>",
];

/// Returns true if `operator` is a recognised comparison operator.
pub fn is_operator(operator: &str) -> bool {
    let lowered = operator.trim().to_lowercase();
    OPERATORS.contains(&lowered.as_str())
}

/// Boolean joiner between consecutive clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Connector {
    #[default]
    And,
    Or,
}

impl Connector {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One WHERE (or HAVING) condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Where {
        column: Column,
        operator: String,
        value: Value,
        connector: Connector,
    },
    Null {
        column: Column,
        connector: Connector,
        negated: bool,
    },
    In {
        column: Column,
        values: Vec<Value>,
        connector: Connector,
        negated: bool,
    },
    Between {
        column: Column,
        min: Value,
        max: Value,
        connector: Connector,
        negated: bool,
    },
    Nested {
        query: Box<Query>,
        connector: Connector,
    },
    Raw {
        sql: String,
        connector: Connector,
    },
}

impl Clause {
    pub fn connector(&self) -> Connector {
        match self {
            Clause::Where { connector, .. }
            | Clause::Null { connector, .. }
            | Clause::In { connector, .. }
            | Clause::Between { connector, .. }
            | Clause::Nested { connector, .. }
            | Clause::Raw { connector, .. } => *connector,
        }
    }
}

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    Cross,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
            JoinKind::Cross => "CROSS",
        }
    }
}

/// `ON first operator second` column comparison inside a join.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinCondition {
    pub first: Column,
    pub operator: String,
    pub second: Column,
    pub connector: Connector,
}

/// A join and its ON conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: Column,
    pub conditions: Vec<JoinCondition>,
}

impl Join {
    pub fn new(kind: JoinKind, table: impl Into<Column>) -> Self {
        Self {
            kind,
            table: table.into(),
            conditions: Vec::new(),
        }
    }

    pub fn on(&mut self, first: impl Into<Column>, operator: &str, second: impl Into<Column>) -> &mut Self {
        self.push(first.into(), operator, second.into(), Connector::And)
    }

    pub fn or_on(&mut self, first: impl Into<Column>, operator: &str, second: impl Into<Column>) -> &mut Self {
        self.push(first.into(), operator, second.into(), Connector::Or)
    }

    fn push(&mut self, first: Column, operator: &str, second: Column, connector: Connector) -> &mut Self {
        self.conditions.push(JoinCondition {
            first,
            operator: operator.to_string(),
            second,
            connector,
        });
        self
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            other => Err(format!("unknown sort direction `{}`", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub column: Column,
    pub direction: Direction,
}

/// Aggregate functions supported by [`Query::aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFn {
    Count,
    Min,
    Max,
    Avg,
    Sum,
}

impl AggregateFn {
    pub fn as_sql(&self) -> &'static str {
        match self {
            AggregateFn::Count => "COUNT",
            AggregateFn::Min => "MIN",
            AggregateFn::Max => "MAX",
            AggregateFn::Avg => "AVG",
            AggregateFn::Sum => "SUM",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub function: AggregateFn,
    pub columns: Vec<Column>,
}

/// The ephemeral part of a query: what to return, as opposed to which rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection {
    pub columns: Option<Vec<Column>>,
    pub aggregate: Option<Aggregate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_recognition() {
        assert!(is_operator("="));
        assert!(is_operator("LIKE"));
        assert!(is_operator("Not Like"));
        assert!(is_operator(">>"));
        assert!(!is_operator("bob"));
        assert!(!is_operator("=="));
    }

    #[test]
    fn test_join_conditions() {
        let mut join = Join::new(JoinKind::Left, "phones");
        join.on("users.id", "=", "phones.user_id")
            .or_on("users.alt_id", "=", "phones.user_id");
        assert_eq!(join.conditions.len(), 2);
        assert_eq!(join.conditions[1].connector, Connector::Or);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("DESC".parse::<Direction>(), Ok(Direction::Desc));
        assert!("sideways".parse::<Direction>().is_err());
    }
}
