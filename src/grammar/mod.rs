//! SQL grammars.
//!
//! # Data Flow
//! ```text
//! Query (clause model + bindings)
//!     → Grammar::select / insert / update / delete
//!     → SQL text with `?` placeholders
//!     → Connection (normalizes bindings, runs driver)
//!
//! Blueprint (columns + commands)
//!     → Grammar::schema() → SchemaGrammar::compile
//!     → DDL statements
//! ```
//!
//! # Design Decisions
//! - One trait, default methods render the generic (ANSI-ish) dialect;
//!   dialects override only what differs
//! - Grammars are stateless; the only dialect data is the quote pair,
//!   the datetime format and a handful of capability flags
//! - Raw expressions pass through `wrap` and `parameter` untouched
//! - Grammars render placeholders only; binding values are normalized by
//!   the connection

pub mod generic;
pub mod mysql;
pub mod postgres;
pub mod registry;
pub mod sqlite;
pub mod sqlserver;

pub use generic::GenericGrammar;
pub use mysql::MySqlGrammar;
pub use postgres::PostgresGrammar;
pub use registry::GrammarRegistry;
pub use sqlite::SqliteGrammar;
pub use sqlserver::SqlServerGrammar;

use thiserror::Error;

use crate::query::builder::{Query, Record};
use crate::query::clause::{Aggregate, Clause, Connector, Join, JoinKind};
use crate::query::value::{Column, Value};
use crate::schema::{ColumnType, SchemaGrammar};

/// Grammar dispatch failures. These are programmer errors and surface
/// immediately instead of producing partial SQL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("{grammar} grammar has no renderer for column type {column_type:?}")]
    UnsupportedType {
        grammar: &'static str,
        column_type: ColumnType,
    },

    #[error("{grammar} grammar does not support the `{command}` command")]
    UnsupportedCommand {
        grammar: &'static str,
        command: &'static str,
    },

    #[error("{0} grammar cannot render schema statements")]
    SchemaUnsupported(&'static str),
}

/// The pieces of a SELECT, in statement order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectComponents {
    pub selects: String,
    pub from: String,
    pub joins: String,
    pub wheres: String,
    pub groupings: String,
    pub havings: String,
    pub orderings: String,
    pub limit: String,
    pub offset: String,
}

impl SelectComponents {
    fn parts(&self) -> [&str; 9] {
        [
            self.selects.as_str(),
            self.from.as_str(),
            self.joins.as_str(),
            self.wheres.as_str(),
            self.groupings.as_str(),
            self.havings.as_str(),
            self.orderings.as_str(),
            self.limit.as_str(),
            self.offset.as_str(),
        ]
    }

    /// Join the non-empty components with single spaces.
    pub fn concatenate(&self) -> String {
        self.parts()
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Finds a case-insensitive ` as ` alias separator.
fn split_alias(value: &str) -> Option<(&str, &str)> {
    let idx = value.to_ascii_lowercase().find(" as ")?;
    Some((value[..idx].trim(), value[idx + 4..].trim()))
}

/// A SQL dialect.
pub trait Grammar: Send + Sync {
    /// Dialect name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Opening and closing identifier quotes.
    fn wrapper(&self) -> (&'static str, &'static str) {
        ("\"", "\"")
    }

    /// `chrono` format string for datetime bindings.
    fn datetime_format(&self) -> &'static str {
        "%Y-%m-%d %H:%M:%S"
    }

    /// True when `insert_get_id` returns the key as a result row.
    fn insert_returns_id(&self) -> bool {
        false
    }

    /// Synthetic column added to offset queries that callers should not see.
    fn offset_row_column(&self) -> Option<&'static str> {
        None
    }

    /// Keyword that makes the server remember the un-limited row count.
    fn found_rows_marker(&self) -> Option<&'static str> {
        None
    }

    /// Statement that reads the count remembered by `found_rows_marker`.
    fn found_rows_query(&self) -> Option<&'static str> {
        None
    }

    /// DDL support, if this grammar has any.
    fn schema(&self) -> Option<&dyn SchemaGrammar> {
        None
    }

    // --- Identifiers ---

    /// Quote a single identifier segment. Already-quoted segments and `*`
    /// are returned as is, so wrapping twice is harmless.
    fn wrap_value(&self, value: &str) -> String {
        let (open, close) = self.wrapper();
        if value == "*" {
            return value.to_string();
        }
        if value.len() >= open.len() + close.len() && value.starts_with(open) && value.ends_with(close) {
            return value.to_string();
        }
        let escaped = value.replace(close, &format!("{}{}", close, close));
        format!("{}{}{}", open, escaped, close)
    }

    /// Quote a possibly qualified and aliased identifier.
    fn wrap_identifier(&self, value: &str) -> String {
        if let Some((column, alias)) = split_alias(value) {
            return format!("{} AS {}", self.wrap_identifier(column), self.wrap_value(alias));
        }
        value
            .split('.')
            .map(|segment| self.wrap_value(segment.trim()))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn wrap(&self, column: &Column) -> String {
        match column {
            Column::Raw(expression) => expression.to_string(),
            Column::Name(name) => self.wrap_identifier(name),
        }
    }

    fn wrap_table(&self, table: &Column) -> String {
        self.wrap(table)
    }

    fn columnize(&self, columns: &[Column]) -> String {
        columns
            .iter()
            .map(|column| self.wrap(column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Placeholder for a value; raw expressions are inlined.
    fn parameter(&self, value: &Value) -> String {
        match value {
            Value::Raw(expression) => expression.to_string(),
            _ => "?".to_string(),
        }
    }

    fn parameterize(&self, values: &[Value]) -> String {
        values
            .iter()
            .map(|value| self.parameter(value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    // --- SELECT ---

    /// Render a SELECT (or aggregate) for `query`.
    ///
    /// Aggregating a grouped query wraps the grouped statement as a derived
    /// table, since aggregating over groups in one statement is not portable.
    fn select(&self, query: &Query) -> String {
        match &query.projection.aggregate {
            Some(aggregate) if !query.groupings.is_empty() => self.grouped_aggregate(query, aggregate),
            _ => self.compile_select(query),
        }
    }

    fn grouped_aggregate(&self, query: &Query, aggregate: &Aggregate) -> String {
        let mut inner = query.clone();
        inner.projection.aggregate = None;

        let columns: Vec<Column> = aggregate
            .columns
            .iter()
            .map(|column| match column {
                Column::Name(_) => Column::Name(column.base_name().to_string()),
                raw => raw.clone(),
            })
            .collect();

        format!(
            "SELECT {}({}) FROM ({}) AS {}",
            aggregate.function.as_sql(),
            self.columnize(&columns),
            self.compile_select(&inner),
            self.wrap_value("aggregate")
        )
    }

    fn compile_select(&self, query: &Query) -> String {
        self.components(query).concatenate()
    }

    fn components(&self, query: &Query) -> SelectComponents {
        SelectComponents {
            selects: match &query.projection.aggregate {
                Some(aggregate) => self.aggregate(query, aggregate),
                None => self.selects(query),
            },
            from: self.from(query),
            joins: self.joins(query),
            wheres: self.wheres(query),
            groupings: self.groupings(query),
            havings: self.havings(query),
            orderings: self.orderings(query),
            limit: self.limit(query),
            offset: self.offset(query),
        }
    }

    fn selects(&self, query: &Query) -> String {
        let select = if query.distinct { "SELECT DISTINCT " } else { "SELECT " };
        match &query.projection.columns {
            Some(columns) if !columns.is_empty() => format!("{}{}", select, self.columnize(columns)),
            _ => format!("{}*", select),
        }
    }

    fn aggregate(&self, query: &Query, aggregate: &Aggregate) -> String {
        let mut column = self.columnize(&aggregate.columns);
        if query.distinct && column != "*" {
            column = format!("DISTINCT {}", column);
        }
        format!(
            "SELECT {}({}) AS {}",
            aggregate.function.as_sql(),
            column,
            self.wrap_value("aggregate")
        )
    }

    fn from(&self, query: &Query) -> String {
        format!("FROM {}", self.wrap_table(&query.table))
    }

    fn joins(&self, query: &Query) -> String {
        query
            .joins
            .iter()
            .map(|join| self.join(join))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn join(&self, join: &Join) -> String {
        let table = self.wrap_table(&join.table);
        if join.kind == JoinKind::Cross || join.conditions.is_empty() {
            return format!("{} JOIN {}", join.kind.as_sql(), table);
        }

        let conditions = connect(join.conditions.iter().map(|condition| {
            (
                condition.connector,
                format!(
                    "{} {} {}",
                    self.wrap(&condition.first),
                    condition.operator,
                    self.wrap(&condition.second)
                ),
            )
        }));
        format!("{} JOIN {} ON {}", join.kind.as_sql(), table, conditions)
    }

    fn wheres(&self, query: &Query) -> String {
        if query.wheres.is_empty() {
            return String::new();
        }
        format!("WHERE {}", self.conditions(&query.wheres))
    }

    /// Render a clause list, dropping the leading connector.
    fn conditions(&self, clauses: &[Clause]) -> String {
        connect(
            clauses
                .iter()
                .map(|clause| (clause.connector(), self.where_clause(clause))),
        )
    }

    fn where_clause(&self, clause: &Clause) -> String {
        match clause {
            Clause::Where {
                column,
                operator,
                value,
                ..
            } => format!("{} {} {}", self.wrap(column), operator, self.parameter(value)),
            Clause::Null { column, negated, .. } => {
                let not = if *negated { "NOT " } else { "" };
                format!("{} IS {}NULL", self.wrap(column), not)
            }
            Clause::In {
                column,
                values,
                negated,
                ..
            } => {
                if values.is_empty() {
                    // IN () is a syntax error everywhere.
                    return if *negated { "1 = 1".to_string() } else { "0 = 1".to_string() };
                }
                let not = if *negated { "NOT " } else { "" };
                format!("{} {}IN ({})", self.wrap(column), not, self.parameterize(values))
            }
            Clause::Between {
                column,
                min,
                max,
                negated,
                ..
            } => {
                let not = if *negated { "NOT " } else { "" };
                format!(
                    "{} {}BETWEEN {} AND {}",
                    self.wrap(column),
                    not,
                    self.parameter(min),
                    self.parameter(max)
                )
            }
            Clause::Nested { query, .. } => format!("({})", self.conditions(&query.wheres)),
            Clause::Raw { sql, .. } => sql.clone(),
        }
    }

    fn groupings(&self, query: &Query) -> String {
        if query.groupings.is_empty() {
            return String::new();
        }
        format!("GROUP BY {}", self.columnize(&query.groupings))
    }

    fn havings(&self, query: &Query) -> String {
        if query.havings.is_empty() {
            return String::new();
        }
        format!("HAVING {}", self.conditions(&query.havings))
    }

    fn orderings(&self, query: &Query) -> String {
        if query.orderings.is_empty() {
            return String::new();
        }
        let orderings = query
            .orderings
            .iter()
            .map(|ordering| format!("{} {}", self.wrap(&ordering.column), ordering.direction.as_sql()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("ORDER BY {}", orderings)
    }

    fn limit(&self, query: &Query) -> String {
        query
            .limit
            .map(|limit| format!("LIMIT {}", limit))
            .unwrap_or_default()
    }

    fn offset(&self, query: &Query) -> String {
        match query.offset {
            Some(offset) if offset > 0 => format!("OFFSET {}", offset),
            _ => String::new(),
        }
    }

    // --- Writes ---

    /// INSERT for one or more records sharing the first record's columns.
    fn insert(&self, query: &Query, rows: &[Record]) -> String {
        let columns: Vec<Column> = rows
            .first()
            .map(|row| row.iter().map(|(name, _)| Column::from(name)).collect())
            .unwrap_or_default();

        let values = rows
            .iter()
            .map(|row| {
                let values: Vec<Value> = row.iter().map(|(_, value)| value.clone()).collect();
                format!("({})", self.parameterize(&values))
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.wrap_table(&query.table),
            self.columnize(&columns),
            values
        )
    }

    fn insert_get_id(&self, query: &Query, values: &Record, _column: &str) -> String {
        self.insert(query, std::slice::from_ref(values))
    }

    fn update(&self, query: &Query, values: &Record) -> String {
        let sets = values
            .iter()
            .map(|(column, value)| format!("{} = {}", self.wrap_identifier(column), self.parameter(value)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {} SET {} {}", self.wrap_table(&query.table), sets, self.wheres(query));
        sql.trim_end().to_string()
    }

    fn delete(&self, query: &Query) -> String {
        let sql = format!("DELETE FROM {} {}", self.wrap_table(&query.table), self.wheres(query));
        sql.trim_end().to_string()
    }
}

/// Join `(connector, sql)` pairs, omitting the first connector.
fn connect(parts: impl Iterator<Item = (Connector, String)>) -> String {
    let mut out = String::new();
    for (i, (connector, sql)) in parts.enumerate() {
        if i > 0 {
            out.push(' ');
            out.push_str(connector.as_sql());
            out.push(' ');
        }
        out.push_str(&sql);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::clause::{AggregateFn, Direction, JoinKind};
    use crate::query::value::raw;

    #[test]
    fn test_wrap_is_idempotent() {
        let grammar = GenericGrammar;
        let once = grammar.wrap(&Column::from("users.id"));
        assert_eq!(once, r#""users"."id""#);
        assert_eq!(grammar.wrap(&Column::from(once.as_str())), once);
    }

    #[test]
    fn test_wrap_alias_and_star() {
        let grammar = GenericGrammar;
        assert_eq!(grammar.wrap(&Column::from("users.*")), r#""users".*"#);
        assert_eq!(
            grammar.wrap(&Column::from("email AS mail")),
            r#""email" AS "mail""#
        );
    }

    #[test]
    fn test_raw_expression_untouched() {
        let grammar = MySqlGrammar;
        let column = Column::from(raw("COUNT(`id`)"));
        assert_eq!(grammar.wrap(&column), "COUNT(`id`)");
    }

    #[test]
    fn test_full_select() {
        let query = Query::table("users")
            .select(["users.id", "phones.number"])
            .distinct()
            .join("phones", "users.id", "=", "phones.user_id")
            .where_("votes", ">", 100)
            .or_where_in("role", ["admin", "owner"])
            .where_not_null("verified_at")
            .group_by("users.id")
            .having("total", ">", 3)
            .order_by("users.id", Direction::Desc)
            .take(10)
            .skip(20);

        assert_eq!(
            GenericGrammar.select(&query),
            concat!(
                r#"SELECT DISTINCT "users"."id", "phones"."number" FROM "users" "#,
                r#"INNER JOIN "phones" ON "users"."id" = "phones"."user_id" "#,
                r#"WHERE "votes" > ? OR "role" IN (?, ?) AND "verified_at" IS NOT NULL "#,
                r#"GROUP BY "users"."id" HAVING "total" > ? "#,
                r#"ORDER BY "users"."id" DESC LIMIT 10 OFFSET 20"#
            )
        );
    }

    #[test]
    fn test_multi_condition_join() {
        let query = Query::table("users").join_with("contacts", JoinKind::Left, |join| {
            join.on("users.id", "=", "contacts.user_id")
                .or_on("users.alt_id", "=", "contacts.user_id");
        });
        assert_eq!(
            GenericGrammar.select(&query),
            concat!(
                r#"SELECT * FROM "users" LEFT JOIN "contacts" ON "users"."id" = "contacts"."user_id" "#,
                r#"OR "users"."alt_id" = "contacts"."user_id""#
            )
        );
    }

    #[test]
    fn test_nested_rendering() {
        let query = Query::table("users")
            .where_eq("active", true)
            .or_where_nested(|q| q.where_("age", ">", 18).where_("age", "<", 65));
        assert_eq!(
            GenericGrammar.select(&query),
            r#"SELECT * FROM "users" WHERE "active" = ? OR ("age" > ? AND "age" < ?)"#
        );
    }

    #[test]
    fn test_empty_in_list() {
        let empty: Vec<i64> = Vec::new();
        let query = Query::table("users").where_in("id", empty.clone()).where_not_in("id", empty);
        assert_eq!(
            GenericGrammar.select(&query),
            r#"SELECT * FROM "users" WHERE 0 = 1 AND 1 = 1"#
        );
        assert!(query.bindings().is_empty());
    }

    #[test]
    fn test_between_and_raw() {
        let query = Query::table("orders")
            .where_not_between("total", 10, 20)
            .raw_where("YEAR(created_at) = ?", [2024]);
        assert_eq!(
            GenericGrammar.select(&query),
            r#"SELECT * FROM "orders" WHERE "total" NOT BETWEEN ? AND ? AND YEAR(created_at) = ?"#
        );
        assert_eq!(query.bindings(), vec![Value::Int(10), Value::Int(20), Value::Int(2024)]);
    }

    #[test]
    fn test_plain_aggregate() {
        let mut query = Query::table("users").where_eq("active", 1).distinct();
        query.projection.aggregate = Some(Aggregate {
            function: AggregateFn::Count,
            columns: vec![Column::from("email")],
        });
        assert_eq!(
            GenericGrammar.select(&query),
            r#"SELECT COUNT(DISTINCT "email") AS "aggregate" FROM "users" WHERE "active" = ?"#
        );
    }

    #[test]
    fn test_grouped_aggregate_wraps_subquery() {
        let mut query = Query::table("orders").group_by("customer_id");
        query.projection.aggregate = Some(Aggregate {
            function: AggregateFn::Sum,
            columns: vec![Column::from("amount")],
        });
        assert_eq!(
            GenericGrammar.select(&query),
            r#"SELECT SUM("amount") FROM (SELECT * FROM "orders" GROUP BY "customer_id") AS "aggregate""#
        );
    }

    #[test]
    fn test_insert_update_delete() {
        let query = Query::table("users").where_eq("id", 1);
        let rows = vec![
            vec![("email".to_string(), Value::from("a@b.c")), ("votes".to_string(), Value::Int(1))],
            vec![("email".to_string(), Value::from("d@e.f")), ("votes".to_string(), Value::Int(2))],
        ];
        assert_eq!(
            GenericGrammar.insert(&query, &rows),
            r#"INSERT INTO "users" ("email", "votes") VALUES (?, ?), (?, ?)"#
        );
        assert_eq!(
            GenericGrammar.update(&query, &rows[0]),
            r#"UPDATE "users" SET "email" = ?, "votes" = ? WHERE "id" = ?"#
        );
        assert_eq!(GenericGrammar.delete(&query), r#"DELETE FROM "users" WHERE "id" = ?"#);
        assert_eq!(GenericGrammar.delete(&Query::table("users")), r#"DELETE FROM "users""#);
    }
}
