//! Fluent query builder.
//!
//! # Responsibilities
//! - Accumulate select/join/where/group/having/order/limit state
//! - Record bindings in the same call that records the clause
//! - Execute through a [`Connection`] using its grammar
//!
//! # Design Decisions
//! - Fluent methods take and return `self` so chains read naturally;
//!   execution methods take `&mut self` so a built query can be reused
//! - The projection (select list / aggregate) is ephemeral and is cleared
//!   by [`Query::reset_projection`] after every fetch; everything else
//!   persists across executions
//! - Where and having bindings live in separate buckets that are read back
//!   in placeholder order, so the order clauses are declared in never
//!   matters

use crate::grammar::Grammar;
use crate::query::clause::{
    is_operator, Aggregate, AggregateFn, Clause, Connector, Direction, Join, JoinKind, Ordering,
    Projection,
};
use crate::query::connection::{Connection, Row};
use crate::query::error::QueryResult;
use crate::query::value::{raw, Column, Value};

/// Ordered column/value pairs used by INSERT and UPDATE.
pub type Record = Vec<(String, Value)>;

/// Collects `(column, value)` pairs into a [`Record`].
pub fn record<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Record
where
    K: Into<String>,
    V: Into<Value>,
{
    values
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Values of a record that occupy placeholders (raw expressions are inlined).
pub(crate) fn record_bindings(record: &Record) -> impl Iterator<Item = Value> + '_ {
    record
        .iter()
        .filter(|(_, v)| !v.is_raw())
        .map(|(_, v)| v.clone())
}

/// COUNT result as an unsigned count. NULL counts as zero; anything else
/// that is not numeric is reported and also counted as zero.
fn count_value(value: &Value) -> u64 {
    match value.as_i64() {
        Some(count) => count.max(0) as u64,
        None => {
            if *value != Value::Null {
                tracing::warn!(value = ?value, "Aggregate COUNT returned a non-numeric value");
            }
            0
        }
    }
}

/// Query state for a single table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Column,
    pub projection: Projection,
    pub distinct: bool,
    pub joins: Vec<Join>,
    pub wheres: Vec<Clause>,
    pub groupings: Vec<Column>,
    pub havings: Vec<Clause>,
    pub orderings: Vec<Ordering>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    where_bindings: Vec<Value>,
    having_bindings: Vec<Value>,
}

impl Query {
    /// Start a query against `table`.
    pub fn table(table: impl Into<Column>) -> Self {
        Self {
            table: table.into(),
            projection: Projection::default(),
            distinct: false,
            joins: Vec::new(),
            wheres: Vec::new(),
            groupings: Vec::new(),
            havings: Vec::new(),
            orderings: Vec::new(),
            limit: None,
            offset: None,
            where_bindings: Vec::new(),
            having_bindings: Vec::new(),
        }
    }

    // --- Projection ---

    pub fn select<C: Into<Column>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.projection.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Clear the select list and aggregate; where/join/order state is kept.
    pub fn reset_projection(&mut self) {
        self.projection = Projection::default();
    }

    // --- Joins ---

    pub fn join(self, table: impl Into<Column>, first: impl Into<Column>, operator: &str, second: impl Into<Column>) -> Self {
        self.join_kind(JoinKind::Inner, table, first, operator, second)
    }

    pub fn left_join(self, table: impl Into<Column>, first: impl Into<Column>, operator: &str, second: impl Into<Column>) -> Self {
        self.join_kind(JoinKind::Left, table, first, operator, second)
    }

    pub fn join_kind(
        self,
        kind: JoinKind,
        table: impl Into<Column>,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        let (first, second) = (first.into(), second.into());
        self.join_with(table, kind, move |join| {
            join.on(first, operator, second);
        })
    }

    /// Join with several ON conditions built by `build`.
    pub fn join_with(mut self, table: impl Into<Column>, kind: JoinKind, build: impl FnOnce(&mut Join)) -> Self {
        let mut join = Join::new(kind, table);
        build(&mut join);
        self.joins.push(join);
        self
    }

    // --- Where ---

    /// `column operator value`, joined with AND.
    pub fn where_(self, column: impl Into<Column>, operator: &str, value: impl Into<Value>) -> Self {
        self.where_with(column, operator, Some(value.into()), Connector::And)
    }

    /// `column operator value`, joined with OR.
    pub fn or_where(self, column: impl Into<Column>, operator: &str, value: impl Into<Value>) -> Self {
        self.where_with(column, operator, Some(value.into()), Connector::Or)
    }

    /// Equality shorthand: `column = value`.
    pub fn where_eq(mut self, column: impl Into<Column>, value: impl Into<Value>) -> Self {
        self.add_where(column.into(), "=".to_string(), value.into(), Connector::And);
        self
    }

    pub fn or_where_eq(mut self, column: impl Into<Column>, value: impl Into<Value>) -> Self {
        self.add_where(column.into(), "=".to_string(), value.into(), Connector::Or);
        self
    }

    /// General form behind every `where` variant.
    ///
    /// When `operator` is not a recognised operator the call is read as the
    /// two-argument shorthand: `operator` becomes the value and the operator
    /// becomes `=`. A missing value is NULL.
    pub fn where_with(
        mut self,
        column: impl Into<Column>,
        operator: impl Into<Value>,
        value: Option<Value>,
        connector: Connector,
    ) -> Self {
        let (operator, value) = match operator.into() {
            Value::Text(op) if is_operator(&op) => (op, value.unwrap_or(Value::Null)),
            shorthand => ("=".to_string(), shorthand),
        };
        self.add_where(column.into(), operator, value, connector);
        self
    }

    pub(crate) fn add_where(&mut self, column: Column, operator: String, value: Value, connector: Connector) {
        if value.is_null() {
            let negated = operator.trim() != "=";
            self.add_where_null(column, connector, negated);
            return;
        }

        if !value.is_raw() {
            self.where_bindings.push(value.clone());
        }
        self.wheres.push(Clause::Where {
            column,
            operator,
            value,
            connector,
        });
    }

    fn add_where_null(&mut self, column: Column, connector: Connector, negated: bool) {
        self.wheres.push(Clause::Null {
            column,
            connector,
            negated,
        });
    }

    pub fn where_null(mut self, column: impl Into<Column>) -> Self {
        self.add_where_null(column.into(), Connector::And, false);
        self
    }

    pub fn or_where_null(mut self, column: impl Into<Column>) -> Self {
        self.add_where_null(column.into(), Connector::Or, false);
        self
    }

    pub fn where_not_null(mut self, column: impl Into<Column>) -> Self {
        self.add_where_null(column.into(), Connector::And, true);
        self
    }

    pub fn or_where_not_null(mut self, column: impl Into<Column>) -> Self {
        self.add_where_null(column.into(), Connector::Or, true);
        self
    }

    fn add_where_in<V: Into<Value>>(
        mut self,
        column: Column,
        values: impl IntoIterator<Item = V>,
        connector: Connector,
        negated: bool,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.where_bindings
            .extend(values.iter().filter(|v| !v.is_raw()).cloned());
        self.wheres.push(Clause::In {
            column,
            values,
            connector,
            negated,
        });
        self
    }

    pub fn where_in<V: Into<Value>>(self, column: impl Into<Column>, values: impl IntoIterator<Item = V>) -> Self {
        self.add_where_in(column.into(), values, Connector::And, false)
    }

    pub fn or_where_in<V: Into<Value>>(self, column: impl Into<Column>, values: impl IntoIterator<Item = V>) -> Self {
        self.add_where_in(column.into(), values, Connector::Or, false)
    }

    pub fn where_not_in<V: Into<Value>>(self, column: impl Into<Column>, values: impl IntoIterator<Item = V>) -> Self {
        self.add_where_in(column.into(), values, Connector::And, true)
    }

    pub fn or_where_not_in<V: Into<Value>>(self, column: impl Into<Column>, values: impl IntoIterator<Item = V>) -> Self {
        self.add_where_in(column.into(), values, Connector::Or, true)
    }

    fn add_where_between(mut self, column: Column, min: Value, max: Value, connector: Connector, negated: bool) -> Self {
        for bound in [&min, &max] {
            if !bound.is_raw() {
                self.where_bindings.push(bound.clone());
            }
        }
        self.wheres.push(Clause::Between {
            column,
            min,
            max,
            connector,
            negated,
        });
        self
    }

    pub fn where_between(self, column: impl Into<Column>, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        self.add_where_between(column.into(), min.into(), max.into(), Connector::And, false)
    }

    pub fn or_where_between(self, column: impl Into<Column>, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        self.add_where_between(column.into(), min.into(), max.into(), Connector::Or, false)
    }

    pub fn where_not_between(self, column: impl Into<Column>, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        self.add_where_between(column.into(), min.into(), max.into(), Connector::And, true)
    }

    /// Parenthesised group of conditions built on a fresh query for the
    /// same table. The group's bindings are spliced in right here.
    pub fn where_nested(self, build: impl FnOnce(Query) -> Query) -> Self {
        self.add_nested(build, Connector::And)
    }

    pub fn or_where_nested(self, build: impl FnOnce(Query) -> Query) -> Self {
        self.add_nested(build, Connector::Or)
    }

    fn add_nested(mut self, build: impl FnOnce(Query) -> Query, connector: Connector) -> Self {
        let nested = build(Query::table(self.table.clone()));
        // An empty group would render as `()`.
        if nested.wheres.is_empty() {
            return self;
        }
        self.where_bindings.extend(nested.bindings());
        self.wheres.push(Clause::Nested {
            query: Box::new(nested),
            connector,
        });
        self
    }

    /// Raw SQL condition with its own bindings.
    pub fn raw_where<V: Into<Value>>(mut self, sql: impl Into<String>, bindings: impl IntoIterator<Item = V>) -> Self {
        self.where_bindings.extend(bindings.into_iter().map(Into::into));
        self.wheres.push(Clause::Raw {
            sql: sql.into(),
            connector: Connector::And,
        });
        self
    }

    pub fn raw_or_where<V: Into<Value>>(mut self, sql: impl Into<String>, bindings: impl IntoIterator<Item = V>) -> Self {
        self.where_bindings.extend(bindings.into_iter().map(Into::into));
        self.wheres.push(Clause::Raw {
            sql: sql.into(),
            connector: Connector::Or,
        });
        self
    }

    // --- Grouping / ordering / paging ---

    pub fn group_by(mut self, column: impl Into<Column>) -> Self {
        self.groupings.push(column.into());
        self
    }

    /// `HAVING column operator value`; always records one binding.
    pub fn having(mut self, column: impl Into<Column>, operator: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.having_bindings.push(value.clone());
        self.havings.push(Clause::Where {
            column: column.into(),
            operator: operator.to_string(),
            value,
            connector: Connector::And,
        });
        self
    }

    pub fn order_by(mut self, column: impl Into<Column>, direction: Direction) -> Self {
        self.orderings.push(Ordering {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn take(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Limit/offset for a 1-based page number.
    pub fn for_page(self, page: u64, per_page: u64) -> Self {
        let page = page.max(1);
        self.skip((page - 1) * per_page).take(per_page)
    }

    // --- Rendering ---

    /// Bindings in the order their placeholders appear in a SELECT.
    pub fn bindings(&self) -> Vec<Value> {
        self.where_bindings
            .iter()
            .chain(self.having_bindings.iter())
            .cloned()
            .collect()
    }

    /// Bindings of the WHERE clause alone (UPDATE and DELETE statements).
    pub fn where_bindings(&self) -> &[Value] {
        &self.where_bindings
    }

    /// Render the SELECT statement this query would run.
    pub fn to_sql(&self, grammar: &dyn Grammar) -> String {
        grammar.select(self)
    }

    // --- Execution ---

    /// Fetch rows with the current select list, or `*`.
    pub fn get(&mut self, conn: &Connection) -> QueryResult<Vec<Row>> {
        self.get_columns(conn, ["*"])
    }

    /// Fetch rows; `columns` apply only when no explicit select was set.
    pub fn get_columns<C: Into<Column>>(&mut self, conn: &Connection, columns: impl IntoIterator<Item = C>) -> QueryResult<Vec<Row>> {
        if self.projection.columns.is_none() {
            self.projection.columns = Some(columns.into_iter().map(Into::into).collect());
        }

        let grammar = conn.grammar();
        let sql = grammar.select(self);
        let result = conn.select(&sql, &self.bindings());
        self.reset_projection();
        let mut rows = result?;

        if self.offset.unwrap_or(0) > 0 {
            if let Some(column) = grammar.offset_row_column() {
                for row in rows.iter_mut() {
                    row.remove(column);
                }
            }
        }

        Ok(rows)
    }

    /// First matching row.
    pub fn first(&mut self, conn: &Connection) -> QueryResult<Option<Row>> {
        self.limit = Some(1);
        Ok(self.get(conn)?.into_iter().next())
    }

    /// Row whose `id` equals `id`.
    pub fn find(&mut self, conn: &Connection, id: impl Into<Value>) -> QueryResult<Option<Row>> {
        self.add_where(Column::from("id"), "=".to_string(), id.into(), Connector::And);
        self.first(conn)
    }

    /// Value of a single column from the first matching row.
    pub fn only(&mut self, conn: &Connection, column: impl Into<Column>) -> QueryResult<Value> {
        self.projection.columns = Some(vec![column.into()]);
        let sql = conn.grammar().select(self);
        let result = conn.only(&sql, &self.bindings());
        self.reset_projection();
        result
    }

    /// Values of one column across all matching rows.
    pub fn pluck(&mut self, conn: &Connection, column: impl Into<Column>) -> QueryResult<Vec<Value>> {
        let column = column.into();
        let name = column.base_name().to_string();
        self.projection.columns = Some(vec![column]);
        let rows = self.get(conn)?;
        Ok(rows
            .into_iter()
            .map(|row| row.get(&name).or_else(|| row.first()).cloned().unwrap_or(Value::Null))
            .collect())
    }

    /// Run an aggregate over the current where-state.
    ///
    /// Grouped queries are wrapped as a derived table by the grammar.
    pub fn aggregate<C: Into<Column>>(&mut self, conn: &Connection, function: AggregateFn, columns: impl IntoIterator<Item = C>) -> QueryResult<Value> {
        self.projection.aggregate = Some(Aggregate {
            function,
            columns: columns.into_iter().map(Into::into).collect(),
        });
        let sql = conn.grammar().select(self);
        let result = conn.only(&sql, &self.bindings());
        self.projection.aggregate = None;
        result
    }

    pub fn count(&mut self, conn: &Connection) -> QueryResult<u64> {
        let value = self.aggregate(conn, AggregateFn::Count, ["*"])?;
        Ok(count_value(&value))
    }

    pub fn min(&mut self, conn: &Connection, column: impl Into<Column>) -> QueryResult<Value> {
        self.aggregate(conn, AggregateFn::Min, [column.into()])
    }

    pub fn max(&mut self, conn: &Connection, column: impl Into<Column>) -> QueryResult<Value> {
        self.aggregate(conn, AggregateFn::Max, [column.into()])
    }

    pub fn avg(&mut self, conn: &Connection, column: impl Into<Column>) -> QueryResult<Value> {
        self.aggregate(conn, AggregateFn::Avg, [column.into()])
    }

    pub fn sum(&mut self, conn: &Connection, column: impl Into<Column>) -> QueryResult<Value> {
        self.aggregate(conn, AggregateFn::Sum, [column.into()])
    }

    /// Insert one record.
    pub fn insert(&self, conn: &Connection, values: Record) -> QueryResult<bool> {
        self.insert_batch(conn, vec![values])
    }

    /// Insert several records sharing the same column order.
    pub fn insert_batch(&self, conn: &Connection, rows: Vec<Record>) -> QueryResult<bool> {
        if rows.is_empty() {
            return Ok(true);
        }
        let sql = conn.grammar().insert(self, &rows);
        let bindings: Vec<Value> = rows.iter().flat_map(record_bindings).collect();
        conn.statement(&sql, &bindings)
    }

    /// Insert one record and return the generated key from `column`.
    pub fn insert_get_id(&self, conn: &Connection, values: Record, column: &str) -> QueryResult<Value> {
        let grammar = conn.grammar();
        let sql = grammar.insert_get_id(self, &values, column);
        let bindings: Vec<Value> = record_bindings(&values).collect();

        if grammar.insert_returns_id() {
            let rows = conn.select(&sql, &bindings)?;
            return Ok(rows
                .first()
                .and_then(|row| row.get(column).cloned())
                .unwrap_or(Value::Null));
        }

        conn.statement(&sql, &bindings)?;
        conn.last_insert_id()
    }

    /// Update matching rows; returns the affected row count.
    pub fn update(&self, conn: &Connection, values: Record) -> QueryResult<u64> {
        let sql = conn.grammar().update(self, &values);
        let bindings: Vec<Value> = record_bindings(&values)
            .chain(self.where_bindings.iter().cloned())
            .collect();
        conn.affecting(&sql, &bindings)
    }

    pub fn increment(&self, conn: &Connection, column: &str, amount: i64) -> QueryResult<u64> {
        self.adjust(conn, column, amount, "+")
    }

    pub fn decrement(&self, conn: &Connection, column: &str, amount: i64) -> QueryResult<u64> {
        self.adjust(conn, column, amount, "-")
    }

    fn adjust(&self, conn: &Connection, column: &str, amount: i64, operator: &str) -> QueryResult<u64> {
        let wrapped = conn.grammar().wrap(&Column::from(column));
        let expression = raw(format!("{} {} {}", wrapped, operator, amount));
        self.update(conn, vec![(column.to_string(), Value::Raw(expression))])
    }

    /// Delete matching rows, or only the row with the given `id`.
    pub fn delete(&mut self, conn: &Connection, id: Option<Value>) -> QueryResult<u64> {
        if let Some(id) = id {
            self.add_where(Column::from("id"), "=".to_string(), id, Connector::And);
        }
        let sql = conn.grammar().delete(self);
        conn.affecting(&sql, &self.where_bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GenericGrammar;

    #[test]
    fn test_null_redirect() {
        let expected = Query::table("users").where_null("deleted_at");

        let two_arg = Query::table("users").where_with("deleted_at", Value::Null, None, Connector::And);
        let three_arg = Query::table("users").where_("deleted_at", "=", Value::Null);
        let eq = Query::table("users").where_eq("deleted_at", Value::Null);

        assert_eq!(two_arg.wheres, expected.wheres);
        assert_eq!(three_arg.wheres, expected.wheres);
        assert_eq!(eq.wheres, expected.wheres);
        assert!(three_arg.bindings().is_empty());

        let not_null = Query::table("users").where_("deleted_at", "<>", Value::Null);
        assert_eq!(not_null.wheres, Query::table("users").where_not_null("deleted_at").wheres);
    }

    #[test]
    fn test_count_value() {
        assert_eq!(count_value(&Value::Int(7)), 7);
        assert_eq!(count_value(&Value::Text("12".into())), 12);
        assert_eq!(count_value(&Value::Int(-1)), 0);
        assert_eq!(count_value(&Value::Null), 0);
        assert_eq!(count_value(&Value::Text("many".into())), 0);
    }

    #[test]
    fn test_unrecognised_operator_is_shorthand() {
        let query = Query::table("users").where_with("name", "bob", None, Connector::And);
        assert_eq!(
            query.wheres,
            vec![Clause::Where {
                column: Column::from("name"),
                operator: "=".into(),
                value: Value::from("bob"),
                connector: Connector::And,
            }]
        );
        assert_eq!(query.bindings(), vec![Value::from("bob")]);
    }

    #[test]
    fn test_operator_match_is_case_insensitive() {
        let query = Query::table("users").where_("name", "LIKE", "b%");
        match &query.wheres[0] {
            Clause::Where { operator, .. } => assert_eq!(operator, "LIKE"),
            other => panic!("unexpected clause {:?}", other),
        }
    }

    #[test]
    fn test_nested_binding_splice() {
        let query = Query::table("users")
            .where_nested(|q| q.where_("a", "=", 1).or_where("b", "=", 2))
            .where_eq("x", 5);
        assert_eq!(query.bindings(), vec![Value::Int(1), Value::Int(2), Value::Int(5)]);
        assert!(matches!(query.wheres[0], Clause::Nested { .. }));
    }

    #[test]
    fn test_having_bindings_follow_where_bindings() {
        let query = Query::table("orders")
            .group_by("customer_id")
            .having("total", ">", 100)
            .where_eq("status", "paid");
        assert_eq!(query.bindings(), vec![Value::from("paid"), Value::Int(100)]);
    }

    #[test]
    fn test_raw_values_are_not_bound() {
        let query = Query::table("users").where_("created_at", "<", raw("NOW()"));
        assert!(query.bindings().is_empty());
        let sql = query.to_sql(&GenericGrammar);
        assert_eq!(sql, r#"SELECT * FROM "users" WHERE "created_at" < NOW()"#);
    }

    #[test]
    fn test_for_page() {
        let query = Query::table("users").for_page(3, 15);
        assert_eq!(query.limit, Some(15));
        assert_eq!(query.offset, Some(30));

        let query = Query::table("users").for_page(0, 15);
        assert_eq!(query.offset, Some(0));
    }

    #[test]
    fn test_empty_nested_group_is_dropped() {
        let query = Query::table("users").where_nested(|q| q);
        assert!(query.wheres.is_empty());
    }
}
