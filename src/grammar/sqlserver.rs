//! SQL Server grammar.
//!
//! SQL Server has no LIMIT/OFFSET: limits without an offset use `TOP`, and
//! offsets wrap the statement around `ROW_NUMBER()` and filter on the row
//! number in an outer query.

use crate::grammar::Grammar;
use crate::query::builder::Query;
use crate::schema::blueprint::{Blueprint, ColumnDefinition, ColumnType, Command};
use crate::schema::grammar::{ansi_decimal, ansi_float, ansi_timestamp, Statements, TypeRenderer};
use crate::schema::SchemaGrammar;

/// Synthetic column added by offset queries.
const ROW_NUMBER_COLUMN: &str = "RowNum";

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerGrammar;

fn nvarchar(column: &ColumnDefinition) -> String {
    format!("NVARCHAR({})", column.length)
}

fn int(_: &ColumnDefinition) -> String {
    "INT".to_string()
}

fn tinyint(_: &ColumnDefinition) -> String {
    "TINYINT".to_string()
}

fn datetime(_: &ColumnDefinition) -> String {
    "DATETIME".to_string()
}

fn nvarchar_max(_: &ColumnDefinition) -> String {
    "NVARCHAR(MAX)".to_string()
}

fn varbinary_max(_: &ColumnDefinition) -> String {
    "VARBINARY(MAX)".to_string()
}

impl SqlServerGrammar {
    fn ansi_offset(&self, query: &Query, offset: u64) -> String {
        let mut components = self.components(query);

        let orderings = if components.orderings.is_empty() {
            "ORDER BY (SELECT 0)".to_string()
        } else {
            std::mem::take(&mut components.orderings)
        };
        components.selects.push_str(&format!(
            ", ROW_NUMBER() OVER ({}) AS {}",
            orderings,
            self.wrap_value(ROW_NUMBER_COLUMN)
        ));

        let start = offset.saturating_add(1);
        let constraint = match query.limit {
            Some(limit) => format!("BETWEEN {} AND {}", start, offset.saturating_add(limit)),
            None => format!(">= {}", start),
        };

        format!(
            "SELECT * FROM ({}) AS {} WHERE {} {}",
            components.concatenate(),
            self.wrap_value("TempTable"),
            self.wrap_value(ROW_NUMBER_COLUMN),
            constraint
        )
    }
}

impl Grammar for SqlServerGrammar {
    fn name(&self) -> &'static str {
        "sqlsrv"
    }

    fn wrapper(&self) -> (&'static str, &'static str) {
        ("[", "]")
    }

    fn datetime_format(&self) -> &'static str {
        "%Y-%m-%d %H:%M:%S%.3f"
    }

    fn offset_row_column(&self) -> Option<&'static str> {
        Some(ROW_NUMBER_COLUMN)
    }

    fn schema(&self) -> Option<&dyn SchemaGrammar> {
        Some(self)
    }

    fn compile_select(&self, query: &Query) -> String {
        match query.offset {
            Some(offset) if offset > 0 && query.projection.aggregate.is_none() => self.ansi_offset(query, offset),
            _ => self.components(query).concatenate(),
        }
    }

    fn selects(&self, query: &Query) -> String {
        let mut select = String::from("SELECT ");
        if query.distinct {
            select.push_str("DISTINCT ");
        }
        if let (Some(limit), None | Some(0)) = (query.limit, query.offset) {
            select.push_str(&format!("TOP {} ", limit));
        }
        match &query.projection.columns {
            Some(columns) if !columns.is_empty() => select + &self.columnize(columns),
            _ => select + "*",
        }
    }

    fn limit(&self, _query: &Query) -> String {
        String::new()
    }

    fn offset(&self, _query: &Query) -> String {
        String::new()
    }
}

impl SchemaGrammar for SqlServerGrammar {
    fn type_renderer(&self, column_type: ColumnType) -> Option<TypeRenderer> {
        Some(match column_type {
            ColumnType::String => nvarchar,
            ColumnType::Integer => int,
            ColumnType::Float => ansi_float,
            ColumnType::Decimal => ansi_decimal,
            ColumnType::Boolean => tinyint,
            ColumnType::Date => datetime,
            ColumnType::Timestamp => ansi_timestamp,
            ColumnType::Text => nvarchar_max,
            ColumnType::Blob => varbinary_max,
        })
    }

    fn incrementer(&self) -> &'static str {
        " IDENTITY PRIMARY KEY"
    }

    fn add(&self, blueprint: &Blueprint) -> Statements {
        Ok(vec![format!(
            "ALTER TABLE {} ADD {}",
            self.table(blueprint),
            self.columns(blueprint)?.join(", ")
        )])
    }

    fn rename(&self, blueprint: &Blueprint, to: &str) -> Statements {
        Ok(vec![format!(
            "EXEC sp_rename {}, {}",
            self.table(blueprint),
            self.wrap_identifier(to)
        )])
    }

    fn drop_column(&self, blueprint: &Blueprint, columns: &[String]) -> Statements {
        Ok(vec![format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.table(blueprint),
            self.column_list(columns)
        )])
    }

    fn drop_unique(&self, blueprint: &Blueprint, name: &str) -> Statements {
        self.drop_index(blueprint, name)
    }

    fn drop_index(&self, blueprint: &Blueprint, name: &str) -> Statements {
        Ok(vec![format!(
            "DROP INDEX {} ON {}",
            self.wrap_value(name),
            self.table(blueprint)
        )])
    }

    fn drop_fulltext(&self, _blueprint: &Blueprint, name: &str) -> Statements {
        Err(self.unsupported(&Command::DropFulltext { name: name.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::clause::Direction;

    #[test]
    fn test_top_without_offset() {
        let query = Query::table("users").distinct().select(["email"]).take(10);
        assert_eq!(
            SqlServerGrammar.select(&query),
            "SELECT DISTINCT TOP 10 [email] FROM [users]"
        );
    }

    #[test]
    fn test_row_number_offset() {
        let query = Query::table("users")
            .where_eq("active", 1)
            .order_by("name", Direction::Asc)
            .skip(20)
            .take(10);
        assert_eq!(
            SqlServerGrammar.select(&query),
            concat!(
                "SELECT * FROM (SELECT *, ROW_NUMBER() OVER (ORDER BY [name] ASC) AS [RowNum] ",
                "FROM [users] WHERE [active] = ?) AS [TempTable] WHERE [RowNum] BETWEEN 21 AND 30"
            )
        );
    }

    #[test]
    fn test_offset_without_ordering_or_limit() {
        let query = Query::table("users").skip(5);
        assert_eq!(
            SqlServerGrammar.select(&query),
            concat!(
                "SELECT * FROM (SELECT *, ROW_NUMBER() OVER (ORDER BY (SELECT 0)) AS [RowNum] ",
                "FROM [users]) AS [TempTable] WHERE [RowNum] >= 6"
            )
        );
    }

    #[test]
    fn test_identity_and_alterations() {
        let mut table = Blueprint::new("users");
        table.create();
        table.increments("id");
        table.text("bio");
        let sql = table.to_sql(&SqlServerGrammar).unwrap();
        assert_eq!(
            sql[0],
            "CREATE TABLE [users] ([id] INT NOT NULL IDENTITY PRIMARY KEY, [bio] NVARCHAR(MAX) NOT NULL)"
        );

        let mut table = Blueprint::new("users");
        table.drop_column(["a", "b"]);
        table.drop_index("users_email_index");
        let sql = table.to_sql(&SqlServerGrammar).unwrap();
        assert_eq!(
            sql,
            vec![
                "ALTER TABLE [users] DROP COLUMN [a], [b]",
                "DROP INDEX [users_email_index] ON [users]",
            ]
        );
    }
}
