//! MySQL grammar.

use crate::grammar::Grammar;
use crate::query::builder::Query;
use crate::schema::blueprint::{Blueprint, ColumnDefinition, ColumnType, IndexCommand};
use crate::schema::grammar::{ansi_blob, ansi_decimal, ansi_float, ansi_string, ansi_text, ansi_timestamp, Statements, TypeRenderer};
use crate::schema::SchemaGrammar;

/// Largest LIMIT MySQL accepts; stands in for "no limit" when only an
/// offset is set.
const NO_LIMIT: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlGrammar;

impl MySqlGrammar {
    fn add_key(&self, blueprint: &Blueprint, kind: &str, index: &IndexCommand) -> Statements {
        Ok(vec![format!(
            "ALTER TABLE {} ADD {} {}({})",
            self.table(blueprint),
            kind,
            self.wrap_value(&index.name),
            self.column_list(&index.columns)
        )])
    }

    fn drop_key(&self, blueprint: &Blueprint, name: &str) -> Statements {
        Ok(vec![format!(
            "ALTER TABLE {} DROP INDEX {}",
            self.table(blueprint),
            self.wrap_value(name)
        )])
    }
}

fn int(_: &ColumnDefinition) -> String {
    "INT".to_string()
}

fn tinyint(_: &ColumnDefinition) -> String {
    "TINYINT(1)".to_string()
}

fn datetime(_: &ColumnDefinition) -> String {
    "DATETIME".to_string()
}

impl Grammar for MySqlGrammar {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn wrapper(&self) -> (&'static str, &'static str) {
        ("`", "`")
    }

    fn found_rows_marker(&self) -> Option<&'static str> {
        Some("SQL_CALC_FOUND_ROWS")
    }

    fn found_rows_query(&self) -> Option<&'static str> {
        Some("SELECT FOUND_ROWS()")
    }

    fn schema(&self) -> Option<&dyn SchemaGrammar> {
        Some(self)
    }

    // MySQL has no OFFSET without LIMIT.
    fn limit(&self, query: &Query) -> String {
        match (query.limit, query.offset) {
            (Some(limit), _) => format!("LIMIT {}", limit),
            (None, Some(offset)) if offset > 0 => format!("LIMIT {}", NO_LIMIT),
            _ => String::new(),
        }
    }
}

impl SchemaGrammar for MySqlGrammar {
    fn type_renderer(&self, column_type: ColumnType) -> Option<TypeRenderer> {
        Some(match column_type {
            ColumnType::String => ansi_string,
            ColumnType::Integer => int,
            ColumnType::Float => ansi_float,
            ColumnType::Decimal => ansi_decimal,
            ColumnType::Boolean => tinyint,
            ColumnType::Date => datetime,
            ColumnType::Timestamp => ansi_timestamp,
            ColumnType::Text => ansi_text,
            ColumnType::Blob => ansi_blob,
        })
    }

    fn incrementer(&self) -> &'static str {
        " AUTO_INCREMENT PRIMARY KEY"
    }

    fn unsigned(&self, column: &ColumnDefinition) -> &'static str {
        if column.unsigned && column.column_type == ColumnType::Integer {
            " UNSIGNED"
        } else {
            ""
        }
    }

    fn create(&self, blueprint: &Blueprint) -> Statements {
        let mut sql = format!(
            "CREATE TABLE {} ({})",
            self.table(blueprint),
            self.columns(blueprint)?.join(", ")
        );
        if let Some(engine) = &blueprint.engine {
            sql.push_str(&format!(" ENGINE = {}", engine));
        }
        Ok(vec![sql])
    }

    fn add(&self, blueprint: &Blueprint) -> Statements {
        let columns = self
            .columns(blueprint)?
            .into_iter()
            .map(|column| format!("ADD {}", column))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(vec![format!("ALTER TABLE {} {}", self.table(blueprint), columns)])
    }

    fn rename(&self, blueprint: &Blueprint, to: &str) -> Statements {
        Ok(vec![format!(
            "RENAME TABLE {} TO {}",
            self.table(blueprint),
            self.wrap_identifier(to)
        )])
    }

    fn drop_column(&self, blueprint: &Blueprint, columns: &[String]) -> Statements {
        let columns = columns
            .iter()
            .map(|column| format!("DROP {}", self.wrap_value(column)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(vec![format!("ALTER TABLE {} {}", self.table(blueprint), columns)])
    }

    fn primary(&self, blueprint: &Blueprint, index: &IndexCommand) -> Statements {
        Ok(vec![format!(
            "ALTER TABLE {} ADD PRIMARY KEY ({})",
            self.table(blueprint),
            self.column_list(&index.columns)
        )])
    }

    fn unique(&self, blueprint: &Blueprint, index: &IndexCommand) -> Statements {
        self.add_key(blueprint, "UNIQUE", index)
    }

    fn fulltext(&self, blueprint: &Blueprint, index: &IndexCommand) -> Statements {
        self.add_key(blueprint, "FULLTEXT", index)
    }

    fn index(&self, blueprint: &Blueprint, index: &IndexCommand) -> Statements {
        self.add_key(blueprint, "INDEX", index)
    }

    fn drop_primary(&self, blueprint: &Blueprint, _name: Option<&str>) -> Statements {
        Ok(vec![format!("ALTER TABLE {} DROP PRIMARY KEY", self.table(blueprint))])
    }

    fn drop_unique(&self, blueprint: &Blueprint, name: &str) -> Statements {
        self.drop_key(blueprint, name)
    }

    fn drop_index(&self, blueprint: &Blueprint, name: &str) -> Statements {
        self.drop_key(blueprint, name)
    }

    fn drop_fulltext(&self, blueprint: &Blueprint, name: &str) -> Statements {
        self.drop_key(blueprint, name)
    }

    fn drop_foreign(&self, blueprint: &Blueprint, name: &str) -> Statements {
        Ok(vec![format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.table(blueprint),
            self.wrap_value(name)
        )])
    }
}
