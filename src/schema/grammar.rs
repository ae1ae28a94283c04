//! DDL rendering.
//!
//! # Design Decisions
//! - Column types dispatch through [`SchemaGrammar::type_renderer`], a
//!   per-grammar table from [`ColumnType`] to a plain render function
//! - Every command renders to zero or more statements; a dialect that
//!   cannot express a command returns [`GrammarError::UnsupportedCommand`]
//!   instead of emitting nothing

use crate::grammar::{Grammar, GrammarError};
use crate::query::value::Value;
use crate::schema::blueprint::{Blueprint, ColumnDefinition, ColumnType, Command, ForeignKey, IndexCommand};

/// Renders the native type of one column.
pub type TypeRenderer = fn(&ColumnDefinition) -> String;

/// DDL statements for one command.
pub type Statements = Result<Vec<String>, GrammarError>;

pub(crate) fn ansi_string(column: &ColumnDefinition) -> String {
    format!("VARCHAR({})", column.length)
}

pub(crate) fn ansi_decimal(column: &ColumnDefinition) -> String {
    format!("DECIMAL({}, {})", column.precision, column.scale)
}

/// Type renderer for a fixed keyword.
macro_rules! keyword {
    ($name:ident, $sql:literal) => {
        pub(crate) fn $name(_: &ColumnDefinition) -> String {
            $sql.to_string()
        }
    };
}

keyword!(ansi_integer, "INTEGER");
keyword!(ansi_float, "FLOAT");
keyword!(ansi_boolean, "BOOLEAN");
keyword!(ansi_date, "DATE");
keyword!(ansi_timestamp, "TIMESTAMP");
keyword!(ansi_text, "TEXT");
keyword!(ansi_blob, "BLOB");

/// DDL side of a grammar. Default methods render ANSI-ish SQL.
pub trait SchemaGrammar: Grammar {
    fn type_renderer(&self, column_type: ColumnType) -> Option<TypeRenderer> {
        Some(match column_type {
            ColumnType::String => ansi_string,
            ColumnType::Integer => ansi_integer,
            ColumnType::Float => ansi_float,
            ColumnType::Decimal => ansi_decimal,
            ColumnType::Boolean => ansi_boolean,
            ColumnType::Date => ansi_date,
            ColumnType::Timestamp => ansi_timestamp,
            ColumnType::Text => ansi_text,
            ColumnType::Blob => ansi_blob,
        })
    }

    /// Suffix that turns an integer column into an auto-incrementing key.
    fn incrementer(&self) -> &'static str {
        " GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY"
    }

    fn unsigned(&self, _column: &ColumnDefinition) -> &'static str {
        ""
    }

    fn column_type(&self, column: &ColumnDefinition) -> Result<String, GrammarError> {
        let render = self
            .type_renderer(column.column_type)
            .ok_or(GrammarError::UnsupportedType {
                grammar: self.name(),
                column_type: column.column_type,
            })?;
        Ok(render(column))
    }

    /// SQL literal for a DEFAULT clause.
    fn literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => i64::from(*b).to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Raw(e) => e.to_string(),
            Value::DateTime(dt) => format!("'{}'", dt.format(self.datetime_format())),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }

    /// `name TYPE modifiers` for one column.
    fn column_definition(&self, column: &ColumnDefinition) -> Result<String, GrammarError> {
        let mut sql = format!("{} {}", self.wrap_value(&column.name), self.column_type(column)?);
        sql.push_str(self.unsigned(column));
        sql.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.literal(default));
        }
        if column.increment && column.column_type == ColumnType::Integer {
            sql.push_str(self.incrementer());
        }
        Ok(sql)
    }

    fn columns(&self, blueprint: &Blueprint) -> Result<Vec<String>, GrammarError> {
        blueprint
            .columns
            .iter()
            .map(|column| self.column_definition(column))
            .collect()
    }

    fn table(&self, blueprint: &Blueprint) -> String {
        self.wrap_identifier(&blueprint.table)
    }

    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|column| self.wrap_value(column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn unsupported(&self, command: &Command) -> GrammarError {
        GrammarError::UnsupportedCommand {
            grammar: self.name(),
            command: command.name(),
        }
    }

    /// Render one blueprint command.
    fn compile(&self, blueprint: &Blueprint, command: &Command) -> Statements {
        match command {
            Command::Create => self.create(blueprint),
            Command::Add => self.add(blueprint),
            Command::Drop => self.drop_table(blueprint),
            Command::Rename { to } => self.rename(blueprint, to),
            Command::DropColumn { columns } => self.drop_column(blueprint, columns),
            Command::Primary(index) => self.primary(blueprint, index),
            Command::Unique(index) => self.unique(blueprint, index),
            Command::Fulltext(index) => self.fulltext(blueprint, index),
            Command::Index(index) => self.index(blueprint, index),
            Command::Foreign(foreign) => self.foreign(blueprint, foreign),
            Command::DropPrimary { name } => self.drop_primary(blueprint, name.as_deref()),
            Command::DropUnique { name } => self.drop_unique(blueprint, name),
            Command::DropIndex { name } => self.drop_index(blueprint, name),
            Command::DropFulltext { name } => self.drop_fulltext(blueprint, name),
            Command::DropForeign { name } => self.drop_foreign(blueprint, name),
        }
    }

    fn create(&self, blueprint: &Blueprint) -> Statements {
        Ok(vec![format!(
            "CREATE TABLE {} ({})",
            self.table(blueprint),
            self.columns(blueprint)?.join(", ")
        )])
    }

    fn add(&self, blueprint: &Blueprint) -> Statements {
        let columns = self
            .columns(blueprint)?
            .into_iter()
            .map(|column| format!("ADD COLUMN {}", column))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(vec![format!("ALTER TABLE {} {}", self.table(blueprint), columns)])
    }

    fn drop_table(&self, blueprint: &Blueprint) -> Statements {
        Ok(vec![format!("DROP TABLE {}", self.table(blueprint))])
    }

    fn rename(&self, blueprint: &Blueprint, to: &str) -> Statements {
        Ok(vec![format!(
            "ALTER TABLE {} RENAME TO {}",
            self.table(blueprint),
            self.wrap_identifier(to)
        )])
    }

    fn drop_column(&self, blueprint: &Blueprint, columns: &[String]) -> Statements {
        let columns = columns
            .iter()
            .map(|column| format!("DROP COLUMN {}", self.wrap_value(column)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(vec![format!("ALTER TABLE {} {}", self.table(blueprint), columns)])
    }

    fn primary(&self, blueprint: &Blueprint, index: &IndexCommand) -> Statements {
        Ok(vec![format!(
            "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
            self.table(blueprint),
            self.wrap_value(&index.name),
            self.column_list(&index.columns)
        )])
    }

    fn unique(&self, blueprint: &Blueprint, index: &IndexCommand) -> Statements {
        Ok(vec![format!(
            "CREATE UNIQUE INDEX {} ON {} ({})",
            self.wrap_value(&index.name),
            self.table(blueprint),
            self.column_list(&index.columns)
        )])
    }

    fn fulltext(&self, _blueprint: &Blueprint, index: &IndexCommand) -> Statements {
        Err(self.unsupported(&Command::Fulltext(index.clone())))
    }

    fn index(&self, blueprint: &Blueprint, index: &IndexCommand) -> Statements {
        Ok(vec![format!(
            "CREATE INDEX {} ON {} ({})",
            self.wrap_value(&index.name),
            self.table(blueprint),
            self.column_list(&index.columns)
        )])
    }

    fn foreign(&self, blueprint: &Blueprint, foreign: &ForeignKey) -> Statements {
        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.table(blueprint),
            self.wrap_value(&foreign.name),
            self.column_list(&foreign.columns),
            self.wrap_identifier(&foreign.on),
            self.column_list(&foreign.references)
        );
        if let Some(action) = &foreign.on_delete {
            sql.push_str(&format!(" ON DELETE {}", action.to_uppercase()));
        }
        if let Some(action) = &foreign.on_update {
            sql.push_str(&format!(" ON UPDATE {}", action.to_uppercase()));
        }
        Ok(vec![sql])
    }

    fn drop_primary(&self, blueprint: &Blueprint, name: Option<&str>) -> Statements {
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_pkey", blueprint.table));
        self.drop_constraint(blueprint, &name)
    }

    fn drop_unique(&self, _blueprint: &Blueprint, name: &str) -> Statements {
        Ok(vec![format!("DROP INDEX {}", self.wrap_value(name))])
    }

    fn drop_index(&self, _blueprint: &Blueprint, name: &str) -> Statements {
        Ok(vec![format!("DROP INDEX {}", self.wrap_value(name))])
    }

    fn drop_fulltext(&self, blueprint: &Blueprint, name: &str) -> Statements {
        self.drop_index(blueprint, name)
    }

    fn drop_foreign(&self, blueprint: &Blueprint, name: &str) -> Statements {
        self.drop_constraint(blueprint, name)
    }

    fn drop_constraint(&self, blueprint: &Blueprint, name: &str) -> Statements {
        Ok(vec![format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.table(blueprint),
            self.wrap_value(name)
        )])
    }
}
