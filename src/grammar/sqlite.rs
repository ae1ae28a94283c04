//! SQLite grammar.
//!
//! SQLite's ALTER TABLE only adds columns and renames tables; primary keys
//! must be declared inline when the table is created.

use crate::grammar::Grammar;
use crate::query::builder::Query;
use crate::schema::blueprint::{Blueprint, ColumnDefinition, ColumnType, Command, ForeignKey, IndexCommand};
use crate::schema::grammar::{ansi_blob, ansi_float, ansi_integer, ansi_string, ansi_text, Statements, TypeRenderer};
use crate::schema::SchemaGrammar;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteGrammar;

fn datetime(_: &ColumnDefinition) -> String {
    "DATETIME".to_string()
}

impl SqliteGrammar {
    /// Columns of the table's primary key, from a `primary` command or a
    /// column flagged `primary()`.
    fn primary_columns(blueprint: &Blueprint) -> Option<Vec<String>> {
        let explicit = blueprint.commands.iter().find_map(|command| match command {
            Command::Primary(index) => Some(index.columns.clone()),
            _ => None,
        });
        explicit.or_else(|| {
            blueprint
                .columns
                .iter()
                .find(|column| column.primary)
                .map(|column| vec![column.name.clone()])
        })
    }
}

impl Grammar for SqliteGrammar {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn schema(&self) -> Option<&dyn SchemaGrammar> {
        Some(self)
    }

    fn limit(&self, query: &Query) -> String {
        match (query.limit, query.offset) {
            (Some(limit), _) => format!("LIMIT {}", limit),
            (None, Some(offset)) if offset > 0 => "LIMIT -1".to_string(),
            _ => String::new(),
        }
    }
}

impl SchemaGrammar for SqliteGrammar {
    fn type_renderer(&self, column_type: ColumnType) -> Option<TypeRenderer> {
        Some(match column_type {
            ColumnType::String => ansi_string,
            ColumnType::Integer | ColumnType::Boolean => ansi_integer,
            ColumnType::Float | ColumnType::Decimal => ansi_float,
            ColumnType::Date | ColumnType::Timestamp => datetime,
            ColumnType::Text => ansi_text,
            ColumnType::Blob => ansi_blob,
        })
    }

    fn incrementer(&self) -> &'static str {
        " PRIMARY KEY AUTOINCREMENT"
    }

    fn create(&self, blueprint: &Blueprint) -> Statements {
        let mut columns = self.columns(blueprint)?.join(", ");
        if let Some(primary) = Self::primary_columns(blueprint) {
            columns.push_str(&format!(", PRIMARY KEY ({})", self.column_list(&primary)));
        }
        Ok(vec![format!("CREATE TABLE {} ({})", self.table(blueprint), columns)])
    }

    fn add(&self, blueprint: &Blueprint) -> Statements {
        let table = self.table(blueprint);
        Ok(self
            .columns(blueprint)?
            .into_iter()
            .map(|column| format!("ALTER TABLE {} ADD COLUMN {}", table, column))
            .collect())
    }

    fn drop_column(&self, _blueprint: &Blueprint, columns: &[String]) -> Statements {
        Err(self.unsupported(&Command::DropColumn {
            columns: columns.to_vec(),
        }))
    }

    /// Rendered inline by `create`.
    fn primary(&self, blueprint: &Blueprint, index: &IndexCommand) -> Statements {
        if blueprint.creating() {
            return Ok(Vec::new());
        }
        Err(self.unsupported(&Command::Primary(index.clone())))
    }

    fn foreign(&self, _blueprint: &Blueprint, foreign: &ForeignKey) -> Statements {
        Err(self.unsupported(&Command::Foreign(foreign.clone())))
    }

    fn drop_primary(&self, _blueprint: &Blueprint, name: Option<&str>) -> Statements {
        Err(self.unsupported(&Command::DropPrimary {
            name: name.map(str::to_string),
        }))
    }

    fn drop_fulltext(&self, _blueprint: &Blueprint, name: &str) -> Statements {
        Err(self.unsupported(&Command::DropFulltext { name: name.to_string() }))
    }

    fn drop_foreign(&self, _blueprint: &Blueprint, name: &str) -> Statements {
        Err(self.unsupported(&Command::DropForeign { name: name.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarError;

    #[test]
    fn test_offset_without_limit() {
        let query = Query::table("logs").skip(10);
        assert_eq!(SqliteGrammar.select(&query), r#"SELECT * FROM "logs" LIMIT -1 OFFSET 10"#);
    }

    #[test]
    fn test_inline_primary_key() {
        let mut table = Blueprint::new("memberships");
        table.create();
        table.integer("user_id");
        table.integer("team_id");
        table.primary(["user_id", "team_id"]);

        let sql = table.to_sql(&SqliteGrammar).unwrap();
        assert_eq!(
            sql,
            vec![concat!(
                r#"CREATE TABLE "memberships" ("user_id" INTEGER NOT NULL, "team_id" INTEGER NOT NULL, "#,
                r#"PRIMARY KEY ("user_id", "team_id"))"#
            )]
        );
    }

    #[test]
    fn test_one_statement_per_added_column() {
        let mut table = Blueprint::new("users");
        table.string("nickname", 50).nullable();
        table.boolean("admin").default(false);

        let sql = table.to_sql(&SqliteGrammar).unwrap();
        assert_eq!(
            sql,
            vec![
                r#"ALTER TABLE "users" ADD COLUMN "nickname" VARCHAR(50) NULL"#,
                r#"ALTER TABLE "users" ADD COLUMN "admin" INTEGER NOT NULL DEFAULT 0"#,
            ]
        );
    }

    #[test]
    fn test_unsupported_alterations() {
        let mut table = Blueprint::new("users");
        table.drop_column(["legacy"]);
        assert_eq!(
            table.to_sql(&SqliteGrammar),
            Err(GrammarError::UnsupportedCommand {
                grammar: "sqlite",
                command: "drop_column",
            })
        );

        let mut table = Blueprint::new("users");
        table.primary(["id"]);
        assert!(table.to_sql(&SqliteGrammar).is_err());
    }
}
