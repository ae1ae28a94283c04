//! PostgreSQL grammar.

use crate::grammar::Grammar;
use crate::query::builder::{Query, Record};
use crate::schema::blueprint::{Blueprint, ColumnDefinition, ColumnType, IndexCommand};
use crate::schema::grammar::{ansi_decimal, ansi_string, ansi_text, Statements, TypeRenderer};
use crate::schema::SchemaGrammar;

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresGrammar;

fn integer(column: &ColumnDefinition) -> String {
    if column.increment { "SERIAL" } else { "BIGINT" }.to_string()
}

fn real(_: &ColumnDefinition) -> String {
    "REAL".to_string()
}

fn smallint(_: &ColumnDefinition) -> String {
    "SMALLINT".to_string()
}

fn timestamp(_: &ColumnDefinition) -> String {
    "TIMESTAMP(0) WITHOUT TIME ZONE".to_string()
}

fn bytea(_: &ColumnDefinition) -> String {
    "BYTEA".to_string()
}

impl Grammar for PostgresGrammar {
    fn name(&self) -> &'static str {
        "pgsql"
    }

    fn insert_returns_id(&self) -> bool {
        true
    }

    fn schema(&self) -> Option<&dyn SchemaGrammar> {
        Some(self)
    }

    fn insert_get_id(&self, query: &Query, values: &Record, column: &str) -> String {
        format!(
            "{} RETURNING {}",
            self.insert(query, std::slice::from_ref(values)),
            self.wrap_value(column)
        )
    }
}

impl SchemaGrammar for PostgresGrammar {
    fn type_renderer(&self, column_type: ColumnType) -> Option<TypeRenderer> {
        Some(match column_type {
            ColumnType::String => ansi_string,
            ColumnType::Integer => integer,
            ColumnType::Float => real,
            ColumnType::Decimal => ansi_decimal,
            ColumnType::Boolean => smallint,
            ColumnType::Date | ColumnType::Timestamp => timestamp,
            ColumnType::Text => ansi_text,
            ColumnType::Blob => bytea,
        })
    }

    fn incrementer(&self) -> &'static str {
        " PRIMARY KEY"
    }

    fn fulltext(&self, blueprint: &Blueprint, index: &IndexCommand) -> Statements {
        let columns = index
            .columns
            .iter()
            .map(|column| self.wrap_value(column))
            .collect::<Vec<_>>()
            .join(" || ' ' || ");
        Ok(vec![format!(
            "CREATE INDEX {} ON {} USING gin(to_tsvector('english', {}))",
            self.wrap_value(&index.name),
            self.table(blueprint),
            columns
        )])
    }

    fn drop_unique(&self, blueprint: &Blueprint, name: &str) -> Statements {
        self.drop_constraint(blueprint, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::builder::record;

    #[test]
    fn test_insert_returning() {
        let query = Query::table("users");
        let values = record([("email", "a@b.c")]);
        assert_eq!(
            PostgresGrammar.insert_get_id(&query, &values, "id"),
            r#"INSERT INTO "users" ("email") VALUES (?) RETURNING "id""#
        );
    }

    #[test]
    fn test_serial_primary_key() {
        let mut table = Blueprint::new("users");
        table.create();
        table.increments("id");
        table.integer("votes").default(0);
        table.timestamps();

        let sql = table.to_sql(&PostgresGrammar).unwrap();
        assert_eq!(
            sql[0],
            concat!(
                r#"CREATE TABLE "users" ("id" SERIAL NOT NULL PRIMARY KEY, "votes" BIGINT NOT NULL DEFAULT 0, "#,
                r#""created_at" TIMESTAMP(0) WITHOUT TIME ZONE NOT NULL, "#,
                r#""updated_at" TIMESTAMP(0) WITHOUT TIME ZONE NOT NULL)"#
            )
        );
    }

    #[test]
    fn test_fulltext_and_drops() {
        let mut table = Blueprint::new("posts");
        table.fulltext(["title", "body"]);
        table.drop_unique("posts_slug_unique");
        table.drop_primary(None);

        let sql = table.to_sql(&PostgresGrammar).unwrap();
        assert_eq!(
            sql,
            vec![
                r#"CREATE INDEX "posts_title_body_fulltext" ON "posts" USING gin(to_tsvector('english', "title" || ' ' || "body"))"#,
                r#"ALTER TABLE "posts" DROP CONSTRAINT "posts_slug_unique""#,
                r#"ALTER TABLE "posts" DROP CONSTRAINT "posts_pkey""#,
            ]
        );
    }
}
