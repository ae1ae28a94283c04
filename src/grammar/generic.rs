//! Generic ANSI grammar, used for unknown drivers.

use crate::grammar::Grammar;
use crate::schema::SchemaGrammar;

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericGrammar;

impl Grammar for GenericGrammar {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn schema(&self) -> Option<&dyn SchemaGrammar> {
        Some(self)
    }
}

impl SchemaGrammar for GenericGrammar {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarError;
    use crate::schema::Blueprint;

    #[test]
    fn test_create_table() {
        let mut table = Blueprint::new("users");
        table.create();
        table.increments("id");
        table.string("email", 100).unique();
        table.boolean("active").default(true);
        table.decimal("balance", 8, 2).nullable();

        let sql = table.to_sql(&GenericGrammar).unwrap();
        assert_eq!(
            sql,
            vec![
                concat!(
                    r#"CREATE TABLE "users" ("id" INTEGER NOT NULL GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY, "#,
                    r#""email" VARCHAR(100) NOT NULL, "active" BOOLEAN NOT NULL DEFAULT 1, "#,
                    r#""balance" DECIMAL(8, 2) NULL)"#
                )
                .to_string(),
                r#"CREATE UNIQUE INDEX "users_email_unique" ON "users" ("email")"#.to_string(),
            ]
        );
    }

    #[test]
    fn test_alter_table() {
        let mut table = Blueprint::new("users");
        table.text("bio").nullable();
        table.drop_column(["legacy"]);
        table.foreign(["team_id"]).references(["id"]).on("teams").on_delete("cascade");

        let sql = table.to_sql(&GenericGrammar).unwrap();
        assert_eq!(sql[0], r#"ALTER TABLE "users" ADD COLUMN "bio" TEXT NULL"#);
        assert_eq!(sql[1], r#"ALTER TABLE "users" DROP COLUMN "legacy""#);
        assert_eq!(
            sql[2],
            concat!(
                r#"ALTER TABLE "users" ADD CONSTRAINT "users_team_id_foreign" "#,
                r#"FOREIGN KEY ("team_id") REFERENCES "teams" ("id") ON DELETE CASCADE"#
            )
        );
    }

    #[test]
    fn test_fulltext_is_unsupported() {
        let mut table = Blueprint::new("posts");
        table.fulltext(["body"]);
        assert_eq!(
            table.to_sql(&GenericGrammar),
            Err(GrammarError::UnsupportedCommand {
                grammar: "generic",
                command: "fulltext",
            })
        );
    }
}
