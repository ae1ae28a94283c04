//! Table blueprints: the DDL counterpart of the query builder.
//!
//! A blueprint records columns and commands for one table; nothing is
//! rendered until [`Blueprint::to_sql`] hands it to a grammar.

use serde::{Deserialize, Serialize};

use crate::grammar::{Grammar, GrammarError};
use crate::query::value::Value;

/// Column data types every grammar maps to a native type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    Timestamp,
    Text,
    Blob,
}

/// Default VARCHAR length.
pub const DEFAULT_STRING_LENGTH: u32 = 200;

/// One column declaration with its modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
    pub length: u32,
    pub precision: u32,
    pub scale: u32,
    pub nullable: bool,
    pub default: Option<Value>,
    pub unsigned: bool,
    pub increment: bool,
    pub primary: bool,
    pub unique: bool,
    pub index: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            length: DEFAULT_STRING_LENGTH,
            precision: 0,
            scale: 0,
            nullable: false,
            default: None,
            unsigned: false,
            increment: false,
            primary: false,
            unique: false,
            index: false,
        }
    }

    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    pub fn default(&mut self, value: impl Into<Value>) -> &mut Self {
        self.default = Some(value.into());
        self
    }

    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    /// Add a primary key on this column alone.
    pub fn primary(&mut self) -> &mut Self {
        self.primary = true;
        self
    }

    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    pub fn index(&mut self) -> &mut Self {
        self.index = true;
        self
    }
}

/// Columns and generated name of an index command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCommand {
    pub name: String,
    pub columns: Vec<String>,
}

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub references: Vec<String>,
    pub on: String,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

impl ForeignKey {
    pub fn references<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Self {
        self.references = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn on(&mut self, table: impl Into<String>) -> &mut Self {
        self.on = table.into();
        self
    }

    pub fn on_delete(&mut self, action: impl Into<String>) -> &mut Self {
        self.on_delete = Some(action.into());
        self
    }

    pub fn on_update(&mut self, action: impl Into<String>) -> &mut Self {
        self.on_update = Some(action.into());
        self
    }
}

/// A DDL operation on the blueprint's table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create,
    Add,
    Drop,
    Rename { to: String },
    DropColumn { columns: Vec<String> },
    Primary(IndexCommand),
    Unique(IndexCommand),
    Fulltext(IndexCommand),
    Index(IndexCommand),
    Foreign(ForeignKey),
    DropPrimary { name: Option<String> },
    DropUnique { name: String },
    DropIndex { name: String },
    DropFulltext { name: String },
    DropForeign { name: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Create => "create",
            Command::Add => "add",
            Command::Drop => "drop",
            Command::Rename { .. } => "rename",
            Command::DropColumn { .. } => "drop_column",
            Command::Primary(_) => "primary",
            Command::Unique(_) => "unique",
            Command::Fulltext(_) => "fulltext",
            Command::Index(_) => "index",
            Command::Foreign(_) => "foreign",
            Command::DropPrimary { .. } => "drop_primary",
            Command::DropUnique { .. } => "drop_unique",
            Command::DropIndex { .. } => "drop_index",
            Command::DropFulltext { .. } => "drop_fulltext",
            Command::DropForeign { .. } => "drop_foreign",
        }
    }
}

/// Kinds of index a column can declare fluently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexKind {
    Primary,
    Unique,
    Fulltext,
    Index,
}

impl IndexKind {
    fn suffix(&self) -> &'static str {
        match self {
            IndexKind::Primary => "primary",
            IndexKind::Unique => "unique",
            IndexKind::Fulltext => "fulltext",
            IndexKind::Index => "index",
        }
    }
}

/// Columns and commands for a single table.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    pub table: String,
    pub columns: Vec<ColumnDefinition>,
    pub commands: Vec<Command>,
    pub engine: Option<String>,
}

impl Blueprint {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            commands: Vec::new(),
            engine: None,
        }
    }

    /// True if the blueprint creates its table.
    pub fn creating(&self) -> bool {
        self.commands.iter().any(|command| *command == Command::Create)
    }

    // --- Table commands ---

    pub fn create(&mut self) -> &mut Self {
        self.commands.push(Command::Create);
        self
    }

    pub fn drop(&mut self) -> &mut Self {
        self.commands.push(Command::Drop);
        self
    }

    pub fn rename(&mut self, to: impl Into<String>) -> &mut Self {
        self.commands.push(Command::Rename { to: to.into() });
        self
    }

    /// Storage engine (MySQL only; other grammars ignore it).
    pub fn engine(&mut self, engine: impl Into<String>) -> &mut Self {
        self.engine = Some(engine.into());
        self
    }

    // --- Columns ---

    fn column(&mut self, name: impl Into<String>, column_type: ColumnType) -> &mut ColumnDefinition {
        self.columns.push(ColumnDefinition::new(name, column_type));
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }

    /// Auto-incrementing integer primary key.
    pub fn increments(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        let column = self.column(name, ColumnType::Integer);
        column.increment = true;
        column.unsigned = true;
        column
    }

    pub fn string(&mut self, name: impl Into<String>, length: u32) -> &mut ColumnDefinition {
        let column = self.column(name, ColumnType::String);
        column.length = length;
        column
    }

    pub fn integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Integer)
    }

    pub fn float(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Float)
    }

    pub fn decimal(&mut self, name: impl Into<String>, precision: u32, scale: u32) -> &mut ColumnDefinition {
        let column = self.column(name, ColumnType::Decimal);
        column.precision = precision;
        column.scale = scale;
        column
    }

    pub fn boolean(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Boolean)
    }

    pub fn date(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Date)
    }

    pub fn timestamp(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Timestamp)
    }

    /// `created_at` and `updated_at` date columns.
    pub fn timestamps(&mut self) -> &mut Self {
        self.date("created_at");
        self.date("updated_at");
        self
    }

    pub fn text(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Text)
    }

    pub fn blob(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.column(name, ColumnType::Blob)
    }

    // --- Keys ---

    fn index_command(&self, columns: Vec<String>, kind: IndexKind) -> IndexCommand {
        let name = format!("{}_{}_{}", self.table, columns.join("_"), kind.suffix()).to_lowercase();
        IndexCommand { name, columns }
    }

    fn key<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>, kind: IndexKind) -> &mut Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let index = self.index_command(columns, kind);
        self.commands.push(match kind {
            IndexKind::Primary => Command::Primary(index),
            IndexKind::Unique => Command::Unique(index),
            IndexKind::Fulltext => Command::Fulltext(index),
            IndexKind::Index => Command::Index(index),
        });
        self
    }

    pub fn primary<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Self {
        self.key(columns, IndexKind::Primary)
    }

    pub fn unique<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Self {
        self.key(columns, IndexKind::Unique)
    }

    pub fn fulltext<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Self {
        self.key(columns, IndexKind::Fulltext)
    }

    pub fn index<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Self {
        self.key(columns, IndexKind::Index)
    }

    /// Foreign key on `columns`; finish it with `references(..).on(..)`.
    pub fn foreign<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut ForeignKey {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let name = format!("{}_{}_foreign", self.table, columns.join("_")).to_lowercase();
        self.commands.push(Command::Foreign(ForeignKey {
            name,
            columns,
            references: Vec::new(),
            on: String::new(),
            on_delete: None,
            on_update: None,
        }));
        match self.commands.last_mut() {
            Some(Command::Foreign(foreign)) => foreign,
            _ => unreachable!("foreign key command was just pushed"),
        }
    }

    pub fn drop_column<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Self {
        let columns = columns.into_iter().map(Into::into).collect();
        self.commands.push(Command::DropColumn { columns });
        self
    }

    pub fn drop_primary(&mut self, name: Option<&str>) -> &mut Self {
        self.commands.push(Command::DropPrimary {
            name: name.map(str::to_string),
        });
        self
    }

    pub fn drop_unique(&mut self, name: impl Into<String>) -> &mut Self {
        self.commands.push(Command::DropUnique { name: name.into() });
        self
    }

    pub fn drop_index(&mut self, name: impl Into<String>) -> &mut Self {
        self.commands.push(Command::DropIndex { name: name.into() });
        self
    }

    pub fn drop_fulltext(&mut self, name: impl Into<String>) -> &mut Self {
        self.commands.push(Command::DropFulltext { name: name.into() });
        self
    }

    pub fn drop_foreign(&mut self, name: impl Into<String>) -> &mut Self {
        self.commands.push(Command::DropForeign { name: name.into() });
        self
    }

    // --- Rendering ---

    /// Commands after implications: an implied `Add` when columns are
    /// declared on an existing table, and index commands for fluent
    /// column flags.
    pub fn resolved_commands(&self) -> Vec<Command> {
        let mut resolved = self.clone();

        if !resolved.columns.is_empty() && !resolved.creating() {
            resolved.commands.insert(0, Command::Add);
        }

        for column in &self.columns {
            let flags = [
                (column.primary, IndexKind::Primary),
                (column.unique, IndexKind::Unique),
                (column.index, IndexKind::Index),
            ];
            for (set, kind) in flags {
                if set {
                    resolved.key([column.name.clone()], kind);
                }
            }
        }

        resolved.commands
    }

    /// Render every command through `grammar`, in order.
    pub fn to_sql(&self, grammar: &dyn Grammar) -> Result<Vec<String>, GrammarError> {
        let schema = grammar
            .schema()
            .ok_or(GrammarError::SchemaUnsupported(grammar.name()))?;

        let mut statements = Vec::new();
        for command in self.resolved_commands() {
            statements.extend(schema.compile(self, &command)?);
        }
        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::grammar::{SchemaGrammar, TypeRenderer};

    /// Dialect with no binary column type.
    struct NoBlob;

    impl Grammar for NoBlob {
        fn name(&self) -> &'static str {
            "noblob"
        }

        fn schema(&self) -> Option<&dyn SchemaGrammar> {
            Some(self)
        }
    }

    impl SchemaGrammar for NoBlob {
        fn type_renderer(&self, column_type: ColumnType) -> Option<TypeRenderer> {
            match column_type {
                ColumnType::Blob => None,
                _ => crate::grammar::GenericGrammar.type_renderer(column_type),
            }
        }
    }

    #[test]
    fn test_unsupported_column_type_fails_whole_blueprint() {
        let mut table = Blueprint::new("files");
        table.create();
        table.string("name", 100).unique();
        table.blob("contents");

        assert_eq!(
            table.to_sql(&NoBlob),
            Err(GrammarError::UnsupportedType {
                grammar: "noblob",
                column_type: ColumnType::Blob,
            })
        );

        let mut table = Blueprint::new("files");
        table.create();
        table.string("name", 100);
        assert_eq!(table.to_sql(&NoBlob).unwrap().len(), 1);
    }

    #[test]
    fn test_implied_add() {
        let mut table = Blueprint::new("users");
        table.string("nickname", 50);
        assert_eq!(table.resolved_commands(), vec![Command::Add]);

        let mut table = Blueprint::new("users");
        table.create();
        table.string("nickname", 50);
        assert_eq!(table.resolved_commands(), vec![Command::Create]);
    }

    #[test]
    fn test_fluent_indexes_become_commands() {
        let mut table = Blueprint::new("Users");
        table.create();
        table.string("email", 100).unique();
        table.integer("team_id").index();

        let commands = table.resolved_commands();
        assert_eq!(commands.len(), 3);
        assert_eq!(
            commands[1],
            Command::Unique(IndexCommand {
                name: "users_email_unique".into(),
                columns: vec!["email".into()],
            })
        );
        assert_eq!(commands[2].name(), "index");
    }

    #[test]
    fn test_foreign_builder() {
        let mut table = Blueprint::new("posts");
        table
            .foreign(["user_id"])
            .references(["id"])
            .on("users")
            .on_delete("cascade");
        match &table.commands[0] {
            Command::Foreign(fk) => {
                assert_eq!(fk.name, "posts_user_id_foreign");
                assert_eq!(fk.on, "users");
                assert_eq!(fk.on_delete.as_deref(), Some("cascade"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_increments_defaults() {
        let mut table = Blueprint::new("users");
        let id = table.increments("id").clone();
        assert!(id.increment);
        assert_eq!(id.column_type, ColumnType::Integer);
    }
}
