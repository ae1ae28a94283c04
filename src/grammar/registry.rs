//! Driver name → grammar lookup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::grammar::{Grammar, GenericGrammar, MySqlGrammar, PostgresGrammar, SqlServerGrammar, SqliteGrammar};

/// Grammars keyed by connection driver name. Unknown drivers fall back to
/// the generic grammar.
#[derive(Clone)]
pub struct GrammarRegistry {
    grammars: HashMap<String, Arc<dyn Grammar>>,
    fallback: Arc<dyn Grammar>,
}

impl std::fmt::Debug for GrammarRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut drivers: Vec<&str> = self.grammars.keys().map(String::as_str).collect();
        drivers.sort_unstable();
        f.debug_struct("GrammarRegistry")
            .field("drivers", &drivers)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        let builtin: [(&str, Arc<dyn Grammar>); 4] = [
            ("mysql", Arc::new(MySqlGrammar)),
            ("pgsql", Arc::new(PostgresGrammar)),
            ("sqlite", Arc::new(SqliteGrammar)),
            ("sqlsrv", Arc::new(SqlServerGrammar)),
        ];
        Self {
            grammars: builtin
                .into_iter()
                .map(|(driver, grammar)| (driver.to_string(), grammar))
                .collect(),
            fallback: Arc::new(GenericGrammar),
        }
    }
}

impl GrammarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the grammar for a custom driver.
    pub fn register(&mut self, driver: impl Into<String>, grammar: Arc<dyn Grammar>) {
        let driver = driver.into();
        tracing::debug!(driver = %driver, grammar = grammar.name(), "Grammar registered");
        self.grammars.insert(driver, grammar);
    }

    pub fn resolve(&self, driver: &str) -> Arc<dyn Grammar> {
        self.grammars
            .get(driver)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    pub fn contains(&self, driver: &str) -> bool {
        self.grammars.contains_key(driver)
    }
}
