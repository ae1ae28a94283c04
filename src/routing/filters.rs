//! Route filters.
//!
//! # Responsibilities
//! - Hold named filters and URI-pattern filter bindings
//! - Parse route-attached filter strings (`name:arg1,arg2`)
//!
//! # Design Decisions
//! - One callable shape for both phases: before filters get `None` and may
//!   return a response to short-circuit; after filters get the response by
//!   mutable reference and their return value is ignored

use std::collections::HashMap;
use std::sync::Arc;

use crate::routing::action::{split_filters, Response};
use crate::routing::error::DispatchError;

/// A filter callable.
pub type Filter = Arc<dyn Fn(&[String], Option<&mut Response>) -> Option<Response> + Send + Sync>;

/// Resolves and runs filters by name.
pub trait FilterRegistry: Send + Sync {
    fn has(&self, name: &str) -> bool;

    /// Run filter `name`. Before filters are called with `response: None`.
    fn call(&self, name: &str, args: &[String], response: Option<&mut Response>) -> Result<Option<Response>, DispatchError>;

    /// Filters bound to URI patterns that match `uri`, in binding order.
    fn pattern_filters(&self, uri: &str) -> Vec<String>;
}

/// A parsed `name:arg1,arg2` filter reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<String>,
}

impl FilterCall {
    pub fn parse(filter: &str) -> Self {
        match filter.split_once(':') {
            Some((name, args)) => Self {
                name: name.trim().to_string(),
                args: args.split(',').map(|arg| arg.trim().to_string()).collect(),
            },
            None => Self {
                name: filter.trim().to_string(),
                args: Vec::new(),
            },
        }
    }
}

/// Glob match of `pattern` against a normalized URI; `*` matches any run
/// of characters, slashes included.
pub fn glob_matches(pattern: &str, uri: &str) -> bool {
    let pattern = normalize(pattern);
    let uri = normalize(uri);

    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = uri.strip_prefix(first) else {
        return false;
    };

    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

fn normalize(uri: &str) -> &str {
    match uri.trim_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// In-memory filter registry.
#[derive(Clone, Default)]
pub struct Filters {
    filters: HashMap<String, Filter>,
    patterns: Vec<(String, Vec<String>)>,
}

impl std::fmt::Debug for Filters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Filters")
            .field("filters", &names)
            .field("patterns", &self.patterns)
            .finish()
    }
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter under `name`; `before`, `after` and
    /// `<bundle>::before`/`<bundle>::after` run around every route.
    pub fn register<F>(&mut self, name: impl Into<String>, filter: F) -> &mut Self
    where
        F: Fn(&[String], Option<&mut Response>) -> Option<Response> + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Arc::new(filter));
        self
    }

    /// Run `filters` (`name|name:args`) before every route whose URI
    /// matches the glob `pattern`.
    pub fn pattern(&mut self, pattern: impl Into<String>, filters: &str) -> &mut Self {
        self.patterns
            .push((pattern.into(), split_filters(filters).collect()));
        self
    }
}

impl FilterRegistry for Filters {
    fn has(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    fn call(&self, name: &str, args: &[String], response: Option<&mut Response>) -> Result<Option<Response>, DispatchError> {
        let filter = self
            .filters
            .get(name)
            .ok_or_else(|| DispatchError::FilterNotFound(name.to_string()))?;
        Ok(filter(args, response))
    }

    fn pattern_filters(&self, uri: &str) -> Vec<String> {
        self.patterns
            .iter()
            .filter(|(pattern, _)| glob_matches(pattern, uri))
            .flat_map(|(_, filters)| filters.iter().cloned())
            .collect()
    }
}
