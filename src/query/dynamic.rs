//! Dynamic `where<Column>[And|Or]<Column>...` methods.
//!
//! The method name is parsed once into column/connector pairs and then
//! applied as ordinary equality clauses.

use convert_case::{Case, Casing};

use crate::query::builder::Query;
use crate::query::clause::Connector;
use crate::query::error::{QueryError, QueryResult};
use crate::query::value::{Column, Value};

const PREFIX: &str = "where";

/// One equality condition named by a dynamic method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicSegment {
    pub column: String,
    pub connector: Connector,
}

/// Split a camel-case identifier into words at upper-case boundaries.
fn words(name: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    for (idx, ch) in name.char_indices().skip(1) {
        if ch.is_ascii_uppercase() {
            words.push(&name[start..idx]);
            start = idx;
        }
    }
    if start < name.len() {
        words.push(&name[start..]);
    }
    words
}

/// Parse `whereFirstNameOrAge` into `[first_name AND, age OR]`.
///
/// The connector starts as AND and changes only at an `And`/`Or` word.
pub fn parse(method: &str) -> QueryResult<Vec<DynamicSegment>> {
    let invalid = || QueryError::DynamicMethod(method.to_string());

    let rest = method.strip_prefix(PREFIX).ok_or_else(invalid)?;
    if !rest.starts_with(|c: char| c.is_ascii_uppercase()) {
        return Err(invalid());
    }

    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut connector = Connector::And;

    for word in words(rest) {
        let next = match word {
            "And" => Some(Connector::And),
            "Or" => Some(Connector::Or),
            _ => None,
        };
        match next {
            Some(next) => {
                if current.is_empty() {
                    return Err(invalid());
                }
                segments.push(DynamicSegment {
                    column: current.concat().to_case(Case::Snake),
                    connector,
                });
                current.clear();
                connector = next;
            }
            None => current.push(word),
        }
    }

    if current.is_empty() {
        return Err(invalid());
    }
    segments.push(DynamicSegment {
        column: current.concat().to_case(Case::Snake),
        connector,
    });

    Ok(segments)
}

impl Query {
    /// Apply a dynamic where method, e.g. `("whereNameAndAge", ["Bob", 25])`.
    pub fn dynamic_where<V: Into<Value>>(mut self, method: &str, args: impl IntoIterator<Item = V>) -> QueryResult<Self> {
        let segments = parse(method)?;
        let args: Vec<Value> = args.into_iter().map(Into::into).collect();

        if args.len() != segments.len() {
            return Err(QueryError::ArgumentCount {
                method: method.to_string(),
                expected: segments.len(),
                actual: args.len(),
            });
        }

        for (segment, value) in segments.into_iter().zip(args) {
            self.add_where(Column::from(segment.column), "=".to_string(), value, segment.connector);
        }
        Ok(self)
    }
}
