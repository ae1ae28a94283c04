//! Shared utilities for integration testing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use trellis::grammar::Grammar;
use trellis::query::{Connection, Driver, DriverError, QueryOutput, Row, Value};

/// One statement seen by the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub bindings: Vec<Value>,
}

/// Driver that records every statement and replays scripted results.
///
/// With nothing scripted, SELECTs return no rows and other statements
/// report one affected row.
#[derive(Clone, Default)]
pub struct RecordingDriver {
    executed: Arc<Mutex<Vec<Executed>>>,
    scripted: Arc<Mutex<VecDeque<Result<QueryOutput, String>>>>,
}

#[allow(dead_code)]
impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning(&self, output: QueryOutput) -> &Self {
        self.scripted.lock().unwrap().push_back(Ok(output));
        self
    }

    pub fn failing(&self, message: &str) -> &Self {
        self.scripted.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.executed.lock().unwrap().clone()
    }

    pub fn last(&self) -> Executed {
        self.executed().pop().expect("no statement executed")
    }
}

impl Driver for RecordingDriver {
    fn run(&self, sql: &str, bindings: &[Value]) -> Result<QueryOutput, DriverError> {
        self.executed.lock().unwrap().push(Executed {
            sql: sql.to_string(),
            bindings: bindings.to_vec(),
        });
        match self.scripted.lock().unwrap().pop_front() {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(message.into()),
            None if sql.starts_with("SELECT") => Ok(QueryOutput::Rows(Vec::new())),
            None => Ok(QueryOutput::Affected(1)),
        }
    }

    fn last_insert_id(&self) -> Result<Value, DriverError> {
        Ok(Value::Int(42))
    }
}

/// A connection over a fresh recording driver, plus a handle to inspect it.
#[allow(dead_code)]
pub fn connection(grammar: Arc<dyn Grammar>) -> (Connection, RecordingDriver) {
    let driver = RecordingDriver::new();
    let conn = Connection::new("test", grammar, Box::new(driver.clone()));
    (conn, driver)
}

/// A single-row result.
#[allow(dead_code)]
pub fn row(columns: &[(&str, Value)]) -> Row {
    Row::new(
        columns
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect(),
    )
}
