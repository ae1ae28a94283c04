//! Route actions and responses.
//!
//! # Design Decisions
//! - Delegates are parsed once, at registration; dispatch never looks at
//!   the `bundle::controller@method` string again
//! - A delegate whose method is a capture placeholder (`home@(:1)`) takes
//!   its method name from the route parameters at dispatch time

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::routing::error::{RoutingError, RoutingResult};

/// Bundle used when a delegate names none.
pub const DEFAULT_BUNDLE: &str = "application";

/// What a route or filter produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn not_found() -> Self {
        Self::new(404, "Not Found")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl From<&str> for Response {
    fn from(body: &str) -> Self {
        Self::ok(body)
    }
}

impl From<String> for Response {
    fn from(body: String) -> Self {
        Self::ok(body)
    }
}

/// Method part of a delegate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DelegateMethod {
    Named(String),
    /// `(:n)`: the n-th (1-based) route parameter names the method.
    Captured(usize),
}

/// A `[bundle::]controller@method` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delegate {
    pub bundle: String,
    pub controller: String,
    pub method: DelegateMethod,
}

impl Delegate {
    /// `bundle::controller`, the key controllers are registered under.
    pub fn identifier(&self) -> String {
        format!("{}::{}", self.bundle, self.controller)
    }
}

impl FromStr for Delegate {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RoutingError::InvalidDelegate(s.to_string());

        let (bundle, rest) = match s.split_once("::") {
            Some((bundle, rest)) => (bundle.trim(), rest),
            None => (DEFAULT_BUNDLE, s),
        };
        let (controller, method) = rest.split_once('@').ok_or_else(invalid)?;
        let (controller, method) = (controller.trim(), method.trim());
        if bundle.is_empty() || controller.is_empty() || method.is_empty() {
            return Err(invalid());
        }

        let method = match method.strip_prefix("(:").and_then(|m| m.strip_suffix(')')) {
            Some(index) => match index.parse::<usize>() {
                Ok(index) if index > 0 => DelegateMethod::Captured(index),
                _ => return Err(invalid()),
            },
            None => DelegateMethod::Named(method.to_string()),
        };

        Ok(Self {
            bundle: bundle.to_string(),
            controller: controller.to_string(),
            method,
        })
    }
}

impl fmt::Display for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bundle != DEFAULT_BUNDLE {
            write!(f, "{}::", self.bundle)?;
        }
        match &self.method {
            DelegateMethod::Named(method) => write!(f, "{}@{}", self.controller, method),
            DelegateMethod::Captured(index) => write!(f, "{}@(:{})", self.controller, index),
        }
    }
}

/// A closure route: receives the route parameters positionally.
pub type Handler = Arc<dyn Fn(&[String]) -> Response + Send + Sync>;

#[derive(Clone)]
pub enum Action {
    Delegate(Delegate),
    Handler(Handler),
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Delegate(delegate) => f.debug_tuple("Delegate").field(delegate).finish(),
            Action::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Delegate(delegate) => write!(f, "{}", delegate),
            Action::Handler(_) => f.write_str("<closure>"),
        }
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// An action plus the per-route options registered with it.
#[derive(Debug, Clone, Serialize)]
pub struct RouteAction {
    pub uses: Action,
    #[serde(rename = "as", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub https: bool,
    pub before: Vec<String>,
    pub after: Vec<String>,
    pub defaults: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl RouteAction {
    pub fn new(uses: Action) -> Self {
        Self {
            uses,
            name: None,
            https: false,
            before: Vec::new(),
            after: Vec::new(),
            defaults: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Route to a `[bundle::]controller@method` delegate.
    pub fn uses(delegate: &str) -> RoutingResult<Self> {
        Ok(Self::new(Action::Delegate(delegate.parse()?)))
    }

    /// Route to a closure.
    pub fn handler<F>(handler: F) -> Self
    where
        F: Fn(&[String]) -> Response + Send + Sync + 'static,
    {
        Self::new(Action::Handler(Arc::new(handler)))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn https(mut self) -> Self {
        self.https = true;
        self
    }

    /// Before filters, `name|name:arg1,arg2` syntax.
    pub fn before(mut self, filters: &str) -> Self {
        self.before.extend(split_filters(filters));
        self
    }

    /// After filters, same syntax as [`RouteAction::before`].
    pub fn after(mut self, filters: &str) -> Self {
        self.after.extend(split_filters(filters));
        self
    }

    pub fn defaults<S: Into<String>>(mut self, defaults: impl IntoIterator<Item = S>) -> Self {
        self.defaults = defaults.into_iter().map(Into::into).collect();
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn delegate(&self) -> Option<&Delegate> {
        match &self.uses {
            Action::Delegate(delegate) => Some(delegate),
            Action::Handler(_) => None,
        }
    }
}

impl From<Delegate> for RouteAction {
    fn from(delegate: Delegate) -> Self {
        Self::new(Action::Delegate(delegate))
    }
}

pub(crate) fn split_filters(filters: &str) -> impl Iterator<Item = String> + '_ {
    filters
        .split('|')
        .map(str::trim)
        .filter(|filter| !filter.is_empty())
        .map(str::to_string)
}
