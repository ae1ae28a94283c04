//! Route registration.
//!
//! # Responsibilities
//! - Store routes per method: URIs starting with `(` in the fallback list,
//!   everything else in the literal list
//! - Merge group attributes (prefix, name, https, filters) at registration
//! - Look routes up by name and by delegate
//! - Register controller auto-routes
//!
//! # Design Decisions
//! - Patterns are compiled once, at registration; an invalid pattern fails
//!   the registration instead of the first request that reaches it
//! - Re-registering a method + URI replaces the action in place, so the
//!   route keeps its original position in the pattern scan
//! - Name and delegate lookups are cached in concurrent maps and the caches
//!   are cleared on every registration; once the table is frozen behind an
//!   `Arc` no further registration is possible

use dashmap::DashMap;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::config::schema::{AppConfig, RouteConfig};
use crate::routing::action::{split_filters, Delegate, RouteAction, DEFAULT_BUNDLE};
use crate::routing::error::{RoutingError, RoutingResult};
use crate::routing::method::Method;
use crate::routing::wildcard;

/// Number of optional segments a controller auto-route accepts.
const CONTROLLER_SEGMENTS: usize = 5;

/// One registered route.
#[derive(Debug, Clone, Serialize)]
pub struct RouteDefinition {
    pub method: Method,
    pub uri: String,
    pub action: RouteAction,
    #[serde(skip)]
    pattern: Option<Regex>,
}

impl RouteDefinition {
    /// True for routes whose URI starts with `(`. They are scanned after
    /// every literal-list route, pattern or not.
    pub fn is_fallback(&self) -> bool {
        wildcard::is_fallback(&self.uri)
    }

    /// True when the route is matched by regex instead of exact key.
    pub fn is_pattern(&self) -> bool {
        self.pattern.is_some()
    }

    pub(crate) fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }
}

#[derive(Debug, Clone, Default)]
struct MethodRoutes {
    literal: Vec<RouteDefinition>,
    fallback: Vec<RouteDefinition>,
    /// URI → position in `literal` or `fallback`.
    index: HashMap<String, usize>,
}

impl MethodRoutes {
    fn insert(&mut self, route: RouteDefinition) {
        let existing = self.index.get(&route.uri).copied();
        let list = if route.is_fallback() { &mut self.fallback } else { &mut self.literal };
        match existing {
            Some(position) => list[position] = route,
            None => {
                self.index.insert(route.uri.clone(), list.len());
                list.push(route);
            }
        }
    }

    fn get(&self, uri: &str) -> Option<&RouteDefinition> {
        let position = *self.index.get(uri)?;
        if wildcard::is_fallback(uri) {
            self.fallback.get(position)
        } else {
            self.literal.get(position)
        }
    }

    fn iter(&self) -> impl Iterator<Item = &RouteDefinition> {
        self.literal.iter().chain(self.fallback.iter())
    }
}

/// Attributes shared by every route registered inside a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupAttributes {
    pub prefix: Option<String>,
    /// Prepended verbatim to route names (`"admin."` + `"users"`).
    pub name: Option<String>,
    pub https: Option<bool>,
    pub before: Vec<String>,
    pub after: Vec<String>,
    pub attributes: BTreeMap<String, String>,
}

impl GroupAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn https(mut self, https: bool) -> Self {
        self.https = Some(https);
        self
    }

    pub fn before(mut self, filters: &str) -> Self {
        self.before.extend(split_filters(filters));
        self
    }

    pub fn after(mut self, filters: &str) -> Self {
        self.after.extend(split_filters(filters));
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Nest `inner` inside `self`.
    fn merge(&self, inner: &GroupAttributes) -> GroupAttributes {
        let prefix = match (&self.prefix, &inner.prefix) {
            (Some(outer), Some(inner)) => Some(join_paths(outer, inner)),
            (outer, inner) => inner.clone().or_else(|| outer.clone()),
        };
        let name = match (&self.name, &inner.name) {
            (Some(outer), Some(inner)) => Some(format!("{}{}", outer, inner)),
            (outer, inner) => inner.clone().or_else(|| outer.clone()),
        };
        let mut attributes = self.attributes.clone();
        attributes.extend(inner.attributes.clone());

        GroupAttributes {
            prefix,
            name,
            https: inner.https.or(self.https),
            before: self.before.iter().chain(&inner.before).cloned().collect(),
            after: self.after.iter().chain(&inner.after).cloned().collect(),
            attributes,
        }
    }

    fn apply(&self, mut action: RouteAction) -> RouteAction {
        if let (Some(group), Some(name)) = (&self.name, &action.name) {
            action.name = Some(format!("{}{}", group, name));
        }
        action.https = action.https || self.https.unwrap_or(false);
        action.before = self.before.iter().chain(&action.before).cloned().collect();
        action.after = self.after.iter().chain(&action.after).cloned().collect();
        let mut attributes = self.attributes.clone();
        attributes.extend(std::mem::take(&mut action.attributes));
        action.attributes = attributes;
        action
    }

    fn prefixed(&self, uri: &str) -> String {
        match &self.prefix {
            Some(prefix) => join_paths(prefix, uri),
            None => uri.to_string(),
        }
    }
}

/// Join two path pieces with exactly one `/`.
fn join_paths(left: &str, right: &str) -> String {
    let (left, right) = (left.trim_matches('/'), right.trim_matches('/'));
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{}/{}", left, right),
    }
}

/// Trim surrounding slashes; the empty URI is `/`.
pub fn normalize_uri(uri: &str) -> String {
    match uri.trim().trim_matches('/') {
        "" => "/".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// One URI or a list of URIs sharing an action.
pub trait RouteUris {
    fn into_uris(self) -> Vec<String>;
}

impl RouteUris for &str {
    fn into_uris(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl RouteUris for String {
    fn into_uris(self) -> Vec<String> {
        vec![self]
    }
}

impl RouteUris for &String {
    fn into_uris(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl<const N: usize> RouteUris for [&str; N] {
    fn into_uris(self) -> Vec<String> {
        self.iter().map(|uri| uri.to_string()).collect()
    }
}

impl RouteUris for Vec<&str> {
    fn into_uris(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl RouteUris for Vec<String> {
    fn into_uris(self) -> Vec<String> {
        self
    }
}

/// All registered routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: BTreeMap<Method, MethodRoutes>,
    groups: Vec<GroupAttributes>,
    names: DashMap<String, (Method, String)>,
    delegates: DashMap<Delegate, (Method, String)>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from the `routes`, `groups` and `controllers` config
    /// sections, in that order.
    pub fn from_config(config: &AppConfig) -> RoutingResult<Self> {
        let mut table = Self::new();

        for route in &config.routes {
            table.register_config(route)?;
        }

        for group in &config.groups {
            table.group(group.attributes(), |table| {
                group.routes.iter().try_for_each(|route| table.register_config(route))
            })?;
        }

        for controller in &config.controllers {
            table.controller(&controller.identifier, &controller.default_method, controller.https)?;
        }

        tracing::info!(
            routes = table.len(),
            groups = config.groups.len(),
            controllers = config.controllers.len(),
            "Route table built from config"
        );
        Ok(table)
    }

    fn register_config(&mut self, route: &RouteConfig) -> RoutingResult<()> {
        let mut action = RouteAction::uses(&route.uses)?.defaults(route.defaults.iter().cloned());
        if let Some(name) = &route.name {
            action = action.named(name);
        }
        if route.https {
            action = action.https();
        }
        if let Some(before) = &route.before {
            action = action.before(before);
        }
        if let Some(after) = &route.after {
            action = action.after(after);
        }
        self.register(&route.method, route.uri.as_str(), action)
    }

    /// Register `action` for `method` (`*` for every method) on each URI.
    pub fn register(&mut self, method: &str, uris: impl RouteUris, action: RouteAction) -> RoutingResult<()> {
        let methods = Method::parse_many(method)?;
        let group = self.groups.last().cloned().unwrap_or_default();
        let action = group.apply(action);

        for uri in uris.into_uris() {
            let mut uri = normalize_uri(&group.prefixed(&uri));
            if uri.chars().all(|c| c.is_ascii_digit()) {
                uri = format!("({})", uri);
            }

            let pattern = if wildcard::is_pattern(&uri) {
                let regex = wildcard::compile(&uri).map_err(|source| RoutingError::InvalidPattern {
                    uri: uri.clone(),
                    source,
                })?;
                Some(regex)
            } else {
                None
            };

            for &method in &methods {
                tracing::debug!(method = %method, uri = %uri, action = %action.uses, "Route registered");
                self.routes.entry(method).or_default().insert(RouteDefinition {
                    method,
                    uri: uri.clone(),
                    action: action.clone(),
                    pattern: pattern.clone(),
                });
            }
        }

        self.names.clear();
        self.delegates.clear();
        Ok(())
    }

    pub fn get(&mut self, uris: impl RouteUris, action: RouteAction) -> RoutingResult<()> {
        self.register("GET", uris, action)
    }

    pub fn post(&mut self, uris: impl RouteUris, action: RouteAction) -> RoutingResult<()> {
        self.register("POST", uris, action)
    }

    pub fn put(&mut self, uris: impl RouteUris, action: RouteAction) -> RoutingResult<()> {
        self.register("PUT", uris, action)
    }

    pub fn patch(&mut self, uris: impl RouteUris, action: RouteAction) -> RoutingResult<()> {
        self.register("PATCH", uris, action)
    }

    pub fn delete(&mut self, uris: impl RouteUris, action: RouteAction) -> RoutingResult<()> {
        self.register("DELETE", uris, action)
    }

    pub fn any(&mut self, uris: impl RouteUris, action: RouteAction) -> RoutingResult<()> {
        self.register("*", uris, action)
    }

    /// Register the routes added by `body` with `attributes` merged in.
    /// Groups nest: inner attributes are merged onto the enclosing group's.
    pub fn group<F>(&mut self, attributes: GroupAttributes, body: F) -> RoutingResult<()>
    where
        F: FnOnce(&mut Self) -> RoutingResult<()>,
    {
        let merged = match self.groups.last() {
            Some(outer) => outer.merge(&attributes),
            None => attributes,
        };
        self.groups.push(merged);
        let result = body(self);
        self.groups.pop();
        result
    }

    /// Route `<controller path>/(:any?)...` to `identifier@(:1)`.
    ///
    /// The first segment picks the action (falling back to
    /// `default_method`) and the rest become its parameters. A controller
    /// named `home` also answers its parent path.
    pub fn controller(&mut self, identifier: &str, default_method: &str, https: bool) -> RoutingResult<()> {
        let (bundle, controller) = identifier.split_once("::").unwrap_or((DEFAULT_BUNDLE, identifier));
        let mut root = controller.replace('.', "/");
        if bundle != DEFAULT_BUNDLE {
            root = join_paths(bundle, &root);
        }

        let mut action = RouteAction::uses(&format!("{}@(:1)", identifier))?.defaults([default_method]);
        if https {
            action = action.https();
        }
        let pattern = format!("{}{}", root, "/(:any?)".repeat(CONTROLLER_SEGMENTS));
        self.register("*", pattern, action)?;

        if let Some(parent) = root.strip_suffix("home") {
            if parent.is_empty() || parent.ends_with('/') {
                let mut action = RouteAction::uses(&format!("{}@index", identifier))?;
                if https {
                    action = action.https();
                }
                self.register("*", parent.to_string(), action)?;
            }
        }
        Ok(())
    }

    /// Route registered under `name`, searching methods in [`Method::ALL`]
    /// order.
    pub fn find(&self, name: &str) -> Option<&RouteDefinition> {
        if let Some(key) = self.names.get(name).map(|entry| entry.value().clone()) {
            return self.lookup(key.0, &key.1);
        }
        let route = self.iter().find(|route| route.action.name.as_deref() == Some(name))?;
        self.names.insert(name.to_string(), (route.method, route.uri.clone()));
        Some(route)
    }

    /// First route whose action is `delegate`.
    pub fn uses(&self, delegate: &str) -> Option<&RouteDefinition> {
        let delegate: Delegate = delegate.parse().ok()?;
        if let Some(key) = self.delegates.get(&delegate).map(|entry| entry.value().clone()) {
            return self.lookup(key.0, &key.1);
        }
        let route = self
            .iter()
            .find(|route| route.action.delegate() == Some(&delegate))?;
        self.delegates.insert(delegate, (route.method, route.uri.clone()));
        Some(route)
    }

    pub fn lookup(&self, method: Method, uri: &str) -> Option<&RouteDefinition> {
        self.routes.get(&method)?.get(uri)
    }

    /// Routes for `method`: literal routes in registration order, then
    /// fallback routes in registration order.
    pub fn routes_for_method(&self, method: Method) -> impl Iterator<Item = &RouteDefinition> {
        self.routes.get(&method).into_iter().flat_map(MethodRoutes::iter)
    }

    /// Exact-key hit on a literal-list route that has no pattern.
    pub(crate) fn literal(&self, method: Method, uri: &str) -> Option<&RouteDefinition> {
        let routes = self.routes.get(&method)?;
        let position = *routes.index.get(uri)?;
        routes
            .literal
            .get(position)
            .filter(|route| route.uri == uri && !route.is_pattern())
    }

    /// Pattern routes in scan order: literal-list patterns first, then the
    /// fallback list, each in registration order.
    pub(crate) fn patterns(&self, method: Method) -> impl Iterator<Item = &RouteDefinition> {
        self.routes
            .get(&method)
            .into_iter()
            .flat_map(MethodRoutes::iter)
            .filter(|route| route.is_pattern())
    }

    /// Every route, grouped by method.
    pub fn iter(&self) -> impl Iterator<Item = &RouteDefinition> {
        self.routes.values().flat_map(MethodRoutes::iter)
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(|routes| routes.index.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
