//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for an
//! application: routes, route groups, controller auto-routes, database
//! connections and observability. All types derive Serde traits for
//! deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::routing::table::GroupAttributes;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Application settings (base URL).
    pub application: ApplicationConfig,

    /// Routes registered at the top level.
    pub routes: Vec<RouteConfig>,

    /// Route groups sharing a prefix, name prefix or filters.
    pub groups: Vec<RouteGroupConfig>,

    /// Controllers to auto-route.
    pub controllers: Vec<ControllerRouteConfig>,

    /// Database connections.
    pub database: DatabaseConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Application settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Base URL used for URL generation.
    pub url: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost/".to_string(),
        }
    }
}

/// One route. Only delegate actions can be configured; closures are
/// registered in code.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// HTTP method, or `*` for every method.
    #[serde(default = "default_method")]
    pub method: String,

    /// URI pattern (`users/(:num)`).
    pub uri: String,

    /// Delegate, `[bundle::]controller@method`.
    pub uses: String,

    /// Route name.
    #[serde(rename = "as", default)]
    pub name: Option<String>,

    #[serde(default)]
    pub https: bool,

    /// Before filters, `name|name:arg1,arg2`.
    #[serde(default)]
    pub before: Option<String>,

    /// After filters.
    #[serde(default)]
    pub after: Option<String>,

    /// Positional parameter defaults.
    #[serde(default)]
    pub defaults: Vec<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// A group of routes sharing attributes.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouteGroupConfig {
    /// URI prefix joined onto every route.
    pub prefix: Option<String>,

    /// Name prefix, concatenated without separator.
    #[serde(rename = "as")]
    pub name: Option<String>,

    pub https: Option<bool>,

    pub before: Option<String>,

    pub after: Option<String>,

    /// Custom attributes copied onto every route.
    pub attributes: BTreeMap<String, String>,

    pub routes: Vec<RouteConfig>,
}

impl RouteGroupConfig {
    pub fn attributes(&self) -> GroupAttributes {
        let mut attributes = GroupAttributes::new();
        attributes.prefix = self.prefix.clone();
        attributes.name = self.name.clone();
        attributes.https = self.https;
        attributes.attributes = self.attributes.clone();
        if let Some(before) = &self.before {
            attributes = attributes.before(before);
        }
        if let Some(after) = &self.after {
            attributes = attributes.after(after);
        }
        attributes
    }
}

/// A controller registered for auto-routing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControllerRouteConfig {
    /// `[bundle::]controller`, dots for nested controllers.
    pub identifier: String,

    /// Action used when the URI names none.
    #[serde(default = "default_controller_method")]
    pub default_method: String,

    #[serde(default)]
    pub https: bool,
}

fn default_controller_method() -> String {
    "index".to_string()
}

/// Database settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Name of the default connection.
    pub default: String,

    pub connections: BTreeMap<String, ConnectionConfig>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let mut connections = BTreeMap::new();
        connections.insert("sqlite".to_string(), ConnectionConfig::default());
        Self {
            default: "sqlite".to_string(),
            connections,
        }
    }
}

/// One database connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Driver name; selects the SQL grammar (`mysql`, `pgsql`, `sqlite`,
    /// `sqlsrv`, anything else gets the generic grammar).
    pub driver: String,

    /// Keep a log of executed queries.
    pub profile: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            driver: "sqlite".to_string(),
            profile: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Install the Prometheus recorder.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            metrics_enabled: false,
        }
    }
}
