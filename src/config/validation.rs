//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route methods and delegates parse
//! - Detect duplicate route names, after group name prefixes are applied
//! - Check the application URL and the default database connection
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::{AppConfig, RouteConfig};
use crate::routing::action::Delegate;
use crate::routing::method::Method;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route `{uri}`: unknown method `{method}`")]
    UnknownMethod { uri: String, method: String },

    #[error("route `{uri}`: invalid delegate `{uses}`")]
    InvalidDelegate { uri: String, uses: String },

    #[error("duplicate route name `{0}`")]
    DuplicateRouteName(String),

    #[error("controller `{0}`: identifier must not be empty")]
    EmptyController(String),

    #[error("invalid application url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("default connection `{0}` is not configured")]
    UnknownConnection(String),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut names = HashSet::new();

    let grouped = config.groups.iter().flat_map(|group| {
        let prefix = group.name.as_deref().unwrap_or_default();
        group.routes.iter().map(move |route| (prefix, route))
    });
    for (name_prefix, route) in config.routes.iter().map(|route| ("", route)).chain(grouped) {
        validate_route(route, &mut errors);
        if let Some(name) = &route.name {
            let full = format!("{}{}", name_prefix, name);
            if !names.insert(full.clone()) {
                errors.push(ValidationError::DuplicateRouteName(full));
            }
        }
    }

    for controller in &config.controllers {
        let identifier = controller.identifier.trim();
        if identifier.is_empty() || identifier.ends_with("::") {
            errors.push(ValidationError::EmptyController(controller.identifier.clone()));
        }
    }

    if let Err(e) = url::Url::parse(&config.application.url) {
        errors.push(ValidationError::InvalidUrl {
            url: config.application.url.clone(),
            reason: e.to_string(),
        });
    }

    if !config.database.connections.contains_key(&config.database.default) {
        errors.push(ValidationError::UnknownConnection(config.database.default.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_route(route: &RouteConfig, errors: &mut Vec<ValidationError>) {
    if Method::parse_many(&route.method).is_err() {
        errors.push(ValidationError::UnknownMethod {
            uri: route.uri.clone(),
            method: route.method.clone(),
        });
    }
    if route.uses.parse::<Delegate>().is_err() {
        errors.push(ValidationError::InvalidDelegate {
            uri: route.uri.clone(),
            uses: route.uses.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteGroupConfig;

    fn route(method: &str, uri: &str, uses: &str, name: Option<&str>) -> RouteConfig {
        RouteConfig {
            method: method.to_string(),
            uri: uri.to_string(),
            uses: uses.to_string(),
            name: name.map(str::to_string),
            https: false,
            before: None,
            after: None,
            defaults: Vec::new(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.routes = vec![
            route("TRACE", "a", "home@index", Some("home")),
            route("GET", "b", "no-delegate", Some("home")),
        ];
        config.application.url = "not a url".to_string();
        config.database.default = "mysql".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::DuplicateRouteName("home".into())));
        assert!(errors.contains(&ValidationError::UnknownConnection("mysql".into())));
    }

    #[test]
    fn test_group_prefix_disambiguates_names() {
        let mut config = AppConfig::default();
        config.routes = vec![route("GET", "users", "users@index", Some("users"))];
        config.groups = vec![RouteGroupConfig {
            name: Some("admin.".into()),
            routes: vec![route("GET", "users", "admin::users@index", Some("users"))],
            ..Default::default()
        }];
        assert!(validate_config(&config).is_ok());
    }
}
