//! URL generation for named routes and controller actions.

use url::Url;

use crate::routing::action::{DelegateMethod, Delegate, DEFAULT_BUNDLE};
use crate::routing::error::{RoutingError, RoutingResult};
use crate::routing::table::RouteTable;

/// Builds absolute URLs under the application's base URL.
#[derive(Debug, Clone)]
pub struct UrlGenerator {
    /// Always parses and ends with `/`.
    base: String,
}

impl Default for UrlGenerator {
    fn default() -> Self {
        Self {
            base: "http://localhost/".to_string(),
        }
    }
}

impl UrlGenerator {
    pub fn new(base: &str) -> RoutingResult<Self> {
        let mut url = Url::parse(base).map_err(|source| RoutingError::InvalidBaseUrl {
            url: base.to_string(),
            source,
        })?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self { base: url.to_string() })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Absolute URL for an application path.
    pub fn to(&self, path: &str, https: bool) -> RoutingResult<String> {
        let invalid = |source| RoutingError::InvalidBaseUrl {
            url: format!("{}{}", self.base, path),
            source,
        };
        let mut url = Url::parse(&self.base)
            .and_then(|base| base.join(path.trim_start_matches('/')))
            .map_err(invalid)?;
        // `url` refuses to move a non-special scheme (`app://`) to https
        if https && url.set_scheme("https").is_err() {
            tracing::warn!(url = %url, "Cannot generate https URL");
            return Err(RoutingError::HttpsUnsupported(url.to_string()));
        }
        Ok(url.to_string())
    }

    /// URL of the route named `name`, wildcards filled from `params`.
    pub fn to_route<S: AsRef<str>>(&self, table: &RouteTable, name: &str, params: &[S]) -> RoutingResult<String> {
        let route = table
            .find(name)
            .ok_or_else(|| RoutingError::UnknownRoute(name.to_string()))?;
        self.to(&transpose(&route.uri, params), route.action.https)
    }

    /// URL of the route that uses `delegate`. Without one, the
    /// conventional `controller/method/params` path is used.
    pub fn to_action<S: AsRef<str>>(&self, table: &RouteTable, delegate: &str, params: &[S]) -> RoutingResult<String> {
        if let Some(route) = table.uses(delegate) {
            return self.to(&transpose(&route.uri, params), route.action.https);
        }

        let parsed: Delegate = delegate.parse()?;
        let mut segments = Vec::new();
        if parsed.bundle != DEFAULT_BUNDLE {
            segments.push(parsed.bundle.clone());
        }
        segments.push(parsed.controller.replace('.', "/"));
        if let DelegateMethod::Named(method) = &parsed.method {
            segments.push(method.clone());
        }
        segments.extend(params.iter().map(|param| param.as_ref().to_string()));
        self.to(&segments.join("/"), false)
    }
}

/// Substitute `params` into the wildcard tokens of `uri`, left to right;
/// tokens left without a parameter are removed.
pub fn transpose<S: AsRef<str>>(uri: &str, params: &[S]) -> String {
    let mut out = String::with_capacity(uri.len());
    let mut params = params.iter();
    let mut rest = uri;

    while let Some(open) = rest.find('(') {
        let Some(close) = rest[open..].find(')') else {
            break;
        };
        out.push_str(&rest[..open]);
        if let Some(param) = params.next() {
            out.push_str(param.as_ref());
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);

    out.trim_matches('/').to_string()
}
