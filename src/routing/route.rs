//! A matched route.
//!
//! # Data Flow
//! ```text
//! before filters ──Some(resp)──────────────┐
//!       │ None                             ▼
//!       └──> delegate / handler ──> response ──> after filters ──> caller
//! ```
//!
//! Before filters run in a fixed order: global `before`, the bundle's
//! `<bundle>::before`, route-attached filters, then filters bound to URI
//! patterns matching this route. After filters run even when a before
//! filter short-circuited.

use serde::Serialize;

use crate::routing::action::{Action, DelegateMethod, Response, RouteAction, DEFAULT_BUNDLE};
use crate::routing::controller::ControllerResolver;
use crate::routing::error::DispatchError;
use crate::routing::filters::{glob_matches, FilterCall, FilterRegistry};
use crate::routing::method::Method;

#[derive(Debug, Clone, Serialize)]
pub struct Route {
    pub method: Method,
    pub uri: String,
    pub action: RouteAction,
    pub parameters: Vec<String>,
    /// Set during dispatch to the controller that handled the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_action: Option<String>,
}

impl Route {
    /// Bind `parameters` to a route; registered defaults fill in positions
    /// the request did not capture.
    pub fn new(method: Method, uri: impl Into<String>, action: RouteAction, mut parameters: Vec<String>) -> Self {
        if action.defaults.len() > parameters.len() {
            parameters.extend(action.defaults[parameters.len()..].iter().cloned());
        }
        Self {
            method,
            uri: uri.into(),
            action,
            parameters,
            controller: None,
            controller_action: None,
        }
    }

    /// True when the route was registered under `name`.
    pub fn is(&self, name: &str) -> bool {
        self.action.name.as_deref() == Some(name)
    }

    /// True when the route URI matches the glob `pattern`.
    pub fn handles(&self, pattern: &str) -> bool {
        glob_matches(pattern, &self.uri)
    }

    pub fn bundle(&self) -> &str {
        self.action
            .delegate()
            .map(|delegate| delegate.bundle.as_str())
            .unwrap_or(DEFAULT_BUNDLE)
    }

    /// Run the filter pipeline and the route's action.
    pub fn call(
        &mut self,
        filters: &dyn FilterRegistry,
        controllers: &dyn ControllerResolver,
    ) -> Result<Response, DispatchError> {
        let mut response = match self.run_before(filters)? {
            Some(response) => {
                tracing::debug!(uri = %self.uri, "Before filter short-circuited route");
                response
            }
            None => self.response(controllers)?,
        };

        for filter in self.after_filters(filters) {
            let call = FilterCall::parse(&filter);
            filters.call(&call.name, &call.args, Some(&mut response))?;
        }
        Ok(response)
    }

    fn run_before(&self, filters: &dyn FilterRegistry) -> Result<Option<Response>, DispatchError> {
        for filter in self.before_filters(filters) {
            let call = FilterCall::parse(&filter);
            if let Some(response) = filters.call(&call.name, &call.args, None)? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    fn before_filters(&self, filters: &dyn FilterRegistry) -> Vec<String> {
        let mut names = self.ambient_filters(filters, "before");
        names.extend(self.action.before.iter().cloned());
        names.extend(filters.pattern_filters(&self.uri));
        names
    }

    fn after_filters(&self, filters: &dyn FilterRegistry) -> Vec<String> {
        let mut names = self.ambient_filters(filters, "after");
        names.extend(self.action.after.iter().cloned());
        names
    }

    /// The global filter and the bundle filter for `phase`, when registered.
    fn ambient_filters(&self, filters: &dyn FilterRegistry, phase: &str) -> Vec<String> {
        let mut names = Vec::new();
        if filters.has(phase) {
            names.push(phase.to_string());
        }
        let bundle = self.bundle();
        if bundle != DEFAULT_BUNDLE {
            let scoped = format!("{}::{}", bundle, phase);
            if filters.has(&scoped) {
                names.push(scoped);
            }
        }
        names
    }

    fn response(&mut self, controllers: &dyn ControllerResolver) -> Result<Response, DispatchError> {
        let delegate = match &self.action.uses {
            Action::Handler(handler) => return Ok(handler(&self.parameters)),
            Action::Delegate(delegate) => delegate.clone(),
        };

        let mut parameters = self.parameters.clone();
        let method = match &delegate.method {
            DelegateMethod::Named(method) => method.clone(),
            DelegateMethod::Captured(index) => {
                if *index > parameters.len() {
                    return Err(DispatchError::MissingCapture {
                        delegate: delegate.to_string(),
                        index: *index,
                        captured: parameters.len(),
                    });
                }
                parameters.remove(index - 1)
            }
        };

        self.controller = Some(delegate.identifier());
        self.controller_action = Some(method.clone());
        controllers.call(&delegate, &method, self.method, &parameters)
    }
}
