//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Own the route table and the filter and controller registries
//! - Turn a (method, URI) pair into a response
//! - Generate URLs for named routes and actions
//!
//! # Design Decisions
//! - Built through `&mut self` during startup, then frozen into an
//!   `Arc<Router>`; no locks on the request path
//! - No match is a 404 response; a matched route whose controller, action
//!   or filter is missing is a [`DispatchError`]

use std::sync::Arc;
use std::time::Instant;

use crate::config::schema::AppConfig;
use crate::observability::metrics;
use crate::routing::action::Response;
use crate::routing::controller::{ControllerResolver, Controllers};
use crate::routing::error::{DispatchError, RoutingResult};
use crate::routing::filters::{FilterRegistry, Filters};
use crate::routing::method::Method;
use crate::routing::route::Route;
use crate::routing::table::RouteTable;
use crate::routing::url::UrlGenerator;

pub struct Router {
    routes: RouteTable,
    filters: Box<dyn FilterRegistry>,
    controllers: Box<dyn ControllerResolver>,
    urls: UrlGenerator,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.len())
            .field("base_url", &self.urls.base())
            .finish()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RouteTable::new())
    }
}

impl Router {
    pub fn new(routes: RouteTable) -> Self {
        Self {
            routes,
            filters: Box::new(Filters::new()),
            controllers: Box::new(Controllers::new()),
            urls: UrlGenerator::default(),
        }
    }

    /// Router with the configured routes and base URL; filters and
    /// controllers are attached by the caller.
    pub fn from_config(config: &AppConfig) -> RoutingResult<Self> {
        let routes = RouteTable::from_config(config)?;
        Ok(Self::new(routes).with_urls(UrlGenerator::new(&config.application.url)?))
    }

    pub fn with_filters(mut self, filters: impl FilterRegistry + 'static) -> Self {
        self.filters = Box::new(filters);
        self
    }

    pub fn with_controllers(mut self, controllers: impl ControllerResolver + 'static) -> Self {
        self.controllers = Box::new(controllers);
        self
    }

    pub fn with_urls(mut self, urls: UrlGenerator) -> Self {
        self.urls = urls;
        self
    }

    pub fn with_base_url(self, base: &str) -> RoutingResult<Self> {
        Ok(self.with_urls(UrlGenerator::new(base)?))
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Mutable access for registration; unavailable once frozen.
    pub fn routes_mut(&mut self) -> &mut RouteTable {
        &mut self.routes
    }

    pub fn urls(&self) -> &UrlGenerator {
        &self.urls
    }

    /// Match without dispatching.
    pub fn route(&self, method: Method, uri: &str) -> Option<Route> {
        self.routes.route(method, uri)
    }

    /// Match and call the route. An unmatched request is a 404 response.
    pub fn dispatch(&self, method: Method, uri: &str) -> Result<Response, DispatchError> {
        let Some(mut route) = self.route(method, uri) else {
            metrics::record_dispatch(method, "not_found");
            return Ok(Response::not_found());
        };

        let start = Instant::now();
        let result = route.call(self.filters.as_ref(), self.controllers.as_ref());
        let outcome = match &result {
            Ok(_) => "ok",
            Err(_) => "error",
        };
        metrics::record_dispatch(method, outcome);

        match &result {
            Ok(response) => tracing::debug!(
                method = %method,
                uri = %route.uri,
                action = %route.action.uses,
                status = response.status,
                elapsed_us = start.elapsed().as_micros() as u64,
                "Request dispatched"
            ),
            Err(error) => tracing::warn!(
                method = %method,
                uri = %route.uri,
                error = %error,
                "Dispatch failed"
            ),
        }
        result
    }

    /// URL of the route named `name`.
    pub fn url_to_route<S: AsRef<str>>(&self, name: &str, params: &[S]) -> RoutingResult<String> {
        self.urls.to_route(&self.routes, name, params)
    }

    /// URL of the route using `delegate`.
    pub fn url_to_action<S: AsRef<str>>(&self, delegate: &str, params: &[S]) -> RoutingResult<String> {
        self.urls.to_action(&self.routes, delegate, params)
    }

    /// End registration and share the router read-only.
    pub fn freeze(self) -> Arc<Router> {
        tracing::info!(routes = self.routes.len(), "Router frozen");
        Arc::new(self)
    }
}
