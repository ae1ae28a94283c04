//! Route matching logic.
//!
//! # Responsibilities
//! - Resolve (method, URI) to a bound [`Route`]
//! - Try the exact literal key first, then pattern routes of the literal
//!   list, then the fallback list, each in registration order
//!
//! # Design Decisions
//! - A literal hit returns immediately with no parameters; no regex runs
//! - First matching pattern wins, no backtracking across candidates
//! - A leading-`(` catch-all never shadows a prefixed pattern, whatever the
//!   registration order
//! - Unmatched optional groups are dropped, not bound as empty strings
//! - No match is `None`, never an error

use crate::observability::metrics;
use crate::routing::method::Method;
use crate::routing::route::Route;
use crate::routing::table::{normalize_uri, RouteTable};

impl RouteTable {
    /// Find the route for `method` and `uri`.
    pub fn route(&self, method: Method, uri: &str) -> Option<Route> {
        let uri = normalize_uri(uri);

        if let Some(definition) = self.literal(method, &uri) {
            tracing::debug!(method = %method, uri = %uri, "Literal route matched");
            metrics::record_route_matched("literal");
            return Some(Route::new(method, uri, definition.action.clone(), Vec::new()));
        }

        for definition in self.patterns(method) {
            let Some(pattern) = definition.pattern() else {
                continue;
            };
            let Some(captures) = pattern.captures(&uri) else {
                continue;
            };

            let parameters = captures
                .iter()
                .skip(1)
                .flatten()
                .map(|capture| capture.as_str().to_string())
                .collect();

            tracing::debug!(
                method = %method,
                uri = %uri,
                pattern = %definition.uri,
                "Pattern route matched"
            );
            metrics::record_route_matched(if definition.is_fallback() { "fallback" } else { "pattern" });
            return Some(Route::new(method, definition.uri.clone(), definition.action.clone(), parameters));
        }

        tracing::debug!(method = %method, uri = %uri, "No route matched");
        metrics::record_route_miss();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::action::RouteAction;

    fn action(delegate: &str) -> RouteAction {
        RouteAction::uses(delegate).unwrap()
    }

    #[test]
    fn test_literal_route_has_no_parameters() {
        let mut table = RouteTable::new();
        table.get("users/(:num)", action("users@show")).unwrap();
        table.get("users/profile", action("users@profile")).unwrap();

        let route = table.route(Method::Get, "/users/profile").unwrap();
        assert_eq!(route.uri, "users/profile");
        assert!(route.parameters.is_empty());
    }

    #[test]
    fn test_fallback_captures() {
        let mut table = RouteTable::new();
        table.get("posts/(:num)/(:any)", action("posts@show")).unwrap();

        let route = table.route(Method::Get, "posts/12/hello-world").unwrap();
        assert_eq!(route.uri, "posts/(:num)/(:any)");
        assert_eq!(route.parameters, vec!["12", "hello-world"]);
    }

    #[test]
    fn test_catch_all_does_not_shadow_prefixed_pattern() {
        let mut table = RouteTable::new();
        table.get("(:all)", action("pages@catchall")).unwrap();
        table.get("users/(:num)", action("users@show")).unwrap();

        let route = table.route(Method::Get, "users/5").unwrap();
        assert_eq!(route.action.uses.to_string(), "users@show");
        assert_eq!(route.parameters, vec!["5"]);

        let route = table.route(Method::Get, "about/team").unwrap();
        assert_eq!(route.action.uses.to_string(), "pages@catchall");
        assert_eq!(route.parameters, vec!["about/team"]);
    }

    #[test]
    fn test_pattern_uri_is_not_an_exact_key() {
        let mut table = RouteTable::new();
        table.get("users/(:num)", action("users@show")).unwrap();
        assert!(table.route(Method::Get, "users/(:num)").is_none());
    }

    #[test]
    fn test_method_is_respected() {
        let mut table = RouteTable::new();
        table.post("users", action("users@create")).unwrap();
        assert!(table.route(Method::Get, "users").is_none());
        assert!(table.route(Method::Post, "users").is_some());
    }

    #[test]
    fn test_unmatched_optional_segments_are_omitted() {
        let mut table = RouteTable::new();
        table
            .get("docs/(:any?)/(:any?)", action("docs@page").defaults(["index"]))
            .unwrap();

        assert_eq!(table.route(Method::Get, "docs").unwrap().parameters, vec!["index"]);
        assert_eq!(table.route(Method::Get, "docs/intro").unwrap().parameters, vec!["intro"]);
        assert_eq!(
            table.route(Method::Get, "docs/intro/setup").unwrap().parameters,
            vec!["intro", "setup"]
        );
        assert!(table.route(Method::Get, "docs/a/b/c").is_none());
    }

    #[test]
    fn test_root_uri() {
        let mut table = RouteTable::new();
        table.get("/", action("home@index")).unwrap();
        assert!(table.route(Method::Get, "").is_some());
        assert!(table.route(Method::Get, "//").is_some());
    }

    #[test]
    fn test_numeric_route_matches_its_literal_value() {
        let mut table = RouteTable::new();
        table.get("404", action("errors@missing")).unwrap();
        let route = table.route(Method::Get, "404").unwrap();
        assert_eq!(route.parameters, vec!["404"]);
    }
}
