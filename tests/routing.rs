//! Route matching and dispatch, end to end.

use std::sync::{Arc, Mutex};

use trellis::routing::{
    Controller, Controllers, DispatchError, Filters, GroupAttributes, Method, Response, RouteAction, RouteTable,
    Router,
};

fn uses(delegate: &str) -> RouteAction {
    RouteAction::uses(delegate).unwrap()
}

#[test]
fn literal_beats_every_fallback() {
    let mut table = RouteTable::new();
    table.get("users/(:num)", uses("users@show")).unwrap();
    table.get("users/(:any)", uses("users@slug")).unwrap();
    table.get("users/profile", uses("users@profile")).unwrap();
    table.get("users/5", uses("users@five")).unwrap();

    let profile = table.route(Method::Get, "users/profile").unwrap();
    assert_eq!(profile.action.uses.to_string(), "users@profile");
    assert!(profile.parameters.is_empty());

    // `(:num)` was registered first and matches too; the literal still wins
    let five = table.route(Method::Get, "/users/5").unwrap();
    assert_eq!(five.action.uses.to_string(), "users@five");
    assert!(five.parameters.is_empty());

    let six = table.route(Method::Get, "users/6").unwrap();
    assert_eq!(six.action.uses.to_string(), "users@show");
    assert_eq!(six.parameters, vec!["6"]);
}

#[test]
fn first_registered_fallback_wins() {
    let mut table = RouteTable::new();
    table.get("files/(:all)", uses("files@any")).unwrap();
    table.get("files/(:num)", uses("files@numeric")).unwrap();

    let route = table.route(Method::Get, "files/10").unwrap();
    assert_eq!(route.action.uses.to_string(), "files@any");

    let mut reversed = RouteTable::new();
    reversed.get("files/(:num)", uses("files@numeric")).unwrap();
    reversed.get("files/(:all)", uses("files@any")).unwrap();
    let route = reversed.route(Method::Get, "files/10").unwrap();
    assert_eq!(route.action.uses.to_string(), "files@numeric");
}

#[test]
fn leading_paren_routes_are_scanned_last() {
    let mut table = RouteTable::new();
    table.get("(:all)", uses("pages@catchall")).unwrap();
    table.get("users/(:num)", uses("users@show")).unwrap();

    let route = table.route(Method::Get, "users/5").unwrap();
    assert_eq!(route.action.uses.to_string(), "users@show");
    assert_eq!(route.parameters, vec!["5"]);

    let order: Vec<_> = table
        .routes_for_method(Method::Get)
        .map(|route| route.uri.clone())
        .collect();
    assert_eq!(order, ["users/(:num)", "(:all)"]);

    let route = table.route(Method::Get, "anything/else").unwrap();
    assert_eq!(route.action.uses.to_string(), "pages@catchall");
}

#[test]
fn optional_segments_compose() {
    let mut table = RouteTable::new();
    table.get("a/(:any?)/(:segment?)", uses("a@index")).unwrap();

    assert!(table.route(Method::Get, "a").unwrap().parameters.is_empty());
    assert_eq!(table.route(Method::Get, "a/x").unwrap().parameters, vec!["x"]);
    assert_eq!(table.route(Method::Get, "a/x/y").unwrap().parameters, vec!["x", "y"]);
    assert!(table.route(Method::Get, "a/x/y/z").is_none());
}

#[test]
fn not_found_and_resolution_failure_are_distinct() {
    let mut table = RouteTable::new();
    table.get("known", uses("missing@index")).unwrap();
    table.get("partial", uses("users@missing")).unwrap();
    table.get("filtered", uses("users@index").before("nope")).unwrap();

    let mut controllers = Controllers::new();
    controllers.register("users", Controller::new().action("index", |_| Response::ok("ok")));
    let router = Router::new(table).with_controllers(controllers).freeze();

    assert_eq!(router.dispatch(Method::Get, "unknown").unwrap().status, 404);
    assert_eq!(
        router.dispatch(Method::Get, "known"),
        Err(DispatchError::ControllerNotFound("application::missing".into()))
    );
    assert_eq!(
        router.dispatch(Method::Get, "partial"),
        Err(DispatchError::ActionNotFound {
            controller: "application::users".into(),
            action: "missing".into(),
        })
    );
    assert_eq!(
        router.dispatch(Method::Get, "filtered"),
        Err(DispatchError::FilterNotFound("nope".into()))
    );
}

#[test]
fn controller_auto_routing_dispatches_by_segment() {
    let mut table = RouteTable::new();
    table.controller("blog", "index", false).unwrap();

    let mut controllers = Controllers::new();
    controllers.register(
        "blog",
        Controller::restful()
            .action("get_index", |_| Response::ok("latest posts"))
            .action("get_show", |params| Response::ok(format!("post {}", params.join("/"))))
            .action("post_show", |params| Response::ok(format!("comment on {}", params[0]))),
    );
    let router = Router::new(table).with_controllers(controllers);

    assert_eq!(router.dispatch(Method::Get, "blog").unwrap().body, "latest posts");
    assert_eq!(router.dispatch(Method::Get, "blog/show/2024/hello").unwrap().body, "post 2024/hello");
    assert_eq!(router.dispatch(Method::Post, "blog/show/7").unwrap().body, "comment on 7");
    assert!(matches!(
        router.dispatch(Method::Delete, "blog/show/7"),
        Err(DispatchError::ActionNotFound { .. })
    ));
}

#[test]
fn grouped_routes_share_filters_and_names() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut filters = Filters::new();
    {
        let log = Arc::clone(&log);
        filters.register("auth", move |_, _| {
            log.lock().unwrap().push("auth");
            None
        });
    }
    filters.register("admin_only", |args, _| {
        if args.first().map(String::as_str) == Some("deny") {
            Some(Response::new(403, "forbidden"))
        } else {
            None
        }
    });

    let mut router = Router::default().with_filters(filters);
    router
        .routes_mut()
        .group(GroupAttributes::new().prefix("admin").named("admin.").before("auth"), |routes| {
            routes.get("stats", RouteAction::handler(|_| Response::ok("stats")).named("stats"))?;
            routes.get(
                "secret",
                RouteAction::handler(|_| Response::ok("secret")).before("admin_only:deny"),
            )
        })
        .unwrap();
    let router = router.freeze();

    assert_eq!(router.dispatch(Method::Get, "admin/stats").unwrap().body, "stats");
    assert_eq!(router.dispatch(Method::Get, "admin/secret").unwrap().status, 403);
    assert_eq!(*log.lock().unwrap(), vec!["auth", "auth"]);

    assert_eq!(
        router.url_to_route("admin.stats", &[] as &[&str]).unwrap(),
        "http://localhost/admin/stats"
    );
}

#[test]
fn multiple_uris_share_one_action() {
    let mut table = RouteTable::new();
    table.register("GET", ["about", "about-us"], uses("pages@about")).unwrap();
    assert!(table.route(Method::Get, "about").is_some());
    assert!(table.route(Method::Get, "about-us").is_some());
    assert!(table.route(Method::Head, "about").is_none());
}
