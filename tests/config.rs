//! Loading configuration from disk and building a router from it.

mod common;

use std::io::Write;

use common::RecordingDriver;
use tempfile::NamedTempFile;
use trellis::config::{load_config, ConfigError, ValidationError};
use trellis::grammar::GrammarRegistry;
use trellis::query::{Connection, Query};
use trellis::routing::{Controller, Controllers, Method, Response, Router};

const CONFIG: &str = r#"
[application]
url = "https://example.com/shop"

[[routes]]
uri = "/"
uses = "home@index"
as = "home"

[[routes]]
method = "*"
uri = "products/(:num)"
uses = "products@show"
as = "product"

[[groups]]
prefix = "admin"
as = "admin."
https = true

[[groups.routes]]
method = "POST"
uri = "products"
uses = "admin::products@store"
as = "products.store"

[[controllers]]
identifier = "account"

[database]
default = "main"

[database.connections.main]
driver = "pgsql"
profile = true
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn router_from_config_file() {
    let file = write_config(CONFIG);
    let config = load_config(file.path()).unwrap();

    let mut controllers = Controllers::new();
    controllers
        .register("home", Controller::new().action("index", |_| Response::ok("home")))
        .register("products", Controller::new().action("show", |p| Response::ok(format!("product {}", p[0]))))
        .register("account", Controller::new().action("index", |_| Response::ok("account")));
    let router = Router::from_config(&config).unwrap().with_controllers(controllers).freeze();

    assert_eq!(router.dispatch(Method::Get, "/").unwrap().body, "home");
    assert_eq!(router.dispatch(Method::Put, "products/3").unwrap().body, "product 3");
    assert_eq!(router.dispatch(Method::Get, "account").unwrap().body, "account");

    let store = router.routes().find("admin.products.store").unwrap();
    assert_eq!(store.uri, "admin/products");
    assert_eq!(store.method, Method::Post);
    assert!(store.action.https);

    assert_eq!(
        router.url_to_route("product", &["3"]).unwrap(),
        "https://example.com/shop/products/3"
    );
    assert_eq!(
        router.url_to_route("admin.products.store", &[] as &[&str]).unwrap(),
        "https://example.com/shop/admin/products"
    );
}

#[test]
fn connection_from_config() {
    let file = write_config(CONFIG);
    let config = load_config(file.path()).unwrap();
    let registry = GrammarRegistry::default();

    let name = config.database.default.clone();
    let driver = RecordingDriver::new();
    let conn = Connection::from_config(
        name.clone(),
        &config.database.connections[&name],
        &registry,
        Box::new(driver.clone()),
    );
    assert_eq!(conn.grammar().name(), "pgsql");

    Query::table("users").where_("id", "=", 1).get(&conn).unwrap();
    assert_eq!(conn.queries().len(), 1);
    assert_eq!(driver.last().sql, r#"SELECT * FROM "users" WHERE "id" = ?"#);
}

#[test]
fn invalid_config_reports_every_problem() {
    let file = write_config(
        r#"
        [[routes]]
        method = "FETCH"
        uri = "a"
        uses = "a@b"

        [[routes]]
        uri = "b"
        uses = "broken"
        "#,
    );

    match load_config(file.path()) {
        Err(ConfigError::Validation(errors)) => {
            assert_eq!(errors.len(), 2);
            assert!(matches!(errors[0], ValidationError::UnknownMethod { .. }));
            assert!(matches!(errors[1], ValidationError::InvalidDelegate { .. }));
        }
        other => panic!("expected validation errors, got {other:?}"),
    }
}
