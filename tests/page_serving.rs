//! End-to-end page serving tests: real engine server on loopback, real
//! route configs and templates on disk.

mod common;

use common::{start_upstream, TestInstance, TestServer};

#[tokio::test]
async fn test_template_route_renders_loaded_data() {
    let instance = TestInstance::new();
    instance.write_file(
        "data/about.json",
        r#"{"title": "About Us", "body": "We assemble pages."}"#,
    );
    instance.write_route(
        "about.json",
        r#"{
            "route": "/about",
            "template": "about.html",
            "data": [
                {"name": "info", "processor": "file.load_json", "path": "data/about.json"}
            ]
        }"#,
    );
    instance.write_template("about.html", "<h1>{{ info.title }}</h1><p>{{ info.body }}</p>");

    let server = TestServer::start(instance, false).await;
    let response = reqwest::get(server.url("/about")).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "text/html; charset=utf-8"
    );
    let body = response.text().await.unwrap();
    assert!(body.contains("<h1>About Us</h1>"));
    assert!(body.contains("We assemble pages."));
}

#[tokio::test]
async fn test_stream_route_passes_upstream_through() {
    let upstream =
        start_upstream(|| async { (200, "application/json", r#"{"ok": true}"#.to_string()) })
            .await;

    let instance = TestInstance::new();
    instance.write_route(
        "item.json",
        &format!(
            r#"{{
                "route": "/item",
                "stream": "item",
                "data": [
                    {{"name": "item", "processor": "request.fetch", "url": "http://{upstream}/item"}}
                ]
            }}"#
        ),
    );

    let server = TestServer::start(instance, false).await;
    let response = reqwest::get(server.url("/item")).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert_eq!(response.text().await.unwrap(), r#"{"ok": true}"#);
}

#[tokio::test]
async fn test_stream_upstream_failure_propagates_status() {
    let upstream =
        start_upstream(|| async { (503, "text/plain", "backend down".to_string()) }).await;

    let instance = TestInstance::new();
    instance.write_route(
        "item.json",
        &format!(
            r#"{{
                "route": "/item",
                "stream": "item",
                "data": [
                    {{"name": "item", "processor": "request.fetch", "url": "http://{upstream}/item"}}
                ]
            }}"#
        ),
    );

    let server = TestServer::start(instance, true).await;
    let response = reqwest::get(server.url("/item")).await.unwrap();

    assert_eq!(response.status().as_u16(), 503);
    let diagnostics: serde_json::Value = response.json().await.unwrap();
    assert_eq!(diagnostics["code"], 503);
}

#[tokio::test]
async fn test_unknown_processor_is_skipped() {
    let instance = TestInstance::new();
    instance.write_route(
        "page.json",
        r#"{
            "route": "/page",
            "template": "page.html",
            "data": [
                {"name": "ghost", "processor": "nosuch.thing"},
                {"name": "info", "processor": "file.create_json_response"}
            ]
        }"#,
    );
    instance.write_template("page.html", "status={{ info.status }} ghost={{ ghost }}");

    let server = TestServer::start(instance, false).await;
    let response = reqwest::get(server.url("/page")).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("status=200"));
    assert!(body.contains("ghost="));
}

#[tokio::test]
async fn test_path_value_breaking_expansion_is_bad_request() {
    let instance = TestInstance::new();
    instance.write_route(
        "browse.json",
        r#"{
            "route": "/browse/<string:q>",
            "template": "results.html",
            "data": [
                {"name": "results", "processor": "file.load_json", "path": "{{ view_args.q }}"}
            ]
        }"#,
    );
    instance.write_template("results.html", "{{ results }}");

    let server = TestServer::start(instance, true).await;
    // %5C is a backslash; it survives decoding into the parameter value and
    // breaks the expanded step params.
    let response = reqwest::get(server.url("/browse/a%5Cx")).await.unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let diagnostics: serde_json::Value = response.json().await.unwrap();
    assert_eq!(diagnostics["code"], 400);
    assert_eq!(diagnostics["name"], "Bad Request");
}

#[tokio::test]
async fn test_method_not_allowed_and_not_found() {
    let instance = TestInstance::new();
    instance.write_route(
        "about.json",
        r#"{"route": "/about", "template": "about.html"}"#,
    );
    instance.write_template("about.html", "ok");

    let server = TestServer::start(instance, false).await;
    let client = reqwest::Client::new();

    let response = client.post(server.url("/about")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 405);

    let response = client
        .get(server.url("/nothing"))
        .header("accept", "application/json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let diagnostics: serde_json::Value = response.json().await.unwrap();
    assert_eq!(diagnostics["name"], "Not Found");
}

#[tokio::test]
async fn test_missing_template_is_not_implemented() {
    let instance = TestInstance::new();
    instance.write_route(
        "page.json",
        r#"{"route": "/page", "template": "never-written.html"}"#,
    );

    let server = TestServer::start(instance, true).await;
    let response = reqwest::get(server.url("/page")).await.unwrap();
    assert_eq!(response.status().as_u16(), 501);
}

#[tokio::test]
async fn test_specificity_prefers_literal_rule() {
    let instance = TestInstance::new();
    instance.write_route(
        "routes.json",
        r#"[
            {"route": "/browse/<string:name>", "template": "generic.html"},
            {"route": "/browse/featured", "template": "featured.html"}
        ]"#,
    );
    instance.write_template("generic.html", "generic");
    instance.write_template("featured.html", "featured");

    let server = TestServer::start(instance, false).await;

    let body = reqwest::get(server.url("/browse/featured"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "featured");

    let body = reqwest::get(server.url("/browse/anything-else"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "generic");
}

#[tokio::test]
async fn test_error_template_rendered_in_production_mode() {
    let instance = TestInstance::new();
    instance.write_template("error.html", "<h1>{{ code }} {{ name }}</h1>");

    let server = TestServer::start(instance, false).await;
    let response = reqwest::get(server.url("/missing")).await.unwrap();

    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(
        response.text().await.unwrap(),
        "<h1>404 Not Found</h1>"
    );
}

#[tokio::test]
async fn test_welcome_fallback_without_route_configs() {
    let instance = TestInstance::new();
    std::fs::remove_dir_all(instance.path().join("config/routes")).unwrap();
    instance.write_template("home.html", "<h1>Welcome</h1>");

    let server = TestServer::start(instance, false).await;
    let response = reqwest::get(server.url("/")).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await.unwrap().contains("Welcome"));
}

#[tokio::test]
async fn test_guarded_step_and_on_fail_abort() {
    let instance = TestInstance::new();
    instance.write_file("data/item.json", r#"{"public": "False"}"#);
    instance.write_route(
        "view.json",
        r#"{
            "route": "/view",
            "template": "view.html",
            "data": [
                {"name": "item", "processor": "file.load_json", "path": "data/item.json"},
                {
                    "name": "details",
                    "processor": "file.load_json",
                    "path": "data/absent.json",
                    "when": "{{ item.public }}",
                    "on_fail": 404
                }
            ]
        }"#,
    );
    instance.write_template("view.html", "shown");

    // Guard renders False, so the on_fail never fires and the page renders.
    let server = TestServer::start(instance, false).await;
    let response = reqwest::get(server.url("/view")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "shown");
}

#[tokio::test]
async fn test_on_fail_aborts_when_data_missing() {
    let instance = TestInstance::new();
    instance.write_route(
        "view.json",
        r#"{
            "route": "/view",
            "template": "view.html",
            "data": [
                {
                    "name": "details",
                    "processor": "file.load_json",
                    "path": "data/absent.json",
                    "on_fail": 404
                }
            ]
        }"#,
    );
    instance.write_template("view.html", "never shown");

    let server = TestServer::start(instance, true).await;
    let response = reqwest::get(server.url("/view")).await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
