mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use std::collections::BTreeMap;

use hostplane::models::{HeaderRule, Redirect, SnippetLocation, SnippetRule};

use common::{build_conf_with_redirects, manifest_with_files, Factory, TestApp};

async fn lookup(app: &TestApp, host: &str, path: &str) -> Value {
    let response = app
        .server
        .get("/hosting/lookup")
        .add_query_param("host", host)
        .add_query_param("path", path)
        .await;

    response.assert_status(StatusCode::OK);
    response.json()
}

#[tokio::test]
async fn test_lookup_custom_domain() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.store);
    let owner = factory.create_app("my-app", Some("enterprise")).await;
    let env = factory
        .create_environment(
            &owner,
            "production",
            build_conf_with_redirects(vec![Redirect::new("/my-path", "/my-new-path")]),
        )
        .await;
    let deployment = factory
        .create_deployment(&env, Some(manifest_with_files(&["/favicon.ico"])))
        .await;
    factory.publish(&env, &[(&deployment, 100.0)]).await;
    factory.create_domain_with_cert(&env, "www.example.org").await;

    let body = lookup(&app, "WWW.Example.org:443", "/my-path").await;

    assert_eq!(body["found"], true);
    let config = &body["config"];
    assert_eq!(config["deploymentId"], deployment.id);
    assert_eq!(config["domainName"], "www.example.org");
    assert_eq!(config["hasCustomCert"], true);
    assert_eq!(config["isEnterprise"], true);
    assert_eq!(config["percentage"], 100.0);
    assert_eq!(
        config["redirect"],
        json!({"type": "rewrite", "path": "/my-new-path"})
    );
    assert_eq!(config["envVars"]["HP_ENV"], "production");

    let body = lookup(&app, "www.example.org", "/favicon.ico").await;
    assert_eq!(body["config"]["headers"]["content-type"], "image/x-icon");
    assert!(body["config"].get("redirect").map_or(true, Value::is_null));
}

#[tokio::test]
async fn test_lookup_unknown_hosts() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.store);
    let owner = factory.create_app("my-app", None).await;
    let env = factory
        .create_environment(&owner, "production", Default::default())
        .await;
    let deployment = factory.create_deployment(&env, None).await;
    factory.publish(&env, &[(&deployment, 100.0)]).await;
    factory.create_domain(&env, "pending.example.org", false).await;

    for host in [
        "unknown.example.org",
        "pending.example.org",
        "other-app.hostplane.dev",
        "my-app--staging.hostplane.dev",
        "my-app--4294967296.hostplane.dev",
    ] {
        let body = lookup(&app, host, "/").await;
        assert_eq!(body["found"], false, "{} should not resolve", host);
        assert!(body.get("config").is_none());
    }
}

#[tokio::test]
async fn test_lookup_dev_hosts() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.store);
    let owner = factory.create_app("my-app", None).await;
    let production = factory
        .create_environment(&owner, "production", Default::default())
        .await;
    let staging = factory
        .create_environment(&owner, "staging", Default::default())
        .await;
    let live = factory.create_deployment(&production, None).await;
    let preview = factory.create_deployment(&production, None).await;
    let next = factory.create_deployment(&staging, None).await;
    factory.publish(&production, &[(&live, 100.0)]).await;
    factory.publish(&staging, &[(&next, 100.0)]).await;

    let body = lookup(&app, "my-app.hostplane.dev", "/").await;
    assert_eq!(body["config"]["deploymentId"], live.id);
    assert_eq!(body["config"]["envName"], "production");
    assert_eq!(body["config"]["isEnterprise"], false);

    let body = lookup(&app, "my-app--staging.hostplane.dev", "/").await;
    assert_eq!(body["config"]["deploymentId"], next.id);

    // Unpublished deployments are still previewable
    let host = format!("my-app--{}.hostplane.dev", preview.id);
    let body = lookup(&app, &host, "/").await;
    assert_eq!(body["found"], true);
    assert_eq!(body["config"]["deploymentId"], preview.id);
    assert_eq!(body["config"]["percentage"], 0.0);
}

#[tokio::test]
async fn test_lookup_redirect_for_listed_host_only() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.store);
    let owner = factory.create_app("my-app", None).await;
    let env = factory
        .create_environment(
            &owner,
            "production",
            build_conf_with_redirects(vec![Redirect::new("/path", "/path/")
                .with_status(302)
                .with_hosts(&["www.example.org"])]),
        )
        .await;
    let deployment = factory.create_deployment(&env, None).await;
    factory.publish(&env, &[(&deployment, 100.0)]).await;
    factory.create_domain(&env, "www.example.org", true).await;
    factory.create_domain(&env, "example.org", true).await;

    let body = lookup(&app, "www.example.org", "/path").await;
    assert_eq!(
        body["config"]["redirect"],
        json!({"type": "redirect", "location": "https://www.example.org/path/", "status": 302})
    );

    let body = lookup(&app, "example.org", "/path").await;
    assert_eq!(body["found"], true);
    assert!(body["config"].get("redirect").map_or(true, Value::is_null));
}

#[tokio::test]
async fn test_lookup_injects_snippets() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.store);
    let owner = factory.create_app("my-app", None).await;
    let env = factory
        .create_environment(&owner, "production", Default::default())
        .await;
    let deployment = factory.create_deployment(&env, None).await;
    factory.publish(&env, &[(&deployment, 100.0)]).await;
    factory.create_domain(&env, "www.example.org", true).await;

    factory
        .create_snippet(&env, "S1", SnippetLocation::Body, true, None)
        .await;
    factory
        .create_snippet(
            &env,
            "S2",
            SnippetLocation::Head,
            true,
            Some(SnippetRule {
                hosts: vec![],
                path: Some("^/(my|your)/.*/end".to_string()),
            }),
        )
        .await;
    factory
        .create_snippet(
            &env,
            "DEV",
            SnippetLocation::Head,
            false,
            Some(SnippetRule {
                hosts: vec!["*.dev".to_string()],
                path: None,
            }),
        )
        .await;

    let body = lookup(&app, "www.example.org", "/your/awesome/end").await;
    let snippets = &body["config"]["snippets"];
    assert_eq!(snippets["bodyPrepend"], "S1");
    assert_eq!(snippets["headPrepend"], "S2");
    assert_eq!(snippets["headAppend"], "");

    let body = lookup(&app, "www.example.org", "/elsewhere").await;
    assert_eq!(body["config"]["snippets"]["bodyPrepend"], "S1");
    assert_eq!(body["config"]["snippets"]["headPrepend"], "");

    let body = lookup(&app, "my-app.hostplane.dev", "/elsewhere").await;
    assert_eq!(body["config"]["snippets"]["headAppend"], "DEV");
}

#[tokio::test]
async fn test_lookup_matches_decoded_path() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.store);
    let owner = factory.create_app("my-app", None).await;
    let env = factory
        .create_environment(
            &owner,
            "production",
            build_conf_with_redirects(vec![Redirect::new("/über uns", "/about")]),
        )
        .await;
    let deployment = factory
        .create_deployment(&env, Some(manifest_with_files(&["/straße.txt"])))
        .await;
    factory.publish(&env, &[(&deployment, 100.0)]).await;
    factory.create_domain(&env, "www.example.org", true).await;
    factory
        .create_snippet(
            &env,
            "UMLAUT",
            SnippetLocation::Head,
            false,
            Some(SnippetRule {
                hosts: vec![],
                path: Some("^/über".to_string()),
            }),
        )
        .await;

    for path in ["/über uns", "/%C3%BCber%20uns"] {
        let body = lookup(&app, "www.example.org", path).await;
        let config = &body["config"];
        assert_eq!(
            config["redirect"],
            json!({"type": "rewrite", "path": "/about"}),
            "path {}",
            path
        );
        assert_eq!(config["snippets"]["headAppend"], "UMLAUT", "path {}", path);
    }

    let body = lookup(&app, "www.example.org", "/stra%C3%9Fe.txt").await;
    assert_eq!(
        body["config"]["headers"]["content-type"],
        "text/plain; charset=utf-8"
    );
}

#[tokio::test]
async fn test_lookup_applies_header_rules() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.store);
    let owner = factory.create_app("my-app", None).await;
    let mut build_conf = build_conf_with_redirects(vec![]);
    build_conf.headers = vec![
        HeaderRule {
            location: "/*".to_string(),
            headers: BTreeMap::from([
                ("X-Frame-Options".to_string(), "DENY".to_string()),
                ("Cache-Control".to_string(), "no-cache".to_string()),
            ]),
        },
        HeaderRule {
            location: "*.ico".to_string(),
            headers: BTreeMap::from([(
                "Cache-Control".to_string(),
                "max-age=86400".to_string(),
            )]),
        },
    ];
    let env = factory
        .create_environment(&owner, "production", build_conf)
        .await;
    let deployment = factory
        .create_deployment(&env, Some(manifest_with_files(&["/favicon.ico"])))
        .await;
    factory.publish(&env, &[(&deployment, 100.0)]).await;
    factory.create_domain(&env, "www.example.org", true).await;

    let body = lookup(&app, "www.example.org", "/favicon.ico").await;
    let headers = &body["config"]["headers"];
    assert_eq!(headers["content-type"], "image/x-icon");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["cache-control"], "max-age=86400");

    // Rules apply to paths without a static file too
    let body = lookup(&app, "www.example.org", "/pricing").await;
    let headers = &body["config"]["headers"];
    assert_eq!(headers["cache-control"], "no-cache");
    assert!(headers.get("content-type").is_none());
}

#[tokio::test]
async fn test_lookup_requires_host() {
    let app = TestApp::new().await;

    let response = app
        .server
        .get("/hosting/lookup")
        .add_query_param("host", " ")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lookup_store_unavailable() {
    let app = TestApp::new().await;
    app.store.set_unavailable(true);

    let response = app
        .server
        .get("/hosting/lookup")
        .add_query_param("host", "www.example.org")
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Database error");
}

#[tokio::test]
async fn test_lookup_is_cached_until_invalidated() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.store);
    let owner = factory.create_app("my-app", None).await;
    let env = factory
        .create_environment(&owner, "production", Default::default())
        .await;
    let first = factory.create_deployment(&env, None).await;
    let second = factory.create_deployment(&env, None).await;
    factory.publish(&env, &[(&first, 100.0)]).await;
    factory.create_domain(&env, "www.example.org", true).await;

    let body = lookup(&app, "www.example.org", "/").await;
    assert_eq!(body["config"]["deploymentId"], first.id);

    // Publishing without a reset keeps serving the cached config
    factory.publish(&env, &[(&second, 100.0)]).await;
    let body = lookup(&app, "www.example.org", "/").await;
    assert_eq!(body["config"]["deploymentId"], first.id);

    app.server
        .post("/api/cache/reset")
        .json(&json!({"envId": env.id}))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.wait_until_evicted("www.example.org").await;

    let body = lookup(&app, "www.example.org", "/").await;
    assert_eq!(body["config"]["deploymentId"], second.id);
}
