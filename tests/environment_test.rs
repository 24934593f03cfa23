mod common;

use axum::http::StatusCode;
use serde_json::Value;

use hostplane::models::TriggerWhen;

use common::{Factory, TestApp};

#[tokio::test]
async fn test_delete_environment() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.store);
    let owner = factory.create_app("my-app", None).await;
    factory
        .create_environment(&owner, "production", Default::default())
        .await;
    let staging = factory
        .create_environment(&owner, "staging", Default::default())
        .await;
    let deployment = factory.create_deployment(&staging, None).await;
    factory.publish(&staging, &[(&deployment, 100.0)]).await;
    factory.create_domain(&staging, "staging.example.org", true).await;
    factory.create_webhook(&owner, TriggerWhen::OnCachePurge).await;

    let response = app
        .server
        .get("/hosting/lookup")
        .add_query_param("host", "staging.example.org")
        .await;
    let body: Value = response.json();
    assert_eq!(body["found"], true);

    let response = app
        .server
        .delete(&format!("/api/environments/{}", staging.id))
        .await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["envId"], staging.id);
    assert_eq!(body["appId"], owner.id);
    assert_eq!(body["domainNames"][0], "staging.example.org");

    // Domain is unverified and every cache key of the environment is reset
    let domain = app.store.find_domain("staging.example.org").await.unwrap();
    assert!(!domain.verified);
    assert_eq!(
        app.invalidated_keys().await,
        vec![
            "staging.example.org".to_string(),
            "^my-app(?:--\\d+)?".to_string()
        ]
    );

    // Purge webhooks still see the deleted environment
    let sent = app.sender.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.environment_name, "staging");

    app.wait_until_evicted("staging.example.org").await;
    let response = app
        .server
        .get("/hosting/lookup")
        .add_query_param("host", "staging.example.org")
        .await;
    let body: Value = response.json();
    assert_eq!(body["found"], false);
}

#[tokio::test]
async fn test_delete_default_environment_is_refused() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.store);
    let owner = factory.create_app("my-app", None).await;
    let production = factory
        .create_environment(&owner, "production", Default::default())
        .await;
    factory.create_domain(&production, "www.example.org", true).await;

    let response = app
        .server
        .delete(&format!("/api/environments/{}", production.id))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let domain = app.store.find_domain("www.example.org").await.unwrap();
    assert!(domain.verified);
    assert!(app.invalidated_keys().await.is_empty());
}

#[tokio::test]
async fn test_delete_unknown_environment() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.store);
    let owner = factory.create_app("my-app", None).await;
    let staging = factory
        .create_environment(&owner, "staging", Default::default())
        .await;

    let response = app.server.delete("/api/environments/999").await;
    response.assert_status(StatusCode::NOT_FOUND);

    app.server
        .delete(&format!("/api/environments/{}", staging.id))
        .await
        .assert_status(StatusCode::OK);

    // Already deleted
    let response = app
        .server
        .delete(&format!("/api/environments/{}", staging.id))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}
