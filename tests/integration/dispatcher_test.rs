//! Integration tests for command dispatch and configuration.

mod helpers;

use serde_json::{Value, json};

use beacon_core::ErrorKind;
use beacon_core::traits::Logger;
use beacon_runtime::CommandCall;

use helpers::TestInstance;

#[tokio::test]
async fn test_commands_require_configure() {
    let app = TestInstance::new();

    let err = app.execute("sendEvent", json!({})).await.unwrap_err();
    assert!(err.is(ErrorKind::NotConfigured));
    assert_eq!(app.transport.request_count(), 0);
}

#[tokio::test]
async fn test_configure_only_once() {
    let app = TestInstance::new();
    app.configure(json!({})).await.unwrap();

    let err = app.configure(json!({})).await.unwrap_err();
    assert!(err.is(ErrorKind::AlreadyConfigured));
}

#[tokio::test]
async fn test_components_registered_on_configure() {
    let app = TestInstance::new();
    app.configure(json!({})).await.unwrap();

    let registry = app.instance.registry();
    assert!(registry.is_closed().await);
    assert_eq!(
        registry.component_names().await,
        vec!["Context", "Privacy", "DataCollector"]
    );
    assert_eq!(
        registry.command_owner("sendEvent").await.as_deref(),
        Some("DataCollector")
    );
    assert_eq!(
        registry.command_owner("setConsent").await.as_deref(),
        Some("Privacy")
    );
}

#[tokio::test]
async fn test_unknown_command_names_it() {
    let app = TestInstance::new();
    app.configure(json!({})).await.unwrap();

    let err = app.execute("bogus", json!({})).await.unwrap_err();
    assert!(err.is(ErrorKind::UnknownCommand));
    assert!(err.message.contains("bogus"));
}

#[tokio::test]
async fn test_invalid_configure_fails_every_later_command() {
    let app = TestInstance::new();

    let err = app.execute("configure", json!({})).await.unwrap_err();
    assert!(err.is(ErrorKind::Configuration));

    let later = app.execute("sendEvent", json!({})).await.unwrap_err();
    assert_eq!(later.kind, err.kind);
    assert_eq!(later.message, err.message);
}

#[tokio::test]
async fn test_errors_disabled_logs_instead() {
    let app = TestInstance::new();
    app.configure(json!({ "errorsEnabled": false })).await.unwrap();

    let result = app.execute("bogus", json!({})).await.unwrap();
    assert_eq!(result, Value::Null);

    let errors = app.logger.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is(ErrorKind::UnknownCommand));
}

#[tokio::test]
async fn test_debug_enables_logging() {
    let app = TestInstance::new();
    assert!(!app.logger.is_enabled());

    app.configure(json!({ "debug": true })).await.unwrap();
    assert!(app.logger.is_enabled());
}

#[tokio::test]
async fn test_log_command_runs_before_configure() {
    let app = TestInstance::new();

    app.execute("log", json!({ "enabled": true })).await.unwrap();
    assert!(app.logger.is_enabled());

    app.execute("log", json!({ "enabled": false })).await.unwrap();
    assert!(!app.logger.is_enabled());
}

#[tokio::test]
async fn test_replay_runs_queue_in_order() {
    let app = TestInstance::new();

    let results = app
        .instance
        .replay(vec![
            CommandCall::new("sendEvent", json!({ "type": "early" })),
            CommandCall::new("configure", json!({ "imsOrgId": "ABC123@AdobeOrg" })),
            CommandCall::new("sendEvent", json!({ "type": "first" })),
            CommandCall::new("sendEvent", json!({ "type": "second" })),
        ])
        .await;

    assert_eq!(results.len(), 4);
    assert!(results[0].as_ref().unwrap_err().is(ErrorKind::NotConfigured));
    assert!(results[1].is_ok());
    assert!(results[2].is_ok());
    assert!(results[3].is_ok());

    let mut types: Vec<String> = app
        .transport
        .requests()
        .iter()
        .map(|request| request.body["events"][0]["xdm"]["eventType"].to_string())
        .collect();
    types.sort();
    assert_eq!(types, vec!["\"first\"", "\"second\""]);
}
