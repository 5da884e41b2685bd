//! Integration tests for the sendEvent pipeline.

mod helpers;

use std::sync::{Arc, Mutex};

use serde_json::json;

use beacon_core::types::EventSnapshot;
use beacon_core::{AppError, AppResult, ErrorKind};
use beacon_runtime::testing::RecordingTransport;
use beacon_runtime::{
    CommandCall, CommandOptions, Component, ComponentContext, ComponentCreator, HookPoint, hook_fn,
};

use helpers::{TestInstance, with_org_id};

#[tokio::test]
async fn test_send_event_builds_request() {
    let app = TestInstance::with_transport(
        RecordingTransport::new().with_response(json!({ "handle": [] })),
    );
    app.configure(json!({ "datasetId": "DATASETID", "schemaId": "SCHEMAID" }))
        .await
        .unwrap();

    let result = app
        .execute(
            "sendEvent",
            json!({
                "xdm": { "web": { "webPageDetails": { "name": "home" } } },
                "type": "web.webpagedetails.pageViews"
            }),
        )
        .await
        .unwrap();

    let requests = app.transport.requests();
    assert_eq!(requests.len(), 1);
    let body = &requests[0].body;

    assert_eq!(body["meta"]["gateway"]["imsOrgId"], "ABC123@AdobeOrg");
    assert_eq!(body["meta"]["collect"]["datasetId"], "DATASETID");
    assert_eq!(body["meta"]["collect"]["schemaId"], "SCHEMAID");
    assert_eq!(body["meta"]["collect"]["synchronousValidation"], true);

    let xdm = &body["events"][0]["xdm"];
    assert_eq!(xdm["eventType"], "web.webpagedetails.pageViews");
    assert_eq!(xdm["web"]["webPageDetails"]["name"], "home");
    assert!(xdm["timestamp"].is_string());
    assert_eq!(xdm["implementationDetails"]["environment"], "server");

    assert_eq!(result["requestBody"], *body);
    assert_eq!(result["responseBody"], json!({ "handle": [] }));
}

#[tokio::test]
async fn test_send_event_without_response() {
    let app = TestInstance::new();
    app.configure(json!({})).await.unwrap();

    let result = app
        .execute("sendEvent", json!({ "data": { "plan": "pro" } }))
        .await
        .unwrap();

    assert!(result.get("responseBody").is_none());
    assert_eq!(result["requestBody"]["events"][0]["data"]["plan"], "pro");
}

#[tokio::test]
async fn test_document_unloading_reaches_transport() {
    let app = TestInstance::new();
    app.configure(json!({})).await.unwrap();

    app.execute("sendEvent", json!({ "documentUnloading": true }))
        .await
        .unwrap();

    let options = app.transport.requests()[0].options;
    assert!(options.document_unloading);
    assert!(!options.expects_response);
}

#[tokio::test]
async fn test_before_send_callback_sees_final_event() {
    let app = TestInstance::new();
    let seen: Arc<Mutex<Vec<EventSnapshot>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    app.configure_with(
        CommandOptions::new(with_org_id(json!({}))).with_before_send(move |snapshot| {
            sink.lock().unwrap().push(snapshot.clone());
            Ok(())
        }),
    )
    .await
    .unwrap();

    app.execute("sendEvent", json!({ "type": "click" }))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].xdm["eventType"], "click");
    assert!(seen[0].xdm["implementationDetails"].is_object());
}

#[tokio::test]
async fn test_failing_callback_is_logged_and_send_continues() {
    let app = TestInstance::new();
    app.configure_with(
        CommandOptions::new(with_org_id(json!({})))
            .with_before_send(|_| Err(AppError::callback("rejected by user code"))),
    )
    .await
    .unwrap();

    app.execute("sendEvent", json!({})).await.unwrap();

    assert_eq!(app.transport.request_count(), 1);
    let errors = app.logger.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is(ErrorKind::Callback));
}

#[tokio::test]
async fn test_transport_failure_surfaces() {
    let app = TestInstance::with_transport(
        RecordingTransport::new().failing(AppError::transport("connection reset")),
    );
    app.configure(json!({})).await.unwrap();

    let err = app.execute("sendEvent", json!({})).await.unwrap_err();
    assert!(err.is(ErrorKind::Transport));
}

#[tokio::test]
async fn test_invalid_send_options_rejected() {
    let app = TestInstance::new();
    app.configure(json!({})).await.unwrap();

    let err = app
        .execute("sendEvent", json!({ "type": "" }))
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Validation));
    assert_eq!(app.transport.request_count(), 0);
}

#[tokio::test]
async fn test_sends_are_independent_payloads() {
    let app = TestInstance::new();
    app.configure(json!({})).await.unwrap();

    let first = app.instance.submit("sendEvent", json!({ "type": "first" }));
    let second = app.instance.submit("sendEvent", json!({ "type": "second" }));
    let (first, second) = tokio::join!(first, second);
    first.unwrap();
    second.unwrap();

    let requests = app.transport.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request.body["events"].as_array().unwrap().len(), 1);
    }
}

/// Subscribes to `onBeforeEvent` and panics on events typed "bad".
struct Picky;

impl ComponentCreator for Picky {
    fn name(&self) -> &str {
        "Picky"
    }

    fn create(&self, _ctx: &ComponentContext) -> AppResult<Component> {
        Ok(Component::new("Picky").with_hook(
            HookPoint::OnBeforeEvent,
            hook_fn(|args| async move {
                let bad = args
                    .event()
                    .is_some_and(|event| event.snapshot().xdm["eventType"] == "bad");
                if bad {
                    panic!("Picky refuses this event");
                }
                Ok(())
            }),
        ))
    }
}

#[tokio::test]
async fn test_panicking_hook_does_not_sink_other_sends() {
    let app = TestInstance::with_components(RecordingTransport::new(), vec![Arc::new(Picky)]);

    let results = app
        .instance
        .replay(vec![
            CommandCall::new("configure", with_org_id(json!({}))),
            CommandCall::new("sendEvent", json!({ "type": "bad" })),
            CommandCall::new("sendEvent", json!({ "type": "good" })),
        ])
        .await;

    assert!(results[0].is_ok());
    let err = results[1].as_ref().unwrap_err();
    assert!(err.is(ErrorKind::HookRejection));
    assert!(err.message.contains("Picky"));
    assert!(results[2].is_ok());

    let requests = app.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body["events"][0]["xdm"]["eventType"], "good");
}
