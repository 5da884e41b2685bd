//! Integration tests for consent gating of sends.

mod helpers;

use std::time::Duration;

use serde_json::json;

use beacon_core::ErrorKind;
use beacon_runtime::ConsentState;

use helpers::TestInstance;

#[tokio::test]
async fn test_default_consent_in_sends_immediately() {
    let app = TestInstance::new();
    app.configure(json!({})).await.unwrap();

    assert_eq!(app.instance.consent().state(), ConsentState::In);
    app.execute("sendEvent", json!({})).await.unwrap();
    assert_eq!(app.transport.request_count(), 1);
}

#[tokio::test]
async fn test_pending_send_waits_for_opt_in() {
    let app = TestInstance::new();
    app.configure(json!({ "defaultConsent": "pending" }))
        .await
        .unwrap();

    let send = tokio::spawn(app.instance.submit("sendEvent", json!({ "type": "held" })));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!send.is_finished());
    assert_eq!(app.transport.request_count(), 0);

    let consent = app
        .execute("setConsent", json!({ "general": "in" }))
        .await
        .unwrap();
    assert_eq!(consent, json!({ "general": "in" }));

    send.await.unwrap().unwrap();
    let requests = app.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body["events"][0]["xdm"]["eventType"], "held");
}

#[tokio::test]
async fn test_opt_out_rejects_waiting_and_later_sends() {
    let app = TestInstance::new();
    app.configure(json!({ "defaultConsent": "pending" }))
        .await
        .unwrap();

    let waiting = app.instance.submit("sendEvent", json!({}));
    app.execute("setConsent", json!({ "general": "out" }))
        .await
        .unwrap();

    let err = waiting.await.unwrap_err();
    assert!(err.is(ErrorKind::ConsentDeclined));

    let err = app.execute("sendEvent", json!({})).await.unwrap_err();
    assert!(err.is(ErrorKind::ConsentDeclined));
    assert_eq!(app.transport.request_count(), 0);
}

#[tokio::test]
async fn test_consent_settles_once() {
    let app = TestInstance::new();
    app.configure(json!({ "defaultConsent": "pending" }))
        .await
        .unwrap();

    app.execute("setConsent", json!({ "general": "out" }))
        .await
        .unwrap();
    let current = app
        .execute("setConsent", json!({ "general": "in" }))
        .await
        .unwrap();

    assert_eq!(current, json!({ "general": "out" }));
    assert_eq!(app.logger.warnings().len(), 1);
}

#[tokio::test]
async fn test_invalid_consent_value_rejected() {
    let app = TestInstance::new();
    app.configure(json!({ "defaultConsent": "pending" }))
        .await
        .unwrap();

    let err = app
        .execute("setConsent", json!({ "general": "maybe" }))
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Validation));
    assert_eq!(app.instance.consent().state(), ConsentState::Pending);
}

#[tokio::test]
async fn test_unobserved_send_still_goes_out() {
    let app = TestInstance::new();
    app.configure(json!({ "defaultConsent": "pending" }))
        .await
        .unwrap();

    drop(app.instance.submit("sendEvent", json!({ "type": "fire-and-forget" })));
    app.execute("setConsent", json!({ "general": "in" }))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let requests = app.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].body["events"][0]["xdm"]["eventType"],
        "fire-and-forget"
    );
}
