//! Core client behavior against the mock appliance.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{json, Value};
use syno_api::{CancellationToken, Field, SynoClient, SynoClientExt, SynoCredentials};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

use super::common::{failure, success, MockAppliance, USER};

async fn mount_system_info(appliance: &MockAppliance) {
    Mock::given(method("POST"))
        .and(path("/webapi/entry.cgi"))
        .and(body_string_contains("api=SYNO.Core.System"))
        .respond_with(success(json!({"model": "DS920+", "firmware_ver": "DSM 7.2"})))
        .mount(&appliance.server)
        .await;
}

#[tokio::test]
async fn test_generic_call_discovers_logs_in_and_decodes() {
    let appliance = MockAppliance::start().await;
    mount_system_info(&appliance).await;

    let client = appliance.client();
    let info: Value = client
        .call("SYNO.Core.System", "info", vec![Field::new("type", "firmware")])
        .await
        .unwrap();
    assert_eq!(info["model"], "DS920+");

    let requests = appliance.requests_to("/webapi/entry.cgi").await;
    assert_eq!(
        String::from_utf8_lossy(&requests[0].body),
        "api=SYNO.Core.System&version=3&method=info&type=firmware"
    );
}

#[tokio::test]
async fn test_credentials_from_environment_lookup() {
    let appliance = MockAppliance::start().await;
    mount_system_info(&appliance).await;

    let env: HashMap<&str, String> = HashMap::from([
        ("SYNOLOGY_URL", format!("{}/", appliance.server.uri())),
        ("SYNOLOGY_USER", USER.to_string()),
        ("SYNOLOGY_PASSWORD", super::common::PASSWORD.to_string()),
    ]);
    let credentials = SynoCredentials::from_lookup(|name| env.get(name).cloned()).unwrap();
    assert_eq!(credentials.url(), appliance.server.uri());

    let client = SynoClient::new(credentials).unwrap();
    let _: Value = client.call("SYNO.Core.System", "info", vec![]).await.unwrap();
    assert!(client.is_authenticated());
}

#[tokio::test]
async fn test_wrong_password_is_remote_error() {
    let appliance = MockAppliance::start().await;

    let client = SynoClient::new(SynoCredentials::new(appliance.server.uri(), USER, "nope")).unwrap();
    let err = client.login().await.unwrap_err();
    assert_eq!(err.remote_code(), Some(400));
    assert!(!client.is_authenticated());

    // Nothing is cached after a failed login; the next attempt logs in again.
    let _ = client.login().await;
    assert_eq!(appliance.login_count().await, 2);
    assert_eq!(appliance.discovery_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_wrappers_share_one_session() {
    let appliance = MockAppliance::start().await;
    mount_system_info(&appliance).await;
    Mock::given(method("POST"))
        .and(path("/webapi/DownloadStation/task.cgi"))
        .respond_with(success(json!({"total": 0, "offset": 0, "tasks": []})))
        .mount(&appliance.server)
        .await;

    let client = appliance.client();
    let mut handles = Vec::new();
    for i in 0..8 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            match i % 3 {
                0 => client.certificates().list().await.map(|_| ()).map_err(|e| e.to_string()),
                1 => client
                    .download_station()
                    .list(0, -1)
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string()),
                _ => client
                    .call::<Value>("SYNO.Core.System", "info", vec![])
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string()),
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(appliance.discovery_count().await, 1);
    assert_eq!(appliance.login_count().await, 1);
}

#[tokio::test]
async fn test_independent_clients_have_independent_sessions() {
    let appliance = MockAppliance::start().await;
    mount_system_info(&appliance).await;

    let first = appliance.client();
    let second = appliance.client();
    let _: Value = first.call("SYNO.Core.System", "info", vec![]).await.unwrap();
    assert!(!second.is_authenticated());

    let _: Value = second.call("SYNO.Core.System", "info", vec![]).await.unwrap();
    assert_eq!(appliance.login_count().await, 2);
    assert_eq!(appliance.discovery_count().await, 2);
}

#[tokio::test]
async fn test_remote_error_code_is_preserved() {
    let appliance = MockAppliance::start().await;
    Mock::given(method("POST"))
        .and(path("/webapi/entry.cgi"))
        .and(body_string_contains("api=SYNO.Core.System"))
        .respond_with(failure(117))
        .mount(&appliance.server)
        .await;

    let err = appliance
        .client()
        .call::<Value>("SYNO.Core.System", "info", vec![])
        .await
        .unwrap_err();
    assert_eq!(err.remote_code(), Some(117));
    assert!(!err.is_bad_status());
}

#[tokio::test]
async fn test_bad_status_wins_over_envelope() {
    let appliance = MockAppliance::start().await;
    Mock::given(method("POST"))
        .and(path("/webapi/entry.cgi"))
        .and(body_string_contains("api=SYNO.Core.System"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"success": true, "data": {}})))
        .mount(&appliance.server)
        .await;

    let err = appliance
        .client()
        .call::<Value>("SYNO.Core.System", "info", vec![])
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_cancelled_call_returns_promptly() {
    let appliance = MockAppliance::start().await;
    Mock::given(method("POST"))
        .and(path("/webapi/entry.cgi"))
        .and(body_string_contains("api=SYNO.Core.System"))
        .respond_with(success(json!({})).set_delay(Duration::from_secs(30)))
        .mount(&appliance.server)
        .await;

    let client = appliance.client();
    client.login().await.unwrap();

    let token = CancellationToken::new();
    let cancellable = client.with_cancellation(token.clone());
    let call = tokio::spawn(async move {
        cancellable
            .call::<Value>("SYNO.Core.System", "info", vec![])
            .await
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();

    let err = tokio::time::timeout(Duration::from_secs(5), call)
        .await
        .expect("cancelled call should finish")
        .unwrap()
        .unwrap_err();
    assert!(err.is_cancelled());

    // The parent handle is unaffected.
    assert!(!client.cancellation_token().is_cancelled());
    assert!(client.is_authenticated());
}
