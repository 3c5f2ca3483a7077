//! Download Station end to end.

use std::io::Cursor;
use std::time::Duration;

use serde_json::json;
use syno_api::download_station::{ErrorKind, FileType, NewDownloadTask};
use syno_api::{CancellationToken, SynoClientExt};
use tokio::io::AsyncWriteExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::Mock;

use super::common::{failure, fields_of, success, MockAppliance};

const NZB: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nzb PUBLIC "-//newzBin//DTD NZB 1.1//EN" "http://www.newzbin.com/DTD/nzb/nzb-1.1.dtd">
<nzb xmlns="http://www.newzbin.com/DTD/2003/nzb">
  <file poster="poster@example.com" date="1071674882" subject="example.bin">
    <groups><group>alt.binaries.example</group></groups>
  </file>
</nzb>
"#;

async fn mount_upload(appliance: &MockAppliance) {
    Mock::given(method("POST"))
        .and(path("/webapi/entry.cgi"))
        .and(body_string_contains("SYNO.DownloadStation2.Task"))
        .respond_with(success(json!({"task_id": ["dbid_9"]})))
        .mount(&appliance.server)
        .await;
}

#[tokio::test]
async fn test_nzb_upload_is_sniffed() {
    let appliance = MockAppliance::start().await;
    mount_upload(&appliance).await;

    let ds = appliance.client().download_station();
    ds.create(
        NewDownloadTask::from_file(Cursor::new(NZB.as_bytes().to_vec()))
            .with_destination("Downloads/usenet"),
    )
    .await
    .unwrap();

    let requests = appliance.requests_to("/webapi/entry.cgi").await;
    let fields = fields_of(&requests[0]);
    assert_eq!(fields["api"], "SYNO.DownloadStation2.Task");
    assert_eq!(fields["version"], "2");
    assert_eq!(fields["destination"], "\"Downloads/usenet\"");
    assert_eq!(fields["type"], "\"file\"");
    assert_eq!(fields["create_list"], "false");
    assert_eq!(fields["file"], "[\"nzb\"]");
    assert_eq!(fields["nzb"], NZB);
}

#[tokio::test]
async fn test_link_download_and_listing() {
    let appliance = MockAppliance::start().await;
    Mock::given(method("POST"))
        .and(path("/webapi/DownloadStation/task.cgi"))
        .and(body_string_contains("method=create"))
        .respond_with(success(json!({})))
        .expect(1)
        .mount(&appliance.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/webapi/DownloadStation/task.cgi"))
        .and(body_string_contains("method=list"))
        .respond_with(success(json!({
            "total": 1,
            "offset": 0,
            "tasks": [{
                "id": "dbid_1",
                "type": "http",
                "username": "admin",
                "title": "image.iso",
                "size": 4096,
                "status": "downloading",
                "additional": {"detail": {
                    "create_time": 1704067200,
                    "destination": "Downloads",
                    "priority": "auto",
                    "uri": "https://example.com/image.iso"
                }}
            }]
        })))
        .mount(&appliance.server)
        .await;

    let ds = appliance.client().download_station();
    ds.download("Downloads", ["https://example.com/image.iso"])
        .await
        .unwrap();

    let tasks = ds.list_all(None).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "image.iso");
    assert_eq!(
        tasks[0].created_at().map(|t| t.to_rfc3339()),
        Some("2024-01-01T00:00:00+00:00".to_string())
    );
}

#[tokio::test]
async fn test_upload_rejected_by_appliance() {
    let appliance = MockAppliance::start().await;
    Mock::given(method("POST"))
        .and(path("/webapi/entry.cgi"))
        .and(body_string_contains("SYNO.DownloadStation2.Task"))
        .respond_with(failure(117))
        .mount(&appliance.server)
        .await;

    let ds = appliance.client().download_station();
    let err = ds
        .create(NewDownloadTask::from_file(Cursor::new(b"magnet:?xt=urn:btih:abc".to_vec())))
        .await
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Client(_)));
    assert_eq!(err.remote_code(), Some(117));
}

#[tokio::test]
async fn test_unsniffable_upload_fails_locally() {
    let appliance = MockAppliance::start().await;
    mount_upload(&appliance).await;

    let ds = appliance.client().download_station();
    let err = ds
        .create(NewDownloadTask::from_file(Cursor::new(b"PK\x03\x04".to_vec())))
        .await
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownFileType));
    assert!(appliance.requests_to("/webapi/entry.cgi").await.is_empty());
}

#[tokio::test]
async fn test_cancel_while_sniffing() {
    let appliance = MockAppliance::start().await;
    mount_upload(&appliance).await;

    let token = CancellationToken::new();
    let ds = appliance
        .client()
        .with_cancellation(token.clone())
        .download_station();

    // Fewer bytes than the peek window and no EOF: sniffing waits for more.
    let (mut writer, reader) = tokio::io::duplex(1024);
    writer.write_all(b"d8:announce").await.unwrap();

    let create = tokio::spawn(async move { ds.create(NewDownloadTask::from_file(reader)).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();

    let err = tokio::time::timeout(Duration::from_secs(5), create)
        .await
        .expect("create should stop")
        .unwrap()
        .unwrap_err();
    assert!(err.is_cancelled());
    drop(writer);
}

#[tokio::test]
async fn test_cancel_mid_upload() {
    let appliance = MockAppliance::start().await;
    mount_upload(&appliance).await;

    let client = appliance.client();
    client.login().await.unwrap();

    let token = CancellationToken::new();
    let ds = client.with_cancellation(token.clone()).download_station();

    // Type is known, so the upload starts at once and stalls after the first chunk.
    let (mut writer, reader) = tokio::io::duplex(1024);
    writer.write_all(b"d8:announce4:info").await.unwrap();

    let create = tokio::spawn(async move {
        ds.create(NewDownloadTask::from_file(reader).with_file_type(FileType::Torrent))
            .await
    });
    tokio::time::sleep(Duration::from_millis(200)).await;
    token.cancel();

    let err = tokio::time::timeout(Duration::from_secs(5), create)
        .await
        .expect("upload should stop")
        .unwrap()
        .unwrap_err();
    assert!(err.is_cancelled(), "unexpected error: {err}");
    drop(writer);
}
