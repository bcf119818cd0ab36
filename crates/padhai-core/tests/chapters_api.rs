//! Integration tests for the curriculum API client against a canned server.

use padhai_core::{ApiClient, PadhaiError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one request with a complete JSON response, then close.
async fn spawn_server(status: u16, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        // Drain the request head; these are body-less GETs.
        let mut buf = Vec::new();
        let mut tmp = [0u8; 1024];
        loop {
            let n = stream.read(&mut tmp).await.unwrap();
            assert!(n > 0);
            buf.extend_from_slice(&tmp[..n]);
            if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = stream.shutdown().await;
    });

    format!("http://{addr}")
}

const CHAPTER: &str = r#"{
    "_id": "0123456789abcdef01234567",
    "title": "Photosynthesis",
    "content": "Plants make food from light.",
    "yt_links": [],
    "createdAt": "2025-03-01T10:00:00.000Z"
}"#;

#[tokio::test]
async fn lists_chapters_from_data_envelope() {
    let base = spawn_server(200, r#"{"data": [{
        "_id": "0123456789abcdef01234567",
        "title": "Photosynthesis",
        "content": "Plants make food from light.",
        "yt_links": []
    }]}"#)
    .await;

    let api = ApiClient::with_base_url(base).unwrap();
    let chapters = api.list_chapters().await.unwrap();
    assert_eq!(chapters.len(), 1);
    assert_eq!(chapters[0].title, "Photosynthesis");
}

#[tokio::test]
async fn fetches_single_chapter() {
    let base = spawn_server(200, CHAPTER).await;

    let api = ApiClient::with_base_url(base).unwrap();
    let chapter = api.get_chapter("0123456789abcdef01234567").await.unwrap();
    assert_eq!(chapter.id, "0123456789abcdef01234567");
    assert_eq!(chapter.content, "Plants make food from light.");
}

#[tokio::test]
async fn missing_chapter_is_not_found() {
    let base = spawn_server(404, r#"{"error": "not found"}"#).await;

    let api = ApiClient::with_base_url(base).unwrap();
    let err = api
        .get_chapter("0123456789abcdef01234567")
        .await
        .unwrap_err();
    assert!(matches!(err, PadhaiError::ChapterNotFound { .. }));
}

#[tokio::test]
async fn invalid_id_fails_without_a_request() {
    // Unroutable port: any network attempt would error differently.
    let api = ApiClient::with_base_url("http://127.0.0.1:1").unwrap();
    let err = api.get_chapter("definitely-not-an-id").await.unwrap_err();
    assert!(matches!(err, PadhaiError::InvalidChapterId { .. }));
}

#[tokio::test]
async fn backend_failure_is_a_request_failure() {
    let base = spawn_server(500, "oops").await;

    let api = ApiClient::with_base_url(base).unwrap();
    let err = api.list_classes().await.unwrap_err();
    match err {
        PadhaiError::RequestFailed { status, reason } => {
            assert_eq!(status, 500);
            assert_eq!(reason, "oops");
        }
        other => panic!("unexpected error: {other}"),
    }
}
