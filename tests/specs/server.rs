// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-server boundary specs: traversal rejection and upload round trip.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

fn app() -> (tempfile::TempDir, axum::Router) {
    let dir = tempfile::tempdir().unwrap();
    let router = cmv_server::router(dir.path().to_path_buf());
    (dir, router)
}

fn multipart(content: &[u8]) -> (String, Vec<u8>) {
    let boundary = "specboundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"f\"\r\n\r\n",
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

/// Upload with a traversal path is rejected with 400 and leaves no file
/// behind; reading with a traversal path is rejected with 403.
#[tokio::test]
async fn path_traversal_is_rejected_on_both_routes() {
    let (dir, app) = app();

    let (content_type, body) = multipart(b"evil");
    let response = app
        .clone()
        .oneshot(
            Request::post("/upload/..%2Fetc/passwd")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    let response = app
        .oneshot(
            Request::get("/files/..%2F..%2Fetc%2Fpasswd")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// A stored artifact round-trips byte-identically through upload + read.
#[tokio::test]
async fn upload_then_read_round_trips() {
    let (_dir, app) = app();
    let payload = b"chapter document bytes";

    let (content_type, body) = multipart(payload);
    let response = app
        .clone()
        .oneshot(
            Request::post("/upload/derived_chapters/m1")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let uploaded: serde_json::Value =
        serde_json::from_slice(&response.into_body().collect().await.unwrap().to_bytes()).unwrap();
    assert_eq!(uploaded["path"], "derived/chapters/m1_chapters.txt");

    let response = app
        .oneshot(
            Request::get("/files/derived/chapters/m1_chapters.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], payload);
}
