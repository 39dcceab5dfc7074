// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

fn app() -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let router = router(dir.path().to_path_buf());
    (dir, router)
}

fn multipart_body(field: &str, content: &[u8]) -> (String, Vec<u8>) {
    let boundary = "cmvtestboundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"f\"\r\n\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

#[tokio::test]
async fn health_reports_root_and_uptime() {
    let (dir, app) = app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value =
        serde_json::from_slice(&response.into_body().collect().await.unwrap().to_bytes()).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage_root"], dir.path().display().to_string());
}

#[tokio::test]
async fn serves_stored_files_with_content_type() {
    let (dir, app) = app();
    std::fs::create_dir_all(dir.path().join("derived/chapters")).unwrap();
    std::fs::write(dir.path().join("derived/chapters/m1_chapters.txt"), "Chapters:\n").unwrap();

    let response = app
        .oneshot(
            Request::get("/files/derived/chapters/m1_chapters.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[axum::http::header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"Chapters:\n");
}

#[tokio::test]
async fn missing_file_is_404() {
    let (_dir, app) = app();
    let response = app
        .oneshot(Request::get("/files/raw/videos/ghost.mp4").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn traversal_read_is_403() {
    let (_dir, app) = app();
    // The raw (unnormalized) path reaches the handler via the wildcard
    let response = app
        .oneshot(
            Request::get("/files/raw/..%2F..%2Fetc%2Fpasswd")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn dotfile_read_is_403() {
    let (dir, app) = app();
    std::fs::write(dir.path().join(".secrets"), "x").unwrap();
    let response = app
        .oneshot(Request::get("/files/.secrets").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn upload_stores_at_canonical_path() {
    let (dir, app) = app();
    let (content_type, body) = multipart_body("file", b"fake video");
    let response = app
        .oneshot(
            Request::post("/upload/raw_video/m1")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let parsed: serde_json::Value =
        serde_json::from_slice(&response.into_body().collect().await.unwrap().to_bytes()).unwrap();
    assert_eq!(parsed["success"], true);
    assert_eq!(parsed["path"], "raw/videos/m1.mp4");
    assert_eq!(
        std::fs::read(dir.path().join("raw/videos/m1.mp4")).unwrap(),
        b"fake video"
    );
}

#[tokio::test]
async fn upload_with_traversal_kind_is_400() {
    let (dir, app) = app();
    let (content_type, body) = multipart_body("file", b"x");
    let response = app
        .oneshot(
            Request::post("/upload/..%2Fetc/passwd")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    // No stray temp files under the root
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn upload_with_unknown_kind_is_400() {
    let (_dir, app) = app();
    let (content_type, body) = multipart_body("file", b"x");
    let response = app
        .oneshot(
            Request::post("/upload/screenshots/m1")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_with_bad_meeting_id_is_400() {
    let (_dir, app) = app();
    let (content_type, body) = multipart_body("file", b"x");
    let too_long = "a".repeat(101);
    for bad in ["has space", too_long.as_str()] {
        let response = app
            .clone()
            .oneshot(
                Request::post(format!("/upload/raw_video/{}", urlencode(bad)))
                    .header("content-type", content_type.clone())
                    .body(Body::from(body.clone()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "id: {bad}");
    }
}

fn urlencode(s: &str) -> String {
    s.replace(' ', "%20")
}

#[tokio::test]
async fn upload_without_file_field_is_400_and_leaves_no_temp() {
    let (dir, app) = app();
    let (content_type, body) = multipart_body("not_file", b"x");
    let response = app
        .oneshot(
            Request::post("/upload/raw_video/m1")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!dir.path().join("raw/videos/m1.part").exists());
    assert!(!dir.path().join("raw/videos/m1.mp4").exists());
}

#[tokio::test]
async fn uploaded_file_is_served_back() {
    let (_dir, app) = app();
    let (content_type, body) = multipart_body("file", b"round trip");
    app.clone()
        .oneshot(
            Request::post("/upload/derived_diarized/m1")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::get("/files/derived/diarized/m1_diarized.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"round trip");
}
