//! Integration tests for HTTP API endpoints.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestServer;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::io::Read;
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "shelf-test-boundary";

/// Helper to make JSON requests.
async fn json_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    auth_token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = auth_token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let request = builder.body(body).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Register an account and log in, returning the access token.
async fn register_and_login(server: &TestServer, username: &str) -> String {
    let password = format!("pw-{username}");

    let (status, _) = json_request(
        &server.router,
        "POST",
        "/v1/register",
        Some(json!({ "username": username, "password": password })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = json_request(
        &server.router,
        "POST",
        "/v1/auth",
        Some(json!({ "username": username, "password": password })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    body["access_token"].as_str().unwrap().to_string()
}

/// Build a multipart upload body with the `path` field before the `file` field.
fn multipart_body(path: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"path\"\r\n\r\n{path}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Upload a file, returning the response status and parsed body.
async fn upload(
    server: &TestServer,
    token: &str,
    path: &str,
    file_name: &str,
    content: &[u8],
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/files/upload")
        .header("Authorization", format!("Bearer {token}"))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(path, file_name, content)))
        .unwrap();

    let response = server.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Download by reference, returning the status, content type and raw bytes.
async fn download(
    server: &TestServer,
    token: &str,
    query: &str,
) -> (StatusCode, Option<String>, Vec<u8>) {
    let request = Request::builder()
        .method("GET")
        .uri(format!("/v1/files/download?{query}"))
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let response = server.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, content_type, body)
}

fn untar(data: &[u8]) -> HashMap<String, Vec<u8>> {
    let decoder = flate2::read::GzDecoder::new(data);
    let mut archive = tar::Archive::new(decoder);
    let mut out = HashMap::new();
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        let name = entry.path().unwrap().to_string_lossy().into_owned();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        out.insert(name, content);
    }
    out
}

fn unzip(data: Vec<u8>) -> HashMap<String, Vec<u8>> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(data)).unwrap();
    let mut out = HashMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        out.insert(entry.name().to_string(), content);
    }
    out
}

#[tokio::test]
async fn register_then_login_grants_access() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    let (status, body) = json_request(&server.router, "GET", "/v1/files", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn duplicate_username_is_conflict() {
    let server = TestServer::new().await;
    register_and_login(&server, "alice").await;

    let (status, body) = json_request(
        &server.router,
        "POST",
        "/v1/register",
        Some(json!({ "username": "alice", "password": "other" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "already_exists");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let server = TestServer::new().await;
    register_and_login(&server, "alice").await;

    let (status, _) = json_request(
        &server.router,
        "POST",
        "/v1/auth",
        Some(json!({ "username": "alice", "password": "wrong" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn file_routes_require_a_token() {
    let server = TestServer::new().await;

    let (status, _) = json_request(&server.router, "GET", "/v1/files", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        json_request(&server.router, "GET", "/v1/files", None, Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ping_reports_database_timing() {
    let server = TestServer::new().await;

    let (status, body) = json_request(&server.router, "GET", "/v1/ping", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["database_ms"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn upload_then_download_by_path_roundtrips() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    let content = b"the quick brown fox";
    let (status, body) = upload(&server, &token, "/docs/report.txt", "upload.bin", content).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["path"], "/docs/report.txt");
    assert_eq!(body["name"], "report.txt");
    assert_eq!(body["size"], content.len() as i64);
    // The record id is serialized as `id`.
    assert!(body["id"].as_str().is_some());
    assert!(body.get("file_id").is_none());

    let (status, content_type, bytes) =
        download(&server, &token, "path=/docs/report.txt").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/octet-stream"));
    assert_eq!(bytes, content);
}

#[tokio::test]
async fn upload_then_download_by_id_roundtrips() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    let content = b"binary\x00payload";
    let (status, body) = upload(&server, &token, "/data/", "blob.bin", content).await;
    assert_eq!(status, StatusCode::CREATED);
    let file_id = body["id"].as_str().unwrap().to_string();

    let (status, _, bytes) = download(&server, &token, &format!("path={file_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, content);
}

#[tokio::test]
async fn directory_form_path_appends_uploaded_name() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    let (status, body) = upload(&server, &token, "/photos/", "cat.jpg", b"jpeg").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["path"], "/photos/cat.jpg");
    assert_eq!(body["name"], "cat.jpg");
}

#[tokio::test]
async fn unknown_well_formed_id_is_not_found() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    let missing = Uuid::new_v4();
    let (status, _, _) = download(&server, &token, &format!("path={missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn id_owned_by_another_user_is_not_found() {
    let server = TestServer::new().await;
    let alice = register_and_login(&server, "alice").await;
    let bob = register_and_login(&server, "bob").await;

    let (_, body) = upload(&server, &alice, "/secret.txt", "secret.txt", b"mine").await;
    let file_id = body["id"].as_str().unwrap().to_string();

    let (status, _, _) = download(&server, &bob, &format!("path={file_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_logical_path_is_bad_request() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    let (status, body) = upload(&server, &token, "no-leading-slash", "f.txt", b"x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_path");

    let (status, _) = upload(&server, &token, "/docs/../escape", "f.txt", b"x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn conflicting_upload_leaves_original_untouched() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    let (status, _) = upload(&server, &token, "/keep.txt", "keep.txt", b"original").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = upload(&server, &token, "/keep.txt", "keep.txt", b"overwrite").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "file_exists");

    let (_, _, bytes) = download(&server, &token, "path=/keep.txt").await;
    assert_eq!(bytes, b"original");
}

#[tokio::test]
async fn upload_onto_existing_directory_is_bad_request() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    upload(&server, &token, "/docs/a.txt", "a.txt", b"x").await;

    let (status, body) = upload(&server, &token, "/docs", "docs", b"y").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "directory_exists");
}

#[tokio::test]
async fn upload_under_existing_file_is_bad_request() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    upload(&server, &token, "/plain.txt", "plain.txt", b"x").await;

    let (status, body) = upload(&server, &token, "/plain.txt/child.txt", "child.txt", b"y").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "parent_is_file");
}

#[tokio::test]
async fn upload_with_fields_out_of_order_is_bad_request() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    // `file` before `path` cannot stream without buffering, so it is rejected.
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"f.txt\"\r\n\r\npayload\r\n--{BOUNDARY}--\r\n"
        )
        .as_bytes(),
    );

    let request = Request::builder()
        .method("POST")
        .uri("/v1/files/upload")
        .header("Authorization", format!("Bearer {token}"))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = server.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn part_content_length_mismatch_is_not_fatal() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    // The part declares a wrong size; the byte count on disk wins.
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"path\"\r\n\r\n/sized.bin\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"sized.bin\"\r\nContent-Type: application/octet-stream\r\n\
             Content-Length: 999\r\n\r\npayload\r\n--{BOUNDARY}--\r\n"
        )
        .as_bytes(),
    );

    let request = Request::builder()
        .method("POST")
        .uri("/v1/files/upload")
        .header("Authorization", format!("Bearer {token}"))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = server.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(json["size"], 7);

    let (_, _, bytes) = download(&server, &token, "path=/sized.bin").await;
    assert_eq!(bytes, b"payload");
}

#[tokio::test]
async fn listing_is_scoped_to_the_caller() {
    let server = TestServer::new().await;
    let alice = register_and_login(&server, "alice").await;
    let bob = register_and_login(&server, "bob").await;

    upload(&server, &alice, "/a1.txt", "a1.txt", b"1").await;
    upload(&server, &alice, "/a2.txt", "a2.txt", b"2").await;
    upload(&server, &bob, "/b1.txt", "b1.txt", b"3").await;

    let (status, body) = json_request(&server.router, "GET", "/v1/files", None, Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    let paths: Vec<&str> = files.iter().map(|f| f["path"].as_str().unwrap()).collect();
    assert!(paths.contains(&"/a1.txt"));
    assert!(paths.contains(&"/a2.txt"));

    let (_, body) = json_request(&server.router, "GET", "/v1/files", None, Some(&bob)).await;
    assert_eq!(body["files"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn tar_archive_of_directory_extracts_without_shard_leakage() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    upload(&server, &token, "/pack/a.txt", "a.txt", b"alpha").await;
    upload(&server, &token, "/pack/b.txt", "b.txt", b"bravo").await;

    let (status, content_type, bytes) =
        download(&server, &token, "path=/pack&compression=tar").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/x-gtar"));

    let entries = untar(&bytes);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries["pack/a.txt"], b"alpha");
    assert_eq!(entries["pack/b.txt"], b"bravo");
    for name in entries.keys() {
        assert!(!name.starts_with('/'), "absolute entry name {name}");
    }
}

#[tokio::test]
async fn zip_archive_of_single_file_has_one_entry() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    upload(&server, &token, "/docs/only.txt", "only.txt", b"solo").await;

    let (status, content_type, bytes) =
        download(&server, &token, "path=/docs/only.txt&compression=zip").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/x-zip-compressed"));

    let entries = unzip(bytes);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries["docs/only.txt"], b"solo");
}

#[tokio::test]
async fn unknown_compression_scheme_is_bad_request() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    upload(&server, &token, "/f.txt", "f.txt", b"x").await;

    let (status, _, _) = download(&server, &token, "path=/f.txt&compression=rar").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn plain_download_of_recordless_path_is_not_found() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    upload(&server, &token, "/dir/f.txt", "f.txt", b"x").await;

    // /dir exists on disk but has no record; only archive downloads may
    // resolve record-less paths.
    let (status, _, _) = download(&server, &token, "path=/dir").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn orphan_partial_file_is_not_served_plain() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    // A file on disk without a record, as an aborted upload would leave.
    let user = server
        .metadata()
        .get_user_by_username("alice")
        .await
        .unwrap()
        .unwrap();
    let user_root = server.state.resolver.user_root(user.user_id);
    std::fs::create_dir_all(&user_root).unwrap();
    std::fs::write(user_root.join("orphan.bin"), b"partial").unwrap();

    let (status, _, _) = download(&server, &token, "path=/orphan.bin").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn archive_of_missing_directory_is_not_found() {
    let server = TestServer::new().await;
    let token = register_and_login(&server, "alice").await;

    let (status, _, _) = download(&server, &token, "path=/absent&compression=tar").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
