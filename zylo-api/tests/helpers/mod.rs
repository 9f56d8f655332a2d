//! Shared helpers for zylo-api integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::util::ServiceExt;
use zylo_api::media::{MediaError, MediaStore, MediaUpload, UploadedMedia};
use zylo_api::{build_router, AppState};
use zylo_common::auth::{hash_password, TokenIssuer};
use zylo_common::db::init_memory_database;
use zylo_common::db::users::upsert_admin;

pub const TEST_SECRET: &str = "test-secret-long-enough";
pub const ADMIN_EMAIL: &str = "admin@zylo.fm";
pub const ADMIN_PASSWORD: &str = "admin-password-1";
pub const BOUNDARY: &str = "zylo-test-boundary";

/// Media store that records uploads and serves fake URLs
#[derive(Default)]
pub struct FakeMedia {
    pub uploads: Mutex<Vec<MediaUpload>>,
    pub fail: bool,
}

impl FakeMedia {
    pub fn failing() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn folders(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.folder.clone())
            .collect()
    }
}

#[async_trait]
impl MediaStore for FakeMedia {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedMedia, MediaError> {
        if self.fail {
            return Err(MediaError::Rejected("Upload rejected by host".to_string()));
        }
        let media = UploadedMedia {
            secure_url: format!("https://media.test/{}/{}", upload.folder, upload.filename),
            public_id: format!("{}/{}", upload.folder, upload.filename),
            resource_type: upload.resource_type.as_str().to_string(),
            bytes: upload.data.len() as u64,
        };
        self.uploads.lock().unwrap().push(upload);
        Ok(media)
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub media: Arc<FakeMedia>,
}

/// Test helper: app over an in-memory database with admin uploads allowed
pub async fn create_test_app() -> TestApp {
    create_test_app_with(FakeMedia::default(), true).await
}

pub async fn create_test_app_with(media: FakeMedia, allow_admin_upload: bool) -> TestApp {
    let pool = init_memory_database()
        .await
        .expect("Failed to create in-memory database");
    let media = Arc::new(media);
    let state = AppState::new(
        pool.clone(),
        TokenIssuer::new(TEST_SECRET, 1),
        media.clone(),
        allow_admin_upload,
    );

    TestApp {
        router: build_router(state),
        pool,
        media,
    }
}

impl TestApp {
    /// Send a request and decode the body (`Null` when empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        // Extractor rejections carry plain text
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, token, None)).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::POST, uri, token, Some(body))).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::POST, uri, token, None)).await
    }

    pub async fn patch_json(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::PATCH, uri, token, Some(body))).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::DELETE, uri, token, None)).await
    }

    /// Register and return (access token, user id)
    pub async fn register(&self, email: &str, display_name: Option<&str>) -> (String, String) {
        let mut body = serde_json::json!({ "email": email, "password": "password-123" });
        if let Some(name) = display_name {
            body["displayName"] = Value::from(name);
        }
        let (status, json) = self.post_json("/auth/register", None, body).await;
        assert_eq!(status, StatusCode::OK, "register failed: {}", json);
        (
            json["access_token"].as_str().unwrap().to_string(),
            json["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, json) = self
            .post_json(
                "/auth/login",
                None,
                serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", json);
        json["access_token"].as_str().unwrap().to_string()
    }

    /// Seed the admin account and log in
    pub async fn admin_token(&self) -> String {
        let hash = hash_password(ADMIN_PASSWORD).unwrap();
        upsert_admin(&self.pool, ADMIN_EMAIL, &hash).await.unwrap();
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Register a DJ, approve it, and return (fresh DJ token, DJ profile id)
    pub async fn approved_dj(&self, email: &str, name: &str) -> (String, String) {
        self.register(email, Some(name)).await;
        let dj_token = self.login(email, "password-123").await;
        let (_, profile) = self.get("/dj/me", Some(&dj_token)).await;
        let dj_id = profile["id"].as_str().unwrap().to_string();

        let admin = self.admin_token().await;
        let (status, _) = self
            .post(&format!("/admin/djs/{}/approve", dj_id), Some(&admin))
            .await;
        assert_eq!(status, StatusCode::OK);
        (dj_token, dj_id)
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// One multipart part
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, token: Option<&str>, parts: &[Part<'_>]) -> Request<Body> {
    let mut builder = Request::builder().method(Method::POST).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}
