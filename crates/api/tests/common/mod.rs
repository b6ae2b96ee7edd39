//! Common test utilities for integration tests.
//!
//! Tests run the full router over the in-memory store, with a stub identity
//! provider and a table-driven geocoder, so no database or network is needed.

// Helpers are shared across test binaries; not every binary uses all of them.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use clinic_site_api::{
    app::{create_app, Backends},
    config::Config,
    services::LocalObjectStorage,
};
use domain::models::{FederatedIdentity, GeoPoint};
use domain::services::{
    GeocodeError, GeocodeMatch, GeocodingProvider, IdentityError, IdentityVerifier,
};
use persistence::InMemoryStore;
use serde_json::{json, Value};
use shared::jwt::JwtConfig;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_UID: &str = "admin-uid";
pub const ADMIN_EMAIL: &str = "dra.smile@clinic.test";
pub const USER_UID: &str = "patient-uid";
pub const USER_EMAIL: &str = "paciente@mail.test";
pub const FALLBACK_QUERY: &str = "Menga, Cali, Colombia";

const JWT_SECRET: &str = "integration-test-secret";

/// Accepts ID tokens of the form `uid|email|verified`.
///
/// The token `invalid` is rejected.
pub struct StaticVerifier;

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, id_token: &str) -> Result<FederatedIdentity, IdentityError> {
        if id_token == "invalid" {
            return Err(IdentityError::InvalidToken("rejected by stub".to_string()));
        }
        let mut parts = id_token.split('|');
        let uid = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| IdentityError::InvalidToken("missing uid".to_string()))?;
        let email = parts.next().filter(|p| !p.is_empty()).map(str::to_string);
        let email_verified = parts.next().map_or(true, |p| p == "true");

        Ok(FederatedIdentity {
            uid: uid.to_string(),
            email,
            email_verified,
            display_name: None,
            photo_url: None,
        })
    }
}

/// Answers from a fixed table and records every query it receives.
#[derive(Default)]
pub struct TableGeocoder {
    places: HashMap<String, GeoPoint>,
    queries: Mutex<Vec<String>>,
}

impl TableGeocoder {
    pub fn new(places: &[(&str, f64, f64)]) -> Self {
        Self {
            places: places
                .iter()
                .map(|(q, lat, lng)| (q.to_string(), GeoPoint { lat: *lat, lng: *lng }))
                .collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeocodingProvider for TableGeocoder {
    async fn search(&self, query: &str) -> Result<Option<GeocodeMatch>, GeocodeError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.places.get(query).map(|point| GeocodeMatch {
            point: *point,
            display_name: Some(query.to_string()),
        }))
    }
}

/// A running test application and the fakes behind it.
pub struct TestApp {
    pub router: Router,
    pub geocoder: Arc<TableGeocoder>,
    pub uploads_dir: TempDir,
}

impl TestApp {
    /// Number of regular files written under the uploads dir.
    pub fn stored_files(&self) -> usize {
        fn count(dir: &Path) -> usize {
            std::fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .filter_map(Result::ok)
                        .map(|e| {
                            let path = e.path();
                            if path.is_dir() {
                                count(&path)
                            } else {
                                1
                            }
                        })
                        .sum()
                })
                .unwrap_or(0)
        }
        count(self.uploads_dir.path())
    }
}

/// Test configuration: in-memory storage, one admin email.
pub fn test_config(uploads_dir: &Path) -> Config {
    let mut config = Config::load_for_test(&[]).expect("test config");
    config.identity.admin_emails = vec![ADMIN_EMAIL.to_string()];
    config.uploads.root_dir = uploads_dir.to_string_lossy().into_owned();
    config
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(&[], |_| {})
}

/// Builds the app with a geocoder answering `places` and a config tweak.
pub fn spawn_app_with(places: &[(&str, f64, f64)], tweak: impl FnOnce(&mut Config)) -> TestApp {
    let uploads_dir = tempfile::tempdir().expect("uploads tempdir");
    let mut config = test_config(uploads_dir.path());
    tweak(&mut config);

    let geocoder = Arc::new(TableGeocoder::new(places));
    let objects = Arc::new(LocalObjectStorage::new(
        uploads_dir.path(),
        &config.uploads.public_base_url,
    ));
    let backends = Backends::in_memory(
        Arc::new(InMemoryStore::new()),
        objects,
        Arc::new(StaticVerifier),
        geocoder.clone(),
        Arc::new(JwtConfig::with_secret(JWT_SECRET, 3600)),
    );

    TestApp {
        router: create_app(config, backends),
        geocoder,
        uploads_dir,
    }
}

/// Signs in through the API and returns the session token.
pub async fn sign_in(app: &Router, uid: &str, email: &str) -> String {
    let request = json_request(
        Method::POST,
        "/api/v1/auth/sign-in",
        json!({ "idToken": format!("{}|{}|true", uid, email) }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    body["accessToken"].as_str().unwrap().to_string()
}

pub async fn sign_in_admin(app: &Router) -> String {
    sign_in(app, ADMIN_UID, ADMIN_EMAIL).await
}

pub async fn sign_in_user(app: &Router) -> String {
    sign_in(app, USER_UID, USER_EMAIL).await
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn json_request_with_auth(method: Method, uri: &str, body: Value, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn delete_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Multipart upload of a single file plus the `folder` field.
pub fn upload_request(
    token: &str,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
    folder: &str,
) -> Request<Body> {
    const BOUNDARY: &str = "clinic-site-test-boundary";

    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"folder\"\r\n\r\n{folder}\r\n",
            b = BOUNDARY,
            folder = folder
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: {ct}\r\n\r\n",
            b = BOUNDARY,
            name = file_name,
            ct = content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/admin/uploads")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body))
        .unwrap()
}

pub async fn parse_response_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// Creates a service through the admin API and returns its id.
pub async fn create_service(app: &Router, token: &str, body: Value) -> String {
    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/admin/services",
            body,
            token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    parse_response_body(response).await["id"]
        .as_str()
        .unwrap()
        .to_string()
}
