use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::auth::{InMemoryUserRepository, JwtConfig};
use crate::config::{Config, MlConfig};
use crate::diseases::catalog::default_catalog;
use crate::diseases::{DiseaseRepository, InMemoryDiseaseRepository};
use crate::ml::HttpMlService;
use crate::predictions::InMemoryPredictionRepository;
use crate::storage::PublicDisk;
use crate::{router, AppState};

pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub struct FilePart<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> FilePart<'a> {
    pub fn image(content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            name: "image",
            file_name: Some("leaf.jpg"),
            content_type: Some(content_type),
            data,
        }
    }

    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            file_name: None,
            content_type: None,
            data: value.as_bytes(),
        }
    }
}

/// Builds a multipart/form-data body, returning (content type, body).
pub fn multipart_body(parts: &[FilePart<'_>]) -> (String, Vec<u8>) {
    let boundary = "plantdoc-test-boundary";
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match part.file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    part.name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name).as_bytes(),
            ),
        }
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    (format!("multipart/form-data; boundary={}", boundary), body)
}

/// The full router over in-memory repositories, a temporary public disk and
/// the ML service at `ml_url`.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub diseases: Arc<InMemoryDiseaseRepository>,
    pub predictions: Arc<InMemoryPredictionRepository>,
    _storage_dir: TempDir,
}

impl TestApp {
    pub async fn new(ml_url: &str) -> Self {
        let storage_dir = tempfile::tempdir().unwrap();

        let mut ml = MlConfig::new(ml_url);
        ml.timeout = Duration::from_secs(5);
        ml.retry_times = 1;
        ml.retry_sleep = Duration::from_millis(0);

        let config = Config {
            addr: "127.0.0.1:0".parse().unwrap(),
            app_url: "http://localhost:8081".to_string(),
            database_url: String::new(),
            jwt_secret: "test-secret".to_string(),
            access_token_minutes: 15,
            refresh_token_days: 7,
            storage_root: storage_dir.path().to_path_buf(),
            per_page: 10,
            ml: ml.clone(),
        };

        let diseases = Arc::new(InMemoryDiseaseRepository::new());
        diseases.seed(default_catalog()).await.unwrap();
        let predictions = Arc::new(InMemoryPredictionRepository::new());

        let state = AppState {
            jwt: JwtConfig::new(&config.jwt_secret, 15, 7),
            users: Arc::new(InMemoryUserRepository::new()),
            diseases: diseases.clone(),
            predictions: predictions.clone(),
            ml: Arc::new(HttpMlService::new(ml).unwrap()),
            storage: Arc::new(PublicDisk::new(storage_dir.path(), config.storage_url())),
            config: Arc::new(config),
        };

        Self {
            router: router(state.clone()),
            state,
            diseases,
            predictions,
            _storage_dir: storage_dir,
        }
    }

    pub async fn request(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(builder(method, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.request(
            builder(method, uri, token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn send_raw(&self, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
        let req = builder(method, uri, None).body(Body::empty()).unwrap();
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    pub async fn upload(&self, token: &str, parts: &[FilePart<'_>]) -> (StatusCode, Value) {
        let (content_type, body) = multipart_body(parts);
        self.request(
            builder(Method::POST, "/api/predictions", Some(token))
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Registers a user and returns their access token.
    pub async fn register(&self, email: &str) -> String {
        let (status, body) = self
            .send_json(
                Method::POST,
                "/api/auth/register",
                None,
                json!({
                    "name": "Test Grower",
                    "email": email,
                    "password": "password123",
                    "password_confirmation": "password123"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Number of files currently stored under `predictions/`.
    pub fn stored_images(&self) -> usize {
        match std::fs::read_dir(self.state.storage.root().join("predictions")) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}
