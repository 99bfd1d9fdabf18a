//! Router-level tests driving the full axum stack with `tower::ServiceExt::oneshot`.


use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{
    build_router,
    config::Config,
    services::qr_service::QrProvisioner,
    state::AppState,
    store::{JsonFileStore, SharedStore},
};

pub(crate) const OWNER: &str = "owner@example.com";
pub(crate) const OTHER_OWNER: &str = "other@example.com";
pub(crate) const ADMIN: &str = "admin@example.com";

pub(crate) struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config {
            data_dir: dir.path().join("data"),
            qr_dir: dir.path().join("qr_codes"),
            public_base_url: Some("http://qr.test".to_string()),
            qr_size_px: 128,
            qr_logo_path: None,
            ..config
        };

        let store: SharedStore = std::sync::Arc::new(
            JsonFileStore::open(&config.data_dir)
                .await
                .expect("open store"),
        );
        let qr = QrProvisioner::new(&config.qr_dir, config.qr_settings())
            .await
            .expect("qr provisioner");

        let state = AppState::new(store, qr, config);
        Self {
            router: build_router(state.clone()),
            state,
            dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_as(&self, uri: &str, email: &str) -> Response<Body> {
        self.send(
            Request::get(uri)
                .header("x-owner-email", email)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn get_as_admin(&self, uri: &str) -> Response<Body> {
        self.send(
            Request::get(uri)
                .header("x-owner-email", ADMIN)
                .header("x-owner-role", "admin")
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Register a business for `email` and return its id.
    pub async fn register(&self, email: &str, name: &str, category: &str) -> String {
        let response = self
            .send(
                Request::post("/api/businesses")
                    .header("x-owner-email", email)
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "name": name,
                            "category": category,
                            "external_review_url": "https://reviews.example.com/write",
                            "status": "active"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        body["id"].as_str().expect("id in response").to_string()
    }
}

pub(crate) async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

pub(crate) async fn json_body(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}
