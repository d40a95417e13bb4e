//! API integration tests.
//!
//! These drive the router end to end with a mock database and in-memory
//! object store and video platform.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    response::Response,
};
use bytes::Bytes;
use lostsons_api::{AppState, router as api_router};
use lostsons_common::config::IngestConfig;
use lostsons_common::{AppResult, SignatureVerifier, StorageBackend, UploadedObject};
use lostsons_core::{
    AssetHandle, ClipService, GameService, UserService, VideoAssetClient, WebhookReconciler,
};
use lostsons_db::entities::{clip, game, tag, user};
use lostsons_db::repositories::{ClipRepository, GameRepository, UserRepository};
use chrono::{FixedOffset, Utc};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use serde_json::Value;
use tower::ServiceExt;

const SECRET: &str = "test-signing-secret";
const BOUNDARY: &str = "lostsons-boundary";

#[derive(Default)]
struct Calls(Mutex<Vec<String>>);

impl Calls {
    fn record(&self, call: String) {
        self.0.lock().unwrap().push(call);
    }

    fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

struct MemoryStorage(Arc<Calls>);

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn upload(&self, key: &str, data: Bytes, _content_type: &str) -> AppResult<UploadedObject> {
        self.0.record(format!("upload {key}"));
        Ok(UploadedObject {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.0.record(format!("delete {key}"));
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://lostsonstv.example.com/{key}")
    }
}

struct MemoryAssets(Arc<Calls>);

#[async_trait]
impl VideoAssetClient for MemoryAssets {
    async fn create_asset(&self, _source_url: &str, passthrough: &str) -> AppResult<AssetHandle> {
        self.0.record(format!("create_asset {passthrough}"));
        Ok(AssetHandle {
            asset_id: "asset1".to_string(),
            playback_id: "play1".to_string(),
        })
    }

    async fn delete_asset(&self, asset_id: &str) -> AppResult<()> {
        self.0.record(format!("delete_asset {asset_id}"));
        Ok(())
    }
}

struct TestApp {
    router: Router,
    calls: Arc<Calls>,
    db: Arc<DatabaseConnection>,
}

/// SQL of every statement the handlers ran. Call once the router is consumed.
fn executed_sql(db: Arc<DatabaseConnection>) -> Vec<String> {
    let db = Arc::try_unwrap(db).ok().expect("router still holds the connection");
    db.into_transaction_log()
        .iter()
        .flat_map(|txn| txn.statements().iter().map(|stmt| stmt.sql.clone()))
        .collect()
}

fn test_app(db: DatabaseConnection) -> TestApp {
    test_app_with_limit(db, IngestConfig::default().max_upload_bytes)
}

fn test_app_with_limit(db: DatabaseConnection, max_upload_bytes: usize) -> TestApp {
    let db = Arc::new(db);
    let calls = Arc::new(Calls::default());
    let ingest = IngestConfig::default();

    let clip_repo = ClipRepository::new(Arc::clone(&db));
    let clip_service = ClipService::new(
        Arc::new(MemoryStorage(Arc::clone(&calls))),
        Arc::new(MemoryAssets(Arc::clone(&calls))),
        clip_repo.clone(),
        &ingest,
    );

    let state = AppState {
        db: Arc::clone(&db),
        clip_service,
        user_service: UserService::new(UserRepository::new(Arc::clone(&db))),
        game_service: GameService::new(GameRepository::new(Arc::clone(&db))),
        webhook_reconciler: WebhookReconciler::new(SignatureVerifier::new(SECRET), clip_repo, None),
    };

    TestApp {
        router: api_router(max_upload_bytes).with_state(state),
        calls,
        db,
    }
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

fn multipart_body(fields: &[(&str, &str)], file: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(data) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"clip\"; filename=\"ace.mp4\"\r\nContent-Type: video/mp4\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .uri("/clips/new")
        .method("POST")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn webhook_request(signature: Option<String>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .uri("/mux-webhook")
        .method("POST")
        .header("Content-Type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("Mux-Signature", signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn sign(body: &str) -> String {
    let signature = SignatureVerifier::new(SECRET)
        .sign("1700000000", body.as_bytes())
        .unwrap();
    format!("t=1700000000,v1={signature}")
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_http() {
    let app = test_app(empty_db());

    let response = app
        .router
        .oneshot(Request::get("/health/http").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!({ "http": "alive" }));
}

#[tokio::test]
async fn test_health_db() {
    let app = test_app(empty_db());

    let response = app
        .router
        .oneshot(Request::get("/health/db").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!({ "db": "alive" }));
}

#[tokio::test]
async fn test_unknown_clip_returns_404_envelope() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<std::collections::BTreeMap<&str, sea_orm::Value>>::new()])
        .into_connection();
    let app = test_app(db);

    let response = app
        .router
        .oneshot(Request::get("/clips/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn test_create_clip_without_file_is_invalid() {
    let app = test_app(empty_db());
    let body = multipart_body(
        &[("description", "ace"), ("game", "Valorant"), ("username", "kaz")],
        None,
    );

    let response = app.router.oneshot(multipart_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"]
        .as_str()
        .unwrap()
        .contains("clip"));
    assert!(app.calls.all().is_empty());
}

#[tokio::test]
async fn test_create_clip_with_blank_game_is_invalid() {
    let app = test_app(empty_db());
    let body = multipart_body(
        &[("description", "ace"), ("game", "  "), ("username", "kaz")],
        Some(b"\x00\x00\x00\x18ftypmp42"),
    );

    let response = app.router.oneshot(multipart_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.calls.all().is_empty());
}

#[tokio::test]
async fn test_create_clip_unknown_uploader_compensates_asset() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();
    let app = test_app(db);
    let body = multipart_body(
        &[
            ("description", "ace"),
            ("game", "Valorant"),
            ("username", "nobody"),
            ("tags", "ace clutch"),
        ],
        Some(b"\x00\x00\x00\x18ftypmp42"),
    );

    let response = app.router.oneshot(multipart_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json_body(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("nobody"), "unexpected message: {error}");

    let calls = app.calls.all();
    assert_eq!(calls.len(), 3, "unexpected calls: {calls:?}");
    assert!(calls[0].starts_with("upload "));
    assert!(calls[0].ends_with("/ace.mp4"));
    assert!(calls[1].starts_with("create_asset "));
    assert_eq!(calls[2], "delete_asset asset1");
}

#[tokio::test]
async fn test_delete_clip_requires_id() {
    let app = test_app(empty_db());

    let response = app
        .router
        .oneshot(form_request("/clips/delete", "id="))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.calls.all().is_empty());
}

#[tokio::test]
async fn test_create_user_rejects_malformed_email() {
    let app = test_app(empty_db());

    let response = app
        .router
        .oneshot(form_request("/users/new", "username=kaz&email=not-an-email"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_without_signature_is_rejected() {
    let app = test_app(empty_db());
    let body = r#"{"type":"video.asset.ready","data":{"passthrough":"t1","playback_ids":[{"id":"p1"}]}}"#;

    let response = app.router.oneshot(webhook_request(None, body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_with_forged_signature_is_rejected() {
    let app = test_app(empty_db());
    let body = r#"{"type":"video.asset.ready","data":{"passthrough":"t1","playback_ids":[{"id":"p1"}]}}"#;
    let forged = sign(r#"{"type":"video.asset.ready"}"#);

    let response = app
        .router
        .oneshot(webhook_request(Some(forged), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signed_webhook_for_other_event_is_accepted() {
    let app = test_app(empty_db());
    let body = r#"{"type":"video.asset.created","data":{"id":"asset1"}}"#;

    let response = app
        .router
        .oneshot(webhook_request(Some(sign(body)), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

fn catalog_accepting_clip() -> DatabaseConnection {
    let now = Utc::now().with_timezone(&FixedOffset::east_opt(0).unwrap());
    MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[user::Model {
            id: "u1".to_string(),
            username: "kaz".to_string(),
            email: "kaz@lostsons.tv".to_string(),
        }]])
        .append_query_results([[game::Model {
            id: "g1".to_string(),
            name: "Valorant".to_string(),
        }]])
        .append_query_results([[clip::Model {
            id: "c1".to_string(),
            playback_id: "play1".to_string(),
            asset_id: "asset1".to_string(),
            upload_id: "token1".to_string(),
            date_uploaded: now,
            user_id: "u1".to_string(),
            game_id: "g1".to_string(),
            description: "ace".to_string(),
            ready_at: None,
        }]])
        .append_query_results([[tag::Model {
            id: "t1".to_string(),
            tag_name: "clutch".to_string(),
        }]])
        .append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
        ])
        .into_connection()
}

#[tokio::test]
async fn test_create_clip_returns_catalog_view() {
    let app = test_app(catalog_accepting_clip());
    let body = multipart_body(
        &[
            ("description", "ace"),
            ("game", "Valorant"),
            ("username", "kaz"),
            ("tags", "clutch"),
        ],
        Some(b"\x00\x00\x00\x18ftypmp42"),
    );

    let response = app.router.oneshot(multipart_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["asset_id"], "asset1");
    assert_eq!(json["data"]["playback_id"], "play1");
    assert_eq!(json["data"]["game"], "Valorant");
    assert_eq!(json["data"]["uploader"], "kaz");
    assert_eq!(json["data"]["tags"], serde_json::json!(["clutch"]));
    assert_eq!(json["data"]["ready"], false);

    let calls = app.calls.all();
    assert_eq!(calls.len(), 2, "unexpected calls: {calls:?}");
    assert!(calls[0].starts_with("upload "));
    assert!(calls[1].starts_with("create_asset "));
}

#[tokio::test]
async fn test_oversized_upload_is_rejected_before_any_step() {
    let app = test_app_with_limit(empty_db(), 1024);
    let body = multipart_body(
        &[("description", "ace"), ("game", "Valorant"), ("username", "kaz")],
        Some(&[0_u8; 4096]),
    );

    let response = app.router.oneshot(multipart_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
    assert!(app.calls.all().is_empty());
}

#[tokio::test]
async fn test_signed_ready_event_patches_pending_clip() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();
    let TestApp { router, calls, db } = test_app(db);
    let body = r#"{"type":"video.asset.ready","data":{"id":"asset1","passthrough":"token1","playback_ids":[{"id":"play1"}]}}"#;

    let response = router
        .oneshot(webhook_request(Some(sign(body)), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    drop(response);
    assert!(calls.all().is_empty());

    let sqls = executed_sql(db);
    assert_eq!(sqls.len(), 1);
    assert!(sqls[0].starts_with(r#"UPDATE "clips""#));
    assert!(sqls[0].contains(r#""upload_id" = $"#));
    assert!(sqls[0].contains(r#""ready_at" IS NULL"#));
}
