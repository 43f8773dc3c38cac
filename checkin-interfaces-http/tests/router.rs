use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tower::ServiceExt;

use checkin_application::{AppState, StationPorts};
use checkin_domain::{
    AccessBook, AccessRepository, AttendeeCode, AttendeeStore, IdentitySnapshot, RuntimeConfig,
    ScanEvent, StatusSnapshot,
};
use checkin_interfaces_http::build_router;

const TOKEN: &str = "admin-secret";

#[derive(Default)]
struct SheetFake {
    hold: Option<(Arc<Notify>, Arc<Notify>)>,
    submitted: Mutex<Vec<ScanEvent>>,
}

#[async_trait]
impl AttendeeStore for SheetFake {
    async fn fetch_status(&self, code: &AttendeeCode) -> anyhow::Result<StatusSnapshot> {
        if let Some((entered, release)) = &self.hold {
            entered.notify_one();
            release.notified().await;
        }
        if code.as_str() == "MISSING" {
            return Err(anyhow!("not found"));
        }
        Ok(StatusSnapshot::default())
    }

    async fn fetch_identity(&self, _code: &AttendeeCode) -> anyhow::Result<IdentitySnapshot> {
        Ok(IdentitySnapshot {
            firstname: "Jane".to_string(),
            lastname: "Doe".to_string(),
            email: "j@x.com".to_string(),
            timestamp: "2025-05-06".to_string(),
        })
    }

    async fn submit(&self, event: &ScanEvent) -> anyhow::Result<()> {
        self.submitted.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
struct BookFake {
    saved: Mutex<Option<AccessBook>>,
}

#[async_trait]
impl AccessRepository for BookFake {
    async fn load(&self) -> anyhow::Result<AccessBook> {
        Ok(self.saved.lock().unwrap().clone().unwrap_or_default())
    }

    async fn save(&self, book: &AccessBook) -> anyhow::Result<()> {
        *self.saved.lock().unwrap() = Some(book.clone());
        Ok(())
    }
}

fn config() -> RuntimeConfig {
    RuntimeConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        admin_token: Some(TOKEN.to_string()),
        status_url: "http://sheet.invalid/status".to_string(),
        identity_url: "http://sheet.invalid/identity".to_string(),
        request_timeout_seconds: 5,
        step_timeout_seconds: 5,
        lock_safety_seconds: 15,
        camera_enabled: false,
        camera_max_attempts: 3,
        camera_restart_delay_seconds: 2,
        zbarcam_path: "zbarcam".to_string(),
        video_sysfs_dir: "/sys/class/video4linux".to_string(),
        access_book_path: "access.json".to_string(),
        enforce_whitelist: true,
        trust_forwarded_for: false,
        access_request_limit: 5,
        access_request_window_seconds: 600,
        max_body_bytes: 64 * 1024,
    }
}

fn state_with(store: Arc<SheetFake>) -> AppState {
    AppState::new(
        config(),
        StationPorts {
            store,
            camera: None,
            access_repo: Arc::new(BookFake::default()),
        },
        AccessBook::default(),
    )
}

fn app(state: &AppState, peer: [u8; 4]) -> Router {
    build_router(state.clone()).layer(MockConnectInfo(SocketAddr::from((peer, 40000))))
}

const LOCAL: [u8; 4] = [127, 0, 0, 1];
const TABLET: [u8; 4] = [10, 0, 0, 5];

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .expect("request")
}

fn send_json(method: &str, uri: &str, body: Value, admin: bool) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if admin {
        builder = builder.header("Authorization", format!("Bearer {}", TOKEN));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn manual_scan_returns_rendered_outcome() {
    let store = Arc::new(SheetFake::default());
    let state = state_with(Arc::clone(&store));

    let (status, _) = call(
        app(&state, LOCAL),
        send_json("PUT", "/v1/station/mode", json!({ "mode": "Goodie Bag" }), false),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        app(&state, LOCAL),
        send_json("POST", "/v1/scan/manual", json!({ "code": "A1-GB" }), false),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"]["name"], "Jane Doe");
    assert_eq!(body["view"]["goodieBag"], "Not received yet");
    assert_eq!(body["submission"]["status"], "sent");
    assert_eq!(store.submitted.lock().unwrap()[0].mode.as_str(), "Goodie Bag");

    let (status, board) = call(app(&state, LOCAL), get("/v1/station/board")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["inputEnabled"], true);
    assert_eq!(board["mode"], "Goodie Bag");
}

#[tokio::test]
async fn invalid_code_is_bad_request() {
    let state = state_with(Arc::new(SheetFake::default()));
    let (status, body) = call(
        app(&state, LOCAL),
        send_json("POST", "/v1/scan/manual", json!({ "code": "<script>" }), false),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().expect("error").contains("invalid code"));
}

#[tokio::test]
async fn status_failure_still_returns_outcome() {
    let store = Arc::new(SheetFake::default());
    let state = state_with(Arc::clone(&store));
    let (status, body) = call(
        app(&state, LOCAL),
        send_json("POST", "/v1/scan/manual", json!({ "code": "MISSING" }), false),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"]["checkIn"], "Error: not found");
    assert_eq!(body["view"]["name"], "Unknown");
    assert_eq!(store.submitted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn busy_station_answers_conflict() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let store = Arc::new(SheetFake {
        hold: Some((Arc::clone(&entered), Arc::clone(&release))),
        ..SheetFake::default()
    });
    let state = state_with(store);

    let first = tokio::spawn(call(
        app(&state, LOCAL),
        send_json("POST", "/v1/scan/manual", json!({ "code": "A1" }), false),
    ));
    entered.notified().await;

    let (status, body) = call(
        app(&state, LOCAL),
        send_json("POST", "/v1/scan/manual", json!({ "code": "B2" }), false),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, ack) = call(
        app(&state, LOCAL),
        send_json("POST", "/v1/scan/decoded", json!({ "text": "C3" }), false),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(ack["accepted"], false);

    release.notify_one();
    let (status, _) = first.await.expect("join");
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_device_must_request_access() {
    let state = state_with(Arc::new(SheetFake::default()));

    let (status, _) = call(app(&state, TABLET), get("/v1/station/board")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, check) = call(app(&state, TABLET), get("/v1/access/check")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["allowed"], false);

    let (status, request) = call(
        app(&state, TABLET),
        send_json(
            "POST",
            "/v1/access/requests",
            json!({ "name": "Front Desk", "email": "desk@example.com" }),
            false,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["ip"], "10.0.0.5");
    let id = request["id"].as_str().expect("id").to_string();

    let (status, _) = call(app(&state, TABLET), get("/v1/admin/requests")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, pending) = call(
        app(&state, TABLET),
        admin_get("/v1/admin/requests?status=pending"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().expect("list").len(), 1);

    let (status, approved) = call(
        app(&state, LOCAL),
        send_json(
            "POST",
            &format!("/v1/admin/requests/{}/approve", id),
            json!({}),
            true,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");

    let (status, _) = call(app(&state, TABLET), get("/v1/station/board")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn whitelist_admin_round_trip() {
    let state = state_with(Arc::new(SheetFake::default()));

    let (status, entry) = call(
        app(&state, LOCAL),
        send_json(
            "POST",
            "/v1/admin/whitelist",
            json!({ "ip": "10.0.0.9", "label": "Desk 9" }),
            true,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["label"], "Desk 9");

    let (_, list) = call(app(&state, LOCAL), admin_get("/v1/admin/whitelist")).await;
    assert_eq!(list.as_array().expect("list").len(), 1);

    let delete = Request::builder()
        .method("DELETE")
        .uri("/v1/admin/whitelist/10.0.0.9")
        .header("Authorization", format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .expect("request");
    let (status, _) = call(app(&state, LOCAL), delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn ops_endpoints() {
    let state = state_with(Arc::new(SheetFake::default()));

    let (status, _) = call(app(&state, TABLET), get("/v1/ops/health/live")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(app(&state, TABLET), get("/v1/ops/health/ready")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(app(&state, TABLET), get("/v1/ops/metrics/prometheus")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = app(&state, TABLET)
        .oneshot(admin_get("/v1/ops/metrics/prometheus"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");
    assert!(text.contains("checkin_scans_total 0"));
}

#[tokio::test]
async fn camera_routes_report_disabled_camera() {
    let state = state_with(Arc::new(SheetFake::default()));
    let (status, _) = call(app(&state, LOCAL), get("/v1/camera")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        app(&state, LOCAL),
        send_json("POST", "/v1/camera/retry", json!({}), false),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
