use axum::routing::{delete, get, post};
use axum::Router;

use checkin_application::AppState;

use crate::handlers::{
    access_handlers, admin_handlers, camera_handlers, ops_handlers, scan_handlers,
    station_handlers,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/station/board", get(station_handlers::get_board))
        .route("/v1/station/stream", get(station_handlers::stream))
        .route(
            "/v1/station/mode",
            get(station_handlers::get_mode).put(station_handlers::put_mode),
        )
        .route(
            "/v1/station/session",
            axum::routing::put(station_handlers::put_session),
        )
        .route("/v1/scan/manual", post(scan_handlers::manual_scan))
        .route("/v1/scan/decoded", post(scan_handlers::decoded_scan))
        .route("/v1/camera", get(camera_handlers::get_camera))
        .route("/v1/camera/select", post(camera_handlers::select_camera))
        .route("/v1/camera/retry", post(camera_handlers::retry_camera))
        .route(
            "/v1/camera/visibility",
            post(camera_handlers::camera_visibility),
        )
        .route("/v1/access/check", get(access_handlers::check_access))
        .route("/v1/access/requests", post(access_handlers::submit_request))
        .route("/v1/admin/requests", get(admin_handlers::list_requests))
        .route(
            "/v1/admin/requests/:id/approve",
            post(admin_handlers::approve_request),
        )
        .route(
            "/v1/admin/requests/:id/reject",
            post(admin_handlers::reject_request),
        )
        .route(
            "/v1/admin/whitelist",
            get(admin_handlers::list_whitelist).post(admin_handlers::add_whitelist),
        )
        .route(
            "/v1/admin/whitelist/:ip",
            delete(admin_handlers::remove_whitelist),
        )
        .route("/v1/ops/health/live", get(ops_handlers::health_live))
        .route("/v1/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/v1/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
