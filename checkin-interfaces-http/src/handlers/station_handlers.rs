use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use checkin_application::commands::station_commands::{self, ModeChange, SessionChange};
use checkin_application::ops::BoardSnapshot;
use checkin_application::queries::station_queries::{self, ModeView};
use checkin_application::AppState;
use checkin_domain::OperatorSession;

use crate::error::HttpError;
use crate::middleware::guard_station;

pub async fn get_board(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<BoardSnapshot>, HttpError> {
    guard_station(&state, &headers, peer).await?;
    Ok(Json(station_queries::board(&state).await))
}

pub async fn get_mode(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<ModeView>, HttpError> {
    guard_station(&state, &headers, peer).await?;
    Ok(Json(station_queries::mode(&state)))
}

pub async fn put_mode(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<ModeChange>,
) -> Result<Json<BoardSnapshot>, HttpError> {
    guard_station(&state, &headers, peer).await?;
    let board = station_commands::set_mode(&state, payload).await?;
    Ok(Json(board))
}

pub async fn put_session(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<SessionChange>,
) -> Result<Json<OperatorSession>, HttpError> {
    let ip = guard_station(&state, &headers, peer).await?;
    Ok(Json(station_commands::set_session(
        &state,
        &ip.to_string(),
        payload,
    )))
}

pub async fn stream(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    let ip = guard_station(&state, &headers, peer).await?;
    Ok(ws
        .on_upgrade(move |socket| forward_board(socket, state, ip.to_string()))
        .into_response())
}

/// Sends the current snapshot, then every update, until either side closes.
async fn forward_board(socket: WebSocket, state: AppState, client: String) {
    let (mut sender, mut receiver) = socket.split();
    let mut updates = state.board.subscribe();
    info!(client = %client, "board stream connected");

    let current = station_queries::board(&state).await;
    if !send_snapshot(&mut sender, &current).await {
        return;
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(snapshot) => {
                    if !send_snapshot(&mut sender, &snapshot).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "board stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => break,
                Err(err) => {
                    warn!(error = %err, "board stream error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    info!(client = %client, "board stream disconnected");
}

async fn send_snapshot<S>(sender: &mut S, snapshot: &BoardSnapshot) -> bool
where
    S: SinkExt<Message> + Unpin,
{
    match serde_json::to_string(snapshot) {
        Ok(payload) => sender.send(Message::Text(payload)).await.is_ok(),
        Err(err) => {
            warn!(error = %err, "board snapshot not serializable");
            false
        }
    }
}
