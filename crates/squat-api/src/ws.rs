//! Live analysis over WebSocket.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use squat_analysis::ErrorKind;
use squat_models::{PoseFrame, RawFrame, WsClientMessage, WsErrorCode, WsMessage};
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::handlers::analysis::run_analysis;
use crate::metrics;
use crate::state::AppState;

const ENDPOINT: &str = "live";

/// Global counter for active WebSocket connections.
static ACTIVE_WS_CONNECTIONS: AtomicI64 = AtomicI64::new(0);

const WS_SEND_BUFFER_SIZE: usize = 32;
const WS_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Most recent frames received on one connection.
///
/// Owned by a single socket task; nothing here is shared between clients.
#[derive(Debug)]
pub struct LiveSession {
    window: VecDeque<RawFrame>,
    capacity: usize,
}

impl LiveSession {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a frame, evicting the oldest once full, and return the frames
    /// to analyse.
    pub fn push(&mut self, frame: RawFrame) -> Vec<RawFrame> {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(frame);
        self.window.iter().cloned().collect()
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

/// Live analysis endpoint.
///
/// GET /ws/live
pub async fn ws_live(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    metrics::record_ws_connection(ENDPOINT);

    ws.on_upgrade(|socket| async move {
        let count = ACTIVE_WS_CONNECTIONS.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_ws_active_connections(count);

        handle_live_socket(socket, state).await;

        let count = ACTIVE_WS_CONNECTIONS.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_ws_active_connections(count);
    })
}

/// Send a WebSocket message with backpressure handling.
async fn send_ws_message(tx: &mpsc::Sender<Message>, msg: WsMessage) -> bool {
    let json = match serde_json::to_string(&msg) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "Failed to serialize WebSocket message");
            return false;
        }
    };
    let message_type = msg.message_type();

    let sent = match tx.try_send(Message::Text(json)) {
        Ok(_) => true,
        Err(mpsc::error::TrySendError::Full(message)) => {
            debug!("WebSocket send buffer full, applying backpressure");
            tx.send(message).await.is_ok()
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    };
    if sent {
        metrics::record_ws_message_sent(ENDPOINT, message_type.as_str());
    }
    sent
}

async fn handle_live_socket(socket: WebSocket, state: AppState) {
    let (ws_sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(WS_SEND_BUFFER_SIZE);

    let send_task = tokio::spawn(async move {
        let mut ws_sender = ws_sender;
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    let mut session = LiveSession::new(state.config.live_window_frames);
    info!(window = state.config.live_window_frames, "Live session opened");

    if send_ws_message(&tx, WsMessage::connected()).await {
        let idle_timeout = state.config.ws_idle_timeout;
        let mut heartbeat = interval(WS_HEARTBEAT_INTERVAL);
        let mut last_activity = Instant::now();

        loop {
            tokio::select! {
                client_msg = receiver.next() => {
                    last_activity = Instant::now();
                    match client_msg {
                        Some(Ok(Message::Text(text))) => {
                            metrics::record_ws_message_received(ENDPOINT);
                            let reply = handle_text(&state, &mut session, &text).await;
                            if let Some(reply) = reply {
                                if !send_ws_message(&tx, reply).await {
                                    warn!("WebSocket send failed, client disconnected");
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Binary(_))) => {
                            let reply = WsMessage::error(
                                WsErrorCode::InvalidMessage,
                                "Binary messages are not supported",
                            );
                            if !send_ws_message(&tx, reply).await {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Client closed connection");
                            break;
                        }
                        Some(Ok(_)) => {} // Ping/Pong
                        Some(Err(e)) => {
                            warn!(error = %e, "WebSocket receive error");
                            break;
                        }
                    }
                }
                _ = heartbeat.tick() => {
                    if last_activity.elapsed() > idle_timeout {
                        info!(idle_secs = last_activity.elapsed().as_secs(), "Closing idle live session");
                        break;
                    }
                    if last_activity.elapsed() > WS_HEARTBEAT_INTERVAL / 2
                        && tx.send(Message::Ping(Vec::new())).await.is_err()
                    {
                        warn!("Heartbeat failed, client disconnected");
                        break;
                    }
                }
            }
        }
    }

    drop(tx);
    let _ = send_task.await;
    info!(buffered = session.len(), "Live session closed");
}

/// Handle one text message; `None` means nothing is sent back.
async fn handle_text(state: &AppState, session: &mut LiveSession, text: &str) -> Option<WsMessage> {
    let message: WsClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            debug!(error = %e, "Unparseable live message");
            return Some(WsMessage::error(
                WsErrorCode::InvalidMessage,
                format!("Invalid message: {}", e),
            ));
        }
    };

    let frames = match message {
        WsClientMessage::Reset => {
            session.reset();
            debug!("Live window reset");
            return None;
        }
        WsClientMessage::ProcessFrame { landmarks } => {
            if landmarks.is_empty() {
                return Some(WsMessage::error(
                    WsErrorCode::NoPoseData,
                    "No pose detected in frame",
                ));
            }
            // Rejected frames never enter the window
            if let Err(e) = PoseFrame::from_landmarks(&landmarks) {
                return Some(WsMessage::error(
                    WsErrorCode::MalformedPoseData,
                    format!("Frame rejected: {}", e),
                ));
            }
            session.push(landmarks)
        }
        WsClientMessage::ProcessSequence { frames } => {
            if frames.len() > state.config.max_frames {
                return Some(WsMessage::error(
                    WsErrorCode::InvalidMessage,
                    format!(
                        "{} frames submitted, at most {} are accepted",
                        frames.len(),
                        state.config.max_frames
                    ),
                ));
            }
            frames
        }
    };

    Some(match run_analysis(state, frames, ENDPOINT).await {
        Ok(response) => WsMessage::pose_analysis(response),
        Err(e) => error_envelope(&e, state.config.is_production()),
    })
}

fn error_envelope(error: &ApiError, production: bool) -> WsMessage {
    WsMessage::error(error_code(error), error.client_detail(production))
}

fn error_code(error: &ApiError) -> WsErrorCode {
    match error {
        ApiError::Analysis(e) => match e.kind() {
            ErrorKind::NoPoseData => WsErrorCode::NoPoseData,
            ErrorKind::MalformedPoseData => WsErrorCode::MalformedPoseData,
            ErrorKind::Internal => WsErrorCode::AnalysisFailed,
        },
        ApiError::Validation(_) => WsErrorCode::MalformedPoseData,
        ApiError::Timeout | ApiError::Internal(_) => WsErrorCode::AnalysisFailed,
        ApiError::BadRequest(_) | ApiError::PayloadTooLarge(_) | ApiError::RateLimited => {
            WsErrorCode::InvalidMessage
        }
    }
}
