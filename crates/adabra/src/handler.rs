//! Per-connection WebSocket handler: the join handshake, authority
//! checks, and the read/write loop tying one browser tab to its room
//! actor.
//!
//! Each accepted connection gets its own Tokio task. The first message
//! must be `joinRoom` or `rejoinRoom` (§4.2); everything after that is
//! checked against the sender's [`Session`] role before it's dispatched
//! to the room actor.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use rand::distr::Alphanumeric;
use rand::Rng;
use tokio::sync::mpsc;

use adabra_protocol::{ClientEvent, Codec, JsonCodec, PlayerId, ProtocolError, RoomCode, ServerEvent};
use adabra_room::{ConnId, RoomHandle};
use adabra_session::{check_authority, Role, Session, SessionError};

use crate::server::AppState;
use crate::time::now_ms;
use crate::AdabraError;

/// Length of a server-generated `playerId`, used only when a `joinRoom`
/// arrives without one (the normal path has the client generate and
/// persist its own).
const GENERATED_PLAYER_ID_LEN: usize = 16;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    if let Err(err) = run_connection(socket, state).await {
        tracing::debug!(error = %err, "connection ended with an error");
    }
}

/// Drives one connection from the join handshake to disconnect. Mirrors
/// the teacher's `handle_connection`: every fallible step is threaded
/// through `AdabraError` via `?` rather than swallowed locally.
async fn run_connection(socket: WebSocket, state: AppState) -> Result<(), AdabraError> {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let codec = JsonCodec;

    let Some(Ok(Message::Text(text))) = ws_receiver.next().await else {
        return Err(ProtocolError::InvalidMessage("connection closed before joinRoom".into()).into());
    };
    let first_event: ClientEvent = codec.decode(text.as_bytes())?;

    let (room_code, player_id, host_key) = match first_event {
        ClientEvent::JoinRoom { room_code, host_key, player_id } => {
            let player_id = player_id.unwrap_or_else(generate_player_id);
            (RoomCode::normalize(&room_code), player_id, host_key)
        }
        ClientEvent::RejoinRoom { room_code, player_id } => {
            (RoomCode::normalize(&room_code), player_id, None)
        }
        _ => {
            return Err(ProtocolError::InvalidMessage("first message must be joinRoom or rejoinRoom".into()).into());
        }
    };

    let Some(room) = state.rooms.get(&room_code) else {
        let err: SessionError = SessionError::RoomNotFound(room_code.0.clone());
        let _ = send_one(&mut ws_sender, &codec, &ServerEvent::ErrorMsg { message: err.to_string() }).await;
        return Err(err.into());
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let error_tx = tx.clone();

    let conn_id = match room.join(player_id.clone(), host_key, tx, now_ms()).await {
        Ok(conn_id) => conn_id,
        Err(err) => {
            let _ = send_one(&mut ws_sender, &codec, &ServerEvent::ErrorMsg { message: err.to_string() }).await;
            return Err(err.into());
        }
    };

    // `join` enqueues `joinedRoom` first on success; a kicked `playerId`
    // instead gets a single `kicked` reply and was never registered with
    // the room actor, so this connection must detach immediately rather
    // than standing up a session.
    let Some(joined) = rx.recv().await else { return Ok(()) };
    if matches!(joined, ServerEvent::Kicked { .. }) {
        let _ = send_one(&mut ws_sender, &codec, &joined).await;
        return Ok(());
    }
    let is_host = matches!(joined, ServerEvent::JoinedRoom { is_host: true, .. });
    if !send_one(&mut ws_sender, &codec, &joined).await {
        let _ = room.leave(conn_id).await;
        return Ok(());
    }

    let session = Session::new(
        room_code,
        player_id.clone(),
        if is_host { Role::Host } else { Role::Player },
    );

    let writer = tokio::spawn(run_writer(ws_sender, rx, codec));

    read_loop(&mut ws_receiver, &room, conn_id, &session, &codec, &error_tx).await;

    let _ = room.leave(conn_id).await;
    writer.abort();
    tracing::info!(room_code = %session.room_code, player_id = %session.player_id, "connection closed");
    Ok(())
}

async fn run_writer(
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
    codec: JsonCodec,
) {
    while let Some(event) = rx.recv().await {
        if !send_one(&mut ws_sender, &codec, &event).await {
            break;
        }
    }
}

async fn read_loop(
    ws_receiver: &mut SplitStream<WebSocket>,
    room: &RoomHandle,
    conn_id: ConnId,
    session: &Session,
    codec: &JsonCodec,
    error_tx: &mpsc::UnboundedSender<ServerEvent>,
) {
    while let Some(Ok(msg)) = ws_receiver.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let event: ClientEvent = match codec.decode(text.as_bytes()) {
            Ok(event) => event,
            Err(err) => {
                let _ = error_tx.send(ServerEvent::ErrorMsg { message: err.to_string() });
                continue;
            }
        };

        if matches!(event, ClientEvent::JoinRoom { .. } | ClientEvent::RejoinRoom { .. }) {
            // Already joined for the life of this connection; a repeat is a no-op.
            continue;
        }

        if let Err(err) = check_authority(session, &event) {
            let _ = error_tx.send(ServerEvent::ErrorMsg { message: err.to_string() });
            continue;
        }

        if room.dispatch(conn_id, event, now_ms()).await.is_err() {
            break;
        }
    }
}

async fn send_one(
    ws_sender: &mut SplitSink<WebSocket, Message>,
    codec: &JsonCodec,
    event: &ServerEvent,
) -> bool {
    let Ok(bytes) = codec.encode(event) else { return false };
    let Ok(text) = String::from_utf8(bytes) else { return false };
    ws_sender.send(Message::Text(text.into())).await.is_ok()
}

fn generate_player_id() -> PlayerId {
    let id: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(GENERATED_PLAYER_ID_LEN)
        .map(char::from)
        .collect();
    PlayerId(id)
}
