use std::time::Duration;

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use shared::domain::{ChoiceId, SlideId, UserId};
use tokio::{net::TcpListener, time::timeout};

use super::*;

#[derive(Clone)]
struct LiveServerState {
    frames: Arc<Mutex<Vec<String>>>,
}

async fn live_route(State(state): State<LiveServerState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_live_socket(socket, state))
}

/// Records every control frame and answers each with one vote event.
async fn handle_live_socket(mut socket: WebSocket, state: LiveServerState) {
    while let Some(Ok(message)) = socket.recv().await {
        if let WsMessage::Text(text) = message {
            state.frames.lock().await.push(text);
            let event = ChannelEvent::ChoicesSubmitted {
                slide_id: SlideId(1),
                voter_id: UserId(9),
                choice_ids: vec![ChoiceId(11)],
            };
            let payload = serde_json::to_string(&event).expect("encode event");
            if socket.send(WsMessage::Text(payload)).await.is_err() {
                break;
            }
        }
    }
}

async fn spawn_live_server() -> Result<(String, LiveServerState)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = LiveServerState {
        frames: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/live", get(live_route))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

#[tokio::test]
async fn round_trips_control_frames_and_inbound_events() {
    let (server_url, state) = spawn_live_server().await.expect("spawn server");
    let transport = SocketTransport::new(&server_url).expect("transport");

    transport.ensure_open().await.expect("open");
    let mut events = transport.subscribe_events();
    transport
        .send(ControlMessage::Subscribe {
            slide_id: SlideId(1),
        })
        .await
        .expect("send");

    let event = timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("event timeout")
        .expect("event");
    match event {
        ChannelEvent::ChoicesSubmitted {
            slide_id,
            voter_id,
            choice_ids,
        } => {
            assert_eq!(slide_id, SlideId(1));
            assert_eq!(voter_id, UserId(9));
            assert_eq!(choice_ids, vec![ChoiceId(11)]);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    let frames = state.frames.lock().await;
    assert_eq!(frames.len(), 1);
    let frame: ControlMessage = serde_json::from_str(&frames[0]).expect("decode frame");
    assert_eq!(
        frame,
        ControlMessage::Subscribe {
            slide_id: SlideId(1)
        }
    );
}

#[tokio::test]
async fn ensure_open_reuses_the_live_connection() {
    let (server_url, state) = spawn_live_server().await.expect("spawn server");
    let transport = SocketTransport::new(&server_url).expect("transport");

    transport.ensure_open().await.expect("first open");
    transport.ensure_open().await.expect("second open");
    let mut events = transport.subscribe_events();
    transport
        .send(ControlMessage::Subscribe {
            slide_id: SlideId(2),
        })
        .await
        .expect("send");

    let _ = timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("server reply timeout");

    assert_eq!(state.frames.lock().await.len(), 1);
}

#[tokio::test]
async fn send_without_an_open_connection_fails() {
    let transport = SocketTransport::new("http://127.0.0.1:1").expect("transport");

    let err = transport
        .send(ControlMessage::Subscribe {
            slide_id: SlideId(1),
        })
        .await
        .expect_err("must fail");
    assert!(
        err.to_string().contains("not open"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn rejects_a_server_url_without_an_http_scheme() {
    assert!(SocketTransport::new("ftp://example.invalid").is_err());
}
