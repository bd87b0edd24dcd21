//! Pipeline channel against a minimal in-process Socket.IO server.

use futures_util::{SinkExt, StreamExt};
use pipeline_panel::backend::types::{FinishedEvent, RunAction};
use pipeline_panel::backend::ws::{ChannelEvent, ChannelHandle, PipelineChannel};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

type ServerWs = WebSocketStream<TcpStream>;

async fn next_text(ws: &mut ServerWs) -> String {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return text,
            Some(Ok(_)) => continue,
            other => panic!("server socket ended: {:?}", other),
        }
    }
}

async fn send(ws: &mut ServerWs, text: &str) {
    ws.send(Message::Text(text.to_string())).await.unwrap();
}

async fn recv_event(rx: &mut mpsc::Receiver<ChannelEvent>) -> ChannelEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for channel event")
        .expect("channel event stream closed")
}

#[tokio::test]
async fn test_handshake_events_and_run_request() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        send(
            &mut ws,
            r#"0{"sid":"s1","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#,
        )
        .await;
        assert_eq!(next_text(&mut ws).await, "40");
        send(&mut ws, r#"40{"sid":"n1"}"#).await;

        send(&mut ws, "2").await;
        assert_eq!(next_text(&mut ws).await, "3");

        send(&mut ws, r#"42["status",{"message":"Iniciando etapa: clean..."}]"#).await;
        assert_eq!(next_text(&mut ws).await, r#"42["run_clean"]"#);

        send(
            &mut ws,
            r#"42["pipeline_finished",{"message":"Proceso clean completado.","last_execution_date":"2024-01-01","action":"clean"}]"#,
        )
        .await;
        ws
    });

    let url = format!("ws://{}/socket.io/?EIO=4&transport=websocket", addr);
    let (events_tx, mut events_rx) = mpsc::channel(16);
    let handle = ChannelHandle::spawn(
        PipelineChannel::new(&url, Duration::from_millis(100)),
        events_tx,
    );

    assert_eq!(recv_event(&mut events_rx).await, ChannelEvent::Connected);
    match recv_event(&mut events_rx).await {
        ChannelEvent::Status(ev) => assert_eq!(ev.message, "Iniciando etapa: clean..."),
        other => panic!("expected status, got {:?}", other),
    }

    handle.sender().send(RunAction::Clean).await.unwrap();

    assert_eq!(
        recv_event(&mut events_rx).await,
        ChannelEvent::Finished(FinishedEvent {
            last_execution_date: Some("2024-01-01".to_string()),
            action: Some("clean".to_string()),
            message: Some("Proceso clean completado.".to_string()),
        })
    );

    let _server_ws = server.await.unwrap();

    // Teardown: nothing is delivered once the subscription is dropped.
    drop(handle);
    let closed = tokio::time::timeout(Duration::from_secs(5), events_rx.recv())
        .await
        .expect("event stream should close after teardown");
    assert_eq!(closed, None);
}

#[tokio::test]
async fn test_reports_disconnect_and_reconnects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        for sid in ["a", "b"] {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            send(&mut ws, &format!(r#"0{{"sid":"{}","pingInterval":25000,"pingTimeout":20000}}"#, sid)).await;
            assert_eq!(next_text(&mut ws).await, "40");
            send(&mut ws, r#"40{"sid":"x"}"#).await;
            if sid == "a" {
                ws.close(None).await.unwrap();
            } else {
                return ws;
            }
        }
        unreachable!()
    });

    let url = format!("ws://{}/socket.io/?EIO=4&transport=websocket", addr);
    let (events_tx, mut events_rx) = mpsc::channel(16);
    let _handle = ChannelHandle::spawn(
        PipelineChannel::new(&url, Duration::from_millis(50)),
        events_tx,
    );

    assert_eq!(recv_event(&mut events_rx).await, ChannelEvent::Connected);
    assert!(matches!(recv_event(&mut events_rx).await, ChannelEvent::Disconnected(_)));
    assert_eq!(recv_event(&mut events_rx).await, ChannelEvent::Connected);

    let _server_ws = server.await.unwrap();
}
