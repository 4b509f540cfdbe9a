//! Integration tests for the streaming endpoints.
//!
//! Most tests drive the Axum `Router` directly via `tower::ServiceExt`
//! without a TCP server. The disconnect and bind tests use a real socket
//! because only a real connection can go away underneath a response.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, BodyDataStream, Bytes};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{Request, Response, StatusCode};
use futures::StreamExt;
use lifecast_core::{ServerConfig, SimulationEngine, ViewerCounter, spawn_producer};
use lifecast_observer::server::{ServerError, bind, serve};
use lifecast_observer::{AppState, build_router};
use lifecast_render::{Frame, SvgEncoder};
use lifecast_world::Grid;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tower::ServiceExt;

const WAIT: Duration = Duration::from_secs(5);

async fn get(state: &Arc<AppState>, uri: &str) -> Response<Body> {
    build_router(Arc::clone(state))
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn next_chunk(body: &mut BodyDataStream) -> Bytes {
    timeout(WAIT, body.next()).await.unwrap().unwrap().unwrap()
}

fn frame(payload: &'static str) -> Arc<Frame> {
    Arc::new(Frame::new("image/svg+xml", payload))
}

fn contains(haystack: &[u8], needle: &str) -> bool {
    String::from_utf8_lossy(haystack).contains(needle)
}

#[tokio::test]
async fn index_serves_landing_page() {
    let state = Arc::new(AppState::default());
    let response = get(&state, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(contains(&body, r#"src="/game.svg""#));
    assert!(contains(&body, r#"src="/viewers.svg""#));
}

#[tokio::test]
async fn unknown_path_is_json_404() {
    let state = Arc::new(AppState::default());
    let response = get(&state, "/nope").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], 404);
    assert_eq!(json["error"], "not found: /nope");
}

#[tokio::test]
async fn game_stream_sets_multipart_headers_and_joins() {
    let state = Arc::new(AppState::default());
    let response = get(&state, "/game.svg").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CONTENT_TYPE],
        "multipart/x-mixed-replace; boundary=BOUNDARY"
    );
    assert_eq!(response.headers()[CACHE_CONTROL], "no-cache");
    assert_eq!(state.game.viewer_count(), 1);
    assert_eq!(state.viewers.viewer_count(), 0);

    drop(response);
    assert_eq!(state.game.viewer_count(), 0);
}

#[tokio::test]
async fn published_frame_arrives_as_one_part() {
    let state = Arc::new(AppState::default());
    let mut body = get(&state, "/game.svg").await.into_body().into_data_stream();

    state.game.publish(frame("<svg>one</svg>"));
    let part = next_chunk(&mut body).await;
    assert_eq!(
        part.as_ref(),
        b"\r\n--BOUNDARY\r\nContent-Type: image/svg+xml\r\nContent-Length: 14\r\n\r\n<svg>one</svg>"
    );

    state.game.publish(frame("<svg>two</svg>"));
    assert!(contains(&next_chunk(&mut body).await, "<svg>two</svg>"));
}

#[tokio::test]
async fn concurrent_viewers_receive_the_same_frame() {
    let state = Arc::new(AppState::default());
    let mut first = get(&state, "/game.svg").await.into_body().into_data_stream();
    let mut second = get(&state, "/game.svg").await.into_body().into_data_stream();
    assert_eq!(state.game.viewer_count(), 2);

    let report = state.game.publish(frame("<svg>shared</svg>"));
    assert_eq!(report.delivered, 2);

    assert_eq!(next_chunk(&mut first).await, next_chunk(&mut second).await);
}

#[tokio::test]
async fn shutdown_ends_streams_and_refuses_new_ones() {
    let state = Arc::new(AppState::default());
    let mut body = get(&state, "/viewers.svg").await.into_body().into_data_stream();
    assert_eq!(state.viewers.viewer_count(), 1);

    state.shutdown.cancel();
    assert!(timeout(WAIT, body.next()).await.unwrap().is_none());
    assert_eq!(state.viewers.viewer_count(), 0);

    let refused = get(&state, "/game.svg").await;
    assert_eq!(refused.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(state.game.viewer_count(), 0);
}

#[tokio::test]
async fn simulation_frames_reach_the_viewer() {
    let state = Arc::new(AppState::default());
    let engine = SimulationEngine::new(
        Grid::random(16, 12, 30, 5).unwrap(),
        Arc::clone(&state.game),
        Box::new(SvgEncoder::new(NonZeroU32::new(5).unwrap())),
        Duration::from_millis(50),
    );
    let stats = engine.stats();
    let engine_task = spawn_producer(engine, state.shutdown.clone());

    let mut body = get(&state, "/game.svg").await.into_body().into_data_stream();
    let part = next_chunk(&mut body).await;

    assert!(contains(&part, "Content-Type: image/svg+xml\r\n"));
    assert!(contains(&part, r#"<svg width="80" height="60""#));
    assert!(stats.generations() >= 1);

    state.shutdown.cancel();
    engine_task.await.unwrap();
}

#[tokio::test]
async fn viewer_count_follows_game_viewers() {
    let state = Arc::new(AppState::default());
    let counter = ViewerCounter::new(
        Arc::clone(&state.game),
        Arc::clone(&state.viewers),
        Duration::from_secs(1),
    );
    let counter_task = spawn_producer(counter, state.shutdown.clone());
    tokio::task::yield_now().await;

    let game = get(&state, "/game.svg").await;
    let mut badge = get(&state, "/viewers.svg").await.into_body().into_data_stream();

    assert!(contains(&next_chunk(&mut badge).await, ">1</text>"));

    drop(game);
    let saw_zero = timeout(Duration::from_millis(1_500), async {
        loop {
            if contains(&next_chunk(&mut badge).await, ">0</text>") {
                break;
            }
        }
    })
    .await;
    assert!(saw_zero.is_ok());

    state.shutdown.cancel();
    counter_task.await.unwrap();
}

#[tokio::test]
async fn disconnected_client_leaves_the_hub() {
    let state = Arc::new(AppState::default());
    let config = ServerConfig {
        host: String::from("127.0.0.1"),
        port: 0,
    };
    let listener = bind(&config).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(serve(listener, Arc::clone(&state)));

    let mut client = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    client
        .write_all(b"GET /game.svg HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();

    timeout(WAIT, async {
        while state.game.viewer_count() == 0 {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    state.game.publish(frame("<svg>hello</svg>"));
    let mut received = Vec::new();
    timeout(WAIT, async {
        let mut buf = [0_u8; 1024];
        while !contains(&received, "<svg>hello</svg>") {
            let n = client.read(&mut buf).await.unwrap();
            assert!(n > 0, "server closed the stream early");
            received.extend_from_slice(buf.get(..n).unwrap());
        }
    })
    .await
    .unwrap();
    assert!(contains(&received, "multipart/x-mixed-replace; boundary=BOUNDARY"));
    assert!(contains(&received, "--BOUNDARY\r\n"));

    drop(client);
    timeout(WAIT, async {
        while state.game.viewer_count() > 0 {
            state.game.publish(frame("<svg>ping</svg>"));
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();

    state.shutdown.cancel();
    timeout(WAIT, server).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn bind_conflict_is_reported() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let config = ServerConfig {
        host: String::from("127.0.0.1"),
        port: taken.local_addr().unwrap().port(),
    };

    let result = bind(&config).await;
    assert!(matches!(result, Err(ServerError::Bind(_))));
}
