use super::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::{InitialState, Scenario};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

#[derive(Clone)]
struct CaptureState {
    tx: Arc<Mutex<Option<oneshot::Sender<(Option<String>, Value)>>>>,
    calls: Arc<AtomicUsize>,
}

impl CaptureState {
    fn new() -> (Self, oneshot::Receiver<(Option<String>, Value)>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Arc::new(Mutex::new(Some(tx))),
                calls: Arc::new(AtomicUsize::new(0)),
            },
            rx,
        )
    }
}

async fn capture_simulate(
    State(state): State<CaptureState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.calls.fetch_add(1, Ordering::SeqCst);
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send((content_type, body));
    }
    Json(json!({
        "healthy": [800000, 799500.5, 799100],
        "mild": [20000, 20250, 20400]
    }))
}

async fn serve(app: Router) -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

fn client_for(server_url: &str) -> SimulationClient {
    SimulationClient::new(&Settings::default().with_backend_url(server_url)).expect("client")
}

#[tokio::test]
async fn posts_documented_body_as_json() {
    let (state, body_rx) = CaptureState::new();
    let app = Router::new()
        .route("/simulate", post(capture_simulate))
        .with_state(state.clone());
    let server_url = serve(app).await.expect("spawn server");
    let client = client_for(&server_url);

    let result = client
        .simulate(&SimulationRequest::default())
        .await
        .expect("simulate");

    let (content_type, body) = body_rx.await.expect("captured body");
    assert!(content_type
        .as_deref()
        .is_some_and(|value| value.starts_with("application/json")));
    assert_eq!(
        body,
        json!({
            "population": 828000,
            "initial_state": [800000, 20000, 5000, 3000],
            "scenario": "peace",
            "sim_time": 365
        })
    );
    assert_eq!(result.top_level_keys(), vec!["healthy", "mild"]);
    assert_eq!(state.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn honours_path_prefix_in_backend_url() {
    let (state, body_rx) = CaptureState::new();
    let app = Router::new()
        .route("/api/simulate", post(capture_simulate))
        .with_state(state);
    let server_url = serve(app).await.expect("spawn server");
    let client = client_for(&format!("{server_url}/api"));
    assert!(client.simulate_url().as_str().ends_with("/api/simulate"));

    let request = SimulationRequest::new(
        1_000,
        InitialState::new(900, 50, 30, 20),
        Scenario::Crisis,
        30,
    )
    .expect("valid");
    client.simulate(&request).await.expect("simulate");

    let (_, body) = body_rx.await.expect("captured body");
    assert_eq!(body["scenario"], "crisis");
    assert_eq!(body["initial_state"], json!([900, 50, 30, 20]));
}

#[tokio::test]
async fn server_error_surfaces_reason_phrase() {
    let app = Router::new().route(
        "/simulate",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let server_url = serve(app).await.expect("spawn server");

    let err = client_for(&server_url)
        .simulate(&SimulationRequest::default())
        .await
        .expect_err("must fail");

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "Error: Internal Server Error");
}

#[tokio::test]
async fn backend_error_body_is_attached_as_detail() {
    let app = Router::new().route(
        "/simulate",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Invalid population size."})),
            )
        }),
    );
    let server_url = serve(app).await.expect("spawn server");

    let err = client_for(&server_url)
        .simulate(&SimulationRequest::default())
        .await
        .expect_err("must fail");

    assert!(matches!(
        &err,
        SubmitError::Backend { status: 400, detail: Some(detail), .. }
            if detail == "Invalid population size."
    ));
    assert_eq!(
        err.to_string(),
        "Error: Bad Request (Invalid population size.)"
    );
}

#[tokio::test]
async fn non_json_success_body_is_a_schema_error() {
    let app = Router::new().route("/simulate", post(|| async { "<html>ok</html>" }));
    let server_url = serve(app).await.expect("spawn server");

    let err = client_for(&server_url)
        .simulate(&SimulationRequest::default())
        .await
        .expect_err("must fail");

    assert!(matches!(err, SubmitError::Schema(_)), "unexpected: {err}");
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = client_for(&format!("http://{addr}"))
        .simulate(&SimulationRequest::default())
        .await
        .expect_err("must fail");

    match err {
        SubmitError::Transport(message) => assert!(!message.is_empty()),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_request_is_never_sent() {
    let (state, _body_rx) = CaptureState::new();
    let app = Router::new()
        .route("/simulate", post(capture_simulate))
        .with_state(state.clone());
    let server_url = serve(app).await.expect("spawn server");

    let request = SimulationRequest {
        population: 0,
        ..SimulationRequest::default()
    };
    let err = client_for(&server_url)
        .simulate(&request)
        .await
        .expect_err("must fail");

    assert!(err.is_input());
    assert_eq!(state.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ping_reads_welcome_message() {
    let app = Router::new().route(
        "/",
        get(|| async { Json(json!({"message": "Welcome to the Mental Health Simulation API!"})) }),
    );
    let server_url = serve(app).await.expect("spawn server");

    let message = client_for(&server_url).ping().await.expect("ping");
    assert_eq!(message, "Welcome to the Mental Health Simulation API!");
}

#[tokio::test]
async fn unconfigured_backend_reports_its_reason() {
    let backend = UnconfiguredBackend::new("invalid backend url 'nope'");
    let err = backend
        .simulate(&SimulationRequest::default())
        .await
        .expect_err("must fail");
    assert!(matches!(&err, SubmitError::Transport(message) if message.contains("nope")));
    assert!(backend.ping().await.is_err());
}
