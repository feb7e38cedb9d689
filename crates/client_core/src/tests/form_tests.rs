use super::*;
use std::collections::VecDeque;

use async_trait::async_trait;
use crate::presenter::RenderMode;
use serde_json::json;
use tokio::sync::{mpsc, oneshot, Mutex};

fn result_with(marker: &str) -> SimulationResult {
    SimulationResult(json!({
        "marker": marker,
        "healthy": [800000, 799000],
        "mild": [20000, 20100]
    }))
}

fn internal_server_error() -> SubmitError {
    SubmitError::Backend {
        status: 500,
        reason: "Internal Server Error".to_string(),
        detail: None,
    }
}

struct ScriptedBackend {
    requests: Mutex<Vec<SimulationRequest>>,
    outcomes: Mutex<VecDeque<Result<SimulationResult, SubmitError>>>,
}

impl ScriptedBackend {
    fn new(outcomes: Vec<Result<SimulationResult, SubmitError>>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            outcomes: Mutex::new(outcomes.into()),
        })
    }
}

#[async_trait]
impl SimulationBackend for ScriptedBackend {
    async fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationResult, SubmitError> {
        self.requests.lock().await.push(*request);
        self.outcomes
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(result_with("default")))
    }

    async fn ping(&self) -> Result<String, SubmitError> {
        Ok("scripted".to_string())
    }
}

/// Each call blocks until the test releases the matching gate.
struct GatedBackend {
    started: mpsc::UnboundedSender<SimulationRequest>,
    gates: Mutex<VecDeque<oneshot::Receiver<Result<SimulationResult, SubmitError>>>>,
}

#[async_trait]
impl SimulationBackend for GatedBackend {
    async fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationResult, SubmitError> {
        let gate = self.gates.lock().await.pop_front();
        let _ = self.started.send(*request);
        match gate {
            Some(gate) => gate
                .await
                .unwrap_or_else(|_| Err(SubmitError::Transport("gate dropped".to_string()))),
            None => Err(SubmitError::Transport("no gate configured".to_string())),
        }
    }

    async fn ping(&self) -> Result<String, SubmitError> {
        Ok("gated".to_string())
    }
}

#[test]
fn default_form_validates_to_documented_request() {
    let request = FormState::default().validate().expect("defaults are valid");
    assert_eq!(
        serde_json::to_value(request).expect("serialize"),
        json!({
            "population": 828000,
            "initial_state": [800000, 20000, 5000, 3000],
            "scenario": "peace",
            "sim_time": 365
        })
    );
}

#[test]
fn every_bad_field_is_reported_independently() {
    let mut form = FormState::default();
    form.set_population("abc");
    form.set_mild("-5");
    form.set_severe("");
    form.set_sim_time("0");

    let errors = form.validate().expect_err("must fail");
    assert_eq!(errors.len(), 4);
    assert_eq!(
        errors.for_field("population"),
        Some(&InputError::NotANumber {
            field: "population".to_string(),
            value: "abc".to_string()
        })
    );
    assert_eq!(
        errors.for_field("mild"),
        Some(&InputError::Negative {
            field: "mild".to_string()
        })
    );
    assert!(matches!(
        errors.for_field("severe"),
        Some(InputError::NotANumber { .. })
    ));
    assert_eq!(
        errors.for_field("sim_time"),
        Some(&InputError::NotPositive {
            field: "sim_time".to_string()
        })
    );
    assert!(errors.for_field("healthy").is_none());
}

#[test]
fn fractional_and_nan_text_are_rejected_not_coerced() {
    let mut form = FormState::default();
    form.set_population("NaN");
    form.set_healthy("12.5");
    let errors = form.validate().expect_err("must fail");
    assert!(errors.for_field("population").is_some());
    assert!(errors.for_field("healthy").is_some());
}

#[test]
fn negative_counts_beyond_integer_range_are_still_negative() {
    let mut form = FormState::default();
    form.set_severe("-99999999999999999999");
    form.set_mild("-12x");

    let errors = form.validate().expect_err("must fail");
    assert_eq!(
        errors.for_field("severe"),
        Some(&InputError::Negative {
            field: "severe".to_string()
        })
    );
    assert!(matches!(
        errors.for_field("mild"),
        Some(InputError::NotANumber { .. })
    ));
}

#[test]
fn zero_counts_are_allowed_and_whitespace_is_trimmed() {
    let mut form = FormState::default();
    form.set_population(" 1000 ");
    form.set_initial_state(Compartment::Healthy, "1000");
    form.set_initial_state(Compartment::Mild, "0");
    form.set_moderate("0");
    form.set_severe("0");
    form.set_sim_time("\t7");

    let request = form.validate().expect("valid");
    assert_eq!(request.population, 1000);
    assert_eq!(request.initial_state, InitialState::new(1000, 0, 0, 0));
    assert_eq!(request.sim_time, 7);
}

#[test]
fn unknown_scenario_is_rejected_and_state_kept() {
    let mut form = FormState::default();
    form.set_scenario_str("crisis").expect("known scenario");
    assert_eq!(form.scenario(), Scenario::Crisis);

    let err = form.set_scenario_str("war").expect_err("unknown scenario");
    assert_eq!(err.field(), "scenario");
    assert_eq!(form.scenario(), Scenario::Crisis);
}

#[tokio::test]
async fn invalid_input_is_rejected_before_sending() {
    let backend = ScriptedBackend::new(Vec::new());
    let controller = FormController::new(backend.clone());
    controller.set_population("twelve");

    let submission = controller.submit().await;

    assert!(matches!(submission.outcome, Err(SubmitError::Input(_))));
    assert!(backend.requests.lock().await.is_empty());
    let view = controller.view();
    assert!(view.result().is_none());
    assert!(view
        .error()
        .is_some_and(|message| message.contains("population must be a whole number")));
}

#[tokio::test]
async fn success_after_failure_clears_the_error() {
    let backend = ScriptedBackend::new(vec![
        Err(internal_server_error()),
        Ok(result_with("second")),
    ]);
    let controller = FormController::new(backend.clone());

    controller.submit().await;
    let view = controller.view();
    assert!(view.result().is_none());
    assert!(view
        .error()
        .is_some_and(|message| message.contains("Internal Server Error")));

    let submission = controller.submit().await;
    assert!(submission.applied);
    let view = controller.view();
    assert!(view.error().is_none());
    assert_eq!(view.result(), Some(&result_with("second")));
}

#[tokio::test]
async fn server_error_replaces_previous_result() {
    let backend = ScriptedBackend::new(vec![
        Ok(result_with("first")),
        Err(internal_server_error()),
    ]);
    let controller = FormController::new(backend);

    controller.submit().await;
    assert!(controller.view().result().is_some());

    controller.submit().await;
    let view = controller.view();
    assert!(view.result().is_none(), "stale result must not be shown");
    assert_eq!(view.error(), Some("Error: Internal Server Error"));
    assert_eq!(
        view.render_text(RenderMode::Report),
        "Error: Internal Server Error"
    );
}

#[tokio::test]
async fn identical_state_produces_identical_request_bodies() {
    let backend = ScriptedBackend::new(Vec::new());
    let controller = FormController::new(backend.clone());

    let first = controller.submit().await;
    let second = controller.submit().await;
    assert!(second.ticket > first.ticket);

    let requests = backend.requests.lock().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(
        serde_json::to_string(&requests[0]).expect("serialize"),
        serde_json::to_string(&requests[1]).expect("serialize")
    );
}

#[tokio::test]
async fn latest_issued_submission_wins_when_responses_arrive_out_of_order() {
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();
    let (first_gate_tx, first_gate_rx) = oneshot::channel();
    let (second_gate_tx, second_gate_rx) = oneshot::channel();
    let backend = Arc::new(GatedBackend {
        started: started_tx,
        gates: Mutex::new(VecDeque::from(vec![first_gate_rx, second_gate_rx])),
    });
    let controller = Arc::new(FormController::new(backend));

    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit().await }
    });
    let first_request = started_rx.recv().await.expect("first call started");
    assert_eq!(first_request.scenario, Scenario::Peace);
    assert!(controller.view().is_pending());

    controller.set_scenario(Scenario::Crisis);
    let second = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit().await }
    });
    let second_request = started_rx.recv().await.expect("second call started");
    assert_eq!(second_request.scenario, Scenario::Crisis);

    let _ = second_gate_tx.send(Ok(result_with("second")));
    let second = second.await.expect("second task");
    assert!(second.applied);

    let _ = first_gate_tx.send(Ok(result_with("first")));
    let first = first.await.expect("first task");
    assert!(!first.applied);
    assert!(first.outcome.is_ok());

    assert_eq!(controller.view().result(), Some(&result_with("second")));
}

#[tokio::test]
async fn input_error_supersedes_in_flight_submission() {
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();
    let (gate_tx, gate_rx) = oneshot::channel();
    let backend = Arc::new(GatedBackend {
        started: started_tx,
        gates: Mutex::new(VecDeque::from(vec![gate_rx])),
    });
    let controller = Arc::new(FormController::new(backend));

    let in_flight = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit().await }
    });
    started_rx.recv().await.expect("call started");

    controller.set_sim_time("-1");
    let rejected = controller.submit().await;
    assert!(rejected.outcome.is_err());

    let _ = gate_tx.send(Ok(result_with("late")));
    let in_flight = in_flight.await.expect("task");
    assert!(!in_flight.applied);

    let view = controller.view();
    assert!(view.result().is_none());
    assert!(view
        .error()
        .is_some_and(|message| message.contains("sim_time must not be negative")));
}

#[tokio::test]
async fn ping_goes_through_the_backend() {
    let controller = FormController::new(ScriptedBackend::new(Vec::new()));
    assert_eq!(controller.ping().await.expect("ping"), "scripted");
}
