use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use shared::{
    domain::{Compartment, InitialState, Scenario},
    error::{FormErrors, InputError},
    protocol::{SimulationRequest, SimulationResult},
};
use tracing::{debug, info, warn};

use crate::{
    client::{SimulationBackend, SubmitError},
    presenter::ResultView,
    sequence::{SubmissionTicket, SubmissionTracker},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    NonNegative,
    Positive,
}

/// `-` followed by digits, at least one of them non-zero. No range limit.
fn is_negative_integer(text: &str) -> bool {
    text.strip_prefix('-').is_some_and(|digits| {
        !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && digits.bytes().any(|b| b != b'0')
    })
}

fn parse_count(field: &str, text: &str, bound: Bound) -> Result<u64, InputError> {
    let trimmed = text.trim();
    let value = match trimmed.parse::<u64>() {
        Ok(value) => value,
        Err(_) => {
            return Err(if is_negative_integer(trimmed) {
                InputError::Negative {
                    field: field.to_string(),
                }
            } else {
                InputError::NotANumber {
                    field: field.to_string(),
                    value: trimmed.to_string(),
                }
            });
        }
    };

    if bound == Bound::Positive && value == 0 {
        return Err(InputError::NotPositive {
            field: field.to_string(),
        });
    }
    Ok(value)
}

/// Raw text of every form field, as typed. Nothing is coerced until [`FormState::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    population: String,
    initial_state: [String; 4],
    scenario: Scenario,
    sim_time: String,
}

impl Default for FormState {
    fn default() -> Self {
        Self::from_request(&SimulationRequest::default())
    }
}

impl FormState {
    pub fn from_request(request: &SimulationRequest) -> Self {
        Self {
            population: request.population.to_string(),
            initial_state: Compartment::ALL
                .map(|compartment| request.initial_state.get(compartment).to_string()),
            scenario: request.scenario,
            sim_time: request.sim_time.to_string(),
        }
    }

    pub fn set_population(&mut self, value: impl Into<String>) {
        self.population = value.into();
    }

    pub fn set_initial_state(&mut self, compartment: Compartment, value: impl Into<String>) {
        self.initial_state[compartment.index()] = value.into();
    }

    pub fn set_healthy(&mut self, value: impl Into<String>) {
        self.set_initial_state(Compartment::Healthy, value);
    }

    pub fn set_mild(&mut self, value: impl Into<String>) {
        self.set_initial_state(Compartment::Mild, value);
    }

    pub fn set_moderate(&mut self, value: impl Into<String>) {
        self.set_initial_state(Compartment::Moderate, value);
    }

    pub fn set_severe(&mut self, value: impl Into<String>) {
        self.set_initial_state(Compartment::Severe, value);
    }

    pub fn set_scenario(&mut self, scenario: Scenario) {
        self.scenario = scenario;
    }

    /// Only `"peace"` and `"crisis"` are accepted; state is untouched otherwise.
    pub fn set_scenario_str(&mut self, value: &str) -> Result<(), InputError> {
        self.scenario = value.parse()?;
        Ok(())
    }

    pub fn set_sim_time(&mut self, value: impl Into<String>) {
        self.sim_time = value.into();
    }

    pub fn population(&self) -> &str {
        &self.population
    }

    pub fn initial_state(&self, compartment: Compartment) -> &str {
        &self.initial_state[compartment.index()]
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn sim_time(&self) -> &str {
        &self.sim_time
    }

    /// Mutable access to field buffers for immediate-mode text inputs.
    pub fn population_mut(&mut self) -> &mut String {
        &mut self.population
    }

    pub fn initial_state_mut(&mut self, compartment: Compartment) -> &mut String {
        &mut self.initial_state[compartment.index()]
    }

    pub fn sim_time_mut(&mut self) -> &mut String {
        &mut self.sim_time
    }

    /// Checks every field independently and reports all failures at once.
    pub fn validate(&self) -> Result<SimulationRequest, FormErrors> {
        let mut errors = FormErrors::new();
        let mut keep = |result: Result<u64, InputError>| match result {
            Ok(value) => value,
            Err(err) => {
                errors.push(err);
                0
            }
        };

        let population = keep(parse_count("population", &self.population, Bound::Positive));
        let [healthy, mild, moderate, severe] = Compartment::ALL.map(|compartment| {
            keep(parse_count(
                compartment.field_name(),
                &self.initial_state[compartment.index()],
                Bound::NonNegative,
            ))
        });
        let sim_time = keep(parse_count("sim_time", &self.sim_time, Bound::Positive));

        errors.into_result(|| SimulationRequest {
            population,
            initial_state: InitialState::new(healthy, mild, moderate, severe),
            scenario: self.scenario,
            sim_time,
        })
    }
}

/// A submission that passed validation and is waiting on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSubmission {
    pub ticket: SubmissionTicket,
    pub request: SimulationRequest,
}

/// Outcome of one [`FormController::submit`] call.
#[derive(Debug)]
pub struct Submission {
    pub ticket: SubmissionTicket,
    /// `false` when a newer submission was issued before this one finished.
    pub applied: bool,
    pub outcome: Result<SimulationResult, SubmitError>,
}

#[derive(Default)]
struct ControllerState {
    form: FormState,
    view: ResultView,
    tracker: SubmissionTracker,
}

/// Owns the form, the result view, and the submission sequence for one session.
pub struct FormController {
    backend: Arc<dyn SimulationBackend>,
    state: Mutex<ControllerState>,
}

impl FormController {
    pub fn new(backend: Arc<dyn SimulationBackend>) -> Self {
        Self::with_form(backend, FormState::default())
    }

    pub fn with_form(backend: Arc<dyn SimulationBackend>, form: FormState) -> Self {
        Self {
            backend,
            state: Mutex::new(ControllerState {
                form,
                ..ControllerState::default()
            }),
        }
    }

    pub fn backend(&self) -> Arc<dyn SimulationBackend> {
        self.backend.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn form(&self) -> FormState {
        self.lock().form.clone()
    }

    pub fn update_form(&self, edit: impl FnOnce(&mut FormState)) {
        edit(&mut self.lock().form);
    }

    pub fn set_population(&self, value: impl Into<String>) {
        self.lock().form.set_population(value);
    }

    pub fn set_initial_state(&self, compartment: Compartment, value: impl Into<String>) {
        self.lock().form.set_initial_state(compartment, value);
    }

    pub fn set_scenario(&self, scenario: Scenario) {
        self.lock().form.set_scenario(scenario);
    }

    pub fn set_scenario_str(&self, value: &str) -> Result<(), InputError> {
        self.lock().form.set_scenario_str(value)
    }

    pub fn set_sim_time(&self, value: impl Into<String>) {
        self.lock().form.set_sim_time(value);
    }

    pub fn view(&self) -> ResultView {
        self.lock().view.clone()
    }

    /// Issues a ticket and clears the previous result or error.
    ///
    /// Invalid input still consumes a ticket so that older in-flight
    /// submissions cannot overwrite the input error when they finish.
    pub fn begin_submission(&self) -> Result<PendingSubmission, (SubmissionTicket, FormErrors)> {
        let mut state = self.lock();
        let ticket = state.tracker.issue();
        match state.form.validate() {
            Ok(request) => {
                state.view = ResultView::Pending { ticket };
                Ok(PendingSubmission { ticket, request })
            }
            Err(errors) => {
                state.view = ResultView::Failed {
                    message: SubmitError::Input(errors.clone()).to_string(),
                };
                Err((ticket, errors))
            }
        }
    }

    /// Applies a finished submission if it is still the latest one.
    pub fn complete_submission(
        &self,
        ticket: SubmissionTicket,
        outcome: &Result<SimulationResult, SubmitError>,
    ) -> bool {
        let mut state = self.lock();
        if !state.tracker.is_latest(ticket) {
            debug!(%ticket, latest = ?state.tracker.latest(), "discarding superseded submission");
            return false;
        }
        state.view = match outcome {
            Ok(result) => ResultView::Ready {
                result: result.clone(),
                received_at: Utc::now(),
            },
            Err(err) => ResultView::Failed {
                message: err.to_string(),
            },
        };
        true
    }

    pub async fn submit(&self) -> Submission {
        let pending = match self.begin_submission() {
            Ok(pending) => pending,
            Err((ticket, errors)) => {
                warn!(%ticket, %errors, "submission rejected before sending");
                return Submission {
                    ticket,
                    applied: true,
                    outcome: Err(SubmitError::Input(errors)),
                };
            }
        };

        info!(ticket = %pending.ticket, "simulation submission started");
        let outcome = self.backend.simulate(&pending.request).await;
        if let Err(err) = &outcome {
            warn!(ticket = %pending.ticket, error = %err, "simulation submission failed");
        }
        let applied = self.complete_submission(pending.ticket, &outcome);

        Submission {
            ticket: pending.ticket,
            applied,
            outcome,
        }
    }

    pub async fn ping(&self) -> Result<String, SubmitError> {
        self.backend.ping().await
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
