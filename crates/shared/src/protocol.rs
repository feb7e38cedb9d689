use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{InitialState, Scenario},
    error::{FormErrors, InputError},
};

/// Body of `POST /simulate`. Field order matches the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub population: u64,
    pub initial_state: InitialState,
    pub scenario: Scenario,
    pub sim_time: u64,
}

impl SimulationRequest {
    pub fn new(
        population: u64,
        initial_state: InitialState,
        scenario: Scenario,
        sim_time: u64,
    ) -> Result<Self, FormErrors> {
        let request = Self {
            population,
            initial_state,
            scenario,
            sim_time,
        };
        request.validate()?;
        Ok(request)
    }

    /// Checks the positivity rules. Counts are unsigned so they cannot go negative.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if self.population == 0 {
            errors.push(InputError::NotPositive {
                field: "population".to_string(),
            });
        }
        if self.sim_time == 0 {
            errors.push(InputError::NotPositive {
                field: "sim_time".to_string(),
            });
        }
        errors.into_result(|| ())
    }

    /// Initial counts exceed the population. The backend may reject such requests.
    pub fn exceeds_population(&self) -> bool {
        self.initial_state.total() > self.population
    }
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            population: 828_000,
            initial_state: InitialState::default(),
            scenario: Scenario::Peace,
            sim_time: 365,
        }
    }
}

/// Backend-owned result payload, passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimulationResult(pub Value);

impl SimulationResult {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn top_level_keys(&self) -> Vec<&str> {
        match &self.0 {
            Value::Object(map) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

impl From<Value> for SimulationResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Body of `GET /` on the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}
