use std::error::Error as _;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{
    error::{BackendErrorBody, FormErrors},
    protocol::{SimulationRequest, SimulationResult, WelcomeResponse},
};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Settings;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid input: {0}")]
    Input(#[from] FormErrors),
    #[error("{0}")]
    Transport(String),
    #[error("Error: {reason}{}", detail_suffix(.detail))]
    Backend {
        status: u16,
        reason: String,
        detail: Option<String>,
    },
    #[error("invalid response body: {0}")]
    Schema(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(" ({detail})"))
        .unwrap_or_default()
}

impl SubmitError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SubmitError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, SubmitError::Input(_))
    }
}

fn transport_error(err: reqwest::Error) -> SubmitError {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    SubmitError::Transport(message)
}

fn backend_error(status: StatusCode, body: &[u8]) -> SubmitError {
    let reason = status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string());
    let detail = serde_json::from_slice::<BackendErrorBody>(body)
        .ok()
        .map(|body| body.error)
        .filter(|detail| !detail.trim().is_empty());
    SubmitError::Backend {
        status: status.as_u16(),
        reason,
        detail,
    }
}

/// Anything that can run a simulation for the form controller.
#[async_trait]
pub trait SimulationBackend: Send + Sync {
    async fn simulate(&self, request: &SimulationRequest)
        -> Result<SimulationResult, SubmitError>;
    async fn ping(&self) -> Result<String, SubmitError>;
}

/// Stands in when settings could not produce a client; every call fails with the reason.
pub struct UnconfiguredBackend {
    reason: String,
}

impl UnconfiguredBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SimulationBackend for UnconfiguredBackend {
    async fn simulate(
        &self,
        _request: &SimulationRequest,
    ) -> Result<SimulationResult, SubmitError> {
        Err(SubmitError::Transport(format!(
            "simulation backend unavailable: {}",
            self.reason
        )))
    }

    async fn ping(&self) -> Result<String, SubmitError> {
        Err(SubmitError::Transport(format!(
            "simulation backend unavailable: {}",
            self.reason
        )))
    }
}

pub struct SimulationClient {
    http: Client,
    base_url: Url,
    simulate_url: Url,
}

impl SimulationClient {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings.base_url()?;
        let simulate_url = settings.simulate_url()?;

        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;

        Ok(Self {
            http,
            base_url,
            simulate_url,
        })
    }

    pub fn simulate_url(&self) -> &Url {
        &self.simulate_url
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl SimulationBackend for SimulationClient {
    async fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationResult, SubmitError> {
        request.validate()?;
        if request.exceeds_population() {
            warn!(
                population = request.population,
                initial_total = request.initial_state.total(),
                "initial compartment counts exceed population; backend may reject"
            );
        }

        info!(
            url = %self.simulate_url,
            population = request.population,
            scenario = %request.scenario,
            sim_time = request.sim_time,
            "submitting simulation request"
        );

        let response = self
            .http
            .post(self.simulate_url.clone())
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            let err = backend_error(status, &body);
            warn!(status = status.as_u16(), error = %err, "simulation backend rejected request");
            return Err(err);
        }

        let value = serde_json::from_slice(&body).map_err(|err| {
            warn!(%err, bytes = body.len(), "simulation backend returned non-JSON body");
            SubmitError::Schema(err.to_string())
        })?;
        debug!(bytes = body.len(), "simulation result received");
        Ok(SimulationResult(value))
    }

    async fn ping(&self) -> Result<String, SubmitError> {
        let response = self
            .http
            .get(self.base_url.clone())
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(backend_error(status, &body));
        }

        match serde_json::from_slice::<WelcomeResponse>(&body) {
            Ok(welcome) => Ok(welcome.message),
            Err(_) => Ok(String::from_utf8_lossy(&body).trim().to_string()),
        }
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
