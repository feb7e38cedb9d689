//! UI/backend events and error modeling for desktop GUI controller.

use client_core::{SubmissionTicket, SubmitError};
use shared::protocol::SimulationResult;

pub enum UiEvent {
    Info(String),
    SubmissionFinished {
        ticket: SubmissionTicket,
        outcome: Result<SimulationResult, SubmitError>,
    },
    PingFinished(Result<String, SubmitError>),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Input,
    Transport,
    Backend,
    Schema,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Submit,
    Ping,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_submit_error(context: UiErrorContext, err: &SubmitError) -> Self {
        let category = match err {
            SubmitError::Input(_) => UiErrorCategory::Input,
            SubmitError::Transport(_) => UiErrorCategory::Transport,
            SubmitError::Backend { .. } => UiErrorCategory::Backend,
            SubmitError::Schema(_) => UiErrorCategory::Schema,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("timeout")
            || message_lower.contains("connection")
            || message_lower.contains("disconnected")
            || message_lower.contains("unavailable")
            || message_lower.contains("queue")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    /// Transport failures are worth a ping; input and backend answers are not.
    pub fn suggests_connectivity_check(&self) -> bool {
        self.category == UiErrorCategory::Transport
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
