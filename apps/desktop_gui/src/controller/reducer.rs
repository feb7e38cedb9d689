//! Session state transitions driven by UI actions and backend events.

use client_core::{FormController, RenderMode, ResultView, SubmissionTicket, SubmitError};
use shared::error::FormErrors;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub struct Session {
    controller: FormController,
    pub status: String,
    pub render_mode: RenderMode,
    field_errors: FormErrors,
    ping_status: Option<String>,
    last_error: Option<UiError>,
}

impl Session {
    pub fn new(controller: FormController) -> Self {
        Self {
            controller,
            status: "Ready".to_string(),
            render_mode: RenderMode::Report,
            field_errors: FormErrors::default(),
            ping_status: None,
            last_error: None,
        }
    }

    pub fn controller(&self) -> &FormController {
        &self.controller
    }

    pub fn view(&self) -> ResultView {
        self.controller.view()
    }

    pub fn field_error(&self, field: &str) -> Option<String> {
        self.field_errors.for_field(field).map(ToString::to_string)
    }

    pub fn ping_status(&self) -> Option<&str> {
        self.ping_status.as_deref()
    }

    pub fn last_error(&self) -> Option<&UiError> {
        self.last_error.as_ref()
    }

    /// Validates the form and returns the command to queue, if any.
    pub fn request_submit(&mut self) -> Option<BackendCommand> {
        match self.controller.begin_submission() {
            Ok(pending) => {
                self.field_errors = FormErrors::default();
                self.last_error = None;
                self.status = format!("Running simulation {}...", pending.ticket);
                Some(BackendCommand::Submit { pending })
            }
            Err((ticket, errors)) => {
                tracing::debug!(%ticket, %errors, "form rejected locally");
                self.status = format!("Fix {} field(s) before running", errors.len());
                self.field_errors = errors;
                None
            }
        }
    }

    pub fn request_ping(&mut self) -> BackendCommand {
        self.ping_status = Some("Checking backend...".to_string());
        BackendCommand::Ping
    }

    /// Records a command that never reached the worker. A submission that was
    /// not queued is failed in place so the view does not stay pending.
    pub fn dispatch_failed(
        &mut self,
        context: UiErrorContext,
        ticket: Option<SubmissionTicket>,
    ) {
        let error = UiError::from_message(context, self.status.clone());
        if let Some(ticket) = ticket {
            let outcome = Err(SubmitError::Transport(error.message().to_string()));
            self.controller.complete_submission(ticket, &outcome);
        }
        if context == UiErrorContext::Ping {
            self.ping_status = None;
        }
        self.last_error = Some(error);
    }

    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Info(message) => {
                self.status = message;
            }
            UiEvent::SubmissionFinished { ticket, outcome } => {
                if !self.controller.complete_submission(ticket, &outcome) {
                    return;
                }
                match &outcome {
                    Ok(_) => {
                        self.last_error = None;
                        self.status = format!("Simulation {ticket} finished");
                    }
                    Err(err) => {
                        tracing::warn!(%ticket, error = %err, "simulation failed");
                        self.last_error =
                            Some(UiError::from_submit_error(UiErrorContext::Submit, err));
                        self.status = format!("Simulation {ticket} failed");
                    }
                }
            }
            UiEvent::PingFinished(result) => {
                self.ping_status = Some(match result {
                    Ok(message) => message,
                    Err(err) => {
                        let error = UiError::from_submit_error(UiErrorContext::Ping, &err);
                        let message = error.message().to_string();
                        self.last_error = Some(error);
                        message
                    }
                });
            }
            UiEvent::Error(error) => {
                tracing::error!(context = ?error.context(), "{}", error.message());
                self.status = error.message().to_string();
                self.last_error = Some(error);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
