//! Backend commands queued from UI to backend worker.

use client_core::{PendingSubmission, SubmissionTicket};

pub enum BackendCommand {
    Submit { pending: PendingSubmission },
    Ping,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Submit { .. } => "submit",
            BackendCommand::Ping => "ping",
        }
    }

    pub fn ticket(&self) -> Option<SubmissionTicket> {
        match self {
            BackendCommand::Submit { pending } => Some(pending.ticket),
            BackendCommand::Ping => None,
        }
    }
}
