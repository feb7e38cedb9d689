//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::SimulationBackend;
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// Starts the worker thread. Each command runs as its own task so a slow
/// submission never blocks a newer one.
pub fn launch(
    backend: Arc<dyn SimulationBackend>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };
        let _ = ui_tx.try_send(UiEvent::Info("Ready".to_string()));

        while let Ok(cmd) = cmd_rx.recv() {
            let backend = backend.clone();
            let ui_tx = ui_tx.clone();
            runtime.spawn(async move {
                let event = run_command(backend.as_ref(), cmd).await;
                if ui_tx.send(event).is_err() {
                    tracing::debug!("ui event queue closed; dropping backend result");
                }
            });
        }

        tracing::info!("ui command queue closed; backend worker stopping");
    });
}

pub async fn run_command(backend: &dyn SimulationBackend, cmd: BackendCommand) -> UiEvent {
    match cmd {
        BackendCommand::Submit { pending } => {
            let outcome = backend.simulate(&pending.request).await;
            UiEvent::SubmissionFinished {
                ticket: pending.ticket,
                outcome,
            }
        }
        BackendCommand::Ping => UiEvent::PingFinished(backend.ping().await),
    }
}
