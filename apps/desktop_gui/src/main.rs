mod backend_bridge;
mod controller;
mod ui;

use std::sync::Arc;

use clap::Parser;
use client_core::{
    load_settings, FormController, Settings, SimulationBackend, SimulationClient,
    UnconfiguredBackend,
};
use crossbeam_channel::bounded;
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::reducer::Session;
use crate::ui::SimFormApp;

#[derive(Debug, Parser)]
#[command(name = "mhsim_gui", about = "Desktop form for the mental health simulation backend")]
struct Args {
    /// Overrides the backend base URL from mhsim.toml and the environment.
    #[arg(long)]
    backend_url: Option<String>,
}

/// Falls back to a backend that fails every call, so the window still opens
/// and the configuration problem is shown where the result would be.
fn build_backend(settings: &Settings) -> (Arc<dyn SimulationBackend>, String) {
    match SimulationClient::new(settings) {
        Ok(client) => {
            let label = client.simulate_url().to_string();
            (Arc::new(client), label)
        }
        Err(err) => {
            tracing::error!("invalid backend configuration: {err:#}");
            (
                Arc::new(UnconfiguredBackend::new(format!("{err:#}"))),
                format!("{} (invalid)", settings.backend_url),
            )
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(url) = args.backend_url {
        settings = settings.with_backend_url(url);
    }
    let (backend, backend_label) = build_backend(&settings);
    tracing::info!(backend = %backend_label, "starting simulation form");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(backend.clone(), cmd_rx, ui_tx);

    let session = Session::new(FormController::new(backend));
    let app = SimFormApp::new(session, cmd_tx, ui_rx, backend_label);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Mental Health Simulation")
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([760.0, 520.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Mental Health Simulation",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
}
