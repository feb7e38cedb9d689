use std::{process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use client_core::{
    load_settings, FormController, FormState, RenderMode, SimulationBackend, SimulationClient,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "mhsim",
    about = "Submit mental-health simulation runs to a simulation backend"
)]
struct Cli {
    /// Overrides backend_url from mhsim.toml and SIM_BACKEND_URL.
    #[arg(long, global = true)]
    backend_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a simulation and print the result.
    Simulate {
        #[command(flatten)]
        form: FormArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Report)]
        format: OutputFormat,
    },
    /// Print the request body without sending it.
    Payload {
        #[command(flatten)]
        form: FormArgs,
    },
    /// Check that the backend is reachable.
    Ping,
}

/// Raw field text; validated the same way the desktop form validates it.
#[derive(Args, Debug, Default)]
struct FormArgs {
    #[arg(long)]
    population: Option<String>,
    #[arg(long)]
    healthy: Option<String>,
    #[arg(long)]
    mild: Option<String>,
    #[arg(long)]
    moderate: Option<String>,
    #[arg(long)]
    severe: Option<String>,
    /// peace or crisis
    #[arg(long)]
    scenario: Option<String>,
    /// Simulated days.
    #[arg(long)]
    sim_time: Option<String>,
}

impl FormArgs {
    fn into_form(self) -> Result<FormState> {
        let mut form = FormState::default();
        if let Some(v) = self.population {
            form.set_population(v);
        }
        if let Some(v) = self.healthy {
            form.set_healthy(v);
        }
        if let Some(v) = self.mild {
            form.set_mild(v);
        }
        if let Some(v) = self.moderate {
            form.set_moderate(v);
        }
        if let Some(v) = self.severe {
            form.set_severe(v);
        }
        if let Some(v) = self.scenario {
            form.set_scenario_str(&v)?;
        }
        if let Some(v) = self.sim_time {
            form.set_sim_time(v);
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed JSON as returned by the backend.
    Json,
    /// Tables and sparkline charts.
    Report,
}

impl From<OutputFormat> for RenderMode {
    fn from(value: OutputFormat) -> Self {
        match value {
            OutputFormat::Json => RenderMode::Dump,
            OutputFormat::Report => RenderMode::Report,
        }
    }
}

fn build_client(backend_url: Option<String>) -> Result<SimulationClient> {
    let mut settings = load_settings();
    if let Some(url) = backend_url {
        settings = settings.with_backend_url(url);
    }
    SimulationClient::new(&settings).context("failed to configure simulation backend")
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Payload { form } => {
            let request = form.into_form()?.validate()?;
            println!("{}", serde_json::to_string(&request)?);
        }
        Command::Ping => {
            let client = build_client(cli.backend_url)?;
            match client.ping().await {
                Ok(message) => println!("{}: {message}", client.base_url()),
                Err(err) => {
                    eprintln!("{err}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Simulate { form, format } => {
            let form = form.into_form()?;
            let client = build_client(cli.backend_url)?;
            let controller = FormController::with_form(Arc::new(client), form);

            let submission = controller.submit().await;
            let view = controller.view();
            if let Err(err) = &submission.outcome {
                eprintln!("{err}");
                return Ok(ExitCode::FAILURE);
            }
            println!("{}", view.render_text(format.into()));
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_flags_keep_form_defaults() {
        let request = FormArgs::default()
            .into_form()
            .expect("form")
            .validate()
            .expect("valid");
        assert_eq!(
            serde_json::to_string(&request).expect("json"),
            r#"{"population":828000,"initial_state":[800000,20000,5000,3000],"scenario":"peace","sim_time":365}"#
        );
    }

    #[test]
    fn parses_simulate_flags_into_request() {
        let cli = Cli::try_parse_from([
            "mhsim",
            "--backend-url",
            "http://sim.example:8000",
            "simulate",
            "--population",
            "1000",
            "--healthy",
            "900",
            "--mild",
            "60",
            "--moderate",
            "30",
            "--severe",
            "10",
            "--scenario",
            "crisis",
            "--sim-time",
            "90",
            "--format",
            "json",
        ])
        .expect("parse");
        assert_eq!(cli.backend_url.as_deref(), Some("http://sim.example:8000"));

        let Command::Simulate { form, format } = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(format, OutputFormat::Json);
        let request = form.into_form().expect("form").validate().expect("valid");
        assert_eq!(request.population, 1000);
        assert_eq!(request.initial_state.total(), 1000);
        assert_eq!(request.scenario.as_str(), "crisis");
        assert_eq!(request.sim_time, 90);
    }

    #[test]
    fn rejects_unknown_scenario_and_bad_numbers() {
        let form = FormArgs {
            scenario: Some("war".to_string()),
            ..FormArgs::default()
        };
        assert!(form.into_form().is_err());

        let form = FormArgs {
            population: Some("lots".to_string()),
            ..FormArgs::default()
        };
        let errors = form.into_form().expect("form").validate().expect_err("invalid");
        assert!(errors.to_string().contains("population must be a whole number"));
    }
}
