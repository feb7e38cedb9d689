pub mod client;
pub mod config;
pub mod form;
pub mod presenter;
pub mod sequence;

pub use client::{SimulationBackend, SimulationClient, SubmitError, UnconfiguredBackend};
pub use config::{load_settings, load_settings_from, Settings};
pub use form::{FormController, FormState, PendingSubmission, Submission};
pub use presenter::{render_result, RenderMode, Report, ResultView};
pub use sequence::{SubmissionTicket, SubmissionTracker};
