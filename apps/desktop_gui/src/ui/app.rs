use std::time::Duration;

use client_core::presenter::{
    format_scalar, render_dump, render_report_text, NamedSeries, SectionBody, Table,
};
use client_core::{FormState, RenderMode, Report, ResultView};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::{Compartment, Scenario};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::controller::reducer::Session;
use crate::ui::chart;

const CHART_HEIGHT: f32 = 180.0;

pub struct SimFormApp {
    session: Session,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    backend_label: String,
}

impl SimFormApp {
    pub fn new(
        session: Session,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        backend_label: String,
    ) -> Self {
        Self {
            session,
            cmd_tx,
            ui_rx,
            backend_label,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.session.apply(event);
        }
    }

    fn run_simulation(&mut self) {
        if let Some(cmd) = self.session.request_submit() {
            let ticket = cmd.ticket();
            if !dispatch_backend_command(&self.cmd_tx, cmd, &mut self.session.status) {
                self.session.dispatch_failed(UiErrorContext::Submit, ticket);
            }
        }
    }

    fn check_backend(&mut self) {
        let cmd = self.session.request_ping();
        if !dispatch_backend_command(&self.cmd_tx, cmd, &mut self.session.status) {
            self.session.dispatch_failed(UiErrorContext::Ping, None);
        }
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Mental health simulation");
                ui.separator();
                ui.label(egui::RichText::new(&self.backend_label).monospace());
                if ui.button("Check backend").clicked() {
                    self.check_backend();
                }
                if let Some(ping) = self.session.ping_status() {
                    ui.label(egui::RichText::new(ping).weak());
                }
            });
        });
    }

    fn show_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.session.status);
                if self
                    .session
                    .last_error()
                    .is_some_and(|err| err.suggests_connectivity_check())
                {
                    ui.separator();
                    ui.label(
                        egui::RichText::new("Is the backend running? Try \"Check backend\".")
                            .weak(),
                    );
                }
            });
        });
    }

    fn show_form(&mut self, ctx: &egui::Context) {
        let mut form = self.session.controller().form();
        let before = form.clone();
        let mut submit = false;

        egui::SidePanel::left("form_panel")
            .resizable(false)
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.add_space(6.0);
                ui.label(egui::RichText::new("Parameters").strong());
                ui.add_space(6.0);

                submit |= self.count_field(ui, "population", "Population", form.population_mut());

                ui.add_space(6.0);
                ui.label(egui::RichText::new("Initial state").strong());
                for compartment in Compartment::ALL {
                    submit |= self.count_field(
                        ui,
                        compartment.field_name(),
                        compartment_label(compartment),
                        form.initial_state_mut(compartment),
                    );
                }

                ui.add_space(6.0);
                scenario_picker(ui, &mut form);

                ui.add_space(6.0);
                submit |= self.count_field(
                    ui,
                    "sim_time",
                    "Simulation time (days)",
                    form.sim_time_mut(),
                );

                ui.add_space(12.0);
                let pending = self.session.view().is_pending();
                let label = if pending { "Run again" } else { "Run simulation" };
                if ui
                    .add_sized([ui.available_width(), 32.0], egui::Button::new(label))
                    .clicked()
                {
                    submit = true;
                }
            });

        if form != before {
            self.session.controller().update_form(|state| *state = form);
        }
        if submit {
            self.run_simulation();
        }
    }

    /// Returns `true` when Enter was pressed in the field.
    fn count_field(
        &self,
        ui: &mut egui::Ui,
        field: &'static str,
        label: &str,
        value: &mut String,
    ) -> bool {
        ui.label(label);
        let response = ui.add(
            egui::TextEdit::singleline(value)
                .id_salt(field)
                .desired_width(f32::INFINITY),
        );
        if let Some(message) = self.session.field_error(field) {
            ui.colored_label(ui.visuals().error_fg_color, message);
        }
        response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter))
    }

    fn show_result(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Result").strong());
                ui.separator();
                ui.selectable_value(&mut self.session.render_mode, RenderMode::Report, "Report");
                ui.selectable_value(&mut self.session.render_mode, RenderMode::Dump, "JSON");
            });
            ui.separator();

            match self.session.view() {
                ResultView::Empty => {
                    ui.label(egui::RichText::new("No simulation run yet.").weak());
                }
                ResultView::Pending { ticket } => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(format!("Waiting for simulation {ticket}..."));
                    });
                }
                ResultView::Failed { message } => {
                    ui.colored_label(ui.visuals().error_fg_color, message);
                }
                ResultView::Ready {
                    result,
                    received_at,
                } => {
                    ui.label(
                        egui::RichText::new(format!(
                            "Received {}",
                            received_at
                                .with_timezone(&chrono::Local)
                                .format("%Y-%m-%d %H:%M:%S")
                        ))
                        .weak(),
                    );
                    egui::ScrollArea::vertical()
                        .auto_shrink([false, false])
                        .show(ui, |ui| match self.session.render_mode {
                            RenderMode::Dump => {
                                ui.label(egui::RichText::new(render_dump(&result)).monospace());
                            }
                            RenderMode::Report => show_report(ui, &Report::from_result(&result)),
                        });
                }
            }
        });
    }
}

fn compartment_label(compartment: Compartment) -> &'static str {
    match compartment {
        Compartment::Healthy => "Healthy",
        Compartment::Mild => "Mild",
        Compartment::Moderate => "Moderate",
        Compartment::Severe => "Severe",
    }
}

fn scenario_picker(ui: &mut egui::Ui, form: &mut FormState) {
    ui.label("Scenario");
    let mut selected = form.scenario();
    egui::ComboBox::from_id_salt("scenario_combo")
        .selected_text(selected.label())
        .width(ui.available_width())
        .show_ui(ui, |ui| {
            for scenario in Scenario::ALL {
                ui.selectable_value(&mut selected, scenario, scenario.label());
            }
        });
    if selected != form.scenario() {
        form.set_scenario(selected);
    }
}

fn show_report(ui: &mut egui::Ui, report: &Report) {
    for section in &report.sections {
        ui.add_space(8.0);
        match &section.body {
            SectionBody::Series(points) => {
                ui.label(egui::RichText::new(&section.key).strong());
                let series = [NamedSeries {
                    name: section.key.clone(),
                    points: points.clone(),
                }];
                chart::line_chart(ui, &series, CHART_HEIGHT);
            }
            SectionBody::SeriesGroup(group) => {
                ui.label(egui::RichText::new(&section.key).strong());
                chart::legend(ui, group);
                chart::line_chart(ui, group, CHART_HEIGHT);
            }
            SectionBody::Table(table) => {
                ui.label(egui::RichText::new(&section.key).strong());
                table_grid(ui, &section.key, table);
            }
            SectionBody::Scalar(_) | SectionBody::Raw(_) => {
                let single = Report {
                    sections: vec![section.clone()],
                };
                ui.label(egui::RichText::new(render_report_text(&single)).monospace());
            }
        }
    }
}

fn table_grid(ui: &mut egui::Ui, key: &str, table: &Table) {
    egui::ScrollArea::vertical()
        .id_salt(key)
        .max_height(240.0)
        .show(ui, |ui| {
            egui::Grid::new(key).striped(true).show(ui, |ui| {
                for column in &table.columns {
                    ui.label(egui::RichText::new(column).strong());
                }
                ui.end_row();
                for row in &table.rows {
                    for cell in row {
                        ui.label(egui::RichText::new(format_scalar(cell)).monospace());
                    }
                    ui.end_row();
                }
            });
        });
}

impl eframe::App for SimFormApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        self.show_top_bar(ctx);
        self.show_status_bar(ctx);
        self.show_form(ctx);
        self.show_result(ctx);

        if self.session.view().is_pending() {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
