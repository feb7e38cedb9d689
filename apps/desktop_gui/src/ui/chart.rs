//! Minimal line chart painted directly with egui shapes.

use client_core::presenter::{bounds, NamedSeries};
use eframe::egui;

const SERIES_COLORS: [egui::Color32; 6] = [
    egui::Color32::from_rgb(88, 166, 255),
    egui::Color32::from_rgb(255, 166, 87),
    egui::Color32::from_rgb(126, 231, 135),
    egui::Color32::from_rgb(255, 123, 114),
    egui::Color32::from_rgb(210, 168, 255),
    egui::Color32::from_rgb(121, 192, 255),
];

pub fn series_color(index: usize) -> egui::Color32 {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

/// Draws every series on shared axes. Series with fewer than two points are skipped.
pub fn line_chart(ui: &mut egui::Ui, series: &[NamedSeries], height: f32) {
    let desired = egui::vec2(ui.available_width().max(120.0), height);
    let (response, painter) = ui.allocate_painter(desired, egui::Sense::hover());
    let rect = response.rect.shrink(6.0);

    let axis = egui::Stroke::new(1.0, ui.visuals().weak_text_color());
    painter.line_segment([rect.left_bottom(), rect.right_bottom()], axis);
    painter.line_segment([rect.left_bottom(), rect.left_top()], axis);

    let all_points: Vec<f64> = series
        .iter()
        .flat_map(|s| s.points.iter().copied())
        .collect();
    let (min, max) = bounds(&all_points);
    let span = if max > min { max - min } else { 1.0 };

    for (index, named) in series.iter().enumerate() {
        if named.points.len() < 2 {
            continue;
        }
        let step = rect.width() / (named.points.len() - 1) as f32;
        let line: Vec<egui::Pos2> = named
            .points
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let t = ((value - min) / span) as f32;
                egui::pos2(rect.left() + step * i as f32, rect.bottom() - t * rect.height())
            })
            .collect();
        painter.add(egui::Shape::line(
            line,
            egui::Stroke::new(1.5, series_color(index)),
        ));
    }

    let font = egui::FontId::monospace(10.0);
    let text_color = ui.visuals().weak_text_color();
    painter.text(
        rect.left_top(),
        egui::Align2::LEFT_TOP,
        format_axis(max),
        font.clone(),
        text_color,
    );
    painter.text(
        rect.left_bottom(),
        egui::Align2::LEFT_BOTTOM,
        format_axis(min),
        font,
        text_color,
    );

    if let Some(pos) = response.hover_pos() {
        let longest = series.iter().map(|s| s.points.len()).max().unwrap_or(0);
        if longest > 1 {
            let step = rect.width() / (longest - 1) as f32;
            let index = (((pos.x - rect.left()) / step).round().max(0.0) as usize).min(longest - 1);
            let lines: Vec<String> = series
                .iter()
                .filter_map(|s| s.points.get(index).map(|v| format!("{}: {}", s.name, format_axis(*v))))
                .collect();
            response.on_hover_text(format!("x = {index}\n{}", lines.join("\n")));
        }
    }
}

pub fn legend(ui: &mut egui::Ui, series: &[NamedSeries]) {
    ui.horizontal_wrapped(|ui| {
        for (index, named) in series.iter().enumerate() {
            ui.colored_label(series_color(index), format!("■ {}", named.name));
        }
    });
}

fn format_axis(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
