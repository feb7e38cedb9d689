//! Schema-agnostic rendering of simulation results.
//!
//! The backend owns the result schema, so nothing here looks up fixed key
//! names. Every top-level key becomes one [`Section`], classified by the shape
//! of its value: numeric arrays become chartable series, flat objects and
//! arrays of flat objects become tables, everything else is dumped verbatim.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use shared::protocol::SimulationResult;

use crate::sequence::SubmissionTicket;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Pretty-printed JSON, exactly as received.
    #[default]
    Dump,
    /// Tables and sparklines derived from the result's shape.
    Report,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub key: String,
    pub body: SectionBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Scalar(Value),
    Series(Vec<f64>),
    SeriesGroup(Vec<NamedSeries>),
    Table(Table),
    Raw(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    pub name: String,
    pub points: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Report {
    pub fn from_result(result: &SimulationResult) -> Self {
        let sections = match result.as_value() {
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| Section {
                    key: key.clone(),
                    body: classify(value),
                })
                .collect(),
            other => vec![Section {
                key: "result".to_string(),
                body: classify(other),
            }],
        };
        Self { sections }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|section| section.key.as_str())
    }

    /// Every series in the report, grouped ones prefixed with their section key.
    pub fn chart_series(&self) -> Vec<NamedSeries> {
        let mut out = Vec::new();
        for section in &self.sections {
            match &section.body {
                SectionBody::Series(points) => out.push(NamedSeries {
                    name: section.key.clone(),
                    points: points.clone(),
                }),
                SectionBody::SeriesGroup(group) => {
                    out.extend(group.iter().map(|series| NamedSeries {
                        name: format!("{}.{}", section.key, series.name),
                        points: series.points.clone(),
                    }))
                }
                _ => {}
            }
        }
        out
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn numeric_points(values: &[Value]) -> Option<Vec<f64>> {
    values.iter().map(Value::as_f64).collect()
}

fn classify(value: &Value) -> SectionBody {
    match value {
        Value::Array(items) => {
            if let Some(points) = numeric_points(items) {
                return SectionBody::Series(points);
            }
            if let Some(table) = table_from_records(items) {
                return SectionBody::Table(table);
            }
            SectionBody::Raw(value.clone())
        }
        Value::Object(map) if map.is_empty() => SectionBody::Raw(value.clone()),
        Value::Object(map) => {
            if map.values().all(is_scalar) {
                return SectionBody::Table(Table {
                    columns: map.keys().cloned().collect(),
                    rows: vec![map.values().cloned().collect()],
                });
            }
            if let Some(group) = series_group(map) {
                return SectionBody::SeriesGroup(group);
            }
            SectionBody::Raw(value.clone())
        }
        scalar => SectionBody::Scalar(scalar.clone()),
    }
}

fn series_group(map: &Map<String, Value>) -> Option<Vec<NamedSeries>> {
    map.iter()
        .map(|(name, value)| match value {
            Value::Array(items) => numeric_points(items).map(|points| NamedSeries {
                name: name.clone(),
                points,
            }),
            _ => None,
        })
        .collect()
}

fn table_from_records(items: &[Value]) -> Option<Table> {
    if items.is_empty() {
        return None;
    }

    let mut columns: Vec<String> = Vec::new();
    for item in items {
        let Value::Object(record) = item else {
            return None;
        };
        if !record.values().all(is_scalar) {
            return None;
        }
        for key in record.keys() {
            if !columns.iter().any(|existing| existing == key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = items
        .iter()
        .filter_map(Value::as_object)
        .map(|record| {
            columns
                .iter()
                .map(|column| record.get(column).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Some(Table { columns, rows })
}

/// Compact text for a scalar cell. Floats keep two decimals.
pub fn format_scalar(value: &Value) -> String {
    match value {
        Value::Number(number) => {
            if number.is_i64() || number.is_u64() {
                number.to_string()
            } else {
                match number.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
                    Some(f) => format!("{f:.2}"),
                    None => number.to_string(),
                }
            }
        }
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    }
}

fn format_point(point: f64) -> String {
    if point.fract() == 0.0 && point.abs() < 1e15 {
        format!("{point:.0}")
    } else {
        format!("{point:.2}")
    }
}

/// Downsamples to at most `width` buckets and maps each bucket mean to a bar glyph.
pub fn sparkline(points: &[f64], width: usize) -> String {
    if points.is_empty() || width == 0 {
        return String::new();
    }

    let bucket_len = points.len().div_ceil(width);
    let buckets: Vec<f64> = points
        .chunks(bucket_len)
        .map(|chunk| chunk.iter().sum::<f64>() / chunk.len() as f64)
        .collect();

    let (min, max) = bounds(&buckets);
    let span = max - min;
    buckets
        .iter()
        .map(|value| {
            if span <= f64::EPSILON {
                SPARK_LEVELS[SPARK_LEVELS.len() / 2]
            } else {
                let scaled = ((value - min) / span * (SPARK_LEVELS.len() - 1) as f64).round();
                SPARK_LEVELS[(scaled as usize).min(SPARK_LEVELS.len() - 1)]
            }
        })
        .collect()
}

/// `(min, max)` of a non-empty slice; `(0, 0)` when empty.
pub fn bounds(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(*p), hi.max(*p))
        })
}

fn series_line(name: &str, points: &[f64]) -> String {
    if points.is_empty() {
        return format!("{name}: (empty series)");
    }
    let (min, max) = bounds(points);
    let last = points[points.len() - 1];
    format!(
        "{name}: {} n={} min={} max={} last={}",
        sparkline(points, SPARK_WIDTH),
        points.len(),
        format_point(min),
        format_point(max),
        format_point(last)
    )
}

fn render_table(out: &mut String, table: &Table) {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(format_scalar).collect())
        .collect();
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            cells
                .iter()
                .filter_map(|row| row.get(idx))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = table
        .columns
        .iter()
        .zip(widths.iter().copied())
        .map(|(column, width)| format!("{column:>width$}"))
        .collect();
    let _ = writeln!(out, "  {}", header.join("  "));
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, width)| format!("{cell:>width$}"))
            .collect();
        let _ = writeln!(out, "  {}", line.join("  "));
    }
}

pub fn render_report_text(report: &Report) -> String {
    let mut out = String::new();
    for section in &report.sections {
        match &section.body {
            SectionBody::Scalar(value) => {
                let _ = writeln!(out, "{}: {}", section.key, format_scalar(value));
            }
            SectionBody::Series(points) => {
                let _ = writeln!(out, "{}", series_line(&section.key, points));
            }
            SectionBody::SeriesGroup(group) => {
                let _ = writeln!(out, "{}", section.key);
                for series in group {
                    let _ = writeln!(out, "  {}", series_line(&series.name, &series.points));
                }
            }
            SectionBody::Table(table) => {
                let _ = writeln!(out, "{}", section.key);
                render_table(&mut out, table);
            }
            SectionBody::Raw(value) => {
                let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                let _ = writeln!(out, "{}:", section.key);
                for line in pretty.lines() {
                    let _ = writeln!(out, "  {line}");
                }
            }
        }
    }
    out
}

/// Verbatim pretty JSON, two-space indented.
pub fn render_dump(result: &SimulationResult) -> String {
    serde_json::to_string_pretty(result.as_value()).unwrap_or_else(|_| result.as_value().to_string())
}

/// Renders nothing when there is no result.
pub fn render_result(result: Option<&SimulationResult>, mode: RenderMode) -> String {
    let Some(result) = result else {
        return String::new();
    };
    match mode {
        RenderMode::Dump => render_dump(result),
        RenderMode::Report => render_report_text(&Report::from_result(result)),
    }
}

/// What the result area currently shows. Result and error never coexist.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultView {
    #[default]
    Empty,
    Pending {
        ticket: SubmissionTicket,
    },
    Ready {
        result: SimulationResult,
        received_at: DateTime<Utc>,
    },
    Failed {
        message: String,
    },
}

impl ResultView {
    pub fn result(&self) -> Option<&SimulationResult> {
        match self {
            ResultView::Ready { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ResultView::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ResultView::Pending { .. })
    }

    pub fn render_text(&self, mode: RenderMode) -> String {
        match self {
            ResultView::Empty | ResultView::Pending { .. } => String::new(),
            ResultView::Ready { .. } => render_result(self.result(), mode),
            ResultView::Failed { message } => message.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/presenter_tests.rs"]
mod tests;
