//! Result rendering: rows as table/json/csv, status as text or JSON.
//!
//! Rendering trusts the engine's result contract. A `rows`-typed output whose
//! result lacks the expected step output raises rather than printing nothing,
//! so "zero rows" is never confused with "missing data".

use std::io::Write;
use std::str::FromStr;

use serde_json::{json, Map, Value};

use crate::engine::ExecutionResult;
use crate::error::{LifeError, Result};
use crate::jobdef::{OutputKind, OutputSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = LifeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(LifeError::UnknownFormat(other.to_string())),
        }
    }
}

/// Render `result` per the definition's output spec.
///
/// A failed run renders as status regardless of output type — rows are never
/// extracted from a failed run.
pub fn render<W: Write>(
    result: &ExecutionResult,
    spec: &OutputSpec,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    if !result.success || spec.kind == OutputKind::Status {
        return render_status(result, format, out);
    }
    let rows = extract_rows(result, spec)?;
    render_rows(rows, format, out)
}

/// Pull the row collection out of `step_outputs[source_step]["items"]`.
fn extract_rows<'a>(result: &'a ExecutionResult, spec: &OutputSpec) -> Result<&'a [Value]> {
    let step = result.step_outputs.get(&spec.source_step).ok_or_else(|| {
        LifeError::RenderContract(format!(
            "result has no '{}' step output",
            spec.source_step
        ))
    })?;
    step.get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| {
            LifeError::RenderContract(format!(
                "step output '{}' has no 'items' array",
                spec.source_step
            ))
        })
}

fn render_rows<W: Write>(rows: &[Value], format: OutputFormat, out: &mut W) -> Result<()> {
    match format {
        OutputFormat::Json => {
            for row in rows {
                writeln!(out, "{}", serde_json::to_string(row)?)?;
            }
            Ok(())
        }
        OutputFormat::Csv => render_csv(rows, out),
        OutputFormat::Table => render_table(rows, out),
    }
}

fn render_status<W: Write>(
    result: &ExecutionResult,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    if format == OutputFormat::Json {
        writeln!(
            out,
            "{}",
            json!({"run_id": result.run_id, "success": result.success})
        )?;
        return Ok(());
    }
    writeln!(out, "Run ID: {}", result.run_id)?;
    writeln!(out, "Status: {}", if result.success { "ok" } else { "FAILED" })?;
    Ok(())
}

fn row_fields(row: &Value) -> Result<&Map<String, Value>> {
    row.as_object()
        .ok_or_else(|| LifeError::RenderContract("row items must be objects".to_string()))
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Header from the first row's keys, then data rows. Zero rows produces no
/// output at all — not even a header.
fn render_csv<W: Write>(rows: &[Value], out: &mut W) -> Result<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let headers: Vec<&str> = row_fields(first)?.keys().map(String::as_str).collect();

    let header_line: Vec<String> = headers.iter().map(|h| csv_field(h)).collect();
    writeln!(out, "{}", header_line.join(","))?;

    for row in rows {
        let fields = row_fields(row)?;
        let line: Vec<String> = headers
            .iter()
            .map(|h| fields.get(*h).map(|v| csv_field(&cell(v))).unwrap_or_default())
            .collect();
        writeln!(out, "{}", line.join(","))?;
    }
    Ok(())
}

fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn render_table<W: Write>(rows: &[Value], out: &mut W) -> Result<()> {
    if rows.is_empty() {
        writeln!(out, "(no rows)")?;
        return Ok(());
    }
    let headers: Vec<&str> = row_fields(&rows[0])?.keys().map(String::as_str).collect();

    // Calculate column widths
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        let fields = row_fields(row)?;
        for (i, h) in headers.iter().enumerate() {
            if let Some(v) = fields.get(*h) {
                widths[i] = widths[i].max(cell(v).len());
            }
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    writeln!(out, "{}", header_line.join("  "))?;

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    writeln!(out, "{}", sep.join("  "))?;

    for row in rows {
        let fields = row_fields(row)?;
        let cells: Vec<String> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let v = fields.get(*h).map(|v| cell(v)).unwrap_or_default();
                format!("{:width$}", v, width = widths[i])
            })
            .collect();
        writeln!(out, "{}", cells.join("  "))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
