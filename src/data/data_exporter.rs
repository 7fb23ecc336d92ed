use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::data::column::ColumnSet;
use crate::data::data_view::DataView;
use crate::data::record::{DataValue, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    /// Plain-text document, one section per record plus a total
    Statement,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Statement => "txt",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Statement => write!(f, "statement"),
        }
    }
}

/// What to put in an export besides the rows themselves
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub title: String,
    /// Column keys to include, in order. None means every described column.
    pub columns: Option<Vec<String>>,
    /// Numeric column summed into a total line
    pub total_column: Option<String>,
    pub total_label: String,
    pub currency: String,
}

impl ExportRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            columns: None,
            total_column: None,
            total_label: "TOTAL".to_string(),
            currency: "Rs.".to_string(),
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_total(mut self, column: impl Into<String>) -> Self {
        self.total_column = Some(column.into());
        self
    }

    pub fn with_total_label(mut self, label: impl Into<String>) -> Self {
        self.total_label = label.into();
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}

/// Rows projected for a serializer: labels instead of keys, values in
/// header order
#[derive(Debug, Clone)]
pub struct ExportBatch {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<DataValue>>,
    pub total: Option<f64>,
    pub total_label: String,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub row_count: usize,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum ExportOutcome {
    Exported(ExportArtifact),
    /// The filtered view was empty; nothing was serialized
    NoRows,
}

/// Turns an export batch into the bytes of a file
pub trait ExportSerializer {
    fn format(&self) -> ExportFormat;
    fn serialize(&self, batch: &ExportBatch) -> Result<Vec<u8>>;
}

pub fn serializer_for(format: ExportFormat) -> Box<dyn ExportSerializer> {
    match format {
        ExportFormat::Csv => Box::new(CsvExporter),
        ExportFormat::Json => Box::new(JsonExporter),
        ExportFormat::Statement => Box::new(StatementExporter::default()),
    }
}

/// Export the filtered rows of a view. Never reads the page window.
pub fn export_view(
    view: &DataView,
    columns: &ColumnSet,
    serializer: &dyn ExportSerializer,
    request: &ExportRequest,
) -> Result<ExportOutcome> {
    if view.filtered_count() == 0 {
        info!(target: "export", "No records to export based on current filters");
        return Ok(ExportOutcome::NoRows);
    }

    let total = request
        .total_column
        .as_deref()
        .map(|column| view.total(column));
    export_records(&view.filtered_rows(), total, columns, serializer, request)
}

/// Export the selected rows of a view. Selected keys hidden by the current
/// filters are not exported.
pub fn export_selection(
    view: &DataView,
    columns: &ColumnSet,
    serializer: &dyn ExportSerializer,
    request: &ExportRequest,
) -> Result<ExportOutcome> {
    if view.selected_count() == 0 {
        info!(target: "export", "No selected rows to export");
        return Ok(ExportOutcome::NoRows);
    }

    let total = request
        .total_column
        .as_deref()
        .map(|column| view.selected_total(column));
    export_records(&view.selected_rows(), total, columns, serializer, request)
}

fn export_records(
    records: &[Record<'_>],
    total: Option<f64>,
    columns: &ColumnSet,
    serializer: &dyn ExportSerializer,
    request: &ExportRequest,
) -> Result<ExportOutcome> {
    let batch = build_batch(records, total, columns, request)?;
    let bytes = serializer.serialize(&batch)?;

    info!(
        target: "export",
        "Exported {} rows of '{}' as {} ({} bytes)",
        batch.rows.len(),
        batch.title,
        serializer.format(),
        bytes.len()
    );

    Ok(ExportOutcome::Exported(ExportArtifact {
        format: serializer.format(),
        row_count: batch.rows.len(),
        bytes,
    }))
}

/// Project records onto the requested columns
fn build_batch(
    records: &[Record<'_>],
    total: Option<f64>,
    columns: &ColumnSet,
    request: &ExportRequest,
) -> Result<ExportBatch> {
    let selected: Vec<_> = match &request.columns {
        Some(keys) => keys
            .iter()
            .map(|key| {
                columns
                    .get(key)
                    .ok_or_else(|| anyhow!("Unknown export column '{}'", key))
            })
            .collect::<Result<_>>()?,
        None => columns.iter().collect(),
    };

    if selected.is_empty() {
        bail!("No columns to export for '{}'", request.title);
    }

    let headers = selected
        .iter()
        .map(|c| c.descriptor.label.clone())
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            selected
                .iter()
                .map(|c| record.get_at(c.position).cloned().unwrap_or(DataValue::Null))
                .collect()
        })
        .collect();

    Ok(ExportBatch {
        title: request.title.clone(),
        headers,
        rows,
        total,
        total_label: request.total_label.clone(),
        currency: request.currency.clone(),
    })
}

/// Header row plus one line per record. Fields holding a delimiter, quote
/// or newline are quoted.
pub struct CsvExporter;

impl ExportSerializer for CsvExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn serialize(&self, batch: &ExportBatch) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&batch.headers)?;
        for row in &batch.rows {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to finish CSV export: {}", e))
    }
}

pub struct JsonExporter;

impl ExportSerializer for JsonExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn serialize(&self, batch: &ExportBatch) -> Result<Vec<u8>> {
        let rows: Vec<Value> = batch
            .rows
            .iter()
            .map(|row| {
                let obj: Map<String, Value> = batch
                    .headers
                    .iter()
                    .cloned()
                    .zip(row.iter().map(data_value_to_json))
                    .collect();
                Value::Object(obj)
            })
            .collect();

        let mut doc = json!({
            "title": batch.title,
            "count": rows.len(),
            "rows": rows,
        });
        if let Some(total) = batch.total {
            doc["total"] = json!(total);
        }

        Ok(serde_json::to_vec_pretty(&doc)?)
    }
}

/// Paginated plain-text document: a title block, one numbered section per
/// record, a form feed between pages and the total at the end
pub struct StatementExporter {
    pub records_per_page: usize,
}

impl Default for StatementExporter {
    fn default() -> Self {
        Self {
            records_per_page: 20,
        }
    }
}

impl ExportSerializer for StatementExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Statement
    }

    fn serialize(&self, batch: &ExportBatch) -> Result<Vec<u8>> {
        let per_page = self.records_per_page.max(1);
        let pages = batch.rows.len().div_ceil(per_page).max(1);
        let label_width = batch.headers.iter().map(|h| h.len()).max().unwrap_or(0);

        let mut out = String::new();
        for (page_idx, chunk) in batch.rows.chunks(per_page).enumerate() {
            if page_idx > 0 {
                out.push('\x0c');
            }
            writeln!(out, "{}", batch.title)?;
            writeln!(out, "{}", "=".repeat(batch.title.chars().count()))?;
            writeln!(
                out,
                "Records: {}    Page {} of {}",
                batch.rows.len(),
                page_idx + 1,
                pages
            )?;

            for (offset, row) in chunk.iter().enumerate() {
                writeln!(out)?;
                writeln!(out, "[{}]", page_idx * per_page + offset + 1)?;
                for (header, value) in batch.headers.iter().zip(row) {
                    writeln!(out, "  {:<width$} : {}", header, value, width = label_width)?;
                }
            }
        }

        if let Some(total) = batch.total {
            writeln!(out)?;
            writeln!(out, "{}", "-".repeat(40))?;
            writeln!(
                out,
                "{}: {} {}",
                batch.total_label,
                batch.currency,
                format_amount(total)
            )?;
        }

        Ok(out.into_bytes())
    }
}

/// Write an exported artifact as `<stem>_<YYYY-MM-DD>.<ext>` under `dir`
pub fn write_export(artifact: &ExportArtifact, dir: &Path, stem: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {:?}", dir))?;

    let date = Local::now().format("%Y-%m-%d");
    let path = dir.join(format!("{}_{}.{}", stem, date, artifact.format.extension()));

    fs::write(&path, &artifact.bytes)
        .with_context(|| format!("Failed to write export file {:?}", path))?;

    info!(
        target: "export",
        "Wrote {} rows to {}",
        artifact.row_count,
        path.display()
    );
    Ok(path)
}

/// Group thousands the way the back-office shows money: 12450 -> "12,450",
/// 1234.5 -> "1,234.50"
pub fn format_amount(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative && cents > 0 { "-" } else { "" };
    if fraction == 0 {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{:02}", sign, grouped, fraction)
    }
}

fn data_value_to_json(value: &DataValue) -> Value {
    match value {
        DataValue::String(s) => Value::String(s.clone()),
        DataValue::Integer(i) => json!(i),
        DataValue::Float(f) => json!(f),
        DataValue::Boolean(b) => Value::Bool(*b),
        DataValue::Date(_) | DataValue::DateTime(_) => Value::String(value.to_string()),
        DataValue::Null => Value::Null,
    }
}
