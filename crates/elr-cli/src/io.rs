//! CSV reports in and out of the CLI.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use elr_model::{Report, Schema, Source};
use tracing::{debug, warn};

/// Reads a CSV report whose header names elements of `schema`.
///
/// Header matching is case-insensitive. Elements missing from the header
/// are blank; unknown header columns are ignored with a warning.
pub fn read_report<R: Read>(reader: R, schema: &Arc<Schema>, source: Source) -> Result<Report> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().context("read CSV header")?.clone();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (index, header) in headers.iter().enumerate() {
        positions.entry(header.to_lowercase()).or_insert(index);
    }
    let known: Vec<Option<usize>> = schema
        .elements()
        .iter()
        .map(|element| positions.get(&element.name.to_lowercase()).copied())
        .collect();
    for header in headers.iter() {
        if !schema
            .elements()
            .iter()
            .any(|element| element.name.eq_ignore_ascii_case(header))
        {
            warn!(
                column = header,
                schema = schema.name(),
                "column is not a schema element; ignored"
            );
        }
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("read CSV record {}", line + 1))?;
        let row: Vec<String> = known
            .iter()
            .map(|&position| {
                position
                    .and_then(|index| record.get(index))
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();
        rows.push(row);
    }
    if rows.is_empty() {
        bail!("report has no rows");
    }
    debug!(rows = rows.len(), schema = schema.name(), "report read");
    Report::new(Arc::clone(schema), &rows, vec![source]).context("build report")
}

/// Reads the CSV report at `path`.
pub fn read_report_file(path: &Path, schema: &Arc<Schema>) -> Result<Report> {
    let file = std::fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let source = Source::File {
        path: path.display().to_string(),
        digest: None,
    };
    read_report(file, schema, source).with_context(|| format!("read {}", path.display()))
}

/// Writes `report` as CSV, one column per schema element.
pub fn write_report<W: Write>(writer: W, report: &Report) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    let names: Vec<&str> = report.schema().element_names().collect();
    writer.write_record(&names).context("write CSV header")?;

    let mut columns = Vec::with_capacity(names.len());
    for name in &names {
        let values = report
            .column(name)
            .with_context(|| format!("read column {name}"))?
            .unwrap_or_else(|| vec![String::new(); report.item_count()]);
        columns.push(values);
    }
    for row in 0..report.item_count() {
        writer
            .write_record(columns.iter().map(|column| column[row].as_str()))
            .context("write CSV record")?;
    }
    writer.flush().context("flush CSV")?;
    Ok(())
}
