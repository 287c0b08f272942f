//! Immutable tabular reports and their provenance.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use elr_common::{column_values, has_column, string_frame, take_rows};
use polars::prelude::{Column, DataFrame};

use crate::error::{ModelError, Result};
use crate::ids::ReportId;
use crate::receiver::Receiver;
use crate::schema::Schema;
use crate::selection::Selection;

/// Where a report's rows came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Rows read from a file, with an optional content digest.
    File { path: String, digest: Option<String> },
    /// Rows submitted by a named sending client.
    Client { name: String },
    /// Rows derived from another report by a named action.
    Report { id: ReportId, action: String },
}

impl Source {
    pub fn derived(id: ReportId, action: impl Into<String>) -> Self {
        Source::Report {
            id,
            action: action.into(),
        }
    }
}

/// Rows of one schema plus provenance and an optional destination.
///
/// Columns are the schema's elements in schema order. Every operation
/// returns a new report; the receiver of the call is left untouched.
#[derive(Debug, Clone)]
pub struct Report {
    id: ReportId,
    schema: Arc<Schema>,
    data: DataFrame,
    sources: Vec<Source>,
    destination: Option<Arc<Receiver>>,
    created_at: DateTime<Utc>,
    item_count_before_quality_filter: Option<usize>,
}

impl Report {
    /// Builds a report from row-major values in schema element order.
    pub fn new(schema: Arc<Schema>, rows: &[Vec<String>], sources: Vec<Source>) -> Result<Self> {
        let names: Vec<&str> = schema.element_names().collect();
        let data = string_frame(&names, rows)?;
        Ok(Self::assemble(schema, data, sources))
    }

    /// A report with no rows.
    pub fn empty(schema: Arc<Schema>, sources: Vec<Source>) -> Result<Self> {
        Self::new(schema, &[], sources)
    }

    /// Adopts a frame, conforming it to the schema: columns are reordered
    /// to schema order, absent elements become empty columns, and columns
    /// outside the schema are dropped.
    pub fn from_frame(
        schema: Arc<Schema>,
        frame: &DataFrame,
        sources: Vec<Source>,
    ) -> Result<Self> {
        let data = conform(&schema, frame)?;
        Ok(Self::assemble(schema, data, sources))
    }

    fn assemble(schema: Arc<Schema>, data: DataFrame, sources: Vec<Source>) -> Self {
        Self {
            id: ReportId::new(),
            schema,
            data,
            sources,
            destination: None,
            created_at: Utc::now(),
            item_count_before_quality_filter: None,
        }
    }

    fn derive(&self, schema: Arc<Schema>, data: DataFrame, action: &str) -> Self {
        Self {
            id: ReportId::new(),
            schema,
            data,
            sources: vec![Source::derived(self.id, action)],
            destination: self.destination.clone(),
            created_at: Utc::now(),
            item_count_before_quality_filter: self.item_count_before_quality_filter,
        }
    }

    pub fn id(&self) -> ReportId {
        self.id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn destination(&self) -> Option<&Arc<Receiver>> {
        self.destination.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn item_count(&self) -> usize {
        self.data.height()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    pub fn item_count_before_quality_filter(&self) -> Option<usize> {
        self.item_count_before_quality_filter
    }

    /// Values of one element, or `None` when the report has no such column.
    pub fn column(&self, name: &str) -> Result<Option<Vec<String>>> {
        Ok(column_values(&self.data, name)?)
    }

    /// Single cell; `None` for an unknown column or out-of-range row.
    pub fn get_string(&self, row: usize, column: &str) -> Result<Option<String>> {
        Ok(self
            .column(column)?
            .and_then(|values| values.into_iter().nth(row)))
    }

    /// Keeps the selected rows.
    pub fn filtered(&self, selection: &Selection, action: &str) -> Result<Report> {
        let data = take_rows(&self.data, selection.mask())?;
        Ok(self.derive(Arc::clone(&self.schema), data, action))
    }

    /// Records how many rows existed before quality filtering.
    #[must_use]
    pub fn with_item_count_before_quality_filter(mut self, count: usize) -> Report {
        self.item_count_before_quality_filter = Some(count);
        self
    }

    /// Same provenance and destination, new schema and rows.
    pub fn with_mapped_data(
        &self,
        schema: Arc<Schema>,
        data: &DataFrame,
        action: &str,
    ) -> Result<Report> {
        let data = conform(&schema, data)?;
        Ok(self.derive(schema, data, action))
    }

    /// Forks the report for delivery to `receiver`.
    pub fn bind(&self, receiver: Arc<Receiver>) -> Report {
        let mut bound = self.derive(Arc::clone(&self.schema), self.data.clone(), "bind");
        bound.destination = Some(receiver);
        bound
    }

    /// Replaces every PII element's values with that element's default
    /// (blank when it has none). Other columns are untouched.
    pub fn deidentify(&self) -> Result<Report> {
        let mut data = self.data.clone();
        let height = data.height();
        for element in self.schema.elements().iter().filter(|element| element.is_pii()) {
            if !has_column(&data, &element.name) {
                continue;
            }
            let replacement = element.default_value().unwrap_or_default().to_string();
            data.with_column(Column::new(
                element.name.as_str().into(),
                vec![replacement; height],
            ))?;
        }
        Ok(self.derive(Arc::clone(&self.schema), data, "deidentify"))
    }

    /// Concatenates reports of one schema into a new report.
    pub fn merge(reports: &[Report]) -> Result<Report> {
        let (first, rest) = reports.split_first().ok_or(ModelError::EmptyMerge)?;
        let mut data = first.data.clone();
        for report in rest {
            if report.schema.name() != first.schema.name() {
                return Err(ModelError::SchemaMismatch {
                    expected: first.schema.name().to_string(),
                    found: report.schema.name().to_string(),
                });
            }
            data.vstack_mut(&report.data)?;
        }
        let mut merged = Self::assemble(Arc::clone(&first.schema), data, Vec::new());
        merged.sources = reports
            .iter()
            .map(|report| Source::derived(report.id, "merge"))
            .collect();
        merged.destination = first.destination.clone();
        Ok(merged)
    }

    /// Splits into consecutive reports of at most `max_items` rows.
    pub fn split(&self, max_items: usize) -> Result<Vec<Report>> {
        let max_items = max_items.max(1);
        let height = self.item_count();
        if height <= max_items {
            return Ok(vec![self.derive(
                Arc::clone(&self.schema),
                self.data.clone(),
                "split",
            )]);
        }
        let mut parts = Vec::with_capacity(height.div_ceil(max_items));
        let mut offset = 0;
        while offset < height {
            let slice = self.data.slice(offset as i64, max_items);
            parts.push(self.derive(Arc::clone(&self.schema), slice, "split"));
            offset += max_items;
        }
        Ok(parts)
    }
}

fn conform(schema: &Schema, frame: &DataFrame) -> Result<DataFrame> {
    let height = frame.height();
    let mut columns = Vec::with_capacity(schema.elements().len());
    for name in schema.element_names() {
        let values = column_values(frame, name)?.unwrap_or_else(|| vec![String::new(); height]);
        columns.push(Column::new(name.into(), values));
    }
    Ok(DataFrame::new(columns)?)
}
