//! Polars helpers for string-typed report frames.
//!
//! Every report column is stored as a Polars `String` column named after
//! its schema element. Nulls are read back as empty strings so callers
//! only ever deal with one notion of "no value".

use polars::prelude::{
    BooleanChunked, Column, DataFrame, DataType, NewChunkedArray, PolarsResult,
};

/// True when the value is empty or whitespace only.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Parses a string as `f64`, returning `None` for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Builds a frame of string columns from row-major data.
///
/// Rows shorter than `columns` are padded with empty strings; extra cells
/// are ignored.
pub fn string_frame<S: AsRef<str>>(columns: &[S], rows: &[Vec<String>]) -> PolarsResult<DataFrame> {
    let series = columns
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let values: Vec<String> = rows
                .iter()
                .map(|row| row.get(index).cloned().unwrap_or_default())
                .collect();
            Column::new(name.as_ref().into(), values)
        })
        .collect();
    DataFrame::new(series)
}

/// Whether the frame has a column with this exact name.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

/// Reads a column as owned strings, or `None` when the column is absent.
pub fn column_values(df: &DataFrame, name: &str) -> PolarsResult<Option<Vec<String>>> {
    if !has_column(df, name) {
        return Ok(None);
    }
    let column = df.column(name)?.cast(&DataType::String)?;
    let values = column
        .str()?
        .into_iter()
        .map(|value| value.unwrap_or_default().to_string())
        .collect();
    Ok(Some(values))
}

/// Keeps the rows whose mask entry is `true`.
pub fn take_rows(df: &DataFrame, mask: &[bool]) -> PolarsResult<DataFrame> {
    let mask = BooleanChunked::from_slice("selection".into(), mask);
    df.filter(&mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        string_frame(
            &["patient_state", "patient_zip_code"],
            &[
                vec!["AZ".to_string(), "85001".to_string()],
                vec!["CA".to_string()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn short_rows_are_padded() {
        let df = sample();
        assert_eq!(df.height(), 2);
        let zips = column_values(&df, "patient_zip_code").unwrap().unwrap();
        assert_eq!(zips, vec!["85001".to_string(), String::new()]);
    }

    #[test]
    fn absent_column_reads_as_none() {
        let df = sample();
        assert!(!has_column(&df, "patient_county"));
        assert_eq!(column_values(&df, "patient_county").unwrap(), None);
    }

    #[test]
    fn take_rows_applies_mask() {
        let df = sample();
        let kept = take_rows(&df, &[false, true]).unwrap();
        let states = column_values(&kept, "patient_state").unwrap().unwrap();
        assert_eq!(states, vec!["CA".to_string()]);
    }

    #[test]
    fn blank_and_numeric_helpers() {
        assert!(is_blank("   "));
        assert!(!is_blank(" x "));
        assert_eq!(parse_f64(" 3.5 "), Some(3.5));
        assert_eq!(parse_f64("abc"), None);
    }
}
