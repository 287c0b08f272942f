//! Generic string tables consulted by lookup mappers.

use std::collections::BTreeSet;

use crate::error::{ModelError, Result};

/// A named table of string cells with a header row.
///
/// Column names and cell comparisons are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl LookupTable {
    /// Builds a table; short rows are padded with empty cells.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Result<Self> {
        let name = name.into();
        let mut seen = BTreeSet::new();
        for column in &columns {
            let key = column.trim().to_lowercase();
            if key.is_empty() || !seen.insert(key) {
                return Err(ModelError::invalid_name(
                    "lookup table column",
                    format!("{name}.{column}"),
                ));
            }
        }
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Ok(Self {
            name,
            columns,
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        let column = column.trim();
        self.columns
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(column))
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Starts a row filter; see [`LookupFilter`].
    pub fn filter(&self) -> LookupFilter<'_> {
        LookupFilter {
            table: self,
            predicates: Vec::new(),
        }
    }

    /// Value of `lookup_column` for rows equal to every `(column, value)`
    /// pair, when exactly one distinct value results.
    pub fn lookup_value(&self, lookup_column: &str, matches: &[(&str, &str)]) -> Option<String> {
        matches
            .iter()
            .fold(self.filter(), |filter, (column, value)| {
                filter.equals_ignore_case(column, value)
            })
            .find_single_result(lookup_column)
    }

    /// Like [`LookupTable::lookup_value`] but matching column prefixes.
    pub fn lookup_prefix_value(
        &self,
        lookup_column: &str,
        prefixes: &[(&str, &str)],
    ) -> Option<String> {
        prefixes
            .iter()
            .fold(self.filter(), |filter, (column, value)| {
                filter.starts_with_ignore_case(column, value)
            })
            .find_single_result(lookup_column)
    }

    pub fn distinct_values(&self, column: &str) -> BTreeSet<String> {
        let Some(index) = self.column_index(column) else {
            return BTreeSet::new();
        };
        self.rows.iter().map(|row| row[index].clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Equals(String, String),
    NotEquals(String, String),
    StartsWith(String, String),
}

/// Accumulates case-insensitive row predicates over a [`LookupTable`].
///
/// A predicate naming a column the table lacks matches no row.
#[derive(Debug, Clone)]
pub struct LookupFilter<'a> {
    table: &'a LookupTable,
    predicates: Vec<Predicate>,
}

impl<'a> LookupFilter<'a> {
    #[must_use]
    pub fn equals_ignore_case(mut self, column: &str, value: &str) -> Self {
        self.predicates
            .push(Predicate::Equals(column.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn not_equals_ignore_case(mut self, column: &str, value: &str) -> Self {
        self.predicates
            .push(Predicate::NotEquals(column.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn starts_with_ignore_case(mut self, column: &str, prefix: &str) -> Self {
        self.predicates
            .push(Predicate::StartsWith(column.to_string(), prefix.to_string()));
        self
    }

    fn matching_rows(&self) -> Vec<&'a [String]> {
        let mut resolved = Vec::with_capacity(self.predicates.len());
        for predicate in &self.predicates {
            let (column, value) = match predicate {
                Predicate::Equals(column, value)
                | Predicate::NotEquals(column, value)
                | Predicate::StartsWith(column, value) => (column, value.to_lowercase()),
            };
            let Some(index) = self.table.column_index(column) else {
                return Vec::new();
            };
            resolved.push((predicate, index, value));
        }
        self.table
            .rows
            .iter()
            .filter(|row| {
                resolved.iter().all(|(predicate, index, value)| {
                    let cell = row[*index].to_lowercase();
                    match predicate {
                        Predicate::Equals(..) => cell == *value,
                        Predicate::NotEquals(..) => cell != *value,
                        Predicate::StartsWith(..) => cell.starts_with(value.as_str()),
                    }
                })
            })
            .map(Vec::as_slice)
            .collect()
    }

    /// Distinct values of `column` over the matching rows, in row order.
    pub fn find_all_unique(&self, column: &str) -> Vec<String> {
        let Some(index) = self.table.column_index(column) else {
            return Vec::new();
        };
        let mut unique: Vec<String> = Vec::new();
        for row in self.matching_rows() {
            if !unique.contains(&row[index]) {
                unique.push(row[index].clone());
            }
        }
        unique
    }

    /// The single distinct value of `column` over the matching rows.
    pub fn find_single_result(&self, column: &str) -> Option<String> {
        let mut unique = self.find_all_unique(column);
        if unique.len() == 1 { unique.pop() } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zips() -> LookupTable {
        let rows = [
            ["85001", "AZ", "Maricopa"],
            ["85002", "AZ", "Maricopa"],
            ["90210", "CA", "Los Angeles"],
            ["90211", "CA", "Los Angeles"],
            ["90212", "CA", "Orange"],
        ];
        LookupTable::new(
            "zip-code-data",
            vec!["zipcode".into(), "state_abbr".into(), "county".into()],
            rows.iter()
                .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn single_result_requires_one_distinct_value() {
        let table = zips();
        assert_eq!(
            table.lookup_value("county", &[("ZIPCODE", "85001")]),
            Some("Maricopa".to_string())
        );
        assert_eq!(
            table.lookup_value("STATE_ABBR", &[("county", "maricopa")]),
            Some("AZ".to_string())
        );
        assert_eq!(table.lookup_value("county", &[("state_abbr", "ca")]), None);
    }

    #[test]
    fn prefix_and_negative_predicates() {
        let table = zips();
        assert_eq!(
            table.lookup_prefix_value("state_abbr", &[("zipcode", "850")]),
            Some("AZ".to_string())
        );
        let county = table
            .filter()
            .equals_ignore_case("state_abbr", "CA")
            .not_equals_ignore_case("county", "los angeles")
            .find_single_result("county");
        assert_eq!(county.as_deref(), Some("Orange"));
    }

    #[test]
    fn unknown_columns_match_nothing() {
        let table = zips();
        assert_eq!(table.lookup_value("county", &[("fips", "04013")]), None);
        assert!(table.distinct_values("fips").is_empty());
        assert_eq!(table.distinct_values("state_abbr").len(), 2);
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let error = LookupTable::new("t", vec!["a".into(), "A".into()], vec![]);
        assert!(error.is_err());
    }
}
