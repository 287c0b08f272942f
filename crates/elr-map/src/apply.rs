//! Row-by-row application of a [`Mapping`].

use std::collections::HashMap;

use elr_common::is_blank;
use elr_mapper::{ElementAndValue, MapperContext};
use elr_model::{Element, Report};
use polars::prelude::{Column, DataFrame};

use crate::error::{MappingError, Result};
use crate::mapping::Mapping;

const TRANSLATE_ACTION: &str = "translate";

/// Code in the target element's value set for a source code, going
/// through the shared display text.
fn translate_code(to: &Element, from: &Element, code: &str) -> Option<String> {
    let (Some(to_set), Some(from_set)) = (&to.value_set_ref, &from.value_set_ref) else {
        return None;
    };
    if let Some(display) = from_set.to_display_from_code(code)
        && let Some(translated) = to_set.to_code_from_display(display)
    {
        return Some(translated.to_string());
    }
    to_set.to_normalized_code(code).map(str::to_string)
}

/// Rewrites `report` into the mapping's target schema.
///
/// Copies, translations and defaults are filled first. Mappers then run
/// in dependency order, reading each dependency from the row being built
/// and falling back to the source row. Blank results take the element's
/// default.
pub fn apply_mapping(
    report: &Report,
    mapping: &Mapping,
    ctx: &MapperContext<'_>,
) -> Result<Report> {
    if !mapping.missing.is_empty() {
        return Err(MappingError::MissingElements {
            from: mapping.from_schema.name().to_string(),
            to: mapping.to_schema.name().to_string(),
            missing: mapping.missing.iter().cloned().collect(),
        });
    }
    if report.schema().name() != mapping.from_schema.name() {
        return Err(MappingError::WrongSource {
            expected: mapping.from_schema.name().to_string(),
            found: report.schema().name().to_string(),
        });
    }

    let height = report.item_count();
    let from = &mapping.from_schema;
    let to = &mapping.to_schema;

    let mut source: HashMap<&str, Vec<String>> = HashMap::new();
    for name in from.element_names() {
        let values = report.column(name)?.unwrap_or_else(|| vec![String::new(); height]);
        source.insert(name, values);
    }

    // Pass 1: copies, translations and constants.
    let mut columns: Vec<Vec<String>> = Vec::with_capacity(to.elements().len());
    for element in to.elements() {
        let name = element.name.as_str();
        let column = if let Some(from_name) = mapping.use_directly.get(name) {
            source.get(from_name.as_str()).cloned().unwrap_or_else(|| vec![String::new(); height])
        } else if let Some(from_name) = mapping.use_value_set.get(name) {
            let from_element = from.find_element(from_name);
            source
                .get(from_name.as_str())
                .map(|codes| {
                    codes
                        .iter()
                        .map(|code| match from_element {
                            Some(from_element) if !is_blank(code) => {
                                translate_code(element, from_element, code).unwrap_or_default()
                            }
                            _ => String::new(),
                        })
                        .collect()
                })
                .unwrap_or_else(|| vec![String::new(); height])
        } else if let Some(value) = mapping.use_default.get(name) {
            vec![value.clone(); height]
        } else {
            vec![String::new(); height]
        };
        columns.push(column);
    }

    // Pass 2: mappers, then defaults for whatever is still blank.
    let positions: HashMap<&str, usize> = to
        .elements()
        .iter()
        .enumerate()
        .map(|(position, element)| (element.name.as_str(), position))
        .collect();
    for row in 0..height {
        for name in &mapping.mapper_order {
            let (Some(&position), Some(compiled)) =
                (positions.get(name.as_str()), mapping.mappers.get(name))
            else {
                continue;
            };
            let element = &to.elements()[position];
            let current = &columns[position][row];
            let primary = mapping.use_mapper.contains_key(name);
            if !primary && !is_blank(current) && !element.mapper_overrides_value() {
                continue;
            }
            let mut values = Vec::with_capacity(compiled.value_names.len());
            for dependency in &compiled.value_names {
                let Some(dependency_element) = to
                    .find_element(dependency)
                    .or_else(|| from.find_element(dependency))
                else {
                    continue;
                };
                let built = positions
                    .get(dependency.as_str())
                    .map(|&index| columns[index][row].as_str())
                    .filter(|value| !is_blank(value));
                let value = built.or_else(|| {
                    source
                        .get(dependency.as_str())
                        .map(|column| column[row].as_str())
                        .filter(|value| !is_blank(value))
                });
                if let Some(value) = value {
                    values.push(ElementAndValue::new(dependency_element, value));
                }
            }
            let computed = compiled
                .mapper
                .apply(element, compiled.call.args(), &values, ctx)
                .map_err(|source| MappingError::Mapper {
                    schema: to.name().to_string(),
                    element: name.clone(),
                    source,
                })?;
            columns[position][row] = computed.unwrap_or_default();
        }
        for (position, element) in to.elements().iter().enumerate() {
            let Some(fallback) = mapping.fallbacks.get(&element.name) else {
                continue;
            };
            let value = &mut columns[position][row];
            if is_blank(value) || element.default_overrides_value() {
                *value = fallback.clone();
            }
        }
    }

    let frame = DataFrame::new(
        to.elements()
            .iter()
            .zip(columns)
            .map(|(element, values)| Column::new(element.name.as_str().into(), values))
            .collect(),
    )?;
    Ok(report.with_mapped_data(std::sync::Arc::clone(to), &frame, TRANSLATE_ACTION)?)
}
