// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use crate::dataset::{ColumnType, Dataset};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::coerce::{coerce, Coerced, DATE_SCALE};
use crate::visualisation::{Filter, FilterOperation, FilterStrategy, FilterValue};
use std::cmp::Ordering;
#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Above,
    AtOrBelow,
    Below,
    AtOrAbove,
    Equals,
    NotEquals,
    Always,
}
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    pub column: String,
    pub column_type: ColumnType,
    predicate: Predicate,
    threshold: Option<Coerced>,
}
impl CompiledFilter {
    pub fn evaluate(&self, value: Option<&Coerced>) -> bool {
        let threshold = self.threshold.as_ref();
        match self.predicate {
            Predicate::Always => true,
            Predicate::NotEquals => match (value, threshold) {
                (Some(v), Some(t)) => v != t,
                _ => true,
            },
            Predicate::Equals => match (value, threshold) {
                (Some(v), Some(t)) => v == t,
                _ => false,
            },
            Predicate::Above => ordered(value, threshold, |o| o == Ordering::Greater),
            Predicate::AtOrBelow => ordered(value, threshold, |o| o != Ordering::Greater),
            Predicate::Below => ordered(value, threshold, |o| o == Ordering::Less),
            Predicate::AtOrAbove => ordered(value, threshold, |o| o != Ordering::Less),
        }
    }
}
fn ordered<F>(value: Option<&Coerced>, threshold: Option<&Coerced>, accept: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    match (value, threshold) {
        (Some(v), Some(t)) => v.compare(t).is_some_and(accept),
        _ => false,
    }
}
fn threshold_for(filter: &Filter) -> Option<Coerced> {
    match filter.column_type {
        ColumnType::Date => filter
            .value
            .as_number()
            .map(|seconds| Coerced::Number(seconds * DATE_SCALE)),
        ColumnType::Number => filter.value.as_number().map(Coerced::Number),
        _ => match &filter.value {
            FilterValue::Text(s) => Some(Coerced::Text(s.clone())),
            FilterValue::Number(v) => Some(Coerced::Text(v.to_string())),
        },
    }
}
pub fn compile_filters(filters: &[Filter]) -> PipelineResult<Vec<CompiledFilter>> {
    filters
        .iter()
        .map(|filter| {
            if !matches!(
                filter.column_type,
                ColumnType::Text | ColumnType::Number | ColumnType::Date
            ) {
                return Err(PipelineError::UnsupportedColumnType {
                    column_type: filter.column_type.to_string(),
                    context: "row filtering",
                });
            }
            let predicate = match (filter.strategy, filter.operation) {
                (FilterStrategy::IsHigher, FilterOperation::Keep) => Predicate::Above,
                (FilterStrategy::IsHigher, FilterOperation::Remove) => Predicate::AtOrBelow,
                (FilterStrategy::IsLower, FilterOperation::Keep) => Predicate::Below,
                (FilterStrategy::IsLower, FilterOperation::Remove) => Predicate::AtOrAbove,
                (FilterStrategy::Is, FilterOperation::Keep) => Predicate::Equals,
                (FilterStrategy::Is, FilterOperation::Remove) => Predicate::NotEquals,
                // isEmpty keeps its historical table: keep compares against the
                // configured value, remove matches every value.
                (FilterStrategy::IsEmpty, FilterOperation::Keep) => Predicate::Equals,
                (FilterStrategy::IsEmpty, FilterOperation::Remove) => Predicate::Always,
            };
            Ok(CompiledFilter {
                column: filter.column.clone(),
                column_type: filter.column_type,
                predicate,
                threshold: threshold_for(filter),
            })
        })
        .collect()
}
// One extracted value per filter, positionally aligned with the compiled list.
pub fn row_passes(
    compiled: &[CompiledFilter],
    dataset: &Dataset,
    row: usize,
) -> PipelineResult<bool> {
    for filter in compiled {
        let column = dataset
            .column(&filter.column)
            .ok_or_else(|| PipelineError::ColumnNotFound {
                column: filter.column.clone(),
            })?;
        let value = coerce(column, row, filter.column_type, "row filtering")?;
        if !filter.evaluate(value.as_ref()) {
            return Ok(false);
        }
    }
    Ok(true)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, ColumnSpec, DatasetMetadata};
    fn number_filter(strategy: FilterStrategy, operation: FilterOperation, value: f64) -> Filter {
        Filter {
            column: "a".to_string(),
            column_type: ColumnType::Number,
            strategy,
            operation,
            value: FilterValue::Number(value),
        }
    }
    fn dataset_with_numbers(values: Vec<Option<f64>>) -> Dataset {
        let mut dataset = Dataset::new(DatasetMetadata::new("filters"));
        dataset
            .add_column(
                ColumnSpec::new("a", ColumnType::Number),
                Column::from_numbers(values),
            )
            .unwrap();
        dataset
    }
    #[test]
    fn conjunction_over_all_predicates() {
        let dataset = dataset_with_numbers(vec![Some(5.0), Some(15.0), Some(25.0), None]);
        let filters = vec![
            number_filter(FilterStrategy::IsHigher, FilterOperation::Keep, 10.0),
            number_filter(FilterStrategy::IsLower, FilterOperation::Keep, 20.0),
        ];
        let compiled = compile_filters(&filters).unwrap();
        let survivors: Vec<usize> = (0..dataset.row_count())
            .filter(|&row| row_passes(&compiled, &dataset, row).unwrap())
            .collect();
        assert_eq!(survivors, vec![1]);
    }
    #[test]
    fn null_cells_fail_ordering_and_equality() {
        let dataset = dataset_with_numbers(vec![None]);
        for (strategy, operation) in [
            (FilterStrategy::IsHigher, FilterOperation::Keep),
            (FilterStrategy::IsHigher, FilterOperation::Remove),
            (FilterStrategy::IsLower, FilterOperation::Keep),
            (FilterStrategy::Is, FilterOperation::Keep),
        ] {
            let compiled = compile_filters(&[number_filter(strategy, operation, 10.0)]).unwrap();
            assert!(
                !row_passes(&compiled, &dataset, 0).unwrap(),
                "{strategy:?}/{operation:?} should reject null"
            );
        }
        let compiled = compile_filters(&[number_filter(
            FilterStrategy::Is,
            FilterOperation::Remove,
            10.0,
        )])
        .unwrap();
        assert!(row_passes(&compiled, &dataset, 0).unwrap());
    }
    #[test]
    fn date_thresholds_scale_to_milliseconds() {
        let dataset = {
            let mut dataset = Dataset::new(DatasetMetadata::new("dates"));
            dataset
                .add_column(
                    ColumnSpec::new("a", ColumnType::Date),
                    Column::from_numbers(vec![Some(400.0), Some(600.0)]),
                )
                .unwrap();
            dataset
        };
        let filter = Filter {
            column: "a".to_string(),
            column_type: ColumnType::Date,
            strategy: FilterStrategy::IsHigher,
            operation: FilterOperation::Keep,
            value: FilterValue::Number(500.0),
        };
        let compiled = compile_filters(&[filter]).unwrap();
        assert_eq!(compiled[0].threshold, Some(Coerced::Number(500_000.0)));
        assert!(!row_passes(&compiled, &dataset, 0).unwrap());
        assert!(row_passes(&compiled, &dataset, 1).unwrap());
    }
    #[test]
    fn is_empty_remove_matches_everything() {
        let dataset = dataset_with_numbers(vec![Some(1.0), None]);
        let compiled = compile_filters(&[number_filter(
            FilterStrategy::IsEmpty,
            FilterOperation::Remove,
            0.0,
        )])
        .unwrap();
        assert!(row_passes(&compiled, &dataset, 0).unwrap());
        assert!(row_passes(&compiled, &dataset, 1).unwrap());
    }
    #[test]
    fn is_empty_keep_compares_against_the_value() {
        let dataset = dataset_with_numbers(vec![Some(0.0), Some(3.0), None]);
        let compiled = compile_filters(&[number_filter(
            FilterStrategy::IsEmpty,
            FilterOperation::Keep,
            0.0,
        )])
        .unwrap();
        assert!(row_passes(&compiled, &dataset, 0).unwrap());
        assert!(!row_passes(&compiled, &dataset, 1).unwrap());
        assert!(!row_passes(&compiled, &dataset, 2).unwrap());
    }
    #[test]
    fn missing_filter_column_aborts_the_run() {
        let dataset = dataset_with_numbers(vec![Some(1.0)]);
        let mut filter = number_filter(FilterStrategy::Is, FilterOperation::Keep, 1.0);
        filter.column = "ghost".to_string();
        let compiled = compile_filters(&[filter]).unwrap();
        assert!(matches!(
            row_passes(&compiled, &dataset, 0),
            Err(PipelineError::ColumnNotFound { .. })
        ));
    }
    #[test]
    fn geopoint_filters_are_rejected_at_compile_time() {
        let mut filter = number_filter(FilterStrategy::Is, FilterOperation::Keep, 1.0);
        filter.column_type = ColumnType::Geopoint;
        assert!(matches!(
            compile_filters(&[filter]),
            Err(PipelineError::UnsupportedColumnType { .. })
        ));
    }
}
