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

use crate::dataset::{Column, ColumnType, Dataset};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::aggregate::{
    aggregate_by_bucket, aggregate_by_sub_bucket, BucketRow, SubBucketRow, PARALLEL_ROW_THRESHOLD,
};
use crate::pipeline::coerce::{self, Coerced, DATE_SCALE};
use crate::pipeline::filter::{compile_filters, row_passes};
use crate::pipeline::sort::{sort_values, truncate_values};
use crate::visualisation::{SubBucketMethod, Visualisation, VisualisationSpec, VisualisationType};
use serde::Serialize;
use tracing::debug;
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    pub index: usize,
    pub x: Option<Coerced>,
    pub y: f64,
    pub bucket_value: Option<Coerced>,
    pub sub_bucket_value: Option<Coerced>,
}
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ChartValues {
    Points(Vec<DataPoint>),
    Buckets(Vec<BucketRow>),
    SubBuckets(Vec<SubBucketRow>),
}
impl ChartValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Points(values) => values.len(),
            Self::Buckets(values) => values.len(),
            Self::SubBuckets(values) => values.len(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn truncate(&mut self, limit: usize) {
        match self {
            Self::Points(values) => values.truncate(limit),
            Self::Buckets(values) => values.truncate(limit),
            Self::SubBuckets(values) => values.truncate(limit),
        }
    }
}
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_row_totals: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_column_totals: Option<bool>,
}
#[derive(Debug, Clone, Serialize)]
pub struct ChartOutput {
    pub name: String,
    pub values: ChartValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ChartMetadata>,
}
#[derive(Debug, Clone)]
pub struct ChartDataEngine {
    parallel_threshold: usize,
}
impl ChartDataEngine {
    pub fn new() -> Self {
        Self {
            parallel_threshold: PARALLEL_ROW_THRESHOLD,
        }
    }
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
    pub fn chart_data(
        &self,
        visualisation: &Visualisation,
        dataset: &Dataset,
    ) -> PipelineResult<Option<Vec<ChartOutput>>> {
        if !dataset.rows_ready() {
            return Ok(None);
        }
        let spec = &visualisation.spec;
        let visualisation_type = visualisation.visualisation_type;
        let points = self.extract_points(dataset, spec, visualisation_type)?;
        debug!(
            rows = dataset.row_count(),
            points = points.len(),
            "extracted chart points"
        );
        let mut values = if spec.bucket_column.is_some() {
            let rows = aggregate_by_bucket(
                points,
                spec.metric_aggregation,
                spec.metric_column_x.is_some(),
                spec.sub_bucket_column.is_some(),
                self.parallel_threshold,
            );
            debug!(buckets = rows.len(), "aggregated bucket rows");
            ChartValues::Buckets(rows)
        } else {
            ChartValues::Points(points)
        };
        let implicit_x_sort =
            visualisation_type.sorts_along_x() && spec.metric_column_x.is_some();
        if spec.sort.is_some() || implicit_x_sort {
            sort_values(&mut values, visualisation_type, spec);
        }
        // Sub-bucket totals must reflect only the buckets that survive
        // sorting and truncation.
        truncate_values(&mut values, visualisation_type, spec);
        values = match values {
            ChartValues::Buckets(rows) if spec.sub_bucket_column.is_some() => {
                ChartValues::SubBuckets(aggregate_by_sub_bucket(rows, spec.metric_aggregation))
            }
            other => other,
        };
        let metadata = if visualisation_type == VisualisationType::Bar
            && spec.sub_bucket_method == Some(SubBucketMethod::Stack)
        {
            Some(ChartMetadata {
                max: Some(range_max(&values)),
                ..ChartMetadata::default()
            })
        } else {
            None
        };
        Ok(Some(vec![ChartOutput {
            name: "table".to_string(),
            values,
            metadata,
        }]))
    }
    fn extract_points(
        &self,
        dataset: &Dataset,
        spec: &VisualisationSpec,
        visualisation_type: VisualisationType,
    ) -> PipelineResult<Vec<DataPoint>> {
        let y_column = named_column(dataset, &spec.metric_column_y)?;
        let x_column = spec
            .metric_column_x
            .as_deref()
            .map(|name| named_column(dataset, name))
            .transpose()?;
        let bucket_column = spec
            .bucket_column
            .as_deref()
            .map(|name| named_column(dataset, name))
            .transpose()?;
        let sub_bucket_column = spec
            .sub_bucket_column
            .as_deref()
            .map(|name| named_column(dataset, name))
            .transpose()?;
        let compiled = compile_filters(&spec.filters)?;
        let requires_x = visualisation_type.requires_x(spec);
        let mut points = Vec::new();
        for row in 0..dataset.row_count() {
            let Some(y) = y_column.to_number(row).filter(|v| v.is_finite()) else {
                continue;
            };
            if !row_passes(&compiled, dataset, row)? {
                continue;
            }
            let x = x_column
                .and_then(|column| scaled_value(column, row, spec.metric_column_x_type));
            if requires_x && x.is_none() {
                continue;
            }
            // Sub-bucket values follow the bucket column's declared type.
            let bucket_value = bucket_column
                .and_then(|column| scaled_value(column, row, spec.bucket_column_type));
            let sub_bucket_value = sub_bucket_column
                .and_then(|column| scaled_value(column, row, spec.bucket_column_type));
            points.push(DataPoint {
                index: row,
                x,
                y,
                bucket_value,
                sub_bucket_value,
            });
        }
        Ok(points)
    }
}
impl Default for ChartDataEngine {
    fn default() -> Self {
        Self::new()
    }
}
fn named_column<'a>(dataset: &'a Dataset, name: &str) -> PipelineResult<&'a Column> {
    dataset
        .column(name)
        .ok_or_else(|| PipelineError::ColumnNotFound {
            column: name.to_string(),
        })
}
fn scaled_value(column: &Column, row: usize, column_type: Option<ColumnType>) -> Option<Coerced> {
    if column_type == Some(ColumnType::Date) {
        column
            .to_number(row)
            .map(|seconds| Coerced::Number(seconds * DATE_SCALE))
    } else {
        coerce::raw(column, row)
    }
}
fn range_max(values: &ChartValues) -> f64 {
    match values {
        ChartValues::SubBuckets(rows) => rows
            .iter()
            .filter_map(|row| row.parent_metric)
            .fold(0.0, f64::max),
        _ => 0.0,
    }
}
pub fn chart_data(
    visualisation: &Visualisation,
    dataset: &Dataset,
) -> PipelineResult<Option<Vec<ChartOutput>>> {
    ChartDataEngine::new().chart_data(visualisation, dataset)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ColumnSpec, DatasetId, DatasetMetadata};
    fn dataset() -> Dataset {
        let mut dataset = Dataset::new(DatasetMetadata::new("sales"));
        dataset
            .add_column(
                ColumnSpec::new("region", ColumnType::Text),
                Column::from_strings(&[
                    Some("north".to_string()),
                    Some("north".to_string()),
                    Some("south".to_string()),
                    Some("south".to_string()),
                ]),
            )
            .unwrap();
        dataset
            .add_column(
                ColumnSpec::new("amount", ColumnType::Number),
                Column::from_numbers(vec![Some(2.0), Some(4.0), Some(10.0), None]),
            )
            .unwrap();
        dataset
    }
    fn visualisation(spec: VisualisationSpec, visualisation_type: VisualisationType) -> Visualisation {
        Visualisation {
            name: "demo".to_string(),
            visualisation_type,
            dataset_id: DatasetId::new(),
            spec,
        }
    }
    #[test]
    fn not_ready_dataset_yields_sentinel() {
        let empty = Dataset::new(DatasetMetadata::new("empty"));
        let spec = VisualisationSpec::new("amount");
        let output = chart_data(&visualisation(spec, VisualisationType::Bar), &empty).unwrap();
        assert!(output.is_none());
    }
    #[test]
    fn missing_metric_column_is_fatal() {
        let spec = VisualisationSpec::new("ghost");
        let result = chart_data(&visualisation(spec, VisualisationType::Bar), &dataset());
        assert!(matches!(
            result,
            Err(PipelineError::ColumnNotFound { .. })
        ));
    }
    #[test]
    fn output_is_one_named_table() {
        let mut spec = VisualisationSpec::new("amount");
        spec.bucket_column = Some("region".to_string());
        spec.bucket_column_type = Some(ColumnType::Text);
        let output = chart_data(&visualisation(spec, VisualisationType::Bar), &dataset())
            .unwrap()
            .unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].name, "table");
        if let ChartValues::Buckets(rows) = &output[0].values {
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].metric_y, Some(6.0));
            assert_eq!(rows[1].metric_y, Some(10.0));
        } else {
            panic!("expected bucket rows");
        }
    }
    #[test]
    fn null_y_rows_are_excluded_before_aggregation() {
        let mut spec = VisualisationSpec::new("amount");
        spec.bucket_column = Some("region".to_string());
        spec.metric_aggregation = crate::visualisation::Aggregation::Count;
        let output = chart_data(&visualisation(spec, VisualisationType::Bar), &dataset())
            .unwrap()
            .unwrap();
        if let ChartValues::Buckets(rows) = &output[0].values {
            assert_eq!(rows[0].metric_y, Some(2.0));
            assert_eq!(rows[1].metric_y, Some(1.0));
        } else {
            panic!("expected bucket rows");
        }
    }
    #[test]
    fn assembly_is_idempotent() {
        let mut spec = VisualisationSpec::new("amount");
        spec.bucket_column = Some("region".to_string());
        spec.sub_bucket_column = Some("region".to_string());
        spec.sub_bucket_method = Some(SubBucketMethod::Stack);
        let visualisation = visualisation(spec, VisualisationType::Bar);
        let dataset = dataset();
        let first = chart_data(&visualisation, &dataset).unwrap().unwrap();
        let second = chart_data(&visualisation, &dataset).unwrap().unwrap();
        let first_json = serde_json::to_value(&first).unwrap();
        let second_json = serde_json::to_value(&second).unwrap();
        assert_eq!(first_json, second_json);
    }
    #[test]
    fn stacked_bars_carry_range_max_metadata() {
        let mut spec = VisualisationSpec::new("amount");
        spec.bucket_column = Some("region".to_string());
        spec.sub_bucket_column = Some("region".to_string());
        spec.sub_bucket_method = Some(SubBucketMethod::Stack);
        let output = chart_data(&visualisation(spec, VisualisationType::Bar), &dataset())
            .unwrap()
            .unwrap();
        let metadata = output[0].metadata.as_ref().unwrap();
        assert_eq!(metadata.max, Some(10.0));
        assert!(matches!(output[0].values, ChartValues::SubBuckets(_)));
    }
    #[test]
    fn scatter_requires_x_values() {
        let mut dataset = Dataset::new(DatasetMetadata::new("xy"));
        dataset
            .add_column(
                ColumnSpec::new("amount", ColumnType::Number),
                Column::from_numbers(vec![Some(1.0), Some(2.0), Some(3.0)]),
            )
            .unwrap();
        dataset
            .add_column(
                ColumnSpec::new("when", ColumnType::Date),
                Column::from_numbers(vec![Some(100.0), None, Some(300.0)]),
            )
            .unwrap();
        let mut spec = VisualisationSpec::new("amount");
        spec.metric_column_x = Some("when".to_string());
        spec.metric_column_x_type = Some(ColumnType::Date);
        let output = chart_data(&visualisation(spec, VisualisationType::Scatter), &dataset)
            .unwrap()
            .unwrap();
        if let ChartValues::Points(points) = &output[0].values {
            assert_eq!(points.len(), 2);
            assert_eq!(points[0].x, Some(Coerced::Number(100_000.0)));
            assert_eq!(points[1].x, Some(Coerced::Number(300_000.0)));
        } else {
            panic!("expected raw points");
        }
    }
}
