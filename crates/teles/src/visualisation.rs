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

use crate::dataset::ColumnType;
use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Deserializer, Serialize};
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualisationType {
    Bar,
    Line,
    Area,
    Pie,
    Donut,
    Scatter,
    Map,
}
impl VisualisationType {
    pub fn from_name(name: &str) -> PipelineResult<Self> {
        match name {
            "bar" => Ok(Self::Bar),
            "line" => Ok(Self::Line),
            "area" => Ok(Self::Area),
            "pie" => Ok(Self::Pie),
            "donut" => Ok(Self::Donut),
            "scatter" => Ok(Self::Scatter),
            "map" => Ok(Self::Map),
            other => Err(PipelineError::UnsupportedVisualisationType {
                name: other.to_string(),
            }),
        }
    }
    pub fn requires_x(&self, spec: &VisualisationSpec) -> bool {
        match self {
            Self::Line | Self::Area => spec.metric_column_x.is_some(),
            Self::Scatter | Self::Map => true,
            Self::Bar | Self::Pie | Self::Donut => false,
        }
    }
    pub fn sorts_along_x(&self) -> bool {
        matches!(self, Self::Line | Self::Area)
    }
    pub fn supports_truncation(&self) -> bool {
        matches!(self, Self::Bar)
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterStrategy {
    IsHigher,
    IsLower,
    Is,
    IsEmpty,
}
impl FilterStrategy {
    pub fn from_name(name: &str) -> PipelineResult<Self> {
        match name {
            "isHigher" => Ok(Self::IsHigher),
            "isLower" => Ok(Self::IsLower),
            "is" => Ok(Self::Is),
            "isEmpty" => Ok(Self::IsEmpty),
            other => Err(PipelineError::UnsupportedFilterStrategy {
                strategy: other.to_string(),
            }),
        }
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperation {
    Keep,
    Remove,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}
impl FilterValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub column: String,
    pub column_type: ColumnType,
    pub strategy: FilterStrategy,
    pub operation: FilterOperation,
    pub value: FilterValue,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Mean,
    Median,
    Min,
    Max,
    Count,
    Distinct,
    Stddev,
    Variance,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Dsc,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubBucketMethod {
    Stack,
    Split,
}
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualisationSpec {
    pub metric_column_y: String,
    #[serde(default)]
    pub metric_column_x: Option<String>,
    #[serde(default)]
    pub metric_column_x_type: Option<ColumnType>,
    #[serde(default)]
    pub bucket_column: Option<String>,
    #[serde(default)]
    pub bucket_column_type: Option<ColumnType>,
    #[serde(default)]
    pub sub_bucket_column: Option<String>,
    #[serde(default)]
    pub metric_aggregation: Aggregation,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub sort: Option<SortDirection>,
    #[serde(default, deserialize_with = "deserialize_truncate_size")]
    pub truncate_size: Option<usize>,
    #[serde(default)]
    pub sub_bucket_method: Option<SubBucketMethod>,
}
impl VisualisationSpec {
    pub fn new(metric_column_y: impl Into<String>) -> Self {
        Self {
            metric_column_y: metric_column_y.into(),
            metric_column_x: None,
            metric_column_x_type: None,
            bucket_column: None,
            bucket_column_type: None,
            sub_bucket_column: None,
            metric_aggregation: Aggregation::Sum,
            filters: Vec::new(),
            sort: None,
            truncate_size: None,
            sub_bucket_method: None,
        }
    }
}
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visualisation {
    pub name: String,
    pub visualisation_type: VisualisationType,
    pub dataset_id: crate::dataset::DatasetId,
    pub spec: VisualisationSpec,
}
// Editors submit the size as either a number or a numeric string.
fn deserialize_truncate_size<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(usize),
        Text(String),
    }
    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value {
        Raw::Number(n) => Some(n),
        Raw::Text(s) => s.trim().parse::<usize>().ok(),
    }))
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn spec_round_trips_through_json() {
        let json = serde_json::json!({
            "metricColumnY": "sales",
            "metricColumnX": "captured",
            "metricColumnXType": "date",
            "bucketColumn": "region",
            "bucketColumnType": "text",
            "metricAggregation": "mean",
            "filters": [{
                "column": "sales",
                "columnType": "number",
                "strategy": "isHigher",
                "operation": "keep",
                "value": 10
            }],
            "sort": "dsc",
            "truncateSize": "25",
            "subBucketMethod": "stack"
        });
        let spec: VisualisationSpec = serde_json::from_value(json).unwrap();
        assert_eq!(spec.metric_aggregation, Aggregation::Mean);
        assert_eq!(spec.truncate_size, Some(25));
        assert_eq!(spec.filters[0].strategy, FilterStrategy::IsHigher);
        assert_eq!(spec.sub_bucket_method, Some(SubBucketMethod::Stack));
        let round = serde_json::to_value(&spec).unwrap();
        let again: VisualisationSpec = serde_json::from_value(round).unwrap();
        assert_eq!(again.filters, spec.filters);
    }
    #[test]
    fn unknown_names_map_to_taxonomy_errors() {
        assert!(matches!(
            VisualisationType::from_name("hexbin"),
            Err(PipelineError::UnsupportedVisualisationType { .. })
        ));
        assert!(matches!(
            FilterStrategy::from_name("contains"),
            Err(PipelineError::UnsupportedFilterStrategy { .. })
        ));
    }
    #[test]
    fn x_requirements_follow_visualisation_type() {
        let mut spec = VisualisationSpec::new("y");
        assert!(!VisualisationType::Line.requires_x(&spec));
        assert!(VisualisationType::Scatter.requires_x(&spec));
        spec.metric_column_x = Some("x".to_string());
        assert!(VisualisationType::Line.requires_x(&spec));
        assert!(!VisualisationType::Pie.requires_x(&spec));
    }
}
