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

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use teles::{
    apply_transformation, chart_data, Aggregation, Column, ColumnSpec, ColumnType, Dataset,
    DatasetId, DatasetMetadata, DatasetStatus, Filter, FilterOperation, FilterStrategy,
    FilterValue, ServerResult, SortDirection, SubBucketMethod, TransformError, TransformResult,
    TransformSession, Transformation, TransformationService, Visualisation, VisualisationSpec,
    VisualisationType,
};
use tracing::info;

// Stands in for the remote transformation-log service: applies each op to its
// own copy of the dataset and hands back fresh values on fetch.
struct InProcessService {
    datasets: Mutex<Vec<Dataset>>,
}

impl InProcessService {
    fn new(dataset: Dataset) -> Self {
        Self {
            datasets: Mutex::new(vec![dataset]),
        }
    }
}

#[async_trait]
impl TransformationService for InProcessService {
    async fn submit_transform(
        &self,
        dataset_id: &DatasetId,
        transformation: &Transformation,
    ) -> TransformResult<ServerResult> {
        let mut datasets = self.datasets.lock().expect("service lock");
        let current = datasets.last().cloned().ok_or_else(|| {
            TransformError::Rejected {
                reason: format!("dataset {dataset_id} is unknown"),
            }
        })?;
        let updated = apply_transformation(&current, transformation)?;
        datasets.push(updated);
        Ok(ServerResult {
            dataset_id: dataset_id.clone(),
            status: DatasetStatus::Ok,
        })
    }

    async fn submit_undo(&self, dataset_id: &DatasetId) -> TransformResult<ServerResult> {
        let mut datasets = self.datasets.lock().expect("service lock");
        if datasets.len() > 1 {
            datasets.pop();
        }
        Ok(ServerResult {
            dataset_id: dataset_id.clone(),
            status: DatasetStatus::Ok,
        })
    }

    async fn fetch_dataset(&self, _dataset_id: &DatasetId) -> TransformResult<Dataset> {
        let datasets = self.datasets.lock().expect("service lock");
        datasets
            .last()
            .cloned()
            .ok_or_else(|| TransformError::ServiceUnreachable {
                reason: "no dataset available".to_string(),
            })
    }
}

fn sales_dataset() -> Result<Dataset> {
    let mut dataset = Dataset::new(DatasetMetadata::new("Regional Sales"));
    dataset.add_column(
        ColumnSpec::new("region", ColumnType::Text),
        Column::from_strings(&[
            Some("North".to_string()),
            Some("North".to_string()),
            Some("South".to_string()),
            Some("South".to_string()),
            Some("East".to_string()),
            Some("East".to_string()),
        ]),
    )?;
    dataset.add_column(
        ColumnSpec::new("product", ColumnType::Text),
        Column::from_strings(&[
            Some("widgets".to_string()),
            Some("gadgets".to_string()),
            Some("widgets".to_string()),
            Some("gadgets".to_string()),
            Some("widgets".to_string()),
            Some("gadgets".to_string()),
        ]),
    )?;
    dataset.add_column(
        ColumnSpec::new("amount", ColumnType::Number),
        Column::from_numbers(vec![
            Some(120.0),
            Some(80.0),
            Some(200.5),
            None,
            Some(45.0),
            Some(60.0),
        ]),
    )?;
    Ok(dataset)
}

fn stacked_bar_visualisation(dataset_id: DatasetId) -> Visualisation {
    let mut spec = VisualisationSpec::new("amount");
    spec.bucket_column = Some("region".to_string());
    spec.bucket_column_type = Some(ColumnType::Text);
    spec.sub_bucket_column = Some("product".to_string());
    spec.sub_bucket_method = Some(SubBucketMethod::Stack);
    spec.metric_aggregation = Aggregation::Sum;
    spec.sort = Some(SortDirection::Dsc);
    spec.truncate_size = Some(2);
    spec.filters = vec![Filter {
        column: "amount".to_string(),
        column_type: ColumnType::Number,
        strategy: FilterStrategy::IsHigher,
        operation: FilterOperation::Keep,
        value: FilterValue::Number(50.0),
    }];
    Visualisation {
        name: "Sales by region".to_string(),
        visualisation_type: VisualisationType::Bar,
        dataset_id,
        spec,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let dataset = sales_dataset()?;
    dataset.print_sample(10);

    let visualisation = stacked_bar_visualisation(dataset.metadata.id.clone());
    let output = chart_data(&visualisation, &dataset)
        .context("chart data computation failed")?
        .context("dataset rows were not ready")?;
    info!(series = output.len(), "computed chart data");
    println!("{}", serde_json::to_string_pretty(&output)?);

    let session = TransformSession::new(InProcessService::new(dataset.clone()));
    let transformed = session
        .transform(
            &dataset,
            Transformation::ToUppercase {
                column_name: "region".to_string(),
            },
        )
        .await
        .context("transformation round trip failed")?;
    info!(pending = session.has_pending(), "transformation settled");
    transformed.print_sample(3);

    let restored = session
        .undo(&transformed)
        .await
        .context("undo round trip failed")?;
    restored.print_sample(3);

    Ok(())
}
