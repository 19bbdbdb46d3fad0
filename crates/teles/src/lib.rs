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

pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod transform;
pub mod visualisation;
pub use dataset::{
    load_csv, Column, ColumnBuilder, ColumnSpec, ColumnType, CsvReader, Dataset, DatasetId,
    DatasetMetadata, DatasetStatus,
};
pub use error::{
    DatasetError, DatasetResult, PipelineError, PipelineResult, Result, TelesError,
    TransformError, TransformResult,
};
pub use pipeline::{
    chart_data, ChartDataEngine, ChartMetadata, ChartOutput, ChartValues, Coerced, DataPoint,
};
pub use transform::{
    apply_transformation, transformation_failure, transformation_request_sent,
    transformation_success, Notification, NotificationLevel, PendingLog, RequestId, ServerResult,
    TransformSession, Transformation, TransformationService,
};
pub use visualisation::{
    Aggregation, Filter, FilterOperation, FilterStrategy, FilterValue, SortDirection,
    SubBucketMethod, Visualisation, VisualisationSpec, VisualisationType,
};
pub fn new_engine() -> ChartDataEngine {
    ChartDataEngine::new()
}
pub fn new_session<S: TransformationService>(service: S) -> TransformSession<S> {
    TransformSession::new(service)
}
