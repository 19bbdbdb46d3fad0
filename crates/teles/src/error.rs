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

use thiserror::Error;
#[derive(Error, Debug)]
pub enum TelesError {
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("transformation error: {0}")]
    Transform(#[from] TransformError),
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),
    #[error("serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("unsupported column type '{column_type}' supplied to {context}")]
    UnsupportedColumnType {
        column_type: String,
        context: &'static str,
    },
    #[error("unknown filter strategy '{strategy}'")]
    UnsupportedFilterStrategy { strategy: String },
    #[error("unknown visualisation type '{name}'")]
    UnsupportedVisualisationType { name: String },
    #[error("column '{column}' not found in dataset")]
    ColumnNotFound { column: String },
}
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("transformation rejected: {reason}")]
    Rejected { reason: String },
    #[error("transformation service unreachable: {reason}")]
    ServiceUnreachable { reason: String },
    #[error("column '{column}' not found in dataset")]
    ColumnNotFound { column: String },
    #[error("invalid arguments for '{op}': {reason}")]
    InvalidArguments { op: String, reason: String },
    #[error("dataset error during transformation: {0}")]
    Dataset(#[from] DatasetError),
}
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV parse error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
    #[error("column length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("row index {0} out of bounds")]
    OutOfBounds(usize),
    #[error("column '{column}' not found in dataset")]
    ColumnNotFound { column: String },
    #[error("duplicate column '{column}'")]
    DuplicateColumn { column: String },
}
pub type Result<T> = std::result::Result<T, TelesError>;
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
pub type TransformResult<T> = std::result::Result<T, TransformError>;
pub type DatasetResult<T> = std::result::Result<T, DatasetError>;
