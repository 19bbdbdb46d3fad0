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

use crate::dataset::column::Column;
use crate::dataset::common::{ColumnSpec, ColumnType, DatasetMetadata, DatasetStatus};
use crate::error::{DatasetError, DatasetResult};
use crate::transform::ops::Transformation;
use std::collections::HashMap;
use std::sync::Arc;
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: HashMap<String, Arc<Column>>,
    specs: Vec<ColumnSpec>,
    pub metadata: DatasetMetadata,
    history: Option<Vec<Transformation>>,
}
impl Dataset {
    pub fn new(metadata: DatasetMetadata) -> Self {
        Self {
            columns: HashMap::new(),
            specs: Vec::new(),
            metadata,
            history: None,
        }
    }
    pub fn add_column(&mut self, spec: ColumnSpec, column: Column) -> DatasetResult<()> {
        if self.columns.contains_key(&spec.name) {
            return Err(DatasetError::DuplicateColumn { column: spec.name });
        }
        if !self.columns.is_empty() {
            let expected = self.metadata.row_count;
            if column.len() != expected {
                return Err(DatasetError::LengthMismatch {
                    expected,
                    got: column.len(),
                });
            }
        } else {
            self.metadata.row_count = column.len();
        }
        self.columns.insert(spec.name.clone(), Arc::new(column));
        self.specs.push(spec);
        self.metadata.column_count = self.specs.len();
        Ok(())
    }
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name).map(|arc| arc.as_ref())
    }
    pub fn column_specs(&self) -> &[ColumnSpec] {
        &self.specs
    }
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.specs
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.column_type)
    }
    pub fn row_count(&self) -> usize {
        self.metadata.row_count
    }
    pub fn column_count(&self) -> usize {
        self.metadata.column_count
    }
    pub fn rows_ready(&self) -> bool {
        !self.specs.is_empty()
    }
    pub fn history(&self) -> Option<&[Transformation]> {
        self.history.as_deref()
    }
    pub fn push_history(&mut self, transformation: Transformation) {
        self.history.get_or_insert_with(Vec::new).push(transformation);
    }
    pub fn without_history(mut self) -> Self {
        self.history = None;
        self
    }
    pub fn with_status(mut self, status: DatasetStatus) -> Self {
        self.metadata.status = status;
        self.metadata.reason = None;
        self
    }
    pub fn with_failure(mut self, reason: impl Into<String>) -> Self {
        self.metadata.status = DatasetStatus::Failed;
        self.metadata.reason = Some(reason.into());
        self
    }
    pub fn select_rows(&self, indices: &[usize]) -> DatasetResult<Dataset> {
        let mut selected = Dataset {
            columns: HashMap::new(),
            specs: Vec::new(),
            metadata: DatasetMetadata {
                row_count: 0,
                column_count: 0,
                ..self.metadata.clone()
            },
            history: self.history.clone(),
        };
        for spec in &self.specs {
            let column = self.columns[&spec.name].select_rows(indices)?;
            selected.add_column(spec.clone(), column)?;
        }
        selected.metadata.row_count = indices.len();
        Ok(selected)
    }
    pub fn replace_column(&self, name: &str, column: Column) -> DatasetResult<Dataset> {
        if !self.columns.contains_key(name) {
            return Err(DatasetError::ColumnNotFound {
                column: name.to_string(),
            });
        }
        if column.len() != self.metadata.row_count {
            return Err(DatasetError::LengthMismatch {
                expected: self.metadata.row_count,
                got: column.len(),
            });
        }
        let mut updated = self.clone();
        updated.columns.insert(name.to_string(), Arc::new(column));
        Ok(updated)
    }
    pub fn retype_column(&self, name: &str, column_type: ColumnType) -> DatasetResult<Dataset> {
        let mut updated = self.clone();
        let spec = updated
            .specs
            .iter_mut()
            .find(|spec| spec.name == name)
            .ok_or_else(|| DatasetError::ColumnNotFound {
                column: name.to_string(),
            })?;
        spec.column_type = column_type;
        Ok(updated)
    }
    pub fn rename_column(&self, name: &str, new_name: &str) -> DatasetResult<Dataset> {
        let mut updated = self.clone();
        let spec = updated
            .specs
            .iter_mut()
            .find(|spec| spec.name == name)
            .ok_or_else(|| DatasetError::ColumnNotFound {
                column: name.to_string(),
            })?;
        spec.name = new_name.to_string();
        let column = updated.columns.remove(name).ok_or_else(|| {
            DatasetError::ColumnNotFound {
                column: name.to_string(),
            }
        })?;
        updated.columns.insert(new_name.to_string(), column);
        Ok(updated)
    }
    pub fn remove_column(&self, name: &str) -> DatasetResult<Dataset> {
        if !self.columns.contains_key(name) {
            return Err(DatasetError::ColumnNotFound {
                column: name.to_string(),
            });
        }
        let mut updated = self.clone();
        updated.columns.remove(name);
        updated.specs.retain(|spec| spec.name != name);
        updated.metadata.column_count = updated.specs.len();
        Ok(updated)
    }
    pub fn sort_by(&self, column_name: &str, ascending: bool) -> DatasetResult<Dataset> {
        let column = self
            .column(column_name)
            .ok_or_else(|| DatasetError::ColumnNotFound {
                column: column_name.to_string(),
            })?;
        let numeric = matches!(column, Column::Number(_));
        let mut indices: Vec<usize> = (0..self.row_count()).collect();
        indices.sort_by(|&a, &b| {
            let cmp = if numeric {
                match (column.to_number(a), column.to_number(b)) {
                    (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
            } else {
                match (column.get_string(a), column.get_string(b)) {
                    (Some(a), Some(b)) => a.cmp(&b),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
            };
            if ascending {
                cmp
            } else {
                cmp.reverse()
            }
        });
        self.select_rows(&indices)
    }
    pub fn print_sample(&self, limit: usize) {
        let sample_size = std::cmp::min(limit, self.row_count());
        let names: Vec<&str> = self.specs.iter().map(|spec| spec.name.as_str()).collect();
        let header = names.join(" | ");
        println!("{header}");
        println!("{}", "-".repeat(header.len()));
        for i in 0..sample_size {
            let row: Vec<String> = self
                .specs
                .iter()
                .map(|spec| {
                    self.columns[&spec.name]
                        .get_string(i)
                        .unwrap_or_else(|| "NULL".to_string())
                })
                .collect();
            println!("{}", row.join(" | "));
        }
        if self.row_count() > sample_size {
            println!("... ({} more rows)", self.row_count() - sample_size);
        }
    }
}
