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

use crate::dataset::common::ColumnType;
use crate::error::{DatasetError, DatasetResult};
use rayon::prelude::*;
use std::sync::Arc;
#[derive(Debug, Clone)]
pub enum Column {
    Text(Arc<[Option<Arc<str>>]>),
    Number(Arc<[Option<f64>]>),
}
impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Text(data) => data.len(),
            Column::Number(data) => data.len(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn null_count(&self) -> usize {
        match self {
            Column::Text(data) => data.par_iter().filter(|v| v.is_none()).count(),
            Column::Number(data) => data.par_iter().filter(|v| v.is_none()).count(),
        }
    }
    pub fn get_string(&self, index: usize) -> Option<String> {
        match self {
            Column::Text(data) => data.get(index)?.as_ref().map(|s| s.to_string()),
            Column::Number(data) => data.get(index)?.as_ref().map(|v| v.to_string()),
        }
    }
    pub fn to_number(&self, index: usize) -> Option<f64> {
        match self {
            Column::Number(data) => data.get(index).copied()?,
            Column::Text(data) => data
                .get(index)
                .and_then(|opt| opt.as_ref().and_then(|s| s.parse::<f64>().ok())),
        }
    }
    pub fn from_strings(values: &[Option<String>]) -> Self {
        let strings: Vec<Option<Arc<str>>> = values
            .iter()
            .map(|opt| opt.as_ref().map(|s| Arc::from(s.as_str())))
            .collect();
        Column::Text(strings.into())
    }
    pub fn from_numbers(values: Vec<Option<f64>>) -> Self {
        Column::Number(values.into())
    }
    pub fn select_rows(&self, indices: &[usize]) -> DatasetResult<Column> {
        match self {
            Column::Text(data) => {
                let new_data: DatasetResult<Vec<Option<Arc<str>>>> = indices
                    .par_iter()
                    .map(|&i| {
                        if i >= data.len() {
                            Err(DatasetError::OutOfBounds(i))
                        } else {
                            Ok(data.get(i).cloned().unwrap_or(None))
                        }
                    })
                    .collect();
                Ok(Column::Text(new_data?.into()))
            }
            Column::Number(data) => {
                let new_data: DatasetResult<Vec<Option<f64>>> = indices
                    .par_iter()
                    .map(|&i| {
                        if i >= data.len() {
                            Err(DatasetError::OutOfBounds(i))
                        } else {
                            Ok(data.get(i).copied().unwrap_or(None))
                        }
                    })
                    .collect();
                Ok(Column::Number(new_data?.into()))
            }
        }
    }
    pub fn map_text<F>(&self, f: F) -> Column
    where
        F: Fn(&str) -> String + Send + Sync,
    {
        match self {
            Column::Text(data) => {
                let mapped: Vec<Option<Arc<str>>> = data
                    .par_iter()
                    .map(|opt| opt.as_ref().map(|s| Arc::from(f(s).as_str())))
                    .collect();
                Column::Text(mapped.into())
            }
            Column::Number(_) => self.clone(),
        }
    }
}
#[derive(Debug, Default)]
pub struct ColumnBuilder {
    values: Vec<Option<String>>,
}
impl ColumnBuilder {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }
    pub fn push(&mut self, value: Option<String>) {
        let value = value.filter(|s| !s.trim().is_empty());
        self.values.push(value);
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn build(self, column_type: ColumnType) -> Column {
        match column_type {
            ColumnType::Number | ColumnType::Date => {
                let parsed: Vec<Option<f64>> = self
                    .values
                    .par_iter()
                    .map(|opt| opt.as_ref().and_then(|s| s.parse::<f64>().ok()))
                    .collect();
                Column::Number(parsed.into())
            }
            ColumnType::Text | ColumnType::Geopoint | ColumnType::Multiple => {
                Column::from_strings(&self.values)
            }
        }
    }
    pub fn infer_type(&self) -> ColumnType {
        let mut all_numeric = true;
        let mut sample_count = 0;
        for value in self.values.iter().flatten().take(1000) {
            sample_count += 1;
            if value.parse::<f64>().is_err() {
                all_numeric = false;
                break;
            }
        }
        if sample_count > 0 && all_numeric {
            ColumnType::Number
        } else {
            ColumnType::Text
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn builder_directs_storage_by_declared_type() {
        let mut builder = ColumnBuilder::new();
        builder.push(Some("1.5".to_string()));
        builder.push(Some("abc".to_string()));
        builder.push(None);
        let column = builder.build(ColumnType::Number);
        assert_eq!(column.to_number(0), Some(1.5));
        assert_eq!(column.to_number(1), None);
        assert_eq!(column.to_number(2), None);
        assert_eq!(column.null_count(), 2);
    }
    #[test]
    fn text_column_parses_numbers_on_demand() {
        let column = Column::from_strings(&[Some("42".to_string()), Some("x".to_string()), None]);
        assert_eq!(column.to_number(0), Some(42.0));
        assert_eq!(column.to_number(1), None);
        assert_eq!(column.get_string(1), Some("x".to_string()));
    }
    #[test]
    fn select_rows_rejects_out_of_bounds() {
        let column = Column::from_numbers(vec![Some(1.0), Some(2.0)]);
        assert!(column.select_rows(&[0, 5]).is_err());
        let picked = column.select_rows(&[1, 0]).unwrap();
        assert_eq!(picked.to_number(0), Some(2.0));
        assert_eq!(picked.to_number(1), Some(1.0));
    }
    #[test]
    fn infer_type_detects_numeric_columns() {
        let mut builder = ColumnBuilder::new();
        builder.push(Some("1".to_string()));
        builder.push(Some("2.5".to_string()));
        assert_eq!(builder.infer_type(), ColumnType::Number);
        builder.push(Some("west".to_string()));
        assert_eq!(builder.infer_type(), ColumnType::Text);
    }
}
