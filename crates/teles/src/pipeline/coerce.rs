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

use crate::dataset::{Column, ColumnType};
use crate::error::{PipelineError, PipelineResult};
use serde::Serialize;
use std::cmp::Ordering;
pub const DATE_SCALE: f64 = 1000.0;
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Coerced {
    Text(String),
    Number(f64),
}
impl Coerced {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
    // Ordering is only defined within a kind; mixed comparisons yield None.
    pub fn compare(&self, other: &Coerced) -> Option<Ordering> {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
    pub fn group_key(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(v) => v.to_string(),
        }
    }
}
pub fn coerce(
    column: &Column,
    index: usize,
    column_type: ColumnType,
    context: &'static str,
) -> PipelineResult<Option<Coerced>> {
    match column_type {
        ColumnType::Text => Ok(column.get_string(index).map(Coerced::Text)),
        ColumnType::Number => Ok(column.to_number(index).map(Coerced::Number)),
        ColumnType::Date => Ok(column
            .to_number(index)
            .map(|seconds| Coerced::Number(seconds * DATE_SCALE))),
        other => Err(PipelineError::UnsupportedColumnType {
            column_type: other.to_string(),
            context,
        }),
    }
}
// Identity extraction: the cell keeps its stored kind, no scaling.
pub fn raw(column: &Column, index: usize) -> Option<Coerced> {
    match column {
        Column::Number(_) => column.to_number(index).map(Coerced::Number),
        Column::Text(_) => column.get_string(index).map(Coerced::Text),
    }
}
pub fn group_key(value: Option<&Coerced>) -> String {
    value.map_or_else(|| "NULL".to_string(), Coerced::group_key)
}
