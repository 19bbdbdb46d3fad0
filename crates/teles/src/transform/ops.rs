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
use crate::error::{TransformError, TransformResult};
use crate::visualisation::SortDirection;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
static DOUBLESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("valid pattern"));
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args")]
pub enum Transformation {
    #[serde(rename = "core/to-lowercase", rename_all = "camelCase")]
    ToLowercase { column_name: String },
    #[serde(rename = "core/to-uppercase", rename_all = "camelCase")]
    ToUppercase { column_name: String },
    #[serde(rename = "core/to-titlecase", rename_all = "camelCase")]
    ToTitlecase { column_name: String },
    #[serde(rename = "core/trim", rename_all = "camelCase")]
    Trim { column_name: String },
    #[serde(rename = "core/trim-doublespace", rename_all = "camelCase")]
    TrimDoublespace { column_name: String },
    #[serde(rename = "core/change-datatype", rename_all = "camelCase")]
    ChangeDatatype {
        column_name: String,
        new_type: ColumnType,
        #[serde(default)]
        default_value: Option<String>,
        #[serde(default)]
        parse_format: Option<String>,
    },
    #[serde(rename = "core/sort-column", rename_all = "camelCase")]
    SortColumn {
        column_name: String,
        sort_direction: SortDirection,
    },
    #[serde(rename = "core/remove-sort", rename_all = "camelCase")]
    RemoveSort { column_name: String },
    #[serde(rename = "core/rename-column", rename_all = "camelCase")]
    RenameColumn {
        column_name: String,
        new_column_title: String,
    },
    #[serde(rename = "core/delete-column", rename_all = "camelCase")]
    DeleteColumn { column_name: String },
    #[serde(rename = "core/undo")]
    Undo,
}
impl Transformation {
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::ToLowercase { .. } => "core/to-lowercase",
            Self::ToUppercase { .. } => "core/to-uppercase",
            Self::ToTitlecase { .. } => "core/to-titlecase",
            Self::Trim { .. } => "core/trim",
            Self::TrimDoublespace { .. } => "core/trim-doublespace",
            Self::ChangeDatatype { .. } => "core/change-datatype",
            Self::SortColumn { .. } => "core/sort-column",
            Self::RemoveSort { .. } => "core/remove-sort",
            Self::RenameColumn { .. } => "core/rename-column",
            Self::DeleteColumn { .. } => "core/delete-column",
            Self::Undo => "core/undo",
        }
    }
}
pub fn apply_transformation(
    dataset: &Dataset,
    transformation: &Transformation,
) -> TransformResult<Dataset> {
    let mut updated = match transformation {
        Transformation::ToLowercase { column_name } => {
            map_text_column(dataset, column_name, |s| s.to_lowercase())?
        }
        Transformation::ToUppercase { column_name } => {
            map_text_column(dataset, column_name, |s| s.to_uppercase())?
        }
        Transformation::ToTitlecase { column_name } => {
            map_text_column(dataset, column_name, titlecase)?
        }
        Transformation::Trim { column_name } => {
            map_text_column(dataset, column_name, |s| s.trim().to_string())?
        }
        Transformation::TrimDoublespace { column_name } => {
            map_text_column(dataset, column_name, |s| {
                DOUBLESPACE.replace_all(s, " ").into_owned()
            })?
        }
        Transformation::ChangeDatatype {
            column_name,
            new_type,
            default_value,
            parse_format,
        } => change_datatype(
            dataset,
            column_name,
            *new_type,
            default_value.as_deref(),
            parse_format.as_deref(),
        )?,
        Transformation::SortColumn {
            column_name,
            sort_direction,
        } => dataset.sort_by(column_name, *sort_direction == SortDirection::Asc)?,
        // Natural order is restored by the server copy; the local table keeps
        // its current arrangement until the refetch lands.
        Transformation::RemoveSort { .. } => dataset.clone(),
        Transformation::RenameColumn {
            column_name,
            new_column_title,
        } => dataset.rename_column(column_name, new_column_title)?,
        Transformation::DeleteColumn { column_name } => dataset.remove_column(column_name)?,
        Transformation::Undo => {
            return Err(TransformError::InvalidArguments {
                op: "core/undo".to_string(),
                reason: "undo is resolved by the transformation service".to_string(),
            })
        }
    };
    updated.push_history(transformation.clone());
    Ok(updated)
}
fn map_text_column<F>(dataset: &Dataset, column_name: &str, f: F) -> TransformResult<Dataset>
where
    F: Fn(&str) -> String + Send + Sync,
{
    let column = dataset
        .column(column_name)
        .ok_or_else(|| TransformError::ColumnNotFound {
            column: column_name.to_string(),
        })?;
    if dataset.column_type(column_name) != Some(ColumnType::Text) {
        return Err(TransformError::InvalidArguments {
            op: "text transformation".to_string(),
            reason: format!("column '{column_name}' is not text"),
        });
    }
    Ok(dataset.replace_column(column_name, column.map_text(f))?)
}
fn change_datatype(
    dataset: &Dataset,
    column_name: &str,
    new_type: ColumnType,
    default_value: Option<&str>,
    parse_format: Option<&str>,
) -> TransformResult<Dataset> {
    let column = dataset
        .column(column_name)
        .ok_or_else(|| TransformError::ColumnNotFound {
            column: column_name.to_string(),
        })?;
    let converted = match new_type {
        ColumnType::Text => {
            let values: Vec<Option<String>> =
                (0..column.len()).map(|i| column.get_string(i)).collect();
            Column::from_strings(&values)
        }
        ColumnType::Number => {
            let fallback = default_value.and_then(|s| s.trim().parse::<f64>().ok());
            let values: Vec<Option<f64>> = (0..column.len())
                .map(|i| column.to_number(i).or(fallback))
                .collect();
            Column::from_numbers(values)
        }
        ColumnType::Date => {
            let fallback = default_value.and_then(|s| s.trim().parse::<f64>().ok());
            let values: Vec<Option<f64>> = (0..column.len())
                .map(|i| {
                    parse_date_cell(column, i, parse_format).or(fallback)
                })
                .collect();
            Column::from_numbers(values)
        }
        other => {
            return Err(TransformError::InvalidArguments {
                op: "core/change-datatype".to_string(),
                reason: format!("cannot convert to '{other}'"),
            })
        }
    };
    let updated = dataset.replace_column(column_name, converted)?;
    Ok(updated.retype_column(column_name, new_type)?)
}
// Date cells become epoch seconds, either via the supplied format or as an
// already-numeric timestamp.
fn parse_date_cell(column: &Column, index: usize, parse_format: Option<&str>) -> Option<f64> {
    if let Some(format) = parse_format {
        if let Some(text) = column.get_string(index) {
            if let Ok(date) = NaiveDate::parse_from_str(text.trim(), format) {
                let midnight = date.and_hms_opt(0, 0, 0)?;
                return Some(midnight.and_utc().timestamp() as f64);
            }
        }
    }
    column.to_number(index)
}
fn titlecase(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
