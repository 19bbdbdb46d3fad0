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

use crate::pipeline::chart_data::ChartValues;
use crate::pipeline::coerce::Coerced;
use crate::visualisation::{SortDirection, VisualisationSpec, VisualisationType};
use std::cmp::Ordering;
fn direction(spec: &VisualisationSpec) -> SortDirection {
    spec.sort.unwrap_or(SortDirection::Asc)
}
fn oriented(cmp: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => cmp,
        SortDirection::Dsc => cmp.reverse(),
    }
}
// Keys that cannot be ordered (nulls, mixed kinds) compare Equal, so the
// stable sort leaves such rows in input order.
fn compare_keys(a: Option<&Coerced>, b: Option<&Coerced>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.compare(b).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}
fn compare_metrics(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}
pub fn sort_values(
    values: &mut ChartValues,
    visualisation_type: VisualisationType,
    spec: &VisualisationSpec,
) {
    let direction = direction(spec);
    let along_x = visualisation_type.sorts_along_x();
    match values {
        // Raw points carry no aggregated metric and bucket rows carry no x
        // axis; those combinations leave input order untouched.
        ChartValues::Points(points) => {
            if along_x {
                points.sort_by(|a, b| {
                    oriented(compare_keys(a.x.as_ref(), b.x.as_ref()), direction)
                });
            }
        }
        ChartValues::Buckets(rows) => {
            if !along_x {
                rows.sort_by(|a, b| {
                    oriented(compare_metrics(a.metric_y, b.metric_y), direction)
                });
            }
        }
        ChartValues::SubBuckets(_) => {}
    }
}
pub fn truncate_values(
    values: &mut ChartValues,
    visualisation_type: VisualisationType,
    spec: &VisualisationSpec,
) {
    if !visualisation_type.supports_truncation() {
        return;
    }
    if let Some(limit) = spec.truncate_size {
        values.truncate(limit);
    }
}
