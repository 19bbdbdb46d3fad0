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

use crate::pipeline::chart_data::DataPoint;
use crate::pipeline::coerce::{group_key, Coerced};
use crate::visualisation::Aggregation;
use indexmap::IndexMap;
use itertools::Itertools;
use rayon::prelude::*;
use serde::Serialize;
pub const PARALLEL_ROW_THRESHOLD: usize = 10000;
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketRow {
    pub bucket_value: Option<Coerced>,
    pub metric_y: Option<f64>,
    pub metric_x: Option<f64>,
    #[serde(skip)]
    pub members: Vec<DataPoint>,
}
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubBucketRow {
    pub bucket_value: Option<Coerced>,
    pub sub_bucket_value: Option<Coerced>,
    pub metric_y: Option<f64>,
    pub parent_metric: Option<f64>,
}
struct Group {
    bucket_value: Option<Coerced>,
    members: Vec<DataPoint>,
}
// Grouping preserves first-seen order; any requested ordering is imposed
// afterwards by the sort stage.
fn build_groups(points: Vec<DataPoint>, parallel_threshold: usize) -> IndexMap<String, Group> {
    if points.len() > parallel_threshold {
        build_groups_parallel(points, parallel_threshold)
    } else {
        build_groups_sequential(points)
    }
}
fn build_groups_sequential(points: Vec<DataPoint>) -> IndexMap<String, Group> {
    let mut groups: IndexMap<String, Group> = IndexMap::new();
    for point in points {
        let key = group_key(point.bucket_value.as_ref());
        groups
            .entry(key)
            .or_insert_with(|| Group {
                bucket_value: point.bucket_value.clone(),
                members: Vec::new(),
            })
            .members
            .push(point);
    }
    groups
}
fn build_groups_parallel(
    points: Vec<DataPoint>,
    parallel_threshold: usize,
) -> IndexMap<String, Group> {
    let chunk_size = std::cmp::max(1000, parallel_threshold / rayon::current_num_threads());
    let local_maps: Vec<IndexMap<String, Group>> = points
        .into_par_iter()
        .chunks(chunk_size)
        .map(build_groups_sequential)
        .collect();
    let mut groups: IndexMap<String, Group> = IndexMap::new();
    for local in local_maps {
        for (key, local_group) in local {
            groups
                .entry(key)
                .or_insert_with(|| Group {
                    bucket_value: local_group.bucket_value.clone(),
                    members: Vec::new(),
                })
                .members
                .extend(local_group.members);
        }
    }
    groups
}
pub fn aggregate_by_bucket(
    points: Vec<DataPoint>,
    aggregation: Aggregation,
    aggregate_x: bool,
    keep_members: bool,
    parallel_threshold: usize,
) -> Vec<BucketRow> {
    let groups = build_groups(points, parallel_threshold);
    groups
        .into_values()
        .map(|group| {
            let member_count = group.members.len();
            let y_values: Vec<f64> = group
                .members
                .iter()
                .map(|point| point.y)
                .filter(|v| v.is_finite())
                .collect();
            let metric_y = apply(aggregation, &y_values, member_count);
            let metric_x = if aggregate_x {
                let x_values: Vec<f64> = group
                    .members
                    .iter()
                    .filter_map(|point| point.x.as_ref().and_then(Coerced::as_number))
                    .filter(|v| v.is_finite())
                    .collect();
                apply(aggregation, &x_values, member_count)
            } else {
                None
            };
            BucketRow {
                bucket_value: group.bucket_value,
                metric_y,
                metric_x,
                members: if keep_members { group.members } else { Vec::new() },
            }
        })
        .collect()
}
pub fn aggregate_by_sub_bucket(rows: Vec<BucketRow>, aggregation: Aggregation) -> Vec<SubBucketRow> {
    let mut sub_rows = Vec::new();
    for row in rows {
        let parent_metric = row.metric_y;
        let parent_bucket = row.bucket_value.clone();
        let mut groups: IndexMap<String, (Option<Coerced>, Vec<f64>, usize)> = IndexMap::new();
        for member in &row.members {
            let key = group_key(member.sub_bucket_value.as_ref());
            let entry = groups
                .entry(key)
                .or_insert_with(|| (member.sub_bucket_value.clone(), Vec::new(), 0));
            if member.y.is_finite() {
                entry.1.push(member.y);
            }
            entry.2 += 1;
        }
        for (sub_bucket_value, values, member_count) in groups.into_values() {
            sub_rows.push(SubBucketRow {
                bucket_value: parent_bucket.clone(),
                sub_bucket_value,
                metric_y: apply(aggregation, &values, member_count),
                parent_metric,
            });
        }
    }
    sub_rows
}
// Null and non-finite members are excluded everywhere except Count, which
// counts every group member.
pub fn apply(aggregation: Aggregation, values: &[f64], member_count: usize) -> Option<f64> {
    match aggregation {
        Aggregation::Count => Some(member_count as f64),
        Aggregation::Sum => Some(values.iter().sum()),
        Aggregation::Distinct => {
            Some(values.iter().map(|v| v.to_bits()).unique().count() as f64)
        }
        Aggregation::Mean => {
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
        Aggregation::Min => values
            .iter()
            .copied()
            .reduce(f64::min),
        Aggregation::Max => values
            .iter()
            .copied()
            .reduce(f64::max),
        Aggregation::Median => {
            if values.is_empty() {
                return None;
            }
            let mut sorted = values.to_vec();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 0 {
                Some((sorted[mid - 1] + sorted[mid]) / 2.0)
            } else {
                Some(sorted[mid])
            }
        }
        Aggregation::Stddev | Aggregation::Variance => {
            if values.len() < 2 {
                return None;
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                / (values.len() - 1) as f64;
            match aggregation {
                Aggregation::Variance => Some(variance),
                _ => Some(variance.sqrt()),
            }
        }
    }
}
