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

pub mod aggregate;
pub mod chart_data;
pub mod coerce;
pub mod filter;
pub mod sort;
pub use aggregate::{
    aggregate_by_bucket, aggregate_by_sub_bucket, BucketRow, SubBucketRow, PARALLEL_ROW_THRESHOLD,
};
pub use chart_data::{
    chart_data, ChartDataEngine, ChartMetadata, ChartOutput, ChartValues, DataPoint,
};
pub use coerce::{coerce, Coerced, DATE_SCALE};
pub use filter::{compile_filters, row_passes, CompiledFilter};
pub use sort::{sort_values, truncate_values};
