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

use crate::dataset::column::ColumnBuilder;
use crate::dataset::common::{ColumnSpec, ColumnType, DatasetMetadata};
use crate::dataset::frame::Dataset;
use crate::error::DatasetResult;
use std::path::Path;
#[derive(Debug)]
pub struct CsvReader {
    has_headers: bool,
    delimiter: u8,
}
impl CsvReader {
    pub fn new() -> Self {
        Self {
            has_headers: true,
            delimiter: b',',
        }
    }
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
    pub fn read_file(
        &self,
        path: &Path,
        dataset_name: String,
        column_types: Option<&[ColumnType]>,
    ) -> DatasetResult<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.has_headers)
            .delimiter(self.delimiter)
            .flexible(true)
            .from_path(path)?;
        let headers: Vec<String> = if self.has_headers {
            reader.headers()?.iter().map(|h| h.to_string()).collect()
        } else {
            Vec::new()
        };
        let mut builders: Vec<ColumnBuilder> =
            headers.iter().map(|_| ColumnBuilder::new()).collect();
        let mut header_names = headers;
        for record in reader.records() {
            let record = record?;
            if header_names.is_empty() {
                header_names = (0..record.len()).map(|i| format!("column_{i}")).collect();
                builders = header_names.iter().map(|_| ColumnBuilder::new()).collect();
            }
            for (i, builder) in builders.iter_mut().enumerate() {
                let field = record.get(i).map(|f| f.to_string());
                builder.push(field);
            }
        }
        let mut dataset = Dataset::new(DatasetMetadata::new(dataset_name));
        for (i, (name, builder)) in header_names.into_iter().zip(builders).enumerate() {
            let column_type = column_types
                .and_then(|types| types.get(i).copied())
                .unwrap_or_else(|| builder.infer_type());
            let column = builder.build(column_type);
            dataset.add_column(ColumnSpec::new(name, column_type), column)?;
        }
        Ok(dataset)
    }
}
impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}
pub fn load_csv<P: AsRef<Path>>(path: P, name: String) -> DatasetResult<Dataset> {
    CsvReader::new().read_file(path.as_ref(), name, None)
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    #[test]
    fn reads_csv_with_inferred_and_declared_types() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "region,sales,captured").unwrap();
        writeln!(file, "north,10.5,1000").unwrap();
        writeln!(file, "south,,2000").unwrap();
        writeln!(file, "east,7,3000").unwrap();
        let types = [ColumnType::Text, ColumnType::Number, ColumnType::Date];
        let dataset = CsvReader::new()
            .read_file(file.path(), "imported".to_string(), Some(&types))
            .unwrap();
        assert_eq!(dataset.row_count(), 3);
        assert_eq!(dataset.column_count(), 3);
        assert_eq!(dataset.column_type("captured"), Some(ColumnType::Date));
        assert_eq!(dataset.column("sales").unwrap().to_number(1), None);
        assert_eq!(dataset.column("captured").unwrap().to_number(0), Some(1000.0));
        let inferred = load_csv(file.path(), "inferred".to_string()).unwrap();
        assert_eq!(inferred.column_type("sales"), Some(ColumnType::Number));
        assert_eq!(inferred.column_type("region"), Some(ColumnType::Text));
    }
}
