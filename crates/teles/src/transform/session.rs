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

use crate::dataset::{Dataset, DatasetId, DatasetStatus};
use crate::error::{TransformError, TransformResult};
use crate::transform::log::{PendingLog, RequestId};
use crate::transform::ops::Transformation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{debug, warn};
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerResult {
    pub dataset_id: DatasetId,
    pub status: DatasetStatus,
}
#[async_trait]
pub trait TransformationService: Send + Sync {
    async fn submit_transform(
        &self,
        dataset_id: &DatasetId,
        transformation: &Transformation,
    ) -> TransformResult<ServerResult>;
    async fn submit_undo(&self, dataset_id: &DatasetId) -> TransformResult<ServerResult>;
    async fn fetch_dataset(&self, dataset_id: &DatasetId) -> TransformResult<Dataset>;
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}
// Status transitions mirrored onto dataset values while a round trip is in
// flight; the history is dropped as soon as a request leaves.
pub fn transformation_request_sent(dataset: &Dataset) -> Dataset {
    dataset
        .clone()
        .without_history()
        .with_status(DatasetStatus::Pending)
}
pub fn transformation_success(dataset: &Dataset) -> Dataset {
    dataset.clone().with_status(DatasetStatus::Ok)
}
pub fn transformation_failure(dataset: &Dataset, reason: impl Into<String>) -> Dataset {
    dataset.clone().with_failure(reason)
}
pub struct TransformSession<S> {
    service: S,
    log: PendingLog,
    notifications: Mutex<Vec<Notification>>,
}
impl<S: TransformationService> TransformSession<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            log: PendingLog::new(),
            notifications: Mutex::new(Vec::new()),
        }
    }
    pub async fn transform(
        &self,
        dataset: &Dataset,
        transformation: Transformation,
    ) -> TransformResult<Dataset> {
        let dataset_id = dataset.metadata.id.clone();
        let request = self.log.begin(transformation.clone());
        debug!(%dataset_id, %request, op = transformation.op_name(), "submitting transformation");
        let outcome = self
            .service
            .submit_transform(&dataset_id, &transformation)
            .await;
        self.settle(request, &dataset_id, outcome).await
    }
    pub async fn undo(&self, dataset: &Dataset) -> TransformResult<Dataset> {
        let dataset_id = dataset.metadata.id.clone();
        let request = self.log.begin(Transformation::Undo);
        debug!(%dataset_id, %request, "submitting undo");
        let outcome = self.service.submit_undo(&dataset_id).await;
        self.settle(request, &dataset_id, outcome).await
    }
    // The pending entry is removed once the round trip settles, success or
    // failure; failures additionally surface a notification and re-throw.
    async fn settle(
        &self,
        request: RequestId,
        dataset_id: &DatasetId,
        outcome: TransformResult<ServerResult>,
    ) -> TransformResult<Dataset> {
        let result = match outcome {
            Ok(_ack) => match self.service.fetch_dataset(dataset_id).await {
                Ok(refreshed) => Ok(transformation_success(&refreshed)),
                Err(error) => Err(error),
            },
            Err(error) => Err(error),
        };
        self.log.complete(request);
        if let Err(error) = &result {
            warn!(%dataset_id, %request, %error, "transformation round trip failed");
            self.notify(NotificationLevel::Error, error.to_string());
        }
        result
    }
    pub fn pending(&self) -> Vec<(RequestId, Transformation)> {
        self.log.pending()
    }
    pub fn has_pending(&self) -> bool {
        !self.log.is_empty()
    }
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
    pub fn drain_notifications(&self) -> Vec<Notification> {
        std::mem::take(
            &mut *self
                .notifications
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
    pub fn reset(&self) {
        self.log.clear();
        self.drain_notifications();
    }
    fn notify(&self, level: NotificationLevel, message: String) {
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Notification { level, message });
    }
}
impl<S: TransformationService> From<S> for TransformSession<S> {
    fn from(service: S) -> Self {
        Self::new(service)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, ColumnSpec, ColumnType, DatasetMetadata};
    use crate::transform::ops::apply_transformation;
    use std::sync::atomic::{AtomicUsize, Ordering};
    fn sample_dataset(id: DatasetId, cell: &str) -> Dataset {
        let mut metadata = DatasetMetadata::new("people");
        metadata.id = id;
        let mut dataset = Dataset::new(metadata);
        dataset
            .add_column(
                ColumnSpec::new("name", ColumnType::Text),
                Column::from_strings(&[Some(cell.to_string())]),
            )
            .unwrap();
        dataset
    }
    struct FakeService {
        dataset_id: DatasetId,
        fail_with: Option<String>,
        fetches: AtomicUsize,
    }
    impl FakeService {
        fn ok(dataset_id: DatasetId) -> Self {
            Self {
                dataset_id,
                fail_with: None,
                fetches: AtomicUsize::new(0),
            }
        }
        fn failing(dataset_id: DatasetId, reason: &str) -> Self {
            Self {
                dataset_id,
                fail_with: Some(reason.to_string()),
                fetches: AtomicUsize::new(0),
            }
        }
    }
    #[async_trait]
    impl TransformationService for FakeService {
        async fn submit_transform(
            &self,
            dataset_id: &DatasetId,
            transformation: &Transformation,
        ) -> TransformResult<ServerResult> {
            if let Some(reason) = &self.fail_with {
                return Err(TransformError::Rejected {
                    reason: reason.clone(),
                });
            }
            // The service applies the op to its own copy and acknowledges.
            let _ = apply_transformation(&sample_dataset(dataset_id.clone(), "ADA"), transformation);
            Ok(ServerResult {
                dataset_id: dataset_id.clone(),
                status: DatasetStatus::Ok,
            })
        }
        async fn submit_undo(&self, dataset_id: &DatasetId) -> TransformResult<ServerResult> {
            if let Some(reason) = &self.fail_with {
                return Err(TransformError::Rejected {
                    reason: reason.clone(),
                });
            }
            Ok(ServerResult {
                dataset_id: dataset_id.clone(),
                status: DatasetStatus::Ok,
            })
        }
        async fn fetch_dataset(&self, dataset_id: &DatasetId) -> TransformResult<Dataset> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(sample_dataset(dataset_id.clone(), "ada"))
        }
    }
    #[tokio::test]
    async fn successful_transform_refreshes_and_clears_pending() {
        let id = DatasetId::new();
        let dataset = sample_dataset(id.clone(), "ADA");
        let session = TransformSession::new(FakeService::ok(id));
        let refreshed = session
            .transform(
                &dataset,
                Transformation::ToLowercase {
                    column_name: "name".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(refreshed.metadata.status, DatasetStatus::Ok);
        assert_eq!(
            refreshed.column("name").unwrap().get_string(0),
            Some("ada".to_string())
        );
        assert!(!session.has_pending());
        assert!(session.notifications().is_empty());
    }
    #[tokio::test]
    async fn failed_transform_notifies_and_rethrows() {
        let id = DatasetId::new();
        let dataset = sample_dataset(id.clone(), "ADA");
        let session = TransformSession::new(FakeService::failing(id, "division by zero"));
        let error = session
            .transform(
                &dataset,
                Transformation::Trim {
                    column_name: "name".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(error, TransformError::Rejected { .. }));
        assert!(!session.has_pending());
        let notifications = session.drain_notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].level, NotificationLevel::Error);
        assert!(notifications[0].message.contains("division by zero"));
        // the caller keeps its previous dataset value untouched
        assert_eq!(
            dataset.column("name").unwrap().get_string(0),
            Some("ADA".to_string())
        );
    }
    #[tokio::test]
    async fn undo_follows_the_same_lifecycle() {
        let id = DatasetId::new();
        let dataset = sample_dataset(id.clone(), "ada");
        let session = TransformSession::new(FakeService::ok(id));
        let refreshed = session.undo(&dataset).await.unwrap();
        assert_eq!(refreshed.metadata.status, DatasetStatus::Ok);
        assert!(!session.has_pending());
    }
    #[tokio::test]
    async fn request_sent_marks_pending_and_drops_history() {
        let id = DatasetId::new();
        let dataset = sample_dataset(id, "ada");
        let transformed = apply_transformation(
            &dataset,
            &Transformation::Trim {
                column_name: "name".to_string(),
            },
        )
        .unwrap();
        assert!(transformed.history().is_some());
        let pending = transformation_request_sent(&transformed);
        assert_eq!(pending.metadata.status, DatasetStatus::Pending);
        assert!(pending.history().is_none());
    }
}
