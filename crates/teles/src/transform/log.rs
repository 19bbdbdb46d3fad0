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

use crate::transform::ops::Transformation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);
impl RequestId {
    pub fn value(&self) -> u64 {
        self.0
    }
}
impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub transformation: Transformation,
    pub submitted_at: DateTime<Utc>,
}
// In-flight indicator only; the durable history lives server side. Keys are
// a process-monotonic sequence, so rapid successive submissions never
// collide, and iteration follows submission order.
#[derive(Debug, Default)]
pub struct PendingLog {
    entries: Mutex<BTreeMap<RequestId, PendingEntry>>,
    counter: AtomicU64,
}
impl PendingLog {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn begin(&self, transformation: Transformation) -> RequestId {
        let id = RequestId(self.counter.fetch_add(1, Ordering::Relaxed));
        let entry = PendingEntry {
            transformation,
            submitted_at: Utc::now(),
        };
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, entry);
        id
    }
    pub fn complete(&self, id: RequestId) -> Option<PendingEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&id)
    }
    pub fn contains(&self, id: RequestId) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(&id)
    }
    pub fn pending(&self) -> Vec<(RequestId, Transformation)> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(id, entry)| (*id, entry.transformation.clone()))
            .collect()
    }
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}
