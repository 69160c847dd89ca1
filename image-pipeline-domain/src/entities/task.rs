// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `Task`: the handle returned to a caller of `loadImage`.
//!
//! The task's link to its current `LoadSession` is bookkeeping the pipeline
//! keeps internally (it is "a weak link" per `spec.md` §3 precisely because
//! the submitter's handle must not keep the session alive); the public
//! `Task` here only carries what the owner is allowed to touch: its
//! priority and its cancellation token.

use std::sync::Arc;

use crate::cancellation::{CancellationSource, CancellationToken};
use crate::entities::{Progress, ProgressSnapshot, Request};
use crate::value_objects::{Priority, TaskId};

/// A handle to one in-flight (or completed) image load.
///
/// Cloning a `Task` shares the same underlying state — all clones observe
/// the same progress counters and the same cancellation token, matching the
/// source's single logical task with multiple references.
#[derive(Clone)]
pub struct Task {
    id: TaskId,
    request: Arc<parking_lot::Mutex<Request>>,
    progress: Arc<Progress>,
    cancellation: CancellationSource,
}

impl Task {
    pub fn new(id: TaskId, request: Request) -> Self {
        Self {
            id,
            request: Arc::new(parking_lot::Mutex::new(request)),
            progress: Arc::new(Progress::new()),
            cancellation: CancellationSource::new(),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn priority(&self) -> Priority {
        self.request.lock().priority()
    }

    /// Mutates the wrapped request's priority. The pipeline observes this on
    /// its next queue-admission recompute (`spec.md` §4.3).
    pub fn set_priority(&self, priority: Priority) {
        self.request.lock().set_priority(priority);
    }

    pub fn request(&self) -> Request {
        self.request.lock().clone()
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.progress.snapshot()
    }

    /// Used by the pipeline to push progress updates as chunks arrive.
    pub fn update_progress(&self, completed: u64, total: Option<u64>) {
        self.progress.update(completed, total);
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.token()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Idempotent (`spec.md` §8: `cancel()` called k times ≡ called once).
    /// Subsequent submissions of an already-cancelled task are ignored by
    /// the pipeline (`spec.md` §5).
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }
}
