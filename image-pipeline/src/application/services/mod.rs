// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Application-layer services: the concurrency-bearing records and gates
//! that the pure domain crate cannot own (they need `tokio`).

mod load_session;
mod metrics;
mod operation_queue;
mod processing_session;
mod rate_limiter;
mod resumable_store;

pub use load_session::{LoadSessionRecord, SessionState};
pub use metrics::{MetricsObserver, SessionMetrics, TaskMetrics};
pub use operation_queue::{OperationQueue, Permit, QueueTicket};
pub use processing_session::ProcessingSessionRecord;
pub use rate_limiter::RateLimiter;
pub use resumable_store::ResumableStore;
