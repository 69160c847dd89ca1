// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Per-task and per-session metrics bookkeeping (`spec.md` §4.7).
//!
//! These structs are the source of truth the pipeline actor updates inline
//! with every state transition; `infrastructure::metrics::PipelineMetrics`
//! (the Prometheus registry) is a read-only aggregate export of the same
//! events, not a second copy of this bookkeeping.

use chrono::{DateTime, Utc};
use image_pipeline_domain::value_objects::TaskId;

/// Per-task timing and outcome bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct TaskMetrics {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub was_cancelled: bool,
    pub was_subscribed_to_existing_session: bool,
    pub is_memory_cache_hit: bool,
    pub process_start: Option<DateTime<Utc>>,
    pub process_end: Option<DateTime<Utc>>,
}

impl TaskMetrics {
    pub fn started() -> Self {
        Self {
            start_date: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn mark_ended(&mut self) {
        self.end_date = Some(Utc::now());
    }

    pub fn mark_process_started(&mut self) {
        self.process_start = Some(Utc::now());
    }

    pub fn mark_process_ended(&mut self) {
        self.process_end = Some(Utc::now());
    }
}

/// Per-session timing and transfer bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct SessionMetrics {
    pub disk_probe_start: Option<DateTime<Utc>>,
    pub disk_probe_end: Option<DateTime<Utc>>,
    pub network_start: Option<DateTime<Utc>>,
    pub network_end: Option<DateTime<Utc>>,
    pub decode_start: Option<DateTime<Utc>>,
    pub decode_end: Option<DateTime<Utc>>,
    pub downloaded_data_count: u64,
    pub was_resumed: bool,
    pub resumed_data_count: u64,
    pub server_confirmed_resume: bool,
    pub was_cancelled: bool,
    pub end_date: Option<DateTime<Utc>>,
}

impl SessionMetrics {
    pub fn mark_ended(&mut self) {
        self.end_date = Some(Utc::now());
    }
}

/// Main-context callback hook: `Pipeline.onDidFinishCollectingMetrics`
/// (`spec.md` §6).
pub trait MetricsObserver: Send + Sync {
    fn on_did_finish_collecting_metrics(&self, task_id: TaskId, metrics: TaskMetrics);
}
