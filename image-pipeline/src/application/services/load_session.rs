// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `LoadSessionRecord`: the pipeline actor's record for one logical load
//! (`spec.md` §3, §4.4). Lives only inside the actor's session table —
//! never shared, never locked; the actor is its sole mutator.

use bytes::BytesMut;
use url::Url;

use image_pipeline_domain::entities::{ImageContainer, Request, ResumableData, TransportResponse};
use image_pipeline_domain::services::Decoder;
use image_pipeline_domain::value_objects::{LoadingKey, Priority, ScanSequence, SessionId, TaskId};
use image_pipeline_domain::CancellationSource;

use super::metrics::SessionMetrics;
use super::processing_session::ProcessingSessionRecord;

/// States of a Load Session (`spec.md` §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    AwaitingAdmission,
    ProbingDiskCache,
    Downloading,
    Decoding,
    Delivering,
    Terminal,
}

pub struct LoadSessionRecord {
    pub id: SessionId,
    pub loading_key: LoadingKey,
    pub url: Url,
    /// The request that created this session, kept around for the decoder
    /// factory and the network transport (`spec.md` §4.4) — a representative
    /// sample, not a per-subscriber value; every subscriber shares the same
    /// bytes regardless of whose request happened to create the session.
    pub sample_request: Request,
    pub subscribers: Vec<TaskId>,
    pub state: SessionState,
    pub buffer: BytesMut,
    pub response: TransportResponse,
    pub decoder: Option<Box<dyn Decoder>>,
    pub last_image: Option<ImageContainer>,
    pub decode_in_flight: bool,
    pub scan_sequence: ScanSequence,
    pub processing_sessions: Vec<ProcessingSessionRecord>,
    pub cancellation: CancellationSource,
    pub priority: Priority,
    pub resumable_snapshot: Option<ResumableData>,
    pub metrics: SessionMetrics,
    /// Id of this session's most recent ticket into the network/decode
    /// `OperationQueue`, so a later `setPriority` can re-sort it in the
    /// waiting region while it's still there (`spec.md` §4.3). `None` before
    /// the first enqueue; once the ticket has been admitted, `reprioritize`
    /// is harmlessly a no-op against it.
    pub network_queue_ticket: Option<u64>,
    pub decode_queue_ticket: Option<u64>,
}

impl LoadSessionRecord {
    pub fn new(id: SessionId, loading_key: LoadingKey, sample_request: Request) -> Self {
        let url = sample_request.url().clone();
        Self {
            id,
            loading_key,
            url,
            sample_request,
            subscribers: Vec::new(),
            state: SessionState::Created,
            buffer: BytesMut::new(),
            response: TransportResponse::new(),
            decoder: None,
            last_image: None,
            decode_in_flight: false,
            scan_sequence: ScanSequence::new(),
            processing_sessions: Vec::new(),
            cancellation: CancellationSource::new(),
            priority: Priority::Normal,
            resumable_snapshot: None,
            metrics: SessionMetrics::default(),
            network_queue_ticket: None,
            decode_queue_ticket: None,
        }
    }

    pub fn subscribe(&mut self, task_id: TaskId) {
        if !self.subscribers.contains(&task_id) {
            self.subscribers.push(task_id);
        }
    }

    /// Removes `task_id` from the subscriber set and every processing
    /// session nested under it (`spec.md` §4.4, §4.6). Returns `true` if
    /// the session has no subscribers left and should be cancelled/removed.
    pub fn unsubscribe(&mut self, task_id: TaskId) -> bool {
        self.subscribers.retain(|id| *id != task_id);
        for processing in &mut self.processing_sessions {
            processing.subscribers.retain(|id| *id != task_id);
        }
        self.processing_sessions.retain(|p| !p.subscribers.is_empty());
        self.subscribers.is_empty()
    }

    /// Recomputes `self.priority` as the max of the given subscriber task
    /// priorities (`spec.md` §3: "priority = max(subscriber.request.priority)").
    /// The actor looks up current task priorities and passes them in, since
    /// this record holds subscriber ids, not their priorities.
    pub fn recompute_priority(&mut self, subscriber_priorities: impl IntoIterator<Item = Priority>) {
        self.priority = Priority::max_of(subscriber_priorities);
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
