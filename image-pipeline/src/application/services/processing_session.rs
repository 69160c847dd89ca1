// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `ProcessingSessionRecord`: a shared processor run keyed by (processor
//! identity, source image identity) within a Load Session (`spec.md` §3,
//! §4.6).

use std::sync::Arc;

use image_pipeline_domain::entities::{Image, Request};
use image_pipeline_domain::services::Processor;
use image_pipeline_domain::value_objects::{Priority, ProcessingSessionId, TaskId};

pub struct ProcessingSessionRecord {
    pub id: ProcessingSessionId,
    pub processor: Arc<dyn Processor>,
    pub input_image: Image,
    /// `true` when `input_image` came from the session's final decode —
    /// final results are never dropped or preempted (`spec.md` §4.5).
    pub is_final_input: bool,
    pub subscribers: Vec<TaskId>,
    pub priority: Priority,
    pub in_flight: bool,
    /// The request of whichever subscriber first created this processing
    /// session, passed to `Processor::process` (`spec.md` §4.6: the shared
    /// run is keyed on processor identity and image identity, not on a
    /// specific subscriber's request).
    pub representative_request: Request,
}

impl ProcessingSessionRecord {
    pub fn new(
        id: ProcessingSessionId,
        processor: Arc<dyn Processor>,
        input_image: Image,
        is_final_input: bool,
        representative_request: Request,
    ) -> Self {
        Self {
            id,
            processor,
            input_image,
            is_final_input,
            subscribers: Vec::new(),
            priority: Priority::Normal,
            in_flight: false,
            representative_request,
        }
    }

    /// True when `processor` and `image` match this session's key
    /// (`spec.md` §4.6: processor equality by identity, image equality by
    /// identity).
    pub fn matches(&self, processor: &Arc<dyn Processor>, image: &Image) -> bool {
        self.processor.identity() == processor.identity() && self.input_image.is_identical(image)
    }

    pub fn subscribe(&mut self, task_id: TaskId) {
        if !self.subscribers.contains(&task_id) {
            self.subscribers.push(task_id);
        }
    }

    pub fn recompute_priority(&mut self, subscriber_priorities: impl IntoIterator<Item = Priority>) {
        self.priority = Priority::max_of(subscriber_priorities);
    }
}
