// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The pipeline orchestrator (`spec.md` §4, §5).
//!
//! Realized as a single-threaded actor: `PipelineActor` owns the session
//! table, the task table, and every id generator, and is the sole mutator of
//! all of it. It runs as one Tokio task draining an `mpsc` command channel.
//! Queue admission, disk probing, network transfer, decoding, and processing
//! all run as separate Tokio tasks ("drivers") spawned by the actor; a driver
//! never touches the session/task tables directly — it reports back to the
//! actor by sending a `Command` over the same channel, the way this
//! workspace's own stage workers report completion to their orchestrator
//! rather than mutating shared state from a worker thread.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex as SyncMutex;
use tokio::sync::mpsc;

use image_pipeline_domain::entities::{ImageContainer, ProgressSnapshot, Request, Response, ResumableData};
use image_pipeline_domain::services::{
    DataCache, DataChunk, DataLoader, DataLoaderSink, DecoderFactory, ImageCache, Processor, ResumeHint,
};
use image_pipeline_domain::value_objects::{IdGenerator, Priority, ProcessingSessionId, SessionId, TaskId};
use image_pipeline_domain::{CancellationToken, ImagePipelineError};

use super::services::{
    LoadSessionRecord, MetricsObserver, OperationQueue, ProcessingSessionRecord, QueueTicket, RateLimiter,
    ResumableStore, SessionMetrics, SessionState, TaskMetrics,
};
use crate::infrastructure::config::PipelineConfig;
use crate::infrastructure::metrics::PipelineMetrics;

/// Notified with byte-progress snapshots as chunks arrive. `Arc`-wrapped
/// rather than `Box`-wrapped, unlike `CompletionCallback`, because the actor
/// keeps calling it for the life of the task while also needing to hand a
/// clone off to the delivery task spawned for each invocation (`spec.md` §5).
pub type ProgressCallback = Arc<dyn Fn(ProgressSnapshot) + Send + Sync>;
/// Notified with a non-terminal decoded (and, if configured, processed)
/// image as progressive scans complete (`spec.md` §4.5). `Arc`-wrapped for
/// the same reason as `ProgressCallback`.
pub type PartialImageCallback = Arc<dyn Fn(Response) + Send + Sync>;
/// Invoked exactly once, with the task's terminal outcome. Never invoked for
/// a cancelled task (`spec.md` §5, §8).
pub type CompletionCallback = Box<dyn FnOnce(Result<Response, ImagePipelineError>) + Send>;

/// The injected, pluggable backends a `Pipeline` is built from (`spec.md` §6).
pub struct Ports {
    pub data_loader: Arc<dyn DataLoader>,
    pub decoder_factory: Arc<dyn DecoderFactory>,
    pub data_cache: Option<Arc<dyn DataCache>>,
    pub image_cache: Option<Arc<dyn ImageCache>>,
}

enum Command {
    Submit {
        request: Request,
        task: image_pipeline_domain::entities::Task,
        on_progress: Option<ProgressCallback>,
        on_partial_image: Option<PartialImageCallback>,
        on_completion: CompletionCallback,
    },
    Cancel {
        task_id: TaskId,
    },
    SetPriority {
        task_id: TaskId,
        priority: Priority,
    },
    SetMetricsObserver(Arc<dyn MetricsObserver>),
    DiskProbeResult {
        session_id: SessionId,
        bytes: Option<Bytes>,
    },
    NetworkChunk {
        session_id: SessionId,
        chunk: DataChunk,
    },
    NetworkComplete {
        session_id: SessionId,
        error: Option<ImagePipelineError>,
    },
    DecodeComplete {
        session_id: SessionId,
        is_final: bool,
        decoder: Option<Box<dyn image_pipeline_domain::services::Decoder>>,
        result: Result<Option<ImageContainer>, ImagePipelineError>,
    },
    ProcessComplete {
        session_id: SessionId,
        processing_id: ProcessingSessionId,
        result: Result<ImageContainer, ImagePipelineError>,
    },
}

struct TaskRecord {
    task: image_pipeline_domain::entities::Task,
    session_id: SessionId,
    processor: Option<Arc<dyn Processor>>,
    on_progress: Option<ProgressCallback>,
    on_partial_image: Option<PartialImageCallback>,
    on_completion: Option<CompletionCallback>,
    metrics: TaskMetrics,
    memory_cache_write: bool,
    pending_partial_processing: bool,
}

/// A cloneable handle to a running pipeline (`spec.md` §6).
#[derive(Clone)]
pub struct Pipeline {
    tx: mpsc::UnboundedSender<Command>,
    task_ids: Arc<IdGenerator<TaskId>>,
    pub metrics: Arc<PipelineMetrics>,
}

impl Pipeline {
    /// Builds a pipeline and spawns its actor task.
    pub fn new(config: PipelineConfig, ports: Ports) -> Result<Self, ImagePipelineError> {
        let metrics = Arc::new(PipelineMetrics::new(&config.metrics.namespace)?);
        let (tx, rx) = mpsc::unbounded_channel();

        let actor = PipelineActor {
            sessions: HashMap::new(),
            key_index: HashMap::new(),
            tasks: HashMap::new(),
            session_ids: IdGenerator::new(),
            processing_ids: IdGenerator::new(),
            network_queue: OperationQueue::new(config.queue_caps.data_loading),
            decode_queue: OperationQueue::new(config.queue_caps.decoding),
            processing_queue: OperationQueue::new(config.queue_caps.processing),
            rate_limiter: Arc::new(RateLimiter::default_pipeline()),
            resumable_store: ResumableStore::new(),
            config,
            ports,
            metrics: Arc::clone(&metrics),
            metrics_observer: None,
            self_tx: tx.clone(),
        };
        tokio::spawn(actor.run(rx));

        Ok(Self {
            tx,
            task_ids: Arc::new(IdGenerator::new()),
            metrics,
        })
    }

    /// Submits `request` for loading. Returns immediately with a `Task`
    /// handle; delivery happens asynchronously via the callbacks
    /// (`spec.md` §6 — `loadImage`).
    pub fn load_image(
        &self,
        request: Request,
        on_progress: Option<ProgressCallback>,
        on_partial_image: Option<PartialImageCallback>,
        on_completion: CompletionCallback,
    ) -> image_pipeline_domain::entities::Task {
        let id = self.task_ids.next_id();
        let task = image_pipeline_domain::entities::Task::new(id, request.clone());
        let _ = self.tx.send(Command::Submit {
            request,
            task: task.clone(),
            on_progress,
            on_partial_image,
            on_completion,
        });
        task
    }

    /// Changes `task`'s priority, both on the handle itself and for the
    /// pipeline's own admission bookkeeping (`spec.md` §6 — `Task.setPriority`).
    pub fn set_priority(&self, task: &image_pipeline_domain::entities::Task, priority: Priority) {
        task.set_priority(priority);
        let _ = self.tx.send(Command::SetPriority {
            task_id: task.id(),
            priority,
        });
    }

    /// Cancels `task` (`spec.md` §6 — `Task.cancel`). Idempotent.
    pub fn cancel(&self, task: &image_pipeline_domain::entities::Task) {
        task.cancel();
        let _ = self.tx.send(Command::Cancel { task_id: task.id() });
    }

    /// Registers a metrics observer, replacing any previously registered one
    /// (`spec.md` §6 — `Pipeline.onDidFinishCollectingMetrics`).
    pub fn on_did_finish_collecting_metrics(&self, observer: Arc<dyn MetricsObserver>) {
        let _ = self.tx.send(Command::SetMetricsObserver(observer));
    }
}

struct PipelineActor {
    sessions: HashMap<SessionId, LoadSessionRecord>,
    key_index: HashMap<image_pipeline_domain::value_objects::LoadingKey, SessionId>,
    tasks: HashMap<TaskId, TaskRecord>,
    session_ids: IdGenerator<SessionId>,
    processing_ids: IdGenerator<ProcessingSessionId>,
    network_queue: OperationQueue,
    decode_queue: OperationQueue,
    processing_queue: OperationQueue,
    rate_limiter: Arc<RateLimiter>,
    resumable_store: ResumableStore,
    config: PipelineConfig,
    ports: Ports,
    metrics: Arc<PipelineMetrics>,
    metrics_observer: Option<Arc<dyn MetricsObserver>>,
    self_tx: mpsc::UnboundedSender<Command>,
}

impl PipelineActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(cmd) = rx.recv().await {
            self.handle(cmd);
        }
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Submit {
                request,
                task,
                on_progress,
                on_partial_image,
                on_completion,
            } => self.handle_submit(request, task, on_progress, on_partial_image, on_completion),
            Command::Cancel { task_id } => self.handle_cancel(task_id),
            Command::SetPriority { task_id, priority } => self.handle_set_priority(task_id, priority),
            Command::SetMetricsObserver(observer) => self.metrics_observer = Some(observer),
            Command::DiskProbeResult { session_id, bytes } => self.handle_disk_probe_result(session_id, bytes),
            Command::NetworkChunk { session_id, chunk } => self.handle_network_chunk(session_id, chunk),
            Command::NetworkComplete { session_id, error } => self.handle_network_complete(session_id, error),
            Command::DecodeComplete {
                session_id,
                is_final,
                decoder,
                result,
            } => self.handle_decode_complete(session_id, is_final, decoder, result),
            Command::ProcessComplete {
                session_id,
                processing_id,
                result,
            } => self.handle_process_complete(session_id, processing_id, result),
        }
    }

    // ---- submission, cancellation, priority -----------------------------

    fn handle_submit(
        &mut self,
        request: Request,
        task: image_pipeline_domain::entities::Task,
        on_progress: Option<ProgressCallback>,
        on_partial_image: Option<PartialImageCallback>,
        on_completion: CompletionCallback,
    ) {
        let task_id = task.id();

        if task.is_cancelled() {
            return;
        }

        if request.memory_cache_read() {
            if let Some(cache) = &self.ports.image_cache {
                if let Some(response) = cache.get(&request) {
                    self.metrics.memory_cache_hits_total.inc();
                    self.metrics.loads_started_total.inc();
                    self.metrics.loads_completed_total.inc();
                    let mut metrics = TaskMetrics::started();
                    metrics.is_memory_cache_hit = true;
                    metrics.mark_ended();
                    self.finish_metrics(task_id, metrics);
                    deliver_completion(on_completion, Ok(response));
                    return;
                }
            }
        }

        let key = self.loading_key_for(&request);
        let priority = request.priority();
        let processor = request.processor().cloned();
        let memory_cache_write = request.memory_cache_write();
        let mut task_metrics = TaskMetrics::started();

        let session_id = if let Some(&existing) = self.key_index.get(&key) {
            task_metrics.was_subscribed_to_existing_session = true;
            existing
        } else {
            let id = self.session_ids.next_id();
            let session = LoadSessionRecord::new(id, key.clone(), request.clone());
            self.sessions.insert(id, session);
            self.key_index.insert(key, id);
            self.metrics.active_sessions.inc();
            id
        };

        self.tasks.insert(
            task_id,
            TaskRecord {
                task,
                session_id,
                processor,
                on_progress,
                on_partial_image,
                on_completion: Some(on_completion),
                metrics: task_metrics,
                memory_cache_write,
                pending_partial_processing: false,
            },
        );

        let is_new = {
            let session = self.sessions.get_mut(&session_id).expect("session just inserted");
            session.subscribe(task_id);
            matches!(session.state, SessionState::Created)
        };

        self.recompute_session_priority(session_id);
        self.metrics.loads_started_total.inc();

        if is_new {
            self.begin_admission(session_id, priority, request);
        }
    }

    fn loading_key_for(&self, request: &Request) -> image_pipeline_domain::value_objects::LoadingKey {
        if self.config.is_deduplication_enabled && request.deduplication_enabled() {
            image_pipeline_domain::value_objects::LoadingKey::derive(
                request.url(),
                request.memory_cache_read(),
                request.memory_cache_write(),
            )
        } else {
            image_pipeline_domain::value_objects::LoadingKey::fresh()
        }
    }

    fn handle_cancel(&mut self, task_id: TaskId) {
        let Some(task_record) = self.tasks.remove(&task_id) else { return };
        let session_id = task_record.session_id;

        let mut metrics = task_record.metrics;
        metrics.was_cancelled = true;
        metrics.mark_ended();
        self.finish_metrics(task_id, metrics);
        // No completion callback on cancellation (spec.md §5, §8).

        let Some(session) = self.sessions.get_mut(&session_id) else { return };
        let now_empty = session.unsubscribe(task_id);

        if now_empty {
            self.terminate_session(session_id, true);
        } else {
            self.recompute_session_priority(session_id);
        }
    }

    fn handle_set_priority(&mut self, task_id: TaskId, priority: Priority) {
        let Some(session_id) = self.tasks.get(&task_id).map(|t| t.session_id) else { return };
        self.recompute_session_priority(session_id);

        if let Some(session) = self.sessions.get(&session_id) {
            if let Some(ticket_id) = session.network_queue_ticket {
                self.network_queue.reprioritize(ticket_id, session.priority);
            }
            if let Some(ticket_id) = session.decode_queue_ticket {
                self.decode_queue.reprioritize(ticket_id, session.priority);
            }
        }
        let _ = priority; // priority already mutated on the Task handle itself; this only triggers recompute.
    }

    fn recompute_session_priority(&mut self, session_id: SessionId) {
        let Some(session) = self.sessions.get(&session_id) else { return };
        let priorities: Vec<Priority> = session
            .subscribers
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .map(|t| t.task.priority())
            .collect();
        let session = self.sessions.get_mut(&session_id).unwrap();
        session.recompute_priority(priorities);
    }

    fn finish_metrics(&self, task_id: TaskId, metrics: TaskMetrics) {
        if let Some(observer) = &self.metrics_observer {
            observer.on_did_finish_collecting_metrics(task_id, metrics);
        }
    }

    // ---- admission --------------------------------------------------------

    fn begin_admission(&mut self, session_id: SessionId, priority: Priority, request: Request) {
        let session = self.sessions.get_mut(&session_id).unwrap();
        session.state = SessionState::AwaitingAdmission;
        let token = session.cancellation.token();

        spawn_preflight_driver(
            session_id,
            request,
            Arc::clone(&self.rate_limiter),
            self.config.is_rate_limiter_enabled,
            self.ports.data_cache.clone(),
            self.self_tx.clone(),
            token,
        );
        let _ = priority;
    }

    fn handle_disk_probe_result(&mut self, session_id: SessionId, bytes: Option<Bytes>) {
        let Some(session) = self.sessions.get_mut(&session_id) else { return };
        session.metrics.disk_probe_start.get_or_insert_with(chrono::Utc::now);
        session.metrics.disk_probe_end = Some(chrono::Utc::now());

        match bytes {
            Some(bytes) => {
                session.state = SessionState::Decoding;
                session.buffer = bytes::BytesMut::from(&bytes[..]);
                self.schedule_decode(session_id, true);
            }
            None => {
                session.state = SessionState::Downloading;
                session.metrics.network_start = Some(chrono::Utc::now());

                let resume_hint = if self.config.is_resumable_data_enabled {
                    self.resumable_store.get(&session.url).map(|data| {
                        session.resumable_snapshot = Some(data.clone());
                        ResumeHint {
                            from_byte: data.len() as u64,
                            validator: data.validator().to_string(),
                        }
                    })
                } else {
                    None
                };

                let token = session.cancellation.token();
                let priority = session.priority;
                let request = session.sample_request.clone();

                let ticket = self.network_queue.enqueue(priority);
                session.network_queue_ticket = Some(ticket.id());

                spawn_network_driver(
                    session_id,
                    request,
                    resume_hint,
                    Arc::clone(&self.ports.data_loader),
                    ticket,
                    self.self_tx.clone(),
                    token,
                );
            }
        }
    }

    // ---- network ----------------------------------------------------------

    fn handle_network_chunk(&mut self, session_id: SessionId, chunk: DataChunk) {
        let Some(session) = self.sessions.get_mut(&session_id) else { return };

        if let Some(snapshot) = session.resumable_snapshot.take() {
            if chunk.response.is_partial_content() {
                let mut merged = bytes::BytesMut::from(snapshot.accumulated().as_ref());
                merged.extend_from_slice(&chunk.bytes);
                session.buffer = merged;
                session.metrics.was_resumed = true;
                session.metrics.server_confirmed_resume = true;
                session.metrics.resumed_data_count = snapshot.len() as u64;
            } else {
                self.resumable_store.clear(&session.url);
                session.buffer.extend_from_slice(&chunk.bytes);
            }
        } else {
            session.buffer.extend_from_slice(&chunk.bytes);
        }

        session.response = chunk.response;
        session.metrics.downloaded_data_count = session.buffer.len() as u64;

        let completed = session.buffer.len() as u64;
        let total = session.response.expected_length;
        for &task_id in &session.subscribers.clone() {
            if let Some(task_record) = self.tasks.get(&task_id) {
                task_record.task.update_progress(completed, total);
                if let Some(on_progress) = &task_record.on_progress {
                    deliver_progress(Arc::clone(on_progress), ProgressSnapshot { completed, total });
                }
            }
        }

        let should_try_partial_decode = self.config.is_progressive_decoding_enabled
            && total.is_some_and(|total| completed < total)
            && !self.sessions.get(&session_id).unwrap().decode_in_flight;

        if should_try_partial_decode {
            self.schedule_decode(session_id, false);
        }
    }

    fn handle_network_complete(&mut self, session_id: SessionId, error: Option<ImagePipelineError>) {
        let Some(session) = self.sessions.get_mut(&session_id) else { return };
        session.metrics.network_end = Some(chrono::Utc::now());

        if let Some(err) = error {
            if !session.buffer.is_empty() {
                if let Some(validator) = session.response.validator.clone() {
                    let bytes = session.buffer.clone().freeze();
                    self.resumable_store.put(session.url.clone(), ResumableData::new(validator, bytes));
                }
            }
            self.metrics.loads_failed_total.inc();
            self.fail_session(session_id, ImagePipelineError::data_loading_failed(err.to_string()));
            return;
        }

        if let Some(cache) = self.ports.data_cache.clone() {
            let key = session.url.as_str().to_string();
            let bytes = session.buffer.clone().freeze();
            tokio::spawn(async move { cache.store(&key, bytes).await });
        }

        session.state = SessionState::Decoding;
        self.schedule_decode(session_id, true);
    }

    // ---- decode -------------------------------------------------------------

    fn schedule_decode(&mut self, session_id: SessionId, is_final: bool) {
        let session = self.sessions.get_mut(&session_id).unwrap();
        if session.decode_in_flight {
            return;
        }

        let snapshot = session.buffer.clone().freeze();

        let decoder = match session.decoder.take() {
            Some(decoder) => decoder,
            None => {
                match self.ports.decoder_factory.create_decoder(
                    &session.sample_request,
                    Some(&session.response),
                    &snapshot,
                ) {
                    Some(decoder) => decoder,
                    None => {
                        if is_final {
                            self.metrics.loads_failed_total.inc();
                            self.fail_session(session_id, ImagePipelineError::decoding_failed("no decoder for sampled bytes"));
                        }
                        return;
                    }
                }
            }
        };

        session.decode_in_flight = true;
        session.metrics.decode_start.get_or_insert_with(chrono::Utc::now);
        let token = session.cancellation.token();
        let priority = session.priority;

        let ticket = self.decode_queue.enqueue(priority);
        session.decode_queue_ticket = Some(ticket.id());

        spawn_decode_driver(session_id, decoder, snapshot, is_final, ticket, self.self_tx.clone(), token);
    }

    fn handle_decode_complete(
        &mut self,
        session_id: SessionId,
        is_final: bool,
        decoder: Option<Box<dyn image_pipeline_domain::services::Decoder>>,
        result: Result<Option<ImageContainer>, ImagePipelineError>,
    ) {
        let Some(session) = self.sessions.get_mut(&session_id) else { return };
        session.decoder = decoder;
        session.decode_in_flight = false;
        session.metrics.decode_end = Some(chrono::Utc::now());

        match result {
            Err(err) => {
                if is_final {
                    self.metrics.loads_failed_total.inc();
                    self.fail_session(session_id, err);
                }
                // A partial decode failure is just a dropped attempt; the
                // session keeps accumulating bytes and tries again later.
            }
            Ok(None) => {
                if is_final {
                    self.metrics.loads_failed_total.inc();
                    self.fail_session(session_id, ImagePipelineError::decoding_failed("decoder produced no image for final bytes"));
                }
            }
            Ok(Some(container)) => self.handle_decoded_container(session_id, container),
        }
    }

    fn handle_decoded_container(&mut self, session_id: SessionId, container: ImageContainer) {
        let session = self.sessions.get_mut(&session_id).unwrap();

        if !container.is_final() {
            if let Some(scan) = container.scan_number() {
                if !session.scan_sequence.accept(scan) {
                    return;
                }
            }
            session.last_image = Some(container.clone());
            self.dispatch_processing(session_id, container);
            return;
        }

        session.last_image = Some(container.clone());
        session.state = SessionState::Delivering;
        self.resumable_store.clear(&session.url);
        self.dispatch_processing(session_id, container);
    }

    // ---- processing ---------------------------------------------------------

    fn dispatch_processing(&mut self, session_id: SessionId, container: ImageContainer) {
        let is_final = container.is_final();
        let passthrough_animated = container.is_animated() && self.config.is_animated_image_data_enabled;

        let subscribers = self.sessions.get(&session_id).unwrap().subscribers.clone();
        let response = self.sessions.get(&session_id).unwrap().response.clone();

        for task_id in subscribers {
            let Some(task_record) = self.tasks.get_mut(&task_id) else { continue };

            if !is_final && task_record.pending_partial_processing {
                continue; // backpressure: at most one outstanding partial per task (spec.md §4.5)
            }

            let processor = if passthrough_animated { None } else { task_record.processor.clone() };

            match processor {
                None => {
                    let result = Response::new(container.image().clone(), Some(response.clone()));
                    self.deliver_to_task(task_id, is_final, Ok(result));
                }
                Some(processor) => {
                    let request = task_record.task.request();
                    if !is_final {
                        task_record.pending_partial_processing = true;
                    }
                    if task_record.metrics.process_start.is_none() {
                        task_record.metrics.mark_process_started();
                    }

                    let session = self.sessions.get_mut(&session_id).unwrap();
                    let existing = session
                        .processing_sessions
                        .iter_mut()
                        .find(|ps| ps.matches(&processor, container.image()));

                    match existing {
                        Some(ps) => {
                            ps.subscribe(task_id);
                        }
                        None => {
                            let id = self.processing_ids.next_id();
                            let mut ps = ProcessingSessionRecord::new(
                                id,
                                Arc::clone(&processor),
                                container.image().clone(),
                                is_final,
                                request,
                            );
                            ps.subscribe(task_id);
                            ps.priority = session.priority;
                            let token = session.cancellation.token();
                            let queue = self.processing_queue.clone();
                            session.processing_sessions.push(ps);

                            spawn_process_driver(
                                session_id,
                                id,
                                Arc::clone(&processor),
                                container.clone(),
                                session.processing_sessions.last().unwrap().representative_request.clone(),
                                queue,
                                session.priority,
                                self.self_tx.clone(),
                                token,
                            );
                        }
                    }
                }
            }
        }
    }

    fn handle_process_complete(
        &mut self,
        session_id: SessionId,
        processing_id: ProcessingSessionId,
        result: Result<ImageContainer, ImagePipelineError>,
    ) {
        let Some(session) = self.sessions.get_mut(&session_id) else { return };
        let Some(index) = session.processing_sessions.iter().position(|ps| ps.id == processing_id) else {
            return;
        };
        let processing = session.processing_sessions.remove(index);
        let response = session.response.clone();
        let is_final = processing.is_final_input;

        for task_id in processing.subscribers.clone() {
            if let Some(task_record) = self.tasks.get_mut(&task_id) {
                if !is_final {
                    task_record.pending_partial_processing = false;
                }
                task_record.metrics.mark_process_ended();
            }

            match &result {
                Ok(container) => {
                    let response = Response::new(container.image().clone(), Some(response.clone()));
                    self.deliver_to_task(task_id, is_final, Ok(response));
                }
                Err(err) => {
                    // Processing failures are per-task: only the subscribers
                    // of this processing session fail (spec.md §7).
                    self.deliver_to_task(task_id, true, Err(err.clone()));
                }
            }
        }
    }

    /// Delivers a result to one subscriber. Terminal results (final success,
    /// any processing error, or a session-wide failure) remove the task from
    /// bookkeeping and may end the session; non-final successes are
    /// progress-only and leave the task subscribed.
    fn deliver_to_task(&mut self, task_id: TaskId, terminal: bool, result: Result<Response, ImagePipelineError>) {
        if !terminal {
            if let Some(task_record) = self.tasks.get(&task_id) {
                if let Ok(response) = &result {
                    if let Some(on_partial_image) = &task_record.on_partial_image {
                        deliver_partial_image(Arc::clone(on_partial_image), response.clone());
                    }
                }
            }
            return;
        }

        let Some(mut task_record) = self.tasks.remove(&task_id) else { return };

        if let Ok(response) = &result {
            if task_record.memory_cache_write {
                if let Some(cache) = &self.ports.image_cache {
                    cache.put(&task_record.task.request(), response.clone());
                }
            }
            self.metrics.loads_completed_total.inc();
        } else {
            self.metrics.loads_failed_total.inc();
        }

        task_record.metrics.mark_ended();
        self.finish_metrics(task_id, task_record.metrics);

        if let Some(on_completion) = task_record.on_completion.take() {
            deliver_completion(on_completion, result);
        }

        let session_id = task_record.session_id;
        let Some(session) = self.sessions.get_mut(&session_id) else { return };
        if session.unsubscribe(task_id) {
            self.terminate_session(session_id, false);
        } else {
            self.recompute_session_priority(session_id);
        }
    }

    fn fail_session(&mut self, session_id: SessionId, err: ImagePipelineError) {
        let Some(session) = self.sessions.get(&session_id) else { return };
        let subscribers = session.subscribers.clone();
        for task_id in subscribers {
            self.deliver_to_task(task_id, true, Err(err.clone()));
        }
        // `deliver_to_task` removes subscribers one at a time and tears the
        // session down once the last one leaves, so no further action is
        // needed here even if `self.sessions` no longer contains `session_id`.
    }

    fn terminate_session(&mut self, session_id: SessionId, cancelled: bool) {
        if let Some(mut session) = self.sessions.remove(&session_id) {
            session.state = SessionState::Terminal;
            session.metrics.was_cancelled = cancelled;
            session.metrics.mark_ended();
            session.cancellation.cancel();
            self.key_index.remove(&session.loading_key);
            self.metrics.active_sessions.dec();
            if cancelled {
                self.metrics.loads_cancelled_total.inc();
            }
        }
    }
}

fn deliver_completion(callback: CompletionCallback, result: Result<Response, ImagePipelineError>) {
    // Runs on its own task, distinct from the pipeline actor's own context
    // (spec.md §5), so a slow or panicking callback cannot stall the actor.
    tokio::spawn(async move { callback(result) });
}

/// Same off-actor dispatch as `deliver_completion`, for the repeated
/// progress callback (`spec.md` §5).
fn deliver_progress(callback: ProgressCallback, snapshot: ProgressSnapshot) {
    tokio::spawn(async move { callback(snapshot) });
}

/// Same off-actor dispatch as `deliver_completion`, for the repeated
/// partial-image callback (`spec.md` §5).
fn deliver_partial_image(callback: PartialImageCallback, response: Response) {
    tokio::spawn(async move { callback(response) });
}

// ---- driver tasks -----------------------------------------------------------

fn spawn_preflight_driver(
    session_id: SessionId,
    request: Request,
    rate_limiter: Arc<RateLimiter>,
    is_rate_limiter_enabled: bool,
    data_cache: Option<Arc<dyn DataCache>>,
    tx: mpsc::UnboundedSender<Command>,
    token: CancellationToken,
) {
    tokio::spawn(async move {
        if is_rate_limiter_enabled && !rate_limiter.acquire(&token).await {
            return;
        }
        if token.is_cancelled() {
            return;
        }

        let bytes = match &data_cache {
            Some(cache) => cache.lookup(request.url().as_str()).await,
            None => None,
        };

        let _ = tx.send(Command::DiskProbeResult { session_id, bytes });
    });
}

struct ActorDataSink {
    session_id: SessionId,
    tx: mpsc::UnboundedSender<Command>,
    permit: SyncMutex<Option<super::services::Permit>>,
}

#[async_trait::async_trait]
impl DataLoaderSink for ActorDataSink {
    async fn on_chunk(&self, chunk: DataChunk) {
        let _ = self.tx.send(Command::NetworkChunk {
            session_id: self.session_id,
            chunk,
        });
    }

    async fn on_complete(&self, error: Option<ImagePipelineError>) {
        self.permit.lock().take();
        let _ = self.tx.send(Command::NetworkComplete {
            session_id: self.session_id,
            error,
        });
    }
}

fn spawn_network_driver(
    session_id: SessionId,
    request: Request,
    resume_hint: Option<ResumeHint>,
    data_loader: Arc<dyn DataLoader>,
    ticket: QueueTicket,
    tx: mpsc::UnboundedSender<Command>,
    token: CancellationToken,
) {
    tokio::spawn(async move {
        let Some(permit) = ticket.admit(&token).await else { return };
        if token.is_cancelled() {
            return;
        }

        let sink = Arc::new(ActorDataSink {
            session_id,
            tx: tx.clone(),
            permit: SyncMutex::new(Some(permit)),
        });

        let handle = data_loader.load(&request, resume_hint, sink).await;
        token.register(move || handle.cancel());
    });
}

fn spawn_decode_driver(
    session_id: SessionId,
    decoder: Box<dyn image_pipeline_domain::services::Decoder>,
    bytes: Bytes,
    is_final: bool,
    ticket: QueueTicket,
    tx: mpsc::UnboundedSender<Command>,
    token: CancellationToken,
) {
    tokio::spawn(async move {
        let Some(permit) = ticket.admit(&token).await else {
            let _ = tx.send(Command::DecodeComplete {
                session_id,
                is_final,
                decoder: Some(decoder),
                result: Err(ImagePipelineError::internal_error("decode cancelled before admission")),
            });
            return;
        };

        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let mut decoder = decoder;
            let outcome = decoder.decode(&bytes, is_final);
            (decoder, outcome)
        })
        .await;

        match joined {
            Ok((decoder, outcome)) => {
                let _ = tx.send(Command::DecodeComplete {
                    session_id,
                    is_final,
                    decoder: Some(decoder),
                    result: outcome,
                });
            }
            Err(_) => {
                let _ = tx.send(Command::DecodeComplete {
                    session_id,
                    is_final,
                    decoder: None,
                    result: Err(ImagePipelineError::internal_error("decode task panicked")),
                });
            }
        }
    });
}

fn spawn_process_driver(
    session_id: SessionId,
    processing_id: ProcessingSessionId,
    processor: Arc<dyn Processor>,
    container: ImageContainer,
    request: Request,
    processing_queue: OperationQueue,
    priority: Priority,
    tx: mpsc::UnboundedSender<Command>,
    token: CancellationToken,
) {
    tokio::spawn(async move {
        let ticket = processing_queue.enqueue(priority);
        let Some(permit) = ticket.admit(&token).await else {
            let _ = tx.send(Command::ProcessComplete {
                session_id,
                processing_id,
                result: Err(ImagePipelineError::internal_error("processing cancelled before admission")),
            });
            return;
        };

        let result = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            processor.process(&container, &request)
        })
        .await
        .unwrap_or_else(|_| Err(ImagePipelineError::internal_error("processing task panicked")));

        let _ = tx.send(Command::ProcessComplete {
            session_id,
            processing_id,
            result,
        });
    });
}
