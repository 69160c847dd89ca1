// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end scenarios run against a real `Pipeline` and hand-rolled
//! `DataLoader` / `DecoderFactory` / `Processor` test doubles, no mocking
//! framework (matching this workspace's own test style). Each test builds
//! its own `Pipeline`, so there is no shared state between them.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use url::Url;

use image_pipeline::application::{Pipeline, Ports};
use image_pipeline::infrastructure::caches::InProcessImageCache;
use image_pipeline::infrastructure::config::PipelineConfig;
use image_pipeline_domain::entities::{Image, ImageContainer, Request, Response, Task, TransportResponse};
use image_pipeline_domain::services::{
    DataChunk, DataLoader, DataLoaderSink, Decoder, DecoderFactory, ImageCache, LoadHandle, Processor, ResumeHint,
};
use image_pipeline_domain::value_objects::{ProcessorIdentity, ScanNumber};
use image_pipeline_domain::ImagePipelineError;

struct NoopHandle;
impl LoadHandle for NoopHandle {
    fn cancel(&self) {}
}

struct CancelTrackingHandle(Arc<AtomicBool>);
impl LoadHandle for CancelTrackingHandle {
    fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Delivers a fixed payload in one chunk after `delay`, counting invocations
/// so tests can assert how many fetches a batch of requests produced.
struct FixedDataLoader {
    payload: Bytes,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl DataLoader for FixedDataLoader {
    async fn load(
        &self,
        _request: &Request,
        _resume: Option<ResumeHint>,
        sink: Arc<dyn DataLoaderSink>,
    ) -> Box<dyn LoadHandle> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        sink.on_chunk(DataChunk {
            bytes: self.payload.clone(),
            response: TransportResponse::new(),
        })
        .await;
        sink.on_complete(None).await;
        Box::new(NoopHandle)
    }
}

/// Never completes on its own; used to hold a session open long enough for a
/// test to cancel a task, and reports whether its handle was cancelled.
struct StallingDataLoader {
    cancelled: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl DataLoader for StallingDataLoader {
    async fn load(
        &self,
        _request: &Request,
        _resume: Option<ResumeHint>,
        _sink: Arc<dyn DataLoaderSink>,
    ) -> Box<dyn LoadHandle> {
        Box::new(CancelTrackingHandle(Arc::clone(&self.cancelled)))
    }
}

/// Fails with a partial chunk on its first call, then on a subsequent call
/// expects a `ResumeHint` matching what it sent before, recording whatever
/// hint it actually saw for the test to assert on.
struct ResumableTestLoader {
    calls: Arc<AtomicUsize>,
    observed_resume: Arc<Mutex<Option<ResumeHint>>>,
}

#[async_trait::async_trait]
impl DataLoader for ResumableTestLoader {
    async fn load(
        &self,
        _request: &Request,
        resume: Option<ResumeHint>,
        sink: Arc<dyn DataLoaderSink>,
    ) -> Box<dyn LoadHandle> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            sink.on_chunk(DataChunk {
                bytes: Bytes::from_static(b"abc"),
                response: TransportResponse::new().with_validator("etag-1"),
            })
            .await;
            sink.on_complete(Some(ImagePipelineError::data_loading_failed("connection reset"))).await;
        } else {
            *self.observed_resume.lock().unwrap() = resume;
            sink.on_chunk(DataChunk {
                bytes: Bytes::from_static(b"abcdef"),
                response: TransportResponse::new().with_status_code(206),
            })
            .await;
            sink.on_complete(None).await;
        }
        Box::new(NoopHandle)
    }
}

/// Delivers two chunks: a short prefix, then the full payload, each tagged
/// with the total expected length so the actor knows more is coming.
struct TwoChunkDataLoader {
    prefix: Bytes,
    full: Bytes,
}

#[async_trait::async_trait]
impl DataLoader for TwoChunkDataLoader {
    async fn load(
        &self,
        _request: &Request,
        _resume: Option<ResumeHint>,
        sink: Arc<dyn DataLoaderSink>,
    ) -> Box<dyn LoadHandle> {
        let total = self.full.len() as u64;
        sink.on_chunk(DataChunk {
            bytes: self.prefix.clone(),
            response: TransportResponse::new().with_expected_length(total),
        })
        .await;
        tokio::task::yield_now().await;
        sink.on_chunk(DataChunk {
            bytes: self.full.clone(),
            response: TransportResponse::new().with_expected_length(total),
        })
        .await;
        // Give the partial decode triggered by the first chunk time to finish
        // before network completion tries to schedule the final decode.
        tokio::time::sleep(Duration::from_millis(50)).await;
        sink.on_complete(None).await;
        Box::new(NoopHandle)
    }
}

/// Produces a final image the moment any non-empty bytes are sampled.
struct OnceDecoderFactory;
struct OnceDecoder;
impl Decoder for OnceDecoder {
    fn decode(&mut self, bytes: &Bytes, is_final: bool) -> Result<Option<ImageContainer>, ImagePipelineError> {
        if !is_final {
            return Ok(None);
        }
        Ok(Some(ImageContainer::final_image(Image::new(1, 1, bytes.clone()))))
    }
}
impl DecoderFactory for OnceDecoderFactory {
    fn create_decoder(
        &self,
        _request: &Request,
        _response: Option<&TransportResponse>,
        sample_bytes: &[u8],
    ) -> Option<Box<dyn Decoder>> {
        if sample_bytes.is_empty() {
            None
        } else {
            Some(Box::new(OnceDecoder))
        }
    }
}

/// Emits one partial frame on the first (incomplete) snapshot it sees, then
/// a final frame once the buffer holds everything.
struct ProgressiveDecoder {
    total: usize,
    emitted_partial: bool,
}
impl Decoder for ProgressiveDecoder {
    fn decode(&mut self, bytes: &Bytes, is_final: bool) -> Result<Option<ImageContainer>, ImagePipelineError> {
        if is_final {
            return Ok(Some(ImageContainer::final_image(Image::new(2, 2, bytes.clone()))));
        }
        if bytes.len() < self.total && !self.emitted_partial {
            self.emitted_partial = true;
            return Ok(Some(ImageContainer::partial_image(
                Image::new(1, 1, bytes.clone()),
                ScanNumber::new(1),
            )));
        }
        Ok(None)
    }
}
struct ProgressiveDecoderFactory {
    total: usize,
}
impl DecoderFactory for ProgressiveDecoderFactory {
    fn create_decoder(
        &self,
        _request: &Request,
        _response: Option<&TransportResponse>,
        sample_bytes: &[u8],
    ) -> Option<Box<dyn Decoder>> {
        if sample_bytes.is_empty() {
            None
        } else {
            Some(Box::new(ProgressiveDecoder {
                total: self.total,
                emitted_partial: false,
            }))
        }
    }
}

/// Passes the image through unchanged, counting invocations.
struct CountingProcessor {
    id: ProcessorIdentity,
    calls: Arc<AtomicUsize>,
}
impl Processor for CountingProcessor {
    fn identity(&self) -> ProcessorIdentity {
        self.id.clone()
    }
    fn process(&self, container: &ImageContainer, _request: &Request) -> Result<ImageContainer, ImagePipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(container.clone())
    }
}

/// Fails if ever invoked; used to prove a path (e.g. memory cache hit) never
/// reaches the network.
struct PanicIfCalledDataLoader {
    called: Arc<AtomicBool>,
}
#[async_trait::async_trait]
impl DataLoader for PanicIfCalledDataLoader {
    async fn load(
        &self,
        _request: &Request,
        _resume: Option<ResumeHint>,
        sink: Arc<dyn DataLoaderSink>,
    ) -> Box<dyn LoadHandle> {
        self.called.store(true, Ordering::SeqCst);
        sink.on_complete(Some(ImagePipelineError::data_loading_failed("should never be called"))).await;
        Box::new(NoopHandle)
    }
}

struct NoDecoderFactory;
impl DecoderFactory for NoDecoderFactory {
    fn create_decoder(&self, _request: &Request, _response: Option<&TransportResponse>, _sample_bytes: &[u8]) -> Option<Box<dyn Decoder>> {
        None
    }
}

fn submit(pipeline: &Pipeline, request: Request) -> (Task, tokio::sync::oneshot::Receiver<Result<Response, ImagePipelineError>>) {
    let (tx, rx) = tokio::sync::oneshot::channel();
    let task = pipeline.load_image(
        request,
        None,
        None,
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    );
    (task, rx)
}

#[tokio::test]
async fn dedup_coalesces_concurrent_requests_into_one_fetch() {
    let url = Url::parse("mem://dedup-coalesce/a.png").unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Ports {
            data_loader: Arc::new(FixedDataLoader {
                payload: Bytes::from_static(b"same-bytes"),
                delay: Duration::from_millis(20),
                calls: Arc::clone(&calls),
            }),
            decoder_factory: Arc::new(OnceDecoderFactory),
            data_cache: None,
            image_cache: None,
        },
    )
    .unwrap();

    let mut receivers = Vec::new();
    for _ in 0..3 {
        let (_task, rx) = submit(&pipeline, Request::new(url.clone()));
        receivers.push(rx);
    }

    for rx in receivers {
        let result = rx.await.expect("completion callback fired");
        assert!(result.is_ok());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1, "three identical requests should share one fetch");
}

#[tokio::test]
async fn cancelling_one_subscriber_leaves_the_others_unaffected() {
    let url = Url::parse("mem://partial-cancel/a.png").unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Ports {
            data_loader: Arc::new(FixedDataLoader {
                payload: Bytes::from_static(b"shared"),
                delay: Duration::from_millis(30),
                calls: Arc::clone(&calls),
            }),
            decoder_factory: Arc::new(OnceDecoderFactory),
            data_cache: None,
            image_cache: None,
        },
    )
    .unwrap();

    let cancelled_fired = Arc::new(AtomicBool::new(false));
    let fired_flag = Arc::clone(&cancelled_fired);
    let task_a = pipeline.load_image(
        Request::new(url.clone()),
        None,
        None,
        Box::new(move |_result| {
            fired_flag.store(true, Ordering::SeqCst);
        }),
    );

    let (_task_b, rx_b) = submit(&pipeline, Request::new(url.clone()));

    // Give the session a moment to form before cancelling task_a.
    tokio::time::sleep(Duration::from_millis(5)).await;
    pipeline.cancel(&task_a);

    let result_b = rx_b.await.expect("task_b's completion callback fired");
    assert!(result_b.is_ok(), "the surviving subscriber should still complete");
    assert!(!cancelled_fired.load(Ordering::SeqCst), "a cancelled task must never receive a completion callback");
}

#[tokio::test]
async fn cancelling_the_only_subscriber_cancels_the_underlying_fetch() {
    let url = Url::parse("mem://full-cancel/a.png").unwrap();
    let handle_cancelled = Arc::new(AtomicBool::new(false));
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Ports {
            data_loader: Arc::new(StallingDataLoader {
                cancelled: Arc::clone(&handle_cancelled),
            }),
            decoder_factory: Arc::new(OnceDecoderFactory),
            data_cache: None,
            image_cache: None,
        },
    )
    .unwrap();

    let fired = Arc::new(AtomicBool::new(false));
    let fired_flag = Arc::clone(&fired);
    let task = pipeline.load_image(
        Request::new(url),
        None,
        None,
        Box::new(move |_result| {
            fired_flag.store(true, Ordering::SeqCst);
        }),
    );

    tokio::time::sleep(Duration::from_millis(5)).await;
    pipeline.cancel(&task);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(handle_cancelled.load(Ordering::SeqCst), "cancelling the sole subscriber should cancel the in-flight fetch");
    assert!(!fired.load(Ordering::SeqCst), "a fully cancelled session must never call back");
}

#[tokio::test]
async fn a_failed_partial_download_resumes_from_where_it_left_off() {
    let url = Url::parse("mem://resumable/a.png").unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let observed_resume = Arc::new(Mutex::new(None));
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Ports {
            data_loader: Arc::new(ResumableTestLoader {
                calls: Arc::clone(&calls),
                observed_resume: Arc::clone(&observed_resume),
            }),
            decoder_factory: Arc::new(OnceDecoderFactory),
            data_cache: None,
            image_cache: None,
        },
    )
    .unwrap();

    let (_task, rx) = submit(&pipeline, Request::new(url.clone()));
    let first = rx.await.expect("first attempt's completion callback fired");
    assert!(first.is_err(), "the first attempt is expected to fail mid-download");

    let (_task2, rx2) = submit(&pipeline, Request::new(url));
    let second = rx2.await.expect("second attempt's completion callback fired");
    assert!(second.is_ok(), "the retry should succeed");

    let hint = observed_resume.lock().unwrap().clone().expect("retry should have carried a resume hint");
    assert_eq!(hint.from_byte, 3, "resume should continue from the bytes already accumulated");
    assert_eq!(hint.validator, "etag-1");
}

#[tokio::test]
async fn a_memory_cache_hit_never_touches_the_network() {
    let url = Url::parse("mem://cache-hit/a.png").unwrap();
    let image_cache = Arc::new(InProcessImageCache::new());
    let seeded_request = Request::new(url.clone());
    image_cache.put(&seeded_request, Response::new(Image::new(4, 4, Bytes::from_static(b"cached")), None));

    let network_called = Arc::new(AtomicBool::new(false));
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Ports {
            data_loader: Arc::new(PanicIfCalledDataLoader {
                called: Arc::clone(&network_called),
            }),
            decoder_factory: Arc::new(NoDecoderFactory),
            data_cache: None,
            image_cache: Some(image_cache),
        },
    )
    .unwrap();

    let (_task, rx) = submit(&pipeline, Request::new(url));
    let result = rx.await.expect("completion callback fired");
    assert!(result.is_ok());
    assert!(!network_called.load(Ordering::SeqCst), "a memory cache hit must not reach the DataLoader");
}

#[tokio::test]
async fn progressive_decoding_delivers_a_partial_image_before_the_final_one() {
    let url = Url::parse("mem://progressive/a.png").unwrap();
    let full = Bytes::from_static(b"0123456789");
    let prefix = full.slice(0..3);

    let mut config = PipelineConfig::default();
    config.is_progressive_decoding_enabled = true;

    let pipeline = Pipeline::new(
        config,
        Ports {
            data_loader: Arc::new(TwoChunkDataLoader { prefix, full: full.clone() }),
            decoder_factory: Arc::new(ProgressiveDecoderFactory { total: full.len() }),
            data_cache: None,
            image_cache: None,
        },
    )
    .unwrap();

    // `on_partial_image` only ever fires for non-final deliveries (the final
    // image is reported through the completion callback instead), so simply
    // observing it fire at all proves a partial image was delivered.
    let partial_seen = Arc::new(AtomicBool::new(false));
    let partial_flag = Arc::clone(&partial_seen);
    let (tx, rx) = tokio::sync::oneshot::channel();
    let _task = pipeline.load_image(
        Request::new(url),
        None,
        Some(Arc::new(move |_response| {
            partial_flag.store(true, Ordering::SeqCst);
        })),
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    );

    let result = rx.await.expect("completion callback fired");
    assert!(result.is_ok());
    assert!(partial_seen.load(Ordering::SeqCst), "a progressive decode should deliver at least one partial image");
}

#[tokio::test]
async fn two_subscribers_with_the_same_processor_identity_share_one_processing_run() {
    let url = Url::parse("mem://processing-dedup/a.png").unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Ports {
            data_loader: Arc::new(FixedDataLoader {
                payload: Bytes::from_static(b"to-process"),
                delay: Duration::from_millis(10),
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            decoder_factory: Arc::new(OnceDecoderFactory),
            data_cache: None,
            image_cache: None,
        },
    )
    .unwrap();

    let processor_a = Arc::new(CountingProcessor {
        id: ProcessorIdentity::new("resize:100x100"),
        calls: Arc::clone(&calls),
    });
    let processor_b = Arc::new(CountingProcessor {
        id: ProcessorIdentity::new("resize:100x100"),
        calls: Arc::clone(&calls),
    });

    let (_task_a, rx_a) = submit(&pipeline, Request::new(url.clone()).with_processor(processor_a));
    let (_task_b, rx_b) = submit(&pipeline, Request::new(url).with_processor(processor_b));

    let result_a = rx_a.await.expect("task_a's completion callback fired");
    let result_b = rx_b.await.expect("task_b's completion callback fired");
    assert!(result_a.is_ok());
    assert!(result_b.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 1, "identical processor identities on the same image should run once");
}
