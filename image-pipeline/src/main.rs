// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Demo host binary: wires a `Pipeline` up with minimal, local-filesystem
//! stand-ins for the network transport and decoder ports (both out of
//! scope for the library proper, `spec.md` §1) and loads a single URL
//! given on the command line.
//!
//! This binary exists to demonstrate wiring the library together end to
//! end, not to be a production image loader: real deployments supply their
//! own `DataLoader` (HTTP client) and `DecoderFactory` (real codecs).

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{error, info};
use url::Url;

use image_pipeline::application::{Pipeline, Ports};
use image_pipeline::infrastructure::caches::{InProcessDataCache, InProcessImageCache};
use image_pipeline::infrastructure::config::PipelineConfig;
use image_pipeline_domain::entities::{Image, ImageContainer, Request, TransportResponse};
use image_pipeline_domain::services::{
    DataChunk, DataLoader, DataLoaderSink, Decoder, DecoderFactory, LoadHandle, ResumeHint,
};
use image_pipeline_domain::ImagePipelineError;

/// Reads the whole file named by the request's URL path in one chunk.
/// Stands in for a real HTTP `DataLoader`; ignores `resume` entirely since
/// a local read is never partial.
struct FileDataLoader;

struct NoopHandle;
impl LoadHandle for NoopHandle {
    fn cancel(&self) {}
}

#[async_trait::async_trait]
impl DataLoader for FileDataLoader {
    async fn load(
        &self,
        request: &Request,
        _resume: Option<ResumeHint>,
        sink: Arc<dyn DataLoaderSink>,
    ) -> Box<dyn LoadHandle> {
        let path = PathBuf::from(request.url().path());
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                sink.on_chunk(DataChunk {
                    bytes: Bytes::from(bytes),
                    response: TransportResponse::new(),
                })
                .await;
                sink.on_complete(None).await;
            }
            Err(err) => {
                sink.on_complete(Some(ImagePipelineError::data_loading_failed(format!(
                    "reading {}: {err}",
                    path.display()
                ))))
                .await;
            }
        }
        Box::new(NoopHandle)
    }
}

/// Wraps the final accumulated buffer as an opaque, dimensionless `Image`.
/// A real `DecoderFactory` would sniff `sample_bytes` and hand back a codec
/// for the detected format; concrete codecs are out of scope here
/// (`spec.md` §1), so this accepts any non-empty input and only ever
/// produces a final frame.
struct RawDecoderFactory;

struct RawDecoder;

impl Decoder for RawDecoder {
    fn decode(&mut self, bytes: &Bytes, is_final: bool) -> Result<Option<ImageContainer>, ImagePipelineError> {
        if !is_final {
            return Ok(None);
        }
        Ok(Some(ImageContainer::final_image(Image::new(0, 0, bytes.clone()))))
    }
}

impl DecoderFactory for RawDecoderFactory {
    fn create_decoder(
        &self,
        _request: &Request,
        _response: Option<&TransportResponse>,
        sample_bytes: &[u8],
    ) -> Option<Box<dyn Decoder>> {
        if sample_bytes.is_empty() {
            None
        } else {
            Some(Box::new(RawDecoder))
        }
    }
}

fn init_tracing(level: Option<&str>) {
    let level = level
        .and_then(|l| l.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::INFO);
    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = image_pipeline_bootstrap::bootstrap_cli()?;
    init_tracing(cli.log_level.as_deref());

    let config = PipelineConfig::load(cli.config.as_deref())?;
    let pipeline = Pipeline::new(
        config,
        Ports {
            data_loader: Arc::new(FileDataLoader),
            decoder_factory: Arc::new(RawDecoderFactory),
            data_cache: Some(Arc::new(InProcessDataCache::new())),
            image_cache: Some(Arc::new(InProcessImageCache::new())),
        },
    )?;

    let url = match std::env::args().nth(1) {
        Some(arg) => Url::parse(&arg)
            .or_else(|_| Url::from_file_path(&arg).map_err(|_| anyhow::anyhow!("invalid URL or path: {arg}")))?,
        None => Url::parse("file:///dev/null").expect("static url"),
    };

    info!("loading {url}");

    let (tx, rx) = tokio::sync::oneshot::channel();
    pipeline.load_image(
        Request::new(url),
        None,
        None,
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    );

    match rx.await {
        Ok(Ok(response)) => info!("loaded image: {:?}", response.image()),
        Ok(Err(err)) => error!("load failed: {err}"),
        Err(_) => error!("completion callback dropped without a result"),
    }

    Ok(())
}
