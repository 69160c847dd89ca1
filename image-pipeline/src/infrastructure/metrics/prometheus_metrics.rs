// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Prometheus export of pipeline activity (`SPEC_FULL.md` §9.4), mirroring
//! this workspace's own `MetricsService`: every metric is built through
//! `Opts::new(name, help).namespace(...)` and construction failures are
//! mapped into the domain error taxonomy rather than panicking.

use image_pipeline_domain::ImagePipelineError;
use prometheus::{Gauge, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};

/// Read-only Prometheus export of pipeline activity. The per-task/per-session
/// bookkeeping in `application::services::metrics` remains the source of
/// truth; this registry only aggregates counts and durations for scraping.
pub struct PipelineMetrics {
    pub registry: Registry,
    pub loads_started_total: IntCounter,
    pub loads_completed_total: IntCounter,
    pub loads_failed_total: IntCounter,
    pub loads_cancelled_total: IntCounter,
    pub memory_cache_hits_total: IntCounter,
    pub session_latency_seconds: Histogram,
    pub network_queue_depth: IntGauge,
    pub decode_queue_depth: IntGauge,
    pub processing_queue_depth: IntGauge,
    pub active_sessions: IntGauge,
    pub rate_limiter_tokens: Gauge,
}

impl PipelineMetrics {
    pub fn new(namespace: &str) -> Result<Self, ImagePipelineError> {
        let registry = Registry::new();

        let loads_started_total = IntCounter::with_opts(
            Opts::new("loads_started_total", "Image loads submitted to the pipeline").namespace(namespace),
        )
        .map_err(|err| ImagePipelineError::metrics_error(format!("loads_started_total: {err}")))?;

        let loads_completed_total = IntCounter::with_opts(
            Opts::new("loads_completed_total", "Image loads delivered successfully").namespace(namespace),
        )
        .map_err(|err| ImagePipelineError::metrics_error(format!("loads_completed_total: {err}")))?;

        let loads_failed_total = IntCounter::with_opts(
            Opts::new("loads_failed_total", "Image loads that failed").namespace(namespace),
        )
        .map_err(|err| ImagePipelineError::metrics_error(format!("loads_failed_total: {err}")))?;

        let loads_cancelled_total = IntCounter::with_opts(
            Opts::new("loads_cancelled_total", "Image loads cancelled before completion").namespace(namespace),
        )
        .map_err(|err| ImagePipelineError::metrics_error(format!("loads_cancelled_total: {err}")))?;

        let memory_cache_hits_total = IntCounter::with_opts(
            Opts::new("memory_cache_hits_total", "Tasks served directly from the memory cache").namespace(namespace),
        )
        .map_err(|err| ImagePipelineError::metrics_error(format!("memory_cache_hits_total: {err}")))?;

        let session_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "session_latency_seconds",
                "Seconds from session creation to final image delivery",
            )
            .namespace(namespace),
        )
        .map_err(|err| ImagePipelineError::metrics_error(format!("session_latency_seconds: {err}")))?;

        let network_queue_depth = IntGauge::with_opts(
            Opts::new("network_queue_depth", "In-flight network operations").namespace(namespace),
        )
        .map_err(|err| ImagePipelineError::metrics_error(format!("network_queue_depth: {err}")))?;

        let decode_queue_depth = IntGauge::with_opts(
            Opts::new("decode_queue_depth", "In-flight decode operations").namespace(namespace),
        )
        .map_err(|err| ImagePipelineError::metrics_error(format!("decode_queue_depth: {err}")))?;

        let processing_queue_depth = IntGauge::with_opts(
            Opts::new("processing_queue_depth", "In-flight processing operations").namespace(namespace),
        )
        .map_err(|err| ImagePipelineError::metrics_error(format!("processing_queue_depth: {err}")))?;

        let active_sessions = IntGauge::with_opts(
            Opts::new("active_sessions", "Load sessions currently in the session table").namespace(namespace),
        )
        .map_err(|err| ImagePipelineError::metrics_error(format!("active_sessions: {err}")))?;

        let rate_limiter_tokens = Gauge::with_opts(
            Opts::new("rate_limiter_tokens", "Tokens currently available in the rate limiter bucket").namespace(namespace),
        )
        .map_err(|err| ImagePipelineError::metrics_error(format!("rate_limiter_tokens: {err}")))?;

        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(loads_started_total.clone()),
            Box::new(loads_completed_total.clone()),
            Box::new(loads_failed_total.clone()),
            Box::new(loads_cancelled_total.clone()),
            Box::new(memory_cache_hits_total.clone()),
            Box::new(session_latency_seconds.clone()),
            Box::new(network_queue_depth.clone()),
            Box::new(decode_queue_depth.clone()),
            Box::new(processing_queue_depth.clone()),
            Box::new(active_sessions.clone()),
            Box::new(rate_limiter_tokens.clone()),
        ];
        for collector in collectors {
            registry
                .register(collector)
                .map_err(|err| ImagePipelineError::metrics_error(format!("registering collector: {err}")))?;
        }

        Ok(Self {
            registry,
            loads_started_total,
            loads_completed_total,
            loads_failed_total,
            loads_cancelled_total,
            memory_cache_hits_total,
            session_latency_seconds,
            network_queue_depth,
            decode_queue_depth,
            processing_queue_depth,
            active_sessions,
            rate_limiter_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_registers_without_error() {
        let metrics = PipelineMetrics::new("image_pipeline_test").unwrap();
        metrics.loads_started_total.inc();
        assert_eq!(metrics.loads_started_total.get(), 1);
        assert!(!metrics.registry.gather().is_empty());
    }
}
