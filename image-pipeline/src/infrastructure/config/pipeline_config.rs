// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Pipeline configuration (`spec.md` §6), layered the way this workspace's
//! own `ConfigService` layers configuration: programmatic defaults, an
//! optional TOML file, then environment overrides.

use std::path::Path;

use byte_unit::Byte;
use image_pipeline_domain::ImagePipelineError;
use serde::{Deserialize, Serialize};

/// Queue admission caps (`spec.md` §6: `dataLoading=6`, `decoding=1`,
/// `processing=2`).
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueCaps {
    pub data_loading: usize,
    pub decoding: usize,
    pub processing: usize,
}

impl Default for QueueCaps {
    fn default() -> Self {
        Self {
            data_loading: 6,
            decoding: 1,
            processing: 2,
        }
    }
}

/// Disk cache bounds (`spec.md` §6: `countLimit=1000`, `sizeLimit=100 MiB`).
/// The disk cache's own block layout stays out of scope; these are only the
/// bounds the pipeline hands a configured disk cache implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiskCacheConfig {
    pub count_limit: usize,
    pub size_limit: String,
}

impl DiskCacheConfig {
    pub fn size_limit_bytes(&self) -> Result<u64, ImagePipelineError> {
        Byte::parse_str(&self.size_limit, true)
            .map(|b| b.as_u64())
            .map_err(|err| ImagePipelineError::invalid_configuration(format!("disk_cache.size_limit: {err}")))
    }
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        Self {
            count_limit: 1000,
            size_limit: "100 MiB".to_string(),
        }
    }
}

/// Ambient logging toggle, carried regardless of the spec's feature
/// non-goals (`SPEC_FULL.md` §9.1).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Ambient metrics toggle, carried regardless of the spec's feature
/// non-goals (`SPEC_FULL.md` §9.4).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub namespace: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace: "image_pipeline".to_string(),
        }
    }
}

/// Full pipeline configuration surface (`spec.md` §6 plus the ambient
/// sections `SPEC_FULL.md` §9 adds).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub is_deduplication_enabled: bool,
    pub is_rate_limiter_enabled: bool,
    pub is_progressive_decoding_enabled: bool,
    pub is_resumable_data_enabled: bool,
    pub is_animated_image_data_enabled: bool,
    pub queue_caps: QueueCaps,
    pub disk_cache: DiskCacheConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            is_deduplication_enabled: true,
            is_rate_limiter_enabled: true,
            is_progressive_decoding_enabled: false,
            is_resumable_data_enabled: true,
            is_animated_image_data_enabled: false,
            queue_caps: QueueCaps::default(),
            disk_cache: DiskCacheConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads configuration layered as: compiled-in defaults, an optional
    /// TOML file at `path`, then `IMAGE_PIPELINE__*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ImagePipelineError> {
        let defaults = config::Config::try_from(&Self::default())
            .map_err(|err| ImagePipelineError::invalid_configuration(format!("building default config: {err}")))?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("IMAGE_PIPELINE")
                .separator("__")
                .try_parsing(true),
        );

        let built = builder
            .build()
            .map_err(|err| ImagePipelineError::invalid_configuration(format!("loading configuration: {err}")))?;

        built
            .try_deserialize()
            .map_err(|err| ImagePipelineError::invalid_configuration(format!("parsing configuration: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = PipelineConfig::default();
        assert!(config.is_deduplication_enabled);
        assert!(config.is_rate_limiter_enabled);
        assert!(!config.is_progressive_decoding_enabled);
        assert!(config.is_resumable_data_enabled);
        assert!(!config.is_animated_image_data_enabled);
        assert_eq!(config.queue_caps.data_loading, 6);
        assert_eq!(config.queue_caps.decoding, 1);
        assert_eq!(config.queue_caps.processing, 2);
        assert_eq!(config.disk_cache.count_limit, 1000);
        assert_eq!(config.disk_cache.size_limit_bytes().unwrap(), 100 * 1024 * 1024);
    }

    #[test]
    fn load_with_no_file_yields_defaults() {
        let config = PipelineConfig::load(None).unwrap();
        assert_eq!(config.queue_caps.processing, 2);
    }
}
