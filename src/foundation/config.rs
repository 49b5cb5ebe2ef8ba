//! Immutable pipeline configuration.
//!
//! A [`PipelineConfig`] is chosen once per run (from a [`DeviceTier`] plus
//! optional JSON overrides) and threaded explicitly through every stage.

use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;

use crate::foundation::core::DeviceTier;
use crate::foundation::error::{DepthTextError, DepthTextResult};

const MIB: u64 = 1024 * 1024;

/// Serde support for `Duration` as integer milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Limits used by validation and optimization.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationConfig {
    /// Longest allowed side after optimization, in pixels.
    pub max_dimension: u32,
    /// Advisory upper bound on the encoded input size, in bytes.
    pub max_file_size: u64,
    /// Quality handed to the external capability on the reduced retry, in `[0, 1]`.
    pub quality_threshold: f32,
    /// Advisory upper bound on one decoded RGBA buffer, in MiB.
    #[serde(rename = "memoryThresholdMB")]
    pub memory_threshold_mb: u32,
}

impl OptimizationConfig {
    /// Limits for a device tier.
    pub fn for_tier(tier: DeviceTier) -> Self {
        match tier {
            DeviceTier::Desktop => Self {
                max_dimension: 2048,
                max_file_size: 10 * MIB,
                quality_threshold: 0.8,
                memory_threshold_mb: 512,
            },
            DeviceTier::Mobile => Self {
                max_dimension: 1024,
                max_file_size: 5 * MIB,
                quality_threshold: 0.7,
                memory_threshold_mb: 256,
            },
        }
    }

    /// `memory_threshold_mb` expressed in bytes.
    pub fn memory_threshold_bytes(&self) -> u64 {
        u64::from(self.memory_threshold_mb) * MIB
    }
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self::for_tier(DeviceTier::Desktop)
    }
}

/// Everything a pipeline run needs to know about its environment.
///
/// Serializes to the same document [`PipelineConfig::from_json_str`] reads,
/// with durations as integer milliseconds under `*_ms` keys.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PipelineConfig {
    /// Device tier; selects limits, timeouts and the compositor path.
    pub device_tier: DeviceTier,
    /// Validation and optimization limits.
    pub optimization: OptimizationConfig,
    /// Budget for the quality-first external segmentation attempt.
    #[serde(rename = "primary_timeout_ms", with = "duration_ms")]
    pub primary_timeout: Duration,
    /// Fixed budget for the one-shot reduced-quality retry.
    #[serde(rename = "retry_timeout_ms", with = "duration_ms")]
    pub retry_timeout: Duration,
    /// Inputs above this many bytes are rejected before decoding.
    pub hard_max_file_size: u64,
    /// Interval between memory samples while a run is tracked.
    #[serde(rename = "sample_interval_ms", with = "duration_ms")]
    pub sample_interval: Duration,
}

impl PipelineConfig {
    /// Defaults for a device tier.
    ///
    /// The retry budget is half of the primary budget.
    pub fn for_tier(tier: DeviceTier) -> Self {
        let primary_timeout = match tier {
            DeviceTier::Desktop => Duration::from_secs(60),
            DeviceTier::Mobile => Duration::from_secs(45),
        };
        Self {
            device_tier: tier,
            optimization: OptimizationConfig::for_tier(tier),
            primary_timeout,
            retry_timeout: primary_timeout / 2,
            hard_max_file_size: 50 * MIB,
            sample_interval: Duration::from_millis(100),
        }
    }

    /// Load overrides from a JSON file on top of the defaults for `tier`.
    ///
    /// A `device_tier` present in the file wins over `tier`, and its
    /// defaults are used for every field the file leaves out.
    pub fn from_json_file(path: &Path, tier: DeviceTier) -> DepthTextResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read pipeline config '{}'", path.display()))?;
        Self::from_json_str(&text, tier)
    }

    /// Same as [`PipelineConfig::from_json_file`] for an in-memory document.
    pub fn from_json_str(text: &str, tier: DeviceTier) -> DepthTextResult<Self> {
        let overrides: ConfigOverrides = serde_json::from_str(text).map_err(|e| {
            DepthTextError::invalid_format("pipeline config is not valid JSON")
                .with_technical(e.to_string())
        })?;
        Ok(overrides.apply(tier))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::for_tier(DeviceTier::Desktop)
    }
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverrides {
    device_tier: Option<DeviceTier>,
    optimization: Option<OptimizationOverrides>,
    primary_timeout_ms: Option<u64>,
    retry_timeout_ms: Option<u64>,
    hard_max_file_size: Option<u64>,
    sample_interval_ms: Option<u64>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct OptimizationOverrides {
    max_dimension: Option<u32>,
    max_file_size: Option<u64>,
    quality_threshold: Option<f32>,
    #[serde(rename = "memoryThresholdMB")]
    memory_threshold_mb: Option<u32>,
}

impl ConfigOverrides {
    fn apply(self, tier: DeviceTier) -> PipelineConfig {
        let mut cfg = PipelineConfig::for_tier(self.device_tier.unwrap_or(tier));
        if let Some(o) = self.optimization {
            let opt = &mut cfg.optimization;
            opt.max_dimension = o.max_dimension.unwrap_or(opt.max_dimension);
            opt.max_file_size = o.max_file_size.unwrap_or(opt.max_file_size);
            opt.quality_threshold = o.quality_threshold.unwrap_or(opt.quality_threshold);
            opt.memory_threshold_mb = o.memory_threshold_mb.unwrap_or(opt.memory_threshold_mb);
        }
        if let Some(ms) = self.primary_timeout_ms {
            cfg.primary_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.retry_timeout_ms {
            cfg.retry_timeout = Duration::from_millis(ms);
        }
        if let Some(bytes) = self.hard_max_file_size {
            cfg.hard_max_file_size = bytes;
        }
        if let Some(ms) = self.sample_interval_ms {
            cfg.sample_interval = Duration::from_millis(ms.max(1));
        }
        cfg
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
