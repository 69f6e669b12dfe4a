//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use videer_footage::RetryPolicy;

/// Pipeline configuration, loaded from environment variables with
/// sensible defaults.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root of the intermediate artifact cache.
    pub work_dir: PathBuf,
    /// Directory for final renders.
    pub outputs_dir: PathBuf,
    /// Maximum concurrent footage downloads per query.
    pub max_download_parallel: usize,
    /// Maximum segments resolving footage concurrently.
    pub max_segment_parallel: usize,
    /// Retry attempts for network-bound operations.
    pub retry_max_attempts: u32,
    /// Base retry delay.
    pub retry_base_delay: Duration,
    /// Timeout for one external encoder invocation.
    pub ffmpeg_timeout: Duration,
    /// Age threshold for cache cleanup.
    pub cache_max_age_days: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("work"),
            outputs_dir: PathBuf::from("outputs"),
            max_download_parallel: 2,
            max_segment_parallel: 4,
            retry_max_attempts: 4,
            retry_base_delay: Duration::from_millis(500),
            ffmpeg_timeout: Duration::from_secs(900),
            cache_max_age_days: 30,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("VIDEER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            outputs_dir: std::env::var("VIDEER_OUTPUTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.outputs_dir),
            max_download_parallel: env_parse("VIDEER_MAX_DOWNLOAD_PARALLEL")
                .unwrap_or(defaults.max_download_parallel),
            max_segment_parallel: env_parse("VIDEER_MAX_SEGMENT_PARALLEL")
                .unwrap_or(defaults.max_segment_parallel),
            retry_max_attempts: env_parse("VIDEER_RETRY_ATTEMPTS")
                .unwrap_or(defaults.retry_max_attempts),
            retry_base_delay: env_parse("VIDEER_RETRY_BASE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
            ffmpeg_timeout: env_parse("VIDEER_FFMPEG_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.ffmpeg_timeout),
            cache_max_age_days: env_parse("VIDEER_CACHE_MAX_AGE_DAYS")
                .unwrap_or(defaults.cache_max_age_days),
        }
    }

    /// The retry policy shared by network-bound operations.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.retry_max_attempts)
            .with_base_delay(self.retry_base_delay)
    }

    /// Cache age threshold as a duration.
    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_days * 24 * 3600)
    }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.parse().ok())
}
