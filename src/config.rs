use std::env;
use std::time::Duration;

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

fn env_usize(key: &str) -> Option<usize> {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
}

fn env_duration_millis(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Runtime configuration for an import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Fixed batch size; `None` sizes batches from the import length.
    pub batch_size: Option<usize>,
    pub extraction_cache: bool,
    pub cache_max_entries: Option<usize>,
    /// Cancel the run once this much time has passed.
    pub cancel_after: Option<Duration>,
}

impl ImportConfig {
    pub fn from_env() -> Self {
        Self {
            batch_size: env_usize("IMPORT_BATCH_SIZE").filter(|size| *size > 0),
            extraction_cache: env_bool("IMPORT_EXTRACTION_CACHE", true),
            cache_max_entries: env_usize("IMPORT_CACHE_MAX_ENTRIES"),
            cancel_after: env_duration_millis("IMPORT_CANCEL_AFTER_MS"),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: None,
            extraction_cache: true,
            cache_max_entries: None,
            cancel_after: None,
        }
    }
}
