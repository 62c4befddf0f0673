use std::time::Duration;

use hoard_core::image::{MAX_IMAGE_BYTES, RECENT_IMAGE_WINDOW};

/// Import tuning loaded from environment variables.
///
/// All fields have defaults matching interactive use.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Debounce window for page-level and modal drops (default: 500 ms).
    pub drop_cooldown: Duration,
    /// Debounce window for the file picker (default: 1000 ms).
    pub picker_cooldown: Duration,
    /// Same name+size images inside this window are dropped (default: 3 s).
    pub recent_image_window: Duration,
    /// Per-image size ceiling in bytes (default: 20 MB).
    pub max_image_bytes: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            drop_cooldown: Duration::from_millis(500),
            picker_cooldown: Duration::from_millis(1000),
            recent_image_window: RECENT_IMAGE_WINDOW,
            max_image_bytes: MAX_IMAGE_BYTES,
        }
    }
}

impl ImportConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default    |
    /// |--------------------------------|------------|
    /// | `HOARD_DROP_COOLDOWN_MS`       | `500`      |
    /// | `HOARD_PICKER_COOLDOWN_MS`     | `1000`     |
    /// | `HOARD_RECENT_IMAGE_WINDOW_MS` | `3000`     |
    /// | `HOARD_MAX_IMAGE_BYTES`        | `20971520` |
    pub fn from_env() -> Self {
        let drop_cooldown_ms: u64 = std::env::var("HOARD_DROP_COOLDOWN_MS")
            .unwrap_or_else(|_| "500".into())
            .parse()
            .expect("HOARD_DROP_COOLDOWN_MS must be a valid u64");

        let picker_cooldown_ms: u64 = std::env::var("HOARD_PICKER_COOLDOWN_MS")
            .unwrap_or_else(|_| "1000".into())
            .parse()
            .expect("HOARD_PICKER_COOLDOWN_MS must be a valid u64");

        let recent_image_window_ms: u64 = std::env::var("HOARD_RECENT_IMAGE_WINDOW_MS")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("HOARD_RECENT_IMAGE_WINDOW_MS must be a valid u64");

        let max_image_bytes: u64 = std::env::var("HOARD_MAX_IMAGE_BYTES")
            .unwrap_or_else(|_| MAX_IMAGE_BYTES.to_string())
            .parse()
            .expect("HOARD_MAX_IMAGE_BYTES must be a valid u64");

        Self {
            drop_cooldown: Duration::from_millis(drop_cooldown_ms),
            picker_cooldown: Duration::from_millis(picker_cooldown_ms),
            recent_image_window: Duration::from_millis(recent_image_window_ms),
            max_image_bytes,
        }
    }

    /// No debouncing at all; for tests and scripted use.
    pub fn without_cooldowns() -> Self {
        Self {
            drop_cooldown: Duration::ZERO,
            picker_cooldown: Duration::ZERO,
            ..Self::default()
        }
    }
}
