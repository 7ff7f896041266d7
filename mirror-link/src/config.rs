//! Viewer configuration.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use mirror_core::{
    DisplayInfo, FetchPolicy, InputOptions, MirrorError, RotationStrategy, SessionConfig, Signals,
};

/// Top-level configuration for a mirroring viewer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Control connection settings.
    pub network: NetworkConfig,
    /// Device screen settings.
    pub screen: ScreenConfig,
    /// Frame fetching.
    pub frames: FramesConfig,
    /// Input forwarding settings.
    pub input: InputConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Control connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Device control address (IP:port) input events are written to.
    pub control_address: String,
    /// Connection timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Device screen settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Base URL the device serves screen images from.
    pub url: String,
    /// Native device width in pixels.
    pub width: u32,
    /// Native device height in pixels.
    pub height: u32,
    /// Canvas rotation strategy: "direct" or "shortest_path".
    pub rotation_strategy: RotationStrategy,
}

/// Frame fetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramesConfig {
    /// Per-attempt timeout in milliseconds; 0 waits forever.
    pub timeout_ms: u64,
    /// Extra attempts after a failed fetch.
    pub retries: u32,
    /// Delay before the first retry, doubled on each further retry.
    pub backoff_ms: u64,
}

/// Input forwarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Forward pointer gestures.
    pub capture_pointer: bool,
    /// Forward keyboard and text input.
    pub capture_keyboard: bool,
}

/// Logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            control_address: "127.0.0.1:1111".into(),
            timeout_ms: 5000,
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9002/screen.jpg".into(),
            width: 1080,
            height: 1920,
            rotation_strategy: RotationStrategy::Direct,
        }
    }
}

impl Default for FramesConfig {
    fn default() -> Self {
        let policy = FetchPolicy::default();
        Self {
            timeout_ms: 0,
            retries: policy.retries,
            backoff_ms: policy.backoff.as_millis() as u64,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            capture_pointer: true,
            capture_keyboard: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ViewerConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write default config to a file.
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    // ── Conversions ──────────────────────────────────────────────

    /// Session settings. The session starts with default signals; the
    /// host reports the real ones as events.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            rotation_strategy: self.screen.rotation_strategy,
            input: InputOptions {
                pointer: self.input.capture_pointer,
                keyboard: self.input.capture_keyboard,
            },
            signals: Signals::default(),
        }
    }

    pub fn display_info(&self) -> DisplayInfo {
        DisplayInfo::new(&self.screen.url, self.screen.width, self.screen.height)
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            timeout: (self.frames.timeout_ms > 0)
                .then(|| Duration::from_millis(self.frames.timeout_ms)),
            retries: self.frames.retries,
            backoff: Duration::from_millis(self.frames.backoff_ms),
        }
    }

    pub fn control_addr(&self) -> Result<SocketAddr, MirrorError> {
        self.network.control_address.parse().map_err(|e| {
            MirrorError::Other(format!(
                "invalid control address {:?}: {e}",
                self.network.control_address
            ))
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.network.timeout_ms)
    }
}

// ── Tests ────────────────────────────────────────────────────────
