//! Display configuration.

use std::path::Path;
use std::time::Duration;

use pane_timer::TimerConfig;
use serde::{Deserialize, Serialize};

use crate::PaneError;

/// Settings for a display and every window actor it spawns.
///
/// Missing fields take their defaults, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Name used in log lines.
    pub name: String,

    /// Message slots per window actor mailbox.
    pub mailbox_capacity: usize,

    /// Maximum number of timers across the display.
    pub timer_capacity: usize,

    /// Timer worker sleep when no timer is active.
    pub timer_idle_wait_ms: u64,

    /// How long one display loop iteration waits for a request.
    pub poll_interval_ms: u64,

    /// Log every dispatched message at debug level.
    pub trace_messages: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            name: String::from("pane"),
            mailbox_capacity: 128,
            timer_capacity: 128,
            timer_idle_wait_ms: 10_000,
            poll_interval_ms: 16,
            trace_messages: false,
        }
    }
}

impl DisplayConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(text: &str) -> Result<Self, PaneError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PaneError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), PaneError> {
        if self.mailbox_capacity == 0 {
            return Err(PaneError::InvalidConfig("mailbox_capacity must be non-zero".into()));
        }
        if self.timer_capacity == 0 {
            return Err(PaneError::InvalidConfig("timer_capacity must be non-zero".into()));
        }
        if self.timer_idle_wait_ms == 0 {
            return Err(PaneError::InvalidConfig("timer_idle_wait_ms must be non-zero".into()));
        }
        Ok(())
    }

    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig {
            capacity: self.timer_capacity,
            idle_wait: Duration::from_millis(self.timer_idle_wait_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
