use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::keys::Platform;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// When enabled the application initialises the logger at debug level.
    /// Defaults to `false` when the field is missing in the settings file.
    #[serde(default)]
    pub debug_logging: bool,
    /// Write log output to this file instead of stderr.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Platform used for key binding display. Detected when absent.
    #[serde(default)]
    pub platform: Option<Platform>,
    /// Quiet period before a typed query triggers dependent fetches.
    #[serde(default = "default_query_debounce_ms")]
    pub query_debounce_ms: u64,
    /// Quiet period after tab events before the tab list is refreshed.
    #[serde(default = "default_tab_event_debounce_ms")]
    pub tab_event_debounce_ms: u64,
    /// Pause before each tab close when removing duplicates.
    #[serde(default = "default_tab_close_delay_ms")]
    pub tab_close_delay_ms: u64,
    /// History entries appended to free-text results.
    #[serde(default = "default_history_max_results")]
    pub history_max_results: usize,
    /// History entries requested in the `/history` scope.
    #[serde(default = "default_history_scope_max_results")]
    pub history_scope_max_results: usize,
    /// Oldest visit time (ms since the epoch) included in history searches.
    #[serde(default = "default_history_start_time_ms")]
    pub history_start_time_ms: u64,
    #[serde(default = "default_recent_bookmarks_limit")]
    pub recent_bookmarks_limit: usize,
    /// Number of path segments stored as favicon prefixes.
    #[serde(default = "default_favicon_path_limit")]
    pub favicon_path_limit: usize,
    #[serde(default = "default_favicon_save_debounce_ms")]
    pub favicon_save_debounce_ms: u64,
    /// Maximum number of items handed to the renderer.
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
    /// Tabs whose URL contains one of these patterns are listed first.
    #[serde(default = "default_priority_url_patterns")]
    pub priority_url_patterns: Vec<String>,
    /// Retry free-text queries with fuzzy matching when nothing matches.
    #[serde(default)]
    pub fuzzy_fallback: bool,
}

/// `/history` with an empty remainder asks for this many entries.
pub const EMPTY_HISTORY_SCOPE_MAX_RESULTS: usize = 30;

fn default_query_debounce_ms() -> u64 {
    250
}

fn default_tab_event_debounce_ms() -> u64 {
    750
}

fn default_tab_close_delay_ms() -> u64 {
    50
}

fn default_history_max_results() -> usize {
    50
}

fn default_history_scope_max_results() -> usize {
    300
}

fn default_history_start_time_ms() -> u64 {
    // Five 365-day years after the epoch.
    157_680_000_000
}

fn default_recent_bookmarks_limit() -> usize {
    100
}

fn default_favicon_path_limit() -> usize {
    1
}

fn default_favicon_save_debounce_ms() -> u64 {
    500
}

fn default_result_limit() -> usize {
    250
}

fn default_priority_url_patterns() -> Vec<String> {
    vec!["meet.google.com".into()]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            log_file: None,
            platform: None,
            query_debounce_ms: default_query_debounce_ms(),
            tab_event_debounce_ms: default_tab_event_debounce_ms(),
            tab_close_delay_ms: default_tab_close_delay_ms(),
            history_max_results: default_history_max_results(),
            history_scope_max_results: default_history_scope_max_results(),
            history_start_time_ms: default_history_start_time_ms(),
            recent_bookmarks_limit: default_recent_bookmarks_limit(),
            favicon_path_limit: default_favicon_path_limit(),
            favicon_save_debounce_ms: default_favicon_save_debounce_ms(),
            result_limit: default_result_limit(),
            priority_url_patterns: default_priority_url_patterns(),
            fuzzy_fallback: false,
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_json::from_str(&content)?;
        Ok(settings.sanitized())
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Replace out-of-range values with their defaults.
    pub fn sanitized(mut self) -> Self {
        if self.result_limit == 0 {
            tracing::warn!("result_limit must be positive; using {}", default_result_limit());
            self.result_limit = default_result_limit();
        }
        if self.history_max_results == 0 {
            tracing::warn!(
                "history_max_results must be positive; using {}",
                default_history_max_results()
            );
            self.history_max_results = default_history_max_results();
        }
        if self.history_scope_max_results < EMPTY_HISTORY_SCOPE_MAX_RESULTS {
            tracing::warn!(
                "history_scope_max_results below {}; clamping",
                EMPTY_HISTORY_SCOPE_MAX_RESULTS
            );
            self.history_scope_max_results = EMPTY_HISTORY_SCOPE_MAX_RESULTS;
        }
        if self.favicon_path_limit > 8 {
            tracing::warn!("favicon_path_limit {} too large; clamping to 8", self.favicon_path_limit);
            self.favicon_path_limit = 8;
        }
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::detect)
    }

    pub fn query_debounce(&self) -> Duration {
        Duration::from_millis(self.query_debounce_ms)
    }

    pub fn tab_event_debounce(&self) -> Duration {
        Duration::from_millis(self.tab_event_debounce_ms)
    }

    pub fn tab_close_delay(&self) -> Duration {
        Duration::from_millis(self.tab_close_delay_ms)
    }

    pub fn favicon_save_debounce(&self) -> Duration {
        Duration::from_millis(self.favicon_save_debounce_ms)
    }

    /// Result cap for a `/history` query with the given remainder.
    pub fn history_scope_limit(&self, remainder: &str) -> usize {
        if remainder.trim().is_empty() {
            EMPTY_HISTORY_SCOPE_MAX_RESULTS
        } else {
            self.history_scope_max_results
        }
    }
}
