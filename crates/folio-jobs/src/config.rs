//! Sync pipeline configuration.

use std::time::Duration;

use folio_core::defaults;

/// Tunables for [`crate::JobRunner`] and [`crate::JobRegistry`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Pause between embedded items.
    pub item_delay_ms: u64,
    /// Look-back window for incremental updates.
    pub incremental_window_hours: i64,
    /// Body characters copied into vector metadata.
    pub excerpt_chars: usize,
    /// Page size when listing index ids.
    pub list_page_size: usize,
    /// Finished jobs kept after pruning.
    pub job_retention: usize,
    /// End a non-empty run as Failed when every item failed.
    pub fail_when_all_items_fail: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            item_delay_ms: defaults::SYNC_ITEM_DELAY_MS,
            incremental_window_hours: defaults::INCREMENTAL_WINDOW_HOURS,
            excerpt_chars: defaults::EXCERPT_CHARS,
            list_page_size: defaults::LIST_PAGE_SIZE,
            job_retention: defaults::JOB_RETENTION,
            fail_when_all_items_fail: true,
        }
    }
}

impl SyncConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SYNC_ITEM_DELAY_MS` | `100` | Pause between embedded items |
    /// | `SYNC_INCREMENTAL_WINDOW_HOURS` | `24` | Incremental look-back window |
    /// | `SYNC_EXCERPT_CHARS` | `500` | Body excerpt length in metadata |
    /// | `SYNC_LIST_PAGE_SIZE` | `100` | Index id page size |
    /// | `SYNC_JOB_RETENTION` | `100` | Finished jobs kept |
    /// | `SYNC_FAIL_WHEN_ALL_ITEMS_FAIL` | `true` | Fail runs where no item succeeded |
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            item_delay_ms: env_parse("SYNC_ITEM_DELAY_MS").unwrap_or(d.item_delay_ms),
            incremental_window_hours: env_parse("SYNC_INCREMENTAL_WINDOW_HOURS")
                .filter(|h: &i64| *h > 0)
                .unwrap_or(d.incremental_window_hours),
            excerpt_chars: env_parse("SYNC_EXCERPT_CHARS").unwrap_or(d.excerpt_chars),
            list_page_size: env_parse("SYNC_LIST_PAGE_SIZE")
                .unwrap_or(d.list_page_size)
                .max(1),
            job_retention: env_parse("SYNC_JOB_RETENTION").unwrap_or(d.job_retention),
            fail_when_all_items_fail: std::env::var("SYNC_FAIL_WHEN_ALL_ITEMS_FAIL")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(d.fail_when_all_items_fail),
        }
    }

    pub fn with_item_delay_ms(mut self, ms: u64) -> Self {
        self.item_delay_ms = ms;
        self
    }

    pub fn with_incremental_window_hours(mut self, hours: i64) -> Self {
        self.incremental_window_hours = hours;
        self
    }

    pub fn with_excerpt_chars(mut self, chars: usize) -> Self {
        self.excerpt_chars = chars;
        self
    }

    pub fn with_list_page_size(mut self, size: usize) -> Self {
        self.list_page_size = size.max(1);
        self
    }

    pub fn with_job_retention(mut self, retention: usize) -> Self {
        self.job_retention = retention;
        self
    }

    pub fn with_fail_when_all_items_fail(mut self, enabled: bool) -> Self {
        self.fail_when_all_items_fail = enabled;
        self
    }

    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }

    pub fn incremental_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.incremental_window_hours)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.item_delay(), Duration::from_millis(100));
        assert_eq!(config.incremental_window(), chrono::Duration::hours(24));
        assert_eq!(config.excerpt_chars, 500);
        assert_eq!(config.list_page_size, 100);
        assert_eq!(config.job_retention, 100);
        assert!(config.fail_when_all_items_fail);
    }

    #[test]
    fn test_builders() {
        let config = SyncConfig::default()
            .with_item_delay_ms(0)
            .with_incremental_window_hours(2)
            .with_list_page_size(0)
            .with_job_retention(3)
            .with_fail_when_all_items_fail(false);
        assert_eq!(config.item_delay(), Duration::ZERO);
        assert_eq!(config.incremental_window_hours, 2);
        assert_eq!(config.list_page_size, 1);
        assert_eq!(config.job_retention, 3);
        assert!(!config.fail_when_all_items_fail);
    }
}
