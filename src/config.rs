//! Settings that control how PDF reports are generated.

use std::{num::NonZeroU64, path::PathBuf, time::Duration};

/// The number of records rendered by a single batch.
pub const DEFAULT_PAGE_SIZE: NonZeroU64 = NonZeroU64::new(2000).unwrap();

/// The config for generating PDF reports.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// The maximum number of records per batch.
    ///
    /// The same value is used to plan batches and to read each batch's records.
    pub page_size: NonZeroU64,
    /// The maximum number of render tasks that may run at the same time for a
    /// single export.
    pub max_workers: usize,
    /// How long an export may take before it is abandoned.
    pub export_timeout: Duration,
    /// How long to wait for in-flight tasks to finish after an export fails.
    pub shutdown_grace: Duration,
    /// The directory in which each export creates its own temporary work area.
    pub work_root: PathBuf,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Record timestamps are converted to this timezone before being printed.
    pub local_timezone: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_workers: 4,
            export_timeout: Duration::from_secs(60),
            shutdown_grace: Duration::from_secs(5),
            work_root: std::env::temp_dir(),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }
}
