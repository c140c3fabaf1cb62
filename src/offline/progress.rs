//! Download status reported by the tile store.

use serde::{Deserialize, Serialize};

/// One status tick for a region download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionStatus {
    pub completed_resource_count: u64,
    /// Negative when the store has no estimate yet.
    pub required_resource_count: i64,
    pub completed_resource_size: u64,
    pub required_resource_count_is_precise: bool,
    pub complete: bool,
}

impl RegionStatus {
    /// Share of required resources fetched, 0-100.
    ///
    /// A negative required count gives 0. So does a required count of 0,
    /// which a store reports before it has sized the region.
    pub fn percentage(&self) -> f64 {
        if self.required_resource_count <= 0 {
            return 0.0;
        }
        100.0 * self.completed_resource_count as f64 / self.required_resource_count as f64
    }
}

/// Progress shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadProgress {
    /// `None` while the progress indicator is indeterminate.
    pub percent: Option<u8>,
    pub completed_resources: u64,
    pub required_resources: i64,
    pub bytes_downloaded: u64,
}

impl DownloadProgress {
    /// Fold a status tick into the displayed progress.
    ///
    /// The percentage only becomes determinate once the required count is
    /// precise. An imprecise tick keeps the last determinate value.
    pub fn apply(&mut self, status: &RegionStatus) {
        self.completed_resources = status.completed_resource_count;
        self.required_resources = status.required_resource_count;
        self.bytes_downloaded = status.completed_resource_size;
        if status.required_resource_count_is_precise {
            self.percent = Some(status.percentage().round().clamp(0.0, 100.0) as u8);
        }
    }

    pub fn is_indeterminate(&self) -> bool {
        self.percent.is_none()
    }

    /// Log line in the "completed/required resources; bytes" form.
    pub fn summary(&self) -> String {
        format!(
            "{}/{} resources; {} bytes downloaded.",
            self.completed_resources, self.required_resources, self.bytes_downloaded
        )
    }
}
