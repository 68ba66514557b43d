//! Progress reporting for file transfers.

/// Progress information for uploads and downloads.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    /// Bytes transferred so far
    pub done: u64,
    /// Total bytes to transfer, 0 when unknown
    pub total: u64,
    /// Local file name or remote node id
    pub name: String,
}

impl TransferProgress {
    pub fn new(done: u64, total: u64, name: impl Into<String>) -> Self {
        Self {
            done,
            total,
            name: name.into(),
        }
    }

    /// Progress as a percentage (0.0 to 100.0).
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.done as f64 / self.total as f64) * 100.0
    }

    /// Whether all expected bytes have moved. Always false for unknown totals.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.done >= self.total
    }
}

/// Progress callback.
///
/// Receives progress after every chunk; returning `false` cancels the transfer.
pub type ProgressCallback = Box<dyn FnMut(&TransferProgress) -> bool + Send>;
