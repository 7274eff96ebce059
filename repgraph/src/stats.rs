//! Replication counters.

/// Snapshot of coordinator counters.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplicationStats {
    pub total_replications: u64,
    pub delta_replications: u64,
    pub full_replications: u64,
    /// Framed bytes handed to the transport.
    pub bytes_sent: u64,
    /// Bytes removed by compression.
    pub bytes_saved: u64,
    /// Uncompressed body bytes, for the compression ratio.
    pub bytes_uncompressed: u64,
    pub active_viewers: usize,
    pub encode_failures: u64,
    pub ignored_invalid_slots: u64,
}

impl ReplicationStats {
    /// Average compressed-to-raw body ratio (1.0 when nothing was saved).
    #[must_use]
    pub fn compression_ratio(&self) -> f32 {
        if self.bytes_uncompressed == 0 {
            return 1.0;
        }
        let compressed = self.bytes_uncompressed.saturating_sub(self.bytes_saved);
        compressed as f32 / self.bytes_uncompressed as f32
    }

    pub(crate) fn record(&mut self, full: bool, framed: usize, original: usize, saved: usize) {
        self.total_replications += 1;
        if full {
            self.full_replications += 1;
        } else {
            self.delta_replications += 1;
        }
        self.bytes_sent += framed as u64;
        self.bytes_uncompressed += original as u64;
        self.bytes_saved += saved as u64;
    }
}
