/// Latest-frame slot for the debug display
///
/// Frames may be produced on an inference worker thread while the display
/// reads on its own thread. Only the newest frame matters, so the slot keeps
/// a single entry and drops frames older than the one it holds.
use parking_lot::RwLock;
use std::sync::Arc;

use super::aggregator::DetectionFrameSummary;

/// A published frame summary
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    pub frame_id: u64,
    pub summary: Arc<DetectionFrameSummary>,
}

/// Shared last-write-wins frame slot
pub struct FrameSnapshot {
    latest: Arc<RwLock<Option<SnapshotEntry>>>,
}

impl FrameSnapshot {
    pub fn new() -> Self {
        Self {
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// Publish a frame summary; returns false if a newer frame is already held
    pub fn publish(&self, frame_id: u64, summary: Arc<DetectionFrameSummary>) -> bool {
        let mut latest = self.latest.write();
        if let Some(current) = latest.as_ref() {
            if frame_id < current.frame_id {
                tracing::debug!(
                    "Dropping stale frame {} (display has {})",
                    frame_id,
                    current.frame_id
                );
                return false;
            }
        }
        *latest = Some(SnapshotEntry { frame_id, summary });
        true
    }

    /// Newest published frame, if any
    pub fn latest(&self) -> Option<SnapshotEntry> {
        self.latest.read().clone()
    }

    pub fn clear(&self) {
        *self.latest.write() = None;
    }
}

impl Default for FrameSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for FrameSnapshot {
    fn clone(&self) -> Self {
        Self {
            latest: Arc::clone(&self.latest),
        }
    }
}
