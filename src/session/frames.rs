/// Per-frame detection processing
///
/// Frames may arrive from the inference worker thread while the session
/// owner is busy with log lines, so this handle is cheap to clone and
/// sendable on its own.
use std::sync::Arc;

use crate::detection::{summarize, Detection, DetectionFrameSummary, FrameSnapshot};
use crate::messaging::{Event, EventBus};

#[derive(Clone)]
pub struct FrameProcessor {
    bus: EventBus,
    snapshot: FrameSnapshot,
}

impl FrameProcessor {
    pub fn new(bus: EventBus, snapshot: FrameSnapshot) -> Self {
        Self { bus, snapshot }
    }

    /// Summarize one frame, update the display slot and fan it out
    pub fn process(&self, frame_id: u64, detections: Vec<Detection>) -> Arc<DetectionFrameSummary> {
        let summary = Arc::new(summarize(&detections));
        tracing::debug!("Frame {}: {}", frame_id, summary.count_summary());

        if !self.snapshot.publish(frame_id, Arc::clone(&summary)) {
            tracing::debug!("Frame {} is older than the displayed frame", frame_id);
        }

        self.bus.publish(Event::DetectionsProcessed {
            frame_id,
            detections: Arc::from(detections),
            summary: Arc::clone(&summary),
        });

        summary
    }

    pub fn snapshot(&self) -> &FrameSnapshot {
        &self.snapshot
    }
}
