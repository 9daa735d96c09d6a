/// Detection module
///
/// Consumes per-frame object-detection batches produced by the external
/// inference pipeline. Nothing here captures or infers; each frame is an
/// independent unit.
///
/// ## Architecture
///
/// ```text
/// inference worker ── JSON batch ──> parse_batch ──> Vec<Detection>
///                                                      │
///                                   summarize (pure) ◄─┘
///                                        │
///                                        ▼
///                     FrameSnapshot (last-write-wins) ──> debug display
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let detections = parse_batch(&json);
/// let summary = summarize(&detections);
/// println!("{}", summary.count_summary());
/// ```

pub mod aggregator;
pub mod classes;
pub mod snapshot;

pub use aggregator::{
    parse_batch, summarize, BoundingBox, Detection, DetectionFrameSummary, DetectionRow,
    MISSING_CLASS_ID,
};
pub use classes::{class_label, DetectionClass};
pub use snapshot::{FrameSnapshot, SnapshotEntry};
