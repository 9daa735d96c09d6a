/// Per-frame detection aggregation
///
/// Turns one frame's raw detections into a display-ready summary. The
/// aggregation is a pure function of its input: no state survives between
/// frames and input order is preserved.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::classes::class_label;

/// Class id used when a detection has none
pub const MISSING_CLASS_ID: i64 = -1;

/// Axis-aligned box in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}

/// One detected object in a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub class_id: i64,
    /// Confidence in [0, 1]
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    /// Create a detection, clamping confidence into [0, 1]
    pub fn new(class_id: i64, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class_id,
            confidence: clamp_confidence(f64::from(confidence)),
            bbox,
        }
    }

    /// Build a detection from the external `{class_id, confidence, box}` shape
    ///
    /// Missing or malformed fields degrade to defaults: class `-1`,
    /// confidence `0.0`, box `(0, 0, 0, 0)`.
    pub fn from_value(value: &Value) -> Self {
        let class_id = value
            .get("class_id")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .unwrap_or(MISSING_CLASS_ID);

        let confidence = value
            .get("confidence")
            .and_then(Value::as_f64)
            .map(clamp_confidence)
            .unwrap_or(0.0);

        let bbox = value
            .get("box")
            .and_then(Value::as_array)
            .and_then(|coords| parse_box(coords))
            .unwrap_or_default();

        Self {
            class_id,
            confidence,
            bbox,
        }
    }
}

fn clamp_confidence(value: f64) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0) as f32
    }
}

fn parse_box(coords: &[Value]) -> Option<BoundingBox> {
    if coords.len() < 4 {
        return None;
    }
    let mut parts = [0i32; 4];
    for (slot, value) in parts.iter_mut().zip(coords) {
        let number = value.as_f64().filter(|n| n.is_finite())?;
        *slot = number.round() as i32;
    }
    Some(BoundingBox::new(parts[0], parts[1], parts[2], parts[3]))
}

/// Parse an externally produced detection batch
///
/// Accepts either a bare JSON array or an object with a `detections` array.
/// Never fails: a malformed document yields an empty batch.
pub fn parse_batch(json: &str) -> Vec<Detection> {
    let value: Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Malformed detection batch, treating as empty: {}", e);
            return Vec::new();
        }
    };

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("detections").and_then(Value::as_array) {
            Some(items) => items,
            None => {
                tracing::warn!("Detection batch object has no `detections` array");
                return Vec::new();
            }
        },
        _ => {
            tracing::warn!("Detection batch is neither an array nor an object");
            return Vec::new();
        }
    };

    items.iter().map(Detection::from_value).collect()
}

/// One display row, in the same position as its source detection
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRow {
    pub class_name: String,
    pub confidence: f32,
    pub x: i32,
    pub y: i32,
}

/// Display-ready summary of one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectionFrameSummary {
    pub counts_by_class: BTreeMap<String, usize>,
    pub rows: Vec<DetectionRow>,
}

impl DetectionFrameSummary {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> usize {
        self.rows.len()
    }

    /// Textual per-class count line, e.g. `Item (3): 1, Unknown (99): 1`
    pub fn count_summary(&self) -> String {
        if self.counts_by_class.is_empty() {
            return "No detections".to_string();
        }
        self.counts_by_class
            .iter()
            .map(|(name, count)| format!("{}: {}", name, count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Summarize one frame's detections
pub fn summarize(detections: &[Detection]) -> DetectionFrameSummary {
    let mut summary = DetectionFrameSummary {
        counts_by_class: BTreeMap::new(),
        rows: Vec::with_capacity(detections.len()),
    };

    for detection in detections {
        let class_name = class_label(detection.class_id);
        *summary.counts_by_class.entry(class_name.clone()).or_insert(0) += 1;
        summary.rows.push(DetectionRow {
            class_name,
            confidence: detection.confidence,
            x: detection.bbox.x,
            y: detection.bbox.y,
        });
    }

    summary
}
