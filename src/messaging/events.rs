/// Event types for the telemetry pipeline
///
/// Events represent things that have happened (past tense).
/// They are broadcast to all subscribers: the plugin host, debug display
/// and reporting collaborators.
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::detection::{Detection, DetectionFrameSummary};
use crate::log_scan::GameState;
use crate::rounds::{RoundRecord, SessionSummary};

/// Pipeline events
#[derive(Debug, Clone)]
pub enum Event {
    /// A game session began
    SessionStarted { timestamp: Instant },

    /// A round boundary was confirmed and recorded
    RoundCompleted {
        record: RoundRecord,
        summary: SessionSummary,
    },

    /// The observed game phase changed
    GameStateChanged {
        old_state: GameState,
        new_state: GameState,
    },

    /// A detection frame was aggregated
    ///
    /// The batch is shared immutably so every consumer sees the same payload.
    DetectionsProcessed {
        frame_id: u64,
        detections: Arc<[Detection]>,
        summary: Arc<DetectionFrameSummary>,
    },

    /// A finished match was persisted
    MatchSaved { match_id: Uuid, victory: bool },

    /// A session ended without being persisted
    SessionAbandoned { rounds_discarded: usize },

    /// The session ended, finished or abandoned; consumers should stop
    Shutdown,
}

impl Event {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            Event::SessionStarted { .. } => "Session started".to_string(),
            Event::RoundCompleted { record, .. } => {
                format!("Round {} completed: {}", record.round_number, record.outcome)
            }
            Event::GameStateChanged {
                old_state,
                new_state,
            } => {
                format!("Game state: {} -> {}", old_state, new_state)
            }
            Event::DetectionsProcessed {
                frame_id, summary, ..
            } => {
                format!("Frame {}: {}", frame_id, summary.count_summary())
            }
            Event::MatchSaved { match_id, victory } => {
                format!(
                    "Match saved: {} ({})",
                    match_id,
                    if *victory { "victory" } else { "defeat" }
                )
            }
            Event::SessionAbandoned { rounds_discarded } => {
                format!("Session abandoned ({} rounds discarded)", rounds_discarded)
            }
            Event::Shutdown => "Shutting down".to_string(),
        }
    }
}
