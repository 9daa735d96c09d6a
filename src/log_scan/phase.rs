/// Game phase tracked from log markers
///
/// The scanner drives this state machine from the markers it observes:
///
/// ```text
/// Unknown ──combat──> Combat ──exit tasks──> ExitTasksCompleted ──boundary──> Replay
///                        ^                                                       │
///                        └────────────────────────combat─────────────────────────┘
/// ```
use serde::{Deserialize, Serialize};

/// Observed game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameState {
    /// No marker seen yet
    #[default]
    Unknown,

    /// Combat is in progress
    Combat,

    /// Combat finished and exit tasks completed (precedes a won replay)
    ExitTasksCompleted,

    /// Post-combat replay state
    Replay,
}

/// Marker kind observed on a single line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseMarker {
    Combat,
    ExitTasksCompleted,
    Boundary,
}

impl GameState {
    /// Apply a marker, returning the next state
    pub fn on_marker(self, marker: PhaseMarker) -> GameState {
        match (self, marker) {
            (_, PhaseMarker::Boundary) => GameState::Replay,
            (_, PhaseMarker::Combat) => GameState::Combat,
            (GameState::Unknown | GameState::Combat, PhaseMarker::ExitTasksCompleted) => {
                GameState::ExitTasksCompleted
            }
            (state, PhaseMarker::ExitTasksCompleted) => state,
        }
    }

    /// Get a human-readable description of the state
    pub fn description(&self) -> &'static str {
        match self {
            GameState::Unknown => "Unknown",
            GameState::Combat => "Combat",
            GameState::ExitTasksCompleted => "Exit tasks completed",
            GameState::Replay => "Replay",
        }
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
