/// Log transition scanner
///
/// Turns an ordered sequence of log lines into round boundaries. The scanner
/// is tolerant of partial and malformed logs: every unmatched pattern degrades
/// to an absent field, never an error.
use chrono::NaiveTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::OnceLock;

use super::line::{lines_from_text, LogLine};
use super::phase::{GameState, PhaseMarker};

/// Marker for the combat → replay transition that closes a round
pub const DEFAULT_BOUNDARY_MARKER: &str = "State changed from [CombatState] to [ReplayState]";

/// Marker that indicates the round was won when seen before a boundary
pub const DEFAULT_EXIT_MARKER: &str = "all exit tasks completed";

/// Marker for entering combat
pub const DEFAULT_COMBAT_MARKER: &str = "to [CombatState]";

/// Distance (in lines) between the boundary and the line checked for the exit marker
pub const DEFAULT_LOOKBACK_OFFSET: usize = 3;

/// How many previous lines are searched for a combat duration
pub const DEFAULT_DURATION_WINDOW: usize = 100;

/// Round outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn is_win(&self) -> bool {
        matches!(self, Outcome::Win)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Win => write!(f, "Win"),
            Outcome::Loss => write!(f, "Loss"),
        }
    }
}

/// How a boundary's outcome is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeRule {
    /// Win iff the line exactly `offset` positions before the boundary holds
    /// the exit marker. Boundaries closer than `offset` to the stream start
    /// are always a Loss.
    LookBack { offset: usize },

    /// Win iff the phase immediately before the replay transition was
    /// `ExitTasksCompleted`.
    StateMachine,
}

impl Default for OutcomeRule {
    fn default() -> Self {
        OutcomeRule::LookBack {
            offset: DEFAULT_LOOKBACK_OFFSET,
        }
    }
}

/// Scanner configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerConfig {
    pub boundary_marker: String,
    pub exit_marker: String,
    pub combat_marker: String,
    pub outcome_rule: OutcomeRule,
    pub duration_window: usize,
    /// Match the exit marker ignoring ASCII case; exact by default
    pub exit_marker_case_insensitive: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            boundary_marker: DEFAULT_BOUNDARY_MARKER.to_string(),
            exit_marker: DEFAULT_EXIT_MARKER.to_string(),
            combat_marker: DEFAULT_COMBAT_MARKER.to_string(),
            outcome_rule: OutcomeRule::default(),
            duration_window: DEFAULT_DURATION_WINDOW,
            exit_marker_case_insensitive: false,
        }
    }
}

/// A detected combat → replay transition
#[derive(Debug, Clone, PartialEq)]
pub struct RoundBoundary {
    /// Sequence index of the boundary line
    pub line_index: usize,
    /// Time-of-day on the boundary line, `None` when the line had none
    pub timestamp: Option<NaiveTime>,
    pub outcome: Outcome,
    /// Nearest combat duration found within the look-back window
    pub combat_duration_seconds: Option<f64>,
}

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)completed in\s*(\d+(?:\.\d+)?)\s*s(?:ec(?:onds?)?)?\b")
            .expect("duration pattern is valid")
    })
}

/// Extract a combat duration (seconds) from a line, if it carries one
pub fn parse_combat_duration(text: &str) -> Option<f64> {
    let caps = duration_pattern().captures(text)?;
    let seconds: f64 = caps.get(1)?.as_str().parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}

/// Incremental log transition scanner
///
/// Feed lines one at a time (tail mode) or hand it a whole sequence (batch
/// mode); both produce identical boundaries for identical content. Only a
/// bounded window of recent lines is retained.
pub struct LogScanner {
    config: ScannerConfig,
    exit_marker_lower: String,
    recent: VecDeque<String>,
    capacity: usize,
    phase: GameState,
    last_boundary: Option<usize>,
    lines_seen: usize,
}

impl LogScanner {
    /// Create a scanner with the given configuration
    pub fn new(config: ScannerConfig) -> Self {
        let lookback = match config.outcome_rule {
            OutcomeRule::LookBack { offset } => offset,
            OutcomeRule::StateMachine => 0,
        };
        let capacity = config.duration_window.max(lookback).max(1);
        let exit_marker_lower = config.exit_marker.to_ascii_lowercase();

        Self {
            config,
            exit_marker_lower,
            recent: VecDeque::with_capacity(capacity),
            capacity,
            phase: GameState::Unknown,
            last_boundary: None,
            lines_seen: 0,
        }
    }

    /// Current game phase derived from the markers seen so far
    pub fn phase(&self) -> GameState {
        self.phase
    }

    /// Number of lines fed so far
    pub fn lines_seen(&self) -> usize {
        self.lines_seen
    }

    /// Feed one line, returning a boundary if this line closes a round
    pub fn feed(&mut self, line: &LogLine) -> Option<RoundBoundary> {
        let text = line.text.as_str();
        let marker = self.classify(text);

        let boundary = match marker {
            Some(PhaseMarker::Boundary) => self.boundary_for(line),
            _ => None,
        };

        if let Some(marker) = marker {
            let next = self.phase.on_marker(marker);
            if next != self.phase {
                tracing::debug!(
                    "Phase {} -> {} at line {}",
                    self.phase,
                    next,
                    line.sequence_index
                );
            }
            self.phase = next;
        }

        self.remember(text);
        self.lines_seen += 1;
        boundary
    }

    /// Scan a full sequence of lines (batch mode)
    pub fn scan<I>(&mut self, lines: I) -> Vec<RoundBoundary>
    where
        I: IntoIterator<Item = LogLine>,
    {
        lines
            .into_iter()
            .filter_map(|line| self.feed(&line))
            .collect()
    }

    /// Scan a block of log text (batch mode)
    pub fn scan_text(&mut self, text: &str) -> Vec<RoundBoundary> {
        self.scan(lines_from_text(text))
    }

    /// Reset all scan state, keeping configuration
    pub fn reset(&mut self) {
        self.recent.clear();
        self.phase = GameState::Unknown;
        self.last_boundary = None;
        self.lines_seen = 0;
    }

    fn classify(&self, text: &str) -> Option<PhaseMarker> {
        if text.contains(&self.config.boundary_marker) {
            Some(PhaseMarker::Boundary)
        } else if self.has_exit_marker(text) {
            Some(PhaseMarker::ExitTasksCompleted)
        } else if text.contains(&self.config.combat_marker) {
            Some(PhaseMarker::Combat)
        } else {
            None
        }
    }

    fn has_exit_marker(&self, text: &str) -> bool {
        if self.config.exit_marker_case_insensitive {
            text.to_ascii_lowercase().contains(&self.exit_marker_lower)
        } else {
            text.contains(&self.config.exit_marker)
        }
    }

    fn boundary_for(&mut self, line: &LogLine) -> Option<RoundBoundary> {
        if let Some(previous) = self.last_boundary {
            if line.sequence_index <= previous {
                tracing::warn!(
                    "Ignoring boundary at line {} (not after previous boundary at {})",
                    line.sequence_index,
                    previous
                );
                return None;
            }
        }
        self.last_boundary = Some(line.sequence_index);

        let outcome = self.decide_outcome();
        let combat_duration_seconds = self.nearest_duration();

        tracing::debug!(
            "Boundary at line {}: outcome={}, duration={:?}",
            line.sequence_index,
            outcome,
            combat_duration_seconds
        );

        Some(RoundBoundary {
            line_index: line.sequence_index,
            timestamp: line.timestamp,
            outcome,
            combat_duration_seconds,
        })
    }

    fn decide_outcome(&self) -> Outcome {
        match self.config.outcome_rule {
            OutcomeRule::LookBack { offset } => {
                // `recent` holds the lines before the boundary, newest last
                let available = self.recent.len();
                if offset == 0 || offset > available {
                    return Outcome::Loss;
                }
                match self.recent.get(available - offset) {
                    Some(text) if self.has_exit_marker(text) => Outcome::Win,
                    _ => Outcome::Loss,
                }
            }
            OutcomeRule::StateMachine => {
                if self.phase == GameState::ExitTasksCompleted {
                    Outcome::Win
                } else {
                    Outcome::Loss
                }
            }
        }
    }

    fn nearest_duration(&self) -> Option<f64> {
        self.recent
            .iter()
            .rev()
            .take(self.config.duration_window)
            .find_map(|text| parse_combat_duration(text))
    }

    fn remember(&mut self, text: &str) {
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(text.to_string());
    }
}

impl Default for LogScanner {
    fn default() -> Self {
        Self::new(ScannerConfig::default())
    }
}

/// Scan a complete log with the given configuration
pub fn scan_log(text: &str, config: &ScannerConfig) -> Vec<RoundBoundary> {
    LogScanner::new(config.clone()).scan_text(text)
}
