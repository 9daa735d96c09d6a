/// Log scanning module
///
/// Converts application log text into round boundaries.
///
/// ## Architecture
///
/// ```text
/// LogFollower (thread) ── LogLine ──> LogScanner ── RoundBoundary ──> RoundAggregator
///   └── LogTail (offset, partial line)     └── GameState (phase FSM)
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let mut scanner = LogScanner::new(ScannerConfig::default());
///
/// // Batch mode
/// let boundaries = scanner.scan_text(&std::fs::read_to_string(path)?);
///
/// // Tail mode
/// let (follower, lines) = LogFollower::spawn(LogTail::open(path)?, poll);
/// for line in lines.iter() {
///     if let Some(boundary) = scanner.feed(&line) { /* ... */ }
/// }
/// ```

pub mod line;
pub mod phase;
pub mod scanner;
pub mod tail;

pub use line::{lines_from_text, parse_time_of_day, LogLine};
pub use phase::{GameState, PhaseMarker};
pub use scanner::{
    parse_combat_duration, scan_log, LogScanner, Outcome, OutcomeRule, RoundBoundary,
    ScannerConfig,
};
pub use tail::{find_latest_log, LogFollower, LogTail};
