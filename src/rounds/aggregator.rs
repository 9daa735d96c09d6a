/// Round aggregator and session statistics
///
/// Assigns positional round numbers to boundaries and keeps running win/loss
/// counters so the summary never needs a rescan.
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::log_scan::{Outcome, RoundBoundary};

/// One completed round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based, contiguous, in boundary arrival order
    pub round_number: u32,
    pub timestamp: Option<NaiveTime>,
    pub outcome: Outcome,
    pub combat_duration_seconds: Option<f64>,
}

/// Derived session statistics (recomputed, never persisted)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub total_rounds: u32,
    pub wins: u32,
    pub losses: u32,
    /// `wins / total_rounds`, or 0.0 with no rounds
    pub win_rate: f64,
}

impl SessionSummary {
    /// Compute a summary from an ordered sequence of rounds
    pub fn from_rounds(rounds: &[RoundRecord]) -> Self {
        let wins = rounds.iter().filter(|r| r.outcome.is_win()).count() as u32;
        Self::from_counts(wins, rounds.len() as u32 - wins)
    }

    fn from_counts(wins: u32, losses: u32) -> Self {
        let total_rounds = wins + losses;
        let win_rate = if total_rounds == 0 {
            0.0
        } else {
            f64::from(wins) / f64::from(total_rounds)
        };

        Self {
            total_rounds,
            wins,
            losses,
            win_rate,
        }
    }
}

/// Owned per-session round aggregator
#[derive(Debug, Default)]
pub struct RoundAggregator {
    rounds: Vec<RoundRecord>,
    wins: u32,
    losses: u32,
}

impl RoundAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a boundary as the next round
    ///
    /// Boundaries must be appended in the order the scanner produced them;
    /// numbering is positional and ignores timestamps.
    pub fn append(&mut self, boundary: RoundBoundary) -> RoundRecord {
        let round_number = self.rounds.len() as u32 + 1;

        match boundary.outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
        }

        let record = RoundRecord {
            round_number,
            timestamp: boundary.timestamp,
            outcome: boundary.outcome,
            combat_duration_seconds: boundary
                .combat_duration_seconds
                .filter(|seconds| seconds.is_finite() && *seconds >= 0.0),
        };

        tracing::debug!(
            "Round {}: {} (duration {:?})",
            record.round_number,
            record.outcome,
            record.combat_duration_seconds
        );

        self.rounds.push(record.clone());
        record
    }

    /// Running summary in O(1)
    pub fn summary(&self) -> SessionSummary {
        SessionSummary::from_counts(self.wins, self.losses)
    }

    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Consume the aggregator, yielding its rounds in order
    pub fn into_rounds(self) -> Vec<RoundRecord> {
        self.rounds
    }
}
