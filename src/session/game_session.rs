/// Game session orchestration
///
/// One `GameSession` owns everything that lives for a single run: the
/// scanner, the round aggregator and the lifecycle state. Log lines and
/// detection frames go in; bus events and, at the end, one persisted
/// `Match` come out.
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use super::frames::FrameProcessor;
use super::state::{SessionState, SessionStateMachine};
use crate::config::TelemetryConfig;
use crate::detection::{Detection, DetectionFrameSummary, FrameSnapshot};
use crate::error::SessionError;
use crate::log_scan::{LogLine, LogScanner, ScannerConfig};
use crate::messaging::{Event, EventBus};
use crate::rounds::{RoundAggregator, RoundRecord, SessionSummary};
use crate::store::{Match, MatchStore};

pub struct GameSession {
    state: SessionStateMachine,
    scanner: LogScanner,
    rounds: RoundAggregator,
    frames: FrameProcessor,
    bus: EventBus,
    wins_for_victory: u32,
}

impl GameSession {
    pub fn new(config: &TelemetryConfig, bus: EventBus) -> Self {
        Self::with_scanner(config.scanner_config(), config.wins_for_victory, bus)
    }

    pub fn with_scanner(scanner: ScannerConfig, wins_for_victory: u32, bus: EventBus) -> Self {
        Self {
            state: SessionStateMachine::new(),
            scanner: LogScanner::new(scanner),
            rounds: RoundAggregator::new(),
            frames: FrameProcessor::new(bus.clone(), FrameSnapshot::new()),
            bus,
            wins_for_victory,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.state()
    }

    /// Begin collecting rounds
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.state.start(Utc::now())?;
        tracing::info!("Game session started");
        self.bus.publish(Event::SessionStarted {
            timestamp: Instant::now(),
        });
        Ok(())
    }

    /// Feed the next raw log line
    ///
    /// Lines are numbered in arrival order. Returns the round this line
    /// closed, if any.
    pub fn ingest_line(&mut self, text: &str) -> Option<RoundRecord> {
        let line = LogLine::new(self.scanner.lines_seen(), text);
        self.ingest(&line)
    }

    /// Feed an already numbered line, as produced by `LogFollower`
    pub fn ingest(&mut self, line: &LogLine) -> Option<RoundRecord> {
        if !self.state.state().is_active() {
            tracing::debug!(
                "Ignoring line {} while session is {}",
                line.sequence_index,
                self.state.state().description()
            );
            return None;
        }

        let old_phase = self.scanner.phase();
        let boundary = self.scanner.feed(line);
        let new_phase = self.scanner.phase();

        if new_phase != old_phase {
            self.bus.publish(Event::GameStateChanged {
                old_state: old_phase,
                new_state: new_phase,
            });
        }

        let record = self.rounds.append(boundary?);
        tracing::info!(
            "Round {} completed: {} (line {})",
            record.round_number,
            record.outcome,
            line.sequence_index
        );
        self.bus.publish(Event::RoundCompleted {
            record: record.clone(),
            summary: self.rounds.summary(),
        });
        Some(record)
    }

    /// Summarize and fan out one detection frame
    pub fn process_frame(
        &self,
        frame_id: u64,
        detections: Vec<Detection>,
    ) -> Arc<DetectionFrameSummary> {
        self.frames.process(frame_id, detections)
    }

    /// Sendable handle for feeding frames from another thread
    pub fn frame_processor(&self) -> FrameProcessor {
        self.frames.clone()
    }

    pub fn snapshot(&self) -> &FrameSnapshot {
        self.frames.snapshot()
    }

    pub fn summary(&self) -> SessionSummary {
        self.rounds.summary()
    }

    pub fn rounds(&self) -> &[RoundRecord] {
        self.rounds.rounds()
    }

    /// Fold the session into a match and persist it
    ///
    /// The session only counts as finished once the store accepted the
    /// match; on a store error it stays active so the caller can retry.
    pub fn finish(&mut self, hero: &str, store: &MatchStore) -> Result<Match, SessionError> {
        let started_at = self.state.ensure_active()?;

        let finished = Match::from_rounds(
            hero,
            self.rounds.rounds(),
            started_at,
            Utc::now(),
            self.wins_for_victory,
        );
        store.append(&finished)?;
        self.state.finish()?;

        tracing::info!(
            "Game session finished: {} rounds, {}",
            finished.total_days,
            if finished.victory { "victory" } else { "defeat" }
        );
        self.bus.publish(Event::MatchSaved {
            match_id: finished.match_id,
            victory: finished.victory,
        });
        self.bus.publish(Event::Shutdown);
        Ok(finished)
    }

    /// Discard the session without persisting
    pub fn abandon(&mut self) -> Result<(), SessionError> {
        self.state.abandon()?;
        let rounds_discarded = self.rounds.len();
        tracing::info!("Game session abandoned, {} rounds discarded", rounds_discarded);
        self.bus.publish(Event::SessionAbandoned { rounds_discarded });
        self.bus.publish(Event::Shutdown);
        Ok(())
    }
}
