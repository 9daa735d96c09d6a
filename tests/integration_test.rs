// Integration tests for the session telemetry pipeline
// These exercise the public API end to end: log text in, rounds, plugin
// calls and persisted matches out.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use session_telemetry::detection::{parse_batch, summarize, Detection};
use session_telemetry::error::PluginError;
use session_telemetry::log_scan::{lines_from_text, scan_log, GameState, LogScanner};
use session_telemetry::plugins::{
    OverlayApi, OverlayColor, OverlayCommand, Plugin, PluginDispatcher, PluginHost,
};
use session_telemetry::rounds::RoundAggregator;
use session_telemetry::{
    EventBus, GameSession, MatchStore, Outcome, ScannerConfig, TelemetryConfig,
};

const BOUNDARY: &str = "State changed from [CombatState] to [ReplayState]";
const EXIT: &str = "all exit tasks completed";

/// Build a log of `len` filler lines with the given lines overridden
fn build_log(len: usize, overrides: &[(usize, String)]) -> String {
    let mut lines: Vec<String> = (0..len)
        .map(|i| format!("[10:00:{:02}] tick {}", i % 60, i))
        .collect();
    for (index, text) in overrides {
        lines[*index] = text.clone();
    }
    lines.join("\n")
}

fn aggregate(text: &str) -> RoundAggregator {
    let mut rounds = RoundAggregator::new();
    for boundary in scan_log(text, &ScannerConfig::default()) {
        rounds.append(boundary);
    }
    rounds
}

#[test]
fn test_boundary_at_line_fifty_is_a_timed_win() {
    let log = build_log(
        60,
        &[
            (47, format!("[10:00:47] {}", EXIT)),
            (48, "[10:00:48] Combat completed in 12.3s".to_string()),
            (50, format!("[10:00:50] {}", BOUNDARY)),
        ],
    );

    let rounds = aggregate(&log);
    assert_eq!(rounds.len(), 1);

    let record = &rounds.rounds()[0];
    assert_eq!(record.round_number, 1);
    assert_eq!(record.outcome, Outcome::Win);
    assert_eq!(record.combat_duration_seconds, Some(12.3));
}

#[test]
fn test_boundary_near_start_is_a_loss() {
    let log = build_log(
        5,
        &[
            (0, format!("[10:00:00] {}", EXIT)),
            (1, format!("[10:00:01] {}", EXIT)),
            (2, format!("[10:00:02] {}", BOUNDARY)),
        ],
    );

    let rounds = aggregate(&log);
    assert_eq!(rounds.len(), 1);
    assert_eq!(rounds.rounds()[0].outcome, Outcome::Loss);
}

#[test]
fn test_rounds_are_numbered_and_tallied() {
    let log = build_log(
        40,
        &[
            (5, format!("[10:00:05] {}", EXIT)),
            (8, format!("[10:00:08] {}", BOUNDARY)),
            (20, format!("[10:00:20] {}", BOUNDARY)),
            (30, format!("[10:00:30] {}", EXIT)),
            (33, format!("[10:00:33] {}", BOUNDARY)),
        ],
    );

    let rounds = aggregate(&log);
    let numbers: Vec<u32> = rounds.rounds().iter().map(|r| r.round_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    let summary = rounds.summary();
    assert_eq!(summary.wins, 2);
    assert_eq!(summary.losses, 1);
    assert_eq!(summary.wins + summary.losses, summary.total_rounds);
}

#[test]
fn test_batch_and_incremental_scans_agree() {
    let log = build_log(
        30,
        &[
            (4, format!("[10:00:04] {}", EXIT)),
            (7, format!("[10:00:07] {}", BOUNDARY)),
            (19, format!("[10:00:19] {}", BOUNDARY)),
        ],
    );

    let batch = scan_log(&log, &ScannerConfig::default());

    let mut scanner = LogScanner::new(ScannerConfig::default());
    let incremental: Vec<_> = lines_from_text(&log)
        .filter_map(|line| scanner.feed(&line))
        .collect();

    assert_eq!(batch, incremental);
}

#[test]
fn test_detection_batch_summary() {
    let batch = parse_batch(
        r#"[{"class_id":3,"confidence":0.91,"box":[10,20,5,5]},
            {"class_id":99,"confidence":0.5,"box":[0,0,0,0]}]"#,
    );
    let summary = summarize(&batch);

    assert_eq!(summary.counts_by_class.len(), 2);
    assert_eq!(summary.counts_by_class.get("Item (3)"), Some(&1));
    assert_eq!(summary.counts_by_class.get("Unknown (99)"), Some(&1));
    assert_eq!(summary.rows[0].class_name, "Item (3)");
    assert_eq!(summary.rows[1].class_name, "Unknown (99)");

    assert!(summarize(&[]).is_empty());
}

struct FailingPlugin;

impl Plugin for FailingPlugin {
    fn name(&self) -> &str {
        "failing"
    }

    fn on_cards_detected(
        &mut self,
        _detections: &[Detection],
        api: &mut dyn OverlayApi,
    ) -> Result<(), PluginError> {
        api.draw_rect(0, 0, 1, 1, OverlayColor::rgb(255, 0, 0));
        Err(PluginError::Failed("model missing".to_string()))
    }
}

struct RecordingPlugin {
    seen: Arc<Mutex<Vec<Vec<Detection>>>>,
    states: Arc<Mutex<Vec<GameState>>>,
}

impl Plugin for RecordingPlugin {
    fn name(&self) -> &str {
        "recording"
    }

    fn on_cards_detected(
        &mut self,
        detections: &[Detection],
        api: &mut dyn OverlayApi,
    ) -> Result<(), PluginError> {
        self.seen.lock().push(detections.to_vec());
        for d in detections {
            api.draw_rect(d.bbox.x, d.bbox.y, d.bbox.w, d.bbox.h, OverlayColor::rgb(0, 255, 0));
        }
        Ok(())
    }

    fn on_game_state_changed(
        &mut self,
        _old_state: GameState,
        new_state: GameState,
        _api: &mut dyn OverlayApi,
    ) -> Result<(), PluginError> {
        self.states.lock().push(new_state);
        Ok(())
    }
}

#[test]
fn test_plugin_failure_does_not_block_later_plugins() {
    let bus = EventBus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let states = Arc::new(Mutex::new(Vec::new()));

    let mut dispatcher = PluginDispatcher::new();
    dispatcher.register(Box::new(FailingPlugin));
    dispatcher.register(Box::new(RecordingPlugin {
        seen: Arc::clone(&seen),
        states: Arc::clone(&states),
    }));
    let mut host = PluginHost::new(&bus, dispatcher);

    let mut session = GameSession::new(&TelemetryConfig::default(), bus.clone());
    session.start().unwrap();

    let batch = parse_batch(r#"[{"class_id":0,"confidence":0.7,"box":[4,5,6,7]}]"#);
    session.process_frame(1, batch.clone());
    session.ingest_line("Entering to [CombatState]");

    host.pump();

    assert_eq!(*seen.lock(), vec![batch]);
    assert_eq!(*states.lock(), vec![GameState::Combat]);
    assert!(host
        .overlay()
        .iter()
        .any(|c| matches!(c, OverlayCommand::Rect { x: 4, y: 5, w: 6, h: 7, .. })));
}

#[test]
fn test_session_finish_round_trips_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = MatchStore::new(dir.path().join("matches.json"));
    let bus = EventBus::new();

    let mut session = GameSession::new(&TelemetryConfig::default(), bus);
    session.start().unwrap();

    let log = build_log(
        24,
        &[
            (3, format!("[10:00:03] {}", EXIT)),
            (6, format!("[10:00:06] {}", BOUNDARY)),
            (15, format!("[10:00:15] {}", BOUNDARY)),
        ],
    );
    for line in log.lines() {
        session.ingest_line(line);
    }
    assert_eq!(session.summary().total_rounds, 2);

    let saved = session.finish("Vanessa", &store).unwrap();
    assert_eq!(saved.battles.len(), 2);
    assert!(saved.battles[0].victory);
    assert!(!saved.battles[1].victory);

    let reopened = MatchStore::new(store.path());
    let loaded = reopened.load();
    assert_eq!(loaded, vec![saved.clone()]);
    assert_eq!(reopened.find(saved.match_id), Some(saved));
}

/// Pump until the host reports the bus has stopped; returns events handled
fn pump_until_stopped(host: &mut PluginHost) -> usize {
    let mut handled = 0;
    while host.pump_blocking(Duration::from_millis(50)) {
        handled += 1;
        assert!(handled < 16, "host never saw the session end");
    }
    handled
}

#[test]
fn test_plugin_host_stops_when_session_ends() {
    let dir = tempfile::tempdir().unwrap();
    let store = MatchStore::new(dir.path().join("matches.json"));
    let bus = EventBus::new();
    let states = Arc::new(Mutex::new(Vec::new()));

    let mut dispatcher = PluginDispatcher::new();
    dispatcher.register(Box::new(RecordingPlugin {
        seen: Arc::new(Mutex::new(Vec::new())),
        states: Arc::clone(&states),
    }));
    let mut host = PluginHost::new(&bus, dispatcher);

    let mut finished = GameSession::new(&TelemetryConfig::default(), bus.clone());
    finished.start().unwrap();
    finished.ingest_line("Entering to [CombatState]");
    finished.finish("Dooley", &store).unwrap();

    assert!(pump_until_stopped(&mut host) >= 2);
    assert_eq!(*states.lock(), vec![GameState::Combat]);

    let mut abandoned = GameSession::new(&TelemetryConfig::default(), bus.clone());
    abandoned.start().unwrap();
    abandoned.abandon().unwrap();

    assert!(pump_until_stopped(&mut host) >= 2);
    assert_eq!(host.pump(), 0);
}
