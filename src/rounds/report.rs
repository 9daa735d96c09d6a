/// Plain-text session report
///
/// One line per round followed by a win/loss tally, for the reporting
/// collaborator (console output or a report file).
use std::io::{self, Write};

use super::aggregator::{RoundRecord, SessionSummary};

/// Write the report for a session to any writer
pub fn write_report<W: Write>(
    rounds: &[RoundRecord],
    summary: &SessionSummary,
    writer: &mut W,
) -> io::Result<()> {
    writeln!(writer, "Session report ({} rounds)", summary.total_rounds)?;

    for round in rounds {
        let time = round
            .timestamp
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let duration = round
            .combat_duration_seconds
            .map(|s| format!("{:.1}s", s))
            .unwrap_or_else(|| "-".to_string());

        writeln!(
            writer,
            "Round {} | {} | {} | {}",
            round.round_number, time, round.outcome, duration
        )?;
    }

    writeln!(
        writer,
        "Wins: {} | Losses: {} | Total: {} | Win rate: {:.1}%",
        summary.wins,
        summary.losses,
        summary.total_rounds,
        summary.win_rate * 100.0
    )
}

/// Render the report into a string
pub fn render_report(rounds: &[RoundRecord], summary: &SessionSummary) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_report(rounds, summary, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
