/// Persisted match schema
///
/// A `Match` is one finished game session folded into per-day battles.
use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rounds::RoundRecord;

/// Wins needed for a run to count as a victory
pub const DEFAULT_WINS_FOR_VICTORY: u32 = 10;

/// Where an item sits on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemLocation {
    PlayerSocket,
    OpponentSocket,
    PlayerStash,
    PlayerSkill,
    OpponentSkill,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPlacement {
    pub instance_id: String,
    /// UUID-shaped template identifier, kept as text
    pub template_id: String,
    pub location: ItemLocation,
    pub socket_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battle {
    /// 1-based day within the run
    pub day: u32,
    pub start_time: DateTime<Utc>,
    pub victory: bool,
    #[serde(default)]
    pub player_items: Vec<ItemPlacement>,
    #[serde(default)]
    pub opponent_items: Vec<ItemPlacement>,
    #[serde(default)]
    pub screenshot_reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub match_id: Uuid,
    pub hero: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_days: u32,
    pub victory: bool,
    pub is_finished: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub battles: Vec<Battle>,
}

impl Match {
    /// Fold a session's rounds into a finished match
    ///
    /// Each round becomes the battle for day `round_number`. Round times are
    /// local wall-clock times on the session's local start date, rolling into
    /// the next day when the clock wrapped past midnight. Battle starts are
    /// clamped to the session window.
    pub fn from_rounds(
        hero: impl Into<String>,
        rounds: &[RoundRecord],
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        wins_for_victory: u32,
    ) -> Self {
        let battles: Vec<Battle> = rounds
            .iter()
            .map(|round| Battle {
                day: round.round_number,
                start_time: battle_start(started_at, ended_at, round),
                victory: round.outcome.is_win(),
                player_items: Vec::new(),
                opponent_items: Vec::new(),
                screenshot_reference: None,
            })
            .collect();

        let wins = battles.iter().filter(|b| b.victory).count() as u32;

        Self {
            match_id: Uuid::new_v4(),
            hero: hero.into(),
            start_time: started_at,
            end_time: ended_at,
            total_days: battles.len() as u32,
            victory: wins >= wins_for_victory,
            is_finished: true,
            created_at: Utc::now(),
            battles,
        }
    }

    /// Check the battle ordering invariants
    pub fn validate(&self) -> Result<(), String> {
        let mut previous_day = 0;
        for battle in &self.battles {
            if battle.day == 0 {
                return Err(format!("match {} has a battle on day 0", self.match_id));
            }
            if battle.day <= previous_day {
                return Err(format!(
                    "match {} battles out of order: day {} after day {}",
                    self.match_id, battle.day, previous_day
                ));
            }
            previous_day = battle.day;
        }
        Ok(())
    }

    pub fn wins(&self) -> usize {
        self.battles.iter().filter(|b| b.victory).count()
    }
}

fn battle_start(
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    round: &RoundRecord,
) -> DateTime<Utc> {
    let Some(time) = round.timestamp else {
        return started_at;
    };

    // Times skipped by a DST jump have no local instant
    let Some(local) = started_at
        .with_timezone(&Local)
        .date_naive()
        .and_time(time)
        .and_local_timezone(Local)
        .earliest()
    else {
        return started_at;
    };

    let mut candidate = local.with_timezone(&Utc);
    if candidate < started_at {
        candidate += Duration::days(1);
    }
    candidate.min(ended_at).max(started_at)
}
