/// Append-only JSON match store
///
/// The whole history lives in one `{ "matches": [...] }` document. Appends
/// are read-modify-write under a lock shared by every handle on the same
/// file, and land through a temp file and a rename so a crash never leaves
/// a truncated store behind.
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

use super::model::Match;
use crate::error::StoreError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    matches: Vec<Match>,
}

enum ReadOutcome {
    Loaded(StoreDocument),
    Missing,
    Corrupt(serde_json::Error),
}

/// Write locks keyed by resolved store path, shared across handles
static PATH_LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

pub struct MatchStore {
    path: PathBuf,
}

impl MatchStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/SessionTelemetry/matches.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("SessionTelemetry").join("matches.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every stored match in insertion order
    ///
    /// A missing or unreadable store is treated as empty history.
    pub fn load(&self) -> Vec<Match> {
        match self.read_document() {
            Ok(ReadOutcome::Loaded(document)) => document.matches,
            Ok(ReadOutcome::Missing) => Vec::new(),
            Ok(ReadOutcome::Corrupt(e)) => {
                tracing::warn!(
                    "Match store {} is corrupt, treating as empty: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("{}, treating as empty", e);
                Vec::new()
            }
        }
    }

    /// Find a match by id
    pub fn find(&self, match_id: Uuid) -> Option<Match> {
        self.load().into_iter().find(|m| m.match_id == match_id)
    }

    /// Append one match durably
    pub fn append(&self, new_match: &Match) -> Result<(), StoreError> {
        new_match.validate().map_err(StoreError::InvalidMatch)?;

        // The parent must exist before the lock key can be resolved
        self.ensure_parent_dir()?;
        let lock = path_lock(&self.path);
        let _guard = lock.lock();

        let mut document = match self.read_document()? {
            ReadOutcome::Loaded(document) => document,
            ReadOutcome::Missing => StoreDocument::default(),
            ReadOutcome::Corrupt(e) => {
                self.quarantine(&e)?;
                StoreDocument::default()
            }
        };

        if document
            .matches
            .iter()
            .any(|m| m.match_id == new_match.match_id)
        {
            return Err(StoreError::DuplicateMatchId(new_match.match_id));
        }

        document.matches.push(new_match.clone());
        self.write_document(&document)?;

        tracing::info!(
            "Saved match {} ({} battles) to {}",
            new_match.match_id,
            new_match.battles.len(),
            self.path.display()
        );
        Ok(())
    }

    fn read_document(&self) -> Result<ReadOutcome, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ReadOutcome::Missing),
            Err(e) => {
                return Err(StoreError::ReadFailed {
                    path: self.path.display().to_string(),
                    source: e,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(ReadOutcome::Missing);
        }

        match serde_json::from_str(&contents) {
            Ok(document) => Ok(ReadOutcome::Loaded(document)),
            Err(e) => Ok(ReadOutcome::Corrupt(e)),
        }
    }

    /// Move an unreadable store aside so it is never overwritten
    fn quarantine(&self, cause: &serde_json::Error) -> Result<(), StoreError> {
        let aside = self.quarantine_path();
        tracing::warn!(
            "Match store {} is corrupt ({}), moving it to {}",
            self.path.display(),
            cause,
            aside.display()
        );
        fs::rename(&self.path, &aside).map_err(|e| StoreError::WriteFailed {
            path: aside.display().to_string(),
            source: e,
        })
    }

    /// First free name of `<store>.corrupt`, `<store>.corrupt.1`, ...
    fn quarantine_path(&self) -> PathBuf {
        let mut candidate = sibling_path(&self.path, "corrupt");
        let mut n = 0u32;
        while candidate.exists() {
            n += 1;
            candidate = sibling_path(&self.path, &format!("corrupt.{}", n));
        }
        candidate
    }

    fn ensure_parent_dir(&self) -> Result<(), StoreError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|e| StoreError::WriteFailed {
                    path: parent.display().to_string(),
                    source: e,
                })
            }
            _ => Ok(()),
        }
    }

    fn write_document(&self, document: &StoreDocument) -> Result<(), StoreError> {
        let write_failed = |path: &Path, source: std::io::Error| StoreError::WriteFailed {
            path: path.display().to_string(),
            source,
        };

        let json = serde_json::to_string_pretty(document).map_err(StoreError::Serialize)?;
        let temp_path = sibling_path(&self.path, &format!("{}.tmp", Uuid::new_v4()));

        let written = fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(json.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(write_failed(temp_path.as_path(), e));
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(write_failed(self.path.as_path(), e));
        }

        Ok(())
    }
}

fn path_lock(path: &Path) -> Arc<Mutex<()>> {
    let locks = PATH_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut locks = locks.lock();
    Arc::clone(
        locks
            .entry(lock_key(path))
            .or_insert_with(|| Arc::new(Mutex::new(()))),
    )
}

/// Canonical parent joined with the file name; the raw path if that fails
fn lock_key(path: &Path) -> PathBuf {
    let Some(name) = path.file_name() else {
        return path.to_path_buf();
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::canonicalize(parent)
        .map(|dir| dir.join(name))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::model::{Battle, ItemLocation, ItemPlacement};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn sample_match(hero: &str) -> Match {
        let start = Utc.with_ymd_and_hms(2025, 5, 4, 18, 0, 0).unwrap();
        Match {
            match_id: Uuid::new_v4(),
            hero: hero.to_string(),
            start_time: start,
            end_time: Utc.with_ymd_and_hms(2025, 5, 4, 19, 12, 30).unwrap(),
            total_days: 2,
            victory: false,
            is_finished: true,
            created_at: Utc.with_ymd_and_hms(2025, 5, 4, 19, 12, 31).unwrap(),
            battles: vec![
                Battle {
                    day: 1,
                    start_time: start,
                    victory: true,
                    player_items: vec![ItemPlacement {
                        instance_id: "itm_a".to_string(),
                        template_id: "0b7f6a54-8d3e-4a4b-9c1d-2a5e6f708192".to_string(),
                        location: ItemLocation::PlayerSocket,
                        socket_index: 0,
                    }],
                    opponent_items: vec![ItemPlacement {
                        instance_id: "itm_b".to_string(),
                        template_id: "6c2d1e0f-1a2b-4c3d-8e4f-5a6b7c8d9e0f".to_string(),
                        location: ItemLocation::OpponentSkill,
                        socket_index: 3,
                    }],
                    screenshot_reference: Some("shots/day1.png".to_string()),
                },
                Battle {
                    day: 2,
                    start_time: Utc.with_ymd_and_hms(2025, 5, 4, 18, 20, 0).unwrap(),
                    victory: false,
                    player_items: Vec::new(),
                    opponent_items: Vec::new(),
                    screenshot_reference: None,
                },
            ],
        }
    }

    fn store_in(dir: &TempDir) -> MatchStore {
        MatchStore::new(dir.path().join("matches.json"))
    }

    fn leftover_temp_files(dir: &TempDir) -> Vec<String> {
        fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect()
    }

    #[test]
    fn test_missing_store_loads_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store_in(&dir).load().is_empty());
    }

    #[test]
    fn test_append_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let first = sample_match("Vanessa");
        let second = sample_match("Dooley");

        store.append(&first).unwrap();
        store.append(&second).unwrap();

        let loaded = store.load();
        assert_eq!(loaded, vec![first.clone(), second]);
        assert_eq!(store.find(first.match_id), Some(first));
        assert!(store.find(Uuid::new_v4()).is_none());
        assert!(leftover_temp_files(&dir).is_empty());
    }

    #[test]
    fn test_document_shape() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append(&sample_match("Mak")).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["matches"].as_array().unwrap().len(), 1);
        assert_eq!(value["matches"][0]["hero"], "Mak");
    }

    #[test]
    fn test_corrupt_store_loads_empty_and_is_quarantined() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{ not json").unwrap();

        assert!(store.load().is_empty());

        let m = sample_match("Pygmalien");
        store.append(&m).unwrap();

        assert_eq!(store.load(), vec![m]);
        let aside = dir.path().join("matches.json.corrupt");
        assert_eq!(fs::read_to_string(aside).unwrap(), "{ not json");
    }

    #[test]
    fn test_repeated_corruption_keeps_every_quarantined_copy() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        fs::write(store.path(), "first garbage").unwrap();
        store.append(&sample_match("Vanessa")).unwrap();

        fs::write(store.path(), "second garbage").unwrap();
        store.append(&sample_match("Dooley")).unwrap();

        fs::write(store.path(), "third garbage").unwrap();
        let last = sample_match("Mak");
        store.append(&last).unwrap();

        assert_eq!(store.load(), vec![last]);
        let read = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read("matches.json.corrupt"), "first garbage");
        assert_eq!(read("matches.json.corrupt.1"), "second garbage");
        assert_eq!(read("matches.json.corrupt.2"), "third garbage");
    }

    #[test]
    fn test_duplicate_match_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let m = sample_match("Vanessa");
        store.append(&m).unwrap();

        let mut copy = sample_match("Dooley");
        copy.match_id = m.match_id;
        assert!(matches!(
            store.append(&copy),
            Err(StoreError::DuplicateMatchId(id)) if id == m.match_id
        ));
        assert_eq!(store.load().len(), 1);
        assert_eq!(store.load()[0].hero, "Vanessa");
    }

    #[test]
    fn test_invalid_match_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut m = sample_match("Vanessa");
        m.battles.swap(0, 1);

        assert!(matches!(store.append(&m), Err(StoreError::InvalidMatch(_))));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_write_failure_is_surfaced() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "file").unwrap();
        let store = MatchStore::new(blocker.join("matches.json"));

        let result = store.append(&sample_match("Vanessa"));
        assert!(matches!(
            result,
            Err(StoreError::WriteFailed { .. }) | Err(StoreError::ReadFailed { .. })
        ));
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store_in(&dir));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.append(&sample_match(&format!("hero-{}", i))).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.load().len(), 8);
    }

    #[test]
    fn test_appends_through_separate_handles_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let direct = dir.path().join("matches.json");
        let dotted = dir.path().join(".").join("matches.json");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = if i % 2 == 0 { direct.clone() } else { dotted.clone() };
                std::thread::spawn(move || {
                    let store = MatchStore::new(path);
                    for n in 0..4 {
                        store
                            .append(&sample_match(&format!("hero-{}-{}", i, n)))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let loaded = MatchStore::new(&direct).load();
        assert_eq!(loaded.len(), 32);
        assert!(leftover_temp_files(&dir).is_empty());
        assert!(!dir.path().join("matches.json.corrupt").exists());
    }
}
