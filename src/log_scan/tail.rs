/// Growing log file reader
///
/// `LogTail` reads newly appended complete lines from a log file without
/// blocking. `LogFollower` runs a tail on a background thread and hands lines
/// to the scanner through a channel, so blocking on new data never happens
/// inside the scanner itself.
use crossbeam_channel::{unbounded, Receiver};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use super::line::LogLine;
use crate::error::TailError;

/// Incremental reader over a growing log file
pub struct LogTail {
    path: PathBuf,
    offset: u64,
    next_index: usize,
    pending: Vec<u8>,
}

impl LogTail {
    /// Open a log file and read it from the beginning
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TailError> {
        let path = path.as_ref().to_path_buf();
        File::open(&path).map_err(|source| TailError::Open {
            path: path.display().to_string(),
            source,
        })?;

        Ok(Self {
            path,
            offset: 0,
            next_index: 0,
            pending: Vec::new(),
        })
    }

    /// Open a log file and only read lines appended from now on
    pub fn open_at_end(path: impl AsRef<Path>) -> Result<Self, TailError> {
        let mut tail = Self::open(path)?;
        tail.offset = std::fs::metadata(&tail.path)
            .map_err(|source| tail.read_error(source))?
            .len();
        Ok(tail)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all complete lines appended since the last poll
    ///
    /// A trailing line without a newline is held back until it is completed
    /// (or flushed with [`LogTail::flush_partial`]). If the file shrank it is
    /// assumed to have been truncated or rotated and is re-read from the start;
    /// sequence indices keep increasing across the restart.
    pub fn poll(&mut self) -> Result<Vec<LogLine>, TailError> {
        let mut file = File::open(&self.path).map_err(|source| self.read_error(source))?;
        let len = file
            .metadata()
            .map_err(|source| self.read_error(source))?
            .len();

        if len < self.offset {
            tracing::info!(
                "Log file {} shrank ({} -> {} bytes), restarting from the beginning",
                self.path.display(),
                self.offset,
                len
            );
            self.offset = 0;
            self.pending.clear();
        }

        if len == self.offset {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.offset))
            .map_err(|source| self.read_error(source))?;
        let mut buf = Vec::with_capacity((len - self.offset) as usize);
        file.read_to_end(&mut buf)
            .map_err(|source| self.read_error(source))?;
        self.offset += buf.len() as u64;
        self.pending.extend_from_slice(&buf);

        Ok(self.drain_complete_lines())
    }

    /// Emit the held-back partial line, if any (used at end of stream)
    pub fn flush_partial(&mut self) -> Option<LogLine> {
        if self.pending.is_empty() {
            return None;
        }
        let bytes = std::mem::take(&mut self.pending);
        Some(self.make_line(&bytes))
    }

    fn drain_complete_lines(&mut self) -> Vec<LogLine> {
        let mut lines = Vec::new();
        let mut start = 0;

        while let Some(pos) = self.pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos;
            let bytes = self.pending[start..end].to_vec();
            lines.push(self.make_line(&bytes));
            start = end + 1;
        }

        self.pending.drain(..start);
        lines
    }

    fn make_line(&mut self, bytes: &[u8]) -> LogLine {
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
        let text = String::from_utf8_lossy(bytes).into_owned();
        let line = LogLine::new(self.next_index, text);
        self.next_index += 1;
        line
    }

    fn read_error(&self, source: std::io::Error) -> TailError {
        TailError::Read {
            path: self.path.display().to_string(),
            source,
        }
    }
}

/// Background thread that polls a `LogTail` and forwards lines
pub struct LogFollower {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl LogFollower {
    /// Start following; returns the follower and the line receiver
    ///
    /// The receiver disconnects once the follower is stopped, so
    /// `receiver.iter()` is a plain iterator that ends with the session.
    pub fn spawn(mut tail: LogTail, poll_interval: Duration) -> (Self, Receiver<LogLine>) {
        let (tx, rx) = unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            tracing::info!("Log follower started: {}", tail.path().display());

            'poll: while !stop_flag.load(Ordering::Acquire) {
                match tail.poll() {
                    Ok(lines) => {
                        for line in lines {
                            if tx.send(line).is_err() {
                                break 'poll;
                            }
                        }
                    }
                    Err(e) => tracing::warn!("Log follower poll failed: {}", e),
                }
                thread::sleep(poll_interval);
            }

            if let Some(line) = tail.flush_partial() {
                let _ = tx.send(line);
            }

            tracing::info!("Log follower stopped: {}", tail.path().display());
        });

        (
            Self {
                stop,
                handle: Some(handle),
            },
            rx,
        )
    }

    /// Stop following and wait for the thread to exit
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Log follower thread panicked");
            }
        }
    }
}

impl Drop for LogFollower {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Most recently modified `*.log` file in a directory
///
/// A missing directory yields `None`.
pub fn find_latest_log(directory: &Path) -> Result<Option<PathBuf>, TailError> {
    let read_failed = |source| TailError::Read {
        path: directory.display().to_string(),
        source,
    };

    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(read_failed(e)),
    };

    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(read_failed)?;
        let path = entry.path();
        let is_log = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("log"))
            .unwrap_or(false);
        if !path.is_file() || !is_log {
            continue;
        }

        let modified = entry
            .metadata()
            .and_then(|metadata| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        if latest
            .as_ref()
            .map(|(latest_time, _)| modified > *latest_time)
            .unwrap_or(true)
        {
            latest = Some((modified, path));
        }
    }

    Ok(latest.map(|(_, path)| path))
}
