/// Game session lifecycle
///
/// A session starts idle, collects rounds while active, and ends exactly
/// once: either persisted (`Finished`) or discarded (`Abandoned`).
use chrono::{DateTime, Utc};

/// State of a game session
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SessionState {
    /// Not started yet
    #[default]
    Idle,

    /// Collecting rounds and frames
    Active { started_at: DateTime<Utc> },

    /// Folded into a match and persisted
    Finished,

    /// Discarded without persisting
    Abandoned,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active { .. })
    }

    /// Check if the session has ended either way
    pub fn is_ended(&self) -> bool {
        matches!(self, SessionState::Finished | SessionState::Abandoned)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SessionState::Active { started_at } => Some(*started_at),
            _ => None,
        }
    }

    /// Get a human-readable description of the state
    pub fn description(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Active { .. } => "Active",
            SessionState::Finished => "Finished",
            SessionState::Abandoned => "Abandoned",
        }
    }
}

/// State transition results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// Cannot start a session that is already running
    AlreadyActive,

    /// Cannot finish or abandon a session that never started
    NotStarted,

    /// Session already finished or abandoned
    AlreadyEnded,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::AlreadyActive => write!(f, "Session is already active"),
            TransitionError::NotStarted => write!(f, "Session has not been started"),
            TransitionError::AlreadyEnded => write!(f, "Session has already ended"),
        }
    }
}

impl std::error::Error for TransitionError {}

/// State machine for session transitions
pub struct SessionStateMachine {
    state: SessionState,
}

impl SessionStateMachine {
    /// Create a new state machine in the Idle state
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Transition Idle -> Active
    pub fn start(&mut self, started_at: DateTime<Utc>) -> Result<(), TransitionError> {
        match self.state {
            SessionState::Idle => {
                self.state = SessionState::Active { started_at };
                Ok(())
            }
            SessionState::Active { .. } => Err(TransitionError::AlreadyActive),
            _ => Err(TransitionError::AlreadyEnded),
        }
    }

    /// Check that the session can end without changing state
    ///
    /// Returns the start time of the active session.
    pub fn ensure_active(&self) -> Result<DateTime<Utc>, TransitionError> {
        match self.state {
            SessionState::Active { started_at } => Ok(started_at),
            SessionState::Idle => Err(TransitionError::NotStarted),
            _ => Err(TransitionError::AlreadyEnded),
        }
    }

    /// Transition Active -> Finished
    pub fn finish(&mut self) -> Result<(), TransitionError> {
        self.ensure_active()?;
        self.state = SessionState::Finished;
        Ok(())
    }

    /// Transition Active -> Abandoned
    pub fn abandon(&mut self) -> Result<(), TransitionError> {
        self.ensure_active()?;
        self.state = SessionState::Abandoned;
        Ok(())
    }
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
