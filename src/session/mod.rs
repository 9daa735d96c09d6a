/// Session module
///
/// Owns the per-run lifecycle: rounds are collected while the session is
/// active, then either persisted as a match or discarded.

pub mod frames;
pub mod game_session;
pub mod state;

pub use frames::FrameProcessor;
pub use game_session::GameSession;
pub use state::{SessionState, SessionStateMachine, TransitionError};
