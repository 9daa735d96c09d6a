/// Match persistence module
///
/// Finished sessions are folded into a `Match` and appended to a single
/// JSON document. The store is append-only; history is read back whole.

pub mod match_store;
pub mod model;

pub use match_store::MatchStore;
pub use model::{Battle, ItemLocation, ItemPlacement, Match, DEFAULT_WINS_FOR_VICTORY};
