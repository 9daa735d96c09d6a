/// Messaging module
///
/// Broadcasts pipeline events to independent consumers.
///
/// ## Architecture
///
/// ```text
/// ┌─────────────┐   RoundCompleted     ┌───────────┐      ┌──────────────┐
/// │ GameSession │ ───────────────────> │           │ ───> │ PluginHost   │
/// │ (log side)  │   GameStateChanged   │ Event Bus │      │ (UI thread)  │
/// └─────────────┘                      │           │      └──────────────┘
/// ┌─────────────┐ DetectionsProcessed  │           │      ┌──────────────┐
/// │ Frame       │ ───────────────────> │           │ ───> │ Debug display│
/// │ processor   │                      └───────────┘      │ / reporting  │
/// └─────────────┘                                         └──────────────┘
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let bus = EventBus::new();
/// let (rx, _id) = bus.subscribe();
///
/// while let Ok(event) = rx.recv() {
///     match event {
///         Event::RoundCompleted { record, .. } => { /* report round */ }
///         _ => {}
///     }
/// }
/// ```

pub mod bus;
pub mod events;

pub use bus::{EventBus, SubscriberId};
pub use events::Event;
