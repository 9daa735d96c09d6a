/// Plugin host
///
/// Owns the dispatcher and the overlay canvas on the thread that applies
/// overlay side effects. Events published from other threads are queued on
/// the host's bus subscription and only dispatched when that thread calls
/// [`PluginHost::pump`].
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::time::Duration;

use super::api::{OverlayCanvas, OverlayCommand};
use super::dispatcher::{DispatchReport, PluginDispatcher};
use crate::messaging::{Event, EventBus, SubscriberId};

pub struct PluginHost {
    dispatcher: PluginDispatcher,
    canvas: OverlayCanvas,
    bus: EventBus,
    events: Receiver<Event>,
    subscription: SubscriberId,
}

impl PluginHost {
    /// Subscribe a dispatcher to the bus
    pub fn new(bus: &EventBus, dispatcher: PluginDispatcher) -> Self {
        let (events, subscription) = bus.subscribe();
        Self {
            dispatcher,
            canvas: OverlayCanvas::new(),
            bus: bus.clone(),
            events,
            subscription,
        }
    }

    /// Dispatch every queued event; returns the number of hook dispatches made
    pub fn pump(&mut self) -> usize {
        let mut dispatched = 0;
        while let Ok(event) = self.events.try_recv() {
            if self.handle(event).is_some() {
                dispatched += 1;
            }
        }
        dispatched
    }

    /// Wait up to `timeout` for one event and dispatch it
    ///
    /// Returns `false` once the bus has shut down.
    pub fn pump_blocking(&mut self, timeout: Duration) -> bool {
        match self.events.recv_timeout(timeout) {
            Ok(Event::Shutdown) => false,
            Ok(event) => {
                self.handle(event);
                true
            }
            Err(RecvTimeoutError::Timeout) => true,
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Overlay commands produced for the latest frame
    pub fn overlay(&self) -> &[OverlayCommand] {
        self.canvas.commands()
    }

    /// Take the overlay commands for rendering
    pub fn take_overlay(&mut self) -> Vec<OverlayCommand> {
        self.canvas.drain()
    }

    pub fn dispatcher(&self) -> &PluginDispatcher {
        &self.dispatcher
    }

    fn handle(&mut self, event: Event) -> Option<DispatchReport> {
        match event {
            Event::DetectionsProcessed {
                frame_id,
                detections,
                ..
            } => {
                // Overlay is per frame
                self.canvas.clear();
                let report = self
                    .dispatcher
                    .dispatch_cards_detected(&detections, &mut self.canvas);
                tracing::debug!(
                    "Frame {} dispatched to {} plugins ({} failed)",
                    frame_id,
                    report.invoked,
                    report.failures.len()
                );
                Some(report)
            }
            Event::GameStateChanged {
                old_state,
                new_state,
            } => Some(self.dispatcher.dispatch_game_state_changed(
                old_state,
                new_state,
                &mut self.canvas,
            )),
            _ => None,
        }
    }
}

impl Drop for PluginHost {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.subscription);
    }
}
