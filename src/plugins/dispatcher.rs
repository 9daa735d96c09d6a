/// Plugin hook dispatcher
///
/// Invokes registered plugins in registration order. Plugin code is
/// untrusted: an error or panic in one hook is caught here, logged, and
/// never stops the remaining plugins or reaches the pipeline.
use std::panic::{self, AssertUnwindSafe};

use super::api::OverlayApi;
use crate::detection::Detection;
use crate::error::PluginError;
use crate::log_scan::GameState;

/// A third-party plugin
///
/// Both hooks are optional; the defaults do nothing. Payloads are shared
/// immutably, so every plugin sees the same event.
pub trait Plugin: Send {
    /// Plugin name (for logging)
    fn name(&self) -> &str;

    /// Called once per processed detection frame
    fn on_cards_detected(
        &mut self,
        _detections: &[Detection],
        _api: &mut dyn OverlayApi,
    ) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called when the observed game phase changes
    fn on_game_state_changed(
        &mut self,
        _old_state: GameState,
        _new_state: GameState,
        _api: &mut dyn OverlayApi,
    ) -> Result<(), PluginError> {
        Ok(())
    }
}

/// A hook invocation that failed
#[derive(Debug, Clone, PartialEq)]
pub struct HookFailure {
    pub plugin: String,
    pub error: PluginError,
}

/// Outcome of dispatching one event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Number of plugins invoked
    pub invoked: usize,
    pub failures: Vec<HookFailure>,
}

impl DispatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ordered set of registered plugins
#[derive(Default)]
pub struct PluginDispatcher {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin; it runs after all previously registered ones
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        tracing::info!("Registered plugin: {}", plugin.name());
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Registered plugin names, in invocation order
    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    /// Deliver a detection frame to every plugin
    pub fn dispatch_cards_detected(
        &mut self,
        detections: &[Detection],
        api: &mut dyn OverlayApi,
    ) -> DispatchReport {
        self.invoke("on_cards_detected", |plugin| {
            plugin.on_cards_detected(detections, &mut *api)
        })
    }

    /// Deliver a game phase change to every plugin
    pub fn dispatch_game_state_changed(
        &mut self,
        old_state: GameState,
        new_state: GameState,
        api: &mut dyn OverlayApi,
    ) -> DispatchReport {
        self.invoke("on_game_state_changed", |plugin| {
            plugin.on_game_state_changed(old_state, new_state, &mut *api)
        })
    }

    fn invoke<F>(&mut self, hook: &'static str, mut call: F) -> DispatchReport
    where
        F: FnMut(&mut dyn Plugin) -> Result<(), PluginError>,
    {
        let mut report = DispatchReport::default();

        for plugin in self.plugins.iter_mut() {
            report.invoked += 1;

            let result = panic::catch_unwind(AssertUnwindSafe(|| call(plugin.as_mut())))
                .unwrap_or_else(|payload| Err(PluginError::Panicked(panic_message(&*payload))));

            if let Err(error) = result {
                tracing::warn!(
                    plugin = plugin.name(),
                    hook,
                    "Plugin hook failed: {}",
                    error
                );
                report.failures.push(HookFailure {
                    plugin: plugin.name().to_string(),
                    error,
                });
            }
        }

        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BoundingBox;
    use crate::plugins::api::{OverlayCanvas, OverlayColor};
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Seen = Arc<Mutex<Vec<(String, Vec<Detection>)>>>;

    struct Recorder {
        name: String,
        seen: Seen,
    }

    impl Plugin for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn on_cards_detected(
            &mut self,
            detections: &[Detection],
            api: &mut dyn OverlayApi,
        ) -> Result<(), PluginError> {
            self.seen.lock().push((self.name.clone(), detections.to_vec()));
            for d in detections {
                api.draw_rect(d.bbox.x, d.bbox.y, d.bbox.w, d.bbox.h, OverlayColor::rgb(255, 0, 0));
            }
            Ok(())
        }
    }

    struct Failing;

    impl Plugin for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn on_cards_detected(
            &mut self,
            _detections: &[Detection],
            _api: &mut dyn OverlayApi,
        ) -> Result<(), PluginError> {
            Err(PluginError::Failed("bad plugin".to_string()))
        }
    }

    struct Panicking;

    impl Plugin for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn on_game_state_changed(
            &mut self,
            _old_state: GameState,
            _new_state: GameState,
            _api: &mut dyn OverlayApi,
        ) -> Result<(), PluginError> {
            panic!("plugin exploded");
        }
    }

    struct StateRecorder(Arc<Mutex<Vec<(GameState, GameState)>>>);

    impl Plugin for StateRecorder {
        fn name(&self) -> &str {
            "state-recorder"
        }

        fn on_game_state_changed(
            &mut self,
            old_state: GameState,
            new_state: GameState,
            _api: &mut dyn OverlayApi,
        ) -> Result<(), PluginError> {
            self.0.lock().push((old_state, new_state));
            Ok(())
        }
    }

    fn batch() -> Vec<Detection> {
        vec![
            Detection::new(3, 0.91, BoundingBox::new(10, 20, 5, 5)),
            Detection::new(99, 0.5, BoundingBox::default()),
        ]
    }

    #[test]
    fn test_failure_does_not_stop_later_plugins() {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = PluginDispatcher::new();
        dispatcher.register(Box::new(Failing));
        dispatcher.register(Box::new(Recorder {
            name: "b".to_string(),
            seen: Arc::clone(&seen),
        }));

        let mut canvas = OverlayCanvas::new();
        let report = dispatcher.dispatch_cards_detected(&batch(), &mut canvas);

        assert_eq!(report.invoked, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].plugin, "failing");

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, batch());
        // Second detection has an empty box and is not drawn
        assert_eq!(canvas.commands().len(), 1);
    }

    #[test]
    fn test_panic_is_isolated() {
        let states = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = PluginDispatcher::new();
        dispatcher.register(Box::new(Panicking));
        dispatcher.register(Box::new(StateRecorder(Arc::clone(&states))));

        let mut canvas = OverlayCanvas::new();
        let report =
            dispatcher.dispatch_game_state_changed(GameState::Combat, GameState::Replay, &mut canvas);

        assert_eq!(report.invoked, 2);
        assert_eq!(
            report.failures[0].error,
            PluginError::Panicked("plugin exploded".to_string())
        );
        assert_eq!(*states.lock(), vec![(GameState::Combat, GameState::Replay)]);
    }

    #[test]
    fn test_registration_order() {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = PluginDispatcher::new();
        for name in ["first", "second", "third"] {
            dispatcher.register(Box::new(Recorder {
                name: name.to_string(),
                seen: Arc::clone(&seen),
            }));
        }

        assert_eq!(dispatcher.plugin_names(), vec!["first", "second", "third"]);

        let mut canvas = OverlayCanvas::new();
        let report = dispatcher.dispatch_cards_detected(&[], &mut canvas);
        assert!(report.all_succeeded());

        let order: Vec<String> = seen.lock().iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_default_hooks_are_noops() {
        struct Silent;
        impl Plugin for Silent {
            fn name(&self) -> &str {
                "silent"
            }
        }

        let mut dispatcher = PluginDispatcher::new();
        dispatcher.register(Box::new(Silent));
        let mut canvas = OverlayCanvas::new();

        assert!(dispatcher.dispatch_cards_detected(&batch(), &mut canvas).all_succeeded());
        assert!(dispatcher
            .dispatch_game_state_changed(GameState::Unknown, GameState::Combat, &mut canvas)
            .all_succeeded());
        assert!(canvas.commands().is_empty());
    }
}
