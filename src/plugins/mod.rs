/// Plugin module
///
/// Third-party hooks for detection frames and game phase changes. Plugins
/// are loaded by an external loader and registered here; they only ever see
/// the narrow `OverlayApi` capability.
///
/// ## Usage
///
/// ```rust,ignore
/// struct Highlighter;
///
/// impl Plugin for Highlighter {
///     fn name(&self) -> &str { "highlighter" }
///
///     fn on_cards_detected(&mut self, detections: &[Detection], api: &mut dyn OverlayApi)
///         -> Result<(), PluginError>
///     {
///         for d in detections {
///             api.draw_rect(d.bbox.x, d.bbox.y, d.bbox.w, d.bbox.h, OverlayColor::rgb(255, 215, 0));
///         }
///         Ok(())
///     }
/// }
///
/// let mut dispatcher = PluginDispatcher::new();
/// dispatcher.register(Box::new(Highlighter));
/// let mut host = PluginHost::new(&bus, dispatcher);
/// host.pump(); // on the UI thread
/// ```

pub mod api;
pub mod dispatcher;
pub mod host;

pub use api::{OverlayApi, OverlayCanvas, OverlayColor, OverlayCommand};
pub use dispatcher::{DispatchReport, HookFailure, Plugin, PluginDispatcher};
pub use host::PluginHost;
