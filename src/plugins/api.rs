/// Plugin capability API
///
/// The only surface plugin code can reach. Hooks receive `&mut dyn OverlayApi`,
/// so the sanctioned operations are exactly the trait's methods; session
/// state, the file system and other plugins are out of reach by type.

/// Maximum overlay commands kept per frame
pub const MAX_OVERLAY_COMMANDS: usize = 4096;

/// RGBA overlay color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl OverlayColor {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Same color with alpha from a 0.0-1.0 fraction
    pub fn with_alpha(self, alpha: f32) -> Self {
        let alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
        Self {
            a: (alpha * 255.0).round() as u8,
            ..self
        }
    }
}

/// Operations a plugin may perform
pub trait OverlayApi {
    /// Draw a rectangle at screen coordinates (typically a detection's box)
    fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: OverlayColor);
}

/// Recorded overlay operation, drained by the display collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCommand {
    Rect {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        color: OverlayColor,
    },
}

/// `OverlayApi` implementation that records commands for the display
#[derive(Debug, Default)]
pub struct OverlayCanvas {
    commands: Vec<OverlayCommand>,
    dropped: usize,
}

impl OverlayCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last clear
    pub fn commands(&self) -> &[OverlayCommand] {
        &self.commands
    }

    /// Take all recorded commands, leaving the canvas empty
    pub fn drain(&mut self) -> Vec<OverlayCommand> {
        self.dropped = 0;
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.dropped = 0;
    }
}

impl OverlayApi for OverlayCanvas {
    fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: OverlayColor) {
        if w <= 0 || h <= 0 {
            tracing::debug!("Ignoring empty overlay rect {}x{} at ({}, {})", w, h, x, y);
            return;
        }
        if self.commands.len() >= MAX_OVERLAY_COMMANDS {
            if self.dropped == 0 {
                tracing::warn!("Overlay command limit reached, dropping further rects");
            }
            self.dropped += 1;
            return;
        }
        self.commands.push(OverlayCommand::Rect { x, y, w, h, color });
    }
}
