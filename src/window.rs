//! What the backend needs to know about a tracked window
//!
//! The window list itself lives in the compositor; it hands the backend a
//! [`WindowInfo`] snapshot when a window becomes displayable and whenever it
//! asks a per-window question.

use crate::driver::XId;

/// How a window's contents are painted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowMode {
    /// Fully opaque
    #[default]
    Solid,
    /// Opaque body, translucent frame
    FrameTransparent,
    /// Translucent contents (ARGB visual or opacity < 1)
    Transparent,
}

/// Snapshot of a window handed to the backend
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInfo {
    /// X window id
    pub id: XId,
    /// Color depth of the window's visual
    pub depth: u8,
    /// Width of the window including borders
    pub width: u32,
    /// Height of the window including borders
    pub height: u32,
    pub mode: WindowMode,
    pub frame_opacity: f64,
}

impl WindowInfo {
    /// A solid window with an opaque frame
    pub fn new(id: XId, depth: u8, width: u32, height: u32) -> Self {
        Self {
            id,
            depth,
            width,
            height,
            mode: WindowMode::Solid,
            frame_opacity: 1.0,
        }
    }

    pub fn with_mode(mut self, mode: WindowMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_frame_opacity(mut self, frame_opacity: f64) -> Self {
        self.frame_opacity = frame_opacity;
        self
    }
}
