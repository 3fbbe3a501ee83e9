//! Error types for the GLX backend
//!
//! Initialization failures are fatal for the backend instance and are
//! reported as [`GlxError`]. Per-window failures are recoverable: the window
//! is left unpainted and the caller may retry on a later frame.

use crate::driver::XId;
use thiserror::Error;

/// Fatal errors raised while bringing up the GLX rendering context
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlxError {
    /// A required GLX or GL extension is not advertised
    #[error("missing extension {0}")]
    ExtensionMissing(String),

    /// The compositor's visual cannot be used for GL rendering
    #[error("visual unsuitable: {0}")]
    VisualUnsuitable(String),

    /// Stencil use is enabled but the target drawable has no stencil buffer
    #[error("target window doesn't have a stencil buffer")]
    NoStencilBuffer,

    /// `glXCreateContext` returned no context
    #[error("failed to create GLX context")]
    ContextCreationFailed,

    /// `glXMakeCurrent` failed against the target drawable
    #[error("failed to attach GLX context")]
    ContextAttachFailed,

    /// A dynamically resolved entry point is unavailable
    #[error("failed to resolve entry point {0}")]
    EntryPointUnresolved(String),

    /// No usable framebuffer configuration exists for a required depth
    #[error("no FBConfig found for depth {0}")]
    NoConfigForDepth(u8),
}

/// Per-window errors; the window is simply not composited until retried
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// The window's depth is above the supported maximum or has no config
    #[error("unsupported window depth {0}")]
    UnsupportedDepth(u8),

    /// No native pixmap could be obtained for the window
    #[error("failed to get pixmap for window {0:#010x}")]
    PixmapUnavailable(XId),

    /// `glXCreatePixmap` failed for the window's pixmap
    #[error("failed to create GLX pixmap for window {0:#010x}")]
    BridgeCreationFailed(XId),

    /// No texture object could be generated for the window
    #[error("failed to generate texture for window {0:#010x}")]
    TextureCreationFailed(XId),

    /// The backend holds no binding for the window
    #[error("no texture binding for window {0:#010x}")]
    UnknownWindow(XId),
}

pub type GlxResult<T> = std::result::Result<T, GlxError>;
