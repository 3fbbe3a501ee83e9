//! # Axiom GLX Backend
//!
//! GLX texture-from-pixmap backend for an X11 compositor. Window contents are
//! bound to GL textures without copying and composed into the root or
//! composite overlay window.
//!
//! ## Architecture
//!
//! - `driver`: the Xlib/GLX/GL boundary, with a dlopen implementation behind
//!   the `glx-dlopen` feature
//! - `extension`: extension probing and entry point resolution
//! - `fbconfig`: per-depth FBConfig selection
//! - `context`: GL context bring-up and teardown
//! - `binding`: per-window texture bindings
//! - `compose`: painting a window with the X11 → GL coordinate flip
//! - `present`: buffer swap and buffer age
//! - `backend`: the backend interface the compositor drives
//! - `config`: TOML configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use axiom_glx::{Backend, BackendConfig, GlxBackend, NullPainter, Region};
//!
//! let mut backend = GlxBackend::init(display, gl, Box::new(NullPainter::new()), screen, &BackendConfig::default())?;
//! backend.prepare_win(&window)?;
//! backend.render_win(window.id)?;
//! backend.compose(window.id, 0, 0, &Region::from_rect(damage))?;
//! backend.present();
//! backend.deinit();
//! ```

pub mod backend;
pub mod binding;
pub mod compose;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod extension;
pub mod fbconfig;
pub mod painter;
pub mod present;
pub mod region;
pub mod window;

pub use backend::{Backend, GlxBackend};
pub use binding::{NativePixmap, WindowTextureBinding};
pub use config::{BackendConfig, GlxConfig, SwapMethod};
pub use context::{Capabilities, RenderContext, ScreenInfo};
pub use driver::{GlDriver, GlxDisplay, XId};
pub use error::{BindingError, GlxError, GlxResult};
pub use fbconfig::{FbConfigTable, FramebufferConfig};
pub use painter::{DrawPrimitives, NullPainter, TexturedQuad};
pub use present::BufferAge;
pub use region::{Rect, Region};
pub use window::{WindowInfo, WindowMode};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
