//! The GLX backend as the compositor drives it
//!
//! Per frame the compositor calls, for every visible window,
//! [`render_win`](Backend::render_win) then [`compose`](Backend::compose),
//! and finally [`present`](Backend::present) once. Window lifecycle events
//! map to [`prepare_win`](Backend::prepare_win) and
//! [`release_win`](Backend::release_win).

use log::{debug, info, warn};
use std::collections::HashMap;
use std::mem::ManuallyDrop;

use crate::binding::WindowTextureBinding;
use crate::compose;
use crate::config::BackendConfig;
use crate::context::{RenderContext, ScreenInfo};
use crate::driver::{GlDriver, GlxDisplay, XId};
use crate::error::{BindingError, GlxResult};
use crate::painter::DrawPrimitives;
use crate::present::BufferAge;
use crate::region::Region;
use crate::window::{WindowInfo, WindowMode};

/// Operations a compositing backend provides
pub trait Backend {
    /// Create the texture binding of a window that became displayable
    fn prepare_win(&mut self, window: &WindowInfo) -> Result<(), BindingError>;

    /// Re-acquire the window pixmap's contents before composing it
    fn render_win(&mut self, window: XId) -> Result<(), BindingError>;

    /// Drop the texture binding of an unmapped or destroyed window
    fn release_win(&mut self, window: XId) -> Result<(), BindingError>;

    /// Paint a window at `(dst_x, dst_y)` clipped to `region` (X11 coordinates)
    fn compose(
        &mut self,
        window: XId,
        dst_x: i32,
        dst_y: i32,
        region: &Region,
    ) -> Result<(), BindingError>;

    fn present(&mut self);

    fn buffer_age(&self) -> BufferAge;

    /// Frames of history callers should keep for buffer-age repaint
    fn max_buffer_age(&self) -> u32;

    fn is_win_transparent(&self, window: &WindowInfo) -> bool {
        window.mode != WindowMode::Solid
    }

    fn is_frame_transparent(&self, window: &WindowInfo) -> bool {
        window.frame_opacity < 1.0
    }
}

/// GLX texture-from-pixmap backend
///
/// Dropping the backend releases every binding and the context, the same as
/// [`deinit`](Self::deinit), but logs a warning.
pub struct GlxBackend<D: GlxDisplay, G: GlDriver> {
    /// Taken out only in `Drop`
    ctx: ManuallyDrop<RenderContext<D, G>>,
    windows: HashMap<XId, WindowTextureBinding>,
    max_buffer_age: u32,
    deinit_requested: bool,
}

impl<D: GlxDisplay, G: GlDriver> GlxBackend<D, G> {
    pub fn init(
        display: D,
        gl: G,
        painter: Box<dyn DrawPrimitives>,
        screen: ScreenInfo,
        config: &BackendConfig,
    ) -> GlxResult<Self> {
        let ctx = RenderContext::init(display, gl, painter, screen, &config.glx)?;
        info!("GLX backend initialized");
        Ok(Self {
            ctx: ManuallyDrop::new(ctx),
            windows: HashMap::new(),
            max_buffer_age: config.glx.max_buffer_age,
            deinit_requested: false,
        })
    }

    /// Destroy every window binding, then the context
    pub fn deinit(mut self) {
        self.deinit_requested = true;
    }

    pub fn context(&self) -> &RenderContext<D, G> {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut RenderContext<D, G> {
        &mut self.ctx
    }

    pub fn binding(&self, window: XId) -> Option<&WindowTextureBinding> {
        self.windows.get(&window)
    }

    pub fn live_bindings(&self) -> usize {
        self.windows.len()
    }

    /// The root window changed size
    pub fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }

    fn binding_or_err(&self, window: XId) -> Result<&WindowTextureBinding, BindingError> {
        self.windows
            .get(&window)
            .ok_or(BindingError::UnknownWindow(window))
    }
}

impl<D: GlxDisplay, G: GlDriver> Backend for GlxBackend<D, G> {
    fn prepare_win(&mut self, window: &WindowInfo) -> Result<(), BindingError> {
        if let Some(stale) = self.windows.remove(&window.id) {
            warn!("Window {:#010x} already had a binding, replacing it", window.id);
            stale.destroy(&self.ctx);
        }

        let binding = WindowTextureBinding::create(&self.ctx, window)?;
        self.windows.insert(window.id, binding);
        Ok(())
    }

    fn render_win(&mut self, window: XId) -> Result<(), BindingError> {
        self.binding_or_err(window)?.refresh(&self.ctx);
        Ok(())
    }

    fn release_win(&mut self, window: XId) -> Result<(), BindingError> {
        let binding = self
            .windows
            .remove(&window)
            .ok_or(BindingError::UnknownWindow(window))?;
        binding.destroy(&self.ctx);
        Ok(())
    }

    fn compose(
        &mut self,
        window: XId,
        dst_x: i32,
        dst_y: i32,
        region: &Region,
    ) -> Result<(), BindingError> {
        let binding = self
            .windows
            .get(&window)
            .ok_or(BindingError::UnknownWindow(window))?;
        compose::compose(&mut self.ctx, binding, dst_x, dst_y, region);
        Ok(())
    }

    fn present(&mut self) {
        self.ctx.present();
    }

    fn buffer_age(&self) -> BufferAge {
        self.ctx.query_buffer_age()
    }

    fn max_buffer_age(&self) -> u32 {
        self.max_buffer_age
    }
}

impl<D: GlxDisplay, G: GlDriver> Drop for GlxBackend<D, G> {
    fn drop(&mut self) {
        if !self.deinit_requested {
            warn!(
                "GLX backend dropped without deinit, releasing {} window bindings",
                self.windows.len()
            );
        }

        let count = self.windows.len();
        for (_, binding) in self.windows.drain() {
            binding.destroy(&self.ctx);
        }
        debug!("Released {} window bindings", count);

        // SAFETY: `ctx` is never used again after this point
        let ctx = unsafe { ManuallyDrop::take(&mut self.ctx) };
        ctx.deinit();
        info!("GLX backend shut down");
    }
}
