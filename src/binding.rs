//! Per-window texture-from-pixmap bindings
//!
//! A [`WindowTextureBinding`] ties a window's native pixmap to a GL texture
//! through a GLX pixmap. Its identity is created once when the window becomes
//! displayable; its contents are re-acquired with [`refresh`] every frame the
//! window is painted.
//!
//! Teardown order matters to drivers: the texture image is released while
//! the texture is bound, then the GLX pixmap is destroyed, then the texture,
//! and the native pixmap last.
//!
//! [`refresh`]: WindowTextureBinding::refresh

use log::{debug, error};

use crate::context::RenderContext;
use crate::driver::{
    GlDriver, GlxDisplay, GlxPixmap, TextureFormat, TextureId, TextureTarget, XId,
};
use crate::error::BindingError;
use crate::fbconfig::{choose_texture_target, MAX_DEPTH};
use crate::window::WindowInfo;

/// Native pixmap backing a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativePixmap {
    /// Named by the backend and freed with the binding
    Owned(XId),
    /// The window's own id; never freed by the backend
    Borrowed(XId),
}

impl NativePixmap {
    pub fn id(self) -> XId {
        match self {
            NativePixmap::Owned(id) | NativePixmap::Borrowed(id) => id,
        }
    }

    pub fn is_owned(self) -> bool {
        matches!(self, NativePixmap::Owned(_))
    }
}

/// Resources acquired so far for one window
#[derive(Debug, Default)]
struct BindingResources {
    pixmap: Option<NativePixmap>,
    glx_pixmap: Option<GlxPixmap>,
    texture: Option<TextureId>,
}

impl BindingResources {
    fn acquire<D: GlxDisplay, G: GlDriver>(
        &mut self,
        ctx: &RenderContext<D, G>,
        window: &WindowInfo,
        config: D::FbConfig,
        format: TextureFormat,
        target: TextureTarget,
    ) -> Result<(), BindingError> {
        let display = ctx.display();
        let gl = ctx.gl();

        let pixmap = if display.can_name_window_pixmap() {
            display.name_window_pixmap(window.id).map(NativePixmap::Owned)
        } else {
            Some(NativePixmap::Borrowed(window.id))
        };
        let pixmap = pixmap.filter(|p| p.id() != 0).ok_or_else(|| {
            error!("Failed to get pixmap for window {:#010x}", window.id);
            BindingError::PixmapUnavailable(window.id)
        })?;
        self.pixmap = Some(pixmap);

        let glx_pixmap = display
            .create_glx_pixmap(config, pixmap.id(), format, target)
            .ok_or_else(|| {
                error!("Failed to create glpixmap for window {:#010x}", window.id);
                BindingError::BridgeCreationFailed(window.id)
            })?;
        self.glx_pixmap = Some(glx_pixmap);

        let texture = gl.gen_texture().ok_or_else(|| {
            error!("Failed to generate texture for window {:#010x}", window.id);
            BindingError::TextureCreationFailed(window.id)
        })?;

        gl.bind_texture(target, Some(texture));
        gl.tex_parameter(target, gl::TEXTURE_MIN_FILTER, gl::NEAREST as i32);
        gl.tex_parameter(target, gl::TEXTURE_MAG_FILTER, gl::NEAREST as i32);
        gl.tex_parameter(target, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as i32);
        gl.tex_parameter(target, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as i32);
        gl.bind_texture(target, None);
        self.texture = Some(texture);

        Ok(())
    }

    /// Release the texture image and destroy the GLX pixmap
    fn release_bridge<D: GlxDisplay, G: GlDriver>(
        &mut self,
        ctx: &RenderContext<D, G>,
        target: TextureTarget,
    ) {
        let gl = ctx.gl();

        if let (Some(glx_pixmap), Some(texture)) = (self.glx_pixmap, self.texture) {
            gl.bind_texture(target, Some(texture));
            ctx.display().release_tex_image(ctx.tex_image().release, glx_pixmap);
            gl.bind_texture(target, None);
        }

        if let Some(glx_pixmap) = self.glx_pixmap.take() {
            ctx.display().destroy_glx_pixmap(glx_pixmap);
        }

        gl.check_errors("release pixmap");
    }

    /// Tear down whatever is present
    fn teardown<D: GlxDisplay, G: GlDriver>(
        &mut self,
        ctx: &RenderContext<D, G>,
        target: TextureTarget,
    ) {
        self.release_bridge(ctx, target);

        if let Some(texture) = self.texture.take() {
            ctx.gl().delete_texture(texture);
        }

        if let Some(NativePixmap::Owned(pixmap)) = self.pixmap.take() {
            ctx.display().free_pixmap(pixmap);
        }
    }
}

/// Texture binding of one window
#[derive(Debug)]
pub struct WindowTextureBinding {
    window: XId,
    target: TextureTarget,
    resources: BindingResources,
    width: u32,
    height: u32,
    y_inverted: bool,
}

impl WindowTextureBinding {
    /// Create the pixmap, GLX pixmap and texture for `window`.
    ///
    /// Fails without leaving anything allocated.
    pub fn create<D: GlxDisplay, G: GlDriver>(
        ctx: &RenderContext<D, G>,
        window: &WindowInfo,
    ) -> Result<Self, BindingError> {
        if window.depth > MAX_DEPTH {
            error!(
                "Requested depth {} higher than max possible depth {}.",
                window.depth, MAX_DEPTH
            );
            return Err(BindingError::UnsupportedDepth(window.depth));
        }

        let Some(config) = ctx.fbconfig(window.depth) else {
            error!("Couldn't find FBConfig with requested depth {}", window.depth);
            return Err(BindingError::UnsupportedDepth(window.depth));
        };

        let target = choose_texture_target(config.texture_targets, ctx.caps().non_power_of_two_texture);
        debug!(
            "depth {}, tgt {}, format {:?}",
            window.depth, target, config.texture_format
        );

        let mut resources = BindingResources::default();
        if let Err(e) =
            resources.acquire(ctx, window, config.handle, config.texture_format, target)
        {
            resources.teardown(ctx, target);
            return Err(e);
        }

        Ok(Self {
            window: window.id,
            target,
            resources,
            width: window.width,
            height: window.height,
            y_inverted: config.y_inverted,
        })
    }

    /// Bind the window pixmap's current contents to the texture.
    ///
    /// Must run before every frame the texture is composed.
    pub fn refresh<D: GlxDisplay, G: GlDriver>(&self, ctx: &RenderContext<D, G>) {
        let (Some(glx_pixmap), Some(texture)) = (self.resources.glx_pixmap, self.resources.texture)
        else {
            debug_assert!(false, "refresh on a released binding");
            error!("Window {:#010x} has no GLX pixmap to bind", self.window);
            return;
        };

        let gl = ctx.gl();
        gl.bind_texture(self.target, Some(texture));
        ctx.display().bind_tex_image(ctx.tex_image().bind, glx_pixmap);
        gl.bind_texture(self.target, None);
        gl.check_errors("bind pixmap");
    }

    /// Release the texture image and destroy the GLX pixmap.
    ///
    /// The texture and native pixmap stay until [`destroy`](Self::destroy).
    pub fn release<D: GlxDisplay, G: GlDriver>(&mut self, ctx: &RenderContext<D, G>) {
        self.resources.release_bridge(ctx, self.target);
    }

    /// Release everything this binding holds
    pub fn destroy<D: GlxDisplay, G: GlDriver>(mut self, ctx: &RenderContext<D, G>) {
        self.resources.teardown(ctx, self.target);
        debug!("Released texture binding of window {:#010x}", self.window);
    }

    pub fn window(&self) -> XId {
        self.window
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.resources.texture
    }

    pub fn target(&self) -> TextureTarget {
        self.target
    }

    pub fn pixmap(&self) -> Option<NativePixmap> {
        self.resources.pixmap
    }

    pub fn glx_pixmap(&self) -> Option<GlxPixmap> {
        self.resources.glx_pixmap
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn y_inverted(&self) -> bool {
        self.y_inverted
    }

    /// Whether the binding can still be refreshed
    pub fn is_bound(&self) -> bool {
        self.resources.glx_pixmap.is_some() && self.resources.texture.is_some()
    }
}
