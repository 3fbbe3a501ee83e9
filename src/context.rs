//! GLX rendering context
//!
//! [`RenderContext`] is created once per backend instance. It owns the GL
//! context made current on the compositor's target drawable, the depth →
//! FBConfig table, the resolved texture-from-pixmap entry points, and the
//! drawing library together with the shader programs it owns.
//!
//! Initialization either returns a fully working context or tears down
//! everything it had built and returns the first error. Nothing partial is
//! left alive.

use log::{debug, error, info, warn};

use crate::config::GlxConfig;
use crate::driver::{consts, GlDriver, GlxDisplay, VisualAttrib, VisualId, XId};
use crate::error::{GlxError, GlxResult};
use crate::extension::{
    ExtensionProbe, TexImageFns, GLX_EXT_TEXTURE_FROM_PIXMAP, GL_ARB_TEXTURE_NON_POWER_OF_TWO,
};
use crate::fbconfig::{FbConfigSelector, FbConfigTable, FramebufferConfig};
use crate::painter::{BlurProgram, DrawPrimitives, WindowProgram, MAX_BLUR_PASS};

/// Screen the compositor paints on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenInfo {
    pub root: XId,
    /// Composite overlay window, when the compositor claimed one
    pub overlay: Option<XId>,
    /// Visual the compositor renders with
    pub visual: VisualId,
    /// Default depth of the screen
    pub depth: u8,
    pub width: u32,
    pub height: u32,
}

impl ScreenInfo {
    /// Drawable the context is attached to and swapped: overlay, else root
    pub fn target_drawable(&self) -> XId {
        self.overlay.unwrap_or(self.root)
    }
}

/// Capabilities detected after the context became current
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub non_power_of_two_texture: bool,
}

pub struct RenderContext<D: GlxDisplay, G: GlDriver> {
    display: D,
    gl: G,
    context: D::Context,
    caps: Capabilities,
    fbconfigs: FbConfigTable<D::FbConfig>,
    tex_image: TexImageFns<D::Proc>,
    painter: Box<dyn DrawPrimitives>,
    window_program: WindowProgram,
    blur_programs: [BlurProgram; MAX_BLUR_PASS],
    screen: ScreenInfo,
    config: GlxConfig,
}

impl<D: GlxDisplay, G: GlDriver> RenderContext<D, G> {
    /// Bring up GLX on `screen`.
    ///
    /// On failure every resource created so far is released before the error
    /// is returned.
    pub fn init(
        display: D,
        gl: G,
        painter: Box<dyn DrawPrimitives>,
        screen: ScreenInfo,
        config: &GlxConfig,
    ) -> GlxResult<Self> {
        let mut partial = PartialContext::new(display, gl, painter);

        let ready = partial.bring_up(&screen, config).and_then(|(caps, tex_image)| {
            partial
                .context
                .take()
                .map(|context| (context, caps, tex_image))
                .ok_or(GlxError::ContextCreationFailed)
        });

        match ready {
            Ok((context, caps, tex_image)) => {
                info!(
                    "GLX context ready on {:#010x}: {} depths, npot textures {}",
                    screen.target_drawable(),
                    partial.fbconfigs.len(),
                    caps.non_power_of_two_texture
                );
                let PartialContext {
                    display,
                    gl,
                    painter,
                    fbconfigs,
                    window_program,
                    blur_programs,
                    ..
                } = partial;
                Ok(Self {
                    display,
                    gl,
                    context,
                    caps,
                    fbconfigs,
                    tex_image,
                    painter,
                    window_program,
                    blur_programs,
                    screen,
                    config: config.clone(),
                })
            }
            Err(e) => {
                error!("GLX initialization failed: {}", e);
                partial.teardown();
                Err(e)
            }
        }
    }

    /// Destroy GLX related resources.
    ///
    /// Window bindings must have been destroyed already.
    pub fn deinit(self) {
        let Self {
            display,
            gl,
            context,
            painter,
            fbconfigs,
            window_program,
            blur_programs,
            ..
        } = self;

        PartialContext {
            display,
            gl,
            painter,
            context: Some(context),
            fbconfigs,
            window_program,
            blur_programs,
        }
        .teardown();
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn gl(&self) -> &G {
        &self.gl
    }

    pub fn caps(&self) -> Capabilities {
        self.caps
    }

    pub fn fbconfig(&self, depth: u8) -> Option<&FramebufferConfig<D::FbConfig>> {
        self.fbconfigs.get(depth)
    }

    pub fn fbconfigs(&self) -> &FbConfigTable<D::FbConfig> {
        &self.fbconfigs
    }

    pub fn tex_image(&self) -> TexImageFns<D::Proc> {
        self.tex_image
    }

    pub fn screen(&self) -> &ScreenInfo {
        &self.screen
    }

    pub fn config(&self) -> &GlxConfig {
        &self.config
    }

    pub fn painter_mut(&mut self) -> &mut dyn DrawPrimitives {
        self.painter.as_mut()
    }

    pub fn window_program_mut(&mut self) -> &mut WindowProgram {
        &mut self.window_program
    }

    pub fn blur_programs_mut(&mut self) -> &mut [BlurProgram; MAX_BLUR_PASS] {
        &mut self.blur_programs
    }

    /// The root window changed size
    pub fn resize(&mut self, width: u32, height: u32) {
        debug!("GLX target resized to {}x{}", width, height);
        self.screen.width = width;
        self.screen.height = height;
        self.painter.resize(width, height);
    }
}

/// Context state while it is being built or torn down
struct PartialContext<D: GlxDisplay, G: GlDriver> {
    display: D,
    gl: G,
    painter: Box<dyn DrawPrimitives>,
    context: Option<D::Context>,
    fbconfigs: FbConfigTable<D::FbConfig>,
    window_program: WindowProgram,
    blur_programs: [BlurProgram; MAX_BLUR_PASS],
}

impl<D: GlxDisplay, G: GlDriver> PartialContext<D, G> {
    fn new(display: D, gl: G, painter: Box<dyn DrawPrimitives>) -> Self {
        Self {
            display,
            gl,
            painter,
            context: None,
            fbconfigs: FbConfigTable::default(),
            window_program: WindowProgram::default(),
            blur_programs: Default::default(),
        }
    }

    fn bring_up(
        &mut self,
        screen: &ScreenInfo,
        config: &GlxConfig,
    ) -> GlxResult<(Capabilities, TexImageFns<D::Proc>)> {
        if !self.display.query_extension() {
            error!("No GLX extension.");
            return Err(GlxError::ExtensionMissing("GLX".to_string()));
        }

        let visual = self.display.visual_info(screen.visual).ok_or_else(|| {
            error!("Failed to acquire XVisualInfo for current visual.");
            GlxError::VisualUnsuitable(format!("no XVisualInfo for visual {:#x}", screen.visual))
        })?;

        if self.display.visual_attrib(&visual, VisualAttrib::UseGl).unwrap_or(0) == 0 {
            error!("Root visual is not a GL visual.");
            return Err(GlxError::VisualUnsuitable("root visual is not a GL visual".to_string()));
        }

        if self.display.visual_attrib(&visual, VisualAttrib::DoubleBuffer).unwrap_or(0) == 0 {
            error!("Root visual is not a double buffered GL visual.");
            return Err(GlxError::VisualUnsuitable(
                "root visual is not double buffered".to_string(),
            ));
        }

        if !ExtensionProbe::new(&self.display).has_glx_extension(GLX_EXT_TEXTURE_FROM_PIXMAP) {
            return Err(GlxError::ExtensionMissing(GLX_EXT_TEXTURE_FROM_PIXMAP.to_string()));
        }

        let context = self.display.create_context(&visual).ok_or_else(|| {
            error!("Failed to get GLX context.");
            GlxError::ContextCreationFailed
        })?;
        let context = self.context.insert(context);
        drop(visual);

        if !self.display.make_current(screen.target_drawable(), &*context) {
            error!("Failed to attach GLX context.");
            return Err(GlxError::ContextAttachFailed);
        }

        if config.debug_context && !self.gl.install_debug_callback() {
            warn!("Failed to install GL debug message callback, continuing without it.");
        }

        // X Fixes does not guarantee rectangles in regions don't overlap, the
        // stencil buffer keeps a region from being painted more than once.
        if !config.no_stencil && self.gl.get_integer(consts::GL_STENCIL_BITS) == 0 {
            error!("Target window doesn't have stencil buffer.");
            return Err(GlxError::NoStencilBuffer);
        }

        // Needs a current context and must precede FBConfig selection
        let caps = Capabilities {
            non_power_of_two_texture: self.gl.has_extension(GL_ARB_TEXTURE_NON_POWER_OF_TWO),
        };

        let tex_image = ExtensionProbe::new(&self.display).resolve_tex_image_fns()?;

        self.fbconfigs = FbConfigSelector::new(&self.display).select(screen.depth)?;

        self.setup_render_state(screen, config);

        Ok((caps, tex_image))
    }

    fn setup_render_state(&mut self, screen: &ScreenInfo, config: &GlxConfig) {
        self.painter.resize(screen.width, screen.height);

        self.gl.disable(gl::DEPTH_TEST);
        self.gl.depth_mask(false);
        self.gl.tex_env_mode(gl::REPLACE);
        self.gl.disable(gl::BLEND);

        if !config.no_stencil {
            self.gl.clear(gl::STENCIL_BUFFER_BIT);
            self.gl.disable(gl::STENCIL_TEST);
            self.gl.stencil_mask(0x1);
            self.gl.stencil_func(gl::EQUAL, 0x1, 0x1);
        }

        self.gl.clear_color(0.0, 0.0, 0.0, 1.0);
        self.gl.check_errors("render state setup");
    }

    /// Release whatever exists; safe on any partially built state
    fn teardown(mut self) {
        for program in self.blur_programs.iter_mut() {
            self.painter.free_blur_program(program);
        }
        self.painter.free_window_program(&mut self.window_program);

        if self.context.is_some() {
            self.gl.check_errors("GLX deinit");
        }

        self.fbconfigs.clear();

        if let Some(context) = self.context.take() {
            self.display.destroy_context(context);
            debug!("GLX context destroyed");
        }
    }
}
