//! Recording fakes for the display, GL and drawing-library boundaries
//!
//! The fake display and GL share one [`FakeState`] so tests can inspect the
//! combined call journal and which resources are still alive.

#![allow(dead_code)]

use gl::types::{GLbitfield, GLenum, GLint, GLuint};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use axiom_glx::driver::{
    FbAttrib, GlDriver, GlxDisplay, GlxPixmap, TextureFormat, TextureId, TextureTarget,
    VisualAttrib, VisualId, XId,
};
use axiom_glx::painter::{BlurProgram, DrawPrimitives, TexturedQuad, WindowProgram};
use axiom_glx::{Region, ScreenInfo};

pub const ROOT: XId = 0x100;
pub const OVERLAY: XId = 0x200;
pub const VISUAL: VisualId = 0x21;

pub const BIND_PROC: u32 = 1;
pub const RELEASE_PROC: u32 = 2;
pub const OTHER_PROC: u32 = 99;

/// One entry of the call journal
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateContext(u32),
    DestroyContext(u32),
    MakeCurrent(XId),
    GetProcAddress(String),
    BindTexImage(u32, GlxPixmap),
    ReleaseTexImage(u32, GlxPixmap),
    CreateGlxPixmap {
        pixmap: XId,
        format: TextureFormat,
        target: TextureTarget,
    },
    DestroyGlxPixmap(GlxPixmap),
    NameWindowPixmap(XId),
    FreePixmap(XId),
    SwapBuffers(XId),
    QueryBufferAge(XId),
    GenTexture(TextureId),
    DeleteTexture(TextureId),
    BindTexture(TextureTarget, Option<TextureId>),
    TexParameter(TextureTarget, GLenum, GLint),
    GetInteger(GLenum),
    Enable(GLenum),
    Disable(GLenum),
    DepthMask(bool),
    TexEnvMode(GLenum),
    Clear(GLbitfield),
    ClearColor(f32, f32, f32, f32),
    StencilMask(GLuint),
    StencilFunc(GLenum, GLint, GLuint),
    InstallDebugCallback,
}

/// A config the fake display reports
#[derive(Debug, Clone)]
pub struct FakeConfig {
    pub attribs: HashMap<FbAttrib, i32>,
    pub visual_depth: Option<i32>,
}

impl FakeConfig {
    /// Single-sampled 8-bit config binding to 2D and rectangle textures
    pub fn new(buffer_size: i32, alpha_size: i32, visual_depth: i32) -> Self {
        let attribs = HashMap::from([
            (FbAttrib::Samples, 0),
            (FbAttrib::BufferSize, buffer_size),
            (FbAttrib::AlphaSize, alpha_size),
            (FbAttrib::RedSize, 8),
            (FbAttrib::DoubleBuffer, 0),
            (FbAttrib::StencilSize, 0),
            (FbAttrib::DepthSize, 0),
            (FbAttrib::BindToTextureRgb, 1),
            (FbAttrib::BindToTextureRgba, 0),
            (FbAttrib::BindToMipmapTexture, 0),
            (FbAttrib::BindToTextureTargets, 0x2 | 0x4),
            (FbAttrib::YInverted, 0),
        ]);
        Self {
            attribs,
            visual_depth: Some(visual_depth),
        }
    }

    /// Depth 24 RGB config
    pub fn rgb24() -> Self {
        Self::new(24, 0, 24)
    }

    /// Depth 32 RGBA config
    pub fn rgba32() -> Self {
        Self::new(32, 8, 32).with(FbAttrib::BindToTextureRgba, 1)
    }

    pub fn with(mut self, attrib: FbAttrib, value: i32) -> Self {
        self.attribs.insert(attrib, value);
        self
    }

    /// Make queries for `attrib` fail
    pub fn without(mut self, attrib: FbAttrib) -> Self {
        self.attribs.remove(&attrib);
        self
    }

    pub fn without_visual(mut self) -> Self {
        self.visual_depth = None;
        self
    }
}

/// Shared state behind the fake display and GL
#[derive(Debug)]
pub struct FakeState {
    pub journal: Vec<Call>,

    pub glx_supported: bool,
    pub glx_extensions: Option<String>,
    pub visual_found: bool,
    pub visual_use_gl: i32,
    pub visual_double_buffer: i32,
    pub configs: Vec<FakeConfig>,
    pub context_creation_ok: bool,
    pub make_current_ok: bool,
    pub resolvable: HashSet<String>,
    pub glx_pixmap_ok: bool,
    pub named_window_pixmaps: bool,
    pub name_pixmap_fails: bool,
    pub name_pixmap_zero: bool,
    pub buffer_age: u32,

    pub gl_extensions: String,
    pub stencil_bits: GLint,
    pub gen_texture_ok: bool,
    pub pending_errors: VecDeque<GLenum>,
    pub debug_callback_ok: bool,

    pub live_contexts: HashSet<u32>,
    pub live_glx_pixmaps: HashSet<XId>,
    pub live_pixmaps: HashSet<XId>,
    pub live_textures: HashSet<GLuint>,
    pub live_visuals: usize,

    /// Last resource id handed out
    pub next_id: u32,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            journal: Vec::new(),
            glx_supported: true,
            glx_extensions: Some(
                "GLX_ARB_create_context GLX_EXT_texture_from_pixmap GLX_EXT_buffer_age".to_string(),
            ),
            visual_found: true,
            visual_use_gl: 1,
            visual_double_buffer: 1,
            configs: vec![FakeConfig::rgb24(), FakeConfig::rgba32()],
            context_creation_ok: true,
            make_current_ok: true,
            resolvable: HashSet::from([
                "glXBindTexImageEXT".to_string(),
                "glXReleaseTexImageEXT".to_string(),
            ]),
            glx_pixmap_ok: true,
            named_window_pixmaps: true,
            name_pixmap_fails: false,
            name_pixmap_zero: false,
            buffer_age: 0,
            gl_extensions: "GL_ARB_texture_rectangle GL_ARB_texture_non_power_of_two".to_string(),
            stencil_bits: 8,
            gen_texture_ok: true,
            pending_errors: VecDeque::new(),
            debug_callback_ok: true,
            live_contexts: HashSet::new(),
            live_glx_pixmaps: HashSet::new(),
            live_pixmaps: HashSet::new(),
            live_textures: HashSet::new(),
            live_visuals: 0,
            next_id: 0x1000,
        }
    }
}

impl FakeState {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Nothing the backend allocated is still alive
    pub fn nothing_live(&self) -> bool {
        self.live_contexts.is_empty()
            && self.live_glx_pixmaps.is_empty()
            && self.live_pixmaps.is_empty()
            && self.live_textures.is_empty()
            && self.live_visuals == 0
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.journal.iter().position(|c| c == call)
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.journal.iter().filter(|c| pred(c)).count()
    }
}

pub type Shared = Rc<RefCell<FakeState>>;

pub struct FakeVisual {
    state: Shared,
}

impl Drop for FakeVisual {
    fn drop(&mut self) {
        self.state.borrow_mut().live_visuals -= 1;
    }
}

pub struct FakeDisplay {
    pub state: Shared,
}

impl GlxDisplay for FakeDisplay {
    type FbConfig = usize;
    type Visual = FakeVisual;
    type Context = u32;
    type Proc = u32;

    fn query_extension(&self) -> bool {
        self.state.borrow().glx_supported
    }

    fn extensions_string(&self) -> Option<String> {
        self.state.borrow().glx_extensions.clone()
    }

    fn visual_info(&self, visual: VisualId) -> Option<FakeVisual> {
        let mut state = self.state.borrow_mut();
        if !state.visual_found || visual != VISUAL {
            return None;
        }
        state.live_visuals += 1;
        Some(FakeVisual {
            state: Rc::clone(&self.state),
        })
    }

    fn visual_attrib(&self, _visual: &FakeVisual, attrib: VisualAttrib) -> Option<i32> {
        let state = self.state.borrow();
        Some(match attrib {
            VisualAttrib::UseGl => state.visual_use_gl,
            VisualAttrib::DoubleBuffer => state.visual_double_buffer,
        })
    }

    fn fb_configs(&self) -> Vec<usize> {
        (0..self.state.borrow().configs.len()).collect()
    }

    fn fb_config_attrib(&self, config: usize, attrib: FbAttrib) -> Option<i32> {
        self.state.borrow().configs[config].attribs.get(&attrib).copied()
    }

    fn fb_config_visual_depth(&self, config: usize) -> Option<i32> {
        self.state.borrow().configs[config].visual_depth
    }

    fn create_context(&self, _visual: &FakeVisual) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        if !state.context_creation_ok {
            return None;
        }
        let id = state.next_id();
        state.live_contexts.insert(id);
        state.journal.push(Call::CreateContext(id));
        Some(id)
    }

    fn destroy_context(&self, context: u32) {
        let mut state = self.state.borrow_mut();
        assert!(state.live_contexts.remove(&context), "context destroyed twice");
        state.journal.push(Call::DestroyContext(context));
    }

    fn make_current(&self, drawable: XId, context: &u32) -> bool {
        let mut state = self.state.borrow_mut();
        assert!(state.live_contexts.contains(context));
        state.journal.push(Call::MakeCurrent(drawable));
        state.make_current_ok
    }

    fn get_proc_address(&self, name: &str) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        state.journal.push(Call::GetProcAddress(name.to_string()));
        if !state.resolvable.contains(name) {
            return None;
        }
        Some(match name {
            "glXBindTexImageEXT" => BIND_PROC,
            "glXReleaseTexImageEXT" => RELEASE_PROC,
            _ => OTHER_PROC,
        })
    }

    fn bind_tex_image(&self, entry: u32, pixmap: GlxPixmap) {
        let mut state = self.state.borrow_mut();
        assert!(state.live_glx_pixmaps.contains(&pixmap.0));
        state.journal.push(Call::BindTexImage(entry, pixmap));
    }

    fn release_tex_image(&self, entry: u32, pixmap: GlxPixmap) {
        let mut state = self.state.borrow_mut();
        assert!(state.live_glx_pixmaps.contains(&pixmap.0));
        state.journal.push(Call::ReleaseTexImage(entry, pixmap));
    }

    fn create_glx_pixmap(
        &self,
        _config: usize,
        pixmap: XId,
        format: TextureFormat,
        target: TextureTarget,
    ) -> Option<GlxPixmap> {
        let mut state = self.state.borrow_mut();
        state.journal.push(Call::CreateGlxPixmap {
            pixmap,
            format,
            target,
        });
        if !state.glx_pixmap_ok {
            return None;
        }
        let id = state.next_id();
        state.live_glx_pixmaps.insert(id);
        Some(GlxPixmap(id))
    }

    fn destroy_glx_pixmap(&self, pixmap: GlxPixmap) {
        let mut state = self.state.borrow_mut();
        assert!(state.live_glx_pixmaps.remove(&pixmap.0), "GLX pixmap destroyed twice");
        state.journal.push(Call::DestroyGlxPixmap(pixmap));
    }

    fn can_name_window_pixmap(&self) -> bool {
        self.state.borrow().named_window_pixmaps
    }

    fn name_window_pixmap(&self, window: XId) -> Option<XId> {
        let mut state = self.state.borrow_mut();
        state.journal.push(Call::NameWindowPixmap(window));
        if state.name_pixmap_fails {
            return None;
        }
        if state.name_pixmap_zero {
            return Some(0);
        }
        let id = state.next_id();
        state.live_pixmaps.insert(id);
        Some(id)
    }

    fn free_pixmap(&self, pixmap: XId) {
        let mut state = self.state.borrow_mut();
        assert!(state.live_pixmaps.remove(&pixmap), "pixmap {:#x} not owned", pixmap);
        state.journal.push(Call::FreePixmap(pixmap));
    }

    fn swap_buffers(&self, drawable: XId) {
        self.state.borrow_mut().journal.push(Call::SwapBuffers(drawable));
    }

    fn query_buffer_age(&self, drawable: XId) -> u32 {
        let mut state = self.state.borrow_mut();
        state.journal.push(Call::QueryBufferAge(drawable));
        state.buffer_age
    }
}

pub struct FakeGl {
    pub state: Shared,
}

impl FakeGl {
    fn record(&self, call: Call) {
        self.state.borrow_mut().journal.push(call);
    }
}

impl GlDriver for FakeGl {
    fn extensions(&self) -> String {
        self.state.borrow().gl_extensions.clone()
    }

    fn get_integer(&self, pname: GLenum) -> GLint {
        self.record(Call::GetInteger(pname));
        if pname == axiom_glx::driver::consts::GL_STENCIL_BITS {
            self.state.borrow().stencil_bits
        } else {
            0
        }
    }

    fn get_error(&self) -> GLenum {
        self.state
            .borrow_mut()
            .pending_errors
            .pop_front()
            .unwrap_or(gl::NO_ERROR)
    }

    fn gen_texture(&self) -> Option<TextureId> {
        let mut state = self.state.borrow_mut();
        if !state.gen_texture_ok {
            return None;
        }
        let id = state.next_id();
        state.live_textures.insert(id);
        state.journal.push(Call::GenTexture(TextureId(id)));
        Some(TextureId(id))
    }

    fn delete_texture(&self, texture: TextureId) {
        let mut state = self.state.borrow_mut();
        assert!(state.live_textures.remove(&texture.0), "texture deleted twice");
        state.journal.push(Call::DeleteTexture(texture));
    }

    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureId>) {
        self.record(Call::BindTexture(target, texture));
    }

    fn tex_parameter(&self, target: TextureTarget, pname: GLenum, value: GLint) {
        self.record(Call::TexParameter(target, pname, value));
    }

    fn enable(&self, cap: GLenum) {
        self.record(Call::Enable(cap));
    }

    fn disable(&self, cap: GLenum) {
        self.record(Call::Disable(cap));
    }

    fn depth_mask(&self, flag: bool) {
        self.record(Call::DepthMask(flag));
    }

    fn tex_env_mode(&self, mode: GLenum) {
        self.record(Call::TexEnvMode(mode));
    }

    fn clear(&self, mask: GLbitfield) {
        self.record(Call::Clear(mask));
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.record(Call::ClearColor(red, green, blue, alpha));
    }

    fn stencil_mask(&self, mask: GLuint) {
        self.record(Call::StencilMask(mask));
    }

    fn stencil_func(&self, func: GLenum, reference: GLint, mask: GLuint) {
        self.record(Call::StencilFunc(func, reference, mask));
    }

    fn install_debug_callback(&self) -> bool {
        self.record(Call::InstallDebugCallback);
        self.state.borrow().debug_callback_ok
    }
}

/// What the recording painter saw
#[derive(Debug, Default)]
pub struct PainterLog {
    pub draws: Vec<(TexturedQuad, Region)>,
    pub resizes: Vec<(u32, u32)>,
    pub freed_window_programs: usize,
    pub freed_blur_programs: usize,
}

pub struct RecordingPainter {
    pub log: Rc<RefCell<PainterLog>>,
}

impl DrawPrimitives for RecordingPainter {
    fn draw_quad(&mut self, quad: &TexturedQuad, region: &Region) {
        self.log.borrow_mut().draws.push((*quad, region.clone()));
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.log.borrow_mut().resizes.push((width, height));
    }

    fn free_window_program(&mut self, program: &mut WindowProgram) {
        *program = WindowProgram::default();
        self.log.borrow_mut().freed_window_programs += 1;
    }

    fn free_blur_program(&mut self, program: &mut BlurProgram) {
        *program = BlurProgram::default();
        self.log.borrow_mut().freed_blur_programs += 1;
    }
}

/// Fresh fakes sharing one state
pub struct Harness {
    pub state: Shared,
    pub painter_log: Rc<RefCell<PainterLog>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_state(FakeState::default())
    }

    pub fn with_state(state: FakeState) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            state: Rc::new(RefCell::new(state)),
            painter_log: Rc::new(RefCell::new(PainterLog::default())),
        }
    }

    pub fn display(&self) -> FakeDisplay {
        FakeDisplay {
            state: Rc::clone(&self.state),
        }
    }

    pub fn gl(&self) -> FakeGl {
        FakeGl {
            state: Rc::clone(&self.state),
        }
    }

    pub fn painter(&self) -> Box<RecordingPainter> {
        Box::new(RecordingPainter {
            log: Rc::clone(&self.painter_log),
        })
    }

    pub fn journal(&self) -> Vec<Call> {
        self.state.borrow().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.state.borrow_mut().journal.clear();
    }
}

/// 1920x1080 depth 24 screen rendering to the overlay window
pub fn screen() -> ScreenInfo {
    ScreenInfo {
        root: ROOT,
        overlay: Some(OVERLAY),
        visual: VISUAL,
        depth: 24,
        width: 1920,
        height: 1080,
    }
}
