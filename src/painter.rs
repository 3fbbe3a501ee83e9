//! Boundary with the primitive-drawing library
//!
//! The drawing library owns shaders and rasterizes textured quads. The GLX
//! layer hands it fully reconciled draw requests and keeps its shader program
//! handles only so they are freed before the GL context goes away.

use log::trace;

use crate::driver::{TextureId, TextureTarget};
use crate::region::Region;

/// Maximum number of blur passes the drawing library may set up
pub const MAX_BLUR_PASS: usize = 5;

/// GL program object name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Program used to paint window textures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowProgram {
    pub program: Option<ProgramId>,
    pub unifm_opacity: Option<i32>,
    pub unifm_invert_color: Option<i32>,
    pub unifm_tex: Option<i32>,
}

impl WindowProgram {
    pub fn is_set(&self) -> bool {
        self.program.is_some()
    }
}

/// One pass of the blur filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlurProgram {
    pub frag_shader: Option<u32>,
    pub program: Option<ProgramId>,
    pub unifm_offset_x: Option<i32>,
    pub unifm_offset_y: Option<i32>,
    pub unifm_factor_center: Option<i32>,
}

impl BlurProgram {
    pub fn is_set(&self) -> bool {
        self.program.is_some() || self.frag_shader.is_some()
    }
}

/// A textured quad, already converted to GL coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexturedQuad {
    pub texture: TextureId,
    pub target: TextureTarget,
    pub src_x: i32,
    pub src_y: i32,
    /// Bottom-left corner of the painted rectangle
    pub dst_x: i32,
    pub dst_y: i32,
    pub width: u32,
    pub height: u32,
    pub opacity: f64,
    pub y_inverted: bool,
    /// Blend a second texture in the same pass
    pub dual_texture: bool,
}

/// Operations the GLX layer needs from the drawing library
pub trait DrawPrimitives {
    /// Draw `quad` clipped to `region` (GL coordinates)
    fn draw_quad(&mut self, quad: &TexturedQuad, region: &Region);

    /// The target surface changed size
    fn resize(&mut self, width: u32, height: u32);

    fn free_window_program(&mut self, program: &mut WindowProgram);
    fn free_blur_program(&mut self, program: &mut BlurProgram);
}

/// Drawing library stand-in that only logs; used by the probe tool
#[derive(Debug, Default)]
pub struct NullPainter {
    draws: usize,
    size: (u32, u32),
}

impl NullPainter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draws(&self) -> usize {
        self.draws
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

impl DrawPrimitives for NullPainter {
    fn draw_quad(&mut self, quad: &TexturedQuad, region: &Region) {
        self.draws += 1;
        trace!(
            "draw texture {:?} at ({}, {}) {}x{} over {} rects",
            quad.texture,
            quad.dst_x,
            quad.dst_y,
            quad.width,
            quad.height,
            region.len()
        );
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn free_window_program(&mut self, program: &mut WindowProgram) {
        *program = WindowProgram::default();
    }

    fn free_blur_program(&mut self, program: &mut BlurProgram) {
        *program = BlurProgram::default();
    }
}
