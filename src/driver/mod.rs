//! Driver boundary for the GLX backend
//!
//! The backend never talks to Xlib or GL directly. Everything it needs from
//! the windowing-system connection goes through [`GlxDisplay`], and every GL
//! state call goes through [`GlDriver`]. The real implementation lives in
//! [`dlopen`] (feature `glx-dlopen`); tests provide recording fakes.
//!
//! All calls are synchronous and must happen on the thread that owns the
//! current GL context.

use gl::types::{GLbitfield, GLenum, GLint, GLuint};
use log::error;
use std::fmt;

use crate::extension;

pub mod consts;

#[cfg(feature = "glx-dlopen")]
pub mod dlopen;

/// X resource identifier (window, pixmap, drawable)
pub type XId = u32;

/// X visual identifier
pub type VisualId = u32;

/// GLX-side pixmap bridging a native pixmap to a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlxPixmap(pub XId);

/// GL texture object name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub GLuint);

/// Texture format a pixmap is bound with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    #[default]
    None,
    Rgb,
    Rgba,
}

impl TextureFormat {
    /// `GLX_TEXTURE_FORMAT_*_EXT` value
    pub fn glx_enum(self) -> i32 {
        match self {
            TextureFormat::None => consts::GLX_TEXTURE_FORMAT_NONE_EXT,
            TextureFormat::Rgb => consts::GLX_TEXTURE_FORMAT_RGB_EXT,
            TextureFormat::Rgba => consts::GLX_TEXTURE_FORMAT_RGBA_EXT,
        }
    }
}

/// Texture target a window texture is created for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Texture2D,
    Rectangle,
}

impl TextureTarget {
    /// GL binding point
    pub fn gl_enum(self) -> GLenum {
        match self {
            TextureTarget::Texture2D => gl::TEXTURE_2D,
            TextureTarget::Rectangle => gl::TEXTURE_RECTANGLE,
        }
    }

    /// `GLX_TEXTURE_*_EXT` value passed to `glXCreatePixmap`
    pub fn glx_enum(self) -> i32 {
        match self {
            TextureTarget::Texture2D => consts::GLX_TEXTURE_2D_EXT,
            TextureTarget::Rectangle => consts::GLX_TEXTURE_RECTANGLE_EXT,
        }
    }
}

impl fmt::Display for TextureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.glx_enum())
    }
}

/// FBConfig attributes the backend queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FbAttrib {
    Samples,
    BufferSize,
    AlphaSize,
    RedSize,
    DoubleBuffer,
    StencilSize,
    DepthSize,
    BindToTextureRgb,
    BindToTextureRgba,
    BindToMipmapTexture,
    BindToTextureTargets,
    YInverted,
}

impl FbAttrib {
    pub fn glx_enum(self) -> i32 {
        match self {
            FbAttrib::Samples => consts::GLX_SAMPLES,
            FbAttrib::BufferSize => consts::GLX_BUFFER_SIZE,
            FbAttrib::AlphaSize => consts::GLX_ALPHA_SIZE,
            FbAttrib::RedSize => consts::GLX_RED_SIZE,
            FbAttrib::DoubleBuffer => consts::GLX_DOUBLEBUFFER,
            FbAttrib::StencilSize => consts::GLX_STENCIL_SIZE,
            FbAttrib::DepthSize => consts::GLX_DEPTH_SIZE,
            FbAttrib::BindToTextureRgb => consts::GLX_BIND_TO_TEXTURE_RGB_EXT,
            FbAttrib::BindToTextureRgba => consts::GLX_BIND_TO_TEXTURE_RGBA_EXT,
            FbAttrib::BindToMipmapTexture => consts::GLX_BIND_TO_MIPMAP_TEXTURE_EXT,
            FbAttrib::BindToTextureTargets => consts::GLX_BIND_TO_TEXTURE_TARGETS_EXT,
            FbAttrib::YInverted => consts::GLX_Y_INVERTED_EXT,
        }
    }
}

/// Visual attributes checked before creating the context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualAttrib {
    UseGl,
    DoubleBuffer,
}

impl VisualAttrib {
    pub fn glx_enum(self) -> i32 {
        match self {
            VisualAttrib::UseGl => consts::GLX_USE_GL,
            VisualAttrib::DoubleBuffer => consts::GLX_DOUBLEBUFFER,
        }
    }
}

/// Windowing-system connection as seen by the backend
///
/// Attribute queries return `None` when the server reports anything other
/// than `Success`.
pub trait GlxDisplay {
    /// Opaque FBConfig handle
    type FbConfig: Copy + fmt::Debug;
    /// Resolved visual description, released when dropped
    type Visual;
    /// GL context handle
    type Context;
    /// Dynamically resolved entry point
    type Proc: Copy;

    /// Whether the server supports the GLX extension at all
    fn query_extension(&self) -> bool;

    /// Space separated GLX extension list for the screen
    fn extensions_string(&self) -> Option<String>;

    fn visual_info(&self, visual: VisualId) -> Option<Self::Visual>;
    fn visual_attrib(&self, visual: &Self::Visual, attrib: VisualAttrib) -> Option<i32>;

    fn fb_configs(&self) -> Vec<Self::FbConfig>;
    fn fb_config_attrib(&self, config: Self::FbConfig, attrib: FbAttrib) -> Option<i32>;
    /// Depth of the X visual associated with the config, if it has one
    fn fb_config_visual_depth(&self, config: Self::FbConfig) -> Option<i32>;

    fn create_context(&self, visual: &Self::Visual) -> Option<Self::Context>;
    fn destroy_context(&self, context: Self::Context);
    fn make_current(&self, drawable: XId, context: &Self::Context) -> bool;

    fn get_proc_address(&self, name: &str) -> Option<Self::Proc>;
    /// Invoke a resolved `glXBindTexImageEXT` on the front-left buffer
    fn bind_tex_image(&self, entry: Self::Proc, pixmap: GlxPixmap);
    /// Invoke a resolved `glXReleaseTexImageEXT` on the front-left buffer
    fn release_tex_image(&self, entry: Self::Proc, pixmap: GlxPixmap);

    fn create_glx_pixmap(
        &self,
        config: Self::FbConfig,
        pixmap: XId,
        format: TextureFormat,
        target: TextureTarget,
    ) -> Option<GlxPixmap>;
    fn destroy_glx_pixmap(&self, pixmap: GlxPixmap);

    /// Whether windows need a named pixmap (Composite >= 0.2) instead of
    /// their own id
    fn can_name_window_pixmap(&self) -> bool;
    fn name_window_pixmap(&self, window: XId) -> Option<XId>;
    fn free_pixmap(&self, pixmap: XId);

    fn swap_buffers(&self, drawable: XId);
    /// `GLX_BACK_BUFFER_AGE_EXT` of the drawable, 0 when unknown
    fn query_buffer_age(&self, drawable: XId) -> u32;
}

/// GL entry points used by the backend
pub trait GlDriver {
    /// Space separated GL extension list of the current context
    fn extensions(&self) -> String;
    fn get_integer(&self, pname: GLenum) -> GLint;
    fn get_error(&self) -> GLenum;

    fn gen_texture(&self) -> Option<TextureId>;
    fn delete_texture(&self, texture: TextureId);
    /// Bind `texture` to `target`, or unbind when `None`
    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureId>);
    fn tex_parameter(&self, target: TextureTarget, pname: GLenum, value: GLint);

    fn enable(&self, cap: GLenum);
    fn disable(&self, cap: GLenum);
    fn depth_mask(&self, flag: bool);
    fn tex_env_mode(&self, mode: GLenum);
    fn clear(&self, mask: GLbitfield);
    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32);
    fn stencil_mask(&self, mask: GLuint);
    fn stencil_func(&self, func: GLenum, reference: GLint, mask: GLuint);

    /// Install a debug message callback; returns false when unsupported
    fn install_debug_callback(&self) -> bool;

    fn has_extension(&self, name: &str) -> bool {
        extension::has_extension(&self.extensions(), name)
    }

    /// Drain and log pending GL errors, returning how many were seen
    fn check_errors(&self, site: &str) -> usize {
        let mut count = 0;
        while count < MAX_DRAINED_ERRORS {
            let err = self.get_error();
            if err == gl::NO_ERROR {
                break;
            }
            error!("GLX: {} ({:#06x}) in {}", gl_error_name(err), err, site);
            count += 1;
        }
        count
    }
}

/// Upper bound on errors drained per check; a lost context can report forever
const MAX_DRAINED_ERRORS: usize = 16;

/// Symbolic name of a GL error code
pub fn gl_error_name(err: GLenum) -> &'static str {
    match err {
        gl::NO_ERROR => "GL_NO_ERROR",
        gl::INVALID_ENUM => "GL_INVALID_ENUM",
        gl::INVALID_VALUE => "GL_INVALID_VALUE",
        gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
        gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        gl::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        gl::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        _ => "unknown GL error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_target_enums() {
        assert_eq!(TextureTarget::Texture2D.gl_enum(), gl::TEXTURE_2D);
        assert_eq!(TextureTarget::Rectangle.gl_enum(), gl::TEXTURE_RECTANGLE);
        assert_eq!(TextureTarget::Texture2D.glx_enum(), 0x20DC);
        assert_eq!(TextureTarget::Rectangle.glx_enum(), 0x20DD);
    }

    #[test]
    fn test_texture_format_enums() {
        assert_eq!(TextureFormat::Rgb.glx_enum(), 0x20D9);
        assert_eq!(TextureFormat::Rgba.glx_enum(), 0x20DA);
        assert_eq!(TextureFormat::default(), TextureFormat::None);
    }

    #[test]
    fn test_gl_error_names() {
        assert_eq!(gl_error_name(gl::INVALID_ENUM), "GL_INVALID_ENUM");
        assert_eq!(gl_error_name(gl::OUT_OF_MEMORY), "GL_OUT_OF_MEMORY");
        assert_eq!(gl_error_name(0xdead), "unknown GL error");
    }
}
