//! Numeric GLX and legacy GL tokens
//!
//! The `gl` crate only generates core-profile tokens, so the fixed-function
//! and GLX values used by the backend live here.

#![allow(dead_code)]

use gl::types::GLenum;

pub const GLX_USE_GL: i32 = 1;
pub const GLX_BUFFER_SIZE: i32 = 2;
pub const GLX_DOUBLEBUFFER: i32 = 5;
pub const GLX_RED_SIZE: i32 = 8;
pub const GLX_ALPHA_SIZE: i32 = 11;
pub const GLX_DEPTH_SIZE: i32 = 12;
pub const GLX_STENCIL_SIZE: i32 = 13;
pub const GLX_SAMPLES: i32 = 100_001;

// GLX_EXT_texture_from_pixmap
pub const GLX_BIND_TO_TEXTURE_RGB_EXT: i32 = 0x20D0;
pub const GLX_BIND_TO_TEXTURE_RGBA_EXT: i32 = 0x20D1;
pub const GLX_BIND_TO_MIPMAP_TEXTURE_EXT: i32 = 0x20D2;
pub const GLX_BIND_TO_TEXTURE_TARGETS_EXT: i32 = 0x20D3;
pub const GLX_Y_INVERTED_EXT: i32 = 0x20D4;
pub const GLX_TEXTURE_FORMAT_EXT: i32 = 0x20D5;
pub const GLX_TEXTURE_TARGET_EXT: i32 = 0x20D6;
pub const GLX_TEXTURE_FORMAT_NONE_EXT: i32 = 0x20D8;
pub const GLX_TEXTURE_FORMAT_RGB_EXT: i32 = 0x20D9;
pub const GLX_TEXTURE_FORMAT_RGBA_EXT: i32 = 0x20DA;
pub const GLX_TEXTURE_1D_BIT_EXT: u32 = 0x1;
pub const GLX_TEXTURE_2D_BIT_EXT: u32 = 0x2;
pub const GLX_TEXTURE_RECTANGLE_BIT_EXT: u32 = 0x4;
pub const GLX_TEXTURE_1D_EXT: i32 = 0x20DB;
pub const GLX_TEXTURE_2D_EXT: i32 = 0x20DC;
pub const GLX_TEXTURE_RECTANGLE_EXT: i32 = 0x20DD;
pub const GLX_FRONT_LEFT_EXT: i32 = 0x20DE;

// GLX_EXT_buffer_age
pub const GLX_BACK_BUFFER_AGE_EXT: i32 = 0x20F4;

// Compatibility-profile GL tokens
pub const GL_STENCIL_BITS: GLenum = 0x0D57;
pub const GL_TEXTURE_ENV: GLenum = 0x2300;
pub const GL_TEXTURE_ENV_MODE: GLenum = 0x2200;
