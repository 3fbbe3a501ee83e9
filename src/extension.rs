//! Extension probing and entry point resolution

use log::{error, info};

use crate::driver::GlxDisplay;
use crate::error::{GlxError, GlxResult};

/// Required for binding pixmaps to textures
pub const GLX_EXT_TEXTURE_FROM_PIXMAP: &str = "GLX_EXT_texture_from_pixmap";

/// Lets window textures use `GL_TEXTURE_2D` at arbitrary sizes
pub const GL_ARB_TEXTURE_NON_POWER_OF_TWO: &str = "GL_ARB_texture_non_power_of_two";

pub const BIND_TEX_IMAGE: &str = "glXBindTexImageEXT";
pub const RELEASE_TEX_IMAGE: &str = "glXReleaseTexImageEXT";

/// Exact-token lookup in a space separated extension list.
///
/// A name that is only a prefix of an advertised extension does not match.
pub fn has_extension(list: &str, name: &str) -> bool {
    list.split_ascii_whitespace().any(|ext| ext == name)
}

/// The two `GLX_EXT_texture_from_pixmap` entry points, resolved once
#[derive(Debug, Clone, Copy)]
pub struct TexImageFns<P> {
    pub bind: P,
    pub release: P,
}

/// Queries a display for extensions and entry points
pub struct ExtensionProbe<'a, D: GlxDisplay> {
    display: &'a D,
}

impl<'a, D: GlxDisplay> ExtensionProbe<'a, D> {
    pub fn new(display: &'a D) -> Self {
        Self { display }
    }

    /// Check if a GLX extension exists
    pub fn has_glx_extension(&self, name: &str) -> bool {
        let Some(list) = self.display.extensions_string() else {
            error!("Failed to get GLX extension list.");
            return false;
        };

        if !has_extension(&list, name) {
            info!("Missing GLX extension {}.", name);
            return false;
        }
        true
    }

    /// Resolve a single entry point by name
    pub fn resolve(&self, name: &str) -> GlxResult<D::Proc> {
        self.display
            .get_proc_address(name)
            .ok_or_else(|| GlxError::EntryPointUnresolved(name.to_string()))
    }

    /// Resolve `glXBindTexImageEXT` and `glXReleaseTexImageEXT`
    pub fn resolve_tex_image_fns(&self) -> GlxResult<TexImageFns<D::Proc>> {
        let fns = self
            .resolve(BIND_TEX_IMAGE)
            .and_then(|bind| Ok(TexImageFns { bind, release: self.resolve(RELEASE_TEX_IMAGE)? }));
        if let Err(ref e) = fns {
            error!(
                "Failed to acquire glXBindTexImageEXT() and/or glXReleaseTexImageEXT(), \
                 make sure your OpenGL supports {} ({})",
                GLX_EXT_TEXTURE_FROM_PIXMAP, e
            );
        }
        fns
    }
}
