//! Xlib/GLX driver loaded at runtime
//!
//! `libGL.so.1`, `libX11.so.6` and `libXcomposite.so.1` are opened with
//! `libloading` and the handful of entry points the backend needs are copied
//! out of them. GL entry points are resolved through `glXGetProcAddressARB`
//! and handed to the `gl` crate.
//!
//! Nothing here is thread safe. The display and the GL driver must stay on
//! the thread that opened them.

#![cfg(feature = "glx-dlopen")]

use anyhow::{bail, Context, Result};
use gl::types::{GLbitfield, GLchar, GLenum, GLint, GLsizei, GLuint};
use libc::{c_char, c_int, c_long, c_uint, c_ulong, c_void};
use libloading::Library;
use log::{debug, error, info, warn};
use std::ffi::{CStr, CString};
use std::ptr::{self, NonNull};
use std::rc::Rc;

use super::{
    consts, FbAttrib, GlDriver, GlxDisplay, GlxPixmap, TextureFormat, TextureId, TextureTarget,
    VisualAttrib, VisualId, XId,
};
use crate::context::ScreenInfo;

type XDisplay = c_void;
type XBool = c_int;
type GlxFbConfigPtr = *mut c_void;
type GlxContextPtr = *mut c_void;

const VISUAL_ID_MASK: c_long = 0x1;
const X_TRUE: XBool = 1;

#[repr(C)]
struct XVisualInfo {
    visual: *mut c_void,
    visualid: c_ulong,
    screen: c_int,
    depth: c_int,
    class: c_int,
    red_mask: c_ulong,
    green_mask: c_ulong,
    blue_mask: c_ulong,
    colormap_size: c_int,
    bits_per_rgb: c_int,
}

/// Entry point returned by `glXGetProcAddressARB`
pub type GlxProc = unsafe extern "C" fn();

type BindTexImageFn = unsafe extern "C" fn(*mut XDisplay, c_ulong, c_int, *const c_int);
type ReleaseTexImageFn = unsafe extern "C" fn(*mut XDisplay, c_ulong, c_int);
type TexEnviFn = unsafe extern "system" fn(GLenum, GLenum, GLint);

/// Loaded libraries and the symbols copied out of them
///
/// The function pointers are only valid while the libraries are loaded, so
/// both live in the same struct.
struct GlxLibrary {
    _libgl: Library,
    _libx11: Library,
    _libxcomposite: Library,

    x_open_display: unsafe extern "C" fn(*const c_char) -> *mut XDisplay,
    x_close_display: unsafe extern "C" fn(*mut XDisplay) -> c_int,
    x_default_screen: unsafe extern "C" fn(*mut XDisplay) -> c_int,
    x_root_window: unsafe extern "C" fn(*mut XDisplay, c_int) -> c_ulong,
    x_default_visual: unsafe extern "C" fn(*mut XDisplay, c_int) -> *mut c_void,
    x_visual_id_from_visual: unsafe extern "C" fn(*mut c_void) -> c_ulong,
    x_default_depth: unsafe extern "C" fn(*mut XDisplay, c_int) -> c_int,
    x_display_width: unsafe extern "C" fn(*mut XDisplay, c_int) -> c_int,
    x_display_height: unsafe extern "C" fn(*mut XDisplay, c_int) -> c_int,
    x_get_visual_info:
        unsafe extern "C" fn(*mut XDisplay, c_long, *mut XVisualInfo, *mut c_int) -> *mut XVisualInfo,
    x_free: unsafe extern "C" fn(*mut c_void) -> c_int,
    x_free_pixmap: unsafe extern "C" fn(*mut XDisplay, c_ulong) -> c_int,

    xcomposite_query_version: unsafe extern "C" fn(*mut XDisplay, *mut c_int, *mut c_int) -> c_int,
    xcomposite_name_window_pixmap: unsafe extern "C" fn(*mut XDisplay, c_ulong) -> c_ulong,
    xcomposite_get_overlay_window: unsafe extern "C" fn(*mut XDisplay, c_ulong) -> c_ulong,
    xcomposite_release_overlay_window: unsafe extern "C" fn(*mut XDisplay, c_ulong),

    glx_query_extension: unsafe extern "C" fn(*mut XDisplay, *mut c_int, *mut c_int) -> XBool,
    glx_query_extensions_string: unsafe extern "C" fn(*mut XDisplay, c_int) -> *const c_char,
    glx_get_config: unsafe extern "C" fn(*mut XDisplay, *mut XVisualInfo, c_int, *mut c_int) -> c_int,
    glx_get_fb_configs: unsafe extern "C" fn(*mut XDisplay, c_int, *mut c_int) -> *mut GlxFbConfigPtr,
    glx_get_fb_config_attrib:
        unsafe extern "C" fn(*mut XDisplay, GlxFbConfigPtr, c_int, *mut c_int) -> c_int,
    glx_get_visual_from_fb_config:
        unsafe extern "C" fn(*mut XDisplay, GlxFbConfigPtr) -> *mut XVisualInfo,
    glx_create_context:
        unsafe extern "C" fn(*mut XDisplay, *mut XVisualInfo, GlxContextPtr, XBool) -> GlxContextPtr,
    glx_destroy_context: unsafe extern "C" fn(*mut XDisplay, GlxContextPtr),
    glx_make_current: unsafe extern "C" fn(*mut XDisplay, c_ulong, GlxContextPtr) -> XBool,
    glx_get_proc_address: unsafe extern "C" fn(*const u8) -> Option<GlxProc>,
    glx_create_pixmap:
        unsafe extern "C" fn(*mut XDisplay, GlxFbConfigPtr, c_ulong, *const c_int) -> c_ulong,
    glx_destroy_pixmap: unsafe extern "C" fn(*mut XDisplay, c_ulong),
    glx_swap_buffers: unsafe extern "C" fn(*mut XDisplay, c_ulong),
    glx_query_drawable: unsafe extern "C" fn(*mut XDisplay, c_ulong, c_int, *mut c_uint),
}

fn open_library(name: &str) -> Result<Library> {
    unsafe { Library::new(name) }.with_context(|| format!("Failed to load {}", name))
}

fn symbol<T: Copy>(lib: &Library, name: &str) -> Result<T> {
    let cname = format!("{}\0", name);
    let sym = unsafe { lib.get::<T>(cname.as_bytes()) }
        .with_context(|| format!("Missing symbol {}", name))?;
    Ok(*sym)
}

impl GlxLibrary {
    fn load() -> Result<Self> {
        let libgl = open_library("libGL.so.1")?;
        let libx11 = open_library("libX11.so.6")?;
        let libxcomposite = open_library("libXcomposite.so.1")?;

        let lib = Self {
            x_open_display: symbol(&libx11, "XOpenDisplay")?,
            x_close_display: symbol(&libx11, "XCloseDisplay")?,
            x_default_screen: symbol(&libx11, "XDefaultScreen")?,
            x_root_window: symbol(&libx11, "XRootWindow")?,
            x_default_visual: symbol(&libx11, "XDefaultVisual")?,
            x_visual_id_from_visual: symbol(&libx11, "XVisualIDFromVisual")?,
            x_default_depth: symbol(&libx11, "XDefaultDepth")?,
            x_display_width: symbol(&libx11, "XDisplayWidth")?,
            x_display_height: symbol(&libx11, "XDisplayHeight")?,
            x_get_visual_info: symbol(&libx11, "XGetVisualInfo")?,
            x_free: symbol(&libx11, "XFree")?,
            x_free_pixmap: symbol(&libx11, "XFreePixmap")?,

            xcomposite_query_version: symbol(&libxcomposite, "XCompositeQueryVersion")?,
            xcomposite_name_window_pixmap: symbol(&libxcomposite, "XCompositeNameWindowPixmap")?,
            xcomposite_get_overlay_window: symbol(&libxcomposite, "XCompositeGetOverlayWindow")?,
            xcomposite_release_overlay_window: symbol(
                &libxcomposite,
                "XCompositeReleaseOverlayWindow",
            )?,

            glx_query_extension: symbol(&libgl, "glXQueryExtension")?,
            glx_query_extensions_string: symbol(&libgl, "glXQueryExtensionsString")?,
            glx_get_config: symbol(&libgl, "glXGetConfig")?,
            glx_get_fb_configs: symbol(&libgl, "glXGetFBConfigs")?,
            glx_get_fb_config_attrib: symbol(&libgl, "glXGetFBConfigAttrib")?,
            glx_get_visual_from_fb_config: symbol(&libgl, "glXGetVisualFromFBConfig")?,
            glx_create_context: symbol(&libgl, "glXCreateContext")?,
            glx_destroy_context: symbol(&libgl, "glXDestroyContext")?,
            glx_make_current: symbol(&libgl, "glXMakeCurrent")?,
            glx_get_proc_address: symbol(&libgl, "glXGetProcAddressARB")?,
            glx_create_pixmap: symbol(&libgl, "glXCreatePixmap")?,
            glx_destroy_pixmap: symbol(&libgl, "glXDestroyPixmap")?,
            glx_swap_buffers: symbol(&libgl, "glXSwapBuffers")?,
            glx_query_drawable: symbol(&libgl, "glXQueryDrawable")?,

            _libgl: libgl,
            _libx11: libx11,
            _libxcomposite: libxcomposite,
        };
        Ok(lib)
    }

    fn proc_address(&self, name: &str) -> Option<GlxProc> {
        let cname = CString::new(name).ok()?;
        unsafe { (self.glx_get_proc_address)(cname.as_ptr() as *const u8) }
    }
}

/// `XVisualInfo` returned by Xlib, freed on drop
pub struct XlibVisual {
    lib: Rc<GlxLibrary>,
    info: NonNull<XVisualInfo>,
}

impl XlibVisual {
    pub fn depth(&self) -> i32 {
        unsafe { self.info.as_ref().depth }
    }
}

impl Drop for XlibVisual {
    fn drop(&mut self) {
        unsafe {
            (self.lib.x_free)(self.info.as_ptr() as *mut c_void);
        }
    }
}

/// GLX context handle
#[derive(Debug)]
pub struct XlibContext(GlxContextPtr);

/// Connection to an X server with GLX
pub struct XlibDisplay {
    lib: Rc<GlxLibrary>,
    dpy: NonNull<XDisplay>,
    screen: c_int,
    named_window_pixmaps: bool,
    overlay: Option<XId>,
}

impl XlibDisplay {
    /// Connect to `name`, or `$DISPLAY` when `None`
    ///
    /// With `use_overlay` the composite overlay window is claimed and becomes
    /// the render target.
    pub fn open(name: Option<&str>, use_overlay: bool) -> Result<Self> {
        let lib = Rc::new(GlxLibrary::load()?);

        let cname = name.map(CString::new).transpose().context("Invalid display name")?;
        let raw = unsafe { (lib.x_open_display)(cname.as_ref().map_or(ptr::null(), |c| c.as_ptr())) };
        let Some(dpy) = NonNull::new(raw) else {
            bail!("Can't open display {}", name.unwrap_or("$DISPLAY"));
        };
        let screen = unsafe { (lib.x_default_screen)(dpy.as_ptr()) };

        let (mut major, mut minor) = (0, 0);
        let has_composite =
            unsafe { (lib.xcomposite_query_version)(dpy.as_ptr(), &mut major, &mut minor) } != 0;
        if !has_composite {
            warn!("Composite extension not available");
        }
        let named_window_pixmaps = has_composite && (major > 0 || minor >= 2);
        debug!("Composite {}.{}, named window pixmaps {}", major, minor, named_window_pixmaps);

        let mut display = Self {
            lib,
            dpy,
            screen,
            named_window_pixmaps,
            overlay: None,
        };

        if use_overlay && has_composite {
            let root = display.root();
            let overlay =
                unsafe { (display.lib.xcomposite_get_overlay_window)(display.raw(), root as c_ulong) };
            if overlay == 0 {
                warn!("Cannot get X Composite overlay window, falling back to root");
            } else {
                display.overlay = Some(overlay as XId);
            }
        }

        info!(
            "Opened display {} (screen {})",
            name.unwrap_or("$DISPLAY"),
            display.screen
        );
        Ok(display)
    }

    fn raw(&self) -> *mut XDisplay {
        self.dpy.as_ptr()
    }

    pub fn root(&self) -> XId {
        unsafe { (self.lib.x_root_window)(self.raw(), self.screen) as XId }
    }

    /// Geometry and visual of the default screen
    pub fn screen_info(&self) -> ScreenInfo {
        unsafe {
            let visual = (self.lib.x_default_visual)(self.raw(), self.screen);
            ScreenInfo {
                root: self.root(),
                overlay: self.overlay,
                visual: (self.lib.x_visual_id_from_visual)(visual) as VisualId,
                depth: (self.lib.x_default_depth)(self.raw(), self.screen).clamp(0, 255) as u8,
                width: (self.lib.x_display_width)(self.raw(), self.screen).max(0) as u32,
                height: (self.lib.x_display_height)(self.raw(), self.screen).max(0) as u32,
            }
        }
    }

    /// Resolve an entry point as a raw pointer, for `gl::load_with`
    fn raw_proc_address(&self, name: &str) -> *const c_void {
        self.lib
            .proc_address(name)
            .map_or(ptr::null(), |f| f as *const c_void)
    }
}

/// Call a resolved `glXBindTexImageEXT` on the front-left buffer of `pixmap`
///
/// # Safety
///
/// `entry` must be `glXBindTexImageEXT` and `dpy` a live display.
unsafe fn bind_tex_image_raw(entry: GlxProc, dpy: *mut XDisplay, pixmap: GlxPixmap) {
    let entry = std::mem::transmute::<GlxProc, BindTexImageFn>(entry);
    entry(dpy, pixmap.0 as c_ulong, consts::GLX_FRONT_LEFT_EXT, ptr::null());
}

/// Call a resolved `glXReleaseTexImageEXT`, which takes no attribute list
///
/// # Safety
///
/// `entry` must be `glXReleaseTexImageEXT` and `dpy` a live display.
unsafe fn release_tex_image_raw(entry: GlxProc, dpy: *mut XDisplay, pixmap: GlxPixmap) {
    let entry = std::mem::transmute::<GlxProc, ReleaseTexImageFn>(entry);
    entry(dpy, pixmap.0 as c_ulong, consts::GLX_FRONT_LEFT_EXT);
}

impl Drop for XlibDisplay {
    fn drop(&mut self) {
        unsafe {
            if let Some(overlay) = self.overlay.take() {
                (self.lib.xcomposite_release_overlay_window)(self.raw(), overlay as c_ulong);
            }
            (self.lib.x_close_display)(self.raw());
        }
    }
}

impl GlxDisplay for XlibDisplay {
    type FbConfig = GlxFbConfigPtr;
    type Visual = XlibVisual;
    type Context = XlibContext;
    type Proc = GlxProc;

    fn query_extension(&self) -> bool {
        let (mut error_base, mut event_base) = (0, 0);
        unsafe { (self.lib.glx_query_extension)(self.raw(), &mut error_base, &mut event_base) != 0 }
    }

    fn extensions_string(&self) -> Option<String> {
        let list = unsafe { (self.lib.glx_query_extensions_string)(self.raw(), self.screen) };
        if list.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(list) }.to_string_lossy().into_owned())
    }

    fn visual_info(&self, visual: VisualId) -> Option<XlibVisual> {
        let mut template = XVisualInfo {
            visual: ptr::null_mut(),
            visualid: visual as c_ulong,
            screen: 0,
            depth: 0,
            class: 0,
            red_mask: 0,
            green_mask: 0,
            blue_mask: 0,
            colormap_size: 0,
            bits_per_rgb: 0,
        };
        let mut count = 0;
        let info = unsafe {
            (self.lib.x_get_visual_info)(self.raw(), VISUAL_ID_MASK, &mut template, &mut count)
        };
        NonNull::new(info).map(|info| XlibVisual {
            lib: Rc::clone(&self.lib),
            info,
        })
    }

    fn visual_attrib(&self, visual: &XlibVisual, attrib: VisualAttrib) -> Option<i32> {
        let mut value = 0;
        let status = unsafe {
            (self.lib.glx_get_config)(self.raw(), visual.info.as_ptr(), attrib.glx_enum(), &mut value)
        };
        (status == 0).then_some(value)
    }

    fn fb_configs(&self) -> Vec<GlxFbConfigPtr> {
        let mut count = 0;
        let list = unsafe { (self.lib.glx_get_fb_configs)(self.raw(), self.screen, &mut count) };
        if list.is_null() || count <= 0 {
            return Vec::new();
        }
        let configs = unsafe { std::slice::from_raw_parts(list, count as usize) }.to_vec();
        unsafe {
            (self.lib.x_free)(list as *mut c_void);
        }
        configs
    }

    fn fb_config_attrib(&self, config: GlxFbConfigPtr, attrib: FbAttrib) -> Option<i32> {
        let mut value = 0;
        let status = unsafe {
            (self.lib.glx_get_fb_config_attrib)(self.raw(), config, attrib.glx_enum(), &mut value)
        };
        (status == 0).then_some(value)
    }

    fn fb_config_visual_depth(&self, config: GlxFbConfigPtr) -> Option<i32> {
        let info = unsafe { (self.lib.glx_get_visual_from_fb_config)(self.raw(), config) };
        NonNull::new(info).map(|info| {
            XlibVisual {
                lib: Rc::clone(&self.lib),
                info,
            }
            .depth()
        })
    }

    fn create_context(&self, visual: &XlibVisual) -> Option<XlibContext> {
        let context = unsafe {
            (self.lib.glx_create_context)(self.raw(), visual.info.as_ptr(), ptr::null_mut(), X_TRUE)
        };
        (!context.is_null()).then_some(XlibContext(context))
    }

    fn destroy_context(&self, context: XlibContext) {
        unsafe {
            (self.lib.glx_make_current)(self.raw(), 0, ptr::null_mut());
            (self.lib.glx_destroy_context)(self.raw(), context.0);
        }
    }

    fn make_current(&self, drawable: XId, context: &XlibContext) -> bool {
        unsafe { (self.lib.glx_make_current)(self.raw(), drawable as c_ulong, context.0) != 0 }
    }

    fn get_proc_address(&self, name: &str) -> Option<GlxProc> {
        self.lib.proc_address(name)
    }

    fn bind_tex_image(&self, entry: GlxProc, pixmap: GlxPixmap) {
        unsafe { bind_tex_image_raw(entry, self.raw(), pixmap) }
    }

    fn release_tex_image(&self, entry: GlxProc, pixmap: GlxPixmap) {
        unsafe { release_tex_image_raw(entry, self.raw(), pixmap) }
    }

    fn create_glx_pixmap(
        &self,
        config: GlxFbConfigPtr,
        pixmap: XId,
        format: TextureFormat,
        target: TextureTarget,
    ) -> Option<GlxPixmap> {
        let attribs = [
            consts::GLX_TEXTURE_FORMAT_EXT,
            format.glx_enum(),
            consts::GLX_TEXTURE_TARGET_EXT,
            target.glx_enum(),
            0,
        ];
        let glx_pixmap = unsafe {
            (self.lib.glx_create_pixmap)(self.raw(), config, pixmap as c_ulong, attribs.as_ptr())
        };
        (glx_pixmap != 0).then_some(GlxPixmap(glx_pixmap as XId))
    }

    fn destroy_glx_pixmap(&self, pixmap: GlxPixmap) {
        unsafe { (self.lib.glx_destroy_pixmap)(self.raw(), pixmap.0 as c_ulong) }
    }

    fn can_name_window_pixmap(&self) -> bool {
        self.named_window_pixmaps
    }

    fn name_window_pixmap(&self, window: XId) -> Option<XId> {
        let pixmap =
            unsafe { (self.lib.xcomposite_name_window_pixmap)(self.raw(), window as c_ulong) };
        (pixmap != 0).then_some(pixmap as XId)
    }

    fn free_pixmap(&self, pixmap: XId) {
        unsafe {
            (self.lib.x_free_pixmap)(self.raw(), pixmap as c_ulong);
        }
    }

    fn swap_buffers(&self, drawable: XId) {
        unsafe { (self.lib.glx_swap_buffers)(self.raw(), drawable as c_ulong) }
    }

    fn query_buffer_age(&self, drawable: XId) -> u32 {
        let mut age: c_uint = 0;
        unsafe {
            (self.lib.glx_query_drawable)(
                self.raw(),
                drawable as c_ulong,
                consts::GLX_BACK_BUFFER_AGE_EXT,
                &mut age,
            );
        }
        age
    }
}

/// GL entry points loaded through `glXGetProcAddressARB`
pub struct DlopenGl {
    tex_envi: Option<TexEnviFn>,
}

impl DlopenGl {
    /// Load GL entry points via `display`.
    ///
    /// GLX entry points do not depend on the current context, so this may run
    /// before the context is created.
    pub fn load(display: &XlibDisplay) -> Self {
        gl::load_with(|name| display.raw_proc_address(name));
        let tex_envi = display
            .lib
            .proc_address("glTexEnvi")
            .map(|f| unsafe { std::mem::transmute::<GlxProc, TexEnviFn>(f) });
        if tex_envi.is_none() {
            warn!("glTexEnvi unavailable, texture environment left at its default");
        }
        Self { tex_envi }
    }
}

impl GlDriver for DlopenGl {
    fn extensions(&self) -> String {
        let list = unsafe { gl::GetString(gl::EXTENSIONS) };
        if list.is_null() {
            return String::new();
        }
        unsafe { CStr::from_ptr(list as *const c_char) }
            .to_string_lossy()
            .into_owned()
    }

    fn get_integer(&self, pname: GLenum) -> GLint {
        let mut value = 0;
        unsafe { gl::GetIntegerv(pname, &mut value) };
        value
    }

    fn get_error(&self) -> GLenum {
        unsafe { gl::GetError() }
    }

    fn gen_texture(&self) -> Option<TextureId> {
        let mut texture = 0;
        unsafe { gl::GenTextures(1, &mut texture) };
        (texture != 0).then_some(TextureId(texture))
    }

    fn delete_texture(&self, texture: TextureId) {
        unsafe { gl::DeleteTextures(1, &texture.0) };
    }

    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureId>) {
        unsafe { gl::BindTexture(target.gl_enum(), texture.map_or(0, |t| t.0)) };
    }

    fn tex_parameter(&self, target: TextureTarget, pname: GLenum, value: GLint) {
        unsafe { gl::TexParameteri(target.gl_enum(), pname, value) };
    }

    fn enable(&self, cap: GLenum) {
        unsafe { gl::Enable(cap) };
    }

    fn disable(&self, cap: GLenum) {
        unsafe { gl::Disable(cap) };
    }

    fn depth_mask(&self, flag: bool) {
        unsafe { gl::DepthMask(if flag { gl::TRUE } else { gl::FALSE }) };
    }

    fn tex_env_mode(&self, mode: GLenum) {
        if let Some(tex_envi) = self.tex_envi {
            unsafe { tex_envi(consts::GL_TEXTURE_ENV, consts::GL_TEXTURE_ENV_MODE, mode as GLint) };
        }
    }

    fn clear(&self, mask: GLbitfield) {
        unsafe { gl::Clear(mask) };
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        unsafe { gl::ClearColor(red, green, blue, alpha) };
    }

    fn stencil_mask(&self, mask: GLuint) {
        unsafe { gl::StencilMask(mask) };
    }

    fn stencil_func(&self, func: GLenum, reference: GLint, mask: GLuint) {
        unsafe { gl::StencilFunc(func, reference, mask) };
    }

    fn install_debug_callback(&self) -> bool {
        if !gl::DebugMessageCallback::is_loaded() {
            return false;
        }
        unsafe {
            gl::Enable(gl::DEBUG_OUTPUT);
            gl::DebugMessageCallback(Some(gl_debug_callback), ptr::null());
        }
        true
    }
}

extern "system" fn gl_debug_callback(
    source: GLenum,
    kind: GLenum,
    id: GLuint,
    severity: GLenum,
    _length: GLsizei,
    message: *const GLchar,
    _user: *mut c_void,
) {
    if message.is_null() {
        return;
    }
    let message = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    match severity {
        gl::DEBUG_SEVERITY_HIGH => {
            error!("GL debug [{:#x}/{:#x}/{}]: {}", source, kind, id, message)
        }
        gl::DEBUG_SEVERITY_MEDIUM => {
            warn!("GL debug [{:#x}/{:#x}/{}]: {}", source, kind, id, message)
        }
        _ => debug!("GL debug [{:#x}/{:#x}/{}]: {}", source, kind, id, message),
    }
}
