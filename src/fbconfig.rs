//! Framebuffer configuration selection
//!
//! Every FBConfig the display reports is checked for texture-from-pixmap
//! support and registered under the color depth it can bind. When several
//! configs compete for one depth, [`compare`] decides which one is kept.
//!
//! # Ranking
//!
//! Configs with `red_size != 8` never win (10-bit color is avoided). Among
//! the rest the first differing attribute decides, in this order:
//!
//! | attribute                       | preferred |
//! |---------------------------------|-----------|
//! | `GLX_BIND_TO_TEXTURE_RGBA_EXT`  | lower     |
//! | `GLX_DOUBLEBUFFER`              | lower     |
//! | `GLX_STENCIL_SIZE`              | lower     |
//! | `GLX_DEPTH_SIZE`                | lower     |
//! | `GLX_BIND_TO_MIPMAP_TEXTURE_EXT`| higher    |

use log::{debug, error, warn};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::driver::{consts, FbAttrib, GlxDisplay, TextureFormat, TextureTarget};
use crate::error::{GlxError, GlxResult};

/// Highest color depth a config is registered for
pub const MAX_DEPTH: u8 = 32;

/// Depth of ARGB windows; a missing config here is only a warning
pub const ARGB_DEPTH: u8 = 32;

/// `GLX_BIND_TO_TEXTURE_TARGETS_EXT` bitmask
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureTargets(u32);

impl TextureTargets {
    pub const TEXTURE_1D: TextureTargets = TextureTargets(consts::GLX_TEXTURE_1D_BIT_EXT);
    pub const TEXTURE_2D: TextureTargets = TextureTargets(consts::GLX_TEXTURE_2D_BIT_EXT);
    pub const RECTANGLE: TextureTargets = TextureTargets(consts::GLX_TEXTURE_RECTANGLE_BIT_EXT);

    pub const fn from_bits(bits: u32) -> Self {
        TextureTargets(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: TextureTargets) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: TextureTargets) -> Self {
        TextureTargets(self.0 | other.0)
    }
}

impl fmt::Debug for TextureTargets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextureTargets({:#x})", self.0)
    }
}

/// Attributes read once per config and used by the ranking comparator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RankAttribs {
    pub red_size: i32,
    pub bind_rgba: i32,
    pub double_buffer: i32,
    pub stencil_size: i32,
    pub depth_size: i32,
    pub bind_mipmap: i32,
}

/// One driver-reported configuration plus the attributes the backend needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramebufferConfig<C> {
    pub handle: C,
    pub texture_format: TextureFormat,
    pub texture_targets: TextureTargets,
    /// Bound texture rows already follow GL's bottom-up order
    pub y_inverted: bool,
    pub rank: RankAttribs,
}

impl<C> FramebufferConfig<C> {
    pub fn red_size(&self) -> i32 {
        self.rank.red_size
    }

    /// Only 8-bit-per-channel configs are usable
    pub fn is_usable(&self) -> bool {
        self.rank.red_size == 8
    }
}

/// Pick the texture target for a config.
///
/// `GL_TEXTURE_2D` is preferred when the config binds to it and the context
/// handles non-power-of-two sizes; otherwise rectangle textures are used
/// whenever possible.
pub fn choose_texture_target(targets: TextureTargets, non_power_of_two: bool) -> TextureTarget {
    let has_2d = targets.contains(TextureTargets::TEXTURE_2D);
    if has_2d && non_power_of_two {
        TextureTarget::Texture2D
    } else if targets.contains(TextureTargets::RECTANGLE) || !has_2d {
        TextureTarget::Rectangle
    } else {
        TextureTarget::Texture2D
    }
}

/// Compare the stored config for a depth against a candidate.
///
/// `Ordering::Less` means the candidate should replace the stored config.
pub fn compare<C>(
    stored: Option<&FramebufferConfig<C>>,
    candidate: Option<&FramebufferConfig<C>>,
) -> Ordering {
    let (a, b) = match (stored, candidate) {
        (None, _) => return Ordering::Less,
        (_, None) => return Ordering::Greater,
        (Some(a), Some(b)) => (&a.rank, &b.rank),
    };

    // Avoid 10-bit colors
    if a.red_size != 8 {
        return Ordering::Less;
    }
    if b.red_size != 8 {
        return Ordering::Greater;
    }

    let prefer_lower = [
        (a.bind_rgba, b.bind_rgba),
        (a.double_buffer, b.double_buffer),
        (a.stencil_size, b.stencil_size),
        (a.depth_size, b.depth_size),
    ];
    for (x, y) in prefer_lower {
        match x.cmp(&y) {
            Ordering::Equal => {}
            ord => return ord.reverse(),
        }
    }

    a.bind_mipmap.cmp(&b.bind_mipmap)
}

/// Depth → config table
#[derive(Debug, Clone)]
pub struct FbConfigTable<C> {
    configs: HashMap<u8, FramebufferConfig<C>>,
    max_depth: u8,
}

impl<C> Default for FbConfigTable<C> {
    fn default() -> Self {
        Self::new(MAX_DEPTH)
    }
}

impl<C> FbConfigTable<C> {
    pub fn new(max_depth: u8) -> Self {
        Self {
            configs: HashMap::new(),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    pub fn get(&self, depth: u8) -> Option<&FramebufferConfig<C>> {
        self.configs.get(&depth)
    }

    pub fn contains(&self, depth: u8) -> bool {
        self.configs.contains_key(&depth)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Registered depths in ascending order
    pub fn depths(&self) -> Vec<u8> {
        let mut depths: Vec<u8> = self.configs.keys().copied().collect();
        depths.sort_unstable();
        depths
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &FramebufferConfig<C>)> {
        self.configs.iter().map(|(d, c)| (*d, c))
    }

    pub fn clear(&mut self) {
        self.configs.clear();
    }

    /// Store `candidate` for `depth` if it beats the current entry.
    ///
    /// Depths outside `[0, max_depth]` are ignored. Returns whether the
    /// table changed.
    pub fn update(&mut self, depth: i32, candidate: FramebufferConfig<C>) -> bool
    where
        C: fmt::Debug,
    {
        let Ok(depth) = u8::try_from(depth) else {
            return false;
        };
        if depth > self.max_depth {
            return false;
        }

        let current = self.configs.get(&depth);
        if compare(current, Some(&candidate)) != Ordering::Less {
            return false;
        }

        debug!(
            "(depth {}): {:?} overrides {:?}, target {:?}",
            depth,
            candidate.handle,
            current.map(|c| &c.handle),
            candidate.texture_targets
        );
        self.configs.insert(depth, candidate);
        true
    }
}

/// Enumerates and ranks the configs of a display
pub struct FbConfigSelector<'a, D: GlxDisplay> {
    display: &'a D,
    max_depth: u8,
}

impl<'a, D: GlxDisplay> FbConfigSelector<'a, D> {
    pub fn new(display: &'a D) -> Self {
        Self {
            display,
            max_depth: MAX_DEPTH,
        }
    }

    /// Build the table and check it covers `default_depth`
    pub fn select(&self, default_depth: u8) -> GlxResult<FbConfigTable<D::FbConfig>> {
        let table = self.enumerate();

        if !table.contains(default_depth) {
            error!("No FBConfig found for default depth {}.", default_depth);
            return Err(GlxError::NoConfigForDepth(default_depth));
        }

        if !table.contains(ARGB_DEPTH) {
            warn!(
                "No FBConfig found for depth {}. Windows with alpha may not be painted correctly",
                ARGB_DEPTH
            );
        }

        Ok(table)
    }

    /// Walk every config and register the qualifying ones
    pub fn enumerate(&self) -> FbConfigTable<D::FbConfig> {
        let mut table = FbConfigTable::new(self.max_depth);

        for (id, handle) in self.display.fb_configs().into_iter().enumerate() {
            let attrib = |a: FbAttrib| self.display.fb_config_attrib(handle, a);
            let enabled = |a: FbAttrib| attrib(a).is_some_and(|v| v != 0);

            // Skip over multi-sampled visuals
            if attrib(FbAttrib::Samples).is_some_and(|v| v > 1) {
                continue;
            }

            let (Some(depth), Some(depth_alpha)) =
                (attrib(FbAttrib::BufferSize), attrib(FbAttrib::AlphaSize))
            else {
                error!("Failed to retrieve buffer size and alpha size of FBConfig {}.", id);
                continue;
            };
            let Some(targets) = attrib(FbAttrib::BindToTextureTargets) else {
                error!("Failed to retrieve BIND_TO_TEXTURE_TARGETS_EXT of FBConfig {}.", id);
                continue;
            };
            let Some(visual_depth) = self.display.fb_config_visual_depth(handle) else {
                continue;
            };

            let rgba = depth >= 32 && depth_alpha != 0 && enabled(FbAttrib::BindToTextureRgba);
            let rgb = enabled(FbAttrib::BindToTextureRgb);

            let mut config = FramebufferConfig {
                handle,
                texture_format: TextureFormat::None,
                texture_targets: TextureTargets::from_bits(targets as u32),
                y_inverted: enabled(FbAttrib::YInverted),
                rank: self.rank_attribs(handle),
            };

            let rgb_depth = depth - depth_alpha;
            if rgb_depth == visual_depth && rgb_depth < 32 && rgb {
                config.texture_format = TextureFormat::Rgb;
                table.update(rgb_depth, config);
            }

            if depth == visual_depth && rgba {
                config.texture_format = TextureFormat::Rgba;
                table.update(depth, config);
            }
        }

        table
    }

    /// Ranking attributes; failed queries read as 0
    fn rank_attribs(&self, handle: D::FbConfig) -> RankAttribs {
        let get = |a: FbAttrib| self.display.fb_config_attrib(handle, a).unwrap_or(0);
        RankAttribs {
            red_size: get(FbAttrib::RedSize),
            bind_rgba: get(FbAttrib::BindToTextureRgba),
            double_buffer: get(FbAttrib::DoubleBuffer),
            stencil_size: get(FbAttrib::StencilSize),
            depth_size: get(FbAttrib::DepthSize),
            bind_mipmap: get(FbAttrib::BindToMipmapTexture),
        }
    }
}
