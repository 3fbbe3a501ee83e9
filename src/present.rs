//! Presentation and buffer age
//!
//! With `GLX_EXT_buffer_age` the driver reports how many frames ago the
//! current back buffer was last fully valid. Callers use that to repaint only
//! what changed since then; an unknown age means a full repaint.

use log::trace;
use std::num::NonZeroU32;

use crate::config::SwapMethod;
use crate::context::RenderContext;
use crate::driver::{GlDriver, GlxDisplay};

/// Age of the back buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferAge {
    /// Contents are from this many frames ago
    Known(NonZeroU32),
    /// Contents are undefined; repaint everything
    Unknown,
}

impl BufferAge {
    /// 0 means the driver does not know
    pub fn from_raw(age: u32) -> Self {
        NonZeroU32::new(age).map_or(BufferAge::Unknown, BufferAge::Known)
    }

    pub fn get(self) -> Option<u32> {
        match self {
            BufferAge::Known(age) => Some(age.get()),
            BufferAge::Unknown => None,
        }
    }

    pub fn must_repaint_all(self) -> bool {
        self == BufferAge::Unknown
    }
}

impl<D: GlxDisplay, G: GlDriver> RenderContext<D, G> {
    /// Swap buffers of the overlay window, or the root if there is none
    pub fn present(&self) {
        let target = self.screen().target_drawable();
        trace!("swap buffers on {:#010x}", target);
        self.display().swap_buffers(target);
    }

    /// Back buffer age; `Unknown` unless the swap method tracks buffer age
    pub fn query_buffer_age(&self) -> BufferAge {
        if self.config().swap_method != SwapMethod::BufferAge {
            return BufferAge::Unknown;
        }
        let target = self.screen().target_drawable();
        BufferAge::from_raw(self.display().query_buffer_age(target))
    }
}
