//! Painting a window texture into the target surface
//!
//! Regions and offsets arrive in X11 coordinates (origin top-left, y down).
//! GL rasterizes with the origin bottom-left and y up, so unless the bound
//! texture is already y-inverted, the clip region is mirrored against the
//! target height and the destination offset is moved from the top-left to
//! the bottom-left corner of the painted rectangle.

use log::trace;

use crate::binding::WindowTextureBinding;
use crate::context::RenderContext;
use crate::driver::{GlDriver, GlxDisplay};
use crate::painter::TexturedQuad;
use crate::region::Region;

/// Vertical offset of a rectangle's bottom-left corner in GL coordinates
pub fn flip_dst_y(dst_y: i32, rect_height: i32, target_height: i32) -> i32 {
    target_height - dst_y - rect_height
}

/// Destination offset and clip region in GL coordinates
pub fn to_gl_coords(
    dst_y: i32,
    rect_height: u32,
    region: &Region,
    target_height: u32,
    y_inverted: bool,
) -> (i32, Region) {
    if y_inverted {
        return (dst_y, region.clone());
    }
    let target_height = target_height as i32;
    (
        flip_dst_y(dst_y, rect_height as i32, target_height),
        region.flipped_y(target_height),
    )
}

/// Compose `binding` at `(dst_x, dst_y)` clipped to `region`.
///
/// The converted region only lives for this call.
pub fn compose<D: GlxDisplay, G: GlDriver>(
    ctx: &mut RenderContext<D, G>,
    binding: &WindowTextureBinding,
    dst_x: i32,
    dst_y: i32,
    region: &Region,
) {
    let Some(texture) = binding.texture().filter(|_| binding.is_bound()) else {
        trace!("window {:#010x} is not bound, skipped", binding.window());
        return;
    };

    let (gl_dst_y, gl_region) = to_gl_coords(
        dst_y,
        binding.height(),
        region,
        ctx.screen().height,
        binding.y_inverted(),
    );

    let quad = TexturedQuad {
        texture,
        target: binding.target(),
        src_x: 0,
        src_y: 0,
        dst_x,
        dst_y: gl_dst_y,
        width: binding.width(),
        height: binding.height(),
        opacity: 1.0,
        y_inverted: binding.y_inverted(),
        dual_texture: false,
    };

    ctx.painter_mut().draw_quad(&quad, &gl_region);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Rect;

    #[test]
    fn test_flip_dst_y() {
        assert_eq!(flip_dst_y(0, 20, 100), 80);
        assert_eq!(flip_dst_y(30, 20, 100), 50);
        assert_eq!(flip_dst_y(80, 20, 100), 0);
    }

    #[test]
    fn test_region_flipped_when_not_inverted() {
        let region = Region::from_rect(Rect::new(0, 0, 10, 20));
        let (y, flipped) = to_gl_coords(0, 20, &region, 100, false);
        assert_eq!(y, 80);
        assert_eq!(flipped.rects(), &[Rect::new(0, 80, 10, 100)]);
    }

    #[test]
    fn test_region_untouched_when_inverted() {
        let region = Region::from_rect(Rect::new(0, 0, 10, 20));
        let (y, same) = to_gl_coords(5, 20, &region, 100, true);
        assert_eq!(y, 5);
        assert_eq!(same, region);
    }

    #[test]
    fn test_multi_rect_region() {
        let region = Region::from_rects([Rect::new(0, 0, 50, 10), Rect::new(10, 40, 20, 60)]);
        let (y, flipped) = to_gl_coords(0, 60, &region, 60, false);
        assert_eq!(y, 0);
        assert_eq!(
            flipped.rects(),
            &[Rect::new(0, 50, 50, 60), Rect::new(10, 0, 20, 20)]
        );
    }
}
