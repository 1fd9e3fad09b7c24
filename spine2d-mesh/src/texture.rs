//! Texture pages and the sub-rectangles attachments sample from.
//!
//! Atlas parsing happens elsewhere; this module only carries the already-parsed
//! page and region metadata needed to place UVs.

use std::sync::Arc;

/// One atlas page (a single GPU texture).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TexturePage {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Texels on this page are stored with premultiplied alpha.
    pub pma: bool,
}

impl TexturePage {
    pub fn new(name: impl Into<String>, width: u32, height: u32, pma: bool) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            pma,
        }
    }

    fn size(&self) -> (f32, f32) {
        (self.width.max(1) as f32, self.height.max(1) as f32)
    }
}

/// A packed image on a [`TexturePage`].
///
/// `x`, `y`, `width` and `height` are in page pixels and describe the packed
/// (possibly rotated, whitespace-stripped) rectangle. `original_*` and
/// `offset_*` restore the authored image size.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureRegion {
    pub page: Arc<TexturePage>,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Counter-clockwise packing rotation: 0, 90, 180 or 270.
    pub degrees: u16,
    pub offset_x: i32,
    pub offset_y: i32,
    pub original_width: u32,
    pub original_height: u32,
}

impl TextureRegion {
    pub fn new(page: Arc<TexturePage>, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            page,
            x,
            y,
            width,
            height,
            degrees: 0,
            offset_x: 0,
            offset_y: 0,
            original_width: width,
            original_height: height,
        }
    }

    /// A region spanning the whole page.
    pub fn whole_page(page: Arc<TexturePage>) -> Self {
        let (width, height) = (page.width, page.height);
        Self::new(page, 0, 0, width, height)
    }

    pub fn with_rotation(mut self, degrees: u16) -> Self {
        self.degrees = degrees;
        self
    }

    pub fn with_whitespace(
        mut self,
        offset_x: i32,
        offset_y: i32,
        original_width: u32,
        original_height: u32,
    ) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self.original_width = original_width;
        self.original_height = original_height;
        self
    }

    /// Page-space UVs for a region attachment quad, in the vertex order
    /// BR, BL, UL, UR used by [`crate::RegionAttachment::compute_world_vertices`].
    pub fn quad_uvs(&self) -> [f32; 8] {
        let (page_w, page_h) = self.page.size();
        let u = self.x as f32 / page_w;
        let v = self.y as f32 / page_h;
        let rotated = self.degrees == 90;
        let (packed_w, packed_h) = if rotated {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        };
        let u2 = (self.x + packed_w) as f32 / page_w;
        let v2 = (self.y + packed_h) as f32 / page_h;

        if rotated {
            [u2, v, u2, v2, u, v2, u, v]
        } else {
            [u2, v2, u, v2, u, v, u2, v]
        }
    }

    /// Maps an authored mesh UV (relative to the original image) onto the page.
    pub fn map_mesh_uv(&self, uv: [f32; 2]) -> [f32; 2] {
        let (page_w, page_h) = self.page.size();
        let ow = self.original_width.max(1) as f32;
        let oh = self.original_height.max(1) as f32;
        let ox = self.offset_x as f32;
        let oy = self.offset_y as f32;
        let rw = self.width as f32;
        let rh = self.height as f32;
        let u0 = self.x as f32 / page_w;
        let v0 = self.y as f32 / page_h;
        let [su, sv] = uv;

        match self.degrees {
            90 => {
                let u = u0 - (oh - oy - rh) / page_w;
                let v = v0 - (ow - ox - rw) / page_h;
                [u + sv * (oh / page_w), v + (1.0 - su) * (ow / page_h)]
            }
            180 => {
                let u = u0 - (ow - ox - rw) / page_w;
                let v = v0 - oy / page_h;
                [u + (1.0 - su) * (ow / page_w), v + (1.0 - sv) * (oh / page_h)]
            }
            270 => {
                let u = u0 - oy / page_w;
                let v = v0 - ox / page_h;
                [u + (1.0 - sv) * (oh / page_w), v + su * (ow / page_h)]
            }
            _ => {
                let u = u0 - ox / page_w;
                let v = v0 - (oh - oy - rh) / page_h;
                [u + su * (ow / page_w), v + sv * (oh / page_h)]
            }
        }
    }
}

/// Coordinate space of the UVs written to the draw list.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UvSpace {
    /// `[0, 1]` texture coordinates, as sampled by shaders.
    #[default]
    Normalized,
    /// Page pixels, for rasterizers that take texel coordinates.
    Texels,
}

impl UvSpace {
    /// Rescales interleaved normalized UVs in place.
    pub(crate) fn apply(self, uvs: &mut [f32], page: &TexturePage) {
        if self == UvSpace::Normalized {
            return;
        }
        let (w, h) = (page.width as f32, page.height as f32);
        for uv in uvs.chunks_exact_mut(2) {
            uv[0] *= w;
            uv[1] *= h;
        }
    }
}
