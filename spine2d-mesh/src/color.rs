//! Per-vertex tint resolution and packing.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Dark color emitted when a slot has no dark tint; makes the two-color
/// shader's dark term a no-op.
pub const NEUTRAL_DARK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Light and dark colors shared by every vertex of one attachment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VertexColors {
    pub light: [f32; 4],
    /// `a` is a shader mode switch (1 for premultiplied, 0 for straight alpha),
    /// not a transparency.
    pub dark: [f32; 4],
}

impl VertexColors {
    /// Straight-alpha opacity of the light color.
    pub fn alpha(&self) -> f32 {
        self.light[3]
    }
}

pub fn multiply_rgba(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    [a[0] * b[0], a[1] * b[1], a[2] * b[2], a[3] * b[3]]
}

/// Resolves the vertex colors for one attachment.
///
/// The light color is `skeleton * slot * attachment`, clamped to `[0, 1]`;
/// with `premultiplied_alpha` its RGB is then scaled by the final alpha. A
/// dark color (only honoured when `dark_tint` is on) is premultiplied by the
/// same alpha under PMA.
pub fn resolve_vertex_colors(
    skeleton_color: [f32; 4],
    slot_color: [f32; 4],
    attachment_color: [f32; 4],
    dark_color: Option<[f32; 3]>,
    premultiplied_alpha: bool,
    dark_tint: bool,
) -> VertexColors {
    let light = multiply_rgba(multiply_rgba(skeleton_color, slot_color), attachment_color)
        .map(|c| c.clamp(0.0, 1.0));
    let alpha = light[3];

    let light = if premultiplied_alpha {
        [light[0] * alpha, light[1] * alpha, light[2] * alpha, alpha]
    } else {
        light
    };

    let dark = match dark_color.filter(|_| dark_tint) {
        None => NEUTRAL_DARK,
        Some([r, g, b]) if premultiplied_alpha => [r * alpha, g * alpha, b * alpha, 1.0],
        Some([r, g, b]) => [r, g, b, 0.0],
    };

    VertexColors { light, dark }
}

/// 32-bit packed color layouts used by vertex formats.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ColorPacking {
    /// `0xAABBGGRR`, as read by WebGL/GL `UNSIGNED_BYTE` RGBA attributes on
    /// little-endian hosts.
    #[default]
    Abgr8888,
    /// `0xRRGGBBAA`.
    Rgba8888,
}

fn to_byte(c: f32) -> u32 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u32
}

fn from_byte(b: u32) -> f32 {
    (b & 0xff) as f32 / 255.0
}

impl ColorPacking {
    pub fn pack(self, [r, g, b, a]: [f32; 4]) -> u32 {
        let (r, g, b, a) = (to_byte(r), to_byte(g), to_byte(b), to_byte(a));
        match self {
            ColorPacking::Abgr8888 => (a << 24) | (b << 16) | (g << 8) | r,
            ColorPacking::Rgba8888 => (r << 24) | (g << 16) | (b << 8) | a,
        }
    }

    pub fn unpack(self, packed: u32) -> [f32; 4] {
        match self {
            ColorPacking::Abgr8888 => [
                from_byte(packed),
                from_byte(packed >> 8),
                from_byte(packed >> 16),
                from_byte(packed >> 24),
            ],
            ColorPacking::Rgba8888 => [
                from_byte(packed >> 24),
                from_byte(packed >> 16),
                from_byte(packed >> 8),
                from_byte(packed),
            ],
        }
    }

    /// Writes the packed value so that memory holds the bytes R, G, B, A for
    /// either layout.
    pub fn write_bytes(self, out: &mut [u8], color: [f32; 4]) {
        let packed = self.pack(color);
        match self {
            ColorPacking::Abgr8888 => LittleEndian::write_u32(out, packed),
            ColorPacking::Rgba8888 => BigEndian::write_u32(out, packed),
        }
    }

    pub fn read_bytes(self, bytes: &[u8]) -> [f32; 4] {
        let packed = match self {
            ColorPacking::Abgr8888 => LittleEndian::read_u32(bytes),
            ColorPacking::Rgba8888 => BigEndian::read_u32(bytes),
        };
        self.unpack(packed)
    }
}
