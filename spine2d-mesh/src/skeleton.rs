//! Posed skeleton as handed over by the pose solver.
//!
//! Nothing here animates: bones carry world transforms that an external solver
//! has already computed for the current frame.

use crate::Attachment;
use std::sync::Arc;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BlendMode {
    #[default]
    Normal,
    Additive,
    Multiply,
    Screen,
}

/// A bone's world transform: `world = [a b; c d] * local + (world_x, world_y)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bone {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub world_x: f32,
    pub world_y: f32,
    /// Inactive bones (skin-required bones outside the current skin) hide their slots.
    pub active: bool,
}

impl Default for Bone {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Bone {
    pub const IDENTITY: Bone = Bone {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        world_x: 0.0,
        world_y: 0.0,
        active: true,
    };

    /// Builds a world transform from translation, rotation (degrees) and scale.
    pub fn from_transform(x: f32, y: f32, rotation: f32, scale_x: f32, scale_y: f32) -> Self {
        let (sin, cos) = rotation.to_radians().sin_cos();
        Self {
            a: cos * scale_x,
            b: -sin * scale_y,
            c: sin * scale_x,
            d: cos * scale_y,
            world_x: x,
            world_y: y,
            active: true,
        }
    }

    #[inline]
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.b * y + self.world_x,
            self.c * x + self.d * y + self.world_y,
        )
    }
}

#[cfg(feature = "glam")]
impl From<&Bone> for glam::Affine2 {
    fn from(bone: &Bone) -> Self {
        glam::Affine2::from_cols(
            glam::Vec2::new(bone.a, bone.c),
            glam::Vec2::new(bone.b, bone.d),
            glam::Vec2::new(bone.world_x, bone.world_y),
        )
    }
}

#[derive(Clone, Debug)]
pub struct Slot {
    pub name: String,
    pub bone: usize,
    /// Straight-alpha RGBA tint.
    pub color: [f32; 4],
    /// Second tint that shifts the black point; `None` disables it for this slot.
    pub dark_color: Option<[f32; 3]>,
    pub blend: BlendMode,
    pub attachment: Option<Arc<Attachment>>,
    /// Deform keys for the current attachment. For unweighted vertices these
    /// replace the authored local positions; for weighted vertices they are
    /// offsets added per bone influence.
    pub deform: Vec<f32>,
}

impl Slot {
    pub fn new(name: impl Into<String>, bone: usize) -> Self {
        Self {
            name: name.into(),
            bone,
            color: [1.0, 1.0, 1.0, 1.0],
            dark_color: None,
            blend: BlendMode::Normal,
            attachment: None,
            deform: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(Arc::new(attachment));
        self
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn with_dark_color(mut self, dark_color: [f32; 3]) -> Self {
        self.dark_color = Some(dark_color);
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }
}

#[derive(Clone, Debug)]
pub struct Skeleton {
    pub bones: Vec<Bone>,
    pub slots: Vec<Slot>,
    /// Slot indices, back to front.
    pub draw_order: Vec<usize>,
    /// Overall tint multiplied into every slot.
    pub color: [f32; 4],
}

impl Skeleton {
    /// Creates a skeleton whose draw order is the slot order.
    pub fn new(bones: Vec<Bone>, slots: Vec<Slot>) -> Self {
        let draw_order = (0..slots.len()).collect();
        Self {
            bones,
            slots,
            draw_order,
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }

    pub fn slot_bone(&self, slot_index: usize) -> Option<&Bone> {
        let slot = self.slots.get(slot_index)?;
        self.bones.get(slot.bone)
    }

    pub fn slot_attachment(&self, slot_index: usize) -> Option<&Arc<Attachment>> {
        self.slots.get(slot_index)?.attachment.as_ref()
    }

    pub fn find_slot(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name == name)
    }

    /// Whether any slot carries a dark tint color.
    pub fn has_dark_tint(&self) -> bool {
        self.slots.iter().any(|slot| slot.dark_color.is_some())
    }
}
