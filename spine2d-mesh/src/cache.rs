//! Per-slot geometry cache keyed on attachment identity.
//!
//! UVs, triangles and the texture of an attachment never change while the
//! slot keeps showing the same attachment instance, so they are rebuilt only
//! when the slot's `Arc<Attachment>` is swapped. World positions still change
//! every frame and are recomputed into the slot's grow-only vertex buffer.

use crate::{Attachment, ScratchBuffer, Skeleton, TexturePage, UvSpace};
use std::sync::Arc;

/// Why a slot contributed nothing to the current frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SkipReason {
    /// Final alpha resolved to zero.
    Transparent,
    MissingTexture,
    /// Clipping removed every triangle.
    ClippedAway,
}

/// Sizes of the last clipped output for a slot.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ClipRecord {
    pub vertex_count: usize,
    pub index_count: usize,
    /// The counts differ from the previous clipped frame, so any backend
    /// geometry sized for them must be reallocated.
    pub resized: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SlotGeometry {
    /// Attachment seen in this slot at the last `begin_frame`.
    seen: Option<Arc<Attachment>>,
    /// Attachment the static data below was built from.
    built: Option<Arc<Attachment>>,
    built_uv_space: UvSpace,
    pub uvs: Vec<f32>,
    pub triangles: Vec<u16>,
    pub texture: Option<Arc<TexturePage>>,
    pub vertices: ScratchBuffer<f32>,
    pub clip: Option<ClipRecord>,
    pub skip: Option<SkipReason>,
}

impl SlotGeometry {
    fn is_built_for(&self, attachment: &Arc<Attachment>, uv_space: UvSpace) -> bool {
        self.built_uv_space == uv_space
            && self
                .built
                .as_ref()
                .is_some_and(|built| Arc::ptr_eq(built, attachment))
    }
}

fn same_attachment(a: Option<&Arc<Attachment>>, b: Option<&Arc<Attachment>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

#[derive(Clone, Debug, Default)]
pub struct AttachmentCache {
    slots: Vec<SlotGeometry>,
    attachments_changed: bool,
    rebuild_count: usize,
}

impl AttachmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares every slot's attachment with the previous frame by identity.
    /// Returns `true` when any slot changed (or the slot count did).
    pub fn begin_frame(&mut self, skeleton: &Skeleton) -> bool {
        let mut changed = self.slots.len() != skeleton.slots.len();
        self.slots.resize_with(skeleton.slots.len(), SlotGeometry::default);

        for (cached, slot) in self.slots.iter_mut().zip(&skeleton.slots) {
            if !same_attachment(cached.seen.as_ref(), slot.attachment.as_ref()) {
                changed = true;
                cached.seen = slot.attachment.clone();
            }
            cached.skip = None;
        }

        self.attachments_changed = changed;
        changed
    }

    /// Whether the last `begin_frame` saw any attachment change.
    pub fn attachments_changed(&self) -> bool {
        self.attachments_changed
    }

    /// Number of times static slot geometry has been rebuilt.
    pub fn rebuild_count(&self) -> usize {
        self.rebuild_count
    }

    pub fn slot(&self, slot_index: usize) -> Option<&SlotGeometry> {
        self.slots.get(slot_index)
    }

    pub(crate) fn slot_mut(&mut self, slot_index: usize) -> Option<&mut SlotGeometry> {
        self.slots.get_mut(slot_index)
    }

    /// Returns the slot's geometry, rebuilding UVs, triangles and texture if the
    /// attachment instance or UV space changed. `None` for attachments that do
    /// not render.
    pub fn prepare_slot(
        &mut self,
        slot_index: usize,
        attachment: &Arc<Attachment>,
        uv_space: UvSpace,
    ) -> Option<&mut SlotGeometry> {
        let renderable = attachment.as_renderable()?;
        if slot_index >= self.slots.len() {
            self.slots.resize_with(slot_index + 1, SlotGeometry::default);
        }
        let geometry = &mut self.slots[slot_index];
        if geometry.is_built_for(attachment, uv_space) {
            return Some(geometry);
        }

        geometry.uvs.clear();
        geometry.uvs.extend_from_slice(renderable.uvs());
        geometry.triangles.clear();
        geometry.triangles.extend_from_slice(renderable.triangles());
        geometry.texture = renderable.texture().map(|region| Arc::clone(&region.page));
        match &geometry.texture {
            Some(page) => uv_space.apply(&mut geometry.uvs, page),
            None => log::warn!(
                "attachment '{}' in slot {slot_index} has no texture and will not be drawn",
                renderable.name()
            ),
        }
        geometry.clip = None;
        geometry.built = Some(Arc::clone(attachment));
        geometry.built_uv_space = uv_space;
        self.rebuild_count += 1;
        log::trace!("rebuilt geometry for slot {slot_index}");

        Some(geometry)
    }

    /// Forgets all cached geometry.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.attachments_changed = false;
    }
}

impl SlotGeometry {
    /// Stores the clipped output size for this frame.
    pub fn record_clip(&mut self, vertex_count: usize, index_count: usize) -> ClipRecord {
        let resized = self
            .clip
            .is_none_or(|last| {
                last.vertex_count != vertex_count || last.index_count != index_count
            });
        let record = ClipRecord {
            vertex_count,
            index_count,
            resized,
        };
        self.clip = Some(record);
        record
    }
}
