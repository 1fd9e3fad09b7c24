use crate::{
    Attachment, AttachmentCache, BlendMode, ColorPacking, Error, RenderConfig, RenderableAttachment,
    SkeletonClipper, Skeleton, SkipReason, Slot, TexturePage, VertexColors, resolve_vertex_colors,
};
use std::sync::Arc;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
    pub dark_color: [f32; 4],
}

/// [`Vertex`] with colors packed to 32 bits, laid out for direct upload.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PackedVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: u32,
    pub dark_color: u32,
}

impl PackedVertex {
    pub fn from_vertex(vertex: &Vertex, packing: ColorPacking) -> Self {
        Self {
            position: vertex.position,
            uv: vertex.uv,
            color: packing.pack(vertex.color),
            dark_color: packing.pack(vertex.dark_color),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Draw {
    pub texture: Arc<TexturePage>,
    pub blend: BlendMode,
    pub premultiplied_alpha: bool,
    pub first_index: usize,
    pub index_count: usize,
}

impl Draw {
    /// Whether `texture` is the same page instance this draw samples.
    pub fn uses_texture(&self, texture: &Arc<TexturePage>) -> bool {
        Arc::ptr_eq(&self.texture, texture)
    }
}

/// Pages compare by identity, not by metadata.
impl PartialEq for Draw {
    fn eq(&self, other: &Self) -> bool {
        self.uses_texture(&other.texture)
            && self.blend == other.blend
            && self.premultiplied_alpha == other.premultiplied_alpha
            && self.first_index == other.first_index
            && self.index_count == other.index_count
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawList {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub draws: Vec<Draw>,
    /// At least one vertex may carry a non-neutral dark color, so a two-color
    /// shader is needed.
    pub dark_tint: bool,
}

impl DrawList {
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draws.clear();
        self.dark_tint = false;
    }

    /// Packs every vertex into `out`, replacing its contents.
    pub fn pack_vertices(&self, packing: ColorPacking, out: &mut Vec<PackedVertex>) {
        out.clear();
        out.extend(
            self.vertices
                .iter()
                .map(|vertex| PackedVertex::from_vertex(vertex, packing)),
        );
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// What happened to the slots of the last rendered frame.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RenderStats {
    /// Slots that appended geometry.
    pub emitted: usize,
    pub clipped: usize,
    pub skipped_transparent: usize,
    pub skipped_missing_texture: usize,
    pub skipped_clipped_away: usize,
    /// Start slot of a clip that was still open when the pass ended.
    pub unclosed_clip: Option<usize>,
    pub attachments_changed: bool,
}

impl RenderStats {
    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Transparent => self.skipped_transparent += 1,
            SkipReason::MissingTexture => self.skipped_missing_texture += 1,
            SkipReason::ClippedAway => self.skipped_clipped_away += 1,
        }
    }
}

/// Turns posed skeletons into draw lists.
///
/// A renderer owns its clipper, per-slot cache and output buffers, all of
/// which are reused from frame to frame.
#[derive(Debug, Default)]
pub struct SkeletonRenderer {
    config: RenderConfig,
    clipper: SkeletonClipper,
    cache: AttachmentCache,
    draw_list: DrawList,
    stats: RenderStats,
    disposed: bool,
}

impl SkeletonRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RenderConfig) {
        self.config = config;
    }

    /// Walks the skeleton's draw order and rebuilds the draw list.
    pub fn render(&mut self, skeleton: &Skeleton) -> Result<&DrawList, Error> {
        if self.disposed {
            return Err(Error::RendererDisposed);
        }
        self.render_frame(skeleton);
        Ok(&self.draw_list)
    }

    pub fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    pub fn cache(&self) -> &AttachmentCache {
        &self.cache
    }

    /// Releases all buffers. Further calls to [`Self::render`] fail.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.clipper.clip_end();
        self.cache.clear();
        self.draw_list = DrawList::default();
        self.stats = RenderStats::default();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn render_frame(&mut self, skeleton: &Skeleton) {
        self.draw_list.clear();
        self.stats = RenderStats::default();
        self.stats.attachments_changed = self.cache.begin_frame(skeleton);
        let dark_tint = self.config.dark_tint.resolve(skeleton);
        self.draw_list.dark_tint = dark_tint;

        for &slot_index in &skeleton.draw_order {
            self.render_slot(skeleton, slot_index, dark_tint);
        }

        if let Some(start_slot) = self.clipper.clip_end() {
            log::debug!("clip started at slot {start_slot} never reached its end slot");
            self.stats.unclosed_clip = Some(start_slot);
        }
    }

    fn render_slot(&mut self, skeleton: &Skeleton, slot_index: usize, dark_tint: bool) {
        let Some(slot) = skeleton.slots.get(slot_index) else {
            return;
        };
        let bone_active = skeleton.bones.get(slot.bone).is_some_and(|bone| bone.active);
        let Some(attachment) = slot.attachment.as_ref().filter(|_| bone_active) else {
            self.clipper.clip_end_with_slot(slot_index);
            return;
        };

        let renderable: &dyn RenderableAttachment = match attachment.as_ref() {
            Attachment::Region(region) => region,
            Attachment::Mesh(mesh) => mesh,
            Attachment::Clipping(clip) => {
                self.clipper.clip_start_for_slot(skeleton, slot_index, clip);
                return;
            }
            Attachment::Point(_) | Attachment::BoundingBox(_) | Attachment::Path(_) => {
                self.clipper.clip_end_with_slot(slot_index);
                return;
            }
        };

        let emitted = self.emit_attachment(
            skeleton,
            slot_index,
            slot,
            attachment,
            renderable,
            dark_tint,
        );
        if let Err(reason) = emitted {
            self.stats.record_skip(reason);
            if let Some(geometry) = self.cache.slot_mut(slot_index) {
                geometry.skip = Some(reason);
            }
        }
        self.clipper.clip_end_with_slot(slot_index);
    }

    fn emit_attachment(
        &mut self,
        skeleton: &Skeleton,
        slot_index: usize,
        slot: &Slot,
        attachment: &Arc<Attachment>,
        renderable: &dyn RenderableAttachment,
        dark_tint: bool,
    ) -> Result<(), SkipReason> {
        let Some(geometry) = self
            .cache
            .prepare_slot(slot_index, attachment, self.config.uv_space)
        else {
            return Ok(());
        };
        let Some(texture) = geometry.texture.clone() else {
            return Err(SkipReason::MissingTexture);
        };

        let premultiplied_alpha = self.config.premultiplied_alpha.unwrap_or(texture.pma);
        let colors = resolve_vertex_colors(
            skeleton.color,
            slot.color,
            renderable.color(),
            slot.dark_color,
            premultiplied_alpha,
            dark_tint,
        );
        if colors.alpha() <= 0.0 {
            return Err(SkipReason::Transparent);
        }

        let world = geometry.vertices.prepare(renderable.world_vertices_length());
        renderable.compute_world_vertices(skeleton, slot, world, 0, 2);

        let target = DrawTarget {
            texture: &texture,
            blend: slot.blend,
            premultiplied_alpha,
            batch: self.config.batch_draws,
        };

        if self.clipper.is_clipping() {
            let vertex_count = self.clipper.clip_triangles_unpacked(
                geometry.vertices.as_slice(),
                &geometry.triangles,
                &geometry.uvs,
            );
            let record = geometry.record_clip(vertex_count, self.clipper.clipped_triangles().len());
            if record.resized {
                log::trace!(
                    "slot {slot_index} clipped to {} vertices, {} indices",
                    record.vertex_count,
                    record.index_count
                );
            }
            if vertex_count == 0 {
                return Err(SkipReason::ClippedAway);
            }
            append_geometry(
                &mut self.draw_list,
                &target,
                colors,
                self.clipper.clipped_vertices(),
                self.clipper.clipped_uvs(),
                self.clipper.clipped_triangles(),
            );
            self.stats.clipped += 1;
        } else {
            append_geometry(
                &mut self.draw_list,
                &target,
                colors,
                geometry.vertices.as_slice(),
                &geometry.uvs,
                &geometry.triangles,
            );
        }

        self.stats.emitted += 1;
        Ok(())
    }
}

/// Renders `skeleton` once with the default configuration.
pub fn build_draw_list(skeleton: &Skeleton) -> DrawList {
    let mut renderer = SkeletonRenderer::default();
    renderer.render_frame(skeleton);
    renderer.draw_list
}

struct DrawTarget<'a> {
    texture: &'a Arc<TexturePage>,
    blend: BlendMode,
    premultiplied_alpha: bool,
    batch: bool,
}

fn append_geometry<I: Copy + Into<u32>>(
    out: &mut DrawList,
    target: &DrawTarget<'_>,
    colors: VertexColors,
    positions: &[f32],
    uvs: &[f32],
    indices: &[I],
) {
    if positions.is_empty() || indices.is_empty() {
        return;
    }

    let base = out.vertices.len() as u32;
    out.vertices.extend(
        positions
            .chunks_exact(2)
            .zip(uvs.chunks_exact(2))
            .map(|(p, uv)| Vertex {
                position: [p[0], p[1]],
                uv: [uv[0], uv[1]],
                color: colors.light,
                dark_color: colors.dark,
            }),
    );

    let first_index = out.indices.len();
    out.indices
        .extend(indices.iter().map(|&index| base + index.into()));

    if target.batch {
        if let Some(last) = out.draws.last_mut() {
            if last.first_index + last.index_count == first_index
                && last.uses_texture(target.texture)
                && last.blend == target.blend
                && last.premultiplied_alpha == target.premultiplied_alpha
            {
                last.index_count += indices.len();
                return;
            }
        }
    }

    out.draws.push(Draw {
        texture: Arc::clone(target.texture),
        blend: target.blend,
        premultiplied_alpha: target.premultiplied_alpha,
        first_index,
        index_count: indices.len(),
    });
}
