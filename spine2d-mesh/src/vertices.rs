//! World-space vertex computation for region and vertex attachments.
//!
//! Every routine writes into a caller-provided slice; sizing that slice is the
//! caller's job (see [`crate::ScratchBuffer`]).

use crate::{Bone, MeshVertices, RegionAttachment, Skeleton, Slot};

impl RegionAttachment {
    /// Writes the 4 quad corners (8 floats, BR, BL, UL, UR) transformed by `bone`.
    pub fn compute_world_vertices(
        &self,
        bone: &Bone,
        out: &mut [f32],
        offset: usize,
        stride: usize,
    ) {
        debug_assert!(stride >= 2);
        debug_assert!(out.len() >= offset + stride * 3 + 2);

        let mut write = offset;
        for local in self.offsets().chunks_exact(2) {
            let (x, y) = bone.transform_point(local[0], local[1]);
            out[write] = x;
            out[write + 1] = y;
            write += stride;
        }
    }
}

/// Transforms `count` floats worth of vertices, starting `start` floats into
/// the attachment's world vertex list, into `out`.
///
/// Unweighted vertices use the slot's bone; a slot deform at least as long as
/// the vertex list replaces the authored positions. Weighted vertices blend
/// each influence's bone, with deform values applied as per-influence offsets.
#[allow(clippy::too_many_arguments)]
pub fn compute_mesh_world_vertices(
    skeleton: &Skeleton,
    slot: &Slot,
    vertices: &MeshVertices,
    start: usize,
    count: usize,
    out: &mut [f32],
    offset: usize,
    stride: usize,
) {
    debug_assert!(start % 2 == 0 && count % 2 == 0);
    let first = start / 2;
    let last = ((start + count) / 2).min(vertices.len());
    let deform = slot.deform.as_slice();

    match vertices {
        MeshVertices::Unweighted(points) => {
            let bone = skeleton.bones.get(slot.bone).copied().unwrap_or_default();
            let use_deform = deform.len() >= points.len() * 2;
            let mut write = offset;
            for i in first..last {
                let (x, y) = if use_deform {
                    (deform[i * 2], deform[i * 2 + 1])
                } else {
                    (points[i][0], points[i][1])
                };
                let (wx, wy) = bone.transform_point(x, y);
                out[write] = wx;
                out[write + 1] = wy;
                write += stride;
            }
        }
        MeshVertices::Weighted(influences) => {
            let mut f: usize = influences[..first].iter().map(|w| w.len() * 2).sum();
            let mut write = offset;
            for weights in &influences[first..last] {
                let (mut wx, mut wy) = (0.0, 0.0);
                for w in weights {
                    let dx = deform.get(f).copied().unwrap_or(0.0);
                    let dy = deform.get(f + 1).copied().unwrap_or(0.0);
                    f += 2;
                    let Some(bone) = skeleton.bones.get(w.bone) else {
                        continue;
                    };
                    let (x, y) = bone.transform_point(w.x + dx, w.y + dy);
                    wx += x * w.weight;
                    wy += y * w.weight;
                }
                out[write] = wx;
                out[write + 1] = wy;
                write += stride;
            }
        }
    }
}

/// World polygon of a vertex attachment as a fresh interleaved list.
pub(crate) fn world_polygon(skeleton: &Skeleton, slot: &Slot, vertices: &MeshVertices) -> Vec<f32> {
    let len = vertices.world_vertices_length();
    let mut out = vec![0.0; len];
    compute_mesh_world_vertices(skeleton, slot, vertices, 0, len, &mut out, 0, 2);
    out
}
