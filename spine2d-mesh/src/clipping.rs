//! Clip-region state and triangle clipping.
//!
//! A [`SkeletonClipper`] is driven by the draw-order traversal: a clipping
//! attachment starts a clip, the clip's end slot (or the end of the pass) stops
//! it, and every renderable attachment processed in between is clipped with
//! [`SkeletonClipper::clip_triangles_unpacked`].

use crate::triangulate::{Point, convex_decompose};
use crate::{ClippingAttachment, Skeleton};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ClipState {
    #[default]
    Idle,
    Clipping {
        /// Slot holding the clipping attachment.
        start_slot: usize,
        /// Slot after which clipping stops; `None` runs to the end of the pass.
        end_slot: Option<usize>,
    },
}

/// Outcome of clipping one triangle against one convex piece.
enum PieceClip {
    Inside,
    Outside,
    /// The visible polygon is left in `SkeletonClipper::polygon`.
    Partial,
}

#[derive(Clone, Debug, Default)]
pub struct SkeletonClipper {
    state: ClipState,
    pieces: Vec<Vec<Point>>,
    clipped_vertices: Vec<f32>,
    clipped_uvs: Vec<f32>,
    clipped_triangles: Vec<u32>,
    polygon: Vec<Point>,
    polygon_scratch: Vec<Point>,
}

impl SkeletonClipper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ClipState {
        self.state
    }

    pub fn is_clipping(&self) -> bool {
        matches!(self.state, ClipState::Clipping { .. })
    }

    /// Convex pieces of the active clip polygon, counter-clockwise.
    pub fn clip_polygons(&self) -> &[Vec<[f32; 2]>] {
        &self.pieces
    }

    /// Starts clipping against `world_polygon` (interleaved world-space x, y).
    ///
    /// A clip that is already active is replaced. Returns the number of convex
    /// pieces; `0` means the polygon was degenerate and clipping stays idle.
    pub fn clip_start(
        &mut self,
        slot_index: usize,
        clip: &ClippingAttachment,
        world_polygon: &[f32],
    ) -> usize {
        if let ClipState::Clipping { start_slot, .. } = self.state {
            log::debug!(
                "clip '{}' at slot {slot_index} replaces the clip started at slot {start_slot}",
                clip.name
            );
        }

        self.pieces = convex_decompose(world_polygon);
        self.state = if self.pieces.is_empty() {
            log::debug!("clip '{}' at slot {slot_index} has a degenerate polygon", clip.name);
            ClipState::Idle
        } else {
            ClipState::Clipping {
                start_slot: slot_index,
                end_slot: clip.end_slot,
            }
        };
        self.pieces.len()
    }

    /// Computes the clip polygon from the slot's bone and starts clipping.
    pub fn clip_start_for_slot(
        &mut self,
        skeleton: &Skeleton,
        slot_index: usize,
        clip: &ClippingAttachment,
    ) -> usize {
        let Some(slot) = skeleton.slots.get(slot_index) else {
            return 0;
        };
        let polygon = crate::vertices::world_polygon(skeleton, slot, &clip.vertices);
        self.clip_start(slot_index, clip, &polygon)
    }

    /// Stops clipping if `slot_index` is the active clip's end slot.
    pub fn clip_end_with_slot(&mut self, slot_index: usize) {
        if let ClipState::Clipping {
            end_slot: Some(end_slot),
            ..
        } = self.state
        {
            if end_slot == slot_index {
                self.clip_end();
            }
        }
    }

    /// Unconditionally stops clipping. Returns the start slot of the clip that
    /// was still active, if any.
    pub fn clip_end(&mut self) -> Option<usize> {
        let open = match self.state {
            ClipState::Clipping { start_slot, .. } => Some(start_slot),
            ClipState::Idle => None,
        };
        self.state = ClipState::Idle;
        self.pieces.clear();
        self.clipped_vertices.clear();
        self.clipped_uvs.clear();
        self.clipped_triangles.clear();
        open
    }

    /// Output of the last clip call, valid until the next one.
    pub fn clipped_vertices(&self) -> &[f32] {
        &self.clipped_vertices
    }

    pub fn clipped_uvs(&self) -> &[f32] {
        &self.clipped_uvs
    }

    /// Indices into [`Self::clipped_vertices`] (per vertex, not per float).
    pub fn clipped_triangles(&self) -> &[u32] {
        &self.clipped_triangles
    }

    /// Clips a triangle list against the active clip.
    ///
    /// `vertices` and `uvs` are interleaved pairs indexed by `triangles`.
    /// Triangles fully inside a convex piece are copied unchanged, triangles
    /// outside every piece disappear, and partially covered triangles are
    /// replaced by a fan over the visible polygon with barycentric UVs.
    /// Returns the number of output vertices.
    pub fn clip_triangles_unpacked(
        &mut self,
        vertices: &[f32],
        triangles: &[u16],
        uvs: &[f32],
    ) -> usize {
        self.clipped_vertices.clear();
        self.clipped_uvs.clear();
        self.clipped_triangles.clear();
        if !self.is_clipping() {
            return 0;
        }

        let pieces = std::mem::take(&mut self.pieces);
        'triangles: for triangle in triangles.chunks_exact(3) {
            let corner = |i: u16| {
                let at = usize::from(i) * 2;
                ([vertices[at], vertices[at + 1]], [uvs[at], uvs[at + 1]])
            };
            let (p1, uv1) = corner(triangle[0]);
            let (p2, uv2) = corner(triangle[1]);
            let (p3, uv3) = corner(triangle[2]);

            let Some(barycentric) = Barycentric::new(p1, p2, p3) else {
                continue;
            };

            for piece in &pieces {
                match self.clip_against_piece([p1, p2, p3], piece) {
                    PieceClip::Outside => {}
                    PieceClip::Inside => {
                        let base = self.vertex_count();
                        for (p, uv) in [(p1, uv1), (p2, uv2), (p3, uv3)] {
                            self.clipped_vertices.extend_from_slice(&p);
                            self.clipped_uvs.extend_from_slice(&uv);
                        }
                        self.clipped_triangles.extend_from_slice(&[base, base + 1, base + 2]);
                        continue 'triangles;
                    }
                    PieceClip::Partial => {
                        let base = self.vertex_count();
                        for &p in &self.polygon {
                            let (a, b, c) = barycentric.weights(p);
                            self.clipped_vertices.extend_from_slice(&p);
                            self.clipped_uvs.push(uv1[0] * a + uv2[0] * b + uv3[0] * c);
                            self.clipped_uvs.push(uv1[1] * a + uv2[1] * b + uv3[1] * c);
                        }
                        let count = self.polygon.len() as u32;
                        for k in 1..count - 1 {
                            self.clipped_triangles
                                .extend_from_slice(&[base, base + k, base + k + 1]);
                        }
                    }
                }
            }
        }
        self.pieces = pieces;

        self.vertex_count() as usize
    }

    fn vertex_count(&self) -> u32 {
        (self.clipped_vertices.len() / 2) as u32
    }

    /// Sutherland–Hodgman against one counter-clockwise convex piece. Points on
    /// an edge count as inside.
    fn clip_against_piece(&mut self, triangle: [Point; 3], piece: &[Point]) -> PieceClip {
        self.polygon.clear();
        self.polygon.extend_from_slice(&triangle);
        let mut clipped = false;

        let n = piece.len();
        for k in 0..n {
            let e0 = piece[k];
            let e1 = piece[(k + 1) % n];
            let (ex, ey) = (e1[0] - e0[0], e1[1] - e0[1]);
            if ex == 0.0 && ey == 0.0 {
                continue;
            }
            let side = |p: Point| ex * (p[1] - e0[1]) - ey * (p[0] - e0[0]);

            self.polygon_scratch.clear();
            let m = self.polygon.len();
            for i in 0..m {
                let a = self.polygon[i];
                let b = self.polygon[(i + 1) % m];
                let (sa, sb) = (side(a), side(b));
                let out = &mut self.polygon_scratch;
                match (sa >= 0.0, sb >= 0.0) {
                    (true, true) => push_distinct(out, b),
                    (true, false) => {
                        clipped = true;
                        push_distinct(out, lerp(a, b, sa / (sa - sb)));
                    }
                    (false, true) => {
                        clipped = true;
                        push_distinct(out, lerp(a, b, sa / (sa - sb)));
                        push_distinct(out, b);
                    }
                    (false, false) => clipped = true,
                }
            }
            while self.polygon_scratch.len() > 1
                && self.polygon_scratch.first() == self.polygon_scratch.last()
            {
                self.polygon_scratch.pop();
            }

            // Fewer than three distinct points covers no area.
            if self.polygon_scratch.len() < 3 {
                self.polygon.clear();
                return PieceClip::Outside;
            }
            std::mem::swap(&mut self.polygon, &mut self.polygon_scratch);
        }

        if clipped {
            PieceClip::Partial
        } else {
            PieceClip::Inside
        }
    }
}

fn push_distinct(out: &mut Vec<Point>, p: Point) {
    if out.last() != Some(&p) {
        out.push(p);
    }
}

#[inline]
fn lerp(a: Point, b: Point, t: f32) -> Point {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
}

/// Barycentric coordinates relative to a source triangle.
struct Barycentric {
    origin: Point,
    d0: f32,
    d1: f32,
    d2: f32,
    d4: f32,
    inv_det: f32,
}

impl Barycentric {
    /// `None` for zero-area triangles, which cannot cover anything.
    fn new(p1: Point, p2: Point, p3: Point) -> Option<Self> {
        let d0 = p2[1] - p3[1];
        let d1 = p3[0] - p2[0];
        let d2 = p1[0] - p3[0];
        let d4 = p3[1] - p1[1];
        let det = d0 * d2 + d1 * (p1[1] - p3[1]);
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Self {
            origin: p3,
            d0,
            d1,
            d2,
            d4,
            inv_det: 1.0 / det,
        })
    }

    fn weights(&self, p: Point) -> (f32, f32, f32) {
        let c0 = p[0] - self.origin[0];
        let c1 = p[1] - self.origin[1];
        let a = (self.d0 * c0 + self.d1 * c1) * self.inv_det;
        let b = (self.d4 * c0 + self.d2 * c1) * self.inv_det;
        (a, b, 1.0 - a - b)
    }
}
