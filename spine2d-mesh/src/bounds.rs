//! Axis-aligned bounds of posed skeletons.

use crate::{Attachment, Error, PoseSolver, ScratchBuffer, Skeleton, SkeletonClipper};

/// Axis-aligned rectangle; `(x, y)` is the minimum corner.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const ZERO: Bounds = Bounds {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_min_max(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::from_min_max(
            self.x.min(other.x),
            self.y.min(other.y),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }

    #[cfg(feature = "glam")]
    pub fn min_max(&self) -> (glam::Vec2, glam::Vec2) {
        (
            glam::Vec2::new(self.x, self.y),
            glam::Vec2::new(self.max_x(), self.max_y()),
        )
    }
}

#[derive(Copy, Clone, Debug)]
struct Extents {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Extents {
    const EMPTY: Extents = Extents {
        min_x: f32::INFINITY,
        min_y: f32::INFINITY,
        max_x: f32::NEG_INFINITY,
        max_y: f32::NEG_INFINITY,
    };

    fn include(&mut self, points: &[f32]) {
        for point in points.chunks_exact(2) {
            self.min_x = self.min_x.min(point[0]);
            self.min_y = self.min_y.min(point[1]);
            self.max_x = self.max_x.max(point[0]);
            self.max_y = self.max_y.max(point[1]);
        }
    }

    fn to_bounds(self) -> Option<Bounds> {
        (self.min_x <= self.max_x && self.min_y <= self.max_y)
            .then(|| Bounds::from_min_max(self.min_x, self.min_y, self.max_x, self.max_y))
    }
}

/// Bounds of every region and mesh attachment in the skeleton's current pose.
///
/// With a clipper, geometry is clipped the same way rendering clips it.
/// Returns `None` when nothing is visible.
pub fn skeleton_bounds(
    skeleton: &Skeleton,
    mut clipper: Option<&mut SkeletonClipper>,
) -> Option<Bounds> {
    let mut extents = Extents::EMPTY;
    let mut world = ScratchBuffer::<f32>::new();

    for &slot_index in &skeleton.draw_order {
        let Some(slot) = skeleton.slots.get(slot_index) else {
            continue;
        };
        if !skeleton.bones.get(slot.bone).is_some_and(|bone| bone.active) {
            continue;
        }

        match slot.attachment.as_deref() {
            Some(Attachment::Clipping(clip)) => {
                if let Some(clipper) = clipper.as_deref_mut() {
                    clipper.clip_start_for_slot(skeleton, slot_index, clip);
                }
                continue;
            }
            Some(attachment) => {
                if let Some(renderable) = attachment.as_renderable() {
                    let out = world.prepare(renderable.world_vertices_length());
                    renderable.compute_world_vertices(skeleton, slot, out, 0, 2);

                    match clipper.as_deref_mut().filter(|clipper| clipper.is_clipping()) {
                        Some(clipper) => {
                            clipper.clip_triangles_unpacked(
                                world.as_slice(),
                                renderable.triangles(),
                                renderable.uvs(),
                            );
                            extents.include(clipper.clipped_vertices());
                        }
                        None => extents.include(world.as_slice()),
                    }
                }
            }
            None => {}
        }

        if let Some(clipper) = clipper.as_deref_mut() {
            clipper.clip_end_with_slot(slot_index);
        }
    }

    if let Some(clipper) = clipper {
        clipper.clip_end();
    }
    extents.to_bounds()
}

/// Computes a skeleton's bounds for layout and culling.
pub trait BoundsProvider {
    /// Works on a copy of `skeleton`; the caller's pose is left untouched.
    fn calculate_bounds(
        &self,
        skeleton: &Skeleton,
        solver: &mut dyn PoseSolver,
    ) -> Result<Bounds, Error>;
}

/// Always reports the same rectangle.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedBounds {
    pub bounds: Bounds,
}

impl FixedBounds {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }
}

impl BoundsProvider for FixedBounds {
    fn calculate_bounds(
        &self,
        _skeleton: &Skeleton,
        _solver: &mut dyn PoseSolver,
    ) -> Result<Bounds, Error> {
        Ok(self.bounds)
    }
}

/// Bounds of the setup pose.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetupPoseBounds {
    /// Apply clipping attachments.
    pub clipping: bool,
}

impl SetupPoseBounds {
    pub fn new(clipping: bool) -> Self {
        Self { clipping }
    }
}

fn posed_bounds(skeleton: &Skeleton, clipping: bool) -> Option<Bounds> {
    let mut clipper = clipping.then(SkeletonClipper::new);
    skeleton_bounds(skeleton, clipper.as_mut())
}

impl BoundsProvider for SetupPoseBounds {
    fn calculate_bounds(
        &self,
        skeleton: &Skeleton,
        solver: &mut dyn PoseSolver,
    ) -> Result<Bounds, Error> {
        let mut posed = skeleton.clone();
        solver.setup_pose(&mut posed);
        Ok(posed_bounds(&posed, self.clipping).unwrap_or(Bounds::ZERO))
    }
}

/// Union of the bounds at every sample of one animation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationBounds {
    pub animation: String,
    /// Seconds between samples.
    pub time_step: f32,
    pub clipping: bool,
}

impl AnimationBounds {
    pub const DEFAULT_TIME_STEP: f32 = 0.05;

    pub fn new(animation: impl Into<String>) -> Self {
        Self {
            animation: animation.into(),
            time_step: Self::DEFAULT_TIME_STEP,
            clipping: false,
        }
    }

    pub fn with_time_step(mut self, time_step: f32) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_clipping(mut self, clipping: bool) -> Self {
        self.clipping = clipping;
        self
    }

    /// Sample times for an animation of `duration` seconds. Always includes 0.
    pub fn sample_times(&self, duration: f32) -> impl Iterator<Item = f32> + use<> {
        let time_step = self.time_step;
        let steps = (duration / time_step).max(1.0);
        let count = steps.ceil() as usize;
        (0..count).map(move |i| i as f32 * time_step)
    }
}

impl BoundsProvider for AnimationBounds {
    fn calculate_bounds(
        &self,
        skeleton: &Skeleton,
        solver: &mut dyn PoseSolver,
    ) -> Result<Bounds, Error> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(Error::InvalidValue {
                message: format!("time step must be positive, got {}", self.time_step),
            });
        }

        let Some(duration) = solver.animation_duration(&self.animation) else {
            log::debug!(
                "animation '{}' not found, using setup pose bounds",
                self.animation
            );
            return SetupPoseBounds::new(self.clipping).calculate_bounds(skeleton, solver);
        };

        let mut posed = skeleton.clone();
        let mut total: Option<Bounds> = None;
        for time in self.sample_times(duration) {
            solver.pose_animation(&mut posed, &self.animation, time);
            if let Some(bounds) = posed_bounds(&posed, self.clipping) {
                total = Some(match total {
                    Some(total) => total.union(&bounds),
                    None => bounds,
                });
            }
        }
        Ok(total.unwrap_or(Bounds::ZERO))
    }
}
