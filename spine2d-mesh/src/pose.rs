use crate::Skeleton;

/// Poses a skeleton for bounds sampling.
///
/// Animation playback and constraint solving live outside this crate; bounds
/// providers only need to put a skeleton into a known pose and read back the
/// resulting world transforms.
pub trait PoseSolver {
    /// Resets `skeleton` to its setup pose and updates world transforms.
    fn setup_pose(&mut self, skeleton: &mut Skeleton);

    /// Duration in seconds, or `None` if the animation does not exist.
    fn animation_duration(&self, animation: &str) -> Option<f32>;

    /// Applies `animation` at `time` seconds on top of the setup pose and
    /// updates world transforms.
    fn pose_animation(&mut self, skeleton: &mut Skeleton, animation: &str, time: f32);
}

/// Solver for skeletons whose world transforms are already final.
///
/// Every pose is the skeleton as given and no animation exists.
#[derive(Copy, Clone, Debug, Default)]
pub struct StaticPose;

impl PoseSolver for StaticPose {
    fn setup_pose(&mut self, _skeleton: &mut Skeleton) {}

    fn animation_duration(&self, _animation: &str) -> Option<f32> {
        None
    }

    fn pose_animation(&mut self, _skeleton: &mut Skeleton, _animation: &str, _time: f32) {}
}
