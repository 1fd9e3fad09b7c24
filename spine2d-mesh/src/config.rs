use crate::{Skeleton, UvSpace};

/// When to emit real dark tint colors instead of [`crate::NEUTRAL_DARK`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DarkTint {
    /// On when any slot of the skeleton has a dark color.
    #[default]
    Auto,
    Enabled,
    Disabled,
}

impl DarkTint {
    pub fn resolve(self, skeleton: &Skeleton) -> bool {
        match self {
            DarkTint::Auto => skeleton.has_dark_tint(),
            DarkTint::Enabled => true,
            DarkTint::Disabled => false,
        }
    }
}

/// Per-renderer settings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RenderConfig {
    /// Overrides the texture page's premultiplied-alpha flag for every attachment.
    pub premultiplied_alpha: Option<bool>,
    pub dark_tint: DarkTint,
    pub uv_space: UvSpace,
    /// Merge consecutive draws that share texture, blend mode and PMA.
    pub batch_draws: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            premultiplied_alpha: None,
            dark_tint: DarkTint::Auto,
            uv_space: UvSpace::Normalized,
            batch_draws: true,
        }
    }
}
