//! Renderer-agnostic mesh pipeline for posed Spine skeletons (unofficial).
//!
//! Walks a skeleton's draw order and turns region and mesh attachments into
//! tinted, optionally clipped triangle lists ([`DrawList`]). Posing the
//! skeleton and uploading the result are left to the caller.

#![forbid(unsafe_code)]

mod attachment;
mod bounds;
mod buffer;
mod cache;
mod clipping;
mod color;
mod config;
mod error;
mod pose;
mod render;
mod skeleton;
mod texture;
mod triangulate;
mod vertices;

pub use attachment::*;
pub use bounds::*;
pub use buffer::*;
pub use cache::*;
pub use clipping::*;
pub use color::*;
pub use config::*;
pub use error::*;
pub use pose::*;
pub use render::*;
pub use skeleton::*;
pub use texture::*;
pub use vertices::*;


#[cfg(test)]
mod render_tests;
