//! Render pipelines.
//!
//! All pipelines share the same bind group layout order:
//! 0 camera, 1 lights, 2 per-object uniform.

pub mod basic;
pub mod body;
pub mod light;
pub mod ring;
pub mod stars;
