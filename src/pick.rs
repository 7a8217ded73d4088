//! Pointer picking.
//!
//! A click is normalized against the drawing surface's rectangle, turned
//! into a world-space ray through the camera and tested against the bounding
//! spheres of interactive bodies. The starfield and rings never take part.
//! When several bodies are hit the nearest intersection wins.

use log::debug;

use crate::{camera::CameraRig, data_structures::scene_graph::SceneGraph};

/// Where the drawing surface sits, in the coordinate space clicks arrive in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    /// A surface covering its whole window.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: width as f32,
            height: height as f32,
        }
    }

    /// Map a point to normalized device coordinates with y pointing up.
    ///
    /// Points outside the rectangle, or any point on an empty rectangle,
    /// have no mapping.
    pub fn to_ndc(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let u = (x - self.left) / self.width;
        let v = (y - self.top) / self.height;
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }
        Some((u * 2.0 - 1.0, 1.0 - v * 2.0))
    }

    /// Inverse of [`SurfaceRect::to_ndc`].
    pub fn from_ndc(&self, ndc_x: f32, ndc_y: f32) -> (f32, f32) {
        (
            self.left + (ndc_x + 1.0) * 0.5 * self.width,
            self.top + (1.0 - ndc_y) * 0.5 * self.height,
        )
    }
}

/// The body struck by a click.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionHit {
    pub name: String,
    pub distance: f32,
}

pub fn resolve(
    rig: &CameraRig,
    graph: &SceneGraph,
    rect: &SurfaceRect,
    x: f32,
    y: f32,
) -> Option<InteractionHit> {
    let (ndc_x, ndc_y) = rect.to_ndc(x, y)?;
    let ray = rig.cast_ray(ndc_x, ndc_y)?;
    let hit = graph
        .interactive_bodies()
        .into_iter()
        .filter_map(|(name, center, radius)| {
            ray.intersect_sphere(center, radius)
                .map(|distance| (name, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, distance)| InteractionHit {
            name: name.to_string(),
            distance,
        });
    debug!("Click at ({}, {}) resolved to {:?}", x, y, hit);
    hit
}
