//! Camera, projection and picking rays.
//!
//! The camera rig is owned by exactly one scene session. Its projection is
//! recomputed on every resize with a positive size; degenerate sizes are
//! ignored until a usable size shows up again.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3, Vector4};

use crate::config::CameraConfig;

/// cgmath builds OpenGL clip space (z in -1..1), wgpu expects z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    /// A camera on the z axis looking at the origin.
    pub fn on_axis(distance: f32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, distance),
            target: Point3::origin(),
            up: Vector3::unit_y(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fovy(&self) -> Rad<f32> {
        self.fovy
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// A half line in world space. `direction` is always normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn point_at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }

    /// Distance to the nearest intersection with a sphere in front of the
    /// origin, if any. Origins inside the sphere report the exit point.
    pub fn intersect_sphere(&self, center: Point3<f32>, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.magnitude2() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let near = -b - root;
        let far = -b + root;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            Some(far)
        } else {
            None
        }
    }
}

/// The session's perspective camera together with the viewport it renders to.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    pub camera: Camera,
    pub projection: Projection,
    width: u32,
    height: u32,
}

impl CameraRig {
    /// The caller guarantees a positive viewport; see [`crate::builder`].
    pub fn new(camera: Camera, config: &CameraConfig, width: u32, height: u32) -> Self {
        let projection = Projection::new(
            width,
            height,
            cgmath::Deg(config.fovy_degrees),
            config.znear,
            config.zfar,
        );
        Self {
            camera,
            projection,
            width,
            height,
        }
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns `true` if the projection changed.
    ///
    /// Zero sizes are skipped and reapplying the current size is a no-op.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            log::warn!("Ignoring resize to degenerate viewport {}x{}", width, height);
            return false;
        }
        if (width, height) == (self.width, self.height) {
            return false;
        }
        self.width = width;
        self.height = height;
        self.projection.resize(width, height);
        true
    }

    /// View-projection in OpenGL clip space; used for picking and projection.
    pub fn view_proj(&self) -> Matrix4<f32> {
        self.projection.calc_matrix() * self.camera.calc_matrix()
    }

    /// Cast a ray from the camera through a point in normalized device
    /// coordinates (both axes in `[-1, 1]`, y pointing up).
    pub fn cast_ray(&self, ndc_x: f32, ndc_y: f32) -> Option<Ray> {
        let inverse = self.view_proj().invert()?;
        let unproject = |z: f32| {
            let h = inverse * Vector4::new(ndc_x, ndc_y, z, 1.0);
            Point3::new(h.x / h.w, h.y / h.w, h.z / h.w)
        };
        let near = unproject(-1.0);
        let far = unproject(1.0);
        Some(Ray::new(self.camera.position, far - near))
    }

    /// Project a world point to normalized device coordinates.
    pub fn project(&self, point: Point3<f32>) -> Option<(f32, f32)> {
        let clip = self.view_proj() * point.to_homogeneous();
        if clip.w <= 0.0 {
            return None;
        }
        Some((clip.x / clip.w, clip.y / clip.w))
    }
}

/// Camera data as laid out in the uniform buffer.
///
/// `right` and `up` are the camera's world-space basis; the star shader uses
/// them to turn each star into a camera-facing quad.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    right: [f32; 4],
    up: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            right: [1.0, 0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0, 0.0],
        }
    }

    pub fn update_view_proj(&mut self, rig: &CameraRig) {
        let view = rig.camera.calc_matrix();
        self.view_position = rig.camera.position.to_homogeneous().into();
        self.view_proj = (OPENGL_TO_WGPU_MATRIX * rig.view_proj()).into();
        // rows of the view rotation
        self.right = [view.x.x, view.y.x, view.z.x, 0.0];
        self.up = [view.x.y, view.y.y, view.z.y, 0.0];
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}
