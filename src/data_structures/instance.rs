//! Object transforms.
//!
//! Every scene object keeps a local transform relative to its parent and a
//! cached world transform. Children inherit their parent's world transform
//! via `parent * local`.

use std::ops::Mul;

use cgmath::{One, Point3, Quaternion, Rad, Rotation3, Vector3};

/// Position, rotation (as quaternion) and scale of a scene object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instance {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Instance {
    /// The identity transform.
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..Self::new()
        }
    }

    /// Rotate about the object's own X axis.
    pub fn spin_x(&mut self, angle: f32) {
        self.rotation = self.rotation * Quaternion::from_angle_x(Rad(angle));
    }

    /// Rotate about the object's own Y axis.
    pub fn spin_y(&mut self, angle: f32) {
        self.rotation = self.rotation * Quaternion::from_angle_y(Rad(angle));
    }

    /// Rotate about the object's own Z axis.
    pub fn spin_z(&mut self, angle: f32) {
        self.rotation = self.rotation * Quaternion::from_angle_z(Rad(angle));
    }

    pub fn origin(&self) -> Point3<f32> {
        Point3::new(self.position.x, self.position.y, self.position.z)
    }

    /// Largest scale component; spheres scaled by this stay conservative.
    pub fn max_scale(&self) -> f32 {
        self.scale.x.abs().max(self.scale.y.abs()).max(self.scale.z.abs())
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        let normal: [[f32; 3]; 3] = cgmath::Matrix3::from(self.rotation).into();
        InstanceRaw {
            model: self.to_matrix().into(),
            normal: normal.map(|[x, y, z]| [x, y, z, 0.0]),
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let scaled_rhs_pos = Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        Instance {
            position: self.position + (self.rotation * scaled_rhs_pos),
            rotation: self.rotation * rhs.rotation,
            scale: Vector3::new(
                self.scale.x * rhs.scale.x,
                self.scale.y * rhs.scale.y,
                self.scale.z * rhs.scale.z,
            ),
        }
    }
}

impl Mul<Instance> for Instance {
    type Output = Instance;

    fn mul(self, rhs: Instance) -> Self::Output {
        &self * &rhs
    }
}

/**
 * The per-object transform as written into each material's uniform buffer.
 *
 * A WGSL `mat3x3<f32>` in a uniform occupies three vec4 columns, so the
 * normal matrix is stored padded.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn child_follows_parent() {
        let mut parent = Instance::at(0.0, 0.0, -50.0);
        parent.spin_y(std::f32::consts::FRAC_PI_2);
        let child = Instance::at(1.0, 0.0, 0.0);
        let world = &parent * &child;
        assert_relative_eq!(world.position.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(world.position.z, -51.0, epsilon = 1e-5);
    }
}
