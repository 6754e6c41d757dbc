//! Column-major 4x4 matrix helpers

use crate::types::Vec3;

/// A 4x4 column-major matrix, laid out the way WGSL `mat4x4<f32>` expects
pub type Mat4 = [[f32; 4]; 4];

pub fn mat4_identity() -> Mat4 {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Multiply two 4x4 column-major matrices
pub fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut result = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }
    result
}

pub fn mat4_transform_point(m: &Mat4, p: Vec3) -> Vec3 {
    let x = m[0][0] * p.x + m[1][0] * p.y + m[2][0] * p.z + m[3][0];
    let y = m[0][1] * p.x + m[1][1] * p.y + m[2][1] * p.z + m[3][1];
    let z = m[0][2] * p.x + m[1][2] * p.y + m[2][2] * p.z + m[3][2];
    let w = m[0][3] * p.x + m[1][3] * p.y + m[2][3] * p.z + m[3][3];
    if w.abs() > f32::EPSILON && (w - 1.0).abs() > f32::EPSILON {
        Vec3::new(x / w, y / w, z / w)
    } else {
        Vec3::new(x, y, z)
    }
}

/// Inverse-transpose of the upper 3x3 of `model`, for transforming normals.
///
/// Built from the cofactor columns `b x c`, `c x a`, `a x b` divided by the
/// determinant. A singular matrix yields identity.
pub fn normal_matrix(model: &Mat4) -> Mat4 {
    let a = Vec3::new(model[0][0], model[0][1], model[0][2]);
    let b = Vec3::new(model[1][0], model[1][1], model[1][2]);
    let c = Vec3::new(model[2][0], model[2][1], model[2][2]);

    let bc = b.cross(&c);
    let det = a.dot(&bc);
    if det.abs() < 1e-10 {
        return mat4_identity();
    }
    let inv_det = 1.0 / det;
    let ca = c.cross(&a) * inv_det;
    let ab = a.cross(&b) * inv_det;
    let bc = bc * inv_det;

    [
        [bc.x, bc.y, bc.z, 0.0],
        [ca.x, ca.y, ca.z, 0.0],
        [ab.x, ab.y, ab.z, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Keep only the rotation part of a view matrix (used by the skybox)
pub fn strip_translation(view: &Mat4) -> Mat4 {
    let mut m = *view;
    m[0][3] = 0.0;
    m[1][3] = 0.0;
    m[2][3] = 0.0;
    m[3] = [0.0, 0.0, 0.0, 1.0];
    m
}

/// Incremental model-matrix builder.
///
/// Each call post-multiplies, so operations apply to the object in reverse
/// call order: `translate(..).rotate_deg(..).scale(..)` scales first.
#[derive(Clone, Copy, Debug)]
pub struct ModelMatrix(Mat4);

impl Default for ModelMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelMatrix {
    pub fn new() -> Self {
        Self(mat4_identity())
    }

    pub fn translate(self, offset: Vec3) -> Self {
        let mut t = mat4_identity();
        t[3] = [offset.x, offset.y, offset.z, 1.0];
        Self(mat4_mul(&self.0, &t))
    }

    pub fn scale(self, factor: Vec3) -> Self {
        let mut s = mat4_identity();
        s[0][0] = factor.x;
        s[1][1] = factor.y;
        s[2][2] = factor.z;
        Self(mat4_mul(&self.0, &s))
    }

    pub fn uniform_scale(self, factor: f32) -> Self {
        self.scale(Vec3::splat(factor))
    }

    /// Rotate by `degrees` about `axis` (normalized internally).
    pub fn rotate_deg(self, degrees: f32, axis: Vec3) -> Self {
        self.rotate_rad(degrees.to_radians(), axis)
    }

    pub fn rotate_rad(self, radians: f32, axis: Vec3) -> Self {
        let a = axis.normalized();
        let (s, c) = radians.sin_cos();
        let t = 1.0 - c;

        let r = [
            [c + t * a.x * a.x, t * a.x * a.y + s * a.z, t * a.x * a.z - s * a.y, 0.0],
            [t * a.x * a.y - s * a.z, c + t * a.y * a.y, t * a.y * a.z + s * a.x, 0.0],
            [t * a.x * a.z + s * a.y, t * a.y * a.z - s * a.x, c + t * a.z * a.z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        Self(mat4_mul(&self.0, &r))
    }

    pub fn build(self) -> Mat4 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_identity_mul() {
        let m = ModelMatrix::new().translate(Vec3::new(1.0, 2.0, 3.0)).build();
        assert_eq!(mat4_mul(&mat4_identity(), &m), m);
        assert_eq!(mat4_mul(&m, &mat4_identity()), m);
    }

    #[test]
    fn test_translate_moves_point() {
        let m = ModelMatrix::new().translate(Vec3::new(0.0, 1.0, -5.0)).build();
        let p = mat4_transform_point(&m, Vec3::ZERO);
        assert!(approx(p, Vec3::new(0.0, 1.0, -5.0)));
    }

    #[test]
    fn test_rotate_y_90() {
        let m = ModelMatrix::new().rotate_deg(90.0, Vec3::UP).build();
        let p = mat4_transform_point(&m, Vec3::new(1.0, 0.0, 0.0));
        assert!(approx(p, Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn test_scale_applies_before_translate() {
        let m = ModelMatrix::new()
            .translate(Vec3::new(0.0, 7.0, 0.0))
            .uniform_scale(2.0)
            .build();
        let p = mat4_transform_point(&m, Vec3::new(1.0, 1.0, 1.0));
        assert!(approx(p, Vec3::new(2.0, 9.0, 2.0)));
    }

    #[test]
    fn test_normal_matrix_undoes_nonuniform_scale() {
        let m = ModelMatrix::new().scale(Vec3::new(1.0, 0.5, 1.0)).build();
        let n = normal_matrix(&m);
        assert!((n[1][1] - 2.0).abs() < 1e-6);
        assert!((n[0][0] - 1.0).abs() < 1e-6);

        // A slanted surface normal stays perpendicular after the transform
        let tangent = mat4_transform_point(&m, Vec3::new(1.0, 1.0, 0.0));
        let normal = mat4_transform_point(&n, Vec3::new(1.0, -1.0, 0.0));
        assert!(tangent.dot(&normal).abs() < 1e-6);
    }

    #[test]
    fn test_normal_matrix_of_rotation_is_rotation() {
        let m = ModelMatrix::new().rotate_deg(90.0, Vec3::UP).build();
        let n = normal_matrix(&m);
        for col in 0..3 {
            for row in 0..3 {
                assert!((n[col][row] - m[col][row]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_strip_translation_keeps_rotation() {
        let m = ModelMatrix::new()
            .translate(Vec3::new(4.0, 5.0, 6.0))
            .rotate_deg(90.0, Vec3::UP)
            .build();
        let stripped = strip_translation(&m);
        assert_eq!(stripped[3], [0.0, 0.0, 0.0, 1.0]);
        let p = mat4_transform_point(&stripped, Vec3::new(1.0, 0.0, 0.0));
        assert!(approx(p, Vec3::new(0.0, 0.0, -1.0)));
    }
}
