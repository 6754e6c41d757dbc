//! First-person fly camera

use harbor_core::{mat4_mul, Mat4, Vec3};

/// Direction of a keyboard camera move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

pub const DEFAULT_YAW: f32 = -90.0;
pub const DEFAULT_PITCH: f32 = 0.0;
pub const DEFAULT_SPEED: f32 = 2.5;
pub const DEFAULT_SENSITIVITY: f32 = 0.1;
pub const DEFAULT_ZOOM: f32 = 45.0;

/// A yaw/pitch first-person camera.
///
/// Angles are in degrees. Yaw -90 looks down -Z.
pub struct Camera {
    pub position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    /// Horizontal angle in degrees
    pub yaw: f32,
    /// Vertical angle in degrees, kept within [-89, 89] by mouse input
    pub pitch: f32,
    /// Movement speed in units per second
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    /// Vertical field of view in degrees
    pub zoom: f32,
    pub near: f32,
    pub far: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0))
    }
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::FORWARD,
            up: Vec3::UP,
            right: Vec3::new(1.0, 0.0, 0.0),
            world_up: Vec3::UP,
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            movement_speed: DEFAULT_SPEED,
            mouse_sensitivity: DEFAULT_SENSITIVITY,
            zoom: DEFAULT_ZOOM,
            near: 0.1,
            far: 100.0,
            aspect: 800.0 / 600.0,
        };
        camera.update_vectors();
        camera
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Point the camera along `front`, deriving yaw and pitch from it
    pub fn set_front(&mut self, front: Vec3) {
        let f = front.normalized();
        if f == Vec3::ZERO {
            return;
        }
        self.pitch = f.y.clamp(-1.0, 1.0).asin().to_degrees().clamp(-89.0, 89.0);
        self.yaw = f.z.atan2(f.x).to_degrees();
        self.update_vectors();
    }

    /// Move along the camera axes, scaled by frame time
    pub fn process_keyboard(&mut self, direction: CameraMovement, delta_time: f32) {
        let velocity = self.movement_speed * delta_time;
        match direction {
            CameraMovement::Forward => self.position += self.front * velocity,
            CameraMovement::Backward => self.position -= self.front * velocity,
            CameraMovement::Left => self.position -= self.right * velocity,
            CameraMovement::Right => self.position += self.right * velocity,
        }
    }

    /// Apply a mouse offset. Positive `y_offset` looks up.
    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32, constrain_pitch: bool) {
        self.yaw += x_offset * self.mouse_sensitivity;
        self.pitch += y_offset * self.mouse_sensitivity;

        if constrain_pitch {
            self.pitch = self.pitch.clamp(-89.0, 89.0);
        }
        self.update_vectors();
    }

    /// Narrow or widen the field of view; scrolling up zooms in
    pub fn process_scroll(&mut self, y_offset: f32) {
        self.zoom = (self.zoom - y_offset).clamp(1.0, DEFAULT_ZOOM);
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalized();
        self.right = self.front.cross(&self.world_up).normalized();
        self.up = self.right.cross(&self.front).normalized();
    }

    /// Get the view matrix (4x4, column-major)
    pub fn view_matrix(&self) -> Mat4 {
        let f = self.front;
        let s = self.right;
        let u = self.up;

        [
            [s.x, u.x, -f.x, 0.0],
            [s.y, u.y, -f.y, 0.0],
            [s.z, u.z, -f.z, 0.0],
            [
                -s.dot(&self.position),
                -u.dot(&self.position),
                f.dot(&self.position),
                1.0,
            ],
        ]
    }

    /// Perspective projection mapping depth to [0, 1] (wgpu convention)
    pub fn projection_matrix(&self) -> Mat4 {
        let f = 1.0 / (self.zoom.to_radians() / 2.0).tan();
        let range = self.near - self.far;

        [
            [f / self.aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, self.far / range, -1.0],
            [0.0, 0.0, self.near * self.far / range, 0.0],
        ]
    }

    /// Get combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        mat4_mul(&self.projection_matrix(), &self.view_matrix())
    }
}
