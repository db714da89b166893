//! Orbiting perspective camera for terminal cells.
//!
//! The camera circles the world origin at a fixed radius and always looks at
//! it. Clicks are mapped back into the world on the plane that passes
//! through the origin and faces the camera.

use crate::vec3::Vec3;

mod constants {
    pub const ORBIT_RADIUS: f32 = 30.0;
    /// Radians per frame
    pub const ORBIT_SPEED: f32 = 0.002;
    pub const FOV_Y_DEG: f32 = 75.0;
    pub const NEAR: f32 = 0.1;
    /// Terminal cells are roughly twice as tall as they are wide
    pub const CELL_ASPECT: f32 = 0.5;
}

/// A point projected onto the terminal grid (fractional cells)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
}

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub angle: f32,
    pub radius: f32,
    pub orbit_speed: f32,
    fov_y: f32,
    width: f32,
    height: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl OrbitCamera {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            angle: 0.0,
            radius: constants::ORBIT_RADIUS,
            orbit_speed: constants::ORBIT_SPEED,
            fov_y: constants::FOV_Y_DEG.to_radians(),
            width: width.max(1) as f32,
            height: height.max(1) as f32,
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width.max(1) as f32;
        self.height = height.max(1) as f32;
    }

    /// Move one frame along the orbit
    pub fn advance(&mut self) {
        self.angle = (self.angle + self.orbit_speed) % std::f32::consts::TAU;
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.angle.sin() * self.radius, 0.0, self.angle.cos() * self.radius)
    }

    /// Orthonormal camera basis: (right, up, forward)
    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = (-self.position()).normalize_or(Vec3::new(0.0, 0.0, -1.0));
        let right = forward.cross(Vec3::UP).normalize_or(Vec3::new(1.0, 0.0, 0.0));
        let up = right.cross(forward);
        (right, up, forward)
    }

    fn half_extents(&self) -> (f32, f32) {
        let half_h = (self.fov_y * 0.5).tan();
        let aspect = self.width * constants::CELL_ASPECT / self.height;
        (half_h * aspect, half_h)
    }

    /// Project a world point to fractional cell coordinates; `None` behind the camera
    pub fn project(&self, point: Vec3) -> Option<ScreenPoint> {
        let (right, up, forward) = self.basis();
        let rel = point - self.position();
        let depth = rel.dot(forward);
        if depth < constants::NEAR {
            return None;
        }
        let (half_w, half_h) = self.half_extents();
        let ndc_x = rel.dot(right) / (depth * half_w);
        let ndc_y = rel.dot(up) / (depth * half_h);
        Some(ScreenPoint {
            x: (ndc_x + 1.0) * 0.5 * self.width,
            y: (1.0 - ndc_y) * 0.5 * self.height,
            depth,
        })
    }

    /// World point under the centre of a cell, on the camera-facing plane through the origin
    pub fn unproject(&self, col: u16, row: u16) -> Vec3 {
        let (right, up, forward) = self.basis();
        let (half_w, half_h) = self.half_extents();
        let ndc_x = (col as f32 + 0.5) / self.width * 2.0 - 1.0;
        let ndc_y = 1.0 - (row as f32 + 0.5) / self.height * 2.0;
        let dir = forward + right * (ndc_x * half_w) + up * (ndc_y * half_h);
        let t = self.radius / dir.dot(forward);
        self.position() + dir * t
    }
}
