//! Chase camera that trails the player down the course.

use glam::{Mat4, Vec3};

use crate::player::Player;

/// Vertical field of view in degrees
pub const CAMERA_FOV_Y_DEG: f32 = 60.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;

/// Camera sits this far behind the player
pub const FOLLOW_DISTANCE: f32 = 10.0;
/// Camera height above the player
pub const FOLLOW_HEIGHT: f32 = 2.0;
/// Per-tick easing for the camera's x/y
pub const FOLLOW_EASE: f32 = 0.1;
/// Look-at point is this far ahead of the player
const LOOK_AHEAD: f32 = 3.0;
const LOOK_HEIGHT: f32 = 0.5;

const START_POSITION: Vec3 = Vec3::new(0.0, 3.0, 15.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: START_POSITION,
            target: Vec3::ZERO,
        }
    }

    /// Ease towards the chase position behind `player`.
    pub fn follow(&mut self, player: &Player) {
        let want_x = player.x * 0.5;
        let want_y = player.y + FOLLOW_HEIGHT;
        self.position.x += (want_x - self.position.x) * FOLLOW_EASE;
        self.position.y += (want_y - self.position.y) * FOLLOW_EASE;
        self.position.z = player.z + FOLLOW_DISTANCE;
        self.target = Vec3::new(player.x, player.y + LOOK_HEIGHT, player.z - LOOK_AHEAD);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Perspective for a viewport of the given aspect (width / height).
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            CAMERA_FOV_Y_DEG.to_radians(),
            aspect.max(0.01),
            CAMERA_NEAR,
            CAMERA_FAR,
        )
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_tracks_player_z_exactly() {
        let mut cam = Camera::new();
        let mut p = Player::new();
        p.z = -120.0;
        cam.follow(&p);
        assert_eq!(cam.position.z, -110.0);
        assert_eq!(cam.target.z, -123.0);
    }

    #[test]
    fn test_follow_eases_x_and_y() {
        let mut cam = Camera::new();
        let mut p = Player::new();
        p.x = 2.0;
        cam.follow(&p);
        assert!((cam.position.x - 0.1).abs() < 1e-6);
        // 3.0 eases toward 2.0
        assert!((cam.position.y - 2.9).abs() < 1e-6);
    }

    #[test]
    fn test_point_ahead_projects_in_front() {
        let mut cam = Camera::new();
        let p = Player::new();
        cam.follow(&p);
        let clip = cam.view_projection(2.0) * glam::Vec4::new(0.0, 0.0, -20.0, 1.0);
        assert!(clip.w > 0.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1.0 && ndc.y.abs() < 1.0);
    }
}
