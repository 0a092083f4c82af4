use glam::{Mat4, Vec3};

/// Camera circling the origin at a fixed height.
#[derive(Debug, Copy, Clone)]
pub struct OrbitCamera {
    pub radius: f32,
    pub height: f32,
    /// Radians per second.
    pub speed: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            radius: 90.0,
            height: 45.0,
            speed: 0.15,
            fov_y: 50f32.to_radians(),
            near: 0.5,
            far: 500.0,
        }
    }
}

impl OrbitCamera {
    pub fn eye(&self, t: f32) -> Vec3 {
        let angle = t * self.speed;
        Vec3::new(angle.cos() * self.radius, self.height, angle.sin() * self.radius)
    }

    /// Combined projection * view for time `t` and viewport `aspect`.
    pub fn view_projection(&self, t: f32, aspect: f32) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye(t), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh_gl(self.fov_y, aspect.max(1e-3), self.near, self.far);
        projection * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_projects_to_screen_center() {
        let camera = OrbitCamera::default();
        for t in [0.0, 3.0, 17.5] {
            let clip = camera.view_projection(t, 16.0 / 9.0) * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4, "t={t}: {ndc:?}");
            assert!(ndc.z > -1.0 && ndc.z < 1.0);
        }
    }

    #[test]
    fn eye_stays_on_orbit() {
        let camera = OrbitCamera::default();
        let eye = camera.eye(4.2);
        assert!((Vec3::new(eye.x, 0.0, eye.z).length() - camera.radius).abs() < 1e-3);
        assert_eq!(eye.y, camera.height);
    }
}
