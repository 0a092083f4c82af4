use anyhow::{Context as _, Result};
use glam::{Mat4, Vec3};
use glaku::gl::{Primitive, TextureFormat};
use glaku::{AttributeType, GeometryDesc, ProgramDesc, RenderTargetDesc, UniformType, UniformValue};
use rand::Rng;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use crate::app::{App, AppControl, FrameCtx, GlContext};
use crate::camera::OrbitCamera;
use crate::shapes;

const GLSL_HEADER: &str = "#version 330 core";

const GRID: u32 = 40;
const SPACING: f32 = 4.0;
const MAX_INSTANCES: usize = (GRID * GRID) as usize + 1;

const SKY: [f32; 4] = [0.05, 0.07, 0.12, 1.0];

/// One box instance. `position` is the center of its base.
#[derive(Debug, Copy, Clone)]
pub struct Building {
    pub position: Vec3,
    pub size: Vec3,
    pub color: Vec3,
    /// Phase of the height oscillation; `None` keeps the box static.
    pub phase: Option<f32>,
}

impl Building {
    pub fn model(&self, t: f32) -> Mat4 {
        let pulse = match self.phase {
            Some(phase) => 1.0 + 0.15 * (t * 0.8 + phase).sin(),
            None => 1.0,
        };
        let size = Vec3::new(self.size.x, self.size.y * pulse, self.size.z);
        let center = self.position + Vec3::new(0.0, size.y * 0.5, 0.0);
        Mat4::from_translation(center) * Mat4::from_scale(size)
    }
}

/// Ground slab followed by a `grid` x `grid` block of random towers.
pub fn layout(rng: &mut impl Rng, grid: u32, spacing: f32) -> Vec<Building> {
    let extent = grid as f32 * spacing;
    let mut buildings = Vec::with_capacity((grid * grid) as usize + 1);
    buildings.push(Building {
        position: Vec3::new(0.0, -0.2, 0.0),
        size: Vec3::new(extent + spacing, 0.2, extent + spacing),
        color: Vec3::splat(0.18),
        phase: None,
    });

    let origin = -0.5 * (grid as f32 - 1.0) * spacing;
    for i in 0..grid {
        for j in 0..grid {
            let footprint = spacing * rng.random_range(0.45f32..0.8);
            let tint = rng.random_range(0.5f32..0.9);
            buildings.push(Building {
                position: Vec3::new(origin + i as f32 * spacing, 0.0, origin + j as f32 * spacing),
                size: Vec3::new(footprint, rng.random_range(1.0f32..14.0), footprint),
                color: Vec3::new(tint, tint * 0.95, tint * rng.random_range(0.8f32..1.0)),
                phase: Some(rng.random_range(0.0f32..std::f32::consts::TAU)),
            });
        }
    }
    buildings
}

/// Writes every model matrix, column-major, into `out`.
pub fn write_matrices(buildings: &[Building], t: f32, out: &mut Vec<f32>) {
    out.clear();
    for building in buildings {
        out.extend_from_slice(&building.model(t).to_cols_array());
    }
}

/// Instanced city rendered offscreen, then composited onto the window.
pub struct CityScene {
    camera: OrbitCamera,
    buildings: Vec<Building>,
    matrices: Vec<f32>,
    vignette: f32,
    vignette_dirty: bool,
}

impl CityScene {
    fn render(&mut self, gl: &mut GlContext, t: f32) -> glaku::Result<()> {
        let aspect = gl.width() as f32 / gl.height().max(1) as f32;
        write_matrices(&self.buildings, t, &mut self.matrices);

        gl.bind_render_target("scene")?;
        gl.clear(Some(SKY), Some(1.0));

        gl.use_program("city");
        gl.use_geometry("box");
        gl.update_instanced_attribute("box", "a_mMatrix", &self.matrices)?;

        let light = Vec3::new((t * 0.4).cos() * 50.0, 30.0, (t * 0.4).sin() * 50.0);
        gl.set_uniforms([
            ("u_vpMatrix", Some(UniformValue::Mat4(self.camera.view_projection(t, aspect).to_cols_array()))),
            ("u_lightPosition", Some(light.to_array().into())),
            ("u_ambient", Some(UniformValue::Float(0.25))),
        ]);
        gl.draw_instanced(self.buildings.len() as u32);

        gl.bind_render_target("surface")?;
        gl.clear(Some([0.0, 0.0, 0.0, 1.0]), Some(1.0));

        gl.use_program("composite");
        gl.use_geometry("quad");
        gl.use_texture("scene");
        let unit = gl.texture_unit("scene").unwrap_or(0);
        gl.set_uniforms([
            ("u_scene", Some(UniformValue::Int(unit as i32))),
            ("u_vignette", self.vignette_dirty.then_some(UniformValue::Float(self.vignette))),
        ]);
        self.vignette_dirty = false;
        gl.draw(Primitive::TriangleStrip, false);
        Ok(())
    }
}

impl App for CityScene {
    fn init(gl: &mut GlContext) -> Result<Self> {
        let city = ProgramDesc::new(
            "city",
            include_str!("shaders/city.vert"),
            include_str!("shaders/city.frag"),
        )
        .header(GLSL_HEADER)
        .attribute("a_position", AttributeType::Vec3)
        .attribute("a_normal", AttributeType::Vec3)
        .attribute("a_mMatrix", AttributeType::Mat4)
        .attribute("a_color", AttributeType::Vec3)
        .uniform("u_vpMatrix", UniformType::Mat4)
        .uniform("u_lightPosition", UniformType::Vec3)
        .uniform("u_ambient", UniformType::Float);
        gl.create_program(&city).context("building city program")?;

        gl.compile_program(
            "composite",
            include_str!("shaders/composite.vert"),
            include_str!("shaders/composite.frag"),
            &[],
        )
        .context("building composite program")?;
        gl.resolve_attributes("composite", &[("a_corner", AttributeType::Vec2)])?;
        gl.resolve_uniforms("composite", &[("u_scene", None), ("u_vignette", Some(UniformType::Float))])?;

        let buildings = layout(&mut rand::rng(), GRID, SPACING);
        let colors: Vec<f32> = buildings.iter().flat_map(|b| b.color.to_array()).collect();

        let mesh = shapes::unit_box();
        let desc = GeometryDesc::new("box")
            .attribute("a_position", mesh.positions)
            .attribute("a_normal", mesh.normals)
            .attribute("a_color", colors)
            .index(mesh.indices)
            .instanced("a_mMatrix")
            .instanced("a_color")
            .max_instances(MAX_INSTANCES);
        gl.create_geometry_from_desc(&desc).context("building box geometry")?;
        gl.create_geometry("quad", &[("a_corner", &shapes::fullscreen_quad())], None)
            .context("building quad geometry")?;

        gl.create_render_target("surface", &RenderTargetDesc::Surface)?;
        gl.create_render_target(
            "scene",
            &RenderTargetDesc::Offscreen {
                color: vec![TextureFormat::Rgba16F],
                depth: Some(TextureFormat::Depth24),
            },
        )?;
        let scene_texture = gl
            .render_target_texture("scene", 0)
            .context("scene target has no color attachment")?;
        gl.set_texture("scene", scene_texture);

        log::info!(
            "city: {} instances, capacity {:?}",
            buildings.len(),
            gl.instance_capacity("box", "a_mMatrix")
        );

        Ok(Self {
            camera: OrbitCamera::default(),
            matrices: Vec::with_capacity(buildings.len() * 16),
            buildings,
            vignette: 1.0,
            vignette_dirty: true,
        })
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed || event.repeat {
            return AppControl::Continue;
        }
        match &event.logical_key {
            Key::Named(NamedKey::Escape) => AppControl::Exit,
            Key::Character(c) if c.eq_ignore_ascii_case("v") => {
                self.vignette = 1.0 - self.vignette;
                self.vignette_dirty = true;
                AppControl::Continue
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, frame: &mut FrameCtx<'_>) -> AppControl {
        match self.render(frame.gl, frame.time.elapsed) {
            Ok(()) => AppControl::Continue,
            Err(e) => {
                log::error!("frame {} failed: {e}", frame.time.frame_index);
                AppControl::Exit
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn layout_has_ground_plus_grid() {
        let buildings = layout(&mut StdRng::seed_from_u64(7), 5, 2.0);
        assert_eq!(buildings.len(), 26);
        assert!(buildings[0].phase.is_none());
        assert!(buildings[1..].iter().all(|b| b.phase.is_some()));
        assert!(buildings[1..].iter().all(|b| b.size.x < 2.0 && b.size.y >= 1.0));
    }

    #[test]
    fn building_base_sits_on_its_elevation() {
        let b = Building {
            position: Vec3::new(3.0, 0.0, -2.0),
            size: Vec3::new(1.0, 10.0, 1.0),
            color: Vec3::ONE,
            phase: None,
        };
        let base = b.model(0.0).transform_point3(Vec3::new(0.0, -0.5, 0.0));
        let top = b.model(0.0).transform_point3(Vec3::new(0.0, 0.5, 0.0));
        assert!((base - Vec3::new(3.0, 0.0, -2.0)).length() < 1e-5);
        assert!((top.y - 10.0).abs() < 1e-5);
    }

    #[test]
    fn matrices_are_sixteen_floats_per_instance() {
        let buildings = layout(&mut StdRng::seed_from_u64(1), 3, 4.0);
        let mut out = vec![1.0; 3];
        write_matrices(&buildings, 1.5, &mut out);
        assert_eq!(out.len(), buildings.len() * 16);
    }
}
