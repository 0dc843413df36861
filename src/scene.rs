// src/scene.rs
// Scene graph: a root with renderable and light children.
// The scene is assembled once at startup; nodes are never removed.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::geometry::Geometry;
use crate::material::SurfaceMaterial;

/// Maximum point lights packed into the light uniform.
pub const MAX_POINT_LIGHTS: usize = 4;

/// Index of a child of the scene root.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One geometry paired with one material.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: SurfaceMaterial,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: SurfaceMaterial) -> Self {
        Self { geometry, material }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Uniform light from every direction.
    Ambient { color: Vec3, intensity: f32 },
    /// Omni light with inverse-power falloff. `distance == 0` means no cutoff.
    Point {
        color: Vec3,
        intensity: f32,
        position: Vec3,
        distance: f32,
        decay: f32,
    },
}

impl Light {
    pub fn ambient(color: Vec3, intensity: f32) -> Self {
        Light::Ambient { color, intensity }
    }

    pub fn point(color: Vec3, intensity: f32, position: Vec3) -> Self {
        Light::Point {
            color,
            intensity,
            position,
            distance: 0.0,
            decay: 2.0,
        }
    }
}

/// Linear distance fog. Only materials with their fog flag set are affected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Vec3,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone)]
pub enum SceneNode {
    Mesh(Mesh),
    Light(Light),
}

impl From<Mesh> for SceneNode {
    fn from(mesh: Mesh) -> Self {
        SceneNode::Mesh(mesh)
    }
}

impl From<Light> for SceneNode {
    fn from(light: Light) -> Self {
        SceneNode::Light(light)
    }
}

/// Scene container
#[derive(Debug, Clone, Default)]
pub struct Scene {
    children: Vec<SceneNode>,
    pub fog: Option<Fog>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a node to the root.
    pub fn add(&mut self, node: impl Into<SceneNode>) -> NodeId {
        let id = NodeId(self.children.len() as u32);
        let node = node.into();
        match &node {
            SceneNode::Mesh(mesh) => log::debug!(
                "Scene: mesh #{} ({} vertices)",
                id.0,
                mesh.geometry.vertex_count()
            ),
            SceneNode::Light(light) => log::debug!("Scene: light #{} {:?}", id.0, light),
        }
        self.children.push(node);
        id
    }

    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.children.iter().filter_map(|n| match n {
            SceneNode::Light(l) => Some(l),
            _ => None,
        })
    }

    pub fn mesh_mut(&mut self, id: NodeId) -> Option<&mut Mesh> {
        match self.children.get_mut(id.index()) {
            Some(SceneNode::Mesh(m)) => Some(m),
            _ => None,
        }
    }

    pub fn mesh(&self, id: NodeId) -> Option<&Mesh> {
        match self.children.get(id.index()) {
            Some(SceneNode::Mesh(m)) => Some(m),
            _ => None,
        }
    }

    /// Pack lights and fog for the shader. Ambient lights add up; point lights
    /// past `MAX_POINT_LIGHTS` are dropped.
    pub fn light_uniform(&self) -> LightsUniform {
        let mut u = LightsUniform::zeroed();
        let mut ambient = Vec3::ZERO;
        let mut count = 0usize;

        for light in self.lights() {
            match *light {
                Light::Ambient { color, intensity } => ambient += color * intensity,
                Light::Point { color, intensity, position, distance, decay } => {
                    if count == MAX_POINT_LIGHTS {
                        log::warn!("Scene has more than {} point lights; extra ignored", MAX_POINT_LIGHTS);
                        continue;
                    }
                    u.point_position[count] = position.extend(distance).to_array();
                    u.point_color[count] = (color * intensity).extend(decay).to_array();
                    count += 1;
                }
            }
        }

        u.ambient = ambient.extend(0.0).to_array();
        u.counts = [count as u32, 0, 0, 0];
        if let Some(fog) = self.fog {
            u.fog_color = fog.color.extend(1.0).to_array();
            u.fog_range = [fog.near, fog.far, 0.0, 0.0];
        }
        u
    }
}

/// GPU light block (matches shader layout).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightsUniform {
    /// rgb = color * intensity
    pub ambient: [f32; 4],
    /// xyz = position, w = cutoff distance (0 = none)
    pub point_position: [[f32; 4]; MAX_POINT_LIGHTS],
    /// rgb = color * intensity, w = decay exponent
    pub point_color: [[f32; 4]; MAX_POINT_LIGHTS],
    /// rgb = fog color, w = 1 when fog is on
    pub fog_color: [f32; 4],
    /// x = near, y = far
    pub fog_range: [f32; 4],
    /// x = point light count
    pub counts: [u32; 4],
}
