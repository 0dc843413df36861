// src/material.rs
// Shading material for the terrain surface.
//
// Exports:
// - MaterialParams (plain startup values)
// - SurfaceMaterial (textures + live-editable parameters)
// - MaterialProperty (named numeric fields the parameter panel can bind)
// - MaterialUniform (Pod) matching the WGSL `Material` struct

use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::texture::TextureHandle;

/// Material feature flags (bitmask), mirrored in the shader.
pub mod flags {
    pub const FLAT_SHADING: u32 = 1 << 0;
    pub const FOG: u32 = 1 << 1;
}

/// Scalar startup values for a [`SurfaceMaterial`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    pub displacement_bias: f32,
    pub displacement_scale: f32,
    pub flat_shading: bool,
    pub fog: bool,
    pub metalness: f32,
    pub roughness: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            displacement_bias: -2.0,
            displacement_scale: 2.0,
            flat_shading: true,
            fog: true,
            metalness: 0.0,
            roughness: 1.0,
        }
    }
}

/// Color map + displacement map + shading parameters.
///
/// Fields are public and written directly by the parameter panel; there is
/// no validation here.
#[derive(Debug, Clone)]
pub struct SurfaceMaterial {
    pub color_map: TextureHandle,
    pub displacement_map: TextureHandle,
    pub displacement_bias: f32,
    pub displacement_scale: f32,
    pub flat_shading: bool,
    pub fog: bool,
    pub metalness: f32,
    pub roughness: f32,
}

/// Assemble the surface material from its two textures and startup values.
pub fn build_material(
    color_map: TextureHandle,
    displacement_map: TextureHandle,
    params: &MaterialParams,
) -> SurfaceMaterial {
    SurfaceMaterial {
        color_map,
        displacement_map,
        displacement_bias: params.displacement_bias,
        displacement_scale: params.displacement_scale,
        flat_shading: params.flat_shading,
        fog: params.fog,
        metalness: params.metalness,
        roughness: params.roughness,
    }
}

impl SurfaceMaterial {
    pub fn params(&self) -> MaterialParams {
        MaterialParams {
            displacement_bias: self.displacement_bias,
            displacement_scale: self.displacement_scale,
            flat_shading: self.flat_shading,
            fog: self.fog,
            metalness: self.metalness,
            roughness: self.roughness,
        }
    }

    pub fn get(&self, property: MaterialProperty) -> f32 {
        match property {
            MaterialProperty::DisplacementBias => self.displacement_bias,
            MaterialProperty::DisplacementScale => self.displacement_scale,
            MaterialProperty::Metalness => self.metalness,
            MaterialProperty::Roughness => self.roughness,
        }
    }

    pub fn property_mut(&mut self, property: MaterialProperty) -> &mut f32 {
        match property {
            MaterialProperty::DisplacementBias => &mut self.displacement_bias,
            MaterialProperty::DisplacementScale => &mut self.displacement_scale,
            MaterialProperty::Metalness => &mut self.metalness,
            MaterialProperty::Roughness => &mut self.roughness,
        }
    }

    pub fn uniform(&self) -> MaterialUniform {
        let mut bits = 0;
        if self.flat_shading {
            bits |= flags::FLAT_SHADING;
        }
        if self.fog {
            bits |= flags::FOG;
        }
        MaterialUniform {
            displacement_bias: self.displacement_bias,
            displacement_scale: self.displacement_scale,
            metalness: self.metalness,
            roughness: self.roughness,
            flags: bits,
            _pad: [0; 3],
        }
    }
}

/// Numeric material fields addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialProperty {
    DisplacementBias,
    DisplacementScale,
    Metalness,
    Roughness,
}

impl MaterialProperty {
    pub const ALL: [MaterialProperty; 4] = [
        MaterialProperty::DisplacementBias,
        MaterialProperty::DisplacementScale,
        MaterialProperty::Metalness,
        MaterialProperty::Roughness,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MaterialProperty::DisplacementBias => "displacementBias",
            MaterialProperty::DisplacementScale => "displacementScale",
            MaterialProperty::Metalness => "metalness",
            MaterialProperty::Roughness => "roughness",
        }
    }
}

impl fmt::Display for MaterialProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Matches WGSL `Material` struct exactly
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub displacement_bias: f32,
    pub displacement_scale: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub flags: u32,
    pub _pad: [u32; 3],
}
