// src/gpu/texture.rs
//! GPU-side textures: uploads of decoded images, the 1x1 placeholders sampled
//! while a load is pending, and the depth target.

use crate::error::Result;
use crate::texture::{ColorEncoding, DecodedImage, FilterMode, TextureHandle};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// White: an untextured surface still shows lighting.
pub const COLOR_PLACEHOLDER: [u8; 4] = [255, 255, 255, 255];
/// Black: zero elevation, so only the bias displaces the surface.
pub const ELEVATION_PLACEHOLDER: [u8; 4] = [0, 0, 0, 255];

/// Texture format for RGBA8 data with the given encoding. sRGB textures are
/// decoded to linear by the sampler.
pub fn format_for(encoding: ColorEncoding) -> wgpu::TextureFormat {
    match encoding {
        ColorEncoding::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        ColorEncoding::Linear => wgpu::TextureFormat::Rgba8Unorm,
    }
}

pub fn filter_for(filter: FilterMode) -> wgpu::FilterMode {
    match filter {
        FilterMode::Linear => wgpu::FilterMode::Linear,
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
    }
}

pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub size: wgpu::Extent3d,
}

impl GpuTexture {
    /// Upload tightly packed RGBA8 pixels.
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        image: &DecodedImage,
        encoding: ColorEncoding,
        filter: FilterMode,
    ) -> Result<Self> {
        let expected = image.width as usize * image.height as usize * 4;
        crate::ensure!(
            image.width > 0 && image.height > 0 && image.pixels.len() == expected,
            "texture {}: {} bytes for {}x{} RGBA",
            label,
            image.pixels.len(),
            image.width,
            image.height
        );

        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: format_for(encoding),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &image.pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(image.bytes_per_row()),
                rows_per_image: Some(image.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let filter = filter_for(filter);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
            size,
        })
    }

    pub fn placeholder(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        rgba: [u8; 4],
        encoding: ColorEncoding,
    ) -> Result<Self> {
        let image = DecodedImage {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        };
        Self::from_rgba(device, queue, label, &image, encoding, FilterMode::Nearest)
    }
}

/// A texture handle paired with what the GPU currently samples for it.
pub struct TextureSlot {
    handle: TextureHandle,
    label: String,
    gpu: GpuTexture,
    uploaded: bool,
}

impl TextureSlot {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        handle: TextureHandle,
        placeholder: [u8; 4],
    ) -> Result<Self> {
        let gpu = GpuTexture::placeholder(device, queue, label, placeholder, handle.encoding())?;
        Ok(Self {
            handle,
            label: label.to_string(),
            gpu,
            uploaded: false,
        })
    }

    pub fn gpu(&self) -> &GpuTexture {
        &self.gpu
    }

    /// Swap the placeholder for real pixels once the handle is ready.
    /// Returns true when the GPU texture changed (bind groups must be rebuilt).
    pub fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<bool> {
        if self.uploaded {
            return Ok(false);
        }
        let Some(image) = self.handle.image() else {
            return Ok(false);
        };
        self.gpu = GpuTexture::from_rgba(
            device,
            queue,
            &self.label,
            &image,
            self.handle.encoding(),
            self.handle.filter(),
        )?;
        self.uploaded = true;
        log::info!("Uploaded {} ({}x{})", self.label, image.width, image.height);
        Ok(true)
    }
}

/// Depth attachment matching the surface size.
pub struct DepthTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl DepthTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_map_samples_as_srgb() {
        assert_eq!(format_for(ColorEncoding::Srgb), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(format_for(ColorEncoding::Linear), wgpu::TextureFormat::Rgba8Unorm);
        assert!(format_for(ColorEncoding::Srgb).is_srgb());
    }

    #[test]
    fn test_filter_mapping() {
        assert_eq!(filter_for(FilterMode::Linear), wgpu::FilterMode::Linear);
        assert_eq!(filter_for(FilterMode::Nearest), wgpu::FilterMode::Nearest);
    }
}
