// src/texture.rs
//! Asynchronous texture loading.
//!
//! `AssetLoader::load` returns a [`TextureHandle`] immediately. Decoding runs on
//! a background thread and flips the handle from `Pending` to `Ready` (or
//! `Failed`) exactly once. The draw path polls the handle every frame and keeps
//! sampling a placeholder until real pixels show up.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use image::imageops::FilterType;
use image::GenericImageView;
use parking_lot::Mutex;

use crate::context::Context;
use crate::error::Result;

/// How the stored texel values should be interpreted by the lighting math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorEncoding {
    /// Values are used as-is (elevation data, masks).
    #[default]
    Linear,
    /// Perceptual encoding, decoded to linear before shading (color maps).
    Srgb,
}

/// Sampling filter used for both magnification and minification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    Linear,
    Nearest,
}

/// Tightly packed RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }
}

/// Load progress of a texture.
#[derive(Debug, Clone)]
pub enum LoadState {
    Pending,
    Ready(Arc<DecodedImage>),
    Failed(String),
}

/// Shared handle to a texture whose pixels may not have arrived yet.
///
/// Cloning is cheap; all clones observe the same load state. Encoding and
/// filter are per-handle and fixed before the handle is given to a material.
#[derive(Debug, Clone)]
pub struct TextureHandle {
    path: Arc<Path>,
    slot: Arc<Mutex<LoadState>>,
    encoding: ColorEncoding,
    filter: FilterMode,
}

impl TextureHandle {
    fn pending(path: &Path) -> Self {
        Self {
            path: Arc::from(path),
            slot: Arc::new(Mutex::new(LoadState::Pending)),
            encoding: ColorEncoding::default(),
            filter: FilterMode::default(),
        }
    }

    /// A handle that is already populated, bypassing the loader.
    pub fn from_image(label: impl AsRef<Path>, image: DecodedImage) -> Self {
        let handle = Self::pending(label.as_ref());
        handle.resolve(Ok(image));
        handle
    }

    /// Mark the texel values as sRGB (or linear).
    pub fn with_encoding(mut self, encoding: ColorEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn encoding(&self) -> ColorEncoding {
        self.encoding
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    /// Snapshot of the current load state.
    pub fn state(&self) -> LoadState {
        self.slot.lock().clone()
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.slot.lock(), LoadState::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.slot.lock(), LoadState::Ready(_))
    }

    /// Decoded pixels, once available.
    pub fn image(&self) -> Option<Arc<DecodedImage>> {
        match &*self.slot.lock() {
            LoadState::Ready(image) => Some(Arc::clone(image)),
            _ => None,
        }
    }

    /// Pixel dimensions, once available.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image().map(|img| (img.width, img.height))
    }

    /// Settle the slot. Only the first call has an effect.
    fn resolve(&self, result: Result<DecodedImage>) {
        let mut slot = self.slot.lock();
        if !matches!(*slot, LoadState::Pending) {
            return;
        }
        *slot = match result {
            Ok(image) => {
                log::info!(
                    "Texture ready: {} ({}x{})",
                    self.path.display(),
                    image.width,
                    image.height
                );
                LoadState::Ready(Arc::new(image))
            }
            Err(err) => {
                log::warn!("Texture {} failed to load: {}", self.path.display(), err);
                LoadState::Failed(err.to_string())
            }
        };
    }
}

/// Spawns one decode thread per `load` call. No caching: loading the same
/// path twice reads and decodes the file twice.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    max_dimension: u32,
}

impl AssetLoader {
    /// `max_dimension` is the largest texture side the GPU accepts; bigger
    /// images are downscaled (aspect preserved) on the decode thread.
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Start loading `path` and return its handle right away.
    pub fn load(&self, path: impl AsRef<Path>) -> TextureHandle {
        let path: PathBuf = path.as_ref().to_path_buf();
        let handle = TextureHandle::pending(&path);
        let worker = handle.clone();
        let max_dimension = self.max_dimension;

        log::debug!("Loading texture {}", path.display());
        let spawned = thread::Builder::new()
            .name("relief-decode".into())
            .spawn(move || worker.resolve(decode_file(&path, max_dimension)));

        if let Err(err) = spawned {
            handle.resolve(Err(crate::error::Error::from(err).context("spawning decode thread")));
        }
        handle
    }
}

/// Read and decode an image file into RGBA8, downscaling past `max_dimension`.
pub fn decode_file(path: &Path, max_dimension: u32) -> Result<DecodedImage> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let img = image::load_from_memory(&bytes)
        .with_context(|| format!("decoding {}", path.display()))?;

    let (w, h) = img.dimensions();
    let img = if w > max_dimension || h > max_dimension {
        log::debug!(
            "Downscaling {} from {}x{} to fit {}",
            path.display(),
            w,
            h,
            max_dimension
        );
        img.resize(max_dimension, max_dimension, FilterType::Triangle)
    } else {
        img
    };

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn temp_png(name: &str, width: u32, height: u32) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("relief-texture-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let img = image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        img.save(&path).unwrap();
        path
    }

    fn wait_settled(handle: &TextureHandle) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while handle.is_pending() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_decode_file_rgba() {
        let path = temp_png("small.png", 4, 3);
        let img = decode_file(&path, 4096).unwrap();
        assert_eq!((img.width, img.height), (4, 3));
        assert_eq!(img.pixels.len(), 4 * 3 * 4);
        assert_eq!(img.bytes_per_row(), 16);
        assert_eq!(&img.pixels[4..8], &[1, 0, 128, 255]);
    }

    #[test]
    fn test_decode_file_downscales_to_limit() {
        let path = temp_png("wide.png", 64, 32);
        let img = decode_file(&path, 16).unwrap();
        assert_eq!((img.width, img.height), (16, 8));
    }

    #[test]
    fn test_load_becomes_ready() {
        let path = temp_png("async.png", 8, 8);
        let loader = AssetLoader::new(2048);
        let handle = loader.load(&path).with_encoding(ColorEncoding::Srgb);
        wait_settled(&handle);
        assert!(handle.is_ready());
        assert_eq!(handle.dimensions(), Some((8, 8)));
        assert_eq!(handle.encoding(), ColorEncoding::Srgb);
    }

    #[test]
    fn test_missing_file_fails_without_panicking() {
        let loader = AssetLoader::new(2048);
        let handle = loader.load("does/not/exist.png");
        wait_settled(&handle);
        assert!(matches!(handle.state(), LoadState::Failed(_)));
        assert!(handle.image().is_none());
    }

    #[test]
    fn test_repeated_loads_are_independent() {
        let path = temp_png("twice.png", 2, 2);
        let loader = AssetLoader::new(2048);
        let a = loader.load(&path);
        let b = loader.load(&path);
        wait_settled(&a);
        wait_settled(&b);
        let (a, b) = (a.image().unwrap(), b.image().unwrap());
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(*a, *b);
    }

    #[test]
    fn test_resolve_only_once() {
        let handle = TextureHandle::from_image(
            "inline",
            DecodedImage { width: 1, height: 1, pixels: vec![255; 4] },
        );
        handle.resolve(Err(crate::error::Error::msg("late failure")));
        assert!(handle.is_ready());
    }
}
