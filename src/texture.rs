//! Image decoding and sampled GPU textures.
//!
//! Decode failures are never fatal here: [`Texture::load_or_placeholder`] and
//! [`Cubemap::load`] log a warning and substitute generated pixels, because
//! every texture slot of a pipeline must be bound before it can draw.

use std::path::{Path, PathBuf};

use crate::error::{Result, ViewerError};
use crate::gpu::GpuContext;

/// Pixels decoded from an image file, always expanded to RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Channel count of the source file before expansion.
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn from_dynamic(image: image::DynamicImage) -> Self {
        let channels = image.color().channel_count();
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            channels,
            pixels: rgba.into_raw(),
        }
    }

    /// Single-colour image, used where a decode failed.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self {
            width,
            height,
            channels: 4,
            pixels,
        }
    }
}

/// Decode an image file. Format is inferred from the file contents and name.
pub fn decode_file(path: impl AsRef<Path>) -> Result<DecodedImage> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|source| ViewerError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(DecodedImage::from_dynamic(image))
}

/// Blocky hash noise, the stand-in for a texture that failed to load.
pub fn placeholder_pixels(size: u32, seed: u32) -> Vec<u8> {
    // magenta and dark gray, noisy so a missing texture is obvious on screen
    let palette: [[u8; 3]; 2] = [[200, 40, 200], [50, 50, 50]];
    let mut data = vec![0u8; (size * size * 4) as usize];

    for y in 0..size {
        for x in 0..size {
            let idx = ((y * size + x) * 4) as usize;
            let cell = ((x / 4) + (y / 4)) % 2;
            let base = palette[cell as usize];
            let variation = (hash(x, y, seed) % 24) as i32 - 12;

            data[idx] = (base[0] as i32 + variation).clamp(0, 255) as u8;
            data[idx + 1] = (base[1] as i32 + variation).clamp(0, 255) as u8;
            data[idx + 2] = (base[2] as i32 + variation).clamp(0, 255) as u8;
            data[idx + 3] = 255;
        }
    }
    data
}

fn hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_add(x.wrapping_mul(374761393));
    h = h.wrapping_add(y.wrapping_mul(668265263));
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}

fn check_upload(width: u32, height: u32, layers: u32, len: usize, max: u32) -> Result<()> {
    crate::resources::validate_extent(width, height, max)?;
    let expected = width as usize * height as usize * 4 * layers as usize;
    if len != expected {
        return Err(ViewerError::resource(format!(
            "texture data is {len} bytes, expected {expected} for {width}x{height}x{layers} RGBA"
        )));
    }
    Ok(())
}

/// Levels in a full mip chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    u32::BITS - width.max(height).max(1).leading_zeros()
}

/// Every mip level of an RGBA8 image, largest first, concatenated.
///
/// Each level halves the previous one (never below 1) with a triangle filter.
pub fn mip_chain(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let base = image::RgbaImage::from_raw(width, height, pixels.to_vec()).ok_or_else(|| {
        ViewerError::resource(format!(
            "{} bytes is not a {width}x{height} RGBA image",
            pixels.len()
        ))
    })?;

    let mut chain = Vec::with_capacity(pixels.len() * 4 / 3 + 4);
    chain.extend_from_slice(base.as_raw());
    let mut level = base;
    for _ in 1..mip_level_count(width, height) {
        let (w, h) = level.dimensions();
        level = image::imageops::resize(
            &level,
            (w / 2).max(1),
            (h / 2).max(1),
            image::imageops::FilterType::Triangle,
        );
        chain.extend_from_slice(level.as_raw());
    }
    Ok(chain)
}

/// A sampled 2D texture.
#[derive(Debug)]
pub struct Texture {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Upload RGBA8 pixels with a full mip chain. Trilinear filtering,
    /// repeating addresses.
    pub fn from_rgba(
        gpu: &GpuContext,
        data: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> Result<Self> {
        use wgpu::util::DeviceExt;

        check_upload(width, height, 1, data.len(), gpu.max_texture_dimension())?;
        let mip_level_count = mip_level_count(width, height);
        let levels = mip_chain(data, width, height)?;

        let (texture, sampler) = gpu
            .validated(|device| {
                let texture = device.create_texture_with_data(
                    &gpu.queue,
                    &wgpu::TextureDescriptor {
                        label: Some(label),
                        size: wgpu::Extent3d {
                            width,
                            height,
                            depth_or_array_layers: 1,
                        },
                        mip_level_count,
                        sample_count: 1,
                        dimension: wgpu::TextureDimension::D2,
                        format: wgpu::TextureFormat::Rgba8UnormSrgb,
                        usage: wgpu::TextureUsages::TEXTURE_BINDING
                            | wgpu::TextureUsages::COPY_DST,
                        view_formats: &[],
                    },
                    wgpu::util::TextureDataOrder::LayerMajor,
                    &levels,
                );

                let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                    label: Some(&format!("{label} sampler")),
                    address_mode_u: wgpu::AddressMode::Repeat,
                    address_mode_v: wgpu::AddressMode::Repeat,
                    address_mode_w: wgpu::AddressMode::Repeat,
                    mag_filter: wgpu::FilterMode::Linear,
                    min_filter: wgpu::FilterMode::Linear,
                    mipmap_filter: wgpu::FilterMode::Linear,
                    ..Default::default()
                });
                (texture, sampler)
            })
            .map_err(|e| ViewerError::resource(format!("texture '{label}': {e}")))?;

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            texture,
            view,
            sampler,
            width,
            height,
        })
    }

    pub fn from_image(gpu: &GpuContext, image: &DecodedImage, label: &str) -> Result<Self> {
        Self::from_rgba(gpu, &image.pixels, image.width, image.height, label)
    }

    /// Generated noise texture bound in place of a missing one.
    pub fn placeholder(gpu: &GpuContext, size: u32, seed: u32) -> Result<Self> {
        Self::from_rgba(
            gpu,
            &placeholder_pixels(size, seed),
            size,
            size,
            "placeholder texture",
        )
    }

    /// Decode and upload `path`, or log a warning and upload a placeholder.
    pub fn load_or_placeholder(gpu: &GpuContext, path: &Path) -> Result<Self> {
        match decode_file(path) {
            Ok(image) => {
                log::debug!(
                    "loaded {} ({}x{}, {} channels)",
                    path.display(),
                    image.width,
                    image.height,
                    image.channels
                );
                Self::from_image(gpu, &image, &path.display().to_string())
            }
            Err(err) => {
                log::warn!("{err}; using placeholder");
                Self::placeholder(gpu, 64, 0)
            }
        }
    }

    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

/// File names of the six cubemap faces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CubemapFaces {
    pub front: PathBuf,
    pub back: PathBuf,
    pub bottom: PathBuf,
    pub top: PathBuf,
    pub right: PathBuf,
    pub left: PathBuf,
}

impl Default for CubemapFaces {
    fn default() -> Self {
        Self::named(
            "front.tga",
            "back.tga",
            "bottom.tga",
            "top.tga",
            "right.tga",
            "left.tga",
        )
    }
}

impl CubemapFaces {
    pub fn named(
        front: impl Into<PathBuf>,
        back: impl Into<PathBuf>,
        bottom: impl Into<PathBuf>,
        top: impl Into<PathBuf>,
        right: impl Into<PathBuf>,
        left: impl Into<PathBuf>,
    ) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            bottom: bottom.into(),
            top: top.into(),
            right: right.into(),
            left: left.into(),
        }
    }

    /// Faces in layer order: +X, -X, +Y, -Y, +Z, -Z.
    pub fn layers(&self) -> [&Path; 6] {
        [
            &self.front,
            &self.back,
            &self.bottom,
            &self.top,
            &self.right,
            &self.left,
        ]
    }
}

/// Six square faces packed layer-major.
#[derive(Debug, PartialEq, Eq)]
pub struct CubeFaceData {
    pub size: u32,
    pub pixels: Vec<u8>,
    /// Layers that were filled with gray.
    pub filled: Vec<usize>,
}

const CUBE_FILL: [u8; 4] = [128, 128, 128, 255];

/// Pack decoded faces into one upload.
///
/// The first square face sets the edge length. Faces that failed to decode,
/// are not square or differ in size from it are replaced with gray.
pub fn assemble_cube_faces(faces: Vec<Option<DecodedImage>>) -> CubeFaceData {
    let size = faces
        .iter()
        .flatten()
        .find(|f| f.width == f.height && f.width > 0)
        .map(|f| f.width)
        .unwrap_or(16);

    let mut pixels = Vec::with_capacity((size * size * 4) as usize * 6);
    let mut filled = Vec::new();

    for (layer, face) in faces.into_iter().chain(std::iter::repeat(None)).take(6).enumerate() {
        match face {
            Some(face) if face.width == size && face.height == size => {
                pixels.extend_from_slice(&face.pixels);
            }
            _ => {
                filled.push(layer);
                pixels.extend_from_slice(&DecodedImage::solid(size, size, CUBE_FILL).pixels);
            }
        }
    }

    CubeFaceData {
        size,
        pixels,
        filled,
    }
}

/// A sampled cube texture.
#[derive(Debug)]
pub struct Cubemap {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub size: u32,
}

impl Cubemap {
    /// Decode the faces from `dir` and upload them.
    pub fn load(gpu: &GpuContext, dir: &Path, faces: &CubemapFaces) -> Result<Self> {
        let decoded = faces
            .layers()
            .iter()
            .map(|name| {
                let path = dir.join(name);
                decode_file(&path)
                    .inspect_err(|err| log::warn!("{err}; cubemap face filled with gray"))
                    .ok()
            })
            .collect();

        let data = assemble_cube_faces(decoded);
        for layer in &data.filled {
            log::debug!("cubemap layer {layer} uses fill color");
        }
        Self::from_faces(gpu, &data)
    }

    pub fn from_faces(gpu: &GpuContext, data: &CubeFaceData) -> Result<Self> {
        use wgpu::util::DeviceExt;

        let size = data.size;
        check_upload(size, size, 6, data.pixels.len(), gpu.max_texture_dimension())?;

        let (texture, sampler) = gpu
            .validated(|device| {
                let texture = device.create_texture_with_data(
                    &gpu.queue,
                    &wgpu::TextureDescriptor {
                        label: Some("skybox cubemap"),
                        size: wgpu::Extent3d {
                            width: size,
                            height: size,
                            depth_or_array_layers: 6,
                        },
                        mip_level_count: 1,
                        sample_count: 1,
                        dimension: wgpu::TextureDimension::D2,
                        format: wgpu::TextureFormat::Rgba8UnormSrgb,
                        usage: wgpu::TextureUsages::TEXTURE_BINDING
                            | wgpu::TextureUsages::COPY_DST,
                        view_formats: &[],
                    },
                    wgpu::util::TextureDataOrder::LayerMajor,
                    &data.pixels,
                );

                let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                    label: Some("skybox sampler"),
                    address_mode_u: wgpu::AddressMode::ClampToEdge,
                    address_mode_v: wgpu::AddressMode::ClampToEdge,
                    address_mode_w: wgpu::AddressMode::ClampToEdge,
                    mag_filter: wgpu::FilterMode::Linear,
                    min_filter: wgpu::FilterMode::Linear,
                    mipmap_filter: wgpu::FilterMode::Nearest,
                    ..Default::default()
                });
                (texture, sampler)
            })
            .map_err(|e| ViewerError::resource(format!("cubemap: {e}")))?;

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("skybox cubemap view"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
            size,
        })
    }

    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(size: u32, value: u8) -> Option<DecodedImage> {
        Some(DecodedImage::solid(size, size, [value, value, value, 255]))
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let err = decode_file("definitely/not/here.jpg").unwrap_err();
        assert!(err.is_decode());
        assert!(err.to_string().contains("here.jpg"));
    }

    #[test]
    fn dynamic_image_expands_to_rgba() {
        let rgb = image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]));
        let decoded = DecodedImage::from_dynamic(image::DynamicImage::ImageRgb8(rgb));
        assert_eq!((decoded.width, decoded.height, decoded.channels), (3, 2, 3));
        assert_eq!(decoded.pixels.len(), 3 * 2 * 4);
        assert_eq!(&decoded.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn mip_count_reaches_one_texel() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(512, 512), 10);
        assert_eq!(mip_level_count(300, 7), 9);
    }

    #[test]
    fn mip_chain_holds_every_level() {
        let image = DecodedImage::solid(4, 2, [200, 100, 50, 255]);
        let chain = mip_chain(&image.pixels, 4, 2).unwrap();
        // 4x2, 2x1, 1x1
        assert_eq!(chain.len(), (8 + 2 + 1) * 4);
        // A flat colour stays flat at every level.
        assert_eq!(&chain[chain.len() - 4..], &[200, 100, 50, 255]);

        assert!(mip_chain(&image.pixels[..12], 4, 2).is_err());
    }

    #[test]
    fn cube_faces_pack_in_layer_order() {
        let faces = (0..6).map(|i| face(2, i as u8 * 10)).collect();
        let data = assemble_cube_faces(faces);
        assert_eq!(data.size, 2);
        assert!(data.filled.is_empty());
        assert_eq!(data.pixels.len(), 2 * 2 * 4 * 6);
        let layer_bytes = 2 * 2 * 4;
        for layer in 0..6 {
            assert_eq!(data.pixels[layer * layer_bytes], layer as u8 * 10);
        }
    }

    #[test]
    fn bad_faces_are_filled() {
        let faces = vec![
            None,
            face(4, 1),
            face(8, 2),
            Some(DecodedImage::solid(4, 2, [0, 0, 0, 255])),
            face(4, 3),
        ];
        let data = assemble_cube_faces(faces);
        assert_eq!(data.size, 4);
        assert_eq!(data.filled, vec![0, 2, 3, 5]);
        assert_eq!(data.pixels.len(), 4 * 4 * 4 * 6);
        assert_eq!(&data.pixels[..4], &CUBE_FILL);
    }

    #[test]
    fn all_faces_missing_still_builds_a_cube() {
        let data = assemble_cube_faces(vec![None; 6]);
        assert_eq!(data.filled.len(), 6);
        assert_eq!(data.pixels.len(), (data.size * data.size * 4 * 6) as usize);
    }

    #[test]
    fn placeholder_is_opaque_and_sized() {
        let pixels = placeholder_pixels(8, 3);
        assert_eq!(pixels.len(), 8 * 8 * 4);
        assert!(pixels.chunks(4).all(|p| p[3] == 255));
    }

    #[test]
    fn default_faces_follow_cube_layer_order() {
        let faces = CubemapFaces::default();
        let names: Vec<_> = faces
            .layers()
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        assert_eq!(
            names,
            ["front.tga", "back.tga", "bottom.tga", "top.tga", "right.tga", "left.tga"]
        );
    }
}
