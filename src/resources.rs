//! GPU resources owned for the whole session.
//!
//! A [`ResourceSet`] creates vertex buffers, depth targets and textures once
//! at startup and hands out small typed handles. Passes refer to resources
//! through those handles only. Every resource is released exactly once,
//! either by [`ResourceSet::destroy_all`] or when the set is dropped.

use crate::error::{Result, ViewerError};
use crate::geometry::VertexLayout;
use crate::gpu::GpuContext;
use crate::texture::{Cubemap, Texture};

/// Depth format of every depth attachment.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Handle to a vertex buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DrawableId(pub(crate) usize);

/// Handle to a render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetId(pub(crate) usize);

/// Handle to a 2D texture or cubemap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) usize);

/// Reject extents the device would refuse. Never clamps.
pub fn validate_extent(width: u32, height: u32, max: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ViewerError::resource(format!(
            "extent {width}x{height} has a zero dimension"
        )));
    }
    if width > max || height > max {
        return Err(ViewerError::resource(format!(
            "extent {width}x{height} exceeds device maximum {max}"
        )));
    }
    Ok(())
}

/// Number of whole vertices in `byte_len` bytes of `layout` data.
pub fn vertex_count_for(byte_len: usize, layout: VertexLayout) -> Result<u32> {
    let stride = layout.stride() as usize;
    if byte_len == 0 {
        return Err(ViewerError::resource("vertex data is empty"));
    }
    if byte_len % stride != 0 {
        return Err(ViewerError::resource(format!(
            "vertex data is {byte_len} bytes, not a multiple of the {layout:?} stride {stride}"
        )));
    }
    u32::try_from(byte_len / stride)
        .map_err(|_| ViewerError::resource("vertex count does not fit in u32"))
}

/// A vertex buffer and how to draw it. Immutable after creation.
#[derive(Debug)]
pub struct Drawable {
    pub layout: VertexLayout,
    pub buffer: wgpu::Buffer,
    pub vertex_count: u32,
    pub topology: wgpu::PrimitiveTopology,
}

/// A depth attachment with an optional color attachment.
#[derive(Debug)]
pub struct RenderTarget {
    pub(crate) depth: wgpu::Texture,
    pub(crate) depth_view: wgpu::TextureView,
    pub(crate) color: Option<(wgpu::Texture, wgpu::TextureView)>,
    pub width: u32,
    pub height: u32,
    label: String,
}

impl RenderTarget {
    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    pub fn color_view(&self) -> Option<&wgpu::TextureView> {
        self.color.as_ref().map(|(_, view)| view)
    }

    fn destroy(&self) {
        self.depth.destroy();
        if let Some((color, _)) = &self.color {
            color.destroy();
        }
    }
}

#[derive(Debug)]
enum Sampled {
    Flat(Texture),
    Cube(Cubemap),
}

impl Sampled {
    fn destroy(&self) {
        match self {
            Self::Flat(texture) => texture.destroy(),
            Self::Cube(cubemap) => cubemap.destroy(),
        }
    }
}

/// Owner of every long-lived GPU resource.
#[derive(Debug, Default)]
pub struct ResourceSet {
    drawables: Vec<Drawable>,
    targets: Vec<RenderTarget>,
    textures: Vec<Sampled>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload vertices into a new vertex buffer.
    pub fn create_drawable<V: bytemuck::Pod>(
        &mut self,
        gpu: &GpuContext,
        label: &str,
        vertices: &[V],
        layout: VertexLayout,
        topology: wgpu::PrimitiveTopology,
    ) -> Result<DrawableId> {
        use wgpu::util::DeviceExt;

        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let vertex_count = vertex_count_for(bytes.len(), layout)?;

        let buffer = gpu
            .validated(|device| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents: bytes,
                    usage: wgpu::BufferUsages::VERTEX,
                })
            })
            .map_err(|e| ViewerError::resource(format!("drawable '{label}': {e}")))?;

        log::debug!("drawable '{label}': {vertex_count} vertices, {layout:?}");
        self.drawables.push(Drawable {
            layout,
            buffer,
            vertex_count,
            topology,
        });
        Ok(DrawableId(self.drawables.len() - 1))
    }

    /// Create a depth target, with a color attachment if `with_color`.
    pub fn create_render_target(
        &mut self,
        gpu: &GpuContext,
        label: &str,
        width: u32,
        height: u32,
        with_color: bool,
    ) -> Result<TargetId> {
        let target = Self::build_target(gpu, label, width, height, with_color)?;
        log::info!("render target '{label}': {width}x{height}");
        self.targets.push(target);
        Ok(TargetId(self.targets.len() - 1))
    }

    /// Recreate a target's attachments at a new size.
    pub fn resize_target(
        &mut self,
        gpu: &GpuContext,
        id: TargetId,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let slot = self
            .targets
            .get_mut(id.0)
            .ok_or_else(|| ViewerError::resource(format!("unknown render target {id:?}")))?;
        if slot.width == width && slot.height == height {
            return Ok(());
        }

        let with_color = slot.color.is_some();
        let label = slot.label.clone();
        let fresh = Self::build_target(gpu, &label, width, height, with_color)?;
        let old = std::mem::replace(slot, fresh);
        old.destroy();
        log::debug!("render target '{label}' resized to {width}x{height}");
        Ok(())
    }

    fn build_target(
        gpu: &GpuContext,
        label: &str,
        width: u32,
        height: u32,
        with_color: bool,
    ) -> Result<RenderTarget> {
        validate_extent(width, height, gpu.max_texture_dimension())?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let attachment = |format: wgpu::TextureFormat, suffix: &str| {
            let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&format!("{label} {suffix}")),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            (texture, view)
        };

        let ((depth, depth_view), color) = gpu
            .validated(|_| {
                let depth = attachment(DEPTH_FORMAT, "depth");
                let color = with_color.then(|| attachment(gpu.config.format, "color"));
                (depth, color)
            })
            .map_err(|e| ViewerError::resource(format!("render target '{label}': {e}")))?;

        Ok(RenderTarget {
            depth,
            depth_view,
            color,
            width,
            height,
            label: label.to_string(),
        })
    }

    /// Take ownership of an uploaded texture.
    pub fn insert_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.push(Sampled::Flat(texture));
        TextureId(self.textures.len() - 1)
    }

    /// Upload RGBA8 pixels as a new texture.
    pub fn create_texture(
        &mut self,
        gpu: &GpuContext,
        data: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> Result<TextureId> {
        let texture = Texture::from_rgba(gpu, data, width, height, label)?;
        Ok(self.insert_texture(texture))
    }

    pub fn insert_cubemap(&mut self, cubemap: Cubemap) -> TextureId {
        self.textures.push(Sampled::Cube(cubemap));
        TextureId(self.textures.len() - 1)
    }

    pub fn drawable(&self, id: DrawableId) -> Option<&Drawable> {
        self.drawables.get(id.0)
    }

    pub fn target(&self, id: TargetId) -> Option<&RenderTarget> {
        self.targets.get(id.0)
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        match self.textures.get(id.0) {
            Some(Sampled::Flat(texture)) => Some(texture),
            _ => None,
        }
    }

    pub fn cubemap(&self, id: TextureId) -> Option<&Cubemap> {
        match self.textures.get(id.0) {
            Some(Sampled::Cube(cubemap)) => Some(cubemap),
            _ => None,
        }
    }

    /// Number of live resources of every kind.
    pub fn len(&self) -> usize {
        self.drawables.len() + self.targets.len() + self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release everything. Handles issued before become dangling and every
    /// lookup through them returns `None`. Calling this again does nothing.
    pub fn destroy_all(&mut self) {
        let released = self.len();
        for drawable in std::mem::take(&mut self.drawables) {
            drawable.buffer.destroy();
        }
        for target in std::mem::take(&mut self.targets) {
            target.destroy();
        }
        for texture in std::mem::take(&mut self.textures) {
            texture.destroy();
        }
        if released > 0 {
            log::debug!("released {released} GPU resources");
        }
    }
}

impl Drop for ResourceSet {
    fn drop(&mut self) {
        self.destroy_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_over_device_maximum_is_rejected() {
        let err = validate_extent(99_999, 99_999, 8192).unwrap_err();
        assert!(matches!(err, ViewerError::ResourceCreation(_)));
        assert!(err.to_string().contains("8192"));
    }

    #[test]
    fn extent_is_not_clamped_at_the_edge() {
        assert!(validate_extent(8192, 8192, 8192).is_ok());
        assert!(validate_extent(8193, 1, 8192).is_err());
        assert!(validate_extent(1, 8193, 8192).is_err());
    }

    #[test]
    fn zero_extent_is_rejected() {
        assert!(validate_extent(0, 512, 8192).is_err());
        assert!(validate_extent(512, 0, 8192).is_err());
    }

    #[test]
    fn vertex_count_follows_stride() {
        assert_eq!(vertex_count_for(36 * 32, VertexLayout::Lit).ok(), Some(36));
        assert_eq!(vertex_count_for(4 * 8, VertexLayout::Flat2d).ok(), Some(4));
    }

    #[test]
    fn empty_or_ragged_vertex_data_is_rejected() {
        assert!(vertex_count_for(0, VertexLayout::Lit).is_err());
        assert!(vertex_count_for(33, VertexLayout::Lit).is_err());
        assert!(vertex_count_for(20 * 3 + 1, VertexLayout::Textured).is_err());
    }

    #[test]
    fn destroy_all_on_an_empty_set_is_idempotent() {
        let mut set = ResourceSet::new();
        set.destroy_all();
        set.destroy_all();
        assert!(set.is_empty());
        assert!(set.drawable(DrawableId(0)).is_none());
        assert!(set.target(TargetId(0)).is_none());
        assert!(set.texture(TextureId(0)).is_none());
    }
}
