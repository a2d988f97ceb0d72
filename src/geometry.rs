//! Vertex formats and the built-in meshes of the viewer.
//!
//! Every mesh here is a flat, non-indexed vertex list ready for upload through
//! [`crate::resources::ResourceSet::create_drawable`]. Three layouts exist:
//!
//! | Layout | Vertex | Stride | Attributes |
//! |--------|--------|--------|------------|
//! | [`VertexLayout::Lit`] | [`Vertex3d`] | 32 | position, normal, uv |
//! | [`VertexLayout::Textured`] | [`QuadVertex`] | 20 | position, uv |
//! | [`VertexLayout::Flat2d`] | [`StripVertex`] | 8 | position |

use glam::Vec3;

/// A lit mesh vertex.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex3d {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Full-screen quad vertex in clip space with a texture coordinate.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl QuadVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
    };
}

/// Clip-space corner of the ray-cast strip.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StripVertex {
    pub position: [f32; 2],
}

impl StripVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<StripVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x2],
    };
}

/// Vertex layout descriptor of a drawable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    Lit,
    Textured,
    Flat2d,
}

impl VertexLayout {
    pub fn buffer_layout(self) -> wgpu::VertexBufferLayout<'static> {
        match self {
            Self::Lit => Vertex3d::LAYOUT,
            Self::Textured => QuadVertex::LAYOUT,
            Self::Flat2d => StripVertex::LAYOUT,
        }
    }

    /// Bytes per vertex.
    pub fn stride(self) -> u64 {
        self.buffer_layout().array_stride
    }
}

/// Cube spanning `[-1, 1]` on every axis, one quad per face.
pub fn cube() -> Vec<Vertex3d> {
    // (normal, u axis, v axis) per face
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
    ];

    let mut vertices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let corner = |su: f32, sv: f32| {
            let p = normal + u * su + v * sv;
            Vertex3d::new(
                p.to_array(),
                normal.to_array(),
                [su * 0.5 + 0.5, 0.5 - sv * 0.5],
            )
        };
        let (a, b, c, d) = (
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        );
        vertices.extend_from_slice(&[a, b, c, c, d, a]);
    }
    vertices
}

/// Ground square spanning `[-2, 2]` in x and z at y = 0, facing up.
///
/// UVs run to 2 so the texture tiles twice across with a repeating sampler.
pub fn plane() -> Vec<Vertex3d> {
    let up = [0.0, 1.0, 0.0];
    let a = Vertex3d::new([-2.0, 0.0, 2.0], up, [0.0, 0.0]);
    let b = Vertex3d::new([2.0, 0.0, 2.0], up, [0.0, 2.0]);
    let c = Vertex3d::new([2.0, 0.0, -2.0], up, [2.0, 2.0]);
    let d = Vertex3d::new([-2.0, 0.0, -2.0], up, [2.0, 0.0]);
    vec![a, b, c, c, d, a]
}

/// Regular tetrahedron standing on the y = 0 plane with its apex at `y = sqrt 2`.
///
/// Flat shaded: every face carries its own outward normal.
pub fn tetrahedron() -> Vec<Vertex3d> {
    let half_root3 = 3.0_f32.sqrt() / 2.0;
    let base = [
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(-0.5, 0.0, half_root3),
        Vec3::new(-0.5, 0.0, -half_root3),
    ];
    let apex = Vec3::new(0.0, 2.0_f32.sqrt(), 0.0);
    let centroid = (base[0] + base[1] + base[2] + apex) / 4.0;

    let faces = [
        [base[0], base[1], base[2]],
        [base[1], apex, base[2]],
        [base[0], apex, base[1]],
        [base[2], apex, base[0]],
    ];
    let uvs = [[0.0, 1.0], [1.0, 0.5], [0.0, 0.0]];

    let mut vertices = Vec::with_capacity(12);
    for face in faces {
        let mut normal = (face[1] - face[0]).cross(face[2] - face[0]).normalize();
        let face_center = (face[0] + face[1] + face[2]) / 3.0;
        if normal.dot(face_center - centroid) < 0.0 {
            normal = -normal;
        }
        for (p, uv) in face.iter().zip(uvs) {
            vertices.push(Vertex3d::new(p.to_array(), normal.to_array(), uv));
        }
    }
    vertices
}

/// Two triangles covering clip space, with texture coordinates that put
/// `v = 0` at the top of the screen.
pub fn screen_quad() -> Vec<QuadVertex> {
    let corner = |x: f32, y: f32| QuadVertex {
        position: [x, y, 0.0],
        uv: [x * 0.5 + 0.5, 0.5 - y * 0.5],
    };
    vec![
        corner(-1.0, -1.0),
        corner(1.0, -1.0),
        corner(-1.0, 1.0),
        corner(-1.0, 1.0),
        corner(1.0, -1.0),
        corner(1.0, 1.0),
    ]
}

/// Four-vertex triangle strip covering clip space.
pub fn screen_strip() -> Vec<StripVertex> {
    [[-1.0, 1.0], [-1.0, -1.0], [1.0, 1.0], [1.0, -1.0]]
        .into_iter()
        .map(|position| StripVertex { position })
        .collect()
}
