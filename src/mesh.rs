// mesh.rs — 球体网格生成
// 纬线带 parallels = slices / 2，经线带 slices；接缝列 (经度 0 / 2π) 重复一份，保证 UV 连续

use crate::error::{PanoError, Result};
use log::debug;

/// Vertex counts above this no longer fit a 16-bit index buffer.
pub const U16_VERTEX_LIMIT: usize = u16::MAX as usize + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    U16,
    U32,
}

/// UV sphere produced by [`generate`]. Read-only once built.
#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl Mesh {
    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    /// Triangle list, three entries per triangle.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Narrowest index type that can address every vertex.
    pub fn index_format(&self) -> IndexFormat {
        if self.vertex_count() <= U16_VERTEX_LIMIT {
            IndexFormat::U16
        } else {
            IndexFormat::U32
        }
    }

    /// Indices narrowed to `u16`. Fails rather than truncating when the mesh
    /// is too dense for 16-bit indexing.
    pub fn indices_u16(&self) -> Result<Vec<u16>> {
        if self.index_format() != IndexFormat::U16 {
            return Err(PanoError::IndexOverflow {
                vertex_count: self.vertex_count(),
            });
        }
        Ok(self.indices.iter().map(|&i| i as u16).collect())
    }
}

/// Build a UV sphere centred on the origin.
///
/// Row `i = 0` is the north pole (`y = +radius`), row `i = slices / 2` the
/// south pole. `u` runs 0..=1 along longitude, `v` runs from 1 at the north
/// pole down to 0 at the south pole. Every quad is split into the triangles
/// `(i,j) (i+1,j) (i+1,j+1)` and `(i,j) (i+1,j+1) (i,j+1)`, which wind
/// counter-clockwise seen from outside the sphere.
pub fn generate(slices: usize, radius: f32) -> Result<Mesh> {
    if slices < 4 || slices % 2 != 0 {
        return Err(PanoError::InvalidParameter(format!(
            "slices must be an even number >= 4, got {slices}"
        )));
    }
    if !(radius.is_finite() && radius > 0.0) {
        return Err(PanoError::InvalidParameter(format!(
            "radius must be positive, got {radius}"
        )));
    }

    let parallels = slices / 2;
    let columns = slices + 1;
    let vertex_count = (parallels + 1) * columns;
    let index_count = parallels * slices * 6;
    let angle_step = 2.0 * std::f32::consts::PI / slices as f32;

    debug!(
        "sphere mesh: slices={slices} parallels={parallels} vertices={vertex_count} indices={index_count}"
    );

    let mut vertices = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);

    // x = r·sinα·sinβ, y = r·cosα, z = r·sinα·cosβ
    for i in 0..=parallels {
        let alpha = angle_step * i as f32;
        let (sin_a, cos_a) = alpha.sin_cos();

        for j in 0..=slices {
            let beta = angle_step * j as f32;
            let (sin_b, cos_b) = beta.sin_cos();

            vertices.push([radius * sin_a * sin_b, radius * cos_a, radius * sin_a * cos_b]);
            uvs.push([j as f32 / slices as f32, 1.0 - i as f32 / parallels as f32]);
        }
    }

    let linear = |i: usize, j: usize| (i * columns + j) as u32;

    let mut indices = Vec::with_capacity(index_count);
    for i in 0..parallels {
        for j in 0..slices {
            indices.extend_from_slice(&[
                linear(i, j),
                linear(i + 1, j),
                linear(i + 1, j + 1),
                linear(i, j),
                linear(i + 1, j + 1),
                linear(i, j + 1),
            ]);
        }
    }

    Ok(Mesh {
        vertices,
        uvs,
        indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const EPS: f32 = 1e-5;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        Vec3::from(a).distance(Vec3::from(b)) < EPS
    }

    #[test]
    fn test_counts_and_index_range() {
        for slices in [4usize, 6, 10, 64, 200] {
            let mesh = generate(slices, 2.5).unwrap();
            assert_eq!(mesh.vertex_count(), (slices / 2 + 1) * (slices + 1));
            assert_eq!(mesh.uvs().len(), mesh.vertex_count());
            assert_eq!(mesh.index_count(), (slices / 2) * slices * 6);
            let n = mesh.vertex_count() as u32;
            assert!(mesh.indices().iter().all(|&i| i < n));
        }
    }

    #[test]
    fn test_vertices_on_surface() {
        let radius = 3.0;
        let mesh = generate(32, radius).unwrap();
        for v in mesh.vertices() {
            assert!((Vec3::from(*v).length() - radius).abs() < 1e-4);
        }
    }

    #[test]
    fn test_pole_rows() {
        let slices = 12;
        let mesh = generate(slices, 1.5).unwrap();
        let columns = slices + 1;
        let parallels = slices / 2;
        for j in 0..columns {
            assert!(close(mesh.vertices()[j], [0.0, 1.5, 0.0]));
            assert!(close(mesh.vertices()[parallels * columns + j], [0.0, -1.5, 0.0]));
        }
    }

    #[test]
    fn test_uv_seam_wraps() {
        let slices = 16;
        let mesh = generate(slices, 1.0).unwrap();
        let columns = slices + 1;
        for i in 0..=slices / 2 {
            assert_eq!(mesh.uvs()[i * columns][0], 0.0);
            assert_eq!(mesh.uvs()[i * columns + slices][0], 1.0);
        }
        // v 在北极为 1，南极为 0
        assert_eq!(mesh.uvs()[0][1], 1.0);
        assert_eq!(mesh.uvs()[(slices / 2) * columns][1], 0.0);
    }

    #[test]
    fn test_four_slice_example() {
        let mesh = generate(4, 1.0).unwrap();
        assert_eq!(mesh.vertex_count(), 15);
        // parallels · slices · 6 = 2 · 4 · 6
        assert_eq!(mesh.index_count(), 48);
        assert!(close(mesh.vertices()[0], [0.0, 1.0, 0.0]));
        assert!(close(mesh.vertices()[2 * 5], [0.0, -1.0, 0.0]));
        assert_eq!(&mesh.indices()[..6], &[0, 5, 6, 0, 6, 1]);
    }

    #[test]
    fn test_triangles_face_outward() {
        let mesh = generate(8, 1.0).unwrap();
        let v = mesh.vertices();
        for tri in mesh.indices().chunks(3) {
            let a = Vec3::from(v[tri[0] as usize]);
            let b = Vec3::from(v[tri[1] as usize]);
            let c = Vec3::from(v[tri[2] as usize]);
            let normal = (b - a).cross(c - a);
            // 极点处的退化三角形跳过
            if normal.length() < 1e-6 {
                continue;
            }
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_rejects_bad_parameters() {
        for slices in [0usize, 2, 3, 5, 7] {
            assert!(matches!(
                generate(slices, 1.0),
                Err(PanoError::InvalidParameter(_))
            ));
        }
        for radius in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                generate(4, radius),
                Err(PanoError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_index_format_boundary() {
        // 181 * 361 = 65341 个顶点，仍可用 u16
        let dense = generate(360, 1.0).unwrap();
        assert_eq!(dense.index_format(), IndexFormat::U16);
        let narrow = dense.indices_u16().unwrap();
        assert_eq!(narrow.len(), dense.index_count());
        assert_eq!(*narrow.iter().max().unwrap() as usize, dense.vertex_count() - 1);

        // 182 * 363 = 66066 个顶点，必须使用 u32
        let denser = generate(362, 1.0).unwrap();
        assert_eq!(denser.index_format(), IndexFormat::U32);
        assert_eq!(
            denser.indices_u16(),
            Err(PanoError::IndexOverflow { vertex_count: 66066 })
        );
    }
}
