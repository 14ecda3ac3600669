//! Flat vertex buffers for rendering.

use std::collections::BTreeMap;

use super::halfedge::TriangleMesh;
use super::index::MeshIndex;
use super::position_index::PointKey;
use crate::error::{ConsistencyError, MeshError, Result};

/// Interleaving-free vertex data, ready to upload to a GPU.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBuffers {
    /// One position per mesh vertex, in vertex order.
    pub positions: Vec<[f64; 3]>,
    /// One unit normal per mesh vertex (zero where undefined).
    pub normals: Vec<[f64; 3]>,
    /// Three indices into `positions` per facet, in facet order.
    pub indices: Vec<u32>,
}

impl VertexBuffers {
    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }
}

impl<I: MeshIndex> TriangleMesh<I> {
    /// Export positions, averaged vertex normals and triangle indices.
    ///
    /// Facet corners are written in ingestion order, so winding is preserved.
    /// Each facet point is resolved to the position of an equal vertex.
    ///
    /// # Errors
    ///
    /// [`ConsistencyError::ExportVertexMissing`] if a facet point matches no
    /// vertex, or [`MeshError::InvalidParameter`] if the vertex count does
    /// not fit in `u32`.
    pub fn to_vertex_buffers(&self) -> Result<VertexBuffers> {
        if u32::try_from(self.num_vertices()).is_err() {
            return Err(MeshError::invalid_param(
                "vertex count",
                self.num_vertices(),
                "exceeds the u32 index range",
            ));
        }

        let mut positions = Vec::with_capacity(self.num_vertices());
        let mut normals = Vec::with_capacity(self.num_vertices());
        let mut lookup: BTreeMap<PointKey, u32> = BTreeMap::new();

        for (i, (id, vertex)) in self.vertices().enumerate() {
            let p = vertex.point;
            positions.push([p.x, p.y, p.z]);
            let n = self.vertex_normal(id);
            normals.push([n.x, n.y, n.z]);
            // First vertex at a position wins
            lookup.entry(PointKey::new(&p)).or_insert(i as u32);
        }

        let mut indices = Vec::with_capacity(self.num_facets() * 3);
        for f in self.facet_ids() {
            for p in self.facet_triangle(f).points {
                let index = lookup
                    .get(&PointKey::new(&p))
                    .ok_or(ConsistencyError::ExportVertexMissing { point: p })?;
                indices.push(*index);
            }
        }

        Ok(VertexBuffers {
            positions,
            normals,
            indices,
        })
    }
}
