//! # stlmesh
//!
//! Half-edge triangle meshes built from STL triangle soup.
//!
//! STL files describe a surface as independent triangles. stlmesh welds
//! those triangles at exactly equal points into a half-edge mesh, pairs up
//! the half-edges of shared edges, and answers adjacency and geometry
//! queries on the result.
//!
//! ## Features
//!
//! - **Exact welding**: shared corners become shared vertices, shared edges
//!   become symmetric half-edge pairs
//! - **Adjacency queries**: facet neighbours, vertex fans, half-edge endpoints
//! - **Derived properties**: boundary (lamina) detection, bounding box, area,
//!   volume, vertex normals
//! - **STL I/O**: streaming ASCII and binary reading, ASCII and binary writing
//! - **Tolerance welding**: collapse near-duplicate points before building
//! - **Flexible indexing**: 16-bit, 32-bit or 64-bit element indices
//!
//! ## Quick Start
//!
//! ```no_run
//! use stlmesh::prelude::*;
//!
//! let mesh: TriangleMesh = stlmesh::io::load("model.stl").unwrap();
//!
//! println!("Vertices: {}", mesh.num_vertices());
//! println!("Facets: {}", mesh.num_facets());
//! println!("Closed: {}", mesh.is_manifold());
//! println!("Volume: {}", mesh.volume());
//!
//! stlmesh::io::save(&mesh, "copy.stl", StlEncoding::Ascii).unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use stlmesh::prelude::*;
//!
//! let a = [0.0, 0.0, 0.0];
//! let b = [1.0, 0.0, 0.0];
//! let c = [0.5, 1.0, 0.0];
//! let d = [0.5, 0.5, 1.0];
//!
//! let mesh: TriangleMesh = TriangleMesh::from_triangles([
//!     Triangle::from_coords(a, c, b), // bottom
//!     Triangle::from_coords(a, b, d), // front
//!     Triangle::from_coords(b, c, d), // right
//!     Triangle::from_coords(c, a, d), // left
//! ])
//! .unwrap();
//!
//! assert_eq!(mesh.num_vertices(), 4);
//! assert_eq!(mesh.num_edges(), 6);
//! assert!(mesh.is_manifold());
//! ```
//!
//! ## Mesh Traversal
//!
//! ```
//! use stlmesh::prelude::*;
//!
//! # let a = [0.0, 0.0, 0.0];
//! # let b = [1.0, 0.0, 0.0];
//! # let c = [0.5, 1.0, 0.0];
//! # let d = [0.5, 0.5, 1.0];
//! # let mesh: TriangleMesh = TriangleMesh::from_triangles([
//! #     Triangle::from_coords(a, c, b),
//! #     Triangle::from_coords(a, b, d),
//! #     Triangle::from_coords(b, c, d),
//! #     Triangle::from_coords(c, a, d),
//! # ])
//! # .unwrap();
//! // Facets around a vertex
//! let v = VertexId::new(0);
//! for facet in mesh.vertex_facets(v) {
//!     println!("Adjacent facet: {:?}", facet);
//! }
//!
//! // Facets across the edges of a facet
//! let f = FacetId::new(0);
//! assert_eq!(mesh.adjacent_facets(f).count(), 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod geom;
pub mod io;
pub mod mesh;

#[cfg(test)]
mod test_shapes;

/// Prelude module for convenient imports.
///
/// ```
/// use stlmesh::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::weld::{weld_triangles, WeldOptions, WeldedSoup};
    pub use crate::error::{ConsistencyError, MeshError, Result};
    pub use crate::geom::{BoundingBox, Triangle};
    pub use crate::io::{AsciiOptions, StlEncoding, StlReader};
    pub use crate::mesh::{
        Edge, EdgeId, Facet, FacetId, HalfEdge, HalfEdgeId, MeshIndex, TriangleMesh, TriangleSink,
        Vertex, VertexBuffers, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use std::io::Cursor;

    #[test]
    fn test_tetrahedron() {
        let mesh: TriangleMesh = TriangleMesh::from_triangles(crate::test_shapes::tetrahedron()).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_facets(), 4);
        assert_eq!(mesh.num_halfedges(), 12);
        assert_eq!(mesh.num_edges(), 6);
        assert!(mesh.is_valid());
        assert!(mesh.is_manifold());

        let expected = [
            Vector3::new(0.0, -0.894427, 0.447214),
            Vector3::new(-0.774597, 0.447214, 0.447214),
            Vector3::new(0.774597, 0.447214, 0.447214),
            Vector3::new(0.0, 0.0, -1.0),
        ];
        for (f, n) in mesh.facet_ids().zip(expected) {
            assert_relative_eq!(*mesh.facet_normal(f), n, epsilon = 1e-5);
        }

        assert_relative_eq!(mesh.volume(), 0.125, epsilon = 1e-6);

        let bbox = mesh.bbox();
        assert_relative_eq!(bbox.min().coords, Vector3::new(-0.5, -0.4330127, 0.0));
        assert_relative_eq!(bbox.max().coords, Vector3::new(0.5, 0.4330127, 0.8660254));
    }

    #[test]
    fn test_stl_to_mesh_to_stl() {
        let mesh: TriangleMesh =
            TriangleMesh::from_triangles(crate::test_shapes::uv_sphere(6, 12)).unwrap();
        let text = mesh.to_string();

        let mut cursor = Cursor::new(text.into_bytes());
        let mut reader = StlReader::new(&mut cursor).unwrap();
        let soup = reader.read_all().unwrap();

        let reread: TriangleMesh = TriangleMesh::from_triangles(soup.iter().copied()).unwrap();
        assert_eq!(reread, mesh);
        assert_relative_eq!(reread.area(), mesh.area(), epsilon = 1e-12);

        // Welding an exact soup changes nothing
        let welded: TriangleMesh = weld_triangles(&soup, &WeldOptions::default())
            .unwrap()
            .into_mesh()
            .unwrap();
        assert_eq!(welded, mesh);

        let buffers = reread.to_vertex_buffers().unwrap();
        assert_eq!(buffers.num_vertices(), mesh.num_vertices());
        assert_eq!(buffers.num_triangles(), mesh.num_facets());
    }
}
