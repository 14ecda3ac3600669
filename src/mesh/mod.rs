//! Core mesh data structures.
//!
//! The primary type is [`TriangleMesh`], a half-edge (doubly-connected edge
//! list) representation built by welding a triangle soup at exact point
//! positions. It answers adjacency queries in constant time per step and
//! exposes derived properties such as area, volume and manifoldness.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FacetId`] - Identifies a facet
//! - [`EdgeId`] - Identifies a matched pair of half-edges
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Construction
//!
//! ```
//! use stlmesh::geom::Triangle;
//! use stlmesh::mesh::TriangleMesh;
//!
//! let mesh: TriangleMesh = TriangleMesh::from_triangles([Triangle::from_coords(
//!     [0.0, 0.0, 0.0],
//!     [1.0, 0.0, 0.0],
//!     [0.5, 1.0, 0.0],
//! )])
//! .unwrap();
//!
//! assert_eq!(mesh.num_vertices(), 3);
//! assert!(!mesh.is_manifold());
//! ```

mod builder;
mod compare;
mod export;
mod halfedge;
mod index;
mod position_index;

pub use builder::TriangleSink;
pub use compare::CanonicalHalfEdge;
pub use export::VertexBuffers;
pub use halfedge::{
    Edge, Facet, FacetDisplay, FacetHalfEdgeIter, HalfEdge, HalfEdgeDisplay, TriangleMesh, Vertex,
    VertexFanIter,
};
pub use index::{EdgeId, FacetId, HalfEdgeId, MeshIndex, VertexId};
