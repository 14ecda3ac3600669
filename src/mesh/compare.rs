//! Geometric equality of meshes.
//!
//! Two meshes are equal when they describe the same set of directed edges
//! with the same boundary status, regardless of the order triangles were
//! ingested in or how their element arenas are laid out.

use std::cmp::Ordering;

use nalgebra::Point3;

use super::halfedge::TriangleMesh;
use super::index::MeshIndex;
use super::position_index::{cmp_points, same_point};

/// A half-edge reduced to what geometric equality looks at.
#[derive(Debug, Clone, Copy)]
pub struct CanonicalHalfEdge {
    /// Start point.
    pub start: Point3<f64>,
    /// End point.
    pub end: Point3<f64>,
    /// Whether the half-edge has no symmetric partner.
    pub lamina: bool,
}

impl CanonicalHalfEdge {
    fn cmp_key(&self, other: &Self) -> Ordering {
        cmp_points(&self.start, &other.start)
            .then_with(|| cmp_points(&self.end, &other.end))
            .then_with(|| self.lamina.cmp(&other.lamina))
    }
}

impl PartialEq for CanonicalHalfEdge {
    fn eq(&self, other: &Self) -> bool {
        same_point(&self.start, &other.start)
            && same_point(&self.end, &other.end)
            && self.lamina == other.lamina
    }
}

impl<I: MeshIndex> TriangleMesh<I> {
    /// All half-edges as `(start, end, lamina)`, sorted by start point, then
    /// end point, then lamina status.
    pub fn canonical_halfedges(&self) -> Vec<CanonicalHalfEdge> {
        let mut out: Vec<CanonicalHalfEdge> = self
            .halfedges()
            .map(|(id, he)| CanonicalHalfEdge {
                start: *self.start_point(id),
                end: *self.end_point(id),
                lamina: he.is_lamina(),
            })
            .collect();
        out.sort_by(CanonicalHalfEdge::cmp_key);
        out
    }
}

impl<I: MeshIndex> PartialEq for TriangleMesh<I> {
    /// Two meshes are equal if they have the same number of half-edges, agree
    /// on manifoldness, and their canonical half-edge lists match pairwise.
    fn eq(&self, other: &Self) -> bool {
        if self.num_halfedges() != other.num_halfedges() {
            return false;
        }
        if self.is_manifold() != other.is_manifold() {
            return false;
        }
        self.canonical_halfedges() == other.canonical_halfedges()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Triangle;
    use crate::test_shapes;

    #[test]
    fn test_equal_to_itself_and_clone() {
        let mesh: TriangleMesh = TriangleMesh::from_triangles(test_shapes::unit_cube()).unwrap();
        assert_eq!(mesh, mesh);
        assert_eq!(mesh.clone(), mesh);
    }

    #[test]
    fn test_empty_meshes_are_equal() {
        assert_eq!(TriangleMesh::<u32>::new(), TriangleMesh::<u32>::new());
    }

    #[test]
    fn test_different_shapes() {
        let cube: TriangleMesh = TriangleMesh::from_triangles(test_shapes::unit_cube()).unwrap();
        let tetra: TriangleMesh = TriangleMesh::from_triangles(test_shapes::tetrahedron()).unwrap();
        assert_ne!(cube, tetra);
    }

    #[test]
    fn test_moved_vertex_breaks_equality() {
        let a: TriangleMesh = TriangleMesh::from_triangles(test_shapes::tetrahedron()).unwrap();
        let mut b = a.clone();
        let v = b.vertex_ids().next().unwrap();
        let p = *b.point(v) + nalgebra::Vector3::new(0.0, 0.0, 1e-9);
        b.set_point(v, p);
        assert_ne!(a, b);
    }

    #[test]
    fn test_lamina_status_matters() {
        // Same directed edges, but only one of them closes the shared edge
        let a = [0.0, 0.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        let c = [0.0, 1.0, 0.0];
        let d = [1.0, 1.0, 0.0];
        let joined: TriangleMesh = TriangleMesh::from_triangles([
            Triangle::from_coords(a, b, c),
            Triangle::from_coords(b, d, c),
        ])
        .unwrap();

        let mut split = joined.clone();
        for he in split.halfedges.iter_mut() {
            he.symmetric = None;
        }

        assert_eq!(joined.num_halfedges(), split.num_halfedges());
        assert_eq!(joined.is_manifold(), split.is_manifold());
        assert_ne!(joined, split);
    }

    #[test]
    fn test_canonical_order() {
        let mesh: TriangleMesh = TriangleMesh::from_triangles(test_shapes::tetrahedron()).unwrap();
        let canonical = mesh.canonical_halfedges();
        assert_eq!(canonical.len(), 12);
        for pair in canonical.windows(2) {
            assert_ne!(pair[0].cmp_key(&pair[1]), Ordering::Greater);
        }
        assert!(canonical.iter().all(|he| !he.lamina));
    }
}
