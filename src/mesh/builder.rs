//! Mesh construction.
//!
//! Triangles are welded into the mesh one at a time. Each incoming point is
//! looked up in an exact-position index: a hit reuses the existing vertex,
//! a miss creates a new one. While a corner is being attached, the index is
//! also searched for an earlier boundary half-edge running the opposite way,
//! and the two are linked as symmetric partners.
//!
//! Welding is exact. Points that differ in the last bit stay separate, so
//! noisy input should go through [`crate::algo::weld`] first.

use log::{debug, error, trace};
use nalgebra::Point3;

use super::halfedge::{Edge, Facet, HalfEdge, TriangleMesh, Vertex};
use super::index::{FacetId, HalfEdgeId, MeshIndex, VertexId};
use super::position_index::same_point;
use crate::error::{ConsistencyError, MeshError, Result};
use crate::geom::Triangle;

/// Receiver for a stream of triangles.
///
/// Readers push triangles into a sink as they decode them, so the same
/// reader can fill a mesh directly or just collect the soup.
pub trait TriangleSink {
    /// Accept one triangle.
    fn push_triangle(&mut self, triangle: Triangle) -> Result<()>;

    /// Called once after the last triangle.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl TriangleSink for Vec<Triangle> {
    fn push_triangle(&mut self, triangle: Triangle) -> Result<()> {
        self.push(triangle);
        Ok(())
    }
}

impl<I: MeshIndex> TriangleSink for TriangleMesh<I> {
    fn push_triangle(&mut self, triangle: Triangle) -> Result<()> {
        self.add_triangle(triangle).map(|_| ())
    }

    fn finish(&mut self) -> Result<()> {
        self.position_index.clear();
        debug!(
            "Finished streaming construction: {} vertices, {} facets, {} edges",
            self.num_vertices(),
            self.num_facets(),
            self.num_edges()
        );
        Ok(())
    }
}

impl<I: MeshIndex> TriangleMesh<I> {
    /// Build a mesh from a sequence of triangles.
    ///
    /// # Example
    /// ```
    /// use stlmesh::geom::Triangle;
    /// use stlmesh::mesh::TriangleMesh;
    ///
    /// let a = [0.0, 0.0, 0.0];
    /// let b = [1.0, 0.0, 0.0];
    /// let c = [0.0, 1.0, 0.0];
    /// let d = [1.0, 1.0, 0.0];
    ///
    /// let mesh: TriangleMesh = TriangleMesh::from_triangles([
    ///     Triangle::from_coords(a, b, c),
    ///     Triangle::from_coords(b, d, c),
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(mesh.num_vertices(), 4);
    /// assert_eq!(mesh.num_edges(), 1);
    /// assert_eq!(mesh.lamina_halfedges().len(), 4);
    /// ```
    pub fn from_triangles<T>(triangles: T) -> Result<Self>
    where
        T: IntoIterator<Item = Triangle>,
    {
        let mut mesh = Self::new();
        mesh.build(triangles)?;
        Ok(mesh)
    }

    /// Build a mesh from a shared point list and index triples.
    ///
    /// Indices are resolved to points and welded exactly like
    /// [`from_triangles`](Self::from_triangles), so two distinct indices
    /// referring to the same position end up as one vertex.
    pub fn from_indexed(points: &[Point3<f64>], triangles: &[[usize; 3]]) -> Result<Self> {
        for (ti, tri) in triangles.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i >= points.len()) {
                return Err(MeshError::InvalidVertexIndex { triangle: ti, index });
            }
        }

        let mut mesh = Self::with_capacity(triangles.len());
        mesh.build(
            triangles
                .iter()
                .map(|&[a, b, c]| Triangle::new(points[a], points[b], points[c])),
        )?;
        Ok(mesh)
    }

    /// Clear all elements and the cached bounding box.
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.halfedges.clear();
        self.facets.clear();
        self.edges.clear();
        self.bbox.take();
        self.position_index.clear();
    }

    /// Replace the mesh contents with the given triangles.
    ///
    /// The position index is dropped once the batch is done. On error the
    /// mesh is left empty.
    pub fn build<T>(&mut self, triangles: T) -> Result<()>
    where
        T: IntoIterator<Item = Triangle>,
    {
        if !self.is_empty() {
            self.reset();
        }
        self.bbox.take();
        self.position_index.clear();

        for triangle in triangles {
            if let Err(err) = self.add_triangle(triangle) {
                self.reset();
                return Err(err);
            }
        }

        self.position_index.clear();

        debug!(
            "Built mesh: {} vertices, {} facets, {} edges, {} lamina half-edges",
            self.num_vertices(),
            self.num_facets(),
            self.num_edges(),
            self.num_halfedges() - 2 * self.num_edges()
        );

        Ok(())
    }

    /// Weld one triangle into the mesh and return its facet.
    ///
    /// Three half-edges are created, one per corner, linked into a cycle in
    /// input order. For each corner:
    ///
    /// 1. A point not yet in the mesh becomes a new vertex.
    /// 2. Otherwise the existing vertex is reused, and the half-edges starting
    ///    at that point are scanned for one whose predecessor runs from the
    ///    next corner back to this one and has no partner yet. If found, the
    ///    two half-edges become symmetric and a new [`Edge`] is recorded.
    ///
    /// The facet normal is computed from the triangle's own points.
    ///
    /// May be called after [`build`](Self::build); the position index is
    /// rebuilt from the existing half-edges on demand.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidParameter`] if the new half-edges would not
    /// be addressable by the index type `I`; the mesh is left unchanged.
    /// Returns [`MeshError::Consistency`] if the position index disagrees
    /// with the mesh. The mesh is reset to empty before returning.
    pub fn add_triangle(&mut self, triangle: Triangle) -> Result<FacetId<I>> {
        // Vertices, facets and edges never outnumber half-edges
        if self.halfedges.len() + 2 > I::MAX.to_usize() {
            return Err(MeshError::invalid_param(
                "triangle count",
                self.facets.len() + 1,
                "exceeds the capacity of the mesh index type",
            ));
        }

        if self.position_index.is_empty() && !self.halfedges.is_empty() {
            self.rebuild_position_index();
        }

        match self.weld_triangle(&triangle) {
            Ok(f) => Ok(f),
            Err(err) => {
                error!("Mesh consistency violated, resetting mesh: {}", err);
                self.reset();
                Err(err.into())
            }
        }
    }

    fn weld_triangle(
        &mut self,
        triangle: &Triangle,
    ) -> std::result::Result<FacetId<I>, ConsistencyError> {
        let base = self.halfedges.len();
        let facet = FacetId::new(self.facets.len());
        let ids: [HalfEdgeId<I>; 3] = [
            HalfEdgeId::new(base),
            HalfEdgeId::new(base + 1),
            HalfEdgeId::new(base + 2),
        ];

        for i in 0..3 {
            self.halfedges.push(HalfEdge {
                vertex: VertexId::invalid(),
                facet,
                next: ids[(i + 1) % 3],
                prev: ids[(i + 2) % 3],
                symmetric: None,
            });
        }

        // The facet is seeded with the last half-edge created
        self.facets.push(Facet {
            halfedge: ids[2],
            normal: triangle.normal(),
        });

        for (i, &he) in ids.iter().enumerate() {
            let point = triangle[i];
            let next_point = triangle[(i + 1) % 3];

            if self.position_index.bucket(&point).is_none() {
                let v = VertexId::new(self.vertices.len());
                self.vertices.push(Vertex { point, halfedge: he });
                self.halfedges[he.index()].vertex = v;
                self.position_index.insert(&point, he);
                continue;
            }

            let v = self.bucket_vertex(&point)?;
            self.halfedges[he.index()].vertex = v;

            if let Some(sym) = self.find_symmetric(&point, &next_point, he) {
                let end = self.end_point(sym);
                if !same_point(end, &point) {
                    return Err(ConsistencyError::SymmetricPointMismatch {
                        expected: point,
                        found: *end,
                    });
                }

                self.halfedges[he.index()].symmetric = Some(sym);
                self.halfedges[sym.index()].symmetric = Some(he);
                self.edges.push(Edge {
                    halfedge: he,
                    symmetric: sym,
                });
                trace!("Paired {:?} with {:?}", he, sym);
            }

            self.position_index.insert(&point, he);
        }

        Ok(facet)
    }

    /// The vertex shared by every half-edge indexed under `point`.
    fn bucket_vertex(&self, point: &Point3<f64>) -> std::result::Result<VertexId<I>, ConsistencyError> {
        let bucket = self.position_index.bucket(point).unwrap_or_default();
        let (&first, rest) = bucket
            .split_first()
            .ok_or(ConsistencyError::EmptyPositionBucket { point: *point })?;

        let v = self.halfedges[first.index()].vertex;
        if rest.iter().any(|&e| self.halfedges[e.index()].vertex != v) {
            return Err(ConsistencyError::VertexMismatch { point: *point });
        }
        if !v.is_valid() {
            return Err(ConsistencyError::NullVertex { point: *point });
        }

        Ok(v)
    }

    /// Find an unpaired half-edge running `next_point -> point`.
    ///
    /// Candidates are the predecessors of half-edges starting at `point`, so
    /// they end there by construction; the caller verifies the end point.
    fn find_symmetric(
        &self,
        point: &Point3<f64>,
        next_point: &Point3<f64>,
        he: HalfEdgeId<I>,
    ) -> Option<HalfEdgeId<I>> {
        self.position_index
            .bucket(point)?
            .iter()
            .map(|&e| self.prev(e))
            .find(|&candidate| {
                candidate != he
                    && self.halfedge(candidate).symmetric.is_none()
                    && self
                        .try_start_point(candidate)
                        .is_some_and(|start| same_point(start, next_point))
            })
    }

    fn rebuild_position_index(&mut self) {
        for (i, he) in self.halfedges.iter().enumerate() {
            if let Some(vertex) = self.vertices.get(he.vertex.index()) {
                self.position_index.insert(&vertex.point, HalfEdgeId::new(i));
            }
        }
        debug!(
            "Rebuilt position index with {} points",
            self.position_index.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::index::EdgeId;
    use crate::test_shapes;

    fn check_counts(mesh: &TriangleMesh, vertices: usize, facets: usize, edges: usize) {
        assert_eq!(mesh.num_vertices(), vertices);
        assert_eq!(mesh.num_facets(), facets);
        assert_eq!(mesh.num_halfedges(), 3 * facets);
        assert_eq!(mesh.num_edges(), edges);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_tetrahedron() {
        let mesh: TriangleMesh = TriangleMesh::from_triangles(test_shapes::tetrahedron()).unwrap();

        check_counts(&mesh, 4, 4, 6);
        assert!(mesh.is_manifold());
        assert!(mesh.lamina_halfedges().is_empty());
        assert!(mesh.position_index.is_empty());
    }

    #[test]
    fn test_unit_cube() {
        let mesh: TriangleMesh = TriangleMesh::from_triangles(test_shapes::unit_cube()).unwrap();
        check_counts(&mesh, 8, 12, 18);
        assert!(mesh.is_manifold());
    }

    #[test]
    fn test_sphere_euler_characteristic() {
        let stacks = 12;
        let slices = 20;
        let mesh: TriangleMesh =
            TriangleMesh::from_triangles(test_shapes::uv_sphere(stacks, slices)).unwrap();

        assert_eq!(mesh.num_vertices(), 2 + (stacks - 1) * slices);
        assert!(mesh.is_manifold());
        assert!(mesh.is_valid());

        let v = mesh.num_vertices() as i64;
        let e = (mesh.num_halfedges() / 2) as i64;
        let f = mesh.num_facets() as i64;
        assert_eq!(v - e + f, 2);
        assert_eq!(mesh.num_edges() as i64, e);
    }

    #[test]
    fn test_single_triangle() {
        let mesh: TriangleMesh = TriangleMesh::from_triangles([Triangle::from_coords(
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        )])
        .unwrap();

        check_counts(&mesh, 3, 1, 0);
        assert_eq!(mesh.lamina_halfedges().len(), 3);
        assert!(!mesh.is_manifold());
    }

    #[test]
    fn test_ingestion_order_does_not_matter() {
        let forward = test_shapes::tetrahedron();
        let mut reversed = forward.clone();
        reversed.reverse();
        let rotated: Vec<Triangle> = forward
            .iter()
            .map(|t| Triangle::new(t[1], t[2], t[0]))
            .collect();

        let a: TriangleMesh = TriangleMesh::from_triangles(forward).unwrap();
        for other in [reversed, rotated] {
            let b: TriangleMesh = TriangleMesh::from_triangles(other).unwrap();
            check_counts(&b, 4, 4, 6);
            assert!(b.is_manifold());
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_sphere_shuffled() {
        let triangles = test_shapes::uv_sphere(10, 16);
        let a: TriangleMesh = TriangleMesh::from_triangles(triangles.clone()).unwrap();
        let b: TriangleMesh = TriangleMesh::from_triangles(test_shapes::shuffled(triangles)).unwrap();

        assert_eq!(a.num_vertices(), b.num_vertices());
        assert_eq!(a.num_edges(), b.num_edges());
        assert!(b.is_manifold());
        assert_eq!(a, b);
    }

    #[test]
    fn test_shared_edge_between_three_facets() {
        let a = [0.0, 0.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        let mesh: TriangleMesh = TriangleMesh::from_triangles([
            Triangle::from_coords(a, b, [0.5, 1.0, 0.0]),
            Triangle::from_coords(b, a, [0.5, -1.0, 0.0]),
            Triangle::from_coords(b, a, [0.5, 0.0, 1.0]),
        ])
        .unwrap();

        // The first two facets claim the edge; the third stays lamina there
        check_counts(&mesh, 5, 3, 1);
        let edge = mesh.edge(EdgeId::new(0));
        assert_eq!(mesh.facet_of(edge.halfedge), FacetId::new(1));
        assert_eq!(mesh.facet_of(edge.symmetric), FacetId::new(0));

        let third: Vec<_> = mesh.facet_halfedges(FacetId::new(2)).collect();
        assert!(third.iter().all(|&he| mesh.is_lamina(he)));
    }

    #[test]
    fn test_consistent_orientation_required() {
        // Same two triangles, second one flipped: the shared edge runs the
        // same direction in both, so nothing pairs.
        let mesh: TriangleMesh = TriangleMesh::from_triangles([
            Triangle::from_coords([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            Triangle::from_coords([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]),
        ])
        .unwrap();

        check_counts(&mesh, 4, 2, 0);
    }

    #[test]
    fn test_degenerate_triangle_is_accepted() {
        let p = [1.0, 1.0, 1.0];
        let mesh: TriangleMesh =
            TriangleMesh::from_triangles([Triangle::from_coords(p, [2.0, 1.0, 1.0], p)]).unwrap();

        check_counts(&mesh, 2, 1, 0);
        assert_eq!(*mesh.facet_normal(FacetId::new(0)), nalgebra::Vector3::zeros());
    }

    #[test]
    fn test_add_after_build() {
        let mut triangles = test_shapes::tetrahedron();
        let last = triangles.pop().unwrap();

        let mut mesh: TriangleMesh = TriangleMesh::from_triangles(triangles).unwrap();
        assert!(!mesh.is_manifold());
        assert!(mesh.position_index.is_empty());

        let f = mesh.add_triangle(last).unwrap();
        assert_eq!(f, FacetId::new(3));
        check_counts(&mesh, 4, 4, 6);
        assert!(mesh.is_manifold());
    }

    #[test]
    fn test_build_replaces_contents() {
        let mut mesh: TriangleMesh = TriangleMesh::from_triangles(test_shapes::unit_cube()).unwrap();
        mesh.build(test_shapes::tetrahedron()).unwrap();
        check_counts(&mesh, 4, 4, 6);

        mesh.build(std::iter::empty()).unwrap();
        assert!(mesh.is_empty());
        assert!(mesh.bbox().is_empty());
    }

    #[test]
    fn test_from_indexed() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            // Same position as index 1
            Point3::new(1.0, 0.0, 0.0),
        ];
        let mesh: TriangleMesh = TriangleMesh::from_indexed(&points, &[[0, 1, 2], [4, 3, 2]]).unwrap();
        check_counts(&mesh, 4, 2, 1);
    }

    #[test]
    fn test_from_indexed_invalid_index() {
        let points = vec![Point3::new(0.0, 0.0, 0.0)];
        let result: Result<TriangleMesh> = TriangleMesh::from_indexed(&points, &[[0, 1, 2]]);
        assert!(matches!(
            result,
            Err(MeshError::InvalidVertexIndex { triangle: 0, index: 1 })
        ));
    }

    #[test]
    fn test_sink_collects_triangles() {
        let mut soup: Vec<Triangle> = Vec::new();
        for t in test_shapes::tetrahedron() {
            soup.push_triangle(t).unwrap();
        }
        soup.finish().unwrap();
        assert_eq!(soup, test_shapes::tetrahedron());

        let mut mesh: TriangleMesh = TriangleMesh::new();
        for t in soup {
            mesh.push_triangle(t).unwrap();
        }
        assert!(!mesh.position_index.is_empty());
        mesh.finish().unwrap();
        assert!(mesh.position_index.is_empty());
        assert!(mesh.is_manifold());
    }

    #[test]
    fn test_duplicate_triangle_then_reverse() {
        let (a, b, c) = ([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let mut mesh: TriangleMesh = TriangleMesh::new();

        let first = mesh.add_triangle(Triangle::from_coords(a, b, c)).unwrap();
        let second = mesh.add_triangle(Triangle::from_coords(a, b, c)).unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_edges(), 0);
        assert_eq!(mesh.lamina_halfedges().len(), 6);

        let reversed = mesh.add_triangle(Triangle::from_coords(a, c, b)).unwrap();
        assert_eq!(mesh.num_edges(), 3);
        assert_eq!(mesh.lamina_halfedges().len(), 3);

        for he in mesh.facet_halfedges(reversed) {
            let sym = mesh.symmetric(he).unwrap();
            assert_eq!(mesh.facet_of(sym), first);
        }
        assert!(mesh.facet_halfedges(first).all(|he| !mesh.is_lamina(he)));
        assert!(mesh.facet_halfedges(second).all(|he| mesh.is_lamina(he)));
        assert!(mesh.is_valid());
        assert!(!mesh.is_manifold());
    }

    fn disjoint_triangles(n: usize) -> impl Iterator<Item = Triangle> {
        (0..n).map(|i| {
            let x = i as f64;
            Triangle::from_coords([x, 0.0, 0.0], [x, 1.0, 0.0], [x, 0.0, 1.0])
        })
    }

    #[test]
    fn test_index_capacity() {
        // 21845 triangles use half-edge ids up to u16::MAX - 1
        let full: TriangleMesh<u16> = TriangleMesh::from_triangles(disjoint_triangles(21845)).unwrap();
        assert_eq!(full.num_halfedges(), 65535);
        assert_eq!(full.num_vertices(), 65535);
        assert!(full.halfedge_ids().all(|he| he.is_valid()));

        let mut mesh = full.clone();
        let err = mesh
            .add_triangle(Triangle::from_coords([-1.0, 0.0, 0.0], [-1.0, 1.0, 0.0], [-1.0, 0.0, 1.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            MeshError::InvalidParameter { name: "triangle count", .. }
        ));
        assert!(!err.is_consistency_violation());
        assert_eq!(mesh.num_facets(), 21845);
        assert!(mesh.is_valid());

        let mut rebuilt: TriangleMesh<u16> = TriangleMesh::from_triangles(test_shapes::tetrahedron()).unwrap();
        let err = rebuilt.build(disjoint_triangles(21846)).unwrap_err();
        assert!(matches!(err, MeshError::InvalidParameter { .. }));
        assert!(rebuilt.is_empty());
    }

    #[test]
    fn test_moved_vertex_welds_at_new_position() {
        let mut mesh: TriangleMesh = TriangleMesh::new();
        mesh.add_triangle(test_shapes::tetrahedron()[0]).unwrap();

        let v = VertexId::new(0);
        let moved = Point3::new(5.0, 5.0, 5.0);
        mesh.set_point(v, moved);

        mesh.add_triangle(Triangle::new(
            moved,
            Point3::new(6.0, 5.0, 5.0),
            Point3::new(5.0, 6.0, 5.0),
        ))
        .unwrap();
        assert_eq!(mesh.num_vertices(), 5);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_empty_bucket_resets_mesh() {
        let mut mesh: TriangleMesh = TriangleMesh::new();
        mesh.add_triangle(test_shapes::tetrahedron()[0]).unwrap();
        let p = Point3::new(7.0, 7.0, 7.0);
        mesh.position_index.insert_empty(&p);

        let err = mesh
            .add_triangle(Triangle::new(p, Point3::new(8.0, 7.0, 7.0), Point3::new(7.0, 8.0, 7.0)))
            .unwrap_err();
        assert!(matches!(
            err,
            MeshError::Consistency(ConsistencyError::EmptyPositionBucket { .. })
        ));
        assert!(mesh.is_empty());
        assert_eq!(mesh.num_vertices(), 0);
        assert_eq!(mesh.num_facets(), 0);
    }

    #[test]
    fn test_vertex_mismatch_resets_mesh() {
        let mut mesh: TriangleMesh = TriangleMesh::new();
        for t in test_shapes::two_triangles() {
            mesh.add_triangle(t).unwrap();
        }
        // Point (1, 0, 0) starts a half-edge in both facets
        let shared = Point3::new(1.0, 0.0, 0.0);
        let bucket = mesh.position_index.bucket(&shared).unwrap().to_vec();
        assert_eq!(bucket.len(), 2);
        mesh.halfedges[bucket[1].index()].vertex = VertexId::new(0);

        let err = mesh
            .add_triangle(Triangle::new(shared, Point3::new(2.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)))
            .unwrap_err();
        assert!(err.is_consistency_violation());
        assert!(matches!(
            err,
            MeshError::Consistency(ConsistencyError::VertexMismatch { .. })
        ));
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_null_vertex_resets_mesh() {
        let mut mesh: TriangleMesh = TriangleMesh::new();
        let t = test_shapes::tetrahedron()[0];
        mesh.add_triangle(t).unwrap();
        mesh.halfedges[0].vertex = VertexId::invalid();

        let err = mesh.add_triangle(test_shapes::tetrahedron()[1]).unwrap_err();
        assert!(matches!(
            err,
            MeshError::Consistency(ConsistencyError::NullVertex { .. })
        ));
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_small_index_type() {
        let mesh: TriangleMesh<u16> = TriangleMesh::from_triangles(test_shapes::unit_cube()).unwrap();
        assert_eq!(mesh.num_edges(), 18);
        assert!(mesh.is_manifold());
    }
}
