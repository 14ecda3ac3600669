//! Half-edge mesh data structure.
//!
//! Every triangle ingested into a [`TriangleMesh`] owns three half-edges that
//! form a counter-clockwise cycle via `next`/`prev`. Triangles that share an
//! edge (same two points, opposite directions) have their half-edges linked
//! through `symmetric`. A half-edge without a symmetric partner lies on the
//! mesh boundary and is called *lamina*.
//!
//! # Structure
//!
//! - Each half-edge knows its start **vertex**, owning **facet**, **next** and
//!   **prev** half-edges, and optionally its **symmetric** half-edge
//! - Each vertex stores one incident half-edge as a traversal seed
//! - Each facet stores one of its half-edges and its geometric normal
//! - Each completed [`Edge`] records a matched pair of half-edges
//!
//! All elements live in arenas owned by the mesh and are addressed by typed
//! indices. Nothing outside the mesh owns an element.

use std::cell::OnceCell;
use std::fmt;

use nalgebra::{Point3, Vector3};

use super::index::{EdgeId, FacetId, HalfEdgeId, MeshIndex, VertexId};
use super::position_index::PositionIndex;
use crate::geom::{centroid, BoundingBox, Triangle};

/// A vertex in the mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// The 3D position of this vertex.
    pub point: Point3<f64>,

    /// One half-edge starting at this vertex, used to seed fan traversal.
    pub halfedge: HalfEdgeId<I>,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create a new vertex at the given position.
    pub fn new(point: Point3<f64>) -> Self {
        Self {
            point,
            halfedge: HalfEdgeId::invalid(),
        }
    }
}

/// A half-edge in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// The vertex this half-edge starts at.
    pub vertex: VertexId<I>,

    /// The facet this half-edge bounds.
    pub facet: FacetId<I>,

    /// The next half-edge around the facet (counter-clockwise).
    pub next: HalfEdgeId<I>,

    /// The previous half-edge around the facet.
    pub prev: HalfEdgeId<I>,

    /// The opposite half-edge of the adjacent facet, `None` on the boundary.
    pub symmetric: Option<HalfEdgeId<I>>,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// Create a new unlinked half-edge.
    pub fn new() -> Self {
        Self {
            vertex: VertexId::invalid(),
            facet: FacetId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            symmetric: None,
        }
    }

    /// Check if this half-edge lies on the mesh boundary.
    #[inline]
    pub fn is_lamina(&self) -> bool {
        self.symmetric.is_none()
    }
}

impl<I: MeshIndex> Default for HalfEdge<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// A triangular facet in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct Facet<I: MeshIndex = u32> {
    /// One of the three half-edges bounding this facet.
    pub halfedge: HalfEdgeId<I>,

    /// Unit normal computed from the facet's own points at creation time.
    pub normal: Vector3<f64>,
}

/// A completed edge: two half-edges found to be each other's symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge<I: MeshIndex = u32> {
    /// The half-edge whose insertion completed the pair.
    pub halfedge: HalfEdgeId<I>,

    /// The earlier boundary half-edge it was matched with.
    pub symmetric: HalfEdgeId<I>,
}

/// A half-edge mesh built from triangles by exact point welding.
///
/// See [`TriangleMesh::add_triangle`] for the construction algorithm.
#[derive(Debug, Clone)]
pub struct TriangleMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Vertex<I>>,
    pub(crate) halfedges: Vec<HalfEdge<I>>,
    pub(crate) facets: Vec<Facet<I>>,
    pub(crate) edges: Vec<Edge<I>>,

    /// Computed on first use; cleared only by `reset` and `build`.
    pub(crate) bbox: OnceCell<BoundingBox>,

    /// Construction-time lookup, empty once a batch build completes.
    pub(crate) position_index: PositionIndex<I>,
}

impl<I: MeshIndex> Default for TriangleMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> TriangleMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            halfedges: Vec::new(),
            facets: Vec::new(),
            edges: Vec::new(),
            bbox: OnceCell::new(),
            position_index: PositionIndex::new(),
        }
    }

    /// Create a mesh with room for `num_facets` triangles.
    pub fn with_capacity(num_facets: usize) -> Self {
        // Closed triangle meshes have roughly half as many vertices as facets
        Self {
            vertices: Vec::with_capacity(num_facets / 2 + 3),
            halfedges: Vec::with_capacity(num_facets * 3),
            facets: Vec::with_capacity(num_facets),
            edges: Vec::with_capacity(num_facets * 3 / 2),
            bbox: OnceCell::new(),
            position_index: PositionIndex::new(),
        }
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Get the number of facets.
    #[inline]
    pub fn num_facets(&self) -> usize {
        self.facets.len()
    }

    /// Get the number of completed (paired) edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if the mesh has no half-edges.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.halfedges.is_empty()
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id.index()]
    }

    /// Get a half-edge by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id.index()]
    }

    /// Get a facet by ID.
    #[inline]
    pub fn facet(&self, id: FacetId<I>) -> &Facet<I> {
        &self.facets[id.index()]
    }

    /// Get a completed edge by ID.
    #[inline]
    pub fn edge(&self, id: EdgeId<I>) -> &Edge<I> {
        &self.edges[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn point(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).point
    }

    /// Move a vertex.
    ///
    /// This neither re-welds the mesh nor invalidates the cached bounding box.
    #[inline]
    pub fn set_point(&mut self, v: VertexId<I>, point: Point3<f64>) {
        self.vertices[v.index()].point = point;
        self.position_index.clear();
    }

    // ==================== Half-edge Queries ====================

    /// Get the symmetric half-edge, `None` for a lamina half-edge.
    #[inline]
    pub fn symmetric(&self, he: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
        self.halfedge(he).symmetric
    }

    /// Get the next half-edge around the facet.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Get the previous half-edge around the facet.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// Get the start vertex of a half-edge.
    #[inline]
    pub fn start_vertex(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).vertex
    }

    /// Get the end vertex of a half-edge.
    ///
    /// This goes through `next`, so it works for lamina half-edges too.
    #[inline]
    pub fn end_vertex(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.start_vertex(self.next(he))
    }

    /// Get the start point of a half-edge.
    #[inline]
    pub fn start_point(&self, he: HalfEdgeId<I>) -> &Point3<f64> {
        self.point(self.start_vertex(he))
    }

    /// Get the end point of a half-edge.
    #[inline]
    pub fn end_point(&self, he: HalfEdgeId<I>) -> &Point3<f64> {
        self.point(self.end_vertex(he))
    }

    /// Get the facet a half-edge bounds.
    #[inline]
    pub fn facet_of(&self, he: HalfEdgeId<I>) -> FacetId<I> {
        self.halfedge(he).facet
    }

    /// Check if a half-edge lies on the boundary.
    #[inline]
    pub fn is_lamina(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_lamina()
    }

    /// Start and end vertex of a half-edge.
    pub fn halfedge_vertices(&self, he: HalfEdgeId<I>) -> [VertexId<I>; 2] {
        [self.start_vertex(he), self.end_vertex(he)]
    }

    /// The facet of a half-edge followed by the facet across it, if any.
    pub fn halfedge_facets(&self, he: HalfEdgeId<I>) -> impl Iterator<Item = FacetId<I>> + '_ {
        std::iter::once(self.facet_of(he))
            .chain(self.symmetric(he).map(|sym| self.facet_of(sym)))
    }

    /// Start point of a half-edge, or `None` while its vertex is unassigned.
    pub(crate) fn try_start_point(&self, he: HalfEdgeId<I>) -> Option<&Point3<f64>> {
        let v = self.halfedges.get(he.index())?.vertex;
        if v.is_valid() {
            self.vertices.get(v.index()).map(|vertex| &vertex.point)
        } else {
            None
        }
    }

    /// End point of a half-edge, or `None` while it cannot be resolved.
    pub(crate) fn try_end_point(&self, he: HalfEdgeId<I>) -> Option<&Point3<f64>> {
        let next = self.halfedges.get(he.index())?.next;
        self.try_start_point(next)
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all vertices with their IDs.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId<I>, &Vertex<I>)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (VertexId::new(i), v))
    }

    /// Iterate over all half-edge IDs.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        (0..self.halfedges.len()).map(HalfEdgeId::new)
    }

    /// Iterate over all half-edges with their IDs.
    pub fn halfedges(&self) -> impl Iterator<Item = (HalfEdgeId<I>, &HalfEdge<I>)> + '_ {
        self.halfedges
            .iter()
            .enumerate()
            .map(|(i, he)| (HalfEdgeId::new(i), he))
    }

    /// Iterate over all facet IDs.
    pub fn facet_ids(&self) -> impl Iterator<Item = FacetId<I>> + '_ {
        (0..self.facets.len()).map(FacetId::new)
    }

    /// Iterate over all facets with their IDs.
    pub fn facets(&self) -> impl Iterator<Item = (FacetId<I>, &Facet<I>)> + '_ {
        self.facets
            .iter()
            .enumerate()
            .map(|(i, f)| (FacetId::new(i), f))
    }

    /// Iterate over all completed edges with their IDs.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId<I>, &Edge<I>)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeId::new(i), e))
    }

    // ==================== Facet Queries ====================

    /// Iterate over the three half-edges of a facet, starting at its seed.
    pub fn facet_halfedges(&self, f: FacetId<I>) -> FacetHalfEdgeIter<'_, I> {
        FacetHalfEdgeIter::new(self, f)
    }

    /// The three vertices of a facet in the order they were ingested.
    pub fn facet_vertices(&self, f: FacetId<I>) -> [VertexId<I>; 3] {
        // The seed is the last half-edge created for the facet
        let he0 = self.next(self.facet(f).halfedge);
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [
            self.start_vertex(he0),
            self.start_vertex(he1),
            self.start_vertex(he2),
        ]
    }

    /// The facet as a triangle, corners in ingestion order.
    pub fn facet_triangle(&self, f: FacetId<I>) -> Triangle {
        let [v0, v1, v2] = self.facet_vertices(f);
        Triangle::new(*self.point(v0), *self.point(v1), *self.point(v2))
    }

    /// The stored normal of a facet.
    #[inline]
    pub fn facet_normal(&self, f: FacetId<I>) -> &Vector3<f64> {
        &self.facet(f).normal
    }

    /// Compute the area of a facet.
    pub fn facet_area(&self, f: FacetId<I>) -> f64 {
        self.facet_triangle(f).area()
    }

    /// Iterate over facets sharing an edge with `f`.
    ///
    /// Boundary edges contribute nothing, so a facet yields zero to three
    /// neighbours.
    pub fn adjacent_facets(&self, f: FacetId<I>) -> impl Iterator<Item = FacetId<I>> + '_ {
        self.facet_halfedges(f)
            .filter_map(|he| self.symmetric(he))
            .map(|sym| self.facet_of(sym))
    }

    // ==================== Vertex Queries ====================

    /// Iterate over the fan of half-edges starting at a vertex.
    ///
    /// The walk rotates from the vertex's seed half-edge via `prev` then
    /// `symmetric`. It ends when it returns to the seed or hits a lamina
    /// half-edge, so boundary vertices yield a partial fan.
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> VertexFanIter<'_, I> {
        VertexFanIter::new(self, v)
    }

    /// Iterate over the facets in a vertex's fan.
    pub fn vertex_facets(&self, v: VertexId<I>) -> impl Iterator<Item = FacetId<I>> + '_ {
        self.vertex_halfedges(v).map(|he| self.facet_of(he))
    }

    /// Average of the adjacent facet normals, normalized.
    ///
    /// Returns the zero vector for a vertex without facets or when the
    /// facet normals cancel out.
    pub fn vertex_normal(&self, v: VertexId<I>) -> Vector3<f64> {
        let mut sum = Vector3::zeros();
        let mut count = 0usize;
        for f in self.vertex_facets(v) {
            sum += self.facet(f).normal;
            count += 1;
        }

        if count == 0 {
            return Vector3::zeros();
        }

        (sum / count as f64)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Number of half-edges in the vertex's (possibly partial) fan.
    pub fn valence(&self, v: VertexId<I>) -> usize {
        self.vertex_halfedges(v).count()
    }

    // ==================== Derived Properties ====================

    /// Returns `true` if every half-edge has a symmetric partner.
    ///
    /// Only edge pairing is checked. Orientation and vertex fans are not, so
    /// two closed surfaces touching at a single vertex still pass.
    pub fn is_manifold(&self) -> bool {
        self.halfedges.iter().all(|he| !he.is_lamina())
    }

    /// All half-edges without a symmetric partner, in storage order.
    pub fn lamina_halfedges(&self) -> Vec<HalfEdgeId<I>> {
        self.halfedges()
            .filter(|(_, he)| he.is_lamina())
            .map(|(id, _)| id)
            .collect()
    }

    /// The bounding box of all vertex points.
    ///
    /// Computed once and cached. Only [`reset`](Self::reset) and
    /// [`build`](Self::build) clear the cache, so the box is stale after
    /// [`center`](Self::center), [`set_point`](Self::set_point) or further
    /// [`add_triangle`](Self::add_triangle) calls.
    pub fn bbox(&self) -> &BoundingBox {
        self.bbox
            .get_or_init(|| BoundingBox::from_points(self.vertices.iter().map(|v| &v.point)))
    }

    /// Total surface area.
    pub fn area(&self) -> f64 {
        self.facet_ids().map(|f| self.facet_area(f)).sum()
    }

    /// Enclosed volume.
    ///
    /// Sums the signed volumes of the tetrahedra between each facet and the
    /// origin. Only meaningful for closed, consistently wound meshes.
    pub fn volume(&self) -> f64 {
        self.facet_ids()
            .map(|f| self.facet_triangle(f).signed_volume())
            .sum::<f64>()
            .abs()
    }

    /// Translate the mesh so the unweighted centroid of its vertices is at
    /// the origin.
    pub fn center(&mut self) {
        let Some(c) = centroid(self.vertices.iter().map(|v| &v.point)) else {
            return;
        };
        for v in &mut self.vertices {
            v.point -= c.coords;
        }
        self.position_index.clear();
    }

    // ==================== Validation ====================

    /// Check that all connectivity is consistent.
    pub fn is_valid(&self) -> bool {
        for (vid, v) in self.vertices() {
            if !v.halfedge.is_valid() || self.start_vertex(v.halfedge) != vid {
                return false;
            }
        }

        for (heid, he) in self.halfedges() {
            if !he.vertex.is_valid() || !he.facet.is_valid() {
                return false;
            }

            // Next/prev form a 3-cycle within one facet
            if self.prev(he.next) != heid || self.next(he.prev) != heid {
                return false;
            }
            if self.next(self.next(he.next)) != heid {
                return false;
            }
            if self.facet_of(he.next) != he.facet {
                return false;
            }

            // Symmetric pairing is reciprocal and reversed
            if let Some(sym) = he.symmetric {
                if self.symmetric(sym) != Some(heid) {
                    return false;
                }
                if self.start_vertex(sym) != self.end_vertex(heid)
                    || self.end_vertex(sym) != self.start_vertex(heid)
                {
                    return false;
                }
            }
        }

        for (fid, f) in self.facets() {
            if !f.halfedge.is_valid() || self.facet_of(f.halfedge) != fid {
                return false;
            }
        }

        self.edges.iter().all(|e| {
            self.symmetric(e.halfedge) == Some(e.symmetric)
                && self.symmetric(e.symmetric) == Some(e.halfedge)
        })
    }

    // ==================== Display ====================

    /// Display a half-edge as `start => end`.
    pub fn display_halfedge(&self, he: HalfEdgeId<I>) -> HalfEdgeDisplay<'_, I> {
        HalfEdgeDisplay { mesh: self, he }
    }

    /// Display a facet as its chain of half-edges.
    pub fn display_facet(&self, f: FacetId<I>) -> FacetDisplay<'_, I> {
        FacetDisplay { mesh: self, f }
    }
}

/// Iterator over the half-edges of a facet.
pub struct FacetHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a TriangleMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> FacetHalfEdgeIter<'a, I> {
    fn new(mesh: &'a TriangleMesh<I>, f: FacetId<I>) -> Self {
        let start = mesh.facet(f).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for FacetHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.mesh.next(self.current);

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

/// Iterator over the fan of half-edges starting at a vertex.
pub struct VertexFanIter<'a, I: MeshIndex = u32> {
    mesh: &'a TriangleMesh<I>,
    start: HalfEdgeId<I>,
    current: Option<HalfEdgeId<I>>,
}

impl<'a, I: MeshIndex> VertexFanIter<'a, I> {
    fn new(mesh: &'a TriangleMesh<I>, v: VertexId<I>) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start.is_valid().then_some(start),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for VertexFanIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.current?;

        // prev(he) ends at the vertex, so its symmetric starts there.
        // The rotation is injective, so the walk either closes at the
        // seed or runs into a lamina half-edge.
        self.current = self
            .mesh
            .symmetric(self.mesh.prev(result))
            .filter(|&he| he != self.start);

        Some(result)
    }
}

/// [`fmt::Display`] adapter for a half-edge, see [`TriangleMesh::display_halfedge`].
pub struct HalfEdgeDisplay<'a, I: MeshIndex = u32> {
    mesh: &'a TriangleMesh<I>,
    he: HalfEdgeId<I>,
}

impl<'a, I: MeshIndex> fmt::Display for HalfEdgeDisplay<'a, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p0 = self.mesh.start_point(self.he);
        let p1 = self.mesh.end_point(self.he);
        write!(
            f,
            "({}, {}, {}) => ({}, {}, {})",
            p0.x, p0.y, p0.z, p1.x, p1.y, p1.z
        )
    }
}

/// [`fmt::Display`] adapter for a facet, see [`TriangleMesh::display_facet`].
pub struct FacetDisplay<'a, I: MeshIndex = u32> {
    mesh: &'a TriangleMesh<I>,
    f: FacetId<I>,
}

impl<'a, I: MeshIndex> fmt::Display for FacetDisplay<'a, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, he) in self.mesh.facet_halfedges(self.f).enumerate() {
            if i > 0 {
                f.write_str(" --> ")?;
            }
            write!(f, "{}", self.mesh.display_halfedge(he))?;
        }
        Ok(())
    }
}
