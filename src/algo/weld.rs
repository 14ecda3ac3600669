//! Tolerance-based point welding.
//!
//! STL files store every corner of every facet separately, and exporters
//! do not always write shared corners bit-for-bit identical. The mesh
//! builder only merges exactly equal points, so a noisy soup should be
//! welded first: points closer than a tolerance are collapsed onto one
//! representative, and triangles are reindexed onto the welded points.
//!
//! # Example
//!
//! ```
//! use stlmesh::algo::weld::{weld_triangles, WeldOptions};
//! use stlmesh::geom::Triangle;
//! use stlmesh::mesh::TriangleMesh;
//!
//! let soup = vec![
//!     Triangle::from_coords([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
//!     // Shared corners written with a little noise
//!     Triangle::from_coords([1.0 + 1e-9, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0 - 1e-9, 0.0]),
//! ];
//!
//! let welded = weld_triangles(&soup, &WeldOptions::default()).unwrap();
//! assert_eq!(welded.points.len(), 4);
//!
//! let mesh: TriangleMesh = welded.into_mesh().unwrap();
//! assert_eq!(mesh.num_edges(), 1);
//! ```

use log::debug;
use nalgebra::Point3;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::error::{MeshError, Result};
use crate::geom::Triangle;
use crate::mesh::{MeshIndex, TriangleMesh};

/// Options for welding.
#[derive(Debug, Clone, PartialEq)]
pub struct WeldOptions {
    /// Points at most this far apart are merged. Zero merges exact
    /// duplicates only.
    pub tolerance: f64,

    /// Drop triangles that lose a corner to welding.
    pub drop_degenerate: bool,
}

impl Default for WeldOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            drop_degenerate: true,
        }
    }
}

impl WeldOptions {
    /// Create options with the given tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Keep triangles whose corners were merged together.
    pub fn keep_degenerate(mut self) -> Self {
        self.drop_degenerate = false;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(MeshError::invalid_param(
                "tolerance",
                self.tolerance,
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Deduplicated points with triangles indexing into them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeldedSoup {
    /// Welded points, in order of first use.
    pub points: Vec<Point3<f64>>,

    /// Triangles as indices into `points`, winding preserved.
    pub triangles: Vec<[usize; 3]>,

    /// Triangles removed because two corners were merged.
    pub dropped_triangles: usize,
}

impl WeldedSoup {
    /// Iterate over the welded triangles.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.triangles
            .iter()
            .map(|&[a, b, c]| Triangle::new(self.points[a], self.points[b], self.points[c]))
    }

    /// Build a mesh from the welded soup.
    pub fn into_mesh<I: MeshIndex>(self) -> Result<TriangleMesh<I>> {
        TriangleMesh::from_indexed(&self.points, &self.triangles)
    }
}

// Wrapper for RTree
struct PointWrapper(usize, Point3<f64>);

impl RTreeObject for PointWrapper {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.1.x, self.1.y, self.1.z])
    }
}

impl PointDistance for PointWrapper {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.1.x - point[0];
        let dy = self.1.y - point[1];
        let dz = self.1.z - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// Weld an indexed soup.
///
/// Points are visited in order; the first unvisited point starts a cluster
/// and claims every unclaimed point within `tolerance` of it. Points not
/// referenced by any triangle are discarded.
pub fn weld_points(
    points: &[Point3<f64>],
    triangles: &[[usize; 3]],
    options: &WeldOptions,
) -> Result<WeldedSoup> {
    options.validate()?;

    let mut used = vec![false; points.len()];
    for (ti, tri) in triangles.iter().enumerate() {
        for &index in tri {
            match used.get_mut(index) {
                Some(flag) => *flag = true,
                None => return Err(MeshError::InvalidVertexIndex { triangle: ti, index }),
            }
        }
    }

    let wrappers: Vec<PointWrapper> = points
        .iter()
        .enumerate()
        .filter(|(i, _)| used[*i])
        .map(|(i, p)| PointWrapper(i, *p))
        .collect();
    let tree = RTree::bulk_load(wrappers);

    let tolerance2 = options.tolerance * options.tolerance;
    let mut remap = vec![usize::MAX; points.len()];
    let mut welded = Vec::new();

    for (i, p) in points.iter().enumerate() {
        if !used[i] || remap[i] != usize::MAX {
            continue;
        }

        let target = welded.len();
        welded.push(*p);
        remap[i] = target;

        // Neighbors include self
        for neighbor in tree.locate_within_distance([p.x, p.y, p.z], tolerance2) {
            if remap[neighbor.0] == usize::MAX {
                remap[neighbor.0] = target;
            }
        }
    }

    let mut out = Vec::with_capacity(triangles.len());
    let mut dropped = 0;
    for &[a, b, c] in triangles {
        let tri = [remap[a], remap[b], remap[c]];
        if options.drop_degenerate && (tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2]) {
            dropped += 1;
            continue;
        }
        out.push(tri);
    }

    debug!(
        "Welded {} points into {} (tolerance {}), {} triangles kept, {} dropped",
        points.len(),
        welded.len(),
        options.tolerance,
        out.len(),
        dropped
    );

    Ok(WeldedSoup {
        points: welded,
        triangles: out,
        dropped_triangles: dropped,
    })
}

/// Weld a triangle soup.
pub fn weld_triangles(soup: &[Triangle], options: &WeldOptions) -> Result<WeldedSoup> {
    let points: Vec<Point3<f64>> = soup.iter().flat_map(|t| t.points).collect();
    let triangles: Vec<[usize; 3]> = (0..soup.len())
        .map(|i| [3 * i, 3 * i + 1, 3 * i + 2])
        .collect();
    weld_points(&points, &triangles, options)
}
