//! Geometry primitives: triangles, bounding boxes and centroids.

use std::ops::Index;

use nalgebra::{Point3, Vector3};

/// Three ordered points forming a triangle.
///
/// The order defines the winding: the normal follows the right-hand rule
/// over `p0 -> p1 -> p2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// The corner points, in winding order.
    pub points: [Point3<f64>; 3],
}

impl Triangle {
    /// Create a triangle from three points.
    pub fn new(p0: Point3<f64>, p1: Point3<f64>, p2: Point3<f64>) -> Self {
        Self {
            points: [p0, p1, p2],
        }
    }

    /// Create a triangle from raw coordinate triples.
    pub fn from_coords(p0: [f64; 3], p1: [f64; 3], p2: [f64; 3]) -> Self {
        Self::new(Point3::from(p0), Point3::from(p1), Point3::from(p2))
    }

    /// Unnormalized normal: `(p1 - p0) x (p2 - p0)`. Its length is twice the area.
    #[inline]
    pub fn cross(&self) -> Vector3<f64> {
        let [p0, p1, p2] = &self.points;
        (p1 - p0).cross(&(p2 - p0))
    }

    /// Unit normal, or the zero vector for a degenerate triangle.
    pub fn normal(&self) -> Vector3<f64> {
        self.cross()
            .try_normalize(0.0)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Area of the triangle.
    pub fn area(&self) -> f64 {
        0.5 * self.cross().norm()
    }

    /// Signed volume of the tetrahedron spanned by the triangle and the origin.
    pub fn signed_volume(&self) -> f64 {
        let [p0, p1, p2] = &self.points;
        p0.coords.dot(&p1.coords.cross(&p2.coords)) / 6.0
    }

    /// Returns `true` if two corners coincide or the corners are collinear.
    pub fn is_degenerate(&self) -> bool {
        self.cross() == Vector3::zeros()
    }
}

impl Index<usize> for Triangle {
    type Output = Point3<f64>;

    fn index(&self, i: usize) -> &Point3<f64> {
        &self.points[i]
    }
}

impl From<[Point3<f64>; 3]> for Triangle {
    fn from(points: [Point3<f64>; 3]) -> Self {
        Self { points }
    }
}

/// An axis-aligned bounding box.
///
/// A freshly created box is empty: it contains no points and [`is_empty`]
/// returns `true` until a point is added.
///
/// [`is_empty`]: BoundingBox::is_empty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    min: Point3<f64>,
    max: Point3<f64>,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    /// Create an empty box.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Create the smallest box enclosing the given points.
    pub fn from_points<'a, It>(points: It) -> Self
    where
        It: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut bbox = Self::empty();
        for p in points {
            bbox.add_point(p);
        }
        bbox
    }

    /// Grow the box to include `p`.
    pub fn add_point(&mut self, p: &Point3<f64>) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    /// Returns `true` if no point has been added.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    /// Minimum corner.
    pub fn min(&self) -> &Point3<f64> {
        &self.min
    }

    /// Maximum corner.
    pub fn max(&self) -> &Point3<f64> {
        &self.max
    }

    /// Size along each axis; zero for an empty box.
    pub fn extent(&self) -> Vector3<f64> {
        if self.is_empty() {
            Vector3::zeros()
        } else {
            self.max - self.min
        }
    }

    /// Center of the box, or `None` if it is empty.
    pub fn center(&self) -> Option<Point3<f64>> {
        if self.is_empty() {
            None
        } else {
            Some(nalgebra::center(&self.min, &self.max))
        }
    }
}

/// Unweighted centroid of a set of points, or `None` if there are none.
pub fn centroid<'a, It>(points: It) -> Option<Point3<f64>>
where
    It: IntoIterator<Item = &'a Point3<f64>>,
{
    let mut sum = Vector3::zeros();
    let mut count = 0usize;
    for p in points {
        sum += p.coords;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(Point3::from(sum / count as f64))
    }
}
