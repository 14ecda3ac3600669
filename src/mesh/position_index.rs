//! Exact-position index used while welding triangles into a mesh.
//!
//! Maps each distinct point to every half-edge that starts there. Points are
//! compared exactly, ordered lexicographically on x, then y, then z. There is
//! no tolerance; near-duplicates are the welder's job (see [`crate::algo::weld`]).

use std::cmp::Ordering;
use std::collections::BTreeMap;

use nalgebra::Point3;

use super::index::{HalfEdgeId, MeshIndex};

/// A point usable as an ordered map key.
///
/// `-0.0` is folded into `0.0` so that keys agree with IEEE `==` on zeros.
/// NaN coordinates only match NaNs with the same bit pattern.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PointKey([f64; 3]);

impl PointKey {
    pub(crate) fn new(p: &Point3<f64>) -> Self {
        // Adding positive zero turns -0.0 into 0.0 and leaves everything else alone.
        Self([p.x + 0.0, p.y + 0.0, p.z + 0.0])
    }
}

impl Ord for PointKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0[0]
            .total_cmp(&other.0[0])
            .then_with(|| self.0[1].total_cmp(&other.0[1]))
            .then_with(|| self.0[2].total_cmp(&other.0[2]))
    }
}

impl PartialOrd for PointKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PointKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PointKey {}

/// Lexicographic order on points, consistent with [`same_point`].
#[inline]
pub(crate) fn cmp_points(a: &Point3<f64>, b: &Point3<f64>) -> Ordering {
    PointKey::new(a).cmp(&PointKey::new(b))
}

/// Exact point equality as used for welding.
#[inline]
pub(crate) fn same_point(a: &Point3<f64>, b: &Point3<f64>) -> bool {
    cmp_points(a, b) == Ordering::Equal
}

/// Point → half-edges starting at that point.
#[derive(Debug, Clone)]
pub(crate) struct PositionIndex<I: MeshIndex = u32> {
    buckets: BTreeMap<PointKey, Vec<HalfEdgeId<I>>>,
}

impl<I: MeshIndex> Default for PositionIndex<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> PositionIndex<I> {
    pub(crate) fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.buckets.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of distinct points indexed.
    pub(crate) fn len(&self) -> usize {
        self.buckets.len()
    }

    /// All half-edges starting at `p`, if the point has been seen.
    pub(crate) fn bucket(&self, p: &Point3<f64>) -> Option<&[HalfEdgeId<I>]> {
        self.buckets.get(&PointKey::new(p)).map(Vec::as_slice)
    }

    /// Record that `he` starts at `p`.
    pub(crate) fn insert(&mut self, p: &Point3<f64>, he: HalfEdgeId<I>) {
        self.buckets.entry(PointKey::new(p)).or_default().push(he);
    }

    #[cfg(test)]
    pub(crate) fn insert_empty(&mut self, p: &Point3<f64>) {
        self.buckets.insert(PointKey::new(p), Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_lookup() {
        let mut index: PositionIndex = PositionIndex::new();
        let p = Point3::new(1.0, 2.0, 3.0);

        assert!(index.bucket(&p).is_none());
        index.insert(&p, HalfEdgeId::new(0));
        index.insert(&p, HalfEdgeId::new(5));

        assert_eq!(
            index.bucket(&p),
            Some(&[HalfEdgeId::new(0), HalfEdgeId::new(5)][..])
        );
        assert_eq!(index.len(), 1);

        // No tolerance
        let nearby = Point3::new(1.0, 2.0, 3.0 + 1e-12);
        assert!(index.bucket(&nearby).is_none());
    }

    #[test]
    fn test_signed_zero_is_one_key() {
        let mut index: PositionIndex = PositionIndex::new();
        index.insert(&Point3::new(0.0, 0.0, 0.0), HalfEdgeId::new(1));
        assert!(index.bucket(&Point3::new(-0.0, 0.0, -0.0)).is_some());
        assert!(same_point(&Point3::new(-0.0, 1.0, 0.0), &Point3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_lexicographic_order() {
        let a = Point3::new(0.0, 5.0, 5.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(1.0, 0.0, 2.0);
        assert_eq!(cmp_points(&a, &b), Ordering::Less);
        assert_eq!(cmp_points(&c, &b), Ordering::Greater);
        assert_eq!(cmp_points(&b, &b), Ordering::Equal);
    }

    #[test]
    fn test_clear() {
        let mut index: PositionIndex<u16> = PositionIndex::default();
        index.insert(&Point3::origin(), HalfEdgeId::new(0));
        assert!(!index.is_empty());
        index.clear();
        assert!(index.is_empty());
    }
}
