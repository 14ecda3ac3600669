//! Triangle soups shared by unit tests.

use std::f64::consts::PI;

use nalgebra::Point3;

use crate::geom::Triangle;

/// Regular-ish tetrahedron with outward winding. Volume 1/8.
pub fn tetrahedron() -> Vec<Triangle> {
    let a = [-0.5, -0.4330127, 0.0];
    let b = [0.5, -0.4330127, 0.0];
    let c = [0.0, 0.0, 0.8660254];
    let d = [0.0, 0.4330127, 0.0];
    vec![
        Triangle::from_coords(a, b, c),
        Triangle::from_coords(a, c, d),
        Triangle::from_coords(d, c, b),
        Triangle::from_coords(b, a, d),
    ]
}

/// Two facets sharing the edge `(1,0,0) - (0,1,0)`.
pub fn two_triangles() -> Vec<Triangle> {
    vec![
        Triangle::from_coords([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        Triangle::from_coords([1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]),
    ]
}

/// The unit cube `[0, 1]^3`, two outward-facing triangles per side.
pub fn unit_cube() -> Vec<Triangle> {
    let quads = [
        // z = 0
        [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
        // z = 1
        [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]],
        // y = 0
        [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
        // y = 1
        [[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]],
        // x = 0
        [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]],
        // x = 1
        [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]],
    ];

    quads
        .iter()
        .flat_map(|&[a, b, c, d]| [Triangle::from_coords(a, b, c), Triangle::from_coords(a, c, d)])
        .collect()
}

/// Unit UV sphere with single pole vertices.
///
/// Every shared corner is taken from the same stored point, so the soup
/// welds exactly.
pub fn uv_sphere(stacks: usize, slices: usize) -> Vec<Triangle> {
    let mut points = vec![Point3::new(0.0, 0.0, 1.0)];
    for i in 1..stacks {
        let theta = PI * i as f64 / stacks as f64;
        for j in 0..slices {
            let phi = 2.0 * PI * j as f64 / slices as f64;
            points.push(Point3::new(
                theta.sin() * phi.cos(),
                theta.sin() * phi.sin(),
                theta.cos(),
            ));
        }
    }
    points.push(Point3::new(0.0, 0.0, -1.0));

    let south = points.len() - 1;
    let at = |i: usize, j: usize| -> Point3<f64> {
        let index = match i {
            0 => 0,
            i if i == stacks => south,
            i => 1 + (i - 1) * slices + j % slices,
        };
        points[index]
    };

    let mut triangles = Vec::new();
    for i in 0..stacks {
        for j in 0..slices {
            let p00 = at(i, j);
            let p10 = at(i + 1, j);
            let p11 = at(i + 1, j + 1);
            let p01 = at(i, j + 1);
            if i != stacks - 1 {
                triangles.push(Triangle::new(p00, p10, p11));
            }
            if i != 0 {
                triangles.push(Triangle::new(p00, p11, p01));
            }
        }
    }
    triangles
}

/// Deterministic permutation of a soup.
pub fn shuffled(mut triangles: Vec<Triangle>) -> Vec<Triangle> {
    let n = triangles.len();
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    for i in (1..n).rev() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        triangles.swap(i, (state % (i as u64 + 1)) as usize);
    }
    triangles
}
