//! Signed measures used to validate cell winding.
//!
//! # Supported cells
//! - **Polygon** (2D, any node count): `[v0, …, vk]` counter-clockwise in XY.
//!   The signed area is positive for counter-clockwise order.
//! - **Hexahedron** (3D): `[v0, …, v7]` with bottom face `[0, 1, 2, 3]` and
//!   top face `[4, 5, 6, 7]`, both counter-clockwise seen from above. The
//!   signed volume is positive for right-handed order.

use itertools::Itertools;

use crate::mesh_error::MeshError;

/// Tetrahedra of the six-way split of a hexahedron around its `0-6` diagonal.
const HEX_TETS: [[usize; 4]; 6] = [
    [0, 1, 2, 6],
    [0, 2, 3, 6],
    [0, 3, 7, 6],
    [0, 7, 4, 6],
    [0, 4, 5, 6],
    [0, 5, 1, 6],
];

#[inline]
pub fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

/// Scale `a` to unit length; `None` when its length is zero or not finite.
pub fn normalize(a: [f64; 3]) -> Option<[f64; 3]> {
    let len = norm(a);
    if len.is_finite() && len > f64::EPSILON {
        Some([a[0] / len, a[1] / len, a[2] / len])
    } else {
        None
    }
}

/// Arithmetic mean of a set of points.
pub fn centroid(points: &[[f64; 3]]) -> [f64; 3] {
    let n = points.len().max(1) as f64;
    let mut c = [0.0; 3];
    for p in points {
        c[0] += p[0];
        c[1] += p[1];
        c[2] += p[2];
    }
    [c[0] / n, c[1] / n, c[2] / n]
}

/// Signed area of a polygon in the XY plane (shoelace formula).
pub fn signed_area(polygon: &[[f64; 3]]) -> f64 {
    0.5 * polygon
        .iter()
        .circular_tuple_windows()
        .map(|(a, b)| (a[0] + b[0]) * (b[1] - a[1]))
        .sum::<f64>()
}

/// Signed volume of a hexahedron given its eight corners.
pub fn signed_hex_volume(corners: &[[f64; 3]; 8]) -> f64 {
    HEX_TETS
        .iter()
        .map(|t| {
            let a = sub(corners[t[1]], corners[t[0]]);
            let b = sub(corners[t[2]], corners[t[0]]);
            let c = sub(corners[t[3]], corners[t[0]]);
            dot(a, cross(b, c)) / 6.0
        })
        .sum()
}

/// Newell normal of a closed polygon; its length is twice the polygon area.
pub fn newell_normal(polygon: &[[f64; 3]]) -> [f64; 3] {
    let mut n = [0.0; 3];
    for (a, b) in polygon.iter().circular_tuple_windows() {
        n[0] += (a[1] - b[1]) * (a[2] + b[2]);
        n[1] += (a[2] - b[2]) * (a[0] + b[0]);
        n[2] += (a[0] - b[0]) * (a[1] + b[1]);
    }
    n
}

/// Signed measure of a cell: area in 2D, volume for 3D hexahedra.
pub fn signed_measure(dimension: usize, cell_coords: &[[f64; 3]]) -> Result<f64, MeshError> {
    match (dimension, cell_coords.len()) {
        (2, n) if n >= 3 => Ok(signed_area(cell_coords)),
        (3, 8) => {
            let mut corners = [[0.0; 3]; 8];
            corners.copy_from_slice(cell_coords);
            Ok(signed_hex_volume(&corners))
        }
        (d, n) => Err(MeshError::InvalidGeometry(format!(
            "no signed measure for a {n}-node cell in {d}D"
        ))),
    }
}

/// Check that `cell` is counter-clockwise (2D) or right-handed (3D).
///
/// Returns the signed measure on success and a [`MeshError::Winding`] naming
/// the cell when the measure is not strictly positive.
pub fn check_winding(
    dimension: usize,
    cell: usize,
    cell_coords: &[[f64; 3]],
) -> Result<f64, MeshError> {
    let measure = signed_measure(dimension, cell_coords)?;
    if measure.is_finite() && measure > 0.0 {
        Ok(measure)
    } else {
        Err(MeshError::Winding { cell, measure })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT_SQUARE: [[f64; 3]; 4] = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ];

    fn unit_cube() -> [[f64; 3]; 8] {
        [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ]
    }

    #[test]
    fn counter_clockwise_square_has_positive_area() {
        assert!((signed_area(&UNIT_SQUARE) - 1.0).abs() < 1e-12);
        let mut cw = UNIT_SQUARE;
        cw.reverse();
        assert!((signed_area(&cw) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn unit_cube_volume_is_one() {
        assert!((signed_hex_volume(&unit_cube()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mirrored_hex_is_rejected() {
        let mut cube = unit_cube();
        cube.swap(1, 3);
        cube.swap(5, 7);
        let err = check_winding(3, 4, &cube).unwrap_err();
        assert!(matches!(err, MeshError::Winding { cell: 4, .. }));
    }

    #[test]
    fn degenerate_triangle_is_a_winding_error() {
        let tri = [[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        assert!(matches!(
            check_winding(2, 0, &tri),
            Err(MeshError::Winding { cell: 0, .. })
        ));
    }

    #[test]
    fn newell_normal_of_square_points_up() {
        let n = normalize(newell_normal(&UNIT_SQUARE)).unwrap();
        assert!((n[2] - 1.0).abs() < 1e-12);
        assert_eq!(normalize([0.0; 3]), None);
    }
}
