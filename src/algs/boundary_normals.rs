//! Outward unit normals on the domain boundary.
//!
//! In 2D, each boundary edge `[a, b]` is oriented as in its counter-clockwise
//! cell, so the cell interior lies to the left of `a → b` and the outward
//! normal is `(dy, -dx)`. A node's normal is the normalized sum of the normals
//! of the boundary edges it lies on. In 3D, each boundary face gets the Newell
//! normal of its node loop, turned away from the owning cell's centroid.

use hashbrown::HashSet;

use crate::geometry::orientation::{centroid, dot, newell_normal, normalize, sub};
use crate::mesh_error::MeshError;
use crate::topology::adjacency::Adjacent;
use crate::topology::boundary::NodeClass;
use crate::topology::csr::CsrTable;

/// Incident edge normals closer than this (in `1 - cos`) count as one
/// direction when classifying 2D boundary nodes.
pub const STRAIGHT_BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Confirm ingestion-time boundary edge candidates against discovered cell
/// adjacency and complete the list.
///
/// Candidates that cross into a neighbouring cell are dropped. Every edge
/// whose cell slot is [`Adjacent::Boundary`] and whose endpoints are both
/// flagged boundary nodes is then appended if not already listed, in cell
/// order and slot order.
pub fn confirm_boundary_edges(
    candidates: &[[usize; 2]],
    cells_to_nodes: &CsrTable<usize>,
    cells_to_cells: &CsrTable<Adjacent>,
    boundary_index: &[Option<usize>],
) -> Vec<[usize; 2]> {
    let mut open_edges: Vec<[usize; 2]> = Vec::new();
    for (nodes, slots) in cells_to_nodes.rows().zip(cells_to_cells.rows()) {
        let k = nodes.len();
        for (slot, adj) in slots.iter().enumerate() {
            if adj.is_boundary() {
                open_edges.push([nodes[(slot + k - 1) % k], nodes[slot]]);
            }
        }
    }
    let open: HashSet<[usize; 2]> = open_edges.iter().copied().collect();

    let mut listed: HashSet<[usize; 2]> = HashSet::with_capacity(open.len());
    let mut edges = Vec::with_capacity(open.len());
    for &edge in candidates {
        if !open.contains(&edge) {
            log::warn!(
                "discarding boundary edge candidate {edge:?}: a neighbour cell lies across it"
            );
            continue;
        }
        if listed.insert(edge) {
            edges.push(edge);
        }
    }

    let flagged = |n: usize| boundary_index.get(n).copied().flatten().is_some();
    for edge in open_edges {
        if flagged(edge[0]) && flagged(edge[1]) && listed.insert(edge) {
            edges.push(edge);
        }
    }
    edges
}

/// Class and outward normal of every flagged boundary node, indexed by
/// boundary index.
///
/// A node whose incident edge normals all agree is [`NodeClass::Boundary`];
/// one where the boundary turns is [`NodeClass::Corner`]. When the summed
/// normals cancel (a hairpin), the node keeps the normal of its first edge.
pub fn resolve_node_normals_2d(
    coords: &[[f64; 3]],
    boundary_index: &[Option<usize>],
    nboundary: usize,
    edges: &[[usize; 2]],
) -> Result<(Vec<NodeClass>, Vec<[f64; 3]>), MeshError> {
    let mut sums = vec![[0.0; 3]; nboundary];
    let mut first: Vec<Option<[f64; 3]>> = vec![None; nboundary];
    let mut classes = vec![NodeClass::Boundary; nboundary];

    for &[a, b] in edges {
        let d = sub(coords[b], coords[a]);
        let normal = normalize([d[1], -d[0], 0.0]).ok_or_else(|| {
            MeshError::InvalidGeometry(format!("boundary edge {a}-{b} has zero length"))
        })?;
        for node in [a, b] {
            let Some(bi) = boundary_index[node] else {
                continue;
            };
            for axis in 0..3 {
                sums[bi][axis] += normal[axis];
            }
            match first[bi] {
                None => first[bi] = Some(normal),
                Some(f) if dot(f, normal) < 1.0 - STRAIGHT_BOUNDARY_TOLERANCE => {
                    classes[bi] = NodeClass::Corner;
                }
                Some(_) => {}
            }
        }
    }

    let mut normals = Vec::with_capacity(nboundary);
    for (node, bi) in boundary_index.iter().enumerate() {
        let Some(bi) = *bi else {
            continue;
        };
        let f = first[bi].ok_or(MeshError::DetachedBoundaryNode { node })?;
        normals.push((bi, normalize(sums[bi]).unwrap_or(f)));
    }
    normals.sort_unstable_by_key(|&(bi, _)| bi);
    Ok((classes, normals.into_iter().map(|(_, n)| n).collect()))
}

/// Boundary faces of a 3D mesh and their outward unit normals, in face order.
pub fn boundary_face_normals(
    coords: &[[f64; 3]],
    faces_to_nodes: &CsrTable<usize>,
    faces_to_cells0: &[Option<usize>],
    faces_to_cells1: &[Option<usize>],
    cells_to_nodes: &CsrTable<usize>,
) -> Result<(Vec<usize>, Vec<[f64; 3]>), MeshError> {
    let mut faces = Vec::new();
    let mut normals = Vec::new();

    for (face, nodes) in faces_to_nodes.rows().enumerate() {
        let owner = match (faces_to_cells0[face], faces_to_cells1[face]) {
            (Some(c), None) | (None, Some(c)) => c,
            _ => continue,
        };
        let loop_coords: Vec<[f64; 3]> = nodes.iter().map(|&n| coords[n]).collect();
        let cell_coords: Vec<[f64; 3]> = cells_to_nodes
            .row(owner)
            .iter()
            .map(|&n| coords[n])
            .collect();

        let mut n = normalize(newell_normal(&loop_coords)).ok_or_else(|| {
            MeshError::InvalidGeometry(format!("boundary face {face} has zero area"))
        })?;
        let outward = sub(centroid(&loop_coords), centroid(&cell_coords));
        if dot(n, outward) < 0.0 {
            n = [-n[0], -n[1], -n[2]];
        }
        faces.push(face);
        normals.push(n);
    }
    Ok((faces, normals))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<[f64; 3]> {
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]
    }

    #[test]
    fn square_corners_point_diagonally_out() {
        let index = vec![Some(0), Some(1), Some(2), Some(3)];
        let edges = [[0, 1], [1, 2], [2, 3], [3, 0]];
        let (classes, normals) = resolve_node_normals_2d(&square(), &index, 4, &edges).unwrap();
        assert!(classes.iter().all(|&c| c == NodeClass::Corner));
        let h = std::f64::consts::FRAC_1_SQRT_2;
        assert!((normals[0][0] + h).abs() < 1e-12 && (normals[0][1] + h).abs() < 1e-12);
        assert!((normals[2][0] - h).abs() < 1e-12 && (normals[2][1] - h).abs() < 1e-12);
    }

    #[test]
    fn straight_run_is_plain_boundary() {
        let coords = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        let index = vec![Some(0), Some(1), Some(2)];
        let (classes, normals) =
            resolve_node_normals_2d(&coords, &index, 3, &[[0, 1], [1, 2]]).unwrap();
        assert_eq!(classes[1], NodeClass::Boundary);
        assert!((normals[1][1] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn flagged_node_without_edges_is_detached() {
        let index = vec![Some(0), Some(1), None, Some(2)];
        let err = resolve_node_normals_2d(&square(), &index, 3, &[[0, 1]]).unwrap_err();
        assert_eq!(err, MeshError::DetachedBoundaryNode { node: 3 });
    }

    #[test]
    fn interior_candidates_are_dropped_and_open_slots_added() {
        // two triangles sharing diagonal 0-2; all four nodes on the boundary
        let cells = CsrTable::uniform(3, vec![0, 1, 2, 0, 2, 3]).unwrap();
        let c2c = CsrTable::uniform(
            3,
            vec![
                Adjacent::Cell(1),
                Adjacent::Boundary,
                Adjacent::Boundary,
                Adjacent::Boundary,
                Adjacent::Cell(0),
                Adjacent::Boundary,
            ],
        )
        .unwrap();
        let index = vec![Some(0), Some(1), Some(2), Some(3)];
        let edges = confirm_boundary_edges(&[[2, 0], [1, 2]], &cells, &c2c, &index);
        assert_eq!(edges, vec![[1, 2], [0, 1], [3, 0], [2, 3]]);
    }
}
