//! Topology validation helpers.
//!
//! [`DebugInvariants`] for [`UnstructuredMesh`] checks the structural
//! properties every built mesh must satisfy, whichever producer built it.

use crate::debug_invariants::DebugInvariants;
use crate::geometry::orientation::{check_winding, norm};
use crate::mesh_error::MeshError;
use crate::topology::adjacency::Adjacent;
use crate::topology::mesh::{FaceTables, UnstructuredMesh};

/// Tolerance on the length of unit normals.
pub const UNIT_NORMAL_TOLERANCE: f64 = 1e-9;

/// Behavior for non-manifold detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum NonManifoldHandling {
    /// Skip non-manifold detection; the first matching neighbour wins.
    Ignore,
    /// Log a warning on non-manifold edges; the first matching neighbour wins.
    Warn,
    /// Return an error on non-manifold edges.
    #[default]
    Error,
}

fn violation(message: String) -> MeshError {
    MeshError::InvariantViolation(message)
}

impl DebugInvariants for UnstructuredMesh {
    fn validate_invariants(&self) -> Result<(), MeshError> {
        let ncells = self.ncells();
        let nnodes = self.nnodes();

        self.cells_to_nodes().check_shape()?;
        self.nodes_to_cells().check_shape()?;
        self.cells_to_cells().check_shape()?;
        self.nodes_to_nodes().check_shape()?;

        if self.nodes_to_cells().len() != nnodes || self.nodes_to_nodes().len() != nnodes {
            return Err(violation(format!(
                "node tables must have {nnodes} rows"
            )));
        }
        if self.cells_to_cells().len() != ncells {
            return Err(violation(format!(
                "cells_to_cells has {} rows for {ncells} cells",
                self.cells_to_cells().len()
            )));
        }
        if self.nodes_to_cells().total() != self.cells_to_nodes().total() {
            return Err(violation(
                "nodes_to_cells and cells_to_nodes hold different incidence counts".into(),
            ));
        }

        for (cell, nodes) in self.cells_to_nodes().rows().enumerate() {
            if let Some(&n) = nodes.iter().find(|&&n| n >= nnodes) {
                return Err(violation(format!("cell {cell} references missing node {n}")));
            }
            check_winding(self.dimension(), cell, &self.cell_coords(cell))?;
        }

        for (node, cells) in self.nodes_to_cells().rows().enumerate() {
            for &cell in cells {
                if cell >= ncells || !self.cells_to_nodes().row(cell).contains(&node) {
                    return Err(MeshError::NodeNotInCell { node, cell });
                }
            }
        }

        for (cell, slots) in self.cells_to_cells().rows().enumerate() {
            for (slot, adj) in slots.iter().enumerate() {
                let Adjacent::Cell(other) = *adj else {
                    continue;
                };
                if other >= ncells || other == cell {
                    return Err(violation(format!(
                        "cell {cell} slot {slot} names invalid neighbour {other}"
                    )));
                }
                if !self.cells_to_cells().row(other).contains(&Adjacent::Cell(cell)) {
                    return Err(violation(format!(
                        "cell {cell} lists {other} as neighbour but not vice versa"
                    )));
                }
            }
        }

        let boundary = self.boundary();
        let flagged = boundary.index_table().iter().filter(|b| b.is_some()).count();
        if boundary.index_table().len() != nnodes || flagged != boundary.len() {
            return Err(violation(
                "boundary index does not cover the boundary nodes densely".into(),
            ));
        }
        for (node, _, normal) in boundary.iter() {
            if (norm(normal) - 1.0).abs() > UNIT_NORMAL_TOLERANCE {
                return Err(violation(format!(
                    "boundary node {node} has non-unit normal {normal:?}"
                )));
            }
        }

        match self.faces() {
            Some(faces) => validate_faces(self, faces)?,
            None => {
                for (cell, slots) in self.cells_to_cells().rows().enumerate() {
                    if slots.len() != self.cells_to_nodes().row_len(cell) {
                        return Err(violation(format!(
                            "cell {cell} has {} edge slots for {} nodes",
                            slots.len(),
                            self.cells_to_nodes().row_len(cell)
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn validate_faces(mesh: &UnstructuredMesh, faces: &FaceTables) -> Result<(), MeshError> {
    let nfaces = faces.nfaces();
    faces.faces_to_nodes().check_shape()?;
    faces.cells_to_faces().check_shape()?;
    faces.nodes_to_faces().check_shape()?;
    if faces.faces_to_cells0().len() != nfaces || faces.faces_to_cells1().len() != nfaces {
        return Err(violation(format!(
            "faces_to_cells tables must have {nfaces} entries"
        )));
    }

    for (cell, cell_faces) in faces.cells_to_faces().rows().enumerate() {
        let slots = mesh.cells_to_cells().row(cell);
        if cell_faces.len() != slots.len() {
            return Err(violation(format!(
                "cell {cell} has {} faces but {} neighbour slots",
                cell_faces.len(),
                slots.len()
            )));
        }
        for (slot, (&face, adj)) in cell_faces.iter().zip(slots).enumerate() {
            if face >= nfaces {
                return Err(violation(format!("cell {cell} references missing face {face}")));
            }
            let other = match faces.cells_of(face) {
                (Some(c), other) if c == cell => other,
                (other, Some(c)) if c == cell => other,
                _ => {
                    return Err(violation(format!(
                        "face {face} does not list cell {cell} as adjacent"
                    )));
                }
            };
            if other != adj.cell() {
                return Err(violation(format!(
                    "cell {cell} slot {slot} disagrees with face {face} about its neighbour"
                )));
            }
        }
    }

    if faces.boundary_faces().len() != faces.boundary_face_normals().len() {
        return Err(violation("boundary faces and normals are misaligned".into()));
    }
    for (&face, &normal) in faces
        .boundary_faces()
        .iter()
        .zip(faces.boundary_face_normals())
    {
        let (c0, c1) = faces.cells_of(face);
        if c0.is_some() == c1.is_some() {
            return Err(violation(format!("face {face} is not a boundary face")));
        }
        if (norm(normal) - 1.0).abs() > UNIT_NORMAL_TOLERANCE {
            return Err(violation(format!(
                "boundary face {face} has non-unit normal {normal:?}"
            )));
        }
    }
    Ok(())
}
