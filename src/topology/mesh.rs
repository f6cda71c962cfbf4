//! The unstructured mesh aggregate.
//!
//! An [`UnstructuredMesh`] owns every adjacency table produced by either the
//! discovery pipeline ([`crate::io::NodeEleReader`]) or the structured
//! converters ([`crate::algs::structured`]). It is built once and is
//! read-only afterwards; a changed mesh requires a full rebuild.

use super::adjacency::Adjacent;
use super::boundary::BoundaryNodes;
use super::csr::CsrTable;

/// Face tables of a 3D mesh.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FaceTables {
    pub(crate) faces_to_nodes: CsrTable<usize>,
    pub(crate) faces_to_cells0: Vec<Option<usize>>,
    pub(crate) faces_to_cells1: Vec<Option<usize>>,
    pub(crate) cells_to_faces: CsrTable<usize>,
    pub(crate) nodes_to_faces: CsrTable<usize>,
    pub(crate) boundary_faces: Vec<usize>,
    pub(crate) boundary_face_normals: Vec<[f64; 3]>,
}

impl FaceTables {
    #[inline]
    pub fn nfaces(&self) -> usize {
        self.faces_to_nodes.len()
    }

    /// Face → nodes, counter-clockwise around each face.
    #[inline]
    pub fn faces_to_nodes(&self) -> &CsrTable<usize> {
        &self.faces_to_nodes
    }

    /// First adjacent cell of each face (`None` = outside).
    #[inline]
    pub fn faces_to_cells0(&self) -> &[Option<usize>] {
        &self.faces_to_cells0
    }

    /// Second adjacent cell of each face (`None` = outside).
    #[inline]
    pub fn faces_to_cells1(&self) -> &[Option<usize>] {
        &self.faces_to_cells1
    }

    /// Both adjacent cells of `face`.
    #[inline]
    pub fn cells_of(&self, face: usize) -> (Option<usize>, Option<usize>) {
        (self.faces_to_cells0[face], self.faces_to_cells1[face])
    }

    #[inline]
    pub fn cells_to_faces(&self) -> &CsrTable<usize> {
        &self.cells_to_faces
    }

    #[inline]
    pub fn nodes_to_faces(&self) -> &CsrTable<usize> {
        &self.nodes_to_faces
    }

    /// Faces with exactly one adjacent cell, in face-index order.
    #[inline]
    pub fn boundary_faces(&self) -> &[usize] {
        &self.boundary_faces
    }

    /// Outward unit normals aligned with [`Self::boundary_faces`].
    #[inline]
    pub fn boundary_face_normals(&self) -> &[[f64; 3]] {
        &self.boundary_face_normals
    }
}

/// Everything a builder hands over to [`UnstructuredMesh`].
pub(crate) struct MeshParts {
    pub dimension: usize,
    pub nnodes_by_cell: usize,
    pub coords: Vec<[f64; 3]>,
    pub cells_to_nodes: CsrTable<usize>,
    pub nodes_to_cells: CsrTable<usize>,
    pub cells_to_cells: CsrTable<Adjacent>,
    pub nodes_to_nodes: CsrTable<usize>,
    pub faces: Option<FaceTables>,
    pub boundary: BoundaryNodes,
    pub cell_variables: Vec<Vec<f64>>,
}

/// Complete, immutable connectivity of a mesh.
///
/// Serialize-only: meshes come from the node/element reader or the structured
/// converters, never from deserialized tables.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct UnstructuredMesh {
    dimension: usize,
    nnodes_by_cell: usize,
    coords: Vec<[f64; 3]>,
    cells_to_nodes: CsrTable<usize>,
    nodes_to_cells: CsrTable<usize>,
    cells_to_cells: CsrTable<Adjacent>,
    nodes_to_nodes: CsrTable<usize>,
    faces: Option<FaceTables>,
    boundary: BoundaryNodes,
    cell_variables: Vec<Vec<f64>>,
}

static_assertions::assert_impl_all!(UnstructuredMesh: Send, Sync);

impl UnstructuredMesh {
    pub(crate) fn from_parts(parts: MeshParts) -> Self {
        let MeshParts {
            dimension,
            nnodes_by_cell,
            coords,
            cells_to_nodes,
            nodes_to_cells,
            cells_to_cells,
            nodes_to_nodes,
            faces,
            boundary,
            cell_variables,
        } = parts;
        Self {
            dimension,
            nnodes_by_cell,
            coords,
            cells_to_nodes,
            nodes_to_cells,
            cells_to_cells,
            nodes_to_nodes,
            faces,
            boundary,
            cell_variables,
        }
    }

    /// Spatial dimension (2 or 3).
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn ncells(&self) -> usize {
        self.cells_to_nodes.len()
    }

    #[inline]
    pub fn nnodes(&self) -> usize {
        self.coords.len()
    }

    /// Nodes per cell (all cells of a mesh share one cell shape).
    #[inline]
    pub fn nnodes_by_cell(&self) -> usize {
        self.nnodes_by_cell
    }

    /// Number of faces; zero for 2D meshes, which carry no face tables.
    #[inline]
    pub fn nfaces(&self) -> usize {
        self.faces.as_ref().map_or(0, FaceTables::nfaces)
    }

    #[inline]
    pub fn nboundary_nodes(&self) -> usize {
        self.boundary.len()
    }

    /// Node positions; `z` is zero for 2D meshes.
    #[inline]
    pub fn coords(&self) -> &[[f64; 3]] {
        &self.coords
    }

    /// Cell → nodes in counter-clockwise / right-handed order.
    #[inline]
    pub fn cells_to_nodes(&self) -> &CsrTable<usize> {
        &self.cells_to_nodes
    }

    #[inline]
    pub fn nodes_to_cells(&self) -> &CsrTable<usize> {
        &self.nodes_to_cells
    }

    #[inline]
    pub fn cells_to_cells(&self) -> &CsrTable<Adjacent> {
        &self.cells_to_cells
    }

    #[inline]
    pub fn nodes_to_nodes(&self) -> &CsrTable<usize> {
        &self.nodes_to_nodes
    }

    #[inline]
    pub fn faces(&self) -> Option<&FaceTables> {
        self.faces.as_ref()
    }

    #[inline]
    pub fn boundary(&self) -> &BoundaryNodes {
        &self.boundary
    }

    /// Per-cell scalar fields read alongside the elements, indexed
    /// `[variable][cell]`. Empty for structured meshes.
    #[inline]
    pub fn cell_variables(&self) -> &[Vec<f64>] {
        &self.cell_variables
    }

    /// Node positions of one cell, in its winding order.
    pub fn cell_coords(&self, cell: usize) -> Vec<[f64; 3]> {
        self.cells_to_nodes
            .row(cell)
            .iter()
            .map(|&n| self.coords[n])
            .collect()
    }
}
