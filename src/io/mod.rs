//! Mesh ingestion.
//!
//! This module reads 2D unstructured meshes from the `.node` / `.ele` text
//! pair and hands the raw tables to the discovery pipeline in
//! [`crate::algs::discovery`].

pub mod node_ele;

use std::io::Read;

use crate::mesh_error::MeshError;
use crate::topology::csr::CsrTable;
use crate::topology::mesh::UnstructuredMesh;

pub use node_ele::{NodeEleReader, read_elements, read_nodes};

/// Node data as read from the node file.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeTable {
    /// Positions, `z = 0`.
    pub coords: Vec<[f64; 3]>,
    /// Dense boundary index of flagged nodes, in file line order.
    pub boundary_index: Vec<Option<usize>>,
    /// Number of flagged boundary nodes.
    pub nboundary: usize,
}

/// Element data as read from the element file.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementTable {
    pub nnodes_by_cell: usize,
    /// Cell → nodes, counter-clockwise.
    pub cells_to_nodes: CsrTable<usize>,
    /// Node incidence counts in offsets layout: entry `n + 1` is the number of
    /// cells containing node `n`, entry `0` is zero.
    pub node_counts: Vec<usize>,
    /// Per-cell variables, indexed `[variable][cell]`.
    pub variables: Vec<Vec<f64>>,
    /// Candidate boundary edges `[a, b]`, ordered as in their owning cell.
    pub boundary_edges: Vec<[usize; 2]>,
}

/// Readers that build a connected mesh from a pair of byte sources.
pub trait MeshReader {
    fn read_mesh<N: Read, E: Read>(
        &self,
        nodes: N,
        elements: E,
    ) -> Result<UnstructuredMesh, MeshError>;
}

impl MeshReader for NodeEleReader {
    fn read_mesh<N: Read, E: Read>(
        &self,
        nodes: N,
        elements: E,
    ) -> Result<UnstructuredMesh, MeshError> {
        self.read(nodes, elements)
    }
}
