//! Adjacency discovery for unstructured meshes.
//
// Stages run strictly in order, each searching only the previous stage's
// output:
//
// * node → cell : first-free-slot fill of pre-sized CSR buckets
// * cell → cell : shared-edge search through the node → cell buckets
// * node → node : clockwise predecessor of the node in each incident cell
//
// Bucket fill order follows cell index order and each cell's winding order,
// so equal inputs always give bit-identical tables.

use crate::algs::boundary_normals::{confirm_boundary_edges, resolve_node_normals_2d};
use crate::debug_invariants::DebugInvariants;
use crate::io::{ElementTable, NodeTable};
use crate::mesh_error::MeshError;
use crate::topology::adjacency::Adjacent;
use crate::topology::boundary::BoundaryNodes;
use crate::topology::csr::{CsrTable, counts_to_offsets};
use crate::topology::mesh::{MeshParts, UnstructuredMesh};
use crate::topology::validation::NonManifoldHandling;

/// Options for building a mesh from node/element data.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Number of per-cell scalars the caller expects the element data to
    /// declare.
    pub expected_variables: usize,
    /// Policy for edges shared by more than two cells.
    pub non_manifold: NonManifoldHandling,
}

/// Fill node → cell buckets sized by `offsets`.
///
/// `offsets` must already be prefix-summed from per-node incidence counts.
pub fn fill_nodes_to_cells(
    offsets: Vec<usize>,
    cells_to_nodes: &CsrTable<usize>,
) -> Result<CsrTable<usize>, MeshError> {
    let total = offsets.last().copied().unwrap_or(0);
    let nnodes = offsets.len().saturating_sub(1);
    let mut slots: Vec<Option<usize>> = vec![None; total];

    for (cell, nodes) in cells_to_nodes.rows().enumerate() {
        for &node in nodes {
            if node >= nnodes {
                return Err(MeshError::InvariantViolation(format!(
                    "cell {cell} references node {node}, but only {nnodes} nodes have buckets"
                )));
            }
            let bucket = &mut slots[offsets[node]..offsets[node + 1]];
            let free = bucket
                .iter_mut()
                .find(|s| s.is_none())
                .ok_or(MeshError::BucketOverflow {
                    table: "nodes_to_cells",
                    entity: node,
                })?;
            *free = Some(cell);
        }
    }
    CsrTable::try_from_slots(offsets, slots, "nodes_to_cells")
}

/// Cell → cell adjacency from shared edges.
///
/// Slot `k` of a cell crosses the edge from its local node `k - 1` to local
/// node `k`. The neighbour is the first other cell in node `k`'s bucket that
/// also contains node `k - 1`; with no such cell the slot is
/// [`Adjacent::Boundary`].
///
/// Returns the table and the number of non-manifold edges that were
/// tolerated under `policy`.
pub fn fill_cells_to_cells(
    cells_to_nodes: &CsrTable<usize>,
    nodes_to_cells: &CsrTable<usize>,
    policy: NonManifoldHandling,
) -> Result<(CsrTable<Adjacent>, usize), MeshError> {
    let mut slots: Vec<Option<Adjacent>> = vec![None; cells_to_nodes.total()];
    let mut tolerated = 0;

    for (cell, nodes) in cells_to_nodes.rows().enumerate() {
        let base = cells_to_nodes.offsets()[cell];
        let k = nodes.len();
        for slot in 0..k {
            let curr = nodes[slot];
            let prev = nodes[(slot + k - 1) % k];
            let mut candidates = nodes_to_cells
                .row(curr)
                .iter()
                .copied()
                .filter(|&other| other != cell && cells_to_nodes.row(other).contains(&prev));

            let first = candidates.next();
            let extra = candidates.count();
            if extra > 0 {
                let err = MeshError::NonManifoldEdge {
                    cell,
                    slot,
                    edge: (prev, curr),
                    matches: extra + 1,
                };
                match policy {
                    NonManifoldHandling::Error => return Err(err),
                    NonManifoldHandling::Warn => {
                        log::warn!("{err}; keeping first neighbour");
                        tolerated += 1;
                    }
                    NonManifoldHandling::Ignore => tolerated += 1,
                }
            }
            slots[base + slot] = Some(Adjacent::from_option(first));
        }
    }

    let table = CsrTable::try_from_slots(
        cells_to_nodes.offsets().to_vec(),
        slots,
        "cells_to_cells",
    )?;
    Ok((table, tolerated))
}

/// Node → node ring: for each cell in a node's bucket, the node that precedes
/// it in that cell's winding order. Ring length equals incident-cell count.
pub fn fill_nodes_to_nodes(
    cells_to_nodes: &CsrTable<usize>,
    nodes_to_cells: &CsrTable<usize>,
) -> Result<CsrTable<usize>, MeshError> {
    let mut slots: Vec<Option<usize>> = vec![None; nodes_to_cells.total()];

    for (node, cells) in nodes_to_cells.rows().enumerate() {
        let base = nodes_to_cells.offsets()[node];
        for (s, &cell) in cells.iter().enumerate() {
            let ring = cells_to_nodes.row(cell);
            let pos = ring
                .iter()
                .position(|&n| n == node)
                .ok_or(MeshError::NodeNotInCell { node, cell })?;
            slots[base + s] = Some(ring[(pos + ring.len() - 1) % ring.len()]);
        }
    }
    CsrTable::try_from_slots(nodes_to_cells.offsets().to_vec(), slots, "nodes_to_nodes")
}

/// Run discovery and boundary resolution on ingested node/element data.
pub fn discover_mesh(
    nodes: NodeTable,
    elements: ElementTable,
    options: &BuildOptions,
) -> Result<UnstructuredMesh, MeshError> {
    let NodeTable {
        coords,
        boundary_index,
        nboundary,
    } = nodes;
    let ElementTable {
        nnodes_by_cell,
        cells_to_nodes,
        node_counts,
        variables,
        boundary_edges,
    } = elements;

    let mut offsets = node_counts;
    counts_to_offsets(&mut offsets);

    let nodes_to_cells = fill_nodes_to_cells(offsets, &cells_to_nodes)?;
    let (cells_to_cells, tolerated) =
        fill_cells_to_cells(&cells_to_nodes, &nodes_to_cells, options.non_manifold)?;
    let nodes_to_nodes = fill_nodes_to_nodes(&cells_to_nodes, &nodes_to_cells)?;

    let edges = confirm_boundary_edges(
        &boundary_edges,
        &cells_to_nodes,
        &cells_to_cells,
        &boundary_index,
    );
    let (classes, normals) =
        resolve_node_normals_2d(&coords, &boundary_index, nboundary, &edges)?;

    log::debug!(
        "discovered {} cells, {} nodes, {} boundary nodes, {} boundary edges",
        cells_to_nodes.len(),
        coords.len(),
        nboundary,
        edges.len()
    );

    let mesh = UnstructuredMesh::from_parts(MeshParts {
        dimension: 2,
        nnodes_by_cell,
        coords,
        cells_to_nodes,
        nodes_to_cells,
        cells_to_cells,
        nodes_to_nodes,
        faces: None,
        boundary: BoundaryNodes::new(boundary_index, classes, normals),
        cell_variables: variables,
    });
    if tolerated == 0 {
        mesh.debug_assert_invariants();
    } else {
        log::warn!("{tolerated} non-manifold edges tolerated; cell adjacency may be asymmetric");
    }
    Ok(mesh)
}
