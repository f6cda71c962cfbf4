//! Topology data structures: CSR tables, adjacency slots, boundary data and
//! the mesh aggregate.

pub mod adjacency;
pub mod boundary;
pub mod csr;
pub mod mesh;
pub mod validation;

pub use adjacency::Adjacent;
pub use boundary::{BoundaryNodes, NodeClass};
pub use csr::{CsrTable, counts_to_offsets, offsets_from_counts};
pub use mesh::{FaceTables, UnstructuredMesh};
pub use validation::NonManifoldHandling;
