//! Mesh construction algorithms.

pub mod boundary_normals;
pub mod decomposition;
pub mod discovery;
pub mod structured;

pub use boundary_normals::{boundary_face_normals, confirm_boundary_edges, resolve_node_normals_2d};
pub use decomposition::{Direction, Subdomain, decompose_2d_cartesian};
pub use discovery::{
    BuildOptions, discover_mesh, fill_cells_to_cells, fill_nodes_to_cells, fill_nodes_to_nodes,
};
pub use structured::{
    FaceAxis, FaceIndexer, StructuredGrid, convert_structured_2d, convert_structured_3d,
};
