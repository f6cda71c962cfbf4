#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-connectivity
//!
//! mesh-connectivity builds the adjacency tables a finite-volume or ALE solver
//! needs from raw mesh geometry. It answers which nodes touch which cells, which
//! cells are neighbours, which faces bound which cells, and which nodes lie
//! on the domain boundary together with their outward normals.
//!
//! ## Features
//! - Compressed-sparse-row tables ([`topology::CsrTable`]) for every relation
//! - Discovery of node→cell, cell→cell and node→node adjacency from a
//!   `.node` / `.ele` text pair ([`io::NodeEleReader`])
//! - Closed-form conversion of 2D and 3D structured grids, faces included
//!   ([`algs::StructuredGrid`])
//! - Boundary classification with unit outward normals for nodes and faces
//! - Cartesian rank decomposition of structured grids
//!   ([`algs::decompose_2d_cartesian`])
//!
//! ## Determinism
//!
//! Tables are filled in cell index order and each cell's winding order, so equal
//! inputs always produce identical tables. Enabling the `rayon` feature
//! parallelizes structured conversion without changing its output.
//!
//! ## Invariant checking
//!
//! Every built mesh is validated through [`DebugInvariants`] in debug builds,
//! or in release builds with the `check-invariants` / `strict-invariants`
//! features.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! mesh-connectivity = "0.1"
//! # Optional features:
//! # features = ["rayon", "check-invariants"]
//! ```

// Re-export our major subsystems:
pub mod algs;
pub mod debug_invariants;
pub mod geometry;
pub mod io;
pub mod mesh_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use mesh_error::MeshError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::decomposition::{Direction, Subdomain, decompose_2d_cartesian};
    pub use crate::algs::discovery::BuildOptions;
    pub use crate::algs::structured::{FaceIndexer, StructuredGrid};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::io::{MeshReader, NodeEleReader};
    pub use crate::mesh_error::MeshError;
    pub use crate::topology::{
        Adjacent, BoundaryNodes, CsrTable, FaceTables, NodeClass, NonManifoldHandling,
        UnstructuredMesh,
    };
}
