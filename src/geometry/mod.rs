//! Geometric helpers for winding validation and normals.

pub mod orientation;

pub use orientation::{check_winding, signed_area, signed_hex_volume, signed_measure};
