//! Closed-form conversion of logical structured grids into full mesh tables.
//!
//! # Numbering
//! - Node `(i, j, k)` is `k·(nx+1)(ny+1) + j·(nx+1) + i`.
//! - Cell `(i, j, k)` is `k·nx·ny + j·nx + i`.
//! - Hexahedron nodes: bottom `(i,j,k) (i+1,j,k) (i+1,j+1,k) (i,j+1,k)`, then
//!   the same four at `k+1`.
//! - Faces are numbered layer by layer in `k` (see [`FaceIndexer`]). Face
//!   node loops are counter-clockwise seen from the positive axis side, and
//!   `faces_to_cells0` is the cell on that side.
//! - `cells_to_faces` lists `-z, -x, -y, +x, +y, +z`; `cells_to_cells` uses the
//!   same slot order.
//!
//! 2D grids produce counter-clockwise quads whose `cells_to_cells` slots
//! follow the discovery convention (slot `k` crosses the edge from local node
//! `k - 1` to `k`), so both construction paths agree on the same grid.
//!
//! With the `rayon` feature, per-entity rows are built in parallel; output is
//! identical either way.

use itertools::Itertools;

use crate::algs::boundary_normals::boundary_face_normals;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::orientation::normalize;
use crate::mesh_error::MeshError;
use crate::topology::adjacency::Adjacent;
use crate::topology::boundary::{BoundaryNodes, NodeClass};
use crate::topology::csr::CsrTable;
use crate::topology::mesh::{FaceTables, MeshParts, UnstructuredMesh};

/// Logical grid with per-axis edge coordinates.
///
/// A 2D grid has no `z` edges and `nz() == 0`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct StructuredGrid {
    edge_x: Vec<f64>,
    edge_y: Vec<f64>,
    edge_z: Vec<f64>,
}

fn check_edges(axis: &str, edges: &[f64]) -> Result<(), MeshError> {
    if edges.len() < 2 {
        return Err(MeshError::InvalidGeometry(format!(
            "{axis} axis needs at least 2 edge coordinates, got {}",
            edges.len()
        )));
    }
    if let Some(pos) = edges.iter().position(|e| !e.is_finite()) {
        return Err(MeshError::InvalidGeometry(format!(
            "{axis} edge {pos} is not finite"
        )));
    }
    if let Some(pos) = edges.iter().tuple_windows().position(|(a, b)| b <= a) {
        return Err(MeshError::InvalidGeometry(format!(
            "{axis} edges must be strictly increasing (edge {} <= edge {pos})",
            pos + 1
        )));
    }
    Ok(())
}

fn uniform_edges(axis: &str, n: usize, length: f64) -> Result<Vec<f64>, MeshError> {
    if n == 0 || !(length.is_finite() && length > 0.0) {
        return Err(MeshError::InvalidGeometry(format!(
            "{axis} axis needs a positive cell count and length, got {n} cells over {length}"
        )));
    }
    Ok((0..=n).map(|i| length * i as f64 / n as f64).collect())
}

impl StructuredGrid {
    pub fn new_2d(edge_x: Vec<f64>, edge_y: Vec<f64>) -> Result<Self, MeshError> {
        check_edges("x", &edge_x)?;
        check_edges("y", &edge_y)?;
        Ok(Self {
            edge_x,
            edge_y,
            edge_z: Vec::new(),
        })
    }

    pub fn new_3d(edge_x: Vec<f64>, edge_y: Vec<f64>, edge_z: Vec<f64>) -> Result<Self, MeshError> {
        check_edges("x", &edge_x)?;
        check_edges("y", &edge_y)?;
        check_edges("z", &edge_z)?;
        Ok(Self {
            edge_x,
            edge_y,
            edge_z,
        })
    }

    /// Evenly spaced 2D grid over `[0, lx] × [0, ly]`.
    pub fn uniform_2d(nx: usize, ny: usize, [lx, ly]: [f64; 2]) -> Result<Self, MeshError> {
        Self::new_2d(uniform_edges("x", nx, lx)?, uniform_edges("y", ny, ly)?)
    }

    /// Evenly spaced 3D grid over `[0, lx] × [0, ly] × [0, lz]`.
    pub fn uniform_3d(
        nx: usize,
        ny: usize,
        nz: usize,
        [lx, ly, lz]: [f64; 3],
    ) -> Result<Self, MeshError> {
        Self::new_3d(
            uniform_edges("x", nx, lx)?,
            uniform_edges("y", ny, ly)?,
            uniform_edges("z", nz, lz)?,
        )
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        if self.edge_z.is_empty() { 2 } else { 3 }
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.edge_x.len() - 1
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.edge_y.len() - 1
    }

    #[inline]
    pub fn nz(&self) -> usize {
        self.edge_z.len().saturating_sub(1)
    }

    pub fn edge_x(&self) -> &[f64] {
        &self.edge_x
    }

    pub fn edge_y(&self) -> &[f64] {
        &self.edge_y
    }

    pub fn edge_z(&self) -> &[f64] {
        &self.edge_z
    }

    pub fn nnodes(&self) -> usize {
        let layers = if self.dimension() == 3 { self.nz() + 1 } else { 1 };
        (self.nx() + 1) * (self.ny() + 1) * layers
    }

    pub fn ncells(&self) -> usize {
        let layers = if self.dimension() == 3 { self.nz() } else { 1 };
        self.nx() * self.ny() * layers
    }

    #[inline]
    pub fn node_index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * (self.ny() + 1) + j) * (self.nx() + 1) + i
    }

    #[inline]
    pub fn cell_index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.ny() + j) * self.nx() + i
    }

    #[inline]
    pub fn node_ijk(&self, node: usize) -> (usize, usize, usize) {
        let w = self.nx() + 1;
        let h = self.ny() + 1;
        (node % w, (node / w) % h, node / (w * h))
    }

    #[inline]
    pub fn cell_ijk(&self, cell: usize) -> (usize, usize, usize) {
        let (w, h) = (self.nx(), self.ny());
        (cell % w, (cell / w) % h, cell / (w * h))
    }

    /// Build the mesh for this grid's dimension.
    pub fn to_mesh(&self) -> Result<UnstructuredMesh, MeshError> {
        match self.dimension() {
            2 => convert_structured_2d(self),
            _ => convert_structured_3d(self),
        }
    }
}

/// Orientation family of a structured face, named by the plane it lies in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceAxis {
    /// Normal along `z`.
    Xy,
    /// Normal along `x`.
    Yz,
    /// Normal along `y`.
    Xz,
}

/// Closed-form face numbering of an `nx × ny × nz` hexahedral grid.
///
/// Each `k` layer holds its `nx·ny` XY faces followed by `ny + 1` rows of
/// vertical faces; rows `j < ny` interleave YZ (even) and XZ (odd) faces,
/// and row `ny` holds the last `nx` XZ faces. Layer `nz` holds only XY faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceIndexer {
    nx: usize,
    ny: usize,
    nz: usize,
}

impl FaceIndexer {
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    #[inline]
    fn layer(&self) -> usize {
        3 * self.nx * self.ny + self.nx + self.ny
    }

    #[inline]
    fn row(&self) -> usize {
        2 * self.nx + 1
    }

    /// XY face with lower corner `(i, j, k)`, `k <= nz`.
    #[inline]
    pub fn xy(&self, i: usize, j: usize, k: usize) -> usize {
        k * self.layer() + j * self.nx + i
    }

    /// YZ face with lower corner `(i, j, k)`, `i <= nx`.
    #[inline]
    pub fn yz(&self, i: usize, j: usize, k: usize) -> usize {
        k * self.layer() + self.nx * self.ny + j * self.row() + 2 * i
    }

    /// XZ face with lower corner `(i, j, k)`, `j <= ny`.
    #[inline]
    pub fn xz(&self, i: usize, j: usize, k: usize) -> usize {
        let within = if j < self.ny { 2 * i + 1 } else { i };
        k * self.layer() + self.nx * self.ny + j * self.row() + within
    }

    /// `nx·ny·(nz+1) + (nx·(ny+1) + (nx+1)·ny)·nz`.
    pub fn nfaces(&self) -> usize {
        let (nx, ny, nz) = (self.nx, self.ny, self.nz);
        nx * ny * (nz + 1) + (nx * (ny + 1) + (nx + 1) * ny) * nz
    }

    /// Family and lower corner of face `face`.
    pub fn locate(&self, face: usize) -> (FaceAxis, usize, usize, usize) {
        let k = face / self.layer();
        let mut r = face % self.layer();
        if r < self.nx * self.ny {
            return (FaceAxis::Xy, r % self.nx, r / self.nx, k);
        }
        r -= self.nx * self.ny;
        let (j, s) = (r / self.row(), r % self.row());
        if j == self.ny {
            (FaceAxis::Xz, s, j, k)
        } else if s % 2 == 0 {
            (FaceAxis::Yz, s / 2, j, k)
        } else {
            (FaceAxis::Xz, s / 2, j, k)
        }
    }
}

/// Evaluate `f` for every entity index in `0..n`.
fn build_rows<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        (0..n).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        (0..n).map(f).collect()
    }
}

/// Assign dense boundary indices in node order.
fn collect_boundary(classified: Vec<(NodeClass, [f64; 3])>) -> BoundaryNodes {
    let mut index = Vec::with_capacity(classified.len());
    let mut classes = Vec::new();
    let mut normals = Vec::new();
    for (class, normal) in classified {
        if class == NodeClass::Interior {
            index.push(None);
        } else {
            index.push(Some(classes.len()));
            classes.push(class);
            normals.push(normal);
        }
    }
    BoundaryNodes::new(index, classes, normals)
}

/// Outward axis normals of the extremal lines/planes a node lies on.
fn extremal_normals(ijk: [usize; 3], extents: [usize; 3], dimension: usize) -> Vec<[f64; 3]> {
    let mut out = Vec::with_capacity(dimension);
    for axis in 0..dimension {
        let mut n = [0.0; 3];
        if ijk[axis] == 0 {
            n[axis] = -1.0;
        } else if ijk[axis] == extents[axis] {
            n[axis] = 1.0;
        } else {
            continue;
        }
        out.push(n);
    }
    out
}

fn summed_unit(normals: &[[f64; 3]]) -> [f64; 3] {
    let mut s = [0.0; 3];
    for n in normals {
        for axis in 0..3 {
            s[axis] += n[axis];
        }
    }
    normalize(s).unwrap_or(s)
}

/// 3D node classification by the number of extremal planes it touches.
///
/// Face nodes get their plane's outward normal. Edge nodes carry the unit
/// direction of the grid edge they lie on, i.e. the one axis along which
/// they are not extremal. Corner nodes get the normalized sum of their
/// three outward normals.
fn classify_3d(ijk: [usize; 3], extents: [usize; 3]) -> (NodeClass, [f64; 3]) {
    let planes = extremal_normals(ijk, extents, 3);
    match planes.len() {
        0 => (NodeClass::Interior, [0.0; 3]),
        1 => (NodeClass::Boundary, planes[0]),
        2 => {
            let mut tangent = [0.0; 3];
            if let Some(axis) = (0..3).find(|&a| ijk[a] != 0 && ijk[a] != extents[a]) {
                tangent[axis] = 1.0;
            }
            (NodeClass::Edge, tangent)
        }
        _ => (NodeClass::Corner, summed_unit(&planes)),
    }
}

/// 2D node classification: one extremal line gives its axis normal, two give
/// the normalized diagonal.
fn classify_2d(ijk: [usize; 3], extents: [usize; 3]) -> (NodeClass, [f64; 3]) {
    let lines = extremal_normals(ijk, extents, 2);
    match lines.len() {
        0 => (NodeClass::Interior, [0.0; 3]),
        1 => (NodeClass::Boundary, lines[0]),
        _ => (NodeClass::Corner, summed_unit(&lines)),
    }
}

/// Convert a 3D grid into hexahedral mesh tables, faces included.
pub fn convert_structured_3d(grid: &StructuredGrid) -> Result<UnstructuredMesh, MeshError> {
    if grid.dimension() != 3 {
        return Err(MeshError::InvalidGeometry(
            "3D conversion needs z edge coordinates".into(),
        ));
    }
    let (nx, ny, nz) = (grid.nx(), grid.ny(), grid.nz());
    let extents = [nx, ny, nz];
    let fi = FaceIndexer::new(nx, ny, nz);
    let node = |i, j, k| grid.node_index(i, j, k);
    let cell = |i, j, k| grid.cell_index(i, j, k);

    let coords = build_rows(grid.nnodes(), |n| {
        let (i, j, k) = grid.node_ijk(n);
        [grid.edge_x[i], grid.edge_y[j], grid.edge_z[k]]
    });

    let cells_to_nodes = CsrTable::from_rows(build_rows(grid.ncells(), |c| {
        let (i, j, k) = grid.cell_ijk(c);
        [
            node(i, j, k),
            node(i + 1, j, k),
            node(i + 1, j + 1, k),
            node(i, j + 1, k),
            node(i, j, k + 1),
            node(i + 1, j, k + 1),
            node(i + 1, j + 1, k + 1),
            node(i, j + 1, k + 1),
        ]
    }));

    let cells_to_cells = CsrTable::from_rows(build_rows(grid.ncells(), |c| {
        let (i, j, k) = grid.cell_ijk(c);
        [
            (k > 0).then(|| cell(i, j, k - 1)),
            (i > 0).then(|| cell(i - 1, j, k)),
            (j > 0).then(|| cell(i, j - 1, k)),
            (i + 1 < nx).then(|| cell(i + 1, j, k)),
            (j + 1 < ny).then(|| cell(i, j + 1, k)),
            (k + 1 < nz).then(|| cell(i, j, k + 1)),
        ]
        .map(Adjacent::from_option)
    }));

    let cells_to_faces = CsrTable::from_rows(build_rows(grid.ncells(), |c| {
        let (i, j, k) = grid.cell_ijk(c);
        [
            fi.xy(i, j, k),
            fi.yz(i, j, k),
            fi.xz(i, j, k),
            fi.yz(i + 1, j, k),
            fi.xz(i, j + 1, k),
            fi.xy(i, j, k + 1),
        ]
    }));

    let faces = build_rows(fi.nfaces(), |f| {
        let (axis, i, j, k) = fi.locate(f);
        match axis {
            FaceAxis::Xy => (
                [node(i, j, k), node(i + 1, j, k), node(i + 1, j + 1, k), node(i, j + 1, k)],
                (k < nz).then(|| cell(i, j, k)),
                (k > 0).then(|| cell(i, j, k - 1)),
            ),
            FaceAxis::Yz => (
                [node(i, j, k), node(i, j + 1, k), node(i, j + 1, k + 1), node(i, j, k + 1)],
                (i < nx).then(|| cell(i, j, k)),
                (i > 0).then(|| cell(i - 1, j, k)),
            ),
            FaceAxis::Xz => (
                [node(i, j, k), node(i, j, k + 1), node(i + 1, j, k + 1), node(i + 1, j, k)],
                (j < ny).then(|| cell(i, j, k)),
                (j > 0).then(|| cell(i, j - 1, k)),
            ),
        }
    });
    let (faces_to_nodes, (faces_to_cells0, faces_to_cells1)): (Vec<[usize; 4]>, (Vec<_>, Vec<_>)) =
        faces.into_iter().map(|(n, c0, c1)| (n, (c0, c1))).unzip();
    let faces_to_nodes = CsrTable::from_rows(faces_to_nodes);

    let nodes_to_faces = CsrTable::from_rows(build_rows(grid.nnodes(), |n| {
        let (i, j, k) = grid.node_ijk(n);
        let (lo_i, lo_j, lo_k) = (i > 0, j > 0, k > 0);
        let (hi_i, hi_j, hi_k) = (i < nx, j < ny, k < nz);
        [
            (hi_k && hi_i).then(|| fi.xz(i, j, k)),
            (hi_j && hi_i).then(|| fi.xy(i, j, k)),
            (hi_k && hi_j).then(|| fi.yz(i, j, k)),
            (hi_k && lo_i).then(|| fi.xz(i - 1, j, k)),
            (hi_j && lo_i).then(|| fi.xy(i - 1, j, k)),
            (lo_k && hi_i).then(|| fi.xz(i, j, k - 1)),
            (lo_k && hi_j).then(|| fi.yz(i, j, k - 1)),
            (lo_k && lo_i).then(|| fi.xz(i - 1, j, k - 1)),
            (lo_j && hi_i).then(|| fi.xy(i, j - 1, k)),
            (lo_j && lo_i).then(|| fi.xy(i - 1, j - 1, k)),
            (lo_k && lo_j).then(|| fi.yz(i, j - 1, k - 1)),
            (hi_k && lo_j).then(|| fi.yz(i, j - 1, k)),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
    }));

    let nodes_to_cells = CsrTable::from_rows(build_rows(grid.nnodes(), |n| {
        let (i, j, k) = grid.node_ijk(n);
        let mut cells = Vec::with_capacity(8);
        for ck in k.saturating_sub(1)..(k + 1).min(nz) {
            for cj in j.saturating_sub(1)..(j + 1).min(ny) {
                for ci in i.saturating_sub(1)..(i + 1).min(nx) {
                    cells.push(cell(ci, cj, ck));
                }
            }
        }
        cells
    }));

    let nodes_to_nodes = CsrTable::from_rows(build_rows(grid.nnodes(), |n| {
        let (i, j, k) = grid.node_ijk(n);
        [
            (i < nx).then(|| node(i + 1, j, k)),
            (i > 0).then(|| node(i - 1, j, k)),
            (j < ny).then(|| node(i, j + 1, k)),
            (j > 0).then(|| node(i, j - 1, k)),
            (k < nz).then(|| node(i, j, k + 1)),
            (k > 0).then(|| node(i, j, k - 1)),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
    }));

    let boundary = collect_boundary(build_rows(grid.nnodes(), |n| {
        let (i, j, k) = grid.node_ijk(n);
        classify_3d([i, j, k], extents)
    }));

    let (boundary_faces, boundary_face_normals) = boundary_face_normals(
        &coords,
        &faces_to_nodes,
        &faces_to_cells0,
        &faces_to_cells1,
        &cells_to_nodes,
    )?;

    log::debug!(
        "converted {nx}x{ny}x{nz} grid: {} nodes, {} cells, {} faces, {} boundary nodes",
        coords.len(),
        cells_to_nodes.len(),
        faces_to_nodes.len(),
        boundary.len()
    );

    let mesh = UnstructuredMesh::from_parts(MeshParts {
        dimension: 3,
        nnodes_by_cell: 8,
        coords,
        cells_to_nodes,
        nodes_to_cells,
        cells_to_cells,
        nodes_to_nodes,
        faces: Some(FaceTables {
            faces_to_nodes,
            faces_to_cells0,
            faces_to_cells1,
            cells_to_faces,
            nodes_to_faces,
            boundary_faces,
            boundary_face_normals,
        }),
        boundary,
        cell_variables: Vec::new(),
    });
    mesh.debug_assert_invariants();
    Ok(mesh)
}

/// Convert a 2D grid into counter-clockwise quad mesh tables.
pub fn convert_structured_2d(grid: &StructuredGrid) -> Result<UnstructuredMesh, MeshError> {
    if grid.dimension() != 2 {
        return Err(MeshError::InvalidGeometry(
            "2D conversion takes a grid without z edges".into(),
        ));
    }
    let (nx, ny) = (grid.nx(), grid.ny());
    let node = |i, j| grid.node_index(i, j, 0);
    let cell = |i, j| grid.cell_index(i, j, 0);

    let coords = build_rows(grid.nnodes(), |n| {
        let (i, j, _) = grid.node_ijk(n);
        [grid.edge_x[i], grid.edge_y[j], 0.0]
    });

    let cells_to_nodes = CsrTable::from_rows(build_rows(grid.ncells(), |c| {
        let (i, j, _) = grid.cell_ijk(c);
        [node(i, j), node(i + 1, j), node(i + 1, j + 1), node(i, j + 1)]
    }));

    let cells_to_cells = CsrTable::from_rows(build_rows(grid.ncells(), |c| {
        let (i, j, _) = grid.cell_ijk(c);
        [
            (i > 0).then(|| cell(i - 1, j)),
            (j > 0).then(|| cell(i, j - 1)),
            (i + 1 < nx).then(|| cell(i + 1, j)),
            (j + 1 < ny).then(|| cell(i, j + 1)),
        ]
        .map(Adjacent::from_option)
    }));

    // Incident cells in increasing index order, each paired with the node
    // preceding (i, j) in that cell's winding.
    let rings = build_rows(grid.nnodes(), |n| {
        let (i, j, _) = grid.node_ijk(n);
        let (lo_i, lo_j, hi_i, hi_j) = (i > 0, j > 0, i < nx, j < ny);
        [
            (lo_i && lo_j).then(|| (cell(i - 1, j - 1), node(i, j - 1))),
            (hi_i && lo_j).then(|| (cell(i, j - 1), node(i + 1, j))),
            (lo_i && hi_j).then(|| (cell(i - 1, j), node(i - 1, j))),
            (hi_i && hi_j).then(|| (cell(i, j), node(i, j + 1))),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
    });
    let nodes_to_cells = CsrTable::from_rows(
        rings
            .iter()
            .map(|ring| ring.iter().map(|&(c, _)| c).collect::<Vec<_>>()),
    );
    let nodes_to_nodes = CsrTable::from_rows(
        rings
            .iter()
            .map(|ring| ring.iter().map(|&(_, n)| n).collect::<Vec<_>>()),
    );

    let boundary = collect_boundary(build_rows(grid.nnodes(), |n| {
        let (i, j, _) = grid.node_ijk(n);
        classify_2d([i, j, 0], [nx, ny, 0])
    }));

    log::debug!(
        "converted {nx}x{ny} grid: {} nodes, {} cells, {} boundary nodes",
        coords.len(),
        cells_to_nodes.len(),
        boundary.len()
    );

    let mesh = UnstructuredMesh::from_parts(MeshParts {
        dimension: 2,
        nnodes_by_cell: 4,
        coords,
        cells_to_nodes,
        nodes_to_cells,
        cells_to_cells,
        nodes_to_nodes,
        faces: None,
        boundary,
        cell_variables: Vec::new(),
    });
    mesh.debug_assert_invariants();
    Ok(mesh)
}
