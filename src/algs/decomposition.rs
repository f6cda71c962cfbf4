//! Cartesian rank decomposition of a global 2D structured grid.
//!
//! Splits `global_nx × global_ny` cells over `nranks` ranks laid out as a
//! `ranks_x × ranks_y` process grid, numbered row-major in `x`. The process
//! grid minimises subdomain perimeter over area; with `load_balance` set, a
//! split that divides both extents evenly is preferred over a better ratio.
//! Remainder cells go to the lowest ranks along each axis.
//!
//! Only the geometry of the split lives here. Exchanging halo layers between
//! the resulting subdomains is up to the caller.

use crate::algs::structured::StructuredGrid;
use crate::mesh_error::MeshError;

/// Compass direction of a neighbouring subdomain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

/// One rank's share of the global grid.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Subdomain {
    pub rank: usize,
    pub ranks_x: usize,
    pub ranks_y: usize,
    pub local_nx: usize,
    pub local_ny: usize,
    pub x_off: usize,
    pub y_off: usize,
    neighbours: [Option<usize>; 4],
}

impl Subdomain {
    /// Position of this rank in the process grid.
    pub fn rank_coords(&self) -> (usize, usize) {
        (self.rank % self.ranks_x, self.rank / self.ranks_x)
    }

    /// Neighbouring rank in `dir`, `None` at the global domain edge.
    #[inline]
    pub fn neighbour(&self, dir: Direction) -> Option<usize> {
        self.neighbours[dir.slot()]
    }

    /// Existing neighbours in North, East, South, West order.
    pub fn neighbours(&self) -> impl Iterator<Item = (Direction, usize)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(|dir| self.neighbour(dir).map(|rank| (dir, rank)))
    }

    /// Slice the global edge coordinates down to this subdomain.
    pub fn local_grid(
        &self,
        global_edge_x: &[f64],
        global_edge_y: &[f64],
    ) -> Result<StructuredGrid, MeshError> {
        let x = global_edge_x
            .get(self.x_off..=self.x_off + self.local_nx)
            .ok_or_else(|| {
                MeshError::InvalidDecomposition(format!(
                    "{} x edges cannot hold cells {}..{}",
                    global_edge_x.len(),
                    self.x_off,
                    self.x_off + self.local_nx
                ))
            })?;
        let y = global_edge_y
            .get(self.y_off..=self.y_off + self.local_ny)
            .ok_or_else(|| {
                MeshError::InvalidDecomposition(format!(
                    "{} y edges cannot hold cells {}..{}",
                    global_edge_y.len(),
                    self.y_off,
                    self.y_off + self.local_ny
                ))
            })?;
        StructuredGrid::new_2d(x.to_vec(), y.to_vec())
    }
}

/// Choose the `(ranks_x, ranks_y)` process grid for `nranks` ranks.
fn process_grid(nranks: usize, global_nx: usize, global_ny: usize, load_balance: bool) -> (usize, usize) {
    let (mut ranks_x, mut ranks_y) = (nranks, 1);
    let mut found_even = false;
    let mut best_ratio: Option<f64> = None;

    let mut ff = 1;
    while ff * ff <= nranks {
        if nranks % ff != 0 {
            ff += 1;
            continue;
        }
        let other = nranks / ff;
        let even_x = global_nx % ff == 0 && global_ny % other == 0;
        let even_y = global_nx % other == 0 && global_ny % ff == 0;
        let (new_x, new_y) = if even_x { (ff, other) } else { (other, ff) };
        let is_even = even_x || even_y;
        found_even |= load_balance && is_even;

        let ratio = 2.0 * (new_x + new_y) as f64 / (new_x * new_y) as f64;
        if (!found_even || is_even) && best_ratio.is_none_or(|best| ratio < best) {
            best_ratio = Some(ratio);
            // without an even split, the longer side of the process grid is y
            (ranks_x, ranks_y) = if !found_even && new_x > new_y {
                (new_y, new_x)
            } else {
                (new_x, new_y)
            };
        }
        ff += 1;
    }
    (ranks_x, ranks_y)
}

/// Split `global_nx × global_ny` cells over `nranks` ranks and return the
/// subdomain owned by `rank`.
pub fn decompose_2d_cartesian(
    rank: usize,
    nranks: usize,
    global_nx: usize,
    global_ny: usize,
    load_balance: bool,
) -> Result<Subdomain, MeshError> {
    if nranks == 0 || rank >= nranks {
        return Err(MeshError::InvalidDecomposition(format!(
            "rank {rank} is outside 0..{nranks}"
        )));
    }
    let (ranks_x, ranks_y) = process_grid(nranks, global_nx, global_ny, load_balance);
    if ranks_x > global_nx || ranks_y > global_ny {
        return Err(MeshError::InvalidDecomposition(format!(
            "{ranks_x}x{ranks_y} ranks cannot split a {global_nx}x{global_ny} grid"
        )));
    }

    let (x_rank, y_rank) = (rank % ranks_x, rank / ranks_x);
    let (local_nx, x_off) = axis_share(global_nx, ranks_x, x_rank);
    let (local_ny, y_off) = axis_share(global_ny, ranks_y, y_rank);

    let mut neighbours = [None; 4];
    neighbours[Direction::North.slot()] = (y_rank + 1 < ranks_y).then(|| rank + ranks_x);
    neighbours[Direction::East.slot()] = (x_rank + 1 < ranks_x).then(|| rank + 1);
    neighbours[Direction::South.slot()] = (y_rank > 0).then(|| rank - ranks_x);
    neighbours[Direction::West.slot()] = (x_rank > 0).then(|| rank - 1);

    log::debug!(
        "rank {rank}: {local_nx}x{local_ny} cells at ({x_off}, {y_off}) in a {ranks_x}x{ranks_y} process grid"
    );
    Ok(Subdomain {
        rank,
        ranks_x,
        ranks_y,
        local_nx,
        local_ny,
        x_off,
        y_off,
        neighbours,
    })
}

/// Cell count and offset of slot `index` when `global` cells are split over
/// `parts`; the first `global % parts` slots get one extra cell.
fn axis_share(global: usize, parts: usize, index: usize) -> (usize, usize) {
    let floor = global / parts;
    let mut off = 0;
    let mut local = floor;
    for slot in 0..=index {
        let padded = global != off + (parts - slot) * floor;
        local = if padded { floor + 1 } else { floor };
        if slot < index {
            off += local;
        }
    }
    (local, off)
}
