//! Entries of cell adjacency tables.

/// One slot of a cell→cell table.
///
/// Slots are positional: in 2D, slot `k` of a cell crosses the edge from its
/// local node `k - 1` to local node `k`; in 3D, slot `k` crosses the cell's
/// `k`-th face. `Boundary` is the domain-boundary sentinel and is distinct
/// from "not yet discovered", which never survives table construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Adjacent {
    /// The neighbouring cell across this edge/face.
    Cell(usize),
    /// No neighbour: the edge/face lies on the domain boundary.
    Boundary,
}

impl Adjacent {
    #[inline]
    pub fn from_option(cell: Option<usize>) -> Self {
        cell.map_or(Adjacent::Boundary, Adjacent::Cell)
    }

    #[inline]
    pub fn cell(self) -> Option<usize> {
        match self {
            Adjacent::Cell(c) => Some(c),
            Adjacent::Boundary => None,
        }
    }

    #[inline]
    pub fn is_boundary(self) -> bool {
        self == Adjacent::Boundary
    }
}
