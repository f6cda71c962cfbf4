//! Boundary classification and outward normals of mesh nodes.
//!
//! Boundary nodes get a dense index (`0..nboundary`) in discovery order; all
//! per-boundary arrays (class, normal) are addressed through that index.
//! Interior nodes have no boundary index and no normal.

/// Classification of a mesh node relative to the domain boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NodeClass {
    /// Not on the domain boundary.
    Interior,
    /// On exactly one boundary plane (3D) or a straight boundary run (2D).
    Boundary,
    /// On two boundary planes of a structured 3D grid.
    Edge,
    /// On three boundary planes (3D) or where the boundary turns (2D).
    Corner,
}

/// Per-node boundary index plus per-boundary-node class and normal.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct BoundaryNodes {
    index: Vec<Option<usize>>,
    nodes: Vec<usize>,
    classes: Vec<NodeClass>,
    normals: Vec<[f64; 3]>,
}

impl BoundaryNodes {
    /// Assemble from the per-node boundary index and the dense per-boundary
    /// arrays. `classes` and `normals` are indexed by boundary index.
    pub(crate) fn new(
        index: Vec<Option<usize>>,
        classes: Vec<NodeClass>,
        normals: Vec<[f64; 3]>,
    ) -> Self {
        let mut nodes = vec![0; classes.len()];
        for (node, b) in index.iter().enumerate() {
            if let Some(b) = *b {
                nodes[b] = node;
            }
        }
        Self {
            index,
            nodes,
            classes,
            normals,
        }
    }

    /// Number of boundary nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Dense boundary index of `node`, `None` for interior nodes.
    #[inline]
    pub fn boundary_index(&self, node: usize) -> Option<usize> {
        self.index.get(node).copied().flatten()
    }

    /// Per-node boundary index table.
    #[inline]
    pub fn index_table(&self) -> &[Option<usize>] {
        &self.index
    }

    /// Mesh node owning boundary index `b`.
    #[inline]
    pub fn node(&self, b: usize) -> usize {
        self.nodes[b]
    }

    /// Classification of `node`.
    pub fn class_of(&self, node: usize) -> NodeClass {
        self.boundary_index(node)
            .map_or(NodeClass::Interior, |b| self.classes[b])
    }

    /// Outward normal of `node`, `None` for interior nodes.
    pub fn normal_of(&self, node: usize) -> Option<[f64; 3]> {
        self.boundary_index(node).map(|b| self.normals[b])
    }

    /// Classes indexed by boundary index.
    #[inline]
    pub fn classes(&self) -> &[NodeClass] {
        &self.classes
    }

    /// Normals indexed by boundary index.
    #[inline]
    pub fn normals(&self) -> &[[f64; 3]] {
        &self.normals
    }

    /// `(node, class, normal)` for every boundary node in boundary-index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, NodeClass, [f64; 3])> + '_ {
        self.nodes
            .iter()
            .zip(&self.classes)
            .zip(&self.normals)
            .map(|((&n, &c), &v)| (n, c, v))
    }
}
