//! Reader for the `.node` / `.ele` text pair.
//!
//! # Format
//! Node data:
//! ```text
//! <node_count>
//! <index> <x> <y> <is_boundary>
//! ...
//! ```
//! Element data:
//! ```text
//! <cell_count> <nodes_per_cell> <variable_count>
//! <index> <node_0> ... <node_{k-1}> <var_0> ... <var_{m-1}>
//! ...
//! ```
//! Indices are zero-based and each entity must appear exactly once; lines may
//! come in any order. Blank lines are ignored. The header count must equal the
//! number of entry lines that follow it.
//!
//! # Limitations
//! - Only 2D node positions are read; cells are polygons with a fixed node
//!   count per file.
//! - Cells must be listed counter-clockwise; clockwise or degenerate cells are
//!   rejected, never reordered.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::Path;

use crate::algs::discovery::{BuildOptions, discover_mesh};
use crate::geometry::orientation::check_winding;
use crate::io::{ElementTable, NodeTable};
use crate::mesh_error::MeshError;
use crate::topology::csr::CsrTable;
use crate::topology::mesh::UnstructuredMesh;

const NODE_FILE: &str = "node";
const ELEMENT_FILE: &str = "element";

/// Whitespace tokenizer over one input line that reports parse failures with
/// the file kind and line number.
struct Tokens<'a> {
    file: &'static str,
    line: usize,
    parts: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(file: &'static str, line: usize, text: &'a str) -> Self {
        Self {
            file,
            line,
            parts: text.split_whitespace(),
        }
    }

    fn next_raw(&mut self, what: &str) -> Result<&'a str, MeshError> {
        self.parts
            .next()
            .ok_or_else(|| MeshError::format(self.file, self.line, format!("missing {what}")))
    }

    fn next_usize(&mut self, what: &str) -> Result<usize, MeshError> {
        let raw = self.next_raw(what)?;
        raw.parse::<usize>().map_err(|_| {
            MeshError::format(self.file, self.line, format!("invalid {what}: `{raw}`"))
        })
    }

    fn next_i64(&mut self, what: &str) -> Result<i64, MeshError> {
        let raw = self.next_raw(what)?;
        raw.parse::<i64>().map_err(|_| {
            MeshError::format(self.file, self.line, format!("invalid {what}: `{raw}`"))
        })
    }

    fn next_f64(&mut self, what: &str) -> Result<f64, MeshError> {
        let raw = self.next_raw(what)?;
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(MeshError::format(
                self.file,
                self.line,
                format!("invalid {what}: `{raw}`"),
            )),
        }
    }

    fn finish(mut self) -> Result<(), MeshError> {
        match self.parts.next() {
            None => Ok(()),
            Some(extra) => Err(MeshError::format(
                self.file,
                self.line,
                format!("unexpected trailing token `{extra}`"),
            )),
        }
    }
}

/// Non-blank lines of `file` with their 1-based line numbers.
///
/// Undecodable text is a format error on its line; other read failures are
/// I/O errors.
fn content_lines<R: BufRead>(
    file: &'static str,
    reader: R,
) -> impl Iterator<Item = Result<(usize, String), MeshError>> {
    reader
        .lines()
        .enumerate()
        .filter_map(move |(i, line)| match line {
            Ok(text) if text.trim().is_empty() => None,
            Ok(text) => Some(Ok((i + 1, text))),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                Some(Err(MeshError::format(file, i + 1, "line is not valid UTF-8")))
            }
            Err(e) => Some(Err(MeshError::from(e))),
        })
}

/// Header line plus all entry lines. Header counts are checked against the
/// entries actually present before any buffer is sized from them.
fn header_and_entries<R: BufRead>(
    file: &'static str,
    reader: R,
    missing: &str,
) -> Result<((usize, String), Vec<(usize, String)>), MeshError> {
    let mut lines = content_lines(file, reader);
    let header = lines
        .next()
        .transpose()?
        .ok_or_else(|| MeshError::format(file, 1, missing))?;
    let entries = lines.collect::<Result<Vec<_>, _>>()?;
    Ok((header, entries))
}

fn check_entry_count(
    file: &'static str,
    header_line: usize,
    declared: usize,
    present: usize,
    what: &str,
) -> Result<(), MeshError> {
    if declared == present {
        Ok(())
    } else {
        Err(MeshError::format(
            file,
            header_line,
            format!("header declares {declared} {what}, but {present} entries follow"),
        ))
    }
}

/// Read node positions and boundary flags.
///
/// Boundary nodes receive dense indices in the order their lines appear.
pub fn read_nodes<R: BufRead>(reader: R) -> Result<NodeTable, MeshError> {
    let ((header_line, header), entries) =
        header_and_entries(NODE_FILE, reader, "missing node count")?;
    let mut tokens = Tokens::new(NODE_FILE, header_line, &header);
    let nnodes = tokens.next_usize("node count")?;
    tokens.finish()?;
    check_entry_count(NODE_FILE, header_line, nnodes, entries.len(), "nodes")?;

    let mut coords: Vec<Option<[f64; 3]>> = vec![None; nnodes];
    let mut boundary_index = vec![None; nnodes];
    let mut nboundary = 0;

    for (line, text) in entries {
        let mut tokens = Tokens::new(NODE_FILE, line, &text);
        let index = tokens.next_usize("node index")?;
        let x = tokens.next_f64("x coordinate")?;
        let y = tokens.next_f64("y coordinate")?;
        let is_boundary = tokens.next_i64("boundary flag")? != 0;
        tokens.finish()?;

        let slot = coords.get_mut(index).ok_or_else(|| {
            MeshError::format(
                NODE_FILE,
                line,
                format!("node index {index} out of range for {nnodes} nodes"),
            )
        })?;
        if slot.is_some() {
            return Err(MeshError::format(
                NODE_FILE,
                line,
                format!("node {index} listed twice"),
            ));
        }
        *slot = Some([x, y, 0.0]);
        if is_boundary {
            boundary_index[index] = Some(nboundary);
            nboundary += 1;
        }
    }

    // as many distinct in-range indices as nodes: every slot is filled
    let coords: Vec<[f64; 3]> = coords.into_iter().flatten().collect();

    log::debug!("read {nnodes} nodes ({nboundary} flagged boundary)");
    Ok(NodeTable {
        coords,
        boundary_index,
        nboundary,
    })
}

/// Read element connectivity and per-cell variables.
///
/// Validates counter-clockwise winding of every cell against `nodes`, counts
/// node→cell incidences, and collects boundary-edge candidates from cells
/// with exactly two boundary nodes.
pub fn read_elements<R: BufRead>(
    reader: R,
    nodes: &NodeTable,
    expected_variables: usize,
) -> Result<ElementTable, MeshError> {
    let ((header_line, header), entries) =
        header_and_entries(ELEMENT_FILE, reader, "missing element header")?;
    let mut tokens = Tokens::new(ELEMENT_FILE, header_line, &header);
    let ncells = tokens.next_usize("cell count")?;
    let nnodes_by_cell = tokens.next_usize("nodes per cell")?;
    let nvars = tokens.next_usize("variable count")?;
    tokens.finish()?;

    if nvars != expected_variables {
        return Err(MeshError::VariableCount {
            expected: expected_variables,
            declared: nvars,
        });
    }
    if nnodes_by_cell < 3 {
        return Err(MeshError::format(
            ELEMENT_FILE,
            header_line,
            format!("cells need at least 3 nodes, header declares {nnodes_by_cell}"),
        ));
    }
    check_entry_count(ELEMENT_FILE, header_line, ncells, entries.len(), "cells")?;

    let nnodes = nodes.coords.len();
    if nnodes_by_cell > nnodes {
        return Err(MeshError::format(
            ELEMENT_FILE,
            header_line,
            format!("cells of {nnodes_by_cell} distinct nodes cannot be built from {nnodes} nodes"),
        ));
    }
    let nslots = ncells.checked_mul(nnodes_by_cell).ok_or_else(|| {
        MeshError::format(
            ELEMENT_FILE,
            header_line,
            format!("{ncells} cells of {nnodes_by_cell} nodes overflow the slot count"),
        )
    })?;
    let mut cells_to_nodes = vec![0; nslots];
    let mut seen = vec![false; ncells];
    let mut variables = vec![vec![0.0; ncells]; nvars];
    let mut node_counts = vec![0; nnodes + 1];
    let mut boundary_edges = Vec::new();
    let mut cell_nodes = Vec::with_capacity(nnodes_by_cell);

    for (line, text) in entries {
        let mut tokens = Tokens::new(ELEMENT_FILE, line, &text);
        let index = tokens.next_usize("cell index")?;
        if index >= ncells {
            return Err(MeshError::format(
                ELEMENT_FILE,
                line,
                format!("cell index {index} out of range for {ncells} cells"),
            ));
        }
        if std::mem::replace(&mut seen[index], true) {
            return Err(MeshError::format(
                ELEMENT_FILE,
                line,
                format!("cell {index} listed twice"),
            ));
        }

        cell_nodes.clear();
        for _ in 0..nnodes_by_cell {
            let node = tokens.next_usize("cell node")?;
            if node >= nnodes {
                return Err(MeshError::format(
                    ELEMENT_FILE,
                    line,
                    format!("cell {index} references missing node {node}"),
                ));
            }
            if cell_nodes.contains(&node) {
                return Err(MeshError::format(
                    ELEMENT_FILE,
                    line,
                    format!("cell {index} repeats node {node}"),
                ));
            }
            cell_nodes.push(node);
        }
        for var in variables.iter_mut() {
            var[index] = tokens.next_f64("cell variable")?;
        }
        tokens.finish()?;

        let polygon: Vec<[f64; 3]> = cell_nodes.iter().map(|&n| nodes.coords[n]).collect();
        check_winding(2, index, &polygon)?;

        cells_to_nodes[index * nnodes_by_cell..(index + 1) * nnodes_by_cell]
            .copy_from_slice(&cell_nodes);
        for &n in &cell_nodes {
            node_counts[n + 1] += 1;
        }

        let on_boundary = |n: usize| nodes.boundary_index[n].is_some();
        if cell_nodes.iter().filter(|&&n| on_boundary(n)).count() == 2 {
            let k = cell_nodes.len();
            if let Some(nn) = (0..k).find(|&nn| {
                on_boundary(cell_nodes[nn]) && on_boundary(cell_nodes[(nn + 1) % k])
            }) {
                boundary_edges.push([cell_nodes[nn], cell_nodes[(nn + 1) % k]]);
            }
        }
    }

    log::debug!(
        "read {ncells} cells of {nnodes_by_cell} nodes, {} boundary edge candidates",
        boundary_edges.len()
    );
    Ok(ElementTable {
        nnodes_by_cell,
        cells_to_nodes: CsrTable::uniform(nnodes_by_cell, cells_to_nodes)?,
        node_counts,
        variables,
        boundary_edges,
    })
}

/// Reader for node/element text pairs producing a fully connected mesh.
#[derive(Debug, Default, Clone)]
pub struct NodeEleReader {
    options: BuildOptions,
}

impl NodeEleReader {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Parse both sources and run the discovery pipeline.
    pub fn read<N: Read, E: Read>(
        &self,
        nodes: N,
        elements: E,
    ) -> Result<UnstructuredMesh, MeshError> {
        let nodes = read_nodes(BufReader::new(nodes))?;
        let elements = read_elements(
            BufReader::new(elements),
            &nodes,
            self.options.expected_variables,
        )?;
        discover_mesh(nodes, elements, &self.options)
    }

    /// Open both files and run [`Self::read`]. Both files are opened before
    /// any parsing starts.
    pub fn read_files(
        &self,
        node_path: impl AsRef<Path>,
        element_path: impl AsRef<Path>,
    ) -> Result<UnstructuredMesh, MeshError> {
        let nodes = open(node_path.as_ref())?;
        let elements = open(element_path.as_ref())?;
        self.read(nodes, elements)
    }
}

fn open(path: &Path) -> Result<File, MeshError> {
    File::open(path).map_err(|e| MeshError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE_NODES: &str = "4\n0 0.0 0.0 1\n1 1.0 0.0 1\n2 1.0 1.0 1\n3 0.0 1.0 1\n";

    #[test]
    fn nodes_get_dense_boundary_indices_in_line_order() {
        let text = "3\n2 1.0 1.0 1\n0 0.0 0.0 0\n1 1.0 0.0 1\n";
        let nodes = read_nodes(text.as_bytes()).unwrap();
        assert_eq!(nodes.coords[2], [1.0, 1.0, 0.0]);
        assert_eq!(nodes.boundary_index, vec![None, Some(1), Some(0)]);
        assert_eq!(nodes.nboundary, 2);
    }

    #[test]
    fn duplicate_and_missing_nodes_are_format_errors() {
        let dup = read_nodes("2\n0 0 0 0\n0 1 0 0\n".as_bytes()).unwrap_err();
        assert!(matches!(dup, MeshError::Format { line: 3, .. }));
        let missing = read_nodes("2\n0 0 0 0\n".as_bytes()).unwrap_err();
        assert!(matches!(missing, MeshError::Format { .. }));
        let bad = read_nodes("1\n0 zero 0 0\n".as_bytes()).unwrap_err();
        assert!(bad.to_string().contains("x coordinate"));
    }

    #[test]
    fn elements_fill_counts_variables_and_edges() {
        let nodes = read_nodes(SQUARE_NODES.as_bytes()).unwrap();
        let ele = "2 3 1\n0 0 1 2 5.0\n1 0 2 3 6.0\n";
        let elements = read_elements(ele.as_bytes(), &nodes, 1).unwrap();
        assert_eq!(elements.cells_to_nodes.row(1), &[0, 2, 3]);
        assert_eq!(elements.node_counts, vec![0, 2, 1, 2, 1]);
        assert_eq!(elements.variables, vec![vec![5.0, 6.0]]);
        // every triangle here has three boundary nodes: no candidates
        assert!(elements.boundary_edges.is_empty());
    }

    #[test]
    fn two_boundary_nodes_give_an_ordered_edge() {
        let text = "4\n0 0.0 0.0 1\n1 1.0 0.0 1\n2 1.0 1.0 0\n3 0.0 1.0 0\n";
        let nodes = read_nodes(text.as_bytes()).unwrap();
        let elements = read_elements("1 4 0\n0 2 3 0 1\n".as_bytes(), &nodes, 0).unwrap();
        assert_eq!(elements.boundary_edges, vec![[0, 1]]);
    }

    #[test]
    fn clockwise_cell_is_a_winding_error() {
        let nodes = read_nodes(SQUARE_NODES.as_bytes()).unwrap();
        let err = read_elements("1 4 0\n0 0 3 2 1\n".as_bytes(), &nodes, 0).unwrap_err();
        assert!(matches!(err, MeshError::Winding { cell: 0, .. }));
    }

    #[test]
    fn variable_count_mismatch_is_reported() {
        let nodes = read_nodes(SQUARE_NODES.as_bytes()).unwrap();
        let err = read_elements("1 4 2\n0 0 1 2 3 1 2\n".as_bytes(), &nodes, 1).unwrap_err();
        assert_eq!(
            err,
            MeshError::VariableCount {
                expected: 1,
                declared: 2
            }
        );
    }

    #[test]
    fn repeated_node_in_cell_is_rejected() {
        let nodes = read_nodes(SQUARE_NODES.as_bytes()).unwrap();
        let err = read_elements("1 4 0\n0 0 1 2 2\n".as_bytes(), &nodes, 0).unwrap_err();
        assert!(err.to_string().contains("repeats node 2"));
    }

    #[test]
    fn oversized_node_header_is_a_format_error() {
        let err = read_nodes("18446744073709551615\n".as_bytes()).unwrap_err();
        assert!(matches!(err, MeshError::Format { file: "node", line: 1, .. }), "{err}");
        let err = read_nodes("5\n0 0.0 0.0 1\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("declares 5 nodes"), "{err}");
    }

    #[test]
    fn oversized_element_header_is_a_format_error() {
        let nodes = read_nodes(SQUARE_NODES.as_bytes()).unwrap();
        let err = read_elements("9223372036854775807 3 0\n0 0 1 2\n".as_bytes(), &nodes, 0)
            .unwrap_err();
        assert!(matches!(err, MeshError::Format { file: "element", line: 1, .. }), "{err}");
        let err = read_elements("1 9223372036854775807 0\n0 0 1 2\n".as_bytes(), &nodes, 0)
            .unwrap_err();
        assert!(matches!(err, MeshError::Format { file: "element", line: 1, .. }), "{err}");
    }

    #[test]
    fn undecodable_line_is_a_format_error() {
        let text: &[u8] = b"1\n0 0.0 \xff 1\n";
        let err = read_nodes(text).unwrap_err();
        assert!(matches!(err, MeshError::Format { file: "node", line: 2, .. }), "{err}");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let reader = NodeEleReader::default();
        let err = reader
            .read_files("/nonexistent/mesh.node", "/nonexistent/mesh.ele")
            .unwrap_err();
        assert!(matches!(err, MeshError::Io { ref path, .. } if path.ends_with("mesh.node")));
    }
}
