//! Equal inputs give identical tables, with or without the `rayon` feature.

use mesh_connectivity::prelude::*;

/// `nx × ny` quad grid as node/element text, cells listed in reverse order.
fn reversed_grid_text(nx: usize, ny: usize) -> (String, String) {
    let node = |i: usize, j: usize| j * (nx + 1) + i;
    let mut nodes = format!("{}\n", (nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            let flag = i == 0 || i == nx || j == 0 || j == ny;
            nodes.push_str(&format!("{} {i}.0 {j}.5 {}\n", node(i, j), u8::from(flag)));
        }
    }
    let mut elements = format!("{} 4 1\n", nx * ny);
    for c in (0..nx * ny).rev() {
        let (i, j) = (c % nx, c / nx);
        elements.push_str(&format!(
            "{c} {} {} {} {} {}.25\n",
            node(i, j),
            node(i + 1, j),
            node(i + 1, j + 1),
            node(i, j + 1),
            c
        ));
    }
    (nodes, elements)
}

#[test]
fn rereading_gives_identical_mesh() {
    let (nodes, elements) = reversed_grid_text(4, 3);
    let reader = NodeEleReader::new(BuildOptions {
        expected_variables: 1,
        ..BuildOptions::default()
    });
    let first = reader.read(nodes.as_bytes(), elements.as_bytes()).unwrap();
    let second = reader.read(nodes.as_bytes(), elements.as_bytes()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    // line order of cells does not leak into bucket order
    assert_eq!(first.nodes_to_cells().row(6), &[0, 1, 4, 5]);
}

#[test]
fn structured_conversion_is_repeatable() {
    let grid = StructuredGrid::new_3d(
        vec![0.0, 0.5, 2.0, 2.25],
        vec![-1.0, 0.0, 1.0],
        vec![0.0, 1.0, 1.5, 3.0, 4.0],
    )
    .unwrap();
    let first = grid.to_mesh().unwrap();
    let second = grid.to_mesh().unwrap();
    assert_eq!(first, second);
}

#[cfg(feature = "rayon")]
#[test]
fn parallel_conversion_matches_known_tables() {
    use mesh_connectivity::algs::convert_structured_3d;

    let grid = StructuredGrid::uniform_3d(2, 2, 2, [1.0, 1.0, 1.0]).unwrap();
    let mesh = convert_structured_3d(&grid).unwrap();
    let faces = mesh.faces().unwrap();

    assert_eq!(mesh.cells_to_nodes().row(7), &[13, 14, 17, 16, 22, 23, 26, 25]);
    assert_eq!(faces.cells_to_faces().row(0), &[0, 4, 5, 6, 10, 16]);
    assert_eq!(faces.cells_to_faces().row(7), &[19, 27, 28, 29, 31, 35]);
    assert_eq!(
        mesh.cells_to_cells().row(0),
        &[
            Adjacent::Boundary,
            Adjacent::Boundary,
            Adjacent::Boundary,
            Adjacent::Cell(1),
            Adjacent::Cell(2),
            Adjacent::Cell(4)
        ]
    );
    assert_eq!(
        mesh.cells_to_cells().row(7),
        &[
            Adjacent::Cell(3),
            Adjacent::Cell(6),
            Adjacent::Cell(5),
            Adjacent::Boundary,
            Adjacent::Boundary,
            Adjacent::Boundary
        ]
    );
    assert_eq!(mesh.nodes_to_cells().row(13), &[0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(mesh.nodes_to_nodes().row(13), &[14, 12, 16, 10, 22, 4]);

    // buckets in increasing cell order, as a sequential inversion gives them
    let mut by_node = vec![Vec::new(); mesh.nnodes()];
    for (cell, nodes) in mesh.cells_to_nodes().rows().enumerate() {
        for &n in nodes {
            by_node[n].push(cell);
        }
    }
    for (node, cells) in by_node.iter().enumerate() {
        assert_eq!(mesh.nodes_to_cells().row(node), cells.as_slice());
    }

    // boundary indices handed out in node order
    let dense: Vec<usize> = mesh.boundary().index_table().iter().flatten().copied().collect();
    assert_eq!(dense, (0..mesh.nboundary_nodes()).collect::<Vec<_>>());
}
