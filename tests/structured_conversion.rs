use mesh_connectivity::geometry::signed_measure;
use mesh_connectivity::prelude::*;
use proptest::prelude::*;

fn cube(n: usize) -> UnstructuredMesh {
    StructuredGrid::uniform_3d(n, n, n, [1.0, 1.0, 1.0])
        .unwrap()
        .to_mesh()
        .unwrap()
}

/// Faces containing each node, found by scanning every face.
fn faces_by_node(mesh: &UnstructuredMesh) -> Vec<Vec<usize>> {
    let faces = mesh.faces().unwrap();
    let mut out = vec![Vec::new(); mesh.nnodes()];
    for (face, nodes) in faces.faces_to_nodes().rows().enumerate() {
        for &n in nodes {
            out[n].push(face);
        }
    }
    out
}

#[test]
fn two_cubed_worked_example() {
    let mesh = cube(2);
    assert_eq!(mesh.nnodes(), 27);
    assert_eq!(mesh.ncells(), 8);
    assert_eq!(mesh.nfaces(), 36);
    assert_eq!(mesh.nnodes_by_cell(), 8);
    assert!(mesh.validate_invariants().is_ok());

    let faces = mesh.faces().unwrap();
    assert_eq!(faces.boundary_faces().len(), 24);
    for n in faces.boundary_face_normals() {
        let axis_aligned = n.iter().filter(|c| c.abs() > 0.5).count() == 1;
        assert!(axis_aligned, "{n:?}");
    }
}

#[test]
fn opposite_slots_are_mutual() {
    // slots: -z, -x, -y, +x, +y, +z
    const OPPOSITE: [usize; 6] = [5, 3, 4, 1, 2, 0];
    let mesh = cube(3);
    for (cell, slots) in mesh.cells_to_cells().rows().enumerate() {
        for (s, adj) in slots.iter().enumerate() {
            if let Adjacent::Cell(other) = *adj {
                assert_eq!(mesh.cells_to_cells().row(other)[OPPOSITE[s]], Adjacent::Cell(cell));
            }
        }
    }
}

#[test]
fn graded_edges_keep_right_handed_cells() {
    let grid = StructuredGrid::new_3d(
        vec![0.0, 0.1, 0.5, 2.0],
        vec![-1.0, 0.0, 3.0],
        vec![0.0, 0.25],
    )
    .unwrap();
    let mesh = grid.to_mesh().unwrap();
    for cell in 0..mesh.ncells() {
        assert!(signed_measure(3, &mesh.cell_coords(cell)).unwrap() > 0.0);
    }
    assert_eq!(mesh.coords()[grid.node_index(3, 2, 1)], [2.0, 3.0, 0.25]);
    // a single z layer: every node is on a z plane
    assert!(mesh.boundary().index_table().iter().all(Option::is_some));
}

#[test]
fn boundary_classes_count_extremal_planes() {
    let mesh = cube(3);
    let count = |class: NodeClass| {
        mesh.boundary()
            .classes()
            .iter()
            .filter(|&&c| c == class)
            .count()
    };
    assert_eq!(count(NodeClass::Corner), 8);
    assert_eq!(count(NodeClass::Edge), 12 * 2);
    assert_eq!(count(NodeClass::Boundary), 6 * 4);
    assert_eq!(mesh.nboundary_nodes(), 64 - 8);
    let h = 1.0 / 3f64.sqrt();
    let n = mesh.boundary().normal_of(0).unwrap();
    assert!(n.iter().all(|c| (c + h).abs() < 1e-12));
}

#[test]
fn config_and_grids_round_trip_through_json() {
    let opts: BuildOptions =
        serde_json::from_str(r#"{"non_manifold": "Warn"}"#).unwrap();
    assert_eq!(opts.non_manifold, NonManifoldHandling::Warn);
    assert_eq!(opts.expected_variables, 0);

    let grid = StructuredGrid::uniform_2d(2, 1, [2.0, 1.0]).unwrap();
    let json = serde_json::to_value(&grid).unwrap();
    assert_eq!(json["edge_x"], serde_json::json!([0.0, 1.0, 2.0]));
}

proptest! {
    #[test]
    fn prop_face_tables_are_consistent(nx in 1usize..4, ny in 1usize..4, nz in 1usize..4) {
        let grid = StructuredGrid::uniform_3d(nx, ny, nz, [1.0, 2.0, 3.0]).unwrap();
        let mesh = grid.to_mesh().unwrap();
        let faces = mesh.faces().unwrap();

        prop_assert_eq!(
            mesh.nfaces(),
            nx * ny * (nz + 1) + (nx * (ny + 1) + (nx + 1) * ny) * nz
        );
        prop_assert!(mesh.validate_invariants().is_ok());

        for (node, mut expected) in faces_by_node(&mesh).into_iter().enumerate() {
            let mut listed = faces.nodes_to_faces().row(node).to_vec();
            listed.sort_unstable();
            expected.sort_unstable();
            prop_assert_eq!(listed, expected);
        }

        let mut by_node = vec![Vec::new(); mesh.nnodes()];
        for (cell, nodes) in mesh.cells_to_nodes().rows().enumerate() {
            for &n in nodes {
                by_node[n].push(cell);
            }
        }
        for (node, cells) in by_node.iter().enumerate() {
            prop_assert_eq!(mesh.nodes_to_cells().row(node), cells.as_slice());
        }
    }
}
