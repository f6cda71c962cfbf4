use mesh_connectivity::prelude::*;
use mesh_connectivity::topology::offsets_from_counts;
use proptest::prelude::*;

#[test]
fn unfilled_slot_is_reported_against_its_owner() {
    let err = CsrTable::try_from_slots(vec![0, 1, 3], vec![Some(7), Some(8), None], "demo")
        .unwrap_err();
    assert_eq!(
        err,
        MeshError::UnfilledSlot {
            table: "demo",
            entity: 1
        }
    );
}

#[test]
fn malformed_offsets_fail_validation() {
    assert!(CsrTable::new(vec![0, 3, 2], vec![1, 2]).is_err());
    assert!(CsrTable::new(vec![1, 2], vec![1]).is_err());
    let table = CsrTable::new(vec![0, 1, 2], vec![4, 5]).unwrap();
    assert!(table.validate_invariants().is_ok());
}

proptest! {
    #[test]
    fn prop_offsets_are_monotonic(counts in prop::collection::vec(0usize..6, 0..40)) {
        let offsets = offsets_from_counts(&counts);
        prop_assert_eq!(offsets.len(), counts.len() + 1);
        prop_assert_eq!(offsets[0], 0);
        prop_assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(*offsets.last().unwrap(), counts.iter().sum::<usize>());
    }

    #[test]
    fn prop_rows_survive_packing(rows in prop::collection::vec(prop::collection::vec(0u32..100, 0..5), 0..20)) {
        let table = CsrTable::from_rows(rows.clone());
        prop_assert_eq!(table.len(), rows.len());
        prop_assert_eq!(table.total(), rows.iter().map(Vec::len).sum::<usize>());
        for (i, row) in rows.iter().enumerate() {
            prop_assert_eq!(table.row(i), row.as_slice());
            prop_assert_eq!(table.row_len(i), row.len());
        }
        prop_assert!(table.check_shape().is_ok());
    }

    #[test]
    fn prop_decomposition_tiles_the_grid(
        nranks in 1usize..13,
        global_nx in 1usize..40,
        global_ny in 1usize..40,
        load_balance in any::<bool>(),
    ) {
        let subs: Result<Vec<_>, _> = (0..nranks)
            .map(|r| decompose_2d_cartesian(r, nranks, global_nx, global_ny, load_balance))
            .collect();
        let Ok(subs) = subs else {
            return Ok(());
        };
        let cells: usize = subs.iter().map(|s| s.local_nx * s.local_ny).sum();
        prop_assert_eq!(cells, global_nx * global_ny);
        for s in &subs {
            prop_assert!(s.local_nx > 0 && s.local_ny > 0);
            prop_assert!(s.x_off + s.local_nx <= global_nx);
            prop_assert!(s.y_off + s.local_ny <= global_ny);
            for (dir, other) in s.neighbours() {
                let back = match dir {
                    Direction::North => Direction::South,
                    Direction::East => Direction::West,
                    Direction::South => Direction::North,
                    Direction::West => Direction::East,
                };
                prop_assert_eq!(subs[other].neighbour(back), Some(s.rank));
                match dir {
                    Direction::East => {
                        prop_assert_eq!(subs[other].x_off, s.x_off + s.local_nx);
                    }
                    Direction::North => {
                        prop_assert_eq!(subs[other].y_off, s.y_off + s.local_ny);
                    }
                    Direction::South | Direction::West => {}
                }
            }
        }
    }
}
