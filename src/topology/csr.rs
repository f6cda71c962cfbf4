//! Compressed-sparse-row adjacency tables.
//!
//! Every adjacency relation of a mesh (node→cell, cell→cell, cell→face, …) is
//! stored as a [`CsrTable`]: one contiguous `values` arena addressed through an
//! `offsets` array of length `N + 1`, so that entity `i`'s neighbours are
//! `values[offsets[i]..offsets[i + 1]]`.
//!
//! Tables are immutable once built. Discovery passes fill an intermediate
//! buffer of `Option<T>` slots, where `None` means "not yet discovered", and
//! then finish it with [`CsrTable::try_from_slots`], which refuses to produce
//! a table with any slot left undiscovered.

use crate::mesh_error::MeshError;

/// Convert per-entity counts into prefix-sum offsets, in place.
///
/// On entry `offsets[i + 1]` holds the incidence count of entity `i` and
/// `offsets[0]` is zero. On return `offsets` is non-decreasing and its last
/// element is the total incidence count.
pub fn counts_to_offsets(offsets: &mut [usize]) {
    for i in 1..offsets.len() {
        offsets[i] += offsets[i - 1];
    }
}

/// Build an offsets array of length `counts.len() + 1` from raw counts.
pub fn offsets_from_counts(counts: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(counts.len() + 1);
    offsets.push(0);
    offsets.extend_from_slice(counts);
    counts_to_offsets(&mut offsets);
    offsets
}

/// Immutable CSR adjacency table.
///
/// Deserialization goes through [`CsrTable::new`], so a table read back from
/// serialized form has passed the same offsets check as a built one.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawCsr<T>")]
pub struct CsrTable<T> {
    offsets: Vec<usize>,
    values: Vec<T>,
}

/// Unchecked wire form of a [`CsrTable`].
#[derive(serde::Deserialize)]
struct RawCsr<T> {
    offsets: Vec<usize>,
    values: Vec<T>,
}

impl<T> TryFrom<RawCsr<T>> for CsrTable<T> {
    type Error = MeshError;

    fn try_from(raw: RawCsr<T>) -> Result<Self, Self::Error> {
        CsrTable::new(raw.offsets, raw.values)
    }
}

impl<T> Default for CsrTable<T> {
    fn default() -> Self {
        Self {
            offsets: vec![0],
            values: Vec::new(),
        }
    }
}

impl<T> CsrTable<T> {
    /// Build from explicit offsets and values, validating the offsets shape.
    pub fn new(offsets: Vec<usize>, values: Vec<T>) -> Result<Self, MeshError> {
        check_offsets(&offsets, values.len())?;
        Ok(Self { offsets, values })
    }

    /// Build a table where every entity has exactly `stride` entries.
    pub fn uniform(stride: usize, values: Vec<T>) -> Result<Self, MeshError> {
        if stride == 0 {
            return Err(MeshError::InvariantViolation(
                "uniform CSR stride must be non-zero".into(),
            ));
        }
        if values.len() % stride != 0 {
            return Err(MeshError::InvariantViolation(format!(
                "{} values do not split into rows of {stride}",
                values.len()
            )));
        }
        let rows = values.len() / stride;
        let offsets = (0..=rows).map(|r| r * stride).collect();
        Ok(Self { offsets, values })
    }

    /// Build from an iterator of rows, preserving row and in-row order.
    pub fn from_rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = T>,
    {
        let mut offsets = vec![0];
        let mut values = Vec::new();
        for row in rows {
            values.extend(row);
            offsets.push(values.len());
        }
        Self { offsets, values }
    }

    /// Finish a discovery buffer. Any slot still `None` is an error naming the
    /// entity that owns it.
    pub fn try_from_slots(
        offsets: Vec<usize>,
        slots: Vec<Option<T>>,
        table: &'static str,
    ) -> Result<Self, MeshError> {
        check_offsets(&offsets, slots.len())?;
        let mut values = Vec::with_capacity(slots.len());
        for (pos, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(v) => values.push(v),
                None => {
                    return Err(MeshError::UnfilledSlot {
                        table,
                        entity: owner_of(&offsets, pos),
                    });
                }
            }
        }
        Ok(Self { offsets, values })
    }

    /// Number of entities (rows).
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// True when the table has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of stored incidences.
    #[inline]
    pub fn total(&self) -> usize {
        self.values.len()
    }

    /// Neighbours of entity `i`.
    ///
    /// # Panics
    /// Panics if `i >= self.len()`.
    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        &self.values[self.offsets[i]..self.offsets[i + 1]]
    }

    /// Neighbours of entity `i`, or `None` when out of range.
    #[inline]
    pub fn get(&self, i: usize) -> Option<&[T]> {
        if i < self.len() {
            Some(self.row(i))
        } else {
            None
        }
    }

    /// Number of neighbours of entity `i`.
    #[inline]
    pub fn row_len(&self, i: usize) -> usize {
        self.offsets[i + 1] - self.offsets[i]
    }

    /// Iterate rows in entity order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[T]> + '_ {
        self.offsets.windows(2).map(|w| &self.values[w[0]..w[1]])
    }

    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Structural check: offsets start at zero, never decrease and end at the
    /// number of stored values.
    pub fn check_shape(&self) -> Result<(), MeshError> {
        check_offsets(&self.offsets, self.values.len())
    }
}

fn check_offsets(offsets: &[usize], nvalues: usize) -> Result<(), MeshError> {
    match offsets.first() {
        None => {
            return Err(MeshError::InvariantViolation(
                "CSR offsets must contain at least one entry".into(),
            ));
        }
        Some(&first) if first != 0 => {
            return Err(MeshError::InvariantViolation(format!(
                "CSR offsets start at {first}, expected 0"
            )));
        }
        _ => {}
    }
    if let Some(i) = offsets.windows(2).position(|w| w[1] < w[0]) {
        return Err(MeshError::InvariantViolation(format!(
            "CSR offsets decrease at entity {i}"
        )));
    }
    let last = offsets[offsets.len() - 1];
    if last != nvalues {
        return Err(MeshError::InvariantViolation(format!(
            "CSR offsets end at {last}, but {nvalues} values are stored"
        )));
    }
    Ok(())
}

/// Row owning flat position `pos`; empty rows are skipped.
fn owner_of(offsets: &[usize], pos: usize) -> usize {
    offsets.partition_point(|&o| o <= pos) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_become_monotonic_offsets() {
        let mut offsets = vec![0, 2, 0, 3, 1];
        counts_to_offsets(&mut offsets);
        assert_eq!(offsets, vec![0, 2, 2, 5, 6]);
        assert_eq!(offsets_from_counts(&[2, 0, 3, 1]), offsets);
    }

    #[test]
    fn rows_are_addressed_through_offsets() {
        let t = CsrTable::new(vec![0, 2, 2, 5], vec![1, 2, 7, 8, 9]).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.row(0), &[1, 2]);
        assert!(t.row(1).is_empty());
        assert_eq!(t.row(2), &[7, 8, 9]);
        assert_eq!(t.get(3), None);
        let rows: Vec<_> = t.rows().collect();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn bad_offsets_are_rejected() {
        assert!(CsrTable::new(vec![1, 2], vec![0, 0]).is_err());
        assert!(CsrTable::new(vec![0, 3, 2], vec![0, 0]).is_err());
        assert!(CsrTable::new(vec![0, 1], vec![0, 0]).is_err());
        assert!(CsrTable::<u8>::uniform(3, vec![0; 4]).is_err());
    }

    #[test]
    fn undiscovered_slot_names_its_owner() {
        let err = CsrTable::try_from_slots(
            vec![0, 1, 1, 3],
            vec![Some(4), Some(5), None],
            "nodes_to_cells",
        )
        .unwrap_err();
        assert_eq!(
            err,
            MeshError::UnfilledSlot {
                table: "nodes_to_cells",
                entity: 2
            }
        );
    }

    #[test]
    fn from_rows_and_uniform_agree() {
        let a = CsrTable::from_rows(vec![vec![1, 2], vec![3, 4]]);
        let b = CsrTable::uniform(2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(a, b);
        assert_eq!(CsrTable::<usize>::default().len(), 0);
    }

    #[test]
    fn deserialization_checks_offsets() {
        let ok: CsrTable<usize> =
            serde_json::from_str(r#"{"offsets":[0,1,2],"values":[4,5]}"#).unwrap();
        assert_eq!(ok.row(1), &[5]);

        let short = serde_json::from_str::<CsrTable<usize>>(r#"{"offsets":[0,5],"values":[]}"#)
            .unwrap_err();
        assert!(short.to_string().contains("CSR offsets end at 5"), "{short}");
        assert!(serde_json::from_str::<CsrTable<usize>>(r#"{"offsets":[],"values":[]}"#).is_err());
        assert!(
            serde_json::from_str::<CsrTable<usize>>(r#"{"offsets":[0,2,1],"values":[1]}"#)
                .is_err()
        );
    }
}
