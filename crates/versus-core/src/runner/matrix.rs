//! Pre-sized result grid
//!
//! Each slot is written at most once. Slots are independent, so distinct
//! execution units may populate them concurrently through a shared reference.

use once_cell::sync::OnceCell;
use serde::{Serialize, Serializer};

use super::cell::CellResult;
use crate::error::{HarnessError, HarnessResult};

/// samples x versions grid of cell results
#[derive(Debug)]
pub struct ResultMatrix {
    samples: usize,
    versions: usize,
    /// Sample-major; an unset slot is pending
    slots: Vec<OnceCell<CellResult>>,
}

impl ResultMatrix {
    /// Allocate a grid with every slot pending
    pub fn new(samples: usize, versions: usize) -> Self {
        let slots = (0..samples * versions).map(|_| OnceCell::new()).collect();
        Self {
            samples,
            versions,
            slots,
        }
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn versions(&self) -> usize {
        self.versions
    }

    /// Total number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn offset(&self, sample_index: usize, version_index: usize) -> HarnessResult<usize> {
        if sample_index >= self.samples || version_index >= self.versions {
            return Err(HarnessError::SlotOutOfBounds {
                sample_index,
                version_index,
                samples: self.samples,
                versions: self.versions,
            });
        }
        Ok(sample_index * self.versions + version_index)
    }

    /// Write one slot. Fails if the slot is out of range or already written.
    pub fn populate(&self, sample_index: usize, version_index: usize, result: CellResult) -> HarnessResult<()> {
        let offset = self.offset(sample_index, version_index)?;
        self.slots[offset]
            .set(result)
            .map_err(|_| HarnessError::SlotAlreadyFilled {
                sample_index,
                version_index,
            })
    }

    pub fn get(&self, sample_index: usize, version_index: usize) -> Option<&CellResult> {
        self.offset(sample_index, version_index)
            .ok()
            .and_then(|offset| self.slots[offset].get())
    }

    pub fn is_pending(&self, sample_index: usize, version_index: usize) -> bool {
        self.offset(sample_index, version_index)
            .map(|offset| self.slots[offset].get().is_none())
            .unwrap_or(false)
    }

    pub fn pending_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.get().is_none()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.pending_count() == 0
    }

    /// Fill every pending slot with the given synthetic result.
    ///
    /// Returns the number of slots that were still pending.
    pub fn fill_pending<F>(&mut self, mut make: F) -> usize
    where
        F: FnMut(usize, usize) -> CellResult,
    {
        let versions = self.versions;
        let mut filled = 0;
        for (offset, slot) in self.slots.iter_mut().enumerate() {
            if slot.get().is_none() {
                let result = make(offset / versions, offset % versions);
                let _ = slot.set(result);
                filled += 1;
            }
        }
        filled
    }

    /// Populated cells of one sample row, in version order
    pub fn row(&self, sample_index: usize) -> impl Iterator<Item = &CellResult> + '_ {
        let start = (sample_index * self.versions).min(self.slots.len());
        let end = (start + self.versions).min(self.slots.len());
        self.slots[start..end].iter().filter_map(|slot| slot.get())
    }

    /// Populated cells of one version column, in sample order
    pub fn column(&self, version_index: usize) -> impl Iterator<Item = &CellResult> + '_ {
        let versions = self.versions;
        self.slots
            .iter()
            .enumerate()
            .filter(move |(offset, _)| versions > 0 && offset % versions == version_index)
            .filter_map(|(_, slot)| slot.get())
    }

    /// Populated cells, sample-major then version-minor
    pub fn cells(&self) -> impl Iterator<Item = &CellResult> + '_ {
        self.slots.iter().filter_map(|slot| slot.get())
    }
}

impl Serialize for ResultMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct MatrixView<'a> {
            samples: usize,
            versions: usize,
            cells: Vec<Option<&'a CellResult>>,
        }

        MatrixView {
            samples: self.samples,
            versions: self.versions,
            cells: self.slots.iter().map(|slot| slot.get()).collect(),
        }
        .serialize(serializer)
    }
}
