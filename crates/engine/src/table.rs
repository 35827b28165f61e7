// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical device table.
//!
//! One cell per device id, created on first discovery and kept for the
//! process lifetime; rediscovery refreshes cells in place. Readers take
//! cloned record snapshots, so nobody observes a torn record.

use devlab_adapters::{ChildHandle, DeviceDriver};
use devlab_core::{DeviceId, DeviceRecord, DeviceSpec, DeviceStorage, InstrumentId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

/// Shared per-device state: the record plus the process handles that must
/// survive across `Device` handles.
pub struct DeviceCell {
    pub record: Mutex<DeviceRecord>,
    pub driver: Arc<dyn DeviceDriver>,
    /// Running instrument attaches by id.
    pub instruments: Mutex<HashMap<InstrumentId, Arc<dyn ChildHandle>>>,
    /// Child process owning the device runtime (Android emulators).
    pub runtime_child: Mutex<Option<Arc<dyn ChildHandle>>>,
}

struct TableState {
    cells: HashMap<DeviceId, Arc<DeviceCell>>,
    /// Lowercased name -> ids; rebuilt wholesale after each merge.
    by_name: HashMap<String, Vec<DeviceId>>,
}

/// Registry of device cells keyed by id.
pub struct DeviceTable {
    storage: DeviceStorage,
    inner: Mutex<TableState>,
}

impl DeviceTable {
    pub fn new(storage: DeviceStorage) -> Self {
        Self {
            storage,
            inner: Mutex::new(TableState {
                cells: HashMap::new(),
                by_name: HashMap::new(),
            }),
        }
    }

    pub fn storage(&self) -> &DeviceStorage {
        &self.storage
    }

    /// Merge one walk's specs: update existing cells in place, instantiate
    /// new ones, rebuild the name index.
    pub fn merge(
        &self,
        specs: &[DeviceSpec],
        driver: &Arc<dyn DeviceDriver>,
    ) -> io::Result<()> {
        // Records for new ids are built (and storage dirs created) before
        // taking the table lock.
        let missing: Vec<&DeviceSpec> = {
            let inner = self.inner.lock();
            specs
                .iter()
                .filter(|spec| !inner.cells.contains_key(&spec.id))
                .collect()
        };
        let mut fresh: Vec<(DeviceId, DeviceRecord)> = Vec::with_capacity(missing.len());
        for spec in missing {
            fresh.push((spec.id.clone(), DeviceRecord::from_spec(spec, &self.storage)?));
        }

        let mut inner = self.inner.lock();
        for (id, record) in fresh {
            // A racing merge may have created the cell meanwhile.
            inner.cells.entry(id).or_insert_with(|| {
                Arc::new(DeviceCell {
                    record: Mutex::new(record),
                    driver: Arc::clone(driver),
                    instruments: Mutex::new(HashMap::new()),
                    runtime_child: Mutex::new(None),
                })
            });
        }
        for spec in specs {
            if let Some(cell) = inner.cells.get(&spec.id) {
                cell.record.lock().refresh_from(spec);
            }
        }

        let mut by_name: HashMap<String, Vec<DeviceId>> = HashMap::new();
        for (id, cell) in &inner.cells {
            let name = cell.record.lock().name.to_lowercase();
            by_name.entry(name).or_default().push(id.clone());
        }
        inner.by_name = by_name;
        Ok(())
    }

    pub fn get(&self, id: &DeviceId) -> Option<Arc<DeviceCell>> {
        self.inner.lock().cells.get(id).cloned()
    }

    /// Record snapshot; never a torn read.
    pub fn snapshot(&self, id: &DeviceId) -> Option<DeviceRecord> {
        self.get(id).map(|cell| cell.record.lock().clone())
    }

    /// Cells whose display name matches, case-insensitively.
    pub fn by_name(&self, name: &str) -> Vec<Arc<DeviceCell>> {
        let inner = self.inner.lock();
        inner
            .by_name
            .get(&name.to_lowercase())
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.cells.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn all(&self) -> Vec<Arc<DeviceCell>> {
        self.inner.lock().cells.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().cells.is_empty()
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
