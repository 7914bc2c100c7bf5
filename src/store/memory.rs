//! Map-backed store for tests and single-process use

use super::{apply_save, check_id, unix_now, DesignRecord, DesignStore, StoredDesign};
use crate::codec::validate_layout;
use crate::model::{Grid, SilhouetteTable};
use crate::{Error, Result};
use std::collections::BTreeMap;

pub struct MemoryStore {
    silhouettes: SilhouetteTable,
    records: BTreeMap<String, DesignRecord>,
}

impl MemoryStore {
    pub fn new(silhouettes: SilhouetteTable) -> Self {
        MemoryStore {
            silhouettes,
            records: BTreeMap::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(SilhouetteTable::default())
    }
}

impl DesignStore for MemoryStore {
    fn create(&mut self, id: &str, name: &str, grid: Grid) -> Result<StoredDesign> {
        check_id(id)?;
        if self.records.contains_key(id) {
            return Err(Error::AlreadyExists(id.to_string()));
        }
        validate_layout(&grid, &self.silhouettes)?;
        let record = DesignRecord::new(id, name, grid);
        self.records.insert(id.to_string(), record.clone());
        StoredDesign::from_record(record)
    }

    fn load(&self, id: &str) -> Result<StoredDesign> {
        let record = self
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        StoredDesign::from_record(record)
    }

    fn save(
        &mut self,
        id: &str,
        grid: Grid,
        editor: &str,
        expected_version: Option<&str>,
    ) -> Result<String> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        apply_save(record, grid, editor, expected_version, unix_now())
    }

    fn list(&self) -> Result<Vec<DesignRecord>> {
        Ok(self.records.values().cloned().collect())
    }

    fn close(&mut self, id: &str, at: u64) -> Result<()> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        record.closed_at = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SilhouetteMask;

    #[test]
    fn create_rejects_duplicates_and_foreign_layouts() {
        let mut s = MemoryStore::default();
        let mask = SilhouetteMask::generate(19, 13, &SilhouetteTable::default()).unwrap();
        s.create("a", "A", Grid::new(&mask)).unwrap();
        assert!(matches!(
            s.create("a", "A", Grid::new(&mask)),
            Err(Error::AlreadyExists(_))
        ));

        // a 19x13 grid drawn with the proportional outline disagrees with the table
        let odd = SilhouetteMask::generate(19, 13, &SilhouetteTable::empty()).unwrap();
        assert!(matches!(
            s.create("b", "B", Grid::new(&odd)),
            Err(Error::MalformedGrid(_))
        ));
    }
}
