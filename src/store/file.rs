//! Directory-backed store: one JSON document per design (`{id}.json`).
//!
//! Writes go through `{id}.json.tmp` and a rename so a crash mid-write
//! leaves the previous document intact. Documents read back must carry the
//! id of the file they were read from, and their grids are checked against
//! the silhouette table before they are handed out.
//!
//! A directory is meant to have a single writer. `create` claims the file
//! name atomically, but `save` and `close` read, check and rewrite without
//! a lock, so two handles saving the same design can both pass the version
//! check. Share one store through [`crate::DesignService`] instead of
//! opening the directory twice for writing.

use super::{apply_save, check_id, unix_now, DesignRecord, DesignStore, StoredDesign};
use crate::codec::validate_layout;
use crate::model::{Grid, SilhouetteTable};
use crate::{Error, Result};
use log::{debug, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub struct FileStore {
    dir: PathBuf,
    silhouettes: SilhouetteTable,
}

impl FileStore {
    /// Use `dir`, creating it if needed.
    pub fn open(dir: impl AsRef<Path>, silhouettes: SilhouetteTable) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, silhouettes })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        check_id(id)?;
        Ok(self.dir.join(format!("{}.json", id)))
    }

    /// Parse the document at `path`, which must be filed under `id`.
    fn read_record(&self, path: &Path, id: &str) -> Result<DesignRecord> {
        let data = fs::read_to_string(path)?;
        let record: DesignRecord = serde_json::from_str(&data)
            .map_err(|e| Error::MalformedRecord(format!("{}: {}", path.display(), e)))?;
        if record.id != id {
            warn!("{} holds design {:?}", path.display(), record.id);
            return Err(Error::MalformedRecord(format!(
                "{} holds design {:?}, expected {:?}",
                path.display(),
                record.id,
                id
            )));
        }
        validate_layout(&record.grid, &self.silhouettes)?;
        Ok(record)
    }

    fn read(&self, id: &str) -> Result<DesignRecord> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(Error::NotFound(id.to_string()));
        }
        self.read_record(&path, id)
    }

    fn write(&self, id: &str, record: &DesignRecord) -> Result<()> {
        let path = self.path_for(id)?;
        let data = serde_json::to_vec_pretty(record)
            .map_err(|e| Error::MalformedRecord(format!("{}: {}", id, e)))?;
        atomic_write(&path, &data)?;
        debug!("wrote {}", path.display());
        Ok(())
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp, path)
}

impl DesignStore for FileStore {
    fn create(&mut self, id: &str, name: &str, grid: Grid) -> Result<StoredDesign> {
        let path = self.path_for(id)?;
        validate_layout(&grid, &self.silhouettes)?;
        // claim the name before writing so a concurrent create cannot pass too
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::AlreadyExists(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        }
        let record = DesignRecord::new(id, name, grid);
        if let Err(e) = self.write(id, &record) {
            let _ = fs::remove_file(&path);
            return Err(e);
        }
        StoredDesign::from_record(record)
    }

    fn load(&self, id: &str) -> Result<StoredDesign> {
        StoredDesign::from_record(self.read(id)?)
    }

    fn save(
        &mut self,
        id: &str,
        grid: Grid,
        editor: &str,
        expected_version: Option<&str>,
    ) -> Result<String> {
        let mut record = self.read(id)?;
        let version = apply_save(&mut record, grid, editor, expected_version, unix_now())?;
        self.write(id, &record)?;
        Ok(version)
    }

    fn list(&self) -> Result<Vec<DesignRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            let record = check_id(stem)
                .map_err(|_| {
                    Error::MalformedRecord(format!("{} is not a design file name", path.display()))
                })
                .and_then(|_| self.read_record(&path, stem))
                .map_err(|e| {
                    warn!("unreadable design {}: {}", path.display(), e);
                    e
                })?;
            records.push(record);
        }
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    fn close(&mut self, id: &str, at: u64) -> Result<()> {
        let mut record = self.read(id)?;
        record.closed_at = Some(at);
        self.write(id, &record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SilhouetteMask;

    #[test]
    fn documents_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = FileStore::open(dir.path(), SilhouetteTable::default()).unwrap();
        let mask = SilhouetteMask::generate(19, 13, &SilhouetteTable::default()).unwrap();
        let created = s.create("kawung", "Kawung", Grid::new(&mask)).unwrap();

        let g = created.record.grid.with_cell(3, 3, 2, 1).unwrap();
        s.save("kawung", g.clone(), "sari", Some(&created.version)).unwrap();

        assert!(dir.path().join("kawung.json").exists());
        assert!(!dir.path().join("kawung.json.tmp").exists());
        let loaded = s.load("kawung").unwrap();
        assert_eq!(loaded.record.grid, g);
        assert_eq!(loaded.record.contributors, vec!["sari".to_string()]);
    }

    #[test]
    fn tampered_document_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = FileStore::open(dir.path(), SilhouetteTable::default()).unwrap();
        let mask = SilhouetteMask::generate(19, 13, &SilhouetteTable::default()).unwrap();
        s.create("x", "X", Grid::new(&mask)).unwrap();

        let path = dir.path().join("x.json");
        let mut doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        doc["data"][0][9] = serde_json::json!([1, 1]);
        fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        assert!(matches!(s.load("x"), Err(Error::MalformedGrid(_))));
        assert!(matches!(s.list(), Err(Error::MalformedGrid(_))));
        assert!(matches!(
            s.catalog(&Default::default(), &Default::default()),
            Err(Error::MalformedGrid(_))
        ));
    }

    #[test]
    fn document_filed_under_another_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = FileStore::open(dir.path(), SilhouetteTable::default()).unwrap();
        let mask = SilhouetteMask::generate(19, 13, &SilhouetteTable::default()).unwrap();
        let a = s.create("a", "A", Grid::new(&mask)).unwrap();
        let b = s.create("b", "B", Grid::new(&mask)).unwrap();
        s.close("b", 0).unwrap();

        let path = dir.path().join("a.json");
        let mut doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        doc["id"] = serde_json::json!("b");
        fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        assert!(matches!(s.load("a"), Err(Error::MalformedRecord(_))));
        let painted = a.record.grid.with_cell(5, 5, 1, 1).unwrap();
        assert!(matches!(
            s.save("a", painted, "mallory", Some(&a.version)),
            Err(Error::MalformedRecord(_))
        ));
        assert!(matches!(s.list(), Err(Error::MalformedRecord(_))));

        // b is untouched and still closed
        let b_doc: DesignRecord =
            serde_json::from_str(&fs::read_to_string(dir.path().join("b.json")).unwrap()).unwrap();
        assert_eq!(b_doc.closed_at, Some(0));
        assert_eq!(crate::codec::grid_digest(&b_doc.grid).unwrap(), b.version);
        assert!(b_doc.contributors.is_empty());
    }

    #[test]
    fn unparseable_document_is_a_record_error() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileStore::open(dir.path(), SilhouetteTable::default()).unwrap();
        fs::write(dir.path().join("c.json"), r#"{"id": "c", "data": [[[0, 0]]]}"#).unwrap();
        assert!(matches!(s.load("c"), Err(Error::MalformedRecord(_))));
        fs::write(dir.path().join("bad name.json"), "{}").unwrap();
        fs::remove_file(dir.path().join("c.json")).unwrap();
        assert!(matches!(s.list(), Err(Error::MalformedRecord(_))));
    }

    #[test]
    fn create_claims_existing_name_once() {
        let dir = tempfile::tempdir().unwrap();
        let mask = SilhouetteMask::generate(19, 13, &SilhouetteTable::default()).unwrap();
        let mut first = FileStore::open(dir.path(), SilhouetteTable::default()).unwrap();
        let mut second = FileStore::open(dir.path(), SilhouetteTable::default()).unwrap();
        first.create("sekar", "Sekar", Grid::new(&mask)).unwrap();
        assert!(matches!(
            second.create("sekar", "Other", Grid::new(&mask)),
            Err(Error::AlreadyExists(_))
        ));
        assert_eq!(second.load("sekar").unwrap().record.name, "Sekar");
    }

    #[test]
    fn missing_and_invalid_ids() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileStore::open(dir.path(), SilhouetteTable::default()).unwrap();
        assert!(matches!(s.load("nope"), Err(Error::NotFound(_))));
        assert!(matches!(s.load("../etc"), Err(Error::InvalidDesignId(_))));
    }
}
