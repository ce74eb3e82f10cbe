//! JSON-file record repository
//!
//! Each record lives in its own pretty-printed JSON file named
//! `<dir>/<id>.json`. The repository knows nothing about the record beyond
//! its id and its serde representation.

use super::error::{StorageError, StorageResult};
use crate::domain::{Profile, Projectile, Session, SightingSystem};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

const RECORD_EXTENSION: &str = "json";

/// A value that can be stored by id
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Used in not-found messages and logs
    const KIND: &'static str;

    fn record_id(&self) -> &str;
}

impl Record for Session {
    const KIND: &'static str = "session";

    fn record_id(&self) -> &str {
        self.id()
    }
}

impl Record for Profile {
    const KIND: &'static str = "profile";

    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for Projectile {
    const KIND: &'static str = "projectile";

    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for SightingSystem {
    const KIND: &'static str = "sighting system";

    fn record_id(&self) -> &str {
        &self.id
    }
}

/// Key-by-id persistence contract
pub trait RecordStore<T: Record>: Send + Sync {
    /// Insert or overwrite
    fn save(&self, record: &T) -> StorageResult<()>;

    fn load(&self, id: &str) -> StorageResult<T>;

    /// Ids of every stored record, sorted
    fn list_ids(&self) -> StorageResult<Vec<String>>;

    fn delete(&self, id: &str) -> StorageResult<()>;

    fn exists(&self, id: &str) -> bool {
        self.load(id).is_ok()
    }
}

/// [`RecordStore`] backed by one JSON file per record
#[derive(Debug, Clone)]
pub struct JsonRepository<T> {
    dir: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> JsonRepository<T> {
    /// The directory is created lazily on first save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _record: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> StorageResult<PathBuf> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{}.{}", id, RECORD_EXTENSION)))
    }
}

impl<T: Record> RecordStore<T> for JsonRepository<T> {
    fn save(&self, record: &T) -> StorageResult<()> {
        let path = self.path_for(record.record_id())?;
        std::fs::create_dir_all(&self.dir)?;

        // Written beside the target and renamed over it; readers never see
        // a partial record
        let content = serde_json::to_string_pretty(record)?;
        let tmp_path = path.with_extension(format!("{}.tmp", RECORD_EXTENSION));
        std::fs::write(&tmp_path, content)?;
        if let Err(e) = std::fs::rename(&tmp_path, &path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        tracing::debug!(kind = T::KIND, id = record.record_id(), "Saved record");
        Ok(())
    }

    fn load(&self, id: &str) -> StorageResult<T> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(StorageError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            });
        }

        let content = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn list_ids(&self) -> StorageResult<Vec<String>> {
        let mut ids = Vec::new();

        if !self.dir.exists() {
            return Ok(ids);
        }

        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == RECORD_EXTENSION).unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn delete(&self, id: &str) -> StorageResult<()> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(StorageError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            });
        }

        std::fs::remove_file(&path)?;
        tracing::debug!(kind = T::KIND, id, "Deleted record");
        Ok(())
    }

    fn exists(&self, id: &str) -> bool {
        self.path_for(id).map(|p| p.exists()).unwrap_or(false)
    }
}

fn validate_id(id: &str) -> StorageResult<()> {
    let escapes = id.contains(['/', '\\']) || id == "." || id == "..";
    if id.trim().is_empty() || escapes {
        return Err(StorageError::InvalidId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Length, Mass, ProfileCategory};
    use tempfile::TempDir;

    fn create_test_repo<T: Record>() -> (JsonRepository<T>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonRepository::new(dir.path().join("records"));
        (repo, dir)
    }

    fn projectile(name: &str) -> Projectile {
        Projectile::new(name, Mass::new(0.547).unwrap(), 0.021).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let (repo, _dir) = create_test_repo::<Projectile>();
        let pellet = projectile("JSB Exact");

        repo.save(&pellet).unwrap();
        let loaded = repo.load(&pellet.id).unwrap();

        assert_eq!(loaded, pellet);
        assert!(repo.exists(&pellet.id));
    }

    #[test]
    fn test_save_overwrites() {
        let (repo, _dir) = create_test_repo::<Projectile>();
        let mut pellet = projectile("JSB Exact");
        repo.save(&pellet).unwrap();

        pellet.update_bc(0.030).unwrap();
        repo.save(&pellet).unwrap();

        assert_eq!(repo.load(&pellet.id).unwrap().bc, 0.030);
        assert_eq!(repo.list_ids().unwrap().len(), 1);
    }

    #[test]
    fn test_save_leaves_only_the_record_file() {
        let (repo, _dir) = create_test_repo::<Projectile>();
        let mut pellet = projectile("JSB Exact");
        repo.save(&pellet).unwrap();
        pellet.update_bc(0.025).unwrap();
        repo.save(&pellet).unwrap();

        let mut names: Vec<String> = std::fs::read_dir(repo.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec![format!("{}.json", pellet.id)]);

        // An interrupted write is never listed
        std::fs::write(repo.dir().join("stale.json.tmp"), "{ trunc").unwrap();
        assert_eq!(repo.list_ids().unwrap(), vec![pellet.id.clone()]);
        assert_eq!(repo.load(&pellet.id).unwrap().bc, 0.025);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let (repo, _dir) = create_test_repo::<Profile>();
        let err = repo.load("missing").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "profile not found: missing");
    }

    #[test]
    fn test_list_ids_on_missing_dir_is_empty() {
        let (repo, _dir) = create_test_repo::<Session>();
        assert!(repo.list_ids().unwrap().is_empty());
    }

    #[test]
    fn test_list_ids_ignores_other_files() {
        let (repo, _dir) = create_test_repo::<Projectile>();
        let a = projectile("A");
        let b = projectile("B");
        repo.save(&a).unwrap();
        repo.save(&b).unwrap();
        std::fs::write(repo.dir().join("notes.txt"), "ignored").unwrap();

        let mut expected = vec![a.id.clone(), b.id.clone()];
        expected.sort();
        assert_eq!(repo.list_ids().unwrap(), expected);
    }

    #[test]
    fn test_delete() {
        let (repo, _dir) = create_test_repo::<Profile>();
        let profile = Profile::new(
            "LG400",
            ProfileCategory::AirRifle,
            Length::new(420.0).unwrap(),
            Mass::new(1300.0).unwrap(),
            Length::new(50.0).unwrap(),
        )
        .unwrap();
        repo.save(&profile).unwrap();

        repo.delete(&profile.id).unwrap();
        assert!(!repo.exists(&profile.id));
        assert!(repo.delete(&profile.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_rejects_path_escaping_ids() {
        let (repo, _dir) = create_test_repo::<Session>();
        for id in ["", "../etc/passwd", "a/b", "a\\b", ".."] {
            assert!(matches!(
                repo.load(id),
                Err(StorageError::InvalidId(_))
            ));
        }
    }

    #[test]
    fn test_corrupt_record_is_serialization_error() {
        let (repo, _dir) = create_test_repo::<Projectile>();
        std::fs::create_dir_all(repo.dir()).unwrap();
        std::fs::write(repo.dir().join("broken.json"), "{ not json").unwrap();

        assert!(matches!(
            repo.load("broken"),
            Err(StorageError::Serialization(_))
        ));
        assert_eq!(repo.list_ids().unwrap(), vec!["broken".to_string()]);
    }
}
