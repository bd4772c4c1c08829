//! Gallery persistence - disk I/O for assets and placed instances
//!
//! Everything lives in one bincode file under the storage directory. Writes go
//! through a temp file + rename so a crash mid-write never corrupts the store.
//! Instances are scoped per curator; assets are shared.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use shared::{
    AssetRecord, CatalogSnapshot, CreateInstance, InstanceId, InstancePersistence, InstanceRecord, PersistError,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::auth::CuratorTokens;

/// Bump when the on-disk layout changes.
pub const STORAGE_VERSION: u32 = 1;

const DATA_FILE: &str = "gallery.bin";
const TEMP_FILE: &str = "gallery.tmp";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding failed: {0}")]
    Encoding(#[from] bincode::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct GalleryData {
    version: u32,
    next_instance_id: InstanceId,
    assets: Vec<AssetRecord>,
    /// curator -> placed instances
    instances: BTreeMap<String, Vec<InstanceRecord>>,
}

/// Resource owning the gallery data and its file.
#[derive(Resource)]
pub struct GalleryStorage {
    storage_dir: PathBuf,
    auth: CuratorTokens,
    data: GalleryData,
}

impl GalleryStorage {
    /// Open (or create) the store in `storage_dir`. An empty store is seeded
    /// with `seed_assets`.
    pub fn open(storage_dir: impl Into<PathBuf>, auth: CuratorTokens, seed_assets: &[AssetRecord]) -> Result<Self, StorageError> {
        let storage_dir = storage_dir.into();
        std::fs::create_dir_all(&storage_dir)?;
        info!("Gallery data will be saved to: {:?}", storage_dir);

        let path = storage_dir.join(DATA_FILE);
        let data = match Self::load(&path)? {
            Some(data) => data,
            None => {
                info!("Seeding empty gallery with {} asset(s)", seed_assets.len());
                GalleryData {
                    version: STORAGE_VERSION,
                    next_instance_id: 1,
                    assets: seed_assets.to_vec(),
                    instances: BTreeMap::new(),
                }
            }
        };

        let storage = Self { storage_dir, auth, data };
        storage.save()?;
        Ok(storage)
    }

    /// `Ok(None)` when there is no usable file yet.
    fn load(path: &Path) -> Result<Option<GalleryData>, StorageError> {
        if !path.exists() {
            return Ok(None);
        }

        let bytes = std::fs::read(path)?;
        let data: GalleryData = match bincode::deserialize(&bytes) {
            Ok(data) => data,
            Err(e) => {
                let backup = Self::backup(path, "corrupt");
                warn!("Gallery file is unreadable ({}). Backed up to {:?}, starting fresh", e, backup);
                return Ok(None);
            }
        };

        if data.version != STORAGE_VERSION {
            let backup = Self::backup(path, &format!("v{}", data.version));
            warn!(
                "Gallery version mismatch: found v{}, expected v{}. Backed up to {:?}, starting fresh",
                data.version, STORAGE_VERSION, backup
            );
            return Ok(None);
        }

        info!(
            "Loaded gallery: {} asset(s), {} curator scope(s)",
            data.assets.len(),
            data.instances.len()
        );
        Ok(Some(data))
    }

    /// Copy `path` aside as `gallery.<label>.backup`.
    fn backup(path: &Path, label: &str) -> PathBuf {
        let backup = path.with_extension(format!("{label}.backup"));
        if let Err(e) = std::fs::copy(path, &backup) {
            warn!("Failed to back up gallery file: {}", e);
        }
        backup
    }

    /// Atomic write via temp file + rename.
    fn save(&self) -> Result<(), StorageError> {
        let final_path = self.storage_dir.join(DATA_FILE);
        let temp_path = self.storage_dir.join(TEMP_FILE);

        let bytes = bincode::serialize(&self.data)?;
        std::fs::write(&temp_path, &bytes)?;
        std::fs::rename(&temp_path, &final_path)?;

        debug!("Saved gallery ({} bytes)", bytes.len());
        Ok(())
    }
}

impl InstancePersistence for GalleryStorage {
    fn create_instance(&mut self, bearer: &str, request: CreateInstance) -> Result<InstanceRecord, PersistError> {
        let curator = self.auth.resolve(bearer)?.to_string();
        request.validate()?;
        if !self.data.assets.iter().any(|a| a.id == request.asset_id) {
            return Err(PersistError::UnknownAsset(request.asset_id));
        }

        let record = InstanceRecord {
            id: self.data.next_instance_id,
            asset_id: request.asset_id,
            position: request.position,
            rotation: request.rotation,
            scale: request.scale,
        };

        self.data.next_instance_id += 1;
        self.data.instances.entry(curator.clone()).or_default().push(record.clone());

        if let Err(e) = self.save() {
            // Keep memory and disk in step
            if let Some(list) = self.data.instances.get_mut(&curator) {
                list.pop();
            }
            self.data.next_instance_id -= 1;
            error!("Failed to persist instance for '{}': {}", curator, e);
            return Err(PersistError::Storage(e.to_string()));
        }

        info!("Curator '{}' placed asset {} as instance {}", curator, record.asset_id, record.id);
        Ok(record)
    }

    fn snapshot(&self, bearer: &str) -> Result<CatalogSnapshot, PersistError> {
        let curator = self.auth.resolve(bearer)?;
        Ok(CatalogSnapshot {
            assets: self.data.assets.clone(),
            instances: self.data.instances.get(curator).cloned().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{CuratorToken, Vec3Fields};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("exhibit-storage-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn auth() -> CuratorTokens {
        CuratorTokens::new(&[
            CuratorToken { token: "ana-token".into(), curator: "ana".into() },
            CuratorToken { token: "ben-token".into(), curator: "ben".into() },
        ])
    }

    fn seeds() -> Vec<AssetRecord> {
        vec![AssetRecord {
            id: 1,
            title: Some("Harbour".into()),
            url: "/uploads/1.jpg".into(),
            width_cm: Some(120.0),
            height_cm: Some(80.0),
        }]
    }

    fn request(asset_id: u64) -> CreateInstance {
        CreateInstance {
            asset_id,
            position: Vec3Fields { x: 1.0, y: 1.5, z: 2.01 },
            rotation: Vec3Fields::default(),
            scale: 1.0,
        }
    }

    #[test]
    fn instances_survive_reopen() {
        let dir = temp_dir("reopen");
        let mut storage = GalleryStorage::open(&dir, auth(), &seeds()).unwrap();
        let record = storage.create_instance("Bearer ana-token", request(1)).unwrap();
        assert_eq!(record.id, 1);
        drop(storage);

        let reopened = GalleryStorage::open(&dir, auth(), &[]).unwrap();
        let snapshot = reopened.snapshot("ana-token").unwrap();
        assert_eq!(snapshot.instances, vec![record]);
        assert_eq!(snapshot.assets.len(), 1);
        assert!(!dir.join(TEMP_FILE).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn instances_are_scoped_per_curator() {
        let dir = temp_dir("scope");
        let mut storage = GalleryStorage::open(&dir, auth(), &seeds()).unwrap();
        storage.create_instance("ana-token", request(1)).unwrap();

        assert_eq!(storage.snapshot("ana-token").unwrap().instances.len(), 1);
        assert!(storage.snapshot("ben-token").unwrap().instances.is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rejects_bad_credentials_and_unknown_assets() {
        let dir = temp_dir("reject");
        let mut storage = GalleryStorage::open(&dir, auth(), &seeds()).unwrap();

        assert_eq!(storage.create_instance("stale", request(1)), Err(PersistError::Unauthorized));
        assert_eq!(storage.snapshot(""), Err(PersistError::Unauthorized));
        assert_eq!(storage.create_instance("ana-token", request(42)), Err(PersistError::UnknownAsset(42)));

        let mut bad = request(1);
        bad.scale = -1.0;
        assert!(matches!(storage.create_instance("ana-token", bad), Err(PersistError::InvalidRequest(_))));
        assert!(storage.snapshot("ana-token").unwrap().instances.is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn old_versions_are_backed_up_and_replaced() {
        let dir = temp_dir("version");
        std::fs::create_dir_all(&dir).unwrap();
        let old = GalleryData { version: 0, next_instance_id: 9, ..Default::default() };
        std::fs::write(dir.join(DATA_FILE), bincode::serialize(&old).unwrap()).unwrap();

        let storage = GalleryStorage::open(&dir, auth(), &seeds()).unwrap();
        assert_eq!(storage.data.version, STORAGE_VERSION);
        assert_eq!(storage.data.next_instance_id, 1);
        assert!(dir.join("gallery.v0.backup").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unreadable_file_is_backed_up_and_replaced() {
        let dir = temp_dir("corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(DATA_FILE), b"\x01not a gallery").unwrap();

        let storage = GalleryStorage::open(&dir, auth(), &seeds()).unwrap();
        assert_eq!(storage.data.version, STORAGE_VERSION);
        assert_eq!(storage.data.assets, seeds());
        assert_eq!(std::fs::read(dir.join("gallery.corrupt.backup")).unwrap(), b"\x01not a gallery");
        drop(storage);

        let reopened = GalleryStorage::open(&dir, auth(), &[]).unwrap();
        assert_eq!(reopened.data.assets, seeds());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
