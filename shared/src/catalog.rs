//! Asset and instance records exchanged with the persistence API

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::PersistError;

pub type AssetId = u64;
pub type InstanceId = u64;

/// An uploaded artwork image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    /// Physical width in centimetres; uploads without metadata leave it empty.
    #[serde(default)]
    pub width_cm: Option<f32>,
    #[serde(default)]
    pub height_cm: Option<f32>,
}

impl AssetRecord {
    pub fn display_name(&self) -> String {
        match &self.title {
            Some(title) if !title.trim().is_empty() => title.clone(),
            _ => format!("Asset #{}", self.id),
        }
    }
}

/// Three independent scalars, the shape the API uses for positions and rotations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3Fields {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Vec3Fields {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Vec3Fields> for Vec3 {
    fn from(v: Vec3Fields) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl Vec3Fields {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Body of a create-instance call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateInstance {
    pub asset_id: AssetId,
    pub position: Vec3Fields,
    /// Euler angles in radians, XYZ order.
    pub rotation: Vec3Fields,
    pub scale: f32,
}

impl CreateInstance {
    /// Server-side shape validation.
    pub fn validate(&self) -> Result<(), PersistError> {
        if !self.position.is_finite() || !self.rotation.is_finite() {
            return Err(PersistError::InvalidRequest("non-finite transform".into()));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(PersistError::InvalidRequest(format!("scale {} must be positive", self.scale)));
        }
        Ok(())
    }
}

/// A stored placement of an asset in the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: InstanceId,
    pub asset_id: AssetId,
    pub position: Vec3Fields,
    pub rotation: Vec3Fields,
    pub scale: f32,
}

impl InstanceRecord {
    pub fn transform(&self) -> Transform {
        let r = self.rotation;
        Transform {
            translation: self.position.into(),
            rotation: Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z),
            scale: Vec3::splat(self.scale),
        }
    }
}

/// An instance joined with the asset it shows.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedInstance {
    pub record: InstanceRecord,
    pub asset: AssetRecord,
}

/// Everything the editor reads from the server in one fetch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub assets: Vec<AssetRecord>,
    pub instances: Vec<InstanceRecord>,
}

impl CatalogSnapshot {
    /// Join instances to their assets. Instances whose asset is missing are
    /// dropped and logged, never rendered.
    pub fn resolve(&self) -> Vec<PlacedInstance> {
        let mut missing = Vec::new();
        let placed = self
            .instances
            .iter()
            .filter_map(|record| match self.assets.iter().find(|a| a.id == record.asset_id) {
                Some(asset) => Some(PlacedInstance { record: record.clone(), asset: asset.clone() }),
                None => {
                    missing.push(record.id);
                    None
                }
            })
            .collect();

        if !missing.is_empty() {
            warn!("Skipping {} instance(s) without asset data: {:?}", missing.len(), missing);
        }
        placed
    }
}

/// Client-side read model for the sidebar and placed-artwork rendering.
#[derive(Resource, Debug, Default)]
pub struct InstanceCatalog {
    pub assets: Vec<AssetRecord>,
    pub placed: Vec<PlacedInstance>,
    /// Refresh counter value this data was fetched for.
    pub version: u64,
}

impl InstanceCatalog {
    pub fn apply(&mut self, snapshot: &CatalogSnapshot, version: u64) {
        self.assets = snapshot.assets.clone();
        self.placed = snapshot.resolve();
        self.version = version;
    }

    pub fn asset(&self, id: AssetId) -> Option<&AssetRecord> {
        self.assets.iter().find(|a| a.id == id)
    }
}

/// The Asset Persistence API, scoped by bearer credential.
pub trait InstancePersistence {
    fn create_instance(&mut self, bearer: &str, request: CreateInstance) -> Result<InstanceRecord, PersistError>;

    fn snapshot(&self, bearer: &str) -> Result<CatalogSnapshot, PersistError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: AssetId) -> AssetRecord {
        AssetRecord { id, title: None, url: format!("/uploads/{id}.jpg"), width_cm: Some(60.0), height_cm: None }
    }

    fn instance(id: InstanceId, asset_id: AssetId) -> InstanceRecord {
        InstanceRecord {
            id,
            asset_id,
            position: Vec3Fields { x: 1.0, y: 1.5, z: 2.01 },
            rotation: Vec3Fields::default(),
            scale: 1.0,
        }
    }

    #[test]
    fn instances_without_assets_are_filtered() {
        let snapshot = CatalogSnapshot {
            assets: vec![asset(1)],
            instances: vec![instance(10, 1), instance(11, 99), instance(12, 1)],
        };
        let placed = snapshot.resolve();
        let ids: Vec<_> = placed.iter().map(|p| p.record.id).collect();
        assert_eq!(ids, vec![10, 12]);
    }

    #[test]
    fn create_instance_rejects_bad_scale() {
        let mut req = CreateInstance {
            asset_id: 1,
            position: Vec3Fields::default(),
            rotation: Vec3Fields::default(),
            scale: 0.0,
        };
        assert!(matches!(req.validate(), Err(PersistError::InvalidRequest(_))));
        req.scale = 0.75;
        assert!(req.validate().is_ok());
        req.position.x = f32::NAN;
        assert!(req.validate().is_err());
    }

    #[test]
    fn untitled_assets_get_a_fallback_name() {
        assert_eq!(asset(3).display_name(), "Asset #3");
    }
}
