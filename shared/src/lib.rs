//! Shared code between the exhibit editor and the gallery server
//!
//! Wall-placement targeting, the commit protocol, camera mode reconciliation
//! and the editor store are all plain Rust over `bevy::math` types, so they are
//! tested here without a running app.

pub mod camera_modes;
pub mod catalog;
pub mod commit;
pub mod config;
pub mod error;
pub mod geometry;
pub mod placement;
pub mod protocol;
pub mod store;
pub mod walk;

pub use camera_modes::{
    CameraCalibration, CameraModeController, FirstPersonCameraState, OrbitCameraState, ViewMode,
};
pub use catalog::{
    AssetId, AssetRecord, CatalogSnapshot, CreateInstance, InstanceCatalog, InstanceId, InstancePersistence,
    InstanceRecord, PlacedInstance, Vec3Fields,
};
pub use commit::{begin_commit, finish_commit, CommitOutcome, CommitRejection, CommitTicket};
pub use config::{CuratorToken, EditorConfig, ServerConfig};
pub use error::{ConfigError, PersistError};
pub use geometry::{
    CameraView, RoomGeometry, RoomPanel, SceneRaycast, SurfaceHit, SurfaceTag, ViewProjection, VisibleRoom,
};
pub use placement::{DraggedAsset, PlacementCandidate, PlacementEngine, PlacementSettings};
pub use protocol::*;
pub use store::{CommitState, EditorStore, Notice, NoticeLevel, SessionId, SessionOrigin, StoreChange};
pub use walk::{WalkInput, EYE_HEIGHT, MOUSE_SENSITIVITY, WALK_SPEED};
