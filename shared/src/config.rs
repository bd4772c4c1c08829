//! RON configuration files for the editor and the server
//!
//! Both loaders are forgiving: a missing file means defaults (logged at warn),
//! a malformed file means defaults (logged at error). Nothing here panics.

use bevy::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::camera_modes::CameraCalibration;
use crate::catalog::AssetRecord;
use crate::error::ConfigError;
use crate::placement::PlacementSettings;
use crate::protocol::{SERVER_ADDR, SERVER_PORT};
use crate::store::EditorStore;

pub const EDITOR_CONFIG_ENV: &str = "EXHIBIT_EDITOR_CONFIG";
pub const SERVER_CONFIG_ENV: &str = "EXHIBIT_SERVER_CONFIG";

/// Read and parse a RON file.
pub fn read_ron<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_ron(&text, path)
}

pub fn parse_ron<T: DeserializeOwned>(text: &str, path: &Path) -> Result<T, ConfigError> {
    ron::from_str(text).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Load `T` from `path`, falling back to `T::default()`.
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match read_ron(path) {
        Ok(value) => {
            info!("Loaded config from {}", path.display());
            value
        }
        Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            warn!("No config at {}, using defaults", path.display());
            T::default()
        }
        Err(e) => {
            error!("{}; using defaults", e);
            T::default()
        }
    }
}

/// Path from `env_var`, else `fallback` in the working directory.
pub fn config_path(env_var: &str, fallback: &str) -> PathBuf {
    std::env::var_os(env_var).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(fallback))
}

/// Editor client settings (`editor.ron`).
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub server_ip: String,
    pub server_port: u16,
    /// Curator credential sent with every request.
    pub bearer_token: String,
    /// Room description; the built-in gallery when absent.
    pub room_path: Option<PathBuf>,
    pub camera: CameraCalibration,
    pub placement: PlacementSettings,
    /// Walk-only visitor view: first person, no sidebar, no placement.
    pub viewer: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            server_ip: SERVER_ADDR.to_string(),
            server_port: SERVER_PORT,
            bearer_token: "curator-dev-token".to_string(),
            room_path: None,
            camera: CameraCalibration::default(),
            placement: PlacementSettings::default(),
            viewer: false,
        }
    }
}

impl EditorConfig {
    pub fn load() -> Self {
        load_or_default(&config_path(EDITOR_CONFIG_ENV, "editor.ron"))
    }

    /// Fresh store matching the configured role.
    pub fn new_store(&self) -> EditorStore {
        if self.viewer {
            EditorStore::viewer()
        } else {
            EditorStore::default()
        }
    }
}

/// A token the server accepts and the curator it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuratorToken {
    pub token: String,
    pub curator: String,
}

/// Gallery server settings (`server.ron`).
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub storage_dir: PathBuf,
    pub curator_tokens: Vec<CuratorToken>,
    /// Assets to create when the storage directory is empty.
    pub seed_assets: Vec<AssetRecord>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: SERVER_PORT,
            storage_dir: PathBuf::from("gallery_data"),
            curator_tokens: vec![CuratorToken {
                token: "curator-dev-token".to_string(),
                curator: "dev".to_string(),
            }],
            seed_assets: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn load() -> Self {
        load_or_default(&config_path(SERVER_CONFIG_ENV, "server.ron"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_editor_config_keeps_defaults() {
        let cfg: EditorConfig =
            parse_ron("(server_port: 6000, camera: (zoom_distance_k: 25.0))", Path::new("editor.ron")).unwrap();
        assert_eq!(cfg.server_port, 6000);
        assert_eq!(cfg.camera.zoom_distance_k, 25.0);
        assert_eq!(cfg.camera.max_distance, 50.0);
        assert_eq!(cfg.placement, PlacementSettings::default());
        assert_eq!(cfg.server_ip, SERVER_ADDR);
        assert!(!cfg.viewer);
        assert!(!cfg.new_store().is_read_only());
    }

    #[test]
    fn malformed_file_reports_path() {
        let err = parse_ron::<EditorConfig>("(server_port: \"nope\")", Path::new("editor.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == "editor.ron"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("exhibit-config-test-missing.ron");
        let cfg: ServerConfig = load_or_default(&path);
        assert_eq!(cfg, ServerConfig::default());
    }

    #[test]
    fn server_config_with_seed_assets() {
        let text = r#"(
            port: 5001,
            curator_tokens: [(token: "abc", curator: "ana")],
            seed_assets: [(id: 1, url: "/uploads/1.jpg", width_cm: Some(120.0))],
        )"#;
        let cfg: ServerConfig = parse_ron(text, Path::new("server.ron")).unwrap();
        assert_eq!(cfg.curator_tokens[0].curator, "ana");
        assert_eq!(cfg.seed_assets[0].height_cm, None);
        assert_eq!(cfg.storage_dir, PathBuf::from("gallery_data"));
    }

    #[test]
    fn sample_files_parse() {
        let editor: EditorConfig = parse_ron(include_str!("../../editor.ron"), Path::new("editor.ron")).unwrap();
        assert_eq!(editor.room_path, Some(PathBuf::from("room.ron")));
        assert_eq!(editor.camera.zoom_floor, CameraCalibration::default().zoom_floor);
        assert!(!editor.viewer);

        let viewer: EditorConfig = parse_ron(include_str!("../../viewer.ron"), Path::new("viewer.ron")).unwrap();
        assert!(viewer.viewer);
        assert!(viewer.new_store().is_read_only());

        let server: ServerConfig = parse_ron(include_str!("../../server.ron"), Path::new("server.ron")).unwrap();
        assert_eq!(server.seed_assets.len(), 3);
        assert_eq!(server.seed_assets[2].width_cm, None);

        let room: crate::geometry::RoomGeometry =
            parse_ron(include_str!("../../room.ron"), Path::new("room.ron")).unwrap();
        assert!(room.panels.iter().any(|p| p.tag() == crate::geometry::SurfaceTag::Wall));
        assert_eq!(room.panel(1).map(|p| p.tag.is_none()), Some(true));
        assert_eq!(room.panels.iter().filter(|p| p.traverse).count(), 2);
    }
}
