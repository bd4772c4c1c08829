//! Room loading and rendering
//!
//! The same `RoomGeometry` drives the visible meshes, placement raycasts and
//! first-person collision, so what the curator sees is what they can target.

use bevy::prelude::*;
use shared::{EditorConfig, EditorStore, RoomGeometry, SurfaceTag};

/// Marker for rendered room panels
#[derive(Component)]
pub struct RoomPanelVisual {
    pub panel_id: shared::geometry::PanelId,
}

/// Load the configured room, or the built-in gallery.
pub fn load_room(config: &EditorConfig) -> RoomGeometry {
    let Some(path) = &config.room_path else {
        info!("Using built-in gallery room");
        return RoomGeometry::gallery();
    };
    match RoomGeometry::load(path) {
        Ok(room) => {
            info!("Loaded room with {} panel(s) from {}", room.panels.len(), path.display());
            room
        }
        Err(e) => {
            error!("{}; falling back to built-in gallery", e);
            RoomGeometry::gallery()
        }
    }
}

pub fn spawn_room(
    mut commands: Commands,
    room: Res<RoomGeometry>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let wall_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.93, 0.92, 0.89),
        perceptual_roughness: 0.9,
        ..default()
    });
    let floor_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.55, 0.45, 0.35),
        perceptual_roughness: 0.7,
        ..default()
    });
    let fixture_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.35, 0.35, 0.38),
        ..default()
    });

    for panel in &room.panels {
        let size = Vec3::from_array(panel.size);
        let material = match (panel.tag(), panel.tag.is_some()) {
            (SurfaceTag::Wall, _) => wall_material.clone(),
            (SurfaceTag::Other, true) => fixture_material.clone(),
            (SurfaceTag::Other, false) => floor_material.clone(),
        };
        commands.spawn((
            RoomPanelVisual { panel_id: panel.id },
            Name::new(panel.name.clone()),
            Mesh3d(meshes.add(Cuboid::new(size.x, size.y, size.z))),
            MeshMaterial3d(material),
            panel.transform(),
        ));
    }

    // Soft gallery lighting
    commands.insert_resource(ClearColor(Color::srgb(0.16, 0.17, 0.19)));
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 400.0,
        ..default()
    });
    commands.spawn((
        DirectionalLight {
            illuminance: 6_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(6.0, 12.0, 8.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        PointLight {
            intensity: 400_000.0,
            range: 20.0,
            ..default()
        },
        Transform::from_xyz(0.0, RoomGeometry::GALLERY_HEIGHT - 0.3, 0.0),
    ));

    info!("Spawned {} room panel(s)", room.panels.len());
}

/// Hide or show traverse meshes to follow the store
pub fn sync_traverse_visibility(
    store: Res<EditorStore>,
    room: Res<RoomGeometry>,
    mut visuals: Query<(&RoomPanelVisual, &mut Visibility)>,
) {
    let wanted = if store.show_traverses() { Visibility::Inherited } else { Visibility::Hidden };
    for (visual, mut visibility) in visuals.iter_mut() {
        let is_traverse = room.panel(visual.panel_id).is_some_and(|p| p.traverse);
        if is_traverse && *visibility != wanted {
            *visibility = wanted;
        }
    }
}
