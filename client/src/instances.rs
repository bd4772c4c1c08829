//! Placed artwork rendering
//!
//! Whenever a catalog fetch lands, frames newly placed artworks and drops the
//! ones the server no longer lists.

use bevy::prelude::*;
use shared::{DraggedAsset, InstanceCatalog, InstanceId, PlacedInstance, PlacementEngine};
use std::collections::HashSet;

/// Frame border around the canvas, world units
const FRAME_BORDER: f32 = 0.04;
const FRAME_DEPTH: f32 = 0.03;

#[derive(Component)]
pub struct PlacedArtwork {
    pub instance_id: shared::InstanceId,
}

/// Instances on screen the catalog dropped, and catalog instances not yet shown
fn diff_instances(
    shown: impl IntoIterator<Item = InstanceId>,
    listed: impl IntoIterator<Item = InstanceId>,
) -> (HashSet<InstanceId>, HashSet<InstanceId>) {
    let shown: HashSet<InstanceId> = shown.into_iter().collect();
    let listed: HashSet<InstanceId> = listed.into_iter().collect();
    let stale = shown.difference(&listed).copied().collect();
    let missing = listed.difference(&shown).copied().collect();
    (stale, missing)
}

/// Bring the placed artworks in line with the current catalog
pub fn sync_placed_artworks(
    mut commands: Commands,
    catalog: Res<InstanceCatalog>,
    engine: Res<PlacementEngine>,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    existing: Query<(Entity, &PlacedArtwork)>,
) {
    let (stale, missing) = diff_instances(
        existing.iter().map(|(_, artwork)| artwork.instance_id),
        catalog.placed.iter().map(|placed| placed.record.id),
    );

    for (entity, artwork) in existing.iter() {
        if stale.contains(&artwork.instance_id) {
            commands.entity(entity).despawn();
        }
    }
    if missing.is_empty() {
        return;
    }

    let frame_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.12, 0.10, 0.08),
        perceptual_roughness: 0.6,
        ..default()
    });

    for placed in catalog.placed.iter().filter(|p| missing.contains(&p.record.id)) {
        spawn_artwork(
            &mut commands,
            placed,
            &engine,
            &asset_server,
            &mut meshes,
            &mut materials,
            frame_material.clone(),
        );
    }
    debug!("Framed {} new artwork(s), removed {}", missing.len(), stale.len());
}

fn spawn_artwork(
    commands: &mut Commands,
    placed: &PlacedInstance,
    engine: &PlacementEngine,
    asset_server: &AssetServer,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    frame_material: Handle<StandardMaterial>,
) {
    let size = DraggedAsset::from_record(&placed.asset, &engine.settings).size_units(&engine.settings);

    let canvas_material = match artwork_texture_path(&placed.asset.url) {
        Some(path) => materials.add(StandardMaterial {
            base_color_texture: Some(asset_server.load(path)),
            perceptual_roughness: 0.8,
            ..default()
        }),
        None => {
            warn!("Cannot load remote image {}; drawing a blank canvas", placed.asset.url);
            materials.add(StandardMaterial {
                base_color: Color::srgb(0.85, 0.83, 0.78),
                ..default()
            })
        }
    };

    commands
        .spawn((
            PlacedArtwork { instance_id: placed.record.id },
            Name::new(placed.asset.display_name()),
            placed.record.transform(),
            Visibility::default(),
        ))
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(meshes.add(Rectangle::new(size.x, size.y))),
                MeshMaterial3d(canvas_material),
                Transform::default(),
            ));
            parent.spawn((
                Mesh3d(meshes.add(Cuboid::new(
                    size.x + 2.0 * FRAME_BORDER,
                    size.y + 2.0 * FRAME_BORDER,
                    FRAME_DEPTH,
                ))),
                MeshMaterial3d(frame_material),
                Transform::from_xyz(0.0, 0.0, -FRAME_DEPTH * 0.5 - 0.001),
            ));
        });
}

/// Asset-server path for an artwork url, or `None` for remote urls
fn artwork_texture_path(url: &str) -> Option<String> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return None;
    }
    Some(url.trim_start_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_urls_map_into_the_asset_folder() {
        assert_eq!(artwork_texture_path("/artworks/dawn.png").as_deref(), Some("artworks/dawn.png"));
        assert_eq!(artwork_texture_path("artworks/dusk.png").as_deref(), Some("artworks/dusk.png"));
    }

    #[test]
    fn only_new_instances_are_spawned() {
        let (stale, missing) = diff_instances([1, 2, 3], [2, 3, 4, 5]);
        assert_eq!(stale, HashSet::from([1]));
        assert_eq!(missing, HashSet::from([4, 5]));
    }

    #[test]
    fn unchanged_catalog_touches_nothing() {
        let (stale, missing) = diff_instances([7, 8], [8, 7]);
        assert!(stale.is_empty());
        assert!(missing.is_empty());

        let (stale, missing) = diff_instances([], [1]);
        assert!(stale.is_empty());
        assert_eq!(missing, HashSet::from([1]));
    }

    #[test]
    fn remote_urls_are_not_loaded() {
        assert_eq!(artwork_texture_path("https://cdn.example.org/a.png"), None);
        assert_eq!(artwork_texture_path("http://cdn.example.org/a.png"), None);
    }
}
