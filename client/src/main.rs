//! Exhibit Planner - gallery editor client
//!
//! Renders the room, drives the camera modes, and places artworks on the walls
//! through the gallery server. With `viewer: true` in the config it is a
//! walk-only visitor view of the same exhibition.

mod camera;
mod connection;
mod crosshair;
mod instances;
mod network;
mod placement;
mod room;
mod states;
mod ui;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::window::WindowResolution;
use lightyear::prelude::client::ClientPlugins;
use shared::{
    protocol::*, CameraModeController, EditorConfig, InstanceCatalog, PlacementEngine, ProtocolPlugin,
};
use states::AppState;

/// Marker component for our client entity
#[derive(Component)]
pub struct GalleryClient;

/// Get the asset path - checks for bundled assets first, then falls back to default
fn get_asset_path() -> String {
    // Try to find assets relative to executable (for .app bundles)
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let bundled_assets = exe_dir.join("assets");
            if bundled_assets.exists() {
                info!("Using bundled assets at: {:?}", bundled_assets);
                return bundled_assets.to_string_lossy().to_string();
            }
        }
    }
    // Fall back to default "assets" folder (for development)
    "assets".to_string()
}

fn main() {
    let asset_path = get_asset_path();

    let mut app = App::new();

    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Exhibit Planner".to_string(),
                    resolution: WindowResolution::new(1280, 720),
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                file_path: asset_path,
                ..default()
            }),
    );

    let config = EditorConfig::load();
    info!(
        "Starting {}, server at {}:{}",
        if config.viewer { "viewer" } else { "editor" },
        config.server_ip,
        config.server_port
    );

    // Editor state: one store, the controller seeded from it
    let store = config.new_store();
    let controller = CameraModeController::new(config.camera, &store);
    app.insert_resource(room::load_room(&config));
    app.insert_resource(PlacementEngine::new(config.placement));
    app.insert_resource(controller);
    app.insert_resource(store);
    let viewer = config.viewer;
    app.insert_resource(config);
    app.init_resource::<InstanceCatalog>();
    app.init_resource::<network::PendingRequests>();
    app.init_resource::<network::Credential>();

    app.add_message::<states::StoreChanged>();
    app.add_message::<network::CommitIssued>();

    app.init_state::<AppState>();

    // Lightyear client plugins
    app.add_plugins(ClientPlugins {
        tick_duration: tick_duration(),
    });
    app.add_plugins(ProtocolPlugin);

    // UI plugins
    if viewer {
        app.add_plugins(ui::ViewerHudPlugin);
    } else {
        app.add_plugins(ui::SidebarPlugin);
    }
    app.add_plugins(ui::NoticesPlugin);
    app.add_plugins(ui::SignedOutPlugin);

    app.add_systems(
        Startup,
        (
            network::setup_credential,
            room::spawn_room,
            camera::spawn_camera,
            placement::setup_ghost,
            crosshair::spawn_crosshair,
        ),
    );

    app.add_systems(OnEnter(AppState::Connecting), connection::start_connection);

    // ORDER MATTERS: input -> targeting -> network -> store fan-out -> render.
    // Placement clicks run before first-person controls so the click that
    // takes pointer lock is never read as a commit.
    app.add_systems(
        Update,
        (
            (connection::check_connection, connection::retry_connection),
            (
                camera::handle_hotkeys,
                placement::handle_placement_buttons.run_if(in_state(AppState::Editing)),
                camera::orbit_controls,
                camera::first_person_controls,
                camera::tick_controller,
                placement::update_pointer,
                placement::run_targeting,
            )
                .chain(),
            (
                network::send_commit_requests,
                network::receive_commit_responses,
                network::fail_pending_on_disconnect,
                network::request_catalog,
                network::receive_catalog_responses,
            )
                .chain(),
            states::publish_store_changes,
            (
                network::clear_credential_on_sign_out,
                camera::sync_camera,
                placement::update_ghost,
                instances::sync_placed_artworks.run_if(resource_changed::<InstanceCatalog>),
                room::sync_traverse_visibility,
                crosshair::update_crosshair_visibility,
                ui::button_interactions,
            ),
        )
            .chain(),
    );

    app.run();
}
