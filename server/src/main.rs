//! Gallery Server - Headless Bevy app serving the asset persistence API
//!
//! Updated for Lightyear 0.25 / Bevy 0.17

mod auth;
mod persistence;
mod systems;

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use lightyear::prelude::server::*;
use lightyear::prelude::*;
use shared::{protocol::*, ProtocolPlugin, ServerConfig, PRIVATE_KEY, PROTOCOL_ID, get_server_bind_addr};
use std::net::SocketAddr;

use auth::CuratorTokens;
use persistence::GalleryStorage;

/// Marker for our server entity
#[derive(Component)]
struct GalleryServer;

/// Spawn the server entity with all required networking components
fn spawn_server(mut commands: Commands, config: Res<ServerConfig>) {
    let bind_addr = get_server_bind_addr();
    let server_addr: SocketAddr = match format!("{}:{}", bind_addr, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid server bind address {}:{}: {}", bind_addr, config.port, e);
            return;
        }
    };

    info!("Spawning server entity, binding to {:?}", server_addr);

    commands.spawn((
        GalleryServer,
        Server::default(),
        ServerUdpIo::default(),
        LocalAddr(server_addr),
        NetcodeServer::new(NetcodeConfig {
            protocol_id: PROTOCOL_ID,
            private_key: PRIVATE_KEY,
            ..default()
        }),
    ));
}

/// Start the server after it's spawned
fn start_server(
    mut commands: Commands,
    server_query: Query<Entity, (With<GalleryServer>, Without<Started>, Without<Starting>)>,
) {
    for server_entity in server_query.iter() {
        info!("Starting server...");
        commands.trigger(Start { entity: server_entity });
    }
}

/// Check if server is started (run condition)
fn server_is_started(server_query: Query<(), (With<GalleryServer>, With<Started>)>) -> bool {
    !server_query.is_empty()
}

fn main() {
    let mut app = App::new();

    // Headless plugins (no rendering); run the loop at the network tick so
    // message buffers are read before they are cleared.
    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(tick_duration())));
    app.add_plugins(bevy::log::LogPlugin::default());
    app.add_plugins(bevy::state::app::StatesPlugin);

    let config = ServerConfig::load();
    let storage = match GalleryStorage::open(
        config.storage_dir.clone(),
        CuratorTokens::new(&config.curator_tokens),
        &config.seed_assets,
    ) {
        Ok(storage) => storage,
        Err(e) => {
            error!("Cannot open gallery storage in {:?}: {}", config.storage_dir, e);
            std::process::exit(1);
        }
    };
    let port = config.port;
    app.insert_resource(config);
    app.insert_resource(storage);

    app.add_plugins(ServerPlugins {
        tick_duration: tick_duration(),
    });
    app.add_plugins(ProtocolPlugin);

    app.add_systems(Startup, spawn_server);
    app.add_systems(Update, start_server);
    app.add_observer(systems::handle_disconnections);

    app.add_systems(
        FixedUpdate,
        (
            systems::handle_connections,
            systems::handle_create_instance_requests,
            systems::handle_catalog_requests,
        )
            .chain()
            .run_if(server_is_started),
    );

    info!("Starting gallery server on port {}", port);
    app.run();
}
