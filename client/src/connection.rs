//! Connection and cursor systems
//!
//! Networking setup, connection tracking and first-person cursor lock.

use bevy::prelude::*;
use bevy::window::{CursorGrabMode, CursorOptions, PrimaryWindow};
use lightyear::prelude::client::*;
use lightyear::prelude::*;
use shared::{
    CatalogRequest, CatalogResponse, CreateInstanceRequest, CreateInstanceResponse, EditorConfig, PRIVATE_KEY,
    PROTOCOL_ID,
};
use std::net::SocketAddr;

use crate::states::AppState;

// =============================================================================
// CONNECTION
// =============================================================================

/// Spawn the Client entity and trigger Connect
pub fn start_connection(
    mut commands: Commands,
    existing_clients: Query<Entity, With<crate::GalleryClient>>,
    config: Res<EditorConfig>,
) {
    // Only ever one client entity
    for e in existing_clients.iter() {
        commands.entity(e).despawn();
    }
    spawn_client(&mut commands, &config);
}

fn spawn_client(commands: &mut Commands, config: &EditorConfig) {
    info!("Connecting to gallery server at {}:{}...", config.server_ip, config.server_port);

    let server_addr: SocketAddr = match format!("{}:{}", config.server_ip, config.server_port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid server address {}:{}: {}", config.server_ip, config.server_port, e);
            return;
        }
    };
    let local_addr = SocketAddr::from(([0, 0, 0, 0], 0));

    let client_id = rand::random::<u64>();

    let auth = Authentication::Manual {
        server_addr,
        protocol_id: PROTOCOL_ID,
        private_key: PRIVATE_KEY,
        client_id,
    };

    let netcode = match NetcodeClient::new(auth, NetcodeConfig::default()) {
        Ok(netcode) => netcode,
        Err(e) => {
            error!("Failed to create netcode client: {:?}", e);
            return;
        }
    };

    let client_entity = commands
        .spawn((
            crate::GalleryClient,
            Client::default(),
            UdpIo::default(),
            LocalAddr(local_addr),
            PeerAddr(server_addr),
            netcode,
            // Client -> Server
            MessageSender::<CreateInstanceRequest>::default(),
            MessageSender::<CatalogRequest>::default(),
            // Server -> Client
            MessageReceiver::<CreateInstanceResponse>::default(),
            MessageReceiver::<CatalogResponse>::default(),
        ))
        .id();

    commands.trigger(Connect { entity: client_entity });
    info!("Client entity spawned, client_id: {}", client_id);
}

/// Follow connection status of the client entity
pub fn check_connection(
    state: Res<State<AppState>>,
    mut next_state: ResMut<NextState<AppState>>,
    new_connections: Query<Entity, (With<crate::GalleryClient>, Added<Connected>)>,
    new_disconnections: Query<Entity, (With<crate::GalleryClient>, Added<Disconnected>)>,
) {
    for _entity in new_connections.iter() {
        info!("Connected to gallery server");
        if *state.get() == AppState::Connecting {
            next_state.set(AppState::Editing);
        }
    }

    for _entity in new_disconnections.iter() {
        warn!("Connection failed or lost, retrying");
        if *state.get() == AppState::Editing {
            next_state.set(AppState::Connecting);
        }
    }
}

/// Seconds between reconnect attempts
const RETRY_SECONDS: f32 = 2.0;

/// Replace a disconnected client entity with a fresh one every few seconds
pub fn retry_connection(
    mut commands: Commands,
    time: Res<Time>,
    mut retry: Local<Option<Timer>>,
    disconnected: Query<Entity, (With<crate::GalleryClient>, With<Disconnected>)>,
    config: Res<EditorConfig>,
) {
    if disconnected.is_empty() {
        *retry = None;
        return;
    }
    let timer = retry.get_or_insert_with(|| Timer::from_seconds(RETRY_SECONDS, TimerMode::Once));
    if timer.tick(time.delta()).just_finished() {
        *retry = None;
        for e in disconnected.iter() {
            commands.entity(e).despawn();
        }
        spawn_client(&mut commands, &config);
    }
}

// =============================================================================
// CURSOR
// =============================================================================

/// Whether the primary window currently holds pointer lock
pub fn cursor_locked(
    windows: &Query<Entity, With<PrimaryWindow>>,
    cursor_opts: &Query<&mut CursorOptions>,
) -> bool {
    windows
        .single()
        .ok()
        .and_then(|w| cursor_opts.get(w).ok())
        .is_some_and(|c| c.grab_mode == CursorGrabMode::Locked)
}

pub fn set_cursor_lock(
    windows: &Query<Entity, With<PrimaryWindow>>,
    cursor_opts: &mut Query<&mut CursorOptions>,
    locked: bool,
) {
    let Ok(window_entity) = windows.single() else {
        return;
    };
    if let Ok(mut cursor) = cursor_opts.get_mut(window_entity) {
        cursor.grab_mode = if locked { CursorGrabMode::Locked } else { CursorGrabMode::None };
        cursor.visible = !locked;
    }
}
