//! Lightyear network protocol definition
//!
//! The persistence API runs as request/response message pairs on one ordered
//! reliable channel. Responses echo the request id so the editor can match them
//! to the placement session that issued them.

use bevy::prelude::*;
use lightyear::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::catalog::{CatalogSnapshot, CreateInstance, InstanceRecord};
use crate::error::PersistError;

pub type RequestId = u64;

// --- Messages ---

/// Client -> Server: persist a new instance.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct CreateInstanceRequest {
    pub request_id: RequestId,
    /// Bearer credential, with or without the `Bearer ` prefix.
    pub bearer: String,
    pub instance: CreateInstance,
}

/// Server -> Client
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct CreateInstanceResponse {
    pub request_id: RequestId,
    pub result: Result<InstanceRecord, PersistError>,
}

/// Client -> Server: fetch assets and the curator's placed instances.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct CatalogRequest {
    pub request_id: RequestId,
    pub bearer: String,
}

/// Server -> Client
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct CatalogResponse {
    pub request_id: RequestId,
    pub result: Result<CatalogSnapshot, PersistError>,
}

// --- Channels ---

/// Reliable channel for every API message
pub struct ReliableChannel;

// --- Protocol Plugin ---

pub struct ProtocolPlugin;

impl Plugin for ProtocolPlugin {
    fn build(&self, app: &mut App) {
        // Client -> Server
        app.register_message::<CreateInstanceRequest>()
            .add_direction(NetworkDirection::ClientToServer);
        app.register_message::<CatalogRequest>()
            .add_direction(NetworkDirection::ClientToServer);

        // Server -> Client
        app.register_message::<CreateInstanceResponse>()
            .add_direction(NetworkDirection::ServerToClient);
        app.register_message::<CatalogResponse>()
            .add_direction(NetworkDirection::ServerToClient);

        app.add_channel::<ReliableChannel>(ChannelSettings {
            mode: ChannelMode::OrderedReliable(ReliableSettings::default()),
            ..default()
        })
        .add_direction(NetworkDirection::Bidirectional);
    }
}

// --- Network Configuration ---

pub const SERVER_PORT: u16 = 5000;
pub const SERVER_ADDR: &str = "127.0.0.1";
pub const PROTOCOL_ID: u64 = 0x4558_4849_4249_5431;

/// Server bind address
pub fn get_server_bind_addr() -> &'static str {
    "0.0.0.0"
}

/// Shared private key for local development
pub const PRIVATE_KEY: [u8; 32] = [
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
    0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f, 0x10,
    0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18,
    0x19, 0x1a, 0x1b, 0x1c, 0x1d, 0x1e, 0x1f, 0x20,
];

/// Server tick rate; the editor only exchanges requests so this can stay low.
pub const TICK_HZ: f64 = 30.0;

/// Tick duration for lightyear plugins
pub fn tick_duration() -> Duration {
    Duration::from_secs_f64(1.0 / TICK_HZ)
}
