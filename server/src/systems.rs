//! Server-side request handling
//!
//! Updated for Lightyear 0.25

use bevy::prelude::*;
use lightyear::prelude::*;
use lightyear::prelude::server::*;

use shared::{
    CatalogRequest, CatalogResponse, CreateInstanceRequest, CreateInstanceResponse, InstancePersistence,
    ReliableChannel,
};

use crate::persistence::GalleryStorage;

/// Handle new client connections - setup message channels
pub fn handle_connections(
    mut commands: Commands,
    new_clients: Query<(Entity, &RemoteId), Added<Connected>>,
    // Filter to only get client links (not the server itself)
    client_filter: Query<(), With<ClientOf>>,
) {
    for (client_entity, remote_id) in new_clients.iter() {
        if client_filter.get(client_entity).is_err() {
            continue;
        }

        info!("Editor connected: {:?}", remote_id.0);

        commands.entity(client_entity).insert((
            // Client -> Server
            MessageReceiver::<CreateInstanceRequest>::default(),
            MessageReceiver::<CatalogRequest>::default(),
            // Server -> Client
            MessageSender::<CreateInstanceResponse>::default(),
            MessageSender::<CatalogResponse>::default(),
        ));
    }
}

/// Log editor disconnects (observer)
pub fn handle_disconnections(trigger: On<Add, Disconnected>, client_entities: Query<&RemoteId, With<ClientOf>>) {
    if let Ok(remote_id) = client_entities.get(trigger.entity) {
        info!("Editor disconnected: {:?}", remote_id.0);
    }
}

/// Persist placement requests and answer each one
pub fn handle_create_instance_requests(
    mut storage: ResMut<GalleryStorage>,
    mut client_links: Query<
        (&RemoteId, &mut MessageReceiver<CreateInstanceRequest>, &mut MessageSender<CreateInstanceResponse>),
        With<ClientOf>,
    >,
) {
    for (remote_id, mut receiver, mut sender) in client_links.iter_mut() {
        for request in receiver.receive() {
            let result = storage.create_instance(&request.bearer, request.instance);
            if let Err(e) = &result {
                warn!("Create instance from {:?} rejected: {}", remote_id.0, e);
            }
            sender.send::<ReliableChannel>(CreateInstanceResponse {
                request_id: request.request_id,
                result,
            });
        }
    }
}

/// Answer catalog fetches with the requesting curator's view
pub fn handle_catalog_requests(
    storage: Res<GalleryStorage>,
    mut client_links: Query<
        (&RemoteId, &mut MessageReceiver<CatalogRequest>, &mut MessageSender<CatalogResponse>),
        With<ClientOf>,
    >,
) {
    for (remote_id, mut receiver, mut sender) in client_links.iter_mut() {
        for request in receiver.receive() {
            let result = storage.snapshot(&request.bearer);
            match &result {
                Ok(snapshot) => debug!(
                    "Catalog for {:?}: {} asset(s), {} instance(s)",
                    remote_id.0,
                    snapshot.assets.len(),
                    snapshot.instances.len()
                ),
                Err(e) => warn!("Catalog request from {:?} rejected: {}", remote_id.0, e),
            }
            sender.send::<ReliableChannel>(CatalogResponse {
                request_id: request.request_id,
                result,
            });
        }
    }
}
