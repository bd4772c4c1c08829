//! Persistence API client
//!
//! Sends commit tickets and catalog fetches over the reliable channel and
//! routes responses back into the store. Every outstanding request is failed
//! with a network error if the link drops, so no session waits forever.

use bevy::prelude::*;
use lightyear::prelude::*;
use shared::{
    finish_commit, CatalogRequest, CatalogResponse, CommitTicket, CreateInstanceRequest, CreateInstanceResponse,
    EditorConfig, EditorStore, InstanceCatalog, Notice, PersistError, ReliableChannel, RequestId, SessionId,
};
use std::collections::HashMap;

use crate::GalleryClient;

/// A commit accepted locally, waiting to be sent.
#[derive(Message, Debug, Clone)]
pub struct CommitIssued(pub CommitTicket);

/// Bearer credential; cleared on sign-out.
#[derive(Resource, Debug, Clone, Default)]
pub struct Credential(pub Option<String>);

#[derive(Resource, Debug, Default)]
pub struct PendingRequests {
    next_id: RequestId,
    commits: HashMap<RequestId, SessionId>,
    /// Outstanding catalog fetch and the refresh counter it was issued for.
    catalog: Option<(RequestId, u64)>,
    /// Refresh counter value of the last successful fetch.
    fetched_version: Option<u64>,
}

impl PendingRequests {
    fn next_id(&mut self) -> RequestId {
        self.next_id += 1;
        self.next_id
    }

    /// Forget the last fetch so the catalog is requested again.
    pub fn invalidate_catalog(&mut self) {
        self.fetched_version = None;
    }
}

pub fn setup_credential(mut commands: Commands, config: Res<EditorConfig>) {
    let token = config.bearer_token.trim();
    commands.insert_resource(Credential((!token.is_empty()).then(|| token.to_string())));
}

/// Send tickets produced by the placement systems
pub fn send_commit_requests(
    mut tickets: MessageReader<CommitIssued>,
    mut store: ResMut<EditorStore>,
    mut pending: ResMut<PendingRequests>,
    credential: Res<Credential>,
    mut client: Query<&mut MessageSender<CreateInstanceRequest>, (With<GalleryClient>, With<Connected>)>,
) {
    for CommitIssued(ticket) in tickets.read() {
        let Some(bearer) = credential.0.clone() else {
            finish_commit(&mut store, ticket.session, Err(PersistError::Unauthorized));
            continue;
        };
        let Ok(mut sender) = client.single_mut() else {
            finish_commit(&mut store, ticket.session, Err(PersistError::Network("not connected".into())));
            continue;
        };

        let request_id = pending.next_id();
        pending.commits.insert(request_id, ticket.session);
        sender.send::<ReliableChannel>(CreateInstanceRequest {
            request_id,
            bearer,
            instance: ticket.request.clone(),
        });
    }
}

pub fn receive_commit_responses(
    mut store: ResMut<EditorStore>,
    mut pending: ResMut<PendingRequests>,
    mut client: Query<&mut MessageReceiver<CreateInstanceResponse>, With<GalleryClient>>,
) {
    for mut receiver in client.iter_mut() {
        for response in receiver.receive() {
            let Some(session) = pending.commits.remove(&response.request_id) else {
                warn!("Response for unknown request {}", response.request_id);
                continue;
            };
            finish_commit(&mut store, session, response.result);
        }
    }
}

/// Fetch the catalog whenever the refresh counter moved past what we have
pub fn request_catalog(
    store: Res<EditorStore>,
    mut pending: ResMut<PendingRequests>,
    credential: Res<Credential>,
    mut client: Query<&mut MessageSender<CatalogRequest>, (With<GalleryClient>, With<Connected>)>,
) {
    let version = store.instances_version();
    if pending.catalog.is_some() || pending.fetched_version == Some(version) || !store.is_signed_in() {
        return;
    }
    let Some(bearer) = credential.0.clone() else {
        return;
    };
    let Ok(mut sender) = client.single_mut() else {
        return;
    };

    let request_id = pending.next_id();
    pending.catalog = Some((request_id, version));
    debug!("Fetching catalog for refresh counter {}", version);
    sender.send::<ReliableChannel>(CatalogRequest { request_id, bearer });
}

pub fn receive_catalog_responses(
    mut store: ResMut<EditorStore>,
    mut pending: ResMut<PendingRequests>,
    mut catalog: ResMut<InstanceCatalog>,
    mut client: Query<&mut MessageReceiver<CatalogResponse>, With<GalleryClient>>,
) {
    for mut receiver in client.iter_mut() {
        for response in receiver.receive() {
            let Some((request_id, version)) = pending.catalog else {
                continue;
            };
            if request_id != response.request_id {
                continue;
            }
            pending.catalog = None;

            match response.result {
                Ok(snapshot) => {
                    catalog.apply(&snapshot, version);
                    pending.fetched_version = Some(version);
                    info!(
                        "Catalog refreshed: {} asset(s), {} placed artwork(s)",
                        catalog.assets.len(),
                        catalog.placed.len()
                    );
                }
                Err(e) if e.is_auth_failure() => {
                    store.sign_out();
                    store.push_notice(Notice::error("Session expired, please sign in again"));
                }
                Err(e) => {
                    warn!("Catalog fetch failed: {}", e);
                    // Counts as fetched so a broken server is not hammered every frame
                    pending.fetched_version = Some(version);
                    store.push_notice(Notice::error(format!("Could not load artworks: {e}")));
                }
            }
        }
    }
}

/// Fail everything in flight when the link drops
pub fn fail_pending_on_disconnect(
    mut store: ResMut<EditorStore>,
    mut pending: ResMut<PendingRequests>,
    lost: Query<(), (With<GalleryClient>, Added<Disconnected>)>,
) {
    if lost.is_empty() {
        return;
    }
    let commits: Vec<_> = pending.commits.drain().collect();
    for (_, session) in commits {
        finish_commit(&mut store, session, Err(PersistError::Network("connection lost".into())));
    }
    pending.catalog = None;
    pending.invalidate_catalog();
}

/// Clear the credential once the store signs out
pub fn clear_credential_on_sign_out(
    mut changes: MessageReader<crate::states::StoreChanged>,
    mut credential: ResMut<Credential>,
) {
    if changes.read().any(|c| c.0 == shared::StoreChange::SignedOut) {
        credential.0 = None;
    }
}
