//! Editor state machine and store fan-out

use bevy::prelude::*;
use shared::{EditorStore, StoreChange};

/// Top-level editor states
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppState {
    #[default]
    Connecting,
    Editing,
    /// Credential rejected; editing disabled until the curator signs in again.
    SignedOut,
}

/// One store change, re-broadcast as a Bevy message for render/UI systems.
#[derive(Message, Debug, Clone)]
pub struct StoreChanged(pub StoreChange);

/// Drain the store once per frame after every writer has run.
pub fn publish_store_changes(
    mut store: ResMut<EditorStore>,
    mut writer: MessageWriter<StoreChanged>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    for change in store.drain_changes() {
        if change == StoreChange::SignedOut {
            next_state.set(AppState::SignedOut);
        }
        writer.write(StoreChanged(change));
    }
}
