//! Editor state store
//!
//! One explicit state object shared by the placement engine, the commit
//! protocol and the camera controller. Readers get plain accessors. Writers are
//! split by sub-tree:
//! - placement fields are written by `placement` and `commit`
//! - camera fields are written by `camera_modes`
//! - UI code only issues intents (`begin_session`, `cancel_session`, ...)
//!
//! A viewer store ([`EditorStore::viewer`]) is read-only: it starts in first
//! person, stays there, and never opens a placement session.
//!
//! Every mutation that observers care about appends a [`StoreChange`]; the host
//! drains the queue once per frame and fans it out.

use bevy::prelude::*;

use crate::camera_modes::{FirstPersonCameraState, OrbitCameraState, ViewMode};
use crate::catalog::AssetId;
use crate::placement::{DraggedAsset, PlacementCandidate};

pub type SessionId = u64;

/// How the current placement session was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    /// Picked from the sidebar, confirmed with a click in the viewport.
    Click,
    /// Dragged from the sidebar, confirmed by releasing over the viewport.
    Drag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitState {
    #[default]
    Idle,
    InFlight,
}

/// Lifetime of one placement attempt, from pick/drag start to commit or cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementSession {
    pub id: SessionId,
    pub origin: SessionOrigin,
    pub asset: DraggedAsset,
    /// Last pointer position in NDC, `None` while the pointer is off the viewport.
    pub pointer: Option<Vec2>,
    pub candidate: Option<PlacementCandidate>,
    pub commit: CommitState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Transient user-visible message (toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, text: text.into() }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, text: text.into() }
    }
}

/// Change notification emitted by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    SessionStarted { id: SessionId, asset_id: AssetId },
    SessionEnded { id: SessionId, committed: bool },
    CandidateChanged,
    ViewModeChanged { from: ViewMode, to: ViewMode },
    OrbitCameraUpdated,
    FirstPersonSaved,
    /// The refresh counter moved; placed-instance readers must re-fetch.
    InstancesInvalidated(u64),
    TraversesToggled(bool),
    Notice(Notice),
    SignedOut,
}

#[derive(Resource, Debug, Clone)]
pub struct EditorStore {
    session: Option<PlacementSession>,
    next_session_id: SessionId,
    view_mode: ViewMode,
    orbit_camera: OrbitCameraState,
    first_person_camera: FirstPersonCameraState,
    instances_version: u64,
    signed_in: bool,
    show_traverses: bool,
    read_only: bool,
    changes: Vec<StoreChange>,
}

impl Default for EditorStore {
    fn default() -> Self {
        Self {
            session: None,
            next_session_id: 1,
            view_mode: ViewMode::default(),
            orbit_camera: OrbitCameraState::default(),
            first_person_camera: FirstPersonCameraState::default(),
            instances_version: 0,
            signed_in: true,
            show_traverses: true,
            read_only: false,
            changes: Vec::new(),
        }
    }
}

impl EditorStore {
    /// Store for a visitor walking the exhibition.
    pub fn viewer() -> Self {
        Self {
            view_mode: ViewMode::FirstPerson,
            read_only: true,
            ..default()
        }
    }

    // --- Readers ---

    pub fn session(&self) -> Option<&PlacementSession> {
        self.session.as_ref()
    }

    pub fn candidate(&self) -> Option<&PlacementCandidate> {
        self.session.as_ref().and_then(|s| s.candidate.as_ref())
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn orbit_camera(&self) -> OrbitCameraState {
        self.orbit_camera
    }

    pub fn first_person_camera(&self) -> FirstPersonCameraState {
        self.first_person_camera
    }

    pub fn instances_version(&self) -> u64 {
        self.instances_version
    }

    pub fn is_signed_in(&self) -> bool {
        self.signed_in
    }

    pub fn show_traverses(&self) -> bool {
        self.show_traverses
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    // --- User intents ---

    /// Start a placement session for `asset`, replacing any session in progress.
    pub fn begin_session(&mut self, asset: DraggedAsset, origin: SessionOrigin) -> Option<SessionId> {
        if !self.signed_in || self.read_only {
            return None;
        }
        self.end_session(false);

        let id = self.next_session_id;
        self.next_session_id += 1;
        let asset_id = asset.asset_id;
        self.session = Some(PlacementSession {
            id,
            origin,
            asset,
            pointer: None,
            candidate: None,
            commit: CommitState::Idle,
        });
        info!("Placement session {} started for asset {} ({:?})", id, asset_id, origin);
        self.changes.push(StoreChange::SessionStarted { id, asset_id });
        Some(id)
    }

    /// Record the pointer position (NDC) for the next targeting tick.
    pub fn update_pointer(&mut self, ndc: Option<Vec2>) {
        if let Some(session) = self.session.as_mut() {
            session.pointer = ndc;
        }
    }

    /// Drop the current session. An in-flight request keeps running; its result
    /// will be treated as stale.
    pub fn cancel_session(&mut self) -> bool {
        let cancelled = self.end_session(false);
        if cancelled {
            info!("Placement session cancelled");
        }
        cancelled
    }

    /// The drag ended without committing; keep the session alive as click-to-place
    /// so the user can retry.
    pub fn release_drag(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.origin = SessionOrigin::Click;
        }
    }

    /// Show or hide the overhead traverses. Returns the new visibility.
    pub fn toggle_traverses(&mut self) -> bool {
        self.show_traverses = !self.show_traverses;
        info!("Traverses {}", if self.show_traverses { "shown" } else { "hidden" });
        self.changes.push(StoreChange::TraversesToggled(self.show_traverses));
        self.show_traverses
    }

    pub fn sign_in(&mut self) {
        self.signed_in = true;
    }

    /// Reset everything tied to the credential.
    pub fn sign_out(&mut self) {
        if !self.signed_in {
            return;
        }
        warn!("Credential rejected, signing out");
        self.end_session(false);
        self.signed_in = false;
        self.changes.push(StoreChange::SignedOut);
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.changes.push(StoreChange::Notice(notice));
    }

    /// Take every change recorded since the last drain.
    pub fn drain_changes(&mut self) -> Vec<StoreChange> {
        std::mem::take(&mut self.changes)
    }

    // --- Engine / controller writers ---

    pub(crate) fn set_candidate(&mut self, candidate: Option<PlacementCandidate>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.candidate != candidate {
            session.candidate = candidate;
            self.changes.push(StoreChange::CandidateChanged);
        }
    }

    pub(crate) fn set_commit_state(&mut self, state: CommitState) {
        if let Some(session) = self.session.as_mut() {
            session.commit = state;
        }
    }

    pub(crate) fn end_session(&mut self, committed: bool) -> bool {
        match self.session.take() {
            Some(session) => {
                self.changes.push(StoreChange::SessionEnded { id: session.id, committed });
                true
            }
            None => false,
        }
    }

    pub(crate) fn bump_instances_version(&mut self) {
        self.instances_version += 1;
        self.changes.push(StoreChange::InstancesInvalidated(self.instances_version));
    }

    pub(crate) fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode == mode {
            return;
        }
        let from = self.view_mode;
        self.view_mode = mode;
        self.changes.push(StoreChange::ViewModeChanged { from, to: mode });
    }

    pub(crate) fn set_orbit_camera(&mut self, state: OrbitCameraState) {
        if self.orbit_camera != state {
            self.orbit_camera = state;
            self.changes.push(StoreChange::OrbitCameraUpdated);
        }
    }

    pub(crate) fn save_first_person(&mut self, state: FirstPersonCameraState) {
        self.first_person_camera = state;
        self.changes.push(StoreChange::FirstPersonSaved);
    }
}
