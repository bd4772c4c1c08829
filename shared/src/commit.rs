//! Placement commit protocol
//!
//! Turning the current candidate into a persisted instance is split in two so
//! the transport stays outside this module:
//! 1. [`begin_commit`] checks the guards and produces a request ticket
//! 2. the host sends the request and, whenever the response arrives, feeds it
//!    back through [`finish_commit`]
//!
//! While a request is in flight the session keeps running; targeting may
//! overwrite the candidate and the user may cancel. A response for a session
//! that is gone only ever triggers a refresh or a sign-out.

use bevy::prelude::*;

use crate::catalog::{CreateInstance, InstanceRecord};
use crate::error::PersistError;
use crate::store::{CommitState, EditorStore, Notice, SessionId};

/// Why a confirm event did not produce a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitRejection {
    /// Pointer lock or drag context not engaged; ignored silently.
    NotEngaged,
    NoSession,
    /// A request for this session is already outstanding.
    InFlight,
    NoCandidate,
    InvalidTarget,
}

/// A persist request bound to the session that issued it.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitTicket {
    pub session: SessionId,
    pub request: CreateInstance,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Current session persisted and closed.
    Committed(InstanceRecord),
    /// Persisted after the session had already ended.
    LateSuccess(InstanceRecord),
    /// Current session kept for retry.
    Failed(PersistError),
    SignedOut,
    /// Failure for a session that no longer exists.
    Ignored,
}

/// Validate a confirm event and mark the session as in flight.
///
/// `engaged` is the host's answer to "was this click meant for the viewport":
/// pointer lock held in first person, pointer over the canvas otherwise.
pub fn begin_commit(store: &mut EditorStore, engaged: bool) -> Result<CommitTicket, CommitRejection> {
    if !engaged {
        return Err(CommitRejection::NotEngaged);
    }
    let Some(session) = store.session() else {
        return Err(CommitRejection::NoSession);
    };
    if session.commit == CommitState::InFlight {
        return Err(CommitRejection::InFlight);
    }

    let Some(candidate) = session.candidate else {
        store.push_notice(Notice::warning("Point at a wall to place the artwork"));
        return Err(CommitRejection::NoCandidate);
    };
    if !candidate.valid {
        debug!("Rejected placement on non-vertical surface {:?}", candidate.surface.normal);
        store.push_notice(Notice::warning("Invalid target"));
        return Err(CommitRejection::InvalidTarget);
    }

    let ticket = CommitTicket {
        session: session.id,
        request: CreateInstance {
            asset_id: session.asset.asset_id,
            position: candidate.position.into(),
            rotation: candidate.euler().into(),
            scale: candidate.scale,
        },
    };
    store.set_commit_state(CommitState::InFlight);
    info!("Committing asset {} for session {}", ticket.request.asset_id, ticket.session);
    Ok(ticket)
}

/// Apply the persistence result for `session`.
pub fn finish_commit(store: &mut EditorStore, session: SessionId, result: Result<InstanceRecord, PersistError>) -> CommitOutcome {
    let current = store.session().is_some_and(|s| s.id == session);

    match result {
        Ok(record) => {
            store.bump_instances_version();
            if current {
                info!("Placed instance {} (asset {})", record.id, record.asset_id);
                store.end_session(true);
                CommitOutcome::Committed(record)
            } else {
                info!("Instance {} persisted after its session ended", record.id);
                CommitOutcome::LateSuccess(record)
            }
        }
        Err(err) if err.is_auth_failure() => {
            store.sign_out();
            store.push_notice(Notice::error("Session expired, please sign in again"));
            CommitOutcome::SignedOut
        }
        Err(err) if current => {
            warn!("Placement failed: {}", err);
            store.set_commit_state(CommitState::Idle);
            store.push_notice(Notice::error(format!("Could not place artwork: {err}")));
            CommitOutcome::Failed(err)
        }
        Err(err) => {
            debug!("Dropping failure for ended session {}: {}", session, err);
            CommitOutcome::Ignored
        }
    }
}
