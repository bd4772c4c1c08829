//! Camera mode controller
//!
//! Three interchangeable views share one store:
//! - `Orthographic` and `Perspective` are both orbit cameras around a shared
//!   target; switching between them maps distance to zoom through `zoom = K / d`
//! - `FirstPerson` is a free walking camera that resumes where it was left
//!
//! The controller owns the live rig for whichever mode is active and is the
//! only writer of camera fields in [`EditorStore`]. Orbit state is written back
//! every tick; the first-person pose only when leaving first person.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

use crate::geometry::{CameraView, RoomGeometry, ViewProjection};
use crate::store::EditorStore;
use crate::walk::{step_walker, WalkInput};

/// Vertical FOV of the orbit perspective camera, degrees.
pub const ORBIT_FOV_DEGREES: f32 = 60.0;
/// Vertical FOV of the first-person camera, degrees.
pub const FIRST_PERSON_FOV_DEGREES: f32 = 75.0;

/// Keeps the orbit camera off the poles.
const POLAR_MARGIN: f32 = 0.01;
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;
/// Per-notch factors for wheel input.
const DOLLY_STEP: f32 = 0.95;
const ZOOM_STEP: f32 = 1.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ViewMode {
    Orthographic,
    #[default]
    Perspective,
    FirstPerson,
}

impl ViewMode {
    pub fn is_orbit(self) -> bool {
        matches!(self, ViewMode::Orthographic | ViewMode::Perspective)
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Orthographic => "Orthographic",
            ViewMode::Perspective => "Perspective",
            ViewMode::FirstPerson => "First Person",
        }
    }
}

/// Shared state of both orbit cameras.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCameraState {
    pub position: Vec3,
    pub target: Vec3,
    /// Only meaningful for the orthographic camera.
    pub zoom: f32,
}

impl Default for OrbitCameraState {
    fn default() -> Self {
        Self {
            position: Vec3::new(20.0, 20.0, 20.0),
            target: Vec3::ZERO,
            zoom: 40.0,
        }
    }
}

impl OrbitCameraState {
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.target.is_finite() && self.zoom.is_finite() && self.zoom > 0.0
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// Camera rotation looking at the target with +Y up.
    pub fn rotation(&self) -> Quat {
        Transform::from_translation(self.position).looking_at(self.target, Vec3::Y).rotation
    }
}

/// Saved first-person pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstPersonCameraState {
    pub position: Vec3,
    /// Euler angles (pitch, yaw, roll), applied yaw first.
    pub rotation: Vec3,
}

impl Default for FirstPersonCameraState {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.7, 5.0),
            rotation: Vec3::ZERO,
        }
    }
}

impl FirstPersonCameraState {
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.rotation.y, self.rotation.x, self.rotation.z)
    }
}

/// Distance/zoom calibration for the orbit cameras.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraCalibration {
    /// `zoom = K / distance`. Empirical; tuned for a room roughly 10 units across.
    pub zoom_distance_k: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Zoom below this is treated as this when converting back to distance.
    pub zoom_floor: f32,
}

impl Default for CameraCalibration {
    fn default() -> Self {
        Self {
            zoom_distance_k: 40.0,
            min_distance: 1.0,
            max_distance: 50.0,
            zoom_floor: 0.1,
        }
    }
}

impl CameraCalibration {
    pub fn min_zoom(&self) -> f32 {
        self.zoom_distance_k / self.max_distance
    }

    pub fn max_zoom(&self) -> f32 {
        self.zoom_distance_k / self.min_distance
    }

    pub fn clamp_distance(&self, d: f32) -> f32 {
        d.clamp(self.min_distance, self.max_distance)
    }

    pub fn clamp_zoom(&self, z: f32) -> f32 {
        z.clamp(self.min_zoom(), self.max_zoom())
    }

    /// `None` for a distance that cannot be inverted.
    pub fn zoom_for_distance(&self, distance: f32) -> Option<f32> {
        if !distance.is_finite() || distance <= 0.0 {
            return None;
        }
        Some(self.clamp_zoom(self.zoom_distance_k / distance))
    }

    pub fn distance_for_zoom(&self, zoom: f32) -> f32 {
        self.clamp_distance(self.zoom_distance_k / zoom.max(self.zoom_floor))
    }
}

/// Carry an orbit state from one orbit projection to the other.
///
/// Returns the input unchanged when the mapping would degenerate.
pub fn reconcile_orbit(state: OrbitCameraState, from: ViewMode, to: ViewMode, cal: &CameraCalibration) -> OrbitCameraState {
    match (from, to) {
        (ViewMode::Perspective, ViewMode::Orthographic) => {
            let Some(zoom) = cal.zoom_for_distance(state.distance()) else {
                warn!("Cannot derive zoom from orbit distance {}, keeping zoom {}", state.distance(), state.zoom);
                return state;
            };
            OrbitCameraState { zoom, ..state }
        }
        (ViewMode::Orthographic, ViewMode::Perspective) => {
            let dir = (state.position - state.target).normalize_or_zero();
            if dir == Vec3::ZERO {
                warn!("Orbit camera sits on its target, keeping previous position");
                return state;
            }
            let next = OrbitCameraState {
                position: state.target + dir * cal.distance_for_zoom(state.zoom),
                ..state
            };
            if next.is_finite() { next } else { state }
        }
        _ => state,
    }
}

/// Owns the live camera rigs and all mode transitions.
#[derive(Resource, Debug, Clone)]
pub struct CameraModeController {
    calibration: CameraCalibration,
    orbit: OrbitCameraState,
    first_person: FirstPersonCameraState,
    /// Projection the orbit rig was last shown with.
    last_orbit: ViewMode,
}

impl CameraModeController {
    pub fn new(calibration: CameraCalibration, store: &EditorStore) -> Self {
        let mode = store.view_mode();
        Self {
            calibration,
            orbit: store.orbit_camera(),
            first_person: store.first_person_camera(),
            last_orbit: if mode.is_orbit() { mode } else { ViewMode::Perspective },
        }
    }

    pub fn calibration(&self) -> &CameraCalibration {
        &self.calibration
    }

    pub fn orbit(&self) -> OrbitCameraState {
        self.orbit
    }

    pub fn first_person(&self) -> FirstPersonCameraState {
        self.first_person
    }

    /// Switch to `target`. Returns `false` (and touches nothing) if already there
    /// or if a read-only store asks to leave first person.
    pub fn switch_mode(&mut self, store: &mut EditorStore, target: ViewMode) -> bool {
        let current = store.view_mode();
        if current == target {
            return false;
        }
        if store.is_read_only() && target != ViewMode::FirstPerson {
            debug!("Viewer stays in first person");
            return false;
        }

        if current == ViewMode::FirstPerson {
            if self.first_person.is_finite() {
                store.save_first_person(self.first_person);
            } else {
                warn!("First-person pose went non-finite, keeping last saved pose");
            }
        }

        match target {
            ViewMode::Orthographic | ViewMode::Perspective => {
                let (source, from) = if current.is_orbit() {
                    (self.orbit, current)
                } else {
                    (store.orbit_camera(), self.last_orbit)
                };
                let next = reconcile_orbit(source, from, target, &self.calibration);
                if next.is_finite() {
                    self.orbit = next;
                    store.set_orbit_camera(next);
                } else {
                    warn!("Orbit camera state went non-finite, restoring last good state");
                    self.orbit = store.orbit_camera();
                }
                self.last_orbit = target;
            }
            ViewMode::FirstPerson => {
                self.first_person = store.first_person_camera();
            }
        }

        store.set_view_mode(target);
        info!("Camera mode {:?} -> {:?}", current, target);
        true
    }

    /// Per-frame sync of the live rig.
    pub fn tick(&mut self, store: &mut EditorStore) {
        match store.view_mode() {
            ViewMode::Orthographic | ViewMode::Perspective => {
                if self.orbit.is_finite() {
                    store.set_orbit_camera(self.orbit);
                } else {
                    warn!("Orbit camera state went non-finite, restoring last good state");
                    self.orbit = store.orbit_camera();
                }
            }
            ViewMode::FirstPerson => {
                if !self.first_person.is_finite() {
                    warn!("First-person pose went non-finite, restoring saved pose");
                    self.first_person = store.first_person_camera();
                }
            }
        }
    }

    // --- Orbit input ---

    /// Rotate around the target by `delta` radians (azimuth, polar).
    pub fn orbit_rotate(&mut self, store: &EditorStore, delta: Vec2) {
        if !store.view_mode().is_orbit() {
            return;
        }
        let offset = self.orbit.position - self.orbit.target;
        let radius = offset.length();
        if radius <= f32::EPSILON || !delta.is_finite() {
            return;
        }

        let azimuth = offset.x.atan2(offset.z) - delta.x;
        let polar = ((offset.y / radius).clamp(-1.0, 1.0).acos() - delta.y).clamp(POLAR_MARGIN, PI - POLAR_MARGIN);
        let next = Vec3::new(polar.sin() * azimuth.sin(), polar.cos(), polar.sin() * azimuth.cos()) * radius;
        self.orbit.position = self.orbit.target + next;
    }

    /// Pan target and camera together by a pointer delta in pixels.
    pub fn orbit_pan(&mut self, store: &EditorStore, delta_px: Vec2, viewport: Vec2) {
        let mode = store.view_mode();
        if !mode.is_orbit() || viewport.y <= 0.0 || !delta_px.is_finite() {
            return;
        }
        let units_per_px = match mode {
            ViewMode::Orthographic => 1.0 / self.orbit.zoom.max(self.calibration.zoom_floor),
            _ => 2.0 * self.orbit.distance() * (ORBIT_FOV_DEGREES.to_radians() * 0.5).tan() / viewport.y,
        };
        let rot = self.orbit.rotation();
        let shift = (rot * Vec3::NEG_X * delta_px.x + rot * Vec3::Y * delta_px.y) * units_per_px;
        self.orbit.position += shift;
        self.orbit.target += shift;
    }

    /// Wheel input; positive `steps` moves closer / zooms in.
    pub fn orbit_dolly(&mut self, store: &EditorStore, steps: f32) {
        if !steps.is_finite() {
            return;
        }
        match store.view_mode() {
            ViewMode::Perspective => {
                let offset = self.orbit.position - self.orbit.target;
                let dir = offset.normalize_or_zero();
                if dir == Vec3::ZERO {
                    return;
                }
                let distance = self.calibration.clamp_distance(offset.length() * DOLLY_STEP.powf(steps));
                self.orbit.position = self.orbit.target + dir * distance;
            }
            ViewMode::Orthographic => {
                self.orbit.zoom = self.calibration.clamp_zoom(self.orbit.zoom * ZOOM_STEP.powf(steps));
            }
            ViewMode::FirstPerson => {}
        }
    }

    // --- First-person input ---

    /// Mouse look by `delta` radians (yaw, pitch).
    pub fn first_person_look(&mut self, store: &EditorStore, delta: Vec2) {
        if store.view_mode() != ViewMode::FirstPerson || !delta.is_finite() {
            return;
        }
        let rot = &mut self.first_person.rotation;
        rot.y -= delta.x;
        rot.x = (rot.x - delta.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn first_person_walk(&mut self, store: &EditorStore, input: &WalkInput, dt: f32, room: &RoomGeometry) {
        if store.view_mode() != ViewMode::FirstPerson || input.is_idle() {
            return;
        }
        let pose = &mut self.first_person;
        pose.position = step_walker(pose.position, pose.rotation.y, input, dt, room);
    }

    /// Pose and projection of the live camera, for rendering and picking.
    pub fn view(&self, store: &EditorStore, viewport: Vec2) -> CameraView {
        let aspect = if viewport.y > 0.0 { viewport.x / viewport.y } else { 1.0 };
        match store.view_mode() {
            ViewMode::Perspective => CameraView {
                position: self.orbit.position,
                rotation: self.orbit.rotation(),
                projection: ViewProjection::Perspective { fov_y: ORBIT_FOV_DEGREES.to_radians(), aspect },
            },
            ViewMode::Orthographic => CameraView {
                position: self.orbit.position,
                rotation: self.orbit.rotation(),
                projection: ViewProjection::Orthographic { viewport, zoom: self.orbit.zoom },
            },
            ViewMode::FirstPerson => CameraView {
                position: self.first_person.position,
                rotation: self.first_person.quat(),
                projection: ViewProjection::Perspective { fov_y: FIRST_PERSON_FOV_DEGREES.to_radians(), aspect },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreChange;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn setup() -> (EditorStore, CameraModeController) {
        let store = EditorStore::default();
        let ctl = CameraModeController::new(CameraCalibration::default(), &store);
        (store, ctl)
    }

    #[test]
    fn viewer_cannot_leave_first_person() {
        let mut store = EditorStore::viewer();
        let mut ctl = CameraModeController::new(CameraCalibration::default(), &store);
        let room = RoomGeometry::gallery();

        ctl.first_person_walk(&store, &WalkInput { forward: true, ..default() }, 0.5, &room);
        let walked = ctl.first_person();
        assert_ne!(walked, FirstPersonCameraState::default());

        assert!(!ctl.switch_mode(&mut store, ViewMode::Orthographic));
        assert!(!ctl.switch_mode(&mut store, ViewMode::Perspective));
        assert_eq!(store.view_mode(), ViewMode::FirstPerson);
        assert_eq!(ctl.first_person(), walked);
        assert!(store.drain_changes().is_empty());
    }

    #[test]
    fn zoom_distance_round_trip() {
        let cal = CameraCalibration::default();
        let steps = 50;
        for i in 0..=steps {
            let z = cal.min_zoom() + (cal.max_zoom() - cal.min_zoom()) * i as f32 / steps as f32;
            let back = cal.zoom_for_distance(cal.distance_for_zoom(z)).unwrap();
            assert_relative_eq!(back, z, max_relative = 1e-5);
        }
    }

    #[test]
    fn degenerate_distances_have_no_zoom() {
        let cal = CameraCalibration::default();
        assert!(cal.zoom_for_distance(0.0).is_none());
        assert!(cal.zoom_for_distance(f32::NAN).is_none());
        assert_eq!(cal.distance_for_zoom(0.0), cal.max_distance);
    }

    #[test]
    fn perspective_to_orthographic_sets_zoom_from_distance() {
        let (mut store, mut ctl) = setup();
        ctl.orbit.position = Vec3::new(0.0, 0.0, 10.0);
        ctl.tick(&mut store);

        assert!(ctl.switch_mode(&mut store, ViewMode::Orthographic));
        let orbit = store.orbit_camera();
        assert_relative_eq!(orbit.zoom, 4.0);
        assert_eq!(orbit.target, Vec3::ZERO);
        assert_eq!(orbit.position, Vec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn orthographic_to_perspective_moves_along_view_direction() {
        let (mut store, mut ctl) = setup();
        ctl.switch_mode(&mut store, ViewMode::Orthographic);
        ctl.orbit.zoom = 8.0;
        ctl.orbit.target = Vec3::new(1.0, 0.0, 0.0);
        ctl.orbit.position = Vec3::new(1.0, 3.0, 4.0);
        ctl.tick(&mut store);

        ctl.switch_mode(&mut store, ViewMode::Perspective);
        let orbit = store.orbit_camera();
        assert_relative_eq!(orbit.distance(), 5.0, max_relative = 1e-5);
        let dir = (orbit.position - orbit.target).normalize();
        assert_abs_diff_eq!(dir.dot(Vec3::new(0.0, 0.6, 0.8)), 1.0, epsilon = 1e-5);
        assert_eq!(orbit.target, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn zero_direction_keeps_previous_state() {
        let cal = CameraCalibration::default();
        let state = OrbitCameraState { position: Vec3::ONE, target: Vec3::ONE, zoom: 10.0 };
        assert_eq!(reconcile_orbit(state, ViewMode::Orthographic, ViewMode::Perspective, &cal), state);
        assert_eq!(reconcile_orbit(state, ViewMode::Perspective, ViewMode::Orthographic, &cal), state);
    }

    #[test]
    fn switching_to_current_mode_is_a_no_op() {
        let (mut store, mut ctl) = setup();
        store.drain_changes();
        let before = (store.orbit_camera(), store.first_person_camera());
        assert!(!ctl.switch_mode(&mut store, ViewMode::Perspective));
        assert!(store.drain_changes().is_empty());
        assert_eq!(before, (store.orbit_camera(), store.first_person_camera()));
    }

    #[test]
    fn first_person_resumes_exactly() {
        let (mut store, mut ctl) = setup();
        let room = RoomGeometry::gallery();
        ctl.switch_mode(&mut store, ViewMode::FirstPerson);
        assert_eq!(ctl.first_person(), FirstPersonCameraState::default());

        ctl.first_person_look(&store, Vec2::new(0.4, -0.2));
        ctl.first_person_walk(&store, &WalkInput { forward: true, ..default() }, 0.2, &room);
        let left_at = ctl.first_person();

        ctl.switch_mode(&mut store, ViewMode::Perspective);
        assert_eq!(store.first_person_camera(), left_at);
        for i in 0..200 {
            ctl.orbit_rotate(&store, Vec2::new(0.01, 0.003));
            ctl.orbit_dolly(&store, if i % 2 == 0 { 1.0 } else { -0.5 });
            // Ignored outside first person
            ctl.first_person_look(&store, Vec2::splat(0.1));
            ctl.tick(&mut store);
        }

        ctl.switch_mode(&mut store, ViewMode::FirstPerson);
        assert_eq!(ctl.first_person(), left_at);
    }

    #[test]
    fn orbit_state_written_every_tick() {
        let (mut store, mut ctl) = setup();
        store.drain_changes();
        ctl.orbit_dolly(&store, 3.0);
        ctl.tick(&mut store);
        assert_eq!(store.orbit_camera(), ctl.orbit());
        assert!(store.drain_changes().contains(&StoreChange::OrbitCameraUpdated));
    }

    #[test]
    fn bounds_hold_under_extreme_input() {
        let (mut store, mut ctl) = setup();
        let cal = *ctl.calibration();
        ctl.orbit_dolly(&store, 10_000.0);
        assert_relative_eq!(ctl.orbit().distance(), cal.min_distance, max_relative = 1e-4);
        ctl.orbit_dolly(&store, -10_000.0);
        assert_relative_eq!(ctl.orbit().distance(), cal.max_distance, max_relative = 1e-4);

        ctl.switch_mode(&mut store, ViewMode::Orthographic);
        ctl.orbit_dolly(&store, 10_000.0);
        assert_eq!(ctl.orbit().zoom, cal.max_zoom());
        ctl.orbit_dolly(&store, -10_000.0);
        assert_eq!(ctl.orbit().zoom, cal.min_zoom());
    }

    #[test]
    fn non_finite_orbit_is_restored_on_tick() {
        let (mut store, mut ctl) = setup();
        let good = store.orbit_camera();
        ctl.orbit.position = Vec3::NAN;
        ctl.tick(&mut store);
        assert_eq!(ctl.orbit(), good);
        assert_eq!(store.orbit_camera(), good);
    }

    #[test]
    fn non_finite_orbit_never_reaches_store_on_switch() {
        let (mut store, mut ctl) = setup();
        let good = store.orbit_camera();
        ctl.orbit.position = Vec3::NAN;

        assert!(ctl.switch_mode(&mut store, ViewMode::Orthographic));
        assert_eq!(store.orbit_camera(), good);
        ctl.tick(&mut store);
        assert!(store.orbit_camera().is_finite());
        assert!(ctl.orbit().is_finite());
        assert!(ctl.view(&store, Vec2::new(800.0, 600.0)).position.is_finite());
    }

    #[test]
    fn non_finite_first_person_pose_is_not_saved() {
        let (mut store, mut ctl) = setup();
        ctl.switch_mode(&mut store, ViewMode::FirstPerson);
        ctl.first_person.position = Vec3::NAN;
        ctl.switch_mode(&mut store, ViewMode::Perspective);
        assert_eq!(store.first_person_camera(), FirstPersonCameraState::default());
    }

    #[test]
    fn orthographic_through_first_person_to_perspective() {
        let (mut store, mut ctl) = setup();
        let cal = *ctl.calibration();
        ctl.switch_mode(&mut store, ViewMode::Orthographic);
        ctl.orbit.zoom = 8.0;
        ctl.orbit.position = Vec3::new(0.0, 6.0, 8.0);
        ctl.tick(&mut store);

        ctl.switch_mode(&mut store, ViewMode::FirstPerson);
        ctl.switch_mode(&mut store, ViewMode::Perspective);
        let orbit = store.orbit_camera();
        assert_relative_eq!(orbit.distance(), cal.zoom_distance_k / 8.0, max_relative = 1e-5);
        let dir = (orbit.position - orbit.target).normalize();
        assert_abs_diff_eq!(dir.dot(Vec3::new(0.0, 0.6, 0.8)), 1.0, epsilon = 1e-5);
        assert_eq!(orbit.target, Vec3::ZERO);
    }

    #[test]
    fn orthographic_through_first_person_keeps_zoom() {
        let (mut store, mut ctl) = setup();
        ctl.switch_mode(&mut store, ViewMode::Orthographic);
        ctl.orbit.zoom = 6.5;
        ctl.tick(&mut store);
        let saved = store.orbit_camera();

        ctl.switch_mode(&mut store, ViewMode::FirstPerson);
        ctl.switch_mode(&mut store, ViewMode::Orthographic);
        assert_eq!(store.orbit_camera(), saved);
        assert_eq!(ctl.orbit().zoom, 6.5);
    }

    #[test]
    fn rotate_keeps_radius_and_stays_off_poles() {
        let (store, mut ctl) = setup();
        let radius = ctl.orbit().distance();
        ctl.orbit_rotate(&store, Vec2::new(0.3, 10.0));
        assert_relative_eq!(ctl.orbit().distance(), radius, max_relative = 1e-4);
        assert!(ctl.orbit().rotation().is_finite());
        assert!(ctl.orbit().position.y < radius);
    }

    #[test]
    fn first_person_pitch_is_clamped() {
        let (mut store, mut ctl) = setup();
        ctl.switch_mode(&mut store, ViewMode::FirstPerson);
        ctl.first_person_look(&store, Vec2::new(0.0, -100.0));
        assert!(ctl.first_person().rotation.x <= FRAC_PI_2);
    }

    #[test]
    fn view_follows_mode() {
        let (mut store, mut ctl) = setup();
        let viewport = Vec2::new(1280.0, 720.0);
        let persp = ctl.view(&store, viewport);
        assert!(matches!(persp.projection, ViewProjection::Perspective { .. }));
        assert_eq!(persp.position, Vec3::new(20.0, 20.0, 20.0));

        ctl.switch_mode(&mut store, ViewMode::FirstPerson);
        let fp = ctl.view(&store, viewport);
        assert_eq!(fp.position, Vec3::new(0.0, 1.7, 5.0));
    }
}
