//! Camera rig driven by the mode controller
//!
//! Orbit modes: middle mouse rotates, right mouse pans, wheel dollies or zooms.
//! First person: click to lock the cursor, mouse look and WASD walking.
//! Hotkeys: O orthographic, P perspective, V first person, T traverses, Escape
//! leaves first person (or cancels a placement session first). Viewers stay in
//! first person and Escape only releases the pointer.

use bevy::camera::ScalingMode;
use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::{CursorOptions, PrimaryWindow};
use shared::{
    CameraModeController, EditorStore, RoomGeometry, ViewMode, ViewProjection, WalkInput, MOUSE_SENSITIVITY,
};

use crate::connection::{cursor_locked, set_cursor_lock};
use crate::ui::pointer_over_ui;

/// Orbit rotation, radians per pixel of mouse motion
const ORBIT_ROTATE_SPEED: f32 = 0.005;
/// Pixel-based wheel deltas per notch
const PIXELS_PER_NOTCH: f32 = 100.0;

/// Marker for the editor camera
#[derive(Component)]
pub struct EditorCamera;

/// Primary window size in logical pixels
pub fn viewport_size(windows: &Query<&Window, With<PrimaryWindow>>) -> Vec2 {
    windows.single().map(|w| w.size()).unwrap_or(Vec2::new(1280.0, 720.0))
}

pub fn spawn_camera(mut commands: Commands, controller: Res<CameraModeController>, store: Res<EditorStore>) {
    let view = controller.view(&store, Vec2::new(1280.0, 720.0));
    commands.spawn((
        EditorCamera,
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection::default()),
        Transform::from_translation(view.position).with_rotation(view.rotation),
    ));
}

/// Switch the live camera mode, releasing pointer lock when leaving first person
pub fn apply_mode_switch(
    controller: &mut CameraModeController,
    store: &mut EditorStore,
    mode: ViewMode,
    windows: &Query<Entity, With<PrimaryWindow>>,
    cursor_opts: &mut Query<&mut CursorOptions>,
) {
    let leaving_first_person = store.view_mode() == ViewMode::FirstPerson;
    if controller.switch_mode(store, mode) && leaving_first_person {
        set_cursor_lock(windows, cursor_opts, false);
    }
}

pub fn handle_hotkeys(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut store: ResMut<EditorStore>,
    mut controller: ResMut<CameraModeController>,
    windows: Query<Entity, With<PrimaryWindow>>,
    mut cursor_opts: Query<&mut CursorOptions>,
) {
    if keyboard.just_pressed(KeyCode::KeyT) {
        store.toggle_traverses();
    }
    if store.is_read_only() {
        if keyboard.just_pressed(KeyCode::Escape) {
            set_cursor_lock(&windows, &mut cursor_opts, false);
        }
        return;
    }

    let requested = if keyboard.just_pressed(KeyCode::KeyO) {
        Some(ViewMode::Orthographic)
    } else if keyboard.just_pressed(KeyCode::KeyP) {
        Some(ViewMode::Perspective)
    } else if keyboard.just_pressed(KeyCode::KeyV) {
        Some(ViewMode::FirstPerson)
    } else if keyboard.just_pressed(KeyCode::Escape) {
        if store.session().is_some() {
            store.cancel_session();
            None
        } else if store.view_mode() == ViewMode::FirstPerson {
            Some(ViewMode::Orthographic)
        } else {
            None
        }
    } else {
        None
    };

    if let Some(mode) = requested {
        apply_mode_switch(&mut controller, &mut store, mode, &windows, &mut cursor_opts);
    }
}

pub fn orbit_controls(
    mut motion: MessageReader<MouseMotion>,
    mut wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    store: Res<EditorStore>,
    mut controller: ResMut<CameraModeController>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let delta: Vec2 = motion.read().map(|m| m.delta).sum();
    let notches: f32 = wheel
        .read()
        .map(|w| match w.unit {
            MouseScrollUnit::Line => w.y,
            MouseScrollUnit::Pixel => w.y / PIXELS_PER_NOTCH,
        })
        .sum();

    if !store.view_mode().is_orbit() || pointer_over_ui(&windows, &store) {
        return;
    }

    if mouse_button.pressed(MouseButton::Middle) && delta != Vec2::ZERO {
        controller.orbit_rotate(&store, delta * ORBIT_ROTATE_SPEED);
    }
    if mouse_button.pressed(MouseButton::Right) && delta != Vec2::ZERO {
        controller.orbit_pan(&store, delta, viewport_size(&windows));
    }
    if notches != 0.0 {
        controller.orbit_dolly(&store, notches);
    }
}

pub fn first_person_controls(
    mut motion: MessageReader<MouseMotion>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    time: Res<Time>,
    room: Res<RoomGeometry>,
    store: Res<EditorStore>,
    mut controller: ResMut<CameraModeController>,
    windows: Query<Entity, With<PrimaryWindow>>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    mut cursor_opts: Query<&mut CursorOptions>,
) {
    let delta: Vec2 = motion.read().map(|m| m.delta).sum();
    if store.view_mode() != ViewMode::FirstPerson {
        return;
    }

    if !cursor_locked(&windows, &cursor_opts) {
        // Click into the viewport to look around
        if mouse_button.just_pressed(MouseButton::Left) && !pointer_over_ui(&window_query, &store) {
            set_cursor_lock(&windows, &mut cursor_opts, true);
        }
        return;
    }

    if delta != Vec2::ZERO {
        controller.first_person_look(&store, delta * MOUSE_SENSITIVITY);
    }

    let input = WalkInput {
        forward: keyboard.pressed(KeyCode::KeyW),
        backward: keyboard.pressed(KeyCode::KeyS),
        left: keyboard.pressed(KeyCode::KeyA),
        right: keyboard.pressed(KeyCode::KeyD),
    };
    controller.first_person_walk(&store, &input, time.delta_secs(), &room);
}

/// Write live rig state back into the store
pub fn tick_controller(mut store: ResMut<EditorStore>, mut controller: ResMut<CameraModeController>) {
    controller.tick(&mut store);
}

/// Mirror the controller's view onto the Bevy camera
pub fn sync_camera(
    store: Res<EditorStore>,
    controller: Res<CameraModeController>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut camera: Query<(&mut Transform, &mut Projection), With<EditorCamera>>,
) {
    let Ok((mut transform, mut projection)) = camera.single_mut() else {
        return;
    };
    let view = controller.view(&store, viewport_size(&windows));
    if !view.position.is_finite() || !view.rotation.is_finite() {
        return;
    }

    transform.translation = view.position;
    transform.rotation = view.rotation;

    match view.projection {
        ViewProjection::Perspective { fov_y, .. } => {
            if let Projection::Perspective(persp) = projection.as_mut() {
                persp.fov = fov_y;
            } else {
                *projection = Projection::Perspective(PerspectiveProjection { fov: fov_y, ..default() });
            }
        }
        ViewProjection::Orthographic { zoom, .. } => {
            let scale = 1.0 / zoom;
            if let Projection::Orthographic(ortho) = projection.as_mut() {
                ortho.scale = scale;
            } else {
                *projection = Projection::Orthographic(OrthographicProjection {
                    scaling_mode: ScalingMode::WindowSize,
                    scale,
                    ..OrthographicProjection::default_3d()
                });
            }
        }
    }
}
