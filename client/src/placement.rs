//! Placement input and ghost preview
//!
//! Feeds the pointer into the store, runs the targeting engine against the
//! room, turns clicks and drag releases into commit tickets, and draws the
//! artwork ghost (green when it can be placed, red when it cannot).

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorOptions, PrimaryWindow};
use shared::geometry::cursor_to_ndc;
use shared::{
    begin_commit, CameraModeController, CommitRejection, EditorStore, PlacementEngine, RoomGeometry, SessionOrigin,
    ViewMode,
};

use crate::camera::viewport_size;
use crate::connection::cursor_locked;
use crate::network::CommitIssued;
use crate::ui::pointer_over_ui;

/// Pointer travel, in pixels, under which a right press still counts as a click
const CLICK_SLOP_PX: f32 = 4.0;

/// Tells a right click (cancel) apart from a right drag (orbit pan)
#[derive(Debug, Default)]
pub struct RightClickGesture {
    travel: Option<f32>,
}

impl RightClickGesture {
    pub fn press(&mut self) {
        self.travel = Some(0.0);
    }

    pub fn moved(&mut self, delta: Vec2) {
        if let Some(travel) = self.travel.as_mut() {
            *travel += delta.length();
        }
    }

    /// `true` when the release ends a click rather than a drag
    pub fn release(&mut self) -> bool {
        self.travel.take().is_some_and(|travel| travel <= CLICK_SLOP_PX)
    }
}

/// Validity-coloured ghost materials
#[derive(Resource)]
pub struct GhostAssets {
    pub valid: Handle<StandardMaterial>,
    pub invalid: Handle<StandardMaterial>,
}

/// Marker for the placement ghost
#[derive(Component)]
pub struct Ghost;

pub fn setup_ghost(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let quad = meshes.add(Rectangle::new(1.0, 1.0));
    let valid = materials.add(StandardMaterial {
        base_color: Color::srgba(0.2, 0.9, 0.3, 0.45),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        double_sided: true,
        cull_mode: None,
        ..default()
    });
    let invalid = materials.add(StandardMaterial {
        base_color: Color::srgba(0.95, 0.2, 0.15, 0.45),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        double_sided: true,
        cull_mode: None,
        ..default()
    });

    commands.spawn((
        Ghost,
        Mesh3d(quad),
        MeshMaterial3d(valid.clone()),
        Transform::default(),
        Visibility::Hidden,
    ));
    commands.insert_resource(GhostAssets { valid, invalid });
}

/// Record where the pointer is, in NDC, for this frame's targeting pass
pub fn update_pointer(
    mut store: ResMut<EditorStore>,
    windows: Query<&Window, With<PrimaryWindow>>,
    window_entities: Query<Entity, With<PrimaryWindow>>,
    cursor_opts: Query<&mut CursorOptions>,
) {
    if store.session().is_none() {
        return;
    }

    let ndc = if store.view_mode() == ViewMode::FirstPerson {
        // Locked pointer aims through the crosshair
        cursor_locked(&window_entities, &cursor_opts).then_some(Vec2::ZERO)
    } else if pointer_over_ui(&windows, &store) {
        None
    } else {
        windows
            .single()
            .ok()
            .and_then(|w| w.cursor_position().zip(Some(w.size())))
            .and_then(|(cursor, size)| cursor_to_ndc(cursor, size))
    };
    store.update_pointer(ndc);
}

pub fn run_targeting(
    mut store: ResMut<EditorStore>,
    engine: Res<PlacementEngine>,
    controller: Res<CameraModeController>,
    room: Res<RoomGeometry>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    if store.session().is_none() {
        return;
    }
    let view = controller.view(&store, viewport_size(&windows));
    let scene = room.visible(store.show_traverses());
    engine.tick(&mut store, Some(&view), &scene);
}

/// Click-to-place confirm, drag release, and right-click cancel
pub fn handle_placement_buttons(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut motion: MessageReader<MouseMotion>,
    mut right_click: Local<RightClickGesture>,
    mut store: ResMut<EditorStore>,
    mut tickets: MessageWriter<CommitIssued>,
    windows: Query<&Window, With<PrimaryWindow>>,
    window_entities: Query<Entity, With<PrimaryWindow>>,
    cursor_opts: Query<&mut CursorOptions>,
) {
    if mouse_button.just_pressed(MouseButton::Right) {
        right_click.press();
    }
    for m in motion.read() {
        right_click.moved(m.delta);
    }
    let right_clicked = mouse_button.just_released(MouseButton::Right) && right_click.release();

    let Some(origin) = store.session().map(|s| s.origin) else {
        return;
    };

    // A right drag pans the orbit camera and keeps the session
    if right_clicked {
        store.cancel_session();
        return;
    }

    let over_ui = pointer_over_ui(&windows, &store);
    let confirm = match origin {
        SessionOrigin::Click => mouse_button.just_pressed(MouseButton::Left) && !over_ui,
        SessionOrigin::Drag => {
            if !mouse_button.just_released(MouseButton::Left) {
                return;
            }
            store.release_drag();
            // Released over the sidebar: keep the session for click-to-place
            !over_ui
        }
    };
    if !confirm {
        return;
    }

    let engaged = match store.view_mode() {
        ViewMode::FirstPerson => cursor_locked(&window_entities, &cursor_opts),
        ViewMode::Orthographic | ViewMode::Perspective => true,
    };
    match begin_commit(&mut store, engaged) {
        Ok(ticket) => {
            tickets.write(CommitIssued(ticket));
        }
        Err(CommitRejection::NotEngaged) => {}
        Err(rejection) => debug!("Commit rejected: {:?}", rejection),
    }
}

pub fn update_ghost(
    store: Res<EditorStore>,
    assets: Res<GhostAssets>,
    engine: Res<PlacementEngine>,
    mut ghost: Query<(&mut Transform, &mut Visibility, &mut MeshMaterial3d<StandardMaterial>), With<Ghost>>,
) {
    let Ok((mut transform, mut visibility, mut material)) = ghost.single_mut() else {
        return;
    };

    let Some((session, candidate)) = store.session().and_then(|s| s.candidate.map(|c| (s, c))) else {
        if *visibility != Visibility::Hidden {
            *visibility = Visibility::Hidden;
        }
        return;
    };

    let size = session.asset.size_units(&engine.settings) * candidate.scale;
    *transform = candidate.transform().with_scale(Vec3::new(size.x, size.y, 1.0));
    *visibility = Visibility::Visible;

    let wanted = if candidate.valid { &assets.valid } else { &assets.invalid };
    if material.0 != *wanted {
        material.0 = wanted.clone();
    }
}
