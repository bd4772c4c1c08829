//! Crosshair for first-person placement
//!
//! Placement rays go through the screen centre while the pointer is locked, so
//! a small dot marks where the artwork will land.

use bevy::prelude::*;
use bevy::window::{CursorOptions, PrimaryWindow};
use shared::{EditorStore, ViewMode};

use crate::connection::cursor_locked;

#[derive(Component)]
pub struct Crosshair;

pub fn spawn_crosshair(mut commands: Commands) {
    commands
        .spawn((
            Crosshair,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            Visibility::Hidden,
            // Ensure it doesn't block mouse input
            Pickable::IGNORE,
        ))
        .with_children(|parent| {
            parent.spawn((
                Node {
                    width: Val::Px(6.0),
                    height: Val::Px(6.0),
                    ..default()
                },
                BackgroundColor(Color::srgba(1.0, 1.0, 1.0, 0.85)),
                BorderRadius::all(Val::Px(3.0)),
            ));
        });
}

pub fn update_crosshair_visibility(
    store: Res<EditorStore>,
    windows: Query<Entity, With<PrimaryWindow>>,
    cursor_opts: Query<&mut CursorOptions>,
    mut crosshair: Query<&mut Visibility, With<Crosshair>>,
) {
    let show = store.view_mode() == ViewMode::FirstPerson && cursor_locked(&windows, &cursor_opts);
    let wanted = if show { Visibility::Visible } else { Visibility::Hidden };
    for mut visibility in crosshair.iter_mut() {
        if *visibility != wanted {
            *visibility = wanted;
        }
    }
}
