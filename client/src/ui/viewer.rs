//! Visitor HUD
//!
//! Viewers get no sidebar, only a control hint that fades out of the way
//! while the pointer is locked.

use bevy::prelude::*;
use bevy::window::{CursorOptions, PrimaryWindow};

use super::styles::*;
use crate::connection::cursor_locked;

pub struct ViewerHudPlugin;

impl Plugin for ViewerHudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_hint);
        app.add_systems(Update, update_hint);
    }
}

#[derive(Component)]
struct ViewerHint;

fn spawn_hint(mut commands: Commands) {
    commands.spawn((
        ViewerHint,
        Text::new(hint_text(false)),
        small_text_style(),
        TextColor(TEXT_COLOR),
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(16.0),
            bottom: Val::Px(16.0),
            padding: UiRect::axes(Val::Px(10.0), Val::Px(6.0)),
            ..default()
        },
        BackgroundColor(OVERLAY_BACKGROUND),
        BorderRadius::all(Val::Px(4.0)),
        Pickable::IGNORE,
    ));
}

fn hint_text(locked: bool) -> &'static str {
    if locked {
        "WASD  walk\nT  traverses\nEsc  release pointer"
    } else {
        "Click to look around"
    }
}

fn update_hint(
    windows: Query<Entity, With<PrimaryWindow>>,
    cursor_opts: Query<&mut CursorOptions>,
    mut hint: Query<&mut Text, With<ViewerHint>>,
) {
    let wanted = hint_text(cursor_locked(&windows, &cursor_opts));
    for mut text in hint.iter_mut() {
        if text.0 != wanted {
            text.0 = wanted.to_string();
        }
    }
}
