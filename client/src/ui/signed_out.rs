//! Signed-out overlay
//!
//! Shown after the server rejects the bearer credential. Signing in re-reads the
//! token from the editor config so a curator can paste a fresh one and retry.

use bevy::app::AppExit;
use bevy::prelude::*;
use bevy::window::{CursorOptions, PrimaryWindow};
use lightyear::prelude::*;
use shared::{EditorConfig, EditorStore};

use super::styles::*;
use crate::connection::set_cursor_lock;
use crate::network::{Credential, PendingRequests};
use crate::states::AppState;
use crate::GalleryClient;

pub struct SignedOutPlugin;

impl Plugin for SignedOutPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::SignedOut), (spawn_overlay, release_cursor));
        app.add_systems(OnExit(AppState::SignedOut), despawn_overlay);
        app.add_systems(Update, handle_overlay_actions.run_if(in_state(AppState::SignedOut)));
    }
}

#[derive(Component)]
struct SignedOutRoot;

#[derive(Component, Clone, Copy)]
enum SignedOutButton {
    SignIn,
    Exit,
}

fn spawn_overlay(mut commands: Commands) {
    commands
        .spawn((
            SignedOutRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(OVERLAY_BACKGROUND),
            GlobalZIndex(10),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Your session has expired"),
                heading_text_style(),
                TextColor(TEXT_COLOR),
                Node {
                    margin: UiRect::bottom(Val::Px(8.0)),
                    ..default()
                },
            ));
            parent.spawn((
                Text::new("Update the bearer token in your editor config, then sign in again."),
                small_text_style(),
                TextColor(TEXT_MUTED),
                Node {
                    margin: UiRect::bottom(Val::Px(24.0)),
                    ..default()
                },
            ));

            spawn_button(parent, "SIGN IN", SignedOutButton::SignIn);
            spawn_button(parent, "EXIT", SignedOutButton::Exit);
        });
}

fn spawn_button(parent: &mut ChildSpawnerCommands<'_>, text: &str, action: SignedOutButton) {
    parent
        .spawn((
            Button,
            action,
            button_style(),
            BackgroundColor(BUTTON_NORMAL),
            BorderColor::from(BUTTON_BORDER),
            BorderRadius::all(Val::Px(4.0)),
        ))
        .with_children(|btn| {
            btn.spawn((Text::new(text), button_text_style(), TextColor(TEXT_COLOR)));
        });
}

fn despawn_overlay(mut commands: Commands, query: Query<Entity, With<SignedOutRoot>>) {
    for entity in query.iter() {
        commands.entity(entity).despawn();
    }
}

fn handle_overlay_actions(
    buttons: Query<(&Interaction, &SignedOutButton), Changed<Interaction>>,
    mut store: ResMut<EditorStore>,
    mut credential: ResMut<Credential>,
    mut pending: ResMut<PendingRequests>,
    mut next_state: ResMut<NextState<AppState>>,
    mut exit: MessageWriter<AppExit>,
    connected: Query<(), (With<GalleryClient>, With<Connected>)>,
) {
    for (interaction, action) in buttons.iter() {
        if *interaction != Interaction::Pressed {
            continue;
        }
        match action {
            SignedOutButton::SignIn => {
                let config = EditorConfig::load();
                let token = config.bearer_token.trim();
                if token.is_empty() {
                    store.push_notice(shared::Notice::error("No bearer token configured"));
                    continue;
                }
                credential.0 = Some(token.to_string());
                store.sign_in();
                pending.invalidate_catalog();
                info!("Signed in again");
                next_state.set(if connected.is_empty() { AppState::Connecting } else { AppState::Editing });
            }
            SignedOutButton::Exit => {
                exit.write(AppExit::Success);
            }
        }
    }
}

fn release_cursor(windows: Query<Entity, With<PrimaryWindow>>, mut cursor_opts: Query<&mut CursorOptions>) {
    set_cursor_lock(&windows, &mut cursor_opts, false);
}
