//! Asset sidebar
//!
//! Lists the curator's artworks, the view-mode toggles, the traverse toggle and
//! a status line.
//! Pressing an artwork starts a drag session; releasing over the sidebar turns
//! it into click-to-place.

use bevy::prelude::*;
use bevy::window::{CursorOptions, PrimaryWindow};
use shared::{
    CameraModeController, CommitState, DraggedAsset, EditorStore, InstanceCatalog, PlacementEngine, SessionOrigin,
    ViewMode,
};

use super::styles::*;
use crate::camera::apply_mode_switch;
use crate::states::AppState;

pub struct SidebarPlugin;

impl Plugin for SidebarPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_sidebar);
        app.add_systems(
            Update,
            (
                rebuild_asset_list.run_if(resource_changed::<InstanceCatalog>),
                handle_asset_buttons.run_if(in_state(AppState::Editing)),
                handle_view_mode_buttons,
                color_view_mode_buttons,
                handle_traverse_button,
                color_traverse_button,
                update_status_text,
            ),
        );
    }
}

#[derive(Component)]
struct SidebarRoot;

/// Container the artwork buttons are spawned into
#[derive(Component)]
struct AssetList;

#[derive(Component)]
pub struct AssetButton {
    pub asset_id: shared::AssetId,
}

#[derive(Component, Clone, Copy)]
pub struct ViewModeButton {
    pub mode: ViewMode,
}

/// Shows or hides the overhead traverses
#[derive(Component)]
pub struct TraverseButton;

#[derive(Component)]
struct StatusText;

fn spawn_sidebar(mut commands: Commands) {
    commands
        .spawn((
            SidebarRoot,
            Node {
                width: Val::Px(SIDEBAR_WIDTH),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                left: Val::Px(0.0),
                top: Val::Px(0.0),
                flex_direction: FlexDirection::Column,
                padding: UiRect::all(Val::Px(12.0)),
                ..default()
            },
            BackgroundColor(PANEL_BACKGROUND),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Exhibit Planner"),
                heading_text_style(),
                TextColor(ACCENT_COLOR),
                Node {
                    margin: UiRect::bottom(Val::Px(12.0)),
                    ..default()
                },
            ));

            // View mode toggles
            parent
                .spawn(Node {
                    width: Val::Percent(100.0),
                    flex_direction: FlexDirection::Row,
                    margin: UiRect::bottom(Val::Px(16.0)),
                    ..default()
                })
                .with_children(|row| {
                    for mode in [ViewMode::Orthographic, ViewMode::Perspective, ViewMode::FirstPerson] {
                        spawn_view_mode_button(row, mode);
                    }
                });

            parent
                .spawn((
                    Button,
                    TraverseButton,
                    list_button_style(),
                    BackgroundColor(BUTTON_ACTIVE),
                    BorderColor::from(BUTTON_BORDER),
                    BorderRadius::all(Val::Px(4.0)),
                ))
                .with_children(|btn| {
                    btn.spawn((Text::new("Traverses"), small_text_style(), TextColor(TEXT_COLOR)));
                });

            parent.spawn((
                Text::new("Artworks"),
                button_text_style(),
                TextColor(TEXT_MUTED),
                Node {
                    margin: UiRect::bottom(Val::Px(6.0)),
                    ..default()
                },
            ));

            parent.spawn((
                AssetList,
                Node {
                    width: Val::Percent(100.0),
                    flex_direction: FlexDirection::Column,
                    flex_grow: 1.0,
                    overflow: Overflow::scroll_y(),
                    ..default()
                },
            ));

            parent.spawn((
                StatusText,
                Text::new(""),
                small_text_style(),
                TextColor(TEXT_COLOR),
                Node {
                    margin: UiRect::top(Val::Px(12.0)),
                    ..default()
                },
            ));

            parent.spawn((
                Text::new("O / P / V  switch view\nT  show or hide traverses\nEsc  cancel or leave walk\nRight click  cancel"),
                small_text_style(),
                TextColor(TEXT_MUTED),
                Node {
                    margin: UiRect::top(Val::Px(8.0)),
                    ..default()
                },
            ));
        });
}

fn spawn_view_mode_button(parent: &mut ChildSpawnerCommands<'_>, mode: ViewMode) {
    parent
        .spawn((
            Button,
            ViewModeButton { mode },
            toggle_button_style(),
            BackgroundColor(BUTTON_NORMAL),
            BorderColor::from(BUTTON_BORDER),
            BorderRadius::all(Val::Px(4.0)),
        ))
        .with_children(|btn| {
            btn.spawn((Text::new(mode.label()), small_text_style(), TextColor(TEXT_COLOR)));
        });
}

fn rebuild_asset_list(
    mut commands: Commands,
    catalog: Res<InstanceCatalog>,
    list: Query<Entity, With<AssetList>>,
) {
    let Ok(list) = list.single() else {
        return;
    };
    commands.entity(list).despawn_related::<Children>();
    commands.entity(list).with_children(|parent| {
        if catalog.assets.is_empty() {
            parent.spawn((Text::new("No artworks yet"), small_text_style(), TextColor(TEXT_MUTED)));
            return;
        }
        for record in &catalog.assets {
            let size = match (record.width_cm, record.height_cm) {
                (Some(w), Some(h)) => format!("{w:.0} x {h:.0} cm"),
                _ => "size unknown".to_string(),
            };
            parent
                .spawn((
                    Button,
                    AssetButton { asset_id: record.id },
                    list_button_style(),
                    BackgroundColor(BUTTON_NORMAL),
                    BorderColor::from(BUTTON_BORDER),
                    BorderRadius::all(Val::Px(4.0)),
                ))
                .with_children(|btn| {
                    btn.spawn((
                        Text::new(format!("{}\n{}", record.display_name(), size)),
                        button_text_style(),
                        TextColor(TEXT_COLOR),
                    ));
                });
        }
    });
}

fn handle_asset_buttons(
    buttons: Query<(&Interaction, &AssetButton), Changed<Interaction>>,
    catalog: Res<InstanceCatalog>,
    engine: Res<PlacementEngine>,
    mut store: ResMut<EditorStore>,
) {
    for (interaction, button) in buttons.iter() {
        if *interaction != Interaction::Pressed {
            continue;
        }
        let Some(record) = catalog.asset(button.asset_id) else {
            warn!("Asset {} is no longer in the catalog", button.asset_id);
            continue;
        };
        store.begin_session(DraggedAsset::from_record(record, &engine.settings), SessionOrigin::Drag);
    }
}

fn handle_view_mode_buttons(
    buttons: Query<(&Interaction, &ViewModeButton), Changed<Interaction>>,
    mut store: ResMut<EditorStore>,
    mut controller: ResMut<CameraModeController>,
    windows: Query<Entity, With<PrimaryWindow>>,
    mut cursor_opts: Query<&mut CursorOptions>,
) {
    for (interaction, button) in buttons.iter() {
        if *interaction == Interaction::Pressed {
            apply_mode_switch(&mut controller, &mut store, button.mode, &windows, &mut cursor_opts);
        }
    }
}

fn handle_traverse_button(
    buttons: Query<&Interaction, (Changed<Interaction>, With<TraverseButton>)>,
    mut store: ResMut<EditorStore>,
) {
    for interaction in buttons.iter() {
        if *interaction == Interaction::Pressed {
            store.toggle_traverses();
        }
    }
}

fn color_traverse_button(
    store: Res<EditorStore>,
    mut buttons: Query<(&Interaction, &mut BackgroundColor), With<TraverseButton>>,
) {
    for (interaction, mut bg_color) in buttons.iter_mut() {
        let color = match interaction {
            Interaction::Pressed => BUTTON_PRESSED,
            Interaction::Hovered => BUTTON_HOVERED,
            Interaction::None if store.show_traverses() => BUTTON_ACTIVE,
            Interaction::None => BUTTON_NORMAL,
        };
        if bg_color.0 != color {
            bg_color.0 = color;
        }
    }
}

fn color_view_mode_buttons(
    store: Res<EditorStore>,
    mut buttons: Query<(&Interaction, &ViewModeButton, &mut BackgroundColor)>,
) {
    for (interaction, button, mut bg_color) in buttons.iter_mut() {
        let color = if button.mode == store.view_mode() {
            BUTTON_ACTIVE
        } else {
            match interaction {
                Interaction::Pressed => BUTTON_PRESSED,
                Interaction::Hovered => BUTTON_HOVERED,
                Interaction::None => BUTTON_NORMAL,
            }
        };
        if bg_color.0 != color {
            bg_color.0 = color;
        }
    }
}

fn update_status_text(
    state: Res<State<AppState>>,
    store: Res<EditorStore>,
    catalog: Res<InstanceCatalog>,
    mut text: Query<&mut Text, With<StatusText>>,
) {
    let Ok(mut text) = text.single_mut() else {
        return;
    };

    let status = match state.get() {
        AppState::Connecting => "Connecting to server...".to_string(),
        AppState::SignedOut => "Signed out".to_string(),
        AppState::Editing => match store.session() {
            None => format!("{} artwork(s) on the walls", catalog.placed.len()),
            Some(session) if session.commit == CommitState::InFlight => "Saving...".to_string(),
            Some(session) => {
                let name = catalog
                    .asset(session.asset.asset_id)
                    .map(|a| a.display_name())
                    .unwrap_or_else(|| format!("Asset {}", session.asset.asset_id));
                let hint = match session.candidate {
                    Some(c) if c.valid && session.origin == SessionOrigin::Drag => "release to place",
                    Some(c) if c.valid => "click to place",
                    Some(_) => "not a wall face",
                    None => "point at a wall",
                };
                format!("Placing {name}: {hint}")
            }
        },
    };

    if text.0 != status {
        text.0 = status;
    }
}
