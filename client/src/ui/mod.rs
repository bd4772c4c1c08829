//! UI module

pub mod notices;
pub mod sidebar;
pub mod signed_out;
pub mod styles;
pub mod viewer;

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use shared::EditorStore;

pub use notices::NoticesPlugin;
pub use sidebar::SidebarPlugin;
pub use signed_out::SignedOutPlugin;
pub use viewer::ViewerHudPlugin;

/// Whether the cursor currently sits over the sidebar (viewers have none)
pub fn pointer_over_ui(windows: &Query<&Window, With<PrimaryWindow>>, store: &EditorStore) -> bool {
    if store.is_read_only() {
        return false;
    }
    windows
        .single()
        .ok()
        .and_then(|w| w.cursor_position())
        .is_some_and(|p| p.x <= styles::SIDEBAR_WIDTH)
}

/// Hover and press colouring for every plain button
pub fn button_interactions(
    mut buttons: Query<
        (&Interaction, &mut BackgroundColor),
        (
            Changed<Interaction>,
            With<Button>,
            Without<sidebar::ViewModeButton>,
            Without<sidebar::TraverseButton>,
        ),
    >,
) {
    for (interaction, mut bg_color) in buttons.iter_mut() {
        *bg_color = match interaction {
            Interaction::Pressed => BackgroundColor(styles::BUTTON_PRESSED),
            Interaction::Hovered => BackgroundColor(styles::BUTTON_HOVERED),
            Interaction::None => BackgroundColor(styles::BUTTON_NORMAL),
        };
    }
}
