//! Shared UI styles - quiet gallery palette

use bevy::prelude::*;

/// Width of the left-hand asset sidebar, in logical pixels
pub const SIDEBAR_WIDTH: f32 = 260.0;

pub const PANEL_BACKGROUND: Color = Color::srgba(0.08, 0.08, 0.09, 0.92);
pub const OVERLAY_BACKGROUND: Color = Color::srgba(0.0, 0.0, 0.0, 0.7);

pub const BUTTON_NORMAL: Color = Color::srgb(0.15, 0.15, 0.17);
pub const BUTTON_HOVERED: Color = Color::srgb(0.22, 0.22, 0.25);
pub const BUTTON_PRESSED: Color = Color::srgb(0.30, 0.36, 0.45);
/// Highlight for the active view mode
pub const BUTTON_ACTIVE: Color = Color::srgb(0.24, 0.34, 0.48);

pub const BUTTON_BORDER: Color = Color::srgb(0.30, 0.30, 0.33);

/// Accent - muted museum blue
pub const ACCENT_COLOR: Color = Color::srgb(0.45, 0.62, 0.85);

pub const TEXT_COLOR: Color = Color::srgb(0.93, 0.92, 0.90);
pub const TEXT_MUTED: Color = Color::srgb(0.55, 0.55, 0.58);

pub const NOTICE_INFO: Color = Color::srgba(0.15, 0.22, 0.30, 0.95);
pub const NOTICE_WARNING: Color = Color::srgba(0.40, 0.30, 0.08, 0.95);
pub const NOTICE_ERROR: Color = Color::srgba(0.45, 0.12, 0.10, 0.95);

/// Full-width sidebar button
pub fn list_button_style() -> Node {
    Node {
        width: Val::Percent(100.0),
        min_height: Val::Px(36.0),
        padding: UiRect::axes(Val::Px(10.0), Val::Px(6.0)),
        justify_content: JustifyContent::FlexStart,
        align_items: AlignItems::Center,
        margin: UiRect::vertical(Val::Px(3.0)),
        border: UiRect::all(Val::Px(1.0)),
        ..default()
    }
}

/// Compact button used for the view-mode row
pub fn toggle_button_style() -> Node {
    Node {
        flex_grow: 1.0,
        height: Val::Px(32.0),
        justify_content: JustifyContent::Center,
        align_items: AlignItems::Center,
        margin: UiRect::horizontal(Val::Px(2.0)),
        border: UiRect::all(Val::Px(1.0)),
        ..default()
    }
}

/// Centered overlay button
pub fn button_style() -> Node {
    Node {
        width: Val::Px(220.0),
        height: Val::Px(48.0),
        justify_content: JustifyContent::Center,
        align_items: AlignItems::Center,
        margin: UiRect::all(Val::Px(8.0)),
        border: UiRect::all(Val::Px(2.0)),
        ..default()
    }
}

pub fn button_text_style() -> TextFont {
    TextFont {
        font_size: 16.0,
        ..default()
    }
}

pub fn heading_text_style() -> TextFont {
    TextFont {
        font_size: 20.0,
        ..default()
    }
}

pub fn small_text_style() -> TextFont {
    TextFont {
        font_size: 13.0,
        ..default()
    }
}
