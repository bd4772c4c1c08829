//! Toast notifications for store notices

use bevy::prelude::*;
use shared::{NoticeLevel, StoreChange};

use super::styles::*;
use crate::states::StoreChanged;

/// How long a toast stays on screen
const NOTICE_SECONDS: f32 = 4.0;
/// Older toasts are dropped beyond this many
const MAX_NOTICES: usize = 4;

pub struct NoticesPlugin;

impl Plugin for NoticesPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_notice_stack);
        app.add_systems(Update, (spawn_notices, expire_notices).chain());
    }
}

#[derive(Component)]
struct NoticeStack;

#[derive(Component)]
struct Toast {
    timer: Timer,
}

fn spawn_notice_stack(mut commands: Commands) {
    commands.spawn((
        NoticeStack,
        Node {
            position_type: PositionType::Absolute,
            right: Val::Px(16.0),
            bottom: Val::Px(16.0),
            flex_direction: FlexDirection::ColumnReverse,
            align_items: AlignItems::FlexEnd,
            ..default()
        },
        Pickable::IGNORE,
    ));
}

fn spawn_notices(
    mut commands: Commands,
    mut changes: MessageReader<StoreChanged>,
    stack: Query<Entity, With<NoticeStack>>,
    toasts: Query<Entity, With<Toast>>,
) {
    let Ok(stack) = stack.single() else {
        return;
    };

    let mut live = toasts.iter().count();
    let mut oldest = toasts.iter();
    for StoreChanged(change) in changes.read() {
        let StoreChange::Notice(notice) = change else {
            continue;
        };
        if live >= MAX_NOTICES {
            if let Some(entity) = oldest.next() {
                commands.entity(entity).despawn();
                live -= 1;
            }
        }

        let background = match notice.level {
            NoticeLevel::Info => NOTICE_INFO,
            NoticeLevel::Warning => NOTICE_WARNING,
            NoticeLevel::Error => NOTICE_ERROR,
        };
        let toast = commands
            .spawn((
                Toast {
                    timer: Timer::from_seconds(NOTICE_SECONDS, TimerMode::Once),
                },
                Node {
                    padding: UiRect::axes(Val::Px(14.0), Val::Px(8.0)),
                    margin: UiRect::top(Val::Px(6.0)),
                    ..default()
                },
                BackgroundColor(background),
                BorderRadius::all(Val::Px(4.0)),
            ))
            .with_children(|toast| {
                toast.spawn((Text::new(notice.text.clone()), button_text_style(), TextColor(TEXT_COLOR)));
            })
            .id();
        commands.entity(stack).add_child(toast);
        live += 1;
    }
}

fn expire_notices(mut commands: Commands, time: Res<Time>, mut toasts: Query<(Entity, &mut Toast)>) {
    for (entity, mut toast) in toasts.iter_mut() {
        if toast.timer.tick(time.delta()).just_finished() {
            commands.entity(entity).despawn();
        }
    }
}
