use super::types::{keys, Action, Entities, IntentKind};

/// The action that reverses `action`, if one exists.
///
/// Step changes flip direction with the same magnitude, app open and close
/// swap, mute and unmute swap. Everything else is irreversible.
pub fn inverse_of(action: &Action) -> Option<Action> {
    let entities = &action.entities;
    match action.intent {
        IntentKind::VolumeChange | IntentKind::BrightnessChange => {
            let direction = entities.direction()?;
            let steps = entities.steps()?;
            let flipped = entities
                .clone()
                .with(keys::DIRECTION, direction.flip().as_str())
                .with(keys::MAGNITUDE_STEPS, steps);
            Some(Action::new(action.intent, flipped))
        }
        IntentKind::OpenApp => entities.app().map(Action::close),
        IntentKind::CloseApp => entities.app().map(Action::open),
        IntentKind::Mute => Some(Action::new(IntentKind::Unmute, Entities::new())),
        IntentKind::Unmute => Some(Action::new(IntentKind::Mute, Entities::new())),
        _ => None,
    }
}
