use serde::{Deserialize, Serialize};

use crate::kernel::intent::{keys, Action, Direction, IntentKind};

/// Everything the assistant can say. Hosts may map a cue to a prerecorded clip
/// and fall back to speaking the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    Wake,
    NotHeard,
    HowMuch,
    NeedNumber,
    SayNumber,
    WhichApp,
    WhichOne,
    Selected,
    NotNow,
    Cancelled,
    Okay,
    FollowModeHint,
    SayWakeWord,
    NothingToAdjust,
    NothingToRepeat,
    NothingToUndo,
    CannotUndo,
    Undone,
    NotSure,
    NotImplemented,
    AppNotFound,
    ScheduleRejected,
    QueueFull,
    Scheduled,
    AreYouSure,
    ConfirmRetry,
    WindowSwitchMode,
    WindowSwitchHelp,
    WindowSwitchDone,
    Acknowledge,
    ExecError,
    OpenFailed,
    CloseFailed,
    TaskFailed,
}

impl Cue {
    pub fn default_text(&self) -> &'static str {
        match self {
            Cue::Wake => "I am here.",
            Cue::NotHeard => "I didn't catch that.",
            Cue::HowMuch => "How much?",
            Cue::NeedNumber => "Say a number from one to ten.",
            Cue::SayNumber => "Say a number.",
            Cue::WhichApp => "Which app?",
            Cue::WhichOne => "Which one?",
            Cue::Selected => "Selected.",
            Cue::NotNow => "Not now.",
            Cue::Cancelled => "Cancelled.",
            Cue::Okay => "Okay.",
            Cue::FollowModeHint => "Say 'more', 'less', or the wake word.",
            Cue::SayWakeWord => "Say the wake word.",
            Cue::NothingToAdjust => "Nothing to adjust.",
            Cue::NothingToRepeat => "Nothing to repeat.",
            Cue::NothingToUndo => "Nothing to undo.",
            Cue::CannotUndo => "I can't undo that.",
            Cue::Undone => "Undone.",
            Cue::NotSure => "I'm not sure what you mean.",
            Cue::NotImplemented => "I don't know how to do that yet.",
            Cue::AppNotFound => "I couldn't find that app.",
            Cue::ScheduleRejected => "I couldn't schedule that.",
            Cue::QueueFull => "Queue is full.",
            Cue::Scheduled => "Okay.",
            Cue::AreYouSure => "Are you sure?",
            Cue::ConfirmRetry => "Please say confirm or cancel.",
            Cue::WindowSwitchMode => "Say left or right. Say done to select.",
            Cue::WindowSwitchHelp => "Left or right. Say done.",
            Cue::WindowSwitchDone => "Done.",
            Cue::Acknowledge => "Done.",
            Cue::ExecError => "Sorry, something went wrong.",
            Cue::OpenFailed => "Sorry, I couldn't open it.",
            Cue::CloseFailed => "Sorry, I couldn't close it.",
            Cue::TaskFailed => "I couldn't complete that.",
        }
    }
}

/// Spoken confirmation for a successful action. `None` means stay quiet
/// (mute, window stepping).
pub fn acknowledgement(action: &Action) -> Option<String> {
    let entities = &action.entities;
    let text = match action.intent {
        IntentKind::VolumeChange => match entities.direction() {
            Some(Direction::Down) => "Decreasing volume".to_string(),
            _ => "Increasing volume".to_string(),
        },
        IntentKind::BrightnessChange => match entities.direction() {
            Some(Direction::Down) => "Decreasing brightness".to_string(),
            _ => "Increasing brightness".to_string(),
        },
        IntentKind::SetVolume => match entities.int(keys::VALUE) {
            Some(value) => format!("Setting volume to {value} percent"),
            None => "Setting volume".to_string(),
        },
        IntentKind::OpenApp => format!("Opening {}", entities.app().unwrap_or("application")),
        IntentKind::CloseApp => format!("Closing {}", entities.app().unwrap_or("application")),
        IntentKind::CloseActive => "Closing current app".to_string(),
        IntentKind::Unmute => "Sound on.".to_string(),
        IntentKind::Shutdown => "Shutting down computer in 5 seconds".to_string(),
        IntentKind::Restart => "Restarting computer in 5 seconds".to_string(),
        IntentKind::Lock => "Locking screen".to_string(),
        IntentKind::OpenTerminal => "Opening command prompt".to_string(),
        IntentKind::ShowDesktop => "Showing desktop".to_string(),
        IntentKind::Screenshot => "Taking screenshot".to_string(),
        IntentKind::TaskManager => "Opening task manager".to_string(),
        IntentKind::Mute
        | IntentKind::SwitchWindow
        | IntentKind::WindowSwitchStep
        | IntentKind::WindowSwitchEnd => return None,
    };
    Some(text)
}

/// "Okay. I'll do it in 2 minutes." for whole minutes, seconds otherwise.
pub fn scheduled_text(delay_seconds: u64) -> String {
    let mins = delay_seconds / 60;
    if mins >= 1 && delay_seconds % 60 == 0 {
        format!("Okay. I'll do it in {}.", counted(mins, "minute"))
    } else {
        format!("Okay. I'll do it in {}.", counted(delay_seconds, "second"))
    }
}

fn counted(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// "Which one? 1 chrome, 2 chromium."
pub fn choice_prompt(candidates: &[String]) -> String {
    let listed: Vec<String> = candidates
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{} {}", i + 1, name))
        .collect();
    format!("Which one? {}.", listed.join(", "))
}

/// "Undone." for one action, "Undid 3 actions." for a chain.
pub fn undone_text(count: usize) -> String {
    if count <= 1 {
        Cue::Undone.default_text().to_string()
    } else {
        format!("Undid {count} actions.")
    }
}
