use tracing::debug;

use super::classify::{absolute_level, wants_absolute};
use super::{Decision, Outcome, Route, Router};
use crate::kernel::intent::{Action, Executor, IntentClassifier, IntentKind};
use crate::kernel::parse::extract_steps;
use crate::kernel::speech::planner::Cue;
use crate::kernel::time::Timestamp;
use crate::services::apps::{
    extract_close_target, extract_open_target, is_bare_close, is_bare_open, AppMatch,
};

/// Owned result of an app lookup, so the catalogue borrow ends before we act on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum AppPick {
    One(String),
    Many(Vec<String>),
    Missing,
}

impl<E: Executor, C: IntentClassifier> Router<E, C> {
    pub(super) fn resolve_app(&self, name: &str) -> AppPick {
        match self.apps.resolve(name) {
            AppMatch::One(app) => AppPick::One(app.id.clone()),
            AppMatch::Ambiguous(apps) => AppPick::Many(apps.iter().map(|a| a.id.clone()).collect()),
            AppMatch::None => AppPick::Missing,
        }
    }

    /// Phrases recognised without the classifier. `None` falls through to it.
    pub(super) fn direct(&mut self, text: &str, t0: &str, now: Timestamp) -> Option<Decision> {
        let route = Route::Direct;
        let phrases = &self.config.phrases;

        if phrases.close_active.contains(t0) {
            return Some(self.perform(
                Action::bare(IntentKind::CloseActive),
                Some(text),
                route,
                now,
            ));
        }
        if is_bare_close(t0) {
            return Some(self.ask_target(IntentKind::CloseApp, route, now));
        }
        if let Some(target) = extract_close_target(t0) {
            return Some(self.close_named(&target, text, now));
        }
        if let Some(kind) = self.commands.lookup(t0) {
            return Some(self.perform(Action::bare(kind), Some(text), route, now));
        }
        if let Some(step) = self.steps.detect(t0) {
            debug!(step = %step.name, tail = %step.tail, "step phrase");
            if let Some(action) = absolute_level(step.spec, t0) {
                return Some(self.perform(action, Some(text), route, now));
            }
            if wants_absolute(&step.tail) {
                // A level we cannot set directly; let the classifier decide.
                return None;
            }
            let steps = extract_steps(&step.tail);
            return Some(self.step_request(step.spec, steps, text, route, now));
        }
        if is_bare_open(t0) {
            return Some(self.ask_target(IntentKind::OpenApp, route, now));
        }
        if let Some(target) = extract_open_target(t0) {
            if let Some(decision) = self.open_named(&target, text, now) {
                return Some(decision);
            }
        }
        if self.config.phrases.switch_window.contains(t0) {
            return Some(self.perform(
                Action::bare(IntentKind::SwitchWindow),
                Some(text),
                route,
                now,
            ));
        }
        // A bare app name opens it; partial names go to the classifier.
        let id = self.apps.find_exact(t0).map(|app| app.id.clone())?;
        Some(self.perform(Action::open(&id), Some(text), route, now))
    }

    fn open_named(&mut self, name: &str, text: &str, now: Timestamp) -> Option<Decision> {
        match self.resolve_app(name) {
            AppPick::One(id) => {
                Some(self.perform(Action::open(&id), Some(text), Route::Direct, now))
            }
            AppPick::Many(ids) => {
                Some(self.ask_choice(IntentKind::OpenApp, ids, Route::Direct, now))
            }
            AppPick::Missing => None,
        }
    }

    fn close_named(&mut self, name: &str, text: &str, now: Timestamp) -> Decision {
        match self.resolve_app(name) {
            AppPick::One(id) => self.perform(Action::close(&id), Some(text), Route::Direct, now),
            AppPick::Many(ids) => self.ask_choice(IntentKind::CloseApp, ids, Route::Direct, now),
            AppPick::Missing => {
                debug!(name, "no app to close");
                self.history.break_chain();
                self.speak(Cue::AppNotFound);
                Decision::new(Route::Direct, Outcome::Rejected)
            }
        }
    }
}
